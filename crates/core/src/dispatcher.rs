use quadrosol_merkle::QuadTreeMerkle;
use quadrosol_types::{Hash, Hasher, HostStorage, Point, Rect, ZERO_HASH};

use crate::{
    abi::{write_int, write_points, write_rect, Cursor},
    commit, Config, DirtiesTracker, DispatchError, HostNodeStore, RootMetadata, RootRegistry,
};

/// The operations this precompile exposes, tagged with their ABI opcode.
///
/// The opcode values and ordering mirror the historical implementation's `Op_QuadDB_*`
/// constants, so a caller migrating from it needs no remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i128)]
pub enum Opcode {
    /// Allocates a new, empty tree over a rect.
    Create = 0,
    /// Tombstones a handle.
    Delete = 1,
    /// Allocates a new handle sharing an existing handle's root.
    Duplicate = 2,
    /// Returns a handle's current root hash, point count, and rect.
    Read = 3,
    /// Inserts a point into a handle.
    Add = 4,
    /// Removes one occurrence of a point from a handle.
    Remove = 5,
    /// Removes one occurrence of a point and inserts another, as a single mutation.
    Replace = 6,
    /// Returns whether a point is present in a handle.
    Has = 7,
    /// Returns the `k` points nearest to a query point.
    KNearest = 8,
    /// Returns every point within a query rect.
    SearchRect = 9,
    /// Returns every point within a query circle.
    SearchCircle = 10,
}

impl Opcode {
    /// Decodes an opcode from its ABI integer value.
    pub fn from_i128(value: i128) -> Result<Self, DispatchError> {
        match value {
            0 => Ok(Opcode::Create),
            1 => Ok(Opcode::Delete),
            2 => Ok(Opcode::Duplicate),
            3 => Ok(Opcode::Read),
            4 => Ok(Opcode::Add),
            5 => Ok(Opcode::Remove),
            6 => Ok(Opcode::Replace),
            7 => Ok(Opcode::Has),
            8 => Ok(Opcode::KNearest),
            9 => Ok(Opcode::SearchRect),
            10 => Ok(Opcode::SearchCircle),
            other => Err(DispatchError::InvalidOpcode(other)),
        }
    }

    /// Returns `true` if executing this operation can change a handle's root.
    ///
    /// The host uses this to decide whether a call needs to run inside a transaction that will
    /// eventually call [`crate::commit`].
    pub fn mutates_storage(self) -> bool {
        matches!(
            self,
            Opcode::Create
                | Opcode::Delete
                | Opcode::Duplicate
                | Opcode::Add
                | Opcode::Remove
                | Opcode::Replace
        )
    }
}

/// Decodes the opcode word and dispatches the remaining payload, returning the ABI-encoded
/// response.
///
/// `config` bounds request parameters (currently just k-nearest's `k`); `host` is the storage
/// collaborator for both the node store and the root registry.
pub fn dispatch<S: HostStorage, H: Hasher>(
    host: &S,
    config: &Config,
    request: &[u8],
) -> Result<Vec<u8>, DispatchError> {
    let mut cursor = Cursor::new(request);
    let opcode = Opcode::from_i128(cursor.read_int()?)?;

    tracing::debug!(?opcode, "dispatching quadtree request");

    let tree = QuadTreeMerkle::<_, H>::with_config(HostNodeStore::new(host.clone()), config.tree_config());
    let registry = RootRegistry::new(host.clone());
    let dirties = DirtiesTracker::new(host.clone());

    let mut out = Vec::new();

    match opcode {
        Opcode::Create => {
            let rect = cursor.read_rect()?;
            let root = tree
                .empty_root()
                .map_err(DispatchError::Decode)?;
            let id = registry
                .create(root, RootMetadata { size: 0, rect })
                .map_err(DispatchError::Decode)?;

            dirties.inc(&root).map_err(DispatchError::Decode)?;
            write_int(&mut out, id as i128);
        }
        Opcode::Delete => {
            let id = cursor.read_id()?;
            let root = require_root(&registry, id)?;

            registry.delete(id).map_err(DispatchError::Decode)?;
            dirties.dec(&root).map_err(DispatchError::Decode)?;
        }
        Opcode::Duplicate => {
            let id = cursor.read_id()?;

            require_root(&registry, id)?;

            let new_id = registry.duplicate(id).map_err(DispatchError::Decode)?;
            let root = require_root(&registry, new_id)?;

            dirties.inc(&root).map_err(DispatchError::Decode)?;
            write_int(&mut out, new_id as i128);
        }
        Opcode::Read => {
            let id = cursor.read_id()?;

            match registry.get_metadata(id).map_err(DispatchError::Decode)? {
                Some(metadata) => {
                    let root = require_root(&registry, id)?;

                    out.extend_from_slice(&root);
                    write_int(&mut out, metadata.size as i128);
                    write_rect(&mut out, metadata.rect);
                }
                None => {
                    out.extend_from_slice(&ZERO_HASH);
                    write_int(&mut out, 0);
                    write_rect(&mut out, Rect::default());
                }
            }
        }
        Opcode::Add => {
            let id = cursor.read_id()?;
            let point = cursor.read_point()?;
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let (new_root, inserted) = insert_checked(&tree, &root, &rect, point)?;

            if inserted {
                let metadata = registry
                    .get_metadata(id)
                    .map_err(DispatchError::Decode)?
                    .ok_or(DispatchError::StoreMissing(id))?;

                registry.set_root(id, new_root).map_err(DispatchError::Decode)?;
                registry
                    .set_size(id, metadata.size + 1)
                    .map_err(DispatchError::Decode)?;
                dirties.dec(&root).map_err(DispatchError::Decode)?;
                dirties.inc(&new_root).map_err(DispatchError::Decode)?;
            }

            write_int(&mut out, inserted as i128);
        }
        Opcode::Remove => {
            let id = cursor.read_id()?;
            let point = cursor.read_point()?;
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let (new_root, removed) = tree
                .remove(&root, &rect, &point)
                .map_err(DispatchError::Decode)?;

            if removed {
                let metadata = registry
                    .get_metadata(id)
                    .map_err(DispatchError::Decode)?
                    .ok_or(DispatchError::StoreMissing(id))?;

                registry.set_root(id, new_root).map_err(DispatchError::Decode)?;
                registry
                    .set_size(id, metadata.size.saturating_sub(1))
                    .map_err(DispatchError::Decode)?;
                dirties.dec(&root).map_err(DispatchError::Decode)?;
                dirties.inc(&new_root).map_err(DispatchError::Decode)?;
            }

            write_int(&mut out, removed as i128);
        }
        Opcode::Replace => {
            let id = cursor.read_id()?;
            let old = cursor.read_point()?;
            let new = cursor.read_point()?;
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let (removed_root, removed) = tree
                .remove(&root, &rect, &old)
                .map_err(DispatchError::Decode)?;
            let (new_root, inserted) = insert_checked(&tree, &removed_root, &rect, new)?;

            if removed || inserted {
                let metadata = registry
                    .get_metadata(id)
                    .map_err(DispatchError::Decode)?
                    .ok_or(DispatchError::StoreMissing(id))?;
                let mut size = metadata.size;

                if removed {
                    size = size.saturating_sub(1);
                }

                if inserted {
                    size += 1;
                }

                registry.set_root(id, new_root).map_err(DispatchError::Decode)?;
                registry.set_size(id, size).map_err(DispatchError::Decode)?;
                dirties.dec(&root).map_err(DispatchError::Decode)?;
                dirties.inc(&new_root).map_err(DispatchError::Decode)?;
            }

            write_int(&mut out, removed as i128);
            write_int(&mut out, inserted as i128);
        }
        Opcode::Has => {
            let id = cursor.read_id()?;
            let point = cursor.read_point()?;
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let found = tree
                .contains(&root, &rect, &point)
                .map_err(DispatchError::Decode)?;

            write_int(&mut out, found as i128);
        }
        Opcode::KNearest => {
            let id = cursor.read_id()?;
            let point = cursor.read_point()?;
            let k = cursor.read_int()?;
            let k = u32::try_from(k)
                .map_err(|_| DispatchError::Decode(anyhow::anyhow!("k {k} is not a valid u32")))?
                .min(config.max_k_nearest);
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let points = tree
                .k_nearest(&root, &rect, &point, k as usize)
                .map_err(DispatchError::Decode)?;

            write_points(&mut out, &points);
        }
        Opcode::SearchRect => {
            let id = cursor.read_id()?;
            let query = cursor.read_rect()?;
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let points = tree
                .search_rect(&root, &rect, &query)
                .map_err(DispatchError::Decode)?;

            write_points(&mut out, &points);
        }
        Opcode::SearchCircle => {
            let id = cursor.read_id()?;
            let query = cursor.read_circle()?;
            let (root, rect) = require_root_and_rect(&registry, id)?;

            let points = tree
                .search_circle(&root, &rect, &query)
                .map_err(DispatchError::Decode)?;

            write_points(&mut out, &points);
        }
    }

    if opcode.mutates_storage() {
        commit(host).map_err(DispatchError::Decode)?;
    }

    Ok(out)
}

fn insert_checked<S: HostStorage, H: Hasher>(
    tree: &QuadTreeMerkle<HostNodeStore<S>, H>,
    root: &Hash,
    rect: &Rect,
    point: Point,
) -> Result<(Hash, bool), DispatchError> {
    tree.insert(root, rect, point).map_err(|e| {
        if e.downcast_ref::<quadrosol_merkle::DegenerateSplit>().is_some() {
            DispatchError::DegenerateSplit
        } else {
            DispatchError::Decode(e)
        }
    })
}

fn require_root<S: HostStorage>(registry: &RootRegistry<S>, id: u64) -> Result<Hash, DispatchError> {
    registry
        .get_root(id)
        .map_err(DispatchError::Decode)?
        .ok_or(DispatchError::StoreMissing(id))
}

fn require_rect<S: HostStorage>(registry: &RootRegistry<S>, id: u64) -> Result<Rect, DispatchError> {
    registry
        .get_metadata(id)
        .map_err(DispatchError::Decode)?
        .map(|m| m.rect)
        .ok_or(DispatchError::StoreMissing(id))
}

fn require_root_and_rect<S: HostStorage>(
    registry: &RootRegistry<S>,
    id: u64,
) -> Result<(Hash, Rect), DispatchError> {
    Ok((require_root(registry, id)?, require_rect(registry, id)?))
}
