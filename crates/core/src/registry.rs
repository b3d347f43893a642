use msgpacker::MsgPacker;
use quadrosol_types::{Hash, Hasher, HostStorage, Keccak256Hasher, Rect, ZERO_HASH};
use zerocopy::{Immutable, IntoBytes, TryFromBytes};

const ROOT_NS: &[u8] = b"quadrosol.registry.root.v0";
const METADATA_NS: &[u8] = b"quadrosol.registry.metadata.v0";
const COUNTER_NS: &[u8] = b"quadrosol.registry.counter.v0";

/// The wire layout of [`RootMetadata`] packed into a single 32-byte slot: `[0..12)` zero-padded,
/// `[12..16)` size, `[16..32)` the rect's `encode_rect` fields.
#[derive(Debug, Clone, Copy, TryFromBytes, IntoBytes, Immutable)]
#[repr(C)]
struct PackedMetadata {
    _padding: [u8; 12],
    size: u32,
    min_x: i32,
    min_y: i32,
    width: i32,
    height: i32,
}

/// Metadata stored alongside a handle's root: its point count and the bounding rect it was
/// created over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, MsgPacker)]
pub struct RootMetadata {
    /// Number of points currently in the tree. Maintained incrementally by the dispatcher, not
    /// recomputed from the tree on every read.
    pub size: u32,
    /// The rect the tree was created over. Fixed for the lifetime of the handle.
    pub rect: Rect,
}

impl RootMetadata {
    fn encode(self) -> Hash {
        let packed = PackedMetadata {
            _padding: [0u8; 12],
            size: self.size,
            min_x: self.rect.min.x,
            min_y: self.rect.min.y,
            width: self.rect.width(),
            height: self.rect.height(),
        };

        let mut out = ZERO_HASH;

        out.copy_from_slice(packed.as_bytes());

        out
    }

    fn decode(bytes: Hash) -> Self {
        let packed = PackedMetadata::try_read_from_bytes(&bytes)
            .expect("PackedMetadata is exactly HASH_LEN bytes");

        RootMetadata {
            size: packed.size,
            rect: Rect::new(packed.min_x, packed.min_y, packed.width, packed.height),
        }
    }
}

/// The persistent mapping from handle id to its current root hash and metadata, plus the
/// monotonic counter that allocates new ids.
///
/// Ids are never reused except in the narrow rollback case described on
/// [`RootRegistry::delete`].
#[derive(Debug, Clone)]
pub struct RootRegistry<S> {
    host: S,
}

impl<S: HostStorage> RootRegistry<S> {
    /// Wraps a host into a root registry.
    pub fn new(host: S) -> Self {
        Self { host }
    }

    /// Allocates a new handle id for `root`/`metadata` and returns it.
    pub fn create(&self, root: Hash, metadata: RootMetadata) -> anyhow::Result<u64> {
        let counter_ns = Keccak256Hasher::hash(COUNTER_NS);
        let id = self.host.get_persistent_counter(&counter_ns)?;

        self.set_root(id, root)?;
        self.set_metadata(id, metadata)?;
        self.host.set_persistent_counter(&counter_ns, id + 1)?;

        Ok(id)
    }

    /// Returns the current root hash for `id`, if the handle exists.
    pub fn get_root(&self, id: u64) -> anyhow::Result<Option<Hash>> {
        if !self.exists(id)? {
            return Ok(None);
        }

        let ns = Keccak256Hasher::hash(ROOT_NS);

        self.host.get_persistent_slot(&ns, &id_key(id)).map(Some)
    }

    /// Returns the metadata for `id`, if the handle exists.
    pub fn get_metadata(&self, id: u64) -> anyhow::Result<Option<RootMetadata>> {
        if !self.exists(id)? {
            return Ok(None);
        }

        let ns = Keccak256Hasher::hash(METADATA_NS);
        let encoded = self.host.get_persistent_slot(&ns, &id_key(id))?;

        Ok(Some(RootMetadata::decode(encoded)))
    }

    /// Repoints `id` at a new root and point count, leaving its rect unchanged.
    pub fn set_root(&self, id: u64, root: Hash) -> anyhow::Result<()> {
        let ns = Keccak256Hasher::hash(ROOT_NS);

        self.host.set_persistent_slot(&ns, &id_key(id), root)
    }

    fn set_metadata(&self, id: u64, metadata: RootMetadata) -> anyhow::Result<()> {
        let ns = Keccak256Hasher::hash(METADATA_NS);

        self.host
            .set_persistent_slot(&ns, &id_key(id), metadata.encode())
    }

    /// Updates the point count for `id`, leaving its rect unchanged.
    pub fn set_size(&self, id: u64, size: u32) -> anyhow::Result<()> {
        let Some(mut metadata) = self.get_metadata(id)? else {
            anyhow::bail!("no quadtree registered under id {id}");
        };

        metadata.size = size;

        self.set_metadata(id, metadata)
    }

    /// Duplicates `id`'s current root and metadata under a freshly allocated id.
    pub fn duplicate(&self, id: u64) -> anyhow::Result<u64> {
        let root = self
            .get_root(id)?
            .ok_or_else(|| anyhow::anyhow!("no quadtree registered under id {id}"))?;
        let metadata = self
            .get_metadata(id)?
            .ok_or_else(|| anyhow::anyhow!("no quadtree registered under id {id}"))?;

        self.create(root, metadata)
    }

    /// Tombstones `id`.
    ///
    /// If `id` was the most recently allocated handle (`counter == id + 1`), the counter is
    /// rolled back so the id can be reallocated: no other handle has ever observed it, so
    /// reusing it cannot create ambiguity. Any other delete leaves a permanent gap.
    pub fn delete(&self, id: u64) -> anyhow::Result<()> {
        let root_ns = Keccak256Hasher::hash(ROOT_NS);
        let metadata_ns = Keccak256Hasher::hash(METADATA_NS);
        let counter_ns = Keccak256Hasher::hash(COUNTER_NS);

        self.host.set_persistent_slot(&root_ns, &id_key(id), ZERO_HASH)?;
        self.host.set_persistent_slot(&metadata_ns, &id_key(id), ZERO_HASH)?;

        let counter = self.host.get_persistent_counter(&counter_ns)?;

        if counter == id + 1 {
            self.host.set_persistent_counter(&counter_ns, id)?;
        }

        Ok(())
    }

    /// Returns `true` if `id` refers to a live (non-deleted, allocated) handle.
    pub fn exists(&self, id: u64) -> anyhow::Result<bool> {
        let counter_ns = Keccak256Hasher::hash(COUNTER_NS);
        let counter = self.host.get_persistent_counter(&counter_ns)?;

        if id >= counter {
            return Ok(false);
        }

        let root_ns = Keccak256Hasher::hash(ROOT_NS);
        let root = self.host.get_persistent_slot(&root_ns, &id_key(id))?;

        Ok(root != ZERO_HASH)
    }
}

fn id_key(id: u64) -> Hash {
    let mut key = ZERO_HASH;

    key[24..32].copy_from_slice(&id.to_be_bytes());

    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryHost;

    #[test]
    fn create_then_get_round_trips() {
        let registry = RootRegistry::new(MemoryHost::default());
        let root = [7u8; 32];
        let rect = Rect::new(0, 0, 100, 100);

        let id = registry.create(root, RootMetadata { size: 0, rect }).unwrap();

        assert_eq!(registry.get_root(id).unwrap(), Some(root));
        assert_eq!(registry.get_metadata(id).unwrap().unwrap().rect, rect);
    }

    #[test]
    fn delete_of_most_recent_id_rolls_back_counter() {
        let registry = RootRegistry::new(MemoryHost::default());
        let rect = Rect::new(0, 0, 10, 10);

        let first = registry.create([1u8; 32], RootMetadata { size: 0, rect }).unwrap();
        let second = registry
            .create([2u8; 32], RootMetadata { size: 0, rect })
            .unwrap();

        registry.delete(second).unwrap();

        let reused = registry.create([3u8; 32], RootMetadata { size: 0, rect }).unwrap();

        assert_eq!(reused, second);
        assert_ne!(reused, first);
    }

    #[test]
    fn delete_of_older_id_leaves_a_gap() {
        let registry = RootRegistry::new(MemoryHost::default());
        let rect = Rect::new(0, 0, 10, 10);

        let first = registry.create([1u8; 32], RootMetadata { size: 0, rect }).unwrap();
        let second = registry
            .create([2u8; 32], RootMetadata { size: 0, rect })
            .unwrap();

        registry.delete(first).unwrap();

        let third = registry.create([3u8; 32], RootMetadata { size: 0, rect }).unwrap();

        assert!(!registry.exists(first).unwrap());
        assert!(registry.exists(second).unwrap());
        assert_ne!(third, first);
        assert_ne!(third, second);
    }

    #[test]
    fn delete_zeros_both_the_root_and_metadata_slots() {
        let registry = RootRegistry::new(MemoryHost::default());
        let rect = Rect::new(0, 0, 10, 10);

        let first = registry.create([1u8; 32], RootMetadata { size: 0, rect }).unwrap();
        let _second = registry
            .create([2u8; 32], RootMetadata { size: 0, rect })
            .unwrap();

        registry.delete(first).unwrap();

        let host = &registry.host;
        let root_ns = Keccak256Hasher::hash(ROOT_NS);
        let metadata_ns = Keccak256Hasher::hash(METADATA_NS);

        assert_eq!(host.get_persistent_slot(&root_ns, &id_key(first)).unwrap(), ZERO_HASH);
        assert_eq!(host.get_persistent_slot(&metadata_ns, &id_key(first)).unwrap(), ZERO_HASH);
    }
}
