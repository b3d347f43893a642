use quadrosol_types::{Hash, Hasher, HostStorage, Keccak256Hasher, ZERO_HASH};

const DIRTIES_SET_NS: &[u8] = b"quadrosol.dirties.set.v0";
const DIRTIES_COUNT_NS: &[u8] = b"quadrosol.dirties.count.v0";

/// Tracks, for the current ephemeral transaction, which root hashes are the current root of at
/// least one live handle and have not yet been promoted to the persistent tier.
///
/// Multiple handles may share a root (duplication, or two inserts that happen to produce the
/// same tree), so membership is refcounted: a root leaves the dirty set only once every handle
/// pointing at it has been repointed elsewhere.
#[derive(Debug, Clone)]
pub struct DirtiesTracker<S> {
    host: S,
}

impl<S: HostStorage> DirtiesTracker<S> {
    /// Wraps a host into a dirties tracker.
    pub fn new(host: S) -> Self {
        Self { host }
    }

    /// Increments the refcount for `root`. A no-op for the zero-hash sentinel.
    pub fn inc(&self, root: &Hash) -> anyhow::Result<()> {
        if root == &ZERO_HASH {
            return Ok(());
        }

        let count = self.count(root)?;

        self.set_count(root, count + 1)?;

        if count == 0 {
            self.host
                .ephemeral_set_insert(&set_namespace(), root)?;
        }

        Ok(())
    }

    /// Decrements the refcount for `root`. A no-op for the zero-hash sentinel or a root that is
    /// not currently tracked.
    pub fn dec(&self, root: &Hash) -> anyhow::Result<()> {
        if root == &ZERO_HASH {
            return Ok(());
        }

        let count = self.count(root)?;

        if count == 0 {
            return Ok(());
        }

        self.set_count(root, count - 1)?;

        if count == 1 {
            self.host
                .ephemeral_set_remove(&set_namespace(), root)?;
        }

        Ok(())
    }

    /// Returns every root currently tracked as dirty.
    pub fn dirties(&self) -> anyhow::Result<Vec<Hash>> {
        self.host.ephemeral_set_members(&set_namespace())
    }

    fn count(&self, root: &Hash) -> anyhow::Result<u64> {
        let slot = self.host.get_ephemeral_slot(&count_namespace(), root)?;

        Ok(u64_from_hash(&slot))
    }

    fn set_count(&self, root: &Hash, count: u64) -> anyhow::Result<()> {
        self.host
            .set_ephemeral_slot(&count_namespace(), root, hash_from_u64(count))
    }
}

fn set_namespace() -> Hash {
    Keccak256Hasher::hash(DIRTIES_SET_NS)
}

fn count_namespace() -> Hash {
    Keccak256Hasher::hash(DIRTIES_COUNT_NS)
}

fn hash_from_u64(value: u64) -> Hash {
    let mut hash = ZERO_HASH;

    hash[24..32].copy_from_slice(&value.to_be_bytes());

    hash
}

fn u64_from_hash(hash: &Hash) -> u64 {
    u64::from_be_bytes(hash[24..32].try_into().unwrap())
}
