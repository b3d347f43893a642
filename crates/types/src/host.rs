use alloc::vec::Vec;

use crate::Hash;

/// The storage surface the host state machine must expose to this precompile.
///
/// This is the external collaborator boundary described by the specification: everything on
/// the other side of this trait (the concrete key-value engine, its snapshotting, its
/// durability guarantees) is out of scope for this crate. Implementations are provided by the
/// host; this crate ships only an in-memory reference implementation for tests
/// (`quadrosol-core::MemoryHost`).
///
/// Every method is namespaced by a 32-byte domain separator so a single backing store can host
/// the node preimages, the root registry's mappings, and the dirties tracker without key
/// collisions.
pub trait HostStorage: Clone {
    /// Reads a content-addressed node preimage from the ephemeral (transaction-scoped) tier.
    fn get_ephemeral_preimage(&self, key: &Hash) -> anyhow::Result<Option<Vec<u8>>>;

    /// Writes a content-addressed node preimage to the ephemeral tier. Idempotent.
    fn add_ephemeral_preimage(&self, key: &Hash, value: &[u8]) -> anyhow::Result<()>;

    /// Reads a content-addressed node preimage from the persistent (durable) tier.
    fn get_persistent_preimage(&self, key: &Hash) -> anyhow::Result<Option<Vec<u8>>>;

    /// Writes a content-addressed node preimage to the persistent tier. Called only by the
    /// commit protocol, never directly by tree mutations.
    fn add_persistent_preimage(&self, key: &Hash, value: &[u8]) -> anyhow::Result<()>;

    /// Discards every ephemeral preimage, mapping slot, and set membership. Called by the host
    /// on transaction abort.
    fn clear_ephemeral(&self) -> anyhow::Result<()>;

    /// Reads a 32-byte slot from a persistent key-value mapping.
    ///
    /// Returns [`crate::ZERO_HASH`] for an unset slot, matching the host's zero-valued default
    /// storage semantics.
    fn get_persistent_slot(&self, namespace: &Hash, key: &Hash) -> anyhow::Result<Hash>;

    /// Writes a 32-byte slot in a persistent key-value mapping.
    fn set_persistent_slot(&self, namespace: &Hash, key: &Hash, value: Hash) -> anyhow::Result<()>;

    /// Reads a persistent monotonic counter, defaulting to zero.
    fn get_persistent_counter(&self, namespace: &Hash) -> anyhow::Result<u64>;

    /// Writes a persistent monotonic counter.
    fn set_persistent_counter(&self, namespace: &Hash, value: u64) -> anyhow::Result<()>;

    /// Reads a 32-byte slot from an ephemeral key-value mapping (used by the dirties tracker's
    /// refcounts).
    fn get_ephemeral_slot(&self, namespace: &Hash, key: &Hash) -> anyhow::Result<Hash>;

    /// Writes a 32-byte slot in an ephemeral key-value mapping.
    fn set_ephemeral_slot(&self, namespace: &Hash, key: &Hash, value: Hash) -> anyhow::Result<()>;

    /// Adds `member` to an ephemeral set.
    fn ephemeral_set_insert(&self, namespace: &Hash, member: &Hash) -> anyhow::Result<()>;

    /// Removes `member` from an ephemeral set.
    fn ephemeral_set_remove(&self, namespace: &Hash, member: &Hash) -> anyhow::Result<()>;

    /// Returns every member currently in an ephemeral set.
    fn ephemeral_set_members(&self, namespace: &Hash) -> anyhow::Result<Vec<Hash>>;
}
