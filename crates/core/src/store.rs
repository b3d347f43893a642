use quadrosol_merkle::NodeStore;
use quadrosol_types::{Hash, HostStorage};

/// A [`NodeStore`] backed by a [`HostStorage`], implementing the two-tier get/put the
/// specification describes: reads check the ephemeral tier first and fall back to the
/// persistent tier, writes always land in the ephemeral tier.
///
/// Promotion from ephemeral to persistent happens only in the commit protocol, never here.
#[derive(Debug, Clone)]
pub struct HostNodeStore<S> {
    host: S,
}

impl<S: HostStorage> HostNodeStore<S> {
    /// Wraps a host into a node store.
    pub fn new(host: S) -> Self {
        Self { host }
    }

    /// Returns the wrapped host.
    pub fn host(&self) -> &S {
        &self.host
    }
}

impl<S: HostStorage> NodeStore for HostNodeStore<S> {
    fn get(&self, hash: &Hash) -> anyhow::Result<Option<Vec<u8>>> {
        if let Some(data) = self.host.get_ephemeral_preimage(hash)? {
            return Ok(Some(data));
        }

        self.host.get_persistent_preimage(hash)
    }

    fn put(&self, hash: &Hash, data: &[u8]) -> anyhow::Result<()> {
        self.host.add_ephemeral_preimage(hash, data)
    }
}
