use std::sync::{Arc, Mutex};

use hashbrown::{HashMap, HashSet};
use quadrosol_types::{Hash, HostStorage};

/// An in-memory [`HostStorage`], used by this crate's own tests and available to downstream
/// consumers that need a host without standing up a real key-value engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    ephemeral_preimages: Arc<Mutex<HashMap<Hash, Vec<u8>>>>,
    persistent_preimages: Arc<Mutex<HashMap<Hash, Vec<u8>>>>,
    persistent_slots: Arc<Mutex<HashMap<(Hash, Hash), Hash>>>,
    persistent_counters: Arc<Mutex<HashMap<Hash, u64>>>,
    ephemeral_slots: Arc<Mutex<HashMap<(Hash, Hash), Hash>>>,
    ephemeral_sets: Arc<Mutex<HashMap<Hash, HashSet<Hash>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> anyhow::Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|e| anyhow::anyhow!("failed to lock in-memory host storage: {e}"))
}

impl HostStorage for MemoryHost {
    fn get_ephemeral_preimage(&self, key: &Hash) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(lock(&self.ephemeral_preimages)?.get(key).cloned())
    }

    fn add_ephemeral_preimage(&self, key: &Hash, value: &[u8]) -> anyhow::Result<()> {
        lock(&self.ephemeral_preimages)?.insert(*key, value.to_vec());

        Ok(())
    }

    fn get_persistent_preimage(&self, key: &Hash) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(lock(&self.persistent_preimages)?.get(key).cloned())
    }

    fn add_persistent_preimage(&self, key: &Hash, value: &[u8]) -> anyhow::Result<()> {
        lock(&self.persistent_preimages)?.insert(*key, value.to_vec());

        Ok(())
    }

    fn clear_ephemeral(&self) -> anyhow::Result<()> {
        lock(&self.ephemeral_preimages)?.clear();
        lock(&self.ephemeral_slots)?.clear();
        lock(&self.ephemeral_sets)?.clear();

        Ok(())
    }

    fn get_persistent_slot(&self, namespace: &Hash, key: &Hash) -> anyhow::Result<Hash> {
        Ok(lock(&self.persistent_slots)?
            .get(&(*namespace, *key))
            .copied()
            .unwrap_or_default())
    }

    fn set_persistent_slot(&self, namespace: &Hash, key: &Hash, value: Hash) -> anyhow::Result<()> {
        lock(&self.persistent_slots)?.insert((*namespace, *key), value);

        Ok(())
    }

    fn get_persistent_counter(&self, namespace: &Hash) -> anyhow::Result<u64> {
        Ok(lock(&self.persistent_counters)?
            .get(namespace)
            .copied()
            .unwrap_or_default())
    }

    fn set_persistent_counter(&self, namespace: &Hash, value: u64) -> anyhow::Result<()> {
        lock(&self.persistent_counters)?.insert(*namespace, value);

        Ok(())
    }

    fn get_ephemeral_slot(&self, namespace: &Hash, key: &Hash) -> anyhow::Result<Hash> {
        Ok(lock(&self.ephemeral_slots)?
            .get(&(*namespace, *key))
            .copied()
            .unwrap_or_default())
    }

    fn set_ephemeral_slot(&self, namespace: &Hash, key: &Hash, value: Hash) -> anyhow::Result<()> {
        lock(&self.ephemeral_slots)?.insert((*namespace, *key), value);

        Ok(())
    }

    fn ephemeral_set_insert(&self, namespace: &Hash, member: &Hash) -> anyhow::Result<()> {
        lock(&self.ephemeral_sets)?
            .entry(*namespace)
            .or_default()
            .insert(*member);

        Ok(())
    }

    fn ephemeral_set_remove(&self, namespace: &Hash, member: &Hash) -> anyhow::Result<()> {
        if let Some(set) = lock(&self.ephemeral_sets)?.get_mut(namespace) {
            set.remove(member);
        }

        Ok(())
    }

    fn ephemeral_set_members(&self, namespace: &Hash) -> anyhow::Result<Vec<Hash>> {
        Ok(lock(&self.ephemeral_sets)?
            .get(namespace)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }
}
