use hashbrown::HashSet;
use quadrosol_merkle::QuadNode;
use quadrosol_types::{Hash, HostStorage, ZERO_HASH};

use crate::DirtiesTracker;

/// Promotes every dirty root reachable from the current transaction's dirties tracker from the
/// ephemeral tier to the persistent tier, then clears the ephemeral tier.
///
/// The visited set is shared across the whole pass, not just within a single root's walk, so a
/// node shared by two dirty roots is only read and written once. Unlike the historical
/// implementation this is modeled on, the visited set has no size cap: it grows to the size of
/// the actual working set for the transaction.
pub fn commit<S: HostStorage>(host: &S) -> anyhow::Result<()> {
    let dirties = DirtiesTracker::new(host.clone()).dirties()?;
    let mut visited = HashSet::new();

    tracing::debug!(count = dirties.len(), "promoting dirty roots to persistent tier");

    for root in dirties {
        promote(host, &root, &mut visited)?;
    }

    host.clear_ephemeral()
}

fn promote<S: HostStorage>(
    host: &S,
    hash: &Hash,
    visited: &mut HashSet<Hash>,
) -> anyhow::Result<()> {
    if hash == &ZERO_HASH || !visited.insert(*hash) {
        return Ok(());
    }

    if host.get_persistent_preimage(hash)?.is_some() {
        return Ok(());
    }

    let Some(data) = host.get_ephemeral_preimage(hash)? else {
        // Already promoted by an earlier commit, or never created in this transaction at all —
        // either way there is nothing left to walk.
        return Ok(());
    };

    host.add_persistent_preimage(hash, &data)?;

    if let QuadNode::Internal(children) = QuadNode::decode(&data) {
        for child in &children {
            promote(host, child, visited)?;
        }
    }

    Ok(())
}
