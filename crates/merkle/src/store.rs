use alloc::vec::Vec;
use core::fmt;

use quadrosol_types::Hash;

/// The storage collaborator this crate needs: content-addressed get/put of node preimages.
///
/// This crate is deliberately ignorant of ephemeral vs. persistent tiers, promotion, and commit
/// protocols — a [`NodeStore`] implementation decides what "put" means. `quadrosol-core`'s
/// implementation writes only to the ephemeral tier and falls back to the persistent tier on
/// read miss, per the specification's two-tier storage model.
pub trait NodeStore {
    /// Reads a node preimage by its content hash.
    fn get(&self, hash: &Hash) -> anyhow::Result<Option<Vec<u8>>>;

    /// Writes a node preimage, keyed by its content hash.
    fn put(&self, hash: &Hash, data: &[u8]) -> anyhow::Result<()>;
}

/// A marker error signaling that an insert reached a leaf whose bounding rect can no longer be
/// meaningfully subdivided.
///
/// A quadrant split halves width and height (rounded toward zero); once both are `<= 1`, the two
/// child rects on at least one axis collapse to the same extent as the parent, so splitting never
/// converges toward separating the points. Callers should surface this as a request-level error
/// rather than let the recursion continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateSplit;

impl fmt::Display for DegenerateSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("quadtree rect is too small to split further")
    }
}

impl core::error::Error for DegenerateSplit {}
