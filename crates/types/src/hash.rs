use sha3::{Digest, Keccak256};

/// The hash output byte-length used throughout the node store and root registry.
pub const HASH_LEN: usize = 32;

/// The hash output array used throughout the node store and root registry.
pub type Hash = [u8; HASH_LEN];

/// The well-known zero hash, used as a sentinel for "no root" / tombstoned handles.
pub const ZERO_HASH: Hash = [0u8; HASH_LEN];

/// The hashing primitive used to content-address quadtree nodes.
///
/// The codec's canonical form depends on a single, fixed hash function: the hash *is* the
/// storage key, so swapping implementations would silently partition an existing store.
pub trait Hasher: Clone {
    /// Hashes the provided bytes.
    fn hash(data: &[u8]) -> Hash;
}

/// The Keccak256 hasher used by the core, matching the wire format's `Hash(core) =
/// Keccak256(Encode(core))` definition.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keccak256Hasher;

impl Hasher for Keccak256Hasher {
    fn hash(data: &[u8]) -> Hash {
        let mut hasher = Keccak256::new();

        hasher.update(data);

        hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let a = Keccak256Hasher::hash(b"quadrosol");
        let b = Keccak256Hasher::hash(b"quadrosol");

        assert_eq!(a, b);
    }

    #[test]
    fn empty_leaf_hash_is_stable_and_nonzero() {
        // The empty leaf encodes to the single byte 0x00 (see the node codec in
        // `quadrosol-merkle`); its hash must be a fixed, nonzero constant so it can be used as
        // the initial root of a freshly created tree.
        let empty_leaf_hash = Keccak256Hasher::hash(&[0x00]);

        assert_ne!(empty_leaf_hash, ZERO_HASH);
        assert_eq!(empty_leaf_hash, Keccak256Hasher::hash(&[0x00]));
    }
}
