use alloc::vec::Vec;

use quadrosol_types::{Hash, Hasher, Point};

const TAG_INTERNAL: u8 = 0xF0;
const MAX_LEAF_POINTS: usize = 4;

/// A single node in the Merkle quadtree.
///
/// A node is either a leaf holding up to [`MAX_LEAF_POINTS`] points, or an internal node
/// holding the content-addresses of its four children in [`quadrosol_types::Quadrant`] order.
/// The wire encoding of this enum is the tree's storage key: `Hash(node) = Keccak256(Encode(node))`,
/// so the encoding below must never change shape without partitioning every tree already in
/// storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadNode {
    /// A leaf, holding zero to four points in insertion order.
    Leaf(Vec<Point>),
    /// An internal node, holding the hash of each of its four quadrant children.
    Internal([Hash; 4]),
}

impl QuadNode {
    /// An empty leaf, the canonical contents of a freshly created tree's root.
    pub fn empty_leaf() -> Self {
        QuadNode::Leaf(Vec::new())
    }

    /// Returns `true` if this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, QuadNode::Leaf(_))
    }

    /// Encodes the node to its canonical byte representation.
    ///
    /// Leaf: `[n: u8][n * (x: i32 LE, y: i32 LE)]`, `n` in `0..=4`.
    /// Internal: `[0xF0][hash; 4]`, 32 bytes per hash.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            QuadNode::Leaf(points) => {
                debug_assert!(points.len() <= MAX_LEAF_POINTS);

                let mut out = Vec::with_capacity(1 + points.len() * 8);

                out.push(points.len() as u8);

                for p in points {
                    out.extend_from_slice(&p.x.to_le_bytes());
                    out.extend_from_slice(&p.y.to_le_bytes());
                }

                out
            }
            QuadNode::Internal(children) => {
                let mut out = Vec::with_capacity(1 + 4 * 32);

                out.push(TAG_INTERNAL);

                for child in children {
                    out.extend_from_slice(child);
                }

                out
            }
        }
    }

    /// Decodes a node from its canonical byte representation.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is empty or its leading byte is neither `0..=4` nor `0xF0`, or if the
    /// remaining bytes don't match the length implied by the leading byte. A store that can only
    /// ever contain bytes produced by [`QuadNode::encode`] should never trigger this: reaching it
    /// means the backing store is corrupt.
    pub fn decode(bytes: &[u8]) -> Self {
        let tag = *bytes.first().expect("corrupt quadtree node: empty bytes");

        if tag == TAG_INTERNAL {
            assert_eq!(
                bytes.len(),
                1 + 4 * 32,
                "corrupt quadtree node: bad internal node length"
            );

            let mut children = [Hash::default(); 4];

            for (i, child) in children.iter_mut().enumerate() {
                let start = 1 + i * 32;

                child.copy_from_slice(&bytes[start..start + 32]);
            }

            return QuadNode::Internal(children);
        }

        assert!(
            (tag as usize) <= MAX_LEAF_POINTS,
            "corrupt quadtree node: invalid leading byte {tag:#x}"
        );

        let n = tag as usize;

        assert_eq!(
            bytes.len(),
            1 + n * 8,
            "corrupt quadtree node: bad leaf node length"
        );

        let mut points = Vec::with_capacity(n);

        for i in 0..n {
            let start = 1 + i * 8;
            let x = i32::from_le_bytes(bytes[start..start + 4].try_into().unwrap());
            let y = i32::from_le_bytes(bytes[start + 4..start + 8].try_into().unwrap());

            points.push(Point::new(x, y));
        }

        QuadNode::Leaf(points)
    }

    /// Hashes the node's canonical encoding.
    pub fn hash<H: Hasher>(&self) -> Hash {
        H::hash(&self.encode())
    }
}
