use core::marker::PhantomData;

use alloc::vec::Vec;
use quadrosol_types::{Hash, Hasher, Point, Quadrant, Rect};

use crate::{DegenerateSplit, NodeStore, QuadNode};

/// The maximum number of points a leaf may hold before an insert forces a split.
///
/// Fixed by the node codec: a leaf's leading byte doubles as its point count and must stay in
/// `0..=4` to remain distinguishable from the internal node tag `0xF0`. [`TreeConfig::leaf_capacity`]
/// may be tuned below this ceiling but never above it.
pub const LEAF_CAPACITY: usize = 4;

/// Tunable parameters for a [`QuadTreeMerkle`] instance, threaded through at construction rather
/// than hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Upper bound on how many points a leaf may hold before an insert forces a split. Must not
    /// exceed [`LEAF_CAPACITY`].
    pub leaf_capacity: usize,
    /// A rect whose width and height are both within this bound (absolute value) can no longer
    /// be meaningfully subdivided: a split attempted against it returns [`DegenerateSplit`]
    /// instead of recursing forever.
    pub degenerate_split_threshold: i32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            leaf_capacity: LEAF_CAPACITY,
            degenerate_split_threshold: 1,
        }
    }
}

/// The storage-agnostic Merkle quadtree engine.
///
/// A tree is addressed entirely by a root [`Hash`] plus the [`Rect`] it was created over; this
/// type carries neither, holding only a reference to the backing [`NodeStore`]. Every operation
/// takes the root and rect explicitly and returns a new root, matching the structure-sharing,
/// immutable-node model described by the specification: no node is ever mutated in place.
#[derive(Debug, Clone, Copy)]
pub struct QuadTreeMerkle<S, H> {
    store: S,
    config: TreeConfig,
    _hasher: PhantomData<H>,
}

impl<S, H> QuadTreeMerkle<S, H>
where
    S: NodeStore,
    H: Hasher,
{
    /// Wraps a [`NodeStore`] into a tree engine, using the default [`TreeConfig`].
    pub fn new(store: S) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    /// Wraps a [`NodeStore`] into a tree engine with an explicit [`TreeConfig`].
    pub fn with_config(store: S, config: TreeConfig) -> Self {
        Self {
            store,
            config,
            _hasher: PhantomData,
        }
    }

    /// The root hash of a freshly created, empty tree.
    ///
    /// Stateless and pure: an empty tree always hashes to the same value regardless of rect, so
    /// callers may compute it without touching the store.
    pub fn empty_root(&self) -> anyhow::Result<Hash> {
        let empty = QuadNode::empty_leaf();
        let hash = empty.hash::<H>();

        self.store.put(&hash, &empty.encode())?;

        Ok(hash)
    }

    /// Loads the node at `hash`.
    pub fn load(&self, hash: &Hash) -> anyhow::Result<QuadNode> {
        let bytes = self
            .store
            .get(hash)?
            .ok_or_else(|| anyhow::anyhow!("quadtree node {} missing from store", hex(hash)))?;

        Ok(QuadNode::decode(&bytes))
    }

    fn store_node(&self, node: &QuadNode) -> anyhow::Result<Hash> {
        let hash = node.hash::<H>();

        self.store.put(&hash, &node.encode())?;

        Ok(hash)
    }

    /// Returns `true` if `point` lies anywhere within the tree rooted at `root`.
    pub fn contains(&self, root: &Hash, rect: &Rect, point: &Point) -> anyhow::Result<bool> {
        if !rect.contains(point) {
            return Ok(false);
        }

        match self.load(root)? {
            QuadNode::Leaf(points) => Ok(points.contains(point)),
            QuadNode::Internal(children) => {
                let q = rect.which_quadrant(point);
                let child_rect = rect.quadrant(q);

                self.contains(&children[q.index()], &child_rect, point)
            }
        }
    }

    /// Inserts `point` into the tree rooted at `root`, returning the new root and whether the
    /// insert actually changed anything.
    ///
    /// A point outside `rect` or already present is rejected: the returned root equals `root`
    /// and the returned flag is `false`. The tree stores a set of points, not a multiset.
    pub fn insert(&self, root: &Hash, rect: &Rect, point: Point) -> anyhow::Result<(Hash, bool)> {
        if !rect.contains(&point) {
            return Ok((*root, false));
        }

        match self.load(root)? {
            QuadNode::Leaf(mut points) => {
                if points.contains(&point) {
                    return Ok((*root, false));
                }

                if points.len() < self.config.leaf_capacity {
                    points.push(point);

                    Ok((self.store_node(&QuadNode::Leaf(points))?, true))
                } else {
                    Ok((self.split_and_insert(rect, points, point)?, true))
                }
            }
            QuadNode::Internal(mut children) => {
                let q = rect.which_quadrant(&point);
                let child_rect = rect.quadrant(q);

                let (new_child, changed) = self.insert(&children[q.index()], &child_rect, point)?;

                if !changed {
                    return Ok((*root, false));
                }

                children[q.index()] = new_child;

                Ok((self.store_node(&QuadNode::Internal(children))?, true))
            }
        }
    }

    fn split_and_insert(
        &self,
        rect: &Rect,
        existing: Vec<Point>,
        incoming: Point,
    ) -> anyhow::Result<Hash> {
        let threshold = self.config.degenerate_split_threshold;

        if rect.width().abs() <= threshold && rect.height().abs() <= threshold {
            return Err(anyhow::Error::new(DegenerateSplit));
        }

        let empty_hash = self.empty_root()?;
        let mut children = [empty_hash; 4];

        for p in existing.into_iter().chain(core::iter::once(incoming)) {
            let q = rect.which_quadrant(&p);
            let child_rect = rect.quadrant(q);

            let (new_child, _changed) = self.insert(&children[q.index()], &child_rect, p)?;

            children[q.index()] = new_child;
        }

        self.store_node(&QuadNode::Internal(children))
    }

    /// Removes one occurrence of `point` from the tree rooted at `root`, returning the new root
    /// and whether the point was actually present.
    ///
    /// Removing a point that is not present is a no-op: the returned root equals `root` and the
    /// returned flag is `false`. Leaves emptied by a removal are never merged back into their
    /// parent: the tree treats structural sharing, not compaction, as its invariant.
    pub fn remove(&self, root: &Hash, rect: &Rect, point: &Point) -> anyhow::Result<(Hash, bool)> {
        match self.load(root)? {
            QuadNode::Leaf(mut points) => {
                if let Some(index) = points.iter().position(|p| p == point) {
                    points.remove(index);

                    Ok((self.store_node(&QuadNode::Leaf(points))?, true))
                } else {
                    Ok((*root, false))
                }
            }
            QuadNode::Internal(mut children) => {
                let q = rect.which_quadrant(point);
                let child_rect = rect.quadrant(q);

                let (new_child, changed) = self.remove(&children[q.index()], &child_rect, point)?;

                if !changed {
                    return Ok((*root, false));
                }

                children[q.index()] = new_child;

                Ok((self.store_node(&QuadNode::Internal(children))?, true))
            }
        }
    }

    /// Returns the child hash and rect for `quadrant` of the internal node at `node`.
    ///
    /// Returns `None` if `node` is a leaf.
    pub fn get_quad(
        &self,
        node: &Hash,
        rect: &Rect,
        quadrant: Quadrant,
    ) -> anyhow::Result<Option<(Hash, Rect)>> {
        match self.load(node)? {
            QuadNode::Leaf(_) => Ok(None),
            QuadNode::Internal(children) => {
                Ok(Some((children[quadrant.index()], rect.quadrant(quadrant))))
            }
        }
    }
}

fn hex(hash: &Hash) -> alloc::string::String {
    let mut s = alloc::string::String::with_capacity(hash.len() * 2);

    for byte in hash {
        s.push_str(&alloc::format!("{byte:02x}"));
    }

    s
}
