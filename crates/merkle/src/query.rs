use alloc::vec::Vec;

use quadrosol_types::{Circle, Hash, Hasher, Point, Quadrant, Rect};

use crate::{NearestNeighborQueue, NodeStore, QuadNode, QuadTreeMerkle};

impl<S, H> QuadTreeMerkle<S, H>
where
    S: NodeStore,
    H: Hasher,
{
    /// Collects every point stored in the tree rooted at `root`.
    pub fn all_points(&self, root: &Hash) -> anyhow::Result<Vec<Point>> {
        let mut out = Vec::new();

        self.collect_all(root, &mut out)?;

        Ok(out)
    }

    fn collect_all(&self, node: &Hash, out: &mut Vec<Point>) -> anyhow::Result<()> {
        match self.load(node)? {
            QuadNode::Leaf(points) => out.extend(points),
            QuadNode::Internal(children) => {
                for child in &children {
                    self.collect_all(child, out)?;
                }
            }
        }

        Ok(())
    }

    /// Returns every point in the tree that lies within `query`.
    pub fn search_rect(&self, root: &Hash, rect: &Rect, query: &Rect) -> anyhow::Result<Vec<Point>> {
        let mut out = Vec::new();

        self.collect_rect(root, rect, query, &mut out)?;

        Ok(out)
    }

    fn collect_rect(
        &self,
        node: &Hash,
        rect: &Rect,
        query: &Rect,
        out: &mut Vec<Point>,
    ) -> anyhow::Result<()> {
        if !rect.intersects_rect(query) {
            return Ok(());
        }

        match self.load(node)? {
            QuadNode::Leaf(points) => out.extend(points.into_iter().filter(|p| query.contains(p))),
            QuadNode::Internal(children) => {
                for quadrant in Quadrant::ALL {
                    let child_rect = rect.quadrant(quadrant);

                    self.collect_rect(&children[quadrant.index()], &child_rect, query, out)?;
                }
            }
        }

        Ok(())
    }

    /// Returns every point in the tree that lies within `query`.
    pub fn search_circle(
        &self,
        root: &Hash,
        rect: &Rect,
        query: &Circle,
    ) -> anyhow::Result<Vec<Point>> {
        let mut out = Vec::new();

        self.collect_circle(root, rect, query, &mut out)?;

        Ok(out)
    }

    fn collect_circle(
        &self,
        node: &Hash,
        rect: &Rect,
        query: &Circle,
        out: &mut Vec<Point>,
    ) -> anyhow::Result<()> {
        if !rect.intersects_circle(query) {
            return Ok(());
        }

        match self.load(node)? {
            QuadNode::Leaf(points) => out.extend(points.into_iter().filter(|p| query.contains(p))),
            QuadNode::Internal(children) => {
                for quadrant in Quadrant::ALL {
                    let child_rect = rect.quadrant(quadrant);

                    self.collect_circle(&children[quadrant.index()], &child_rect, query, out)?;
                }
            }
        }

        Ok(())
    }

    /// Returns up to `k` points nearest to `query`, ordered nearest-first.
    ///
    /// Descends into the quadrant containing `query` first: that ordering fills the bounded
    /// queue with a strong candidate early, so the squared-distance pruning of the remaining
    /// quadrants rejects far more subtrees without ever visiting them.
    pub fn k_nearest(&self, root: &Hash, rect: &Rect, query: &Point, k: usize) -> anyhow::Result<Vec<Point>> {
        let mut queue = NearestNeighborQueue::new(k);

        self.collect_nearest(root, rect, query, &mut queue)?;

        Ok(queue.into_sorted_points())
    }

    fn collect_nearest(
        &self,
        node: &Hash,
        rect: &Rect,
        query: &Point,
        queue: &mut NearestNeighborQueue,
    ) -> anyhow::Result<()> {
        match self.load(node)? {
            QuadNode::Leaf(points) => {
                for p in points {
                    queue.push(p, rect_point_priority(&p, query));
                }
            }
            QuadNode::Internal(children) => {
                let primary = rect.which_quadrant(query);
                let mut order = [
                    Quadrant::TopLeft,
                    Quadrant::TopRight,
                    Quadrant::BottomLeft,
                    Quadrant::BottomRight,
                ];

                order.sort_by_key(|q| if *q == primary { 0 } else { 1 });

                for quadrant in order {
                    let child_rect = rect.quadrant(quadrant);

                    if !queue.is_full()
                        || child_rect.squared_distance_to_point(query)
                            <= queue.peek_priority().unwrap_or(i64::MAX)
                    {
                        self.collect_nearest(&children[quadrant.index()], &child_rect, query, queue)?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn rect_point_priority(p: &Point, query: &Point) -> i64 {
    p.squared_distance(query)
}

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use core::cell::RefCell;

    use quadrosol_types::Keccak256Hasher;

    use super::*;
    use crate::NodeStore;

    #[derive(Default)]
    struct MemoryStore {
        nodes: RefCell<BTreeMap<Hash, alloc::vec::Vec<u8>>>,
    }

    impl NodeStore for MemoryStore {
        fn get(&self, hash: &Hash) -> anyhow::Result<Option<alloc::vec::Vec<u8>>> {
            Ok(self.nodes.borrow().get(hash).cloned())
        }

        fn put(&self, hash: &Hash, data: &[u8]) -> anyhow::Result<()> {
            self.nodes.borrow_mut().insert(*hash, data.to_vec());

            Ok(())
        }
    }

    fn seeded_tree() -> (QuadTreeMerkle<MemoryStore, Keccak256Hasher>, Hash, Rect) {
        let t = QuadTreeMerkle::new(MemoryStore::default());
        let rect = Rect::new(-100, -100, 200, 200);
        let mut root = t.empty_root().unwrap();

        for p in [
            Point::new(1, 1),
            Point::new(-1, -1),
            Point::new(50, 50),
            Point::new(-50, -50),
            Point::new(2, 2),
            Point::new(3, 3),
        ] {
            root = t.insert(&root, &rect, p).unwrap().0;
        }

        (t, root, rect)
    }

    #[test]
    fn search_rect_filters_to_query() {
        let (t, root, rect) = seeded_tree();
        let query = Rect::new(0, 0, 10, 10);

        let mut found = t.search_rect(&root, &rect, &query).unwrap();
        found.sort();

        let mut expected = alloc::vec![Point::new(1, 1), Point::new(2, 2), Point::new(3, 3)];
        expected.sort();

        assert_eq!(found, expected);
    }

    #[test]
    fn search_circle_filters_to_query() {
        let (t, root, rect) = seeded_tree();
        let query = Circle::new(Point::new(0, 0), 2);

        let found = t.search_circle(&root, &rect, &query).unwrap();

        assert!(found.contains(&Point::new(1, 1)));
        assert!(found.contains(&Point::new(-1, -1)));
        assert!(!found.contains(&Point::new(50, 50)));
    }

    #[test]
    fn k_nearest_orders_by_distance() {
        let (t, root, rect) = seeded_tree();

        let nearest = t.k_nearest(&root, &rect, &Point::new(0, 0), 2).unwrap();

        assert_eq!(nearest.len(), 2);

        let dists: alloc::vec::Vec<i64> = nearest.iter().map(|p| p.squared_distance(&Point::new(0, 0))).collect();

        assert!(dists.windows(2).all(|w| w[0] <= w[1]));
        assert!(nearest.contains(&Point::new(1, 1)) || nearest.contains(&Point::new(-1, -1)));
    }

    #[test]
    fn all_points_returns_every_insert() {
        let (t, root, _rect) = seeded_tree();

        let mut points = t.all_points(&root).unwrap();
        points.sort();

        let mut expected = alloc::vec![
            Point::new(1, 1),
            Point::new(-1, -1),
            Point::new(50, 50),
            Point::new(-50, -50),
            Point::new(2, 2),
            Point::new(3, 3),
        ];
        expected.sort();

        assert_eq!(points, expected);
    }
}
