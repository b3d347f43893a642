use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;

use quadrosol_types::Point;

/// A candidate neighbor, ordered by its squared distance to the query point.
///
/// Squared distances are used throughout k-nearest-neighbor pruning so the priority queue never
/// needs floating point or a square root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Neighbor {
    point: Point,
    priority: i64,
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A bounded max-heap of the `k` closest points seen so far.
///
/// The heap always keeps its *worst* candidate at the top, so a full queue can reject a new
/// candidate in O(1) without scanning, and evict the worst in O(log k) when a better one arrives.
#[derive(Debug, Clone)]
pub struct NearestNeighborQueue {
    heap: BinaryHeap<Neighbor>,
    cap: usize,
}

impl NearestNeighborQueue {
    /// Creates a queue that will retain at most `cap` candidates.
    pub fn new(cap: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(cap),
            cap,
        }
    }

    /// The maximum number of candidates this queue will retain.
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// The number of candidates currently held.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if no candidates are held.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns `true` once the queue holds `cap` candidates.
    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.cap
    }

    /// The priority (squared distance) of the current worst candidate, if any.
    pub fn peek_priority(&self) -> Option<i64> {
        self.heap.peek().map(|n| n.priority)
    }

    /// Offers a candidate to the queue.
    ///
    /// If the queue has room, the candidate is always kept. Once full, a candidate is kept only
    /// if it is strictly closer than the current worst, which is then evicted.
    pub fn push(&mut self, point: Point, priority: i64) {
        if self.cap == 0 {
            return;
        }

        if self.heap.len() < self.cap {
            self.heap.push(Neighbor { point, priority });
            return;
        }

        if self.peek_priority().is_some_and(|worst| priority < worst) {
            self.heap.pop();
            self.heap.push(Neighbor { point, priority });
        }
    }

    /// Consumes the queue, returning its points ordered nearest-first.
    pub fn into_sorted_points(self) -> Vec<Point> {
        let mut entries: Vec<Neighbor> = self.heap.into_vec();

        entries.sort_by_key(|n| n.priority);

        entries.into_iter().map(|n| n.point).collect()
    }
}
