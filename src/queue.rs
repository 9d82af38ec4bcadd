//! Bucket priority queue used by the pathfinder.
//!
//! Buckets are indexed by integer priority. Each bucket heads an intrusive,
//! singly linked list threaded through the nodes themselves, so queuing never
//! allocates once the bucket array has grown to the largest priority seen.
use ndarray::Array2;

use crate::{cell::HexCell, cell_dim, CellIndex};

/// Storage the queue links its entries through.
pub(crate) trait SearchNodes {
    fn priority(&self, node: CellIndex) -> usize;
    fn next_with_same_priority(&self, node: CellIndex) -> Option<CellIndex>;
    fn set_next_with_same_priority(&mut self, node: CellIndex, next: Option<CellIndex>);
}

impl SearchNodes for Array2<HexCell> {
    #[inline]
    fn priority(&self, node: CellIndex) -> usize {
        self[cell_dim(node, self.ncols())].search_priority() as usize
    }

    #[inline]
    fn next_with_same_priority(&self, node: CellIndex) -> Option<CellIndex> {
        self[cell_dim(node, self.ncols())].search.next_with_same_priority
    }

    #[inline]
    fn set_next_with_same_priority(&mut self, node: CellIndex, next: Option<CellIndex>) {
        let dim = cell_dim(node, self.ncols());
        self[dim].search.next_with_same_priority = next;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HexCellPriorityQueue {
    buckets: Vec<Option<CellIndex>>,
    count: usize,
    minimum: usize,
}

impl Default for HexCellPriorityQueue {
    fn default() -> Self {
        HexCellPriorityQueue {
            buckets: Vec::new(),
            count: 0,
            minimum: usize::MAX,
        }
    }
}

impl HexCellPriorityQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Pushes `node` at the front of the bucket for its current priority.
    pub(crate) fn enqueue<S: SearchNodes>(&mut self, nodes: &mut S, node: CellIndex) {
        self.count += 1;
        let priority = nodes.priority(node);
        if priority < self.minimum {
            self.minimum = priority;
        }
        if priority >= self.buckets.len() {
            self.buckets.resize(priority + 1, None);
        }

        nodes.set_next_with_same_priority(node, self.buckets[priority]);
        self.buckets[priority] = Some(node);
    }

    /// Pops the most recently queued node of the lowest non-empty bucket.
    pub(crate) fn dequeue<S: SearchNodes>(&mut self, nodes: &S) -> Option<CellIndex> {
        while self.minimum < self.buckets.len() {
            if let Some(node) = self.buckets[self.minimum] {
                self.buckets[self.minimum] = nodes.next_with_same_priority(node);
                self.count -= 1;
                return Some(node);
            }
            self.minimum += 1;
        }
        None
    }

    /// Moves `node` out of the bucket for `old_priority` and requeues it at its
    /// current priority. `node` must be queued.
    pub(crate) fn change<S: SearchNodes>(&mut self, nodes: &mut S, node: CellIndex, old_priority: usize) {
        debug_assert!(old_priority < self.buckets.len(), "priority {old_priority} was never queued");

        let Some(mut current) = self.buckets.get(old_priority).copied().flatten() else {
            debug_assert!(false, "cell {node} is not queued at priority {old_priority}");
            return;
        };

        if current == node {
            self.buckets[old_priority] = nodes.next_with_same_priority(node);
        } else {
            loop {
                let Some(next) = nodes.next_with_same_priority(current) else {
                    debug_assert!(false, "cell {node} is not queued at priority {old_priority}");
                    return;
                };
                if next == node {
                    let after = nodes.next_with_same_priority(node);
                    nodes.set_next_with_same_priority(current, after);
                    break;
                }
                current = next;
            }
        }

        self.enqueue(nodes, node);
        self.count -= 1;
    }

    /// Empties the queue but keeps the bucket allocation for the next search.
    pub(crate) fn clear(&mut self) {
        self.buckets.fill(None);
        self.count = 0;
        self.minimum = usize::MAX;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[derive(Default)]
    struct TestNodes {
        priorities: Vec<usize>,
        next: Vec<Option<CellIndex>>,
    }

    impl TestNodes {
        fn with_priorities(priorities: &[usize]) -> Self {
            TestNodes {
                priorities: priorities.to_vec(),
                next: vec![None; priorities.len()],
            }
        }
    }

    impl SearchNodes for TestNodes {
        fn priority(&self, node: CellIndex) -> usize {
            self.priorities[node]
        }

        fn next_with_same_priority(&self, node: CellIndex) -> Option<CellIndex> {
            self.next[node]
        }

        fn set_next_with_same_priority(&mut self, node: CellIndex, next: Option<CellIndex>) {
            self.next[node] = next;
        }
    }

    #[test]
    fn test_dequeue_in_priority_order() {
        let mut nodes = TestNodes::with_priorities(&[7, 3, 9, 0, 5]);
        let mut queue = HexCellPriorityQueue::new();
        for i in 0..5 {
            queue.enqueue(&mut nodes, i);
        }
        assert_eq!(queue.len(), 5);

        let order: Vec<_> = std::iter::from_fn(|| queue.dequeue(&nodes)).collect();
        assert_eq!(order, vec![3, 1, 4, 0, 2]);
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(&nodes), None);
    }

    #[test]
    fn test_same_priority_is_lifo() {
        let mut nodes = TestNodes::with_priorities(&[4, 4, 4]);
        let mut queue = HexCellPriorityQueue::new();
        queue.enqueue(&mut nodes, 0);
        queue.enqueue(&mut nodes, 1);
        queue.enqueue(&mut nodes, 2);

        assert_eq!(queue.dequeue(&nodes), Some(2));
        assert_eq!(queue.dequeue(&nodes), Some(1));
        assert_eq!(queue.dequeue(&nodes), Some(0));
    }

    #[test]
    fn test_enqueue_below_minimum_after_dequeue() {
        let mut nodes = TestNodes::with_priorities(&[10, 12, 2]);
        let mut queue = HexCellPriorityQueue::new();
        queue.enqueue(&mut nodes, 0);
        queue.enqueue(&mut nodes, 1);
        assert_eq!(queue.dequeue(&nodes), Some(0));

        queue.enqueue(&mut nodes, 2);
        assert_eq!(queue.dequeue(&nodes), Some(2));
        assert_eq!(queue.dequeue(&nodes), Some(1));
    }

    #[test]
    fn test_change_head_middle_and_tail() {
        let mut nodes = TestNodes::with_priorities(&[6, 6, 6, 8]);
        let mut queue = HexCellPriorityQueue::new();
        for i in 0..4 {
            queue.enqueue(&mut nodes, i);
        }
        // Bucket 6 is now 2 -> 1 -> 0.

        nodes.priorities[1] = 1;
        queue.change(&mut nodes, 1, 6);
        nodes.priorities[0] = 2;
        queue.change(&mut nodes, 0, 6);
        nodes.priorities[2] = 3;
        queue.change(&mut nodes, 2, 6);
        assert_eq!(queue.len(), 4);

        let order: Vec<_> = std::iter::from_fn(|| queue.dequeue(&nodes)).collect();
        assert_eq!(order, vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_clear_keeps_buckets() {
        let mut nodes = TestNodes::with_priorities(&[40, 1]);
        let mut queue = HexCellPriorityQueue::new();
        queue.enqueue(&mut nodes, 0);
        let capacity = queue.buckets.len();

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.buckets.len(), capacity);
        assert_eq!(queue.dequeue(&nodes), None);

        queue.enqueue(&mut nodes, 1);
        assert_eq!(queue.dequeue(&nodes), Some(1));
    }

    #[test]
    fn test_random_operations_always_yield_minimum() {
        let mut rng = rand::rng();
        let size = 200;
        let mut nodes = TestNodes::with_priorities(&vec![0; size]);
        let mut queue = HexCellPriorityQueue::new();
        let mut queued: Vec<CellIndex> = Vec::new();
        let mut floor = 0;

        for node in 0..size {
            // Priorities never drop below what has already been dequeued, as in a search.
            nodes.priorities[node] = floor + rng.random_range(0..50);
            queue.enqueue(&mut nodes, node);
            queued.push(node);

            if rng.random_bool(0.3) {
                let pick = queued[rng.random_range(0..queued.len())];
                let old = nodes.priorities[pick];
                if old > floor {
                    nodes.priorities[pick] = rng.random_range(floor..old);
                    queue.change(&mut nodes, pick, old);
                }
            }

            if rng.random_bool(0.4) {
                let node = queue.dequeue(&nodes).unwrap();
                let min = queued.iter().map(|&n| nodes.priorities[n]).min().unwrap();
                assert_eq!(nodes.priorities[node], min);
                floor = min;
                queued.retain(|&n| n != node);
            }
            assert_eq!(queue.len(), queued.len());
        }

        while let Some(node) = queue.dequeue(&nodes) {
            let min = queued.iter().map(|&n| nodes.priorities[n]).min().unwrap();
            assert_eq!(nodes.priorities[node], min);
            queued.retain(|&n| n != node);
        }
        assert!(queued.is_empty());
    }
}
