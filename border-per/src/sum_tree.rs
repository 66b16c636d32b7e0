//! Sum tree for prioritized sampling.
//!
//! Code is adapted from https://github.com/jaromiru/AI-blog/blob/master/SumTree.py and
//! https://github.com/openai/baselines/blob/master/baselines/deepq/replay_buffer.py
use crate::ItemBuffer;
use log::warn;

/// A binary tree whose leaves hold priorities of the items in a circular buffer
/// and whose internal nodes hold the sum of their subtree.
///
/// Leaf `i` corresponds to slot `i` of the item buffer. The number of leaves is
/// rounded up to a power of two, so that leaves are ordered left to right by
/// slot; the padding leaves keep priority zero and are never retrieved.
#[derive(Debug, Clone)]
pub struct SumTree<T> {
    elements: ItemBuffer<T>,
    n_leaves: usize,
    tree: Vec<f32>,
}

impl<T> SumTree<T> {
    /// Creates an empty sum tree holding up to `capacity` items.
    pub fn new(capacity: usize) -> Self {
        let n_leaves = capacity.next_power_of_two();
        Self {
            elements: ItemBuffer::new(capacity),
            n_leaves,
            tree: vec![0f32; 2 * n_leaves - 1],
        }
    }

    /// Builds a sum tree from `(item, priority)` pairs added in order.
    ///
    /// If more than `capacity` pairs are given, later ones overwrite earlier ones.
    pub fn from_list(capacity: usize, items: impl IntoIterator<Item = (T, f32)>) -> Self {
        let mut tree = Self::new(capacity);
        for (item, p) in items {
            tree.add(item, p);
        }
        tree
    }

    #[inline]
    fn leaf(&self, ix: usize) -> usize {
        ix + self.n_leaves - 1
    }

    fn propagate(&mut self, mut node: usize) {
        while node != 0 {
            node = (node - 1) / 2;
            let left = 2 * node + 1;
            self.tree[node] = self.tree[left] + self.tree[left + 1];
        }
    }

    /// Writes `item` at the current cursor with priority `p` and returns its slot.
    ///
    /// The oldest item is overwritten once the buffer is full.
    pub fn add(&mut self, item: T, p: f32) -> usize {
        let ix = self.elements.push(item);
        self.update(ix, p);
        ix
    }

    /// Sets the priority of leaf `ix`.
    ///
    /// Leaves without a live item are ignored.
    pub fn update(&mut self, ix: usize, p: f32) {
        if self.elements.get(ix).is_none() {
            warn!("Ignored update of leaf {} in a sum tree with {} items", ix, self.len());
            return;
        }
        debug_assert!(p >= 0.0 && p.is_finite(), "Invalid priority {}", p);

        let node = self.leaf(ix);
        self.tree[node] = p;
        self.propagate(node);
    }

    /// Returns the leaf `i` with `sum(p_0..p_{i-1}) <= s < sum(p_0..p_i)`.
    ///
    /// The returned tuple is `(item, leaf index, leaf priority)`.
    /// `s` is expected in `[0, total_p)`; larger values end at the rightmost
    /// leaf with non-zero mass.
    pub fn retrieve(&self, s: f32) -> (&T, usize, f32) {
        let ix = self.get(s);
        let item = self
            .elements
            .get(ix)
            .expect("Retrieved a leaf without an item");
        (item, ix, self.priority(ix))
    }

    /// Returns the index of the leaf covering the prefix sum `s`.
    pub fn get(&self, mut s: f32) -> usize {
        let mut node = 0;
        while node < self.n_leaves - 1 {
            let left = 2 * node + 1;
            let right = left + 1;
            if s < self.tree[left] || self.tree[right] <= 0f32 {
                node = left;
            } else {
                s -= self.tree[left];
                node = right;
            }
        }
        node + 1 - self.n_leaves
    }

    /// Priority of leaf `ix`.
    pub fn priority(&self, ix: usize) -> f32 {
        self.tree[self.leaf(ix)]
    }

    /// Sum of all priorities.
    pub fn total_p(&self) -> f32 {
        self.tree[0]
    }

    /// Returns `true` once the item buffer wrapped around.
    pub fn full(&self) -> bool {
        self.elements.full()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Maximum number of items.
    pub fn capacity(&self) -> usize {
        self.elements.capacity()
    }

    /// The underlying item buffer.
    pub fn elements(&self) -> &ItemBuffer<T> {
        &self.elements
    }
}

#[cfg(test)]
mod tests {
    use super::SumTree;

    fn check_sums<T>(tree: &SumTree<T>) {
        for node in 0..tree.n_leaves - 1 {
            let left = 2 * node + 1;
            assert_eq!(tree.tree[node], tree.tree[left] + tree.tree[left + 1]);
        }
    }

    #[test]
    fn test_sum_tree_odd() {
        let data = vec![0.5f32, 0.2, 0.8, 0.3, 1.1, 2.5, 3.9];
        let mut sum_tree = SumTree::new(8);
        for (ix, &p) in data.iter().enumerate() {
            assert_eq!(sum_tree.add(ix, p), ix);
        }
        check_sums(&sum_tree);
        assert!((sum_tree.total_p() - data.iter().sum::<f32>()).abs() < 1e-5);

        assert_eq!(sum_tree.get(0.0), 0);
        assert_eq!(sum_tree.get(0.4), 0);
        assert_eq!(sum_tree.get(0.6), 1);
        assert_eq!(sum_tree.get(1.2), 2);
        assert_eq!(sum_tree.get(1.6), 3);
        assert_eq!(sum_tree.get(2.0), 4);
        assert_eq!(sum_tree.get(2.8), 4);
        assert_eq!(sum_tree.get(9.0), 6);

        // Values past the total end at the last leaf with mass, not at padding.
        assert_eq!(sum_tree.get(100.0), 6);
    }

    #[test]
    fn test_retrieve_non_power_of_two() {
        let data = vec![1f32, 2.0, 3.0, 4.0, 5.0];
        let tree = SumTree::from_list(5, data.iter().enumerate().map(|(i, &p)| (i, p)));
        let mut prefix = 0f32;
        for (i, &p) in data.iter().enumerate() {
            for s in [prefix, prefix + 0.5 * p, prefix + p - 0.01].iter() {
                let (&item, ix, q) = tree.retrieve(*s);
                assert_eq!(ix, i);
                assert_eq!(item, i);
                assert_eq!(q, p);
            }
            prefix += p;
        }
    }

    #[test]
    fn test_update_keeps_sum() {
        let mut tree = SumTree::new(6);
        for i in 0..6 {
            tree.add(i, 1.0);
        }
        tree.update(2, 4.0);
        tree.update(5, 0.0);
        tree.update(100, 7.0);
        check_sums(&tree);
        assert_eq!(tree.total_p(), 1.0 + 1.0 + 4.0 + 1.0 + 1.0 + 0.0);
        assert_eq!(tree.priority(2), 4.0);
    }

    #[test]
    fn test_wraparound() {
        let mut tree = SumTree::new(4);
        for i in 0..6 {
            tree.add(i, (i + 1) as f32);
        }
        assert!(tree.full());
        assert_eq!(tree.len(), 4);
        // Slots 0 and 1 were overwritten by items 4 and 5.
        assert_eq!(tree.elements().get(0), Some(&4));
        assert_eq!(tree.elements().get(1), Some(&5));
        assert_eq!(tree.total_p(), 5.0 + 6.0 + 3.0 + 4.0);
    }
}
