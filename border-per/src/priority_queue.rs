//! Indexed binary max-heap over the items of a circular buffer.
use crate::ItemBuffer;

/// Array-backed binary max-heap of `(priority, id)` pairs.
///
/// The id of an element is the slot of the circular item buffer holding it.
/// `index[id]` keeps the heap position of element `id`, so that the priority
/// of an element can be changed in `O(log capacity)`. When the item buffer
/// wraps, putting an item to a reused id replaces the heap entry of that id.
#[derive(Debug, Clone)]
pub struct IndexPriorityQueue<T> {
    elements: ItemBuffer<T>,
    heap: Vec<(f32, usize)>,
    index: Vec<Option<usize>>,
}

impl<T> IndexPriorityQueue<T> {
    /// Creates an empty queue holding up to `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            elements: ItemBuffer::new(capacity),
            heap: Vec::with_capacity(capacity),
            index: vec![None; capacity],
        }
    }

    /// Builds a queue from `(item, priority)` pairs put in order.
    pub fn from_list(capacity: usize, items: impl IntoIterator<Item = (T, f32)>) -> Self {
        let mut queue = Self::new(capacity);
        for (item, p) in items {
            queue.put(item, p);
        }
        queue
    }

    /// Puts `item` with `priority` at the next slot and returns its id.
    pub fn put(&mut self, item: T, priority: f32) -> usize {
        let id = self.elements.push(item);
        match self.index[id] {
            Some(pos) => self.set_priority(pos, priority),
            None => {
                let pos = self.heap.len();
                self.heap.push((priority, id));
                self.index[id] = Some(pos);
                self.sift_up(pos);
            }
        }
        id
    }

    /// Changes the priority of element `id`.
    ///
    /// Returns `false` if `id` is not in the queue.
    pub fn update_item(&mut self, id: usize, priority: f32) -> bool {
        match self.index.get(id).copied().flatten() {
            Some(pos) => {
                self.set_priority(pos, priority);
                true
            }
            None => false,
        }
    }

    fn set_priority(&mut self, pos: usize, priority: f32) {
        let old = self.heap[pos].0;
        self.heap[pos].0 = priority;
        if priority > old {
            self.sift_up(pos);
        } else if priority < old {
            self.sift_down(pos);
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.index[self.heap[i].1] = Some(i);
        self.index[self.heap[j].1] = Some(j);
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[parent].0 >= self.heap[pos].0 {
                break;
            }
            self.swap(parent, pos);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut largest = pos;
            if left < n && self.heap[left].0 > self.heap[largest].0 {
                largest = left;
            }
            if right < n && self.heap[right].0 > self.heap[largest].0 {
                largest = right;
            }
            if largest == pos {
                break;
            }
            self.swap(pos, largest);
            pos = largest;
        }
    }

    /// The heap array of `(priority, id)` pairs.
    ///
    /// The array is in heap order, not sorted.
    pub fn heap(&self) -> &[(f32, usize)] {
        &self.heap
    }

    /// Heap position of element `id`.
    pub fn position(&self, id: usize) -> Option<usize> {
        self.index.get(id).copied().flatten()
    }

    /// Priority of element `id`.
    pub fn priority(&self, id: usize) -> Option<f32> {
        self.position(id).map(|pos| self.heap[pos].0)
    }

    /// Returns `true` once the item buffer wrapped around.
    pub fn full(&self) -> bool {
        self.elements.full()
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing has been put.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
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
