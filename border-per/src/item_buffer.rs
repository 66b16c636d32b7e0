//! Circular buffer of items shared by [`SumTree`](crate::SumTree) and
//! [`IndexPriorityQueue`](crate::IndexPriorityQueue).

/// Fixed-capacity circular buffer.
///
/// Items are written at a cursor which advances by one on each push and
/// wraps at `capacity`. Slot `i` always holds the last item written to it.
#[derive(Debug, Clone)]
pub struct ItemBuffer<T> {
    items: Vec<Option<T>>,
    cursor: usize,
    full: bool,
}

impl<T> ItemBuffer<T> {
    /// Creates an empty buffer.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity of a buffer must be positive");
        Self {
            items: (0..capacity).map(|_| None).collect(),
            cursor: 0,
            full: false,
        }
    }

    /// Writes `item` at the cursor, advances it and returns the written slot.
    pub fn push(&mut self, item: T) -> usize {
        let ix = self.cursor;
        self.items[ix] = Some(item);
        self.cursor += 1;
        if self.cursor == self.items.len() {
            self.cursor = 0;
            self.full = true;
        }
        ix
    }

    /// Returns the slot the next push writes to.
    ///
    /// Once the buffer is full this is also the slot of the oldest item.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the item at slot `ix`, if written.
    pub fn get(&self, ix: usize) -> Option<&T> {
        self.items.get(ix).and_then(|item| item.as_ref())
    }

    /// Returns `true` once the cursor wrapped around at least once.
    pub fn full(&self) -> bool {
        self.full
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        if self.full {
            self.items.len()
        } else {
            self.cursor
        }
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.items.len()
    }
}
