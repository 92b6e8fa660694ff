//! Fixed-capacity FIFO ring buffer
//!
//! Lanes hold their cars in a [`BoundedQueue`]. Insertion happens at the tail,
//! removal at the front, and queue order always equals physical order: the
//! front element is the car nearest the stop line.

use thiserror::Error;

/// Errors raised by queue operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is full (capacity {capacity})")]
    Full { capacity: usize },
}

/// Ring buffer with a front index and an element count
///
/// # Example
/// ```
/// use intersection_control_core::BoundedQueue;
///
/// let mut queue = BoundedQueue::new(2);
/// queue.enqueue(1).unwrap();
/// queue.enqueue(2).unwrap();
/// assert!(queue.enqueue(3).is_err());
///
/// assert_eq!(queue.dequeue(), Some(1));
/// queue.enqueue(3).unwrap();
/// assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedQueue<T> {
    slots: Vec<Option<T>>,
    front: usize,
    len: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            front: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append at the tail
    pub fn enqueue(&mut self, item: T) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full {
                capacity: self.capacity(),
            });
        }
        let slot = self.slot(self.len);
        self.slots[slot] = Some(item);
        self.len += 1;
        Ok(())
    }

    /// Remove from the front
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.front].take();
        self.front = (self.front + 1) % self.capacity();
        self.len -= 1;
        if self.is_empty() {
            self.front = 0;
        }
        item
    }

    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    pub fn back(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|last| self.get(last))
    }

    /// Element at queue offset `index` (0 = front)
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.slot(index)].as_ref()
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index >= self.len {
            return None;
        }
        let slot = self.slot(index);
        self.slots[slot].as_mut()
    }

    /// Front-to-back iteration
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |i| self.slots[self.slot(i)].as_ref())
    }

    fn slot(&self, index: usize) -> usize {
        (self.front + index) % self.capacity()
    }
}
