//! Fixed-capacity circular buffer of item tags
//!
//! Plain single-owner storage; callers provide the locking. The fill count
//! doubles as the write cursor and always stays within `[0, capacity]`.

use super::Item;

#[derive(Debug)]
pub struct RingBuffer {
    slots: Box<[Item]>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Create an empty buffer; `capacity` must be non-zero
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Write cursor (number of filled slots)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Append an item; hands it back when the buffer is full
    pub fn push(&mut self, item: Item) -> Result<(), Item> {
        if self.is_full() {
            return Err(item);
        }
        let tail = (self.head + self.len) % self.capacity();
        self.slots[tail] = item;
        self.len += 1;
        Ok(())
    }

    /// Remove the oldest item
    pub fn pop(&mut self) -> Option<Item> {
        if self.is_empty() {
            return None;
        }
        let item = self.slots[self.head];
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_with_wraparound() {
        let mut buf = RingBuffer::new(4);
        for i in 0..3 {
            buf.push(i).unwrap();
        }
        assert_eq!(buf.pop(), Some(0));
        assert_eq!(buf.pop(), Some(1));

        // Tail wraps past the end of the slot array
        for i in 3..6 {
            buf.push(i).unwrap();
        }
        assert!(buf.is_full());
        assert_eq!(buf.pop(), Some(2));
        assert_eq!(buf.pop(), Some(3));
        assert_eq!(buf.pop(), Some(4));
        assert_eq!(buf.pop(), Some(5));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_full_rejects_without_overwrite() {
        let mut buf = RingBuffer::new(2);
        buf.push(7).unwrap();
        buf.push(8).unwrap();
        assert_eq!(buf.push(9), Err(9));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.pop(), Some(7));
    }

    #[test]
    fn test_empty_pop_is_none() {
        let mut buf = RingBuffer::new(4);
        assert_eq!(buf.pop(), None);
        assert_eq!(buf.len(), 0);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _ = RingBuffer::new(0);
    }
}
