//! Growable Buffer
//!
//! An append-only arena of `Copy` elements. The dependency pool hands out
//! offsets into it, not pointers, so growing the backing storage never
//! invalidates a range that was handed out earlier.
//!
//! The backing storage is kept fully initialized (`storage.len()` is the
//! capacity) so growth follows an exact doubling policy instead of whatever
//! `Vec` decides to reserve.

use std::ops::Index;

use crate::error::CONTRACT_CHECKS;

/// Append-only, indexable, resizable sequence of fixed-size elements.
#[derive(Debug, Clone, Default)]
pub struct GrowBuffer<T> {
    storage: Vec<T>,
    len: usize,
}

impl<T: Copy + Default> GrowBuffer<T> {
    /// Create an empty buffer without allocating.
    pub const fn new() -> Self {
        Self {
            storage: Vec::new(),
            len: 0,
        }
    }

    /// Create an empty buffer with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.ensure_capacity(capacity);
        buffer
    }

    /// Number of elements appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements that fit before the next reallocation.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// View `len` elements starting at `start`.
    ///
    /// # Panics
    ///
    /// If `start + len` exceeds the current length.
    pub fn slice(&self, start: usize, len: usize) -> &[T] {
        self.check_range(start, len);
        &self.storage[start..start + len]
    }

    /// Mutable view of `len` elements starting at `start`.
    ///
    /// # Panics
    ///
    /// If `start + len` exceeds the current length.
    pub fn slice_mut(&mut self, start: usize, len: usize) -> &mut [T] {
        self.check_range(start, len);
        &mut self.storage[start..start + len]
    }

    /// View every element appended so far.
    pub fn as_slice(&self) -> &[T] {
        &self.storage[..self.len]
    }

    /// Copy `values` to the end of the buffer, growing it if needed.
    pub fn append_slice(&mut self, values: &[T]) {
        let end = self.len + values.len();
        self.ensure_capacity(end);
        self.storage[self.len..end].copy_from_slice(values);
        self.len = end;
    }

    /// Drop the last `n` elements from the logical length.
    ///
    /// Capacity is kept for reuse.
    pub fn truncate_by(&mut self, n: usize) {
        assert!(
            n <= self.len,
            "cannot truncate {n} elements from a buffer of length {}",
            self.len
        );
        self.len -= n;
    }

    /// Grow the backing storage to hold at least `capacity` elements.
    ///
    /// Growth at least doubles the current capacity.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let current = self.storage.len();
        if current < capacity {
            let target = capacity.max(current * 2);
            self.storage.resize(target, T::default());
        }
    }

    fn check_range(&self, start: usize, len: usize) {
        if CONTRACT_CHECKS {
            let end = start.checked_add(len);
            assert!(
                end.is_some_and(|end| end <= self.len),
                "range {start}..{start}+{len} is out of bounds for length {}",
                self.len
            );
        }
    }
}

impl<T: Copy + Default> Index<usize> for GrowBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty_and_unallocated() {
        let buffer = GrowBuffer::<u16>::new();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 0);
        assert!(buffer.is_empty());
        assert!(buffer.as_slice().is_empty());
    }

    #[test]
    fn append_grows_to_fit_then_doubles() {
        let mut buffer = GrowBuffer::<u16>::new();

        // First growth fits the slice exactly
        buffer.append_slice(&[1, 2, 3]);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.capacity(), 3);

        // Next growth doubles
        buffer.append_slice(&[4]);
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.capacity(), 6);

        // A slice larger than double wins
        buffer.append_slice(&[0; 20]);
        assert_eq!(buffer.len(), 24);
        assert_eq!(buffer.capacity(), 24);
    }

    #[test]
    fn earlier_ranges_survive_growth() {
        let mut buffer = GrowBuffer::<u16>::with_capacity(2);
        buffer.append_slice(&[10, 11, 12]);
        let start = buffer.len();
        buffer.append_slice(&[20, 21, 22, 23]);
        buffer.append_slice(&[30; 50]);

        assert_eq!(buffer.slice(0, 3), &[10, 11, 12]);
        assert_eq!(buffer.slice(start, 4), &[20, 21, 22, 23]);
        assert_eq!(buffer[start + 1], 21);
    }

    #[test]
    fn slice_mut_writes_through() {
        let mut buffer = GrowBuffer::<u32>::new();
        buffer.append_slice(&[1, 2, 3, 4]);
        buffer.slice_mut(1, 2).copy_from_slice(&[7, 8]);
        assert_eq!(buffer.as_slice(), &[1, 7, 8, 4]);
    }

    #[test]
    fn truncate_keeps_capacity() {
        let mut buffer = GrowBuffer::<u8>::new();
        buffer.append_slice(&[1, 2, 3, 4, 5]);
        buffer.truncate_by(2);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
        assert_eq!(buffer.capacity(), 5);

        // Space is reused by the next append
        buffer.append_slice(&[9, 9]);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 9, 9]);
        assert_eq!(buffer.capacity(), 5);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    #[cfg(debug_assertions)]
    fn slice_past_length_panics() {
        let mut buffer = GrowBuffer::<u16>::with_capacity(8);
        buffer.append_slice(&[1, 2]);
        // Within capacity but past the logical length
        let _ = buffer.slice(1, 2);
    }

    #[test]
    #[should_panic(expected = "cannot truncate")]
    fn truncate_past_length_panics() {
        let mut buffer = GrowBuffer::<u16>::new();
        buffer.append_slice(&[1]);
        buffer.truncate_by(2);
    }
}
