//! Byte View
//!
//! A non-owning, resizable window over caller-provided memory.
//!
//! Socket reads hand back "however many bytes actually arrived" by shrinking
//! the view instead of reallocating the caller's buffer.
//!
//! ## Size and capacity
//!
//! - `len()` is the visible window, always `<= capacity()`.
//! - `shrink_back` reduces the visible window; `resize` can grow it back up
//!   to `capacity()`.
//! - `shrink_front` advances the origin. The skipped bytes become
//!   unreachable, so capacity drops too.

use std::ops::{Deref, DerefMut};
use thiserror::Error;

/// Errors reported by [`ByteView`] operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ByteViewError {
    /// Requested size is beyond what the underlying memory can hold
    #[error("requested size {requested} exceeds view capacity {capacity}")]
    OutOfRange {
        /// Size that was asked for
        requested: usize,
        /// Capacity of the view at the time of the request
        capacity: usize,
    },
}

/// Mutable window over borrowed bytes
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ByteView<'a> {
    memory: &'a mut [u8],
    len: usize,
}

impl<'a> ByteView<'a> {
    /// Create a view covering all of `memory`
    ///
    /// Size and capacity both start at `memory.len()`.
    pub fn new(memory: &'a mut [u8]) -> Self {
        let len = memory.len();
        Self { memory, len }
    }

    /// Create a view over no memory at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of visible bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bytes are visible
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest size reachable through [`ByteView::resize`]
    pub fn capacity(&self) -> usize {
        self.memory.len()
    }

    /// Hide `count` bytes from the end of the view
    ///
    /// The bytes stay reachable through a later `resize`.
    pub fn shrink_back(&mut self, count: usize) {
        debug_assert!(count <= self.len, "shrink_back({count}) on a view of {} bytes", self.len);
        self.len -= count.min(self.len);
    }

    /// Drop `count` bytes from the front of the view
    ///
    /// The origin moves forward, and the dropped bytes are gone for good:
    /// both size and capacity shrink by `count`.
    pub fn shrink_front(&mut self, count: usize) {
        debug_assert!(count <= self.len, "shrink_front({count}) on a view of {} bytes", self.len);
        let count = count.min(self.len);
        let memory = std::mem::take(&mut self.memory);
        self.memory = &mut memory[count..];
        self.len -= count;
    }

    /// Set the visible size to `new_len`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The view now shows `new_len` bytes
    /// * `Err(ByteViewError::OutOfRange)` - `new_len > capacity()`, view unchanged
    pub fn resize(&mut self, new_len: usize) -> Result<(), ByteViewError> {
        if new_len > self.capacity() {
            return Err(ByteViewError::OutOfRange {
                requested: new_len,
                capacity: self.capacity(),
            });
        }
        self.len = new_len;
        Ok(())
    }

    /// Hide every byte; capacity is kept
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Visible bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.memory[..self.len]
    }

    /// Visible bytes, mutably
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.memory[..self.len]
    }

    /// Pointer to the first visible byte
    pub fn as_ptr(&self) -> *const u8 {
        self.memory.as_ptr()
    }
}

impl Deref for ByteView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl DerefMut for ByteView<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

impl<'a> From<&'a mut [u8]> for ByteView<'a> {
    fn from(memory: &'a mut [u8]) -> Self {
        Self::new(memory)
    }
}

impl<'a, const N: usize> From<&'a mut [u8; N]> for ByteView<'a> {
    fn from(memory: &'a mut [u8; N]) -> Self {
        Self::new(memory)
    }
}

impl<'a> From<&'a mut Vec<u8>> for ByteView<'a> {
    fn from(memory: &'a mut Vec<u8>) -> Self {
        Self::new(memory.as_mut_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_view() {
        let view = ByteView::empty();
        assert_eq!(view.len(), 0);
        assert_eq!(view.capacity(), 0);
        assert!(view.is_empty());
        assert!(view.iter().next().is_none());
    }

    #[test]
    fn test_view_over_empty_slice() {
        let mut memory: [u8; 0] = [];
        let view = ByteView::new(&mut memory);
        assert_eq!(view.len(), 0);
        assert_eq!(view.capacity(), 0);
        let range = view.as_slice().as_ptr_range();
        assert_eq!(range.start, range.end);
    }

    #[test]
    fn test_new_covers_whole_buffer() {
        let mut memory = [1u8, 2, 3, 4];
        let view = ByteView::from(&mut memory);
        assert_eq!(view.len(), 4);
        assert_eq!(view.capacity(), 4);
        assert_eq!(&*view, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_shrink_back_then_resize_restores() {
        let mut memory = *b"abcdef";
        let mut view = ByteView::new(&mut memory);
        view.shrink_back(4);
        assert_eq!(&*view, b"ab");
        assert_eq!(view.capacity(), 6);
        view.resize(6).unwrap();
        assert_eq!(&*view, b"abcdef");
    }

    #[test]
    fn test_shrink_front_moves_origin() {
        let mut memory = *b"abcdef";
        let mut view = ByteView::new(&mut memory);
        let origin = view.as_ptr();
        view.shrink_front(2);
        assert_eq!(view.len(), 4);
        assert_eq!(view.capacity(), 4);
        assert_eq!(view.as_ptr(), origin.wrapping_add(2));
        assert_eq!(&*view, b"cdef");
    }

    #[test]
    fn test_resize_beyond_capacity_rejected() {
        let mut memory = [0u8; 8];
        let mut view = ByteView::new(&mut memory);
        view.shrink_back(3);
        let err = view.resize(9).unwrap_err();
        assert_eq!(err, ByteViewError::OutOfRange { requested: 9, capacity: 8 });
        assert_eq!(view.len(), 5);
    }

    #[test]
    fn test_writes_reach_underlying_memory() {
        let mut memory = [0u8; 4];
        {
            let mut view = ByteView::new(&mut memory);
            view.shrink_front(1);
            view[0] = 0xAB;
        }
        assert_eq!(memory, [0, 0xAB, 0, 0]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut memory = vec![7u8; 16];
        let mut view = ByteView::from(&mut memory);
        view.clear();
        assert!(view.is_empty());
        assert_eq!(view.capacity(), 16);
    }
}
