//! String scratch region
//!
//! Memory layout:
//! ```text
//! +------------------+  <- 0
//! |  [allocated]     |
//! |       ...        |
//! +------------------+  <- head
//! |   Free space     |
//! +------------------+  <- capacity
//! ```
//!
//! The lexer appends every decoded string literal here. The region never
//! grows: once `capacity` bytes are handed out, further allocations fail.
//! Rewinding the head (see [`ScratchMark`]) only moves the pointer; the bytes
//! behind it stay in place until they are overwritten.

/// Handle to a byte string stored in a [`StringScratch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrSlice {
    pub offset: u32,
    pub len: u32,
}

impl StrSlice {
    #[inline]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Saved head position of a [`StringScratch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchMark(usize);

/// Fixed-capacity bump region for decoded string literals
pub struct StringScratch {
    /// Backing storage, allocated once at full capacity
    buffer: Vec<u8>,
    /// Offset of the first free byte
    head: usize,
}

impl StringScratch {
    /// Default capacity, matching a 16 KiB static buffer
    pub const DEFAULT_CAPACITY: usize = 4096 * 4;

    /// Create a scratch region of exactly `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        StringScratch {
            buffer: vec![0; capacity],
            head: 0,
        }
    }

    /// Total capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes handed out so far
    #[inline]
    pub fn used(&self) -> usize {
        self.head
    }

    /// Bytes still available
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.head
    }

    /// Copy `data` into the region
    ///
    /// Returns None if the remaining space is too small; nothing is written
    /// in that case.
    pub fn alloc(&mut self, data: &[u8]) -> Option<StrSlice> {
        if data.len() > self.remaining() {
            return None;
        }
        let offset = u32::try_from(self.head).ok()?;
        let len = u32::try_from(data.len()).ok()?;
        self.buffer[self.head..self.head + data.len()].copy_from_slice(data);
        self.head += data.len();
        Some(StrSlice { offset, len })
    }

    /// Resolve a slice handle to its bytes
    #[inline]
    pub fn get(&self, slice: StrSlice) -> &[u8] {
        let start = slice.offset as usize;
        &self.buffer[start..start + slice.len as usize]
    }

    /// Record the current head
    #[inline]
    pub fn mark(&self) -> ScratchMark {
        ScratchMark(self.head)
    }

    /// Move the head back to `mark`
    #[inline]
    pub fn reset(&mut self, mark: ScratchMark) {
        debug_assert!(mark.0 <= self.head, "scratch mark is ahead of head");
        self.head = mark.0;
    }
}

impl Default for StringScratch {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
