//! Typed bump arena
//!
//! Allocation appends to a vector and returns the slot index. Nothing is
//! freed until the arena itself is dropped, so ids stay valid for the whole
//! lifetime of the arena.

use std::fmt;
use std::marker::PhantomData;

/// Index of a value allocated in an [`Arena<T>`]
pub struct ArenaId<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaId<T> {
    #[inline]
    fn new(index: u32) -> Self {
        ArenaId {
            index,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the arena
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }
}

// Manual impls: derives would add a `T: Trait` bound.
impl<T> Clone for ArenaId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaId<T> {}

impl<T> PartialEq for ArenaId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for ArenaId<T> {}

impl<T> fmt::Debug for ArenaId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Bump arena of `T` values
#[derive(Debug)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Arena { items: Vec::new() }
    }

    /// Create an arena with room for `capacity` values before growing
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Move a value into the arena
    ///
    /// # Panics
    /// Panics if the arena already holds `u32::MAX` values; like running out
    /// of memory this is not recoverable.
    pub fn alloc(&mut self, value: T) -> ArenaId<T> {
        let Ok(index) = u32::try_from(self.items.len()) else {
            panic!("arena exhausted: more than {} allocations", u32::MAX);
        };
        self.items.push(value);
        ArenaId::new(index)
    }

    /// Borrow an allocated value
    #[inline]
    pub fn get(&self, id: ArenaId<T>) -> &T {
        &self.items[id.index()]
    }

    /// Number of values allocated so far
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing has been allocated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<ArenaId<T>> for Arena<T> {
    type Output = T;

    fn index(&self, id: ArenaId<T>) -> &T {
        self.get(id)
    }
}
