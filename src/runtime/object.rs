//! Object representation
//!
//! An object is a hash table from [`Atom`] to [`Value`] with separately
//! chained buckets. Atoms are unique per string, so the atom id is used
//! directly as the hash and keys are compared by identity.
//!
//! Growing the table allocates a new bucket array and relinks the existing
//! chain nodes into it; the nodes themselves are never reallocated.

use std::cell::RefCell;
use std::collections::TryReserveError;
use std::rc::Rc;

use crate::runtime::atom::Atom;
use crate::value::Value;

/// Shared, mutable handle to an object
pub type ObjectRef = Rc<RefCell<Object>>;

/// Bucket array could not be grown
#[derive(Debug, thiserror::Error)]
#[error("out of memory growing object to {buckets} buckets")]
pub struct ObjectAllocError {
    pub buckets: usize,
    #[source]
    source: TryReserveError,
}

struct Bucket {
    next: Option<Box<Bucket>>,
    key: Atom,
    value: Value,
}

/// JavaScript object: a chained hash map keyed by atom identity
#[derive(Default)]
pub struct Object {
    /// Bucket heads; each chain is newest-first
    buckets: Vec<Option<Box<Bucket>>>,
    /// Number of stored entries
    len: usize,
}

impl Object {
    /// Create an empty object with no buckets
    pub fn new() -> Self {
        Object {
            buckets: Vec::new(),
            len: 0,
        }
    }

    /// Create an empty object and wrap it in a shared handle
    pub fn new_ref() -> ObjectRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Get the number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the object has no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the number of buckets
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_index(key: &Atom, buckets: usize) -> usize {
        key.id() as usize % buckets
    }

    /// Make room for `extra` more entries without exceeding one entry per
    /// bucket on average
    ///
    /// When growth is needed the bucket array becomes `2 * capacity + extra`
    /// long and every chain node is relinked into it.
    pub fn reserve(&mut self, extra: usize) -> Result<(), ObjectAllocError> {
        if self.len + extra <= self.buckets.len() {
            return Ok(());
        }

        let new_cap = self.buckets.len() * 2 + extra;
        let mut new_buckets: Vec<Option<Box<Bucket>>> = Vec::new();
        new_buckets
            .try_reserve_exact(new_cap)
            .map_err(|source| ObjectAllocError {
                buckets: new_cap,
                source,
            })?;
        new_buckets.resize_with(new_cap, || None);

        for head in &mut self.buckets {
            let mut node = head.take();
            while let Some(mut bucket) = node {
                node = bucket.next.take();
                let idx = Self::bucket_index(&bucket.key, new_cap);
                bucket.next = new_buckets[idx].take();
                new_buckets[idx] = Some(bucket);
            }
        }

        self.buckets = new_buckets;
        Ok(())
    }

    /// Insert or update an entry
    ///
    /// An existing key is overwritten in place and its previous value
    /// returned. New keys are prepended to their bucket chain.
    pub fn insert(&mut self, key: Atom, value: Value) -> Result<Option<Value>, ObjectAllocError> {
        if let Some(slot) = self.get_mut(&key) {
            return Ok(Some(std::mem::replace(slot, value)));
        }

        self.reserve(1)?;
        let idx = Self::bucket_index(&key, self.buckets.len());
        let next = self.buckets[idx].take();
        self.buckets[idx] = Some(Box::new(Bucket { next, key, value }));
        self.len += 1;
        Ok(None)
    }

    fn find(&self, key: &Atom) -> Option<&Bucket> {
        if self.len == 0 {
            return None;
        }
        let mut node = self.buckets[Self::bucket_index(key, self.buckets.len())].as_deref();
        while let Some(bucket) = node {
            if bucket.key == *key {
                return Some(bucket);
            }
            node = bucket.next.as_deref();
        }
        None
    }

    /// Get an entry's value
    pub fn get(&self, key: &Atom) -> Option<&Value> {
        self.find(key).map(|bucket| &bucket.value)
    }

    /// Get a mutable reference to an entry's value
    pub fn get_mut(&mut self, key: &Atom) -> Option<&mut Value> {
        if self.len == 0 {
            return None;
        }
        let idx = Self::bucket_index(key, self.buckets.len());
        let mut node = self.buckets[idx].as_deref_mut();
        while let Some(bucket) = node {
            if bucket.key == *key {
                return Some(&mut bucket.value);
            }
            node = bucket.next.as_deref_mut();
        }
        None
    }

    /// Check if an entry exists
    pub fn contains(&self, key: &Atom) -> bool {
        self.find(key).is_some()
    }

    /// Iterate entries in bucket order, then chain order
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
        }
    }
}

impl Drop for Object {
    // Unlink chains iteratively instead of recursing through `Box` drops.
    fn drop(&mut self) {
        for head in &mut self.buckets {
            let mut node = head.take();
            while let Some(mut bucket) = node {
                node = bucket.next.take();
            }
        }
    }
}

/// Iterator over an object's entries
pub struct Iter<'a> {
    buckets: std::slice::Iter<'a, Option<Box<Bucket>>>,
    chain: Option<&'a Bucket>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a Atom, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(bucket) = self.chain {
                self.chain = bucket.next.as_deref();
                return Some((&bucket.key, &bucket.value));
            }
            self.chain = self.buckets.next()?.as_deref();
        }
    }
}
