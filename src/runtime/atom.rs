//! Atom table
//!
//! Identifiers are interned once during lexing. Every later stage compares
//! atoms by identity and hashes them by their sequential id, never by their
//! bytes.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

struct AtomData {
    id: u32,
    bytes: Box<[u8]>,
}

/// Interned, identity-compared string handle
///
/// Two atoms are equal only if they came from the same [`AtomTable::intern`]
/// registration. Within one table that coincides with byte equality.
#[derive(Clone)]
pub struct Atom(Rc<AtomData>);

impl Atom {
    /// Sequential id assigned at interning time
    #[inline]
    pub fn id(&self) -> u32 {
        self.0.id
    }

    /// The interned bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0.bytes
    }

    /// Check if both handles name the same registration
    #[inline]
    pub fn ptr_eq(&self, other: &Atom) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Atom {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({}, {:?})", self.id(), String::from_utf8_lossy(self.as_bytes()))
    }
}

/// String interning table
///
/// Maintains a set of unique atoms for fast comparison.
#[derive(Default)]
pub struct AtomTable {
    /// Registered atoms by content
    map: HashMap<Box<[u8]>, Atom>,
}

impl AtomTable {
    /// Create a new, empty table
    pub fn new() -> Self {
        AtomTable {
            map: HashMap::new(),
        }
    }

    /// Get the number of interned atoms
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if nothing has been interned
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up an atom without registering it
    pub fn get(&self, bytes: &[u8]) -> Option<Atom> {
        self.map.get(bytes).cloned()
    }

    /// Return the atom for `bytes`, registering it on first sight
    ///
    /// # Panics
    /// Panics once `u32::MAX` distinct atoms exist. Exhausting the table is
    /// treated like running out of memory.
    pub fn intern(&mut self, bytes: &[u8]) -> Atom {
        if let Some(atom) = self.map.get(bytes) {
            return atom.clone();
        }

        let Ok(id) = u32::try_from(self.map.len()) else {
            panic!("atom table exhausted");
        };
        let atom = Atom(Rc::new(AtomData {
            id,
            bytes: bytes.into(),
        }));
        self.map.insert(bytes.into(), atom.clone());
        atom
    }

    /// Intern a UTF-8 name
    #[inline]
    pub fn intern_str(&mut self, name: &str) -> Atom {
        self.intern(name.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_intern_dedups() {
        let mut table = AtomTable::new();

        let a = table.intern(b"console");
        let b = table.intern(b"console");
        let c = table.intern(b"log");

        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_empty_string_is_an_atom() {
        let mut table = AtomTable::new();

        let a = table.intern(b"");
        let b = table.intern(b"");

        assert_eq!(a, b);
        assert!(a.as_bytes().is_empty());
    }

    #[test]
    fn test_sequential_ids() {
        let mut table = AtomTable::new();

        assert_eq!(table.intern_str("a").id(), 0);
        assert_eq!(table.intern_str("b").id(), 1);
        assert_eq!(table.intern_str("a").id(), 0);
        assert_eq!(table.intern_str("c").id(), 2);
    }

    #[test]
    fn test_get_does_not_insert() {
        let mut table = AtomTable::new();

        assert!(table.get(b"foo").is_none());
        assert!(table.is_empty());

        let foo = table.intern_str("foo");
        assert_eq!(table.get(b"foo"), Some(foo));
    }

    #[test]
    fn test_atoms_from_different_tables_differ() {
        let mut t1 = AtomTable::new();
        let mut t2 = AtomTable::new();

        assert_ne!(t1.intern_str("x"), t2.intern_str("x"));
    }

    #[test]
    fn test_display() {
        let mut table = AtomTable::new();
        assert_eq!(table.intern_str("toString").to_string(), "toString");
    }

    proptest! {
        #[test]
        fn prop_intern_is_idempotent(words in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..8), 1..32)) {
            let mut table = AtomTable::new();
            let first: Vec<Atom> = words.iter().map(|w| table.intern(w)).collect();
            let second: Vec<Atom> = words.iter().map(|w| table.intern(w)).collect();

            for ((w, a), b) in words.iter().zip(&first).zip(&second) {
                prop_assert!(a.ptr_eq(b));
                prop_assert_eq!(a.as_bytes(), &w[..]);
            }

            // Byte-distinct inputs never share an atom
            for (i, a) in first.iter().enumerate() {
                for (j, b) in first.iter().enumerate() {
                    prop_assert_eq!(a == b, words[i] == words[j]);
                }
            }
        }
    }
}
