//! # Globals Table & String Interning
//!
//! Two tables share the same hashing strategy:
//!
//! - [`Interner`]: a content-keyed set of canonical [`ObjString`]s. Every
//!   string literal or concatenation result passes through `intern`, which
//!   either returns the existing canonical object or registers a new one.
//!   Two strings with the same bytes anywhere in a program are therefore
//!   always the same `Rc` — the "interning identity" invariant.
//! - [`Table`]: the globals map, keyed by the *already-interned* `Rc` (its
//!   precomputed hash, so lookups never re-walk the bytes). `define` always
//!   overwrites; `assign` only succeeds against an existing key, matching
//!   the `DefineGlobal`/`SetGlobal` distinction the VM's opcodes rely on.
//!
//! The open-addressing / linear-probing / tombstone mechanics of the
//! reference hash table are contract-only (see `SPEC_FULL.md` §R4) —
//! `std::collections::HashMap`/`HashSet` stand in here, keyed through a
//! small FNV-1a `Hasher` so that the *hashing* still matches the spec even
//! though the table storage itself is std's.

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasherDefault, Hasher};
use std::rc::Rc;

use crate::value::{ObjString, Value};

/// A `Hasher` that just forwards the single precomputed `u32` FNV-1a hash
/// `ObjString::hash` writes into it. `ObjString` is the only key type these
/// tables use, so no general byte-folding fallback is needed.
#[derive(Default)]
pub struct FnvHasher(u64);

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        // Fallback path (unused by ObjString, kept so this type is a valid
        // general-purpose Hasher): straight FNV-1a over the given bytes.
        let mut hash = crate::value::fnv1a(bytes);
        hash ^= self.0 as u32;
        self.0 = hash as u64;
    }

    fn write_u32(&mut self, i: u32) {
        self.0 = i as u64;
    }
}

pub type FnvBuildHasher = BuildHasherDefault<FnvHasher>;

/// Canonical string pool. Guarantees that any two strings with identical
/// content, wherever they occur, share one `Rc<ObjString>`.
#[derive(Default)]
pub struct Interner {
    set: HashSet<Rc<ObjString>, FnvBuildHasher>,
}

impl Interner {
    pub fn new() -> Self {
        Interner::default()
    }

    /// Find or create the canonical `ObjString` for `chars`.
    ///
    /// Mirrors `findString(chars, length, hash)`: the candidate's hash is
    /// computed once, compared against the set by hash then length then
    /// bytes (via `ObjString`'s `Hash`/`Eq` impls), and either the existing
    /// entry is returned or the candidate becomes the new canonical object.
    pub fn intern(&mut self, chars: String) -> Rc<ObjString> {
        let candidate = ObjString::new(chars);
        if let Some(existing) = self.set.get(&candidate) {
            return existing.clone();
        }
        let rc = Rc::new(candidate);
        self.set.insert(rc.clone());
        rc
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }
}

/// A hash map from interned string identity to runtime value. Used both for
/// the VM's global variables and is reusable for any other string-keyed
/// runtime table this crate needs.
#[derive(Default)]
pub struct Table {
    map: HashMap<Rc<ObjString>, Value, FnvBuildHasher>,
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    pub fn get(&self, name: &Rc<ObjString>) -> Option<&Value> {
        self.map.get(name)
    }

    /// Unconditional insert (`DefineGlobal` semantics). Returns `true` if
    /// this was a new key, `false` if an existing entry was overwritten.
    pub fn set(&mut self, name: Rc<ObjString>, value: Value) -> bool {
        self.map.insert(name, value).is_none()
    }

    /// Insert only if the key already exists (`SetGlobal` semantics).
    /// Returns `false` (and leaves the table untouched) if the key was
    /// absent, so the caller can raise "undefined variable".
    pub fn assign(&mut self, name: &Rc<ObjString>, value: Value) -> bool {
        match self.map.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, name: &Rc<ObjString>) -> bool {
        self.map.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_gives_pointer_identity_to_equal_content() {
        let mut interner = Interner::new();
        let a = interner.intern("hello".to_string());
        let b = interner.intern("hello".to_string());
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_content_interns_to_distinct_objects() {
        let mut interner = Interner::new();
        let a = interner.intern("hello".to_string());
        let b = interner.intern("world".to_string());
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn define_always_overwrites_assign_requires_existing_key() {
        let mut interner = Interner::new();
        let name = interner.intern("x".to_string());
        let mut table = Table::new();

        assert!(table.set(name.clone(), Value::Number(1.0)));
        assert!(!table.set(name.clone(), Value::Number(2.0)));

        assert!(table.assign(&name, Value::Number(3.0)));
        match table.get(&name) {
            Some(Value::Number(n)) => assert_eq!(*n, 3.0),
            _ => panic!("expected updated number"),
        }

        let other = interner.intern("y".to_string());
        assert!(!table.assign(&other, Value::Number(9.0)));
    }

    #[test]
    fn delete_removes_only_existing_keys() {
        let mut interner = Interner::new();
        let name = interner.intern("z".to_string());
        let mut table = Table::new();
        assert!(!table.delete(&name));
        table.set(name.clone(), Value::Nil);
        assert!(table.delete(&name));
        assert!(table.get(&name).is_none());
    }
}
