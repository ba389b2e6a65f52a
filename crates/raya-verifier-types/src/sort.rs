//! Sort registry
//!
//! A sort is the identity of a type constructor: a primitive like `i32`,
//! a builtin constructor like `Method`, or a class name. Sorts are small
//! integers so shapes can be hashed and compared cheaply.
//!
//! Class names live in their own name space. A class called `i32` gets a
//! sort distinct from the builtin `i32`, even though both print the same.

use rustc_hash::FxHashMap;
use std::fmt;

/// Identity of a type constructor within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sort(u32);

impl Sort {
    /// Raw index of this sort.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sort({})", self.0)
    }
}

/// Bidirectional name ↔ [`Sort`] mapping.
///
/// Append-only: a name keeps its sort for the lifetime of the registry.
#[derive(Debug, Clone, Default)]
pub struct SortRegistry {
    /// Map from name to sort
    map: FxHashMap<String, Sort>,

    /// Map from class name to sort
    classes: FxHashMap<String, Sort>,

    /// Names indexed by sort
    names: Vec<String>,
}

impl SortRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sort for `name`, creating it on first use.
    pub fn id_of(&mut self, name: &str) -> Sort {
        if let Some(&sort) = self.map.get(name) {
            return sort;
        }

        let sort = Sort(self.names.len() as u32);
        self.names.push(name.to_string());
        self.map.insert(name.to_string(), sort);
        sort
    }

    /// Look up an existing sort without creating one.
    pub fn lookup(&self, name: &str) -> Option<Sort> {
        self.map.get(name).copied()
    }

    /// Return the class sort for `name`, creating it on first use.
    ///
    /// Never equal to a sort returned by [`id_of`](Self::id_of).
    pub fn class_id_of(&mut self, name: &str) -> Sort {
        if let Some(&sort) = self.classes.get(name) {
            return sort;
        }

        let sort = Sort(self.names.len() as u32);
        self.names.push(name.to_string());
        self.classes.insert(name.to_string(), sort);
        sort
    }

    /// Look up an existing class sort without creating one.
    pub fn lookup_class(&self, name: &str) -> Option<Sort> {
        self.classes.get(name).copied()
    }

    /// Name of a sort.
    ///
    /// # Panics
    ///
    /// Panics if the sort did not come from this registry.
    #[inline]
    pub fn name_of(&self, sort: Sort) -> &str {
        &self.names[sort.index()]
    }

    /// Number of registered sorts.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no sort has been registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_of_deduplicates() {
        let mut sorts = SortRegistry::new();

        let i32_sort = sorts.id_of("i32");
        let method = sorts.id_of("Method");
        let again = sorts.id_of("i32");

        assert_eq!(i32_sort, again);
        assert_ne!(i32_sort, method);
        assert_eq!(sorts.len(), 2);
    }

    #[test]
    fn test_name_of_roundtrip() {
        let mut sorts = SortRegistry::new();
        let sort = sorts.id_of("java.lang.Object");
        assert_eq!(sorts.name_of(sort), "java.lang.Object");
    }

    #[test]
    fn test_lookup_does_not_create() {
        let mut sorts = SortRegistry::new();
        assert_eq!(sorts.lookup("Array"), None);
        assert!(sorts.is_empty());

        let array = sorts.id_of("Array");
        assert_eq!(sorts.lookup("Array"), Some(array));
    }

    #[test]
    fn test_class_names_do_not_collide_with_builtins() {
        let mut sorts = SortRegistry::new();
        let builtin = sorts.id_of("i32");
        let class = sorts.class_id_of("i32");

        assert_ne!(builtin, class);
        assert_eq!(sorts.class_id_of("i32"), class);
        assert_eq!(sorts.name_of(class), "i32");
        assert_eq!(sorts.lookup("i32"), Some(builtin));
        assert_eq!(sorts.lookup_class("i32"), Some(class));
        assert_eq!(sorts.lookup_class("Object"), None);
    }

    #[test]
    fn test_sorts_are_dense() {
        let mut sorts = SortRegistry::new();
        let ids: Vec<usize> = ["a", "b", "c"].iter().map(|n| sorts.id_of(n).index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
