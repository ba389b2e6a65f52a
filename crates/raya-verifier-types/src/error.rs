//! Resolution diagnostics and registry errors

use crate::domain::{ClassId, LanguageKind, MethodId};
use thiserror::Error;

/// A class or method reference the facade could not resolve.
///
/// These never abort verification: the offending type is replaced by Top
/// and the error is kept as a diagnostic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The class source has no class with this id
    #[error("Unresolved class: id {id}")]
    UnresolvedClass {
        /// Requested class id
        id: ClassId,
    },

    /// A textual class reference did not resolve
    #[error("Unresolved class descriptor: {descriptor}")]
    UnresolvedDescriptor {
        /// The descriptor as given by the loader
        descriptor: String,
    },

    /// The class source has no method with this id
    #[error("Unresolved method: id {id}")]
    UnresolvedMethod {
        /// Requested method id
        id: MethodId,
    },

    /// A primitive class carries no valid primitive type id
    #[error("Invalid primitive type {type_id:?} for class {class}")]
    InvalidPrimitive {
        /// Class name
        class: String,
        /// Primitive type id reported by the loader
        type_id: Option<u8>,
    },

    /// An array class without a component type
    #[error("Array class {class} has no component type")]
    MissingArrayComponent {
        /// Class name
        class: String,
    },

    /// A method signature without a return type
    #[error("Method {method} has an empty signature")]
    EmptySignature {
        /// Method name
        method: String,
    },

    /// A class reached again while resolving its own ancestors
    #[error("Cyclic class hierarchy through {class}")]
    CyclicHierarchy {
        /// Class name
        class: String,
    },
}

/// Errors from looking up an engine in a [`Registry`](crate::Registry).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No engines were configured for this language
    #[error("No engines configured for language {0:?}")]
    UnknownKind(LanguageKind),

    /// Thread slot beyond the configured thread count
    #[error("Thread slot {slot} out of range (thread count: {thread_count})")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Configured number of threads
        thread_count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_messages() {
        let err = ResolveError::UnresolvedDescriptor {
            descriptor: "Lcom/example/Missing;".to_string(),
        };
        assert_eq!(err.to_string(), "Unresolved class descriptor: Lcom/example/Missing;");

        let err = ResolveError::InvalidPrimitive {
            class: "weird".to_string(),
            type_id: Some(42),
        };
        assert_eq!(err.to_string(), "Invalid primitive type Some(42) for class weird");
    }

    #[test]
    fn test_registry_error_messages() {
        let err = RegistryError::SlotOutOfRange { slot: 8, thread_count: 4 };
        assert_eq!(err.to_string(), "Thread slot 8 out of range (thread count: 4)");
    }
}
