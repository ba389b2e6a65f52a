//! Bytecode domain on top of the generic lattice
//!
//! Builtin primitive and reference hierarchies, class and method
//! descriptors, and the facade that turns descriptors into types.

pub mod builtins;
pub mod descriptor;
pub mod engine;
pub mod resolver;

pub use builtins::{BaseNames, Builtins, LanguageKind, PrimitiveKind};
pub use descriptor::{
    ClassDescriptor, ClassFlags, ClassId, ClassRef, ClassSource, ClassTable, MethodDescriptor, MethodId,
};
pub use engine::VerifierEngine;
pub use resolver::TypeResolver;
