//! Raya Verifier Types
//!
//! Subtyping lattice used by the bytecode verifier: interned parametric
//! types, a transitively and structurally closed subtype relation,
//! least-upper-bound candidate sets, and the builtin primitive/reference
//! hierarchy with normalization.
//!
//! ```
//! use raya_verifier_types::{ClosureMode, TypeSystem};
//!
//! let mut types = TypeSystem::new(ClosureMode::Eager);
//! let animal = types.nullary("Animal");
//! let cat = types.nullary("Cat");
//! types.relate(cat, animal);
//!
//! let list = types.parametric("List");
//! let cats = list.apply(&mut types, &[cat.covariant()]);
//! let animals = list.apply(&mut types, &[animal.covariant()]);
//! assert!(types.is_subtype(cats, animals));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod error;
pub mod registry;
pub mod relation;
pub mod sort;
pub mod system;
pub mod ty;
pub mod type_set;
pub mod universe;
pub mod worklist;

pub use config::{ClosureMode, LatticeConfig};
pub use domain::{
    Builtins, ClassDescriptor, ClassFlags, ClassId, ClassRef, ClassSource, ClassTable, LanguageKind, MethodDescriptor,
    MethodId, PrimitiveKind, TypeResolver, VerifierEngine,
};
pub use error::{RegistryError, ResolveError};
pub use registry::{Registry, Shard};
pub use sort::{Sort, SortRegistry};
pub use system::{ClosureStats, TypeSystem};
pub use ty::{EngineId, Parametric, TypeArg, TypeHandle, TypeId, Variance};
pub use type_set::TypeSet;
