//! Core value types: type ids, variance, parameters, handles

use crate::sort::Sort;
use crate::system::TypeSystem;
use smallvec::SmallVec;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Dense identifier of an interned type within one engine.
///
/// Ids are handed out in creation order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Raw index of this type.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        TypeId(index as u32)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Source of engine generations. Every engine ever constructed in the
/// process gets a distinct generation, so handles of a dropped engine
/// never validate against a new one.
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Identity of one engine instance: (kind, thread slot, generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId {
    kind: u8,
    slot: u32,
    generation: u32,
}

impl EngineId {
    /// Allocate a fresh identity for an engine of `kind` serving `slot`.
    pub fn fresh(kind: u8, slot: u32) -> Self {
        EngineId {
            kind,
            slot,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Identity for an engine that is not owned by a registry.
    pub fn standalone() -> Self {
        Self::fresh(u8::MAX, 0)
    }

    /// Engine kind tag.
    pub fn kind(self) -> u8 {
        self.kind
    }

    /// Thread slot served by the engine.
    pub fn slot(self) -> u32 {
        self.slot
    }
}

/// How a parameter's subtyping direction relates to its compound type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    /// Both directions must hold (`~T`)
    Invariant,
    /// Same direction as the compound (`+T`)
    Covariant,
    /// Opposite direction to the compound (`-T`)
    Contravariant,
}

impl Variance {
    /// Prefix used when rendering a parameter.
    pub fn sigil(self) -> char {
        match self {
            Variance::Invariant => '~',
            Variance::Covariant => '+',
            Variance::Contravariant => '-',
        }
    }
}

/// A variance-tagged reference to a type, as stored inside a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Param {
    /// Subtyping direction of this position
    pub variance: Variance,
    /// Referenced type
    pub id: TypeId,
}

/// Ordered parameter list of a compound type.
///
/// Order is meaningful: method arguments come first and the return type last.
pub type ParamList = SmallVec<[Param; 4]>;

/// A parameter built from a handle, before it is checked against an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeArg {
    /// Subtyping direction of this position
    pub variance: Variance,
    /// Referenced type
    pub ty: TypeHandle,
}

/// The value callers hold to refer to an interned type.
///
/// Handles are plain copyable data. Two handles are equal only if they come
/// from the same engine and name the same type. Every engine entry point
/// rejects handles minted by another engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    pub(crate) engine: EngineId,
    pub(crate) id: TypeId,
}

impl TypeHandle {
    /// Engine that owns this handle.
    pub fn engine(self) -> EngineId {
        self.engine
    }

    /// Interned id of this type.
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Use this type in a covariant position (`+T`).
    pub fn covariant(self) -> TypeArg {
        self.with_variance(Variance::Covariant)
    }

    /// Use this type in a contravariant position (`-T`).
    pub fn contravariant(self) -> TypeArg {
        self.with_variance(Variance::Contravariant)
    }

    /// Use this type in an invariant position (`~T`).
    pub fn invariant(self) -> TypeArg {
        self.with_variance(Variance::Invariant)
    }

    /// Use this type with an explicit variance.
    pub fn with_variance(self, variance: Variance) -> TypeArg {
        TypeArg { variance, ty: self }
    }
}

/// A type constructor bound to one engine.
///
/// Applying it to a parameter list interns the resulting type, or returns
/// the existing one when the same shape was built before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Parametric {
    pub(crate) engine: EngineId,
    pub(crate) sort: Sort,
}

impl Parametric {
    /// Sort this constructor builds.
    pub fn sort(self) -> Sort {
        self.sort
    }

    /// Build (or look up) the type `sort(args...)`.
    ///
    /// # Panics
    ///
    /// Panics if the constructor or any argument belongs to another engine.
    pub fn apply(self, types: &mut TypeSystem, args: &[TypeArg]) -> TypeHandle {
        types.apply(self, args)
    }

    /// Build (or look up) the nullary type of this sort.
    pub fn nullary(self, types: &mut TypeSystem) -> TypeHandle {
        types.apply(self, &[])
    }
}
