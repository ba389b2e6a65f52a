//! Finite sets of types, used for least-upper-bound candidates

use crate::ty::{EngineId, TypeHandle, TypeId};
use fixedbitset::FixedBitSet;

/// A set of types from one engine.
///
/// Members iterate in ascending id order. Binary operations require both
/// operands to come from the same engine.
#[derive(Debug, Clone)]
pub struct TypeSet {
    engine: EngineId,
    members: FixedBitSet,
}

impl TypeSet {
    /// Empty set for `engine`.
    pub fn empty(engine: EngineId) -> Self {
        TypeSet {
            engine,
            members: FixedBitSet::new(),
        }
    }

    /// Set holding one type.
    pub fn singleton(ty: TypeHandle) -> Self {
        let mut set = Self::empty(ty.engine);
        set.insert(ty);
        set
    }

    /// Set holding the given types.
    pub fn of<I>(engine: EngineId, types: I) -> Self
    where
        I: IntoIterator<Item = TypeHandle>,
    {
        let mut set = Self::empty(engine);
        for ty in types {
            set.insert(ty);
        }
        set
    }

    pub(crate) fn from_bits(engine: EngineId, members: FixedBitSet) -> Self {
        TypeSet { engine, members }
    }

    /// Engine the members belong to.
    pub fn engine(&self) -> EngineId {
        self.engine
    }

    /// Add a type. Returns false if it was already present.
    pub fn insert(&mut self, ty: TypeHandle) -> bool {
        self.check_engine(ty.engine);
        let bit = ty.id.index();
        if bit >= self.members.len() {
            self.members.grow(bit + 1);
        }
        !self.members.put(bit)
    }

    /// Add a type in place (`self | ty`).
    pub fn union_with(&mut self, ty: TypeHandle) -> &mut Self {
        self.insert(ty);
        self
    }

    /// Members of either set.
    pub fn union(&self, other: &TypeSet) -> TypeSet {
        self.check_engine(other.engine);
        let mut members = self.members.clone();
        members.union_with(&other.members);
        TypeSet::from_bits(self.engine, members)
    }

    /// Members of both sets.
    pub fn intersect(&self, other: &TypeSet) -> TypeSet {
        self.check_engine(other.engine);
        let mut members = self.members.clone();
        members.intersect_with(&other.members);
        TypeSet::from_bits(self.engine, members)
    }

    /// Membership test.
    pub fn contains(&self, ty: TypeHandle) -> bool {
        self.check_engine(ty.engine);
        self.members.contains(ty.id.index())
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.count_ones(..)
    }

    /// Check if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.members.ones().next().is_none()
    }

    /// The single member, if there is exactly one.
    ///
    /// Never picks among several candidates.
    pub fn the_only_element(&self) -> Option<TypeHandle> {
        let mut ones = self.members.ones();
        let only = ones.next()?;
        if ones.next().is_some() {
            return None;
        }
        Some(self.handle(only))
    }

    /// Members in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        self.members.ones().map(move |bit| self.handle(bit))
    }

    fn handle(&self, bit: usize) -> TypeHandle {
        TypeHandle {
            engine: self.engine,
            id: TypeId::from_index(bit),
        }
    }

    fn check_engine(&self, engine: EngineId) {
        assert_eq!(
            engine, self.engine,
            "type set of engine {:?} used with engine {:?}",
            self.engine, engine
        );
    }
}

impl PartialEq for TypeSet {
    fn eq(&self, other: &Self) -> bool {
        self.engine == other.engine && self.members.ones().eq(other.members.ones())
    }
}

impl Eq for TypeSet {}
