//! Type universe: structural interning of (sort, parameters) shapes
//!
//! Besides the shape ↔ id mapping, the universe keeps two indices the
//! closure needs:
//!
//! - families: ids grouped by (sort, arity), the only groups in which a
//!   structural comparison can succeed;
//! - param-of: for each id, the compound types that mention it as a
//!   parameter, i.e. what has to be re-examined when its edges change.

use crate::sort::Sort;
use crate::ty::{Param, ParamList, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Structural key of an interned type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeShape {
    /// Type constructor
    pub sort: Sort,
    /// Ordered parameters
    pub params: ParamList,
}

impl TypeShape {
    /// Create a shape.
    pub fn new(sort: Sort, params: ParamList) -> Self {
        TypeShape { sort, params }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Family this shape belongs to.
    pub fn family(&self) -> FamilyKey {
        FamilyKey {
            sort: self.sort,
            arity: self.params.len() as u32,
        }
    }
}

/// (sort, arity) grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FamilyKey {
    /// Type constructor
    pub sort: Sort,
    /// Number of parameters
    pub arity: u32,
}

impl FamilyKey {
    /// Whether members of this family can be related structurally.
    ///
    /// Nullary families hold a single member per sort.
    pub fn is_structural(self) -> bool {
        self.arity > 0
    }
}

/// Append-only structural interner.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    /// Shapes indexed by type id
    shapes: Vec<TypeShape>,
    /// Shape → id lookup
    index: FxHashMap<TypeShape, TypeId>,
    /// Members of each family, in creation order
    families: FxHashMap<FamilyKey, Vec<TypeId>>,
    /// Compound types referencing each id as a parameter
    param_of: Vec<SmallVec<[TypeId; 4]>>,
}

impl Universe {
    /// Create an empty universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a shape without interning it.
    pub fn lookup(&self, shape: &TypeShape) -> Option<TypeId> {
        self.index.get(shape).copied()
    }

    /// Intern a shape.
    ///
    /// Returns the id and whether it was created by this call.
    pub fn intern(&mut self, shape: TypeShape) -> (TypeId, bool) {
        if let Some(&id) = self.index.get(&shape) {
            return (id, false);
        }

        let id = TypeId::from_index(self.shapes.len());
        self.param_of.push(SmallVec::new());

        for param in &shape.params {
            let users = &mut self.param_of[param.id.index()];
            if users.last() != Some(&id) {
                users.push(id);
            }
        }

        self.families.entry(shape.family()).or_default().push(id);
        self.index.insert(shape.clone(), id);
        self.shapes.push(shape);

        (id, true)
    }

    /// Shape of an interned type.
    ///
    /// # Panics
    ///
    /// Panics if the id was not created by this universe.
    #[inline]
    pub fn shape(&self, id: TypeId) -> &TypeShape {
        &self.shapes[id.index()]
    }

    /// Sort of an interned type.
    #[inline]
    pub fn sort(&self, id: TypeId) -> Sort {
        self.shape(id).sort
    }

    /// Arity of an interned type.
    #[inline]
    pub fn arity(&self, id: TypeId) -> usize {
        self.shape(id).arity()
    }

    /// Parameters of an interned type.
    #[inline]
    pub fn params(&self, id: TypeId) -> &[Param] {
        &self.shape(id).params
    }

    /// Family of an interned type.
    #[inline]
    pub fn family_of(&self, id: TypeId) -> FamilyKey {
        self.shape(id).family()
    }

    /// Members of a family (empty if the family is unknown).
    pub fn family(&self, key: FamilyKey) -> &[TypeId] {
        self.families.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every family that currently has members.
    pub fn families(&self) -> impl Iterator<Item = FamilyKey> + '_ {
        self.families.keys().copied()
    }

    /// Compound types that use `id` as a parameter.
    pub fn param_of(&self, id: TypeId) -> &[TypeId] {
        &self.param_of[id.index()]
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
