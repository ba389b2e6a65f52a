//! Subtyping relation over type ids
//!
//! The relation is kept transitively closed at all times. Every type owns
//! two bitset rows: `up[a]` holds each `b` with `a <= b`, and `down[b]`
//! holds each `a` with `a <= b`. Membership is a single bit test, and
//! inserting an edge fills in every transitive consequence at once.
//!
//! Edges are never removed.

use crate::ty::TypeId;
use fixedbitset::FixedBitSet;

/// Transitively closed, reflexive subtyping relation.
#[derive(Debug, Clone, Default)]
pub struct Relation {
    up: Vec<FixedBitSet>,
    down: Vec<FixedBitSet>,
}

#[inline]
fn set_bit(row: &mut FixedBitSet, bit: usize) {
    if bit >= row.len() {
        row.grow(bit + 1);
    }
    row.insert(bit);
}

impl Relation {
    /// Create an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly interned type and its reflexive edge.
    ///
    /// Types must be registered in id order.
    pub fn add_type(&mut self, id: TypeId) {
        debug_assert_eq!(id.index(), self.up.len(), "types must be registered in id order");

        let mut up = FixedBitSet::with_capacity(id.index() + 1);
        up.insert(id.index());
        let mut down = FixedBitSet::with_capacity(id.index() + 1);
        down.insert(id.index());

        self.up.push(up);
        self.down.push(down);
    }

    /// Check `lhs <= rhs`.
    #[inline]
    pub fn contains(&self, lhs: TypeId, rhs: TypeId) -> bool {
        self.up[lhs.index()].contains(rhs.index())
    }

    /// Check `lhs <= rhs` and `rhs <= lhs`.
    #[inline]
    pub fn contains_iso(&self, lhs: TypeId, rhs: TypeId) -> bool {
        self.contains(lhs, rhs) && self.contains(rhs, lhs)
    }

    /// Add `lhs <= rhs` together with everything it implies transitively.
    ///
    /// Returns every pair that was not in the relation before, in insertion
    /// order. An already-known edge yields an empty list.
    pub fn relate(&mut self, lhs: TypeId, rhs: TypeId) -> Vec<(TypeId, TypeId)> {
        if self.contains(lhs, rhs) {
            return Vec::new();
        }

        let lowers: Vec<usize> = self.down[lhs.index()].ones().collect();
        let uppers = self.up[rhs.index()].clone();
        let mut fresh = Vec::new();

        for x in lowers {
            let missing: Vec<usize> = uppers.difference(&self.up[x]).collect();
            for y in missing {
                set_bit(&mut self.up[x], y);
                set_bit(&mut self.down[y], x);
                fresh.push((TypeId::from_index(x), TypeId::from_index(y)));
            }
        }

        fresh
    }

    /// Every `b` with `id <= b`, including `id`, ascending.
    pub fn supertypes(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.up[id.index()].ones().map(TypeId::from_index)
    }

    /// Every `a` with `a <= id`, including `id`, ascending.
    pub fn subtypes(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.down[id.index()].ones().map(TypeId::from_index)
    }

    /// Upward row of `id` as a bitset.
    pub fn supertype_bits(&self, id: TypeId) -> &FixedBitSet {
        &self.up[id.index()]
    }

    /// Number of types registered.
    pub fn len(&self) -> usize {
        self.up.len()
    }

    /// Check if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.up.is_empty()
    }

    /// Total number of pairs in the relation, reflexive ones included.
    pub fn edge_count(&self) -> usize {
        self.up.iter().map(|row| row.count_ones(..)).sum()
    }
}
