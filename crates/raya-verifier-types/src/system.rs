//! The type system engine
//!
//! [`TypeSystem`] owns the sort registry, the universe of interned types
//! and the subtyping relation. It keeps the relation closed under
//!
//! - transitivity (maintained by [`Relation`] on every insertion), and
//! - the structural rule: two types of the same family are related when
//!   each parameter position satisfies its variance.
//!
//! The structural rule is applied by a worklist fixpoint over families.
//! Which families are scheduled, and when the fixpoint runs, depends on
//! the [`ClosureMode`]; the final relation does not.

use crate::config::ClosureMode;
use crate::relation::Relation;
use crate::sort::{Sort, SortRegistry};
use crate::ty::{EngineId, Param, ParamList, Parametric, TypeArg, TypeHandle, TypeId, Variance};
use crate::type_set::TypeSet;
use crate::universe::{FamilyKey, TypeShape, Universe};
use crate::worklist::Worklist;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// Work done by one run of the closure fixpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosureStats {
    /// Worklist generations processed
    pub rounds: usize,
    /// Unrelated same-family pairs tested structurally
    pub pairs_checked: usize,
    /// Pairs added to the relation, transitive consequences included
    pub edges_added: usize,
}

/// A self-contained subtyping lattice.
///
/// Not shared across threads: concurrency comes from giving every worker
/// its own engine (see [`Registry`](crate::Registry)).
#[derive(Debug)]
pub struct TypeSystem {
    id: EngineId,
    mode: ClosureMode,
    sorts: SortRegistry,
    universe: Universe,
    relation: Relation,
    pending: Worklist<FamilyKey>,
    /// Manual-mode changes not yet seen by `close_all`
    unclosed: bool,
    bot: TypeId,
    top: TypeId,
}

impl TypeSystem {
    /// Create a standalone engine.
    pub fn new(mode: ClosureMode) -> Self {
        Self::with_id(EngineId::standalone(), mode)
    }

    /// Create an engine with an explicit identity.
    pub fn with_id(id: EngineId, mode: ClosureMode) -> Self {
        let mut sorts = SortRegistry::new();
        let mut universe = Universe::new();
        let mut relation = Relation::new();

        let bot_sort = sorts.id_of("Bot");
        let top_sort = sorts.id_of("Top");
        let (bot, _) = universe.intern(TypeShape::new(bot_sort, ParamList::new()));
        let (top, _) = universe.intern(TypeShape::new(top_sort, ParamList::new()));
        relation.add_type(bot);
        relation.add_type(top);
        relation.relate(bot, top);

        TypeSystem {
            id,
            mode,
            sorts,
            universe,
            relation,
            pending: Worklist::new(),
            unclosed: false,
            bot,
            top,
        }
    }

    /// Identity of this engine.
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Current closure policy.
    pub fn mode(&self) -> ClosureMode {
        self.mode
    }

    /// Change the closure policy.
    ///
    /// Edges added under [`ClosureMode::Manual`] were never scheduled, so
    /// call [`close_all`](Self::close_all) after leaving manual mode.
    pub fn set_mode(&mut self, mode: ClosureMode) {
        self.mode = mode;
    }

    /// The subtype of every type.
    pub fn bot(&self) -> TypeHandle {
        self.handle(self.bot)
    }

    /// The supertype of every type.
    pub fn top(&self) -> TypeHandle {
        self.handle(self.top)
    }

    // ========================================================================
    // Sorts and construction
    // ========================================================================

    /// Sort for `name`, registered on first use.
    pub fn sort(&mut self, name: &str) -> Sort {
        self.sorts.id_of(name)
    }

    /// Name of a sort.
    pub fn sort_name(&self, sort: Sort) -> &str {
        self.sorts.name_of(sort)
    }

    /// The sort registry.
    pub fn sorts(&self) -> &SortRegistry {
        &self.sorts
    }

    /// Constructor for the sort named `name`.
    pub fn parametric(&mut self, name: &str) -> Parametric {
        Parametric {
            engine: self.id,
            sort: self.sorts.id_of(name),
        }
    }

    /// The nullary type named `name`, e.g. a primitive or a class.
    pub fn nullary(&mut self, name: &str) -> TypeHandle {
        let ctor = self.parametric(name);
        self.apply(ctor, &[])
    }

    /// The nullary type named `name`, if it was already built.
    pub fn find_nullary(&self, name: &str) -> Option<TypeHandle> {
        let sort = self.sorts.lookup(name)?;
        self.find_shape(sort)
    }

    /// The type of the class named `name`.
    ///
    /// Classes get their own sorts, so no class can alias a builtin type
    /// or a constructor built with [`nullary`](Self::nullary).
    pub fn class_type(&mut self, name: &str) -> TypeHandle {
        let sort = self.sorts.class_id_of(name);
        self.intern(TypeShape::new(sort, ParamList::new()))
    }

    /// The type of the class named `name`, if it was already built.
    pub fn find_class_type(&self, name: &str) -> Option<TypeHandle> {
        let sort = self.sorts.lookup_class(name)?;
        self.find_shape(sort)
    }

    fn find_shape(&self, sort: Sort) -> Option<TypeHandle> {
        self.universe
            .lookup(&TypeShape::new(sort, ParamList::new()))
            .map(|id| self.handle(id))
    }

    pub(crate) fn apply(&mut self, ctor: Parametric, args: &[TypeArg]) -> TypeHandle {
        assert_eq!(
            ctor.engine, self.id,
            "type constructor belongs to engine {:?}, not {:?}",
            ctor.engine, self.id
        );
        let params: ParamList = args
            .iter()
            .map(|arg| Param {
                variance: arg.variance,
                id: self.own(arg.ty),
            })
            .collect();
        self.intern(TypeShape::new(ctor.sort, params))
    }

    fn intern(&mut self, shape: TypeShape) -> TypeHandle {
        let (id, created) = self.universe.intern(shape);
        if created {
            self.relation.add_type(id);
            self.relation.relate(self.bot, id);
            self.relation.relate(id, self.top);
            trace!(ty = id.index(), sort = %self.sorts.name_of(self.universe.sort(id)), "interned type");

            let family = self.universe.family_of(id);
            if self.mode.is_incremental() {
                if family.is_structural() {
                    self.pending.push(family);
                }
                if self.mode == ClosureMode::Eager {
                    self.close_now();
                }
            } else if family.is_structural() {
                self.unclosed = true;
            }
        }
        self.handle(id)
    }

    // ========================================================================
    // Relating and closing
    // ========================================================================

    /// Declare `lhs <= rhs`.
    ///
    /// The edge and its transitive consequences are recorded immediately.
    /// Structural consequences follow the closure policy.
    pub fn relate(&mut self, lhs: TypeHandle, rhs: TypeHandle) {
        let (lhs, rhs) = (self.own(lhs), self.own(rhs));
        let fresh = self.relation.relate(lhs, rhs);
        if fresh.is_empty() {
            return;
        }
        trace!(lhs = lhs.index(), rhs = rhs.index(), added = fresh.len(), "related types");

        if self.mode.is_incremental() {
            self.schedule(&fresh);
            if self.mode == ClosureMode::Eager {
                self.close_now();
            }
        } else {
            self.unclosed = true;
        }
    }

    /// Declare `sub <= sup` for every `sub` in `subs`.
    pub fn relate_all(&mut self, subs: &[TypeHandle], sup: TypeHandle) {
        for &sub in subs {
            self.relate(sub, sup);
        }
    }

    /// Queue every family whose structural pairs may depend on the given
    /// freshly added pairs.
    fn schedule(&mut self, fresh: &[(TypeId, TypeId)]) {
        let mut touched = FxHashSet::default();
        for &(lhs, rhs) in fresh {
            touched.insert(lhs);
            touched.insert(rhs);
        }

        for id in touched {
            let family = self.universe.family_of(id);
            if family.is_structural() {
                self.pending.push(family);
            }
            for &user in self.universe.param_of(id) {
                self.pending.push(self.universe.family_of(user));
            }
        }
    }

    /// Run the fixpoint over everything scheduled so far.
    pub fn close_now(&mut self) -> ClosureStats {
        let mut stats = ClosureStats::default();

        while let Some(batch) = self.pending.advance() {
            stats.rounds += 1;

            for family in batch {
                let members = self.universe.family(family).to_vec();
                for &lhs in &members {
                    for &rhs in &members {
                        if lhs == rhs || self.relation.contains(lhs, rhs) {
                            continue;
                        }
                        stats.pairs_checked += 1;
                        if self.structurally_related(lhs, rhs) {
                            let fresh = self.relation.relate(lhs, rhs);
                            stats.edges_added += fresh.len();
                            self.schedule(&fresh);
                        }
                    }
                }
            }
        }

        if stats.rounds > 0 {
            debug!(
                rounds = stats.rounds,
                pairs_checked = stats.pairs_checked,
                edges_added = stats.edges_added,
                "closure reached fixpoint"
            );
        }
        stats
    }

    /// Close the edges accumulated in [`ClosureMode::Deferred`].
    pub fn close_accumulated(&mut self) -> ClosureStats {
        self.close_now()
    }

    /// Re-examine every family from scratch and close.
    ///
    /// This is how [`ClosureMode::Manual`] reaches the fixpoint; it is valid
    /// in every mode.
    pub fn close_all(&mut self) -> ClosureStats {
        let mut families: Vec<FamilyKey> = self
            .universe
            .families()
            .filter(|family| family.is_structural())
            .collect();
        families.sort_unstable();
        for family in families {
            self.pending.push(family);
        }
        self.unclosed = false;
        self.close_now()
    }

    /// Whether the structural rule derives `lhs <= rhs` from the current
    /// relation. Both types must be in the same family.
    fn structurally_related(&self, lhs: TypeId, rhs: TypeId) -> bool {
        debug_assert_eq!(self.universe.sort(lhs), self.universe.sort(rhs));
        let lhs_params = self.universe.params(lhs);
        let rhs_params = self.universe.params(rhs);
        assert_eq!(
            lhs_params.len(),
            rhs_params.len(),
            "parameter count mismatch between {} and {}",
            lhs,
            rhs
        );

        lhs_params.iter().zip(rhs_params).all(|(l, r)| {
            if l.variance != r.variance {
                return false;
            }
            match l.variance {
                Variance::Invariant => self.relation.contains_iso(l.id, r.id),
                Variance::Covariant => self.relation.contains(l.id, r.id),
                Variance::Contravariant => self.relation.contains(r.id, l.id),
            }
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// `lhs <= rhs`.
    pub fn is_subtype(&self, lhs: TypeHandle, rhs: TypeHandle) -> bool {
        self.relation.contains(self.own(lhs), self.own(rhs))
    }

    /// `lhs <= rhs` and `rhs <= lhs`.
    pub fn is_iso(&self, lhs: TypeHandle, rhs: TypeHandle) -> bool {
        self.relation.contains_iso(self.own(lhs), self.own(rhs))
    }

    /// Every supertype of `ty`, itself and Top included, ascending by id.
    pub fn supertypes(&self, ty: TypeHandle) -> impl Iterator<Item = TypeHandle> + '_ {
        let id = self.own(ty);
        self.relation.supertypes(id).map(move |sup| self.handle(sup))
    }

    /// Every subtype of `ty`, itself and Bot included, ascending by id.
    pub fn subtypes(&self, ty: TypeHandle) -> impl Iterator<Item = TypeHandle> + '_ {
        let id = self.own(ty);
        self.relation.subtypes(id).map(move |sub| self.handle(sub))
    }

    /// Supertypes of `ty` as a set.
    pub fn supertypes_set(&self, ty: TypeHandle) -> TypeSet {
        let id = self.own(ty);
        TypeSet::from_bits(self.id, self.relation.supertype_bits(id).clone())
    }

    /// Common supertypes of `a` and `b`: the candidates for their least
    /// upper bound. Not necessarily a singleton.
    pub fn join(&self, a: TypeHandle, b: TypeHandle) -> TypeSet {
        self.supertypes_set(a).intersect(&self.supertypes_set(b))
    }

    /// Narrow a candidate set to the members that are also supertypes of `ty`.
    pub fn join_with(&self, set: &TypeSet, ty: TypeHandle) -> TypeSet {
        set.intersect(&self.supertypes_set(ty))
    }

    /// Common supertypes of all handles, or `None` for an empty input.
    pub fn join_all<I>(&self, types: I) -> Option<TypeSet>
    where
        I: IntoIterator<Item = TypeHandle>,
    {
        let mut types = types.into_iter();
        let first = self.supertypes_set(types.next()?);
        Some(types.fold(first, |acc, ty| self.join_with(&acc, ty)))
    }

    /// A set holding exactly the given handles.
    pub fn type_set<I>(&self, types: I) -> TypeSet
    where
        I: IntoIterator<Item = TypeHandle>,
    {
        let mut set = TypeSet::empty(self.id);
        for ty in types {
            self.own(ty);
            set.union_with(ty);
        }
        set
    }

    /// Sort of `ty`.
    pub fn sort_of(&self, ty: TypeHandle) -> Sort {
        self.universe.sort(self.own(ty))
    }

    /// Number of parameters of `ty`.
    pub fn arity(&self, ty: TypeHandle) -> usize {
        self.universe.arity(self.own(ty))
    }

    /// Parameters of `ty`, in order.
    pub fn params_of(&self, ty: TypeHandle) -> impl Iterator<Item = TypeArg> + '_ {
        let id = self.own(ty);
        self.universe.params(id).iter().map(move |param| TypeArg {
            variance: param.variance,
            ty: self.handle(param.id),
        })
    }

    /// Every type in the engine, in creation order.
    pub fn handles(&self) -> impl Iterator<Item = TypeHandle> + '_ {
        (0..self.universe.len()).map(move |index| self.handle(TypeId::from_index(index)))
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.universe.len()
    }

    /// Always false: Bot and Top exist from construction.
    pub fn is_empty(&self) -> bool {
        self.universe.is_empty()
    }

    /// Number of pairs in the relation.
    pub fn edge_count(&self) -> usize {
        self.relation.edge_count()
    }

    /// Whether families are waiting for a close.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether the relation is at the fixpoint: nothing is scheduled and no
    /// manual-mode change is waiting for [`close_all`](Self::close_all).
    pub fn is_closed(&self) -> bool {
        self.pending.is_empty() && !self.unclosed
    }

    // ========================================================================
    // Handles
    // ========================================================================

    #[inline]
    pub(crate) fn handle(&self, id: TypeId) -> TypeHandle {
        TypeHandle { engine: self.id, id }
    }

    /// Unwrap a handle, rejecting handles of other engines.
    #[inline]
    pub(crate) fn own(&self, ty: TypeHandle) -> TypeId {
        assert_eq!(
            ty.engine, self.id,
            "type handle belongs to engine {:?}, not {:?}",
            ty.engine, self.id
        );
        ty.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_and_top_exist() {
        let types = TypeSystem::new(ClosureMode::Eager);
        assert_eq!(types.len(), 2);
        assert!(types.is_subtype(types.bot(), types.top()));
        assert!(!types.is_subtype(types.top(), types.bot()));
        assert!(types.is_subtype(types.bot(), types.bot()));
        assert!(types.is_subtype(types.top(), types.top()));
    }

    #[test]
    fn test_new_types_sit_between_bot_and_top() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        assert!(types.is_subtype(a, a));
        assert!(types.is_subtype(types.bot(), a));
        assert!(types.is_subtype(a, types.top()));
    }

    #[test]
    fn test_nullary_is_interned() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let again = types.nullary("A");
        assert_eq!(a, again);
        assert_eq!(types.find_nullary("A"), Some(a));
        assert_eq!(types.find_nullary("B"), None);
    }

    #[test]
    fn test_class_types_are_their_own_namespace() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let builtin = types.nullary("i32");
        let class = types.class_type("i32");
        let top_class = types.class_type("Top");

        assert_ne!(class, builtin);
        assert_ne!(top_class, types.top());
        assert_eq!(types.class_type("i32"), class);
        assert_eq!(types.find_class_type("i32"), Some(class));
        assert_eq!(types.find_nullary("i32"), Some(builtin));
        assert_eq!(types.find_class_type("Missing"), None);
        assert_eq!(types.sort_name(types.sort_of(class)), "i32");
    }

    #[test]
    fn test_covariant_structural_edge() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let b = types.nullary("B");
        types.relate(b, a);

        let boxed = types.parametric("Box");
        let box_a = boxed.apply(&mut types, &[a.covariant()]);
        let box_b = boxed.apply(&mut types, &[b.covariant()]);

        assert!(types.is_subtype(box_b, box_a));
        assert!(!types.is_subtype(box_a, box_b));
    }

    #[test]
    fn test_edge_after_compounds_exist() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let b = types.nullary("B");
        let sink = types.parametric("Sink");
        let sink_a = sink.apply(&mut types, &[a.contravariant()]);
        let sink_b = sink.apply(&mut types, &[b.contravariant()]);
        assert!(!types.is_subtype(sink_a, sink_b));

        types.relate(b, a);
        assert!(types.is_subtype(sink_a, sink_b));
        assert!(!types.is_subtype(sink_b, sink_a));
    }

    #[test]
    fn test_mixed_variance_positions_do_not_relate() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let boxed = types.parametric("Box");
        let co = boxed.apply(&mut types, &[a.covariant()]);
        let contra = boxed.apply(&mut types, &[a.contravariant()]);

        assert!(!types.is_subtype(co, contra));
        assert!(!types.is_subtype(contra, co));
    }

    #[test]
    fn test_deferred_mode_waits_for_close() {
        let mut types = TypeSystem::new(ClosureMode::Deferred);
        let a = types.nullary("A");
        let b = types.nullary("B");
        let boxed = types.parametric("Box");
        let box_a = boxed.apply(&mut types, &[a.covariant()]);
        let box_b = boxed.apply(&mut types, &[b.covariant()]);
        types.relate(b, a);

        assert!(types.has_pending());
        assert!(!types.is_subtype(box_b, box_a));

        let stats = types.close_accumulated();
        assert!(stats.rounds >= 1);
        assert!(stats.edges_added >= 1);
        assert!(types.is_subtype(box_b, box_a));
        assert!(!types.has_pending());
        assert!(types.is_closed());
    }

    #[test]
    fn test_manual_mode_schedules_nothing() {
        let mut types = TypeSystem::new(ClosureMode::Manual);
        let a = types.nullary("A");
        let b = types.nullary("B");
        let boxed = types.parametric("Box");
        let box_a = boxed.apply(&mut types, &[a.covariant()]);
        let box_b = boxed.apply(&mut types, &[b.covariant()]);
        types.relate(b, a);

        assert!(!types.has_pending());
        assert!(!types.is_closed());
        assert_eq!(types.close_accumulated(), ClosureStats::default());
        assert!(!types.is_subtype(box_b, box_a));

        types.close_all();
        assert!(types.is_subtype(box_b, box_a));
        assert!(types.is_closed());
    }

    #[test]
    fn test_nested_compounds_close() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let b = types.nullary("B");
        let list = types.parametric("List");
        let list_a = list.apply(&mut types, &[a.covariant()]);
        let list_b = list.apply(&mut types, &[b.covariant()]);
        let list_list_a = list.apply(&mut types, &[list_a.covariant()]);
        let list_list_b = list.apply(&mut types, &[list_b.covariant()]);

        types.relate(b, a);
        assert!(types.is_subtype(list_b, list_a));
        assert!(types.is_subtype(list_list_b, list_list_a));
    }

    #[test]
    fn test_params_and_arity() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let b = types.nullary("B");
        let pair = types.parametric("Pair");
        let ab = pair.apply(&mut types, &[a.invariant(), b.contravariant()]);

        assert_eq!(types.arity(ab), 2);
        assert_eq!(types.sort_name(types.sort_of(ab)), "Pair");
        let params: Vec<TypeArg> = types.params_of(ab).collect();
        assert_eq!(params, vec![a.invariant(), b.contravariant()]);
    }

    #[test]
    #[should_panic(expected = "type handle belongs to engine")]
    fn test_cross_engine_handle_panics() {
        let mut first = TypeSystem::new(ClosureMode::Eager);
        let second = TypeSystem::new(ClosureMode::Eager);
        let a = first.nullary("A");
        second.is_subtype(a, second.top());
    }

    #[test]
    #[should_panic(expected = "type constructor belongs to engine")]
    fn test_cross_engine_constructor_panics() {
        let mut first = TypeSystem::new(ClosureMode::Eager);
        let mut second = TypeSystem::new(ClosureMode::Eager);
        let boxed = first.parametric("Box");
        boxed.nullary(&mut second);
    }

    #[test]
    fn test_supertypes_and_subtypes_iterate_in_id_order() {
        let mut types = TypeSystem::new(ClosureMode::Eager);
        let a = types.nullary("A");
        let b = types.nullary("B");
        types.relate(a, b);

        let ups: Vec<TypeHandle> = types.supertypes(a).collect();
        assert_eq!(ups, vec![types.top(), a, b]);
        let downs: Vec<TypeHandle> = types.subtypes(b).collect();
        assert_eq!(downs, vec![types.bot(), a, b]);
    }
}
