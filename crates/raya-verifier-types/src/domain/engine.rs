//! One verifier engine: a type system with the builtin hierarchy installed

use super::builtins::{Builtins, LanguageKind};
use crate::config::ClosureMode;
use crate::system::{ClosureStats, TypeSystem};
use crate::ty::{EngineId, TypeArg, TypeHandle};
use crate::type_set::TypeSet;
use rustc_hash::FxHashMap;

/// A [`TypeSystem`] bound to one language, with its builtins and the
/// normalization memo.
#[derive(Debug)]
pub struct VerifierEngine {
    kind: LanguageKind,
    types: TypeSystem,
    builtins: Builtins,
    normalized: FxHashMap<TypeHandle, TypeHandle>,
}

impl VerifierEngine {
    /// Create an engine for `kind` serving thread `slot`.
    pub fn new(kind: LanguageKind, slot: u32, mode: ClosureMode) -> Self {
        let mut types = TypeSystem::with_id(EngineId::fresh(kind.tag(), slot), mode);
        let builtins = Builtins::install(&mut types, kind);
        if mode == ClosureMode::Manual {
            types.close_all();
        }
        VerifierEngine {
            kind,
            types,
            builtins,
            normalized: FxHashMap::default(),
        }
    }

    /// Language this engine verifies.
    pub fn kind(&self) -> LanguageKind {
        self.kind
    }

    /// Builtin types.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// The underlying type system.
    pub fn types(&self) -> &TypeSystem {
        &self.types
    }

    /// The underlying type system, mutably.
    pub fn types_mut(&mut self) -> &mut TypeSystem {
        &mut self.types
    }

    /// Bring the relation to its fixpoint under this engine's policy:
    /// `close_accumulated` when deferred, `close_all` when manual.
    pub fn close(&mut self) -> ClosureStats {
        if self.types.is_closed() {
            return ClosureStats::default();
        }
        match self.types.mode() {
            ClosureMode::Eager | ClosureMode::Deferred => self.types.close_accumulated(),
            ClosureMode::Manual => self.types.close_all(),
        }
    }

    /// `lhs <= rhs`, closing pending work first.
    pub fn is_subtype(&mut self, lhs: TypeHandle, rhs: TypeHandle) -> bool {
        self.close();
        self.types.is_subtype(lhs, rhs)
    }

    /// Least-upper-bound candidates of `a` and `b`, closing pending work
    /// first.
    pub fn join(&mut self, a: TypeHandle, b: TypeHandle) -> TypeSet {
        self.close();
        self.types.join(a, b)
    }

    /// Canonical representative of `ty`.
    ///
    /// Small integers collapse to `Integral32`, wide integers and floats to
    /// their width bucket, and method types to a `NormalizedMethod` over
    /// normalized parameters. A method is recorded as a subtype of its
    /// normalized form. Everything else is its own representative.
    pub fn normalized_of(&mut self, ty: TypeHandle) -> TypeHandle {
        if let Some(&normalized) = self.normalized.get(&ty) {
            return normalized;
        }

        let normalized = if let Some(primitive) = self.builtins.normalized_primitive(ty) {
            primitive
        } else if self.types.sort_of(ty) == self.builtins.method.sort() {
            let params: Vec<TypeArg> = self.types.params_of(ty).collect();
            let args: Vec<TypeArg> = params
                .into_iter()
                .map(|param| self.normalized_of(param.ty).with_variance(param.variance))
                .collect();
            let normalized = self.builtins.normalized_method.apply(&mut self.types, &args);
            self.types.relate(ty, normalized);
            normalized
        } else {
            ty
        };

        self.normalized.insert(ty, normalized);
        normalized
    }

    /// Human-readable rendering, e.g. `Method(-i8, -i8, +i64)`.
    pub fn image_of(&self, ty: TypeHandle) -> String {
        let mut image = String::new();
        self.write_image(&mut image, ty);
        image
    }

    fn write_image(&self, out: &mut String, ty: TypeHandle) {
        out.push_str(self.types.sort_name(self.types.sort_of(ty)));
        if self.types.arity(ty) == 0 {
            return;
        }
        out.push('(');
        for (i, param) in self.types.params_of(ty).enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push(param.variance.sigil());
            self.write_image(out, param.ty);
        }
        out.push(')');
    }

    /// Report every type with its proper supertypes, one line per type in
    /// creation order: `image <= sup1, sup2`.
    pub fn dump<F>(&mut self, mut handler: F)
    where
        F: FnMut(&str),
    {
        self.close();
        let mut line = String::new();
        for ty in self.types.handles() {
            line.clear();
            self.write_image(&mut line, ty);
            let mut first = true;
            for sup in self.types.supertypes(ty).filter(|&sup| sup != ty) {
                line.push_str(if first { " <= " } else { ", " });
                first = false;
                self.write_image(&mut line, sup);
            }
            handler(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_primitives() {
        let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, ClosureMode::Eager);
        let b = engine.builtins().clone();

        assert_eq!(engine.normalized_of(b.i8), b.integral32);
        assert_eq!(engine.normalized_of(b.u32), b.integral32);
        assert_eq!(engine.normalized_of(b.i64), b.integral64);
        assert_eq!(engine.normalized_of(b.f32), b.float32);
        assert_eq!(engine.normalized_of(b.f64), b.float64);
        assert_eq!(engine.normalized_of(b.ref_type), b.ref_type);
        assert_eq!(engine.normalized_of(b.void), b.void);
    }

    #[test]
    fn test_normalize_method() {
        let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, ClosureMode::Eager);
        let b = engine.builtins().clone();
        let method = b
            .method
            .apply(engine.types_mut(), &[b.i8.contravariant(), b.u16.covariant()]);

        let normalized = engine.normalized_of(method);
        assert_eq!(engine.image_of(normalized), "NormalizedMethod(-Integral32, +Integral32)");
        assert!(engine.is_subtype(method, normalized));
        assert_eq!(engine.normalized_of(normalized), normalized);
        assert_eq!(engine.normalized_of(method), normalized);
    }

    #[test]
    fn test_methods_with_same_normal_form_share_it() {
        let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, ClosureMode::Eager);
        let b = engine.builtins().clone();
        let narrow = b.method.apply(engine.types_mut(), &[b.i8.contravariant(), b.i8.covariant()]);
        let wide = b.method.apply(engine.types_mut(), &[b.i32.contravariant(), b.u16.covariant()]);

        assert_ne!(narrow, wide);
        assert_eq!(engine.normalized_of(narrow), engine.normalized_of(wide));
    }

    #[test]
    fn test_image_of_nested() {
        let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, ClosureMode::Eager);
        let b = engine.builtins().clone();
        let ints = b.array.apply(engine.types_mut(), &[b.i32.invariant()]);
        let method = b
            .method
            .apply(engine.types_mut(), &[ints.contravariant(), b.i64.covariant()]);

        assert_eq!(engine.image_of(b.i32), "i32");
        assert_eq!(engine.image_of(method), "Method(-Array(~i32), +i64)");
    }

    #[test]
    fn test_dump_lists_every_type() {
        let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, ClosureMode::Eager);
        let mut lines = Vec::new();
        engine.dump(|line| lines.push(line.to_string()));

        assert_eq!(lines.len(), engine.types().len());
        assert_eq!(lines[0], "Bot <= Top, void, u1, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, Integral8, Integral16, Integral32, Integral64, Float32, Float64, Bits32, Bits64, PrimitiveType, RefType, ObjectType, NullRefType, StringType, ArrayType, Abstract, Interface, TypeClass, Object, Class, Error");
        assert_eq!(lines[1], "Top");
        assert!(lines.contains(&"i8 <= Top, Integral8, Integral16, Integral32, Bits32, PrimitiveType".to_string()));
    }

    #[test]
    fn test_manual_engine_is_closed_after_construction() {
        let mut engine = VerifierEngine::new(LanguageKind::Ecma, 2, ClosureMode::Manual);
        let b = engine.builtins().clone();
        assert!(engine.types().is_closed());
        assert!(engine.is_subtype(b.u8, b.primitive));
        assert_eq!(engine.kind(), LanguageKind::Ecma);
        assert_eq!(engine.types().id().slot(), 2);
    }

    #[test]
    fn test_queries_close_pending_work() {
        for mode in [ClosureMode::Deferred, ClosureMode::Manual] {
            let mut engine = VerifierEngine::new(LanguageKind::Raya, 0, mode);
            let b = engine.builtins().clone();
            let bytes = b.array.apply(engine.types_mut(), &[b.i8.covariant()]);
            let ints = b.array.apply(engine.types_mut(), &[b.integral32.covariant()]);
            assert!(!engine.types().is_subtype(bytes, ints), "{:?}", mode);

            assert!(engine.is_subtype(bytes, ints), "{:?}", mode);
            assert!(engine.types().is_closed());
            assert!(engine.join(bytes, ints).contains(ints));
            assert_eq!(engine.close(), ClosureStats::default());
        }
    }
}
