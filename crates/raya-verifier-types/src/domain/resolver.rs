//! Turns loader descriptors into lattice types
//!
//! A [`TypeResolver`] borrows one engine and one class source for the
//! duration of a verification job. Resolution failures never abort: the
//! offending type becomes Top and the failure is kept as a diagnostic.
//!
//! Plain classes are class types, so a loaded class can only reach a
//! builtin when the language names it as a base.

use super::builtins::PrimitiveKind;
use super::descriptor::{ClassDescriptor, ClassFlags, ClassId, ClassRef, ClassSource, MethodDescriptor, MethodId};
use super::engine::VerifierEngine;
use crate::error::ResolveError;
use crate::system::ClosureStats;
use crate::ty::{TypeArg, TypeHandle};
use crate::type_set::TypeSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

/// Resolves classes and methods of one [`ClassSource`] into an engine.
pub struct TypeResolver<'e, 's, S: ClassSource> {
    engine: &'e mut VerifierEngine,
    source: &'s S,
    /// Resolved classes, failures included
    classes: FxHashMap<ClassId, TypeHandle>,
    /// Resolved methods
    methods: FxHashMap<MethodId, TypeHandle>,
    /// Classes whose ancestors are being resolved
    in_progress: FxHashSet<ClassId>,
    diagnostics: Vec<ResolveError>,
}

impl<'e, 's, S: ClassSource> TypeResolver<'e, 's, S> {
    /// Create a resolver over `engine` reading from `source`.
    pub fn new(engine: &'e mut VerifierEngine, source: &'s S) -> Self {
        TypeResolver {
            engine,
            source,
            classes: FxHashMap::default(),
            methods: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            diagnostics: Vec::new(),
        }
    }

    /// The engine types are resolved into.
    pub fn engine(&self) -> &VerifierEngine {
        &*self.engine
    }

    /// Type of a loaded class.
    ///
    /// Ancestors are resolved first and the class is related below each of
    /// them. A class met again while its own ancestors are being resolved
    /// closes a cycle; that edge resolves to Top.
    pub fn type_of_class(&mut self, id: ClassId) -> TypeHandle {
        if let Some(&ty) = self.classes.get(&id) {
            return ty;
        }

        let source = self.source;
        let Some(class) = source.class(id) else {
            let top = self.fail(ResolveError::UnresolvedClass { id });
            self.classes.insert(id, top);
            return top;
        };

        if !self.in_progress.insert(id) {
            return self.fail(ResolveError::CyclicHierarchy {
                class: class.name.clone(),
            });
        }

        let ancestors: Vec<TypeHandle> = class
            .ancestors
            .iter()
            .map(|ancestor| self.type_of_class_ref(ancestor))
            .collect();

        let ty = match self.own_type(class) {
            Ok(ty) => {
                if !class.has(ClassFlags::PRIMITIVE) {
                    self.link(class, ty, &ancestors);
                }
                self.engine.normalized_of(ty);
                ty
            }
            Err(err) => self.fail(err),
        };

        self.in_progress.remove(&id);
        self.classes.insert(id, ty);
        ty
    }

    /// Type of a class reference, resolving textual references through the
    /// class source.
    pub fn type_of_class_ref(&mut self, class: &ClassRef) -> TypeHandle {
        match class {
            ClassRef::Resolved(id) => self.type_of_class(*id),
            ClassRef::Unresolved(descriptor) => match self.source.resolve(descriptor) {
                Some(id) => self.type_of_class(id),
                None => self.fail(ResolveError::UnresolvedDescriptor {
                    descriptor: descriptor.clone(),
                }),
            },
        }
    }

    /// `Method(-arg0, ..., -argN, +return)` for a method descriptor.
    ///
    /// The normalized form is computed as well, so the method is related
    /// below its `NormalizedMethod`.
    pub fn type_of_method(&mut self, method: &MethodDescriptor) -> TypeHandle {
        if let Some(&ty) = self.methods.get(&method.id) {
            return ty;
        }

        let mut params: Vec<TypeArg> = method
            .args()
            .iter()
            .map(|arg| self.type_of_class_ref(arg).contravariant())
            .collect();
        let ret = match method.return_type() {
            Some(ret) => self.type_of_class_ref(ret),
            None => self.fail(ResolveError::EmptySignature {
                method: method.name.clone(),
            }),
        };
        params.push(ret.covariant());

        let ctor = self.engine.builtins().method;
        let ty = ctor.apply(self.engine.types_mut(), &params);
        self.engine.normalized_of(ty);

        self.methods.insert(method.id, ty);
        ty
    }

    /// Type of a method by id.
    pub fn type_of_method_id(&mut self, id: MethodId) -> TypeHandle {
        if let Some(&ty) = self.methods.get(&id) {
            return ty;
        }

        let source = self.source;
        match source.method(id) {
            Some(method) => self.type_of_method(method),
            None => {
                let top = self.fail(ResolveError::UnresolvedMethod { id });
                self.methods.insert(id, top);
                top
            }
        }
    }

    /// Close everything resolved so far under the engine's policy.
    pub fn close(&mut self) -> ClosureStats {
        self.engine.close()
    }

    /// `lhs <= rhs`, against the closed relation.
    pub fn is_subtype(&mut self, lhs: TypeHandle, rhs: TypeHandle) -> bool {
        self.engine.is_subtype(lhs, rhs)
    }

    /// Least-upper-bound candidates of `a` and `b`, against the closed
    /// relation.
    pub fn join(&mut self, a: TypeHandle, b: TypeHandle) -> TypeSet {
        self.engine.join(a, b)
    }

    /// Canonical representative of `ty`.
    pub fn normalized_of(&mut self, ty: TypeHandle) -> TypeHandle {
        self.engine.normalized_of(ty)
    }

    /// Human-readable rendering of `ty`.
    pub fn image_of(&self, ty: TypeHandle) -> String {
        self.engine.image_of(ty)
    }

    /// Failures recorded so far.
    pub fn diagnostics(&self) -> &[ResolveError] {
        &self.diagnostics
    }

    /// Drain the recorded failures.
    pub fn take_diagnostics(&mut self) -> Vec<ResolveError> {
        std::mem::take(&mut self.diagnostics)
    }

    fn own_type(&mut self, class: &ClassDescriptor) -> Result<TypeHandle, ResolveError> {
        if class.has(ClassFlags::PRIMITIVE) {
            let kind = class
                .primitive_type_id
                .and_then(PrimitiveKind::from_type_id)
                .ok_or_else(|| ResolveError::InvalidPrimitive {
                    class: class.name.clone(),
                    type_id: class.primitive_type_id,
                })?;
            return Ok(self.engine.builtins().primitive(kind));
        }

        if class.has(ClassFlags::ARRAY_CLASS) {
            let component = class
                .array_component
                .as_ref()
                .ok_or_else(|| ResolveError::MissingArrayComponent {
                    class: class.name.clone(),
                })?;
            let component = self.type_of_class_ref(component);
            let arg = if class.has(ClassFlags::OBJECT_ARRAY_CLASS) {
                component.covariant()
            } else {
                component.invariant()
            };

            let ctor = self.engine.builtins().array;
            let array_type = self.engine.builtins().array_type;
            let types = self.engine.types_mut();
            let ty = ctor.apply(types, &[arg]);
            types.relate(ty, array_type);
            return Ok(ty);
        }

        Ok(self.engine.types_mut().class_type(&class.name))
    }

    fn link(&mut self, class: &ClassDescriptor, ty: TypeHandle, ancestors: &[TypeHandle]) {
        let b = self.engine.builtins();
        let (top, null_ref, object_type, ref_type) = (b.top, b.null_ref, b.object_type, b.ref_type);
        let (string, abstract_tag, interface_tag) = (b.string, b.abstract_tag, b.interface_tag);

        let types = self.engine.types_mut();
        for &ancestor in ancestors {
            if ancestor != top {
                types.relate(ty, ancestor);
            }
        }
        if class.has(ClassFlags::STRING_CLASS) {
            types.relate(ty, string);
        }
        if class.has(ClassFlags::ABSTRACT) {
            types.relate(ty, abstract_tag);
        }
        if class.has(ClassFlags::INTERFACE) {
            types.relate(ty, interface_tag);
        }
        types.relate(null_ref, ty);
        types.relate(ty, object_type);
        types.relate(ty, ref_type);
    }

    fn fail(&mut self, err: ResolveError) -> TypeHandle {
        warn!(language = ?self.engine.kind(), error = %err, "type resolution failed, using Top");
        self.diagnostics.push(err);
        self.engine.builtins().top
    }
}
