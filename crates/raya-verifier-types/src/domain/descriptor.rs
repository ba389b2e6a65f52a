//! Class and method descriptors supplied by the loader

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use std::fmt;

/// Loader-assigned class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Loader-assigned method identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub u32);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a class, either already resolved by the loader or still
/// in textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassRef {
    /// Loaded class
    Resolved(ClassId),
    /// Descriptor the loader has not resolved yet
    Unresolved(String),
}

bitflags! {
    /// Class properties relevant to typing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClassFlags: u32 {
        /// Primitive value class (`i32`, `f64`, ...)
        const PRIMITIVE = 1 << 0;
        /// Array class
        const ARRAY_CLASS = 1 << 1;
        /// Array whose components are references
        const OBJECT_ARRAY_CLASS = 1 << 2;
        /// The language's string class
        const STRING_CLASS = 1 << 3;
        /// Abstract class
        const ABSTRACT = 1 << 4;
        /// Interface
        const INTERFACE = 1 << 5;
    }
}

/// A class as seen by the type facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDescriptor {
    /// Class id
    pub id: ClassId,
    /// Fully qualified name
    pub name: String,
    /// Direct superclass and implemented interfaces
    pub ancestors: Vec<ClassRef>,
    /// Primitive type id for primitive classes
    pub primitive_type_id: Option<u8>,
    /// Class properties
    pub flags: ClassFlags,
    /// Component class for array classes
    pub array_component: Option<ClassRef>,
}

impl ClassDescriptor {
    /// A plain class with no ancestors.
    pub fn new(id: ClassId, name: impl Into<String>) -> Self {
        ClassDescriptor {
            id,
            name: name.into(),
            ancestors: Vec::new(),
            primitive_type_id: None,
            flags: ClassFlags::empty(),
            array_component: None,
        }
    }

    /// Set the direct ancestors.
    pub fn with_ancestors(mut self, ancestors: Vec<ClassRef>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Add flags.
    pub fn with_flags(mut self, flags: ClassFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark as a primitive class with the given primitive type id.
    pub fn with_primitive(mut self, type_id: u8) -> Self {
        self.flags |= ClassFlags::PRIMITIVE;
        self.primitive_type_id = Some(type_id);
        self
    }

    /// Mark as an array class of `component`.
    pub fn with_component(mut self, component: ClassRef, object_array: bool) -> Self {
        self.flags |= ClassFlags::ARRAY_CLASS;
        if object_array {
            self.flags |= ClassFlags::OBJECT_ARRAY_CLASS;
        }
        self.array_component = Some(component);
        self
    }

    /// Check for a flag.
    pub fn has(&self, flag: ClassFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// A method as seen by the type facade.
///
/// The last signature element is the return type; the ones before it are
/// the arguments in order, the receiver first for instance methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method id
    pub id: MethodId,
    /// Method name
    pub name: String,
    /// Arguments followed by the return type
    pub signature: Vec<ClassRef>,
}

impl MethodDescriptor {
    /// Create a descriptor.
    pub fn new(id: MethodId, name: impl Into<String>, signature: Vec<ClassRef>) -> Self {
        MethodDescriptor {
            id,
            name: name.into(),
            signature,
        }
    }

    /// Argument types, without the return type.
    pub fn args(&self) -> &[ClassRef] {
        match self.signature.split_last() {
            Some((_, args)) => args,
            None => &[],
        }
    }

    /// Return type.
    pub fn return_type(&self) -> Option<&ClassRef> {
        self.signature.last()
    }
}

/// The class/method cache the facade resolves references against.
pub trait ClassSource {
    /// Class by id.
    fn class(&self, id: ClassId) -> Option<&ClassDescriptor>;

    /// Method by id.
    fn method(&self, id: MethodId) -> Option<&MethodDescriptor>;

    /// Resolve a textual class reference.
    fn resolve(&self, descriptor: &str) -> Option<ClassId>;
}

/// In-memory [`ClassSource`] keyed by id, resolving descriptors by name.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    /// Classes indexed by id
    classes: Vec<ClassDescriptor>,
    /// Class name to id mapping
    name_to_id: FxHashMap<String, ClassId>,
    /// Methods indexed by id
    methods: Vec<MethodDescriptor>,
}

impl ClassTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next registered class will get.
    pub fn next_class_id(&self) -> ClassId {
        ClassId(self.classes.len() as u32)
    }

    /// Id the next registered method will get.
    pub fn next_method_id(&self) -> MethodId {
        MethodId(self.methods.len() as u32)
    }

    /// Register a class. Its id must be [`next_class_id`](Self::next_class_id).
    pub fn register_class(&mut self, class: ClassDescriptor) -> ClassId {
        let id = class.id;
        assert_eq!(id, self.next_class_id(), "classes must be registered in id order");
        self.name_to_id.insert(class.name.clone(), id);
        self.classes.push(class);
        id
    }

    /// Register a method. Its id must be [`next_method_id`](Self::next_method_id).
    pub fn register_method(&mut self, method: MethodDescriptor) -> MethodId {
        let id = method.id;
        assert_eq!(id, self.next_method_id(), "methods must be registered in id order");
        self.methods.push(method);
        id
    }

    /// Register a plain class with resolved ancestors.
    pub fn add_class(&mut self, name: &str, ancestors: &[ClassId]) -> ClassId {
        let class = ClassDescriptor::new(self.next_class_id(), name)
            .with_ancestors(ancestors.iter().copied().map(ClassRef::Resolved).collect());
        self.register_class(class)
    }

    /// Register a primitive class.
    pub fn add_primitive(&mut self, name: &str, type_id: u8) -> ClassId {
        let class = ClassDescriptor::new(self.next_class_id(), name).with_primitive(type_id);
        self.register_class(class)
    }

    /// Register a method over resolved classes; `signature` ends with the
    /// return type.
    pub fn add_method(&mut self, name: &str, signature: &[ClassId]) -> MethodId {
        let method = MethodDescriptor::new(
            self.next_method_id(),
            name,
            signature.iter().copied().map(ClassRef::Resolved).collect(),
        );
        self.register_method(method)
    }

    /// Class by name.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassDescriptor> {
        self.name_to_id.get(name).and_then(|id| self.class(*id))
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if no class is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassSource for ClassTable {
    fn class(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get(id.0 as usize)
    }

    fn method(&self, id: MethodId) -> Option<&MethodDescriptor> {
        self.methods.get(id.0 as usize)
    }

    fn resolve(&self, descriptor: &str) -> Option<ClassId> {
        self.name_to_id.get(descriptor).copied()
    }
}
