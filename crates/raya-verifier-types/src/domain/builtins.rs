//! Builtin hierarchy: primitives, reference roots and tags
//!
//! Primitive lattice:
//!
//! ```text
//!                     PrimitiveType
//!                 /                 \
//!             Bits32                Bits64
//!            /      \              /      \
//!     Integral32   Float32   Integral64   Float64
//!      /  |   \       |        |    \        |
//!    i32 u32 Integral16  f32  i64   u64     f64
//!            /  |   \
//!         i16 u16 Integral8
//!                 /  |  \
//!               u1  i8  u8
//! ```
//!
//! Reference lattice: `NullRef <= {Object, Class, Throwable bases, String}
//! <= ObjectType <= RefType`. Array types sit below `ArrayType <= ObjectType`.
//! The language bases are class types named by [`LanguageKind::base_names`];
//! every other builtin lives outside the class name space.
//! `Abstract`, `Interface` and `TypeClass` are tags: classes carrying the
//! property are related below the tag.

use crate::system::TypeSystem;
use crate::ty::{Parametric, TypeHandle};
use tracing::debug;

/// Language whose bytecode an engine verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageKind {
    /// Raya's own bytecode
    Raya,
    /// ECMAScript interop modules
    Ecma,
}

impl LanguageKind {
    /// Every supported language.
    pub const ALL: [LanguageKind; 2] = [LanguageKind::Raya, LanguageKind::Ecma];

    /// Tag stored in engine identities.
    pub fn tag(self) -> u8 {
        match self {
            LanguageKind::Raya => 0,
            LanguageKind::Ecma => 1,
        }
    }

    /// Names of the classes that root the reference hierarchy.
    pub fn base_names(self) -> BaseNames {
        match self {
            LanguageKind::Raya => BaseNames {
                object: Some("Object"),
                class: Some("Class"),
                throwable: Some("Error"),
            },
            LanguageKind::Ecma => BaseNames {
                object: Some("Object"),
                class: Some("Function"),
                throwable: Some("Error"),
            },
        }
    }
}

/// Per-language root class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseNames {
    /// Root of all objects
    pub object: Option<&'static str>,
    /// Type of class objects
    pub class: Option<&'static str>,
    /// Root of throwable values
    pub throwable: Option<&'static str>,
}

/// Primitive types, numbered as the loader reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// No value
    Void,
    /// Boolean
    U1,
    /// Signed byte
    I8,
    /// Unsigned byte
    U8,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 32-bit integer
    U32,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 64-bit integer
    U64,
}

impl PrimitiveKind {
    /// Decode a loader primitive type id.
    pub fn from_type_id(type_id: u8) -> Option<Self> {
        Some(match type_id {
            0 => PrimitiveKind::Void,
            1 => PrimitiveKind::U1,
            2 => PrimitiveKind::I8,
            3 => PrimitiveKind::U8,
            4 => PrimitiveKind::I16,
            5 => PrimitiveKind::U16,
            6 => PrimitiveKind::I32,
            7 => PrimitiveKind::U32,
            8 => PrimitiveKind::F32,
            9 => PrimitiveKind::F64,
            10 => PrimitiveKind::I64,
            11 => PrimitiveKind::U64,
            _ => return None,
        })
    }

    /// Loader primitive type id.
    pub fn type_id(self) -> u8 {
        match self {
            PrimitiveKind::Void => 0,
            PrimitiveKind::U1 => 1,
            PrimitiveKind::I8 => 2,
            PrimitiveKind::U8 => 3,
            PrimitiveKind::I16 => 4,
            PrimitiveKind::U16 => 5,
            PrimitiveKind::I32 => 6,
            PrimitiveKind::U32 => 7,
            PrimitiveKind::F32 => 8,
            PrimitiveKind::F64 => 9,
            PrimitiveKind::I64 => 10,
            PrimitiveKind::U64 => 11,
        }
    }

    /// Sort name of the primitive.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::U1 => "u1",
            PrimitiveKind::I8 => "i8",
            PrimitiveKind::U8 => "u8",
            PrimitiveKind::I16 => "i16",
            PrimitiveKind::U16 => "u16",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::F32 => "f32",
            PrimitiveKind::F64 => "f64",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
        }
    }
}

/// Handles to the builtin types of one engine.
#[derive(Debug, Clone)]
pub struct Builtins {
    /// Subtype of everything
    pub bot: TypeHandle,
    /// Supertype of everything; also the type of failed resolutions
    pub top: TypeHandle,

    /// `void`
    pub void: TypeHandle,
    /// `u1`
    pub u1: TypeHandle,
    /// `i8`
    pub i8: TypeHandle,
    /// `u8`
    pub u8: TypeHandle,
    /// `i16`
    pub i16: TypeHandle,
    /// `u16`
    pub u16: TypeHandle,
    /// `i32`
    pub i32: TypeHandle,
    /// `u32`
    pub u32: TypeHandle,
    /// `i64`
    pub i64: TypeHandle,
    /// `u64`
    pub u64: TypeHandle,
    /// `f32`
    pub f32: TypeHandle,
    /// `f64`
    pub f64: TypeHandle,

    /// Integers of at most 8 bits
    pub integral8: TypeHandle,
    /// Integers of at most 16 bits
    pub integral16: TypeHandle,
    /// Integers of at most 32 bits; normal form of all of them
    pub integral32: TypeHandle,
    /// 64-bit integers
    pub integral64: TypeHandle,
    /// 32-bit floats
    pub float32: TypeHandle,
    /// 64-bit floats
    pub float64: TypeHandle,
    /// Values occupying one 32-bit slot
    pub bits32: TypeHandle,
    /// Values occupying one 64-bit slot
    pub bits64: TypeHandle,
    /// Root of the primitive lattice
    pub primitive: TypeHandle,

    /// Root of the reference lattice
    pub ref_type: TypeHandle,
    /// Every object reference
    pub object_type: TypeHandle,
    /// The null reference, below every class
    pub null_ref: TypeHandle,
    /// Tag for string classes
    pub string: TypeHandle,
    /// Every array
    pub array_type: TypeHandle,
    /// Tag for abstract classes
    pub abstract_tag: TypeHandle,
    /// Tag for interfaces
    pub interface_tag: TypeHandle,
    /// Tag for class objects
    pub type_class: TypeHandle,

    /// Language root object class, if the language names one
    pub object_base: Option<TypeHandle>,
    /// Language class-object class
    pub class_base: Option<TypeHandle>,
    /// Language throwable root
    pub throwable_base: Option<TypeHandle>,

    /// `Array(component)`
    pub array: Parametric,
    /// `Method(-args..., +return)`
    pub method: Parametric,
    /// `Method` over normalized parameters
    pub normalized_method: Parametric,
}

impl Builtins {
    /// Build the builtin hierarchy for `kind` into `types`.
    ///
    /// Call once per engine; a second call returns the same handles.
    pub fn install(types: &mut TypeSystem, kind: LanguageKind) -> Self {
        let bot = types.bot();
        let top = types.top();

        let void = types.nullary(PrimitiveKind::Void.name());
        let u1 = types.nullary(PrimitiveKind::U1.name());
        let i8 = types.nullary(PrimitiveKind::I8.name());
        let u8 = types.nullary(PrimitiveKind::U8.name());
        let i16 = types.nullary(PrimitiveKind::I16.name());
        let u16 = types.nullary(PrimitiveKind::U16.name());
        let i32 = types.nullary(PrimitiveKind::I32.name());
        let u32 = types.nullary(PrimitiveKind::U32.name());
        let i64 = types.nullary(PrimitiveKind::I64.name());
        let u64 = types.nullary(PrimitiveKind::U64.name());
        let f32 = types.nullary(PrimitiveKind::F32.name());
        let f64 = types.nullary(PrimitiveKind::F64.name());

        let integral8 = types.nullary("Integral8");
        let integral16 = types.nullary("Integral16");
        let integral32 = types.nullary("Integral32");
        let integral64 = types.nullary("Integral64");
        let float32 = types.nullary("Float32");
        let float64 = types.nullary("Float64");
        let bits32 = types.nullary("Bits32");
        let bits64 = types.nullary("Bits64");
        let primitive = types.nullary("PrimitiveType");

        types.relate_all(&[u1, i8, u8], integral8);
        types.relate_all(&[i16, u16, integral8], integral16);
        types.relate_all(&[i32, u32, integral16], integral32);
        types.relate_all(&[i64, u64], integral64);
        types.relate(f32, float32);
        types.relate(f64, float64);
        types.relate_all(&[integral32, float32], bits32);
        types.relate_all(&[integral64, float64], bits64);
        types.relate_all(&[bits32, bits64], primitive);

        let ref_type = types.nullary("RefType");
        let object_type = types.nullary("ObjectType");
        let null_ref = types.nullary("NullRefType");
        let string = types.nullary("StringType");
        let array_type = types.nullary("ArrayType");
        let abstract_tag = types.nullary("Abstract");
        let interface_tag = types.nullary("Interface");
        let type_class = types.nullary("TypeClass");

        types.relate(object_type, ref_type);
        types.relate(null_ref, string);
        types.relate(string, object_type);
        types.relate(array_type, object_type);

        let names = kind.base_names();
        let mut base = |name: Option<&str>| {
            name.map(|name| {
                let ty = types.class_type(name);
                types.relate(null_ref, ty);
                types.relate(ty, object_type);
                ty
            })
        };
        let object_base = base(names.object);
        let class_base = base(names.class);
        let throwable_base = base(names.throwable);

        if let Some(class_base) = class_base {
            types.relate(class_base, type_class);
        }

        let array = types.parametric("Array");
        let method = types.parametric("Method");
        let normalized_method = types.parametric("NormalizedMethod");

        debug!(language = ?kind, types = types.len(), "installed builtin hierarchy");

        Builtins {
            bot,
            top,
            void,
            u1,
            i8,
            u8,
            i16,
            u16,
            i32,
            u32,
            i64,
            u64,
            f32,
            f64,
            integral8,
            integral16,
            integral32,
            integral64,
            float32,
            float64,
            bits32,
            bits64,
            primitive,
            ref_type,
            object_type,
            null_ref,
            string,
            array_type,
            abstract_tag,
            interface_tag,
            type_class,
            object_base,
            class_base,
            throwable_base,
            array,
            method,
            normalized_method,
        }
    }

    /// Builtin type of a primitive.
    pub fn primitive(&self, kind: PrimitiveKind) -> TypeHandle {
        match kind {
            PrimitiveKind::Void => self.void,
            PrimitiveKind::U1 => self.u1,
            PrimitiveKind::I8 => self.i8,
            PrimitiveKind::U8 => self.u8,
            PrimitiveKind::I16 => self.i16,
            PrimitiveKind::U16 => self.u16,
            PrimitiveKind::I32 => self.i32,
            PrimitiveKind::U32 => self.u32,
            PrimitiveKind::F32 => self.f32,
            PrimitiveKind::F64 => self.f64,
            PrimitiveKind::I64 => self.i64,
            PrimitiveKind::U64 => self.u64,
        }
    }

    /// Canonical representative of a primitive type, if `ty` is one.
    ///
    /// Every integer of 32 bits or less collapses to `Integral32`.
    pub fn normalized_primitive(&self, ty: TypeHandle) -> Option<TypeHandle> {
        let small_ints = [
            self.u1,
            self.i8,
            self.u8,
            self.i16,
            self.u16,
            self.i32,
            self.u32,
            self.integral8,
            self.integral16,
            self.integral32,
        ];
        if small_ints.contains(&ty) {
            return Some(self.integral32);
        }
        if [self.i64, self.u64, self.integral64].contains(&ty) {
            return Some(self.integral64);
        }
        if [self.f32, self.float32].contains(&ty) {
            return Some(self.float32);
        }
        if [self.f64, self.float64].contains(&ty) {
            return Some(self.float64);
        }
        None
    }
}
