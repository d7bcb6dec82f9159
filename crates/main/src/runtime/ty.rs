////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::{
    fmt::{Debug, Display, Formatter},
    hash::{Hash, Hasher},
    mem::discriminant,
};

use ahash::AHashSet;

use crate::{duck::StaticDescriptor, runtime::ShapeId};

/// A built-in scalar type of the host model.
///
/// Primitive values are always copied when they cross a proxy boundary, and
/// the numeric primitives participate in lossless widening (see
/// [Primitive::widens_to]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Str,
}

impl Display for Primitive {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

impl Primitive {
    /// Returns the user-facing name of this primitive type, such as `"i32"`
    /// or `"str"`.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str => "str",
        }
    }

    /// Returns true if this is an integer or a floating-point type.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Bool | Self::Char | Self::Str)
    }

    /// Returns true if every value of this type is exactly representable by
    /// the `to` type, and the two types are distinct.
    ///
    /// The relation is never symmetric: if `a.widens_to(b)` is true,
    /// `b.widens_to(a)` is false.
    ///
    /// ```
    /// use tracer_duck::runtime::Primitive;
    ///
    /// assert!(Primitive::I32.widens_to(Primitive::I64));
    /// assert!(!Primitive::I64.widens_to(Primitive::I32));
    ///
    /// // An f32 mantissa cannot hold every i32 value.
    /// assert!(!Primitive::I32.widens_to(Primitive::F32));
    /// ```
    pub const fn widens_to(self, to: Self) -> bool {
        match self {
            Self::I8 => matches!(to, Self::I16 | Self::I32 | Self::I64 | Self::F32 | Self::F64),

            Self::U8 => matches!(
                to,
                Self::I16
                    | Self::U16
                    | Self::I32
                    | Self::U32
                    | Self::I64
                    | Self::U64
                    | Self::F32
                    | Self::F64
            ),

            Self::I16 => matches!(to, Self::I32 | Self::I64 | Self::F32 | Self::F64),

            Self::U16 => matches!(
                to,
                Self::I32 | Self::U32 | Self::I64 | Self::U64 | Self::F32 | Self::F64
            ),

            Self::I32 => matches!(to, Self::I64 | Self::F64),

            Self::U32 => matches!(to, Self::I64 | Self::U64 | Self::F64),

            Self::F32 => matches!(to, Self::F64),

            _ => false,
        }
    }
}

/// A reference to a type of a member, either on the target side (the
/// declared type of a shape's field, property or method) or on the
/// descriptor side (the type the instrumentation code expects).
///
/// The [PartialEq] implementation compares [descriptor types](TypeRef::Duck)
/// structurally: two separately declared descriptors with identical member
/// lists are the same type. The comparison terminates on cyclic descriptor
/// graphs.
#[derive(Clone, Copy)]
pub enum TypeRef {
    /// No value. The output type of methods that return nothing.
    Unit,

    /// A scalar type.
    Primitive(Primitive),

    /// Objects of one specific [Shape](crate::runtime::Shape), or nil.
    Shape(ShapeId),

    /// Objects of any shape, or nil.
    Object,

    /// Any value at all.
    Any,

    /// A value that satisfies the referred descriptor. On the descriptor
    /// side, this type requests chaining.
    Duck(&'static StaticDescriptor),

    /// An open generic parameter of a method, identified by its index.
    ///
    /// Generic parameters match any type when an adapter is compiled; the
    /// actual argument types are checked on each invocation.
    Generic(u8),
}

impl Debug for TypeRef {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, formatter)
    }
}

impl Display for TypeRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit => formatter.write_str("()"),
            Self::Primitive(primitive) => Display::fmt(primitive, formatter),
            Self::Shape(id) => formatter.write_fmt(format_args!("shape{id}")),
            Self::Object => formatter.write_str("object"),
            Self::Any => formatter.write_str("any"),
            Self::Duck(descriptor) => formatter.write_fmt(format_args!("duck {}", descriptor.name())),
            Self::Generic(index) => formatter.write_fmt(format_args!("T{index}")),
        }
    }
}

impl PartialEq for TypeRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let mut visited = AHashSet::new();

        self.eq_in(other, &mut visited)
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);

        match self {
            Self::Unit | Self::Object | Self::Any => (),
            Self::Primitive(primitive) => primitive.hash(state),
            Self::Shape(id) => id.hash(state),
            Self::Generic(index) => index.hash(state),

            // Nested descriptors are hashed shallowly to stay finite on cycles.
            Self::Duck(descriptor) => {
                descriptor.style().hash(state);
                descriptor.visibility().hash(state);
                descriptor.members().len().hash(state);
            }
        }
    }
}

impl From<Primitive> for TypeRef {
    #[inline(always)]
    fn from(value: Primitive) -> Self {
        Self::Primitive(value)
    }
}

impl From<ShapeId> for TypeRef {
    #[inline(always)]
    fn from(value: ShapeId) -> Self {
        Self::Shape(value)
    }
}

impl From<&'static StaticDescriptor> for TypeRef {
    #[inline(always)]
    fn from(value: &'static StaticDescriptor) -> Self {
        Self::Duck(value)
    }
}

impl TypeRef {
    pub const BOOL: Self = Self::Primitive(Primitive::Bool);
    pub const CHAR: Self = Self::Primitive(Primitive::Char);
    pub const I8: Self = Self::Primitive(Primitive::I8);
    pub const I16: Self = Self::Primitive(Primitive::I16);
    pub const I32: Self = Self::Primitive(Primitive::I32);
    pub const I64: Self = Self::Primitive(Primitive::I64);
    pub const U8: Self = Self::Primitive(Primitive::U8);
    pub const U16: Self = Self::Primitive(Primitive::U16);
    pub const U32: Self = Self::Primitive(Primitive::U32);
    pub const U64: Self = Self::Primitive(Primitive::U64);
    pub const F32: Self = Self::Primitive(Primitive::F32);
    pub const F64: Self = Self::Primitive(Primitive::F64);
    pub const STR: Self = Self::Primitive(Primitive::Str);

    /// Returns the underlying primitive type if this is a
    /// [primitive](Self::Primitive) type reference.
    #[inline(always)]
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(primitive) => Some(*primitive),
            _ => None,
        }
    }

    /// Returns true if values of this type are references to target objects
    /// (and therefore may be nil).
    #[inline(always)]
    pub fn is_object_like(&self) -> bool {
        matches!(self, Self::Shape(..) | Self::Object | Self::Any)
    }

    /// Returns true if this is an [open generic parameter](Self::Generic).
    #[inline(always)]
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(..))
    }

    pub(crate) fn eq_in(&self, other: &Self, visited: &mut AHashSet<(usize, usize)>) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::Object, Self::Object) => true,
            (Self::Any, Self::Any) => true,
            (Self::Primitive(this), Self::Primitive(other)) => this == other,
            (Self::Shape(this), Self::Shape(other)) => this == other,
            (Self::Generic(this), Self::Generic(other)) => this == other,
            (Self::Duck(this), Self::Duck(other)) => this.eq_in(other, visited),
            _ => false,
        }
    }
}
