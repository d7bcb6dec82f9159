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

use std::fmt::{Debug, Formatter};

use compact_str::{format_compact, CompactString};

use crate::{
    duck::Proxy,
    runtime::{Object, Primitive, RuntimeError, RuntimeResult, TypeRef},
};

/// A dynamically typed value that crosses the proxy boundary: the content of
/// an object's field, the result of a property getter or a method, or a
/// method argument.
///
/// The [Nil](Value::Nil) value represents an absent object reference.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(CompactString),
    Object(Object),
    Proxy(Proxy),
}

impl Debug for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => formatter.write_str("nil"),
            Self::Bool(value) => Debug::fmt(value, formatter),
            Self::Char(value) => Debug::fmt(value, formatter),
            Self::I8(value) => formatter.write_fmt(format_args!("{value}i8")),
            Self::I16(value) => formatter.write_fmt(format_args!("{value}i16")),
            Self::I32(value) => formatter.write_fmt(format_args!("{value}i32")),
            Self::I64(value) => formatter.write_fmt(format_args!("{value}i64")),
            Self::U8(value) => formatter.write_fmt(format_args!("{value}u8")),
            Self::U16(value) => formatter.write_fmt(format_args!("{value}u16")),
            Self::U32(value) => formatter.write_fmt(format_args!("{value}u32")),
            Self::U64(value) => formatter.write_fmt(format_args!("{value}u64")),
            Self::F32(value) => formatter.write_fmt(format_args!("{value:?}f32")),
            Self::F64(value) => formatter.write_fmt(format_args!("{value:?}f64")),
            Self::Str(value) => Debug::fmt(value, formatter),

            // Objects and proxies are printed shallowly: object graphs may
            // be cyclic.
            Self::Object(..) | Self::Proxy(..) => formatter.write_str(&self.kind()),
        }
    }
}

impl Value {
    /// Returns the initial value of a stored field of type `ty`.
    ///
    /// Primitive types start at zero (`false`, `'\0'`, or an empty string).
    /// Every other type starts at [Nil](Value::Nil).
    pub fn default_of(ty: &TypeRef) -> Self {
        let primitive = match ty {
            TypeRef::Primitive(primitive) => *primitive,
            _ => return Self::Nil,
        };

        match primitive {
            Primitive::Bool => Self::Bool(false),
            Primitive::Char => Self::Char('\0'),
            Primitive::I8 => Self::I8(0),
            Primitive::I16 => Self::I16(0),
            Primitive::I32 => Self::I32(0),
            Primitive::I64 => Self::I64(0),
            Primitive::U8 => Self::U8(0),
            Primitive::U16 => Self::U16(0),
            Primitive::U32 => Self::U32(0),
            Primitive::U64 => Self::U64(0),
            Primitive::F32 => Self::F32(0.0),
            Primitive::F64 => Self::F64(0.0),
            Primitive::Str => Self::Str(CompactString::default()),
        }
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the primitive type of this value, or None if the value is nil,
    /// an object, or a proxy.
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match self {
            Self::Bool(..) => Primitive::Bool,
            Self::Char(..) => Primitive::Char,
            Self::I8(..) => Primitive::I8,
            Self::I16(..) => Primitive::I16,
            Self::I32(..) => Primitive::I32,
            Self::I64(..) => Primitive::I64,
            Self::U8(..) => Primitive::U8,
            Self::U16(..) => Primitive::U16,
            Self::U32(..) => Primitive::U32,
            Self::U64(..) => Primitive::U64,
            Self::F32(..) => Primitive::F32,
            Self::F64(..) => Primitive::F64,
            Self::Str(..) => Primitive::Str,
            Self::Nil | Self::Object(..) | Self::Proxy(..) => return None,
        })
    }

    /// Returns a user-facing description of this value's runtime type, such
    /// as `"i32"`, `"object Command#4"`, or `"proxy Connection"`.
    pub fn kind(&self) -> CompactString {
        match self {
            Self::Nil => CompactString::from("nil"),
            Self::Object(object) => format_compact!("object {}", object.shape()),
            Self::Proxy(proxy) => format_compact!("proxy {}", proxy.descriptor().name()),

            _ => match self.primitive() {
                Some(primitive) => CompactString::from(primitive.name()),
                None => CompactString::from("?"),
            },
        }
    }

    /// Returns true if this value can be stored in a slot of type `ty`.
    ///
    /// Nil conforms to every object-like type and to descriptor types.
    /// A proxy conforms to a descriptor type if the proxy's own descriptor is
    /// structurally equal to it. Primitive values conform to their exact
    /// primitive type only; widening is never implied.
    pub fn conforms(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Any | TypeRef::Generic(..) => true,
            TypeRef::Unit => self.is_nil(),
            TypeRef::Primitive(primitive) => self.primitive() == Some(*primitive),
            TypeRef::Object => matches!(self, Self::Nil | Self::Object(..)),

            TypeRef::Shape(id) => match self {
                Self::Nil => true,
                Self::Object(object) => object.shape().id() == *id,
                _ => false,
            },

            TypeRef::Duck(descriptor) => match self {
                Self::Nil => true,
                Self::Proxy(proxy) => proxy.descriptor() == &***descriptor,
                _ => false,
            },
        }
    }

    /// Returns true if both values have the same runtime type.
    ///
    /// Objects of distinct shapes are different types. Proxies are the same
    /// type if their descriptors are structurally equal. Nil is only the same
    /// type as nil.
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Object(this), Self::Object(other)) => this.shape().id() == other.shape().id(),
            (Self::Proxy(this), Self::Proxy(other)) => this.descriptor() == other.descriptor(),

            _ => match (self.primitive(), other.primitive()) {
                (Some(this), Some(other)) => this == other,
                _ => false,
            },
        }
    }

    /// Converts this value into a Rust value of type `T`.
    ///
    /// The conversion is exact: an [I32](Value::I32) value cannot be taken
    /// as `i64`.
    #[inline(always)]
    pub fn take<T: FromValue>(self) -> RuntimeResult<T> {
        T::from_value(self)
    }
}

/// A type that can be extracted from a [Value].
///
/// The extraction fails with [TypeMismatch](RuntimeError::TypeMismatch) if
/// the value's variant does not represent this type exactly.
pub trait FromValue: Sized {
    /// Extracts the Rust value.
    fn from_value(value: Value) -> RuntimeResult<Self>;
}

impl FromValue for Value {
    #[inline(always)]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        Ok(value)
    }
}

impl FromValue for () {
    #[inline]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Nil => Ok(()),
            other => Err(mismatch("()", &other)),
        }
    }
}

impl FromValue for String {
    #[inline]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Str(string) => Ok(string.into_string()),
            other => Err(mismatch("str", &other)),
        }
    }
}

impl FromValue for Object {
    #[inline]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl FromValue for Proxy {
    #[inline]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Proxy(proxy) => Ok(proxy),
            other => Err(mismatch("proxy", &other)),
        }
    }
}

impl FromValue for Option<Object> {
    #[inline]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Nil => Ok(None),
            Value::Object(object) => Ok(Some(object)),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl FromValue for Option<Proxy> {
    #[inline]
    fn from_value(value: Value) -> RuntimeResult<Self> {
        match value {
            Value::Nil => Ok(None),
            Value::Proxy(proxy) => Ok(Some(proxy)),
            other => Err(mismatch("proxy", &other)),
        }
    }
}

impl From<()> for Value {
    #[inline(always)]
    fn from(_: ()) -> Self {
        Self::Nil
    }
}

impl From<&str> for Value {
    #[inline(always)]
    fn from(value: &str) -> Self {
        Self::Str(CompactString::from(value))
    }
}

impl From<String> for Value {
    #[inline(always)]
    fn from(value: String) -> Self {
        Self::Str(CompactString::from(value))
    }
}

impl From<Object> for Value {
    #[inline(always)]
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Proxy> for Value {
    #[inline(always)]
    fn from(value: Proxy) -> Self {
        Self::Proxy(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline(always)]
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Self::Nil,
        }
    }
}

macro_rules! primitive_value {
    ($($ty:ty => $variant:ident,)*) => {
        $(
            impl From<$ty> for Value {
                #[inline(always)]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl FromValue for $ty {
                #[inline]
                fn from_value(value: Value) -> RuntimeResult<Self> {
                    match value {
                        Value::$variant(value) => Ok(value),
                        other => Err(mismatch(::std::stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

primitive_value! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    CompactString => Str,
}

#[inline(always)]
fn mismatch(expected: &'static str, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected: CompactString::from(expected),
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use compact_str::CompactString;

    use crate::runtime::{Object, RuntimeError, Shape, TypeRef, Value};

    #[test]
    fn test_value_conformance() {
        let shape = Shape::build("Point").finish();
        let other = Shape::build("Line").finish();
        let object = Value::from(Object::new(&shape));

        assert!(Value::I32(1).conforms(&TypeRef::I32));
        assert!(!Value::I32(1).conforms(&TypeRef::I64));
        assert!(Value::Nil.conforms(&TypeRef::Shape(shape.id())));
        assert!(Value::Nil.conforms(&TypeRef::Object));
        assert!(!Value::Nil.conforms(&TypeRef::I32));
        assert!(object.conforms(&TypeRef::Shape(shape.id())));
        assert!(!object.conforms(&TypeRef::Shape(other.id())));
        assert!(object.conforms(&TypeRef::Object));
        assert!(object.conforms(&TypeRef::Any));
        assert!(!object.conforms(&TypeRef::STR));
    }

    #[test]
    fn test_value_extraction() {
        assert_eq!(Value::from(5u16).take::<u16>().unwrap(), 5);
        assert_eq!(Value::from("text").take::<String>().unwrap(), "text");
        assert!(Value::Nil.take::<Option<Object>>().unwrap().is_none());
        assert_eq!(
            Value::from(CompactString::from("compact"))
                .take::<CompactString>()
                .unwrap(),
            "compact",
        );

        match Value::from(5u16).take::<i64>() {
            Err(RuntimeError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "i64");
                assert_eq!(found, "u16");
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_value_same_type() {
        let shape = Shape::build("Point").finish();

        assert!(Value::I8(1).same_type(&Value::I8(2)));
        assert!(!Value::I8(1).same_type(&Value::I16(1)));
        assert!(Value::from(Object::new(&shape)).same_type(&Value::from(Object::new(&shape))));
        assert!(!Value::Nil.same_type(&Value::I8(0)));
        assert_eq!(format!("{:?}", Value::I8(3)), "3i8");
    }
}
