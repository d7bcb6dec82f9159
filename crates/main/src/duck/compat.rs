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

use compact_str::CompactString;

use crate::{
    duck::DescriptorStyle,
    runtime::{Primitive, RuntimeError, RuntimeResult, TypeRef, Value},
};

/// A rule by which a proxy obtains the value of a descriptor member from the
/// resolved target member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AccessStrategy {
    /// The target value is forwarded as is.
    Direct,

    /// The target value is losslessly converted from the narrower `from`
    /// numeric type to the wider `to` numeric type.
    Widen { from: Primitive, to: Primitive },

    /// The target object is adapted to the nested descriptor of the
    /// specified style: lazily on every read for interface-style
    /// descriptors, and eagerly for copy-style descriptors.
    Chain(DescriptorStyle),

    /// The result of a target method is discarded because the descriptor
    /// method returns nothing.
    Discard,
}

/// Classifies how a value of the target type `found` can be read as a value
/// of the descriptor type `expected`.
///
/// Returns None if no strategy applies.
pub(crate) fn read_strategy(found: &TypeRef, expected: &TypeRef) -> Option<AccessStrategy> {
    if matches!(expected, TypeRef::Any) || expected.is_generic() {
        return Some(AccessStrategy::Direct);
    }

    // The concrete type of an open generic target is known per call only.
    if found.is_generic() {
        return Some(match expected {
            TypeRef::Duck(descriptor) => AccessStrategy::Chain(descriptor.style()),
            _ => AccessStrategy::Direct,
        });
    }

    if found == expected {
        return Some(AccessStrategy::Direct);
    }

    match (found, expected) {
        (TypeRef::Primitive(from), TypeRef::Primitive(to)) if from.widens_to(*to) => {
            Some(AccessStrategy::Widen {
                from: *from,
                to: *to,
            })
        }

        (TypeRef::Shape(..), TypeRef::Object) => Some(AccessStrategy::Direct),

        (TypeRef::Shape(..) | TypeRef::Object | TypeRef::Any, TypeRef::Duck(descriptor)) => {
            Some(AccessStrategy::Chain(descriptor.style()))
        }

        _ => None,
    }
}

/// Returns true if a value of the descriptor type `from` can be stored into
/// a target slot of type `to`, either directly or by lossless widening.
///
/// Descriptor types never flow into the target: proxies are not unwrapped.
pub(crate) fn flows_into(from: &TypeRef, to: &TypeRef) -> bool {
    if matches!(to, TypeRef::Any) || from.is_generic() || to.is_generic() {
        return true;
    }

    match (from, to) {
        (TypeRef::Duck(..), _) => false,
        (TypeRef::Primitive(from), TypeRef::Primitive(to)) => from == to || from.widens_to(*to),
        (TypeRef::Shape(..), TypeRef::Object) => true,

        // An untyped descriptor value is checked on each assignment.
        (TypeRef::Any, _) => true,

        (from, to) => from == to,
    }
}

/// Returns true if the descriptor type and the target type are the same
/// concrete type. Used to rank method overloads.
#[inline(always)]
pub(crate) fn is_exact(descriptor: &TypeRef, target: &TypeRef) -> bool {
    !descriptor.is_generic() && !target.is_generic() && descriptor == target
}

/// Converts a primitive `value` to the wider `to` type if the value's type
/// widens to it. Any other value is returned unchanged.
pub(crate) fn coerce(value: Value, to: &TypeRef) -> RuntimeResult<Value> {
    let to = match to {
        TypeRef::Primitive(to) => *to,
        _ => return Ok(value),
    };

    match value.primitive() {
        Some(from) if from.widens_to(to) => widen(value, to),
        _ => Ok(value),
    }
}

macro_rules! widening {
    ($value:expr, $to:expr; $($from:ident => $($target:ident as $cast:ident)|+;)+) => {
        match ($value, $to) {
            $($(
                (Value::$from(value), Primitive::$target) => Ok(Value::$target(cast::$cast(value))),
            )+)+

            (value, to) => Err(RuntimeError::TypeMismatch {
                expected: CompactString::from(to.name()),
                found: value.kind(),
            }),
        }
    };
}

/// Losslessly widens a primitive `value` to the `to` type.
///
/// Returns [TypeMismatch](RuntimeError::TypeMismatch) if the value's type
/// does not widen to `to`.
pub(crate) fn widen(value: Value, to: Primitive) -> RuntimeResult<Value> {
    widening! {
        value, to;
        I8 => I16 as i16 | I32 as i32 | I64 as i64 | F32 as f32 | F64 as f64;
        U8 => I16 as i16 | U16 as u16 | I32 as i32 | U32 as u32 | I64 as i64 | U64 as u64
            | F32 as f32 | F64 as f64;
        I16 => I32 as i32 | I64 as i64 | F32 as f32 | F64 as f64;
        U16 => I32 as i32 | U32 as u32 | I64 as i64 | U64 as u64 | F32 as f32 | F64 as f64;
        I32 => I64 as i64 | F64 as f64;
        U32 => I64 as i64 | U64 as u64 | F64 as f64;
        F32 => F64 as f64;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        descriptor,
        duck::{
            compat::{coerce, flows_into, read_strategy, widen},
            AccessStrategy,
            Descriptor,
            DescriptorMember,
            DescriptorStyle,
        },
        runtime::{Primitive, RuntimeError, Shape, TypeRef, Value},
    };

    descriptor! {
        pub static POINT = Descriptor::interface("Point")
            .member(DescriptorMember::property("x", TypeRef::I64));

        pub static POINT_COPY = Descriptor::copy("PointCopy")
            .member(DescriptorMember::property("x", TypeRef::I64));
    }

    #[test]
    fn test_read_strategies() {
        let shape = Shape::build("Point").finish();

        assert_eq!(read_strategy(&TypeRef::I64, &TypeRef::I64), Some(AccessStrategy::Direct));
        assert_eq!(read_strategy(&TypeRef::STR, &TypeRef::Any), Some(AccessStrategy::Direct));

        assert_eq!(
            read_strategy(&TypeRef::I32, &TypeRef::I64),
            Some(AccessStrategy::Widen {
                from: Primitive::I32,
                to: Primitive::I64,
            }),
        );

        assert_eq!(read_strategy(&TypeRef::I64, &TypeRef::I32), None);
        assert_eq!(read_strategy(&TypeRef::U64, &TypeRef::I64), None);
        assert_eq!(read_strategy(&TypeRef::I64, &TypeRef::STR), None);

        assert_eq!(
            read_strategy(&TypeRef::Shape(shape.id()), &TypeRef::Object),
            Some(AccessStrategy::Direct),
        );

        assert_eq!(
            read_strategy(&TypeRef::Shape(shape.id()), &TypeRef::Duck(&POINT)),
            Some(AccessStrategy::Chain(DescriptorStyle::Interface)),
        );

        assert_eq!(
            read_strategy(&TypeRef::Object, &TypeRef::Duck(&POINT_COPY)),
            Some(AccessStrategy::Chain(DescriptorStyle::Copy)),
        );

        assert_eq!(
            read_strategy(&TypeRef::Generic(0), &TypeRef::Duck(&POINT)),
            Some(AccessStrategy::Chain(DescriptorStyle::Interface)),
        );

        assert_eq!(
            read_strategy(&TypeRef::Generic(0), &TypeRef::I64),
            Some(AccessStrategy::Direct),
        );

        assert_eq!(read_strategy(&TypeRef::I64, &TypeRef::Duck(&POINT)), None);
        assert_eq!(read_strategy(&TypeRef::Object, &TypeRef::Shape(shape.id())), None);
    }

    #[test]
    fn test_write_direction() {
        assert!(flows_into(&TypeRef::I32, &TypeRef::I32));
        assert!(flows_into(&TypeRef::I32, &TypeRef::I64));
        assert!(!flows_into(&TypeRef::I64, &TypeRef::I32));
        assert!(flows_into(&TypeRef::Generic(0), &TypeRef::STR));
        assert!(flows_into(&TypeRef::STR, &TypeRef::Any));
        assert!(!flows_into(&TypeRef::Duck(&POINT), &TypeRef::Object));
    }

    #[test]
    fn test_widening() {
        assert!(matches!(widen(Value::I32(-7), Primitive::I64), Ok(Value::I64(-7))));
        assert!(matches!(widen(Value::U8(200), Primitive::I16), Ok(Value::I16(200))));
        assert!(matches!(widen(Value::F32(0.5), Primitive::F64), Ok(Value::F64(value)) if value == 0.5));

        assert!(matches!(
            widen(Value::I64(1), Primitive::I32),
            Err(RuntimeError::TypeMismatch { .. }),
        ));

        assert!(matches!(coerce(Value::U16(3), &TypeRef::U64), Ok(Value::U64(3))));
        assert!(matches!(coerce(Value::I64(3), &TypeRef::I32), Ok(Value::I64(3))));
    }
}
