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
    fmt::{Debug, Formatter},
    sync::{Arc, RwLock, Weak},
};

use compact_str::CompactString;

use crate::{
    report::system_panic,
    runtime::{RuntimeError, RuntimeResult, Shape, Value},
};

/// A target instance: an object of the instrumented program, described by a
/// [Shape].
///
/// The Object is a reference-counted handle. Cloning the handle does not
/// clone the object's state.
///
/// The object's stored fields are guarded by the object's own lock. Proxies
/// over the object do not add any synchronization on top of it.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

struct ObjectInner {
    shape: Arc<Shape>,
    slots: RwLock<Box<[Value]>>,
}

impl Debug for Object {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let slots = self.0.slots.read().unwrap_or_else(|poison| poison.into_inner());

        let mut debug_struct = formatter.debug_struct(self.0.shape.name());

        for field in self.0.shape.surface().fields() {
            if let Some(value) = slots.get(field.slot()) {
                debug_struct.field(field.name(), value);
            }
        }

        debug_struct.finish_non_exhaustive()
    }
}

impl PartialEq for Object {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Object {}

impl Object {
    /// Creates a new instance of the `shape` with every stored field set to
    /// the default value of the field's type.
    pub fn new(shape: &Arc<Shape>) -> Self {
        let slots = shape
            .slots()
            .iter()
            .map(Value::default_of)
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self(Arc::new(ObjectInner {
            shape: shape.clone(),
            slots: RwLock::new(slots),
        }))
    }

    #[inline(always)]
    pub fn shape(&self) -> &Arc<Shape> {
        &self.0.shape
    }

    /// Reads a stored field of the public surface.
    ///
    /// Returns [UnknownMember](RuntimeError::UnknownMember) if the surface
    /// has no field with this name.
    pub fn get(&self, field: &str) -> RuntimeResult<Value> {
        let slot = self.surface_slot(field)?;

        Ok(self.read_slot(slot))
    }

    /// Assigns a stored field of the public surface.
    ///
    /// This is the owner's access path: read-only fields can be assigned
    /// here, and only the proxies are restricted by the field's
    /// [read-only](crate::runtime::FieldMeta::is_readonly) flag.
    ///
    /// Returns [TypeMismatch](RuntimeError::TypeMismatch) if the value does
    /// not conform to the field's declared type.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> RuntimeResult<()> {
        let value = value.into();

        let meta = match self.0.shape.surface().field(field) {
            Some(meta) => meta,

            None => {
                return Err(RuntimeError::UnknownMember {
                    receiver: CompactString::from(self.0.shape.to_string()),
                    member: CompactString::from(field),
                })
            }
        };

        if !value.conforms(meta.ty()) {
            return Err(RuntimeError::TypeMismatch {
                expected: CompactString::from(meta.ty().to_string()),
                found: value.kind(),
            });
        }

        self.write_slot(meta.slot(), value);

        Ok(())
    }

    /// Creates a non-owning handle to this object.
    #[inline(always)]
    pub fn downgrade(&self) -> WeakObject {
        WeakObject(Arc::downgrade(&self.0))
    }

    /// Returns true if both handles point to the same object.
    #[inline(always)]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub(crate) fn read_slot(&self, slot: usize) -> Value {
        let slots = self.0.slots.read().unwrap_or_else(|poison| poison.into_inner());

        match slots.get(slot) {
            Some(value) => value.clone(),
            None => system_panic!("Object slot {slot} out of bounds."),
        }
    }

    #[inline]
    pub(crate) fn write_slot(&self, slot: usize, value: Value) {
        let mut slots = self.0.slots.write().unwrap_or_else(|poison| poison.into_inner());

        match slots.get_mut(slot) {
            Some(target) => *target = value,
            None => system_panic!("Object slot {slot} out of bounds."),
        }
    }

    fn surface_slot(&self, field: &str) -> RuntimeResult<usize> {
        match self.0.shape.surface().field(field) {
            Some(meta) => Ok(meta.slot()),

            None => Err(RuntimeError::UnknownMember {
                receiver: CompactString::from(self.0.shape.to_string()),
                member: CompactString::from(field),
            }),
        }
    }
}

/// A non-owning handle to an [Object].
///
/// Live proxies hold the target through this handle and never extend the
/// target's lifetime.
#[derive(Clone)]
pub struct WeakObject(Weak<ObjectInner>);

impl Debug for WeakObject {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.upgrade() {
            Some(object) => formatter.debug_tuple("WeakObject").field(&object).finish(),
            None => formatter.write_str("WeakObject(released)"),
        }
    }
}

impl WeakObject {
    /// Returns the object if it is still alive.
    #[inline(always)]
    pub fn upgrade(&self) -> Option<Object> {
        self.0.upgrade().map(Object)
    }

    /// Returns true if the object has been released.
    #[inline(always)]
    pub fn is_released(&self) -> bool {
        self.0.strong_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{Object, RuntimeError, Shape, TypeRef, Value};

    #[test]
    fn test_object_defaults() {
        let inner = Shape::build("Inner").finish();

        let shape = Shape::build("Record")
            .field("id", TypeRef::I64)
            .field("name", TypeRef::STR)
            .field("inner", TypeRef::Shape(inner.id()))
            .finish();

        let object = Object::new(&shape);

        assert!(matches!(object.get("id").unwrap(), Value::I64(0)));
        assert_eq!(object.get("name").unwrap().take::<String>().unwrap(), "");
        assert!(object.get("inner").unwrap().is_nil());
    }

    #[test]
    fn test_object_assignment() {
        let inner = Shape::build("Inner").finish();
        let other = Shape::build("Other").finish();

        let shape = Shape::build("Record")
            .readonly_field("id", TypeRef::I64)
            .field("inner", TypeRef::Shape(inner.id()))
            .finish();

        let object = Object::new(&shape);

        object.set("id", 10i64).unwrap();
        object.set("inner", Object::new(&inner)).unwrap();

        assert!(matches!(object.get("id").unwrap(), Value::I64(10)));

        assert!(matches!(
            object.set("id", 10i32),
            Err(RuntimeError::TypeMismatch { .. }),
        ));

        assert!(matches!(
            object.set("inner", Object::new(&other)),
            Err(RuntimeError::TypeMismatch { .. }),
        ));

        assert!(matches!(
            object.get("missing"),
            Err(RuntimeError::UnknownMember { .. }),
        ));
    }

    #[test]
    fn test_weak_handle() {
        let shape = Shape::build("Record").finish();
        let object = Object::new(&shape);
        let weak = object.downgrade();

        assert!(weak.upgrade().unwrap().ptr_eq(&object));

        drop(object);

        assert!(weak.is_released());
        assert!(weak.upgrade().is_none());
    }
}
