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
    sync::Arc,
};

use compact_str::CompactString;

use crate::{
    duck::{
        chain,
        compat::{coerce, widen},
        compile::Accessor,
        AccessStrategy,
        CompiledAdapter,
        Descriptor,
        DescriptorMember,
        MemberPlan,
        MAX_COPY_DEPTH,
    },
    report::system_panic,
    runtime::{FromValue, Object, RuntimeError, RuntimeResult, Shape, TypeRef, Value, WeakObject},
};

/// A typed view over a target object that satisfies a
/// [Descriptor](crate::duck::Descriptor).
///
/// Proxies are created by the [adapt](crate::duck::adapt) function. A proxy
/// is either:
///
///  - Live, for interface-style descriptors. Every read and write passes
///    through to the target object. The proxy holds the target through a
///    [non-owning handle](WeakObject) and never extends the target's
///    lifetime: once the target is released, every access fails with
///    [TargetReleased](RuntimeError::TargetReleased).
///
///  - A snapshot, for copy-style descriptors. The member values are copied
///    once when the proxy is created. Later changes of the target are not
///    visible through the snapshot, and the snapshot cannot be written.
///
/// Proxies are cheap to clone. Clones share the [CompiledAdapter] and the
/// target (or the snapshot).
///
/// The proxy adds no synchronization of its own. Concurrent access through a
/// live proxy is exactly as safe as concurrent access to the target object.
#[derive(Clone)]
pub struct Proxy {
    adapter: Arc<CompiledAdapter>,
    binding: Binding,
}

#[derive(Clone)]
enum Binding {
    Live(WeakObject),
    Snapshot(Arc<[Value]>),
}

impl Debug for Proxy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug_struct = formatter.debug_struct("Proxy");

        debug_struct
            .field("descriptor", &self.descriptor().name())
            .field("shape", &format_args!("{}", self.adapter.shape()));

        match &self.binding {
            Binding::Live(target) => debug_struct.field("released", &target.is_released()),
            Binding::Snapshot(values) => debug_struct.field("snapshot", values),
        };

        debug_struct.finish()
    }
}

impl Proxy {
    #[inline(always)]
    pub(crate) fn live(adapter: Arc<CompiledAdapter>, target: &Object) -> Self {
        Self {
            adapter,
            binding: Binding::Live(target.downgrade()),
        }
    }

    pub(crate) fn snapshot(
        adapter: Arc<CompiledAdapter>,
        target: &Object,
        depth: usize,
    ) -> RuntimeResult<Self> {
        let descriptor = adapter.descriptor();

        if depth >= MAX_COPY_DEPTH {
            return Err(RuntimeError::CopyDepth {
                descriptor: CompactString::from(descriptor.name()),
                limit: MAX_COPY_DEPTH,
            });
        }

        let mut values = Vec::with_capacity(descriptor.members().len());

        for index in 0..descriptor.members().len() {
            values.push(read_member(&adapter, target, index, depth + 1)?);
        }

        Ok(Self {
            adapter,
            binding: Binding::Snapshot(Arc::from(values)),
        })
    }

    /// The descriptor this proxy satisfies.
    #[inline(always)]
    pub fn descriptor(&self) -> &'static Descriptor {
        self.adapter.descriptor()
    }

    /// The shape of the target object.
    #[inline(always)]
    pub fn shape(&self) -> &Arc<Shape> {
        self.adapter.shape()
    }

    /// The compiled adapter this proxy executes.
    #[inline(always)]
    pub fn adapter(&self) -> &Arc<CompiledAdapter> {
        &self.adapter
    }

    /// Returns true if this is a copy-style snapshot.
    #[inline(always)]
    pub fn is_snapshot(&self) -> bool {
        matches!(self.binding, Binding::Snapshot(..))
    }

    /// Returns the target object of a live proxy if the target is still
    /// alive. Snapshots are detached from their targets and always return
    /// None.
    #[inline]
    pub fn instance(&self) -> Option<Object> {
        match &self.binding {
            Binding::Live(target) => target.upgrade(),
            Binding::Snapshot(..) => None,
        }
    }

    /// Reads a field or property by its logical name.
    ///
    /// For live proxies, the value is read from the target on every call.
    /// Chained members return nested proxies (or nil).
    #[inline]
    pub fn get(&self, member: &str) -> RuntimeResult<Value> {
        let index = self.index_of(member)?;

        self.get_at(index)
    }

    /// Reads a field or property by its index in the descriptor's member
    /// list.
    pub fn get_at(&self, index: usize) -> RuntimeResult<Value> {
        match &self.binding {
            Binding::Snapshot(values) => match values.get(index) {
                Some(value) => Ok(value.clone()),
                None => Err(self.unknown_index(index)),
            },

            Binding::Live(target) => {
                let target = self.upgrade(target)?;

                read_member(&self.adapter, &target, index, 0)
            }
        }
    }

    /// Reads a field or property and converts it into a Rust value.
    #[inline]
    pub fn read<T: FromValue>(&self, member: &str) -> RuntimeResult<T> {
        self.get(member)?.take()
    }

    /// Assigns a field or property of the target object.
    ///
    /// The member must be declared [mutable](DescriptorMember::mutable).
    /// The value must conform to the descriptor member's type, and is
    /// widened to the target member's type if needed. Proxies are never
    /// unwrapped: assigning a proxy fails with
    /// [InvalidAssignment](RuntimeError::InvalidAssignment).
    pub fn set(&self, member: &str, value: impl Into<Value>) -> RuntimeResult<()> {
        let index = self.index_of(member)?;
        let descriptor = self.descriptor();

        let target = match &self.binding {
            Binding::Live(target) => target,

            Binding::Snapshot(..) => {
                return Err(RuntimeError::ReadOnly {
                    descriptor: CompactString::from(descriptor.name()),
                    member: CompactString::from(member),
                })
            }
        };

        let (plan, accessor) = self.plan(index)?;
        let member = &descriptor.members()[index];

        if !plan.is_writable() {
            return Err(RuntimeError::ReadOnly {
                descriptor: CompactString::from(descriptor.name()),
                member: CompactString::from(member.name()),
            });
        }

        let target = self.upgrade(target)?;
        let value = value.into();

        let value = match plan.strategy() {
            AccessStrategy::Chain(..) => self.check_assignment(member, value, accessor.ty())?,

            _ => {
                let value = self.check_assignment(member, value, member.ty())?;
                let value = coerce(value, accessor.ty())?;

                self.check_assignment(member, value, accessor.ty())?
            }
        };

        match accessor {
            Accessor::Field { slot, .. } => {
                target.write_slot(*slot, value);

                Ok(())
            }

            Accessor::Property {
                setter: Some(setter),
                ..
            } => setter(&target, value),

            _ => system_panic!("Writable member without a setter."),
        }
    }

    /// Invokes a method of the target object.
    ///
    /// The arguments are checked against the descriptor's parameter types.
    /// Open generic parameters accept any argument, but all arguments bound
    /// to the same generic parameter within one call must have the same
    /// runtime type.
    pub fn invoke(&self, member: &str, arguments: &[Value]) -> RuntimeResult<Value> {
        let index = self.index_of(member)?;
        let descriptor = self.descriptor();
        let member = &descriptor.members()[index];

        let (plan, accessor) = self.plan(index)?;

        let (params, body) = match (&self.binding, accessor) {
            (Binding::Live(..), Accessor::Method { params, body }) => (params, body),

            _ => {
                return Err(RuntimeError::UnknownMember {
                    receiver: CompactString::from(descriptor.name()),
                    member: CompactString::from(member.name()),
                })
            }
        };

        if arguments.len() != member.params().len() {
            return Err(RuntimeError::ArityMismatch {
                member: CompactString::from(member.name()),
                expected: member.params().len(),
                actual: arguments.len(),
            });
        }

        let mut descriptor_generics = GenericBindings::default();
        let mut target_generics = GenericBindings::default();
        let mut converted = Vec::with_capacity(arguments.len());

        for (index, argument) in arguments.iter().enumerate() {
            let expected = &member.params()[index];
            let target_ty = &params[index];

            let mismatch = |expected: &TypeRef, found: &Value| RuntimeError::ArgumentMismatch {
                member: CompactString::from(member.name()),
                index,
                expected: CompactString::from(expected.to_string()),
                found: found.kind(),
            };

            if let Value::Proxy(..) = argument {
                return Err(mismatch(expected, argument));
            }

            if !argument.conforms(expected) || !descriptor_generics.bind(expected, argument) {
                return Err(mismatch(expected, argument));
            }

            let argument = coerce(argument.clone(), target_ty)?;

            if !argument.conforms(target_ty) || !target_generics.bind(target_ty, &argument) {
                return Err(mismatch(target_ty, &argument));
            }

            converted.push(argument);
        }

        let target = match &self.binding {
            Binding::Live(target) => self.upgrade(target)?,
            Binding::Snapshot(..) => system_panic!("Method invocation on a snapshot."),
        };

        let output = body(&target, &converted)?;

        convert(plan, member, output, 0)
    }

    #[inline]
    fn index_of(&self, member: &str) -> RuntimeResult<usize> {
        match self.descriptor().member(member) {
            Some((index, _)) => Ok(index),

            None => Err(RuntimeError::UnknownMember {
                receiver: CompactString::from(self.descriptor().name()),
                member: CompactString::from(member),
            }),
        }
    }

    #[inline]
    fn plan(&self, index: usize) -> RuntimeResult<(&MemberPlan, &Accessor)> {
        match self.adapter.plan(index) {
            Some(plan) => Ok(plan),
            None => Err(self.unknown_index(index)),
        }
    }

    #[inline]
    fn upgrade(&self, target: &WeakObject) -> RuntimeResult<Object> {
        match target.upgrade() {
            Some(target) => Ok(target),

            None => Err(RuntimeError::TargetReleased {
                descriptor: CompactString::from(self.descriptor().name()),
            }),
        }
    }

    fn check_assignment(
        &self,
        member: &DescriptorMember,
        value: Value,
        ty: &TypeRef,
    ) -> RuntimeResult<Value> {
        if !matches!(value, Value::Proxy(..)) && value.conforms(ty) {
            return Ok(value);
        }

        Err(RuntimeError::InvalidAssignment {
            descriptor: CompactString::from(self.descriptor().name()),
            member: CompactString::from(member.name()),
            expected: CompactString::from(ty.to_string()),
            found: value.kind(),
        })
    }

    #[inline(always)]
    fn unknown_index(&self, index: usize) -> RuntimeError {
        RuntimeError::UnknownMember {
            receiver: CompactString::from(self.descriptor().name()),
            member: CompactString::from(format!("#{index}")),
        }
    }
}

// Reads a field or property of a live target and applies the member's
// access strategy.
fn read_member(
    adapter: &CompiledAdapter,
    target: &Object,
    index: usize,
    depth: usize,
) -> RuntimeResult<Value> {
    let descriptor = adapter.descriptor();

    let Some((plan, accessor)) = adapter.plan(index) else {
        return Err(RuntimeError::UnknownMember {
            receiver: CompactString::from(descriptor.name()),
            member: CompactString::from(format!("#{index}")),
        });
    };

    let member = &descriptor.members()[index];

    let raw = match accessor {
        Accessor::Field { slot, .. } => target.read_slot(*slot),

        Accessor::Property {
            getter: Some(getter),
            ..
        } => getter(target)?,

        Accessor::Property { getter: None, .. } => {
            system_panic!("Readable member without a getter.")
        }

        Accessor::Method { .. } => {
            return Err(RuntimeError::UnknownMember {
                receiver: CompactString::from(descriptor.name()),
                member: CompactString::from(member.name()),
            })
        }
    };

    convert(plan, member, raw, depth)
}

fn convert(
    plan: &MemberPlan,
    member: &DescriptorMember,
    value: Value,
    depth: usize,
) -> RuntimeResult<Value> {
    match plan.strategy() {
        AccessStrategy::Discard => Ok(Value::Nil),

        AccessStrategy::Widen { to, .. } => widen(value, to),

        AccessStrategy::Chain(..) => match member.ty() {
            TypeRef::Duck(descriptor) => chain::wrap(value, descriptor, depth),
            _ => system_panic!("Chained member of a non-descriptor type."),
        },

        AccessStrategy::Direct => {
            let expected = member.ty();

            if value.conforms(expected) {
                return Ok(value);
            }

            // Values of open generic target members are widened per call.
            let value = coerce(value, expected)?;

            if value.conforms(expected) {
                return Ok(value);
            }

            Err(RuntimeError::TypeMismatch {
                expected: CompactString::from(expected.to_string()),
                found: value.kind(),
            })
        }
    }
}

// Runtime types bound to open generic parameters within one invocation.
#[derive(Default)]
struct GenericBindings {
    bound: Vec<(u8, Value)>,
}

impl GenericBindings {
    fn bind(&mut self, ty: &TypeRef, value: &Value) -> bool {
        let TypeRef::Generic(parameter) = ty else {
            return true;
        };

        for (bound, sample) in &self.bound {
            if bound == parameter {
                return sample.same_type(value);
            }
        }

        self.bound.push((*parameter, value.clone()));

        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        descriptor,
        duck::{adapt, AccessStrategy, Descriptor, DescriptorMember, DescriptorStyle, Proxy},
        runtime::{Object, RuntimeError, RuntimeResult, Shape, TypeRef, Value},
    };

    descriptor! {
        pub static ACCOUNT = Descriptor::interface("Account")
            .member(DescriptorMember::field("balance", TypeRef::I64).mutable())
            .member(DescriptorMember::field("Limit", TypeRef::Any).mutable().bind("limit"))
            .member(DescriptorMember::property("Owner", TypeRef::Duck(&OWNER)).mutable())
            .member(DescriptorMember::field("branch", TypeRef::STR))
            .member(DescriptorMember::method("Deposit", [TypeRef::I32], TypeRef::I64))
            .member(DescriptorMember::method(
                "Same",
                [TypeRef::Generic(0), TypeRef::Generic(0)],
                TypeRef::BOOL,
            ))
            .member(DescriptorMember::method("Describe", [TypeRef::Any], TypeRef::STR))
            .member(DescriptorMember::method("Close", [], TypeRef::Unit))
            .member(DescriptorMember::method("Flush", [], TypeRef::Unit).owner("IFlushable"));

        pub static OWNER = Descriptor::interface("Owner")
            .member(DescriptorMember::field("name", TypeRef::STR));

        pub static OWNER_COPY = Descriptor::copy("OwnerCopy")
            .member(DescriptorMember::field("name", TypeRef::STR));

        pub static STATEMENT = Descriptor::interface("Statement")
            .member(DescriptorMember::property("Owner", TypeRef::Duck(&OWNER_COPY)));

        pub static FLUSHER = Descriptor::interface("Flusher")
            .member(DescriptorMember::method("Flush", [], TypeRef::Unit).owner("*"));

        pub static PARCEL = Descriptor::interface("Parcel")
            .member(DescriptorMember::field("content", TypeRef::Duck(&OWNER)));

        pub static FACTORY = Descriptor::interface("Factory")
            .member(DescriptorMember::method("Make", [], TypeRef::Duck(&OWNER)))
            .member(DescriptorMember::method("Count", [], TypeRef::I64));
    }

    struct Fixture {
        account: Object,
        owner_shape: Arc<Shape>,
    }

    fn deposit(object: &Object, arguments: &[Value]) -> RuntimeResult<Value> {
        let amount = arguments[0].clone().take::<i64>()?;
        let balance = object.get("balance")?.take::<i64>()? + amount;

        object.set("balance", balance)?;

        Ok(Value::I64(balance))
    }

    fn same(_: &Object, arguments: &[Value]) -> RuntimeResult<Value> {
        Ok(Value::Bool(arguments[0].same_type(&arguments[1])))
    }

    fn describe(_: &Object, arguments: &[Value]) -> RuntimeResult<Value> {
        Ok(Value::from(format!("{:?}", arguments[0])))
    }

    fn close(object: &Object, _: &[Value]) -> RuntimeResult<Value> {
        object.set("closed", true)?;

        Ok(Value::Bool(true))
    }

    fn flush(object: &Object, _: &[Value]) -> RuntimeResult<Value> {
        object.set("flushed", true)?;

        Ok(Value::Nil)
    }

    fn fixture() -> Fixture {
        let owner_shape = Shape::build("Person").field("name", TypeRef::STR).finish();
        let owner_id = owner_shape.id();

        let shape = Shape::build("Account")
            .field("balance", TypeRef::I64)
            .field("limit", TypeRef::I64)
            .field("owner", TypeRef::Shape(owner_id))
            .readonly_field("branch", TypeRef::STR)
            .field("closed", TypeRef::BOOL)
            .field("flushed", TypeRef::BOOL)
            .property_mut(
                "Owner",
                TypeRef::Shape(owner_id),
                |object| object.get("owner"),
                |object, value| object.set("owner", value),
            )
            .method("Deposit", [TypeRef::I64], TypeRef::I64, deposit)
            .method("Same", [TypeRef::Generic(0), TypeRef::Any], TypeRef::BOOL, same)
            .method("Describe", [TypeRef::Any], TypeRef::STR, describe)
            .method("Close", [], TypeRef::BOOL, close)
            .contract("IFlushable")
            .method("Flush", [], TypeRef::Unit, flush)
            .finish();

        Fixture {
            account: Object::new(&shape),
            owner_shape,
        }
    }

    #[test]
    fn test_assignment() {
        let fixture = fixture();
        let proxy = adapt(Some(&fixture.account), &ACCOUNT).unwrap();

        proxy.set("balance", 100i64).unwrap();

        assert_eq!(fixture.account.get("balance").unwrap().take::<i64>().unwrap(), 100);

        // Untyped values are widened to the target's field type on write.
        proxy.set("Limit", 50i32).unwrap();

        assert!(matches!(fixture.account.get("limit").unwrap(), Value::I64(50)));

        assert!(matches!(
            proxy.set("balance", "many"),
            Err(RuntimeError::InvalidAssignment { .. }),
        ));

        assert!(matches!(
            proxy.set("branch", "north"),
            Err(RuntimeError::ReadOnly { .. }),
        ));

        assert!(matches!(
            proxy.set("missing", 1i64),
            Err(RuntimeError::UnknownMember { .. }),
        ));
    }

    #[test]
    fn test_chained_assignment() {
        let fixture = fixture();
        let proxy = adapt(Some(&fixture.account), &ACCOUNT).unwrap();
        let owner = Object::new(&fixture.owner_shape);

        owner.set("name", "Alice").unwrap();
        proxy.set("Owner", owner.clone()).unwrap();

        let nested = proxy.read::<Proxy>("Owner").unwrap();

        assert_eq!(nested.read::<String>("name").unwrap(), "Alice");
        assert!(nested.instance().unwrap().ptr_eq(&owner));

        // Proxies are never unwrapped back into their targets.
        match proxy.set("Owner", nested.clone()) {
            Err(RuntimeError::InvalidAssignment { found, .. }) => {
                assert_eq!(found, "proxy Owner");
            }

            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            proxy.set("Owner", Object::new(&Shape::build("Robot").finish())),
            Err(RuntimeError::InvalidAssignment { .. }),
        ));

        proxy.set("Owner", Value::Nil).unwrap();

        assert!(proxy.get("Owner").unwrap().is_nil());
    }

    #[test]
    fn test_invocation() {
        let fixture = fixture();
        let proxy = adapt(Some(&fixture.account), &ACCOUNT).unwrap();

        assert!(matches!(
            proxy.invoke("Deposit", &[Value::I32(30)]).unwrap(),
            Value::I64(30),
        ));

        assert!(matches!(
            proxy.invoke("Deposit", &[Value::I64(30)]),
            Err(RuntimeError::ArgumentMismatch { index: 0, .. }),
        ));

        assert!(matches!(
            proxy.invoke("Deposit", &[]),
            Err(RuntimeError::ArityMismatch {
                expected: 1,
                actual: 0,
                ..
            }),
        ));

        assert!(matches!(
            proxy.invoke("Same", &[Value::I8(1), Value::I8(2)]).unwrap(),
            Value::Bool(true),
        ));

        assert!(matches!(
            proxy.invoke("Same", &[Value::I8(1), Value::from("one")]),
            Err(RuntimeError::ArgumentMismatch { index: 1, .. }),
        ));

        assert_eq!(
            proxy
                .invoke("Describe", &[Value::U16(7)])
                .unwrap()
                .take::<String>()
                .unwrap(),
            "7u16",
        );

        assert!(matches!(
            proxy.invoke("Describe", &[Value::Proxy(proxy.clone())]),
            Err(RuntimeError::ArgumentMismatch { .. }),
        ));

        assert!(proxy.invoke("Close", &[]).unwrap().is_nil());
        assert!(matches!(fixture.account.get("closed").unwrap(), Value::Bool(true)));

        assert!(proxy.invoke("Flush", &[]).unwrap().is_nil());
        assert!(matches!(fixture.account.get("flushed").unwrap(), Value::Bool(true)));

        assert!(matches!(
            proxy.invoke("balance", &[]),
            Err(RuntimeError::UnknownMember { .. }),
        ));

        assert!(matches!(
            proxy.get("Close"),
            Err(RuntimeError::UnknownMember { .. }),
        ));
    }

    #[test]
    fn test_index_access() {
        let fixture = fixture();
        let proxy = adapt(Some(&fixture.account), &ACCOUNT).unwrap();

        fixture.account.set("balance", 12i64).unwrap();

        let (index, _) = proxy.descriptor().member("balance").unwrap();

        assert!(matches!(proxy.get_at(index).unwrap(), Value::I64(12)));

        assert!(matches!(
            proxy.get_at(100),
            Err(RuntimeError::UnknownMember { .. }),
        ));
    }

    #[test]
    fn test_snapshot_on_read() {
        let fixture = fixture();
        let proxy = adapt(Some(&fixture.account), &STATEMENT).unwrap();
        let owner = Object::new(&fixture.owner_shape);

        owner.set("name", "Alice").unwrap();
        fixture.account.set("owner", owner.clone()).unwrap();

        assert_eq!(
            proxy.adapter().table().plans()[0].strategy(),
            AccessStrategy::Chain(DescriptorStyle::Copy),
        );

        let first = proxy.read::<Proxy>("Owner").unwrap();

        owner.set("name", "Bob").unwrap();

        assert!(first.is_snapshot());
        assert_eq!(first.read::<String>("name").unwrap(), "Alice");

        let second = proxy.read::<Proxy>("Owner").unwrap();

        assert_eq!(second.read::<String>("name").unwrap(), "Bob");
    }

    #[test]
    fn test_any_contract_owner() {
        let fixture = fixture();
        let proxy = adapt(Some(&fixture.account), &FLUSHER).unwrap();
        let source = proxy.adapter().table().plans()[0].source();

        assert_eq!(source.contract.as_deref(), Some("IFlushable"));
        assert!(proxy.invoke("Flush", &[]).unwrap().is_nil());
        assert!(matches!(fixture.account.get("flushed").unwrap(), Value::Bool(true)));
    }

    #[test]
    fn test_untyped_chain() {
        let fixture = fixture();
        let shape = Shape::build("Parcel").field("content", TypeRef::Any).finish();
        let parcel = Object::new(&shape);
        let proxy = adapt(Some(&parcel), &PARCEL).unwrap();

        assert_eq!(
            proxy.adapter().table().plans()[0].strategy(),
            AccessStrategy::Chain(DescriptorStyle::Interface),
        );

        assert!(proxy.get("content").unwrap().is_nil());

        let owner = Object::new(&fixture.owner_shape);

        owner.set("name", "Carol").unwrap();
        parcel.set("content", owner).unwrap();

        let nested = proxy.read::<Proxy>("content").unwrap();

        assert_eq!(nested.read::<String>("name").unwrap(), "Carol");

        // The target's type is only known per value.
        parcel.set("content", 5i64).unwrap();

        match proxy.get("content") {
            Err(RuntimeError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, "duck Owner");
                assert_eq!(found, "i64");
            }

            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_generic_results() {
        let fixture = fixture();
        let person = fixture.owner_shape.clone();

        let shape = Shape::build("PersonFactory")
            .method("Make", [], TypeRef::Generic(0), move |_, _| {
                let owner = Object::new(&person);

                owner.set("name", "Dana")?;

                Ok(Value::from(owner))
            })
            .method("Count", [], TypeRef::Generic(0), |_, _| Ok(Value::I32(3)))
            .finish();

        let proxy = adapt(Some(&Object::new(&shape)), &FACTORY).unwrap();
        let plans = proxy.adapter().table().plans();

        assert_eq!(plans[0].strategy(), AccessStrategy::Chain(DescriptorStyle::Interface));
        assert_eq!(plans[1].strategy(), AccessStrategy::Direct);

        let made = proxy.invoke("Make", &[]).unwrap().take::<Proxy>().unwrap();

        assert_eq!(made.read::<String>("name").unwrap(), "Dana");
        assert!(matches!(proxy.invoke("Count", &[]).unwrap(), Value::I64(3)));
    }
}
