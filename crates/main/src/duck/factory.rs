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

use std::sync::Arc;

use compact_str::CompactString;

use crate::{
    duck::{AdapterCache, DescriptorStyle, Proxy, StaticDescriptor},
    runtime::{Object, RuntimeError, RuntimeResult, Shape},
};

/// A Rust type that wraps proxies of a statically known descriptor.
///
/// Implement this trait to use the [adapt_as] function.
///
/// ```
/// use tracer_duck::{
///     descriptor,
///     duck::{adapt_as, Descriptor, DescriptorMember, Duck, Proxy, StaticDescriptor},
///     runtime::{Object, RuntimeResult, Shape, TypeRef},
/// };
///
/// descriptor! {
///     pub static REQUEST = Descriptor::interface("Request")
///         .member(DescriptorMember::property("Url", TypeRef::STR).bind("_url").ignore_case());
/// }
///
/// struct Request(Proxy);
///
/// impl Duck for Request {
///     fn descriptor() -> &'static StaticDescriptor {
///         &REQUEST
///     }
///
///     fn from_proxy(proxy: Proxy) -> Self {
///         Self(proxy)
///     }
/// }
///
/// impl Request {
///     fn url(&self) -> RuntimeResult<String> {
///         self.0.read("Url")
///     }
/// }
///
/// let shape = Shape::build("HttpRequest")
///     .property("_URL", TypeRef::STR, |_| Ok("https://example.com".into()))
///     .finish();
///
/// let request = adapt_as::<Request>(Some(&Object::new(&shape))).unwrap();
///
/// assert_eq!(request.url().unwrap(), "https://example.com");
/// ```
pub trait Duck: Sized {
    /// The descriptor this type's proxies satisfy.
    fn descriptor() -> &'static StaticDescriptor;

    /// Wraps a proxy of the [descriptor](Self::descriptor).
    fn from_proxy(proxy: Proxy) -> Self;
}

/// Adapts the `target` object to the `descriptor`.
///
/// The function fails with:
///
///  - [NullTarget](RuntimeError::NullTarget) if the target is None.
///  - [InvalidDescriptor](RuntimeError::InvalidDescriptor) if the descriptor
///    is not public or is malformed.
///  - Any compile-time error of the (shape, descriptor) pair, such as
///    [UnresolvedMember](RuntimeError::UnresolvedMember). These errors are
///    cached by the [AdapterCache].
///  - [CopyDepth](RuntimeError::CopyDepth) or a host error if a copy-style
///    snapshot cannot be taken.
///
/// On the first request for the target's shape, the function compiles the
/// adapter in-line. All later requests reuse it.
pub fn adapt(target: Option<&Object>, descriptor: &'static StaticDescriptor) -> RuntimeResult<Proxy> {
    let Some(target) = target else {
        return Err(RuntimeError::NullTarget {
            descriptor: CompactString::from(descriptor.name()),
        });
    };

    validate(descriptor)?;

    adapt_object(target, descriptor, 0)
}

/// Adapts the `target` object to the descriptor of `T`, and wraps the proxy
/// into `T`.
#[inline]
pub fn adapt_as<T: Duck>(target: Option<&Object>) -> RuntimeResult<T> {
    adapt(target, T::descriptor()).map(T::from_proxy)
}

/// Same as [adapt], but returns None instead of the error.
#[inline]
pub fn try_adapt(target: Option<&Object>, descriptor: &'static StaticDescriptor) -> Option<Proxy> {
    adapt(target, descriptor).ok()
}

/// Returns true if objects of the `shape` can be adapted to the
/// `descriptor`.
///
/// The check compiles (and caches) the adapter if the pair has not been
/// requested before.
pub fn can_adapt(shape: &Arc<Shape>, descriptor: &'static StaticDescriptor) -> bool {
    if validate(descriptor).is_err() {
        return false;
    }

    AdapterCache::get().get_or_compile(shape, descriptor).is_ok()
}

pub(crate) fn adapt_object(
    target: &Object,
    descriptor: &'static StaticDescriptor,
    depth: usize,
) -> RuntimeResult<Proxy> {
    let adapter = AdapterCache::get().get_or_compile(target.shape(), descriptor)?;

    match adapter.descriptor().style() {
        DescriptorStyle::Interface => Ok(Proxy::live(adapter, target)),
        DescriptorStyle::Copy => Proxy::snapshot(adapter, target, depth),
    }
}

#[inline]
fn validate(descriptor: &'static StaticDescriptor) -> RuntimeResult<()> {
    match descriptor.issue() {
        None => Ok(()),

        Some(issue) => Err(RuntimeError::InvalidDescriptor {
            descriptor: CompactString::from(descriptor.name()),
            origin: descriptor.origin(),
            issue: issue.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use crate::{
        descriptor,
        duck::{
            adapt,
            adapt_as,
            can_adapt,
            try_adapt,
            AdapterCache,
            Descriptor,
            DescriptorIssue,
            DescriptorMember,
            Duck,
            Proxy,
            StaticDescriptor,
            MAX_COPY_DEPTH,
        },
        runtime::{Object, RuntimeError, Shape, TypeRef, Value},
    };

    descriptor! {
        pub static RECORD = Descriptor::interface("Record")
            .member(DescriptorMember::field("id", TypeRef::I64))
            .member(DescriptorMember::field("name", TypeRef::STR));

        pub static COUNTER = Descriptor::interface("Counter")
            .member(DescriptorMember::field("count", TypeRef::I64));

        pub static NARROW_COUNTER = Descriptor::interface("NarrowCounter")
            .member(DescriptorMember::field("count", TypeRef::I32));

        pub static COUNTER_COPY = Descriptor::copy("CounterCopy")
            .member(DescriptorMember::field("count", TypeRef::I64));

        pub static OUTER = Descriptor::interface("Outer")
            .member(DescriptorMember::field("inner", TypeRef::Duck(&INNER)));

        pub static INNER = Descriptor::interface("Inner")
            .member(DescriptorMember::field("x", TypeRef::I64));

        pub static LABELED = Descriptor::interface("Labeled")
            .member(DescriptorMember::property("Label", TypeRef::STR));

        pub static ID_WRITER = Descriptor::interface("IdWriter")
            .member(DescriptorMember::field("id", TypeRef::I64).mutable());

        pub static NODE = Descriptor::interface("Node")
            .member(DescriptorMember::field("value", TypeRef::I64))
            .member(DescriptorMember::field("next", TypeRef::Duck(&NODE)));

        pub static NODE_COPY = Descriptor::copy("NodeCopy")
            .member(DescriptorMember::field("value", TypeRef::I64))
            .member(DescriptorMember::field("next", TypeRef::Duck(&NODE_COPY)));

        pub(crate) static INTERNAL = Descriptor::interface("Internal")
            .member(DescriptorMember::field("id", TypeRef::I64));

        pub static RESTRICTED_OUTER = Descriptor::interface("RestrictedOuter")
            .member(DescriptorMember::field("inner", TypeRef::Duck(&RESTRICTED_INNER)));

        pub(crate) static RESTRICTED_INNER = Descriptor::interface("RestrictedInner")
            .member(DescriptorMember::field("x", TypeRef::I64));

        pub static PUBLIC_OUTER = Descriptor::interface("PublicOuter")
            .member(DescriptorMember::field("inner", TypeRef::Duck(&PUBLIC_INNER)));

        pub static PUBLIC_INNER = Descriptor::interface("PublicInner")
            .member(DescriptorMember::field("x", TypeRef::I64));
    }

    struct RecordView(Proxy);

    impl Duck for RecordView {
        fn descriptor() -> &'static StaticDescriptor {
            &RECORD
        }

        fn from_proxy(proxy: Proxy) -> Self {
            Self(proxy)
        }
    }

    fn record_shape() -> Arc<Shape> {
        Shape::build("Record")
            .field("id", TypeRef::I64)
            .field("name", TypeRef::STR)
            .finish()
    }

    fn node_shape() -> Arc<Shape> {
        let builder = Shape::build("Node");
        let id = builder.id();

        builder
            .field("value", TypeRef::I64)
            .field("next", TypeRef::Shape(id))
            .finish()
    }

    fn node(shape: &Arc<Shape>, value: i64) -> Object {
        let node = Object::new(shape);

        node.set("value", value).unwrap();

        node
    }

    #[test]
    fn test_direct_forwarding() {
        let shape = record_shape();
        let record = Object::new(&shape);

        record.set("id", 1i64).unwrap();
        record.set("name", "first").unwrap();

        let proxy = adapt(Some(&record), &RECORD).unwrap();

        assert_eq!(proxy.read::<i64>("id").unwrap(), 1);
        assert_eq!(proxy.read::<String>("name").unwrap(), "first");

        record.set("id", 2i64).unwrap();
        record.set("name", "second").unwrap();

        assert_eq!(proxy.read::<i64>("id").unwrap(), 2);
        assert_eq!(proxy.read::<String>("name").unwrap(), "second");
        assert!(proxy.instance().unwrap().ptr_eq(&record));
        assert!(!proxy.is_snapshot());
    }

    #[test]
    fn test_concurrent_adaptation() {
        let shape = record_shape();
        let record = Object::new(&shape);

        let proxies = thread::scope(|scope| {
            let handles = (0..16)
                .map(|_| scope.spawn(|| adapt(Some(&record), &RECORD).unwrap()))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        for proxy in &proxies {
            assert!(Arc::ptr_eq(proxy.adapter(), proxies[0].adapter()));
        }

        let stats = AdapterCache::get().stats(shape.id(), &RECORD);

        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.requests, 16);
    }

    #[test]
    fn test_widening() {
        let shape = Shape::build("Counter").field("count", TypeRef::I32).finish();
        let counter = Object::new(&shape);

        counter.set("count", 41i32).unwrap();

        let proxy = adapt(Some(&counter), &COUNTER).unwrap();

        assert!(matches!(proxy.get("count").unwrap(), Value::I64(41)));

        let shape = Shape::build("Counter").field("count", TypeRef::I64).finish();

        assert!(matches!(
            adapt(Some(&Object::new(&shape)), &NARROW_COUNTER),
            Err(RuntimeError::IncompatibleType { .. }),
        ));
    }

    #[test]
    fn test_chaining() {
        let inner_shape = Shape::build("Inner").field("x", TypeRef::I64).finish();

        let outer_shape = Shape::build("Outer")
            .field("inner", TypeRef::Shape(inner_shape.id()))
            .finish();

        let inner = Object::new(&inner_shape);
        let outer = Object::new(&outer_shape);

        inner.set("x", 1i64).unwrap();

        let proxy = adapt(Some(&outer), &OUTER).unwrap();

        assert!(proxy.get("inner").unwrap().is_nil());

        outer.set("inner", inner.clone()).unwrap();

        let nested = proxy.read::<Proxy>("inner").unwrap();

        assert_eq!(nested.descriptor(), &*INNER);
        assert_eq!(nested.read::<i64>("x").unwrap(), 1);

        inner.set("x", 5i64).unwrap();

        assert_eq!(nested.read::<i64>("x").unwrap(), 5);
    }

    #[test]
    fn test_copy_semantics() {
        let shape = Shape::build("Counter").field("count", TypeRef::I64).finish();
        let counter = Object::new(&shape);

        counter.set("count", 1i64).unwrap();

        let snapshot = adapt(Some(&counter), &COUNTER_COPY).unwrap();

        counter.set("count", 2i64).unwrap();

        assert_eq!(snapshot.read::<i64>("count").unwrap(), 1);
        assert!(snapshot.is_snapshot());
        assert!(snapshot.instance().is_none());

        assert!(matches!(
            snapshot.set("count", 3i64),
            Err(RuntimeError::ReadOnly { .. }),
        ));

        drop(counter);

        assert_eq!(snapshot.read::<i64>("count").unwrap(), 1);
    }

    #[test]
    fn test_unresolved_is_cached() {
        let shape = Shape::build("Labeled")
            .property("Lable", TypeRef::STR, |_| Ok("".into()))
            .finish();

        let target = Object::new(&shape);

        let first = adapt(Some(&target), &LABELED).unwrap_err();
        let second = adapt(Some(&target), &LABELED).unwrap_err();

        match &first {
            RuntimeError::UnresolvedMember { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("Lable"));
            }

            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(AdapterCache::get().stats(shape.id(), &LABELED).compilations, 1);
        assert!(!can_adapt(&shape, &LABELED));
        assert!(try_adapt(Some(&target), &LABELED).is_none());
    }

    #[test]
    fn test_write_guard() {
        let shape = Shape::build("Record").readonly_field("id", TypeRef::I64).finish();

        assert!(matches!(
            adapt(Some(&Object::new(&shape)), &ID_WRITER),
            Err(RuntimeError::NotAssignable { .. }),
        ));
    }

    #[test]
    fn test_validation_order() {
        assert!(matches!(adapt(None, &INTERNAL), Err(RuntimeError::NullTarget { .. })));
        assert!(matches!(adapt(None, &RECORD), Err(RuntimeError::NullTarget { .. })));

        assert!(matches!(
            adapt(Some(&Object::new(&record_shape())), &INTERNAL),
            Err(RuntimeError::InvalidDescriptor {
                issue: DescriptorIssue::NotPublic,
                ..
            }),
        ));

        assert!(!can_adapt(&record_shape(), &INTERNAL));
    }

    #[test]
    fn test_restricted_twin() {
        let inner_shape = Shape::build("Inner").field("x", TypeRef::I64).finish();

        let outer_shape = Shape::build("Outer")
            .field("inner", TypeRef::Shape(inner_shape.id()))
            .finish();

        let outer = Object::new(&outer_shape);

        outer.set("inner", Object::new(&inner_shape)).unwrap();

        match adapt(Some(&outer), &RESTRICTED_OUTER) {
            Err(RuntimeError::InvalidDescriptor {
                descriptor, issue, ..
            }) => {
                assert_eq!(descriptor, "RestrictedInner");
                assert_eq!(issue, DescriptorIssue::NotPublic);
            }

            other => panic!("unexpected result: {other:?}"),
        }

        let proxy = adapt(Some(&outer), &PUBLIC_OUTER).unwrap();
        let nested = proxy.read::<Proxy>("inner").unwrap();

        assert_eq!(nested.descriptor(), &*PUBLIC_INNER);
        assert_eq!(nested.read::<i64>("x").unwrap(), 0);

        let stats = AdapterCache::get().stats(outer_shape.id(), &PUBLIC_OUTER);

        assert_eq!(stats.compilations, 1);
    }

    #[test]
    fn test_target_release() {
        let shape = record_shape();
        let record = Object::new(&shape);
        let proxy = adapt(Some(&record), &RECORD).unwrap();

        drop(record);

        assert!(proxy.instance().is_none());

        assert!(matches!(
            proxy.get("id"),
            Err(RuntimeError::TargetReleased { .. }),
        ));
    }

    #[test]
    fn test_typed_adaptation() {
        let shape = record_shape();
        let record = Object::new(&shape);

        record.set("name", "typed").unwrap();

        let view = adapt_as::<RecordView>(Some(&record)).unwrap();

        assert_eq!(view.0.read::<String>("name").unwrap(), "typed");
        assert!(matches!(
            adapt_as::<RecordView>(None),
            Err(RuntimeError::NullTarget { .. }),
        ));
    }

    #[test]
    fn test_cyclic_descriptor() {
        let shape = node_shape();
        let first = node(&shape, 1);
        let second = node(&shape, 2);

        first.set("next", second.clone()).unwrap();
        second.set("next", first.clone()).unwrap();

        let proxy = adapt(Some(&first), &NODE).unwrap();

        let mut current = proxy.clone();

        for step in 0..5 {
            let expected = match step % 2 {
                0 => 1,
                _ => 2,
            };

            assert_eq!(current.read::<i64>("value").unwrap(), expected);
            assert!(Arc::ptr_eq(current.adapter(), proxy.adapter()));

            current = current.read::<Proxy>("next").unwrap();
        }

        assert_eq!(AdapterCache::get().stats(shape.id(), &NODE).compilations, 1);

        // Breaks the reference cycle.
        second.set("next", Value::Nil).unwrap();
    }

    #[test]
    fn test_nested_snapshots() {
        let shape = node_shape();
        let first = node(&shape, 1);
        let second = node(&shape, 2);

        first.set("next", second.clone()).unwrap();

        let snapshot = adapt(Some(&first), &NODE_COPY).unwrap();

        second.set("value", 20i64).unwrap();

        let nested = snapshot.read::<Proxy>("next").unwrap();

        assert!(nested.is_snapshot());
        assert_eq!(nested.read::<i64>("value").unwrap(), 2);
        assert!(nested.get("next").unwrap().is_nil());

        second.set("next", first.clone()).unwrap();

        match adapt(Some(&first), &NODE_COPY) {
            Err(RuntimeError::CopyDepth { limit, .. }) => assert_eq!(limit, MAX_COPY_DEPTH),
            other => panic!("unexpected result: {other:?}"),
        }

        second.set("next", Value::Nil).unwrap();
    }
}
