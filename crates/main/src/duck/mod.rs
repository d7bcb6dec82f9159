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

//! The structural-typing engine.
//!
//! The engine produces [proxies](Proxy): typed views over target objects
//! whose concrete [shapes](crate::runtime::Shape) are unknown when the
//! instrumentation code is written. The instrumentation code declares what
//! it needs from a target as a [Descriptor], and the engine binds the
//! descriptor's members to the target shape's members once per
//! (shape, descriptor) pair.
//!
//! ```
//! use tracer_duck::{
//!     descriptor,
//!     duck::{adapt, Descriptor, DescriptorMember},
//!     runtime::{Object, Shape, TypeRef},
//! };
//!
//! descriptor! {
//!     pub static SPAN = Descriptor::interface("Span")
//!         .member(DescriptorMember::field("id", TypeRef::I64))
//!         .member(DescriptorMember::property("Name", TypeRef::STR).mutable());
//! }
//!
//! let shape = Shape::build("HostSpan")
//!     .field("id", TypeRef::I32)
//!     .field("name", TypeRef::STR)
//!     .property_mut(
//!         "Name",
//!         TypeRef::STR,
//!         |object| object.get("name"),
//!         |object, value| object.set("name", value),
//!     )
//!     .finish();
//!
//! let span = Object::new(&shape);
//!
//! span.set("id", 7i32).unwrap();
//!
//! let proxy = adapt(Some(&span), &SPAN).unwrap();
//!
//! // The i32 field is widened to i64.
//! assert_eq!(proxy.read::<i64>("id").unwrap(), 7);
//!
//! proxy.set("Name", "GET /").unwrap();
//!
//! assert_eq!(span.get("name").unwrap().take::<String>().unwrap(), "GET /");
//! ```
//!
//! The binding process consists of the following stages:
//!
//!  1. The member resolver finds the target member for each descriptor
//!     member by name, kind, explicit owner, and (for methods) parameter
//!     types.
//!  2. The compatibility checker selects an [AccessStrategy] for each member
//!     pair: direct forwarding, lossless numeric widening, or chaining into a
//!     nested descriptor.
//!  3. The [CompiledAdapter] stores the resulting [StrategyTable].
//!  4. The [AdapterCache] memoizes the adapters (and the failures) for the
//!     lifetime of the process.
//!
//! All resolution and compatibility errors are reported when the adapter is
//! compiled. Once a pair is adapted successfully, accessing members through
//! its proxies never fails because of a missing or mismatched member.

mod cache;
mod chain;
mod closeness;
mod compat;
mod compile;
mod descriptor;
mod factory;
mod proxy;
mod resolve;

pub use crate::duck::{
    cache::{AdapterCache, AdapterState, AdapterStats},
    closeness::Closeness,
    compat::AccessStrategy,
    compile::{CompiledAdapter, CopyLayout, CopySlot, MemberPlan, StrategyTable},
    descriptor::{
        Descriptor,
        DescriptorBuilder,
        DescriptorIssue,
        DescriptorMember,
        DescriptorStyle,
        MemberKind,
        Owner,
        StaticDescriptor,
        Visibility,
    },
    factory::{adapt, adapt_as, can_adapt, try_adapt, Duck},
    proxy::Proxy,
    resolve::MemberSource,
};

/// The maximum number of nested copy-style snapshots a single adaptation
/// may take.
pub const MAX_COPY_DEPTH: usize = 32;

/// The [log] target of the engine's messages.
pub const DUCK_LOG: &str = "tracer_duck";
