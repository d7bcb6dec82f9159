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

//! # Tracer Duck
//!
//! A structural-typing ("duck typing") proxy engine for runtime call
//! instrumentation.
//!
//! Instrumentation code often needs to read and write members of objects
//! whose concrete types belong to a third-party library and are not known
//! when the instrumentation is written. This crate lets the instrumentation
//! declare the members it needs as a [Descriptor](duck::Descriptor) and adapt
//! any object that structurally satisfies the descriptor to a typed
//! [Proxy](duck::Proxy).
//!
//! The crate consists of two modules:
//!
//!  - [runtime] models the reflective metadata of the instrumented program:
//!    [shapes](runtime::Shape), [objects](runtime::Object),
//!    [values](runtime::Value), and [types](runtime::TypeRef).
//!  - [duck] is the engine itself: descriptors, adapter compilation and
//!    caching, and proxies.
//!
//! The engine never panics on user-reachable paths. Every operation returns
//! a [RuntimeResult](runtime::RuntimeResult), and the caller decides whether
//! to skip the instrumentation of a call site on error.
//!
//! The engine reports adapter compilations through the [log] crate facade
//! under the [DUCK_LOG](duck::DUCK_LOG) target. Installing a logger is up to
//! the host application.

pub mod duck;
mod report;
pub mod runtime;
