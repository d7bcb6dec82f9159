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

use compact_str::format_compact;

use crate::{
    duck::{factory::adapt_object, StaticDescriptor},
    runtime::{RuntimeError, RuntimeResult, TypeRef, Value},
};

/// Adapts a value read from a chained target member to the nested
/// descriptor.
///
/// Nil stays nil. An object is adapted through the
/// [adapter cache](crate::duck::AdapterCache), so a descriptor graph that
/// chains back into itself reuses the already cached adapters instead of
/// descending again. A proxy that already implements the nested descriptor
/// is returned as is.
///
/// The `depth` is the number of enclosing copy-style snapshots.
pub(crate) fn wrap(
    value: Value,
    descriptor: &'static StaticDescriptor,
    depth: usize,
) -> RuntimeResult<Value> {
    match value {
        Value::Nil => Ok(Value::Nil),

        Value::Object(object) => Ok(Value::Proxy(adapt_object(&object, descriptor, depth)?)),

        Value::Proxy(proxy) if proxy.descriptor() == &**descriptor => Ok(Value::Proxy(proxy)),

        other => Err(RuntimeError::TypeMismatch {
            expected: format_compact!("{}", TypeRef::Duck(descriptor)),
            found: other.kind(),
        }),
    }
}
