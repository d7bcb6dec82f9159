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
};

static NIL_RUST_ORIGIN: RustOrigin = RustOrigin {
    package: None,
    code: None,
};

/// A pointer to a specific location in the Rust source code.
///
/// Shapes and [descriptors](crate::duck::Descriptor) remember the place where
/// they were declared, so that the engine's diagnostics can point the
/// instrumentation author to the declaration that failed to adapt.
///
/// Typically, you don't need to create this object manually. The
/// [origin](crate::origin) macro creates a static instance of RustOrigin at
/// the macro call site, and the [descriptor](crate::descriptor) macro does
/// the same for each declared descriptor.
#[derive(Clone, Copy, Hash)]
pub struct RustOrigin {
    /// The name and version of the crate to which the Rust file belongs.
    pub package: Option<(&'static str, &'static str)>,

    /// The actual reference to the Rust file within the crate.
    pub code: Option<RustCode>,
}

impl Default for RustOrigin {
    #[inline(always)]
    fn default() -> Self {
        NIL_RUST_ORIGIN
    }
}

impl Default for &'static RustOrigin {
    #[inline(always)]
    fn default() -> Self {
        RustOrigin::nil()
    }
}

impl PartialEq for RustOrigin {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.package.ne(&other.package) {
            return false;
        }

        self.code.eq(&other.code)
    }
}

impl Eq for RustOrigin {}

impl Debug for RustOrigin {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.package.is_none() && self.code.is_none() {
            return formatter.write_str("RustOrigin(invalid)");
        }

        let mut debug_struct = formatter.debug_struct("RustOrigin");

        if let Some((name, version)) = &self.package {
            debug_struct.field("package", &format_args!("{name}@{version}"));
        }

        if let Some(code) = &self.code {
            debug_struct.field("code", &code);
        }

        debug_struct.finish()
    }
}

impl Display for RustOrigin {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = &self.code {
            return Display::fmt(code, formatter);
        }

        if let Some((name, _)) = self.package {
            return formatter.write_str(name);
        }

        formatter.write_str("[?]")
    }
}

impl RustOrigin {
    /// Returns a RustOrigin that intentionally does not point to any Rust code.
    /// This is the [Default] value of this object.
    #[inline(always)]
    pub fn nil() -> &'static Self {
        &NIL_RUST_ORIGIN
    }

    /// Returns true if this instance is the [Nil RustOrigin](Self::nil).
    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        self == &NIL_RUST_ORIGIN
    }
}

/// A location within a Rust source file.
#[derive(Clone, Copy)]
pub struct RustCode {
    /// The path of the Rust source file, as reported by the `file!()` macro.
    pub module: &'static str,

    /// A one-based line number within the module file.
    pub line: u32,

    /// A one-based column number within a line of the module file.
    pub column: u32,
}

impl Hash for RustCode {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.module.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}

impl PartialEq for RustCode {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.module.ne(other.module) {
            return false;
        }

        if self.line.ne(&other.line) {
            return false;
        }

        if self.column.ne(&other.column) {
            return false;
        }

        true
    }
}

impl Eq for RustCode {}

impl Debug for RustCode {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RustCode")
            .field("module", &self.module)
            .field("position", &format_args!("{}:{}", self.line, self.column))
            .finish()
    }
}

impl Display for RustCode {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!(
            "{}:{}:{}",
            self.module, self.line, self.column
        ))
    }
}

/// Creates a `&'static RustOrigin` that points to the macro call site.
///
/// ```
/// use tracer_duck::origin;
///
/// let origin = origin!();
///
/// assert!(!origin.is_nil());
/// assert!(origin.code.is_some());
/// ```
#[macro_export]
macro_rules! origin {
    () => {{
        static ORIGIN: $crate::runtime::RustOrigin = $crate::runtime::RustOrigin {
            package: ::std::option::Option::Some((
                ::std::env!("CARGO_PKG_NAME"),
                ::std::env!("CARGO_PKG_VERSION"),
            )),
            code: ::std::option::Option::Some($crate::runtime::RustCode {
                module: ::std::file!(),
                line: ::std::line!(),
                column: ::std::column!(),
            }),
        };

        &ORIGIN
    }};
}
