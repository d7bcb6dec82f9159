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
    error::Error as StdError,
    fmt::{Display, Formatter},
    result::Result as StdResult,
    sync::Arc,
};

use compact_str::CompactString;

use crate::{
    duck::{DescriptorIssue, MemberKind},
    runtime::RustOrigin,
};

/// A result of an engine API call, which can either be a normal value or a
/// [RuntimeError].
pub type RuntimeResult<T> = StdResult<T, RuntimeError>;

/// Represents any error that may occur when adapting a target object to a
/// descriptor, or when accessing the target through a proxy.
///
/// The variants fall into two groups:
///
///  - Compile-time errors ([is_compile_time](Self::is_compile_time) returns
///    true) describe a (shape, descriptor) pair that can never be adapted.
///    They are detected once, when the adapter is compiled, and the
///    [adapter cache](crate::duck::AdapterCache) returns the same error for
///    every subsequent request with the same pair.
///
///  - Per-call errors describe a single failed operation and never affect
///    the cache.
///
/// Shape names in the error fields are rendered as `Name#id`.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum RuntimeError {
    /// The adaptation target is absent.
    NullTarget {
        /// The name of the requested descriptor.
        descriptor: CompactString,
    },

    /// The descriptor cannot be used for adaptation.
    InvalidDescriptor {
        /// The name of the descriptor.
        descriptor: CompactString,

        /// The place where the descriptor was declared.
        origin: &'static RustOrigin,

        /// The reason why the descriptor is not usable.
        issue: DescriptorIssue,
    },

    /// No target member satisfies the descriptor member.
    UnresolvedMember {
        /// The target shape.
        shape: CompactString,

        /// The name of the descriptor.
        descriptor: CompactString,

        /// The place where the descriptor was declared.
        origin: &'static RustOrigin,

        /// The logical name of the descriptor member.
        member: CompactString,

        /// The kind of the requested target member.
        kind: MemberKind,

        /// The name under which the target member was looked up.
        lookup: CompactString,

        /// The closest name of an existing target member of the same kind,
        /// if any is reasonably close.
        suggestion: Option<CompactString>,
    },

    /// More than one target member satisfies the descriptor member equally
    /// well.
    AmbiguousMember {
        /// The target shape.
        shape: CompactString,

        /// The name of the descriptor.
        descriptor: CompactString,

        /// The place where the descriptor was declared.
        origin: &'static RustOrigin,

        /// The logical name of the descriptor member.
        member: CompactString,

        /// The descriptions of the conflicting candidates.
        candidates: Vec<CompactString>,
    },

    /// The target member's type can be neither forwarded, widened, nor
    /// chained to the descriptor member's type.
    IncompatibleType {
        /// The target shape.
        shape: CompactString,

        /// The name of the descriptor.
        descriptor: CompactString,

        /// The place where the descriptor was declared.
        origin: &'static RustOrigin,

        /// The logical name of the descriptor member.
        member: CompactString,

        /// The type declared by the descriptor member.
        expected: CompactString,

        /// The type of the resolved target member.
        found: CompactString,
    },

    /// A mutable descriptor member resolves to a target member that cannot
    /// be assigned.
    NotAssignable {
        /// The target shape.
        shape: CompactString,

        /// The name of the descriptor.
        descriptor: CompactString,

        /// The place where the descriptor was declared.
        origin: &'static RustOrigin,

        /// The logical name of the descriptor member.
        member: CompactString,
    },

    /// A descriptor member resolves to a write-only target property.
    NotReadable {
        /// The target shape.
        shape: CompactString,

        /// The name of the descriptor.
        descriptor: CompactString,

        /// The place where the descriptor was declared.
        origin: &'static RustOrigin,

        /// The logical name of the descriptor member.
        member: CompactString,
    },

    /// A value written through a proxy does not conform to the member's
    /// type, or is a proxy that would have to be unwrapped.
    InvalidAssignment {
        /// The name of the descriptor.
        descriptor: CompactString,

        /// The logical name of the descriptor member.
        member: CompactString,

        /// The type the written value must conform to.
        expected: CompactString,

        /// The runtime type of the written value.
        found: CompactString,
    },

    /// The target object of a live proxy has been released.
    TargetReleased {
        /// The name of the descriptor.
        descriptor: CompactString,
    },

    /// An attempt to write through a copy-style proxy, or through a member
    /// that is not declared mutable.
    ReadOnly {
        /// The name of the descriptor.
        descriptor: CompactString,

        /// The logical name of the descriptor member.
        member: CompactString,
    },

    /// The member is not declared by the receiver, or is not of the kind the
    /// operation requires.
    UnknownMember {
        /// The descriptor name or the shape.
        receiver: CompactString,

        /// The name of the requested member.
        member: CompactString,
    },

    /// A method was invoked with the wrong number of arguments.
    ArityMismatch {
        /// The logical name of the method.
        member: CompactString,

        /// The number of declared parameters.
        expected: usize,

        /// The number of supplied arguments.
        actual: usize,
    },

    /// A method argument does not conform to the parameter type, or
    /// contradicts the type previously bound to the same generic parameter.
    ArgumentMismatch {
        /// The logical name of the method.
        member: CompactString,

        /// The zero-based index of the argument.
        index: usize,

        /// The parameter type.
        expected: CompactString,

        /// The runtime type of the argument.
        found: CompactString,
    },

    /// A value has a different runtime type than required.
    TypeMismatch {
        /// The required type.
        expected: CompactString,

        /// The runtime type of the value.
        found: CompactString,
    },

    /// A copy-style snapshot descends deeper than the engine allows.
    ///
    /// The limit is [MAX_COPY_DEPTH](crate::duck::MAX_COPY_DEPTH). Object
    /// graphs that refer to themselves through copy-style members always hit
    /// this limit.
    CopyDepth {
        /// The name of the descriptor at which the limit was reached.
        descriptor: CompactString,

        /// The maximum depth.
        limit: usize,
    },

    /// A host accessor failed with its own error.
    Host {
        /// The error raised by the host.
        cause: Arc<dyn StdError + Send + Sync + 'static>,
    },
}

impl Display for RuntimeError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NullTarget { descriptor } => formatter.write_fmt(format_args!(
                "cannot adapt nil to descriptor \"{descriptor}\""
            )),

            Self::InvalidDescriptor {
                descriptor, issue, ..
            } => formatter.write_fmt(format_args!("invalid descriptor \"{descriptor}\": {issue}")),

            Self::UnresolvedMember {
                shape,
                descriptor,
                member,
                kind,
                lookup,
                suggestion,
                ..
            } => {
                formatter.write_fmt(format_args!(
                    "{shape} has no {kind} \"{lookup}\" required by \"{descriptor}.{member}\""
                ))?;

                if let Some(suggestion) = suggestion {
                    formatter.write_fmt(format_args!(" (did you mean \"{suggestion}\"?)"))?;
                }

                Ok(())
            }

            Self::AmbiguousMember {
                shape,
                descriptor,
                member,
                candidates,
                ..
            } => {
                formatter.write_fmt(format_args!(
                    "\"{descriptor}.{member}\" matches more than one member of {shape}: "
                ))?;

                let mut first = true;

                for candidate in candidates {
                    match first {
                        true => first = false,
                        false => formatter.write_str(", ")?,
                    }

                    formatter.write_str(candidate)?;
                }

                Ok(())
            }

            Self::IncompatibleType {
                shape,
                descriptor,
                member,
                expected,
                found,
                ..
            } => formatter.write_fmt(format_args!(
                "\"{descriptor}.{member}\" expects {expected}, but {shape} provides {found}"
            )),

            Self::NotAssignable {
                shape,
                descriptor,
                member,
                ..
            } => formatter.write_fmt(format_args!(
                "\"{descriptor}.{member}\" is mutable, but the member of {shape} cannot be \
                assigned"
            )),

            Self::NotReadable {
                shape,
                descriptor,
                member,
                ..
            } => formatter.write_fmt(format_args!(
                "\"{descriptor}.{member}\" requires a readable member, but the member of \
                {shape} has no getter"
            )),

            Self::InvalidAssignment {
                descriptor,
                member,
                expected,
                found,
            } => formatter.write_fmt(format_args!(
                "cannot assign {found} to \"{descriptor}.{member}\" of type {expected}"
            )),

            Self::TargetReleased { descriptor } => formatter.write_fmt(format_args!(
                "the target of \"{descriptor}\" proxy has been released"
            )),

            Self::ReadOnly { descriptor, member } => formatter.write_fmt(format_args!(
                "\"{descriptor}.{member}\" cannot be assigned through this proxy"
            )),

            Self::UnknownMember { receiver, member } => {
                formatter.write_fmt(format_args!("{receiver} has no member \"{member}\""))
            }

            Self::ArityMismatch {
                member,
                expected,
                actual,
            } => formatter.write_fmt(format_args!(
                "method \"{member}\" expects {expected} argument(s), but {actual} provided"
            )),

            Self::ArgumentMismatch {
                member,
                index,
                expected,
                found,
            } => formatter.write_fmt(format_args!(
                "argument {} of method \"{member}\" expects {expected}, but {found} provided",
                index + 1,
            )),

            Self::TypeMismatch { expected, found } => {
                formatter.write_fmt(format_args!("expected {expected}, found {found}"))
            }

            Self::CopyDepth { descriptor, limit } => formatter.write_fmt(format_args!(
                "copying \"{descriptor}\" exceeds the maximum depth of {limit} nested snapshots"
            )),

            Self::Host { cause } => Display::fmt(cause, formatter),
        }
    }
}

impl StdError for RuntimeError {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Host { cause } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

impl RuntimeError {
    /// Wraps an error raised by a host accessor.
    #[inline(always)]
    pub fn host(cause: impl StdError + Send + Sync + 'static) -> Self {
        Self::Host {
            cause: Arc::new(cause),
        }
    }

    /// Returns true if this error describes a (shape, descriptor) pair that
    /// can never be adapted.
    ///
    /// Compile-time errors are cached by the
    /// [adapter cache](crate::duck::AdapterCache).
    #[inline]
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            Self::InvalidDescriptor { .. }
                | Self::UnresolvedMember { .. }
                | Self::AmbiguousMember { .. }
                | Self::IncompatibleType { .. }
                | Self::NotAssignable { .. }
                | Self::NotReadable { .. }
        )
    }

    /// Returns the declaration site of the descriptor this error refers to,
    /// or the [nil](RustOrigin::nil) origin if the error is not bound to a
    /// descriptor declaration.
    #[inline]
    pub fn origin(&self) -> &'static RustOrigin {
        match self {
            Self::InvalidDescriptor { origin, .. }
            | Self::UnresolvedMember { origin, .. }
            | Self::AmbiguousMember { origin, .. }
            | Self::IncompatibleType { origin, .. }
            | Self::NotAssignable { origin, .. }
            | Self::NotReadable { origin, .. } => *origin,

            _ => RustOrigin::nil(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{error::Error, fmt::Display};

    use compact_str::CompactString;

    use crate::{
        duck::MemberKind,
        runtime::{RuntimeError, RustOrigin},
    };

    #[derive(Debug)]
    struct Disconnected;

    impl Display for Disconnected {
        fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("connection closed")
        }
    }

    impl Error for Disconnected {}

    #[test]
    fn test_error_display() {
        let error = RuntimeError::UnresolvedMember {
            shape: CompactString::from("Command#3"),
            descriptor: CompactString::from("CommandProxy"),
            origin: RustOrigin::nil(),
            member: CompactString::from("Text"),
            kind: MemberKind::Property,
            lookup: CompactString::from("CommandText"),
            suggestion: Some(CompactString::from("CommandTxt")),
        };

        assert_eq!(
            error.to_string(),
            "Command#3 has no property \"CommandText\" required by \"CommandProxy.Text\" \
            (did you mean \"CommandTxt\"?)",
        );

        assert!(error.is_compile_time());
    }

    #[test]
    fn test_host_error() {
        let error = RuntimeError::host(Disconnected);

        assert_eq!(error.to_string(), "connection closed");
        assert!(error.source().is_some());
        assert!(!error.is_compile_time());
        assert!(error.origin().is_nil());
    }
}
