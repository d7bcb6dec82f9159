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
    ops::Deref,
    ptr,
    sync::OnceLock,
};

use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use lady_deirdre::sync::Lazy;

use crate::runtime::{RustOrigin, TypeRef};

/// A declared set of members that a [Proxy](crate::duck::Proxy) must satisfy.
///
/// Descriptors are the only configuration surface of the engine. They are
/// authored statically by the instrumentation code, typically through the
/// [descriptor](crate::descriptor) macro, and never change at runtime.
///
/// Two descriptors are considered the same by the
/// [adapter cache](crate::duck::AdapterCache) when their
/// [styles](DescriptorStyle), [visibilities](Visibility) and member lists
/// are equal, regardless of their names or declaration sites.
pub struct Descriptor {
    name: CompactString,
    style: DescriptorStyle,
    visibility: Visibility,
    origin: &'static RustOrigin,
    members: Vec<DescriptorMember>,
    index: AHashMap<CompactString, usize>,
    duplicate: Option<CompactString>,
    issue: OnceLock<Option<DescriptorIssue>>,
}

impl Debug for Descriptor {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Descriptor")
            .field("name", &self.name)
            .field("style", &self.style)
            .field("visibility", &self.visibility)
            .field("origin", &self.origin)
            .field("members", &self.members)
            .finish()
    }
}

impl Display for Descriptor {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.name)
    }
}

impl PartialEq for Descriptor {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let mut visited = AHashSet::new();

        self.eq_in(other, &mut visited)
    }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.style.hash(state);
        self.visibility.hash(state);
        self.members.len().hash(state);

        for member in &self.members {
            member.hash(state);
        }
    }
}

impl Descriptor {
    /// Starts a builder of an interface-style descriptor, whose proxies are
    /// live views over the target object.
    #[inline(always)]
    pub fn interface(name: impl Into<CompactString>) -> DescriptorBuilder {
        DescriptorBuilder::new(name.into(), DescriptorStyle::Interface)
    }

    /// Starts a builder of a copy-style descriptor, whose proxies are
    /// snapshots of the target object taken once at adaptation time.
    #[inline(always)]
    pub fn copy(name: impl Into<CompactString>) -> DescriptorBuilder {
        DescriptorBuilder::new(name.into(), DescriptorStyle::Copy)
    }

    /// Returns the user-facing name of this descriptor.
    ///
    /// The name is used in diagnostics only and does not participate in the
    /// descriptor's identity.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of proxies this descriptor produces.
    #[inline(always)]
    pub fn style(&self) -> DescriptorStyle {
        self.style
    }

    /// Returns true if this is a [copy-style](DescriptorStyle::Copy)
    /// descriptor.
    #[inline(always)]
    pub fn is_copy(&self) -> bool {
        self.style == DescriptorStyle::Copy
    }

    /// Returns whether this descriptor can be referenced across crate
    /// boundaries.
    #[inline(always)]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns the location in the Rust source code where this descriptor was
    /// declared.
    #[inline(always)]
    pub fn origin(&self) -> &'static RustOrigin {
        self.origin
    }

    /// Returns the members of this descriptor in declaration order.
    ///
    /// The position of a member in this slice is its slot index: the
    /// [Proxy::get_at](crate::duck::Proxy::get_at) function accepts this
    /// index for any proxy of this descriptor.
    #[inline(always)]
    pub fn members(&self) -> &[DescriptorMember] {
        &self.members
    }

    /// Looks up a member by its logical name, returning the member's slot
    /// index together with the member.
    #[inline]
    pub fn member(&self, name: &str) -> Option<(usize, &DescriptorMember)> {
        let index = *self.index.get(name)?;

        Some((index, &self.members[index]))
    }

    /// Returns the reason why this descriptor cannot be used for adaptation,
    /// or None if the descriptor is well-formed and public.
    ///
    /// The check is performed once, on the first call, and memoized.
    #[inline]
    pub fn issue(&self) -> Option<&DescriptorIssue> {
        self.issue.get_or_init(|| self.validate()).as_ref()
    }

    /// Returns true if this descriptor has the same style, visibility, and
    /// member list as the `other` one.
    ///
    /// A restricted descriptor is never equal to a public one, so the two
    /// never share a cached adapter.
    ///
    /// This is the same relation as [PartialEq] provides.
    #[inline(always)]
    pub fn structurally_eq(&self, other: &Self) -> bool {
        self == other
    }

    pub(crate) fn eq_in(&self, other: &Self, visited: &mut AHashSet<(usize, usize)>) -> bool {
        if ptr::eq(self, other) {
            return true;
        }

        let pair = (self as *const Self as usize, other as *const Self as usize);

        // The pair is already under comparison higher up the stack. Assuming
        // equality here is what makes the relation finite on cycles.
        if !visited.insert(pair) {
            return true;
        }

        if self.style != other.style
            || self.visibility != other.visibility
            || self.members.len() != other.members.len()
        {
            return false;
        }

        self.members
            .iter()
            .zip(other.members.iter())
            .all(|(this, other)| this.eq_in(other, visited))
    }

    fn validate(&self) -> Option<DescriptorIssue> {
        if self.visibility != Visibility::Public {
            return Some(DescriptorIssue::NotPublic);
        }

        if let Some(member) = &self.duplicate {
            return Some(DescriptorIssue::DuplicateMember {
                member: member.clone(),
            });
        }

        if self.style == DescriptorStyle::Interface {
            return None;
        }

        for member in &self.members {
            if member.kind == MemberKind::Method {
                return Some(DescriptorIssue::MethodInCopy {
                    member: member.name.clone(),
                });
            }

            let copyable = match &member.ty {
                TypeRef::Primitive(..) => true,
                TypeRef::Duck(nested) => nested.is_copy(),
                _ => false,
            };

            if !copyable {
                return Some(DescriptorIssue::NotCopyable {
                    member: member.name.clone(),
                    ty: CompactString::from(member.ty.to_string()),
                });
            }
        }

        None
    }
}

/// A builder of the [Descriptor] object.
///
/// Created by the [Descriptor::interface] and [Descriptor::copy] functions.
pub struct DescriptorBuilder {
    name: CompactString,
    style: DescriptorStyle,
    members: Vec<DescriptorMember>,
}

impl DescriptorBuilder {
    #[inline(always)]
    fn new(name: CompactString, style: DescriptorStyle) -> Self {
        Self {
            name,
            style,
            members: Vec::new(),
        }
    }

    /// Appends a member to the descriptor's member list.
    #[inline(always)]
    pub fn member(mut self, member: DescriptorMember) -> Self {
        self.members.push(member);

        self
    }

    /// Finishes a public descriptor without a declaration site.
    #[inline(always)]
    pub fn build(self) -> Descriptor {
        self.finish(Visibility::Public, RustOrigin::nil())
    }

    /// Finishes a descriptor declared at `origin` with the item visibility
    /// spelled as `visibility` in the Rust source code (e.g. `"pub"`,
    /// `"pub(crate)"`, or an empty string).
    ///
    /// This function is used by the [descriptor](crate::descriptor) macro.
    #[inline(always)]
    pub fn declare(self, visibility: &str, origin: &'static RustOrigin) -> Descriptor {
        self.finish(Visibility::from_token(visibility), origin)
    }

    fn finish(self, visibility: Visibility, origin: &'static RustOrigin) -> Descriptor {
        let mut index = AHashMap::with_capacity(self.members.len());
        let mut duplicate = None;

        for (slot, member) in self.members.iter().enumerate() {
            if index.insert(member.name.clone(), slot).is_some() && duplicate.is_none() {
                duplicate = Some(member.name.clone());
            }
        }

        Descriptor {
            name: self.name,
            style: self.style,
            visibility,
            origin,
            members: self.members,
            index,
            duplicate,
            issue: OnceLock::new(),
        }
    }
}

/// A single required member of a [Descriptor].
#[derive(Clone, Debug)]
pub struct DescriptorMember {
    name: CompactString,
    kind: MemberKind,
    ty: TypeRef,
    params: Vec<TypeRef>,
    binding: Option<CompactString>,
    owner: Option<Owner>,
    mutable: bool,
    ignore_case: bool,
}

impl PartialEq for DescriptorMember {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let mut visited = AHashSet::new();

        self.eq_in(other, &mut visited)
    }
}

impl Eq for DescriptorMember {}

impl Hash for DescriptorMember {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
        self.ty.hash(state);
        self.params.hash(state);
        self.binding.hash(state);
        self.owner.hash(state);
        self.mutable.hash(state);
        self.ignore_case.hash(state);
    }
}

impl DescriptorMember {
    /// Declares a property member of type `ty`.
    #[inline(always)]
    pub fn property(name: impl Into<CompactString>, ty: impl Into<TypeRef>) -> Self {
        Self::new(name.into(), MemberKind::Property, ty.into(), Vec::new())
    }

    /// Declares a field member of type `ty`.
    #[inline(always)]
    pub fn field(name: impl Into<CompactString>, ty: impl Into<TypeRef>) -> Self {
        Self::new(name.into(), MemberKind::Field, ty.into(), Vec::new())
    }

    /// Declares a method member with the specified parameter types and the
    /// output type.
    #[inline(always)]
    pub fn method(
        name: impl Into<CompactString>,
        params: impl IntoIterator<Item = TypeRef>,
        output: impl Into<TypeRef>,
    ) -> Self {
        Self::new(
            name.into(),
            MemberKind::Method,
            output.into(),
            params.into_iter().collect(),
        )
    }

    #[inline(always)]
    fn new(name: CompactString, kind: MemberKind, ty: TypeRef, params: Vec<TypeRef>) -> Self {
        Self {
            name,
            kind,
            ty,
            params,
            binding: None,
            owner: None,
            mutable: false,
            ignore_case: false,
        }
    }

    /// Requires write access to the member.
    ///
    /// An interface-style adapter fails to compile with
    /// [NotAssignable](crate::runtime::RuntimeError::NotAssignable) if the
    /// target member cannot be assigned.
    #[inline(always)]
    pub fn mutable(mut self) -> Self {
        self.mutable = true;

        self
    }

    /// Binds the member to a target member with a different name.
    #[inline(always)]
    pub fn bind(mut self, name: impl Into<CompactString>) -> Self {
        self.binding = Some(name.into());

        self
    }

    /// Restricts the lookup to an explicitly implemented contract of the
    /// target shape. The `"*"` owner matches any explicit contract.
    #[inline(always)]
    pub fn owner(mut self, owner: &str) -> Self {
        self.owner = Some(match owner {
            "*" => Owner::Any,
            name => Owner::Contract(CompactString::from(name)),
        });

        self
    }

    /// Makes the target member lookup case-insensitive. A candidate whose
    /// name matches exactly still takes precedence.
    #[inline(always)]
    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;

        self
    }

    /// The logical name of the member, by which proxies expose it.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// The declared type of the member. For methods, this is the output
    /// type.
    #[inline(always)]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// The declared parameter types. Always empty for fields and properties.
    #[inline(always)]
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    #[inline(always)]
    pub fn binding(&self) -> Option<&str> {
        self.binding.as_deref()
    }

    /// The name under which the member is looked up on the target shape:
    /// the [binding](Self::bind) name if specified, otherwise the logical
    /// name.
    #[inline(always)]
    pub fn lookup_name(&self) -> &str {
        self.binding.as_deref().unwrap_or(&self.name)
    }

    #[inline(always)]
    pub fn owner_qualifier(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    #[inline(always)]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    #[inline(always)]
    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    fn eq_in(&self, other: &Self, visited: &mut AHashSet<(usize, usize)>) -> bool {
        if self.name != other.name
            || self.kind != other.kind
            || self.binding != other.binding
            || self.owner != other.owner
            || self.mutable != other.mutable
            || self.ignore_case != other.ignore_case
            || self.params.len() != other.params.len()
        {
            return false;
        }

        if !self.ty.eq_in(&other.ty, visited) {
            return false;
        }

        self.params
            .iter()
            .zip(other.params.iter())
            .all(|(this, other)| this.eq_in(other, visited))
    }
}

/// A lazily initialized descriptor stored in static memory.
///
/// Declared by the [descriptor](crate::descriptor) macro. The descriptor is
/// built on first dereference, which allows descriptors to refer to each
/// other (and to themselves) through [TypeRef::Duck] before any of them is
/// built.
pub struct StaticDescriptor {
    inner: Lazy<Descriptor>,
}

impl Deref for StaticDescriptor {
    type Target = Descriptor;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.inner.deref()
    }
}

impl Debug for StaticDescriptor {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self.deref(), formatter)
    }
}

impl Display for StaticDescriptor {
    #[inline(always)]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.deref(), formatter)
    }
}

impl StaticDescriptor {
    /// Creates a static descriptor that will be built by the `init` function
    /// on first access.
    #[inline(always)]
    pub const fn new(init: fn() -> Descriptor) -> Self {
        Self {
            inner: Lazy::new(init),
        }
    }
}

/// Declares [static descriptors](StaticDescriptor).
///
/// Each item is a `static` whose initializer is a [DescriptorBuilder]
/// expression. The Rust visibility of the item becomes the descriptor's
/// [visibility](Visibility): only `pub` descriptors can be used for
/// adaptation.
///
/// ```
/// use tracer_duck::{
///     descriptor,
///     duck::{Descriptor, DescriptorMember, DescriptorStyle},
///     runtime::TypeRef,
/// };
///
/// descriptor! {
///     /// A live view over a command object.
///     pub static COMMAND = Descriptor::interface("Command")
///         .member(DescriptorMember::property("Text", TypeRef::STR))
///         .member(DescriptorMember::property("Timeout", TypeRef::I32).mutable())
///         .member(DescriptorMember::field("Connection", TypeRef::Duck(&CONNECTION))
///             .bind("_connection"));
///
///     pub static CONNECTION = Descriptor::copy("Connection")
///         .member(DescriptorMember::property("Database", TypeRef::STR));
/// }
///
/// assert_eq!(COMMAND.members().len(), 3);
/// assert_eq!(CONNECTION.style(), DescriptorStyle::Copy);
/// assert!(COMMAND.issue().is_none());
/// ```
#[macro_export]
macro_rules! descriptor {
    {
        $(
            $(#[$attr:meta])*
            $vis:vis static $ident:ident = $builder:expr;
        )*
    } => {
        $(
            $(#[$attr])*
            $vis static $ident: $crate::duck::StaticDescriptor =
                $crate::duck::StaticDescriptor::new(|| {
                    $crate::duck::DescriptorBuilder::declare(
                        $builder,
                        ::std::stringify!($vis),
                        $crate::origin!(),
                    )
                });
        )*
    };
}

/// The kind of proxies a [Descriptor] produces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DescriptorStyle {
    /// The proxy is a live wrapper: reads and writes pass through to the
    /// target object.
    Interface,

    /// The proxy is a value snapshot: every member is copied once when the
    /// proxy is created.
    Copy,
}

/// Whether a [Descriptor] can be referenced across crate boundaries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Visibility {
    Public,
    Restricted,
}

impl Visibility {
    /// Interprets the Rust visibility token of an item: `"pub"` is
    /// [Public](Self::Public), anything narrower (including `pub(crate)` and
    /// the empty token) is [Restricted](Self::Restricted).
    #[inline]
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "pub" => Self::Public,
            _ => Self::Restricted,
        }
    }
}

/// The kind of a descriptor member, and the kind of a target member it may
/// bind to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MemberKind {
    Property,
    Field,
    Method,
}

impl Display for MemberKind {
    #[inline]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Property => formatter.write_str("property"),
            Self::Field => formatter.write_str("field"),
            Self::Method => formatter.write_str("method"),
        }
    }
}

/// An explicit-owner qualifier of a [DescriptorMember].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Owner {
    /// Only the explicit contract with this name is searched.
    Contract(CompactString),

    /// Every explicit contract of the target shape is searched; more than one
    /// match is an ambiguity.
    Any,
}

impl Display for Owner {
    #[inline]
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contract(name) => formatter.write_str(name),
            Self::Any => formatter.write_str("*"),
        }
    }
}

/// A reason why a [Descriptor] cannot be used for adaptation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DescriptorIssue {
    /// The descriptor was not declared `pub`.
    NotPublic,

    /// Two members share the same logical name.
    DuplicateMember { member: CompactString },

    /// A copy-style descriptor declares a method.
    MethodInCopy { member: CompactString },

    /// A copy-style descriptor declares a member whose values would alias
    /// the target's mutable state.
    NotCopyable { member: CompactString, ty: CompactString },
}

impl Display for DescriptorIssue {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPublic => formatter.write_str("the descriptor is not public"),

            Self::DuplicateMember { member } => formatter.write_fmt(format_args!(
                "member \"{member}\" is declared more than once"
            )),

            Self::MethodInCopy { member } => formatter.write_fmt(format_args!(
                "copy-style descriptor declares method \"{member}\""
            )),

            Self::NotCopyable { member, ty } => formatter.write_fmt(format_args!(
                "copy-style member \"{member}\" has type {ty}, which cannot be copied"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        duck::{Descriptor, DescriptorIssue, DescriptorMember, DescriptorStyle, Visibility},
        runtime::TypeRef,
    };

    descriptor! {
        pub static FIRST = Descriptor::interface("First")
            .member(DescriptorMember::property("id", TypeRef::I64))
            .member(DescriptorMember::property("name", TypeRef::STR));

        pub static SECOND = Descriptor::interface("Second")
            .member(DescriptorMember::property("id", TypeRef::I64))
            .member(DescriptorMember::property("name", TypeRef::STR));

        pub static REORDERED = Descriptor::interface("Reordered")
            .member(DescriptorMember::property("name", TypeRef::STR))
            .member(DescriptorMember::property("id", TypeRef::I64));

        pub static LIST_A = Descriptor::interface("ListA")
            .member(DescriptorMember::property("value", TypeRef::I64))
            .member(DescriptorMember::property("next", TypeRef::Duck(&LIST_A)));

        pub static LIST_B = Descriptor::interface("ListB")
            .member(DescriptorMember::property("value", TypeRef::I64))
            .member(DescriptorMember::property("next", TypeRef::Duck(&LIST_B)));

        static HIDDEN = Descriptor::interface("Hidden");

        pub(crate) static CRATE_ONLY = Descriptor::interface("CrateOnly");

        pub(crate) static FIRST_RESTRICTED = Descriptor::interface("FirstRestricted")
            .member(DescriptorMember::property("id", TypeRef::I64))
            .member(DescriptorMember::property("name", TypeRef::STR));

        pub static HOLDER = Descriptor::interface("Holder")
            .member(DescriptorMember::property("first", TypeRef::Duck(&FIRST)));

        pub static RESTRICTED_HOLDER = Descriptor::interface("RestrictedHolder")
            .member(DescriptorMember::property("first", TypeRef::Duck(&FIRST_RESTRICTED)));

        pub static TWICE = Descriptor::interface("Twice")
            .member(DescriptorMember::property("id", TypeRef::I64))
            .member(DescriptorMember::field("id", TypeRef::I64));

        pub static COPY_WITH_METHOD = Descriptor::copy("CopyWithMethod")
            .member(DescriptorMember::method("run", [], TypeRef::Unit));

        pub static COPY_WITH_OBJECT = Descriptor::copy("CopyWithObject")
            .member(DescriptorMember::field("inner", TypeRef::Object));

        pub static COPY_WITH_LIVE = Descriptor::copy("CopyWithLive")
            .member(DescriptorMember::field("inner", TypeRef::Duck(&FIRST)));
    }

    #[test]
    fn test_structural_identity() {
        assert_eq!(*FIRST, *SECOND);
        assert_ne!(*FIRST, *REORDERED);
        assert_ne!(FIRST.name(), SECOND.name());
    }

    #[test]
    fn test_cyclic_identity() {
        assert_eq!(*LIST_A, *LIST_B);
        assert_eq!(TypeRef::Duck(&LIST_A), TypeRef::Duck(&LIST_B));
        assert_ne!(TypeRef::Duck(&LIST_A), TypeRef::Duck(&FIRST));
    }

    #[test]
    fn test_visibility() {
        assert_eq!(FIRST.visibility(), Visibility::Public);
        assert_eq!(HIDDEN.visibility(), Visibility::Restricted);
        assert_eq!(CRATE_ONLY.visibility(), Visibility::Restricted);
        assert_eq!(HIDDEN.issue(), Some(&DescriptorIssue::NotPublic));
        assert!(!FIRST.origin().is_nil());
    }

    #[test]
    fn test_visibility_identity() {
        assert_ne!(*FIRST, *FIRST_RESTRICTED);
        assert_ne!(*HOLDER, *RESTRICTED_HOLDER);
        assert_ne!(
            TypeRef::Duck(&FIRST),
            TypeRef::Duck(&FIRST_RESTRICTED),
        );
        assert!(HOLDER.issue().is_none());
        assert!(RESTRICTED_HOLDER.issue().is_none());
    }

    #[test]
    fn test_validation() {
        assert!(FIRST.issue().is_none());
        assert!(LIST_A.issue().is_none());

        assert!(matches!(
            TWICE.issue(),
            Some(DescriptorIssue::DuplicateMember { member }) if *member == "id",
        ));

        assert!(matches!(
            COPY_WITH_METHOD.issue(),
            Some(DescriptorIssue::MethodInCopy { .. }),
        ));

        assert!(matches!(
            COPY_WITH_OBJECT.issue(),
            Some(DescriptorIssue::NotCopyable { .. }),
        ));

        assert!(matches!(
            COPY_WITH_LIVE.issue(),
            Some(DescriptorIssue::NotCopyable { .. }),
        ));
    }

    #[test]
    fn test_member_lookup() {
        let (index, member) = SECOND.member("name").unwrap();

        assert_eq!(index, 1);
        assert_eq!(member.ty(), &TypeRef::STR);
        assert_eq!(member.lookup_name(), "name");
        assert!(SECOND.member("missing").is_none());
        assert_eq!(SECOND.style(), DescriptorStyle::Interface);
    }
}
