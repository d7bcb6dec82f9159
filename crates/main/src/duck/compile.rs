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
use log::{debug, warn};

use crate::{
    duck::{
        compat::{flows_into, read_strategy},
        resolve::{MemberResolver, MemberSource, Resolution, Target},
        AccessStrategy,
        Descriptor,
        DescriptorMember,
        DescriptorStyle,
        MemberKind,
        StaticDescriptor,
        DUCK_LOG,
    },
    runtime::{Getter, MethodBody, Primitive, RuntimeError, RuntimeResult, Setter, Shape, TypeRef},
};

/// The access plan of a (target [Shape], [Descriptor]) pair.
///
/// A CompiledAdapter is produced once per pair by the
/// [adapter cache](crate::duck::AdapterCache) and shared by every
/// [Proxy](crate::duck::Proxy) of that pair. Once compiled, the adapter
/// never changes, and accessing the target through it never performs member
/// lookups again.
pub struct CompiledAdapter {
    shape: Arc<Shape>,
    descriptor: &'static StaticDescriptor,
    table: StrategyTable,
    accessors: Vec<Accessor>,
    layout: Option<CopyLayout>,
}

impl Debug for CompiledAdapter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CompiledAdapter")
            .field("shape", &format_args!("{}", self.shape))
            .field("descriptor", &self.descriptor.name())
            .field("table", &self.table)
            .field("layout", &self.layout)
            .finish()
    }
}

impl CompiledAdapter {
    /// Compiles the adapter of the `shape` to the `descriptor` without
    /// consulting the [adapter cache](crate::duck::AdapterCache).
    ///
    /// The compilation is deterministic: compiling the same pair again
    /// produces an equal [strategy table](Self::table) or the same error.
    ///
    /// Nested descriptors are not compiled here. They are compiled on demand
    /// when a proxy reads a chained member.
    pub fn compile(shape: &Arc<Shape>, descriptor: &'static StaticDescriptor) -> RuntimeResult<Self> {
        match Self::compile_members(shape, descriptor) {
            Ok(adapter) => {
                debug!(
                    target: DUCK_LOG,
                    "Adapter {shape} => \"{}\" compiled ({} member(s)).",
                    descriptor.name(),
                    adapter.table.plans.len(),
                );

                Ok(adapter)
            }

            Err(error) => {
                warn!(
                    target: DUCK_LOG,
                    "Adapter {shape} => \"{}\" failed: {error}",
                    descriptor.name(),
                );

                Err(error)
            }
        }
    }

    #[inline(always)]
    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    /// The descriptor this adapter was compiled for.
    ///
    /// Structurally equal descriptors share one adapter, so this may be a
    /// different declaration than the one a caller passed to
    /// [adapt](crate::duck::adapt).
    #[inline(always)]
    pub fn descriptor(&self) -> &'static StaticDescriptor {
        self.descriptor
    }

    /// The per-member access plans in descriptor member order.
    #[inline(always)]
    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    /// The snapshot layout of a copy-style adapter, or None for an
    /// interface-style adapter.
    #[inline(always)]
    pub fn layout(&self) -> Option<&CopyLayout> {
        self.layout.as_ref()
    }

    #[inline(always)]
    pub(crate) fn plan(&self, index: usize) -> Option<(&MemberPlan, &Accessor)> {
        Some((self.table.plans.get(index)?, self.accessors.get(index)?))
    }

    fn compile_members(
        shape: &Arc<Shape>,
        descriptor: &'static StaticDescriptor,
    ) -> RuntimeResult<Self> {
        if let Some(issue) = descriptor.issue() {
            return Err(RuntimeError::InvalidDescriptor {
                descriptor: CompactString::from(descriptor.name()),
                origin: descriptor.origin(),
                issue: issue.clone(),
            });
        }

        let resolver = MemberResolver::new(shape, descriptor);
        let members = descriptor.members();

        let mut plans = Vec::with_capacity(members.len());
        let mut accessors = Vec::with_capacity(members.len());

        for member in members {
            let resolution = resolver.resolve(member)?;

            let planner = Planner {
                shape,
                descriptor,
                member,
            };

            let (plan, accessor) = planner.plan(resolution)?;

            plans.push(plan);
            accessors.push(accessor);
        }

        let layout = match descriptor.style() {
            DescriptorStyle::Interface => None,
            DescriptorStyle::Copy => Some(CopyLayout::of(members)),
        };

        Ok(Self {
            shape: shape.clone(),
            descriptor,
            table: StrategyTable { plans },
            accessors,
            layout,
        })
    }
}

/// The list of [MemberPlans](MemberPlan) of a [CompiledAdapter], one per
/// descriptor member, in descriptor order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct StrategyTable {
    plans: Vec<MemberPlan>,
}

impl StrategyTable {
    #[inline(always)]
    pub fn plans(&self) -> &[MemberPlan] {
        &self.plans
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// How one descriptor member is served by the target shape.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MemberPlan {
    member: CompactString,
    source: MemberSource,
    strategy: AccessStrategy,
    writable: bool,
}

impl MemberPlan {
    /// The logical name of the descriptor member.
    #[inline(always)]
    pub fn member(&self) -> &str {
        &self.member
    }

    /// The target member the descriptor member is bound to.
    #[inline(always)]
    pub fn source(&self) -> &MemberSource {
        &self.source
    }

    /// The read (or, for methods, the result) strategy.
    #[inline(always)]
    pub fn strategy(&self) -> AccessStrategy {
        self.strategy
    }

    /// Returns true if proxies can assign the member.
    #[inline(always)]
    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// The snapshot layout of a copy-style adapter: one slot per descriptor
/// member, in descriptor order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CopyLayout {
    slots: Vec<CopySlot>,
}

impl CopyLayout {
    #[inline(always)]
    pub fn slots(&self) -> &[CopySlot] {
        &self.slots
    }

    fn of(members: &[DescriptorMember]) -> Self {
        let slots = members
            .iter()
            .map(|member| match member.ty() {
                TypeRef::Primitive(primitive) => CopySlot::Value(*primitive),
                _ => CopySlot::Snapshot,
            })
            .collect();

        Self { slots }
    }
}

/// A single slot of a [CopyLayout].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CopySlot {
    /// A copied primitive value of the specified type.
    Value(Primitive),

    /// A nested copy-style snapshot, or nil.
    Snapshot,
}

pub(crate) enum Accessor {
    Field {
        slot: usize,
        ty: TypeRef,
    },

    Property {
        ty: TypeRef,
        getter: Option<Getter>,
        setter: Option<Setter>,
    },

    Method {
        params: Vec<TypeRef>,
        body: MethodBody,
    },
}

impl Accessor {
    // The type a written value must conform to.
    #[inline(always)]
    pub(crate) fn ty(&self) -> &TypeRef {
        match self {
            Self::Field { ty, .. } => ty,
            Self::Property { ty, .. } => ty,
            Self::Method { .. } => &TypeRef::Unit,
        }
    }
}

struct Planner<'a> {
    shape: &'a Arc<Shape>,
    descriptor: &'a Descriptor,
    member: &'a DescriptorMember,
}

impl<'a> Planner<'a> {
    fn plan(&self, resolution: Resolution<'_>) -> RuntimeResult<(MemberPlan, Accessor)> {
        let copy = self.descriptor.is_copy();
        let mutable = self.member.is_mutable() && !copy;

        let (strategy, accessor) = match resolution.target {
            Target::Field(meta) => {
                let strategy = self.read(meta.ty())?;

                if mutable {
                    if meta.is_readonly() {
                        return Err(self.not_assignable());
                    }

                    self.check_write(strategy, meta.ty())?;
                }

                let accessor = Accessor::Field {
                    slot: meta.slot(),
                    ty: *meta.ty(),
                };

                (strategy, accessor)
            }

            Target::Property(meta) => {
                if meta.getter().is_none() {
                    return Err(RuntimeError::NotReadable {
                        shape: CompactString::from(self.shape.to_string()),
                        descriptor: CompactString::from(self.descriptor.name()),
                        origin: self.descriptor.origin(),
                        member: CompactString::from(self.member.name()),
                    });
                }

                let strategy = self.read(meta.ty())?;

                if mutable {
                    if meta.setter().is_none() {
                        return Err(self.not_assignable());
                    }

                    self.check_write(strategy, meta.ty())?;
                }

                let accessor = Accessor::Property {
                    ty: *meta.ty(),
                    getter: meta.getter().cloned(),
                    setter: match mutable {
                        true => meta.setter().cloned(),
                        false => None,
                    },
                };

                (strategy, accessor)
            }

            Target::Method(meta) => {
                let strategy = match (self.member.ty(), meta.output()) {
                    (TypeRef::Unit, TypeRef::Unit) => AccessStrategy::Direct,
                    (TypeRef::Unit, _) => AccessStrategy::Discard,
                    _ => self.read(meta.output())?,
                };

                let accessor = Accessor::Method {
                    params: meta.params().to_vec(),
                    body: meta.body().clone(),
                };

                (strategy, accessor)
            }
        };

        let plan = MemberPlan {
            member: CompactString::from(self.member.name()),
            source: resolution.source,
            strategy,
            writable: mutable && self.member.kind() != MemberKind::Method,
        };

        Ok((plan, accessor))
    }

    fn read(&self, found: &TypeRef) -> RuntimeResult<AccessStrategy> {
        let expected = self.member.ty();

        let strategy = match read_strategy(found, expected) {
            Some(strategy) => strategy,
            None => return Err(self.incompatible(found)),
        };

        if let (AccessStrategy::Chain(..), TypeRef::Duck(nested)) = (strategy, expected) {
            if let Some(issue) = nested.issue() {
                return Err(RuntimeError::InvalidDescriptor {
                    descriptor: CompactString::from(nested.name()),
                    origin: nested.origin(),
                    issue: issue.clone(),
                });
            }
        }

        Ok(strategy)
    }

    // A chained member accepts objects of the target type on write. Any
    // other member must accept every value of the descriptor type.
    fn check_write(&self, strategy: AccessStrategy, target: &TypeRef) -> RuntimeResult<()> {
        if let AccessStrategy::Chain(..) = strategy {
            return Ok(());
        }

        match flows_into(self.member.ty(), target) {
            true => Ok(()),
            false => Err(self.incompatible(target)),
        }
    }

    fn incompatible(&self, found: &TypeRef) -> RuntimeError {
        RuntimeError::IncompatibleType {
            shape: CompactString::from(self.shape.to_string()),
            descriptor: CompactString::from(self.descriptor.name()),
            origin: self.descriptor.origin(),
            member: CompactString::from(self.member.name()),
            expected: CompactString::from(self.member.ty().to_string()),
            found: CompactString::from(found.to_string()),
        }
    }

    fn not_assignable(&self) -> RuntimeError {
        RuntimeError::NotAssignable {
            shape: CompactString::from(self.shape.to_string()),
            descriptor: CompactString::from(self.descriptor.name()),
            origin: self.descriptor.origin(),
            member: CompactString::from(self.member.name()),
        }
    }
}
