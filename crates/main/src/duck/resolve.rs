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

use compact_str::{format_compact, CompactString};

use crate::{
    duck::{
        closeness::closest,
        compat::{flows_into, is_exact},
        Descriptor,
        DescriptorMember,
        MemberKind,
        Owner,
    },
    runtime::{FieldMeta, MemberTable, MethodMeta, PropertyMeta, RuntimeError, RuntimeResult, Shape},
};

/// The location of a target member within its [Shape].
///
/// This is plain comparable data: two compilations of the same
/// (shape, descriptor) pair produce equal sources.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MemberSource {
    /// The explicit contract that declares the member, or None if the member
    /// belongs to the public surface.
    pub contract: Option<CompactString>,

    /// The kind of the target member.
    pub kind: MemberKind,

    /// The exact name of the target member.
    pub name: CompactString,

    /// The index of the member among the members of the same kind in its
    /// table.
    pub position: usize,
}

pub(crate) enum Target<'a> {
    Field(&'a FieldMeta),
    Property(&'a PropertyMeta),
    Method(&'a MethodMeta),
}

impl<'a> Target<'a> {
    #[inline(always)]
    fn name(&self) -> &'a str {
        match self {
            Self::Field(meta) => meta.name(),
            Self::Property(meta) => meta.name(),
            Self::Method(meta) => meta.name(),
        }
    }
}

pub(crate) struct Resolution<'a> {
    pub(crate) source: MemberSource,
    pub(crate) target: Target<'a>,
}

struct Candidate<'a> {
    contract: Option<&'a str>,
    position: usize,
    target: Target<'a>,
}

impl<'a> Candidate<'a> {
    fn describe(&self) -> CompactString {
        let name = match self.contract {
            Some(contract) => format_compact!("{contract}.{}", self.target.name()),
            None => CompactString::from(self.target.name()),
        };

        match &self.target {
            Target::Field(meta) => format_compact!("field {name}: {}", meta.ty()),
            Target::Property(meta) => format_compact!("property {name}: {}", meta.ty()),

            Target::Method(meta) => {
                let mut result = format_compact!("method {name}(");

                for (index, param) in meta.params().iter().enumerate() {
                    if index > 0 {
                        result.push_str(", ");
                    }

                    result.push_str(&param.to_string());
                }

                result.push_str(&format_compact!(") -> {}", meta.output()));

                result
            }
        }
    }

    fn into_resolution(self, kind: MemberKind) -> Resolution<'a> {
        Resolution {
            source: MemberSource {
                contract: self.contract.map(CompactString::from),
                kind,
                name: CompactString::from(self.target.name()),
                position: self.position,
            },
            target: self.target,
        }
    }
}

/// Finds the one target member that satisfies a descriptor member.
pub(crate) struct MemberResolver<'a> {
    shape: &'a Shape,
    descriptor: &'a Descriptor,
}

impl<'a> MemberResolver<'a> {
    #[inline(always)]
    pub(crate) fn new(shape: &'a Shape, descriptor: &'a Descriptor) -> Self {
        Self { shape, descriptor }
    }

    pub(crate) fn resolve(&self, member: &DescriptorMember) -> RuntimeResult<Resolution<'a>> {
        let lookup = member.lookup_name();
        let tables = self.tables(member);

        let mut exact = Vec::new();
        let mut folded = Vec::new();

        for (contract, table) in &tables {
            for candidate in Self::candidates(*contract, *table, member.kind()) {
                let name = candidate.target.name();

                if name == lookup {
                    exact.push(candidate);
                    continue;
                }

                if member.is_ignore_case() && eq_ignore_case(name, lookup) {
                    folded.push(candidate);
                }
            }
        }

        let mut candidates = match exact.is_empty() {
            true => folded,
            false => exact,
        };

        if member.kind() == MemberKind::Method {
            candidates = Self::select_overloads(member, candidates);
        }

        if candidates.len() > 1 {
            return Err(RuntimeError::AmbiguousMember {
                shape: self.shape_name(),
                descriptor: CompactString::from(self.descriptor.name()),
                origin: self.descriptor.origin(),
                member: CompactString::from(member.name()),
                candidates: candidates.iter().map(Candidate::describe).collect(),
            });
        }

        match candidates.pop() {
            Some(candidate) => Ok(candidate.into_resolution(member.kind())),
            None => Err(self.unresolved(member, &tables)),
        }
    }

    fn tables(&self, member: &DescriptorMember) -> Vec<(Option<&'a str>, &'a MemberTable)> {
        match member.owner_qualifier() {
            None => vec![(None, self.shape.surface())],

            Some(Owner::Contract(name)) => match self.shape.contract(name) {
                Some(contract) => vec![(Some(contract.name()), contract.table())],
                None => Vec::new(),
            },

            Some(Owner::Any) => self
                .shape
                .contracts()
                .iter()
                .map(|contract| (Some(contract.name()), contract.table()))
                .collect(),
        }
    }

    fn candidates(
        contract: Option<&'a str>,
        table: &'a MemberTable,
        kind: MemberKind,
    ) -> Vec<Candidate<'a>> {
        match kind {
            MemberKind::Field => table
                .fields()
                .iter()
                .enumerate()
                .map(|(position, meta)| Candidate {
                    contract,
                    position,
                    target: Target::Field(meta),
                })
                .collect(),

            MemberKind::Property => table
                .properties()
                .iter()
                .enumerate()
                .map(|(position, meta)| Candidate {
                    contract,
                    position,
                    target: Target::Property(meta),
                })
                .collect(),

            MemberKind::Method => table
                .methods()
                .iter()
                .enumerate()
                .map(|(position, meta)| Candidate {
                    contract,
                    position,
                    target: Target::Method(meta),
                })
                .collect(),
        }
    }

    // Keeps the overloads whose parameters accept the descriptor's parameter
    // types, and among them the ones with the most exactly matching
    // parameters.
    fn select_overloads<'c>(
        member: &DescriptorMember,
        candidates: Vec<Candidate<'c>>,
    ) -> Vec<Candidate<'c>> {
        let params = member.params();

        let mut best = Vec::new();
        let mut best_score = 0;

        for candidate in candidates {
            let meta = match &candidate.target {
                Target::Method(meta) => *meta,
                _ => continue,
            };

            if meta.params().len() != params.len() {
                continue;
            }

            let compatible = params
                .iter()
                .zip(meta.params())
                .all(|(descriptor, target)| flows_into(descriptor, target));

            if !compatible {
                continue;
            }

            let score = params
                .iter()
                .zip(meta.params())
                .filter(|(descriptor, target)| is_exact(descriptor, target))
                .count();

            if best.is_empty() || score > best_score {
                best.clear();
                best_score = score;
                best.push(candidate);
                continue;
            }

            if score == best_score {
                best.push(candidate);
            }
        }

        best
    }

    fn unresolved(
        &self,
        member: &DescriptorMember,
        tables: &[(Option<&'a str>, &'a MemberTable)],
    ) -> RuntimeError {
        let lookup = member.lookup_name();

        let names = tables
            .iter()
            .flat_map(|(contract, table)| Self::candidates(*contract, *table, member.kind()))
            .map(|candidate| candidate.target.name())
            .filter(|name| *name != lookup)
            .collect::<Vec<_>>();

        RuntimeError::UnresolvedMember {
            shape: self.shape_name(),
            descriptor: CompactString::from(self.descriptor.name()),
            origin: self.descriptor.origin(),
            member: CompactString::from(member.name()),
            kind: member.kind(),
            lookup: CompactString::from(lookup),
            suggestion: closest(lookup, names).map(CompactString::from),
        }
    }

    #[inline(always)]
    fn shape_name(&self) -> CompactString {
        CompactString::from(self.shape.to_string())
    }
}

#[inline]
fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}
