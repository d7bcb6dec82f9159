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
    hash::{Hash, Hasher},
    ops::Deref,
    sync::{
        atomic::{AtomicU8, AtomicUsize, Ordering},
        Arc,
        OnceLock,
    },
};

use ahash::RandomState;
use lady_deirdre::sync::{Lazy, Table};
use log::trace;

use crate::{
    duck::{CompiledAdapter, StaticDescriptor, DUCK_LOG},
    report::system_panic,
    runtime::{RuntimeResult, Shape, ShapeId},
};

/// The process-wide memo of [compiled adapters](CompiledAdapter).
///
/// The cache maps a (target shape, descriptor) pair to the outcome of the
/// pair's compilation. Descriptors are compared structurally, so separately
/// declared descriptors with equal member lists share one entry.
///
/// Each entry is compiled at most once. Concurrent requesters of an entry
/// that is being compiled wait for the in-flight compilation and receive its
/// outcome. Failed compilations are cached as well: every subsequent request
/// fails immediately with the same error.
///
/// Entries are never evicted.
pub struct AdapterCache {
    table: Table<AdapterKey, Arc<AdapterEntry>, RandomState>,
}

impl AdapterCache {
    /// Returns the global cache instance.
    #[inline(always)]
    pub fn get() -> &'static Self {
        static CACHE: Lazy<AdapterCache> = Lazy::new(|| AdapterCache {
            table: Table::new(),
        });

        CACHE.deref()
    }

    /// Returns the adapter of the `shape` to the `descriptor`, compiling it
    /// on the first request.
    pub fn get_or_compile(
        &self,
        shape: &Arc<Shape>,
        descriptor: &'static StaticDescriptor,
    ) -> RuntimeResult<Arc<CompiledAdapter>> {
        let entry = self.entry(shape.id(), descriptor);

        let _ = entry.requests.fetch_add(1, Ordering::Relaxed);

        let outcome = entry.outcome.get_or_init(|| {
            entry.state.store(COMPILING, Ordering::Release);

            let _ = entry.compilations.fetch_add(1, Ordering::Relaxed);

            let outcome = CompiledAdapter::compile(shape, descriptor).map(Arc::new);

            let state = match &outcome {
                Ok(..) => READY,
                Err(..) => FAILED,
            };

            entry.state.store(state, Ordering::Release);

            outcome
        });

        outcome.clone()
    }

    /// Returns the compilation state of the (shape, descriptor) pair.
    pub fn state(&self, shape: ShapeId, descriptor: &'static StaticDescriptor) -> AdapterState {
        let Some(entry) = self.lookup(shape, descriptor) else {
            return AdapterState::Uninitialized;
        };

        match entry.state.load(Ordering::Acquire) {
            UNINITIALIZED => AdapterState::Uninitialized,
            COMPILING => AdapterState::Compiling,
            READY => AdapterState::Ready,
            FAILED => AdapterState::Failed,
            _ => system_panic!("Unknown adapter state."),
        }
    }

    /// Returns the request and compilation counters of the
    /// (shape, descriptor) pair.
    pub fn stats(&self, shape: ShapeId, descriptor: &'static StaticDescriptor) -> AdapterStats {
        let Some(entry) = self.lookup(shape, descriptor) else {
            return AdapterStats::default();
        };

        AdapterStats {
            requests: entry.requests.load(Ordering::Relaxed),
            compilations: entry.compilations.load(Ordering::Relaxed),
        }
    }

    /// Returns the number of cached pairs.
    pub fn len(&self) -> usize {
        self.table
            .shards()
            .iter()
            .map(|shard| shard.read().unwrap_or_else(|poison| poison.into_inner()).len())
            .sum()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(
        &self,
        shape: ShapeId,
        descriptor: &'static StaticDescriptor,
    ) -> Option<Arc<AdapterEntry>> {
        let key = AdapterKey { shape, descriptor };

        let shard = match self.table.shards().get(self.table.shard_index_of(&key)) {
            Some(shard) => shard,
            None => system_panic!("Adapter cache shard index out of bounds."),
        };

        let guard = shard.read().unwrap_or_else(|poison| poison.into_inner());

        guard.get(&key).cloned()
    }

    fn entry(&self, shape: ShapeId, descriptor: &'static StaticDescriptor) -> Arc<AdapterEntry> {
        if let Some(entry) = self.lookup(shape, descriptor) {
            return entry;
        }

        let key = AdapterKey { shape, descriptor };

        let shard = match self.table.shards().get(self.table.shard_index_of(&key)) {
            Some(shard) => shard,
            None => system_panic!("Adapter cache shard index out of bounds."),
        };

        let mut guard = shard.write().unwrap_or_else(|poison| poison.into_inner());

        // Another thread may have inserted the entry between the two locks.
        // The first inserted entry wins.
        guard
            .entry(key)
            .or_insert_with(|| {
                trace!(
                    target: DUCK_LOG,
                    "Adapter cache entry {shape} => \"{}\" created.",
                    descriptor.name(),
                );

                Arc::new(AdapterEntry::default())
            })
            .clone()
    }
}

/// The compilation state of a (shape, descriptor) pair in the
/// [AdapterCache].
///
/// The state only moves forward: `Uninitialized`, then `Compiling`, then
/// either `Ready` or `Failed`. Both final states are terminal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AdapterState {
    /// The pair has never been requested.
    Uninitialized,

    /// The pair's adapter is being compiled.
    Compiling,

    /// The adapter is compiled and shared by all proxies of the pair.
    Ready,

    /// The pair cannot be adapted. The error is cached.
    Failed,
}

/// Per-pair counters of the [AdapterCache].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct AdapterStats {
    /// The number of times the pair was requested from the cache.
    pub requests: usize,

    /// The number of times the pair's adapter was compiled. Never exceeds 1.
    pub compilations: usize,
}

const UNINITIALIZED: u8 = 0;
const COMPILING: u8 = 1;
const READY: u8 = 2;
const FAILED: u8 = 3;

#[derive(Default)]
struct AdapterEntry {
    state: AtomicU8,
    outcome: OnceLock<RuntimeResult<Arc<CompiledAdapter>>>,
    requests: AtomicUsize,
    compilations: AtomicUsize,
}

#[derive(Clone, Copy)]
struct AdapterKey {
    shape: ShapeId,
    descriptor: &'static StaticDescriptor,
}

impl PartialEq for AdapterKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.descriptor.deref() == other.descriptor.deref()
    }
}

impl Eq for AdapterKey {}

impl Hash for AdapterKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shape.hash(state);
        self.descriptor.deref().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use crate::{
        descriptor,
        duck::{AdapterCache, AdapterState, Descriptor, DescriptorMember},
        runtime::{Shape, TypeRef},
    };

    descriptor! {
        pub static SPAN = Descriptor::interface("Span")
            .member(DescriptorMember::field("trace_id", TypeRef::U64));

        pub static SPAN_AGAIN = Descriptor::interface("SpanAgain")
            .member(DescriptorMember::field("trace_id", TypeRef::U64));

        pub static BROKEN = Descriptor::interface("Broken")
            .member(DescriptorMember::field("parent_id", TypeRef::U64));
    }

    #[test]
    fn test_single_compilation() {
        let shape = Shape::build("Span").field("trace_id", TypeRef::U64).finish();
        let cache = AdapterCache::get();

        assert_eq!(cache.state(shape.id(), &SPAN), AdapterState::Uninitialized);

        let adapters = thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_compile(&shape, &SPAN).unwrap()))
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        for adapter in &adapters {
            assert!(Arc::ptr_eq(adapter, &adapters[0]));
        }

        let stats = cache.stats(shape.id(), &SPAN);

        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.requests, 8);
        assert_eq!(cache.state(shape.id(), &SPAN), AdapterState::Ready);
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_structural_sharing() {
        let shape = Shape::build("Span").field("trace_id", TypeRef::U64).finish();
        let cache = AdapterCache::get();

        let first = cache.get_or_compile(&shape, &SPAN).unwrap();
        let second = cache.get_or_compile(&shape, &SPAN_AGAIN).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(shape.id(), &SPAN_AGAIN).compilations, 1);
    }

    #[test]
    fn test_cached_failure() {
        let shape = Shape::build("Span").field("trace_id", TypeRef::U64).finish();
        let cache = AdapterCache::get();

        let first = cache.get_or_compile(&shape, &BROKEN).unwrap_err();
        let second = cache.get_or_compile(&shape, &BROKEN).unwrap_err();

        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(cache.state(shape.id(), &BROKEN), AdapterState::Failed);

        let stats = cache.stats(shape.id(), &BROKEN);

        assert_eq!(stats.compilations, 1);
        assert_eq!(stats.requests, 2);
    }
}
