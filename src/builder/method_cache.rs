// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::api::MethodId;
use std::hash::BuildHasherDefault;

type FxHashMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;

/// One entry of a method's line table: the first code offset belonging to a
/// source line. Entries are sorted by offset.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineEntry {
    pub offset: i64,
    pub line: i64,
}

/// Resolved metadata for one managed method.
#[derive(Clone, Debug)]
pub struct MethodMeta {
    /// Declaring type, e.g. "com.example.Widget".
    pub class_name: Box<str>,
    pub name: Box<str>,
    pub filename: Box<str>,
    pub start_line: i64,
    pub line_table: Box<[LineEntry]>,
}

impl MethodMeta {
    /// Maps a raw code offset to a source line: the line of the greatest
    /// entry at or below `offset`. Offsets before the first entry map to the
    /// first entry's line; with no table at all the offset is passed through
    /// unchanged (the runtime already reported a line).
    pub fn source_line(&self, offset: i64) -> i64 {
        if self.line_table.is_empty() {
            return offset;
        }
        match self
            .line_table
            .binary_search_by(|entry| entry.offset.cmp(&offset))
        {
            Ok(index) => self.line_table[index].line,
            Err(0) => self.line_table[0].line,
            Err(index) => self.line_table[index - 1].line,
        }
    }
}

/// Resolution can legitimately fail when the owning type has been unloaded
/// between capture and resolution; the frame degrades to placeholder
/// metadata instead of aborting the trace.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("class owning method {0:?} has been unloaded")]
    ClassUnloaded(MethodId),
    #[error("failed to resolve method {0:?}: {1}")]
    Failed(MethodId, String),
}

/// The runtime-side resolver for managed-method metadata. Calls may be slow;
/// the cache in front of it guarantees at most one call per distinct id per
/// build.
pub trait MethodResolver {
    fn resolve(&mut self, method_id: MethodId) -> Result<MethodMeta, ResolveError>;
}

/// Per-build cache of method resolutions. Successes and failures are both
/// cached so an id is never re-queried within one build, no matter how many
/// frames reference it. The cache is dropped with its builder: ids are not
/// guaranteed stable across collection windows, so nothing is retained.
pub(crate) struct MethodCache {
    resolver: Option<Box<dyn MethodResolver>>,
    methods: FxHashMap<MethodId, Option<MethodMeta>>,
}

impl MethodCache {
    pub fn new(resolver: Option<Box<dyn MethodResolver>>) -> Self {
        Self {
            resolver,
            methods: FxHashMap::default(),
        }
    }

    /// Returns the cached metadata for `method_id`, resolving it on first
    /// sight. None means resolution failed (or no resolver is configured)
    /// and the frame should render with placeholder metadata.
    pub fn method(&mut self, method_id: MethodId) -> Option<&MethodMeta> {
        let resolver = &mut self.resolver;
        self.methods
            .entry(method_id)
            .or_insert_with(|| {
                let resolver = resolver.as_mut()?;
                match resolver.resolve(method_id) {
                    Ok(meta) => Some(meta),
                    Err(err) => {
                        log::debug!("rendering method as unknown: {err}");
                        None
                    }
                }
            })
            .as_ref()
    }
}
