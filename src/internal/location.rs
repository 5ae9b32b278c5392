// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use std::hash::{Hash, Hasher};

/// Represents a [pprof::Location] with some space-saving changes:
///  - The id is not stored on the struct. It's stored in the container that holds the struct.
///  - We always use 1 Line per Location, so this is directly inlined into the struct.
///
/// Identity is (function, line) only: two frames whose addresses resolve to
/// the same function and line data collapse into one location, keeping the
/// first-seen address for output.
#[derive(Copy, Clone, Debug)]
pub struct Location {
    pub function_id: FunctionId,
    pub line: i64,
    pub address: u64,
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.function_id == other.function_id && self.line == other.line
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.function_id.hash(state);
        self.line.hash(state);
    }
}

impl Item for Location {
    type Id = LocationId;
}

impl Location {
    pub fn to_pprof(&self, id: LocationId) -> pprof::Location {
        pprof::Location {
            id: id.to_raw_id(),
            address: self.address,
            lines: vec![pprof::Line {
                function_id: self.function_id.to_raw_id(),
                line: self.line,
            }],
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct LocationId(NonZeroU32);

impl Id for LocationId {
    type RawId = u64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(small_non_zero_pprof_id(offset).expect("LocationId to fit into a u32"))
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.get().into()
    }
}
