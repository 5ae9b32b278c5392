// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::internal::{FullError, LocationId, Profile};

/// Native symbol resolution capability, injected into the ingesting calls so
/// several builders in one process can share one cache (or use distinct
/// ones) without global state.
///
/// Implementations may return a placeholder location pointing at an unknown
/// function when symbol information is unavailable; they should not fail the
/// whole ingestion for a single unresolvable address.
pub trait FrameCache {
    /// Resolves `address` to a location, interning the result through
    /// `profile`. Called once per eligible frame.
    fn location(&mut self, address: u64, profile: &mut Profile) -> Result<LocationId, FullError>;

    /// Human-readable function name for the frame at `address`, used by the
    /// frame-skip deny list.
    fn function_name(&mut self, address: u64) -> String;
}
