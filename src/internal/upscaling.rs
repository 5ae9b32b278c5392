// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::sampling::sampling_ratio;

/// How a sample's accumulated totals are projected when the document is
/// built. One mode applies to every sample of a document.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Upscaling {
    /// Emit totals as accumulated.
    None,
    /// Correct for size-weighted Poisson sampling: each sample is scaled by
    /// the inverse capture probability of its own average event size.
    Poisson { sampling_distance: i64 },
    /// Multiply every sample's totals by a fixed scale.
    Proportional { scale: f64 },
}

impl Upscaling {
    pub fn compute_scale(&self, count: i64, metric: i64) -> f64 {
        match self {
            Upscaling::None => 1_f64,
            Upscaling::Poisson { sampling_distance } => {
                sampling_ratio(*sampling_distance, count, metric)
            }
            Upscaling::Proportional { scale } => *scale,
        }
    }
}
