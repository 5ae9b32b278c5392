// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::api;
use crate::collections::string_table::StringTable;
use anyhow::Context;
use std::time::{Duration, SystemTime};

/// Since ids are table offset + 1, take 1 off the ceiling. Every table is
/// capped at the 32-bit id space of the container format; we're gathering way
/// too much data if we ever exceed this in a single profile.
const CONTAINER_MAX: usize = (u32::MAX - 1) as usize;

/// One of the interning tables has reached the id space of the container
/// format; the document cannot absorb more distinct entries.
#[derive(Clone, Copy, Debug, thiserror::Error)]
#[error("profile interning table is full")]
pub struct FullError;

/// The deduplicated document under construction. Owns every interning table;
/// the size of the finished document is proportional to the number of
/// distinct symbols and stacks, not the number of sampled frames.
pub struct Profile {
    default_sample_type: StringId,
    functions: FxIndexSet<Function>,
    labels: FxIndexSet<Label>,
    label_sets: FxIndexSet<LabelSet>,
    locations: FxIndexSet<Location>,
    period: Option<(i64, ValueType)>,
    sample_types: Vec<ValueType>,
    samples: FxIndexMap<Sample, Observation>,
    stack_traces: FxIndexSet<StackTrace>,
    start_time: SystemTime,
    strings: StringTable,
}

impl Profile {
    /// Creates a profile with `start_time`. The string table is initialized
    /// to hold the empty string at offset 0.
    pub fn new(
        start_time: SystemTime,
        sample_types: &[api::ValueType],
        period: Option<api::Period>,
        default_sample_type: Option<&str>,
    ) -> Self {
        let mut profile = Self {
            default_sample_type: StringId::ZERO,
            functions: Default::default(),
            labels: Default::default(),
            label_sets: Default::default(),
            locations: Default::default(),
            period: None,
            sample_types: vec![],
            samples: Default::default(),
            stack_traces: Default::default(),
            start_time,
            strings: StringTable::new(),
        };

        profile.sample_types = sample_types
            .iter()
            .map(|vt| ValueType {
                r#type: profile.strings.intern(vt.r#type),
                unit: profile.strings.intern(vt.unit),
            })
            .collect();

        if let Some(period) = period {
            profile.period = Some((
                period.value,
                ValueType {
                    r#type: profile.strings.intern(period.r#type.r#type),
                    unit: profile.strings.intern(period.r#type.unit),
                },
            ));
        }

        if let Some(default) = default_sample_type {
            profile.default_sample_type = profile.strings.intern(default);
        }

        profile
    }

    /// Returns an existing or new location for the given resolved frame
    /// data, registering the backing function on first sight. Identical
    /// inputs always yield the same id within one build.
    pub fn location_for(
        &mut self,
        class_name: &str,
        function_name: &str,
        filename: &str,
        start_line: i64,
        line: i64,
        address: u64,
    ) -> Result<LocationId, FullError> {
        self.check_capacity()?;

        let name = if class_name.is_empty() {
            self.strings.intern(function_name)
        } else {
            let composed = format!("{class_name}.{function_name}");
            self.strings.intern(&composed)
        };
        let system_name = self.strings.intern(function_name);
        let filename = self.strings.intern(filename);

        let function_id = self.functions.dedup(Function {
            name,
            system_name,
            filename,
            start_line,
        });

        Ok(self.locations.dedup(Location {
            function_id,
            line,
            address,
        }))
    }

    /// Interns the labels and returns the id of their canonical set. Label
    /// order on the trace does not affect the id, and duplicate (key, value)
    /// pairs collapse.
    pub(crate) fn label_set_for(&mut self, labels: &[api::Label]) -> Result<LabelSetId, FullError> {
        self.check_capacity()?;

        let labels: Vec<_> = labels
            .iter()
            .map(|label| {
                let key = self.strings.intern(label.key);
                let internal_label = if let Some(s) = label.str {
                    let str = self.strings.intern(s);
                    Label::str(key, str)
                } else {
                    let num = label.num;
                    let num_unit = label.num_unit.map(|s| self.strings.intern(s));
                    Label::num(key, num, num_unit)
                };

                self.labels.dedup(internal_label)
            })
            .collect();

        Ok(self.label_sets.dedup(LabelSet::new(labels)))
    }

    /// Merges `(count, metric)` into the sample keyed by the resolved stack
    /// and label set, creating it on first sight. The sample list grows by
    /// at most one entry per distinct key.
    pub(crate) fn observe(
        &mut self,
        locations: Vec<LocationId>,
        labels: LabelSetId,
        count: i64,
        metric: i64,
    ) -> Result<(), FullError> {
        if self.samples.len() >= CONTAINER_MAX || self.stack_traces.len() >= CONTAINER_MAX {
            return Err(FullError);
        }

        let stacktrace = self.stack_traces.dedup(StackTrace { locations });
        self.samples
            .entry(Sample::new(labels, stacktrace))
            .or_default()
            .observe(count, metric);
        Ok(())
    }

    /// Flattens the interning tables into the container format, applying the
    /// upscaling pass to every sample's totals on the way out. Consuming the
    /// profile is what makes finalization a one-way transition.
    pub(crate) fn into_pprof(
        self,
        end_time: Option<SystemTime>,
        duration: Option<Duration>,
        upscaling: &Upscaling,
    ) -> anyhow::Result<pprof::Profile> {
        let end = end_time.unwrap_or_else(SystemTime::now);
        let start = self.start_time;
        let duration_nanos = duration
            .unwrap_or_else(|| {
                end.duration_since(start).unwrap_or_else(|_| {
                    log::warn!("profile end time is before its start time; emitting zero duration");
                    Duration::ZERO
                })
            })
            .as_nanos()
            .min(i64::MAX as u128) as i64;

        let (period, period_type) = match self.period {
            Some((value, vt)) => (value, Some(vt.into())),
            None => (0, None),
        };

        let samples: Vec<pprof::Sample> = self
            .samples
            .iter()
            .map(|(sample, observation)| {
                let location_ids = self
                    .get_stacktrace(sample.stacktrace)?
                    .locations
                    .iter()
                    .map(Id::to_raw_id)
                    .collect();
                let labels = self
                    .get_label_set(sample.labels)?
                    .iter()
                    .map(|id| self.get_label(*id).map(pprof::Label::from))
                    .collect::<anyhow::Result<Vec<_>>>()?;

                let scale = upscaling.compute_scale(observation.count, observation.metric);
                let values = vec![
                    (observation.count as f64 * scale).round() as i64,
                    (observation.metric as f64 * scale).round() as i64,
                ];

                Ok(pprof::Sample {
                    location_ids,
                    values,
                    labels,
                })
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(pprof::Profile {
            sample_types: self.sample_types.iter().map(|vt| (*vt).into()).collect(),
            samples,
            locations: self
                .locations
                .iter()
                .enumerate()
                .map(|(offset, location)| location.to_pprof(LocationId::from_offset(offset)))
                .collect(),
            functions: self
                .functions
                .iter()
                .enumerate()
                .map(|(offset, function)| function.to_pprof(FunctionId::from_offset(offset)))
                .collect(),
            string_table: self.strings.into_vec(),
            time_nanos: start
                .duration_since(SystemTime::UNIX_EPOCH)
                .map_or(0, |duration| duration.as_nanos().min(i64::MAX as u128) as i64),
            duration_nanos,
            period_type,
            period,
            default_sample_type: self.default_sample_type.to_raw_id(),
        })
    }

    pub fn get_string(&self, id: StringId) -> Option<&str> {
        self.strings.get(id)
    }

    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    fn check_capacity(&self) -> Result<(), FullError> {
        if self.strings.len() >= CONTAINER_MAX
            || self.functions.len() >= CONTAINER_MAX
            || self.locations.len() >= CONTAINER_MAX
            || self.labels.len() >= CONTAINER_MAX
            || self.label_sets.len() >= CONTAINER_MAX
        {
            return Err(FullError);
        }
        Ok(())
    }

    fn get_label(&self, id: LabelId) -> anyhow::Result<&Label> {
        self.labels
            .get_index(id.to_offset())
            .context("LabelId to have a valid interned index")
    }

    fn get_label_set(&self, id: LabelSetId) -> anyhow::Result<&LabelSet> {
        self.label_sets
            .get_index(id.to_offset())
            .context("LabelSetId to have a valid interned index")
    }

    fn get_stacktrace(&self, st: StackTraceId) -> anyhow::Result<&StackTrace> {
        self.stack_traces
            .get_index(st.to_offset())
            .with_context(|| format!("StackTraceId {st:?} to exist in profile"))
    }
}

/// For testing and debugging purposes
#[cfg(test)]
impl Profile {
    pub(crate) fn aggregated_samples_count(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn functions_count(&self) -> usize {
        self.functions.len()
    }

    pub(crate) fn locations_count(&self) -> usize {
        self.locations.len()
    }

    pub(crate) fn interned_strings_count(&self) -> usize {
        self.strings.len()
    }
}
