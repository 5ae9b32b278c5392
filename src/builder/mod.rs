// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns raw sampled traces into a finished profile document: applies the
//! frame-skip policy, resolves frames to interned locations, aggregates
//! (stack, labels) occurrences, and shapes the totals on the way out.

mod frame_cache;
mod method_cache;

pub use frame_cache::*;
pub use method_cache::*;

use crate::api;
use crate::internal::{LocationId, Profile, Upscaling};
use crate::pprof;
use crate::serializer;
use std::time::{Duration, SystemTime};

/// Function name given to a managed frame whose metadata cannot be resolved.
pub const UNKNOWN_METHOD: &str = "[unknown method]";

/// Function name given to a native frame when no frame cache is configured.
pub const UNKNOWN_NATIVE_METHOD: &str = "[unknown native method]";

/// Fixed configuration of one profiling window. Construct with one of the
/// shape constructors and adjust the public fields as needed before handing
/// it to [ProfileBuilder::new].
pub struct BuilderConfig<'a> {
    /// First sample type: how many events each sample stands for.
    pub count_type: api::ValueType<'a>,
    /// Second sample type: the metric accumulated over those events.
    pub metric_type: api::ValueType<'a>,
    /// Collection duration, stamped on the document. None lets finalization
    /// derive it from the wall clock.
    pub duration: Option<Duration>,
    /// Average sampling distance (or period) of the producing sampler.
    pub sampling_rate: i64,
    /// Recorded as the document's period; not every shape has one.
    pub period: Option<i64>,
    /// How totals are projected when the document is built.
    pub upscaling: Upscaling,
    /// Strip the leading run of native frames from every trace.
    pub skip_top_native_frames: bool,
    /// Resolved function names to strip from the top of every trace, e.g.
    /// profiler-internal trampolines.
    pub skip_frames: Vec<String>,
    pub default_sample_type: Option<&'a str>,
    /// Start of the collection window; None means now.
    pub start_time: Option<SystemTime>,
}

impl<'a> BuilderConfig<'a> {
    /// CPU shape: totals are emitted as accumulated.
    pub fn cpu(duration: Duration, sampling_rate: i64) -> Self {
        Self {
            count_type: api::ValueType::new("samples", "count"),
            metric_type: api::ValueType::new("cpu", "nanoseconds"),
            duration: Some(duration),
            sampling_rate,
            period: Some(sampling_rate),
            upscaling: Upscaling::None,
            skip_top_native_frames: false,
            skip_frames: vec![],
            default_sample_type: None,
            start_time: None,
        }
    }

    /// Heap shape: totals are corrected for size-weighted Poisson sampling.
    pub fn heap(sampling_rate: i64) -> Self {
        Self {
            count_type: api::ValueType::new("inuse_objects", "count"),
            metric_type: api::ValueType::new("inuse_space", "bytes"),
            duration: None,
            sampling_rate,
            period: None,
            upscaling: Upscaling::Poisson {
                sampling_distance: sampling_rate,
            },
            skip_top_native_frames: false,
            skip_frames: vec![],
            default_sample_type: None,
            start_time: None,
        }
    }

    /// Contention shape: sampled delay events are projected to estimated
    /// total delay by multiplying every sample's totals by the sampling
    /// rate.
    pub fn contention(duration: Duration, sampling_rate: i64) -> Self {
        Self {
            count_type: api::ValueType::new("contentions", "count"),
            metric_type: api::ValueType::new("delay", "microseconds"),
            duration: Some(duration),
            sampling_rate,
            period: Some(sampling_rate),
            upscaling: Upscaling::Proportional {
                scale: sampling_rate as f64,
            },
            skip_top_native_frames: false,
            skip_frames: vec![],
            default_sample_type: Some("delay"),
            start_time: None,
        }
    }
}

/// A finished, compressed document plus the window it covers.
pub struct EncodedProfile {
    pub start: SystemTime,
    pub end: SystemTime,
    pub buffer: Vec<u8>,
}

/// Builds one profile document for one collection window.
///
/// A builder is driven by a single collection pass: it is not Sync, and its
/// interning tables, method cache and aggregator live exactly as long as it
/// does. Finalization ([ProfileBuilder::build] or
/// [ProfileBuilder::serialize]) consumes the builder, so further ingestion
/// after it is a compile error.
pub struct ProfileBuilder {
    duration: Option<Duration>,
    methods: MethodCache,
    profile: Profile,
    skip_frames: Vec<String>,
    skip_top_native_frames: bool,
    upscaling: Upscaling,
}

impl ProfileBuilder {
    /// The resolver may be None, in which case every managed frame renders
    /// as [UNKNOWN_METHOD].
    pub fn new(config: BuilderConfig, resolver: Option<Box<dyn MethodResolver>>) -> Self {
        let sample_types = [config.count_type, config.metric_type];
        let period = config.period.map(|value| api::Period {
            r#type: config.metric_type,
            value,
        });
        let profile = Profile::new(
            config.start_time.unwrap_or_else(SystemTime::now),
            &sample_types,
            period,
            config.default_sample_type,
        );

        Self {
            duration: config.duration,
            methods: MethodCache::new(resolver),
            profile,
            skip_frames: config.skip_frames,
            skip_top_native_frames: config.skip_top_native_frames,
            upscaling: config.upscaling,
        }
    }

    pub fn for_cpu(
        duration: Duration,
        sampling_rate: i64,
        resolver: Option<Box<dyn MethodResolver>>,
    ) -> Self {
        Self::new(BuilderConfig::cpu(duration, sampling_rate), resolver)
    }

    pub fn for_heap(sampling_rate: i64, resolver: Option<Box<dyn MethodResolver>>) -> Self {
        Self::new(BuilderConfig::heap(sampling_rate), resolver)
    }

    pub fn for_contention(
        duration: Duration,
        sampling_rate: i64,
        resolver: Option<Box<dyn MethodResolver>>,
    ) -> Self {
        Self::new(BuilderConfig::contention(duration, sampling_rate), resolver)
    }

    /// Ingests traces, counting each occurrence once. The trace buffers are
    /// only borrowed for the duration of the call.
    pub fn add_traces(
        &mut self,
        traces: &[api::Trace],
        mut frame_cache: Option<&mut (dyn FrameCache + '_)>,
    ) -> anyhow::Result<()> {
        for trace in traces {
            self.add_trace(trace, 1, frame_cache.as_deref_mut())?;
        }
        Ok(())
    }

    /// Ingests traces with an explicit occurrence count per trace. The
    /// arrays must be parallel; a length mismatch is a caller-contract
    /// violation and fails the whole call.
    pub fn add_traces_with_counts(
        &mut self,
        traces: &[api::Trace],
        counts: &[i32],
        mut frame_cache: Option<&mut (dyn FrameCache + '_)>,
    ) -> anyhow::Result<()> {
        anyhow::ensure!(
            traces.len() == counts.len(),
            "expected one count per trace, got {} traces and {} counts",
            traces.len(),
            counts.len(),
        );

        for (trace, count) in traces.iter().zip(counts) {
            self.add_trace(trace, i64::from(*count), frame_cache.as_deref_mut())?;
        }
        Ok(())
    }

    /// Injects a synthetic single-frame sample representing work that is not
    /// attributed to a sampled stack, such as GC or JIT activity. The metric
    /// is `count * sampling_rate`; symbolization is bypassed entirely.
    pub fn add_artificial_trace(
        &mut self,
        name: &str,
        count: i64,
        sampling_rate: i64,
    ) -> anyhow::Result<()> {
        let location = self.profile.location_for("", name, "", 0, 0, 0)?;
        let labels = self.profile.label_set_for(&[])?;
        self.profile
            .observe(vec![location], labels, count, count * sampling_rate)?;
        Ok(())
    }

    /// Finalizes the document: applies the configured upscaling to every
    /// sample and flattens the interning tables into the container format.
    pub fn build(self) -> anyhow::Result<pprof::Profile> {
        self.profile.into_pprof(None, self.duration, &self.upscaling)
    }

    /// Like [ProfileBuilder::build], but also encodes and compresses the
    /// document.
    pub fn serialize(self, end_time: Option<SystemTime>) -> anyhow::Result<EncodedProfile> {
        let end = end_time.unwrap_or_else(SystemTime::now);
        let start = self.profile.start_time();
        let document = self
            .profile
            .into_pprof(Some(end), self.duration, &self.upscaling)?;
        let buffer = serializer::compress_document(&document)?;
        Ok(EncodedProfile { start, end, buffer })
    }

    fn add_trace(
        &mut self,
        trace: &api::Trace,
        count: i64,
        mut frame_cache: Option<&mut (dyn FrameCache + '_)>,
    ) -> anyhow::Result<()> {
        let skip = self.leading_frames_to_skip(trace.frames, frame_cache.as_deref_mut());

        let mut locations = Vec::with_capacity(trace.frames.len() - skip);
        for frame in &trace.frames[skip..] {
            let location = match frame {
                api::Frame::Managed { method_id, line } => {
                    self.managed_location(*method_id, *line)?
                }
                api::Frame::Native { address } => match frame_cache.as_deref_mut() {
                    Some(cache) => cache.location(*address, &mut self.profile)?,
                    None => {
                        self.profile
                            .location_for("", UNKNOWN_NATIVE_METHOD, "", 0, 0, *address)?
                    }
                },
            };
            locations.push(location);
        }

        let labels = self.profile.label_set_for(trace.labels)?;
        self.profile.observe(locations, labels, count, trace.value)?;
        Ok(())
    }

    fn managed_location(
        &mut self,
        method_id: api::MethodId,
        line: i64,
    ) -> anyhow::Result<LocationId> {
        let id = match self.methods.method(method_id) {
            Some(meta) => {
                let line = meta.source_line(line);
                self.profile.location_for(
                    &meta.class_name,
                    &meta.name,
                    &meta.filename,
                    meta.start_line,
                    line,
                    0,
                )?
            }
            None => self.profile.location_for("", UNKNOWN_METHOD, "", 0, 0, 0)?,
        };
        Ok(id)
    }

    /// How many frames to drop from the top of the trace. A leading frame is
    /// dropped while it is native (when stripping is enabled) or while its
    /// resolved name is deny-listed; the first frame matching neither stops
    /// the scan, so interior frames are never dropped.
    fn leading_frames_to_skip(
        &mut self,
        frames: &[api::Frame],
        mut frame_cache: Option<&mut (dyn FrameCache + '_)>,
    ) -> usize {
        let mut skipped = 0;
        for frame in frames {
            if self.skip_top_native_frames && frame.is_native() {
                skipped += 1;
                continue;
            }
            if !self.skip_frames.is_empty() {
                let name = self.frame_name(frame, frame_cache.as_deref_mut());
                if self.skip_frames.iter().any(|deny| *deny == name) {
                    skipped += 1;
                    continue;
                }
            }
            break;
        }
        skipped
    }

    /// The name the frame would resolve to, as matched by the deny list:
    /// the composed `Type.method` for managed frames, the frame cache's name
    /// for native ones, or the matching placeholder.
    fn frame_name(
        &mut self,
        frame: &api::Frame,
        frame_cache: Option<&mut (dyn FrameCache + '_)>,
    ) -> String {
        match frame {
            api::Frame::Managed { method_id, .. } => match self.methods.method(*method_id) {
                Some(meta) if meta.class_name.is_empty() => meta.name.to_string(),
                Some(meta) => format!("{}.{}", meta.class_name, meta.name),
                None => UNKNOWN_METHOD.to_string(),
            },
            api::Frame::Native { address } => match frame_cache {
                Some(cache) => cache.function_name(*address),
                None => UNKNOWN_NATIVE_METHOD.to_string(),
            },
        }
    }
}
