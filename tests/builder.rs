// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use datadog_profile_builder::api::{Frame, Label, MethodId, Trace, ValueType};
use datadog_profile_builder::builder::{
    BuilderConfig, MethodMeta, MethodResolver, ProfileBuilder, ResolveError,
};
use datadog_profile_builder::pprof;
use lz4_flex::frame::FrameDecoder;
use prost::Message;
use std::collections::HashSet;
use std::io::Read;
use std::time::{Duration, SystemTime};

struct Resolver;

impl MethodResolver for Resolver {
    fn resolve(&mut self, method_id: MethodId) -> Result<MethodMeta, ResolveError> {
        if method_id.0 == 404 {
            return Err(ResolveError::ClassUnloaded(method_id));
        }
        Ok(MethodMeta {
            class_name: "com.example.Widget".into(),
            name: format!("m{}", method_id.0).into(),
            filename: "Widget.java".into(),
            start_line: method_id.0 as i64,
            line_table: Box::new([]),
        })
    }
}

fn managed(id: u64) -> Frame {
    Frame::Managed {
        method_id: MethodId(id),
        line: 0,
    }
}

#[test]
fn end_to_end_document_is_consistent() {
    let mut config = BuilderConfig::cpu(Duration::from_secs(60), 10_000_000);
    config.start_time = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000));
    let mut builder = ProfileBuilder::new(config, Some(Box::new(Resolver)));

    let hot_stack = [managed(1), managed(2), managed(3)];
    let cold_stack = [managed(4), managed(2), managed(3)];
    let stale_stack = [managed(404), managed(3)];
    let thread_label = [Label {
        key: "thread id",
        num: 1,
        ..Default::default()
    }];

    // The hot stack shows up many times and must stay a single sample.
    for _ in 0..100 {
        builder
            .add_traces(
                &[Trace {
                    frames: &hot_stack,
                    labels: &thread_label,
                    value: 10_000_000,
                }],
                None,
            )
            .unwrap();
    }
    builder
        .add_traces_with_counts(
            &[
                Trace {
                    frames: &cold_stack,
                    labels: &thread_label,
                    value: 10_000_000,
                },
                Trace {
                    frames: &stale_stack,
                    labels: &[],
                    value: 10_000_000,
                },
            ],
            &[2, 1],
            None,
        )
        .unwrap();
    builder.add_artificial_trace("GC", 3, 10_000_000).unwrap();

    let encoded = builder.serialize(None).unwrap();
    assert!(encoded.end >= encoded.start);

    let mut bytes = Vec::new();
    FrameDecoder::new(encoded.buffer.as_slice())
        .read_to_end(&mut bytes)
        .unwrap();
    let document = pprof::Profile::decode(bytes.as_slice()).unwrap();

    // Four distinct samples: hot, cold, stale, artificial.
    assert_eq!(4, document.samples.len());

    // 100 ingestions of the hot stack collapsed into one weighted sample.
    let hot = document
        .samples
        .iter()
        .find(|s| s.values == vec![100, 1_000_000_000])
        .expect("hot sample to exist");
    assert_eq!(3, hot.location_ids.len());

    // m2 and m3 are shared between the hot and cold stacks, m3 also with the
    // stale one: 1..=4 resolved + placeholder + GC = 6 functions.
    assert_eq!(6, document.functions.len());
    assert_eq!(6, document.locations.len());

    // Every reference in the document resolves.
    let location_ids: HashSet<u64> = document.locations.iter().map(|l| l.id).collect();
    let function_ids: HashSet<u64> = document.functions.iter().map(|f| f.id).collect();
    for sample in &document.samples {
        assert_eq!(2, sample.values.len());
        for id in &sample.location_ids {
            assert!(location_ids.contains(id));
        }
        for label in &sample.labels {
            assert!((label.key as usize) < document.string_table.len());
        }
    }
    for location in &document.locations {
        assert!(function_ids.contains(&location.lines[0].function_id));
    }
    for function in &document.functions {
        assert!((function.name as usize) < document.string_table.len());
        assert!((function.filename as usize) < document.string_table.len());
    }

    // Composed names made it into the string table.
    assert!(document
        .string_table
        .iter()
        .any(|s| s == "com.example.Widget.m1"));
    // The stale frame degraded to a placeholder instead of dropping the
    // trace.
    assert!(document.string_table.iter().any(|s| s == "[unknown method]"));
    assert!(document.string_table.iter().any(|s| s == "GC"));

    assert_eq!(1_700_000_000_000_000_000, document.time_nanos);
    assert_eq!(60_000_000_000, document.duration_nanos);
    assert_eq!(10_000_000, document.period);
}

#[test]
fn heap_document_projects_population_totals() {
    let mut builder = ProfileBuilder::for_heap(2048, Some(Box::new(Resolver)));

    let stack = [managed(1)];
    // 5 sampled allocations averaging 2048 bytes each.
    builder
        .add_traces_with_counts(
            &[Trace {
                frames: &stack,
                labels: &[],
                value: 10_240,
            }],
            &[5],
            None,
        )
        .unwrap();
    // A second callsite with small allocations, scaled up much harder.
    let small_stack = [managed(2)];
    builder
        .add_traces_with_counts(
            &[Trace {
                frames: &small_stack,
                labels: &[],
                value: 64,
            }],
            &[4],
            None,
        )
        .unwrap();

    let document = builder.build().unwrap();
    assert_eq!(2, document.samples.len());

    let ratio = 1_f64 / (1_f64 - (-1_f64).exp());
    let expected_count = (5_f64 * ratio).round() as i64;
    let expected_bytes = (10_240_f64 * ratio).round() as i64;
    assert!(document
        .samples
        .iter()
        .any(|s| s.values == vec![expected_count, expected_bytes]));

    // Average size 16 bytes under a 2 KiB sampling distance: the capture
    // probability is tiny, so the projected totals are two orders of
    // magnitude larger than the observed ones.
    let small = document
        .samples
        .iter()
        .find(|s| s.values[0] >= 500)
        .expect("small-allocation sample to be upscaled");
    assert!(small.values[1] > 8_000);

    // Heap documents have no period.
    assert_eq!(0, document.period);
    assert!(document.period_type.is_none());
}

#[test]
fn sample_types_describe_the_shape() {
    let builder = ProfileBuilder::new(
        BuilderConfig::contention(Duration::from_secs(30), 100),
        None,
    );
    let document = builder.build().unwrap();

    let types: Vec<(&str, &str)> = document
        .sample_types
        .iter()
        .map(|vt| {
            (
                document.string_table[vt.r#type as usize].as_str(),
                document.string_table[vt.unit as usize].as_str(),
            )
        })
        .collect();
    assert_eq!(
        vec![("contentions", "count"), ("delay", "microseconds")],
        types
    );
    assert_eq!(
        "delay",
        document.string_table[document.default_sample_type as usize]
    );

    // Custom shapes go through the same configuration surface.
    let mut config = BuilderConfig::cpu(Duration::from_secs(30), 100);
    config.count_type = ValueType::new("ticks", "count");
    config.metric_type = ValueType::new("wall", "nanoseconds");
    let document = ProfileBuilder::new(config, None).build().unwrap();
    assert_eq!(
        "ticks",
        document.string_table[document.sample_types[0].r#type as usize]
    );
}
