// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod builder;
pub mod collections;
pub mod internal;
pub mod pprof;
pub mod sampling;
pub mod serializer;
