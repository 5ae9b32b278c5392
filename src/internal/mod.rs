// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod function;
mod label;
mod location;
mod observation;
mod profile;
mod sample;
mod stack_trace;
mod upscaling;
mod value_type;

pub use function::*;
pub use label::*;
pub use location::*;
pub use observation::*;
pub use profile::*;
pub use sample::*;
pub use stack_trace::*;
pub use upscaling::*;
pub use value_type::*;

use crate::collections::identifiable::*;
use crate::pprof;
use std::num::NonZeroU32;
