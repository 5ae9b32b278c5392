// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use lz4_flex::frame::FrameEncoder;
use prost::Message;
use std::io::Write;

/// Profile documents compress very well; even small ones start a few KiB, so
/// skip the first rounds of buffer doubling.
const INITIAL_BUFFER_SIZE: usize = 32 * 1024;

/// Encodes the finished document and wraps it in an LZ4 frame.
pub fn compress_document(document: &crate::pprof::Profile) -> anyhow::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(INITIAL_BUFFER_SIZE);
    document.encode(&mut buffer)?;

    let mut zipper = FrameEncoder::new(Vec::with_capacity(buffer.len() / 2));
    zipper.write_all(&buffer)?;
    Ok(zipper.finish()?)
}
