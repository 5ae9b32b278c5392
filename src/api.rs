// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Value types crossing the ingestion boundary. These borrow from the caller
//! and only need to outlive the call that consumes them.

/// Opaque identifier of a managed method, as handed out by the runtime. Ids
/// are only meaningful within one collection window; a builder never retains
/// them across builds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct MethodId(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct ValueType<'a> {
    pub r#type: &'a str,
    pub unit: &'a str,
}

impl<'a> ValueType<'a> {
    pub fn new(r#type: &'a str, unit: &'a str) -> Self {
        Self { r#type, unit }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Period<'a> {
    pub r#type: ValueType<'a>,
    pub value: i64,
}

/// One captured stack entry: either a call site in managed code or a raw
/// program-counter address in native code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Frame {
    Managed {
        method_id: MethodId,
        /// Raw code offset reported by the runtime; the method's line table
        /// maps it to a source line during resolution.
        line: i64,
    },
    Native {
        address: u64,
    },
}

impl Frame {
    #[inline]
    pub fn is_native(&self) -> bool {
        matches!(self, Frame::Native { .. })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct Label<'a> {
    pub key: &'a str,

    /// At most one of the following must be present.
    pub str: Option<&'a str>,
    pub num: i64,

    /// Should only be present when num is present.
    /// Specifies the units of num.
    pub num_unit: Option<&'a str>,
}

/// One captured call-stack sample together with its metric contribution.
#[derive(Copy, Clone, Debug)]
pub struct Trace<'a> {
    /// The leaf is at frames\[0\]. Order is preserved verbatim; ingestion may
    /// drop a leading run of frames but never reorders or removes interior
    /// ones.
    pub frames: &'a [Frame],
    pub labels: &'a [Label<'a>],
    /// Metric value carried by this occurrence of the stack, in the unit of
    /// the builder's metric sample type.
    pub value: i64,
}
