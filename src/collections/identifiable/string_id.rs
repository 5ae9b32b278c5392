// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::Id;

/// Offset of a string in the document's string table. The empty string is
/// always at offset 0, so a default-constructed id means "no string".
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StringId(u32);

impl StringId {
    pub const ZERO: StringId = StringId(0);

    #[inline]
    pub fn to_offset(&self) -> usize {
        self.0 as usize
    }
}

impl Id for StringId {
    type RawId = i64;

    fn from_offset(offset: usize) -> Self {
        #[allow(clippy::expect_used)]
        Self(offset.try_into().expect("StringId to fit into a u32"))
    }

    fn to_raw_id(&self) -> Self::RawId {
        self.0.into()
    }
}
