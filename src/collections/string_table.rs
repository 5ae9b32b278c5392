// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::collections::identifiable::{FxIndexSet, Id, StringId};

/// A StringTable holds unique strings and hands out their insertion offsets
/// as ids. The empty string is interned on construction so that it is always
/// at offset 0.
pub struct StringTable {
    strings: FxIndexSet<String>,
}

impl StringTable {
    pub fn new() -> Self {
        let mut strings = FxIndexSet::default();
        strings.insert(String::new());
        Self { strings }
    }

    /// Interns the `str`, returning the id of its offset in the table. The
    /// empty string is guaranteed to have an id of [StringId::ZERO].
    pub fn intern(&mut self, str: &str) -> StringId {
        match self.strings.get_index_of(str) {
            Some(offset) => StringId::from_offset(offset),
            None => {
                let (offset, inserted) = self.strings.insert_full(str.into());
                debug_assert!(inserted);
                StringId::from_offset(offset)
            }
        }
    }

    pub fn get(&self, id: StringId) -> Option<&str> {
        self.strings.get_index(id.to_offset()).map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        // always holds the empty string, is never empty
        false
    }

    pub fn into_vec(self) -> Vec<String> {
        self.strings.into_iter().collect()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
