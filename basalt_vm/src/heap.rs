// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod indexes;

use crate::ecmascript::{
    execution::agent::ErrorHeapData,
    scripts_and_modules::module::module_semantics::synthetic_module_records::SyntheticModuleHeapData,
    types::Value,
};
use indexes::StringIndex;

/// Heap arenas for each data kind the module subsystem allocates. Slots are
/// append-only and never reused, so an index handed out stays valid for the
/// agent's lifetime.
#[derive(Debug, Default)]
pub struct Heap {
    pub(crate) modules: Vec<Option<SyntheticModuleHeapData>>,
    pub(crate) cells: Vec<Option<CellHeapData>>,
    pub(crate) errors: Vec<Option<ErrorHeapData>>,
    pub(crate) strings: Vec<Option<StringHeapData>>,
}

/// Backing store of one mutable binding: a single value slot.
///
/// The slot's identity must stay stable once created; importers of the
/// binding hold an index to this data, never a copy of the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellHeapData {
    pub(crate) value: Value,
}

#[derive(Debug, Clone)]
pub struct StringHeapData {
    data: Box<str>,
}

impl StringHeapData {
    pub fn as_str(&self) -> &str {
        &self.data
    }
}

impl Heap {
    pub(crate) fn alloc_string(&mut self, data: &str) -> StringIndex {
        self.strings.push(Some(StringHeapData { data: data.into() }));
        StringIndex::last(&self.strings)
    }
}
