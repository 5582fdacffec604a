// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## [16.2.1.4 Abstract Module Records](https://tc39.es/ecma262/#sec-abstract-module-records)

use std::ops::{Index, IndexMut};

use crate::{
    ecmascript::{
        execution::agent::{Agent, JsResult},
        types::Value,
    },
    heap::{CellHeapData, indexes::CellIndex},
};

use super::synthetic_module_records::SyntheticModule;

/// Lifecycle position of a module record. Transitions are monotone in the
/// declared order, except that a failed evaluation moves the record to
/// errored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModuleStatus {
    #[default]
    Uninstantiated,
    Instantiating,
    Instantiated,
    Evaluating,
    Evaluated,
    Errored,
}

/// Fields shared by every module record variant.
#[derive(Debug)]
pub(crate) struct ModuleRecord {
    /// Module name given by the embedder at construction. Used for
    /// diagnostics only.
    pub(super) name: Box<str>,
}

/// A mutable binding backing one exported name.
///
/// Importers of the binding hold the cell itself, so a mutation through
/// [`SyntheticModule::set_export`] is immediately visible to every one of
/// them (live-binding semantics, not copy-on-import).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell(pub(super) CellIndex);

impl Cell {
    /// Current value of the binding.
    pub fn value(self, agent: &Agent) -> Value {
        agent[self].value
    }
}

impl Index<Cell> for Agent {
    type Output = CellHeapData;

    fn index(&self, index: Cell) -> &Self::Output {
        &self.heap.cells[index.0]
    }
}

impl IndexMut<Cell> for Agent {
    fn index_mut(&mut self, index: Cell) -> &mut Self::Output {
        &mut self.heap.cells[index.0]
    }
}

/// Module record handle the graph walker dispatches through: one variant
/// per concrete module record kind. Source text module records live outside
/// this crate and plug in as further variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Synthetic(SyntheticModule),
}

/// A successful export resolution: the module that defines the binding and
/// the cell backing it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedBinding {
    /// \[\[Module]]
    pub module: Module,
    /// \[\[BindingName]], resolved down to its backing cell.
    pub cell: Cell,
}

#[derive(Debug, Clone, Copy)]
pub enum ResolveExportResult {
    Ambiguous,
    Resolved(ResolvedBinding),
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveSetEntry<'a> {
    pub module: Module,
    pub export_name: &'a str,
}

/// Set of (module, exportName) pairs currently under resolution, threaded
/// through [`ModuleAbstractMethods::resolve_export`] by the graph-level
/// resolution algorithm. Revisiting a pair already in the set means the
/// resolution walked a circular import/export path.
#[derive(Debug, Default)]
pub struct ResolveSet<'a>(Vec<ResolveSetEntry<'a>>);

impl<'a> ResolveSet<'a> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, module: Module, export_name: &str) -> bool {
        self.0
            .iter()
            .any(|entry| entry.module == module && entry.export_name == export_name)
    }

    pub fn push(&mut self, module: Module, export_name: &'a str) {
        self.0.push(ResolveSetEntry {
            module,
            export_name,
        });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ### [Table 38: Abstract Methods of Module Records](https://tc39.es/ecma262/#table-abstract-methods-of-module-records)
///
/// The capability set every module record variant exposes to the module
/// graph's instantiation and evaluation walk. The walker drives each record
/// through `prepare_instantiate` and `finish_instantiate` in dependency
/// order and only then through `evaluate`, staying agnostic of the concrete
/// variant.
pub trait ModuleAbstractMethods {
    fn status(self, agent: &Agent) -> ModuleStatus;

    /// First phase of instantiation: declare this record's own bindings.
    /// Imported bindings are not resolved yet; the record ends up
    /// instantiating.
    fn prepare_instantiate(self, agent: &mut Agent) -> JsResult<()>;

    /// Second phase of instantiation: resolve indirect exports and imported
    /// bindings against the rest of the graph. The record ends up
    /// instantiated.
    fn finish_instantiate(self, agent: &mut Agent) -> JsResult<()>;

    /// Return the binding backing an export of this module, or None if the
    /// name cannot be resolved. Whether an unresolved export is an error is
    /// the caller's decision, not this method's.
    ///
    /// Pure and idempotent: every call with the same exportName and resolve
    /// set must return the same result. Instantiation of this record must
    /// have begun before this is invoked.
    fn resolve_export<'a>(
        self,
        agent: &Agent,
        module_specifier: &str,
        export_name: &'a str,
        resolve_set: &mut ResolveSet<'a>,
    ) -> Option<ResolveExportResult>;

    /// Run the module's body, populating its bindings. Returns the
    /// evaluation result, or the error that moved the record to errored.
    fn evaluate(self, agent: &mut Agent) -> JsResult<Value>;
}

impl ModuleAbstractMethods for Module {
    fn status(self, agent: &Agent) -> ModuleStatus {
        match self {
            Module::Synthetic(module) => module.status(agent),
        }
    }

    fn prepare_instantiate(self, agent: &mut Agent) -> JsResult<()> {
        match self {
            Module::Synthetic(module) => module.prepare_instantiate(agent),
        }
    }

    fn finish_instantiate(self, agent: &mut Agent) -> JsResult<()> {
        match self {
            Module::Synthetic(module) => module.finish_instantiate(agent),
        }
    }

    fn resolve_export<'a>(
        self,
        agent: &Agent,
        module_specifier: &str,
        export_name: &'a str,
        resolve_set: &mut ResolveSet<'a>,
    ) -> Option<ResolveExportResult> {
        match self {
            Module::Synthetic(module) => {
                module.resolve_export(agent, module_specifier, export_name, resolve_set)
            }
        }
    }

    fn evaluate(self, agent: &mut Agent) -> JsResult<Value> {
        match self {
            Module::Synthetic(module) => module.evaluate(agent),
        }
    }
}
