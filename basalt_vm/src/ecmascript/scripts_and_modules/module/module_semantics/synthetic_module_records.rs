// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ## [Synthetic Module Records](https://webidl.spec.whatwg.org/#synthetic-module-records)
//!
//! Module records whose exports are installed programmatically by the
//! embedder instead of being parsed from source text. The set of export
//! names is fixed at construction; binding cells for them are created
//! during the first instantiation phase and populated by the embedder's
//! evaluation steps, or at any later point through
//! [`SyntheticModule::set_export`].

use core::fmt::{self, Debug};
use std::ops::{Index, IndexMut};

use ahash::AHashMap;

use crate::{
    ecmascript::{
        execution::agent::{Agent, JsError, JsResult},
        types::Value,
    },
    heap::{
        CellHeapData, Heap,
        indexes::{CellIndex, SyntheticModuleIndex},
    },
};

use super::abstract_module_records::{
    Cell, Module, ModuleAbstractMethods, ModuleRecord, ModuleStatus, ResolveExportResult,
    ResolveSet, ResolvedBinding,
};

/// Embedder-supplied evaluation steps of a synthetic module. Invoked
/// exactly once, during [`ModuleAbstractMethods::evaluate`]; expected to
/// call [`SyntheticModule::set_export`] zero or more times to populate the
/// module's live bindings.
pub type SyntheticModuleEvaluationSteps =
    Box<dyn FnOnce(&mut Agent, SyntheticModule) -> JsResult<Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyntheticModule(SyntheticModuleIndex);

pub struct SyntheticModuleHeapData {
    pub(crate) record: ModuleRecord,
    /// \[\[Status]]
    pub(crate) status: ModuleStatus,
    /// \[\[EvaluationError]]
    ///
    /// The error that moved the record to errored, retained for the graph
    /// evaluator. Empty unless \[\[Status]] is errored.
    pub(crate) evaluation_error: Option<JsError>,
    /// \[\[ExportNames]]
    ///
    /// Fixed at construction, duplicate-free, in declaration order. The
    /// order is externally observable through reflection surfaces such as
    /// namespace objects and must be preserved exactly as supplied.
    pub(crate) export_names: Box<[Box<str>]>,
    /// \[\[Exports]]-equivalent: export name to binding cell. Empty until
    /// the first instantiation phase runs.
    pub(crate) exports: AHashMap<Box<str>, Cell>,
    /// \[\[EvaluationSteps]]
    ///
    /// Present until evaluation consumes it.
    pub(crate) evaluation_steps: Option<SyntheticModuleEvaluationSteps>,
}

impl Debug for SyntheticModuleHeapData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticModuleHeapData")
            .field("record", &self.record)
            .field("status", &self.status)
            .field("evaluation_error", &self.evaluation_error)
            .field("export_names", &self.export_names)
            .field("exports", &self.exports)
            .field(
                "evaluation_steps",
                &self.evaluation_steps.as_ref().map(|_| "..."),
            )
            .finish()
    }
}

impl Index<SyntheticModule> for Agent {
    type Output = SyntheticModuleHeapData;

    fn index(&self, index: SyntheticModule) -> &Self::Output {
        &self.heap.modules[index.0]
    }
}

impl IndexMut<SyntheticModule> for Agent {
    fn index_mut(&mut self, index: SyntheticModule) -> &mut Self::Output {
        &mut self.heap.modules[index.0]
    }
}

impl SyntheticModule {
    /// ### [CreateSyntheticModule ( name, exportNames, evaluationSteps )](https://webidl.spec.whatwg.org/#createsyntheticmodule)
    ///
    /// Duplicate export names are rejected here, so every downstream
    /// operation may trust the list.
    pub fn create(
        agent: &mut Agent,
        module_name: &str,
        export_names: &[&str],
        evaluation_steps: SyntheticModuleEvaluationSteps,
    ) -> Self {
        let export_names: Box<[Box<str>]> =
            export_names.iter().map(|name| Box::from(*name)).collect();
        for (i, name) in export_names.iter().enumerate() {
            assert!(
                !export_names[..i].contains(name),
                "duplicate export name {:?} in synthetic module {:?}",
                name,
                module_name
            );
        }
        agent.heap.modules.push(Some(SyntheticModuleHeapData {
            record: ModuleRecord {
                name: module_name.into(),
            },
            status: ModuleStatus::default(),
            evaluation_error: None,
            exports: AHashMap::with_capacity(export_names.len()),
            export_names,
            evaluation_steps: Some(evaluation_steps),
        }));
        Self(SyntheticModuleIndex::last(&agent.heap.modules))
    }

    /// Module name given by the embedder at construction.
    pub fn name(self, agent: &Agent) -> &str {
        &agent[self].record.name
    }

    /// Export names in declaration order.
    pub fn export_names(self, agent: &Agent) -> &[Box<str>] {
        &agent[self].export_names
    }

    /// \[\[EvaluationError]]
    pub fn evaluation_error(self, agent: &Agent) -> Option<JsError> {
        agent[self].evaluation_error
    }

    /// ### [SetSyntheticModuleExport ( module, exportName, exportValue )](https://webidl.spec.whatwg.org/#setsyntheticmoduleexport)
    ///
    /// Overwrite the mutable binding of exportName with exportValue. Every
    /// importer of the binding observes the new value as soon as this
    /// returns. May be called from within the evaluation steps or at any
    /// later point for live exports.
    ///
    /// ## Panics
    /// If exportName was not declared at construction. Only declared names
    /// have a backing cell; an undeclared name here is an embedder bug, not
    /// a runtime error.
    pub fn set_export(self, agent: &mut Agent, export_name: &str, export_value: Value) {
        let data = &agent[self];
        let Some(&cell) = data.exports.get(export_name) else {
            panic!(
                "set_export on undeclared export {:?} of synthetic module {:?}",
                export_name, data.record.name
            );
        };
        // Step 2: Set the mutable binding of exportName to exportValue.
        agent[cell].value = export_value;
    }
}

impl ModuleAbstractMethods for SyntheticModule {
    fn status(self, agent: &Agent) -> ModuleStatus {
        agent[self].status
    }

    /// ### [Synthetic Module Record Instantiate, phase one](https://webidl.spec.whatwg.org/#smr-instantiate)
    ///
    /// Create one fresh binding cell per declared export name, each
    /// initialized to undefined, and install it into the export table.
    /// Cannot fail: the only input is the name list, validated at
    /// construction.
    fn prepare_instantiate(self, agent: &mut Agent) -> JsResult<()> {
        let Heap { modules, cells, .. } = &mut agent.heap;
        let data = &mut modules[self.0];
        assert_eq!(
            data.status,
            ModuleStatus::Uninstantiated,
            "instantiation started twice on synthetic module {:?}",
            data.record.name
        );
        data.status = ModuleStatus::Instantiating;
        // For each exportName in module.[[ExportNames]], in declaration
        // order:
        for name in data.export_names.iter() {
            // Create a new mutable binding for exportName, initialized to
            // undefined.
            cells.push(Some(CellHeapData {
                value: Value::Undefined,
            }));
            let cell = Cell(CellIndex::last(cells));
            // A name gets its cell exactly once per record.
            let previous = data.exports.insert(name.clone(), cell);
            assert!(
                previous.is_none(),
                "binding cell created twice for export {:?} of synthetic module {:?}",
                name,
                data.record.name
            );
        }
        Ok(())
    }

    /// ### [Synthetic Module Record Instantiate, phase two](https://webidl.spec.whatwg.org/#smr-instantiate)
    ///
    /// A synthetic module has no imports or indirect exports to resolve, so
    /// there is no linking work; this only advances the status, keeping the
    /// graph walker's two-phase protocol uniform across module variants.
    fn finish_instantiate(self, agent: &mut Agent) -> JsResult<()> {
        let data = &mut agent[self];
        assert_eq!(
            data.status,
            ModuleStatus::Instantiating,
            "finish_instantiate out of order on synthetic module {:?}, status {:?}",
            data.record.name,
            data.status
        );
        data.status = ModuleStatus::Instantiated;
        Ok(())
    }

    /// ### [Synthetic Module Record ResolveExport](https://webidl.spec.whatwg.org/#smr-resolveexport)
    ///
    /// Pure lookup: a declared name resolves to its backing cell, anything
    /// else is None. The resolve set is never extended since synthetic
    /// modules have no import edges to traverse.
    ///
    /// Instantiation must have begun before this is invoked; until then no
    /// cells exist.
    fn resolve_export<'a>(
        self,
        agent: &Agent,
        _module_specifier: &str,
        export_name: &'a str,
        _resolve_set: &mut ResolveSet<'a>,
    ) -> Option<ResolveExportResult> {
        agent[self].exports.get(export_name).map(|&cell| {
            ResolveExportResult::Resolved(ResolvedBinding {
                module: Module::Synthetic(self),
                cell,
            })
        })
    }

    /// ### [Synthetic Module Record Evaluate](https://webidl.spec.whatwg.org/#smr-evaluate)
    ///
    /// Run the embedder's evaluation steps exactly once and return their
    /// value. On failure the record moves to errored permanently, the error
    /// is retained and propagated, and whatever the steps already mutated
    /// stays mutated (no rollback).
    fn evaluate(self, agent: &mut Agent) -> JsResult<Value> {
        let steps = {
            let data = &mut agent[self];
            assert_eq!(
                data.status,
                ModuleStatus::Instantiated,
                "evaluate out of order on synthetic module {:?}, status {:?}",
                data.record.name,
                data.status
            );
            data.status = ModuleStatus::Evaluating;
            // Taking the steps out also guarantees they cannot run twice.
            data.evaluation_steps
                .take()
                .expect("evaluation steps already consumed")
        };
        match steps(agent, self) {
            Ok(result) => {
                agent[self].status = ModuleStatus::Evaluated;
                Ok(result)
            }
            Err(error) => {
                let data = &mut agent[self];
                data.status = ModuleStatus::Errored;
                data.evaluation_error = Some(error);
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ecmascript::execution::agent::ExceptionType;

    fn noop_steps() -> SyntheticModuleEvaluationSteps {
        Box::new(|_, _| Ok(Value::Undefined))
    }

    fn instantiated(agent: &mut Agent, names: &[&str]) -> SyntheticModule {
        let module = SyntheticModule::create(agent, "test", names, noop_steps());
        module.prepare_instantiate(agent).unwrap();
        module.finish_instantiate(agent).unwrap();
        module
    }

    fn resolve(agent: &Agent, module: SyntheticModule, name: &str) -> Option<Cell> {
        let mut resolve_set = ResolveSet::new();
        match module.resolve_export(agent, "test", name, &mut resolve_set)? {
            ResolveExportResult::Resolved(binding) => Some(binding.cell),
            ResolveExportResult::Ambiguous => None,
        }
    }

    #[test]
    fn prepare_instantiate_creates_undefined_bindings() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a", "b", "c"], noop_steps());
        assert!(agent[module].exports.is_empty());

        module.prepare_instantiate(&mut agent).unwrap();
        assert_eq!(module.status(&agent), ModuleStatus::Instantiating);
        assert_eq!(agent[module].exports.len(), 3);
        for name in ["a", "b", "c"] {
            let cell = resolve(&agent, module, name).unwrap();
            assert!(cell.value(&agent).is_undefined());
        }
    }

    #[test]
    fn export_names_preserve_declaration_order() {
        let mut agent = Agent::new();
        let module = instantiated(&mut agent, &["zeta", "alpha", "mu"]);
        let names: Vec<&str> = module
            .export_names(&agent)
            .iter()
            .map(|name| name.as_ref())
            .collect();
        assert_eq!(names, ["zeta", "alpha", "mu"]);
    }

    #[test]
    #[should_panic(expected = "duplicate export name")]
    fn duplicate_export_names_rejected_at_construction() {
        let mut agent = Agent::new();
        SyntheticModule::create(&mut agent, "test", &["a", "b", "a"], noop_steps());
    }

    #[test]
    #[should_panic(expected = "instantiation started twice")]
    fn double_instantiation_panics() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a"], noop_steps());
        module.prepare_instantiate(&mut agent).unwrap();
        module.prepare_instantiate(&mut agent).unwrap();
    }

    #[test]
    fn set_export_is_last_write_wins() {
        let mut agent = Agent::new();
        let module = instantiated(&mut agent, &["a"]);
        let cell = resolve(&agent, module, "a").unwrap();

        module.set_export(&mut agent, "a", Value::Integer(1));
        assert_eq!(cell.value(&agent), Value::Integer(1));
        module.set_export(&mut agent, "a", Value::Integer(2));
        assert_eq!(cell.value(&agent), Value::Integer(2));
        module.set_export(&mut agent, "a", Value::Boolean(false));
        assert_eq!(cell.value(&agent), Value::Boolean(false));
    }

    #[test]
    #[should_panic(expected = "undeclared export")]
    fn set_export_on_undeclared_name_panics() {
        let mut agent = Agent::new();
        let module = instantiated(&mut agent, &["a"]);
        module.set_export(&mut agent, "b", Value::Integer(1));
    }

    #[test]
    fn importers_share_binding_cells() {
        let mut agent = Agent::new();
        let module = instantiated(&mut agent, &["a"]);

        // Two independent importers resolve the same name.
        let first = resolve(&agent, module, "a").unwrap();
        let second = resolve(&agent, module, "a").unwrap();
        assert_eq!(first, second);

        // A mutation through the module is observable through both.
        module.set_export(&mut agent, "a", Value::Integer(7));
        assert_eq!(first.value(&agent), Value::Integer(7));
        assert_eq!(second.value(&agent), Value::Integer(7));
    }

    #[test]
    fn lifecycle_status_order() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a"], noop_steps());
        assert_eq!(module.status(&agent), ModuleStatus::Uninstantiated);
        module.prepare_instantiate(&mut agent).unwrap();
        assert_eq!(module.status(&agent), ModuleStatus::Instantiating);
        module.finish_instantiate(&mut agent).unwrap();
        assert_eq!(module.status(&agent), ModuleStatus::Instantiated);
        module.evaluate(&mut agent).unwrap();
        assert_eq!(module.status(&agent), ModuleStatus::Evaluated);
    }

    #[test]
    #[should_panic(expected = "evaluate out of order")]
    fn evaluate_before_instantiation_finishes_panics() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a"], noop_steps());
        module.prepare_instantiate(&mut agent).unwrap();
        // Skipping finish_instantiate is a lifecycle violation.
        let _ = module.evaluate(&mut agent);
    }

    #[test]
    #[should_panic(expected = "finish_instantiate out of order")]
    fn finish_before_prepare_panics() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a"], noop_steps());
        module.finish_instantiate(&mut agent).unwrap();
    }

    #[test]
    fn finish_instantiate_leaves_exports_alone() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a", "b"], noop_steps());
        module.prepare_instantiate(&mut agent).unwrap();
        let a = resolve(&agent, module, "a").unwrap();
        let b = resolve(&agent, module, "b").unwrap();
        module.set_export(&mut agent, "a", Value::Integer(3));

        module.finish_instantiate(&mut agent).unwrap();
        assert_eq!(agent[module].exports.len(), 2);
        assert_eq!(resolve(&agent, module, "a").unwrap(), a);
        assert_eq!(resolve(&agent, module, "b").unwrap(), b);
        assert_eq!(a.value(&agent), Value::Integer(3));
        assert!(b.value(&agent).is_undefined());
    }

    #[test]
    fn evaluation_steps_populate_exports() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(
            &mut agent,
            "test",
            &["answer", "greeting"],
            Box::new(|agent, module| {
                module.set_export(agent, "answer", Value::Integer(42));
                let greeting = Value::from_str(agent, "hello");
                module.set_export(agent, "greeting", greeting);
                Ok(Value::Integer(1))
            }),
        );
        module.prepare_instantiate(&mut agent).unwrap();
        module.finish_instantiate(&mut agent).unwrap();

        let result = module.evaluate(&mut agent).unwrap();
        assert_eq!(result, Value::Integer(1));
        assert_eq!(module.status(&agent), ModuleStatus::Evaluated);

        let answer = resolve(&agent, module, "answer").unwrap();
        assert_eq!(answer.value(&agent), Value::Integer(42));
        let greeting = resolve(&agent, module, "greeting").unwrap();
        assert_eq!(greeting.value(&agent).as_str(&agent), Some("hello"));
    }

    #[test]
    #[should_panic(expected = "evaluate out of order")]
    fn reevaluation_panics() {
        let mut agent = Agent::new();
        let module = instantiated(&mut agent, &["a"]);
        module.evaluate(&mut agent).unwrap();
        let _ = module.evaluate(&mut agent);
    }

    #[test]
    fn failed_evaluation_errors_the_module() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(
            &mut agent,
            "test",
            &["partial", "untouched"],
            Box::new(|agent, module| {
                // Mutations before the failure stay visible; there is no
                // rollback.
                module.set_export(agent, "partial", Value::Integer(1));
                Err(agent.throw_exception(ExceptionType::TypeError, "boom"))
            }),
        );
        module.prepare_instantiate(&mut agent).unwrap();
        module.finish_instantiate(&mut agent).unwrap();

        let error = module.evaluate(&mut agent).unwrap_err();
        assert_eq!(module.status(&agent), ModuleStatus::Errored);
        assert_eq!(module.evaluation_error(&agent), Some(error));
        assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
        assert_eq!(error.message(&agent), Some("boom"));

        let partial = resolve(&agent, module, "partial").unwrap();
        assert_eq!(partial.value(&agent), Value::Integer(1));
        let untouched = resolve(&agent, module, "untouched").unwrap();
        assert!(untouched.value(&agent).is_undefined());
    }

    #[test]
    fn unresolved_export_is_not_an_error() {
        let mut agent = Agent::new();
        let module = instantiated(&mut agent, &["a"]);

        let mut resolve_set = ResolveSet::new();
        assert!(
            module
                .resolve_export(&agent, "test", "nope", &mut resolve_set)
                .is_none()
        );
        // Idempotent, and the resolve set is never extended: synthetic
        // modules have no import edges.
        assert!(
            module
                .resolve_export(&agent, "test", "nope", &mut resolve_set)
                .is_none()
        );
        assert!(resolve_set.is_empty());
    }

    #[test]
    fn graph_walker_drives_variants_uniformly() {
        let mut agent = Agent::new();
        let synthetic = SyntheticModule::create(&mut agent, "test", &["a"], noop_steps());
        let module = Module::Synthetic(synthetic);

        module.prepare_instantiate(&mut agent).unwrap();
        module.finish_instantiate(&mut agent).unwrap();
        assert_eq!(module.status(&agent), ModuleStatus::Instantiated);

        let mut resolve_set = ResolveSet::new();
        let Some(ResolveExportResult::Resolved(binding)) =
            module.resolve_export(&agent, "test", "a", &mut resolve_set)
        else {
            panic!("expected a resolved binding");
        };
        assert_eq!(binding.module, module);

        module.evaluate(&mut agent).unwrap();
        assert_eq!(module.status(&agent), ModuleStatus::Evaluated);
    }

    #[test]
    fn synthetic_module_scenario() {
        let mut agent = Agent::new();
        let module = SyntheticModule::create(&mut agent, "test", &["a", "b"], noop_steps());
        module.prepare_instantiate(&mut agent).unwrap();

        let a = resolve(&agent, module, "a").unwrap();
        let b = resolve(&agent, module, "b").unwrap();
        assert_ne!(a, b);
        assert!(a.value(&agent).is_undefined());
        assert!(b.value(&agent).is_undefined());

        module.set_export(&mut agent, "a", Value::Integer(42));
        assert_eq!(a.value(&agent), Value::Integer(42));
        assert!(b.value(&agent).is_undefined());
    }
}
