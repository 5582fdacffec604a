// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::types::Value,
    heap::{
        Heap,
        indexes::{ErrorIndex, StringIndex},
    },
};

pub type JsResult<T> = core::result::Result<T, JsError>;

/// An exception thrown by ECMAScript-level code; here, by a synthetic
/// module's evaluation steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsError(pub(crate) Value);

impl JsError {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(self) -> Value {
        self.0
    }

    /// Native error kind of the wrapped error, if it wraps one.
    pub fn kind(self, agent: &Agent) -> Option<ExceptionType> {
        let Value::Error(index) = self.0 else {
            return None;
        };
        Some(agent.heap.errors[index].kind)
    }

    /// Message of the wrapped error, if it wraps one and a message was set.
    pub fn message(self, agent: &Agent) -> Option<&str> {
        let Value::Error(index) = self.0 else {
            return None;
        };
        let message = agent.heap.errors[index].message?;
        Some(agent.heap.strings[message].as_str())
    }
}

/// Native error kinds of [20.5 Error Objects](https://tc39.es/ecma262/#sec-error-objects).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    UriError,
}

/// Heap data of a thrown native error.
#[derive(Debug, Clone, Copy)]
pub struct ErrorHeapData {
    pub(crate) kind: ExceptionType,
    pub(crate) message: Option<StringIndex>,
}

/// ### [9.7 Agent](https://tc39.es/ecma262/#sec-agents)
///
/// Owner of the heap that every module record and binding cell lives in.
/// All module operations take the agent exclusively; execution is
/// single-threaded and cooperative, so no operation on a record may be
/// invoked concurrently from independent threads.
#[derive(Debug, Default)]
pub struct Agent {
    pub(crate) heap: Heap,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new native error and wrap it as a throw completion.
    pub fn throw_exception(&mut self, kind: ExceptionType, message: &str) -> JsError {
        let message = self.heap.alloc_string(message);
        self.heap.errors.push(Some(ErrorHeapData {
            kind,
            message: Some(message),
        }));
        JsError::new(Value::Error(ErrorIndex::last(&self.heap.errors)))
    }
}
