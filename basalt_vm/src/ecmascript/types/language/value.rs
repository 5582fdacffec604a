// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::execution::agent::Agent,
    heap::indexes::{ErrorIndex, StringIndex},
};

/// ### [6.1 ECMAScript Language Types](https://tc39.es/ecma262/#sec-ecmascript-language-types)
///
/// Trimmed to the values module evaluation hooks traffic in. Safe integers
/// and floats are immediates; strings and errors live on the agent's heap
/// and are carried by index.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Value {
    /// ### [6.1.1 The Undefined Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-undefined-type)
    ///
    /// Every binding cell starts out holding this value.
    #[default]
    Undefined,
    /// ### [6.1.2 The Null Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-null-type)
    Null,
    /// ### [6.1.3 The Boolean Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-boolean-type)
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// ### [6.1.4 The String Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-string-type)
    String(StringIndex),
    Error(ErrorIndex),
}

impl Value {
    /// Allocate a string value on the agent's heap.
    pub fn from_str(agent: &mut Agent, data: &str) -> Value {
        Value::String(agent.heap.alloc_string(data))
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Borrow of the backing string data for string values.
    pub fn as_str(self, agent: &Agent) -> Option<&str> {
        match self {
            Value::String(index) => Some(agent.heap.strings[index].as_str()),
            _ => None,
        }
    }
}
