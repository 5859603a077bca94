// Dweve Neomap - Object-Graph Mapping for Property Graphs
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conversion between domain attribute values and graph property values.
//!
//! Every mapped attribute declares a [`ValueKind`]. Reading a property from
//! the graph coerces the raw value into that kind; writing an attribute
//! checks the kind before handing the value to the store. A custom
//! [`PropertyConverter`] runs on the graph side of that check.

use std::fmt;

use crate::error::{OgmError, Result};
use crate::value::{Value, ValueKind};

/// Custom conversion between an attribute value and its graph property value.
pub trait PropertyConverter: Send + Sync + fmt::Debug {
    /// Convert an attribute value into the value written to the graph.
    fn to_graph(&self, value: &Value) -> Result<Value>;

    /// Convert a graph property value into the attribute value.
    fn from_graph(&self, value: &Value) -> Result<Value>;
}

/// Read a raw graph value into an attribute of the given kind.
pub fn read_value(
    attribute: &str,
    kind: ValueKind,
    converter: Option<&dyn PropertyConverter>,
    raw: &Value,
) -> Result<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let value = match converter {
        Some(c) => c.from_graph(raw)?,
        None => raw.clone(),
    };
    coerce(attribute, kind, value)
}

/// Convert an attribute value into the raw graph value to store.
pub fn write_value(
    attribute: &str,
    kind: ValueKind,
    converter: Option<&dyn PropertyConverter>,
    value: &Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let checked = coerce(attribute, kind, value.clone())?;
    match converter {
        Some(c) => c.to_graph(&checked),
        None => Ok(checked),
    }
}

/// Coerce a value into the declared kind.
///
/// Integers widen to floats and integral floats narrow to integers; every
/// other mismatch is a conversion error.
pub fn coerce(attribute: &str, kind: ValueKind, value: Value) -> Result<Value> {
    match (kind, value) {
        (_, Value::Null) => Ok(Value::Null),
        (ValueKind::Any, v) => Ok(v),
        (ValueKind::Bool, v @ Value::Bool(_)) => Ok(v),
        (ValueKind::Int, v @ Value::Int(_)) => Ok(v),
        (ValueKind::Int, Value::Float(f)) if f.fract() == 0.0 && f.is_finite() => {
            Ok(Value::Int(f as i64))
        }
        (ValueKind::Float, v @ Value::Float(_)) => Ok(v),
        (ValueKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (ValueKind::String, v @ Value::String(_)) => Ok(v),
        (ValueKind::List, v @ Value::List(_)) => Ok(v),
        (ValueKind::Map, v @ Value::Map(_)) => Ok(v),
        (kind, other) => Err(OgmError::conversion(
            attribute,
            format!(
                "expected {}, got {}",
                kind,
                other.kind().map(|k| k.to_string()).unwrap_or_default()
            ),
        )),
    }
}
