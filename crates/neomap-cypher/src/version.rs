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

//! Optimistic locking on a schema's version attribute.
//!
//! An update of a versioned entity is conditioned on the stored version
//! equal to the version the entity carries, and increments it in the same
//! statement. An update matching no node means someone else saved first.

use neomap_core::{Entity, OgmError, Result, Schema, Value};
use tracing::warn;

use crate::ops::VersionCheck;

/// The version an entity carries, if its schema is versioned and it is set.
pub fn current_version(schema: &Schema, entity: &Entity) -> Result<Option<i64>> {
    let Some(def) = &schema.version else {
        return Ok(None);
    };
    match entity.get(&def.attribute) {
        None => Ok(None),
        Some(Value::Int(v)) => Ok(Some(*v)),
        Some(other) => Err(OgmError::conversion(
            &def.attribute,
            format!("version must be an integer, got {other}"),
        )),
    }
}

/// The guard for updating an existing versioned entity.
///
/// An existing entity without a version (stored before the type became
/// versioned) is guarded on the stored node having none either, and gets
/// `initial` as its first version.
pub fn version_check(
    schema: &Schema,
    entity: &Entity,
    initial: i64,
) -> Result<Option<VersionCheck>> {
    let Some(def) = &schema.version else {
        return Ok(None);
    };
    Ok(Some(match current_version(schema, entity)? {
        Some(expected) => VersionCheck::matching(def.key.clone(), expected),
        None => VersionCheck::unset(def.key.clone(), initial),
    }))
}

/// The error for an update that found a different stored version.
pub fn stale_state(type_name: &str, id: impl ToString, expected: Option<i64>) -> OgmError {
    let id = id.to_string();
    warn!(type_name, id = %id, expected = ?expected, "stale entity version");
    OgmError::StaleState {
        type_name: type_name.to_string(),
        id,
        expected,
    }
}
