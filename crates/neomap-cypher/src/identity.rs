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

//! Identity allocation for new entities.

use neomap_core::{Entity, IdStrategy, NodeId, OgmError, Result, Schema, Value};
use uuid::Uuid;

/// Produces surrogate identities for [`IdStrategy::GeneratedUuid`] schemas.
pub trait IdGenerator: Send + Sync {
    /// A fresh identity value for an entity of `schema`.
    fn generate(&self, schema: &Schema) -> Value;
}

/// Random version 4 UUIDs rendered as hyphenated strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self, _schema: &Schema) -> Value {
        Value::String(Uuid::new_v4().to_string())
    }
}

/// Whether an entity is saved for the first time.
///
/// An entity loaded from or already written to the store is never new.
/// Otherwise versioned entities are new while their version is unset,
/// generated identities are new while unset, and assigned identities are new.
pub fn is_new(schema: &Schema, entity: &Entity, loaded: bool) -> bool {
    if loaded || entity.native_id.is_some() {
        return false;
    }
    if let Some(version) = &schema.version {
        return entity.get(&version.attribute).is_none();
    }
    match &schema.identity {
        Some(id) if id.is_generated() => entity.get(&id.attribute).is_none(),
        Some(_) | None => true,
    }
}

/// The store identity an existing internally identified entity refers to.
pub fn native_id_of(schema: &Schema, entity: &Entity) -> Result<Option<NodeId>> {
    if entity.native_id.is_some() {
        return Ok(entity.native_id);
    }
    match &schema.identity {
        Some(id) if id.strategy == IdStrategy::GeneratedInternal => {
            match entity.get(&id.attribute) {
                None => Ok(None),
                Some(Value::Int(i)) => Ok(Some(NodeId(*i))),
                Some(other) => Err(OgmError::conversion(
                    &id.attribute,
                    format!("internal identity must be an integer, got {other}"),
                )),
            }
        }
        _ => Ok(None),
    }
}

/// The identity value written as a property, allocating a surrogate if the
/// strategy asks for one and none is set yet.
///
/// Returns `None` for store-native identities.
pub fn allocate(
    schema: &Schema,
    entity: &Entity,
    generator: &dyn IdGenerator,
) -> Result<Option<Value>> {
    let Some(id) = &schema.identity else {
        return Ok(None);
    };
    match id.strategy {
        IdStrategy::GeneratedInternal => Ok(None),
        IdStrategy::GeneratedUuid => Ok(Some(
            entity
                .get(&id.attribute)
                .cloned()
                .unwrap_or_else(|| generator.generate(schema)),
        )),
        IdStrategy::Assigned => match entity.get(&id.attribute) {
            Some(value) => Ok(Some(value.clone())),
            None => Err(OgmError::Mapping(format!(
                "{} has no value for its assigned identity '{}'",
                schema.type_name, id.attribute
            ))),
        },
    }
}
