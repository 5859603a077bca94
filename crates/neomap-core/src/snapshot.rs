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

//! Last-known raw state of loaded entities.
//!
//! A [`NodeSnapshot`] keeps the complete property map of a node as it was
//! loaded, including keys no schema maps, together with the relationships
//! that were wired into the entity's attributes. The merge-save engine diffs
//! against it so that writes only touch mapped keys that actually changed.

use std::collections::{BTreeMap, BTreeSet};

use crate::identity::{NodeId, RelationshipId};
use crate::value::{PropertyMap, Value};

/// A loaded relationship as it was wired into an entity attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipSnapshot {
    /// Store identity.
    pub id: RelationshipId,
    /// Relationship type.
    pub rel_type: String,
    /// Start node.
    pub start: NodeId,
    /// End node.
    pub end: NodeId,
    /// The attribute the relationship was wired into.
    pub attribute: String,
    /// Raw relationship properties.
    pub properties: PropertyMap,
}

/// Raw state of one loaded node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    /// Store identity.
    pub node_id: NodeId,
    /// Labels at load time.
    pub labels: BTreeSet<String>,
    /// Complete raw property map.
    pub properties: PropertyMap,
    /// Relationships wired into the entity, by identity.
    pub relationships: BTreeMap<RelationshipId, RelationshipSnapshot>,
}

impl NodeSnapshot {
    /// A snapshot without relationships.
    pub fn new(node_id: NodeId, labels: BTreeSet<String>, properties: PropertyMap) -> Self {
        Self {
            node_id,
            labels,
            properties,
            relationships: BTreeMap::new(),
        }
    }

    /// Record a wired relationship.
    pub fn add_relationship(&mut self, relationship: RelationshipSnapshot) {
        self.relationships.insert(relationship.id, relationship);
    }

    /// A raw property value.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Entries of `desired` whose value differs from `raw`.
///
/// An absent raw key and a null desired value are equal, so clearing an
/// attribute that was never stored is not a change.
pub fn changed_properties(raw: &PropertyMap, desired: &PropertyMap) -> PropertyMap {
    desired
        .iter()
        .filter(|(key, value)| match raw.get(key.as_str()) {
            Some(old) => old != *value,
            None => !value.is_null(),
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
