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

//! Planning a save: which nodes and relationships to write, and how.

use std::collections::{HashMap, HashSet};

use neomap_core::{
    changed_properties, Direction, EntityRef, IdStrategy, NodeId, ObjectGraph, OgmError,
    PropertyMap, RelationshipId, RelationshipSnapshot, Result, Schema, Value,
};
use tracing::debug;

use super::SaveEngine;
use crate::identity::{allocate, is_new, native_id_of};
use crate::ops::{NodeSelector, WriteOp};
use crate::version::version_check;

/// Location of a link inside the object graph, used to write back the
/// identity of a created relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPath {
    /// The entity holding the link.
    pub owner: EntityRef,
    /// The relationship attribute.
    pub attribute: String,
    /// Position among the attribute's links.
    pub position: usize,
    /// Identity attribute of the relationship-properties type, if generated.
    pub id_attribute: Option<String>,
}

/// The write planned for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWrite {
    /// The entity.
    pub entity: EntityRef,
    /// Concrete type name.
    pub type_name: String,
    /// Human-readable identity, for errors and logs.
    pub identity: String,
    /// The write; `None` when nothing changed.
    pub op: Option<WriteOp>,
    /// Store identity, when known before the write.
    pub native_id: Option<NodeId>,
    /// Attribute values to set on the entity once the save succeeded.
    pub assigned: PropertyMap,
    /// Attribute receiving the store identity, for internally generated ids.
    pub internal_id_attribute: Option<String>,
}

impl NodeWrite {
    /// `Type identity`, as used in error messages.
    pub fn description(&self) -> String {
        format!("{} {}", self.type_name, self.identity)
    }
}

/// A planned relationship write.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipWrite {
    /// Create a relationship between two entities of the graph.
    Create {
        /// Start entity.
        start: EntityRef,
        /// End entity.
        end: EntityRef,
        /// Relationship type.
        rel_type: String,
        /// Mapped relationship properties.
        properties: PropertyMap,
        /// Every link that stands for this relationship.
        links: Vec<LinkPath>,
    },
    /// Set changed mapped properties of an existing relationship.
    Update {
        /// The relationship.
        id: RelationshipId,
        /// Changed properties.
        properties: PropertyMap,
    },
    /// Delete a loaded relationship no link refers to anymore.
    Delete {
        /// The relationship.
        id: RelationshipId,
    },
}

/// Everything one save call will write, in execution order: node writes
/// first, then relationship creates, updates and deletes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    /// Node writes in visiting order.
    pub nodes: Vec<NodeWrite>,
    /// Relationship writes.
    pub relationships: Vec<RelationshipWrite>,
}

impl SavePlan {
    /// Number of statements the plan executes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.op.is_some()).count() + self.relationships.len()
    }

    /// Whether the plan writes nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type CreateKey = (EntityRef, String, EntityRef);

impl SaveEngine<'_> {
    /// Plan the save of `roots` and everything reachable from them.
    ///
    /// Each entity is visited once, however many paths lead to it.
    pub fn plan(&self, graph: &ObjectGraph, roots: &[EntityRef]) -> Result<SavePlan> {
        let mut visited = Vec::new();
        let mut seen = HashSet::new();
        for &root in roots {
            if graph.get(root).is_none() {
                return Err(OgmError::Mapping(format!(
                    "entity #{} is not part of the graph",
                    root.index()
                )));
            }
            for r in graph.reachable(root) {
                if seen.insert(r) {
                    visited.push(r);
                }
            }
        }

        let mut nodes = Vec::with_capacity(visited.len());
        for &r in &visited {
            nodes.push(self.plan_node(graph, r)?);
        }
        let relationships = self.plan_relationships(graph, &visited)?;
        Ok(SavePlan {
            nodes,
            relationships,
        })
    }

    fn plan_node(&self, graph: &ObjectGraph, r: EntityRef) -> Result<NodeWrite> {
        let entity = &graph[r];
        let schema = self.registry.schema_for(&entity.type_name)?;
        if !schema.is_node() {
            return Err(OgmError::Mapping(format!(
                "{} is not a node type",
                schema.type_name
            )));
        }
        let identity = schema
            .identity
            .as_ref()
            .ok_or_else(|| OgmError::conflict(&schema.type_name, "no identity attribute"))?;
        let snapshot = graph.snapshot(r);
        let desired = mapped_properties(schema, entity)?;

        let mut write = NodeWrite {
            entity: r,
            type_name: schema.type_name.clone(),
            identity: describe_identity(schema, entity),
            op: None,
            native_id: None,
            assigned: PropertyMap::new(),
            internal_id_attribute: identity
                .is_internal()
                .then(|| identity.attribute.clone()),
        };

        if is_new(schema, entity, snapshot.is_some()) {
            let mut properties: PropertyMap =
                desired.into_iter().filter(|(_, v)| !v.is_null()).collect();
            let id_value = allocate(schema, entity, self.generator.as_ref())?;
            if let (Some(key), Some(value)) = (&identity.key, &id_value) {
                properties.insert(key.clone(), identity.write(value)?);
                if identity.strategy == IdStrategy::GeneratedUuid {
                    write
                        .assigned
                        .insert(identity.attribute.clone(), value.clone());
                }
            }
            if let Some(version) = &schema.version {
                let initial = Value::Int(self.config.initial_version);
                properties.insert(version.key.clone(), initial.clone());
                write.assigned.insert(version.attribute.clone(), initial);
            }

            let merge = identity.strategy == IdStrategy::Assigned
                && !schema.is_versioned()
                && self.config.merge_assigned_ids;
            write.op = Some(match (&identity.key, merge) {
                (Some(key), true) => {
                    let value = properties.remove(key).unwrap_or(Value::Null);
                    WriteOp::MergeNode {
                        labels: schema.labels.clone(),
                        key: key.clone(),
                        value,
                        properties,
                    }
                }
                _ => WriteOp::CreateNode {
                    labels: schema.labels.clone(),
                    properties,
                },
            });
            return Ok(write);
        }

        let selector = match native_id_of(schema, entity)? {
            Some(id) => {
                write.native_id = Some(id);
                NodeSelector::Id(id)
            }
            None => match (&identity.key, entity.get(&identity.attribute)) {
                (Some(key), Some(value)) => NodeSelector::Key {
                    label: schema.primary_label().to_string(),
                    key: key.clone(),
                    value: identity.write(value)?,
                },
                _ => {
                    return Err(OgmError::Mapping(format!(
                        "{} has no identity to update",
                        write.description()
                    )));
                }
            },
        };
        let version = version_check(schema, entity, self.config.initial_version)?;
        let properties = match snapshot {
            Some(s) => changed_properties(&s.properties, &desired),
            None => desired,
        };
        if let (Some(check), Some(def)) = (&version, &schema.version) {
            write
                .assigned
                .insert(def.attribute.clone(), Value::Int(check.next));
        }
        if version.is_none() && properties.is_empty() {
            debug!(entity = %write.description(), "no mapped property changed, skipping");
        } else {
            write.op = Some(WriteOp::UpdateNode {
                node: selector,
                properties,
                version,
            });
        }
        Ok(write)
    }

    fn plan_relationships(
        &self,
        graph: &ObjectGraph,
        visited: &[EntityRef],
    ) -> Result<Vec<RelationshipWrite>> {
        let mut known: HashMap<RelationshipId, &RelationshipSnapshot> = HashMap::new();
        for &r in visited {
            if let Some(snapshot) = graph.snapshot(r) {
                for (id, rel) in &snapshot.relationships {
                    known.entry(*id).or_insert(rel);
                }
            }
        }

        let mut creates: Vec<RelationshipWrite> = Vec::new();
        let mut create_index: HashMap<CreateKey, usize> = HashMap::new();
        let mut updates = Vec::new();
        let mut present = HashSet::new();

        for &r in visited {
            let entity = &graph[r];
            let schema = self.registry.schema_for(&entity.type_name)?;
            for def in &schema.relationships {
                let Some(related) = entity.related(&def.attribute) else {
                    continue;
                };
                let props_schema = def
                    .properties
                    .as_deref()
                    .map(|t| self.registry.schema_for(t))
                    .transpose()?;

                for (position, (key, link)) in related.links().into_iter().enumerate() {
                    let Some(target) = graph.get(link.target) else {
                        return Err(OgmError::Mapping(format!(
                            "{}.{} links to entity #{}, which is not part of the graph",
                            schema.type_name,
                            def.attribute,
                            link.target.index()
                        )));
                    };
                    let rel_type = match (&def.rel_type, key) {
                        (Some(t), _) => t.clone(),
                        (None, Some(k)) if !k.is_empty() => k.to_string(),
                        _ => {
                            return Err(OgmError::Mapping(format!(
                                "{}.{} holds a link without relationship type",
                                schema.type_name, def.attribute
                            )));
                        }
                    };
                    let desired = match props_schema {
                        Some(ps) => relationship_properties(ps, &link.attributes)?,
                        None => PropertyMap::new(),
                    };

                    if let Some(id) = link.relationship_id {
                        let snapshot = known.get(&id).copied();
                        let unchanged_ends = snapshot.map_or(true, |s| {
                            same_endpoints(s, entity.native_id, target.native_id)
                        });
                        if unchanged_ends {
                            if present.insert(id) && props_schema.is_some() {
                                let changed = match snapshot {
                                    Some(s) => changed_properties(&s.properties, &desired),
                                    None => desired,
                                };
                                if !changed.is_empty() {
                                    updates.push(RelationshipWrite::Update {
                                        id,
                                        properties: changed,
                                    });
                                }
                            }
                            continue;
                        }
                    }

                    let (start, end) = match def.direction {
                        Direction::Incoming => (link.target, r),
                        Direction::Outgoing | Direction::Undirected => (r, link.target),
                    };
                    let path = LinkPath {
                        owner: r,
                        attribute: def.attribute.clone(),
                        position,
                        id_attribute: props_schema
                            .and_then(|ps| ps.identity.as_ref())
                            .map(|i| i.attribute.clone()),
                    };
                    let dedup_key = match def.direction {
                        Direction::Undirected => {
                            (start.min(end), rel_type.clone(), start.max(end))
                        }
                        _ => (start, rel_type.clone(), end),
                    };
                    if self.config.deduplicate_new_relationships {
                        if let Some(&index) = create_index.get(&dedup_key) {
                            if let Some(RelationshipWrite::Create { links, .. }) =
                                creates.get_mut(index)
                            {
                                links.push(path);
                            }
                            continue;
                        }
                    }
                    create_index.insert(dedup_key, creates.len());
                    creates.push(RelationshipWrite::Create {
                        start,
                        end,
                        rel_type,
                        properties: desired.into_iter().filter(|(_, v)| !v.is_null()).collect(),
                        links: vec![path],
                    });
                }
            }
        }

        let mut deletes = Vec::new();
        let mut deleted = HashSet::new();
        for &r in visited {
            if let Some(snapshot) = graph.snapshot(r) {
                for id in snapshot.relationships.keys() {
                    if !present.contains(id) && deleted.insert(*id) {
                        deletes.push(RelationshipWrite::Delete { id: *id });
                    }
                }
            }
        }

        creates.extend(updates);
        creates.extend(deletes);
        Ok(creates)
    }
}

/// Graph values of every mapped scalar attribute, unset ones as null.
pub(crate) fn mapped_properties(
    schema: &Schema,
    entity: &neomap_core::Entity,
) -> Result<PropertyMap> {
    let mut out = PropertyMap::new();
    for def in &schema.properties {
        let value = entity.get(&def.attribute).unwrap_or(&Value::Null);
        out.insert(def.key.clone(), def.write(value)?);
    }
    Ok(out)
}

fn relationship_properties(schema: &Schema, attributes: &PropertyMap) -> Result<PropertyMap> {
    let mut out = PropertyMap::new();
    for def in &schema.properties {
        let value = attributes
            .get(&def.attribute)
            .filter(|v| !v.is_null())
            .unwrap_or(&Value::Null);
        out.insert(def.key.clone(), def.write(value)?);
    }
    Ok(out)
}

fn same_endpoints(
    snapshot: &RelationshipSnapshot,
    owner: Option<NodeId>,
    target: Option<NodeId>,
) -> bool {
    match (owner, target) {
        (Some(a), Some(b)) => {
            (snapshot.start, snapshot.end) == (a, b) || (snapshot.start, snapshot.end) == (b, a)
        }
        _ => false,
    }
}

fn describe_identity(schema: &Schema, entity: &neomap_core::Entity) -> String {
    let value = schema
        .identity
        .as_ref()
        .and_then(|id| entity.get(&id.attribute));
    match (value, entity.native_id) {
        (Some(v), _) => v.to_string(),
        (None, Some(id)) => id.to_string(),
        (None, None) => "(new)".to_string(),
    }
}
