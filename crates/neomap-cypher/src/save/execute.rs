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

//! Executing a save plan and writing store state back into the graph.

use std::collections::{BTreeMap, HashMap};

use neomap_core::{
    EntityRef, ExecutionError, NodeId, NodeSnapshot, ObjectGraph, OgmError,
    PropertyMap, RelationshipId, RelationshipSnapshot, Result, Value,
};
use tracing::debug;

use super::plan::{LinkPath, NodeWrite, RelationshipWrite, SavePlan};
use super::{SaveEngine, SaveReport};
use crate::executor::Transaction;
use crate::ops::{NodeSelector, WriteOp};
use crate::version::stale_state;

/// Raw state of a relationship after the save.
struct RelationshipState {
    rel_type: String,
    start: NodeId,
    end: NodeId,
    properties: PropertyMap,
}

impl SaveEngine<'_> {
    /// Execute a plan in `tx`.
    ///
    /// On error nothing is written back to the graph; the caller is expected
    /// to roll the transaction back.
    pub fn execute<T: Transaction>(
        &self,
        plan: SavePlan,
        graph: &mut ObjectGraph,
        tx: &mut T,
    ) -> Result<SaveReport> {
        let mut report = SaveReport::default();
        let mut native: HashMap<EntityRef, NodeId> = HashMap::new();

        for write in &plan.nodes {
            let description = write.description();
            let Some(op) = &write.op else {
                report.nodes_unchanged += 1;
                if let Some(id) = write.native_id {
                    native.insert(write.entity, id);
                }
                continue;
            };
            let summary = self.write(op, &description, tx, &mut report.script)?;
            let generated = summary.generated_ids.first().copied().map(NodeId);
            match op {
                WriteOp::UpdateNode { version, .. } => {
                    if summary.affected == 0 {
                        return Err(match version {
                            Some(check) => {
                                stale_state(&write.type_name, &write.identity, check.expected)
                            }
                            None => OgmError::persistence(
                                description,
                                ExecutionError::new("node no longer exists"),
                            ),
                        });
                    }
                    report.nodes_updated += 1;
                    if let Some(id) = write.native_id.or(generated) {
                        native.insert(write.entity, id);
                    }
                }
                WriteOp::CreateNode { .. } | WriteOp::MergeNode { .. } => {
                    let id = generated.ok_or_else(|| {
                        OgmError::persistence(
                            description.as_str(),
                            ExecutionError::new("store reported no node identity"),
                        )
                    })?;
                    if matches!(op, WriteOp::MergeNode { .. }) {
                        report.nodes_merged += 1;
                    } else {
                        report.nodes_created += 1;
                    }
                    native.insert(write.entity, id);
                }
                _ => {}
            }
        }

        let mut created: Vec<(RelationshipId, &[LinkPath])> = Vec::new();
        let mut states: HashMap<RelationshipId, RelationshipState> = HashMap::new();
        for write in &plan.relationships {
            match write {
                RelationshipWrite::Create {
                    start,
                    end,
                    rel_type,
                    properties,
                    links,
                } => {
                    let start_id = endpoint(graph, &native, *start)?;
                    let end_id = endpoint(graph, &native, *end)?;
                    let description =
                        format!("relationship ({start_id})-[:{rel_type}]->({end_id})");
                    let op = WriteOp::CreateRelationship {
                        start: start_id,
                        end: end_id,
                        rel_type: rel_type.clone(),
                        properties: properties.clone(),
                    };
                    let summary = self.write(&op, &description, tx, &mut report.script)?;
                    let id = summary.generated_ids.first().copied().ok_or_else(|| {
                        OgmError::persistence(
                            description.as_str(),
                            ExecutionError::new("store reported no relationship identity"),
                        )
                    })?;
                    let id = RelationshipId(id);
                    report.relationships_created += 1;
                    created.push((id, links.as_slice()));
                    states.insert(
                        id,
                        RelationshipState {
                            rel_type: rel_type.clone(),
                            start: start_id,
                            end: end_id,
                            properties: properties.clone(),
                        },
                    );
                }
                RelationshipWrite::Update { id, properties } => {
                    let description = format!("relationship {id}");
                    let op = WriteOp::UpdateRelationship {
                        id: *id,
                        properties: properties.clone(),
                    };
                    let summary = self.write(&op, &description, tx, &mut report.script)?;
                    if summary.affected == 0 {
                        return Err(OgmError::persistence(
                            description,
                            ExecutionError::new("relationship no longer exists"),
                        ));
                    }
                    report.relationships_updated += 1;
                }
                RelationshipWrite::Delete { id } => {
                    let description = format!("relationship {id}");
                    let op = WriteOp::DeleteRelationship { id: *id };
                    self.write(&op, &description, tx, &mut report.script)?;
                    report.relationships_deleted += 1;
                }
            }
        }

        self.write_back(&plan, graph, &native, &created, states)?;
        debug!(
            statements = report.statements(),
            created = report.nodes_created + report.nodes_merged,
            updated = report.nodes_updated,
            "save executed"
        );
        Ok(report)
    }

    fn write_back(
        &self,
        plan: &SavePlan,
        graph: &mut ObjectGraph,
        native: &HashMap<EntityRef, NodeId>,
        created: &[(RelationshipId, &[LinkPath])],
        mut states: HashMap<RelationshipId, RelationshipState>,
    ) -> Result<()> {
        // Surviving loaded relationships keep their raw state, overlaid with updates.
        for write in &plan.nodes {
            if let Some(snapshot) = graph.snapshot(write.entity) {
                for (id, rel) in &snapshot.relationships {
                    states.entry(*id).or_insert_with(|| RelationshipState {
                        rel_type: rel.rel_type.clone(),
                        start: rel.start,
                        end: rel.end,
                        properties: rel.properties.clone(),
                    });
                }
            }
        }
        for write in &plan.relationships {
            match write {
                RelationshipWrite::Update { id, properties } => {
                    if let Some(state) = states.get_mut(id) {
                        overlay(&mut state.properties, properties);
                    }
                }
                RelationshipWrite::Delete { id } => {
                    states.remove(id);
                }
                RelationshipWrite::Create { .. } => {}
            }
        }

        for write in &plan.nodes {
            let Some(&id) = native.get(&write.entity) else {
                continue;
            };
            graph.bind_native_id(write.entity, id);
            if let Some(entity) = graph.get_mut(write.entity) {
                for (attribute, value) in &write.assigned {
                    entity.set(attribute.clone(), value.clone());
                }
                if let Some(attribute) = &write.internal_id_attribute {
                    entity.set(attribute.clone(), Value::Int(id.get()));
                }
            }
        }

        for (id, paths) in created {
            for path in paths.iter() {
                let Some(link) = graph
                    .get_mut(path.owner)
                    .and_then(|e| e.related_mut(&path.attribute))
                    .and_then(|r| r.links_mut().into_iter().nth(path.position))
                else {
                    continue;
                };
                link.relationship_id = Some(*id);
                if let Some(attribute) = &path.id_attribute {
                    link.attributes.insert(attribute.clone(), Value::Int(id.get()));
                }
            }
        }

        for write in &plan.nodes {
            if let Some(&id) = native.get(&write.entity) {
                let snapshot = self.refreshed_snapshot(graph, write, id, &states)?;
                graph.set_snapshot(write.entity, snapshot);
            }
        }
        Ok(())
    }

    /// The raw state of a node right after the save.
    fn refreshed_snapshot(
        &self,
        graph: &ObjectGraph,
        write: &NodeWrite,
        id: NodeId,
        states: &HashMap<RelationshipId, RelationshipState>,
    ) -> Result<NodeSnapshot> {
        let schema = self.registry.schema_for(&write.type_name)?;
        let mut snapshot = match graph.snapshot(write.entity) {
            Some(old) => NodeSnapshot::new(id, old.labels.clone(), old.properties.clone()),
            None => NodeSnapshot::new(
                id,
                schema.labels.iter().cloned().collect(),
                PropertyMap::new(),
            ),
        };
        match &write.op {
            Some(WriteOp::CreateNode { properties, .. }) => {
                overlay(&mut snapshot.properties, properties);
            }
            Some(WriteOp::MergeNode {
                key,
                value,
                properties,
                ..
            }) => {
                overlay(&mut snapshot.properties, properties);
                snapshot.properties.insert(key.clone(), value.clone());
            }
            Some(WriteOp::UpdateNode {
                node,
                properties,
                version,
            }) => {
                overlay(&mut snapshot.properties, properties);
                if let NodeSelector::Key { key, value, .. } = node {
                    snapshot.properties.insert(key.clone(), value.clone());
                }
                if let Some(check) = version {
                    snapshot
                        .properties
                        .insert(check.key.clone(), Value::Int(check.next));
                }
            }
            _ => {}
        }

        let entity = &graph[write.entity];
        let mut wired: BTreeMap<RelationshipId, RelationshipSnapshot> = BTreeMap::new();
        for def in &schema.relationships {
            let Some(related) = entity.related(&def.attribute) else {
                continue;
            };
            for (_, link) in related.links() {
                let Some(rel_id) = link.relationship_id else {
                    continue;
                };
                let Some(state) = states.get(&rel_id) else {
                    continue;
                };
                wired.insert(
                    rel_id,
                    RelationshipSnapshot {
                        id: rel_id,
                        rel_type: state.rel_type.clone(),
                        start: state.start,
                        end: state.end,
                        attribute: def.attribute.clone(),
                        properties: state.properties.clone(),
                    },
                );
            }
        }
        snapshot.relationships = wired;
        Ok(snapshot)
    }
}

fn endpoint(
    graph: &ObjectGraph,
    native: &HashMap<EntityRef, NodeId>,
    r: EntityRef,
) -> Result<NodeId> {
    native
        .get(&r)
        .copied()
        .or_else(|| graph.get(r).and_then(|e| e.native_id))
        .ok_or_else(|| {
            OgmError::Mapping(format!(
                "relationship endpoint #{} has no store identity",
                r.index()
            ))
        })
}

/// Apply written properties to a raw map; null removes the key.
fn overlay(raw: &mut PropertyMap, written: &PropertyMap) {
    for (key, value) in written {
        if value.is_null() {
            raw.remove(key);
        } else {
            raw.insert(key.clone(), value.clone());
        }
    }
}
