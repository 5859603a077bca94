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

//! Folding result records into an object graph.
//!
//! The [`Reconstructor`] consumes records one at a time. Every node is
//! materialized from the first record its identity is seen in and reused
//! afterwards;
//! relationships are collected by identity and wired into entity attributes
//! only in [`Reconstructor::finish`], once every endpoint that will ever be
//! known is known. The fold never recurses, so cyclic graphs need a single
//! pass and any grouping of the same nodes and relationships into rows
//! yields the same object graph.

use std::collections::{BTreeMap, HashSet};

use neomap_core::{
    Entity, EntityRef, Link, NodeId, NodeSnapshot, ObjectGraph, OgmError, PropertyMap, Related,
    RelationshipDef, RelationshipId, RelationshipSnapshot, Result, Schema, SchemaRegistry, Value,
};
use tracing::{debug, trace};

use crate::config::ReconstructConfig;
use crate::record::{Node, Relationship, ResultRecord};

/// Single-pass fold of result records into an [`ObjectGraph`].
///
/// Root nodes resolve among subtypes of the root type, other nodes against
/// the whole registry. A node that shows up as a root after it was first
/// seen elsewhere is resolved again as a root, and a related node that maps
/// to no single type only fails once the fold finishes without it turning
/// up as a root, so the result does not depend on record order.
#[derive(Debug)]
pub struct Reconstructor<'r> {
    registry: &'r SchemaRegistry,
    root_type: String,
    config: ReconstructConfig,
    graph: ObjectGraph,
    relationships: Vec<Relationship>,
    seen_relationships: HashSet<RelationshipId>,
    resolved_as_root: HashSet<NodeId>,
    unresolved: BTreeMap<NodeId, Node>,
    records: usize,
}

impl<'r> Reconstructor<'r> {
    /// Start a fold whose roots are instances of `root_type` or its subtypes.
    pub fn new(
        registry: &'r SchemaRegistry,
        root_type: &str,
        config: ReconstructConfig,
    ) -> Result<Self> {
        registry.schema_for(root_type)?;
        if let Some(fallback) = &config.fallback_type {
            registry.schema_for(fallback)?;
        }
        Ok(Self {
            registry,
            root_type: root_type.to_string(),
            config,
            graph: ObjectGraph::new(),
            relationships: Vec::new(),
            seen_relationships: HashSet::new(),
            resolved_as_root: HashSet::new(),
            unresolved: BTreeMap::new(),
            records: 0,
        })
    }

    /// Number of records folded so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Fold one record.
    pub fn accept(&mut self, record: ResultRecord) -> Result<()> {
        if let Some(max) = self.config.max_records {
            if self.records >= max {
                return Err(OgmError::Mapping(format!(
                    "result exceeds the limit of {max} records"
                )));
            }
        }
        self.records += 1;
        trace!(record = self.records, columns = record.len(), "folding record");

        let root_column = match &self.config.root_column {
            Some(column) => {
                if record.get(column).is_none() {
                    return Err(OgmError::Mapping(format!(
                        "record has no root column '{column}'"
                    )));
                }
                Some(column.clone())
            }
            None => record.first_node_column().map(str::to_string),
        };

        if let Some(column) = &root_column {
            if let Some(value) = record.get(column) {
                for node in value.nodes() {
                    let r = self.register_root(node)?;
                    self.graph.mark_root(r);
                }
            }
        }

        for (name, value) in record.columns() {
            if root_column.as_deref() != Some(name) {
                for node in value.nodes() {
                    self.register_related(node);
                }
            }
            for rel in value.relationships() {
                if self.seen_relationships.insert(rel.id) {
                    self.relationships.push(rel.clone());
                }
            }
        }
        Ok(())
    }

    /// Wire every collected relationship and hand out the graph.
    pub fn finish(mut self) -> Result<ObjectGraph> {
        for node in std::mem::take(&mut self.unresolved).into_values() {
            let schema = self.resolve(&node, false)?;
            let entity = materialize(schema, &node)?;
            self.add(entity, &node);
        }
        let relationships = std::mem::take(&mut self.relationships);
        let mut dropped = 0usize;
        for rel in &relationships {
            if !self.wire(rel)? {
                dropped += 1;
                debug!(
                    relationship = %rel.id,
                    rel_type = %rel.rel_type,
                    "dropping relationship that maps to no attribute"
                );
            }
        }
        debug!(
            records = self.records,
            entities = self.graph.len(),
            relationships = relationships.len() - dropped,
            dropped,
            "reconstructed object graph"
        );
        Ok(self.graph)
    }

    fn register_root(&mut self, node: &Node) -> Result<EntityRef> {
        if let Some(existing) = self.graph.find(node.id) {
            if self.resolved_as_root.insert(node.id) {
                let first_seen = self
                    .graph
                    .snapshot(existing)
                    .map(|s| Node {
                        id: s.node_id,
                        labels: s.labels.clone(),
                        properties: s.properties.clone(),
                    })
                    .unwrap_or_else(|| node.clone());
                let schema = self.resolve(&first_seen, true)?;
                if schema.type_name != self.graph[existing].type_name {
                    self.graph[existing] = materialize(schema, &first_seen)?;
                }
            }
            return Ok(existing);
        }

        let node = self.unresolved.remove(&node.id).unwrap_or_else(|| node.clone());
        let schema = self.resolve(&node, true)?;
        let entity = materialize(schema, &node)?;
        self.resolved_as_root.insert(node.id);
        Ok(self.add(entity, &node))
    }

    fn register_related(&mut self, node: &Node) {
        if self.graph.find(node.id).is_some() || self.unresolved.contains_key(&node.id) {
            return;
        }
        match self
            .resolve(node, false)
            .and_then(|schema| materialize(schema, node))
        {
            Ok(entity) => {
                self.add(entity, node);
            }
            Err(e) => {
                trace!(node = %node.id, error = %e, "deferring related node");
                self.unresolved.insert(node.id, node.clone());
            }
        }
    }

    fn resolve(&self, node: &Node, as_root: bool) -> Result<&'r Schema> {
        let registry = self.registry;
        let within = as_root.then_some(self.root_type.as_str());
        match registry.resolve(&node.labels, within)? {
            Some(schema) => Ok(schema),
            None => match &self.config.fallback_type {
                Some(fallback) => registry.schema_for(fallback),
                None => Err(OgmError::Mapping(format!(
                    "no schema matches labels {:?} of {}",
                    node.labels, node.id
                ))),
            },
        }
    }

    fn add(&mut self, entity: Entity, node: &Node) -> EntityRef {
        let r = self.graph.add(entity);
        self.graph.set_snapshot(
            r,
            NodeSnapshot::new(node.id, node.labels.clone(), node.properties.clone()),
        );
        r
    }

    /// Attach a relationship on both of its ends. Returns whether any
    /// attribute took it.
    fn wire(&mut self, rel: &Relationship) -> Result<bool> {
        let (Some(start), Some(end)) = (self.graph.find(rel.start), self.graph.find(rel.end))
        else {
            return Ok(false);
        };
        let from_start = self.attach(start, end, rel, true)?;
        let from_end = self.attach(end, start, rel, false)?;
        Ok(from_start || from_end)
    }

    fn attach(
        &mut self,
        owner: EntityRef,
        other: EntityRef,
        rel: &Relationship,
        owner_is_start: bool,
    ) -> Result<bool> {
        let registry = self.registry;
        let schema = registry.schema_for(&self.graph[owner].type_name)?;
        let other_type = self.graph[other].type_name.clone();

        let Some(def) = select_definition(registry, schema, rel, &other_type, owner_is_start)
        else {
            return Ok(false);
        };

        let attributes = match &def.properties {
            Some(properties_type) => {
                read_relationship_properties(registry.schema_for(properties_type)?, rel)?
            }
            None => PropertyMap::new(),
        };
        let link = Link {
            target: other,
            relationship_id: Some(rel.id),
            attributes,
        };

        let entity = &mut self.graph[owner];
        let related = entity
            .relationships
            .entry(def.attribute.clone())
            .or_insert_with(|| Related::empty(def.cardinality));
        let already = related
            .links()
            .iter()
            .any(|(_, l)| l.relationship_id == Some(rel.id));
        if already {
            return Ok(true);
        }
        match related {
            Related::Single(slot) => {
                if slot.is_some() {
                    debug!(
                        attribute = %def.attribute,
                        relationship = %rel.id,
                        "single attribute already set, keeping first relationship"
                    );
                    return Ok(false);
                }
                *slot = Some(link);
            }
            Related::Collection(links) => links.push(link),
            Related::Keyed(map) => map.entry(rel.rel_type.clone()).or_default().push(link),
        }

        if let Some(snapshot) = self.graph.snapshot_mut(owner) {
            snapshot.add_relationship(RelationshipSnapshot {
                id: rel.id,
                rel_type: rel.rel_type.clone(),
                start: rel.start,
                end: rel.end,
                attribute: def.attribute.clone(),
                properties: rel.properties.clone(),
            });
        }
        Ok(true)
    }
}

/// The attribute a relationship belongs to on one of its ends: typed
/// attributes in declaration order first, then keyed attributes.
fn select_definition<'s>(
    registry: &SchemaRegistry,
    schema: &'s Schema,
    rel: &Relationship,
    other_type: &str,
    owner_is_start: bool,
) -> Option<&'s RelationshipDef> {
    let fits = |def: &&'s RelationshipDef| {
        let direction_ok = if owner_is_start {
            def.direction.matches_start()
        } else {
            def.direction.matches_end()
        };
        direction_ok
            && def.accepts_type(&rel.rel_type)
            && registry.is_assignable(other_type, &def.target)
    };
    schema
        .relationships
        .iter()
        .filter(|d| !d.is_dynamic())
        .find(fits)
        .or_else(|| schema.relationships.iter().filter(|d| d.is_dynamic()).find(fits))
}

fn materialize(schema: &Schema, node: &Node) -> Result<Entity> {
    let mut entity = Entity::for_schema(schema);
    entity.native_id = Some(node.id);

    if let Some(id) = &schema.identity {
        let value = match &id.key {
            None => Value::Int(node.id.get()),
            Some(key) => match node.property(key) {
                Some(raw) => id.read(raw)?,
                None => Value::Null,
            },
        };
        entity.set(id.attribute.clone(), value);
    }
    for def in schema.version.iter().chain(&schema.properties) {
        if let Some(raw) = node.property(&def.key) {
            entity.set(def.attribute.clone(), def.read(raw)?);
        }
    }
    Ok(entity)
}

fn read_relationship_properties(schema: &Schema, rel: &Relationship) -> Result<PropertyMap> {
    let mut attributes = BTreeMap::new();
    if let Some(id) = &schema.identity {
        attributes.insert(id.attribute.clone(), Value::Int(rel.id.get()));
    }
    for def in schema.version.iter().chain(&schema.properties) {
        if let Some(raw) = rel.properties.get(&def.key) {
            attributes.insert(def.attribute.clone(), def.read(raw)?);
        }
    }
    Ok(attributes)
}

/// Fold a complete sequence of records.
pub fn reconstruct<I>(
    registry: &SchemaRegistry,
    root_type: &str,
    config: ReconstructConfig,
    records: I,
) -> Result<ObjectGraph>
where
    I: IntoIterator<Item = ResultRecord>,
{
    let mut fold = Reconstructor::new(registry, root_type, config)?;
    for record in records {
        fold.accept(record)?;
    }
    fold.finish()
}
