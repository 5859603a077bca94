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

//! End-to-end tests of the data-access facade against the in-memory store.
//!
//! Test coverage:
//! - Unknown node and relationship properties survive a save
//! - Identity, version and relationship ids are written back
//! - Batches share one transaction; per-item transactions on request
//! - Optimistic locking, cycles, polymorphism and bidirectional relationships

use neomap_core::{Entity, Link, NodeId, ObjectGraph, OgmError, PropertyMap, Value};
use std::sync::Arc;

use neomap_cypher::{Neo4jTemplate, StatementType, TemplateConfig};
use neomap_test::{fixtures, template, MemoryGraph};

fn props(pairs: &[(&str, Value)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn text(value: &str) -> Value {
    Value::from(value)
}

fn stored(store: &MemoryGraph, id: NodeId, key: &str) -> Option<Value> {
    store.node(id).and_then(|n| n.property(key).cloned())
}

// ============================================================================
// Unknown properties
// ============================================================================

fn update_known_and_assert_unknown(type_name: &str, id: Value, node: NodeId, store: &MemoryGraph) {
    let template = Neo4jTemplate::new(Arc::new(fixtures::registry()), store.clone());
    let mut graph = template.find_by_id(type_name, id).unwrap().unwrap();
    let root = graph.root().unwrap();
    graph[root].set("knownProperty", "A2");

    template.save(&mut graph, root).unwrap();

    assert_eq!(graph[root].get("knownProperty"), Some(&text("A2")));
    assert_eq!(stored(store, node, "knownProperty"), Some(text("A2")));
    assert_eq!(stored(store, node, "unknownProperty"), Some(text("Mr. X")));
}

#[test]
fn test_assigned_id_no_version_keeps_unknown_properties() {
    let (_, store) = template();
    let node = store.create_node(
        &["SimplePropertyContainer"],
        props(&[
            ("id", text("id1")),
            ("knownProperty", text("A")),
            ("unknownProperty", text("Mr. X")),
        ]),
    );
    update_known_and_assert_unknown("SimplePropertyContainer", text("id1"), node, &store);
}

#[test]
fn test_assigned_id_with_version_keeps_unknown_properties() {
    let (_, store) = template();
    let node = store.create_node(
        &["SimplePropertyContainerWithVersion"],
        props(&[
            ("id", text("id1")),
            ("version", Value::Int(1)),
            ("knownProperty", text("A")),
            ("unknownProperty", text("Mr. X")),
        ]),
    );
    update_known_and_assert_unknown(
        "SimplePropertyContainerWithVersion",
        text("id1"),
        node,
        &store,
    );
    assert_eq!(stored(&store, node, "version"), Some(Value::Int(2)));
}

#[test]
fn test_loaded_node_without_stored_version_is_updated_in_place() {
    let (template, store) = template();
    let node = store.create_node(
        &["SimplePropertyContainerWithVersion"],
        props(&[
            ("id", text("id1")),
            ("knownProperty", text("A")),
            ("unknownProperty", text("Mr. X")),
        ]),
    );
    let mut graph = template
        .find_by_id("SimplePropertyContainerWithVersion", "id1")
        .unwrap()
        .unwrap();
    let root = graph.root().unwrap();
    assert_eq!(graph[root].get("version"), None);
    graph[root].set("knownProperty", "A2");

    let report = template.save(&mut graph, root).unwrap();

    assert_eq!(report.nodes_created, 0);
    assert_eq!(report.nodes_merged, 0);
    assert_eq!(report.nodes_updated, 1);
    assert_eq!(store.node_count(), 1);
    assert_eq!(graph[root].native_id, Some(node));
    assert_eq!(graph[root].get("version"), Some(&Value::Int(0)));
    assert_eq!(stored(&store, node, "knownProperty"), Some(text("A2")));
    assert_eq!(stored(&store, node, "unknownProperty"), Some(text("Mr. X")));
    assert_eq!(stored(&store, node, "version"), Some(Value::Int(0)));

    graph[root].set("knownProperty", "A3");
    template.save(&mut graph, root).unwrap();
    assert_eq!(stored(&store, node, "version"), Some(Value::Int(1)));
}

#[test]
fn test_node_versioned_concurrently_after_unversioned_load_is_stale() {
    let (template, store) = template();
    let node = store.create_node(
        &["SimplePropertyContainerWithVersion"],
        props(&[("id", text("id1")), ("knownProperty", text("A"))]),
    );
    let mut graph = template
        .find_by_id("SimplePropertyContainerWithVersion", "id1")
        .unwrap()
        .unwrap();
    let root = graph.root().unwrap();
    store.set_node_property(node, "version", Value::Int(0));
    graph[root].set("knownProperty", "A2");

    let err = template.save(&mut graph, root).unwrap_err();

    assert!(matches!(err, OgmError::StaleState { expected: None, .. }));
    assert_eq!(store.node_count(), 1);
    assert_eq!(stored(&store, node, "knownProperty"), Some(text("A")));
}

#[test]
fn test_generated_id_no_version_keeps_unknown_properties() {
    let (_, store) = template();
    let node = store.create_node(
        &["SimpleGeneratedIDPropertyContainer"],
        props(&[("knownProperty", text("A")), ("unknownProperty", text("Mr. X"))]),
    );
    update_known_and_assert_unknown(
        "SimpleGeneratedIDPropertyContainer",
        Value::Int(node.get()),
        node,
        &store,
    );
}

#[test]
fn test_generated_id_with_version_keeps_unknown_properties() {
    let (_, store) = template();
    let node = store.create_node(
        &["SimpleGeneratedIDPropertyContainerWithVersion"],
        props(&[
            ("version", Value::Int(1)),
            ("knownProperty", text("A")),
            ("unknownProperty", text("Mr. X")),
        ]),
    );
    update_known_and_assert_unknown(
        "SimpleGeneratedIDPropertyContainerWithVersion",
        Value::Int(node.get()),
        node,
        &store,
    );
    assert_eq!(stored(&store, node, "version"), Some(Value::Int(2)));
}

#[test]
fn test_batch_of_independently_loaded_entities() {
    let (template, store) = template();
    let a = store.create_node(
        &["SimplePropertyContainer"],
        props(&[
            ("id", text("a")),
            ("knownProperty", text("A")),
            ("unknownProperty", text("Fix")),
        ]),
    );
    let b = store.create_node(
        &["SimplePropertyContainer"],
        props(&[
            ("id", text("b")),
            ("knownProperty", text("B")),
            ("unknownProperty", text("Foxy")),
        ]),
    );

    let mut graph = template
        .find_by_id("SimplePropertyContainer", "a")
        .unwrap()
        .unwrap();
    let other = template
        .find_by_id("SimplePropertyContainer", "b")
        .unwrap()
        .unwrap();
    let first = graph.root().unwrap();
    let second = graph.merge_from(other)[0];
    graph[first].set("knownProperty", "A2");
    graph[second].set("knownProperty", "B2");

    let before = store.stats().committed;
    let report = template.save_all(&mut graph, &[first, second]).unwrap();

    assert_eq!(report.nodes_updated, 2);
    assert_eq!(store.stats().committed, before + 1);
    assert_eq!(stored(&store, a, "knownProperty"), Some(text("A2")));
    assert_eq!(stored(&store, b, "knownProperty"), Some(text("B2")));
    assert_eq!(stored(&store, a, "unknownProperty"), Some(text("Fix")));
    assert_eq!(stored(&store, b, "unknownProperty"), Some(text("Foxy")));
}

#[test]
fn test_relationship_properties_are_not_overwritten() {
    let (template, store) = template();
    let source = store.create_node(&["IrrelevantSourceContainer"], PropertyMap::new());
    let target = store.create_node(&["IrrelevantTargetContainer"], PropertyMap::new());
    let rel = store.create_relationship(
        source,
        "RELATIONSHIP_PROPERTY_CONTAINER",
        target,
        props(&[("knownProperty", text("A")), ("unknownProperty", text("Mr. X"))]),
    );

    let mut graph = template
        .find_by_id("IrrelevantSourceContainer", source.get())
        .unwrap()
        .unwrap();
    let root = graph.root().unwrap();
    {
        let related = graph[root]
            .related_mut("relationshipPropertyContainer")
            .unwrap();
        let mut links = related.links_mut();
        assert_eq!(links[0].attributes.get("id"), Some(&Value::Int(rel.get())));
        links[0].attributes.insert("knownProperty".into(), text("A2"));
    }

    let report = template.save(&mut graph, root).unwrap();

    assert_eq!(report.relationships_updated, 1);
    assert_eq!(report.relationships_created, 0);
    let stored = store.relationship(rel).unwrap();
    assert_eq!(stored.properties.get("knownProperty"), Some(&text("A2")));
    assert_eq!(stored.properties.get("unknownProperty"), Some(&text("Mr. X")));
}

// ============================================================================
// Write-back
// ============================================================================

#[test]
fn test_relationship_ids_are_filled() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let source = graph.add_root(Entity::new("IrrelevantSourceContainer"));
    let t1 = graph.add(Entity::new("IrrelevantTargetContainer"));
    let t2 = graph.add(Entity::new("IrrelevantTargetContainer"));
    graph[source].link(
        "relationshipPropertyContainer",
        Link::to(t1).with_attribute("knownProperty", "A"),
    );
    graph[source].link(
        "relationshipPropertyContainerNoId",
        Link::to(t2).with_attribute("knownProperty", "B"),
    );

    let report = template.save(&mut graph, source).unwrap();

    assert_eq!(report.nodes_created, 3);
    assert_eq!(report.relationships_created, 2);
    let id = graph[source].get("id").and_then(Value::as_int).unwrap();
    let with_id = graph[source].related("relationshipPropertyContainer").unwrap().links()[0].1;
    let rel_id = with_id.relationship_id.unwrap();
    assert_eq!(with_id.attributes.get("id"), Some(&Value::Int(rel_id.get())));
    let no_id = graph[source].related("relationshipPropertyContainerNoId").unwrap().links()[0].1;
    assert!(no_id.relationship_id.is_some());
    assert!(no_id.attributes.get("id").is_none());

    let rels = store.relationships_of_type("RELATIONSHIP_PROPERTY_CONTAINER");
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].start, NodeId(id));
    assert_eq!(rels[0].properties.get("knownProperty"), Some(&text("A")));
}

#[test]
fn test_new_versioned_entity_starts_at_zero() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let ticket = graph.add_root(Entity::new("Ticket").with("title", "first"));
    template.save(&mut graph, ticket).unwrap();
    let node = graph[ticket].native_id.unwrap();
    assert_eq!(stored(&store, node, "version"), Some(Value::Int(0)));

    graph[ticket].set("title", "second");
    template.save(&mut graph, ticket).unwrap();
    assert_eq!(stored(&store, node, "version"), Some(Value::Int(1)));
    assert_eq!(graph[ticket].get("version"), Some(&Value::Int(1)));

    let uuid = graph[ticket].get("uuid").cloned().unwrap();
    let reloaded = template.find_by_id("Ticket", uuid).unwrap().unwrap();
    let root = reloaded.root().unwrap();
    assert_eq!(reloaded[root].get("title"), Some(&text("second")));
}

#[test]
fn test_non_null_attribute_rejected() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let ticket = graph.add_root(Entity::new("Ticket"));
    let err = template.save(&mut graph, ticket).unwrap_err();
    assert!(matches!(err, OgmError::Conversion { .. }));
    assert_eq!(store.node_count(), 0);
}

// ============================================================================
// Optimistic locking and transactions
// ============================================================================

#[test]
fn test_stale_version_rolls_back_whole_batch() {
    let (template, store) = template();
    let a = store.create_node(
        &["SimplePropertyContainerWithVersion"],
        props(&[("id", text("a")), ("version", Value::Int(1)), ("knownProperty", text("A"))]),
    );
    let b = store.create_node(
        &["SimplePropertyContainerWithVersion"],
        props(&[("id", text("b")), ("version", Value::Int(1)), ("knownProperty", text("B"))]),
    );
    let mut graph = template
        .find_by_id("SimplePropertyContainerWithVersion", "a")
        .unwrap()
        .unwrap();
    let other = template
        .find_by_id("SimplePropertyContainerWithVersion", "b")
        .unwrap()
        .unwrap();
    let first = graph.root().unwrap();
    let second = graph.merge_from(other)[0];
    graph[first].set("knownProperty", "A2");
    graph[second].set("knownProperty", "B2");

    // Someone else saved `b` in the meantime.
    store.set_node_property(b, "version", 2i64);

    let err = template.save_all(&mut graph, &[first, second]).unwrap_err();

    assert!(matches!(err, OgmError::StaleState { expected: Some(1), .. }));
    assert_eq!(stored(&store, a, "knownProperty"), Some(text("A")));
    assert_eq!(stored(&store, a, "version"), Some(Value::Int(1)));
    assert_eq!(stored(&store, b, "version"), Some(Value::Int(2)));
    assert_eq!(graph[first].get("version"), Some(&Value::Int(1)));
}

#[test]
fn test_per_item_transactions_keep_earlier_items() {
    let (template, store) = template();
    let template = template.with_config(TemplateConfig::default().with_per_item_transactions());
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let b = graph.add_root(Entity::new("Person").with("name", "b"));
    store.fail_on(StatementType::MergeNode, 2);

    let err = template.save_all(&mut graph, &[a, b]).unwrap_err();

    assert!(matches!(err, OgmError::Persistence { .. }));
    assert_eq!(store.node_count(), 1);
    assert!(graph[a].native_id.is_some());
    assert!(graph[b].native_id.is_none());
}

#[test]
fn test_failed_commit_leaves_graph_untouched() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    store.fail_commit();

    let err = template.save(&mut graph, a).unwrap_err();

    assert!(matches!(err, OgmError::Persistence { .. }));
    assert!(graph[a].native_id.is_none());
    assert!(graph.snapshot(a).is_none());
    assert_eq!(store.node_count(), 0);
}

#[test]
fn test_begin_failure_is_a_persistence_error() {
    let (template, store) = template();
    store.fail_begin();
    let err = template.find_all("Person").unwrap_err();
    assert!(matches!(err, OgmError::Persistence { .. }));
}

// ============================================================================
// Graph shapes
// ============================================================================

#[test]
fn test_cycle_loads_and_saves_back_unchanged() {
    let (template, store) = template();
    let a = store.create_node(&["Person"], props(&[("name", text("a"))]));
    let b = store.create_node(&["Person"], props(&[("name", text("b"))]));
    store.create_relationship(a, "KNOWS", b, PropertyMap::new());
    store.create_relationship(b, "KNOWS", a, PropertyMap::new());

    let mut graph = template.find_by_id("Person", "a").unwrap().unwrap();
    assert_eq!(graph.len(), 2);
    let ra = graph.find(a).unwrap();
    let rb = graph.find(b).unwrap();
    assert_eq!(graph[ra].targets("friends"), vec![rb]);
    assert_eq!(graph[rb].targets("friends"), vec![ra]);

    let report = template.save(&mut graph, ra).unwrap();
    assert_eq!(report.statements(), 0);
    assert_eq!(store.relationship_count(), 2);
}

#[test]
fn test_entity_reachable_twice_is_written_once() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let b = graph.add(Entity::new("Person").with("name", "b"));
    let c = graph.add(Entity::new("Person").with("name", "c"));
    graph[a].link("friends", Link::to(b));
    graph[a].link("friends", Link::to(c));
    graph[b].link("friends", Link::to(c));

    let report = template.save(&mut graph, a).unwrap();

    assert_eq!(report.nodes_merged, 3);
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.relationship_count(), 3);
}

#[test]
fn test_bidirectional_relationship_created_once() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Sku").with("number", 1i64).with("name", "a"));
    let b = graph.add(Entity::new("Sku").with("number", 2i64).with("name", "b"));
    graph[a].link(
        "rangeRelationsOut",
        Link::to(b)
            .with_attribute("minDelta", 0.5)
            .with_attribute("maxDelta", 1.5)
            .with_attribute("relationType", "MULTIPLY"),
    );
    graph[b].link(
        "rangeRelationsIn",
        Link::to(a)
            .with_attribute("minDelta", 0.5)
            .with_attribute("maxDelta", 1.5)
            .with_attribute("relationType", "MULTIPLY"),
    );

    let report = template.save(&mut graph, a).unwrap();

    assert_eq!(report.relationships_created, 1);
    assert_eq!(store.relationships_of_type("RANGE_RELATION_TO").len(), 1);
    let out = graph[a].related("rangeRelationsOut").unwrap().links()[0].1.clone();
    let inc = graph[b].related("rangeRelationsIn").unwrap().links()[0].1.clone();
    assert_eq!(out.relationship_id, inc.relationship_id);
    assert_eq!(out.attributes.get("id"), inc.attributes.get("id"));

    let id = graph[a].native_id.unwrap();
    let mut reloaded = template.find_by_id("Sku", id.get()).unwrap().unwrap();
    let root = reloaded.root().unwrap();
    let other = reloaded[root].targets("rangeRelationsOut");
    assert_eq!(other.len(), 1);
    assert_eq!(reloaded[other[0]].targets("rangeRelationsIn"), vec![root]);
    let report = template.save(&mut reloaded, root).unwrap();
    assert_eq!(report.statements(), 0);
}

#[test]
fn test_removed_relationship_is_deleted() {
    let (template, store) = template();
    let a = store.create_node(&["Person"], props(&[("name", text("a"))]));
    let b = store.create_node(&["Person"], props(&[("name", text("b"))]));
    store.create_relationship(a, "KNOWS", b, PropertyMap::new());

    let mut graph = template.find_by_id("Person", "a").unwrap().unwrap();
    let ra = graph.root().unwrap();
    let rb = graph.find(b).unwrap();
    graph[ra].unlink("friends", rb);

    let report = template.save(&mut graph, ra).unwrap();

    assert_eq!(report.relationships_deleted, 1);
    assert_eq!(store.relationship_count(), 0);
    assert_eq!(store.node_count(), 2);
}

#[test]
fn test_find_all_resolves_subtypes() {
    let (template, store) = template();
    store.create_node(
        &["Dog", "Animal"],
        props(&[("name", text("rex")), ("goodBoy", Value::Bool(true))]),
    );
    store.create_node(
        &["Cat", "Animal"],
        props(&[("name", text("tom")), ("lives", Value::Int(9))]),
    );
    store.create_node(&["Animal"], props(&[("name", text("generic"))]));

    let graph = template.find_all("Animal").unwrap();

    let mut types: Vec<_> = graph
        .roots()
        .iter()
        .map(|r| graph[*r].type_name.clone())
        .collect();
    types.sort();
    assert_eq!(types, vec!["Animal", "Cat", "Dog"]);
}

// ============================================================================
// Other facade operations
// ============================================================================

#[test]
fn test_exists_and_delete_by_id() {
    let (template, store) = template();
    let a = store.create_node(&["Person"], props(&[("name", text("a"))]));
    let b = store.create_node(&["Person"], props(&[("name", text("b"))]));
    store.create_relationship(a, "KNOWS", b, PropertyMap::new());

    assert!(template.exists_by_id("Person", "a").unwrap());
    assert!(!template.exists_by_id("Person", "zed").unwrap());

    assert!(template.delete_by_id("Person", "a").unwrap());
    assert!(!template.delete_by_id("Person", "a").unwrap());
    assert!(!template.exists_by_id("Person", "a").unwrap());
    assert_eq!(store.relationship_count(), 0);
}

#[test]
fn test_find_by_missing_id_is_none() {
    let (template, _) = template();
    assert!(template.find_by_id("Person", "nobody").unwrap().is_none());
}

#[test]
fn test_unknown_type_is_schema_error() {
    let (template, _) = template();
    let err = template.find_all("Unicorn").unwrap_err();
    assert!(matches!(err, OgmError::SchemaNotFound(_)));
}

#[test]
fn test_save_each_uses_one_transaction_per_root() {
    let (template, store) = template();
    let mut graph = ObjectGraph::new();
    let roots: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| graph.add_root(Entity::new("Person").with("name", *name)))
        .collect();
    let before = store.stats().committed;

    let report = template.save_each(&mut graph, &roots).unwrap();

    assert_eq!(report.nodes_merged, 3);
    assert_eq!(store.stats().committed, before + 3);
}
