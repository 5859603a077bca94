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

use super::*;
use crate::config::ReconstructConfig;
use crate::executor::RecordIter;
use crate::ops::{NodeSelector, ReadOp};
use crate::reconstruct::reconstruct;
use crate::record::{Node, Relationship, ResultRecord};
use neomap_core::{
    AttributeDescriptor as Attr, Cardinality, Direction, Entity, ExecutionError,
    GenerationStrategy, Link, NodeId, RelationshipId, TypeDescriptor, Value, ValueKind,
};

/// Hands out identities and records every write.
#[derive(Default)]
struct StubTx {
    next_id: i64,
    writes: Vec<WriteOp>,
    update_affects: Option<u64>,
    fail_on_relationships: bool,
}

impl StubTx {
    fn new() -> Self {
        Self {
            next_id: 100,
            ..Default::default()
        }
    }
}

impl Transaction for StubTx {
    fn execute_query(
        &mut self,
        _op: &ReadOp,
    ) -> std::result::Result<RecordIter<'_>, ExecutionError> {
        Ok(Box::new(std::iter::empty()))
    }

    fn execute_write(
        &mut self,
        op: &WriteOp,
    ) -> std::result::Result<WriteSummary, ExecutionError> {
        self.writes.push(op.clone());
        match op {
            WriteOp::CreateNode { .. } | WriteOp::MergeNode { .. } => {
                self.next_id += 1;
                Ok(WriteSummary::one(self.next_id))
            }
            WriteOp::CreateRelationship { .. } if self.fail_on_relationships => {
                Err(ExecutionError::new("constraint violated"))
            }
            WriteOp::CreateRelationship { .. } => {
                self.next_id += 1;
                Ok(WriteSummary::one(self.next_id))
            }
            WriteOp::UpdateNode { .. } => Ok(WriteSummary {
                affected: self.update_affects.unwrap_or(1),
                generated_ids: Vec::new(),
            }),
            _ => Ok(WriteSummary {
                affected: 1,
                generated_ids: Vec::new(),
            }),
        }
    }

    fn commit(self) -> std::result::Result<(), ExecutionError> {
        Ok(())
    }

    fn rollback(self) -> std::result::Result<(), ExecutionError> {
        Ok(())
    }
}

fn registry() -> SchemaRegistry {
    let mut b = SchemaRegistry::builder();
    b.register(
        TypeDescriptor::node("Person")
            .attribute(Attr::scalar("name", ValueKind::String).id())
            .attribute(Attr::scalar("age", ValueKind::Int))
            .attribute(
                Attr::entity("friends", "Person", Cardinality::Collection)
                    .relationship("KNOWS", Direction::Outgoing),
            )
            .attribute(
                Attr::entity("fans", "Person", Cardinality::Collection)
                    .relationship("KNOWS", Direction::Incoming),
            ),
    )
    .unwrap()
    .register(
        TypeDescriptor::node("Ticket")
            .attribute(
                Attr::scalar("uuid", ValueKind::String)
                    .id()
                    .generated(GenerationStrategy::Uuid),
            )
            .attribute(Attr::scalar("title", ValueKind::String))
            .attribute(Attr::scalar("version", ValueKind::Int).version()),
    )
    .unwrap()
    .register(
        TypeDescriptor::node("Box")
            .attribute(
                Attr::scalar("id", ValueKind::Int)
                    .id()
                    .generated(GenerationStrategy::Internal),
            )
            .attribute(Attr::scalar("label", ValueKind::String)),
    )
    .unwrap();
    b.build().unwrap()
}

fn load(registry: &SchemaRegistry, root: &str, records: Vec<ResultRecord>) -> ObjectGraph {
    reconstruct(registry, root, ReconstructConfig::default(), records).unwrap()
}

#[test]
fn test_new_assigned_entity_is_merged_and_bound() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let alice = graph.add_root(Entity::new("Person").with("name", "alice").with("age", 30i64));
    let mut tx = StubTx::new();

    let report = engine.save(&mut graph, &[alice], &mut tx).unwrap();

    assert_eq!(report.nodes_merged, 1);
    assert_eq!(report.statements(), 1);
    match &tx.writes[0] {
        WriteOp::MergeNode {
            key,
            value,
            properties,
            ..
        } => {
            assert_eq!(key, "name");
            assert_eq!(value, &Value::from("alice"));
            assert_eq!(properties.get("age"), Some(&Value::Int(30)));
        }
        other => panic!("unexpected write {other:?}"),
    }
    assert_eq!(graph[alice].native_id, Some(NodeId(101)));
    assert!(graph.snapshot(alice).is_some());
}

#[test]
fn test_create_mode_for_assigned_ids() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default().with_create());
    let mut graph = ObjectGraph::new();
    let alice = graph.add_root(Entity::new("Person").with("name", "alice"));
    let mut tx = StubTx::new();
    engine.save(&mut graph, &[alice], &mut tx).unwrap();
    assert!(matches!(tx.writes[0], WriteOp::CreateNode { .. }));
}

#[test]
fn test_generated_uuid_and_initial_version_written_back() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let ticket = graph.add_root(Entity::new("Ticket").with("title", "broken"));
    let mut tx = StubTx::new();

    let report = engine.save(&mut graph, &[ticket], &mut tx).unwrap();

    assert_eq!(report.nodes_created, 1);
    let uuid = graph[ticket].get("uuid").and_then(Value::as_str).unwrap().to_string();
    assert_eq!(uuid.len(), 36);
    assert_eq!(graph[ticket].get("version"), Some(&Value::Int(0)));
    match &tx.writes[0] {
        WriteOp::CreateNode { properties, .. } => {
            assert_eq!(properties.get("uuid"), Some(&Value::String(uuid)));
            assert_eq!(properties.get("version"), Some(&Value::Int(0)));
        }
        other => panic!("unexpected write {other:?}"),
    }
}

#[test]
fn test_internal_identity_assigned_after_create() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let boxed = graph.add_root(Entity::new("Box").with("label", "a"));
    let mut tx = StubTx::new();
    engine.save(&mut graph, &[boxed], &mut tx).unwrap();
    assert_eq!(graph[boxed].get("id"), Some(&Value::Int(101)));

    // A second save updates instead of creating again.
    graph[boxed].set("label", "b");
    engine.save(&mut graph, &[boxed], &mut tx).unwrap();
    match &tx.writes[1] {
        WriteOp::UpdateNode {
            node, properties, ..
        } => {
            assert_eq!(node, &NodeSelector::Id(NodeId(101)));
            assert_eq!(properties.get("label"), Some(&Value::from("b")));
        }
        other => panic!("unexpected write {other:?}"),
    }
}

#[test]
fn test_update_writes_only_changed_mapped_properties() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Person",
        vec![ResultRecord::new().with(
            "n",
            Node::new(1)
                .with_label("Person")
                .with_property("name", "alice")
                .with_property("age", 30i64)
                .with_property("legacy", "keep me"),
        )],
    );
    let alice = graph.roots()[0];
    graph[alice].set("age", 31i64);
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();

    let report = engine.save(&mut graph, &[alice], &mut tx).unwrap();

    assert_eq!(report.nodes_updated, 1);
    match &tx.writes[0] {
        WriteOp::UpdateNode { properties, .. } => {
            assert_eq!(properties.len(), 1);
            assert_eq!(properties.get("age"), Some(&Value::Int(31)));
        }
        other => panic!("unexpected write {other:?}"),
    }
    let snapshot = graph.snapshot(alice).unwrap();
    assert_eq!(snapshot.property("legacy"), Some(&Value::from("keep me")));
    assert_eq!(snapshot.property("age"), Some(&Value::Int(31)));
}

#[test]
fn test_unchanged_entity_executes_nothing() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Person",
        vec![ResultRecord::new().with(
            "n",
            Node::new(1)
                .with_label("Person")
                .with_property("name", "alice"),
        )],
    );
    let alice = graph.roots()[0];
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();
    let report = engine.save(&mut graph, &[alice], &mut tx).unwrap();
    assert_eq!(report.nodes_unchanged, 1);
    assert!(tx.writes.is_empty());
}

#[test]
fn test_clearing_attribute_removes_property() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Person",
        vec![ResultRecord::new().with(
            "n",
            Node::new(1)
                .with_label("Person")
                .with_property("name", "alice")
                .with_property("age", 30i64),
        )],
    );
    let alice = graph.roots()[0];
    graph[alice].set("age", Value::Null);
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();
    engine.save(&mut graph, &[alice], &mut tx).unwrap();
    match &tx.writes[0] {
        WriteOp::UpdateNode { properties, .. } => {
            assert_eq!(properties.get("age"), Some(&Value::Null));
        }
        other => panic!("unexpected write {other:?}"),
    }
    assert!(graph.snapshot(alice).unwrap().property("age").is_none());
}

#[test]
fn test_versioned_update_checks_and_increments() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Ticket",
        vec![ResultRecord::new().with(
            "n",
            Node::new(5)
                .with_label("Ticket")
                .with_property("uuid", "t-1")
                .with_property("title", "old")
                .with_property("version", 3i64),
        )],
    );
    let ticket = graph.roots()[0];
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();

    engine.save(&mut graph, &[ticket], &mut tx).unwrap();

    match &tx.writes[0] {
        WriteOp::UpdateNode { version, .. } => {
            assert_eq!(version.as_ref().and_then(|v| v.expected), Some(3));
        }
        other => panic!("unexpected write {other:?}"),
    }
    assert_eq!(graph[ticket].get("version"), Some(&Value::Int(4)));
}

#[test]
fn test_stale_version_fails_without_write_back() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Ticket",
        vec![ResultRecord::new().with(
            "n",
            Node::new(5)
                .with_label("Ticket")
                .with_property("uuid", "t-1")
                .with_property("version", 3i64),
        )],
    );
    let ticket = graph.roots()[0];
    graph[ticket].set("title", "new");
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();
    tx.update_affects = Some(0);

    let err = engine.save(&mut graph, &[ticket], &mut tx).unwrap_err();

    match err {
        OgmError::StaleState {
            type_name,
            expected,
            ..
        } => {
            assert_eq!(type_name, "Ticket");
            assert_eq!(expected, Some(3));
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(graph[ticket].get("version"), Some(&Value::Int(3)));
}

#[test]
fn test_cycle_saves_each_entity_once() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let b = graph.add(Entity::new("Person").with("name", "b"));
    graph[a].link("friends", Link::to(b));
    graph[b].link("friends", Link::to(a));
    let mut tx = StubTx::new();

    let report = engine.save(&mut graph, &[a], &mut tx).unwrap();

    assert_eq!(report.nodes_merged, 2);
    assert_eq!(report.relationships_created, 2);
    assert!(graph[a].related("friends").unwrap().links()[0].1.relationship_id.is_some());
}

#[test]
fn test_mirrored_link_creates_one_relationship() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let b = graph.add(Entity::new("Person").with("name", "b"));
    graph[a].link("friends", Link::to(b));
    graph[b].link("fans", Link::to(a));
    let mut tx = StubTx::new();

    let report = engine.save(&mut graph, &[a], &mut tx).unwrap();

    assert_eq!(report.relationships_created, 1);
    let forward = graph[a].related("friends").unwrap().links()[0].1.relationship_id;
    let backward = graph[b].related("fans").unwrap().links()[0].1.relationship_id;
    assert!(forward.is_some());
    assert_eq!(forward, backward);
}

#[test]
fn test_mirrored_link_without_deduplication() {
    let registry = registry();
    let config = SaveConfig::default().without_relationship_deduplication();
    let engine = SaveEngine::new(&registry, config);
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let b = graph.add(Entity::new("Person").with("name", "b"));
    graph[a].link("friends", Link::to(b));
    graph[b].link("fans", Link::to(a));
    let mut tx = StubTx::new();
    let report = engine.save(&mut graph, &[a], &mut tx).unwrap();
    assert_eq!(report.relationships_created, 2);
}

#[test]
fn test_removed_link_deletes_relationship() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Person",
        vec![ResultRecord::new()
            .with("n", Node::new(1).with_label("Person").with_property("name", "a"))
            .with("r", Relationship::new(10, "KNOWS", 1, 2))
            .with("m", Node::new(2).with_label("Person").with_property("name", "b"))],
    );
    let a = graph.find(NodeId(1)).unwrap();
    let b = graph.find(NodeId(2)).unwrap();
    graph[a].unlink("friends", b);
    graph[b].unlink("fans", a);
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();

    let report = engine.save(&mut graph, &[a, b], &mut tx).unwrap();

    assert_eq!(report.relationships_deleted, 1);
    assert_eq!(
        tx.writes,
        vec![WriteOp::DeleteRelationship {
            id: RelationshipId(10)
        }]
    );
    assert!(graph.snapshot(a).unwrap().relationships.is_empty());
}

#[test]
fn test_kept_link_is_not_rewritten() {
    let registry = registry();
    let mut graph = load(
        &registry,
        "Person",
        vec![ResultRecord::new()
            .with("n", Node::new(1).with_label("Person").with_property("name", "a"))
            .with("r", Relationship::new(10, "KNOWS", 1, 2))
            .with("m", Node::new(2).with_label("Person").with_property("name", "b"))],
    );
    let a = graph.find(NodeId(1)).unwrap();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut tx = StubTx::new();
    let report = engine.save(&mut graph, &[a], &mut tx).unwrap();
    assert_eq!(report.statements(), 0);
    assert_eq!(report.nodes_unchanged, 2);
}

#[test]
fn test_failed_relationship_write_leaves_graph_untouched() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let b = graph.add(Entity::new("Person").with("name", "b"));
    graph[a].link("friends", Link::to(b));
    let mut tx = StubTx::new();
    tx.fail_on_relationships = true;

    let err = engine.save(&mut graph, &[a], &mut tx).unwrap_err();

    assert!(matches!(err, OgmError::Persistence { .. }));
    assert!(graph[a].native_id.is_none());
    assert!(graph.snapshot(a).is_none());
}

#[test]
fn test_plan_is_pure() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let plan = engine.plan(&graph, &[a]).unwrap();
    assert_eq!(plan.len(), 1);
    assert!(graph[a].native_id.is_none());
}

#[test]
fn test_link_to_foreign_entity_is_a_mapping_error() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut other = ObjectGraph::new();
    other.add(Entity::new("Person").with("name", "x"));
    let foreign = other.add(Entity::new("Person").with("name", "y"));

    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let mut link = Link::to(foreign);
    link.relationship_id = Some(RelationshipId(7));
    graph[a].link("friends", link);

    let err = engine.plan(&graph, &[a]).unwrap_err();
    assert!(matches!(err, OgmError::Mapping(ref m) if m.contains("not part of the graph")));

    let mut tx = StubTx::new();
    assert!(engine.save(&mut graph, &[a], &mut tx).is_err());
    assert!(tx.writes.is_empty());
}

#[test]
fn test_comments_describe_targets() {
    let registry = registry();
    let engine = SaveEngine::new(&registry, SaveConfig::default());
    let mut graph = ObjectGraph::new();
    let a = graph.add_root(Entity::new("Person").with("name", "a"));
    let mut tx = StubTx::new();
    let report = engine.save(&mut graph, &[a], &mut tx).unwrap();
    assert_eq!(
        report.script.statements[0].comment.as_deref(),
        Some("Person a")
    );

    let quiet = SaveEngine::new(&registry, SaveConfig::default().without_comments());
    let b = graph.add_root(Entity::new("Person").with("name", "b"));
    let report = quiet.save(&mut graph, &[b], &mut tx).unwrap();
    assert!(report.script.statements[0].comment.is_none());
}
