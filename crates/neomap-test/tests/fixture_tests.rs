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

//! Sanity checks for the shared fixtures.

use std::collections::BTreeSet;

use neomap_core::{OgmError, Value};
use neomap_cypher::{reconstruct, Node, ReconstructConfig, Relationship};
use neomap_test::{fixtures, GraphShape};

fn labels(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ==================== Registry ====================

#[test]
fn test_every_fixture_is_registered() {
    let registry = fixtures::registry();
    assert_eq!(registry.len(), fixtures::all().len());
    for (name, descriptor) in fixtures::all() {
        let type_name = descriptor().name;
        assert!(
            registry.get(&type_name).is_some(),
            "fixture {name} ({type_name}) is missing"
        );
    }
}

#[test]
fn test_subtypes_resolve_most_specific() {
    let registry = fixtures::registry();
    let dog = registry.resolve(&labels(&["Dog", "Animal"]), None).unwrap();
    assert_eq!(dog.map(|s| s.type_name.as_str()), Some("Dog"));

    let animal = registry.resolve(&labels(&["Animal"]), Some("Animal")).unwrap();
    assert_eq!(animal.map(|s| s.type_name.as_str()), Some("Animal"));

    assert!(registry.is_assignable("Cat", "Animal"));
    assert!(!registry.is_assignable("Animal", "Cat"));
}

#[test]
fn test_unknown_fixture_type_is_not_found() {
    let registry = fixtures::registry();
    assert!(matches!(
        registry.schema_for("Unicorn"),
        Err(OgmError::SchemaNotFound(_))
    ));
}

// ==================== Record shapes ====================

fn owner_with_pets() -> GraphShape {
    GraphShape::new()
        .root(Node::new(1).with_label("Person").with_property("name", "ann"))
        .node(
            Node::new(2)
                .with_labels(["Dog", "Animal"])
                .with_property("name", "rex")
                .with_property("goodBoy", true),
        )
        .node(
            Node::new(3)
                .with_labels(["Cat", "Animal"])
                .with_property("name", "tom")
                .with_property("lives", 9i64),
        )
        .relationship(Relationship::new(10, "OWNS", 1, 2))
        .relationship(Relationship::new(11, "OWNS", 1, 3))
}

#[test]
fn test_shapes_produce_expected_row_counts() {
    let shape = owner_with_pets();
    assert_eq!(shape.aggregated().len(), 1);
    assert_eq!(shape.row_per_relationship().len(), 2);
    assert_eq!(shape.chunked(1).len(), 2);
    assert_eq!(shape.reversed(5).len(), 1);
}

#[test]
fn test_polymorphic_pets_reconstruct_to_subtypes() {
    let registry = fixtures::registry();
    let graph = reconstruct(
        &registry,
        "Person",
        ReconstructConfig::default(),
        owner_with_pets().row_per_relationship(),
    )
    .unwrap();

    let root = graph.root().unwrap();
    let mut pets: Vec<(String, Option<Value>)> = graph[root]
        .targets("pets")
        .into_iter()
        .map(|r| (graph[r].type_name.clone(), graph[r].get("name").cloned()))
        .collect();
    pets.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        pets,
        vec![
            ("Cat".to_string(), Some(Value::from("tom"))),
            ("Dog".to_string(), Some(Value::from("rex"))),
        ]
    );
}
