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

//! # neomap - object-graph mapping for property graphs
//!
//! neomap maps plain domain types onto the nodes and relationships of a
//! property graph database. Types are described once, at startup, by
//! [`TypeDescriptor`]s; the resulting [`SchemaRegistry`] drives reading query
//! results into an [`ObjectGraph`] and merge-saving modified graphs back.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use neomap::prelude::*;
//! # use neomap_test::MemoryGraph;
//!
//! let mut builder = SchemaRegistry::builder();
//! builder
//!     .register(
//!         TypeDescriptor::node("Movie")
//!             .attribute(AttributeDescriptor::scalar("title", ValueKind::String).id())
//!             .attribute(AttributeDescriptor::scalar("released", ValueKind::Int)),
//!     )
//!     .unwrap();
//! let registry = Arc::new(builder.build().unwrap());
//!
//! # let provider = MemoryGraph::new();
//! let template = Neo4jTemplate::new(registry, provider);
//!
//! let mut graph = ObjectGraph::new();
//! let movie = graph.add_root(
//!     Entity::new("Movie")
//!         .with("title", "Heat")
//!         .with("released", 1995i64),
//! );
//! template.save(&mut graph, movie).unwrap();
//! assert!(graph[movie].native_id.is_some());
//!
//! let loaded = template.find_by_id("Movie", "Heat").unwrap().unwrap();
//! let root = loaded.root().unwrap();
//! assert_eq!(loaded[root].get("released"), Some(&Value::Int(1995)));
//! ```
//!
//! ## Features
//!
//! - **Unknown properties survive**: saves only write mapped properties that
//!   changed since loading
//! - **Identity strategies**: assigned, store-generated and UUID identities
//! - **Optimistic locking**: version attributes guard concurrent updates
//! - **Polymorphism**: nodes resolve to the most specific matching subtype
//! - **Cycles**: object graphs live in an arena and may contain cycles
//!
//! ## Modules
//!
//! - [`core`]: descriptors, schemas, values and the object graph
//! - [`cypher`]: reconstruction, merge-save, Cypher rendering and the facade
//! - `stream`: asynchronous record consumption (feature = "async")
//!
//! The `serde` feature derives serialization for the value and schema enums.

pub use neomap_core as core;
pub use neomap_cypher as cypher;
#[cfg(feature = "async")]
pub use neomap_stream as stream;

pub use neomap_core::{
    AttributeDescriptor, Cardinality, Direction, Entity, EntityRef, ExecutionError,
    GenerationStrategy, Link, NodeId, ObjectGraph, OgmError, PropertyMap, RelationshipId, Result,
    SchemaRegistry, TypeDescriptor, Value, ValueKind,
};
pub use neomap_cypher::{
    Neo4jTemplate, ReconstructConfig, SaveConfig, SaveReport, TemplateConfig, Transaction,
    TransactionProvider,
};

pub mod prelude {
    //! Everything needed to describe types and use the facade.
    pub use neomap_core::{
        AttributeDescriptor, Cardinality, Direction, Entity, GenerationStrategy, Link,
        ObjectGraph, OgmError, SchemaRegistry, TypeDescriptor, Value, ValueKind,
    };
    pub use neomap_cypher::{Neo4jTemplate, TemplateConfig};
}
