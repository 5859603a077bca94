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

//! Reading and writing neomap object graphs through Cypher.
//!
//! This crate provides:
//! - [`reconstruct`]: fold query result records into a deduplicated
//!   [`ObjectGraph`](neomap_core::ObjectGraph), whatever the row shape
//! - [`SaveEngine`]: merge-save a modified graph, writing only mapped
//!   properties that changed and leaving every other stored property alone
//! - [`Neo4jTemplate`]: the find/save/delete facade over a
//!   [`TransactionProvider`]
//!
//! # Mapping Strategy
//!
//! | Domain concept | Graph representation |
//! |----------------|---------------------|
//! | Type | Node labels (own label plus every ancestor's) |
//! | Assigned identity | Unique node property |
//! | Internal identity | Native node id |
//! | UUID identity | Generated node property |
//! | Version attribute | Numeric property, incremented on every update |
//! | Relationship attribute | Typed relationship, by direction |
//! | Relationship-properties type | Relationship with its own properties |
//! | Map-keyed relationship attribute | Relationships of any unclaimed type |
//!
//! # Example: Reconstruction
//!
//! ```rust
//! use neomap_core::{
//!     AttributeDescriptor, Cardinality, Direction, SchemaRegistry, TypeDescriptor, ValueKind,
//! };
//! use neomap_cypher::{reconstruct, Node, ReconstructConfig, Relationship, ResultRecord};
//!
//! let mut builder = SchemaRegistry::builder();
//! builder
//!     .register(
//!         TypeDescriptor::node("Person")
//!             .attribute(AttributeDescriptor::scalar("name", ValueKind::String).id())
//!             .attribute(
//!                 AttributeDescriptor::entity("friends", "Person", Cardinality::Collection)
//!                     .relationship("KNOWS", Direction::Outgoing),
//!             ),
//!     )
//!     .unwrap();
//! let registry = builder.build().unwrap();
//!
//! // The same root in two rows, one relationship per row.
//! let alice = Node::new(1).with_label("Person").with_property("name", "alice");
//! let records = vec![
//!     ResultRecord::new()
//!         .with("n", alice.clone())
//!         .with("r", Relationship::new(10, "KNOWS", 1, 2))
//!         .with("m", Node::new(2).with_label("Person").with_property("name", "bob")),
//!     ResultRecord::new()
//!         .with("n", alice)
//!         .with("r", Relationship::new(11, "KNOWS", 1, 3))
//!         .with("m", Node::new(3).with_label("Person").with_property("name", "carol")),
//! ];
//!
//! let graph = reconstruct(&registry, "Person", ReconstructConfig::default(), records).unwrap();
//! let root = graph.root().unwrap();
//! assert_eq!(graph.roots().len(), 1);
//! assert_eq!(graph[root].targets("friends").len(), 2);
//! ```
//!
//! # Generated Cypher Format
//!
//! Writes are parameterized; identifiers are escaped with backticks when
//! needed:
//!
//! ```cypher
//! // Person alice
//! MERGE (n:Person {name: $value}) SET n += $props RETURN id(n) AS id
//!
//! // Ticket t-1
//! MATCH (n) WHERE id(n) = $id AND n.version = $expected
//! SET n += $props, n.version = n.version + 1 RETURN id(n) AS id
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod cypher;
pub mod executor;
pub mod identity;
pub mod ops;
pub mod reconstruct;
pub mod record;
pub mod save;
pub mod template;
pub mod version;

// Re-export main types at crate root for convenience
pub use config::{
    ReconstructConfig, ReconstructConfigBuilder, SaveConfig, SaveConfigBuilder, TemplateConfig,
};
pub use cypher::{CypherScript, CypherStatement, StatementType};
pub use executor::{
    in_transaction, RecordIter, Transaction, TransactionProvider, TransactionScope, WriteSummary,
};
pub use identity::{IdGenerator, UuidGenerator};
pub use ops::{
    NodeSelector, ReadOp, VersionCheck, WriteOp, NODES_COLUMN, RELATIONSHIPS_COLUMN, ROOT_COLUMN,
};
pub use reconstruct::{reconstruct, Reconstructor};
pub use record::{Node, RecordValue, Relationship, ResultRecord};
pub use save::{SaveEngine, SavePlan, SaveReport};
pub use template::Neo4jTemplate;
