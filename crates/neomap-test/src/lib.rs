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

//! Shared test fixtures and an in-memory store for neomap.
//!
//! # Features
//!
//! - **Domain fixtures**: type descriptors covering assigned, generated and
//!   UUID identities, versioning, relationship properties, bidirectional
//!   relationships and type hierarchies
//! - **Record shapes**: one logical graph rendered as aggregated, flattened
//!   or chunked result records
//! - **MemoryGraph**: a transactional property graph implementing the
//!   `neomap-cypher` collaborator traits, with failure injection
//!
//! # Quick Start
//!
//! ```rust
//! use neomap_core::PropertyMap;
//! use neomap_test::{fixtures, template};
//!
//! let (template, store) = template();
//! let mut props = PropertyMap::new();
//! props.insert("id".into(), "id1".into());
//! props.insert("knownProperty".into(), "A".into());
//! store.create_node(&["SimplePropertyContainer"], props);
//!
//! let graph = template.find_by_id("SimplePropertyContainer", "id1").unwrap().unwrap();
//! assert_eq!(graph.roots().len(), 1);
//! # let _ = fixtures::all();
//! ```

#![deny(missing_docs)]

pub mod fixtures;
pub mod store;

use std::sync::Arc;

use neomap_cypher::Neo4jTemplate;

pub use fixtures::records::GraphShape;
pub use store::{MemoryGraph, MemoryTransaction, TransactionStats};

/// A template over the fixture registry and a fresh store sharing its graph.
pub fn template() -> (Neo4jTemplate<MemoryGraph>, MemoryGraph) {
    let store = MemoryGraph::new();
    let template = Neo4jTemplate::new(Arc::new(fixtures::registry()), store.clone());
    (template, store)
}
