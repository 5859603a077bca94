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

//! Core data model of neomap, an object-graph mapper for property graphs.
//!
//! This crate holds everything that does not talk to a store:
//!
//! - [`TypeDescriptor`]s describe domain types and their annotations
//! - [`derive_schema`] and the [`SchemaRegistry`] turn them into immutable
//!   [`Schema`]s, including inheritance and polymorphic label matching
//! - [`Entity`] and [`ObjectGraph`] hold domain instances in an arena,
//!   addressed by [`EntityRef`], so cyclic graphs need no shared ownership
//! - [`NodeSnapshot`] keeps the last-known raw state of loaded nodes
//! - [`OgmError`] is the error taxonomy shared by every neomap crate
//!
//! # Example
//!
//! ```rust
//! use neomap_core::{AttributeDescriptor, Cardinality, SchemaRegistry, TypeDescriptor, ValueKind};
//!
//! let mut builder = SchemaRegistry::builder();
//! builder
//!     .register(
//!         TypeDescriptor::node("Person")
//!             .attribute(AttributeDescriptor::scalar("name", ValueKind::String).id())
//!             .attribute(AttributeDescriptor::entity(
//!                 "friends",
//!                 "Person",
//!                 Cardinality::Collection,
//!             )),
//!     )
//!     .unwrap();
//! let registry = builder.build().unwrap();
//!
//! let person = registry.schema_for("Person").unwrap();
//! assert_eq!(person.primary_label(), "Person");
//! assert_eq!(person.relationship("friends").unwrap().rel_type.as_deref(), Some("FRIENDS"));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod convert;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod graph;
pub mod identity;
pub mod registry;
pub mod schema;
pub mod snapshot;
pub mod value;

pub use convert::PropertyConverter;
pub use descriptor::{
    Annotation, AttributeDescriptor, DeclaredType, DescriptorKind, GenerationStrategy,
    TypeDescriptor,
};
pub use entity::{Entity, EntityRef, Link, Related};
pub use error::{ExecutionError, OgmError, Result};
pub use graph::ObjectGraph;
pub use identity::{NodeId, RelationshipId};
pub use registry::{SchemaRegistry, SchemaRegistryBuilder};
pub use schema::{
    derive_schema, to_relationship_type, Cardinality, Direction, IdStrategy, IdentityDef,
    PropertyDef, RelationshipDef, Schema, SchemaKind, TargetNodeDef,
};
pub use snapshot::{changed_properties, NodeSnapshot, RelationshipSnapshot};
pub use value::{PropertyMap, Value, ValueKind};
