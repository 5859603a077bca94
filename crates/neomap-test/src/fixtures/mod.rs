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

//! Canonical test fixtures.
//!
//! - **domain**: type descriptors for the fixture domain
//! - **records**: result record shapes built from one logical graph

mod domain;
pub mod records;

pub use domain::*;

use neomap_core::{Result, SchemaRegistry, TypeDescriptor};

/// Type alias for a list of fixture functions (name, descriptor).
pub type FixtureList = Vec<(&'static str, fn() -> TypeDescriptor)>;

/// Returns all fixture descriptors for iteration.
pub fn all() -> FixtureList {
    vec![
        ("simple_property_container", simple_property_container),
        (
            "simple_property_container_with_version",
            simple_property_container_with_version,
        ),
        (
            "simple_generated_id_property_container",
            simple_generated_id_property_container,
        ),
        (
            "simple_generated_id_property_container_with_version",
            simple_generated_id_property_container_with_version,
        ),
        ("irrelevant_source_container", irrelevant_source_container),
        ("irrelevant_target_container", irrelevant_target_container),
        (
            "relationship_property_container",
            relationship_property_container,
        ),
        (
            "relationship_property_container_no_id",
            relationship_property_container_no_id,
        ),
        ("sku", sku),
        ("range_relation", range_relation),
        ("person", person),
        ("animal", animal),
        ("dog", dog),
        ("cat", cat),
        ("ticket", ticket),
    ]
}

/// A registry of every fixture type.
pub fn try_registry() -> Result<SchemaRegistry> {
    let mut builder = SchemaRegistry::builder();
    builder.register_all(all().into_iter().map(|(_, descriptor)| descriptor()))?;
    builder.build()
}

/// A registry of every fixture type.
///
/// # Panics
///
/// Panics if the fixture descriptors do not form a valid registry.
pub fn registry() -> SchemaRegistry {
    match try_registry() {
        Ok(registry) => registry,
        Err(e) => panic!("fixture registry is invalid: {e}"),
    }
}
