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

//! Domain type descriptors shared by the integration tests.

use neomap_core::{
    AttributeDescriptor as Attr, Cardinality, Direction, GenerationStrategy, TypeDescriptor,
    ValueKind,
};

fn internal_id() -> Attr {
    Attr::scalar("id", ValueKind::Int)
        .id()
        .generated(GenerationStrategy::Internal)
}

/// Assigned string id, one mapped property.
pub fn simple_property_container() -> TypeDescriptor {
    TypeDescriptor::node("SimplePropertyContainer")
        .attribute(Attr::scalar("id", ValueKind::String).id())
        .attribute(Attr::scalar("knownProperty", ValueKind::String))
}

/// Assigned string id with a version attribute.
pub fn simple_property_container_with_version() -> TypeDescriptor {
    TypeDescriptor::node("SimplePropertyContainerWithVersion")
        .attribute(Attr::scalar("id", ValueKind::String).id())
        .attribute(Attr::scalar("version", ValueKind::Int).version())
        .attribute(Attr::scalar("knownProperty", ValueKind::String))
}

/// Store-generated id, one mapped property.
pub fn simple_generated_id_property_container() -> TypeDescriptor {
    TypeDescriptor::node("SimpleGeneratedIDPropertyContainer")
        .attribute(internal_id())
        .attribute(Attr::scalar("knownProperty", ValueKind::String))
}

/// Store-generated id with a version attribute.
pub fn simple_generated_id_property_container_with_version() -> TypeDescriptor {
    TypeDescriptor::node("SimpleGeneratedIDPropertyContainerWithVersion")
        .attribute(internal_id())
        .attribute(Attr::scalar("version", ValueKind::Int).version())
        .attribute(Attr::scalar("knownProperty", ValueKind::String))
}

/// Source of two relationships carrying their own properties.
pub fn irrelevant_source_container() -> TypeDescriptor {
    TypeDescriptor::node("IrrelevantSourceContainer")
        .attribute(internal_id())
        .attribute(
            Attr::entity(
                "relationshipPropertyContainer",
                "RelationshipPropertyContainer",
                Cardinality::Single,
            )
            .relationship("RELATIONSHIP_PROPERTY_CONTAINER", Direction::Outgoing),
        )
        .attribute(
            Attr::entity(
                "relationshipPropertyContainerNoId",
                "RelationshipPropertyContainerNoId",
                Cardinality::Single,
            )
            .relationship("RELATIONSHIP_PROPERTY_CONTAINER_NO_ID", Direction::Outgoing),
        )
}

/// Target of the relationship-properties fixtures.
pub fn irrelevant_target_container() -> TypeDescriptor {
    TypeDescriptor::node("IrrelevantTargetContainer").attribute(internal_id())
}

/// Relationship properties with a generated id.
pub fn relationship_property_container() -> TypeDescriptor {
    TypeDescriptor::relationship_properties("RelationshipPropertyContainer")
        .attribute(internal_id())
        .attribute(Attr::scalar("knownProperty", ValueKind::String))
        .attribute(
            Attr::entity(
                "irrelevantTargetContainer",
                "IrrelevantTargetContainer",
                Cardinality::Single,
            )
            .target_node(),
        )
}

/// Relationship properties without an id attribute.
pub fn relationship_property_container_no_id() -> TypeDescriptor {
    TypeDescriptor::relationship_properties("RelationshipPropertyContainerNoId")
        .attribute(Attr::scalar("knownProperty", ValueKind::String))
        .attribute(
            Attr::entity(
                "irrelevantTargetContainer",
                "IrrelevantTargetContainer",
                Cardinality::Single,
            )
            .target_node(),
        )
}

/// Stock keeping unit, labelled `SKU`, related to other SKUs in both
/// directions over the same relationship type.
pub fn sku() -> TypeDescriptor {
    TypeDescriptor::node("Sku")
        .label("SKU")
        .attribute(internal_id())
        .attribute(Attr::scalar("number", ValueKind::Int).property("number"))
        .attribute(Attr::scalar("name", ValueKind::String).property("name"))
        .attribute(
            Attr::entity("rangeRelationsOut", "RangeRelation", Cardinality::Collection)
                .relationship("RANGE_RELATION_TO", Direction::Outgoing),
        )
        .attribute(
            Attr::entity("rangeRelationsIn", "RangeRelation", Cardinality::Collection)
                .relationship("RANGE_RELATION_TO", Direction::Incoming),
        )
}

/// Properties of a `RANGE_RELATION_TO` relationship between SKUs.
pub fn range_relation() -> TypeDescriptor {
    TypeDescriptor::relationship_properties("RangeRelation")
        .attribute(internal_id())
        .attribute(Attr::scalar("minDelta", ValueKind::Float))
        .attribute(Attr::scalar("maxDelta", ValueKind::Float))
        .attribute(Attr::scalar("relationType", ValueKind::String))
        .attribute(Attr::entity("targetSku", "Sku", Cardinality::Single).target_node())
}

/// People who know each other; cycles are common.
pub fn person() -> TypeDescriptor {
    TypeDescriptor::node("Person")
        .attribute(Attr::scalar("name", ValueKind::String).id())
        .attribute(Attr::scalar("age", ValueKind::Int))
        .attribute(
            Attr::entity("friends", "Person", Cardinality::Collection)
                .relationship("KNOWS", Direction::Outgoing),
        )
        .attribute(
            Attr::entity("pets", "Animal", Cardinality::Collection)
                .relationship("OWNS", Direction::Outgoing),
        )
}

/// Root of a small type hierarchy.
pub fn animal() -> TypeDescriptor {
    TypeDescriptor::node("Animal").attribute(Attr::scalar("name", ValueKind::String).id())
}

/// `Animal` subtype.
pub fn dog() -> TypeDescriptor {
    TypeDescriptor::node("Dog")
        .extends("Animal")
        .attribute(Attr::scalar("goodBoy", ValueKind::Bool))
}

/// `Animal` subtype.
pub fn cat() -> TypeDescriptor {
    TypeDescriptor::node("Cat")
        .extends("Animal")
        .attribute(Attr::scalar("lives", ValueKind::Int))
}

/// Generated UUID identity with a version attribute.
pub fn ticket() -> TypeDescriptor {
    TypeDescriptor::node("Ticket")
        .attribute(
            Attr::scalar("uuid", ValueKind::String)
                .id()
                .generated(GenerationStrategy::Uuid),
        )
        .attribute(Attr::scalar("version", ValueKind::Int).version())
        .attribute(Attr::scalar("title", ValueKind::String).non_null())
}
