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

//! Type descriptors: the static, reflection-free description of a domain type.
//!
//! A [`TypeDescriptor`] lists a type's attributes with their declared types
//! and mapping annotations. Descriptors are registered once at startup and
//! derived into [`Schema`](crate::Schema)s by the
//! [`SchemaRegistryBuilder`](crate::SchemaRegistryBuilder).
//!
//! # Example
//!
//! ```
//! use neomap_core::{
//!     AttributeDescriptor, Cardinality, Direction, GenerationStrategy, TypeDescriptor, ValueKind,
//! };
//!
//! let sku = TypeDescriptor::node("Sku")
//!     .label("SKU")
//!     .attribute(
//!         AttributeDescriptor::scalar("id", ValueKind::Int)
//!             .id()
//!             .generated(GenerationStrategy::Internal),
//!     )
//!     .attribute(AttributeDescriptor::scalar("number", ValueKind::Int))
//!     .attribute(
//!         AttributeDescriptor::entity(
//!             "rangeRelationsOut",
//!             "RangeRelation",
//!             Cardinality::Collection,
//!         )
//!         .relationship("RANGE_RELATION_TO", Direction::Outgoing),
//!     );
//! assert_eq!(sku.attributes.len(), 3);
//! ```

use std::sync::Arc;

use crate::convert::PropertyConverter;
use crate::schema::{Cardinality, Direction};
use crate::value::ValueKind;

/// Whether a descriptor describes a node or a relationship's own properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    /// A node entity with labels and an identity.
    Node,
    /// The property holder of a relationship, pointing at its target node.
    RelationshipProperties,
}

/// How a generated identity is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// The database-native node or relationship identity.
    Internal,
    /// A random UUID surrogate stored as a string property.
    Uuid,
}

/// The declared type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclaredType {
    /// A property value of the given kind.
    Scalar(ValueKind),
    /// A reference to another registered type.
    Entity {
        /// The referenced type name.
        type_name: String,
        /// How many instances the attribute holds.
        cardinality: Cardinality,
    },
}

/// A mapping annotation on an attribute.
#[derive(Debug, Clone)]
pub enum Annotation {
    /// The attribute is the identity.
    Id,
    /// The identity is generated by the given strategy.
    GeneratedValue(GenerationStrategy),
    /// The graph property key, when it differs from the attribute name.
    Property(String),
    /// The attribute is the optimistic-locking version.
    Version,
    /// Relationship type and direction of an entity attribute.
    Relationship {
        /// Relationship type; defaults to the attribute name in upper snake case.
        rel_type: Option<String>,
        /// Traversal direction seen from the declaring type.
        direction: Direction,
    },
    /// The target node of a relationship-properties type.
    TargetNode,
    /// The attribute is not mapped.
    Transient,
    /// The attribute must not be null when written.
    NonNull,
    /// Custom conversion for the attribute value.
    Converter(Arc<dyn PropertyConverter>),
}

/// Description of one attribute of a domain type.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    /// The attribute name.
    pub name: String,
    /// The declared type.
    pub declared: DeclaredType,
    /// Mapping annotations in declaration order.
    pub annotations: Vec<Annotation>,
}

impl AttributeDescriptor {
    /// A scalar attribute of the given kind.
    pub fn scalar(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            declared: DeclaredType::Scalar(kind),
            annotations: Vec::new(),
        }
    }

    /// An attribute referencing another registered type.
    pub fn entity(
        name: impl Into<String>,
        type_name: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            declared: DeclaredType::Entity {
                type_name: type_name.into(),
                cardinality,
            },
            annotations: Vec::new(),
        }
    }

    /// Add an annotation.
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Mark as the identity attribute.
    pub fn id(self) -> Self {
        self.annotate(Annotation::Id)
    }

    /// Mark the identity as generated.
    pub fn generated(self, strategy: GenerationStrategy) -> Self {
        self.annotate(Annotation::GeneratedValue(strategy))
    }

    /// Map to a graph property key other than the attribute name.
    pub fn property(self, key: impl Into<String>) -> Self {
        self.annotate(Annotation::Property(key.into()))
    }

    /// Mark as the version attribute.
    pub fn version(self) -> Self {
        self.annotate(Annotation::Version)
    }

    /// Set relationship type and direction.
    pub fn relationship(self, rel_type: impl Into<String>, direction: Direction) -> Self {
        self.annotate(Annotation::Relationship {
            rel_type: Some(rel_type.into()),
            direction,
        })
    }

    /// Set only the relationship direction; the type is taken from the
    /// attribute name, or from the map key for keyed attributes.
    pub fn direction(self, direction: Direction) -> Self {
        self.annotate(Annotation::Relationship {
            rel_type: None,
            direction,
        })
    }

    /// Mark as the target node of a relationship-properties type.
    pub fn target_node(self) -> Self {
        self.annotate(Annotation::TargetNode)
    }

    /// Exclude from mapping.
    pub fn transient(self) -> Self {
        self.annotate(Annotation::Transient)
    }

    /// Reject null values on write.
    pub fn non_null(self) -> Self {
        self.annotate(Annotation::NonNull)
    }

    /// Use a custom converter.
    pub fn converter(self, converter: Arc<dyn PropertyConverter>) -> Self {
        self.annotate(Annotation::Converter(converter))
    }

    /// Whether an annotation matching the predicate is present.
    pub fn has(&self, predicate: impl Fn(&Annotation) -> bool) -> bool {
        self.annotations.iter().any(predicate)
    }

    pub(crate) fn is_id(&self) -> bool {
        self.has(|a| matches!(a, Annotation::Id))
    }

    pub(crate) fn is_version(&self) -> bool {
        self.has(|a| matches!(a, Annotation::Version))
    }

    pub(crate) fn is_transient(&self) -> bool {
        self.has(|a| matches!(a, Annotation::Transient))
    }

    pub(crate) fn is_target_node(&self) -> bool {
        self.has(|a| matches!(a, Annotation::TargetNode))
    }

    pub(crate) fn generation(&self) -> Option<GenerationStrategy> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::GeneratedValue(s) => Some(*s),
            _ => None,
        })
    }

    pub(crate) fn property_key(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Property(key) => Some(key.as_str()),
            _ => None,
        })
    }

    pub(crate) fn relationship_annotation(&self) -> Option<(Option<&str>, Direction)> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Relationship {
                rel_type,
                direction,
            } => Some((rel_type.as_deref(), *direction)),
            _ => None,
        })
    }

    pub(crate) fn custom_converter(&self) -> Option<Arc<dyn PropertyConverter>> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::Converter(c) => Some(Arc::clone(c)),
            _ => None,
        })
    }
}

/// Description of a domain type, supplied once at startup.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// The type name used to look up its schema.
    pub name: String,
    /// Node or relationship-properties type.
    pub kind: DescriptorKind,
    /// Own labels; the first is the primary label. Defaults to the type name.
    pub labels: Vec<String>,
    /// The base type this type extends.
    pub parent: Option<String>,
    /// Attributes in declaration order.
    pub attributes: Vec<AttributeDescriptor>,
}

impl TypeDescriptor {
    /// Describe a node type.
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DescriptorKind::Node,
            labels: Vec::new(),
            parent: None,
            attributes: Vec::new(),
        }
    }

    /// Describe a relationship-properties type.
    pub fn relationship_properties(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DescriptorKind::RelationshipProperties,
            labels: Vec::new(),
            parent: None,
            attributes: Vec::new(),
        }
    }

    /// Add a label. The first label added is the primary label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Extend a base type.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add an attribute.
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Own labels, falling back to the type name.
    pub fn own_labels(&self) -> Vec<String> {
        if self.labels.is_empty() {
            vec![self.name.clone()]
        } else {
            self.labels.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_labels_default_to_name() {
        let d = TypeDescriptor::node("Person");
        assert_eq!(d.own_labels(), vec!["Person".to_string()]);

        let d = TypeDescriptor::node("Sku").label("SKU");
        assert_eq!(d.own_labels(), vec!["SKU".to_string()]);
    }

    #[test]
    fn test_attribute_annotations() {
        let a = AttributeDescriptor::scalar("id", ValueKind::Int)
            .id()
            .generated(GenerationStrategy::Internal);
        assert!(a.is_id());
        assert_eq!(a.generation(), Some(GenerationStrategy::Internal));
        assert!(!a.is_version());

        let b = AttributeDescriptor::scalar("name", ValueKind::String).property("full_name");
        assert_eq!(b.property_key(), Some("full_name"));
    }

    #[test]
    fn test_relationship_annotation() {
        let a = AttributeDescriptor::entity("friends", "Person", Cardinality::Collection)
            .relationship("KNOWS", Direction::Undirected);
        assert_eq!(
            a.relationship_annotation(),
            Some((Some("KNOWS"), Direction::Undirected))
        );
        let b = AttributeDescriptor::entity("likes", "Thing", Cardinality::Keyed)
            .direction(Direction::Incoming);
        assert_eq!(b.relationship_annotation(), Some((None, Direction::Incoming)));
    }
}
