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

//! Derived schemas: the mapping between a domain type and its graph form.
//!
//! [`derive_schema`] turns one [`TypeDescriptor`] (plus the already derived
//! schema of its base type) into a [`Schema`]. Derivation is deterministic:
//! attributes keep declaration order, inherited members come first, and
//! every combination of annotations either maps to exactly one schema or
//! fails with [`OgmError::SchemaConflict`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::convert::{self, PropertyConverter};
use crate::descriptor::{
    AttributeDescriptor, DeclaredType, DescriptorKind, GenerationStrategy, TypeDescriptor,
};
use crate::error::{OgmError, Result};
use crate::value::{Value, ValueKind};

/// Node or relationship-properties schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchemaKind {
    /// Maps to a node.
    Node,
    /// Maps to the properties of a relationship.
    RelationshipProperties,
}

/// Relationship direction, seen from the declaring type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// `(self)-[:TYPE]->(target)`
    Outgoing,
    /// `(self)<-[:TYPE]-(target)`
    Incoming,
    /// Either direction on read, outgoing on write.
    Undirected,
}

impl Direction {
    /// Whether a relationship starting at the declaring node matches.
    pub fn matches_start(self) -> bool {
        matches!(self, Direction::Outgoing | Direction::Undirected)
    }

    /// Whether a relationship ending at the declaring node matches.
    pub fn matches_end(self) -> bool {
        matches!(self, Direction::Incoming | Direction::Undirected)
    }
}

/// How many related instances a relationship attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cardinality {
    /// Zero or one related instance.
    Single,
    /// Any number of related instances.
    Collection,
    /// Related instances grouped by relationship type.
    Keyed,
}

/// How an entity obtains its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IdStrategy {
    /// The caller supplies the value.
    Assigned,
    /// The store-native identity is copied onto the attribute.
    GeneratedInternal,
    /// A random UUID is stored as a property.
    GeneratedUuid,
}

/// Identity attribute of a schema.
#[derive(Debug, Clone)]
pub struct IdentityDef {
    /// The attribute name.
    pub attribute: String,
    /// Graph property key; `None` for the store-native identity.
    pub key: Option<String>,
    /// How the identity is obtained.
    pub strategy: IdStrategy,
    /// Declared attribute kind.
    pub kind: ValueKind,
    /// Custom converter, if any.
    pub converter: Option<Arc<dyn PropertyConverter>>,
}

impl IdentityDef {
    /// Whether the identity is produced on save.
    pub fn is_generated(&self) -> bool {
        self.strategy != IdStrategy::Assigned
    }

    /// Whether the identity is the store-native one.
    pub fn is_internal(&self) -> bool {
        self.strategy == IdStrategy::GeneratedInternal
    }

    /// Read the identity from a raw property value.
    pub fn read(&self, raw: &Value) -> Result<Value> {
        convert::read_value(&self.attribute, self.kind, self.converter.as_deref(), raw)
    }

    /// Convert an identity value for storage.
    pub fn write(&self, value: &Value) -> Result<Value> {
        convert::write_value(&self.attribute, self.kind, self.converter.as_deref(), value)
    }
}

/// A mapped scalar attribute.
#[derive(Debug, Clone)]
pub struct PropertyDef {
    /// The attribute name.
    pub attribute: String,
    /// The graph property key.
    pub key: String,
    /// Declared attribute kind.
    pub kind: ValueKind,
    /// Whether null is accepted on write.
    pub nullable: bool,
    /// Custom converter, if any.
    pub converter: Option<Arc<dyn PropertyConverter>>,
}

impl PropertyDef {
    /// Read the attribute value from a raw property value.
    pub fn read(&self, raw: &Value) -> Result<Value> {
        convert::read_value(&self.attribute, self.kind, self.converter.as_deref(), raw)
    }

    /// Convert an attribute value for storage.
    pub fn write(&self, value: &Value) -> Result<Value> {
        if value.is_null() && !self.nullable {
            return Err(OgmError::conversion(&self.attribute, "value must not be null"));
        }
        convert::write_value(&self.attribute, self.kind, self.converter.as_deref(), value)
    }
}

/// A relationship attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipDef {
    /// The attribute name.
    pub attribute: String,
    /// Relationship type; `None` for keyed attributes, where the map key is the type.
    pub rel_type: Option<String>,
    /// Direction seen from the declaring type.
    pub direction: Direction,
    /// The related node type.
    pub target: String,
    /// Single, collection or keyed.
    pub cardinality: Cardinality,
    /// The relationship-properties type carried by each link, if any.
    pub properties: Option<String>,
}

impl RelationshipDef {
    /// Whether a relationship of `rel_type` belongs to this attribute by type.
    pub fn accepts_type(&self, rel_type: &str) -> bool {
        match &self.rel_type {
            Some(t) => t == rel_type,
            None => true,
        }
    }

    /// Whether this attribute collects relationships of any type.
    pub fn is_dynamic(&self) -> bool {
        self.rel_type.is_none()
    }
}

/// The target node attribute of a relationship-properties schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetNodeDef {
    /// The attribute name.
    pub attribute: String,
    /// The target node type.
    pub target: String,
}

/// Derived mapping of one domain type.
#[derive(Debug, Clone)]
pub struct Schema {
    /// The type name.
    pub type_name: String,
    /// Node or relationship properties.
    pub kind: SchemaKind,
    /// Own labels first (primary label at index 0), then inherited labels.
    pub labels: Vec<String>,
    /// The base type, if any.
    pub parent: Option<String>,
    /// Identity attribute; always present on node schemas.
    pub identity: Option<IdentityDef>,
    /// Optimistic-locking version attribute.
    pub version: Option<PropertyDef>,
    /// Mapped scalar attributes, inherited first.
    pub properties: Vec<PropertyDef>,
    /// Relationship attributes, inherited first.
    pub relationships: Vec<RelationshipDef>,
    /// Target node of a relationship-properties schema.
    pub target_node: Option<TargetNodeDef>,
}

impl Schema {
    /// The primary label.
    pub fn primary_label(&self) -> &str {
        self.labels
            .first()
            .map(String::as_str)
            .unwrap_or(&self.type_name)
    }

    /// Whether the schema maps a node.
    pub fn is_node(&self) -> bool {
        self.kind == SchemaKind::Node
    }

    /// Whether saves are guarded by a version attribute.
    pub fn is_versioned(&self) -> bool {
        self.version.is_some()
    }

    /// Look up a property by attribute name.
    pub fn property(&self, attribute: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.attribute == attribute)
    }

    /// Look up a property by graph key.
    pub fn property_by_key(&self, key: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Look up a relationship by attribute name.
    pub fn relationship(&self, attribute: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.attribute == attribute)
    }

    /// All graph property keys this schema writes.
    pub fn mapped_keys(&self) -> impl Iterator<Item = &str> + '_ {
        let id_key = self.identity.as_ref().and_then(|i| i.key.as_deref());
        let version_key = self.version.as_ref().map(|v| v.key.as_str());
        id_key
            .into_iter()
            .chain(version_key)
            .chain(self.properties.iter().map(|p| p.key.as_str()))
    }

    /// Whether a graph property key is owned by this schema.
    pub fn is_mapped_key(&self, key: &str) -> bool {
        self.mapped_keys().any(|k| k == key)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(:{})", self.type_name, self.labels.join(":"))
    }
}

/// Default relationship type for an attribute: `rangeRelationsOut` becomes
/// `RANGE_RELATIONS_OUT`.
pub fn to_relationship_type(attribute: &str) -> String {
    let mut out = String::with_capacity(attribute.len() + 4);
    let mut prev_lower = false;
    for c in attribute.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.extend(c.to_uppercase());
    }
    out
}

/// Derive the schema of a type from its descriptor and its base schema.
///
/// `parent` must be the derived schema of `descriptor.parent`; passing it is
/// the caller's job (the registry derives base types first).
pub fn derive_schema(descriptor: &TypeDescriptor, parent: Option<&Schema>) -> Result<Schema> {
    let name = &descriptor.name;
    let kind = match descriptor.kind {
        DescriptorKind::Node => SchemaKind::Node,
        DescriptorKind::RelationshipProperties => SchemaKind::RelationshipProperties,
    };
    for label in &descriptor.own_labels() {
        checked_identifier(label)?;
    }

    let mut schema = match parent {
        Some(base) => {
            if base.kind != kind {
                return Err(OgmError::conflict(
                    name,
                    format!("cannot extend '{}' of a different kind", base.type_name),
                ));
            }
            let mut labels = descriptor.own_labels();
            for label in &base.labels {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
            Schema {
                type_name: name.clone(),
                kind,
                labels,
                parent: Some(base.type_name.clone()),
                identity: base.identity.clone(),
                version: base.version.clone(),
                properties: base.properties.clone(),
                relationships: base.relationships.clone(),
                target_node: base.target_node.clone(),
            }
        }
        None => Schema {
            type_name: name.clone(),
            kind,
            labels: descriptor.own_labels(),
            parent: None,
            identity: None,
            version: None,
            properties: Vec::new(),
            relationships: Vec::new(),
            target_node: None,
        },
    };

    for attr in &descriptor.attributes {
        if attr.is_transient() {
            continue;
        }
        if is_declared(&schema, &attr.name) {
            return Err(OgmError::conflict(
                name,
                format!("attribute '{}' is declared twice", attr.name),
            ));
        }
        derive_attribute(&mut schema, attr)?;
    }

    match schema.kind {
        SchemaKind::Node if schema.identity.is_none() => {
            return Err(OgmError::conflict(name, "no identity attribute"));
        }
        SchemaKind::RelationshipProperties if schema.target_node.is_none() => {
            return Err(OgmError::conflict(name, "no target node attribute"));
        }
        _ => {}
    }

    check_unique_keys(&schema)?;
    Ok(schema)
}

fn is_declared(schema: &Schema, attribute: &str) -> bool {
    schema
        .identity
        .as_ref()
        .is_some_and(|i| i.attribute == attribute)
        || schema.version.as_ref().is_some_and(|v| v.attribute == attribute)
        || schema.property(attribute).is_some()
        || schema.relationship(attribute).is_some()
        || schema
            .target_node
            .as_ref()
            .is_some_and(|t| t.attribute == attribute)
}

/// Labels, relationship types and property keys must be non-blank and free
/// of NUL characters; anything else is quoted when rendered.
fn checked_identifier(s: &str) -> Result<&str> {
    if s.trim().is_empty() || s.contains('\0') {
        Err(OgmError::InvalidIdentifier(s.to_string()))
    } else {
        Ok(s)
    }
}

fn derive_attribute(schema: &mut Schema, attr: &AttributeDescriptor) -> Result<()> {
    let type_name = schema.type_name.clone();
    let conflict = |reason: String| Err(OgmError::conflict(&type_name, reason));

    let generation = attr.generation();
    if generation.is_some() && !attr.is_id() {
        return conflict(format!(
            "'{}' has a generated value but is not the identity",
            attr.name
        ));
    }

    match &attr.declared {
        DeclaredType::Entity {
            type_name: target,
            cardinality,
        } => {
            if attr.is_id() || attr.is_version() || attr.property_key().is_some() {
                return conflict(format!(
                    "entity attribute '{}' cannot be an identity, version or property",
                    attr.name
                ));
            }
            if attr.is_target_node() {
                if schema.kind != SchemaKind::RelationshipProperties {
                    return conflict(format!(
                        "'{}': target node is only allowed on relationship properties",
                        attr.name
                    ));
                }
                if schema.target_node.is_some() {
                    return conflict("more than one target node attribute".to_string());
                }
                if *cardinality != Cardinality::Single {
                    return conflict(format!("target node '{}' must be single", attr.name));
                }
                schema.target_node = Some(TargetNodeDef {
                    attribute: attr.name.clone(),
                    target: target.clone(),
                });
                return Ok(());
            }
            if schema.kind == SchemaKind::RelationshipProperties {
                return conflict(format!(
                    "relationship properties cannot declare relationship '{}'",
                    attr.name
                ));
            }
            let (rel_type, direction) = attr
                .relationship_annotation()
                .unwrap_or((None, Direction::Outgoing));
            let rel_type = match (cardinality, rel_type) {
                (Cardinality::Keyed, Some(t)) => {
                    return conflict(format!(
                        "keyed relationship '{}' cannot declare type '{}'",
                        attr.name, t
                    ));
                }
                (Cardinality::Keyed, None) => None,
                (_, Some(t)) => Some(checked_identifier(t)?.to_string()),
                (_, None) => Some(to_relationship_type(&attr.name)),
            };
            schema.relationships.push(RelationshipDef {
                attribute: attr.name.clone(),
                rel_type,
                direction,
                target: target.clone(),
                cardinality: *cardinality,
                properties: None,
            });
            Ok(())
        }
        DeclaredType::Scalar(kind) => {
            if attr.relationship_annotation().is_some() || attr.is_target_node() {
                return conflict(format!(
                    "scalar attribute '{}' cannot be a relationship",
                    attr.name
                ));
            }
            let key = checked_identifier(attr.property_key().unwrap_or(&attr.name))?.to_string();

            if attr.is_id() {
                if attr.is_version() {
                    return conflict(format!(
                        "'{}' cannot be both identity and version",
                        attr.name
                    ));
                }
                if schema.identity.is_some() {
                    return conflict("more than one identity attribute".to_string());
                }
                let strategy = match generation {
                    None => IdStrategy::Assigned,
                    Some(GenerationStrategy::Internal) => {
                        if *kind != ValueKind::Int {
                            return conflict(format!(
                                "internally generated id '{}' must be an integer",
                                attr.name
                            ));
                        }
                        IdStrategy::GeneratedInternal
                    }
                    Some(GenerationStrategy::Uuid) => {
                        if *kind != ValueKind::String {
                            return conflict(format!(
                                "uuid id '{}' must be a string",
                                attr.name
                            ));
                        }
                        IdStrategy::GeneratedUuid
                    }
                };
                if schema.kind == SchemaKind::RelationshipProperties
                    && strategy != IdStrategy::GeneratedInternal
                {
                    return conflict(format!(
                        "relationship id '{}' must be internally generated",
                        attr.name
                    ));
                }
                let key = match strategy {
                    IdStrategy::GeneratedInternal => None,
                    _ => Some(key),
                };
                schema.identity = Some(IdentityDef {
                    attribute: attr.name.clone(),
                    key,
                    strategy,
                    kind: *kind,
                    converter: attr.custom_converter(),
                });
                return Ok(());
            }

            let def = PropertyDef {
                attribute: attr.name.clone(),
                key,
                kind: *kind,
                nullable: !attr.has(|a| matches!(a, crate::descriptor::Annotation::NonNull)),
                converter: attr.custom_converter(),
            };

            if attr.is_version() {
                if schema.version.is_some() {
                    return conflict("more than one version attribute".to_string());
                }
                if *kind != ValueKind::Int {
                    return conflict(format!("version '{}' must be an integer", attr.name));
                }
                schema.version = Some(def);
            } else {
                schema.properties.push(def);
            }
            Ok(())
        }
    }
}

fn check_unique_keys(schema: &Schema) -> Result<()> {
    let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
    let id = schema
        .identity
        .as_ref()
        .and_then(|i| i.key.as_deref().map(|k| (k, i.attribute.as_str())));
    let version = schema
        .version
        .as_ref()
        .map(|v| (v.key.as_str(), v.attribute.as_str()));
    let props = schema
        .properties
        .iter()
        .map(|p| (p.key.as_str(), p.attribute.as_str()));

    for (key, attribute) in id.into_iter().chain(version).chain(props) {
        if let Some(previous) = owners.insert(key, attribute) {
            return Err(OgmError::conflict(
                &schema.type_name,
                format!(
                    "attributes '{}' and '{}' both map to property key '{}'",
                    previous, attribute, key
                ),
            ));
        }
    }
    Ok(())
}
