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

//! Entity instances stored in an [`ObjectGraph`](crate::ObjectGraph).
//!
//! An [`Entity`] is the dynamic stand-in for a domain object: its scalar
//! attribute values keyed by attribute name, plus its relationship
//! attributes. Related entities are referenced by [`EntityRef`], an index
//! into the owning graph's arena, so cycles need no shared ownership.

use std::collections::BTreeMap;

use crate::identity::{NodeId, RelationshipId};
use crate::schema::{Cardinality, Schema};
use crate::value::{PropertyMap, Value};

/// Index of an entity inside its [`ObjectGraph`](crate::ObjectGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef(pub(crate) usize);

impl EntityRef {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One edge from an entity to a related entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// The related entity.
    pub target: EntityRef,
    /// Store identity of the relationship; `None` until it is persisted.
    pub relationship_id: Option<RelationshipId>,
    /// Attribute values of the relationship-properties type, if any.
    pub attributes: PropertyMap,
}

impl Link {
    /// A new, unpersisted link without properties.
    pub fn to(target: EntityRef) -> Self {
        Self {
            target,
            relationship_id: None,
            attributes: PropertyMap::new(),
        }
    }

    /// Set a relationship-properties attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// The value of a relationship attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// Zero or one link.
    Single(Option<Link>),
    /// Ordered links.
    Collection(Vec<Link>),
    /// Links grouped by relationship type.
    Keyed(BTreeMap<String, Vec<Link>>),
}

impl Related {
    /// An empty value for the given cardinality.
    pub fn empty(cardinality: Cardinality) -> Self {
        match cardinality {
            Cardinality::Single => Related::Single(None),
            Cardinality::Collection => Related::Collection(Vec::new()),
            Cardinality::Keyed => Related::Keyed(BTreeMap::new()),
        }
    }

    /// All links with their map key, if keyed.
    pub fn links(&self) -> Vec<(Option<&str>, &Link)> {
        match self {
            Related::Single(link) => link.iter().map(|l| (None, l)).collect(),
            Related::Collection(links) => links.iter().map(|l| (None, l)).collect(),
            Related::Keyed(map) => map
                .iter()
                .flat_map(|(k, links)| links.iter().map(move |l| (Some(k.as_str()), l)))
                .collect(),
        }
    }

    /// Mutable access to every link.
    pub fn links_mut(&mut self) -> Vec<&mut Link> {
        match self {
            Related::Single(link) => link.iter_mut().collect(),
            Related::Collection(links) => links.iter_mut().collect(),
            Related::Keyed(map) => map.values_mut().flat_map(|l| l.iter_mut()).collect(),
        }
    }

    /// Whether no link is present.
    pub fn is_empty(&self) -> bool {
        match self {
            Related::Single(link) => link.is_none(),
            Related::Collection(links) => links.is_empty(),
            Related::Keyed(map) => map.values().all(Vec::is_empty),
        }
    }

    /// Targets of every link.
    pub fn targets(&self) -> Vec<EntityRef> {
        self.links().into_iter().map(|(_, l)| l.target).collect()
    }
}

/// A domain object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Concrete type name.
    pub type_name: String,
    /// Store identity of the backing node; `None` until persisted.
    pub native_id: Option<NodeId>,
    /// Scalar attribute values keyed by attribute name.
    pub attributes: PropertyMap,
    /// Relationship attributes keyed by attribute name.
    pub relationships: BTreeMap<String, Related>,
}

impl Entity {
    /// An empty instance of a type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            native_id: None,
            attributes: PropertyMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// An empty instance with every relationship attribute of the schema
    /// initialised for its cardinality.
    pub fn for_schema(schema: &Schema) -> Self {
        let mut entity = Self::new(&schema.type_name);
        for rel in &schema.relationships {
            entity
                .relationships
                .insert(rel.attribute.clone(), Related::empty(rel.cardinality));
        }
        entity
    }

    /// An attribute value; `None` when unset.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute).filter(|v| !v.is_null())
    }

    /// Set an attribute value.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Builder form of [`Entity::set`].
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Add a link to a relationship attribute.
    ///
    /// A single attribute is replaced; a missing attribute becomes a collection.
    pub fn link(&mut self, attribute: impl Into<String>, link: Link) {
        match self
            .relationships
            .entry(attribute.into())
            .or_insert_with(|| Related::Collection(Vec::new()))
        {
            Related::Single(slot) => *slot = Some(link),
            Related::Collection(links) => links.push(link),
            Related::Keyed(map) => map.entry(String::new()).or_default().push(link),
        }
    }

    /// Add a link under a relationship type in a keyed attribute.
    pub fn link_keyed(&mut self, attribute: impl Into<String>, key: impl Into<String>, link: Link) {
        let related = self
            .relationships
            .entry(attribute.into())
            .or_insert_with(|| Related::Keyed(BTreeMap::new()));
        if let Related::Keyed(map) = related {
            map.entry(key.into()).or_default().push(link);
        }
    }

    /// Remove every link to `target` from an attribute.
    pub fn unlink(&mut self, attribute: &str, target: EntityRef) {
        match self.relationships.get_mut(attribute) {
            Some(Related::Single(slot)) => {
                if slot.as_ref().is_some_and(|l| l.target == target) {
                    *slot = None;
                }
            }
            Some(Related::Collection(links)) => links.retain(|l| l.target != target),
            Some(Related::Keyed(map)) => {
                for links in map.values_mut() {
                    links.retain(|l| l.target != target);
                }
            }
            None => {}
        }
    }

    /// A relationship attribute.
    pub fn related(&self, attribute: &str) -> Option<&Related> {
        self.relationships.get(attribute)
    }

    /// Mutable access to a relationship attribute.
    pub fn related_mut(&mut self, attribute: &str) -> Option<&mut Related> {
        self.relationships.get_mut(attribute)
    }

    /// Targets of a relationship attribute, empty when absent.
    pub fn targets(&self, attribute: &str) -> Vec<EntityRef> {
        self.related(attribute)
            .map(Related::targets)
            .unwrap_or_default()
    }
}
