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

//! The schema registry: every domain type's schema, derived once at startup.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::descriptor::TypeDescriptor;
use crate::error::{OgmError, Result};
use crate::schema::{derive_schema, Schema, SchemaKind};

/// Collects type descriptors and derives the registry.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    descriptors: BTreeMap<String, TypeDescriptor>,
}

impl SchemaRegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type descriptor. Registering a type name twice is a conflict.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<&mut Self> {
        if self.descriptors.contains_key(&descriptor.name) {
            return Err(OgmError::conflict(
                &descriptor.name,
                "type is registered twice",
            ));
        }
        self.descriptors.insert(descriptor.name.clone(), descriptor);
        Ok(self)
    }

    /// Register several descriptors.
    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = TypeDescriptor>,
    ) -> Result<&mut Self> {
        for d in descriptors {
            self.register(d)?;
        }
        Ok(self)
    }

    /// Derive every schema, resolve inheritance and validate references.
    pub fn build(&self) -> Result<SchemaRegistry> {
        let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
        for name in self.descriptors.keys() {
            let mut visiting = HashSet::new();
            self.derive(name, &mut schemas, &mut visiting)?;
        }

        // Relationship attributes pointing at a relationship-properties type
        // really point at that type's target node.
        let mut links: Vec<(String, usize, String, String)> = Vec::new();
        for schema in schemas.values() {
            for (index, rel) in schema.relationships.iter().enumerate() {
                let target = schemas
                    .get(&rel.target)
                    .ok_or_else(|| OgmError::SchemaNotFound(rel.target.clone()))?;
                if target.kind == SchemaKind::RelationshipProperties {
                    let node = target.target_node.as_ref().ok_or_else(|| {
                        OgmError::conflict(&target.type_name, "no target node attribute")
                    })?;
                    links.push((
                        schema.type_name.clone(),
                        index,
                        target.type_name.clone(),
                        node.target.clone(),
                    ));
                }
            }
            if let Some(node) = &schema.target_node {
                match schemas.get(&node.target) {
                    Some(t) if t.is_node() => {}
                    Some(_) => {
                        return Err(OgmError::conflict(
                            &schema.type_name,
                            format!("target node '{}' is not a node type", node.target),
                        ));
                    }
                    None => return Err(OgmError::SchemaNotFound(node.target.clone())),
                }
            }
        }
        for (owner, index, properties, target) in links {
            if let Some(rel) = schemas
                .get_mut(&owner)
                .and_then(|s| s.relationships.get_mut(index))
            {
                rel.properties = Some(properties);
                rel.target = target;
            }
        }

        Ok(SchemaRegistry { schemas })
    }

    fn derive(
        &self,
        name: &str,
        schemas: &mut BTreeMap<String, Schema>,
        visiting: &mut HashSet<String>,
    ) -> Result<()> {
        if schemas.contains_key(name) {
            return Ok(());
        }
        let descriptor = self
            .descriptors
            .get(name)
            .ok_or_else(|| OgmError::SchemaNotFound(name.to_string()))?;
        if !visiting.insert(name.to_string()) {
            return Err(OgmError::conflict(name, "inheritance cycle"));
        }
        if let Some(parent) = &descriptor.parent {
            self.derive(parent, schemas, visiting)?;
        }
        let schema = derive_schema(
            descriptor,
            descriptor.parent.as_ref().and_then(|p| schemas.get(p)),
        )?;
        schemas.insert(name.to_string(), schema);
        Ok(())
    }
}

/// Immutable set of derived schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// Start collecting descriptors.
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::new()
    }

    /// The schema of a registered type.
    pub fn schema_for(&self, type_name: &str) -> Result<&Schema> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| OgmError::SchemaNotFound(type_name.to_string()))
    }

    /// The schema of a type, if registered.
    pub fn get(&self, type_name: &str) -> Option<&Schema> {
        self.schemas.get(type_name)
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Whether `type_name` is `base` or one of its subtypes.
    pub fn is_assignable(&self, type_name: &str, base: &str) -> bool {
        let mut current = Some(type_name);
        while let Some(name) = current {
            if name == base {
                return true;
            }
            current = self.schemas.get(name).and_then(|s| s.parent.as_deref());
        }
        false
    }

    /// `base` and every type assignable to it.
    pub fn subtypes<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a Schema> + 'a {
        self.schemas
            .values()
            .filter(move |s| self.is_assignable(&s.type_name, base))
    }

    /// Select the node schema for a label set.
    ///
    /// Candidates are node schemas whose labels are all present on the node,
    /// optionally restricted to subtypes of `within`. The candidate with the
    /// most labels wins; several candidates with the same, highest label count
    /// fail with [`OgmError::AmbiguousType`]. `Ok(None)` means nothing matched.
    pub fn resolve(
        &self,
        labels: &BTreeSet<String>,
        within: Option<&str>,
    ) -> Result<Option<&Schema>> {
        let mut best: Vec<&Schema> = Vec::new();
        for schema in self.schemas.values() {
            if !schema.is_node() {
                continue;
            }
            if let Some(base) = within {
                if !self.is_assignable(&schema.type_name, base) {
                    continue;
                }
            }
            if !schema.labels.iter().all(|l| labels.contains(l)) {
                continue;
            }
            match best.first() {
                Some(b) if b.labels.len() > schema.labels.len() => {}
                Some(b) if b.labels.len() == schema.labels.len() => best.push(schema),
                _ => best = vec![schema],
            }
        }
        match best.len() {
            0 => Ok(None),
            1 => Ok(best.pop()),
            _ => Err(OgmError::AmbiguousType {
                labels: labels.iter().cloned().collect(),
                candidates: best.iter().map(|s| s.type_name.clone()).collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AttributeDescriptor as Attr, GenerationStrategy, TypeDescriptor};
    use crate::schema::{Cardinality, Direction};
    use crate::value::ValueKind;

    fn labels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn zoo() -> SchemaRegistry {
        let mut b = SchemaRegistry::builder();
        b.register(
            TypeDescriptor::node("Animal").attribute(Attr::scalar("name", ValueKind::String).id()),
        )
        .unwrap()
        .register(TypeDescriptor::node("Dog").extends("Animal"))
        .unwrap()
        .register(TypeDescriptor::node("Cat").extends("Animal"))
        .unwrap()
        .register(TypeDescriptor::node("Puppy").extends("Dog"))
        .unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_schema_for_unknown_type() {
        let registry = zoo();
        assert!(matches!(
            registry.schema_for("Fish"),
            Err(OgmError::SchemaNotFound(t)) if t == "Fish"
        ));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut b = SchemaRegistry::builder();
        b.register(TypeDescriptor::node("A")).unwrap();
        assert!(b.register(TypeDescriptor::node("A")).is_err());
    }

    #[test]
    fn test_missing_parent_and_cycle() {
        let mut b = SchemaRegistry::builder();
        b.register(TypeDescriptor::node("A").extends("Missing")).unwrap();
        assert!(matches!(b.build(), Err(OgmError::SchemaNotFound(_))));

        let mut b = SchemaRegistry::builder();
        b.register(TypeDescriptor::node("A").extends("B"))
            .unwrap()
            .register(TypeDescriptor::node("B").extends("A"))
            .unwrap();
        assert!(matches!(b.build(), Err(OgmError::SchemaConflict { .. })));
    }

    #[test]
    fn test_missing_relationship_target() {
        let mut b = SchemaRegistry::builder();
        b.register(
            TypeDescriptor::node("A")
                .attribute(Attr::scalar("id", ValueKind::String).id())
                .attribute(Attr::entity("b", "B", Cardinality::Single)),
        )
        .unwrap();
        assert!(matches!(b.build(), Err(OgmError::SchemaNotFound(t)) if t == "B"));
    }

    #[test]
    fn test_is_assignable() {
        let registry = zoo();
        assert!(registry.is_assignable("Puppy", "Animal"));
        assert!(registry.is_assignable("Dog", "Dog"));
        assert!(!registry.is_assignable("Animal", "Dog"));
        assert!(!registry.is_assignable("Cat", "Dog"));
        assert_eq!(registry.subtypes("Dog").count(), 2);
    }

    #[test]
    fn test_resolve_most_specific() {
        let registry = zoo();
        let found = registry
            .resolve(&labels(&["Animal", "Dog", "Puppy"]), None)
            .unwrap()
            .unwrap();
        assert_eq!(found.type_name, "Puppy");

        let found = registry.resolve(&labels(&["Animal"]), None).unwrap().unwrap();
        assert_eq!(found.type_name, "Animal");

        assert!(registry.resolve(&labels(&["Fish"]), None).unwrap().is_none());
    }

    #[test]
    fn test_resolve_rejects_ties() {
        let registry = zoo();
        let err = registry
            .resolve(&labels(&["Animal", "Dog", "Cat"]), None)
            .unwrap_err();
        match err {
            OgmError::AmbiguousType { candidates, .. } => {
                assert_eq!(candidates, vec!["Cat".to_string(), "Dog".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_resolve_within_family() {
        let registry = zoo();
        let found = registry
            .resolve(&labels(&["Animal", "Dog", "Cat"]), Some("Cat"))
            .unwrap()
            .unwrap();
        assert_eq!(found.type_name, "Cat");
    }

    #[test]
    fn test_relationship_properties_are_linked() {
        let mut b = SchemaRegistry::builder();
        b.register(
            TypeDescriptor::node("Person")
                .attribute(Attr::scalar("name", ValueKind::String).id())
                .attribute(
                    Attr::entity("knows", "Since", Cardinality::Collection)
                        .relationship("KNOWS", Direction::Outgoing),
                ),
        )
        .unwrap()
        .register(
            TypeDescriptor::relationship_properties("Since")
                .attribute(
                    Attr::scalar("id", ValueKind::Int)
                        .id()
                        .generated(GenerationStrategy::Internal),
                )
                .attribute(Attr::scalar("year", ValueKind::Int))
                .attribute(Attr::entity("person", "Person", Cardinality::Single).target_node()),
        )
        .unwrap();
        let registry = b.build().unwrap();
        let rel = registry.schema_for("Person").unwrap().relationship("knows").unwrap();
        assert_eq!(rel.target, "Person");
        assert_eq!(rel.properties.as_deref(), Some("Since"));

        // relationship-properties types never match nodes
        assert_eq!(
            registry.resolve(&labels(&["Since", "Person"]), None).unwrap().unwrap().type_name,
            "Person"
        );
    }
}
