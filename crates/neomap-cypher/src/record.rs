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

//! Result records as delivered by an execution collaborator.

use std::collections::BTreeSet;

use neomap_core::{NodeId, PropertyMap, RelationshipId, Value};

/// A node in a result record.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Store identity.
    pub id: NodeId,
    /// Label set.
    pub labels: BTreeSet<String>,
    /// Raw property map.
    pub properties: PropertyMap,
}

impl Node {
    /// Create a node without labels or properties.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            labels: BTreeSet::new(),
            properties: PropertyMap::new(),
        }
    }

    /// Add a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    /// Add several labels.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// A property value.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// A relationship in a result record.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Store identity.
    pub id: RelationshipId,
    /// Relationship type.
    pub rel_type: String,
    /// Start node identity.
    pub start: NodeId,
    /// End node identity.
    pub end: NodeId,
    /// Raw property map.
    pub properties: PropertyMap,
}

impl Relationship {
    /// Create a relationship without properties.
    pub fn new(
        id: impl Into<RelationshipId>,
        rel_type: impl Into<String>,
        start: impl Into<NodeId>,
        end: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            rel_type: rel_type.into(),
            start: start.into(),
            end: end.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Add a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// The value of one result column.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A node.
    Node(Node),
    /// A relationship.
    Relationship(Relationship),
    /// A list of values, e.g. collected nodes or a path's relationships.
    List(Vec<RecordValue>),
    /// Any other value.
    Scalar(Value),
}

impl RecordValue {
    /// Every node in this value, depth first.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect(&mut out, &mut Vec::new());
        out
    }

    /// Every relationship in this value, depth first.
    pub fn relationships(&self) -> Vec<&Relationship> {
        let mut out = Vec::new();
        self.collect(&mut Vec::new(), &mut out);
        out
    }

    fn collect<'a>(&'a self, nodes: &mut Vec<&'a Node>, rels: &mut Vec<&'a Relationship>) {
        match self {
            RecordValue::Node(n) => nodes.push(n),
            RecordValue::Relationship(r) => rels.push(r),
            RecordValue::List(items) => {
                for item in items {
                    item.collect(nodes, rels);
                }
            }
            RecordValue::Scalar(_) => {}
        }
    }

    /// Whether the value contains a node.
    pub fn has_node(&self) -> bool {
        match self {
            RecordValue::Node(_) => true,
            RecordValue::List(items) => items.iter().any(RecordValue::has_node),
            _ => false,
        }
    }
}

impl From<Node> for RecordValue {
    fn from(node: Node) -> Self {
        RecordValue::Node(node)
    }
}

impl From<Relationship> for RecordValue {
    fn from(rel: Relationship) -> Self {
        RecordValue::Relationship(rel)
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        RecordValue::Scalar(value)
    }
}

impl<T: Into<RecordValue>> From<Vec<T>> for RecordValue {
    fn from(items: Vec<T>) -> Self {
        RecordValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// One row of a query result: named columns in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    columns: Vec<(String, RecordValue)>,
}

impl ResultRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RecordValue>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<RecordValue>) {
        self.columns.push((column.into(), value.into()));
    }

    /// The value of a column.
    pub fn get(&self, column: &str) -> Option<&RecordValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Columns in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Name of the first column holding a node.
    pub fn first_node_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|(_, v)| v.has_node())
            .map(|(n, _)| n.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the record has no column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
