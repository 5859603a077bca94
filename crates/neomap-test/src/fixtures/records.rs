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

//! Builders for result records in the shapes stores return them.
//!
//! The same logical graph can arrive pre-aggregated (one row per root with
//! every relationship and node collected into lists), flattened (one row per
//! relationship), or anything in between. Reconstruction must produce the
//! same object graph for each.

use neomap_cypher::{
    Node, Relationship, ResultRecord, NODES_COLUMN, RELATIONSHIPS_COLUMN, ROOT_COLUMN,
};

/// A logical result: root nodes plus the relationships and nodes around them.
///
/// # Examples
///
/// ```
/// use neomap_cypher::{Node, Relationship};
/// use neomap_test::fixtures::records::GraphShape;
///
/// let shape = GraphShape::new()
///     .root(Node::new(1).with_label("Person").with_property("name", "a"))
///     .node(Node::new(2).with_label("Person").with_property("name", "b"))
///     .relationship(Relationship::new(10, "KNOWS", 1, 2));
///
/// assert_eq!(shape.aggregated().len(), 1);
/// assert_eq!(shape.row_per_relationship().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphShape {
    roots: Vec<Node>,
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
}

impl GraphShape {
    /// An empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node.
    pub fn root(mut self, node: Node) -> Self {
        self.roots.push(node);
        self
    }

    /// Add a non-root node.
    pub fn node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a relationship.
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// The relationships.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    fn lookup(&self, id: neomap_core::NodeId) -> Option<&Node> {
        self.roots.iter().chain(&self.nodes).find(|n| n.id == id)
    }

    /// One row per root, everything else collected into list columns.
    pub fn aggregated(&self) -> Vec<ResultRecord> {
        self.chunked(usize::MAX)
    }

    /// One row per root and relationship, with both endpoints.
    pub fn row_per_relationship(&self) -> Vec<ResultRecord> {
        let mut rows = Vec::new();
        for root in &self.roots {
            if self.relationships.is_empty() {
                rows.push(ResultRecord::new().with(ROOT_COLUMN, root.clone()));
            }
            for rel in &self.relationships {
                let mut row = ResultRecord::new()
                    .with(ROOT_COLUMN, root.clone())
                    .with("r", rel.clone());
                if let Some(start) = self.lookup(rel.start) {
                    row.push("s", start.clone());
                }
                if let Some(end) = self.lookup(rel.end) {
                    row.push("e", end.clone());
                }
                rows.push(row);
            }
        }
        rows
    }

    /// Rows per root carrying at most `size` relationships each, plus the
    /// nodes those relationships touch.
    pub fn chunked(&self, size: usize) -> Vec<ResultRecord> {
        let size = size.max(1);
        let mut rows = Vec::new();
        for root in &self.roots {
            if self.relationships.is_empty() {
                rows.push(
                    ResultRecord::new()
                        .with(ROOT_COLUMN, root.clone())
                        .with(RELATIONSHIPS_COLUMN, Vec::<Relationship>::new())
                        .with(NODES_COLUMN, Vec::<Node>::new()),
                );
                continue;
            }
            for chunk in self.relationships.chunks(size) {
                let mut nodes: Vec<Node> = Vec::new();
                for rel in chunk {
                    for id in [rel.start, rel.end] {
                        if let Some(node) = self.lookup(id) {
                            if !nodes.iter().any(|n| n.id == id) {
                                nodes.push(node.clone());
                            }
                        }
                    }
                }
                rows.push(
                    ResultRecord::new()
                        .with(ROOT_COLUMN, root.clone())
                        .with(RELATIONSHIPS_COLUMN, chunk.to_vec())
                        .with(NODES_COLUMN, nodes),
                );
            }
        }
        rows
    }

    /// Rows of [`chunked`](Self::chunked) with the relationships reversed,
    /// so neither rows nor relationships arrive in declaration order.
    pub fn reversed(&self, size: usize) -> Vec<ResultRecord> {
        let mut reversed = self.clone();
        reversed.relationships.reverse();
        reversed.nodes.reverse();
        reversed.chunked(size)
    }
}

