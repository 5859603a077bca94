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

//! Store operations issued by the engine.
//!
//! The reconstruction and merge-save engines never build query text
//! directly. They issue [`ReadOp`]s and [`WriteOp`]s, which an execution
//! collaborator either interprets itself or renders with `to_statement()`
//! into a parameterized [`CypherStatement`].

use neomap_core::{NodeId, PropertyMap, RelationshipId, Value};

use crate::cypher::{
    escape_identifier, escape_label, escape_labels, escape_relationship_type, CypherStatement,
    StatementType,
};

/// Column holding the root node of a read.
pub const ROOT_COLUMN: &str = "n";
/// Column holding the relationships reachable from the root.
pub const RELATIONSHIPS_COLUMN: &str = "__relationships__";
/// Column holding the nodes reachable from the root.
pub const NODES_COLUMN: &str = "__nodes__";

/// How an existing node is located.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSelector {
    /// By store identity.
    Id(NodeId),
    /// By label and a unique property.
    Key {
        /// Primary label.
        label: String,
        /// Property key.
        key: String,
        /// Property value.
        value: Value,
    },
}

impl NodeSelector {
    fn match_clause(&self, var: &str) -> (String, Vec<(String, Value)>) {
        match self {
            NodeSelector::Id(id) => (
                format!("MATCH ({var}) WHERE id({var}) = $id"),
                vec![("id".to_string(), Value::Int(id.get()))],
            ),
            NodeSelector::Key { label, key, value } => (
                format!(
                    "MATCH ({var}{}) WHERE {var}.{} = $value",
                    escape_label(label),
                    escape_identifier(key)
                ),
                vec![("value".to_string(), value.clone())],
            ),
        }
    }
}

/// Expected version of a guarded update.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCheck {
    /// Version property key.
    pub key: String,
    /// Version the stored node must have; `None` if it must have none.
    pub expected: Option<i64>,
    /// Version stored by the update.
    pub next: i64,
}

impl VersionCheck {
    /// Guard on the stored version being `expected`; the update increments it.
    pub fn matching(key: impl Into<String>, expected: i64) -> Self {
        Self {
            key: key.into(),
            expected: Some(expected),
            next: expected + 1,
        }
    }

    /// Guard on the stored node having no version yet; the update sets it
    /// to `initial`.
    pub fn unset(key: impl Into<String>, initial: i64) -> Self {
        Self {
            key: key.into(),
            expected: None,
            next: initial,
        }
    }
}

/// A write against the store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create a node. Reports the new node identity.
    CreateNode {
        /// Labels, primary first.
        labels: Vec<String>,
        /// Full property set.
        properties: PropertyMap,
    },
    /// Create or match a node by its assigned identity, then add properties.
    /// Reports the node identity.
    MergeNode {
        /// Labels, primary first.
        labels: Vec<String>,
        /// Identity property key.
        key: String,
        /// Identity value.
        value: Value,
        /// Properties to set; other keys are left untouched.
        properties: PropertyMap,
    },
    /// Set properties on an existing node, optionally guarded by version.
    /// With a version check the stored version is incremented, and a
    /// mismatch affects zero nodes.
    UpdateNode {
        /// The node.
        node: NodeSelector,
        /// Properties to set; null removes the key.
        properties: PropertyMap,
        /// Optimistic locking guard.
        version: Option<VersionCheck>,
    },
    /// Delete a node with its relationships.
    DeleteNode {
        /// The node.
        node: NodeSelector,
    },
    /// Create a relationship. Reports the new relationship identity.
    CreateRelationship {
        /// Start node.
        start: NodeId,
        /// End node.
        end: NodeId,
        /// Relationship type.
        rel_type: String,
        /// Properties.
        properties: PropertyMap,
    },
    /// Set properties on an existing relationship.
    UpdateRelationship {
        /// The relationship.
        id: RelationshipId,
        /// Properties to set; null removes the key.
        properties: PropertyMap,
    },
    /// Delete a relationship.
    DeleteRelationship {
        /// The relationship.
        id: RelationshipId,
    },
}

impl WriteOp {
    /// The statement type.
    pub fn statement_type(&self) -> StatementType {
        match self {
            WriteOp::CreateNode { .. } => StatementType::CreateNode,
            WriteOp::MergeNode { .. } => StatementType::MergeNode,
            WriteOp::UpdateNode { .. } => StatementType::UpdateNode,
            WriteOp::DeleteNode { .. } => StatementType::DeleteNode,
            WriteOp::CreateRelationship { .. } => StatementType::CreateRelationship,
            WriteOp::UpdateRelationship { .. } => StatementType::UpdateRelationship,
            WriteOp::DeleteRelationship { .. } => StatementType::DeleteRelationship,
        }
    }

    /// Render as a parameterized Cypher statement.
    pub fn to_statement(&self) -> CypherStatement {
        let ty = self.statement_type();
        match self {
            WriteOp::CreateNode { labels, properties } => CypherStatement::new(
                format!("CREATE (n{} $props) RETURN id(n) AS id", escape_labels(labels)),
                ty,
            )
            .with_param("props", Value::Map(properties.clone())),

            WriteOp::MergeNode {
                labels,
                key,
                value,
                properties,
            } => {
                let (primary, rest) = labels
                    .split_first()
                    .map_or((None, &[][..]), |(p, r)| (Some(p), r));
                let mut query = format!(
                    "MERGE (n{} {{{}: $value}})",
                    primary.map(|p| escape_label(p)).unwrap_or_default(),
                    escape_identifier(key)
                );
                if !rest.is_empty() {
                    query.push_str(&format!(" SET n{}", escape_labels(rest)));
                }
                query.push_str(" SET n += $props RETURN id(n) AS id");
                CypherStatement::new(query, ty)
                    .with_param("value", value.clone())
                    .with_param("props", Value::Map(properties.clone()))
            }

            WriteOp::UpdateNode {
                node,
                properties,
                version,
            } => {
                let (mut query, params) = node.match_clause("n");
                let mut stmt = CypherStatement::new(String::new(), ty);
                if let Some(check) = version {
                    let key = escape_identifier(&check.key);
                    match check.expected {
                        Some(expected) => {
                            query.push_str(&format!(" AND n.{key} = $expected"));
                            stmt = stmt.with_param("expected", expected);
                        }
                        None => query.push_str(&format!(" AND n.{key} IS NULL")),
                    }
                }
                query.push_str(" SET n += $props");
                if let Some(check) = version {
                    let key = escape_identifier(&check.key);
                    match check.expected {
                        Some(_) => query.push_str(&format!(", n.{key} = n.{key} + 1")),
                        None => {
                            query.push_str(&format!(", n.{key} = $next"));
                            stmt = stmt.with_param("next", check.next);
                        }
                    }
                }
                query.push_str(" RETURN id(n) AS id");
                stmt.query = query;
                stmt.parameters.extend(params);
                stmt.with_param("props", Value::Map(properties.clone()))
            }

            WriteOp::DeleteNode { node } => {
                let (query, params) = node.match_clause("n");
                let mut stmt = CypherStatement::new(format!("{query} DETACH DELETE n"), ty);
                stmt.parameters.extend(params);
                stmt
            }

            WriteOp::CreateRelationship {
                start,
                end,
                rel_type,
                properties,
            } => CypherStatement::new(
                format!(
                    "MATCH (s) WHERE id(s) = $start MATCH (e) WHERE id(e) = $end \
                     CREATE (s)-[r{} $props]->(e) RETURN id(r) AS id",
                    escape_relationship_type(rel_type)
                ),
                ty,
            )
            .with_param("start", start.get())
            .with_param("end", end.get())
            .with_param("props", Value::Map(properties.clone())),

            WriteOp::UpdateRelationship { id, properties } => CypherStatement::new(
                "MATCH ()-[r]->() WHERE id(r) = $id SET r += $props",
                ty,
            )
            .with_param("id", id.get())
            .with_param("props", Value::Map(properties.clone())),

            WriteOp::DeleteRelationship { id } => CypherStatement::new(
                "MATCH ()-[r]->() WHERE id(r) = $id DELETE r",
                ty,
            )
            .with_param("id", id.get()),
        }
    }
}

/// A read against the store.
///
/// Results are returned in the column layout of [`ROOT_COLUMN`],
/// [`RELATIONSHIPS_COLUMN`] and [`NODES_COLUMN`]; with `expand` unset only
/// the root column is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOp {
    /// One node with the given label, located by selector.
    FindById {
        /// Primary label of the queried type.
        label: String,
        /// The node.
        node: NodeSelector,
        /// Also return every relationship and node reachable from the root.
        expand: bool,
    },
    /// Every node with the given label.
    FindAll {
        /// Primary label of the queried type.
        label: String,
        /// Also return every relationship and node reachable from each root.
        expand: bool,
    },
}

impl ReadOp {
    /// Render as a parameterized Cypher statement.
    pub fn to_statement(&self) -> CypherStatement {
        let (mut query, params, expand) = match self {
            ReadOp::FindById {
                label,
                node,
                expand,
            } => {
                let (clause, params) = match node {
                    NodeSelector::Id(_) => {
                        let (c, p) = node.match_clause(ROOT_COLUMN);
                        (
                            c.replacen(
                                &format!("MATCH ({ROOT_COLUMN})"),
                                &format!("MATCH ({ROOT_COLUMN}{})", escape_label(label)),
                                1,
                            ),
                            p,
                        )
                    }
                    NodeSelector::Key { .. } => node.match_clause(ROOT_COLUMN),
                };
                (clause, params, *expand)
            }
            ReadOp::FindAll { label, expand } => (
                format!("MATCH ({ROOT_COLUMN}{})", escape_label(label)),
                Vec::new(),
                *expand,
            ),
        };
        if expand {
            query.push_str(&format!(
                " OPTIONAL MATCH p = ({ROOT_COLUMN})-[*]-() \
                 WITH {ROOT_COLUMN}, collect(p) AS paths \
                 RETURN {ROOT_COLUMN}, \
                 reduce(a = [], x IN paths | a + relationships(x)) AS {RELATIONSHIPS_COLUMN}, \
                 reduce(a = [], x IN paths | a + nodes(x)) AS {NODES_COLUMN}"
            ));
        } else {
            query.push_str(&format!(" RETURN {ROOT_COLUMN}"));
        }
        let mut stmt = CypherStatement::new(query, StatementType::Query);
        stmt.parameters.extend(params);
        stmt
    }
}
