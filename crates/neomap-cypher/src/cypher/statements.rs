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

//! Parameterized Cypher statements and scripts.

use std::collections::BTreeMap;

use neomap_core::Value;
use serde::{Deserialize, Serialize};

use super::escape::{escape_identifier, quote_string};

/// Render a value as a Cypher literal.
pub fn to_cypher_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) if f.is_nan() => "0.0/0.0".to_string(),
        Value::Float(f) if f.is_infinite() => {
            let literal = if *f > 0.0 { "1.0/0.0" } else { "-1.0/0.0" };
            literal.to_string()
        }
        Value::Float(f) => {
            let s = f.to_string();
            if s.contains(['.', 'e', 'E']) {
                s
            } else {
                format!("{}.0", s)
            }
        }
        Value::String(s) => quote_string(s),
        Value::List(items) => {
            let inner: Vec<String> = items.iter().map(to_cypher_literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Map(map) => {
            let pairs: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", escape_identifier(k), to_cypher_literal(v)))
                .collect();
            format!("{{{}}}", pairs.join(", "))
        }
    }
}

/// What a statement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementType {
    /// `CREATE` of a node.
    CreateNode,
    /// `MERGE` of a node by its assigned identity.
    MergeNode,
    /// `SET` of node properties.
    UpdateNode,
    /// `DETACH DELETE` of a node.
    DeleteNode,
    /// `CREATE` of a relationship.
    CreateRelationship,
    /// `SET` of relationship properties.
    UpdateRelationship,
    /// `DELETE` of a relationship.
    DeleteRelationship,
    /// A read query.
    Query,
}

impl StatementType {
    /// Whether the statement writes.
    pub fn is_write(self) -> bool {
        self != StatementType::Query
    }
}

/// A single Cypher statement with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CypherStatement {
    /// The query text, referencing parameters as `$name`.
    pub query: String,
    /// Parameter values by name.
    pub parameters: BTreeMap<String, Value>,
    /// What the statement does.
    pub statement_type: StatementType,
    /// Optional description, rendered as a `//` comment.
    pub comment: Option<String>,
}

impl CypherStatement {
    /// Create a statement without parameters.
    pub fn new(query: impl Into<String>, statement_type: StatementType) -> Self {
        Self {
            query: query.into(),
            parameters: BTreeMap::new(),
            statement_type,
            comment: None,
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Add a comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// A parameter value.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// The query with every parameter replaced by its literal.
    ///
    /// Longer parameter names are substituted first so that `$id` never
    /// clobbers `$identity`. Meant for logs and scripts, never for execution
    /// against untrusted input.
    pub fn render_inline(&self) -> String {
        let mut names: Vec<&String> = self.parameters.keys().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let mut out = self.query.clone();
        for name in names {
            if let Some(value) = self.parameters.get(name) {
                out = out.replace(&format!("${}", name), &to_cypher_literal(value));
            }
        }
        out
    }

    /// The inlined statement terminated by `;`, optionally preceded by its comment.
    pub fn format(&self, include_comment: bool) -> String {
        match (&self.comment, include_comment) {
            (Some(comment), true) => format!("// {}\n{};", comment, self.render_inline()),
            _ => format!("{};", self.render_inline()),
        }
    }
}

/// An ordered list of statements, e.g. everything one save executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CypherScript {
    /// Statements in execution order.
    pub statements: Vec<CypherStatement>,
}

impl CypherScript {
    /// An empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement.
    pub fn add(&mut self, statement: CypherStatement) {
        self.statements.push(statement);
    }

    /// Statements of one type.
    pub fn statements_of_type(&self, statement_type: StatementType) -> Vec<&CypherStatement> {
        self.statements
            .iter()
            .filter(|s| s.statement_type == statement_type)
            .collect()
    }

    /// Count statements of one type.
    pub fn count(&self, statement_type: StatementType) -> usize {
        self.statements
            .iter()
            .filter(|s| s.statement_type == statement_type)
            .count()
    }

    /// Render every statement, separated by blank lines.
    pub fn render(&self, include_comments: bool) -> String {
        self.statements
            .iter()
            .map(|s| s.format(include_comments))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Whether the script is empty.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl Extend<CypherStatement> for CypherScript {
    fn extend<T: IntoIterator<Item = CypherStatement>>(&mut self, iter: T) {
        self.statements.extend(iter);
    }
}

impl IntoIterator for CypherScript {
    type Item = CypherStatement;
    type IntoIter = std::vec::IntoIter<CypherStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}

impl<'a> IntoIterator for &'a CypherScript {
    type Item = &'a CypherStatement;
    type IntoIter = std::slice::Iter<'a, CypherStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals() {
        assert_eq!(to_cypher_literal(&Value::Null), "null");
        assert_eq!(to_cypher_literal(&Value::Bool(true)), "true");
        assert_eq!(to_cypher_literal(&Value::Int(-4)), "-4");
        assert_eq!(to_cypher_literal(&Value::Float(2.0)), "2.0");
        assert_eq!(to_cypher_literal(&Value::Float(0.5)), "0.5");
        assert_eq!(to_cypher_literal(&Value::from("Mr. X")), "'Mr. X'");
        assert_eq!(
            to_cypher_literal(&Value::from(vec![1i64, 2])),
            "[1, 2]"
        );
    }

    #[test]
    fn test_map_literal_escapes_keys() {
        let mut map = BTreeMap::new();
        map.insert("known property".to_string(), Value::from("A"));
        map.insert("n".to_string(), Value::from(1i64));
        assert_eq!(
            to_cypher_literal(&Value::Map(map)),
            "{`known property`: 'A', n: 1}"
        );
    }

    #[test]
    fn test_render_inline_prefers_longer_names() {
        let stmt = CypherStatement::new(
            "MATCH (n) WHERE id(n) = $id AND n.x = $idx",
            StatementType::Query,
        )
        .with_param("id", 1i64)
        .with_param("idx", "a");
        assert_eq!(stmt.render_inline(), "MATCH (n) WHERE id(n) = 1 AND n.x = 'a'");
    }

    #[test]
    fn test_script_render_and_counts() {
        let mut script = CypherScript::new();
        script.add(
            CypherStatement::new("CREATE (n:A)", StatementType::CreateNode)
                .with_comment("create A"),
        );
        script.extend([CypherStatement::new(
            "MATCH ()-[r]->() WHERE id(r) = $id DELETE r",
            StatementType::DeleteRelationship,
        )
        .with_param("id", 9i64)]);
        assert_eq!(script.len(), 2);
        assert_eq!(script.count(StatementType::CreateNode), 1);
        assert_eq!(
            script.render(true),
            "// create A\nCREATE (n:A);\n\nMATCH ()-[r]->() WHERE id(r) = 9 DELETE r;"
        );
        assert_eq!(script.render(false).lines().next(), Some("CREATE (n:A);"));
    }
}
