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

//! Merge-save: write an object graph back to the store.
//!
//! A save is planned first ([`SaveEngine::plan`]), without touching the
//! store, and then executed statement by statement in one transaction
//! ([`SaveEngine::execute`]). Node properties are written as a change set
//! against the loaded snapshot, so raw properties no attribute maps are
//! never removed. Entity state is only written back after every statement
//! succeeded.

mod execute;
mod plan;

pub use plan::{LinkPath, NodeWrite, RelationshipWrite, SavePlan};

use std::sync::Arc;

use neomap_core::{EntityRef, ObjectGraph, OgmError, Result, SchemaRegistry};
use tracing::debug;

use crate::config::SaveConfig;
use crate::cypher::CypherScript;
use crate::executor::{Transaction, WriteSummary};
use crate::identity::{IdGenerator, UuidGenerator};
use crate::ops::WriteOp;

/// What a save did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// Every executed statement, in order.
    pub script: CypherScript,
    /// Nodes created.
    pub nodes_created: usize,
    /// Nodes created or matched by identity.
    pub nodes_merged: usize,
    /// Existing nodes updated.
    pub nodes_updated: usize,
    /// Existing nodes without changes.
    pub nodes_unchanged: usize,
    /// Relationships created.
    pub relationships_created: usize,
    /// Relationships whose properties were updated.
    pub relationships_updated: usize,
    /// Relationships deleted.
    pub relationships_deleted: usize,
}

impl SaveReport {
    /// Number of executed statements.
    pub fn statements(&self) -> usize {
        self.script.len()
    }

    /// Add the counters and statements of another report.
    pub fn absorb(&mut self, other: SaveReport) {
        self.script.extend(other.script);
        self.nodes_created += other.nodes_created;
        self.nodes_merged += other.nodes_merged;
        self.nodes_updated += other.nodes_updated;
        self.nodes_unchanged += other.nodes_unchanged;
        self.relationships_created += other.relationships_created;
        self.relationships_updated += other.relationships_updated;
        self.relationships_deleted += other.relationships_deleted;
    }
}

/// Plans and executes saves against a schema registry.
pub struct SaveEngine<'r> {
    registry: &'r SchemaRegistry,
    config: SaveConfig,
    generator: Arc<dyn IdGenerator>,
}

impl<'r> SaveEngine<'r> {
    /// An engine generating UUID identities.
    pub fn new(registry: &'r SchemaRegistry, config: SaveConfig) -> Self {
        Self {
            registry,
            config,
            generator: Arc::new(UuidGenerator),
        }
    }

    /// Use another identity generator.
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// The configuration.
    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Plan and execute the save of `roots` in `tx`.
    pub fn save<T: Transaction>(
        &self,
        graph: &mut ObjectGraph,
        roots: &[EntityRef],
        tx: &mut T,
    ) -> Result<SaveReport> {
        let plan = self.plan(graph, roots)?;
        debug!(
            roots = roots.len(),
            nodes = plan.nodes.len(),
            statements = plan.len(),
            "save planned"
        );
        self.execute(plan, graph, tx)
    }

    fn write<T: Transaction>(
        &self,
        op: &WriteOp,
        description: &str,
        tx: &mut T,
        script: &mut CypherScript,
    ) -> Result<WriteSummary> {
        let mut statement = op.to_statement();
        if self.config.include_comments {
            statement = statement.with_comment(description);
        }
        debug!(query = %statement.query, target = description, "executing write");
        let summary = tx
            .execute_write(op)
            .map_err(|e| OgmError::persistence(description, e))?;
        script.add(statement);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests;
