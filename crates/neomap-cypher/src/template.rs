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

//! The data-access facade.

use std::sync::Arc;

use neomap_core::{
    EntityRef, NodeId, ObjectGraph, OgmError, Result, Schema, SchemaRegistry, Value,
};
use tracing::debug;

use crate::config::TemplateConfig;
use crate::executor::{in_transaction, Transaction, TransactionProvider};
use crate::identity::{IdGenerator, UuidGenerator};
use crate::ops::{NodeSelector, ReadOp, WriteOp};
use crate::reconstruct::Reconstructor;
use crate::save::{SaveEngine, SaveReport};

/// Finds, saves and deletes domain entities through a [`TransactionProvider`].
///
/// Every call runs in its own transaction, committed on success and rolled
/// back on any error. Reads return an [`ObjectGraph`] whose roots are the
/// requested entities; saves take the graph back and write identities,
/// versions and the new raw state into it once the transaction committed.
pub struct Neo4jTemplate<P: TransactionProvider> {
    registry: Arc<SchemaRegistry>,
    provider: P,
    config: TemplateConfig,
    generator: Arc<dyn IdGenerator>,
}

impl<P: TransactionProvider> Neo4jTemplate<P> {
    /// A template with default configuration.
    pub fn new(registry: Arc<SchemaRegistry>, provider: P) -> Self {
        Self {
            registry,
            provider,
            config: TemplateConfig::default(),
            generator: Arc::new(UuidGenerator),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: TemplateConfig) -> Self {
        self.config = config;
        self
    }

    /// Use another generator for UUID identities.
    pub fn with_id_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.generator = generator;
        self
    }

    /// The schema registry.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The transaction provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The configuration.
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// A save engine sharing this template's registry and configuration.
    pub fn engine(&self) -> SaveEngine<'_> {
        SaveEngine::new(&self.registry, self.config.save.clone())
            .with_id_generator(Arc::clone(&self.generator))
    }

    /// Load the entity of `type_name` (or a subtype) with the given identity,
    /// together with everything reachable from it.
    pub fn find_by_id(&self, type_name: &str, id: impl Into<Value>) -> Result<Option<ObjectGraph>> {
        let schema = self.registry.schema_for(type_name)?;
        let op = ReadOp::FindById {
            label: schema.primary_label().to_string(),
            node: selector(schema, &id.into())?,
            expand: true,
        };
        let graph = self.read(type_name, &op)?;
        Ok((!graph.roots().is_empty()).then_some(graph))
    }

    /// Load every entity of `type_name` (or a subtype) into one graph.
    pub fn find_all(&self, type_name: &str) -> Result<ObjectGraph> {
        let schema = self.registry.schema_for(type_name)?;
        let op = ReadOp::FindAll {
            label: schema.primary_label().to_string(),
            expand: true,
        };
        self.read(type_name, &op)
    }

    /// Whether an entity with the given identity is stored.
    pub fn exists_by_id(&self, type_name: &str, id: impl Into<Value>) -> Result<bool> {
        let schema = self.registry.schema_for(type_name)?;
        let op = ReadOp::FindById {
            label: schema.primary_label().to_string(),
            node: selector(schema, &id.into())?,
            expand: false,
        };
        let description = format!("{type_name} lookup");
        in_transaction(&self.provider, |tx| {
            let mut records = tx
                .execute_query(&op)
                .map_err(|e| OgmError::persistence(description.as_str(), e))?;
            match records.next() {
                Some(Err(e)) => Err(OgmError::persistence(description.as_str(), e)),
                Some(Ok(_)) => Ok(true),
                None => Ok(false),
            }
        })
    }

    /// Delete the entity with the given identity and its relationships.
    /// Returns whether a node was deleted.
    pub fn delete_by_id(&self, type_name: &str, id: impl Into<Value>) -> Result<bool> {
        let schema = self.registry.schema_for(type_name)?;
        let id = id.into();
        let op = WriteOp::DeleteNode {
            node: selector(schema, &id)?,
        };
        let description = format!("{type_name} {id}");
        debug!(query = %op.to_statement().query, target = %description, "executing write");
        in_transaction(&self.provider, |tx| {
            let summary = tx
                .execute_write(&op)
                .map_err(|e| OgmError::persistence(description.as_str(), e))?;
            Ok(summary.affected > 0)
        })
    }

    /// Save `root` and everything reachable from it.
    pub fn save(&self, graph: &mut ObjectGraph, root: EntityRef) -> Result<SaveReport> {
        self.save_in_transaction(graph, &[root])
    }

    /// Save several roots in one transaction, in the given order. An entity
    /// reachable from more than one root is written once.
    ///
    /// With `per_item_transactions` configured this behaves like
    /// [`save_each`](Self::save_each).
    pub fn save_all(&self, graph: &mut ObjectGraph, roots: &[EntityRef]) -> Result<SaveReport> {
        if self.config.per_item_transactions {
            return self.save_each(graph, roots);
        }
        self.save_in_transaction(graph, roots)
    }

    /// Save several roots, each in its own transaction.
    ///
    /// Stops at the first failing item; items saved before it stay committed.
    pub fn save_each(&self, graph: &mut ObjectGraph, roots: &[EntityRef]) -> Result<SaveReport> {
        let mut report = SaveReport::default();
        for &root in roots {
            report.absorb(self.save_in_transaction(graph, &[root])?);
        }
        Ok(report)
    }

    fn save_in_transaction(
        &self,
        graph: &mut ObjectGraph,
        roots: &[EntityRef],
    ) -> Result<SaveReport> {
        let engine = self.engine();
        let plan = engine.plan(graph, roots)?;
        // Work on a copy so a failed commit leaves the caller's graph as it was.
        let mut working = graph.clone();
        let report = in_transaction(&self.provider, |tx| {
            engine.execute(plan, &mut working, tx)
        })?;
        *graph = working;
        Ok(report)
    }

    fn read(&self, type_name: &str, op: &ReadOp) -> Result<ObjectGraph> {
        let description = format!("{type_name} query");
        debug!(query = %op.to_statement().query, "executing read");
        in_transaction(&self.provider, |tx| {
            fold_records(tx, op, &self.registry, type_name, &self.config, &description)
        })
    }
}

fn fold_records<T: Transaction>(
    tx: &mut T,
    op: &ReadOp,
    registry: &SchemaRegistry,
    type_name: &str,
    config: &TemplateConfig,
    description: &str,
) -> Result<ObjectGraph> {
    let mut fold = Reconstructor::new(registry, type_name, config.reconstruct.clone())?;
    let records = tx
        .execute_query(op)
        .map_err(|e| OgmError::persistence(description, e))?;
    for record in records {
        fold.accept(record.map_err(|e| OgmError::persistence(description, e))?)?;
    }
    fold.finish()
}

/// How a node is located by the identity value of `schema`.
pub fn selector(schema: &Schema, id: &Value) -> Result<NodeSelector> {
    let identity = schema
        .identity
        .as_ref()
        .ok_or_else(|| OgmError::conflict(&schema.type_name, "no identity attribute"))?;
    match &identity.key {
        None => match id {
            Value::Int(i) => Ok(NodeSelector::Id(NodeId(*i))),
            other => Err(OgmError::conversion(
                &identity.attribute,
                format!("internal identity must be an integer, got {other}"),
            )),
        },
        Some(key) => Ok(NodeSelector::Key {
            label: schema.primary_label().to_string(),
            key: key.clone(),
            value: identity.write(id)?,
        }),
    }
}
