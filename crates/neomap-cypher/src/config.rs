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

//! Configuration of reconstruction, saving and the template facade.

use neomap_core::{OgmError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for folding result records into an object graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Column holding the root entity (default: first column holding a node).
    pub root_column: Option<String>,

    /// Type used for nodes whose labels match no registered schema
    /// (default: none, such nodes fail the read).
    pub fallback_type: Option<String>,

    /// Maximum number of records folded before the read is aborted
    /// (default: unlimited).
    pub max_records: Option<usize>,
}

impl ReconstructConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    pub fn builder() -> ReconstructConfigBuilder {
        ReconstructConfigBuilder::default()
    }

    /// Read the root entity from a named column.
    pub fn with_root_column(mut self, column: impl Into<String>) -> Self {
        self.root_column = Some(column.into());
        self
    }

    /// Map unmatched nodes to a fallback type.
    pub fn with_fallback_type(mut self, type_name: impl Into<String>) -> Self {
        self.fallback_type = Some(type_name.into());
        self
    }

    /// Abort after `max` records.
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }
}

/// Builder for [`ReconstructConfig`].
#[derive(Debug, Default)]
pub struct ReconstructConfigBuilder {
    root_column: Option<String>,
    fallback_type: Option<String>,
    max_records: Option<usize>,
}

impl ReconstructConfigBuilder {
    /// Set the root column.
    pub fn root_column(mut self, column: impl Into<String>) -> Self {
        self.root_column = Some(column.into());
        self
    }

    /// Set the fallback type.
    pub fn fallback_type(mut self, type_name: impl Into<String>) -> Self {
        self.fallback_type = Some(type_name.into());
        self
    }

    /// Set the record limit.
    pub fn max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ReconstructConfig {
        ReconstructConfig {
            root_column: self.root_column,
            fallback_type: self.fallback_type,
            max_records: self.max_records,
        }
    }
}

/// Configuration for the merge-save engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Version given to new versioned entities (default: 0).
    pub initial_version: i64,

    /// Save assigned-id entities that were not loaded with MERGE on their
    /// identity instead of CREATE (default: true).
    pub merge_assigned_ids: bool,

    /// Create a new relationship between the same start node, type and end
    /// node only once per save, even when both sides reference it
    /// (default: true).
    pub deduplicate_new_relationships: bool,

    /// Attach a descriptive comment to every recorded statement (default: true).
    pub include_comments: bool,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            initial_version: 0,
            merge_assigned_ids: true,
            deduplicate_new_relationships: true,
            include_comments: true,
        }
    }
}

impl SaveConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder.
    pub fn builder() -> SaveConfigBuilder {
        SaveConfigBuilder::default()
    }

    /// Start new versioned entities at `version`.
    pub fn with_initial_version(mut self, version: i64) -> Self {
        self.initial_version = version;
        self
    }

    /// Always CREATE unloaded assigned-id entities.
    pub fn with_create(mut self) -> Self {
        self.merge_assigned_ids = false;
        self
    }

    /// Create one relationship per link, even for mirrored links.
    pub fn without_relationship_deduplication(mut self) -> Self {
        self.deduplicate_new_relationships = false;
        self
    }

    /// Do not attach comments to statements.
    pub fn without_comments(mut self) -> Self {
        self.include_comments = false;
        self
    }
}

/// Builder for [`SaveConfig`].
#[derive(Debug, Default)]
pub struct SaveConfigBuilder {
    initial_version: Option<i64>,
    merge_assigned_ids: Option<bool>,
    deduplicate_new_relationships: Option<bool>,
    include_comments: Option<bool>,
}

impl SaveConfigBuilder {
    /// Set the initial version.
    pub fn initial_version(mut self, version: i64) -> Self {
        self.initial_version = Some(version);
        self
    }

    /// Set whether unloaded assigned-id entities are merged.
    pub fn merge_assigned_ids(mut self, merge: bool) -> Self {
        self.merge_assigned_ids = Some(merge);
        self
    }

    /// Set whether mirrored new relationships are created once.
    pub fn deduplicate_new_relationships(mut self, dedup: bool) -> Self {
        self.deduplicate_new_relationships = Some(dedup);
        self
    }

    /// Set whether statements carry comments.
    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = Some(include);
        self
    }

    /// Build the configuration; unset fields take their defaults.
    pub fn build(self) -> SaveConfig {
        let defaults = SaveConfig::default();
        SaveConfig {
            initial_version: self.initial_version.unwrap_or(defaults.initial_version),
            merge_assigned_ids: self.merge_assigned_ids.unwrap_or(defaults.merge_assigned_ids),
            deduplicate_new_relationships: self
                .deduplicate_new_relationships
                .unwrap_or(defaults.deduplicate_new_relationships),
            include_comments: self.include_comments.unwrap_or(defaults.include_comments),
        }
    }
}

/// Configuration of [`Neo4jTemplate`](crate::Neo4jTemplate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Reads.
    pub reconstruct: ReconstructConfig,
    /// Writes.
    pub save: SaveConfig,
    /// Run every item of `save_all` in its own transaction (default: false).
    pub per_item_transactions: bool,
}

impl TemplateConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing fields take their defaults.
    ///
    /// ```
    /// # use neomap_cypher::TemplateConfig;
    /// let config = TemplateConfig::from_json(r#"{"save": {"initial_version": 1}}"#).unwrap();
    /// assert_eq!(config.save.initial_version, 1);
    /// assert!(config.save.merge_assigned_ids);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OgmError::Configuration(e.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| OgmError::Configuration(e.to_string()))
    }

    /// Use the given read configuration.
    pub fn with_reconstruct(mut self, config: ReconstructConfig) -> Self {
        self.reconstruct = config;
        self
    }

    /// Use the given write configuration.
    pub fn with_save(mut self, config: SaveConfig) -> Self {
        self.save = config;
        self
    }

    /// Give every item of a batch its own transaction.
    pub fn with_per_item_transactions(mut self) -> Self {
        self.per_item_transactions = true;
        self
    }
}
