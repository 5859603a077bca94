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

//! An in-memory transactional property graph.
//!
//! [`MemoryGraph`] answers the read and write operations of
//! `neomap-cypher` the way a Cypher store would, so the mapping engine can
//! be exercised end to end without a database. Each transaction works on a
//! private copy of the graph taken at `begin`; `commit` publishes it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use neomap_core::{ExecutionError, NodeId, PropertyMap, RelationshipId, Value};
use neomap_cypher::{
    Node, NodeSelector, ReadOp, RecordIter, Relationship, ResultRecord, StatementType,
    Transaction, TransactionProvider, WriteOp, WriteSummary, NODES_COLUMN, RELATIONSHIPS_COLUMN,
    ROOT_COLUMN,
};
use parking_lot::Mutex;
use tracing::trace;

type ExecResult<T> = std::result::Result<T, ExecutionError>;

#[derive(Debug, Clone, Default)]
struct GraphState {
    nodes: BTreeMap<NodeId, Node>,
    relationships: BTreeMap<RelationshipId, Relationship>,
    next_node: i64,
    next_relationship: i64,
}

impl GraphState {
    fn create_node(&mut self, labels: BTreeSet<String>, properties: PropertyMap) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let mut node = Node::new(id).with_labels(labels);
        set_properties(&mut node.properties, &properties);
        self.nodes.insert(id, node);
        id
    }

    fn create_relationship(
        &mut self,
        start: NodeId,
        rel_type: &str,
        end: NodeId,
        properties: &PropertyMap,
    ) -> ExecResult<RelationshipId> {
        for endpoint in [start, end] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(ExecutionError::new(format!("node {endpoint} does not exist")));
            }
        }
        let id = RelationshipId(self.next_relationship);
        self.next_relationship += 1;
        let mut rel = Relationship::new(id, rel_type, start, end);
        set_properties(&mut rel.properties, properties);
        self.relationships.insert(id, rel);
        Ok(id)
    }

    fn find_by_key(&self, label: &str, key: &str, value: &Value) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|n| n.labels.contains(label) && n.properties.get(key) == Some(value))
            .map(|n| n.id)
    }

    fn select(&self, selector: &NodeSelector) -> Option<NodeId> {
        match selector {
            NodeSelector::Id(id) => self.nodes.contains_key(id).then_some(*id),
            NodeSelector::Key { label, key, value } => self.find_by_key(label, key, value),
        }
    }

    fn delete_node(&mut self, id: NodeId) -> bool {
        if self.nodes.remove(&id).is_none() {
            return false;
        }
        self.relationships
            .retain(|_, rel| rel.start != id && rel.end != id);
        true
    }

    /// Relationships and nodes reachable from `root`, ignoring direction.
    fn expand(&self, root: NodeId) -> (Vec<Relationship>, Vec<Node>) {
        let mut seen_nodes = BTreeSet::from([root]);
        let mut seen_rels = BTreeSet::new();
        let mut rels = Vec::new();
        let mut nodes = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            for rel in self.relationships.values() {
                let other = if rel.start == current {
                    rel.end
                } else if rel.end == current {
                    rel.start
                } else {
                    continue;
                };
                if seen_rels.insert(rel.id) {
                    rels.push(rel.clone());
                }
                if seen_nodes.insert(other) {
                    if let Some(node) = self.nodes.get(&other) {
                        nodes.push(node.clone());
                    }
                    queue.push_back(other);
                }
            }
        }
        (rels, nodes)
    }

    fn read(&self, op: &ReadOp) -> Vec<ResultRecord> {
        let (roots, expand): (Vec<NodeId>, bool) = match op {
            ReadOp::FindById {
                label,
                node,
                expand,
            } => {
                let found = self
                    .select(node)
                    .filter(|id| self.nodes.get(id).is_some_and(|n| n.labels.contains(label)));
                (found.into_iter().collect(), *expand)
            }
            ReadOp::FindAll { label, expand } => (
                self.nodes
                    .values()
                    .filter(|n| n.labels.contains(label))
                    .map(|n| n.id)
                    .collect(),
                *expand,
            ),
        };
        roots
            .into_iter()
            .filter_map(|id| self.nodes.get(&id).map(|n| (id, n.clone())))
            .map(|(id, node)| {
                let record = ResultRecord::new().with(ROOT_COLUMN, node);
                if !expand {
                    return record;
                }
                let (rels, nodes) = self.expand(id);
                record
                    .with(RELATIONSHIPS_COLUMN, rels)
                    .with(NODES_COLUMN, nodes)
            })
            .collect()
    }

    fn write(&mut self, op: &WriteOp) -> ExecResult<WriteSummary> {
        match op {
            WriteOp::CreateNode { labels, properties } => {
                let id = self.create_node(labels.iter().cloned().collect(), properties.clone());
                Ok(WriteSummary::one(id.get()))
            }
            WriteOp::MergeNode {
                labels,
                key,
                value,
                properties,
            } => {
                let primary = labels.first().map(String::as_str).unwrap_or_default();
                let id = match self.find_by_key(primary, key, value) {
                    Some(id) => id,
                    None => {
                        let mut initial = PropertyMap::new();
                        initial.insert(key.clone(), value.clone());
                        self.create_node(BTreeSet::new(), initial)
                    }
                };
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.labels.extend(labels.iter().cloned());
                    set_properties(&mut node.properties, properties);
                }
                Ok(WriteSummary::one(id.get()))
            }
            WriteOp::UpdateNode {
                node,
                properties,
                version,
            } => {
                let Some(id) = self.select(node) else {
                    return Ok(WriteSummary::none());
                };
                let Some(stored) = self.nodes.get_mut(&id) else {
                    return Ok(WriteSummary::none());
                };
                if let Some(check) = version {
                    let current = stored.properties.get(&check.key);
                    if current != check.expected.map(Value::Int).as_ref() {
                        return Ok(WriteSummary::none());
                    }
                }
                set_properties(&mut stored.properties, properties);
                if let Some(check) = version {
                    stored
                        .properties
                        .insert(check.key.clone(), Value::Int(check.next));
                }
                Ok(WriteSummary::one(id.get()))
            }
            WriteOp::DeleteNode { node } => {
                let deleted = self.select(node).is_some_and(|id| self.delete_node(id));
                Ok(WriteSummary {
                    affected: u64::from(deleted),
                    generated_ids: Vec::new(),
                })
            }
            WriteOp::CreateRelationship {
                start,
                end,
                rel_type,
                properties,
            } => {
                let id = self.create_relationship(*start, rel_type, *end, properties)?;
                Ok(WriteSummary::one(id.get()))
            }
            WriteOp::UpdateRelationship { id, properties } => {
                match self.relationships.get_mut(id) {
                    Some(rel) => {
                        set_properties(&mut rel.properties, properties);
                        Ok(WriteSummary {
                            affected: 1,
                            generated_ids: Vec::new(),
                        })
                    }
                    None => Ok(WriteSummary::none()),
                }
            }
            WriteOp::DeleteRelationship { id } => Ok(WriteSummary {
                affected: u64::from(self.relationships.remove(id).is_some()),
                generated_ids: Vec::new(),
            }),
        }
    }
}

/// `SET n += $props`: null removes a key.
fn set_properties(target: &mut PropertyMap, properties: &PropertyMap) {
    for (key, value) in properties {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Failures to inject into the store.
#[derive(Debug, Clone, Default)]
struct Faults {
    fail_on: Option<StatementType>,
    fail_on_count: usize,
    fail_begin: bool,
    fail_commit: bool,
}

/// Transaction bookkeeping, for assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    /// Transactions begun.
    pub begun: usize,
    /// Transactions committed.
    pub committed: usize,
    /// Transactions rolled back.
    pub rolled_back: usize,
    /// Writes executed, including failed ones.
    pub writes: usize,
    /// Reads executed.
    pub reads: usize,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<GraphState>,
    faults: Mutex<Faults>,
    stats: Mutex<TransactionStats>,
}

/// A shared in-memory graph. Clones refer to the same graph.
///
/// # Examples
///
/// ```
/// use neomap_core::PropertyMap;
/// use neomap_test::MemoryGraph;
///
/// let store = MemoryGraph::new();
/// let a = store.create_node(&["Person"], PropertyMap::from([("name".into(), "a".into())]));
/// let b = store.create_node(&["Person"], PropertyMap::new());
/// store.create_relationship(a, "KNOWS", b, PropertyMap::new());
///
/// assert_eq!(store.node_count(), 2);
/// assert_eq!(store.relationships_of(a).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    shared: Arc<Shared>,
}

impl MemoryGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node outside any transaction.
    pub fn create_node(&self, labels: &[&str], properties: PropertyMap) -> NodeId {
        let labels = labels.iter().map(|l| l.to_string()).collect();
        self.shared.state.lock().create_node(labels, properties)
    }

    /// Create a relationship outside any transaction.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint does not exist.
    pub fn create_relationship(
        &self,
        start: NodeId,
        rel_type: &str,
        end: NodeId,
        properties: PropertyMap,
    ) -> RelationshipId {
        match self
            .shared
            .state
            .lock()
            .create_relationship(start, rel_type, end, &properties)
        {
            Ok(id) => id,
            Err(e) => panic!("cannot create relationship: {e}"),
        }
    }

    /// A stored node.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.shared.state.lock().nodes.get(&id).cloned()
    }

    /// A stored relationship.
    pub fn relationship(&self, id: RelationshipId) -> Option<Relationship> {
        self.shared.state.lock().relationships.get(&id).cloned()
    }

    /// Every stored node carrying `label`.
    pub fn nodes_with_label(&self, label: &str) -> Vec<Node> {
        self.shared
            .state
            .lock()
            .nodes
            .values()
            .filter(|n| n.labels.contains(label))
            .cloned()
            .collect()
    }

    /// Every stored relationship starting or ending at `node`.
    pub fn relationships_of(&self, node: NodeId) -> Vec<Relationship> {
        self.shared
            .state
            .lock()
            .relationships
            .values()
            .filter(|r| r.start == node || r.end == node)
            .cloned()
            .collect()
    }

    /// Every stored relationship of type `rel_type`.
    pub fn relationships_of_type(&self, rel_type: &str) -> Vec<Relationship> {
        self.shared
            .state
            .lock()
            .relationships
            .values()
            .filter(|r| r.rel_type == rel_type)
            .cloned()
            .collect()
    }

    /// Number of stored nodes.
    pub fn node_count(&self) -> usize {
        self.shared.state.lock().nodes.len()
    }

    /// Number of stored relationships.
    pub fn relationship_count(&self) -> usize {
        self.shared.state.lock().relationships.len()
    }

    /// Overwrite one property of a stored node, as a concurrent writer would.
    pub fn set_node_property(&self, id: NodeId, key: &str, value: impl Into<Value>) {
        if let Some(node) = self.shared.state.lock().nodes.get_mut(&id) {
            node.properties.insert(key.to_string(), value.into());
        }
    }

    /// Fail the `nth` (1-based) and every later write of the given statement type.
    pub fn fail_on(&self, statement_type: StatementType, nth: usize) {
        let mut faults = self.shared.faults.lock();
        faults.fail_on = Some(statement_type);
        faults.fail_on_count = nth.max(1);
    }

    /// Fail every `begin`.
    pub fn fail_begin(&self) {
        self.shared.faults.lock().fail_begin = true;
    }

    /// Fail every `commit`.
    pub fn fail_commit(&self) {
        self.shared.faults.lock().fail_commit = true;
    }

    /// Remove every injected failure.
    pub fn clear_faults(&self) {
        *self.shared.faults.lock() = Faults::default();
    }

    /// Transaction bookkeeping so far.
    pub fn stats(&self) -> TransactionStats {
        *self.shared.stats.lock()
    }
}

impl TransactionProvider for MemoryGraph {
    type Tx = MemoryTransaction;

    fn begin(&self) -> ExecResult<MemoryTransaction> {
        if self.shared.faults.lock().fail_begin {
            return Err(ExecutionError::new("injected begin failure"));
        }
        self.shared.stats.lock().begun += 1;
        let working = self.shared.state.lock().clone();
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            working,
        })
    }
}

/// A transaction on a private copy of a [`MemoryGraph`].
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    working: GraphState,
}

impl MemoryTransaction {
    fn injected_failure(&self, op: &WriteOp) -> bool {
        let mut faults = self.shared.faults.lock();
        if faults.fail_on != Some(op.statement_type()) {
            return false;
        }
        faults.fail_on_count = faults.fail_on_count.saturating_sub(1);
        faults.fail_on_count == 0
    }
}

impl Transaction for MemoryTransaction {
    fn execute_query(&mut self, op: &ReadOp) -> ExecResult<RecordIter<'_>> {
        self.shared.stats.lock().reads += 1;
        let records = self.working.read(op);
        trace!(records = records.len(), "memory graph read");
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn execute_write(&mut self, op: &WriteOp) -> ExecResult<WriteSummary> {
        self.shared.stats.lock().writes += 1;
        if self.injected_failure(op) {
            return Err(ExecutionError::new(format!(
                "injected failure on {:?}",
                op.statement_type()
            )));
        }
        self.working.write(op)
    }

    fn commit(self) -> ExecResult<()> {
        if self.shared.faults.lock().fail_commit {
            self.shared.stats.lock().rolled_back += 1;
            return Err(ExecutionError::new("injected commit failure"));
        }
        *self.shared.state.lock() = self.working;
        self.shared.stats.lock().committed += 1;
        Ok(())
    }

    fn rollback(self) -> ExecResult<()> {
        self.shared.stats.lock().rolled_back += 1;
        Ok(())
    }
}
