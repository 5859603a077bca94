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

//! The execution collaborator: transactions that run reads and writes.
//!
//! A store binding implements [`Transaction`] for its explicit transaction
//! type and [`TransactionProvider`] for whatever hands those out (a driver
//! session, a connection pool, an in-memory store). Bindings backed by a
//! Cypher endpoint render operations with `ReadOp::to_statement` and
//! `WriteOp::to_statement`.

use neomap_core::{ExecutionError, OgmError, Result};
use tracing::warn;

use crate::ops::{ReadOp, WriteOp};
use crate::record::ResultRecord;

/// Outcome of one write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Nodes or relationships matched or created.
    pub affected: u64,
    /// Store identities of created (or merged) nodes and relationships.
    pub generated_ids: Vec<i64>,
}

impl WriteSummary {
    /// A summary for one record with the given identity.
    pub fn one(id: i64) -> Self {
        Self {
            affected: 1,
            generated_ids: vec![id],
        }
    }

    /// A summary for writes that matched nothing.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Records of a read, pulled one at a time.
pub type RecordIter<'a> =
    Box<dyn Iterator<Item = std::result::Result<ResultRecord, ExecutionError>> + 'a>;

/// An explicit store transaction.
pub trait Transaction {
    /// Run a read. Records are produced lazily as the iterator is advanced.
    fn execute_query(&mut self, op: &ReadOp) -> std::result::Result<RecordIter<'_>, ExecutionError>;

    /// Run a write.
    fn execute_write(&mut self, op: &WriteOp) -> std::result::Result<WriteSummary, ExecutionError>;

    /// Make every write of this transaction durable.
    fn commit(self) -> std::result::Result<(), ExecutionError>;

    /// Discard every write of this transaction.
    fn rollback(self) -> std::result::Result<(), ExecutionError>;
}

/// Source of explicit transactions.
pub trait TransactionProvider {
    /// The transaction type.
    type Tx: Transaction;

    /// Begin a new explicit transaction.
    fn begin(&self) -> std::result::Result<Self::Tx, ExecutionError>;
}

/// A transaction that is rolled back unless explicitly committed.
///
/// Dropping the scope, including while unwinding, rolls the transaction back.
pub struct TransactionScope<T: Transaction> {
    tx: Option<T>,
}

impl<T: Transaction> TransactionScope<T> {
    /// Begin a transaction from a provider.
    pub fn begin<P: TransactionProvider<Tx = T>>(provider: &P) -> Result<Self> {
        let tx = provider
            .begin()
            .map_err(|e| OgmError::persistence("transaction begin", e))?;
        Ok(Self { tx: Some(tx) })
    }

    /// The open transaction.
    pub fn transaction(&mut self) -> Result<&mut T> {
        self.tx
            .as_mut()
            .ok_or_else(|| OgmError::Mapping("transaction already finished".to_string()))
    }

    /// Commit the transaction.
    pub fn commit(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx
                .commit()
                .map_err(|e| OgmError::persistence("transaction commit", e)),
            None => Ok(()),
        }
    }

    /// Roll the transaction back.
    pub fn rollback(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx
                .rollback()
                .map_err(|e| OgmError::persistence("transaction rollback", e)),
            None => Ok(()),
        }
    }
}

impl<T: Transaction> Drop for TransactionScope<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback() {
                warn!(error = %e, "rollback of abandoned transaction failed");
            }
        }
    }
}

/// Run `work` in a new transaction: commit on `Ok`, roll back on `Err`.
pub fn in_transaction<P, F, R>(provider: &P, work: F) -> Result<R>
where
    P: TransactionProvider,
    F: FnOnce(&mut P::Tx) -> Result<R>,
{
    let mut scope = TransactionScope::begin(provider)?;
    match work(scope.transaction()?) {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = scope.rollback() {
                warn!(error = %rollback, cause = %err, "rollback failed");
            }
            Err(err)
        }
    }
}
