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

//! A demand-driven record channel.
//!
//! The producer side ([`RecordSender`]) may only emit a record once the
//! consumer ([`RecordReceiver`]) has asked for one, plus a fixed prefetch
//! window. Every stream ends with exactly one terminal signal: completion or
//! failure. Dropping the receiver cancels the producer.

use std::sync::Arc;

use futures::Stream;
use neomap_core::{ExecutionError, OgmError, Result};
use neomap_cypher::ResultRecord;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// What travels through the channel.
#[derive(Debug)]
pub enum RecordEvent {
    /// One result record.
    Record(ResultRecord),
    /// No more records; the result is complete.
    Complete,
    /// The producer failed; no more records follow.
    Failed(ExecutionError),
}

/// Create a record channel.
///
/// `prefetch` records may be sent before the consumer asks for the first
/// one; with `0` every record is produced strictly on demand.
///
/// # Examples
///
/// ```
/// # futures::executor::block_on(async {
/// use neomap_cypher::ResultRecord;
/// use neomap_stream::record_channel;
///
/// let (tx, mut rx) = record_channel(1);
/// tx.send(ResultRecord::new()).await.unwrap();
/// tx.finish();
///
/// assert!(rx.next().await.unwrap().is_ok());
/// assert!(rx.next().await.is_none());
/// # });
/// ```
pub fn record_channel(prefetch: usize) -> (RecordSender, RecordReceiver) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let demand = Arc::new(Semaphore::new(prefetch));
    let cancel = CancellationToken::new();
    (
        RecordSender {
            events: events_tx,
            demand: Arc::clone(&demand),
            cancel: cancel.clone(),
            terminated: false,
        },
        RecordReceiver {
            events: events_rx,
            demand,
            cancel,
            done: false,
            received: 0,
        },
    )
}

/// Producer half of a record channel.
#[derive(Debug)]
pub struct RecordSender {
    events: mpsc::UnboundedSender<RecordEvent>,
    demand: Arc<Semaphore>,
    cancel: CancellationToken,
    terminated: bool,
}

impl RecordSender {
    /// Send one record once the consumer asked for it.
    ///
    /// Fails with [`OgmError::Cancelled`] when the consumer went away.
    pub async fn send(&self, record: ResultRecord) -> Result<()> {
        let permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(OgmError::Cancelled),
            permit = self.demand.acquire() => permit.map_err(|_| OgmError::Cancelled)?,
        };
        permit.forget();
        self.events
            .send(RecordEvent::Record(record))
            .map_err(|_| OgmError::Cancelled)
    }

    /// Signal that every record was sent.
    pub fn finish(mut self) {
        self.terminate(RecordEvent::Complete);
    }

    /// Signal that producing records failed.
    pub fn fail(mut self, error: ExecutionError) {
        self.terminate(RecordEvent::Failed(error));
    }

    /// Whether the consumer cancelled the stream.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Completes once the consumer cancelled the stream.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    fn terminate(&mut self, event: RecordEvent) {
        if !self.terminated {
            self.terminated = true;
            // The receiver may already be gone; nothing is waiting then.
            let _ = self.events.send(event);
        }
    }
}

impl Drop for RecordSender {
    fn drop(&mut self) {
        if !self.terminated {
            debug!("record producer dropped without a terminal signal");
            self.terminate(RecordEvent::Failed(ExecutionError::new(
                "record producer stopped without completing",
            )));
        }
    }
}

/// Consumer half of a record channel.
#[derive(Debug)]
pub struct RecordReceiver {
    events: mpsc::UnboundedReceiver<RecordEvent>,
    demand: Arc<Semaphore>,
    cancel: CancellationToken,
    done: bool,
    received: usize,
}

impl RecordReceiver {
    /// Ask for and await the next record.
    ///
    /// Returns `None` after completion; a producer failure is returned once,
    /// as a [`OgmError::Persistence`] error, and also ends the stream.
    pub async fn next(&mut self) -> Option<Result<ResultRecord>> {
        if self.done {
            return None;
        }
        self.demand.add_permits(1);
        match self.events.recv().await {
            Some(RecordEvent::Record(record)) => {
                self.received += 1;
                trace!(received = self.received, "record received");
                Some(Ok(record))
            }
            Some(RecordEvent::Complete) => {
                self.done = true;
                None
            }
            Some(RecordEvent::Failed(error)) => {
                self.done = true;
                Some(Err(OgmError::persistence("record stream", error)))
            }
            None => {
                self.done = true;
                Some(Err(OgmError::persistence(
                    "record stream",
                    ExecutionError::new("record producer disappeared"),
                )))
            }
        }
    }

    /// Number of records received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Stop the stream; the producer sees [`OgmError::Cancelled`] on its
    /// next send.
    pub fn cancel(&mut self) {
        self.done = true;
        self.cancel.cancel();
    }

    /// A token cancelled together with this receiver.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Adapt into a [`Stream`] of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<ResultRecord>> {
        futures::stream::unfold(self, |mut rx| async move {
            let item = rx.next().await?;
            Some((item, rx))
        })
    }
}

impl Drop for RecordReceiver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Send every record of `records`, then signal completion.
///
/// Stops early with [`OgmError::Cancelled`] when the consumer goes away.
pub async fn forward_records<I>(sender: RecordSender, records: I) -> Result<()>
where
    I: IntoIterator<Item = ResultRecord>,
{
    for record in records {
        sender.send(record).await?;
    }
    sender.finish();
    Ok(())
}
