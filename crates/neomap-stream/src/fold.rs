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

//! Asynchronous reconstruction over a record stream.

use futures::{Stream, StreamExt};
use neomap_core::{ObjectGraph, OgmError, Result, SchemaRegistry};
use neomap_cypher::{ReconstructConfig, Reconstructor, ResultRecord};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::channel::RecordReceiver;

/// Fold a stream of records into an object graph.
///
/// The graph only becomes visible once the stream completed. A failed
/// record, a mapping error or cancellation through `cancel` discard the
/// partial graph; the stream is dropped before returning, which cancels a
/// channel producer.
pub async fn reconstruct_stream<S>(
    registry: &SchemaRegistry,
    root_type: &str,
    config: ReconstructConfig,
    records: S,
    cancel: &CancellationToken,
) -> Result<ObjectGraph>
where
    S: Stream<Item = Result<ResultRecord>>,
{
    let mut fold = Reconstructor::new(registry, root_type, config)?;
    futures::pin_mut!(records);
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(records = fold.records(), "reconstruction cancelled");
                return Err(OgmError::Cancelled);
            }
            next = records.next() => next,
        };
        match next {
            Some(record) => fold.accept(record?)?,
            None => return fold.finish(),
        }
    }
}

/// Fold everything a [`RecordReceiver`] delivers into an object graph.
///
/// Cancelling `cancel` stops the fold and cancels the producer.
pub async fn reconstruct_channel(
    registry: &SchemaRegistry,
    root_type: &str,
    config: ReconstructConfig,
    receiver: RecordReceiver,
    cancel: &CancellationToken,
) -> Result<ObjectGraph> {
    reconstruct_stream(registry, root_type, config, receiver.into_stream(), cancel).await
}
