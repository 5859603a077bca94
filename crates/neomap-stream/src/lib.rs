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

//! Asynchronous, backpressured record consumption for neomap.
//!
//! This crate connects a non-blocking record producer (a driver session
//! pushing rows) with the reconstruction fold of `neomap-cypher`:
//!
//! - **Demand-driven**: the producer emits the next record only after the
//!   consumer asked for it, plus a configurable prefetch window
//! - **Explicit termination**: every stream ends with completion or failure;
//!   a producer that disappears silently is reported as a failure
//! - **Cancellation**: dropping the consumer, or cancelling its token,
//!   stops the producer and discards the partial object graph
//!
//! # Example
//!
//! ```rust
//! # futures::executor::block_on(async {
//! use neomap_cypher::{Node, ReconstructConfig, ResultRecord};
//! use neomap_stream::{forward_records, reconstruct_channel, record_channel};
//! use tokio_util::sync::CancellationToken;
//!
//! let registry = neomap_test::fixtures::registry();
//! let records = vec![ResultRecord::new().with(
//!     "n",
//!     Node::new(1).with_label("Person").with_property("name", "alice"),
//! )];
//!
//! let (tx, rx) = record_channel(0);
//! let cancel = CancellationToken::new();
//! let (sent, graph) = futures::join!(
//!     forward_records(tx, records),
//!     reconstruct_channel(&registry, "Person", ReconstructConfig::default(), rx, &cancel),
//! );
//! sent.unwrap();
//! assert_eq!(graph.unwrap().roots().len(), 1);
//! # });
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod channel;
pub mod fold;

pub use channel::{forward_records, record_channel, RecordEvent, RecordReceiver, RecordSender};
pub use fold::{reconstruct_channel, reconstruct_stream};
