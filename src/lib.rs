// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # diffscope
//!
//! A match model and synchronized multi-view graph layer for interactive binary
//! diff browsing. `diffscope` takes the correspondence results an external
//! diffing engine produced for two programs and keeps four coordinated views of
//! them consistent while the user edits matches, folds graph regions behind
//! proximity proxies, and undoes selections.
//!
//! ## Features
//!
//! - **Bipartite match model** - Function, basic-block and instruction
//!   correspondences with O(1) lookup from either side, running totals, and
//!   exact add/remove inverses
//! - **Four synchronized views** - Per-side views, a combined overlay, and a
//!   structural super view sharing one logical set of positions, linked by
//!   arena indices instead of owning pointers
//! - **Proximity browsing** - Depth-limited visibility with collapsible proxy
//!   nodes keeps graphs with tens of thousands of nodes navigable
//! - **Selection history** - Bounded undo/redo over selection snapshots,
//!   broadcast across all views
//! - **SQLite persistence** - Round-trip-faithful storage of matches and
//!   comments
//!
//! ## Quick Start
//!
//! ```rust
//! use diffscope::prelude::*;
//!
//! // Raw graphs normally come from the loader; build a tiny one by hand.
//! let mut primary = CallGraph::new();
//! primary.add_function(FunctionNode::new(Address::new(0x1000), "main"))?;
//! let mut secondary = CallGraph::new();
//! secondary.add_function(FunctionNode::new(Address::new(0x2000), "main"))?;
//!
//! let events = EventQueue::new();
//! let matches = MatchData::new(events.clone());
//! let mut diff = Diff::new(
//!     primary,
//!     secondary,
//!     matches,
//!     CommentStore::new(),
//!     ViewSettings::default(),
//!     events,
//! );
//!
//! diff.open_call_graph_view()?;
//! diff.add_function_match(FunctionMatch::new(
//!     Address::new(0x1000),
//!     Address::new(0x2000),
//!     1.0,
//!     1.0,
//!     MatchAlgorithm::Manual,
//! ))?;
//! assert_eq!(diff.matches().counts().matched_functions, 1);
//! # Ok::<(), diffscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `diffscope` is organized into several key modules:
//!
//! - [`matches`] - The match data model and its running totals
//! - [`views`] - The four-tier view layer: construction, mutation, proximity
//!   browsing, selection history
//! - [`program`] - The read contract of the loader-produced raw graphs
//! - [`graph`] - The arena graph infrastructure everything is built on
//! - [`events`] - The change-notification queue UI panels drain
//! - [`storage`] - SQLite persistence
//!
//! ## Consistency Model
//!
//! All mutation is synchronous and single-threaded: a match edit runs to
//! completion, with no observable intermediate state, before the next mutation
//! begins. Long-running collaborators (loading, layout) run elsewhere and
//! marshal their results back before touching any view. Counters surfaced to
//! observers are maintained incrementally and re-verified defensively after
//! every mutation.

#[macro_use]
pub(crate) mod error;

/// Change notification for match and view mutations.
///
/// Observers drain a [`events::EventQueue`] instead of registering callbacks;
/// see the module documentation for the delivery guarantees.
pub mod events;

/// Arena-based graph infrastructure.
///
/// [`graph::DiffGraph`] is the slot-arena directed graph every view is built
/// on; [`graph::NodeId`] and [`graph::EdgeId`] are the indices used for all
/// cross-view links.
pub mod graph;

/// The match data model.
///
/// [`matches::MatchData`] owns all function matches of a diff and maintains
/// the running totals UI panels read reactively. See the module documentation
/// for the counter discipline.
pub mod matches;

/// The read contract of the loader-produced raw graphs.
///
/// Per side, one [`program::CallGraph`] whose functions carry
/// [`program::FlowGraph`]s over [`program::BasicBlock`]s.
pub mod program;

/// SQLite persistence of matches and comments.
pub mod storage;

/// The four-tier synchronized view layer.
///
/// [`views::GraphsContainer`] builds and mutates one four-view set;
/// [`views::Diff`] aggregates the containers of a session.
pub mod views;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use diffscope::prelude::*;
///
/// let queue = EventQueue::new();
/// let matches = MatchData::new(queue);
/// assert_eq!(matches.counts().matched_functions, 0);
/// ```
pub mod prelude;

/// `diffscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. This is used consistently throughout the crate for all
/// fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `diffscope` Error type
///
/// The main error type for all operations in this crate. Distinguishes caller
/// errors (duplicate matches, unknown addresses), defensively detected
/// invariant violations, and recoverable persistence failures.
pub use error::Error;
