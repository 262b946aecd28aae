//! The match model: who corresponds to whom, at every granularity.
//!
//! A diff session records correspondences ("matches") between the two programs
//! at three granularities: functions, basic blocks within a matched function
//! pair, and instructions within a matched block pair. All three share one
//! shape: a bipartite relation in which each side's address participates in at
//! most one correspondence, keyed by an [`AddressPair`].
//!
//! # Key Components
//!
//! - [`Address`] / [`AddressPair`] - The universal correspondence keys
//! - [`InstructionMatch`] / [`BasicBlockMatch`] / [`FunctionMatch`] - The three
//!   granularities, each owning the next finer one
//! - [`MatchData`] - The aggregate owning all function matches of a diff, with
//!   bidirectional O(1) lookup, running totals and change notification
//! - [`MatchAlgorithm`] - Which matching step claimed a correspondence
//! - [`CommentStore`] - User comments keyed by position, persisted alongside
//!   the matches
//!
//! # Counter Discipline
//!
//! [`FunctionMatch`] and [`MatchData`] maintain running counters so UI panels
//! can read totals reactively instead of re-scanning the model. Every mutation
//! updates the counters in the same transaction, removal restores them
//! bit-for-bit, and the equality between counters and true cardinalities is
//! re-verified defensively after every mutation.

mod address;
mod algorithm;
mod basic_block;
pub(crate) mod bipartite;
mod comment;
mod data;
mod function;
mod instruction;

pub use address::{Address, AddressPair};
pub use algorithm::MatchAlgorithm;
pub use basic_block::BasicBlockMatch;
pub use bipartite::Correspondence;
pub use comment::{CommentPlacement, CommentStore};
pub use data::{CombinedNodeContext, DiffCounts, MatchData};
pub use function::{FunctionMatch, FunctionMatchFlags};
pub use instruction::InstructionMatch;
