//! Diff engine for block trees.
//!
//! Given two complete snapshots of the same document, computes the ordered
//! set of insert, delete, move, and update operations that turns the old
//! snapshot into the new one. Operations are positioned by sibling anchors
//! so a remote party can replay them without the local tree.
//!
//! # Pipeline
//!
//! tree -> [`flatten`] (with [`extract`]) -> flat list ->
//! [`deep_eq`] + [`moves`] -> [`assemble`] -> [`PatchSet`](blockpatch_types::PatchSet)
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- Configured entry point; [`diff_documents`] uses defaults
//! - [`ExtractorRegistry`] / [`ContentExtractor`] -- Block kind to run extraction strategy
//! - [`FlatIndex`] -- Per-snapshot id and parent-group lookup
//! - [`DiffConfig`] -- Extractor routing, heading depth, group size warning
//!
//! # Scaling
//!
//! Move detection runs an O(n*m) longest-common-subsequence per parent,
//! where n and m are that parent's sibling counts on each side. A document
//! with thousands of blocks under a single parent pays proportionally on
//! every diff; the engine logs a warning when a group exceeds
//! [`DiffConfig::large_group_threshold`].

pub mod assemble;
pub mod config;
pub mod deep_eq;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod moves;

pub use assemble::{diff_documents, diff_snapshots, DiffEngine, DiffStats};
pub use config::DiffConfig;
pub use deep_eq::{deep_equal, DeepEq};
pub use error::{DiffError, DiffResult};
pub use extract::{
    extract_inline, extract_runs, extract_table, ContentExtractor, ExtractorRegistry,
    InlineExtractor, TableExtractor,
};
pub use flatten::{flatten_document, Flattener};
pub use moves::{detect_moves, lcs, Anchors, FlatIndex, MoveDetector, MoveReport};
