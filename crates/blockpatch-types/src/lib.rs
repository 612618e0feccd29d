//! Foundation types for block-tree patching.
//!
//! This crate models both sides of the diff engine: the nested block tree
//! produced by the rich-text editor, and the flat, anchor-positioned patch
//! operations shipped to a remote store. Every other `blockpatch` crate
//! depends on `blockpatch-types`.
//!
//! # Key Types
//!
//! - [`Block`] / [`BlockContent`] -- Editor block tree node and its inline or table content
//! - [`StyledRun`] / [`TextStyles`] -- A span of text sharing one style set
//! - [`FlatBlock`] -- A tree node projected to parent id + sibling order
//! - [`PatchOp`] / [`PatchSet`] -- Tagged insert/delete/move/update operations

pub mod block;
pub mod error;
pub mod flat;
pub mod patch;
pub mod run;

pub use block::{
    blocks_from_json, blocks_from_value, Block, BlockContent, CellContent, InlineContent, Props,
    StyledText, TableCell, TableContent, TableRow,
};
pub use error::TypeError;
pub use flat::{BlockPayload, FlatBlock};
pub use patch::{ops_from_json, OpKind, PatchOp, PatchSet};
pub use run::{plain_text, RunKind, StyledRun, TextStyles};
