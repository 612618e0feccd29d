//! Patch operations: the output of a diff and the input of a replay.
//!
//! Operations position blocks with anchors (`afterId` / `beforeId`) rather
//! than absolute indices, so a remote party can apply them without sharing
//! the full sibling list.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::flat::BlockPayload;

/// One atomic structural instruction.
///
/// Serialized with an `op` tag:
/// `{"op": "insert", "block": {...}, "afterId": ..., "beforeId": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// A block present only in the new snapshot.
    Insert {
        block: BlockPayload,
        #[serde(rename = "afterId", default)]
        after_id: Option<String>,
        #[serde(rename = "beforeId", default)]
        before_id: Option<String>,
    },
    /// A block present only in the old snapshot. Its subtree goes with it.
    Delete { node_uid: String },
    /// A block whose position cannot be inferred from its neighbours.
    Move {
        node_uid: String,
        /// `None` for the top level.
        #[serde(default)]
        new_parent_uid: Option<String>,
        #[serde(rename = "afterId", default)]
        after_id: Option<String>,
        #[serde(rename = "beforeId", default)]
        before_id: Option<String>,
        order: usize,
    },
    /// Full replacement of a block's type, props, and runs.
    ///
    /// The payload's `parentId` and `order` are informational only.
    /// Consumers must not reposition the block from an update; position
    /// changes always come as a separate `Move`.
    Update {
        node_uid: String,
        block: BlockPayload,
    },
}

/// The kind of a [`PatchOp`], in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    Insert,
    Delete,
    Move,
    Update,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Insert => "insert",
            OpKind::Delete => "delete",
            OpKind::Move => "move",
            OpKind::Update => "update",
        };
        f.write_str(name)
    }
}

impl PatchOp {
    pub fn kind(&self) -> OpKind {
        match self {
            PatchOp::Insert { .. } => OpKind::Insert,
            PatchOp::Delete { .. } => OpKind::Delete,
            PatchOp::Move { .. } => OpKind::Move,
            PatchOp::Update { .. } => OpKind::Update,
        }
    }

    /// The id of the block this operation targets.
    pub fn node_id(&self) -> &str {
        match self {
            PatchOp::Insert { block, .. } => &block.id,
            PatchOp::Delete { node_uid }
            | PatchOp::Move { node_uid, .. }
            | PatchOp::Update { node_uid, .. } => node_uid,
        }
    }
}

/// An ordered list of patch operations for one old-to-new transition.
///
/// Serializes transparently as a JSON array of operations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchSet {
    ops: Vec<PatchOp>,
}

impl PatchSet {
    /// Create an empty patch set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn push(&mut self, op: PatchOp) {
        self.ops.push(op);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOp> {
        self.ops.iter()
    }

    pub fn as_slice(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<PatchOp> {
        self.ops
    }

    /// Number of operations of the given kind.
    pub fn count(&self, kind: OpKind) -> usize {
        self.ops.iter().filter(|op| op.kind() == kind).count()
    }

    pub fn inserts(&self) -> usize {
        self.count(OpKind::Insert)
    }

    pub fn deletes(&self) -> usize {
        self.count(OpKind::Delete)
    }

    pub fn moves(&self) -> usize {
        self.count(OpKind::Move)
    }

    pub fn updates(&self) -> usize {
        self.count(OpKind::Update)
    }
}

impl From<Vec<PatchOp>> for PatchSet {
    fn from(ops: Vec<PatchOp>) -> Self {
        Self { ops }
    }
}

impl IntoIterator for PatchSet {
    type Item = PatchOp;
    type IntoIter = std::vec::IntoIter<PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a PatchSet {
    type Item = &'a PatchOp;
    type IntoIter = std::slice::Iter<'a, PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Decode a JSON array of patch operations.
pub fn ops_from_json(json: &str) -> Result<PatchSet, TypeError> {
    serde_json::from_str(json).map_err(|e| TypeError::InvalidPatch(e.to_string()))
}
