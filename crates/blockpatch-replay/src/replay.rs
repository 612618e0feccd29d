//! Anchored replay of a patch set onto a flat snapshot.
//!
//! Ops are applied in phases rather than list order:
//!
//! 1. detach every move target, keeping its subtree;
//! 2. delete every delete target with what is left of its subtree;
//! 3. register every inserted block as a detached node;
//! 4. place detached nodes by anchor until a fixpoint;
//! 5. apply updates.
//!
//! After phases 1 and 2 each parent holds only the children whose relative
//! order the diff kept, and every pending node's `afterId` names its
//! predecessor in the new document. Placing a node right after its
//! predecessor, in whatever order predecessors become available, therefore
//! rebuilds the new sibling order.

use std::collections::{HashMap, HashSet};

use blockpatch_types::{FlatBlock, PatchOp};
use tracing::debug;

use crate::error::{ReplayError, ReplayResult};

const ROOT: &str = "";

#[derive(Debug)]
struct Node {
    block: FlatBlock,
    parent: String,
    attached: bool,
}

#[derive(Debug)]
struct Placement {
    id: String,
    parent: String,
    after_id: Option<String>,
    before_id: Option<String>,
}

/// A parent-pointer tree that patch sets are applied to.
#[derive(Debug, Default)]
pub struct PatchReplayer {
    nodes: HashMap<String, Node>,
    children: HashMap<String, Vec<String>>,
    removed: HashSet<String>,
}

impl PatchReplayer {
    /// Build the tree from a flat snapshot. Siblings are ordered by `order`.
    pub fn new(base: &[FlatBlock]) -> Self {
        let mut replayer = Self::default();
        for block in base {
            replayer
                .children
                .entry(block.parent_id.clone())
                .or_default()
                .push(block.id.clone());
            replayer.nodes.insert(
                block.id.clone(),
                Node {
                    block: block.clone(),
                    parent: block.parent_id.clone(),
                    attached: true,
                },
            );
        }

        let nodes = &replayer.nodes;
        for siblings in replayer.children.values_mut() {
            siblings.sort_by_key(|id| nodes.get(id).map(|n| n.block.order).unwrap_or(usize::MAX));
        }
        replayer
    }

    /// Number of live blocks, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Apply a patch set.
    pub fn apply(&mut self, ops: &[PatchOp]) -> ReplayResult<()> {
        let mut pending = Vec::new();

        for op in ops {
            if let PatchOp::Move {
                node_uid,
                new_parent_uid,
                after_id,
                before_id,
                ..
            } = op
            {
                self.detach(node_uid)?;
                pending.push(Placement {
                    id: node_uid.clone(),
                    parent: new_parent_uid.clone().unwrap_or_default(),
                    after_id: after_id.clone(),
                    before_id: before_id.clone(),
                });
            }
        }

        for op in ops {
            if let PatchOp::Delete { node_uid } = op {
                self.delete(node_uid)?;
            }
        }

        for op in ops {
            if let PatchOp::Insert {
                block,
                after_id,
                before_id,
            } = op
            {
                if self.nodes.contains_key(&block.id) {
                    return Err(ReplayError::DuplicateId(block.id.clone()));
                }
                self.removed.remove(&block.id);
                self.nodes.insert(
                    block.id.clone(),
                    Node {
                        block: block.clone(),
                        parent: block.parent_id.clone(),
                        attached: false,
                    },
                );
                pending.push(Placement {
                    id: block.id.clone(),
                    parent: block.parent_id.clone(),
                    after_id: after_id.clone(),
                    before_id: before_id.clone(),
                });
            }
        }

        self.place_all(pending)?;

        for op in ops {
            if let PatchOp::Update { node_uid, block } = op {
                let node = self
                    .nodes
                    .get_mut(node_uid)
                    .ok_or_else(|| ReplayError::UnknownNode(node_uid.clone()))?;
                node.block.kind = block.kind.clone();
                node.block.props = block.props.clone();
                node.block.runs = block.runs.clone();
                node.block.depth = block.depth.clone();
                debug!(node = %node_uid, "applied update");
            }
        }

        Ok(())
    }

    /// The current tree as a pre-order flat list with recomputed orders.
    pub fn snapshot(&self) -> Vec<FlatBlock> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(&str, &str, usize)> = self
            .siblings(ROOT)
            .iter()
            .enumerate()
            .rev()
            .map(|(order, id)| (id.as_str(), ROOT, order))
            .collect();

        while let Some((id, parent, order)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let mut block = node.block.clone();
            block.parent_id = parent.to_string();
            block.order = order;
            out.push(block);

            stack.extend(
                self.siblings(id)
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(order, child)| (child.as_str(), id, order)),
            );
        }

        out
    }

    fn siblings(&self, parent: &str) -> &[String] {
        self.children.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    fn detach(&mut self, id: &str) -> ReplayResult<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ReplayError::UnknownNode(id.to_string()))?;
        if node.attached {
            node.attached = false;
            if let Some(siblings) = self.children.get_mut(&node.parent) {
                siblings.retain(|s| s != id);
            }
        }
        debug!(node = %id, "detached for move");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> ReplayResult<()> {
        let Some(node) = self.nodes.get(id) else {
            if self.removed.contains(id) {
                return Ok(());
            }
            return Err(ReplayError::UnknownNode(id.to_string()));
        };

        if node.attached {
            if let Some(siblings) = self.children.get_mut(&node.parent) {
                siblings.retain(|s| s != id);
            }
        }

        let mut stack = vec![id.to_string()];
        let mut count = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(kids) = self.children.remove(&current) {
                stack.extend(kids);
            }
            self.nodes.remove(&current);
            self.removed.insert(current);
            count += 1;
        }
        debug!(node = %id, removed = count, "deleted subtree");
        Ok(())
    }

    fn place_all(&mut self, mut pending: Vec<Placement>) -> ReplayResult<()> {
        for placement in &pending {
            if placement.parent != ROOT && !self.nodes.contains_key(&placement.parent) {
                return Err(ReplayError::UnknownParent {
                    node: placement.id.clone(),
                    parent: placement.parent.clone(),
                });
            }
        }

        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|p| !self.place_after(p));
            if pending.len() < before {
                continue;
            }

            pending.retain(|p| !self.place_before(p));
            if pending.len() == before {
                let stuck = &pending[0];
                return Err(ReplayError::UnresolvedAnchor {
                    node: stuck.id.clone(),
                    after_id: stuck.after_id.clone(),
                    before_id: stuck.before_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Place right after `after_id`, or at the front when it is `None`.
    fn place_after(&mut self, p: &Placement) -> bool {
        let siblings = self.children.entry(p.parent.clone()).or_default();
        let index = match &p.after_id {
            None => 0,
            Some(after) => match siblings.iter().position(|s| s == after) {
                Some(pos) => pos + 1,
                None => return false,
            },
        };
        siblings.insert(index, p.id.clone());
        self.attach(p);
        true
    }

    /// Place right before `before_id` if it is attached under the target parent.
    fn place_before(&mut self, p: &Placement) -> bool {
        let Some(before) = &p.before_id else {
            return false;
        };
        let siblings = self.children.entry(p.parent.clone()).or_default();
        let Some(index) = siblings.iter().position(|s| s == before) else {
            return false;
        };
        siblings.insert(index, p.id.clone());
        self.attach(p);
        true
    }

    fn attach(&mut self, p: &Placement) {
        if let Some(node) = self.nodes.get_mut(&p.id) {
            node.parent = p.parent.clone();
            node.attached = true;
        }
    }
}

/// Apply `ops` to the flat snapshot `base`, returning the resulting snapshot.
pub fn apply_patch(base: &[FlatBlock], ops: &[PatchOp]) -> ReplayResult<Vec<FlatBlock>> {
    let mut replayer = PatchReplayer::new(base);
    replayer.apply(ops)?;
    Ok(replayer.snapshot())
}
