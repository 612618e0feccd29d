//! Insert chain coalescing.
//!
//! A transport that inserts blocks in batches wants each run of
//! consecutive new siblings as one unit, anchored once on each side. A
//! chain grows to the right when an insert's `afterId` is the chain's
//! tail, and absorbs a chain on its right whose head is anchored after the
//! block just added.

use std::collections::HashMap;

use blockpatch_types::{BlockPayload, PatchOp};

/// A run of consecutive inserted siblings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertChain {
    pub parent_id: String,
    /// Anchor before the first block.
    pub after_id: Option<String>,
    /// Anchor after the last block.
    pub before_id: Option<String>,
    pub blocks: Vec<BlockPayload>,
}

impl InsertChain {
    pub fn head(&self) -> &str {
        self.blocks.first().map(|b| b.id.as_str()).unwrap_or_default()
    }

    pub fn tail(&self) -> &str {
        self.blocks.last().map(|b| b.id.as_str()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn append(&mut self, right: InsertChain) {
        self.before_id = right.before_id;
        self.blocks.extend(right.blocks);
    }
}

/// Group the insert ops of `ops` into maximal chains.
///
/// Non-insert ops are ignored. Chains come back in the order their first
/// block appeared, so a chain inserting a parent precedes chains inserting
/// its children.
pub fn coalesce_inserts(ops: &[PatchOp]) -> Vec<InsertChain> {
    let mut slots: Vec<Option<InsertChain>> = Vec::new();
    // tail id -> slot, and chain's after anchor -> slot
    let mut by_tail: HashMap<String, usize> = HashMap::new();
    let mut by_after: HashMap<String, usize> = HashMap::new();

    for op in ops {
        let PatchOp::Insert {
            block,
            after_id,
            before_id,
        } = op
        else {
            continue;
        };

        let current = InsertChain {
            parent_id: block.parent_id.clone(),
            after_id: after_id.clone(),
            before_id: before_id.clone(),
            blocks: vec![block.clone()],
        };

        let left = after_id
            .as_ref()
            .and_then(|a| by_tail.get(a).copied())
            .filter(|&slot| same_parent(&slots, slot, &current.parent_id));
        let right = by_after
            .get(&block.id)
            .copied()
            .filter(|&slot| same_parent(&slots, slot, &current.parent_id))
            .filter(|&slot| Some(slot) != left);

        let slot = match left {
            Some(slot) => {
                if let Some(chain) = slots[slot].as_mut() {
                    by_tail.remove(chain.tail());
                    chain.append(current);
                }
                slot
            }
            None => {
                if let Some(after) = &current.after_id {
                    by_after.insert(after.clone(), slots.len());
                }
                slots.push(Some(current));
                slots.len() - 1
            }
        };

        if let Some(right_slot) = right {
            if let Some(right_chain) = slots[right_slot].take() {
                by_tail.remove(right_chain.tail());
                by_after.remove(&block.id);
                if let Some(chain) = slots[slot].as_mut() {
                    chain.append(right_chain);
                }
            }
        }

        if let Some(chain) = slots[slot].as_ref() {
            by_tail.insert(chain.tail().to_string(), slot);
        }
    }

    slots.into_iter().flatten().collect()
}

fn same_parent(slots: &[Option<InsertChain>], slot: usize, parent_id: &str) -> bool {
    slots
        .get(slot)
        .and_then(Option::as_ref)
        .is_some_and(|c| c.parent_id == parent_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpatch_types::FlatBlock;

    fn insert(id: &str, parent: &str, after: Option<&str>, before: Option<&str>) -> PatchOp {
        PatchOp::Insert {
            block: FlatBlock {
                id: id.into(),
                kind: "paragraph".into(),
                parent_id: parent.into(),
                ..Default::default()
            },
            after_id: after.map(str::to_string),
            before_id: before.map(str::to_string),
        }
    }

    fn chain_ids(chain: &InsertChain) -> Vec<&str> {
        chain.blocks.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn consecutive_inserts_form_one_chain() {
        let ops = vec![
            insert("x", "", Some("a"), Some("y")),
            insert("y", "", Some("x"), Some("z")),
            insert("z", "", Some("y"), Some("b")),
        ];
        let chains = coalesce_inserts(&ops);
        assert_eq!(chains.len(), 1);
        assert_eq!(chain_ids(&chains[0]), vec!["x", "y", "z"]);
        assert_eq!(chains[0].after_id.as_deref(), Some("a"));
        assert_eq!(chains[0].before_id.as_deref(), Some("b"));
        assert_eq!(chains[0].head(), "x");
        assert_eq!(chains[0].tail(), "z");
    }

    #[test]
    fn separated_inserts_stay_apart() {
        let ops = vec![
            insert("x", "", Some("a"), Some("b")),
            insert("y", "", Some("b"), None),
        ];
        let chains = coalesce_inserts(&ops);
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn right_chain_is_absorbed() {
        // z arrives first, anchored after y; y then bridges x and z.
        let ops = vec![
            insert("z", "", Some("y"), None),
            insert("x", "", Some("a"), Some("y")),
            insert("y", "", Some("x"), Some("z")),
        ];
        let chains = coalesce_inserts(&ops);
        assert_eq!(chains.len(), 1);
        assert_eq!(chain_ids(&chains[0]), vec!["x", "y", "z"]);
        assert_eq!(chains[0].after_id.as_deref(), Some("a"));
        assert_eq!(chains[0].before_id, None);
    }

    #[test]
    fn parent_chain_precedes_child_chains() {
        let ops = vec![
            insert("n", "", Some("a"), Some("m")),
            insert("n1", "n", None, Some("n2")),
            insert("n2", "n", Some("n1"), None),
            insert("m", "", Some("n"), None),
        ];
        let chains = coalesce_inserts(&ops);
        assert_eq!(chains.len(), 2);
        assert_eq!(chain_ids(&chains[0]), vec!["n", "m"]);
        assert_eq!(chain_ids(&chains[1]), vec!["n1", "n2"]);
        assert_eq!(chains[1].parent_id, "n");
    }

    #[test]
    fn non_inserts_are_ignored() {
        let ops = vec![
            PatchOp::Delete { node_uid: "q".into() },
            insert("x", "", None, None),
        ];
        let chains = coalesce_inserts(&ops);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 1);
        assert!(coalesce_inserts(&[]).is_empty());
    }
}
