//! Patch assembly: flat snapshots to an ordered, anchored op list.
//!
//! Ops are emitted by kind in the fixed order insert, delete, move, update.
//! Within a kind, inserts, moves, and updates follow new-document order and
//! deletes follow old-document order. Consumers apply ops in that order, and
//! later ops may reference ids only earlier inserts create.

use blockpatch_types::{Block, FlatBlock, PatchOp, PatchSet};
use serde::Serialize;
use tracing::debug;

use crate::config::DiffConfig;
use crate::deep_eq::deep_equal;
use crate::extract::{ContentExtractor, ExtractorRegistry};
use crate::flatten::Flattener;
use crate::moves::{FlatIndex, MoveDetector};

/// Counters describing one diff.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub old_blocks: usize,
    pub new_blocks: usize,
    pub groups_examined: usize,
    pub largest_group: usize,
    pub inserts: usize,
    pub deletes: usize,
    pub moves: usize,
    pub updates: usize,
}

/// The configured diff engine.
///
/// Holds no state between calls: every diff builds its own indexes from
/// the two snapshots it is given.
#[derive(Debug)]
pub struct DiffEngine {
    config: DiffConfig,
    registry: ExtractorRegistry,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(DiffConfig::default())
    }
}

impl DiffEngine {
    /// Create an engine whose extractor routing follows `config`.
    pub fn new(config: DiffConfig) -> Self {
        let registry = ExtractorRegistry::from_config(&config);
        Self { config, registry }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Route blocks of `kind` to a custom extraction strategy.
    pub fn register_extractor(
        &mut self,
        kind: impl Into<String>,
        extractor: Box<dyn ContentExtractor>,
    ) {
        self.registry.register(kind, extractor);
    }

    /// Flatten a document tree.
    pub fn flatten(&self, blocks: &[Block]) -> Vec<FlatBlock> {
        Flattener::new(&self.registry, &self.config).flatten(blocks)
    }

    /// Diff two document trees.
    pub fn diff(&self, old: &[Block], new: &[Block]) -> PatchSet {
        self.diff_with_stats(old, new).0
    }

    /// Diff two document trees, also returning counters.
    pub fn diff_with_stats(&self, old: &[Block], new: &[Block]) -> (PatchSet, DiffStats) {
        let old_flat = self.flatten(old);
        let new_flat = self.flatten(new);
        self.diff_flat_with_stats(&old_flat, &new_flat)
    }

    /// Diff two already flattened snapshots.
    pub fn diff_flat(&self, old: &[FlatBlock], new: &[FlatBlock]) -> PatchSet {
        self.diff_flat_with_stats(old, new).0
    }

    pub fn diff_flat_with_stats(
        &self,
        old: &[FlatBlock],
        new: &[FlatBlock],
    ) -> (PatchSet, DiffStats) {
        let old_index = FlatIndex::new(old);
        let new_index = FlatIndex::new(new);
        let report =
            MoveDetector::new(self.config.large_group_threshold).detect(&old_index, &new_index);

        let mut ops = PatchSet::new();

        for block in new.iter().filter(|b| !old_index.contains(&b.id)) {
            let anchors = new_index.anchors(block);
            ops.push(PatchOp::Insert {
                block: block.payload(),
                after_id: anchors.after_id,
                before_id: anchors.before_id,
            });
        }

        for block in old.iter().filter(|b| !new_index.contains(&b.id)) {
            ops.push(PatchOp::Delete {
                node_uid: block.id.clone(),
            });
        }

        for block in new
            .iter()
            .filter(|b| old_index.contains(&b.id) && report.moved.contains(b.id.as_str()))
        {
            let anchors = new_index.anchors(block);
            ops.push(PatchOp::Move {
                node_uid: block.id.clone(),
                new_parent_uid: block.parent().map(str::to_string),
                after_id: anchors.after_id,
                before_id: anchors.before_id,
                order: block.order,
            });
        }

        for block in new {
            let Some(prev) = old_index.get(&block.id) else {
                continue;
            };
            if content_changed(prev, block) {
                ops.push(PatchOp::Update {
                    node_uid: block.id.clone(),
                    block: block.payload(),
                });
            }
        }

        let stats = DiffStats {
            old_blocks: old.len(),
            new_blocks: new.len(),
            groups_examined: report.groups_examined,
            largest_group: report.largest_group,
            inserts: ops.inserts(),
            deletes: ops.deletes(),
            moves: ops.moves(),
            updates: ops.updates(),
        };
        debug!(
            old = stats.old_blocks,
            new = stats.new_blocks,
            inserts = stats.inserts,
            deletes = stats.deletes,
            moves = stats.moves,
            updates = stats.updates,
            "diff assembled"
        );

        (ops, stats)
    }
}

/// Returns `true` if type, props, or runs differ. Position is not compared.
fn content_changed(old: &FlatBlock, new: &FlatBlock) -> bool {
    old.kind != new.kind
        || !deep_equal(&old.props, &new.props)
        || !deep_equal(old.runs.as_slice(), new.runs.as_slice())
}

/// Diff two document trees with the default configuration.
pub fn diff_documents(old: &[Block], new: &[Block]) -> PatchSet {
    DiffEngine::default().diff(old, new)
}

/// Diff two flat snapshots with the default configuration.
pub fn diff_snapshots(old: &[FlatBlock], new: &[FlatBlock]) -> PatchSet {
    DiffEngine::default().diff_flat(old, new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpatch_types::{InlineContent, OpKind, StyledRun, TableContent, TextStyles};
    use serde_json::json;

    fn para(id: &str, text: &str) -> Block {
        Block::new(id, "paragraph").with_inline(vec![InlineContent::text(text)])
    }

    fn kinds(ops: &PatchSet) -> Vec<OpKind> {
        ops.iter().map(PatchOp::kind).collect()
    }

    #[test]
    fn identical_snapshots_produce_no_ops() {
        let doc = vec![
            para("a", "one"),
            Block::new("list", "bulletListItem").with_child(para("c", "child")),
            Block::new("t", "table").with_table(TableContent::from_rows(vec![vec![vec![
                InlineContent::text("cell"),
            ]]])),
        ];
        assert!(diff_documents(&doc, &doc).is_empty());
        assert!(diff_documents(&[], &[]).is_empty());
    }

    #[test]
    fn appended_leaf_is_one_insert() {
        let old = vec![Block::new("p", "bulletListItem")
            .with_child(para("c1", "x"))
            .with_child(para("c2", "y"))];
        let new = vec![old[0].clone().with_child(para("c3", "z"))];

        let ops = diff_documents(&old, &new);
        assert_eq!(ops.len(), 1);
        match &ops.as_slice()[0] {
            PatchOp::Insert {
                block,
                after_id,
                before_id,
            } => {
                assert_eq!(block.id, "c3");
                assert_eq!(block.parent_id, "p");
                assert_eq!(block.order, 2);
                assert_eq!(block.runs, vec![StyledRun::plain("z")]);
                assert_eq!(after_id.as_deref(), Some("c2"));
                assert_eq!(*before_id, None);
            }
            other => panic!("expected Insert, got {:?}", other),
        }

        let reverse = diff_documents(&new, &old);
        assert_eq!(
            reverse.into_ops(),
            vec![PatchOp::Delete {
                node_uid: "c3".into()
            }]
        );
    }

    #[test]
    fn text_edit_is_update_only() {
        let old = vec![para("a", "Hello")];
        let new = vec![para("a", "Hello World")];

        let ops = diff_documents(&old, &new);
        let value = serde_json::to_value(&ops).unwrap();
        assert_eq!(
            value,
            json!([{
                "op": "update",
                "node_uid": "a",
                "block": {
                    "id": "a",
                    "type": "paragraph",
                    "props": {},
                    "parentId": "",
                    "order": 0,
                    "runs": [{"type": "text", "text": "Hello World", "styles": {}}]
                }
            }])
        );
    }

    #[test]
    fn style_and_prop_changes_are_updates() {
        let old = vec![para("a", "x"), para("b", "y")];
        let new = vec![
            Block::new("a", "paragraph")
                .with_inline(vec![InlineContent::styled("x", TextStyles::bold())]),
            para("b", "y").with_prop("textAlignment", json!("center")),
        ];
        let ops = diff_documents(&old, &new);
        assert_eq!(kinds(&ops), vec![OpKind::Update, OpKind::Update]);
    }

    #[test]
    fn type_change_is_update() {
        let old = vec![para("a", "Title")];
        let new = vec![Block::new("a", "heading")
            .with_prop("level", json!(2))
            .with_inline(vec![InlineContent::text("Title")])];

        let ops = diff_documents(&old, &new);
        assert_eq!(ops.len(), 1);
        let PatchOp::Update { block, .. } = &ops.as_slice()[0] else {
            panic!("expected Update");
        };
        assert_eq!(block.kind, "heading");
        assert_eq!(block.depth, Some(serde_json::Number::from(2)));
    }

    #[test]
    fn swap_emits_one_move() {
        let old = vec![para("A", "a"), para("B", "b"), para("C", "c")];
        let new = vec![para("B", "b"), para("A", "a"), para("C", "c")];

        let ops = diff_documents(&old, &new);
        assert_eq!(ops.len(), 1);
        match &ops.as_slice()[0] {
            PatchOp::Move {
                node_uid,
                new_parent_uid,
                after_id,
                before_id,
                order,
            } => {
                // The backtrack keeps A, so B is the mover.
                assert_eq!(node_uid, "B");
                assert_eq!(*new_parent_uid, None);
                assert_eq!(*after_id, None);
                assert_eq!(before_id.as_deref(), Some("A"));
                assert_eq!(*order, 0);
            }
            other => panic!("expected Move, got {:?}", other),
        }
    }

    #[test]
    fn cross_parent_move_without_update() {
        let old = vec![
            Block::new("p1", "bulletListItem").with_child(para("x", "leaf")),
            Block::new("p2", "bulletListItem").with_child(para("y", "other")),
        ];
        let new = vec![
            Block::new("p1", "bulletListItem"),
            Block::new("p2", "bulletListItem")
                .with_child(para("y", "other"))
                .with_child(para("x", "leaf")),
        ];

        let ops = diff_documents(&old, &new);
        assert_eq!(ops.len(), 1);
        match &ops.as_slice()[0] {
            PatchOp::Move {
                node_uid,
                new_parent_uid,
                after_id,
                before_id,
                order,
            } => {
                assert_eq!(node_uid, "x");
                assert_eq!(new_parent_uid.as_deref(), Some("p2"));
                assert_eq!(after_id.as_deref(), Some("y"));
                assert_eq!(*before_id, None);
                assert_eq!(*order, 1);
            }
            other => panic!("expected Move, got {:?}", other),
        }
    }

    #[test]
    fn moved_and_edited_block_gets_both_ops() {
        let old = vec![para("a", "1"), para("b", "2"), para("c", "3")];
        let new = vec![para("b", "2"), para("c", "3"), para("a", "1 edited")];

        let ops = diff_documents(&old, &new);
        assert_eq!(kinds(&ops), vec![OpKind::Move, OpKind::Update]);
        assert!(ops.iter().all(|op| op.node_id() == "a"));
    }

    #[test]
    fn table_cell_edit_is_single_update() {
        let table = |b2: &str| {
            Block::new("t", "table").with_table(TableContent::from_rows(vec![
                vec![vec![InlineContent::text("a1")], vec![InlineContent::text("b1")]],
                vec![vec![InlineContent::text("a2")], vec![InlineContent::text(b2)]],
            ]))
        };

        let ops = diff_documents(&[table("b2")], &[table("B2!")]);
        assert_eq!(ops.len(), 1);
        let PatchOp::Update { node_uid, block } = &ops.as_slice()[0] else {
            panic!("expected Update");
        };
        assert_eq!(node_uid, "t");
        let texts: Vec<&str> = block.runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a1", "b1", "a2", "B2!"]);
    }

    #[test]
    fn ops_are_ordered_by_kind() {
        let old = vec![para("a", "1"), para("b", "2"), para("c", "3"), para("gone", "x")];
        let new = vec![
            para("b", "2 edited"),
            para("a", "1"),
            para("c", "3"),
            para("fresh", "new"),
        ];

        let ops = diff_documents(&old, &new);
        assert_eq!(
            kinds(&ops),
            vec![OpKind::Insert, OpKind::Delete, OpKind::Move, OpKind::Update]
        );
        let mut sorted = kinds(&ops);
        sorted.sort();
        assert_eq!(sorted, kinds(&ops));
    }

    #[test]
    fn subtree_insert_emits_parent_before_children() {
        let old = vec![para("a", "1")];
        let new = vec![
            para("a", "1"),
            Block::new("n", "bulletListItem")
                .with_child(para("n1", "x"))
                .with_child(para("n2", "y")),
        ];

        let ops = diff_documents(&old, &new);
        let ids: Vec<&str> = ops.iter().map(PatchOp::node_id).collect();
        assert_eq!(ids, vec!["n", "n1", "n2"]);
        let PatchOp::Insert { after_id, .. } = &ops.as_slice()[2] else {
            panic!("expected Insert");
        };
        assert_eq!(after_id.as_deref(), Some("n1"));
    }

    #[test]
    fn deleted_subtree_emits_every_node() {
        let old = vec![Block::new("p", "bulletListItem").with_child(para("c", "x"))];
        let ops = diff_documents(&old, &[]);
        let ids: Vec<&str> = ops.iter().map(PatchOp::node_id).collect();
        assert_eq!(ids, vec!["p", "c"]);
        assert_eq!(ops.deletes(), 2);
    }

    #[test]
    fn sibling_shift_from_insert_is_not_a_move() {
        let old = vec![para("a", "1"), para("b", "2")];
        let new = vec![para("x", "0"), para("a", "1"), para("b", "2")];
        let ops = diff_documents(&old, &new);
        assert_eq!(kinds(&ops), vec![OpKind::Insert]);
    }

    #[test]
    fn stats_are_reported() {
        let old = vec![para("a", "1")];
        let new = vec![para("a", "2"), para("b", "3")];
        let (ops, stats) = DiffEngine::default().diff_with_stats(&old, &new);
        assert_eq!(ops.len(), 2);
        assert_eq!(stats.old_blocks, 1);
        assert_eq!(stats.new_blocks, 2);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.groups_examined, 1);
    }

    #[test]
    fn flat_snapshots_diff_directly() {
        let flat = |text: &str| {
            vec![FlatBlock {
                id: "a".into(),
                kind: "paragraph".into(),
                runs: vec![StyledRun::plain(text)],
                ..Default::default()
            }]
        };
        let ops = diff_snapshots(&flat("Hello"), &flat("Hello World"));
        assert_eq!(kinds(&ops), vec![OpKind::Update]);
    }
}
