//! Flat blocks: tree nodes projected to parent id + sibling order.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::block::Props;
use crate::run::{plain_text, StyledRun};

/// A single tree node as a parent-pointer record.
///
/// `order` is the 0-based position among siblings with the same `parent_id`
/// in the snapshot the block was flattened from. It is recomputed on every
/// flatten and means nothing across snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub props: Props,
    /// Id of the enclosing block; empty for top-level blocks.
    #[serde(rename = "parentId", default)]
    pub parent_id: String,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub runs: Vec<StyledRun>,
    /// Heading level, set only for heading kinds with a numeric level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<Number>,
}

/// The block body embedded in `insert` and `update` operations.
///
/// It carries every field of the flat block it was built from.
pub type BlockPayload = FlatBlock;

impl FlatBlock {
    /// Returns `true` if this block sits at the top level of the document.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_empty()
    }

    /// The parent id as an optional reference (`None` at the top level).
    pub fn parent(&self) -> Option<&str> {
        if self.is_top_level() {
            None
        } else {
            Some(&self.parent_id)
        }
    }

    /// The wire payload for this block.
    pub fn payload(&self) -> BlockPayload {
        self.clone()
    }

    /// All run text concatenated.
    pub fn plain_text(&self) -> String {
        plain_text(&self.runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_field_names() {
        let block = FlatBlock {
            id: "a".into(),
            kind: "heading".into(),
            props: [("level".to_string(), json!(1))].into_iter().collect(),
            parent_id: String::new(),
            order: 0,
            runs: vec![StyledRun::plain("Title")],
            depth: Some(Number::from(1)),
        };

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "a",
                "type": "heading",
                "props": {"level": 1},
                "parentId": "",
                "order": 0,
                "runs": [{"type": "text", "text": "Title", "styles": {}}],
                "depth": 1
            })
        );
    }

    #[test]
    fn depth_is_omitted_when_absent() {
        let block = FlatBlock {
            id: "p".into(),
            kind: "paragraph".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&block).unwrap();
        assert!(value.get("depth").is_none());
        assert!(block.is_top_level());
        assert_eq!(block.parent(), None);
    }
}
