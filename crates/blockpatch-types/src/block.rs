//! The editor's block tree.
//!
//! Blocks are decoded leniently: missing `props`, `content`, or `children`
//! (or explicit `null`s) become empty values, and inline items that are not
//! well-formed text decode to [`InlineContent::Unsupported`] instead of
//! failing the whole document. Nesting depth is bounded only by memory.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::run::TextStyles;

/// Arbitrary per-block properties (`level`, `textAlignment`, ...).
pub type Props = BTreeMap<String, Value>;

/// A node of the editor's document tree.
///
/// A block exclusively owns its children, so the tree is acyclic by
/// construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub props: Props,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BlockContent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub children: Vec<Block>,
}

impl Block {
    /// Create a block with no props, content, or children.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Builder: set a property.
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Builder: set inline content.
    pub fn with_inline(mut self, items: Vec<InlineContent>) -> Self {
        self.content = Some(BlockContent::Inline(items));
        self
    }

    /// Builder: set table content.
    pub fn with_table(mut self, table: TableContent) -> Self {
        self.content = Some(BlockContent::Table(table));
        self
    }

    /// Builder: append a child block.
    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }
}

/// A block's content: either an inline sequence or a table of cells.
///
/// An array decodes as inline content and an object as a table. Any other
/// shape, or a table object that does not decode, yields empty content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BlockContent {
    Inline(Vec<InlineContent>),
    Table(TableContent),
}

impl<'de> Deserialize<'de> for BlockContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => {
                BlockContent::Inline(items.into_iter().map(InlineContent::from_value).collect())
            }
            value @ Value::Object(_) => {
                BlockContent::Table(serde_json::from_value(value).unwrap_or_default())
            }
            _ => BlockContent::Inline(Vec::new()),
        })
    }
}

/// One inline item within a block or table cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineContent {
    Text(StyledText),
    /// Any inline kind without a dedicated variant (links, mentions, ...),
    /// and items missing a `type`.
    Unsupported,
}

impl<'de> Deserialize<'de> for InlineContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(InlineContent::from_value)
    }
}

impl InlineContent {
    /// Decode one inline item, never failing.
    ///
    /// Only items tagged `"type": "text"` carry text. A non-string `text`
    /// reads as empty and mistyped style values are kept as extra styles.
    pub fn from_value(value: Value) -> Self {
        if value.get("type").and_then(Value::as_str) != Some("text") {
            return Self::Unsupported;
        }
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let styles = value
            .get("styles")
            .map(TextStyles::from_value_lossy)
            .unwrap_or_default();
        Self::Text(StyledText { text, styles })
    }

    /// Shorthand for an unstyled text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(StyledText {
            text: text.into(),
            styles: TextStyles::default(),
        })
    }

    /// Shorthand for a styled text item.
    pub fn styled(text: impl Into<String>, styles: TextStyles) -> Self {
        Self::Text(StyledText {
            text: text.into(),
            styles,
        })
    }
}

/// The payload of a text inline item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledText {
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub styles: TextStyles,
}

/// Table-shaped content: rows of cells, each cell holding inline items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<TableRow>,
}

impl TableContent {
    /// Build a table from rows of cell inline sequences.
    pub fn from_rows(rows: Vec<Vec<Vec<InlineContent>>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells.into_iter().map(TableCell::Bare).collect(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cells: Vec<TableCell>,
}

/// A table cell, either a bare inline sequence or a cell object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TableCell {
    Bare(Vec<InlineContent>),
    Full(CellContent),
}

impl<'de> Deserialize<'de> for TableCell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => {
                TableCell::Bare(items.into_iter().map(InlineContent::from_value).collect())
            }
            Value::Object(mut cell) => {
                let content = match cell.remove("content") {
                    Some(Value::Array(items)) => {
                        items.into_iter().map(InlineContent::from_value).collect()
                    }
                    _ => Vec::new(),
                };
                let props = match cell.remove("props") {
                    Some(Value::Object(props)) => props.into_iter().collect(),
                    _ => Props::new(),
                };
                TableCell::Full(CellContent { content, props })
            }
            _ => TableCell::Bare(Vec::new()),
        })
    }
}

impl TableCell {
    /// The inline items held by this cell.
    pub fn content(&self) -> &[InlineContent] {
        match self {
            TableCell::Bare(items) => items,
            TableCell::Full(cell) => &cell.content,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellContent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<InlineContent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub props: Props,
}

/// Decode a document (a JSON array of top-level blocks).
///
/// Nesting depth is not limited by the parser; the stack grows on demand.
pub fn blocks_from_json(json: &str) -> Result<Vec<Block>, TypeError> {
    let invalid = |e: serde_json::Error| TypeError::InvalidDocument(e.to_string());
    let mut de = serde_json::Deserializer::from_str(json);
    de.disable_recursion_limit();
    let blocks = Vec::<Block>::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(invalid)?;
    de.end().map_err(invalid)?;
    Ok(blocks)
}

/// Decode a document from an already parsed JSON value.
pub fn blocks_from_value(value: Value) -> Result<Vec<Block>, TypeError> {
    serde_json::from_value(value).map_err(|e| TypeError::InvalidDocument(e.to_string()))
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
