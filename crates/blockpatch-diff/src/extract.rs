//! Run extraction: block content to a flat list of styled runs.
//!
//! Which strategy applies to a block is decided by its kind through an
//! [`ExtractorRegistry`], so container-shaped kinds can be added without
//! touching the flatten loop.

use std::collections::HashMap;

use blockpatch_types::{Block, BlockContent, InlineContent, StyledRun, TableContent};
use tracing::trace;

use crate::config::DiffConfig;

/// A strategy for turning a block's content into styled runs.
pub trait ContentExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract runs from the block's content (`None` when absent).
    fn extract(&self, content: Option<&BlockContent>) -> Vec<StyledRun>;
}

/// Extracts runs from an inline sequence.
///
/// Only text items are kept. Links, mentions, and other inline kinds are
/// dropped; supporting one means adding a match arm in [`extract_inline`].
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExtractor;

impl ContentExtractor for InlineExtractor {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn extract(&self, content: Option<&BlockContent>) -> Vec<StyledRun> {
        match content {
            Some(BlockContent::Inline(items)) => extract_inline(items),
            Some(BlockContent::Table(_)) => {
                trace!("inline extractor given table content");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

/// Extracts runs from every cell of a table, row-major, as one stream.
///
/// Cell boundaries are not preserved.
#[derive(Clone, Copy, Debug, Default)]
pub struct TableExtractor;

impl ContentExtractor for TableExtractor {
    fn name(&self) -> &'static str {
        "table"
    }

    fn extract(&self, content: Option<&BlockContent>) -> Vec<StyledRun> {
        match content {
            Some(BlockContent::Table(table)) => extract_table(table),
            Some(BlockContent::Inline(_)) => {
                trace!("table extractor given inline content");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

/// Styled runs of the text items in an inline sequence.
pub fn extract_inline(items: &[InlineContent]) -> Vec<StyledRun> {
    items
        .iter()
        .filter_map(|item| match item {
            InlineContent::Text(t) => Some(StyledRun::styled(t.text.clone(), t.styles.clone())),
            InlineContent::Unsupported => None,
        })
        .collect()
}

/// Styled runs of every cell, rows in order, then cells in order.
pub fn extract_table(table: &TableContent) -> Vec<StyledRun> {
    table
        .rows
        .iter()
        .flat_map(|row| row.cells.iter())
        .flat_map(|cell| extract_inline(cell.content()))
        .collect()
}

/// Extract runs by the content's own shape, regardless of block kind.
pub fn extract_runs(content: Option<&BlockContent>) -> Vec<StyledRun> {
    match content {
        Some(BlockContent::Inline(items)) => extract_inline(items),
        Some(BlockContent::Table(table)) => extract_table(table),
        None => Vec::new(),
    }
}

/// Maps block kinds to extraction strategies.
///
/// Kinds without a registered strategy use the fallback (inline).
pub struct ExtractorRegistry {
    by_kind: HashMap<String, Box<dyn ContentExtractor>>,
    fallback: Box<dyn ContentExtractor>,
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<(&str, &str)> = self
            .by_kind
            .iter()
            .map(|(k, e)| (k.as_str(), e.name()))
            .collect();
        kinds.sort_unstable();
        f.debug_struct("ExtractorRegistry")
            .field("by_kind", &kinds)
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl ExtractorRegistry {
    /// A registry with no kind-specific strategies.
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
            fallback: Box::new(InlineExtractor),
        }
    }

    /// A registry routing the configured table kinds to [`TableExtractor`].
    pub fn from_config(config: &DiffConfig) -> Self {
        let mut registry = Self::new();
        for kind in &config.table_kinds {
            registry.register(kind.clone(), Box::new(TableExtractor));
        }
        registry
    }

    /// Route `kind` to `extractor`, replacing any previous strategy.
    pub fn register(&mut self, kind: impl Into<String>, extractor: Box<dyn ContentExtractor>) {
        self.by_kind.insert(kind.into(), extractor);
    }

    /// The strategy used for `kind`.
    pub fn for_kind(&self, kind: &str) -> &dyn ContentExtractor {
        self.by_kind
            .get(kind)
            .map(|e| e.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Extract the runs of a block using its kind's strategy.
    pub fn extract(&self, block: &Block) -> Vec<StyledRun> {
        self.for_kind(&block.kind).extract(block.content.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpatch_types::TextStyles;

    fn table() -> TableContent {
        TableContent::from_rows(vec![
            vec![
                vec![InlineContent::text("a1")],
                vec![InlineContent::text("b1"), InlineContent::text("!")],
            ],
            vec![vec![], vec![InlineContent::styled("b2", TextStyles::bold())]],
        ])
    }

    #[test]
    fn inline_keeps_text_with_styles() {
        let runs = extract_inline(&[
            InlineContent::text("plain "),
            InlineContent::styled("bold", TextStyles::bold()),
        ]);
        assert_eq!(
            runs,
            vec![
                StyledRun::plain("plain "),
                StyledRun::styled("bold", TextStyles::bold())
            ]
        );
    }

    #[test]
    fn inline_drops_unsupported_kinds() {
        let runs = extract_inline(&[
            InlineContent::Unsupported,
            InlineContent::text("kept"),
            InlineContent::Unsupported,
        ]);
        assert_eq!(runs, vec![StyledRun::plain("kept")]);
    }

    #[test]
    fn table_is_row_major() {
        let texts: Vec<String> = extract_table(&table()).into_iter().map(|r| r.text).collect();
        assert_eq!(texts, vec!["a1", "b1", "!", "b2"]);
    }

    #[test]
    fn empty_content_yields_nothing() {
        assert!(extract_runs(None).is_empty());
        assert!(extract_table(&TableContent::default()).is_empty());
        assert!(InlineExtractor.extract(None).is_empty());
        assert!(TableExtractor.extract(None).is_empty());
    }

    #[test]
    fn strategies_ignore_mismatched_shapes() {
        let inline = BlockContent::Inline(vec![InlineContent::text("x")]);
        let tabular = BlockContent::Table(table());
        assert!(TableExtractor.extract(Some(&inline)).is_empty());
        assert!(InlineExtractor.extract(Some(&tabular)).is_empty());
        assert_eq!(extract_runs(Some(&tabular)).len(), 4);
    }

    #[test]
    fn registry_dispatches_by_kind() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.for_kind("table").name(), "table");
        assert_eq!(registry.for_kind("paragraph").name(), "inline");

        let block = Block::new("t", "table").with_table(table());
        assert_eq!(registry.extract(&block).len(), 4);
    }

    #[test]
    fn registry_accepts_new_container_kinds() {
        struct Upper;
        impl ContentExtractor for Upper {
            fn name(&self) -> &'static str {
                "upper"
            }
            fn extract(&self, content: Option<&BlockContent>) -> Vec<StyledRun> {
                extract_runs(content)
                    .into_iter()
                    .map(|r| StyledRun::styled(r.text.to_uppercase(), r.styles))
                    .collect()
            }
        }

        let mut registry = ExtractorRegistry::new();
        registry.register("shout", Box::new(Upper));
        let block = Block::new("s", "shout").with_inline(vec![InlineContent::text("hi")]);
        assert_eq!(registry.extract(&block), vec![StyledRun::plain("HI")]);
        assert!(format!("{registry:?}").contains("shout"));
    }
}
