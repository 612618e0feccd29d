//! Flattening: block tree to pre-order list of flat blocks.

use blockpatch_types::{Block, FlatBlock};
use serde_json::Value;

use crate::config::DiffConfig;
use crate::extract::ExtractorRegistry;

/// Projects block trees to flat blocks.
///
/// The walk uses an explicit stack, so document depth is bounded by memory
/// rather than the call stack.
#[derive(Debug)]
pub struct Flattener<'a> {
    registry: &'a ExtractorRegistry,
    config: &'a DiffConfig,
}

impl<'a> Flattener<'a> {
    pub fn new(registry: &'a ExtractorRegistry, config: &'a DiffConfig) -> Self {
        Self { registry, config }
    }

    /// Flatten `blocks` in document (pre-order) order.
    ///
    /// Each block's `order` is its index among its immediate siblings and
    /// its `parent_id` is the enclosing block's id, or empty at the top.
    pub fn flatten(&self, blocks: &[Block]) -> Vec<FlatBlock> {
        let mut out = Vec::new();
        let mut stack: Vec<(&Block, &str, usize)> = blocks
            .iter()
            .enumerate()
            .rev()
            .map(|(order, block)| (block, "", order))
            .collect();

        while let Some((block, parent_id, order)) = stack.pop() {
            out.push(self.flat_block(block, parent_id, order));
            stack.extend(
                block
                    .children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(order, child)| (child, block.id.as_str(), order)),
            );
        }

        out
    }

    fn flat_block(&self, block: &Block, parent_id: &str, order: usize) -> FlatBlock {
        let depth = if self.config.is_heading(&block.kind) {
            match block.props.get(&self.config.depth_prop) {
                Some(Value::Number(level)) => Some(level.clone()),
                _ => None,
            }
        } else {
            None
        };

        FlatBlock {
            id: block.id.clone(),
            kind: block.kind.clone(),
            props: block.props.clone(),
            parent_id: parent_id.to_string(),
            order,
            runs: self.registry.extract(block),
            depth,
        }
    }
}

/// Flatten a document with the default configuration.
pub fn flatten_document(blocks: &[Block]) -> Vec<FlatBlock> {
    let config = DiffConfig::default();
    let registry = ExtractorRegistry::from_config(&config);
    Flattener::new(&registry, &config).flatten(blocks)
}
