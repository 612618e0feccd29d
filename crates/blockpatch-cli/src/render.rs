//! Text rendering for terminal output.

use std::collections::HashMap;
use std::fmt::Write;

use blockpatch_diff::{DiffStats, FlatIndex};
use blockpatch_replay::InsertChain;
use blockpatch_types::{FlatBlock, PatchOp};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

const PREVIEW_CHARS: usize = 48;

/// One line per block, indented by nesting level.
pub fn flat_list(blocks: &[FlatBlock]) -> String {
    let mut levels: HashMap<&str, usize> = HashMap::with_capacity(blocks.len());
    let mut out = String::new();
    for block in blocks {
        let level = block
            .parent()
            .and_then(|p| levels.get(p))
            .map_or(0, |l| l + 1);
        levels.insert(block.id.as_str(), level);

        let _ = write!(
            out,
            "{}{} {}",
            "  ".repeat(level),
            block.id.yellow(),
            format!("({})", block.kind).dimmed()
        );
        let text = block.plain_text();
        if !text.is_empty() {
            let _ = write!(out, " {}", quoted(&text));
        }
        out.push('\n');
    }
    out
}

pub fn op_line(op: &PatchOp, old: &FlatIndex<'_>) -> String {
    match op {
        PatchOp::Insert {
            block,
            after_id,
            before_id,
        } => format!(
            "{} {} {} {} {}",
            "+ insert".green().bold(),
            block.id.yellow(),
            format!("({})", block.kind).dimmed(),
            anchors(block.parent(), after_id, before_id),
            quoted(&block.plain_text())
        ),
        PatchOp::Delete { node_uid } => {
            format!("{} {}", "- delete".red().bold(), node_uid.yellow())
        }
        PatchOp::Move {
            node_uid,
            new_parent_uid,
            after_id,
            before_id,
            order,
        } => format!(
            "{} {} {} {}",
            "> move  ".cyan().bold(),
            node_uid.yellow(),
            anchors(new_parent_uid.as_deref(), after_id, before_id),
            format!("(order {order})").dimmed()
        ),
        PatchOp::Update { node_uid, block } => {
            let new_text = block.plain_text();
            let detail = match old.get(node_uid) {
                Some(prev) if prev.kind != block.kind => format!(
                    "{} -> {}",
                    prev.kind.red(),
                    block.kind.green()
                ),
                Some(prev) => {
                    let old_text = prev.plain_text();
                    if old_text == new_text {
                        "(styles or props)".dimmed().to_string()
                    } else {
                        format!("\"{}\"", inline_diff(&old_text, &new_text))
                    }
                }
                None => quoted(&new_text),
            };
            format!(
                "{} {} {}",
                "~ update".yellow().bold(),
                node_uid.yellow(),
                detail
            )
        }
    }
}

pub fn chain_line(chain: &InsertChain) -> String {
    let ids: Vec<&str> = chain.blocks.iter().map(|b| b.id.as_str()).collect();
    let parent = (!chain.parent_id.is_empty()).then_some(chain.parent_id.as_str());
    format!(
        "{} [{}] {}",
        format!("+ chain x{}", chain.len()).green().bold(),
        ids.join(", ").yellow(),
        anchors(parent, &chain.after_id, &chain.before_id)
    )
}

pub fn stats_line(stats: &DiffStats) -> String {
    format!(
        "{} blocks -> {} blocks: {} inserts, {} deletes, {} moves, {} updates ({} groups, largest {})",
        stats.old_blocks,
        stats.new_blocks,
        stats.inserts.to_string().green(),
        stats.deletes.to_string().red(),
        stats.moves.to_string().cyan(),
        stats.updates.to_string().yellow(),
        stats.groups_examined,
        stats.largest_group
    )
}

/// Character-level diff with removed text in `[-..-]` and added text in
/// `{+..+}`.
pub fn inline_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_chars(old, new);
    let mut out = String::new();
    let mut pending: Option<(ChangeTag, String)> = None;

    for change in diff.iter_all_changes() {
        let tag = change.tag();
        match pending.as_mut() {
            Some((t, buf)) if *t == tag => buf.push_str(change.value()),
            _ => {
                if let Some((t, buf)) = pending.take() {
                    push_segment(&mut out, t, &buf);
                }
                pending = Some((tag, change.value().to_string()));
            }
        }
    }
    if let Some((t, buf)) = pending {
        push_segment(&mut out, t, &buf);
    }
    out
}

fn push_segment(out: &mut String, tag: ChangeTag, text: &str) {
    match tag {
        ChangeTag::Equal => out.push_str(text),
        ChangeTag::Delete => {
            let _ = write!(out, "{}", format!("[-{text}-]").red());
        }
        ChangeTag::Insert => {
            let _ = write!(out, "{}", format!("{{+{text}+}}").green());
        }
    }
}

fn anchors(parent: Option<&str>, after: &Option<String>, before: &Option<String>) -> String {
    format!(
        "under {} after {} before {}",
        parent.unwrap_or("<root>"),
        after.as_deref().unwrap_or("-"),
        before.as_deref().unwrap_or("-")
    )
}

fn quoted(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    format!("\"{preview}\"")
}
