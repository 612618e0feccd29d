use std::fs;
use std::path::Path;

use anyhow::Context;
use blockpatch_diff::{DiffConfig, DiffEngine, FlatIndex};
use blockpatch_replay::{coalesce_inserts, PatchReplayer};
use blockpatch_types::{blocks_from_json, ops_from_json, Block, PatchSet};
use colored::Colorize;
use serde_json::json;

use crate::cli::*;
use crate::render;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let engine = load_engine(cli.config.as_deref())?;
    match cli.command {
        Command::Flatten(args) => cmd_flatten(&engine, args, cli.format),
        Command::Diff(args) => cmd_diff(&engine, args, cli.format),
        Command::Apply(args) => cmd_apply(&engine, args, cli.format),
    }
}

fn load_engine(config: Option<&Path>) -> anyhow::Result<DiffEngine> {
    let config = match config {
        Some(path) => DiffConfig::load(path)?,
        None => DiffConfig::default(),
    };
    tracing::debug!(?config, "diff engine configured");
    Ok(DiffEngine::new(config))
}

fn read_document(path: &Path) -> anyhow::Result<Vec<Block>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    blocks_from_json(&text).with_context(|| format!("decoding {}", path.display()))
}

fn read_ops(path: &Path) -> anyhow::Result<PatchSet> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    ops_from_json(&text).with_context(|| format!("decoding {}", path.display()))
}

fn cmd_flatten(engine: &DiffEngine, args: FlattenArgs, format: OutputFormat) -> anyhow::Result<()> {
    let flat = engine.flatten(&read_document(&args.document)?);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&flat)?),
        OutputFormat::Text => print!("{}", render::flat_list(&flat)),
    }
    Ok(())
}

fn cmd_diff(engine: &DiffEngine, args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let old_flat = engine.flatten(&read_document(&args.old)?);
    let new_flat = engine.flatten(&read_document(&args.new)?);
    let (ops, stats) = engine.diff_flat_with_stats(&old_flat, &new_flat);

    if args.chains {
        let chains = coalesce_inserts(ops.as_slice());
        match format {
            OutputFormat::Json => {
                let value: Vec<_> = chains
                    .iter()
                    .map(|c| {
                        json!({
                            "parentId": c.parent_id,
                            "afterId": c.after_id,
                            "beforeId": c.before_id,
                            "blocks": c.blocks,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Text => {
                for chain in &chains {
                    println!("{}", render::chain_line(chain));
                }
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Json if args.stats => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "ops": ops, "stats": stats }))?
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ops)?),
        OutputFormat::Text => {
            if ops.is_empty() {
                println!("No changes.");
            } else {
                let old_index = FlatIndex::new(&old_flat);
                for op in &ops {
                    println!("{}", render::op_line(op, &old_index));
                }
            }
            if args.stats {
                println!("{}", render::stats_line(&stats));
            }
        }
    }
    Ok(())
}

fn cmd_apply(engine: &DiffEngine, args: ApplyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let base = engine.flatten(&read_document(&args.document)?);
    let ops = read_ops(&args.ops)?;
    let mut replayer = PatchReplayer::new(&base);
    replayer
        .apply(ops.as_slice())
        .with_context(|| format!("applying {}", args.ops.display()))?;
    let result = replayer.snapshot();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            if replayer.is_empty() {
                println!("Document is empty.");
            } else {
                print!("{}", render::flat_list(&result));
            }
            println!(
                "{} Applied {} ops: {} -> {} blocks.",
                "✓".green().bold(),
                ops.len(),
                base.len(),
                replayer.len()
            );
        }
    }
    Ok(())
}
