//! Semtab CLI
//!
//! Command-line access to semtab datasets:
//! - Inspecting a dataset (directory or `.zip`)
//! - Converting between per-table and batched layouts, with compression
//! - Sampling table rows into a new dataset
//! - Exporting a semantic model as a simple-tree YAML
//! - Scoring predicted labels against true labels

use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use semtab_dataset::{
    sample_table_data, ser_simple_tree_yaml, Compression, Dataset, LoadOptions, SaveOptions,
};
use semtab_eval::{precision_recall_f1, TrueLabels};
use semtab_model::{Example, FullTable, KgNamespaceRegistry, Namespace};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "semtab")]
#[command(author, version, about = "Semtab: tables annotated with semantic models")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompressArg {
    Gz,
    Bz2,
    Lz4,
}

impl From<CompressArg> for Compression {
    fn from(arg: CompressArg) -> Self {
        match arg {
            CompressArg::Gz => Compression::Gz,
            CompressArg::Bz2 => Compression::Bz2,
            CompressArg::Lz4 => Compression::Lz4,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset and summarize its examples
    Inspect {
        /// Dataset directory or `.zip` archive
        dataset: PathBuf,
        /// Print one line per example
        #[arg(long)]
        list: bool,
    },

    /// Load a dataset and write it back in another layout
    Convert {
        /// Source dataset
        src: PathBuf,
        /// Destination directory
        dst: PathBuf,
        /// Save options as JSON; flags below override it
        #[arg(long)]
        options: Option<PathBuf>,
        /// Write batched `part-NNNN.zip` files
        #[arg(long)]
        batch: bool,
        /// Examples per batch
        #[arg(long)]
        batch_size: Option<usize>,
        /// Compress per-table files
        #[arg(long, value_enum)]
        compress: Option<CompressArg>,
        /// JSON indentation of per-table files (0 or 2)
        #[arg(long)]
        indent: Option<u8>,
        /// Keep existing files in the destination
        #[arg(long)]
        keep_previous: bool,
    },

    /// Keep at most N random rows per table
    Sample {
        src: PathBuf,
        dst: PathBuf,
        #[arg(long)]
        rows: usize,
        /// Seed for reproducible samples
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Write the first semantic model of a table as simple-tree YAML
    ExportTree {
        dataset: PathBuf,
        table_id: String,
        #[arg(short, long)]
        out: PathBuf,
        /// Extra prefix, as `prefix=namespace` (repeatable)
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },

    /// Precision/recall/F1 of predictions (JSON arrays of labels)
    Score {
        /// Array of null, a label, or an array of acceptable labels
        truth: PathBuf,
        /// Array of null or a label
        pred: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { dataset, list } => cmd_inspect(&dataset, list, cli.verbose > 0),
        Commands::Convert {
            src,
            dst,
            options,
            batch,
            batch_size,
            compress,
            indent,
            keep_previous,
        } => {
            let mut save = match options {
                Some(path) => read_json::<SaveOptions>(&path)?,
                None => SaveOptions::default(),
            };
            save.batch_compressed |= batch;
            if let Some(n) = batch_size {
                save.batch_size = n;
            }
            if let Some(codec) = compress {
                save.individual_table_compressed = Some(codec.into());
            }
            if let Some(indent) = indent {
                save.table_fmt_indent = indent;
            }
            if keep_previous {
                save.clean_previous_data = false;
            }
            cmd_convert(&src, &dst, &save)
        }
        Commands::Sample {
            src,
            dst,
            rows,
            seed,
        } => cmd_sample(&src, &dst, rows, seed),
        Commands::ExportTree {
            dataset,
            table_id,
            out,
            prefixes,
        } => cmd_export_tree(&dataset, &table_id, &out, &prefixes),
        Commands::Score { truth, pred } => cmd_score(&truth, &pred),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn load(path: &Path, verbose: bool) -> Result<Vec<Example<FullTable>>> {
    Dataset::new(path)
        .load(&LoadOptions { verbose })
        .with_context(|| format!("failed to load dataset {}", path.display()))
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_inspect(path: &Path, list: bool, verbose: bool) -> Result<()> {
    let examples = load(path, verbose)?;
    let n_models: usize = examples.iter().map(|e| e.sms.len()).sum();
    let n_rows: usize = examples.iter().map(|e| e.table.nrows()).sum();
    println!(
        "{} {} ({} examples, {} rows, {} semantic models)",
        "dataset".green().bold(),
        path.display(),
        examples.len(),
        n_rows,
        n_models
    );
    if list {
        for e in &examples {
            let (nrows, ncols) = e.table.shape();
            println!("  {}  {}x{}  models={}", e.id.bold(), nrows, ncols, e.sms.len());
        }
    }
    Ok(())
}

fn cmd_convert(src: &Path, dst: &Path, options: &SaveOptions) -> Result<()> {
    let examples = load(src, false)?;
    Dataset::new(dst)
        .save(&examples, options)
        .with_context(|| format!("failed to save dataset {}", dst.display()))?;
    eprintln!(
        "{} {} examples → {}",
        "wrote".green().bold(),
        examples.len(),
        dst.display().to_string().bold()
    );
    Ok(())
}

fn cmd_sample(src: &Path, dst: &Path, rows: usize, seed: Option<u64>) -> Result<()> {
    let examples = load(src, false)?;
    let sampled = sample_table_data(examples, rows, seed)?;
    Dataset::new(dst).save(&sampled, &SaveOptions::default())?;
    info!(rows, ?seed, "sampled dataset");
    eprintln!(
        "{} {} examples (≤ {} rows each) → {}",
        "wrote".green().bold(),
        sampled.len(),
        rows,
        dst.display().to_string().bold()
    );
    Ok(())
}

fn cmd_export_tree(dataset: &Path, table_id: &str, out: &Path, prefixes: &[String]) -> Result<()> {
    let examples = load(dataset, false)?;
    let example = examples
        .iter()
        .find(|e| e.id == table_id)
        .ok_or_else(|| anyhow!("no table `{table_id}` in {}", dataset.display()))?;
    let sm = example
        .sms
        .first()
        .ok_or_else(|| anyhow!("table `{table_id}` has no semantic model"))?;

    let mut ns = Namespace::from_prefix2ns(
        prefixes
            .iter()
            .map(|p| {
                p.split_once('=')
                    .ok_or_else(|| anyhow!("invalid --prefix `{p}`, expected prefix=namespace"))
            })
            .collect::<Result<Vec<_>>>()?,
    );
    ns.extend(&KgNamespaceRegistry::with_defaults().combined_namespace());

    let yaml = ser_simple_tree_yaml(&example.table.table, sm, &ns)?;
    fs::write(out, yaml).with_context(|| format!("failed to write {}", out.display()))?;
    eprintln!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
    Ok(())
}

fn parse_truth(value: Value) -> Result<TrueLabels> {
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(anyhow!("true labels must be a JSON array")),
    };
    let as_label = |v: &Value| -> Result<Option<String>> {
        match v {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            other => Err(anyhow!("invalid label {other}")),
        }
    };
    if !items.iter().any(Value::is_array) {
        return Ok(TrueLabels::Single(
            items.iter().map(as_label).collect::<Result<_>>()?,
        ));
    }
    let mut sets = Vec::with_capacity(items.len());
    for item in &items {
        let set: BTreeSet<String> = match item {
            Value::Array(labels) => labels
                .iter()
                .map(as_label)
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .flatten()
                .collect(),
            other => as_label(other)?.into_iter().collect(),
        };
        sets.push(set);
    }
    Ok(TrueLabels::Sets(sets))
}

fn cmd_score(truth: &Path, pred: &Path) -> Result<()> {
    let ytrue = parse_truth(read_json(truth)?)?;
    let ypreds: Vec<Option<String>> = read_json(pred)?;
    let r = precision_recall_f1(ytrue, &ypreds, None)?;
    println!(
        "{} precision={:.4} recall={:.4} f1={:.4}",
        "score".green().bold(),
        r.precision,
        r.recall,
        r.f1
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truth_with_sets() {
        let labels = parse_truth(json!([["A", "B"], "C", null])).unwrap();
        assert_eq!(
            labels,
            TrueLabels::Sets(vec![
                BTreeSet::from(["A".to_string(), "B".to_string()]),
                BTreeSet::from(["C".to_string()]),
                BTreeSet::new(),
            ])
        );
    }

    #[test]
    fn truth_with_single_labels() {
        let labels = parse_truth(json!(["A", null])).unwrap();
        assert_eq!(labels, TrueLabels::Single(vec![Some("A".into()), None]));
        assert!(parse_truth(json!({"a": 1})).is_err());
        assert!(parse_truth(json!([1])).is_err());
    }

    #[test]
    fn cli_parses_convert_flags() {
        let cli = Cli::try_parse_from([
            "semtab", "-vv", "convert", "in", "out", "--batch", "--batch-size", "10",
            "--compress", "lz4", "--keep-previous",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Convert {
                batch,
                batch_size,
                compress,
                keep_previous,
                ..
            } => {
                assert!(batch && keep_previous);
                assert_eq!(batch_size, Some(10));
                assert!(matches!(compress, Some(CompressArg::Lz4)));
            }
            _ => panic!("expected convert"),
        }
    }
}
