//! Command-line interface
//!
//! `inspect` reports table quality, `holdout` evaluates one train/test
//! split, `crossval` evaluates k folds. Both evaluation commands print the
//! accuracy summary as a percentage; `--json` dumps the full report.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::{CsvLoader, QualityReport};
use crate::error::{FloranetError, Result};
use crate::evaluation::{
    evaluate_holdout, ConvergencePolicy, CrossValidationRunner, CvStrategy,
};
use crate::model::{MlpConfig, MlpTrainer};
use crate::preprocessing::Preprocessor;

#[derive(Parser)]
#[command(name = "floranet")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Feed-forward classification of tabular measurements")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct TableArgs {
    /// Input table (CSV or TSV)
    #[arg(short, long)]
    pub data: PathBuf,

    /// Label column name
    #[arg(short, long)]
    pub label: String,

    /// Feature columns (default: every numeric column except label and id)
    #[arg(short, long, num_args = 1..)]
    pub features: Vec<String>,

    /// Identifier column to exclude from the features
    #[arg(long, default_value = "Id")]
    pub id_column: String,
}

#[derive(clap::Args)]
pub struct NetArgs {
    /// Hidden layer widths
    #[arg(long, num_args = 1.., default_value = "16")]
    pub hidden: Vec<usize>,

    /// Learning rate
    #[arg(long, default_value = "0.05")]
    pub learning_rate: f64,

    /// Convergence threshold on the epoch loss delta
    #[arg(long, default_value = "1e-4")]
    pub threshold: f64,

    /// Maximum training steps per fold
    #[arg(long, default_value = "10000")]
    pub max_steps: usize,

    /// Seed for weight initialization and batch shuffling
    #[arg(long, default_value = "42")]
    pub net_seed: u64,
}

impl NetArgs {
    fn config(&self) -> MlpConfig {
        MlpConfig {
            hidden_layers: self.hidden.clone(),
            learning_rate: self.learning_rate,
            threshold: self.threshold,
            max_steps: self.max_steps,
            random_state: Some(self.net_seed),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report missing values and degenerate columns
    Inspect {
        /// Input table (CSV or TSV)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Evaluate one train/test split
    Holdout {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        net: NetArgs,

        /// Fraction of rows used for training
        #[arg(long, default_value = "0.75")]
        train_fraction: f64,

        /// Seed for the split
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate with k-fold cross-validation
    Crossval {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        net: NetArgs,

        /// Number of folds
        #[arg(short = 'k', long, default_value = "5")]
        folds: usize,

        /// Keep fold class proportions close to the label distribution
        #[arg(long)]
        stratified: bool,

        /// Seed for fold assignment
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Abort the run on a non-converging fold instead of skipping it
        #[arg(long)]
        abort_on_failure: bool,

        /// Train folds in parallel
        #[arg(long)]
        parallel: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn step_ok(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

/// Numeric columns of the frame minus the label and identifier columns
fn default_features(df: &DataFrame, label: &str, id_column: &str) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric())
        .map(|c| c.name().to_string())
        .filter(|name| name != label && name != id_column)
        .collect()
}

fn load_and_encode(args: &TableArgs) -> Result<crate::preprocessing::EncodedTable> {
    let df = CsvLoader::load_auto(&args.data)?;
    let report = QualityReport::scan(&df)?;
    report.log();
    if report.total_missing() > 0 {
        return Err(FloranetError::Data(format!(
            "{} missing values in {}; clean the table before evaluating",
            report.total_missing(),
            args.data.display()
        )));
    }

    let features = if args.features.is_empty() {
        default_features(&df, &args.label, &args.id_column)
    } else {
        args.features.clone()
    };
    if features.is_empty() {
        return Err(FloranetError::Data(
            "no numeric feature columns found".to_string(),
        ));
    }

    let table = Preprocessor::new(features, args.label.clone()).encode(&df)?;
    step_ok(&format!(
        "{} rows, {} features, {} classes",
        table.n_rows(),
        table.n_features(),
        table.n_classes()
    ));
    Ok(table)
}

pub fn cmd_inspect(data: &PathBuf) -> Result<()> {
    let df = CsvLoader::load_auto(data)?;
    let report = QualityReport::scan(&df)?;

    println!(
        "{} rows x {} columns, {} missing values",
        report.n_rows,
        report.n_columns,
        report.total_missing()
    );
    for col in &report.columns {
        println!(
            "  {:<24} nulls: {:<6} distinct: {}",
            col.name, col.null_count, col.distinct
        );
    }
    for warning in &report.warnings {
        println!("  {} {:?}", "warning:".yellow(), warning);
    }
    Ok(())
}

pub fn cmd_holdout(
    table_args: &TableArgs,
    net: &NetArgs,
    train_fraction: f64,
    seed: u64,
    json: bool,
) -> Result<()> {
    let table = load_and_encode(table_args)?;
    let trainer = MlpTrainer::new(net.config());

    let started = Instant::now();
    let report = evaluate_holdout(&trainer, &table, train_fraction, seed)?;
    step_ok(&format!("evaluated in {:.2?}", started.elapsed()));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary().bold());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_crossval(
    table_args: &TableArgs,
    net: &NetArgs,
    folds: usize,
    stratified: bool,
    seed: u64,
    abort_on_failure: bool,
    parallel: bool,
    json: bool,
) -> Result<()> {
    let table = load_and_encode(table_args)?;
    let trainer = MlpTrainer::new(net.config());

    let strategy = if stratified {
        CvStrategy::StratifiedKFold {
            n_splits: folds,
            shuffle: true,
        }
    } else {
        CvStrategy::KFold {
            n_splits: folds,
            shuffle: true,
        }
    };
    let policy = if abort_on_failure {
        ConvergencePolicy::Abort
    } else {
        ConvergencePolicy::SkipFold
    };

    let started = Instant::now();
    let report = CrossValidationRunner::new(&trainer)
        .with_strategy(strategy)
        .with_random_state(seed)
        .with_policy(policy)
        .with_parallel(parallel)
        .run(&table)?;
    step_ok(&format!("evaluated in {:.2?}", started.elapsed()));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for outcome in &report.outcomes {
            match outcome.accuracy {
                Some(acc) => println!(
                    "  fold {}: {:.2}% ({} train / {} eval)",
                    outcome.fold_idx,
                    acc * 100.0,
                    outcome.n_train,
                    outcome.n_eval
                ),
                None => println!("  fold {}: {}", outcome.fold_idx, "not completed".yellow()),
            }
        }
        println!("{}", report.summary().bold());
    }
    Ok(())
}
