use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use loanscope_analysis::{
    bucket::BoundFormat,
    comparator::{
        ComparatorOptions, DEFAULT_HISTOGRAM_BINS, DEFAULT_OUTCOME_COLUMN, DeleteTarget,
        FeatureComparator,
    },
    dataset::Scalar,
};
use tracing::Level;

use self::{columns::ColumnsArg, compare::CompareArg, explore::ExploreArg};
use crate::util;

mod columns;
mod compare;
mod explore;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// More log output (`-v` debug, `-vv` trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    mode: Mode,
}

impl CommandArgs {
    fn log_level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (true, _) => Level::WARN,
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            (false, _) => Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Compare a feature with the outcome, optionally bucketed, and plot it
    Explore(#[clap(flatten)] ExploreArg),
    /// Run a single comparison on the raw, log or bucketed feature
    Compare(#[clap(flatten)] CompareArg),
    /// Export the dataset's column names, one per line
    Columns(#[clap(flatten)] ColumnsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logging(args.log_level())?;
    match &args.mode {
        Mode::Explore(arg) => explore::run(arg)?,
        Mode::Compare(arg) => compare::run(arg)?,
        Mode::Columns(arg) => columns::run(arg)?,
    }
    Ok(())
}

fn init_logging(level: Level) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to install log subscriber")
}

/// Dataset and feature selection shared by the comparison commands.
#[derive(Debug, Clone, Args)]
pub(crate) struct FeatureArg {
    /// Path to the CSV dataset
    pub data: PathBuf,

    /// Feature column to compare
    #[arg(long)]
    pub feature: String,

    /// Binary outcome column
    #[arg(long, default_value = DEFAULT_OUTCOME_COLUMN)]
    pub outcome: String,

    /// Treat the feature as categorical even if it holds floats
    #[arg(long)]
    pub categorical: bool,

    /// Print generated bucket bounds as integers instead of two decimals
    #[arg(long)]
    pub integer_bounds: bool,

    /// Drop rows whose feature equals this value (repeatable)
    #[arg(long = "drop-value", value_name = "VALUE")]
    pub drop_values: Vec<String>,

    /// Drop rows whose feature lies in the closed range LOWER,UPPER (repeatable)
    #[arg(long = "drop-range", value_name = "LOWER,UPPER", value_parser = parse_range)]
    pub drop_ranges: Vec<(f64, f64)>,

    /// Number of histogram bins
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,
}

impl FeatureArg {
    /// Loads the dataset, builds the comparator and applies the drop filters.
    pub fn comparator(&self) -> anyhow::Result<FeatureComparator> {
        let dataset = util::read_csv_file(&self.data)?;
        let options = ComparatorOptions {
            outcome: self.outcome.clone(),
            buckets: None,
            force_categorical: self.categorical,
            bound_format: if self.integer_bounds {
                BoundFormat::Integer
            } else {
                BoundFormat::Fixed2
            },
            histogram_bins: self.bins,
        };
        let mut comparator = FeatureComparator::new(&dataset, &self.feature, options)
            .with_context(|| format!("Failed to prepare feature {}", self.feature))?;

        let targets = self
            .drop_values
            .iter()
            .map(|value| {
                let Ok(value) = value.parse::<Scalar>();
                DeleteTarget::Value(value)
            })
            .chain(
                self.drop_ranges
                    .iter()
                    .map(|&(lower, upper)| DeleteTarget::Range(lower, upper)),
            )
            .collect::<Vec<_>>();
        if !targets.is_empty() {
            let removed = comparator.delete_values(&targets);
            eprintln!("Dropped {removed} rows by value filter");
        }
        Ok(comparator)
    }
}

fn parse_range(s: &str) -> Result<(f64, f64), String> {
    let (lower, upper) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LOWER,UPPER, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid bound '{v}': {e}"))
    };
    let (lower, upper) = (parse(lower)?, parse(upper)?);
    if lower > upper {
        return Err(format!("lower bound {lower} exceeds upper bound {upper}"));
    }
    Ok((lower, upper))
}
