//! Single comparison command
//!
//! Resolves a transform prefix (`""` raw, `"l"` log, `"b"` bucketed) and runs
//! the statistical comparison on that column.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use loanscope_analysis::{
    comparator::{BucketRequest, ComparisonResult, Transform},
    plot::PlotSpec,
};
use serde::Serialize;

use crate::{
    command::FeatureArg,
    render,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct CompareArg {
    #[clap(flatten)]
    pub feature: FeatureArg,

    /// Column to compare: omitted for the raw feature, `l` for ln(x + 1),
    /// `b` for the bucket column
    #[arg(long)]
    pub transform: Option<String>,

    /// Bucket into this many quantiles before a bucketed comparison
    #[arg(long, conflicts_with = "buckets")]
    pub quantiles: Option<usize>,

    /// Bucket with a JSON bucket specification before a bucketed comparison
    #[arg(long)]
    pub buckets: Option<PathBuf>,

    /// Include plot data for the compared column
    #[arg(long)]
    pub plots: bool,

    /// Write the result as JSON to this path instead of printing it
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CompareReport {
    feature: String,
    result: ComparisonResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    plots: Vec<PlotSpec>,
}

pub(crate) fn run(arg: &CompareArg) -> anyhow::Result<()> {
    let transform = arg
        .transform
        .as_deref()
        .unwrap_or_default()
        .parse::<Transform>()?;
    let mut comparator = arg.feature.comparator()?;

    let request = match (arg.quantiles, &arg.buckets) {
        (Some(num), _) => Some(BucketRequest::Quantiles(num)),
        (None, Some(path)) => Some(BucketRequest::Spec(util::read_json_file(
            "bucket specification",
            path,
        )?)),
        (None, None) => None,
    };
    if let Some(request) = request {
        comparator
            .set_buckets(request)
            .context("Failed to install buckets")?;
    }

    let result = comparator
        .stats(transform)
        .with_context(|| format!("Failed to compare {transform} feature"))?;
    let plots = if arg.plots {
        comparator.plots(transform)?
    } else {
        vec![]
    };
    let report = CompareReport {
        feature: comparator.feature().to_owned(),
        result,
        plots,
    };

    match &arg.output {
        Some(path) => {
            Output::save_json(&report, Some(path.clone()))?;
            eprintln!("Result saved to {}", path.display());
        }
        None => {
            let mut output = Output::stdout();
            render::write_comparison(&mut output, "Comparison", &report.result)?;
            render::write_plots(&mut output, &report.plots)?;
        }
    }
    Ok(())
}
