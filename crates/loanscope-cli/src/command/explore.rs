//! Feature exploration command
//!
//! Compares the raw (or log) feature with the outcome, optionally buckets it
//! and plots whatever fits the column kind.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use loanscope_analysis::comparator::{AutoBuckets, AutoOptions, BucketRequest};

use crate::{
    command::FeatureArg,
    render,
    util::{self, Output},
};

#[derive(Debug, Clone, Args)]
pub(crate) struct ExploreArg {
    #[clap(flatten)]
    pub feature: FeatureArg,

    /// Compare ln(x + 1) instead of the raw feature
    #[arg(long)]
    pub log: bool,

    /// Bucket the feature into this many equal-depth quantiles
    #[arg(long, conflicts_with = "buckets")]
    pub quantiles: Option<usize>,

    /// Bucket the feature with a JSON bucket specification
    #[arg(long)]
    pub buckets: Option<PathBuf>,

    /// Bucket the feature and plot only the bucket column
    #[arg(long)]
    pub only_buckets: bool,

    /// Write the report as JSON to this path instead of printing tables
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ExploreArg) -> anyhow::Result<()> {
    let mut comparator = arg.feature.comparator()?;

    let request = match (arg.quantiles, &arg.buckets) {
        (Some(num), _) => Some(BucketRequest::Quantiles(num)),
        (None, Some(path)) => Some(BucketRequest::Spec(util::read_json_file(
            "bucket specification",
            path,
        )?)),
        (None, None) => None,
    };
    let buckets = match (request, arg.only_buckets) {
        (Some(request), true) => {
            comparator
                .set_buckets(request)
                .context("Failed to install buckets")?;
            AutoBuckets::Only
        }
        (None, true) => AutoBuckets::Only,
        (Some(BucketRequest::Quantiles(num)), false) => AutoBuckets::Quantiles(num),
        (Some(BucketRequest::Spec(spec)), false) => AutoBuckets::Spec(spec),
        (None, false) => AutoBuckets::Off,
    };

    let report = comparator
        .auto(AutoOptions {
            log: arg.log,
            buckets,
        })
        .with_context(|| format!("Failed to explore feature {}", arg.feature.feature))?;

    match &arg.output {
        Some(path) => {
            Output::save_json(&report, Some(path.clone()))?;
            eprintln!("Report saved to {}", path.display());
        }
        None => {
            let mut output = Output::stdout();
            render::write_report(&mut output, &report)?;
        }
    }
    Ok(())
}
