//! Feature exploration against a binary outcome
//!
//! This crate answers one question for one column of a loan dataset: does the
//! feature behave differently for the two outcome groups?
//!
//! # Overview
//!
//! 1. **Load Data** ([`dataset::Dataset`]): Named, typed columns with missing cells
//! 2. **Build a Comparator** ([`comparator::FeatureComparator`]): Extract the
//!    feature and the outcome, drop rows whose feature is missing
//! 3. **Derive Columns**: Bucket the feature ([`bucket::BucketSpec`],
//!    [`bucket::Buckets`]) or take `ln(x + 1)` of it
//! 4. **Compare**: Mann–Whitney U for numeric columns, chi-squared for
//!    categorical and bucketed ones
//! 5. **Plot** ([`plot::PlotSpec`]): Histogram and box plots, or count and
//!    rate plots with categories in natural order ([`natsort`])
//!
//! # Examples
//!
//! ```
//! use loanscope_analysis::{
//!     comparator::{AutoBuckets, AutoOptions, ComparatorOptions, FeatureComparator},
//!     dataset::{Column, Dataset},
//! };
//!
//! let dataset = Dataset::new(vec![
//!     Column::float("income", (1..=20).map(|v| Some(f64::from(v) * 1000.0)).collect()),
//!     Column::int("TARGET", (1..=20).map(|v| Some(i64::from(v > 12))).collect()),
//! ])
//! .unwrap();
//!
//! let mut comparator =
//!     FeatureComparator::new(&dataset, "income", ComparatorOptions::default()).unwrap();
//! let report = comparator
//!     .auto(AutoOptions {
//!         log: true,
//!         buckets: AutoBuckets::Quantiles(4),
//!     })
//!     .unwrap();
//!
//! assert!(report.stats.p_value < 0.05);
//! assert_eq!(report.plots.len(), 4);
//! ```

pub mod bucket;
pub mod comparator;
pub mod dataset;
pub mod error;
pub mod natsort;
pub mod plot;
