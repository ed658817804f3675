//! Statistical primitives for loanscope.
//!
//! This crate provides the numeric building blocks used to compare a feature
//! across two outcome groups:
//!
//! - **Descriptive statistics**: min, quartiles, median, mean, variance
//! - **Quantiles**: linear-interpolated cut points for equal-depth binning
//! - **Histogram generation**: equal-width frequency distributions
//! - **Hypothesis tests**: Mann–Whitney U and chi-squared independence
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`quantile`]: Quantile computation and storage
//! - [`histogram`]: Histogram construction for visualizing data distributions
//! - [`hypothesis`]: Significance tests between two groups
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use loanscope_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing equal-depth cut points
//!
//! ```
//! use loanscope_stats::quantile::Quantiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let quantiles = Quantiles::evenly_spaced(&values, 2);
//! assert_eq!(quantiles.get(0.5), Some(3.0));
//! ```
//!
//! ## Comparing two groups
//!
//! ```
//! use loanscope_stats::hypothesis::mann_whitney_u;
//!
//! let result = mann_whitney_u(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
//! assert!(result.p_value > 0.05);
//! ```

pub mod descriptive;
pub mod histogram;
pub mod hypothesis;
pub mod quantile;
