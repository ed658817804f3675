//! Feature bucketizer and comparator
//!
//! [`FeatureComparator`] extracts one feature and a binary outcome from a
//! [`Dataset`], drops rows whose feature is missing, and compares the feature
//! across the two outcome groups.
//!
//! # Derived columns
//!
//! Two derived columns are computed on demand and cached next to the subset:
//!
//! - the bucket column (`<feature>_bucket`), the label of the bucket each row
//!   falls into, recomputed only when forced or when new buckets are installed
//! - the log column (`<feature>_log`), `ln(x + 1)` of the raw feature
//!
//! A [`Transform`] selects which column an operation works on. Its prefix
//! form is `""` for the raw feature, `"l"` for the log column and `"b"` for
//! the bucket column.
//!
//! # Comparison
//!
//! Numeric columns are compared with a Mann–Whitney U test and the difference
//! of the group medians; categorical and bucketed columns with a chi-squared
//! test on the outcome × category contingency table.
//!
//! # Examples
//!
//! ```
//! use loanscope_analysis::{
//!     comparator::{ComparatorOptions, FeatureComparator, Transform},
//!     dataset::{Column, Dataset},
//! };
//!
//! let dataset = Dataset::new(vec![
//!     Column::float("dti", vec![Some(1.0), Some(2.0), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)]),
//!     Column::int("TARGET", vec![Some(0), Some(0), Some(1), Some(0), Some(1), Some(1), Some(1)]),
//! ])
//! .unwrap();
//!
//! let mut comparator = FeatureComparator::new(&dataset, "dti", ComparatorOptions::default()).unwrap();
//! assert_eq!(comparator.missing().dropped, 1);
//!
//! let result = comparator.stats(Transform::Raw).unwrap();
//! assert_eq!(result.median_difference, Some(-3.0));
//! ```

use std::{borrow::Cow, collections::BTreeMap, fmt, str::FromStr};

use loanscope_stats::{
    descriptive::{self, DescriptiveStats},
    histogram::Histogram,
    hypothesis,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    bucket::{BoundFormat, BucketSpec, Buckets, Domain},
    dataset::{ColumnType, Dataset, Scalar},
    error::AnalysisError,
    natsort,
    plot::{CategoryCounts, CategoryRate, GroupSummary, PlotSpec},
};

/// Outcome column used when none is given.
pub const DEFAULT_OUTCOME_COLUMN: &str = "TARGET";
/// Quantile count used when bucketing is needed but no buckets were given.
pub const DEFAULT_QUANTILES: usize = 10;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

const BUCKET_COLUMN_SUFFIX: &str = "_bucket";
const LOG_COLUMN_SUFFIX: &str = "_log";

/// How the feature's values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

/// Buckets to install on a comparator.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketRequest {
    /// Equal-depth buckets at this many quantiles.
    Quantiles(usize),
    Spec(BucketSpec),
}

#[derive(Debug, Clone)]
pub struct ComparatorOptions {
    /// Name of the binary outcome column.
    pub outcome: String,
    pub buckets: Option<BucketRequest>,
    /// Treat the feature as categorical even if it is stored as floats.
    pub force_categorical: bool,
    /// Formatting of generated bucket labels.
    pub bound_format: BoundFormat,
    pub histogram_bins: usize,
}

impl Default for ComparatorOptions {
    fn default() -> Self {
        Self {
            outcome: DEFAULT_OUTCOME_COLUMN.to_owned(),
            buckets: None,
            force_categorical: false,
            bound_format: BoundFormat::default(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

/// Rows dropped because the feature was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissingReport {
    pub dropped: usize,
    /// Row count of the source dataset.
    pub total: usize,
}

impl MissingReport {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.dropped as f64 / self.total as f64
        }
    }
}

/// Column selection for statistics and plots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transform {
    /// The raw feature.
    #[default]
    Raw,
    /// `ln(x + 1)` of the raw feature.
    Log,
    /// The bucket column.
    Bucketed,
}

impl Transform {
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Transform::Raw => "",
            Transform::Log => "l",
            Transform::Bucketed => "b",
        }
    }
}

impl FromStr for Transform {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Transform::Raw),
            "l" => Ok(Transform::Log),
            "b" => Ok(Transform::Bucketed),
            _ => Err(AnalysisError::UnknownTransform {
                prefix: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transform::Raw => "raw",
            Transform::Log => "log",
            Transform::Bucketed => "bucketed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonTest {
    MannWhitneyU,
    ChiSquared,
}

/// Outcome of comparing a column across the two outcome groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    /// Name of the compared column (raw or derived).
    pub column: String,
    pub test: ComparisonTest,
    pub statistic: f64,
    pub p_value: f64,
    /// `median(group 0) - median(group 1)`, numeric comparisons only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_difference: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dof: Option<usize>,
}

/// Rows to remove with [`FeatureComparator::delete_values`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    /// Rows whose feature equals this value.
    Value(Scalar),
    /// Rows whose feature lies in this closed range.
    Range(f64, f64),
}

impl DeleteTarget {
    fn matches(&self, value: &Scalar) -> bool {
        match self {
            DeleteTarget::Value(target) => target == value,
            DeleteTarget::Range(lower, upper) => value
                .as_f64()
                .is_some_and(|v| *lower <= v && v <= *upper),
        }
    }
}

/// Bucketing step of [`FeatureComparator::auto`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AutoBuckets {
    /// No bucketing.
    #[default]
    Off,
    Quantiles(usize),
    Spec(BucketSpec),
    /// Bucket with the installed (or default) buckets and skip raw-feature plots.
    Only,
}

#[derive(Debug, Clone, Default)]
pub struct AutoOptions {
    /// Compare `ln(x + 1)` instead of the raw feature.
    pub log: bool,
    pub buckets: AutoBuckets,
}

/// Everything [`FeatureComparator::auto`] produced.
#[derive(Debug, Clone, Serialize)]
pub struct AutoReport {
    pub feature: String,
    pub kind: FeatureKind,
    pub rows: usize,
    pub missing: MissingReport,
    pub outcomes: [Scalar; 2],
    pub stats: ComparisonResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_stats: Option<ComparisonResult>,
    pub plots: Vec<PlotSpec>,
}

enum ColumnView<'a> {
    Numeric {
        name: String,
        values: Cow<'a, [f64]>,
    },
    Labels {
        name: String,
        labels: Vec<Option<Cow<'a, str>>>,
    },
}

/// Feature subset with cached derived columns.
///
/// The comparator copies the feature and outcome columns out of the dataset
/// it is built from and never touches the dataset again.
#[derive(Debug, Clone)]
pub struct FeatureComparator {
    feature: String,
    outcome: String,
    kind: FeatureKind,
    format: BoundFormat,
    histogram_bins: usize,
    missing: MissingReport,
    values: Vec<Scalar>,
    outcomes: Vec<Scalar>,
    /// Outcome values in first-encountered order; group 0 and group 1.
    groups: [Scalar; 2],
    buckets: Option<Buckets>,
    bucket_labels: Option<Vec<Option<String>>>,
    log_values: Option<Vec<f64>>,
}

impl FeatureComparator {
    /// Builds the subset for `feature` and installs the requested buckets.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MissingColumn`] if either column does not exist
    /// - [`AnalysisError::InvalidData`] unless the outcome column holds exactly
    ///   two distinct values on the rows kept
    /// - bucket errors from [`FeatureComparator::set_buckets`]
    pub fn new(
        dataset: &Dataset,
        feature: &str,
        options: ComparatorOptions,
    ) -> Result<Self, AnalysisError> {
        let feature_column = dataset.column(feature)?;
        let outcome_column = dataset.column(&options.outcome)?;

        let total = feature_column.len();
        let (values, outcomes): (Vec<Scalar>, Vec<Option<Scalar>>) = feature_column
            .cells()
            .iter()
            .zip(outcome_column.cells())
            .filter_map(|(value, outcome)| value.clone().map(|v| (v, outcome.clone())))
            .unzip();
        let missing = MissingReport {
            dropped: total - values.len(),
            total,
        };
        info!(
            "{feature}: dropped {} of {} rows with a missing value ({:.2}%)",
            missing.dropped,
            missing.total,
            missing.percent()
        );

        let mut distinct: Vec<Option<&Scalar>> = vec![];
        for outcome in &outcomes {
            if !distinct.contains(&outcome.as_ref()) {
                distinct.push(outcome.as_ref());
            }
        }
        let groups = match distinct.as_slice() {
            [Some(first), Some(second)] => [(*first).clone(), (*second).clone()],
            _ => {
                return Err(AnalysisError::InvalidData {
                    column: options.outcome,
                    found: distinct.len(),
                });
            }
        };
        let outcomes = outcomes.into_iter().flatten().collect();

        let kind = if feature_column.column_type() == ColumnType::Float && !options.force_categorical
        {
            FeatureKind::Numeric
        } else {
            FeatureKind::Categorical
        };
        debug!("{feature}: treated as {kind:?}, outcome groups {groups:?}");

        let mut comparator = Self {
            feature: feature.to_owned(),
            outcome: options.outcome,
            kind,
            format: options.bound_format,
            histogram_bins: options.histogram_bins,
            missing,
            values,
            outcomes,
            groups,
            buckets: None,
            bucket_labels: None,
            log_values: None,
        };
        if let Some(request) = options.buckets {
            comparator.set_buckets(request)?;
        }
        Ok(comparator)
    }

    #[must_use]
    pub fn feature(&self) -> &str {
        &self.feature
    }

    #[must_use]
    pub fn outcome_column(&self) -> &str {
        &self.outcome
    }

    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    #[must_use]
    pub fn missing(&self) -> MissingReport {
        self.missing
    }

    /// Number of rows in the subset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The two outcome values, group 0 first.
    #[must_use]
    pub fn outcomes(&self) -> &[Scalar; 2] {
        &self.groups
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn outcome_values(&self) -> &[Scalar] {
        &self.outcomes
    }

    #[must_use]
    pub fn buckets(&self) -> Option<&Buckets> {
        self.buckets.as_ref()
    }

    /// The cached bucket column, if it has been computed.
    #[must_use]
    pub fn bucket_labels(&self) -> Option<&[Option<String>]> {
        self.bucket_labels.as_deref()
    }

    /// The cached log column, if it has been computed.
    #[must_use]
    pub fn log_values(&self) -> Option<&[f64]> {
        self.log_values.as_deref()
    }

    #[must_use]
    pub fn column_name(&self, transform: Transform) -> String {
        match transform {
            Transform::Raw => self.feature.clone(),
            Transform::Log => format!("{}{LOG_COLUMN_SUFFIX}", self.feature),
            Transform::Bucketed => format!("{}{BUCKET_COLUMN_SUFFIX}", self.feature),
        }
    }

    /// Normalizes and installs buckets, then recomputes the bucket column.
    pub fn set_buckets(
        &mut self,
        request: BucketRequest,
    ) -> Result<&[Option<String>], AnalysisError> {
        let buckets = match request {
            BucketRequest::Quantiles(num) => self.quantile_buckets(num)?,
            BucketRequest::Spec(spec) => Buckets::normalize(&spec, self.domain()?, self.format)?,
        };
        info!("{}: installed {} buckets", self.feature, buckets.len());
        self.buckets = Some(buckets);
        self.bucketize(true)
    }

    /// Computes the bucket column, reusing the cached one unless `force` is set.
    ///
    /// Without installed buckets a numeric feature is cut into
    /// [`DEFAULT_QUANTILES`] equal-depth buckets and a categorical feature gets
    /// one bucket per distinct value. Rows matching several buckets take the
    /// last matching label; rows matching none stay unlabelled.
    pub fn bucketize(&mut self, force: bool) -> Result<&[Option<String>], AnalysisError> {
        if force || self.bucket_labels.is_none() {
            let buckets = match self.buckets.take() {
                Some(buckets) => buckets,
                None => self.default_buckets()?,
            };
            let labels = self
                .values
                .iter()
                .map(|value| buckets.assign(value).map(str::to_owned))
                .collect::<Vec<_>>();
            let unlabelled = labels.iter().filter(|label| label.is_none()).count();
            if unlabelled > 0 {
                warn!(
                    "{}: {unlabelled} of {} rows fall outside every bucket",
                    self.feature,
                    labels.len()
                );
            }
            self.buckets = Some(buckets);
            self.bucket_labels = Some(labels);
        } else {
            debug!("{}: reusing cached bucket column", self.feature);
        }
        Ok(self.bucket_labels.as_deref().unwrap_or_default())
    }

    /// Computes (once) and returns the `ln(x + 1)` column.
    pub fn log_transform(&mut self) -> Result<&[f64], AnalysisError> {
        if self.log_values.is_none() {
            let values = self
                .numeric_values()?
                .into_iter()
                .map(f64::ln_1p)
                .collect();
            self.log_values = Some(values);
        } else {
            debug!("{}: reusing cached log column", self.feature);
        }
        Ok(self.log_values.as_deref().unwrap_or_default())
    }

    /// Compares the column selected by `transform` across the outcome groups.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::InsufficientData`] if an outcome group has no rows in
    /// the compared column.
    pub fn stats(&mut self, transform: Transform) -> Result<ComparisonResult, AnalysisError> {
        self.ensure(transform)?;
        match self.view(transform)? {
            ColumnView::Numeric { name, values } => {
                let groups = self.split_numeric(&values);
                self.require_groups(&name, |idx| !groups[idx].is_empty())?;
                let median_difference = descriptive::median(groups[0].iter().copied())
                    .zip(descriptive::median(groups[1].iter().copied()))
                    .map(|(a, b)| a - b);
                let test = hypothesis::mann_whitney_u(&groups[0], &groups[1])
                    .ok_or_else(|| self.insufficient(&name, 0))?;
                Ok(ComparisonResult {
                    column: name,
                    test: ComparisonTest::MannWhitneyU,
                    statistic: test.statistic,
                    p_value: test.p_value,
                    median_difference,
                    dof: None,
                })
            }
            ColumnView::Labels { name, labels } => {
                let counts = self.category_counts(&labels);
                let table = (0..2)
                    .map(|idx| counts.iter().map(|c| c.counts[idx]).collect::<Vec<_>>())
                    .collect::<Vec<_>>();
                self.require_groups(&name, |idx| table[idx].iter().sum::<u64>() > 0)?;
                let test = hypothesis::chi_squared_independence(&table)
                    .ok_or_else(|| self.insufficient(&name, 0))?;
                Ok(ComparisonResult {
                    column: name,
                    test: ComparisonTest::ChiSquared,
                    statistic: test.statistic,
                    p_value: test.p_value,
                    median_difference: None,
                    dof: test.dof,
                })
            }
        }
    }

    /// Plot specifications for the column selected by `transform`.
    ///
    /// Numeric columns yield a histogram and a box-plot comparison, bucketed
    /// and categorical columns a count plot and a rate bar plot.
    pub fn plots(&mut self, transform: Transform) -> Result<Vec<PlotSpec>, AnalysisError> {
        self.ensure(transform)?;
        match self.view(transform)? {
            ColumnView::Numeric { name, values } => {
                let histogram = Histogram::new(values.iter().copied(), self.histogram_bins);
                let groups = self
                    .split_numeric(&values)
                    .iter()
                    .zip(&self.groups)
                    .map(|(group, outcome)| {
                        DescriptiveStats::new(group.iter().copied())
                            .map(|stats| GroupSummary {
                                outcome: outcome.clone(),
                                stats,
                            })
                            .ok_or_else(|| AnalysisError::InsufficientData {
                                column: name.clone(),
                                group: outcome.to_string(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(vec![
                    PlotSpec::Histogram {
                        column: name.clone(),
                        histogram,
                    },
                    PlotSpec::BoxPlot {
                        column: name,
                        groups,
                    },
                ])
            }
            ColumnView::Labels { name, labels } => {
                let categories = self.category_counts(&labels);
                let rates = categories.iter().map(CategoryRate::from_counts).collect();
                Ok(vec![
                    PlotSpec::CountPlot {
                        column: name.clone(),
                        outcomes: self.groups.clone(),
                        categories,
                    },
                    PlotSpec::RateBar {
                        column: name,
                        outcome: self.groups[1].clone(),
                        categories: rates,
                    },
                ])
            }
        }
    }

    /// Removes rows whose feature equals a listed value or lies in a listed
    /// range. Cached derived columns shrink with the subset.
    ///
    /// Returns the number of removed rows.
    pub fn delete_values(&mut self, targets: &[DeleteTarget]) -> usize {
        let keep = self
            .values
            .iter()
            .map(|value| !targets.iter().any(|target| target.matches(value)))
            .collect::<Vec<_>>();
        let removed = keep.iter().filter(|keep| !**keep).count();
        if removed == 0 {
            return 0;
        }

        retain_rows(&mut self.values, &keep);
        retain_rows(&mut self.outcomes, &keep);
        if let Some(labels) = &mut self.bucket_labels {
            retain_rows(labels, &keep);
        }
        if let Some(values) = &mut self.log_values {
            retain_rows(values, &keep);
        }
        info!(
            "{}: deleted {removed} rows, {} remain",
            self.feature,
            self.values.len()
        );
        removed
    }

    /// Compares the raw (or log) feature, optionally buckets it, and collects
    /// the plots that fit.
    ///
    /// With [`AutoBuckets::Only`] the raw-feature plots are skipped. Whenever
    /// the feature is bucketed the bucket column is compared as well.
    pub fn auto(&mut self, options: AutoOptions) -> Result<AutoReport, AnalysisError> {
        let transform = if options.log {
            Transform::Log
        } else {
            Transform::Raw
        };
        let stats = self.stats(transform)?;

        let raw_plots = options.buckets != AutoBuckets::Only;
        let bucketed = match options.buckets {
            AutoBuckets::Off => false,
            AutoBuckets::Quantiles(num) => {
                self.set_buckets(BucketRequest::Quantiles(num))?;
                true
            }
            AutoBuckets::Spec(spec) => {
                self.set_buckets(BucketRequest::Spec(spec))?;
                true
            }
            AutoBuckets::Only => {
                self.bucketize(false)?;
                true
            }
        };

        let mut plots = vec![];
        if raw_plots {
            plots.extend(self.plots(transform)?);
        }
        let bucket_stats = if bucketed {
            plots.extend(self.plots(Transform::Bucketed)?);
            Some(self.stats(Transform::Bucketed)?)
        } else {
            None
        };

        Ok(AutoReport {
            feature: self.feature.clone(),
            kind: self.kind,
            rows: self.len(),
            missing: self.missing,
            outcomes: self.groups.clone(),
            stats,
            bucket_stats,
            plots,
        })
    }

    fn ensure(&mut self, transform: Transform) -> Result<(), AnalysisError> {
        match transform {
            Transform::Raw => {}
            Transform::Log => {
                self.log_transform()?;
            }
            Transform::Bucketed => {
                self.bucketize(false)?;
            }
        }
        Ok(())
    }

    /// Column selected by `transform`; derived columns must be ensured first.
    fn view(&self, transform: Transform) -> Result<ColumnView<'_>, AnalysisError> {
        let name = self.column_name(transform);
        let view = match (transform, self.kind) {
            (Transform::Raw, FeatureKind::Numeric) => ColumnView::Numeric {
                name,
                values: Cow::Owned(self.numeric_values()?),
            },
            (Transform::Raw, FeatureKind::Categorical) => ColumnView::Labels {
                name,
                labels: self
                    .values
                    .iter()
                    .map(|value| Some(Cow::Owned(value.to_string())))
                    .collect(),
            },
            (Transform::Log, _) => ColumnView::Numeric {
                name,
                values: Cow::Borrowed(self.log_values.as_deref().unwrap_or_default()),
            },
            (Transform::Bucketed, _) => ColumnView::Labels {
                name,
                labels: self
                    .bucket_labels
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|label| label.as_deref().map(Cow::Borrowed))
                    .collect(),
            },
        };
        Ok(view)
    }

    fn numeric_values(&self) -> Result<Vec<f64>, AnalysisError> {
        self.values
            .iter()
            .map(|value| {
                value.as_f64().ok_or_else(|| AnalysisError::NonNumeric {
                    column: self.feature.clone(),
                    value: value.to_string(),
                })
            })
            .collect()
    }

    fn domain(&self) -> Result<Domain, AnalysisError> {
        if self.kind == FeatureKind::Categorical {
            return Ok(Domain::Categorical);
        }
        let values = self.numeric_values()?;
        if values.is_empty() {
            return Err(AnalysisError::InvalidBucket {
                label: self.feature.clone(),
                reason: "feature has no values".to_owned(),
            });
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Ok(Domain::Numeric { min, max })
    }

    fn quantile_buckets(&self, num: usize) -> Result<Buckets, AnalysisError> {
        if self.kind == FeatureKind::Categorical {
            return Err(AnalysisError::InvalidBucket {
                label: self.feature.clone(),
                reason: "quantile buckets need a numeric feature".to_owned(),
            });
        }
        let spec = BucketSpec::quantiles(&self.numeric_values()?, num, self.format)?;
        Buckets::normalize(&spec, self.domain()?, self.format)
    }

    fn default_buckets(&self) -> Result<Buckets, AnalysisError> {
        match self.kind {
            FeatureKind::Numeric => self.quantile_buckets(DEFAULT_QUANTILES),
            FeatureKind::Categorical => Ok(Buckets::identity(&self.values)),
        }
    }

    fn group_index(&self, outcome: &Scalar) -> usize {
        usize::from(*outcome != self.groups[0])
    }

    fn split_numeric(&self, values: &[f64]) -> [Vec<f64>; 2] {
        let mut groups = [vec![], vec![]];
        for (value, outcome) in values.iter().zip(&self.outcomes) {
            if !value.is_nan() {
                groups[self.group_index(outcome)].push(*value);
            }
        }
        groups
    }

    fn category_counts(&self, labels: &[Option<Cow<'_, str>>]) -> Vec<CategoryCounts> {
        let mut counts = BTreeMap::<&str, [u64; 2]>::new();
        for (label, outcome) in labels.iter().zip(&self.outcomes) {
            if let Some(label) = label {
                counts.entry(label.as_ref()).or_default()[self.group_index(outcome)] += 1;
            }
        }
        let mut counts = counts
            .into_iter()
            .map(|(label, counts)| CategoryCounts {
                label: label.to_owned(),
                counts,
            })
            .collect::<Vec<_>>();
        counts.sort_by(|a, b| natsort::natural_cmp(&a.label, &b.label));
        counts
    }

    fn require_groups<F>(&self, column: &str, has_rows: F) -> Result<(), AnalysisError>
    where
        F: Fn(usize) -> bool,
    {
        match (0..2).find(|&idx| !has_rows(idx)) {
            Some(idx) => Err(self.insufficient(column, idx)),
            None => Ok(()),
        }
    }

    fn insufficient(&self, column: &str, group: usize) -> AnalysisError {
        AnalysisError::InsufficientData {
            column: column.to_owned(),
            group: self.groups[group].to_string(),
        }
    }
}

fn retain_rows<T>(rows: &mut Vec<T>, keep: &[bool]) {
    *rows = std::mem::take(rows)
        .into_iter()
        .zip(keep)
        .filter_map(|(row, &keep)| keep.then_some(row))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bucket::BucketEntry, dataset::Column};

    fn outcomes(labels: &[&str]) -> Column {
        Column::text(
            DEFAULT_OUTCOME_COLUMN,
            labels.iter().map(|l| Some(*l)).collect(),
        )
    }

    fn numeric_dataset(values: &[Option<f64>], labels: &[&str]) -> Dataset {
        Dataset::new(vec![
            Column::float("amount", values.to_vec()),
            outcomes(labels),
        ])
        .unwrap()
    }

    fn comparator(dataset: &Dataset) -> FeatureComparator {
        FeatureComparator::new(dataset, "amount", ComparatorOptions::default()).unwrap()
    }

    #[test]
    fn test_missing_rows_dropped_and_counted() {
        let dataset = numeric_dataset(
            &[Some(1.0), None, Some(3.0), None, Some(5.0)],
            &["A", "B", "B", "A", "A"],
        );
        let comparator = comparator(&dataset);
        assert_eq!(comparator.len(), 3);
        assert_eq!(comparator.missing().dropped, dataset.num_rows() - comparator.len());
        assert!((comparator.missing().percent() - 40.0).abs() < 1e-12);
        assert_eq!(comparator.kind(), FeatureKind::Numeric);
    }

    #[test]
    fn test_outcome_groups_first_encountered() {
        let dataset = numeric_dataset(&[Some(1.0), Some(2.0), Some(3.0)], &["B", "A", "B"]);
        let comparator = comparator(&dataset);
        assert_eq!(comparator.outcomes(), &[Scalar::from("B"), Scalar::from("A")]);
    }

    #[test]
    fn test_outcome_must_have_two_values() {
        let dataset = numeric_dataset(&[Some(1.0), Some(2.0)], &["A", "A"]);
        assert_eq!(
            FeatureComparator::new(&dataset, "amount", ComparatorOptions::default()).unwrap_err(),
            AnalysisError::InvalidData {
                column: DEFAULT_OUTCOME_COLUMN.to_owned(),
                found: 1
            }
        );

        let dataset = numeric_dataset(&[Some(1.0), Some(2.0), Some(3.0)], &["A", "B", "C"]);
        assert!(matches!(
            FeatureComparator::new(&dataset, "amount", ComparatorOptions::default()),
            Err(AnalysisError::InvalidData { found: 3, .. })
        ));
    }

    #[test]
    fn test_missing_outcome_counts_as_value() {
        let dataset = Dataset::new(vec![
            Column::float("amount", vec![Some(1.0), Some(2.0), Some(3.0)]),
            Column::int(DEFAULT_OUTCOME_COLUMN, vec![Some(0), None, Some(1)]),
        ])
        .unwrap();
        assert!(matches!(
            FeatureComparator::new(&dataset, "amount", ComparatorOptions::default()),
            Err(AnalysisError::InvalidData { found: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_column() {
        let dataset = numeric_dataset(&[Some(1.0)], &["A"]);
        assert!(matches!(
            FeatureComparator::new(&dataset, "nope", ComparatorOptions::default()),
            Err(AnalysisError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_int_column_is_categorical() {
        let dataset = Dataset::new(vec![
            Column::int("term", vec![Some(36), Some(60), Some(36)]),
            outcomes(&["A", "B", "B"]),
        ])
        .unwrap();
        let comparator =
            FeatureComparator::new(&dataset, "term", ComparatorOptions::default()).unwrap();
        assert_eq!(comparator.kind(), FeatureKind::Categorical);

        let options = ComparatorOptions {
            force_categorical: true,
            ..ComparatorOptions::default()
        };
        let dataset = numeric_dataset(&[Some(1.0), Some(2.0)], &["A", "B"]);
        let comparator = FeatureComparator::new(&dataset, "amount", options).unwrap();
        assert_eq!(comparator.kind(), FeatureKind::Categorical);
    }

    #[test]
    fn test_keyword_buckets_assignment() {
        let dataset = numeric_dataset(
            &[Some(0.0), Some(1.0), Some(5.0), Some(0.0)],
            &["A", "B", "A", "B"],
        );
        let spec = BucketSpec::from_iter([
            ("0", BucketEntry::Scalar(0)),
            (
                "1+",
                BucketEntry::OpenEnded {
                    lower: 1,
                    inclusive: false,
                },
            ),
        ]);
        let options = ComparatorOptions {
            buckets: Some(BucketRequest::Spec(spec)),
            bound_format: BoundFormat::Integer,
            ..ComparatorOptions::default()
        };
        let comparator = FeatureComparator::new(&dataset, "amount", options).unwrap();
        let labels = comparator.bucket_labels().unwrap();
        assert_eq!(
            labels,
            &[
                Some("[0,0]".to_owned()),
                None,
                Some("(1,5]".to_owned()),
                Some("[0,0]".to_owned())
            ]
        );
    }

    #[test]
    fn test_inclusive_keyword_includes_lower_bound() {
        let dataset = numeric_dataset(
            &[Some(0.0), Some(1.0), Some(5.0), Some(0.0)],
            &["A", "B", "A", "B"],
        );
        let mut comparator = comparator(&dataset);
        let spec = BucketSpec::from_iter([
            ("0", BucketEntry::Scalar(0)),
            (
                "1+=",
                BucketEntry::OpenEnded {
                    lower: 1,
                    inclusive: true,
                },
            ),
        ]);
        let labels = comparator.set_buckets(BucketRequest::Spec(spec)).unwrap();
        assert_eq!(labels[1].as_deref(), Some("[1,5.00]"));
        assert_eq!(labels[2].as_deref(), Some("[1,5.00]"));
    }

    #[test]
    fn test_keyword_labels_with_explicit_ranges() {
        let dataset = numeric_dataset(
            &[Some(0.0), Some(1.0), Some(5.0), Some(0.0)],
            &["A", "B", "A", "B"],
        );
        let spec: BucketSpec = serde_json::from_str(r#"{"0": [0,0], "1+": [1, "max"]}"#).unwrap();
        let options = ComparatorOptions {
            buckets: Some(BucketRequest::Spec(spec)),
            bound_format: BoundFormat::Integer,
            ..ComparatorOptions::default()
        };
        let comparator = FeatureComparator::new(&dataset, "amount", options).unwrap();
        assert_eq!(
            comparator.buckets().unwrap().labels().collect::<Vec<_>>(),
            vec!["[0,0]", "(1,5]"]
        );
        assert_eq!(
            comparator.bucket_labels().unwrap(),
            &[
                Some("[0,0]".to_owned()),
                None,
                Some("(1,5]".to_owned()),
                Some("[0,0]".to_owned())
            ]
        );
    }

    #[test]
    fn test_integer_quantiles_on_sub_unit_range() {
        let values = (0..=100)
            .map(|v| Some(f64::from(v) / 100.0))
            .collect::<Vec<_>>();
        let labels = (0..=100)
            .map(|v| if v % 2 == 0 { "A" } else { "B" })
            .collect::<Vec<_>>();
        let dataset = numeric_dataset(&values, &labels);
        let options = ComparatorOptions {
            bound_format: BoundFormat::Integer,
            ..ComparatorOptions::default()
        };
        let mut comparator = FeatureComparator::new(&dataset, "amount", options).unwrap();
        let assigned = comparator.set_buckets(BucketRequest::Quantiles(4)).unwrap();
        assert_eq!(assigned.iter().filter(|label| label.is_none()).count(), 0);
        assert_eq!(comparator.buckets().unwrap().len(), 3);
    }

    #[test]
    fn test_quantile_buckets_cover_every_row() {
        let values = (0..40).map(|v| Some(f64::from(v))).collect::<Vec<_>>();
        let labels = (0..40).map(|v| if v % 3 == 0 { "A" } else { "B" }).collect::<Vec<_>>();
        let dataset = numeric_dataset(&values, &labels);
        let mut comparator = comparator(&dataset);
        let assigned = comparator.set_buckets(BucketRequest::Quantiles(4)).unwrap();
        assert!(assigned.iter().all(Option::is_some));
        assert_eq!(comparator.buckets().unwrap().len(), 4);

        let counts = comparator
            .plots(Transform::Bucketed)
            .unwrap()
            .into_iter()
            .find_map(|plot| match plot {
                PlotSpec::CountPlot { categories, .. } => Some(categories),
                _ => None,
            })
            .unwrap();
        assert_eq!(counts.iter().map(CategoryCounts::total).sum::<u64>(), 40);
    }

    #[test]
    fn test_quantiles_rejected_for_categorical() {
        let dataset = Dataset::new(vec![
            Column::text("grade", vec![Some("A"), Some("B")]),
            outcomes(&["A", "B"]),
        ])
        .unwrap();
        let mut comparator =
            FeatureComparator::new(&dataset, "grade", ComparatorOptions::default()).unwrap();
        assert!(matches!(
            comparator.set_buckets(BucketRequest::Quantiles(3)),
            Err(AnalysisError::InvalidBucket { .. })
        ));
    }

    #[test]
    fn test_median_difference() {
        let dataset = numeric_dataset(
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)],
            &["A", "A", "A", "B", "B", "B"],
        );
        let mut comparator = comparator(&dataset);
        let result = comparator.stats(Transform::Raw).unwrap();
        assert_eq!(result.test, ComparisonTest::MannWhitneyU);
        assert_eq!(result.median_difference, Some(-3.0));
        assert_eq!(result.column, "amount");
        assert!(result.statistic.abs() < 1e-12);
    }

    #[test]
    fn test_log_transform_cached() {
        let e = std::f64::consts::E;
        let dataset = numeric_dataset(&[Some(e - 1.0), Some(0.0)], &["A", "B"]);
        let mut comparator = comparator(&dataset);
        assert!(comparator.log_values().is_none());
        let first = comparator.log_transform().unwrap().to_vec();
        assert!((first[0] - 1.0).abs() < 1e-12);
        assert!(first[1].abs() < 1e-12);
        let second = comparator.log_transform().unwrap().to_vec();
        assert_eq!(first, second);

        let result = comparator.stats(Transform::Log).unwrap();
        assert_eq!(result.column, "amount_log");
        assert_eq!(result.test, ComparisonTest::MannWhitneyU);
    }

    #[test]
    fn test_log_of_int_column_is_numeric() {
        let dataset = Dataset::new(vec![
            Column::int("delinq", vec![Some(0), Some(1), Some(3), Some(7)]),
            outcomes(&["A", "A", "B", "B"]),
        ])
        .unwrap();
        let mut comparator =
            FeatureComparator::new(&dataset, "delinq", ComparatorOptions::default()).unwrap();
        assert_eq!(
            comparator.stats(Transform::Raw).unwrap().test,
            ComparisonTest::ChiSquared
        );
        assert_eq!(
            comparator.stats(Transform::Log).unwrap().test,
            ComparisonTest::MannWhitneyU
        );
    }

    #[test]
    fn test_log_of_text_column_fails() {
        let dataset = Dataset::new(vec![
            Column::text("grade", vec![Some("A"), Some("B")]),
            outcomes(&["A", "B"]),
        ])
        .unwrap();
        let mut comparator =
            FeatureComparator::new(&dataset, "grade", ComparatorOptions::default()).unwrap();
        assert!(matches!(
            comparator.stats(Transform::Log),
            Err(AnalysisError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_categorical_stats_and_plots() {
        let dataset = Dataset::new(vec![
            Column::text(
                "grade",
                vec![
                    Some("10"),
                    Some("2"),
                    Some("2"),
                    Some("10"),
                    Some("2"),
                    Some("10"),
                ],
            ),
            outcomes(&["A", "A", "A", "B", "B", "B"]),
        ])
        .unwrap();
        let mut comparator =
            FeatureComparator::new(&dataset, "grade", ComparatorOptions::default()).unwrap();
        let result = comparator.stats(Transform::Raw).unwrap();
        assert_eq!(result.test, ComparisonTest::ChiSquared);
        assert_eq!(result.dof, Some(1));
        assert!(result.median_difference.is_none());

        let plots = comparator.plots(Transform::Raw).unwrap();
        assert_eq!(plots.len(), 2);
        let PlotSpec::CountPlot { categories, .. } = &plots[0] else {
            panic!("expected count plot first");
        };
        let labels = categories.iter().map(|c| c.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["2", "10"]);
        assert_eq!(categories[0].counts, [2, 1]);
        let PlotSpec::RateBar { outcome, categories, .. } = &plots[1] else {
            panic!("expected rate bar second");
        };
        assert_eq!(outcome, &Scalar::from("B"));
        assert!((categories[1].rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_numeric_plots() {
        let dataset = numeric_dataset(
            &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)],
            &["A", "B", "A", "B"],
        );
        let mut comparator = comparator(&dataset);
        let plots = comparator.plots(Transform::Raw).unwrap();
        assert!(matches!(plots[0], PlotSpec::Histogram { .. }));
        let PlotSpec::BoxPlot { groups, .. } = &plots[1] else {
            panic!("expected box plot");
        };
        assert_eq!(groups[0].stats.median, 2.0);
        assert_eq!(groups[1].stats.median, 3.0);
    }

    #[test]
    fn test_delete_scalar_and_range() {
        let dataset = numeric_dataset(
            &[Some(0.0), Some(1.0), Some(2.5), Some(3.0), Some(0.0), Some(9.0)],
            &["A", "B", "A", "B", "A", "B"],
        );
        let mut comparator = comparator(&dataset);
        comparator.log_transform().unwrap();

        let removed = comparator.delete_values(&[DeleteTarget::Value(Scalar::Int(0))]);
        assert_eq!(removed, 2);
        assert_eq!(comparator.len(), 4);
        assert!(comparator.values().iter().all(|v| *v != Scalar::Float(0.0)));

        let removed = comparator.delete_values(&[DeleteTarget::Range(2.5, 3.0)]);
        assert_eq!(removed, 2);
        assert_eq!(
            comparator.values(),
            &[Scalar::Float(1.0), Scalar::Float(9.0)]
        );
        assert_eq!(comparator.outcome_values(), &[Scalar::from("B"), Scalar::from("B")]);
        assert_eq!(comparator.log_values().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_group_after_delete() {
        let dataset = numeric_dataset(&[Some(1.0), Some(2.0), Some(3.0)], &["A", "B", "A"]);
        let mut comparator = comparator(&dataset);
        comparator.delete_values(&[DeleteTarget::Value(Scalar::Float(2.0))]);
        assert_eq!(
            comparator.stats(Transform::Raw).unwrap_err(),
            AnalysisError::InsufficientData {
                column: "amount".to_owned(),
                group: "B".to_owned()
            }
        );
    }

    #[test]
    fn test_transform_prefix() {
        assert_eq!("".parse::<Transform>().unwrap(), Transform::Raw);
        assert_eq!("l".parse::<Transform>().unwrap(), Transform::Log);
        assert_eq!("b".parse::<Transform>().unwrap(), Transform::Bucketed);
        assert_eq!(
            "x".parse::<Transform>().unwrap_err(),
            AnalysisError::UnknownTransform {
                prefix: "x".to_owned()
            }
        );
        assert_eq!(Transform::Log.prefix(), "l");
    }

    #[test]
    fn test_bucketize_defaults_and_caches() {
        let values = (0..20).map(|v| Some(f64::from(v))).collect::<Vec<_>>();
        let labels = (0..20).map(|v| if v < 10 { "A" } else { "B" }).collect::<Vec<_>>();
        let dataset = numeric_dataset(&values, &labels);
        let mut comparator = comparator(&dataset);
        let first = comparator.bucketize(false).unwrap().to_vec();
        assert_eq!(comparator.buckets().unwrap().len(), DEFAULT_QUANTILES);
        let second = comparator.bucketize(false).unwrap().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_auto_only_buckets_skips_raw_plots() {
        let values = (0..30).map(|v| Some(f64::from(v))).collect::<Vec<_>>();
        let labels = (0..30).map(|v| if v % 2 == 0 { "A" } else { "B" }).collect::<Vec<_>>();
        let dataset = numeric_dataset(&values, &labels);
        let mut comparator = comparator(&dataset);
        let report = comparator
            .auto(AutoOptions {
                log: false,
                buckets: AutoBuckets::Only,
            })
            .unwrap();
        assert_eq!(report.stats.column, "amount");
        assert!(report.bucket_stats.is_some());
        assert_eq!(report.plots.len(), 2);
        assert!(report.plots.iter().all(|p| p.column() == "amount_bucket"));
    }

    #[test]
    fn test_auto_log_with_quantiles() {
        let values = (1..=30).map(|v| Some(f64::from(v))).collect::<Vec<_>>();
        let labels = (0..30).map(|v| if v < 15 { "A" } else { "B" }).collect::<Vec<_>>();
        let dataset = numeric_dataset(&values, &labels);
        let mut comparator = comparator(&dataset);
        let report = comparator
            .auto(AutoOptions {
                log: true,
                buckets: AutoBuckets::Quantiles(3),
            })
            .unwrap();
        assert_eq!(report.stats.column, "amount_log");
        assert!(report.stats.median_difference.unwrap() < 0.0);
        let kinds = report
            .plots
            .iter()
            .map(|p| (p.column().to_owned(), std::mem::discriminant(p)))
            .collect::<Vec<_>>();
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[0].0, "amount_log");
        assert_eq!(kinds[2].0, "amount_bucket");
        assert_eq!(comparator.buckets().unwrap().len(), 3);
    }

    #[test]
    fn test_auto_categorical_without_buckets() {
        let dataset = Dataset::new(vec![
            Column::text("home", vec![Some("RENT"), Some("OWN"), Some("RENT"), Some("OWN")]),
            outcomes(&["A", "B", "B", "A"]),
        ])
        .unwrap();
        let mut comparator =
            FeatureComparator::new(&dataset, "home", ComparatorOptions::default()).unwrap();
        let report = comparator.auto(AutoOptions::default()).unwrap();
        assert_eq!(report.kind, FeatureKind::Categorical);
        assert!(report.bucket_stats.is_none());
        assert!(matches!(report.plots[0], PlotSpec::CountPlot { .. }));
        assert!(matches!(report.plots[1], PlotSpec::RateBar { .. }));
    }

    #[test]
    fn test_source_dataset_untouched() {
        let dataset = numeric_dataset(&[Some(1.0), Some(2.0)], &["A", "B"]);
        let mut comparator = comparator(&dataset);
        comparator.delete_values(&[DeleteTarget::Value(Scalar::Float(1.0))]);
        assert_eq!(dataset.column("amount").unwrap().cells()[0], Some(Scalar::Float(1.0)));
    }
}
