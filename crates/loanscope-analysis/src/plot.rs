//! Plot specifications
//!
//! The comparator decides *which* plots fit a column and computes the data
//! they show; drawing them is left to a [`PlotSink`]. Numeric columns get a
//! distribution histogram and a box-plot per outcome group, categorical and
//! bucketed columns get per-category counts and the outcome rate per
//! category. Categories are listed in natural order.

use loanscope_stats::{descriptive::DescriptiveStats, histogram::Histogram};
use serde::Serialize;

use crate::dataset::Scalar;

/// Data for one plot.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotSpec {
    /// Distribution of a numeric column over all rows.
    Histogram { column: String, histogram: Histogram },
    /// Five-number summary of a numeric column per outcome group.
    BoxPlot {
        column: String,
        groups: Vec<GroupSummary>,
    },
    /// Row counts per category, split by outcome group.
    CountPlot {
        column: String,
        outcomes: [Scalar; 2],
        categories: Vec<CategoryCounts>,
    },
    /// Share of rows with `outcome` per category.
    RateBar {
        column: String,
        outcome: Scalar,
        categories: Vec<CategoryRate>,
    },
}

impl PlotSpec {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            PlotSpec::Histogram { column, .. }
            | PlotSpec::BoxPlot { column, .. }
            | PlotSpec::CountPlot { column, .. }
            | PlotSpec::RateBar { column, .. } => column,
        }
    }

    #[must_use]
    pub fn title(&self) -> String {
        match self {
            PlotSpec::Histogram { column, .. } => format!("Distribution of {column}"),
            PlotSpec::BoxPlot { column, .. } => format!("{column} by outcome"),
            PlotSpec::CountPlot { column, .. } => format!("Counts of {column}"),
            PlotSpec::RateBar {
                column, outcome, ..
            } => format!("Rate of {outcome} by {column}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub outcome: Scalar,
    pub stats: DescriptiveStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCounts {
    pub label: String,
    /// Counts per outcome group, in outcome order.
    pub counts: [u64; 2],
}

impl CategoryCounts {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts[0] + self.counts[1]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryRate {
    pub label: String,
    pub rate: f64,
    pub count: u64,
}

impl CategoryRate {
    /// Rate of the second outcome group within a category.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_counts(counts: &CategoryCounts) -> Self {
        let count = counts.total();
        let rate = if count == 0 {
            0.0
        } else {
            counts.counts[1] as f64 / count as f64
        };
        Self {
            label: counts.label.clone(),
            rate,
            count,
        }
    }
}

/// Receiver for plot specifications, typically a renderer.
pub trait PlotSink {
    type Error;

    fn render(&mut self, plot: &PlotSpec) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_counts() {
        let counts = CategoryCounts {
            label: "[0,0]".to_owned(),
            counts: [3, 1],
        };
        let rate = CategoryRate::from_counts(&counts);
        assert_eq!(rate.count, 4);
        assert!((rate.rate - 0.25).abs() < 1e-12);
    }

    struct TitleSink(Vec<String>);

    impl PlotSink for TitleSink {
        type Error = std::convert::Infallible;

        fn render(&mut self, plot: &PlotSpec) -> Result<(), Self::Error> {
            self.0.push(plot.title());
            Ok(())
        }
    }

    #[test]
    fn test_sink_receives_titles() {
        let mut sink = TitleSink(vec![]);
        let plot = PlotSpec::RateBar {
            column: "grade".to_owned(),
            outcome: Scalar::Int(1),
            categories: vec![],
        };
        sink.render(&plot).unwrap();
        assert_eq!(plot.column(), "grade");
        assert_eq!(sink.0, vec!["Rate of 1 by grade".to_owned()]);
    }
}
