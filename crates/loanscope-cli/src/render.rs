//! Plain-text report and plot rendering
//!
//! Plots are drawn as tables with proportional bars so a report reads fine in
//! a terminal or a log file.

use std::io::{self, Write};

use loanscope_analysis::{
    comparator::{AutoReport, ComparisonResult},
    dataset::Scalar,
    plot::{CategoryCounts, CategoryRate, GroupSummary, PlotSink, PlotSpec},
};
use loanscope_stats::histogram::Histogram;

const BAR_WIDTH: usize = 40;

/// Renders plots as text tables.
pub(crate) struct TextPlotSink<W> {
    writer: W,
}

impl<W> TextPlotSink<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn histogram(&mut self, histogram: &Histogram) -> io::Result<()> {
        let w = &mut self.writer;
        let max = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0);
        writeln!(w, "  {:>12} {:>12} {:>8}", "From", "To", "Count")?;
        writeln!(w, "  {}", "-".repeat(34 + BAR_WIDTH))?;
        for bin in &histogram.bins {
            writeln!(
                w,
                "  {:>12.3} {:>12.3} {:>8} {}",
                bin.range.start,
                bin.range.end,
                bin.count,
                bar(bin.count, max)
            )?;
        }
        Ok(())
    }

    fn box_plot(&mut self, groups: &[GroupSummary]) -> io::Result<()> {
        let w = &mut self.writer;
        writeln!(
            w,
            "  {:<12} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Outcome", "Count", "Min", "Q1", "Median", "Q3", "Max", "Mean"
        )?;
        writeln!(w, "  {}", "-".repeat(89))?;
        for group in groups {
            let stats = &group.stats;
            writeln!(
                w,
                "  {:<12} {:>8} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}",
                group.outcome.to_string(),
                stats.count,
                stats.min,
                stats.q1,
                stats.median,
                stats.q3,
                stats.max,
                stats.mean
            )?;
        }
        Ok(())
    }

    fn count_plot(
        &mut self,
        outcomes: &[Scalar; 2],
        categories: &[CategoryCounts],
    ) -> io::Result<()> {
        let w = &mut self.writer;
        let max = categories.iter().map(CategoryCounts::total).max().unwrap_or(0);
        writeln!(
            w,
            "  {:<24} {:>10} {:>10} {:>10}",
            "Category",
            outcomes[0].to_string(),
            outcomes[1].to_string(),
            "Total"
        )?;
        writeln!(w, "  {}", "-".repeat(58 + BAR_WIDTH))?;
        for category in categories {
            writeln!(
                w,
                "  {:<24} {:>10} {:>10} {:>10} {}",
                category.label,
                category.counts[0],
                category.counts[1],
                category.total(),
                bar(category.total(), max)
            )?;
        }
        Ok(())
    }

    fn rate_bar(&mut self, categories: &[CategoryRate]) -> io::Result<()> {
        let w = &mut self.writer;
        writeln!(w, "  {:<24} {:>8} {:>10}", "Category", "Rate", "Rows")?;
        writeln!(w, "  {}", "-".repeat(45 + BAR_WIDTH))?;
        for category in categories {
            writeln!(
                w,
                "  {:<24} {:>7.2}% {:>10} {}",
                category.label,
                100.0 * category.rate,
                category.count,
                rate_bar(category.rate)
            )?;
        }
        Ok(())
    }
}

impl<W> PlotSink for TextPlotSink<W>
where
    W: Write,
{
    type Error = io::Error;

    fn render(&mut self, plot: &PlotSpec) -> Result<(), Self::Error> {
        let title = plot.title();
        writeln!(self.writer, "{title}")?;
        writeln!(self.writer, "{}", "=".repeat(title.chars().count()))?;
        match plot {
            PlotSpec::Histogram { histogram, .. } => self.histogram(histogram)?,
            PlotSpec::BoxPlot { groups, .. } => self.box_plot(groups)?,
            PlotSpec::CountPlot {
                outcomes,
                categories,
                ..
            } => self.count_plot(outcomes, categories)?,
            PlotSpec::RateBar { categories, .. } => self.rate_bar(categories)?,
        }
        writeln!(self.writer)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn bar(count: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count as f64 / max as f64 * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn rate_bar(rate: f64) -> String {
    let len = (rate.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len)
}

pub(crate) fn write_comparison<W>(
    w: &mut W,
    heading: &str,
    result: &ComparisonResult,
) -> io::Result<()>
where
    W: Write,
{
    writeln!(w, "{heading}: {} ({:?})", result.column, result.test)?;
    writeln!(w, "  Statistic        : {:.4}", result.statistic)?;
    writeln!(w, "  p-value          : {:.4e}", result.p_value)?;
    if let Some(diff) = result.median_difference {
        writeln!(w, "  Median difference: {diff:.4}")?;
    }
    if let Some(dof) = result.dof {
        writeln!(w, "  Degrees of freedom: {dof}")?;
    }
    writeln!(w)
}

pub(crate) fn write_plots<W>(w: &mut W, plots: &[PlotSpec]) -> io::Result<()>
where
    W: Write,
{
    let mut sink = TextPlotSink::new(w);
    for plot in plots {
        sink.render(plot)?;
    }
    Ok(())
}

pub(crate) fn write_report<W>(w: &mut W, report: &AutoReport) -> io::Result<()>
where
    W: Write,
{
    writeln!(w, "Feature Report: {} ({:?})", report.feature, report.kind)?;
    writeln!(w, "==========================================\n")?;
    writeln!(
        w,
        "  Rows: {} kept, {} dropped as missing ({:.2}%)",
        report.rows,
        report.missing.dropped,
        report.missing.percent()
    )?;
    writeln!(
        w,
        "  Outcome groups: {} / {}\n",
        report.outcomes[0], report.outcomes[1]
    )?;

    write_comparison(w, "Comparison", &report.stats)?;
    if let Some(bucket_stats) = &report.bucket_stats {
        write_comparison(w, "Bucket comparison", bucket_stats)?;
    }
    write_plots(w, &report.plots)?;
    w.flush()
}

#[cfg(test)]
mod tests {
    use loanscope_analysis::{
        comparator::{AutoBuckets, AutoOptions, ComparatorOptions, FeatureComparator},
        dataset::{Column, Dataset},
    };

    use super::*;

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(0, 0), "");
        assert_eq!(bar(5, 10).len(), BAR_WIDTH / 2);
        assert_eq!(rate_bar(1.0).len(), BAR_WIDTH);
    }

    #[test]
    fn test_report_lists_every_plot() {
        let dataset = Dataset::new(vec![
            Column::float("dti", (0..20).map(|v| Some(f64::from(v))).collect()),
            Column::int("TARGET", (0..20).map(|v| Some(v % 2)).collect()),
        ])
        .unwrap();
        let mut comparator =
            FeatureComparator::new(&dataset, "dti", ComparatorOptions::default()).unwrap();
        let report = comparator
            .auto(AutoOptions {
                log: false,
                buckets: AutoBuckets::Quantiles(4),
            })
            .unwrap();

        let mut buf = vec![];
        write_report(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Feature Report: dti (Numeric)"));
        assert!(text.contains("Bucket comparison: dti_bucket (ChiSquared)"));
        for plot in &report.plots {
            assert!(text.contains(&plot.title()));
        }
    }
}
