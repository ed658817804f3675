use std::ops::Range;

use serde::Serialize;

/// A histogram representation of a dataset's distribution.
///
/// The histogram divides `[min, max]` of the data into equal-width bins and
/// counts the values falling into each one. Every bin is right-open except the
/// last, which also holds the maximum.
#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

/// A single bin in a histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl Histogram {
    /// Creates a histogram from unsorted values.
    ///
    /// Non-finite values are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use loanscope_stats::histogram::Histogram;
    /// let values = [5.0, 2.0, 8.0, 1.0, 9.0, 3.0, 7.0, 4.0, 6.0, 10.0];
    /// let histogram = Histogram::new(values, 5);
    /// assert_eq!(histogram.bins.len(), 5);
    /// assert_eq!(histogram.total(), 10);
    /// ```
    #[must_use]
    pub fn new<I>(values: I, num_bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted = values
            .into_iter()
            .filter(|v| v.is_finite())
            .collect::<Vec<_>>();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, num_bins)
    }

    /// Creates a histogram from pre-sorted finite values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], num_bins: usize) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let (Some(&min), Some(&max)) = (sorted_values.first(), sorted_values.last()) else {
            return Self { bins: vec![] };
        };
        if num_bins == 0 {
            return Self { bins: vec![] };
        }

        // A single distinct value still gets a unit-wide bin
        let mut range = max - min;
        if range < f64::EPSILON {
            range = 1.0;
        }
        let bin_width = range / num_bins as f64;

        let mut bins = (0..num_bins)
            .map(|idx| {
                // Recompute boundaries from the index to avoid accumulation errors
                let start = min + range * idx as f64 / num_bins as f64;
                let end = if idx + 1 == num_bins {
                    (min + range).next_up()
                } else {
                    min + range * (idx + 1) as f64 / num_bins as f64
                };
                HistogramBin {
                    range: start..end,
                    count: 0,
                }
            })
            .collect::<Vec<_>>();

        for &value in sorted_values {
            let idx = (((value - min) / bin_width).floor() as usize).min(num_bins - 1);
            bins[idx].count += 1;
        }

        Self { bins }
    }

    /// Total number of values counted.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|bin| bin.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert!(Histogram::new(std::iter::empty(), 10).bins.is_empty());
        assert!(Histogram::new([1.0], 0).bins.is_empty());
    }

    #[test]
    fn test_max_lands_in_last_bin() {
        let histogram = Histogram::new([0.0, 1.0, 2.0, 3.0, 4.0], 2);
        let counts = histogram.bins.iter().map(|b| b.count).collect::<Vec<_>>();
        assert_eq!(counts, vec![2, 3]);
        assert!(histogram.bins[1].range.contains(&4.0));
    }

    #[test]
    fn test_single_value() {
        let histogram = Histogram::new([7.0; 4], 3);
        assert_eq!(histogram.total(), 4);
        assert_eq!(histogram.bins[0].count, 4);
    }

    #[test]
    fn test_ignores_non_finite() {
        let histogram = Histogram::new([1.0, f64::NAN, 2.0, f64::INFINITY], 4);
        assert_eq!(histogram.total(), 2);
    }
}
