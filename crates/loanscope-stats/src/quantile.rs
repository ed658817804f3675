/// Precomputed quantile values for a dataset.
///
/// This structure stores quantile-value pairs for efficient lookup of
/// commonly used cut points, e.g. the boundaries of an equal-depth binning.
///
/// # Examples
///
/// ```
/// use loanscope_stats::quantile::Quantiles;
///
/// let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let quantiles = Quantiles::new(&values, &[0.0, 0.5, 1.0]);
///
/// assert_eq!(quantiles.get(0.5), Some(3.0));
/// assert_eq!(quantiles.get(1.0), Some(5.0));
/// ```
#[derive(Debug, Clone)]
pub struct Quantiles {
    /// Quantile-value pairs in the order they were requested.
    /// Each tuple contains (q, value) where q is 0.0-1.0.
    values: Vec<(f64, f64)>,
}

impl Quantiles {
    /// Computes quantiles from sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64], points: &[f64]) -> Self {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let values = points
            .iter()
            .map(|&q| (q, quantile(sorted_values, q)))
            .collect();
        Self { values }
    }

    /// Computes quantiles from unsorted values.
    #[must_use]
    pub fn new(values: &[f64], points: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted, points)
    }

    /// Computes `num + 1` evenly spaced quantiles at `k / num` for `k = 0..=num`.
    ///
    /// The first value is the minimum and the last the maximum of the data.
    ///
    /// ```
    /// use loanscope_stats::quantile::Quantiles;
    ///
    /// let values = [0.0, 10.0, 20.0, 30.0, 40.0];
    /// let q = Quantiles::evenly_spaced(&values, 4);
    /// let bounds = q.iter().map(|(_, v)| v).collect::<Vec<_>>();
    /// assert_eq!(bounds, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn evenly_spaced(values: &[f64], num: usize) -> Self {
        let points = (0..=num)
            .map(|k| if num == 0 { 0.0 } else { k as f64 / num as f64 })
            .collect::<Vec<_>>();
        Self::new(values, &points)
    }

    /// Gets the value at a specific quantile, `None` if it was not precomputed.
    #[must_use]
    pub fn get(&self, q: f64) -> Option<f64> {
        self.values
            .iter()
            .find(|(p, _)| (*p - q).abs() < f64::EPSILON)
            .map(|(_, value)| *value)
    }

    /// Returns an iterator over all (quantile, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Computes a single quantile from sorted data.
///
/// Uses linear interpolation between the two nearest order statistics:
/// for `n` values the quantile `q` sits at position `(n - 1) * q`.
///
/// Returns `f64::NAN` if the input is empty. `q` is clamped to `[0, 1]`.
///
/// # Examples
///
/// ```
/// use loanscope_stats::quantile::quantile;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile(&values, 0.5), 2.5);
/// assert_eq!(quantile(&values, 0.0), 1.0);
/// assert_eq!(quantile(&values, 1.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn quantile(sorted_values: &[f64], q: f64) -> f64 {
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let position = (sorted_values.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - position.floor();
    sorted_values[lower] + (sorted_values[upper] - sorted_values[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_nan() {
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn test_interpolates_between_order_statistics() {
        let values = [10.0, 20.0, 30.0];
        assert!((quantile(&values, 0.25) - 15.0).abs() < 1e-12);
        assert!((quantile(&values, 0.75) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_evenly_spaced_covers_range() {
        let values = [3.0, 1.0, 7.0, 5.0, 9.0, 2.0];
        let q = Quantiles::evenly_spaced(&values, 3);
        assert_eq!(q.len(), 4);
        assert_eq!(q.get(0.0), Some(1.0));
        assert_eq!(q.get(1.0), Some(9.0));
        let bounds = q.iter().map(|(_, v)| v).collect::<Vec<_>>();
        assert!(bounds.is_sorted_by(|a, b| a <= b));
    }

    #[test]
    fn test_missing_point() {
        let q = Quantiles::new(&[1.0, 2.0], &[0.5]);
        assert_eq!(q.get(0.25), None);
    }
}
