//! Two-group significance tests
//!
//! Both tests report a statistic and a two-sided p-value. They return `None`
//! for input on which the statistic is undefined (an empty group, a
//! contingency table with an all-zero row or column) so callers can map that
//! case onto their own error type.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Result of a significance test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    /// Test statistic (U for rank-sum, χ² for independence).
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Degrees of freedom, for tests that have them.
    pub dof: Option<usize>,
}

/// Mann–Whitney U test (Wilcoxon rank-sum) between two independent samples.
///
/// The reported statistic is U of the first sample. The p-value uses the
/// normal approximation with tie correction and continuity correction. When
/// every value is tied the samples are indistinguishable and the p-value is 1.
///
/// # Examples
///
/// ```
/// use loanscope_stats::hypothesis::mann_whitney_u;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let r = mann_whitney_u(&a, &b).unwrap();
/// assert_eq!(r.statistic, 0.0);
/// assert!(r.p_value < 0.05);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Option<TestResult> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let n = n1 + n2;

    let mut combined = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect::<Vec<_>>();
    combined.sort_by(|x, y| x.0.total_cmp(&y.0));

    // Average ranks over tie runs, accumulating the tie term sum(t^3 - t)
    let mut rank_sum_a = 0.0;
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < combined.len() {
        let mut end = start + 1;
        while end < combined.len() && combined[end].0 == combined[start].0 {
            end += 1;
        }
        let ties = (end - start) as f64;
        let average_rank = (start + end + 1) as f64 / 2.0;
        let in_a = combined[start..end].iter().filter(|(_, in_a)| *in_a).count();
        rank_sum_a += average_rank * in_a as f64;
        tie_term += ties.powi(3) - ties;
        start = end;
    }

    let u1 = rank_sum_a - n1 * (n1 + 1.0) / 2.0;
    let u2 = n1 * n2 - u1;
    let mean = n1 * n2 / 2.0;
    let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

    let p_value = if variance <= 0.0 {
        1.0
    } else {
        let z = (u1.max(u2) - mean - 0.5) / variance.sqrt();
        let normal = Normal::new(0.0, 1.0).ok()?;
        (2.0 * normal.sf(z)).clamp(0.0, 1.0)
    };

    Some(TestResult {
        statistic: u1,
        p_value,
        dof: None,
    })
}

/// Chi-squared test of independence on an `r × c` contingency table.
///
/// Rows are the groups, columns the categories. Tables with a single degree
/// of freedom get Yates' continuity correction. A table with one column has
/// no degrees of freedom; it yields statistic 0 and p-value 1.
///
/// Returns `None` if the table is empty, ragged, or has a row or column that
/// sums to zero.
///
/// # Examples
///
/// ```
/// use loanscope_stats::hypothesis::chi_squared_independence;
///
/// let table = vec![vec![30, 10, 5], vec![10, 30, 25]];
/// let r = chi_squared_independence(&table).unwrap();
/// assert_eq!(r.dof, Some(2));
/// assert!(r.p_value < 0.01);
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn chi_squared_independence(table: &[Vec<u64>]) -> Option<TestResult> {
    let num_cols = table.first()?.len();
    if num_cols == 0 || table.iter().any(|row| row.len() != num_cols) {
        return None;
    }

    let row_sums = table
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect::<Vec<_>>();
    let col_sums = (0..num_cols)
        .map(|j| table.iter().map(|row| row[j]).sum::<u64>() as f64)
        .collect::<Vec<_>>();
    if row_sums.iter().chain(&col_sums).any(|&sum| sum <= 0.0) {
        return None;
    }
    let total = row_sums.iter().sum::<f64>();

    let dof = (table.len() - 1) * (num_cols - 1);
    if dof == 0 {
        return Some(TestResult {
            statistic: 0.0,
            p_value: 1.0,
            dof: Some(0),
        });
    }

    let mut statistic = 0.0;
    for (row, row_sum) in table.iter().zip(&row_sums) {
        for (&count, col_sum) in row.iter().zip(&col_sums) {
            let expected = row_sum * col_sum / total;
            let mut observed = count as f64;
            if dof == 1 {
                let diff = expected - observed;
                observed += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (observed - expected).powi(2) / expected;
        }
    }

    let distribution = ChiSquared::new(dof as f64).ok()?;
    Some(TestResult {
        statistic,
        p_value: distribution.sf(statistic).clamp(0.0, 1.0),
        dof: Some(dof),
    })
}
