//! Natural ordering for category and bucket labels
//!
//! Labels are compared after stripping interval brackets, as sequences of
//! digit runs and non-digit runs. Digit runs compare as integers, so `[2,9]`
//! sorts before `[10,99]`.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

impl PartialEq for Chunk<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Chunk<'_> {}

impl Ord for Chunk<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Number(a), Chunk::Number(b)) => cmp_digits(a, b),
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Chunk<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two digit strings by numeric value without parsing them.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn is_bracket(c: char) -> bool {
    matches!(c, '[' | ']' | '(' | ')')
}

fn chunks(label: &str) -> Vec<Chunk<'_>> {
    let mut chunks = vec![];
    for part in label.split(is_bracket).filter(|p| !p.is_empty()) {
        let mut start = 0;
        let mut in_digits = None;
        for (idx, c) in part.char_indices() {
            let digit = c.is_ascii_digit();
            if in_digits.is_some_and(|d| d != digit) {
                chunks.push(make_chunk(&part[start..idx], !digit));
                start = idx;
            }
            in_digits = Some(digit);
        }
        if let Some(digit) = in_digits {
            chunks.push(make_chunk(&part[start..], digit));
        }
    }
    chunks
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Number(s)
    } else {
        Chunk::Text(s)
    }
}

/// Natural comparison of two labels.
///
/// Ties under the natural key fall back to plain string order so the
/// ordering stays total.
///
/// ```
/// use std::cmp::Ordering;
/// use loanscope_analysis::natsort::natural_cmp;
///
/// assert_eq!(natural_cmp("[2,9]", "[10,99]"), Ordering::Less);
/// assert_eq!(natural_cmp("grade 10", "grade 9"), Ordering::Greater);
/// ```
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b)).then_with(|| a.cmp(b))
}
