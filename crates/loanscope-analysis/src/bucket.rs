//! Bucket specifications and their normalization
//!
//! A bucket specification maps display labels to entries describing which
//! feature values belong to the bucket. Callers write entries in a compact
//! form and [`Buckets::normalize`] rewrites them into explicit intervals (for
//! numeric features) or category sets (for categorical features).
//!
//! # Entry forms
//!
//! | JSON value        | entry                          | normalized (numeric)   |
//! |-------------------|--------------------------------|------------------------|
//! | `3` or `"3"`      | [`BucketEntry::Scalar`]        | `[3,3]`                |
//! | `[0, 2.5]`        | [`BucketEntry::Range`]         | label kept, `[0, 2.5]` |
//! | `["min", 10]`     | [`BucketEntry::Range`]         | `min` resolved         |
//! | `"5+"`            | [`BucketEntry::OpenEnded`]     | `(5,max]`              |
//! | `"5+="`, `"5=+"`  | [`BucketEntry::OpenEnded`]     | `[5,max]`              |
//! | `["OWN", "RENT"]` | [`BucketEntry::CategoryList`]  | categorical only       |
//!
//! Range labels carry their own inclusion type through their brackets, see
//! [`Inclusion::classify`].
//!
//! # Overlaps
//!
//! Buckets may overlap. A value matching several buckets takes the label of
//! the *last* matching bucket in specification order.

use std::fmt;

use loanscope_stats::quantile::Quantiles;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};

use crate::{dataset::Scalar, error::AnalysisError};

/// One end of a range entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Value(f64),
    /// The observed minimum of the feature.
    Min,
    /// The observed maximum of the feature.
    Max,
}

impl Bound {
    fn from_scalar(value: &Scalar) -> Option<Self> {
        match value {
            Scalar::Text(s) if s == "min" => Some(Bound::Min),
            Scalar::Text(s) if s == "max" => Some(Bound::Max),
            Scalar::Text(_) => None,
            other => other.as_f64().map(Bound::Value),
        }
    }

    fn resolve(self, min: f64, max: f64) -> f64 {
        match self {
            Bound::Value(v) => v,
            Bound::Min => min,
            Bound::Max => max,
        }
    }

    fn to_scalar(self) -> Scalar {
        match self {
            Bound::Value(v) => Scalar::Float(v),
            Bound::Min => Scalar::Text("min".to_owned()),
            Bound::Max => Scalar::Text("max".to_owned()),
        }
    }
}

/// A caller-written bucket entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawBucketEntry")]
pub enum BucketEntry {
    /// A single integer value, `[v,v]`.
    Scalar(i64),
    /// A `[lower, upper]` pair; the label decides inclusion.
    Range([Bound; 2]),
    /// Raw category values.
    CategoryList(Vec<Scalar>),
    /// From `lower` up to the observed maximum.
    OpenEnded { lower: i64, inclusive: bool },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBucketEntry {
    Int(i64),
    Text(String),
    List(Vec<Scalar>),
}

impl TryFrom<RawBucketEntry> for BucketEntry {
    type Error = String;

    fn try_from(raw: RawBucketEntry) -> Result<Self, Self::Error> {
        match raw {
            RawBucketEntry::Int(v) => Ok(BucketEntry::Scalar(v)),
            RawBucketEntry::Text(s) => Ok(BucketEntry::parse_keyword(&s)
                .unwrap_or_else(|| BucketEntry::CategoryList(vec![Scalar::Text(s)]))),
            RawBucketEntry::List(values) => Ok(BucketEntry::from_list(values)),
        }
    }
}

impl BucketEntry {
    /// Parses the string shorthands `"<int>"`, `"<int>+"`, `"<int>+="` and `"<int>=+"`.
    ///
    /// ```
    /// use loanscope_analysis::bucket::BucketEntry;
    ///
    /// assert_eq!(BucketEntry::parse_keyword("7"), Some(BucketEntry::Scalar(7)));
    /// assert_eq!(
    ///     BucketEntry::parse_keyword("2+="),
    ///     Some(BucketEntry::OpenEnded { lower: 2, inclusive: true })
    /// );
    /// assert_eq!(BucketEntry::parse_keyword("RENT"), None);
    /// ```
    #[must_use]
    pub fn parse_keyword(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(number) = s
            .strip_suffix("+=")
            .or_else(|| s.strip_suffix("=+"))
        {
            return number.parse().ok().map(|lower| BucketEntry::OpenEnded {
                lower,
                inclusive: true,
            });
        }
        if let Some(number) = s.strip_suffix('+') {
            return number.parse().ok().map(|lower| BucketEntry::OpenEnded {
                lower,
                inclusive: false,
            });
        }
        s.parse().ok().map(BucketEntry::Scalar)
    }

    /// A two-element list of numbers or `"min"`/`"max"` is a range, anything
    /// else a category list.
    #[must_use]
    pub fn from_list(values: Vec<Scalar>) -> Self {
        if let [lower, upper] = values.as_slice() {
            if let (Some(lower), Some(upper)) = (Bound::from_scalar(lower), Bound::from_scalar(upper))
            {
                return BucketEntry::Range([lower, upper]);
            }
        }
        BucketEntry::CategoryList(values)
    }
}

/// An insertion-ordered bucket specification.
///
/// Inserting an existing label replaces its entry in place, like a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketSpec {
    entries: Vec<(String, BucketEntry)>,
}

impl BucketSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, entry: BucketEntry) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((label, entry)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BucketEntry)> + '_ {
        self.entries.iter().map(|(l, e)| (l.as_str(), e))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Equal-depth specification: `num` buckets cut at the quantiles `k / num`.
    ///
    /// Every bucket is right-open except the last, which is closed, so the
    /// buckets partition `[min, max]` of `values` without gaps. Intervals whose
    /// formatted labels coincide are merged into one bucket spanning all of
    /// them, so no value is left without a bucket.
    ///
    /// ```
    /// use loanscope_analysis::bucket::{BoundFormat, BucketSpec};
    ///
    /// let spec = BucketSpec::quantiles(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, BoundFormat::Integer).unwrap();
    /// let labels = spec.iter().map(|(label, _)| label).collect::<Vec<_>>();
    /// assert_eq!(labels, vec!["[1,3)", "[3,5]"]);
    /// ```
    pub fn quantiles(
        values: &[f64],
        num: usize,
        format: BoundFormat,
    ) -> Result<Self, AnalysisError> {
        if num == 0 {
            return Err(AnalysisError::InvalidBucket {
                label: "quantiles".to_owned(),
                reason: "quantile count must be positive".to_owned(),
            });
        }
        if values.is_empty() {
            return Err(AnalysisError::InvalidBucket {
                label: "quantiles".to_owned(),
                reason: "feature has no values".to_owned(),
            });
        }

        let bounds = Quantiles::evenly_spaced(values, num)
            .iter()
            .map(|(_, v)| v)
            .collect::<Vec<_>>();
        let mut intervals: Vec<(String, f64, f64)> = vec![];
        for (idx, pair) in bounds.windows(2).enumerate() {
            let (lower, upper) = (pair[0], pair[1]);
            let close = if idx + 1 == num { ']' } else { ')' };
            let label = format!("[{},{}{close}", format.apply(lower), format.apply(upper));
            match intervals.iter_mut().find(|(l, _, _)| *l == label) {
                Some((_, merged_lower, merged_upper)) => {
                    *merged_lower = merged_lower.min(lower);
                    *merged_upper = merged_upper.max(upper);
                }
                None => intervals.push((label, lower, upper)),
            }
        }
        Ok(intervals
            .into_iter()
            .map(|(label, lower, upper)| {
                (
                    label,
                    BucketEntry::Range([Bound::Value(lower), Bound::Value(upper)]),
                )
            })
            .collect())
    }
}

impl<L> FromIterator<(L, BucketEntry)> for BucketSpec
where
    L: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, BucketEntry)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (label, entry) in iter {
            spec.insert(label, entry);
        }
        spec
    }
}

impl<'de> Deserialize<'de> for BucketSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = BucketSpec;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from bucket label to bucket entry")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut spec = BucketSpec::new();
                while let Some((label, entry)) = map.next_entry::<String, BucketEntry>()? {
                    spec.insert(label, entry);
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}

/// How generated labels print their bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundFormat {
    /// Two decimals, `1.50`.
    #[default]
    Fixed2,
    /// Rounded to an integer, `2`.
    Integer,
}

impl BoundFormat {
    #[must_use]
    pub fn apply(self, value: f64) -> String {
        match self {
            BoundFormat::Fixed2 => format!("{value:.2}"),
            BoundFormat::Integer => format!("{value:.0}"),
        }
    }
}

/// Which ends of an interval are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    /// `[a,b]`
    Closed,
    /// `(a,b]`
    LeftOpen,
    /// `[a,b)`
    RightOpen,
    /// `(a,b)`
    Open,
}

impl Inclusion {
    /// Reads the inclusion type from a label's surrounding brackets.
    ///
    /// ```
    /// use loanscope_analysis::bucket::Inclusion;
    ///
    /// assert_eq!(Inclusion::classify("(1,5]").unwrap(), Inclusion::LeftOpen);
    /// assert!(Inclusion::classify("1-5").is_err());
    /// ```
    pub fn classify(label: &str) -> Result<Self, AnalysisError> {
        let label = label.trim();
        match (label.chars().next(), label.chars().next_back()) {
            (Some('['), Some(']')) => Ok(Inclusion::Closed),
            (Some('('), Some(']')) => Ok(Inclusion::LeftOpen),
            (Some('['), Some(')')) => Ok(Inclusion::RightOpen),
            (Some('('), Some(')')) => Ok(Inclusion::Open),
            _ => Err(AnalysisError::Classification {
                label: label.to_owned(),
            }),
        }
    }
}

/// A numeric interval with explicit inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
    pub inclusion: Inclusion,
}

impl Interval {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match self.inclusion {
            Inclusion::Closed => self.lower <= value && value <= self.upper,
            Inclusion::LeftOpen => self.lower < value && value <= self.upper,
            Inclusion::RightOpen => self.lower <= value && value < self.upper,
            Inclusion::Open => self.lower < value && value < self.upper,
        }
    }
}

/// A normalized bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum Bucket {
    Interval(Interval),
    Categories(Vec<Scalar>),
}

impl Bucket {
    #[must_use]
    pub fn contains(&self, value: &Scalar) -> bool {
        match self {
            Bucket::Interval(interval) => value.as_f64().is_some_and(|v| interval.contains(v)),
            Bucket::Categories(values) => values.contains(value),
        }
    }
}

/// Feature domain the buckets are normalized against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Numeric feature with its observed range.
    Numeric { min: f64, max: f64 },
    Categorical,
}

/// Normalized, insertion-ordered buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    entries: Vec<(String, Bucket)>,
}

impl Buckets {
    /// Rewrites a specification into explicit buckets.
    ///
    /// For a numeric domain shorthand entries get generated labels and bounds
    /// resolved against the observed range; range entries keep the caller's
    /// label, which must classify. For a categorical domain entries become
    /// category sets and labels are kept.
    ///
    /// ```
    /// use loanscope_analysis::bucket::{BoundFormat, BucketEntry, BucketSpec, Buckets, Domain};
    ///
    /// let spec = BucketSpec::from_iter([
    ///     ("0", BucketEntry::Scalar(0)),
    ///     ("1+", BucketEntry::OpenEnded { lower: 1, inclusive: false }),
    /// ]);
    /// let buckets = Buckets::normalize(
    ///     &spec,
    ///     Domain::Numeric { min: 0.0, max: 5.0 },
    ///     BoundFormat::Integer,
    /// )
    /// .unwrap();
    /// assert_eq!(buckets.labels().collect::<Vec<_>>(), vec!["[0,0]", "(1,5]"]);
    /// ```
    pub fn normalize(
        spec: &BucketSpec,
        domain: Domain,
        format: BoundFormat,
    ) -> Result<Self, AnalysisError> {
        let mut buckets = Self::default();
        for (label, entry) in spec.iter() {
            let (label, bucket) = match domain {
                Domain::Numeric { min, max } => normalize_numeric(label, entry, min, max, format)?,
                Domain::Categorical => normalize_categorical(label, entry)?,
            };
            buckets.insert(label, bucket);
        }
        Ok(buckets)
    }

    /// One category bucket per distinct value, labelled by the value itself.
    pub fn identity<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Scalar>,
    {
        let mut buckets = Self::default();
        for value in values {
            let label = value.to_string();
            if !buckets.entries.iter().any(|(l, _)| *l == label) {
                buckets.insert(label, Bucket::Categories(vec![value.clone()]));
            }
        }
        buckets
    }

    fn insert(&mut self, label: String, bucket: Bucket) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = bucket,
            None => self.entries.push((label, bucket)),
        }
    }

    /// Label of the last bucket containing `value`.
    #[must_use]
    pub fn assign(&self, value: &Scalar) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(_, bucket)| bucket.contains(value))
            .map(|(label, _)| label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bucket)> + '_ {
        self.entries.iter().map(|(l, b)| (l.as_str(), b))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[expect(clippy::cast_precision_loss)]
fn normalize_numeric(
    label: &str,
    entry: &BucketEntry,
    min: f64,
    max: f64,
    format: BoundFormat,
) -> Result<(String, Bucket), AnalysisError> {
    let (label, lower, upper) = match entry {
        BucketEntry::Scalar(v) => (format!("[{v},{v}]"), *v as f64, *v as f64),
        // `"N+"` excludes N itself; only `"N+="` / `"N=+"` include it.
        BucketEntry::OpenEnded { lower, inclusive } => {
            let open = if *inclusive { '[' } else { '(' };
            let label = format!("{open}{lower},{}]", format.apply(max));
            (label, *lower as f64, max)
        }
        BucketEntry::Range([lower_bound, upper_bound]) => {
            let lower = lower_bound.resolve(min, max);
            let upper = upper_bound.resolve(min, max);
            let upper_text = match upper_bound {
                Bound::Max => format.apply(max),
                _ => upper.to_string(),
            };
            let label = match BucketEntry::parse_keyword(label) {
                Some(BucketEntry::OpenEnded {
                    inclusive: false, ..
                }) => format!("({lower},{upper_text}]"),
                Some(_) => format!("[{lower},{upper_text}]"),
                None => label.to_owned(),
            };
            (label, lower, upper)
        }
        BucketEntry::CategoryList(_) => {
            return Err(AnalysisError::InvalidBucket {
                label: label.to_owned(),
                reason: "numeric buckets need an integer, a [lower, upper] pair or an 'N+' keyword"
                    .to_owned(),
            });
        }
    };
    let inclusion = Inclusion::classify(&label)?;
    Ok((
        label,
        Bucket::Interval(Interval {
            lower,
            upper,
            inclusion,
        }),
    ))
}

fn normalize_categorical(
    label: &str,
    entry: &BucketEntry,
) -> Result<(String, Bucket), AnalysisError> {
    let values = match entry {
        BucketEntry::Scalar(v) => vec![Scalar::Int(*v)],
        BucketEntry::Range(bounds) => bounds.iter().map(|b| b.to_scalar()).collect(),
        BucketEntry::CategoryList(values) => values.clone(),
        BucketEntry::OpenEnded { .. } => {
            return Err(AnalysisError::InvalidBucket {
                label: label.to_owned(),
                reason: "open-ended ranges need a numeric feature".to_owned(),
            });
        }
    };
    Ok((label.to_owned(), Bucket::Categories(values)))
}
