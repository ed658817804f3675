/// Errors raised while building or querying a feature comparison.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("Column '{column}' not found in dataset")]
    MissingColumn { column: String },
    #[display("Column '{column}' has {found} rows, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
    #[display("Outcome column '{column}' must have exactly two distinct values, found {found}")]
    InvalidData { column: String, found: usize },
    #[display("Outcome group '{group}' has no rows in '{column}'")]
    InsufficientData { column: String, group: String },
    #[display("Cannot classify bucket label '{label}': expected [a,b], (a,b], [a,b) or (a,b)")]
    Classification { label: String },
    #[display("Unknown transform prefix '{prefix}': expected '', 'l' or 'b'")]
    UnknownTransform { prefix: String },
    #[display("Column '{column}' has non-numeric value '{value}'")]
    NonNumeric { column: String, value: String },
    #[display("Invalid bucket '{label}': {reason}")]
    InvalidBucket { label: String, reason: String },
}
