use std::fmt;

use thiserror::Error;

pub const PRECONDITION_ADVISORY: &str =
    "Add at least one category field and one measure field with matching row counts to draw the flow.";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PreconditionFailure {
    #[error("no categorical column was provided")]
    MissingCategories,
    #[error("no measure column was provided")]
    MissingMeasures,
    #[error("column `{column}` has {found} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Precondition(#[from] PreconditionFailure),
    #[error("diagram build failed: {0}")]
    Failure(String),
}

impl BuildError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Text the host shows in its banner.
    pub fn advisory(&self) -> String {
        match self {
            Self::Precondition(_) => PRECONDITION_ADVISORY.to_owned(),
            Self::Failure(message) => message.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    NullCategory,
    NullMeasure,
    NonNumericMeasure,
}

impl WarningKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::NullCategory => "null category value",
            Self::NullMeasure => "null measure value",
            Self::NonNumericMeasure => "non-numeric measure value",
        }
    }
}

/// Raised for data that is tolerated but probably not what the author meant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataQualityWarning {
    pub column: String,
    pub kind: WarningKind,
    pub first_row: usize,
    pub count: usize,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in `{}` ({} row(s), first at row {})",
            self.kind.label(),
            self.column,
            self.count,
            self.first_row
        )
    }
}
