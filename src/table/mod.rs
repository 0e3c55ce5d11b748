mod parse;

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{DataQualityWarning, PreconditionFailure, WarningKind};

pub use parse::{load_table, parse_table};

/// Opaque handle back to one source row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowToken(pub usize);

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CategoryValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl PartialEq for CategoryValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CategoryValue {}

impl Hash for CategoryValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(value) => value.hash(state),
            Self::Number(value) => value.to_bits().hash(state),
            Self::Text(value) => value.hash(state),
        }
    }
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for CategoryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeasureCell {
    Null,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl MeasureCell {
    /// Non-numeric and null cells count as zero.
    pub fn coerce(&self) -> f64 {
        match self {
            Self::Number(value) if value.is_finite() => *value,
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn quality_issue(&self) -> Option<WarningKind> {
        match self {
            Self::Null => Some(WarningKind::NullMeasure),
            Self::Number(value) if !value.is_finite() => Some(WarningKind::NonNumericMeasure),
            Self::Number(_) => None,
            Self::Bool(_) => Some(WarningKind::NonNumericMeasure),
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .is_err()
                .then_some(WarningKind::NonNumericMeasure),
        }
    }
}

impl From<f64> for MeasureCell {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureRole {
    #[default]
    FlowStage,
    RootOverride,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryColumn {
    pub name: String,
    #[serde(default)]
    pub values: Vec<CategoryValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasureColumn {
    pub name: String,
    #[serde(default)]
    pub role: MeasureRole,
    #[serde(default)]
    pub values: Vec<MeasureCell>,
}

impl MeasureColumn {
    pub fn value(&self, row: usize) -> f64 {
        self.values.get(row).map(MeasureCell::coerce).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DataTable {
    #[serde(default)]
    pub categories: Vec<CategoryColumn>,
    #[serde(default)]
    pub measures: Vec<MeasureColumn>,
}

impl DataTable {
    pub fn new(categories: Vec<CategoryColumn>, measures: Vec<MeasureColumn>) -> Self {
        Self {
            categories,
            measures,
        }
    }

    pub fn level_count(&self) -> usize {
        self.categories.len()
    }

    pub fn row_count(&self) -> usize {
        self.categories
            .first()
            .map(|column| column.values.len())
            .or_else(|| self.measures.first().map(|column| column.values.len()))
            .unwrap_or(0)
    }

    pub fn category(&self, level: usize, row: usize) -> Option<&CategoryValue> {
        self.categories.get(level)?.values.get(row)
    }

    pub fn row_tokens(&self) -> Vec<RowToken> {
        (0..self.row_count()).map(RowToken).collect()
    }

    pub fn primary_measure(&self) -> Option<usize> {
        self.measures
            .iter()
            .position(|measure| measure.role == MeasureRole::FlowStage)
            .or_else(|| (!self.measures.is_empty()).then_some(0))
    }

    pub fn flow_stage_measures(&self) -> Vec<usize> {
        self.measures
            .iter()
            .enumerate()
            .filter(|(_, measure)| measure.role == MeasureRole::FlowStage)
            .map(|(index, _)| index)
            .collect()
    }

    /// Only set when exactly one measure carries the root-override role.
    pub fn root_override_measure(&self) -> Option<usize> {
        let mut overrides = self
            .measures
            .iter()
            .enumerate()
            .filter(|(_, measure)| measure.role == MeasureRole::RootOverride)
            .map(|(index, _)| index);
        let first = overrides.next()?;
        overrides.next().is_none().then_some(first)
    }

    pub fn validate(&self) -> Result<Vec<DataQualityWarning>, PreconditionFailure> {
        if self.categories.is_empty() {
            return Err(PreconditionFailure::MissingCategories);
        }
        if self.measures.is_empty() {
            return Err(PreconditionFailure::MissingMeasures);
        }

        let expected = self.row_count();
        let lengths = self
            .categories
            .iter()
            .map(|column| (column.name.as_str(), column.values.len()))
            .chain(
                self.measures
                    .iter()
                    .map(|column| (column.name.as_str(), column.values.len())),
            );
        for (column, found) in lengths {
            if found != expected {
                return Err(PreconditionFailure::ColumnLengthMismatch {
                    column: column.to_owned(),
                    expected,
                    found,
                });
            }
        }

        let mut warnings = Vec::new();
        for column in &self.categories {
            collect_warnings(
                &column.name,
                column
                    .values
                    .iter()
                    .map(|value| value.is_null().then_some(WarningKind::NullCategory)),
                &mut warnings,
            );
        }
        for column in &self.measures {
            collect_warnings(
                &column.name,
                column.values.iter().map(MeasureCell::quality_issue),
                &mut warnings,
            );
        }

        Ok(warnings)
    }
}

fn collect_warnings(
    column: &str,
    issues: impl Iterator<Item = Option<WarningKind>>,
    warnings: &mut Vec<DataQualityWarning>,
) {
    let start = warnings.len();
    for (row, issue) in issues.enumerate() {
        let Some(kind) = issue else {
            continue;
        };

        if let Some(existing) = warnings[start..]
            .iter_mut()
            .find(|warning| warning.kind == kind)
        {
            existing.count += 1;
        } else {
            warnings.push(DataQualityWarning {
                column: column.to_owned(),
                kind,
                first_row: row,
                count: 1,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(categories: Vec<Vec<CategoryValue>>, measures: Vec<Vec<MeasureCell>>) -> DataTable {
        DataTable::new(
            categories
                .into_iter()
                .enumerate()
                .map(|(index, values)| CategoryColumn {
                    name: format!("level{index}"),
                    values,
                })
                .collect(),
            measures
                .into_iter()
                .enumerate()
                .map(|(index, values)| MeasureColumn {
                    name: format!("measure{index}"),
                    role: MeasureRole::FlowStage,
                    values,
                })
                .collect(),
        )
    }

    #[test]
    fn measure_cells_coerce_to_zero_when_not_numeric() {
        assert_eq!(MeasureCell::Number(4.5).coerce(), 4.5);
        assert_eq!(MeasureCell::Text(" 12 ".into()).coerce(), 12.0);
        assert_eq!(MeasureCell::Text("n/a".into()).coerce(), 0.0);
        assert_eq!(MeasureCell::Null.coerce(), 0.0);
        assert_eq!(MeasureCell::Bool(true).coerce(), 0.0);
        assert_eq!(MeasureCell::Number(f64::NAN).coerce(), 0.0);
    }

    #[test]
    fn validate_rejects_missing_columns() {
        let empty = DataTable::default();
        assert_eq!(empty.validate(), Err(PreconditionFailure::MissingCategories));

        let no_measures = table(vec![vec!["a".into()]], Vec::new());
        assert_eq!(
            no_measures.validate(),
            Err(PreconditionFailure::MissingMeasures)
        );
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let mismatched = table(
            vec![vec!["a".into(), "b".into()]],
            vec![vec![1.0.into()]],
        );
        assert_eq!(
            mismatched.validate(),
            Err(PreconditionFailure::ColumnLengthMismatch {
                column: "measure0".to_owned(),
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn validate_groups_warnings_per_column_and_kind() {
        let noisy = table(
            vec![vec!["a".into(), CategoryValue::Null, CategoryValue::Null]],
            vec![vec![1.0.into(), MeasureCell::Null, MeasureCell::Text("x".into())]],
        );
        let warnings = noisy.validate().unwrap();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].kind, WarningKind::NullCategory);
        assert_eq!(warnings[0].first_row, 1);
        assert_eq!(warnings[0].count, 2);
        assert_eq!(warnings[1].kind, WarningKind::NullMeasure);
        assert_eq!(warnings[2].kind, WarningKind::NonNumericMeasure);
        assert_eq!(warnings[2].first_row, 2);
    }

    #[test]
    fn category_equality_is_structural() {
        assert_eq!(CategoryValue::Number(1.0), CategoryValue::Number(1.0));
        assert_ne!(CategoryValue::Number(1.0), CategoryValue::text("1"));
        assert_ne!(CategoryValue::Null, CategoryValue::text("null"));
        assert_eq!(CategoryValue::Null.to_string(), "null");
        assert_eq!(CategoryValue::Number(3.0).to_string(), "3");
    }

    #[test]
    fn root_override_requires_exactly_one_column() {
        let mut data = table(
            vec![vec!["a".into()]],
            vec![vec![1.0.into()], vec![2.0.into()], vec![3.0.into()]],
        );
        assert_eq!(data.root_override_measure(), None);

        data.measures[2].role = MeasureRole::RootOverride;
        assert_eq!(data.root_override_measure(), Some(2));
        assert_eq!(data.primary_measure(), Some(0));
        assert_eq!(data.flow_stage_measures(), vec![0, 1]);

        data.measures[1].role = MeasureRole::RootOverride;
        assert_eq!(data.root_override_measure(), None);
    }
}
