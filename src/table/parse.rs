use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::{CategoryColumn, CategoryValue, DataTable, MeasureCell, MeasureColumn, MeasureRole};

#[derive(Debug, Deserialize)]
struct MeasureHeader {
    name: String,
    #[serde(default)]
    role: MeasureRole,
}

#[derive(Debug, Deserialize)]
struct RowDocument {
    category_names: Vec<String>,
    measures: Vec<MeasureHeader>,
    rows: Vec<Vec<Value>>,
}

pub fn load_table(path: &Path) -> Result<DataTable> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read table from {}", path.display()))?;
    parse_table(&raw).with_context(|| format!("failed to parse table {}", path.display()))
}

/// Accepts the columnar layout (`categories` / `measures` with `values`) or the
/// row layout (`category_names` / `measures` headers plus `rows`).
pub fn parse_table(raw: &str) -> Result<DataTable> {
    let parsed: Value = serde_json::from_str(raw).context("invalid table JSON")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("table JSON must be an object"))?;

    if object.contains_key("rows") {
        let document = RowDocument::deserialize(&parsed).context("invalid row table layout")?;
        return table_from_rows(document);
    }

    DataTable::deserialize(&parsed).context("invalid columnar table layout")
}

fn table_from_rows(document: RowDocument) -> Result<DataTable> {
    let width = document.category_names.len() + document.measures.len();
    let mut categories = document
        .category_names
        .into_iter()
        .map(|name| CategoryColumn {
            name,
            values: Vec::with_capacity(document.rows.len()),
        })
        .collect::<Vec<_>>();
    let mut measures = document
        .measures
        .into_iter()
        .map(|header| MeasureColumn {
            name: header.name,
            role: header.role,
            values: Vec::with_capacity(document.rows.len()),
        })
        .collect::<Vec<_>>();

    for (index, row) in document.rows.into_iter().enumerate() {
        if row.len() != width {
            return Err(anyhow!(
                "row {index} has {} cells, expected {width}",
                row.len()
            ));
        }

        let mut cells = row.into_iter();
        for column in &mut categories {
            let cell = cells.next().unwrap_or(Value::Null);
            let value = CategoryValue::deserialize(&cell)
                .with_context(|| format!("row {index}: invalid value for `{}`", column.name))?;
            column.values.push(value);
        }
        for column in &mut measures {
            let cell = cells.next().unwrap_or(Value::Null);
            let value = MeasureCell::deserialize(&cell)
                .with_context(|| format!("row {index}: invalid value for `{}`", column.name))?;
            column.values.push(value);
        }
    }

    Ok(DataTable::new(categories, measures))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_columnar_layout() {
        let table = parse_table(
            r#"{
                "categories": [{ "name": "Region", "values": ["US", null, 7] }],
                "measures": [
                    { "name": "Sales", "values": [10, "20", null] },
                    { "name": "Target", "role": "root_override", "values": [1, 2, 3] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.categories[0].values[1], CategoryValue::Null);
        assert_eq!(table.categories[0].values[2], CategoryValue::Number(7.0));
        assert_eq!(table.measures[0].value(1), 20.0);
        assert_eq!(table.measures[0].value(2), 0.0);
        assert_eq!(table.measures[1].role, MeasureRole::RootOverride);
    }

    #[test]
    fn parses_row_layout() {
        let table = parse_table(
            r#"{
                "category_names": ["Region", "City"],
                "measures": [{ "name": "Visits" }, { "name": "Orders" }],
                "rows": [["US", "Boston", 100, 40], ["EU", "Paris", 50, 10]]
            }"#,
        )
        .unwrap();

        assert_eq!(table.level_count(), 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.categories[1].values[1], CategoryValue::text("Paris"));
        assert_eq!(table.measures[1].value(0), 40.0);
        assert_eq!(table.flow_stage_measures(), vec![0, 1]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let error = parse_table(
            r#"{ "category_names": ["A"], "measures": [{ "name": "M" }], "rows": [["x"]] }"#,
        )
        .unwrap_err();
        assert!(error.to_string().contains("row 0"));
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(parse_table("[1, 2, 3]").is_err());
        assert!(parse_table("not json").is_err());
    }
}
