use std::collections::HashSet;

use crate::table::{CategoryValue, DataTable};

use super::HierarchicalKey;

/// Distinct values at `level` in first-seen row order, restricted to rows under `prefix`.
pub fn distinct_values(
    table: &DataTable,
    level: usize,
    prefix: Option<&HierarchicalKey>,
) -> Vec<CategoryValue> {
    let Some(column) = table.categories.get(level) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for (row, value) in column.values.iter().enumerate() {
        if let Some(prefix) = prefix
            && !prefix.matches_row(table, row)
        {
            continue;
        }
        if seen.insert(value) {
            values.push(value.clone());
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CategoryColumn;

    fn regions() -> DataTable {
        DataTable::new(
            vec![
                CategoryColumn {
                    name: "region".into(),
                    values: vec!["US".into(), "EU".into(), "US".into(), CategoryValue::Null],
                },
                CategoryColumn {
                    name: "city".into(),
                    values: vec![
                        "Boston".into(),
                        "Paris".into(),
                        "Austin".into(),
                        "Boston".into(),
                    ],
                },
            ],
            Vec::new(),
        )
    }

    #[test]
    fn root_scan_keeps_first_seen_order() {
        let values = distinct_values(&regions(), 0, None);
        assert_eq!(
            values,
            vec!["US".into(), "EU".into(), CategoryValue::Null]
        );
    }

    #[test]
    fn prefix_restricts_rows() {
        let table = regions();
        let us = HierarchicalKey::root().child("US".into());
        assert_eq!(
            distinct_values(&table, 1, Some(&us)),
            vec![CategoryValue::from("Boston"), "Austin".into()]
        );

        let unknown = HierarchicalKey::root().child("APAC".into());
        assert!(distinct_values(&table, 1, Some(&unknown)).is_empty());
    }

    #[test]
    fn missing_level_is_empty() {
        assert!(distinct_values(&regions(), 5, None).is_empty());
    }
}
