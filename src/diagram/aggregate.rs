use crate::table::DataTable;

use super::HierarchicalKey;

/// Sums one measure over the rows under a key.
///
/// Every call rescans the table, so building costs rows x levels per node. Fine for
/// the hundreds-to-thousands of rows a single panel holds.
#[derive(Clone, Copy)]
pub struct AggregateEvaluator<'a> {
    table: &'a DataTable,
    measure: usize,
}

impl<'a> AggregateEvaluator<'a> {
    pub fn new(table: &'a DataTable, measure: usize) -> Self {
        Self { table, measure }
    }

    pub fn total(&self) -> f64 {
        self.sum(&HierarchicalKey::root())
    }

    pub fn sum(&self, key: &HierarchicalKey) -> f64 {
        let Some(column) = self.table.measures.get(self.measure) else {
            return 0.0;
        };

        (0..self.table.row_count())
            .filter(|&row| key.matches_row(self.table, row))
            .map(|row| column.value(row))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{CategoryColumn, MeasureCell, MeasureColumn, MeasureRole};

    #[test]
    fn sums_matching_rows_and_coerces_bad_cells() {
        let table = DataTable::new(
            vec![CategoryColumn {
                name: "region".into(),
                values: vec!["US".into(), "US".into(), "EU".into(), "US".into()],
            }],
            vec![MeasureColumn {
                name: "sales".into(),
                role: MeasureRole::FlowStage,
                values: vec![
                    10.0.into(),
                    MeasureCell::Text("20".into()),
                    5.0.into(),
                    MeasureCell::Null,
                ],
            }],
        );

        let sales = AggregateEvaluator::new(&table, 0);
        assert_eq!(sales.total(), 35.0);
        assert_eq!(sales.sum(&HierarchicalKey::root().child("US".into())), 30.0);
        assert_eq!(sales.sum(&HierarchicalKey::root().child("EU".into())), 5.0);
        assert_eq!(sales.sum(&HierarchicalKey::root().child("APAC".into())), 0.0);
        assert_eq!(AggregateEvaluator::new(&table, 3).total(), 0.0);
    }
}
