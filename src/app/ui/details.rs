use eframe::egui::{self, RichText, Ui};

use crate::diagram::NodeKind;
use crate::format::{format_percent, format_value};
use crate::table::{DataTable, RowToken};

use super::super::{Selection, ViewModel};

/// One line per row: category path followed by every measure.
fn row_summary(table: &DataTable, token: RowToken) -> String {
    let row = token.0;
    let path = (0..table.level_count())
        .filter_map(|level| table.category(level, row))
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" / ");
    let measures = table
        .measures
        .iter()
        .map(|measure| format!("{}={}", measure.name, measure.value(row)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("#{row}  {path}  [{measures}]")
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected) = self.selected else {
            ui.label("Select a node or a legend entry.");
            return;
        };
        let Some(session) = self.handle.and_then(|handle| self.slot.get(handle)) else {
            ui.label("No diagram is available.");
            return;
        };
        let diagram = session.diagram();
        let labels = &self.settings.labels;

        match selected {
            Selection::Node(id) => {
                let Some(node) = diagram.node(id) else {
                    ui.label("Selected node no longer exists in the diagram.");
                    return;
                };
                let value = match node.kind {
                    NodeKind::Root => diagram.root_label_value.unwrap_or(node.aggregate_value),
                    _ => node.aggregate_value,
                };

                ui.label(RichText::new(node.display_name.as_str()).strong());
                let path = node
                    .key
                    .components()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" / ");
                if !path.is_empty() {
                    ui.small(path);
                }
                ui.add_space(6.0);

                let kind = match node.kind {
                    NodeKind::Root => "root".to_owned(),
                    NodeKind::Category => format!("category, level {}", node.level),
                    NodeKind::Stage { stage, .. } => format!("measure stage {}", stage + 1),
                };
                ui.label(format!("Kind: {kind}"));
                ui.label(format!(
                    "Value: {}",
                    format_value(value, labels.display_units, labels.decimal_places)
                ));
                if !node.is_root() {
                    ui.label(format!(
                        "Share of parent: {}",
                        format_percent(node.percentage_of_parent, labels.decimal_places)
                    ));
                    if let Some(parent) = diagram.parent_of(id) {
                        ui.label(format!("Parent: {}", parent.display_name));
                    }
                }
                ui.label(format!("Children: {}", diagram.children_of(id).count()));
            }
            Selection::Legend(index) => {
                let Some(entry) = diagram.legend.get(index) else {
                    ui.label("Selected legend entry no longer exists.");
                    return;
                };
                ui.label(RichText::new(entry.category.to_string()).strong());
                ui.small("legend category");
            }
        }

        let rows = self.selected_rows().unwrap_or_default().to_vec();
        ui.separator();
        ui.label(RichText::new(format!("Selected rows ({})", rows.len())).strong());
        if rows.is_empty() {
            ui.label("No rows contribute to this selection.");
            return;
        }

        let row_count = rows.len().min(self.row_rows_visible);
        let mut should_load_more = false;
        egui::ScrollArea::vertical()
            .id_salt("selected_rows_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 20.0, row_count, |ui, row_range| {
                if row_range.end + Self::ROWS_PREFETCH_MARGIN >= row_count {
                    should_load_more = true;
                }
                for index in row_range {
                    if let Some(token) = rows.get(index) {
                        ui.monospace(row_summary(&self.table, *token));
                    }
                }
            });

        if should_load_more && row_count < rows.len() {
            self.row_rows_visible = (self.row_rows_visible + Self::ROWS_PAGE).min(rows.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;

    #[test]
    fn row_summary_lists_path_and_measures() {
        let table = parse_table(
            r#"{
                "category_names": ["region", "country"],
                "measures": [{"name": "sales"}],
                "rows": [["Europe", "France", 3], ["Asia", null, 4]]
            }"#,
        )
        .unwrap();

        assert_eq!(row_summary(&table, RowToken(0)), "#0  Europe / France  [sales=3]");
        assert_eq!(row_summary(&table, RowToken(1)), "#1  Asia / null  [sales=4]");
    }
}
