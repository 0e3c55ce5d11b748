use eframe::egui::{self, Color32, RichText, Sense, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::diagram::{FlowDiagram, NodeId};
use crate::format::DisplayUnits;
use crate::settings::LabelStyle;

use super::super::{Selection, ViewModel};

const SEARCH_RESULT_LIMIT: usize = 24;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Nodes whose name or category path matches `query`, best first.
fn search_nodes(diagram: &FlowDiagram, query: &str) -> Vec<(NodeId, String)> {
    let matcher = SkimMatcherV2::default();
    let mut matches = diagram
        .nodes
        .iter()
        .filter_map(|node| {
            let path = node
                .key
                .components()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" / ");
            let score = fuzzy_match_score(&matcher, &node.display_name, query)
                .max(fuzzy_match_score(&matcher, &path, query))?;
            let text = if path.is_empty() || path == node.display_name {
                node.display_name.clone()
            } else {
                format!("{}  ({path})", node.display_name)
            };
            Some((score, node.id, text))
        })
        .collect::<Vec<_>>();
    matches.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    matches
        .into_iter()
        .take(SEARCH_RESULT_LIMIT)
        .map(|(_, id, text)| (id, text))
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Diagram");
        ui.add_space(4.0);

        let mut changed = false;
        let labels = &mut self.settings.labels;

        changed |= ui.checkbox(&mut labels.show, "Show labels").changed();

        egui::ComboBox::from_label("Label style")
            .selected_text(labels.style.label())
            .show_ui(ui, |ui| {
                for style in LabelStyle::ALL {
                    changed |= ui
                        .selectable_value(&mut labels.style, style, style.label())
                        .changed();
                }
            });

        egui::ComboBox::from_label("Display units")
            .selected_text(labels.display_units.label())
            .show_ui(ui, |ui| {
                for units in DisplayUnits::ALL {
                    changed |= ui
                        .selectable_value(&mut labels.display_units, units, units.label())
                        .changed();
                }
            });

        changed |= ui
            .add(egui::Slider::new(&mut labels.font_size, 8.0..=24.0).text("Font size"))
            .drag_stopped();

        ui.separator();
        ui.label(RichText::new("Layout").strong());
        ui.checkbox(&mut self.live_layout, "Live simulation")
            .on_hover_text("Advance the force layout every frame.");

        let layout = &mut self.settings.layout;
        changed |= ui
            .add(egui::Slider::new(&mut layout.link_distance, 20.0..=220.0).text("Link distance"))
            .drag_stopped();
        changed |= ui
            .add(egui::Slider::new(&mut layout.charge, -600.0..=-10.0).text("Charge"))
            .on_hover_text("How strongly nodes push away from each other.")
            .drag_stopped();

        if ui.button("Reheat").clicked()
            && let Some(session) = self.handle.and_then(|handle| self.slot.get_mut(handle))
        {
            session.restart();
        }

        if changed {
            self.rebuild();
        }

        ui.separator();
        self.draw_search(ui);

        if self.settings.legend.show {
            ui.separator();
            self.draw_legend(ui);
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Find node").strong());
        ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("fuzzy search"));

        let query = self.search.trim();
        if query.is_empty() {
            return;
        }
        let Some(diagram) = self
            .handle
            .and_then(|handle| self.slot.get(handle))
            .map(|session| session.diagram())
        else {
            return;
        };

        let results = search_nodes(diagram, query);
        if results.is_empty() {
            ui.label("No matching nodes.");
            return;
        }

        let mut focus = None;
        egui::ScrollArea::vertical()
            .id_salt("search_results")
            .max_height(220.0)
            .show(ui, |ui| {
                for (id, text) in &results {
                    if ui.link(text.as_str()).clicked() {
                        focus = Some(*id);
                    }
                }
            });

        if let Some(id) = focus {
            self.focus_node(id);
        }
    }

    fn draw_legend(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Legend").strong());
        let Some(diagram) = self
            .handle
            .and_then(|handle| self.slot.get(handle))
            .map(|session| session.diagram())
        else {
            return;
        };

        let mut clicked = None;
        for (index, entry) in diagram.legend.iter().enumerate() {
            let selected = self.selected == Some(Selection::Legend(index));
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                ui.painter().rect_filled(swatch, 2.0, entry.color);
                let text = format!("{}  ({} rows)", entry.category, entry.row_selection.len());
                let text = if selected {
                    RichText::new(text).color(Color32::from_rgb(245, 206, 93))
                } else {
                    RichText::new(text)
                };
                if ui.selectable_label(selected, text).clicked() {
                    clicked = Some(if selected { None } else { Some(index) });
                }
            });
        }

        if let Some(choice) = clicked {
            self.set_selected(choice.map(Selection::Legend));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::build_diagram;
    use crate::settings::Settings;
    use crate::table::parse_table;

    #[test]
    fn search_finds_nodes_by_name_and_path() {
        let table = parse_table(
            r#"{
                "categories": [
                    {"name": "region", "values": ["Europe", "Asia"]},
                    {"name": "country", "values": ["France", "Japan"]}
                ],
                "measures": [{"name": "sales", "values": [3, 4]}]
            }"#,
        )
        .unwrap();
        let diagram = build_diagram(&table, &Settings::default()).unwrap();

        let results = search_nodes(&diagram, "japan");
        assert!(!results.is_empty());
        let (id, text) = &results[0];
        assert_eq!(diagram.node(*id).unwrap().display_name, "Japan");
        assert!(text.contains("Asia / Japan"));

        assert!(search_nodes(&diagram, "zzzz").is_empty());
    }
}
