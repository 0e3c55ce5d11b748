use eframe::egui::{self, Align, Color32, Context, Layout, RichText};
use tracing::{info, warn};

use crate::diagram::NodeId;
use crate::layout::SessionSlot;

use super::super::{Loaded, Selection, Source, ViewModel};

impl ViewModel {
    pub(in crate::app) const INITIAL_ROWS: usize = 40;
    pub(in crate::app) const ROWS_PAGE: usize = 40;
    pub(in crate::app) const ROWS_PREFETCH_MARGIN: usize = 4;

    pub(in crate::app) fn new(loaded: Loaded) -> Self {
        let mut model = Self {
            table: loaded.table,
            settings: loaded.settings,
            slot: SessionSlot::new(),
            handle: None,
            advisory: None,
            labels: Vec::new(),
            selected: None,
            search: String::new(),
            live_layout: true,
            row_rows_visible: Self::INITIAL_ROWS,
        };
        model.rebuild();
        model
    }

    /// Swaps in freshly loaded inputs and rebuilds the diagram from them.
    pub(in crate::app) fn replace_inputs(&mut self, loaded: Loaded) {
        self.table = loaded.table;
        self.settings = loaded.settings;
        self.rebuild();
    }

    pub(in crate::app) fn rebuild(&mut self) {
        self.labels.clear();
        self.selected = None;
        self.row_rows_visible = Self::INITIAL_ROWS;

        match self.slot.rebuild(&self.table, &self.settings) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.advisory = None;
            }
            Err(error) => {
                if error.is_precondition() {
                    info!(%error, "diagram not drawn");
                } else {
                    warn!(%error, "diagram build failed");
                }
                self.handle = None;
                self.advisory = Some(error.advisory());
            }
        }
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<Selection>) {
        if self.selected == selected {
            return;
        }
        self.selected = selected;
        self.row_rows_visible = Self::INITIAL_ROWS;
    }

    /// Selects `id` and pans so it sits in the middle of the canvas.
    pub(in crate::app) fn focus_node(&mut self, id: NodeId) {
        self.set_selected(Some(Selection::Node(id)));
        let Some(session) = self.handle.and_then(|handle| self.slot.get_mut(handle)) else {
            return;
        };
        let Some(position) = session.simulation().position(id) else {
            return;
        };
        let viewport = session.viewport_mut();
        viewport.pan = -(position * viewport.zoom);
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &Source,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        let (node_count, warnings) = self
            .handle
            .and_then(|handle| self.slot.get(handle))
            .map(|session| {
                let diagram = session.diagram();
                (
                    diagram.nodes.len(),
                    diagram
                        .warnings
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                )
            })
            .unwrap_or_default();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("hierflow");
                    ui.separator();
                    ui.label(format!("table: {}", source.table.display()));
                    ui.label(format!("rows: {}", self.table.row_count()));
                    ui.label(format!("levels: {}", self.table.level_count()));
                    ui.label(format!("nodes: {node_count}"));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload table"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Rebuild diagram").clicked() {
                        self.rebuild();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button("Reset view").clicked()
                            && let Some(session) =
                                self.handle.and_then(|handle| self.slot.get_mut(handle))
                        {
                            *session.viewport_mut() = Default::default();
                        }
                    });
                });
            });

        if !warnings.is_empty() {
            egui::TopBottomPanel::bottom("warnings")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            RichText::new(format!("{} data warning(s):", warnings.len()))
                                .color(Color32::from_rgb(240, 190, 90)),
                        );
                        for warning in &warnings {
                            ui.label(warning);
                            ui.separator();
                        }
                    });
                });
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(380.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(advisory) = &self.advisory {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.label(
                        RichText::new(advisory.as_str())
                            .size(16.0)
                            .color(Color32::from_gray(210)),
                    );
                });
            } else {
                self.draw_graph(ui);
            }
        });
    }
}
