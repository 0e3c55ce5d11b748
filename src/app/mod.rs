use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::Result;
use eframe::egui::{self, Context};
use tracing::{info, warn};

use crate::layout::{LabelPlacement, SessionSlot, TickHandle};
use crate::settings::Settings;
use crate::table::{DataTable, RowToken, load_table};

mod graph;
mod render_utils;
mod ui;

/// Files the window draws from.
#[derive(Clone, Debug)]
pub struct Source {
    pub table: PathBuf,
    pub settings: Option<PathBuf>,
}

struct Loaded {
    table: DataTable,
    settings: Settings,
}

type LoadResult = Result<Loaded, String>;

pub struct FlowApp {
    source: Source,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selection {
    Node(crate::diagram::NodeId),
    Legend(usize),
}

struct ViewModel {
    table: DataTable,
    settings: Settings,
    slot: SessionSlot,
    handle: Option<TickHandle>,
    advisory: Option<String>,
    labels: Vec<LabelPlacement>,
    selected: Option<Selection>,
    search: String,
    live_layout: bool,
    row_rows_visible: usize,
}

fn load_source(source: &Source) -> Result<Loaded> {
    let table = load_table(&source.table)?;
    let settings = match &source.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    info!(
        table = %source.table.display(),
        rows = table.row_count(),
        "inputs loaded"
    );
    Ok(Loaded { table, settings })
}

impl FlowApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: Source) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: Source) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_source(&source).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: Source) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(result: LoadResult) -> AppState {
        match result {
            Ok(loaded) => AppState::Ready(Box::new(ViewModel::new(loaded))),
            Err(error) => {
                warn!(%error, "failed to load inputs");
                AppState::Error(error)
            }
        }
    }
}

impl eframe::App for FlowApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => transition = Some(Self::ready(result)),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(AppState::Error(
                            "Background load worker disconnected".to_owned(),
                        ));
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading table...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the table");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.source.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(loaded)) => model.replace_inputs(loaded),
                        Ok(Err(error)) => transition = Some(Self::ready(Err(error))),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}

impl ViewModel {
    /// Rows the current selection stands for.
    fn selected_rows(&self) -> Option<&[RowToken]> {
        let diagram = self.slot.get(self.handle?)?.diagram();
        match self.selected? {
            Selection::Node(id) => diagram.node(id).map(|node| node.row_selection.as_slice()),
            Selection::Legend(index) => diagram
                .legend
                .get(index)
                .map(|entry| entry.row_selection.as_slice()),
        }
    }
}
