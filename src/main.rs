use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hierflow::app::{FlowApp, Source};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON row table to draw.
    table: PathBuf,

    /// JSON settings snapshot (labels, root, legend, colors, layout).
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hierflow=info")),
        )
        .init();

    let args = Args::parse();
    let source = Source {
        table: args.table,
        settings: args.settings,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "hierflow",
        options,
        Box::new(move |cc| Ok(Box::new(FlowApp::new(cc, source)))),
    )
}
