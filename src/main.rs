mod app;
mod ui;

use std::path::PathBuf;

use app::JgpLookupApp;
use clap::Parser;
use eframe::egui;
use jgp_lookup::config;
use jgp_lookup::data::loader::load_or_empty;
use jgp_lookup::data::schema::ColumnMapping;
use jgp_lookup::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "jgp-lookup", version, about = "Look up JGP participant records")]
struct Cli {
    /// Spreadsheet to load (.xlsx, .csv, .json or .parquet)
    #[arg(long, env = "JGP_DATA_PATH")]
    data: Option<PathBuf>,

    /// TOML file with `data_path` and a `[columns]` header mapping
    #[arg(long, env = "JGP_CONFIG")]
    config: Option<PathBuf>,
}

/// Load the dataset once. Never fails: problems become the startup error
/// shown in the window.
fn startup_state(cli: Cli) -> AppState {
    let config = match config::resolve(cli.config.as_deref(), cli.data.clone()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            let (dataset, _) = load_or_empty(cli.data.as_deref(), &ColumnMapping::default());
            return AppState::new(dataset, cli.data, Some(format!("{e:#}")));
        }
    };

    let (dataset, error) = load_or_empty(config.data_path.as_deref(), &config.columns);
    AppState::new(dataset, config.data_path, error.map(|e| e.to_string()))
}

fn main() -> eframe::Result {
    env_logger::init();

    let state = startup_state(Cli::parse());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "JGP Data Lookup",
        options,
        Box::new(|_cc| Ok(Box::new(JgpLookupApp::new(state)))),
    )
}
