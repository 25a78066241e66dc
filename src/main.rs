mod window;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use windshell::{RendererConfig, WindField};
use winit::event_loop::{ControlFlow, EventLoop};

/// Grid used when no wind file is given: one-degree global coverage.
const FALLBACK_GRID: (u32, u32) = (360, 181);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("windshell=info")),
        )
        .init();

    tracing::info!("windshell v{} starting", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let wind_path = args.next();
    let config_path = args.next();

    let field = match &wind_path {
        Some(path) => match WindField::load_json(path) {
            Ok(field) => field,
            Err(e) => {
                tracing::error!("Failed to load wind field from {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            tracing::info!("No wind file given, using synthetic prevailing winds");
            match WindField::prevailing(FALLBACK_GRID.0, FALLBACK_GRID.1) {
                Ok(field) => field,
                Err(e) => {
                    tracing::error!("Failed to build fallback field: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let config = match &config_path {
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|s| RendererConfig::from_json_str(&s).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load config from {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => RendererConfig::default(),
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            tracing::error!("Failed to create event loop: {e}");
            return ExitCode::FAILURE;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = window::App::new(field, config);
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {e}");
        return ExitCode::FAILURE;
    }
    if app.failed() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
