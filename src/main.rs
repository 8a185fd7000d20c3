mod app;
mod config;
mod export;
mod geometry;
mod interaction;
mod ocr;
mod overlay;
mod store;

use eframe::egui;
use std::path::PathBuf;

use crate::app::AnnotateApp;
use crate::config::AppConfig;

const USAGE: &str = "Usage: annotate-ocr [image.png|jpg] [--config <file.json>]";
const DEFAULT_CONFIG: &str = "annotate-ocr.json";

// ── Command line ────────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Args {
    image: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config needs a file name")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--help" | "-h" => return Err(USAGE.to_string()),
            flag if flag.starts_with('-') => return Err(format!("Unknown option: {flag}")),
            _ if parsed.image.is_some() => return Err(format!("Unexpected argument: {arg}")),
            _ => parsed.image = Some(PathBuf::from(arg)),
        }
    }
    Ok(parsed)
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> eframe::Result {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // RUST_LOG, when set, overrides the configured level.
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    log::debug!("config: {config:?}");

    let title = match &args.image {
        Some(path) => format!(
            "annotate-ocr — {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
        None => "annotate-ocr".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    let image = args.image;
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotateApp::new(config, image)))),
    )
}
