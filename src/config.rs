use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ocr::{OcrEndpoint, OcrScope};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Scheme, host and port of the OCR service, without a path.
    pub base_url: String,
    pub endpoint: OcrEndpoint,
    pub scope: OcrScope,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            endpoint: OcrEndpoint::Ocr,
            scope: OcrScope::Composite,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: "exported-page.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    pub color: [u8; 4],
    pub thickness: f32,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            thickness: 2.0,
        }
    }
}

impl StrokeConfig {
    pub fn to_egui(self) -> egui::Stroke {
        let [r, g, b, a] = self.color;
        egui::Stroke::new(
            self.thickness,
            egui::Color32::from_rgba_unmultiplied(r, g, b, a),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ocr: OcrConfig,
    pub export: ExportConfig,
    pub stroke: StrokeConfig,
    pub log_level: LogLevel,
}

impl AppConfig {
    pub fn from_json(path: &Path, data: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`; a file that does not exist yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(data) => Self::from_json(path, &data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
