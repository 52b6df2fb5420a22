//! Run configuration
//!
//! Settings come from an optional TOML file; the CLI overrides individual
//! fields. Every field has a default so an empty file is valid.

use crate::candidate::TitleSet;
use crate::error::{BulkPrintError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Output locations created for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub csv_path: PathBuf,
    pub resume_dir: PathBuf,
}

/// Configuration of an explode run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplodeConfig {
    /// BulkPrint PDFs to process, in order
    pub inputs: Vec<PathBuf>,
    /// Directory receiving the CSV and the resume folder
    pub output_dir: PathBuf,
    /// Salutations recognized at the start of a name line
    pub titles: TitleSet,
    /// File name of the candidates table inside `output_dir`
    pub csv_file: String,
    /// Folder name for extracted resumes inside `output_dir`
    pub resume_dir: String,
    pub logging: LoggingConfig,
}

impl Default for ExplodeConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: PathBuf::from("output"),
            titles: TitleSet::default(),
            csv_file: "candidates.csv".to_string(),
            resume_dir: "resumes".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ExplodeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BulkPrintError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| BulkPrintError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ExplodeConfig =
            toml::from_str(content).map_err(|e| BulkPrintError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [("csv_file", &self.csv_file), ("resume_dir", &self.resume_dir)] {
            if value.trim().is_empty() {
                return Err(BulkPrintError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Fail with `InputNotFound` for the first configured input that is not a file
    pub fn validate_inputs(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(BulkPrintError::Config("no input documents given".to_string()));
        }
        match self.inputs.iter().find(|input| !input.is_file()) {
            Some(missing) => Err(BulkPrintError::InputNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    /// Paths the run writes to, without touching the filesystem
    pub fn layout(&self) -> OutputLayout {
        OutputLayout {
            root: self.output_dir.clone(),
            csv_path: self.output_dir.join(&self.csv_file),
            resume_dir: self.output_dir.join(&self.resume_dir),
        }
    }

    /// Create the output directory tree
    pub fn prepare_output(&self) -> Result<OutputLayout> {
        let layout = self.layout();
        fs::create_dir_all(&layout.resume_dir).map_err(|source| BulkPrintError::OutputSetup {
            path: layout.resume_dir.clone(),
            source,
        })?;
        Ok(layout)
    }
}
