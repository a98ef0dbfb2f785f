//! Run outcome model
//!
//! Fatal conditions are `CustomizeError`s and stop the orchestrator.
//! Recoverable ones are `Warning`s collected alongside a successful run.

use serde::{Serialize, Serializer};
use std::path::PathBuf;
use thiserror::Error;

use super::identifier::PackageIdentifier;

/// Errors that abort a customization run
#[derive(Debug, Error)]
pub enum CustomizeError {
    #[error("Required configuration value {0} is not set")]
    MissingConfig(&'static str),

    #[error("No Android project found (searched: {})", display_paths(.searched))]
    ProjectNotFound { searched: Vec<PathBuf> },

    #[error("Manifest not found at {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Serialize for CustomizeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Recoverable problems reported with the final outcome
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Warning {
    #[error("{key} value '{value}' is not a hex color, using {fallback}")]
    InvalidColor {
        key: &'static str,
        value: String,
        fallback: String,
    },

    #[error("{role} not found at {}", path.display())]
    MissingFile { role: String, path: PathBuf },

    #[error("Could not update {}: {message}", path.display())]
    FileWrite { path: PathBuf, message: String },

    #[error("{field} not found in {} and has no insertion point", path.display())]
    FieldNotFound { path: PathBuf, field: String },

    #[error("{field} in {} is not a quoted literal, left unchanged", path.display())]
    NonLiteralField { path: PathBuf, field: String },

    #[error("Icon source {source_name} unavailable: {message}")]
    IconSource { source_name: String, message: String },

    #[error("Icon asset {} was not written: {message}", path.display())]
    IconAsset { path: PathBuf, message: String },

    #[error("Adaptive icon skipped: {0}")]
    AdaptiveIcon(String),

    #[error("{bucket} holds {actual} launcher icons, expected {expected}")]
    AssetCountMismatch {
        bucket: String,
        expected: usize,
        actual: usize,
    },

    #[error("Could not write build info: {0}")]
    BuildInfo(String),
}

impl Serialize for Warning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Orchestrator state; `Done` and `Failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ConfigLoaded,
    ProjectLocated,
    Patched,
    IconsApplied,
    Done,
    Failed,
}

/// What happened to one project file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub role: String,
    pub path: PathBuf,
    pub changed: bool,
    /// Per-field actions, e.g. `applicationId: replaced`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// Structured result of one customization run
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub state: Stage,
    /// Stage reached before a fatal error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<PackageIdentifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
    pub files: Vec<FileReport>,
    pub icon_assets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_source: Option<String>,
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<CustomizeError>,
}

impl Outcome {
    pub fn new() -> Self {
        Self {
            state: Stage::ConfigLoaded,
            failed_at: None,
            identifier: None,
            project_root: None,
            files: Vec::new(),
            icon_assets: 0,
            icon_source: None,
            warnings: Vec::new(),
            fatal: None,
        }
    }

    /// Move to the next state
    pub fn advance(&mut self, stage: Stage) {
        tracing::debug!("Customization stage: {:?} -> {:?}", self.state, stage);
        self.state = stage;
    }

    /// Record a fatal error and enter the terminal `Failed` state
    pub fn fail(mut self, error: CustomizeError) -> Self {
        tracing::error!("Customization failed during {:?}: {}", self.state, error);
        self.failed_at = Some(self.state);
        self.state = Stage::Failed;
        self.fatal = Some(error);
        self
    }

    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn is_success(&self) -> bool {
        self.fatal.is_none() && self.state == Stage::Done
    }

    /// Paths of files that were actually rewritten
    pub fn changed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.changed)
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self::new()
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
