//! Customization orchestrator
//!
//! Runs one customization end to end:
//! `ConfigLoaded → ProjectLocated → Patched → IconsApplied → Done`,
//! or `Failed` on the first fatal error. The returned `Outcome` always
//! describes how far the run got.

use std::path::{Path, PathBuf};

use crate::core::{BuildConfig, BuildInfo, Outcome, PackageIdentifier, Stage, Warning};
use crate::icons::{self, IconSources};
use crate::patch;
use crate::project::Project;

/// Where to look for the template project
#[derive(Debug, Clone)]
pub struct ProjectLocation {
    /// Directory the candidate roots are relative to
    pub base_dir: PathBuf,
    /// Explicit root tried before the defaults
    pub project_dir: Option<PathBuf>,
}

impl ProjectLocation {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            project_dir: None,
        }
    }

    pub fn with_project_dir(mut self, dir: Option<impl AsRef<Path>>) -> Self {
        self.project_dir = dir.map(|d| d.as_ref().to_path_buf());
        self
    }
}

/// Customize the template project for `config`.
///
/// `config_warnings` are the recoverable problems found while building the
/// configuration; they are carried into the outcome.
pub async fn run(
    config: &BuildConfig,
    config_warnings: Vec<Warning>,
    location: &ProjectLocation,
    sources: &IconSources,
) -> Outcome {
    let mut outcome = Outcome::new();
    for warning in config_warnings {
        outcome.warn(warning);
    }
    tracing::info!("Customizing build {} for {}", config.build_id, config.host_name);

    let identifier = PackageIdentifier::derive(&config.host_name);
    tracing::info!("Package name: {}", identifier);
    outcome.identifier = Some(identifier.clone());

    let project = match Project::locate(&location.base_dir, location.project_dir.as_deref()) {
        Ok(project) => project,
        Err(e) => return outcome.fail(e),
    };
    outcome.project_root = Some(project.root().to_path_buf());
    outcome.advance(Stage::ProjectLocated);

    match patch::patch_project(&project, config, &identifier) {
        Ok(patched) => {
            outcome.files = patched.files;
            for warning in patched.warnings {
                outcome.warn(warning);
            }
        }
        Err(e) => return outcome.fail(e),
    }
    outcome.advance(Stage::Patched);

    let icons = icons::apply(&project.res_dir(), sources, &config.background_color).await;
    outcome.icon_assets = icons.assets_written;
    outcome.icon_source = icons.source.clone();
    for warning in icons.warnings {
        outcome.warn(warning);
    }
    outcome.advance(Stage::IconsApplied);

    let mut info = BuildInfo::new(config, &identifier);
    if let Some(source) = icons.source {
        info = info.with_icon(source, icons.sha256);
    }
    if let Err(e) = info.write(project.root()) {
        outcome.warn(Warning::BuildInfo(e.to_string()));
    }

    outcome.advance(Stage::Done);
    tracing::info!(
        "Customization complete: {} file(s) changed, {} icon asset(s), {} warning(s)",
        outcome.changed_files().count(),
        outcome.icon_assets,
        outcome.warnings.len()
    );
    outcome
}
