//! Project location
//!
//! Finds the template project among an ordered list of candidate roots and
//! resolves each patched file by its logical role.

use std::path::{Path, PathBuf};

use crate::core::CustomizeError;

/// Relative path that marks a directory as a project root
pub const MANIFEST_SUBPATH: &str = "app/src/main/AndroidManifest.xml";

/// Resource directory relative to the project root
pub const RES_SUBPATH: &str = "app/src/main/res";

/// Roots tried after an explicit override, in order
pub const DEFAULT_CANDIDATE_ROOTS: &[&str] = &["android-project", ".", "android", "template"];

/// Logical role of a file in the template project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    /// `app/build.gradle` (Groovy DSL)
    AppBuildGroovy,
    /// `app/build.gradle.kts` (Kotlin DSL)
    AppBuildKts,
    Manifest,
    Strings,
    Colors,
    /// WebView launcher activity of the WebView template variant
    LauncherActivity,
}

impl FileRole {
    pub fn relative_path(&self) -> &'static str {
        match self {
            FileRole::AppBuildGroovy => "app/build.gradle",
            FileRole::AppBuildKts => "app/build.gradle.kts",
            FileRole::Manifest => MANIFEST_SUBPATH,
            FileRole::Strings => "app/src/main/res/values/strings.xml",
            FileRole::Colors => "app/src/main/res/values/colors.xml",
            FileRole::LauncherActivity => "app/src/main/java/com/example/webviewapp/MainActivity.java",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileRole::AppBuildGroovy => "app build descriptor",
            FileRole::AppBuildKts => "app build descriptor (Kotlin DSL)",
            FileRole::Manifest => "app manifest",
            FileRole::Strings => "string resources",
            FileRole::Colors => "color resources",
            FileRole::LauncherActivity => "launcher activity",
        }
    }
}

/// A located project root
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Search `override_root` (if any) and then the default candidates
    pub fn locate(base: &Path, override_root: Option<&Path>) -> Result<Self, CustomizeError> {
        let candidates: Vec<PathBuf> = override_root
            .map(Path::to_path_buf)
            .into_iter()
            .chain(DEFAULT_CANDIDATE_ROOTS.iter().map(PathBuf::from))
            .map(|p| if p.is_absolute() { p } else { base.join(p) })
            .collect();

        for candidate in &candidates {
            if candidate.join(MANIFEST_SUBPATH).is_file() {
                tracing::info!("Using Android project at {}", candidate.display());
                return Ok(Self::at(candidate.clone()));
            }
            tracing::debug!("No project at {}", candidate.display());
        }

        Err(CustomizeError::ProjectNotFound {
            searched: candidates,
        })
    }

    /// Wrap a known project root without searching
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, role: FileRole) -> PathBuf {
        self.root.join(role.relative_path())
    }

    /// Path of a role if the file exists
    pub fn find(&self, role: FileRole) -> Option<PathBuf> {
        let path = self.path(role);
        path.is_file().then_some(path)
    }

    pub fn res_dir(&self) -> PathBuf {
        self.root.join(RES_SUBPATH)
    }
}
