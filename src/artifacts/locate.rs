//! Built APK discovery

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::ArtifactError;

/// Search patterns relative to the project root, most specific first
pub const APK_PATTERNS: &[&str] = &[
    "app/build/outputs/apk/**/*.apk",
    "app/build/outputs/**/*.apk",
    "build/outputs/apk/**/*.apk",
    "**/*.apk",
];

/// Key written to `$GITHUB_OUTPUT`
pub const OUTPUT_KEY: &str = "apk_path";

/// A discovered APK
#[derive(Debug, Clone, serde::Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
    #[serde(skip)]
    pub modified: SystemTime,
}

impl Artifact {
    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    pub fn is_signed(&self) -> bool {
        let name = self.file_name();
        name.contains("signed") && !name.contains("unsigned")
    }

    pub fn is_release(&self) -> bool {
        self.file_name().contains("release")
    }
}

/// All APKs under `root`, best candidate first
pub fn find_apks(root: &Path) -> Result<Vec<Artifact>, ArtifactError> {
    let base = glob::Pattern::escape(&root.to_string_lossy());
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for pattern in APK_PATTERNS {
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        for entry in glob::glob(&full)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !path.is_file() || !seen.insert(path.clone()) {
                continue;
            }
            let meta = std::fs::metadata(&path)?;
            found.push(Artifact {
                size: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                path,
            });
        }
    }

    rank(&mut found);
    Ok(found)
}

/// Signed before unsigned, release before debug, then newest first
pub fn rank(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| {
        b.is_signed()
            .cmp(&a.is_signed())
            .then(b.is_release().cmp(&a.is_release()))
            .then(b.modified.cmp(&a.modified))
    });
}

/// The best APK under `root`
pub fn find_best_apk(root: &Path) -> Result<Artifact, ArtifactError> {
    let found = find_apks(root)?;
    for artifact in &found {
        tracing::info!(
            "Found {} ({:.2} MB)",
            artifact.path.display(),
            artifact.size as f64 / (1024.0 * 1024.0)
        );
    }
    found.into_iter().next().ok_or_else(|| ArtifactError::NotFound {
        root: root.to_path_buf(),
    })
}

/// Append `key=value` to a GitHub Actions output file
pub fn write_github_output(output_file: &Path, key: &str, value: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_file)?;
    writeln!(file, "{}={}", key, value)
}
