//! Build-info record written next to the customized project

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::config::BuildConfig;
use super::identifier::PackageIdentifier;

pub const BUILD_INFO_FILE: &str = "build-info.json";

/// Every resolved configuration value plus the derived identifier
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_id: String,
    pub host_name: String,
    pub launch_url: String,
    pub app_name: String,
    pub launcher_name: String,
    pub package_name: String,
    pub theme_color: String,
    pub theme_color_dark: String,
    pub background_color: String,
    pub icon_choice: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_sha256: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl BuildInfo {
    pub fn new(config: &BuildConfig, identifier: &PackageIdentifier) -> Self {
        Self {
            build_id: config.build_id.clone(),
            host_name: config.host_name.clone(),
            launch_url: config.absolute_launch_url(),
            app_name: config.app_name.clone(),
            launcher_name: config.launcher_name.clone(),
            package_name: identifier.as_string(),
            theme_color: config.theme_color.to_string(),
            theme_color_dark: config.theme_color_dark.to_string(),
            background_color: config.background_color.to_string(),
            icon_choice: config.icon_choice.clone(),
            icon_source: None,
            icon_sha256: None,
            generated_at: Utc::now(),
        }
    }

    /// Builder pattern: record which icon source was used
    pub fn with_icon(mut self, source: impl Into<String>, sha256: Option<String>) -> Self {
        self.icon_source = Some(source.into());
        self.icon_sha256 = sha256;
        self
    }

    /// Write pretty-printed JSON to `<project_root>/build-info.json`
    pub fn write(&self, project_root: &Path) -> anyhow::Result<PathBuf> {
        let path = project_root.join(BUILD_INFO_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        tracing::info!("Created build info file at {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RawConfig;

    #[test]
    fn test_build_info_written() {
        let dir = tempfile::tempdir().unwrap();
        let (config, _) = BuildConfig::from_raw(RawConfig {
            build_id: Some("build-42".into()),
            host_name: Some("https://example.com".into()),
            app_name: Some("Example".into()),
            theme_color: Some("123456".into()),
            ..Default::default()
        })
        .unwrap();
        let id = PackageIdentifier::derive(&config.host_name);

        let path = BuildInfo::new(&config, &id)
            .with_icon("inline", Some("abc".into()))
            .write(dir.path())
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["build_id"], "build-42");
        assert_eq!(json["package_name"], "com.example");
        assert_eq!(json["theme_color"], "#123456");
        assert_eq!(json["launch_url"], "https://example.com/");
        assert_eq!(json["icon_source"], "inline");
    }
}
