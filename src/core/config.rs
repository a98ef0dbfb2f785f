//! Build configuration model
//!
//! `BuildConfig` is assembled once at the process boundary (see `cli`) and then
//! passed by reference to every stage. Nothing below this module reads the
//! process environment.

use serde::Serialize;
use url::Url;

use super::identifier::clean_host;
use super::outcome::{CustomizeError, Warning};

pub const DEFAULT_LAUNCH_URL: &str = "/";
pub const DEFAULT_THEME_COLOR: &str = "#171717";
pub const DEFAULT_THEME_COLOR_DARK: &str = "#000000";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const DEFAULT_ICON_CHOICE: &str = "phone";

/// A `#RRGGBB` color as written into resource tables and the TWA manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Normalize user input: trims and adds the leading `#`. Exactly six hex
    /// digits are accepted; `#AARRGGBB` is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw.trim().trim_start_matches('#');
        let valid = digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit());
        valid.then(|| Self(format!("#{}", digits)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> [u8; 3] {
        let digits = &self.0[1..];
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        [byte(0), byte(2), byte(4)]
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unvalidated configuration values, as they arrive from flags or environment
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub build_id: Option<String>,
    pub host_name: Option<String>,
    pub app_name: Option<String>,
    pub launcher_name: Option<String>,
    pub launch_url: Option<String>,
    pub theme_color: Option<String>,
    pub theme_color_dark: Option<String>,
    pub background_color: Option<String>,
    pub icon_choice: Option<String>,
    pub icon_base64: Option<String>,
}

/// Immutable, validated customization input
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
    pub build_id: String,
    pub host_name: String,
    pub app_name: String,
    pub launcher_name: String,
    pub launch_url: String,
    pub theme_color: HexColor,
    pub theme_color_dark: HexColor,
    pub background_color: HexColor,
    pub icon_choice: String,
    #[serde(skip)]
    pub icon_inline_data: Option<String>,
}

impl BuildConfig {
    /// Validate raw values. Missing host or app name is fatal; malformed
    /// colors fall back to their defaults and are reported as warnings.
    pub fn from_raw(raw: RawConfig) -> Result<(Self, Vec<Warning>), CustomizeError> {
        let host_name = non_empty(raw.host_name).ok_or(CustomizeError::MissingConfig("HOST_NAME"))?;
        let app_name = non_empty(raw.app_name).ok_or(CustomizeError::MissingConfig("APP_NAME"))?;

        let mut warnings = Vec::new();
        let mut color = |key: &'static str, value: Option<String>, default: &str| {
            match non_empty(value) {
                None => HexColor(default.to_string()),
                Some(v) => HexColor::parse(&v).unwrap_or_else(|| {
                    warnings.push(Warning::InvalidColor {
                        key,
                        value: v,
                        fallback: default.to_string(),
                    });
                    HexColor(default.to_string())
                }),
            }
        };

        let theme_color = color("THEME_COLOR", raw.theme_color, DEFAULT_THEME_COLOR);
        let theme_color_dark = color("THEME_COLOR_DARK", raw.theme_color_dark, DEFAULT_THEME_COLOR_DARK);
        let background_color = color("BACKGROUND_COLOR", raw.background_color, DEFAULT_BACKGROUND_COLOR);

        let config = Self {
            build_id: non_empty(raw.build_id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            launcher_name: non_empty(raw.launcher_name).unwrap_or_else(|| app_name.clone()),
            launch_url: non_empty(raw.launch_url).unwrap_or_else(|| DEFAULT_LAUNCH_URL.to_string()),
            icon_choice: non_empty(raw.icon_choice)
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| DEFAULT_ICON_CHOICE.to_string()),
            icon_inline_data: non_empty(raw.icon_base64),
            host_name,
            app_name,
            theme_color,
            theme_color_dark,
            background_color,
        };
        Ok((config, warnings))
    }

    /// The bare host used for intent filters and the `hostName` resource
    pub fn host(&self) -> String {
        clean_host(&self.host_name)
    }

    /// Launch URL as an absolute URL; relative values resolve against
    /// `https://<host>/`.
    pub fn absolute_launch_url(&self) -> String {
        if let Ok(url) = Url::parse(&self.launch_url) {
            if matches!(url.scheme(), "http" | "https") {
                return url.to_string();
            }
        }
        let base = format!("https://{}/", self.host());
        match Url::parse(&base).and_then(|b| b.join(&self.launch_url)) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!("Could not resolve launch URL {}: {}", self.launch_url, e);
                base
            }
        }
    }

    /// Launch URL relative to the host, as the TWA manifest map expects it
    pub fn launch_path(&self) -> String {
        match Url::parse(&self.absolute_launch_url()) {
            Ok(url) => {
                let mut path = url.path().to_string();
                if let Some(query) = url.query() {
                    path.push('?');
                    path.push_str(query);
                }
                path
            }
            Err(_) => DEFAULT_LAUNCH_URL.to_string(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(host: &str, app: &str) -> RawConfig {
        RawConfig {
            host_name: Some(host.to_string()),
            app_name: Some(app.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let (config, warnings) = BuildConfig::from_raw(raw("example.com", "Example")).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.launcher_name, "Example");
        assert_eq!(config.launch_url, "/");
        assert_eq!(config.theme_color.as_str(), "#171717");
        assert_eq!(config.theme_color_dark.as_str(), "#000000");
        assert_eq!(config.background_color.as_str(), "#FFFFFF");
        assert_eq!(config.icon_choice, "phone");
        assert!(config.icon_inline_data.is_none());
        assert!(!config.build_id.is_empty());
    }

    #[test]
    fn test_missing_host_is_fatal() {
        let err = BuildConfig::from_raw(raw("  ", "Example")).unwrap_err();
        assert!(matches!(err, CustomizeError::MissingConfig("HOST_NAME")));

        let err = BuildConfig::from_raw(RawConfig {
            host_name: Some("example.com".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, CustomizeError::MissingConfig("APP_NAME")));
    }

    #[test]
    fn test_color_gets_leading_hash() {
        let mut input = raw("example.com", "Example");
        input.theme_color = Some("171717".into());
        let (config, _) = BuildConfig::from_raw(input).unwrap();
        assert_eq!(config.theme_color.as_str(), "#171717");
    }

    #[test]
    fn test_invalid_color_falls_back_with_warning() {
        let mut input = raw("example.com", "Example");
        input.background_color = Some("blue".into());
        let (config, warnings) = BuildConfig::from_raw(input).unwrap();
        assert_eq!(config.background_color.as_str(), "#FFFFFF");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_alpha_color_falls_back_with_warning() {
        let mut input = raw("example.com", "Example");
        input.theme_color = Some("#80336699".into());
        let (config, warnings) = BuildConfig::from_raw(input).unwrap();
        assert_eq!(config.theme_color.as_str(), DEFAULT_THEME_COLOR);
        assert!(matches!(warnings.as_slice(), [Warning::InvalidColor { key: "THEME_COLOR", .. }]));
    }

    #[test]
    fn test_hex_color_rgb() {
        assert_eq!(HexColor::parse("#102030").unwrap().rgb(), [0x10, 0x20, 0x30]);
        assert!(HexColor::parse("80102030").is_none());
        assert!(HexColor::parse("#FF336699").is_none());
        assert!(HexColor::parse("#12345").is_none());
        assert!(HexColor::parse("#GGGGGG").is_none());
    }

    #[test]
    fn test_relative_launch_url_is_resolved() {
        let mut input = raw("https://www.example.com/", "Example");
        input.launch_url = Some("/app/start?src=twa".into());
        let (config, _) = BuildConfig::from_raw(input).unwrap();
        assert_eq!(config.absolute_launch_url(), "https://example.com/app/start?src=twa");
        assert_eq!(config.launch_path(), "/app/start?src=twa");
    }

    #[test]
    fn test_absolute_launch_url_is_kept() {
        let mut input = raw("example.com", "Example");
        input.launch_url = Some("https://m.example.com/home".into());
        let (config, _) = BuildConfig::from_raw(input).unwrap();
        assert_eq!(config.absolute_launch_url(), "https://m.example.com/home");
    }

    #[test]
    fn test_default_launch_url() {
        let (config, _) = BuildConfig::from_raw(raw("example.com", "Example")).unwrap();
        assert_eq!(config.absolute_launch_url(), "https://example.com/");
        assert_eq!(config.launch_path(), "/");
    }
}
