//! Field tables for each patched file of the template project

use super::field::{Anchor, Field, FieldRule};
use crate::core::{BuildConfig, PackageIdentifier};

/// Name of the TWA manifest map in the template's app build descriptor
const TWA_MANIFEST: &str = "twaManifest";

const HOST_ALIASES: &[&str] = &["host", "host_name"];

fn twa(key: &'static str) -> Field {
    Field::MapEntry {
        block: TWA_MANIFEST,
        key,
    }
}

/// Build descriptor: identity fields plus the TWA manifest map
pub fn build_descriptor(config: &BuildConfig, id: &PackageIdentifier) -> Vec<FieldRule> {
    let id = id.as_string();
    vec![
        FieldRule::required(Field::Property("namespace"), &id, Anchor::IntoBlock("android")),
        FieldRule::required(Field::Property("applicationId"), &id, Anchor::IntoBlock("defaultConfig")),
        FieldRule::if_present(twa("applicationId"), &id),
        FieldRule::if_present(twa("hostName"), config.host()),
        FieldRule::if_present(twa("launchUrl"), config.launch_path()),
        FieldRule::if_present(twa("name"), &config.app_name),
        FieldRule::if_present(twa("launcherName"), &config.launcher_name),
        FieldRule::if_present(twa("themeColor"), config.theme_color.as_str()),
        FieldRule::if_present(twa("themeColorDark"), config.theme_color_dark.as_str()),
        FieldRule::if_present(twa("navigationColor"), config.theme_color_dark.as_str()),
        FieldRule::if_present(twa("backgroundColor"), config.background_color.as_str()),
    ]
}

/// Manifest rules.
///
/// With `namespace_in_descriptor` the legacy `package` attribute is removed;
/// without a build descriptor to carry the namespace it is kept and updated.
pub fn manifest(config: &BuildConfig, id: &PackageIdentifier, namespace_in_descriptor: bool) -> Vec<FieldRule> {
    let package = Field::Attribute {
        element: Some("manifest"),
        name: "package",
    };
    let package_rule = if namespace_in_descriptor {
        FieldRule::remove(package)
    } else {
        FieldRule::if_present(package, id.as_string())
    };
    vec![
        package_rule,
        FieldRule::if_present(
            Field::Attribute {
                element: None,
                name: "android:host",
            },
            config.host(),
        ),
    ]
}

pub fn strings(config: &BuildConfig) -> Vec<FieldRule> {
    let close = Anchor::BeforeClose("resources");
    let launcher = if config.launcher_name != config.app_name {
        FieldRule::required(Field::string("launcher_name"), &config.launcher_name, close)
    } else {
        FieldRule::if_present(Field::string("launcher_name"), &config.launcher_name)
    };
    vec![
        FieldRule::required(Field::string("app_name"), &config.app_name, close),
        launcher,
        FieldRule::required(
            Field::XmlString {
                name: "hostName",
                aliases: HOST_ALIASES,
            },
            config.host(),
            close,
        ),
        FieldRule::required(Field::string("launchUrl"), config.absolute_launch_url(), close),
    ]
}

/// Placeholder site literals in the WebView launcher activity
pub fn launcher_activity(config: &BuildConfig) -> Vec<FieldRule> {
    vec![
        FieldRule::if_present(Field::Literal("https://example.com"), config.absolute_launch_url()),
        FieldRule::if_present(Field::Literal("example.com"), config.host()),
    ]
}

pub fn colors(config: &BuildConfig) -> Vec<FieldRule> {
    let close = Anchor::BeforeClose("resources");
    vec![
        FieldRule::required(Field::XmlColor("colorPrimary"), config.theme_color.as_str(), close),
        FieldRule::required(Field::XmlColor("colorPrimaryDark"), config.theme_color_dark.as_str(), close),
        FieldRule::required(Field::XmlColor("backgroundColor"), config.background_color.as_str(), close),
        FieldRule::if_present(Field::XmlColor("navigationBarColor"), config.theme_color_dark.as_str()),
    ]
}
