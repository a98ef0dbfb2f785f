//! Customize command: the default action

use clap::Args;
use std::path::PathBuf;

use crate::core::{BuildConfig, Outcome, RawConfig};
use crate::icons::{CatalogUrls, IconSources, DEFAULT_FOREGROUND_CATALOG_URL, DEFAULT_ICON_CATALOG_URL};
use crate::orchestrator::{self, ProjectLocation};

#[derive(Args, Debug, Clone)]
pub struct CustomizeArgs {
    /// Website host or URL the app wraps
    #[arg(long, env = "HOST_NAME")]
    pub host_name: Option<String>,

    /// Display name of the app
    #[arg(long, env = "APP_NAME")]
    pub app_name: Option<String>,

    /// Name under the launcher icon (defaults to the app name)
    #[arg(long, env = "LAUNCHER_NAME")]
    pub launcher_name: Option<String>,

    /// Start URL, absolute or relative to the host
    #[arg(long, env = "LAUNCH_URL")]
    pub launch_url: Option<String>,

    #[arg(long, env = "THEME_COLOR")]
    pub theme_color: Option<String>,

    #[arg(long, env = "THEME_COLOR_DARK")]
    pub theme_color_dark: Option<String>,

    #[arg(long, env = "BACKGROUND_COLOR")]
    pub background_color: Option<String>,

    /// Catalog icon key (phone, globe, shop, chat, home, star)
    #[arg(long, env = "ICON_CHOICE")]
    pub icon_choice: Option<String>,

    /// Base64 image used instead of the catalog icon
    #[arg(long, env = "ICON_BASE64", hide_env_values = true)]
    pub icon_base64: Option<String>,

    /// Identifier recorded in build-info.json (random when unset)
    #[arg(long, env = "BUILD_ID")]
    pub build_id: Option<String>,

    /// Template project root, tried before the default locations
    #[arg(long, env = "PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    #[arg(long, env = "ICON_CATALOG_URL", default_value = DEFAULT_ICON_CATALOG_URL)]
    pub icon_catalog_url: String,

    #[arg(long, env = "FOREGROUND_CATALOG_URL", default_value = DEFAULT_FOREGROUND_CATALOG_URL)]
    pub foreground_catalog_url: String,
}

impl CustomizeArgs {
    fn raw_config(&self) -> RawConfig {
        RawConfig {
            build_id: self.build_id.clone(),
            host_name: self.host_name.clone(),
            app_name: self.app_name.clone(),
            launcher_name: self.launcher_name.clone(),
            launch_url: self.launch_url.clone(),
            theme_color: self.theme_color.clone(),
            theme_color_dark: self.theme_color_dark.clone(),
            background_color: self.background_color.clone(),
            icon_choice: self.icon_choice.clone(),
            icon_base64: self.icon_base64.clone(),
        }
    }
}

pub async fn run(args: CustomizeArgs, json: bool) -> anyhow::Result<()> {
    let (config, config_warnings) = match BuildConfig::from_raw(args.raw_config()) {
        Ok(parsed) => parsed,
        Err(e) => return finish(Outcome::new().fail(e), json),
    };

    let location = ProjectLocation::new(std::env::current_dir()?).with_project_dir(args.project_dir.as_ref());
    let urls = CatalogUrls {
        icons: args.icon_catalog_url,
        foregrounds: args.foreground_catalog_url,
    };
    let sources = IconSources::resolve(config.icon_inline_data.as_deref(), &config.icon_choice, &urls);

    let outcome = orchestrator::run(&config, config_warnings, &location, &sources).await;
    finish(outcome, json)
}

/// Print the outcome, then surface its fatal error (if any) for the exit code
fn finish(mut outcome: Outcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_text(&outcome));
    }
    match outcome.fatal.take() {
        Some(fatal) => Err(fatal.into()),
        None => Ok(()),
    }
}

fn render_text(outcome: &Outcome) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    match outcome.failed_at {
        Some(stage) => line(format!("State:    failed (after {:?})", stage)),
        None => line(format!("State:    {:?}", outcome.state)),
    }
    if let Some(id) = &outcome.identifier {
        line(format!("Package:  {}", id));
    }
    if let Some(root) = &outcome.project_root {
        line(format!("Project:  {}", root.display()));
    }
    for file in &outcome.files {
        let mark = if file.changed { "updated" } else { "unchanged" };
        line(format!("  {:<10} {:<9} {}", file.role, mark, file.path.display()));
    }
    if let Some(source) = &outcome.icon_source {
        line(format!("Icons:    {} asset(s) from {}", outcome.icon_assets, source));
    }
    if !outcome.warnings.is_empty() {
        line(format!("Warnings: {}", outcome.warnings.len()));
        for warning in &outcome.warnings {
            line(format!("  - {}", warning));
        }
    }
    if let Some(fatal) = &outcome.fatal {
        line(format!("Error:    {}", fatal));
    }
    out
}
