//! Notify command

use clap::Args;

use crate::artifacts::notify::{notify, BuildNotification, BuildStatus};
use crate::icons::http_client;

#[derive(Args, Debug, Clone)]
pub struct NotifyArgs {
    /// Build result to report
    #[arg(value_enum)]
    pub status: BuildStatus,

    /// Endpoint to POST to; nothing is sent when unset
    #[arg(long, env = "WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    #[arg(long, env = "BUILD_ID")]
    pub build_id: String,

    /// Artifact identifier reported on success
    #[arg(long, env = "ARTIFACT_NAME")]
    pub artifact_name: Option<String>,

    /// Failure message (a generic one is sent when unset)
    #[arg(long)]
    pub error: Option<String>,
}

pub async fn run(args: NotifyArgs) -> anyhow::Result<()> {
    let Some(url) = args.webhook_url.filter(|u| !u.trim().is_empty()) else {
        tracing::warn!("WEBHOOK_URL not set, skipping notification");
        return Ok(());
    };

    let notification = match args.status {
        BuildStatus::Success => BuildNotification::success(args.build_id, args.artifact_name),
        BuildStatus::Failure => BuildNotification::failure(args.build_id, args.error),
    };
    notify(&http_client(), &url, &notification).await?;
    tracing::info!("Webhook notified");
    Ok(())
}
