//! Post-build steps: finding the APK, signing it and reporting the result

pub mod locate;
pub mod notify;
pub mod sign;

use std::path::PathBuf;
use thiserror::Error;

use crate::host::CommandError;

/// Errors from the post-build steps
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("no APK found under {}", .root.display())]
    NotFound { root: PathBuf },

    #[error("keystore not found: {}", .0.display())]
    KeystoreMissing(PathBuf),

    #[error("invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("webhook request failed: {0}")]
    Webhook(#[from] reqwest::Error),

    #[error("webhook returned HTTP {0}")]
    WebhookStatus(u16),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
