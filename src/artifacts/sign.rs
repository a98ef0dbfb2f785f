//! APK alignment and signing with the Android build tools

use std::path::{Path, PathBuf};

use super::ArtifactError;
use crate::host::{CommandOptions, CommandRunner};

const STORE_PASS_ENV: &str = "APKFORGE_KS_PASS";
const KEY_PASS_ENV: &str = "APKFORGE_KEY_PASS";

/// Keystore credentials
#[derive(Clone)]
pub struct SigningKey {
    pub keystore: PathBuf,
    pub alias: String,
    pub store_password: String,
    /// Defaults to the store password
    pub key_password: Option<String>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("keystore", &self.keystore)
            .field("alias", &self.alias)
            .field("store_password", &"[REDACTED]")
            .finish()
    }
}

/// Tools used for signing; plain names are looked up in PATH
#[derive(Debug, Clone)]
pub struct BuildTools {
    pub zipalign: String,
    pub apksigner: String,
}

impl Default for BuildTools {
    fn default() -> Self {
        Self {
            zipalign: "zipalign".to_string(),
            apksigner: "apksigner".to_string(),
        }
    }
}

/// `app-release-unsigned.apk` → `app-release-<suffix>.apk`
fn sibling(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());
    let stem = stem.strip_suffix("-unsigned").unwrap_or(&stem);
    input.with_file_name(format!("{}-{}.apk", stem, suffix))
}

pub fn signed_path(input: &Path) -> PathBuf {
    sibling(input, "signed")
}

/// zipalign, sign and verify `input`. Returns the path of the signed APK.
///
/// The aligned intermediate is removed whether or not signing succeeds.
pub async fn sign_apk(
    input: &Path,
    output: Option<&Path>,
    key: &SigningKey,
    tools: &BuildTools,
    options: &CommandOptions,
) -> Result<PathBuf, ArtifactError> {
    if !input.is_file() {
        return Err(ArtifactError::NotFound {
            root: input.to_path_buf(),
        });
    }
    if !key.keystore.is_file() {
        return Err(ArtifactError::KeystoreMissing(key.keystore.clone()));
    }

    let aligned = sibling(input, "aligned");
    let signed = output.map(Path::to_path_buf).unwrap_or_else(|| signed_path(input));

    let result = align_sign_verify(input, &aligned, &signed, key, tools, options).await;
    if aligned.exists() {
        if let Err(e) = std::fs::remove_file(&aligned) {
            tracing::warn!("Could not remove {}: {}", aligned.display(), e);
        }
    }
    result?;

    tracing::info!("Signed APK: {}", signed.display());
    Ok(signed)
}

async fn align_sign_verify(
    input: &Path,
    aligned: &Path,
    signed: &Path,
    key: &SigningKey,
    tools: &BuildTools,
    options: &CommandOptions,
) -> Result<(), ArtifactError> {
    let runner = CommandRunner::new()
        .with_env(STORE_PASS_ENV, &key.store_password)
        .with_env(KEY_PASS_ENV, key.key_password.as_deref().unwrap_or(&key.store_password));
    let path = |p: &Path| p.to_string_lossy().into_owned();

    tracing::info!("Aligning {}", input.display());
    runner
        .run_checked(
            &tools.zipalign,
            &["-p".to_string(), "-f".to_string(), "4".to_string(), path(input), path(aligned)],
            options,
        )
        .await?;

    tracing::info!("Signing with key '{}'", key.alias);
    let store_pass = format!("env:{}", STORE_PASS_ENV);
    let key_pass = format!("env:{}", KEY_PASS_ENV);
    let keystore = path(&key.keystore);
    let signed_arg = path(signed);
    let aligned_arg = path(aligned);
    runner
        .run_checked(
            &tools.apksigner,
            &[
                "sign",
                "--ks",
                keystore.as_str(),
                "--ks-key-alias",
                key.alias.as_str(),
                "--ks-pass",
                store_pass.as_str(),
                "--key-pass",
                key_pass.as_str(),
                "--v2-signing-enabled",
                "true",
                "--out",
                signed_arg.as_str(),
                aligned_arg.as_str(),
            ],
            options,
        )
        .await?;

    tracing::info!("Verifying signature");
    let verified = runner
        .run_checked(&tools.apksigner, &["verify", "--verbose", signed_arg.as_str()], options)
        .await?;
    for line in verified.stdout.lines().filter(|l| l.starts_with("Verified using")) {
        tracing::debug!("{}", line);
    }
    Ok(())
}
