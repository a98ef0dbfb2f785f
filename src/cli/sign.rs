//! Sign command

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::locate::find_apks;
use crate::artifacts::sign::{sign_apk, BuildTools, SigningKey};
use crate::artifacts::ArtifactError;
use crate::host::CommandOptions;

#[derive(Args, Clone)]
pub struct SignArgs {
    /// APK to sign (defaults to the best unsigned APK under the project)
    #[arg(long)]
    pub apk: Option<PathBuf>,

    /// Signed output path (defaults to `<name>-signed.apk` next to the input)
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, env = "PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Keystore; relative paths resolve against the project root
    #[arg(long, env = "KEYSTORE_PATH", default_value = "android.keystore")]
    pub keystore: PathBuf,

    #[arg(long, env = "KEYSTORE_PASS", hide_env_values = true)]
    pub keystore_pass: String,

    #[arg(long, env = "KEY_ALIAS", default_value = "android")]
    pub key_alias: String,

    /// Key password (defaults to the keystore password)
    #[arg(long, env = "KEY_PASS", hide_env_values = true)]
    pub key_pass: Option<String>,

    #[arg(long, env = "ZIPALIGN", default_value = "zipalign")]
    pub zipalign: String,

    #[arg(long, env = "APKSIGNER", default_value = "apksigner")]
    pub apksigner: String,

    /// Per-tool timeout in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
}

impl std::fmt::Debug for SignArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignArgs")
            .field("apk", &self.apk)
            .field("keystore", &self.keystore)
            .field("key_alias", &self.key_alias)
            .finish_non_exhaustive()
    }
}

pub async fn run(args: SignArgs, json: bool) -> anyhow::Result<()> {
    let root = super::project_root(args.project_dir.as_deref())?;

    let input = match args.apk {
        Some(apk) => apk,
        None => find_apks(&root)?
            .into_iter()
            .find(|a| !a.is_signed())
            .map(|a| a.path)
            .ok_or_else(|| ArtifactError::NotFound { root: root.clone() })?,
    };
    tracing::info!("Found APK to sign: {}", input.display());

    let key = SigningKey {
        keystore: if args.keystore.is_relative() {
            root.join(&args.keystore)
        } else {
            args.keystore
        },
        alias: args.key_alias,
        store_password: args.keystore_pass,
        key_password: args.key_pass,
    };
    let tools = BuildTools {
        zipalign: args.zipalign,
        apksigner: args.apksigner,
    };
    let options = CommandOptions {
        timeout: Duration::from_secs(args.timeout),
        ..Default::default()
    };

    let signed = sign_apk(&input, args.output.as_deref(), &key, &tools, &options).await?;
    if json {
        println!("{}", serde_json::json!({ "signed_apk": signed }));
    } else {
        println!("{}", signed.display());
    }
    Ok(())
}
