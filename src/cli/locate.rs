//! Locate command

use clap::Args;
use std::path::PathBuf;

use crate::artifacts::locate::{find_best_apk, write_github_output, OUTPUT_KEY};

#[derive(Args, Debug, Clone)]
pub struct LocateArgs {
    /// Project root to search (defaults to the located template project)
    #[arg(long, env = "PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// GitHub Actions output file to append `apk_path=...` to
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,
}

pub async fn run(args: LocateArgs, json: bool) -> anyhow::Result<()> {
    let root = super::project_root(args.project_dir.as_deref())?;
    let artifact = find_best_apk(&root)?;
    tracing::info!("Using APK: {}", artifact.path.display());

    if let Some(output) = &args.github_output {
        write_github_output(output, OUTPUT_KEY, &artifact.path.to_string_lossy())?;
        tracing::debug!("Wrote {} to {}", OUTPUT_KEY, output.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        println!("{}", artifact.path.display());
    }
    Ok(())
}
