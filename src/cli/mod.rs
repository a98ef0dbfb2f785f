//! Command-line interface
//!
//! Every value can also come from the environment, which is how CI
//! workflows drive the tool. Running without a subcommand customizes the
//! project.

pub mod customize;
pub mod locate;
pub mod notify;
pub mod sign;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::project::Project;

pub use customize::CustomizeArgs;
pub use locate::LocateArgs;
pub use notify::NotifyArgs;
pub use sign::SignArgs;

/// Process exit codes
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const PROJECT_NOT_FOUND: i32 = 3;
    pub const PATCH_FAILURE: i32 = 4;
    pub const ARTIFACT_NOT_FOUND: i32 = 5;
    pub const TOOL_FAILURE: i32 = 6;
}

#[derive(Parser, Debug)]
#[command(name = "apkforge")]
#[command(author, version, about = "Customize a template Android web-wrapper project", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Customization values used when no subcommand is given
    #[command(flatten)]
    pub customize: CustomizeArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results and logs as JSON
    #[arg(long, global = true)]
    pub json_output: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rewrite identity, branding and icons of the template project
    Customize(CustomizeArgs),

    /// Find the best built APK and publish its path
    Locate(LocateArgs),

    /// zipalign, sign and verify an APK
    Sign(SignArgs),

    /// Report the build status to a webhook
    Notify(NotifyArgs),
}

/// Root used by the post-build commands: the explicit directory, else the
/// located template project, else the working directory.
pub(crate) fn project_root(project_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = project_dir {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(match Project::locate(&cwd, None) {
        Ok(project) => project.root().to_path_buf(),
        Err(e) => {
            tracing::debug!("{}; using {}", e, cwd.display());
            cwd
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_customize() {
        let cli = Cli::try_parse_from(["apkforge", "--host-name", "example.com", "--app-name", "Example"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.customize.host_name.as_deref(), Some("example.com"));
        assert_eq!(cli.customize.app_name.as_deref(), Some("Example"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["apkforge", "locate", "--project-dir", "out", "-v", "--json-output"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.json_output);
        match cli.command {
            Some(Commands::Locate(args)) => assert_eq!(args.project_dir.as_deref(), Some(Path::new("out"))),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_notify_requires_status() {
        assert!(Cli::try_parse_from(["apkforge", "notify", "--build-id", "b-1"]).is_err());
        let cli = Cli::try_parse_from(["apkforge", "notify", "failure", "--build-id", "b-1"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Notify(_))));
    }

    #[test]
    fn test_explicit_project_root() {
        assert_eq!(project_root(Some(Path::new("/tmp/x"))).unwrap(), Path::new("/tmp/x"));
    }
}
