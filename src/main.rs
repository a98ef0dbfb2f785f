//! apkforge - customizes a template Android web-wrapper project
//!
//! Given a website and branding values, rewrites the template's package
//! identity, resource tables and launcher icons so it builds as a distinct
//! app. Post-build subcommands find, sign and report the resulting APK.

mod artifacts;
mod cli;
mod core;
mod host;
mod icons;
mod logging;
mod orchestrator;
mod patch;
mod project;

#[cfg(test)]
mod test_fixtures;

use clap::Parser;
use cli::{exit_codes, Cli, Commands};

use crate::artifacts::ArtifactError;
use crate::core::CustomizeError;

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = logging::init(cli.verbose, cli.json_output) {
        eprintln!("Failed to initialize logging: {}", e);
        return exit_codes::UNEXPECTED_FAILURE;
    }

    // Create tokio runtime for async commands
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return exit_codes::UNEXPECTED_FAILURE;
        }
    };

    let json = cli.json_output;
    let result = rt.block_on(async move {
        match cli.command {
            Some(Commands::Customize(args)) => cli::customize::run(args, json).await,
            Some(Commands::Locate(args)) => cli::locate::run(args, json).await,
            Some(Commands::Sign(args)) => cli::sign::run(args, json).await,
            Some(Commands::Notify(args)) => cli::notify::run(args).await,
            None => cli::customize::run(cli.customize, json).await,
        }
    });

    match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            categorize_error(&e)
        }
    }
}

/// Categorize an error into the appropriate exit code
fn categorize_error(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<CustomizeError>() {
        return match err {
            CustomizeError::MissingConfig(_) => exit_codes::CONFIG_ERROR,
            CustomizeError::ProjectNotFound { .. } => exit_codes::PROJECT_NOT_FOUND,
            CustomizeError::ManifestMissing(_)
            | CustomizeError::ManifestRead { .. }
            | CustomizeError::ManifestWrite { .. } => exit_codes::PATCH_FAILURE,
        };
    }
    if let Some(err) = e.downcast_ref::<ArtifactError>() {
        return match err {
            ArtifactError::NotFound { .. } => exit_codes::ARTIFACT_NOT_FOUND,
            ArtifactError::KeystoreMissing(_) => exit_codes::CONFIG_ERROR,
            ArtifactError::Command(_) => exit_codes::TOOL_FAILURE,
            _ => exit_codes::UNEXPECTED_FAILURE,
        };
    }
    exit_codes::UNEXPECTED_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::CommandError;
    use std::path::PathBuf;

    #[test]
    fn test_categorize_error() {
        let code = |e: anyhow::Error| categorize_error(&e);
        assert_eq!(code(CustomizeError::MissingConfig("APP_NAME").into()), exit_codes::CONFIG_ERROR);
        assert_eq!(
            code(CustomizeError::ProjectNotFound { searched: vec![] }.into()),
            exit_codes::PROJECT_NOT_FOUND
        );
        assert_eq!(
            code(CustomizeError::ManifestMissing(PathBuf::from("m.xml")).into()),
            exit_codes::PATCH_FAILURE
        );
        assert_eq!(
            code(ArtifactError::NotFound { root: PathBuf::from(".") }.into()),
            exit_codes::ARTIFACT_NOT_FOUND
        );
        assert_eq!(
            code(ArtifactError::Command(CommandError::BinaryNotFound("zipalign".into())).into()),
            exit_codes::TOOL_FAILURE
        );
        assert_eq!(code(anyhow::anyhow!("boom")), exit_codes::UNEXPECTED_FAILURE);
    }
}
