//! Resource patch engine
//!
//! Rewrites the template's build descriptor, manifest and resource tables so
//! they carry the configured identity. Patching is locate-or-insert: fields
//! that exist are replaced in place, required fields that are missing are
//! inserted at a structural anchor, and files are only written when their
//! content actually changes.

mod field;
pub mod rules;

pub use field::*;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::{BuildConfig, CustomizeError, FileReport, PackageIdentifier, Warning};
use crate::project::{FileRole, Project};

/// IO failure while patching a single file
#[derive(Debug, Error)]
pub enum PatchFileError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// A file after patching
#[derive(Debug)]
pub struct PatchedFile {
    pub report: FileReport,
    pub result: PatchResult,
    pub content: String,
}

/// Read, patch and (only if changed) write back a single file
pub fn patch_file(
    path: &Path,
    role: FileRole,
    rules: &[FieldRule],
    dialect: Dialect,
) -> Result<PatchedFile, PatchFileError> {
    let original = std::fs::read_to_string(path).map_err(PatchFileError::Read)?;
    let (content, result) = patch(&original, rules, dialect);

    if result.changed {
        std::fs::write(path, &content).map_err(PatchFileError::Write)?;
        tracing::info!("Updated {}", path.display());
    } else {
        tracing::debug!("{} already up to date", path.display());
    }

    let report = FileReport {
        role: role.label().to_string(),
        path: path.to_path_buf(),
        changed: result.changed,
        fields: result
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.field, f.action))
            .collect(),
    };
    Ok(PatchedFile {
        report,
        result,
        content,
    })
}

/// Reports and warnings from patching a whole project
#[derive(Debug, Default)]
pub struct ProjectPatch {
    pub files: Vec<FileReport>,
    pub warnings: Vec<Warning>,
}

impl ProjectPatch {
    fn record(&mut self, patched: PatchedFile) {
        for field in &patched.result.fields {
            let path = patched.report.path.clone();
            match field.action {
                FieldAction::NoAnchor => self.warnings.push(Warning::FieldNotFound {
                    path,
                    field: field.field.clone(),
                }),
                FieldAction::NonLiteral => self.warnings.push(Warning::NonLiteralField {
                    path,
                    field: field.field.clone(),
                }),
                _ => {}
            }
        }
        self.files.push(patched.report);
    }

    fn write_failed(&mut self, path: PathBuf, err: PatchFileError) {
        self.warnings.push(Warning::FileWrite {
            path,
            message: err.to_string(),
        });
    }
}

/// Patch every file of the project.
///
/// Build descriptors go first so the manifest rule for `package` can tell
/// whether a namespace now lives in the build descriptor. Only manifest
/// failures are fatal; everything else is reported as a warning.
pub fn patch_project(
    project: &Project,
    config: &BuildConfig,
    identifier: &PackageIdentifier,
) -> Result<ProjectPatch, CustomizeError> {
    let mut out = ProjectPatch::default();
    let mut namespace_in_descriptor = false;

    let descriptors = [
        (FileRole::AppBuildGroovy, Dialect::Groovy),
        (FileRole::AppBuildKts, Dialect::Kotlin),
    ];
    let build_rules = rules::build_descriptor(config, identifier);
    let mut found_descriptor = false;
    for (role, dialect) in descriptors {
        let Some(path) = project.find(role) else {
            tracing::debug!("No {} at {}", role.label(), project.path(role).display());
            continue;
        };
        found_descriptor = true;
        match patch_file(&path, role, &build_rules, dialect) {
            Ok(patched) => {
                namespace_in_descriptor |= read_field(&patched.content, &Field::Property("namespace")).is_some();
                out.record(patched);
            }
            Err(e) => out.write_failed(path, e),
        }
    }
    if !found_descriptor {
        out.warnings.push(Warning::MissingFile {
            role: FileRole::AppBuildGroovy.label().to_string(),
            path: project.path(FileRole::AppBuildGroovy),
        });
    }

    let manifest = project
        .find(FileRole::Manifest)
        .ok_or_else(|| CustomizeError::ManifestMissing(project.path(FileRole::Manifest)))?;
    let manifest_rules = rules::manifest(config, identifier, namespace_in_descriptor);
    match patch_file(&manifest, FileRole::Manifest, &manifest_rules, Dialect::Xml) {
        Ok(patched) => out.record(patched),
        Err(PatchFileError::Read(source)) => {
            return Err(CustomizeError::ManifestRead { path: manifest, source })
        }
        Err(PatchFileError::Write(source)) => {
            return Err(CustomizeError::ManifestWrite { path: manifest, source })
        }
    }

    let resources = [
        (FileRole::Strings, rules::strings(config)),
        (FileRole::Colors, rules::colors(config)),
    ];
    for (role, rules) in resources {
        let Some(path) = project.find(role) else {
            out.warnings.push(Warning::MissingFile {
                role: role.label().to_string(),
                path: project.path(role),
            });
            continue;
        };
        match patch_file(&path, role, &rules, Dialect::Xml) {
            Ok(patched) => out.record(patched),
            Err(e) => out.write_failed(path, e),
        }
    }

    let activity = FileRole::LauncherActivity;
    match project.find(activity) {
        Some(path) => match patch_file(&path, activity, &rules::launcher_activity(config), Dialect::Java) {
            Ok(patched) => out.record(patched),
            Err(e) => out.write_failed(path, e),
        },
        None => tracing::debug!("No {} at {}", activity.label(), project.path(activity).display()),
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    fn read(root: &Path, role: FileRole) -> String {
        std::fs::read_to_string(root.join(role.relative_path())).unwrap()
    }

    #[test]
    fn test_patch_template_project() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        let project = Project::at(dir.path());
        let config = test_fixtures::config("https://www.example.com/", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        let result = patch_project(&project, &config, &id).unwrap();
        assert_eq!(result.warnings, Vec::new());
        assert_eq!(result.files.len(), 4);
        assert!(result.files.iter().all(|f| f.changed));

        let gradle = read(dir.path(), FileRole::AppBuildGroovy);
        assert!(gradle.contains("applicationId \"com.example\""));
        assert!(gradle.contains("namespace \"com.example\""));
        assert!(gradle.contains("hostName: 'example.com',"));
        assert!(gradle.contains("name: 'My App',"));
        assert!(gradle.contains("themeColor: '#336699',"));
        assert!(gradle.contains("versionName \"1.0.0\""));

        let manifest = read(dir.path(), FileRole::Manifest);
        assert!(!manifest.contains("package="));
        assert!(manifest.contains("android:host=\"example.com\""));

        let strings = read(dir.path(), FileRole::Strings);
        assert!(strings.contains("<string name=\"app_name\">My App</string>"));
        assert!(strings.contains("<string name=\"host\">example.com</string>"));
        assert!(strings.contains("<string name=\"launchUrl\">https://example.com/</string>"));

        let colors = read(dir.path(), FileRole::Colors);
        assert!(colors.contains("<color name=\"colorPrimary\">#336699</color>"));
        assert!(colors.contains("<color name=\"navigationBarColor\">#000000</color>"));
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        let project = Project::at(dir.path());
        let config = test_fixtures::config("example.com", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        patch_project(&project, &config, &id).unwrap();
        let second = patch_project(&project, &config, &id).unwrap();
        assert!(second.files.iter().all(|f| !f.changed));

        let manifest = second
            .files
            .iter()
            .find(|f| f.role == FileRole::Manifest.label())
            .unwrap();
        assert!(manifest.fields.contains(&"package: absent".to_string()));
    }

    #[test]
    fn test_package_kept_without_build_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        std::fs::remove_file(dir.path().join("app/build.gradle")).unwrap();
        let project = Project::at(dir.path());
        let config = test_fixtures::config("example.com", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        let result = patch_project(&project, &config, &id).unwrap();
        assert!(matches!(result.warnings.as_slice(), [Warning::MissingFile { .. }]));
        assert!(read(dir.path(), FileRole::Manifest).contains("package=\"com.example\""));
    }

    #[test]
    fn test_launcher_name_inserted_when_distinct() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        let project = Project::at(dir.path());
        let mut config = test_fixtures::config("example.com", "My App");
        config.launcher_name = "Mine".into();
        let id = PackageIdentifier::derive(&config.host_name);

        patch_project(&project, &config, &id).unwrap();
        let strings = read(dir.path(), FileRole::Strings);
        assert!(strings.contains("    <string name=\"launcher_name\">Mine</string>\n</resources>"));
    }

    #[test]
    fn test_missing_resources_are_warnings() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        std::fs::remove_file(dir.path().join(FileRole::Colors.relative_path())).unwrap();
        let project = Project::at(dir.path());
        let config = test_fixtures::config("example.com", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        let result = patch_project(&project, &config, &id).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.files.len(), 3);
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        std::fs::remove_file(dir.path().join(FileRole::Manifest.relative_path())).unwrap();
        let project = Project::at(dir.path());
        let config = test_fixtures::config("example.com", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        let err = patch_project(&project, &config, &id).unwrap_err();
        assert!(matches!(err, CustomizeError::ManifestMissing(_)));
    }

    #[test]
    fn test_mixed_case_host_is_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        let project = Project::at(dir.path());
        let config = test_fixtures::config("https://WWW.Example.COM/", "My App");
        let id = PackageIdentifier::derive(&config.host_name);
        assert_eq!(id.as_string(), "com.example");

        patch_project(&project, &config, &id).unwrap();
        assert!(read(dir.path(), FileRole::Manifest).contains("android:host=\"example.com\""));
        assert!(read(dir.path(), FileRole::Strings).contains("<string name=\"host\">example.com</string>"));
        assert!(read(dir.path(), FileRole::AppBuildGroovy).contains("hostName: 'example.com',"));
    }

    #[test]
    fn test_kotlin_dsl_only_project() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        std::fs::remove_file(dir.path().join(FileRole::AppBuildGroovy.relative_path())).unwrap();
        std::fs::write(
            dir.path().join(FileRole::AppBuildKts.relative_path()),
            "android {\n    compileSdk = 34\n    defaultConfig {\n        applicationId = \"com.template.twa\"\n    }\n}\n",
        )
        .unwrap();
        let project = Project::at(dir.path());
        let config = test_fixtures::config("example.com", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        let result = patch_project(&project, &config, &id).unwrap();
        assert_eq!(result.warnings, Vec::new());

        let kts = read(dir.path(), FileRole::AppBuildKts);
        assert!(kts.contains("    namespace = \"com.example\"\n"));
        assert!(kts.contains("applicationId = \"com.example\""));
        assert!(!kts.contains("com.template.twa"));
        assert!(!read(dir.path(), FileRole::Manifest).contains("package="));
    }

    #[cfg(unix)]
    #[test]
    fn test_readonly_manifest_is_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        let manifest = dir.path().join(FileRole::Manifest.relative_path());
        std::fs::set_permissions(&manifest, std::fs::Permissions::from_mode(0o444)).unwrap();
        if std::fs::OpenOptions::new().write(true).open(&manifest).is_ok() {
            // running as root: permission bits are not enforced
            return;
        }
        let project = Project::at(dir.path());
        let config = test_fixtures::config("example.com", "My App");
        let id = PackageIdentifier::derive(&config.host_name);

        let err = patch_project(&project, &config, &id).unwrap_err();
        assert!(matches!(err, CustomizeError::ManifestWrite { .. }));
    }

    #[test]
    fn test_launcher_activity_literals_replaced() {
        let dir = tempfile::tempdir().unwrap();
        test_fixtures::write_template(dir.path());
        let activity = dir.path().join(FileRole::LauncherActivity.relative_path());
        std::fs::create_dir_all(activity.parent().unwrap()).unwrap();
        std::fs::write(
            &activity,
            "webView.loadUrl(\"https://example.com\");\nif (host.equals(\"example.com\")) {\n    return false;\n}\n",
        )
        .unwrap();
        let project = Project::at(dir.path());
        let config = test_fixtures::config("shop.example.org", "Shop");
        let id = PackageIdentifier::derive(&config.host_name);

        let result = patch_project(&project, &config, &id).unwrap();
        assert_eq!(result.warnings, Vec::new());
        assert_eq!(result.files.len(), 5);

        let java = read(dir.path(), FileRole::LauncherActivity);
        assert!(java.contains("webView.loadUrl(\"https://shop.example.org/\");"));
        assert!(java.contains("host.equals(\"shop.example.org\")"));
        assert!(!java.contains("\"example.com\""));

        let second = patch_project(&project, &config, &id).unwrap();
        let report = second
            .files
            .iter()
            .find(|f| f.role == FileRole::LauncherActivity.label())
            .unwrap();
        assert!(!report.changed);
    }
}
