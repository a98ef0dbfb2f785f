//! Launcher icon pipeline
//!
//! acquire → clean → emit buckets → adaptive layers → verify.
//! Nothing here is fatal: every problem becomes a `Warning` on the report.

use image::RgbaImage;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::adaptive::{self, Foreground, BACKGROUND_DRAWABLE, DESCRIPTOR_DIR, FOREGROUND_NAME};
use super::render::{self, Density, DENSITIES, MIN_ASSET_BYTES};
use super::source::{IconSources, ImageSource};
use crate::core::{HexColor, Warning};

const LAUNCHER: &str = "ic_launcher";
const LAUNCHER_ROUND: &str = "ic_launcher_round";

/// Result of one pipeline run
#[derive(Debug, Default, Serialize)]
pub struct IconReport {
    /// Standard and round launcher PNGs written across the density buckets
    pub assets_written: usize,
    /// Raster adaptive foreground PNGs, only written for inline sources
    pub foreground_assets: usize,
    /// Name of the source that supplied the image
    pub source: Option<String>,
    /// SHA-256 of the encoded source bytes
    pub sha256: Option<String>,
    pub removed: usize,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

impl IconReport {
    fn warn(&mut self, warning: Warning) {
        tracing::debug!("Icon warning: {}", warning);
        self.warnings.push(warning);
    }
}

struct Acquired {
    image: RgbaImage,
    source: String,
    inline: bool,
    sha256: String,
}

/// Run the pipeline against `res_dir` (the project's `app/src/main/res`)
pub async fn apply(res_dir: &Path, sources: &IconSources, background: &HexColor) -> IconReport {
    let mut report = IconReport::default();

    let Some(acquired) = acquire(&sources.images, &mut report).await else {
        tracing::info!("No icon source available, keeping existing launcher icons");
        return report;
    };
    tracing::info!("Using icon from {} ({}x{})", acquired.source, acquired.image.width(), acquired.image.height());
    report.source = Some(acquired.source.clone());
    report.sha256 = Some(acquired.sha256.clone());

    report.removed = clean(res_dir, &mut report);

    let foreground = if acquired.inline {
        Foreground::Raster
    } else {
        Foreground::Vector
    };
    for density in DENSITIES {
        let (launcher, layer) = emit_bucket(res_dir, density, &acquired.image, foreground, &mut report);
        report.assets_written += launcher;
        report.foreground_assets += layer;
    }

    if let Err(e) = adaptive_icon(res_dir, foreground, sources.foreground.as_deref(), background).await {
        report.warn(Warning::AdaptiveIcon(e.to_string()));
    }

    verify(res_dir, foreground, &mut report);
    tracing::info!(
        "Generated {} launcher icon assets ({} foreground layers)",
        report.assets_written,
        report.foreground_assets
    );
    report
}

async fn acquire(sources: &[Box<dyn ImageSource>], report: &mut IconReport) -> Option<Acquired> {
    for source in sources {
        let loaded = source.load().await.and_then(|bytes| {
            let image = render::decode(&bytes)?;
            Ok((image, bytes))
        });
        match loaded {
            Ok((image, bytes)) => {
                return Some(Acquired {
                    image,
                    source: source.name().to_string(),
                    inline: source.is_inline(),
                    sha256: format!("{:x}", Sha256::digest(&bytes)),
                })
            }
            Err(e) => report.warn(Warning::IconSource {
                source_name: source.name().to_string(),
                message: e.to_string(),
            }),
        }
    }
    None
}

fn is_generated(dir_name: &str, file_name: &str) -> bool {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    match stem {
        LAUNCHER | LAUNCHER_ROUND | FOREGROUND_NAME => true,
        BACKGROUND_DRAWABLE => dir_name.starts_with("drawable"),
        _ => false,
    }
}

/// Delete launcher assets from every `mipmap-*` and `drawable*` directory
fn clean(res_dir: &Path, report: &mut IconReport) -> usize {
    let Ok(entries) = std::fs::read_dir(res_dir) else {
        return 0;
    };
    let mut removed = 0;
    for dir in entries.flatten() {
        let dir_name = dir.file_name().to_string_lossy().into_owned();
        if !(dir_name.starts_with("mipmap-") || dir_name.starts_with("drawable")) || !dir.path().is_dir() {
            continue;
        }
        let Ok(files) = std::fs::read_dir(dir.path()) else {
            continue;
        };
        for file in files.flatten() {
            let file_name = file.file_name().to_string_lossy().into_owned();
            if !is_generated(&dir_name, &file_name) {
                continue;
            }
            match std::fs::remove_file(file.path()) {
                Ok(()) => {
                    tracing::debug!("Removed {}", file.path().display());
                    removed += 1;
                }
                Err(e) => report.warn(Warning::IconAsset {
                    path: file.path(),
                    message: format!("could not remove: {}", e),
                }),
            }
        }
    }
    tracing::debug!("Removed {} previous launcher assets", removed);
    removed
}

/// Returns `(launcher, foreground)` PNG counts written into the bucket
fn emit_bucket(
    res_dir: &Path,
    density: Density,
    source: &RgbaImage,
    foreground: Foreground,
    report: &mut IconReport,
) -> (usize, usize) {
    let dir = res_dir.join(density.dir_name());
    if let Err(e) = std::fs::create_dir_all(&dir) {
        report.warn(Warning::IconAsset {
            path: dir,
            message: e.to_string(),
        });
        return (0, 0);
    }

    let standard = render::resize(source, density.size);
    let round = render::round_mask(&standard);
    let mut images = vec![(LAUNCHER, standard), (LAUNCHER_ROUND, round)];
    if foreground == Foreground::Raster {
        images.push((FOREGROUND_NAME, render::foreground_layer(source, density)));
    }

    let (mut launcher, mut layer) = (0, 0);
    for (name, image) in images {
        let path = dir.join(format!("{}.png", name));
        match render::write_png(&image, &path) {
            Ok(_) if name == FOREGROUND_NAME => layer += 1,
            Ok(_) => launcher += 1,
            Err(e) => report.warn(Warning::IconAsset {
                path,
                message: e.to_string(),
            }),
        }
    }
    (launcher, layer)
}

async fn adaptive_icon(
    res_dir: &Path,
    foreground: Foreground,
    vector_source: Option<&dyn ImageSource>,
    background: &HexColor,
) -> std::io::Result<()> {
    let drawable = res_dir.join("drawable");
    std::fs::create_dir_all(&drawable)?;
    std::fs::write(
        drawable.join(format!("{}.xml", BACKGROUND_DRAWABLE)),
        adaptive::background_xml(background),
    )?;

    if foreground == Foreground::Vector {
        let fill = adaptive::contrast_fill(background);
        let paths = match vector_source {
            Some(source) => match source.load().await {
                Ok(bytes) => adaptive::path_data(&String::from_utf8_lossy(&bytes)),
                Err(e) => {
                    tracing::warn!("Foreground vector from {} unavailable: {}", source.name(), e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let xml = if paths.is_empty() {
            tracing::debug!("Using built-in foreground glyph");
            adaptive::fallback_foreground_xml(fill)
        } else {
            adaptive::foreground_xml(&paths, fill)
        };
        std::fs::write(drawable.join(format!("{}.xml", FOREGROUND_NAME)), xml)?;
    }

    let descriptors = res_dir.join(DESCRIPTOR_DIR);
    std::fs::create_dir_all(&descriptors)?;
    let descriptor = adaptive::descriptor_xml(foreground);
    for name in [LAUNCHER, LAUNCHER_ROUND] {
        std::fs::write(descriptors.join(format!("{}.xml", name)), &descriptor)?;
    }
    Ok(())
}

/// Launcher PNGs in a bucket directory that are large enough to count
fn count_assets(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.starts_with(LAUNCHER) && name.ends_with(".png")
        })
        .filter(|e| e.metadata().map(|m| m.len() >= MIN_ASSET_BYTES).unwrap_or(false))
        .count()
}

fn verify(res_dir: &Path, foreground: Foreground, report: &mut IconReport) {
    let expected = match foreground {
        Foreground::Raster => 3,
        Foreground::Vector => 2,
    };
    for density in DENSITIES {
        let dir: PathBuf = res_dir.join(density.dir_name());
        let actual = count_assets(&dir);
        if actual != expected {
            report.warn(Warning::AssetCountMismatch {
                bucket: density.dir_name(),
                expected,
                actual,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{png_bytes, FakeSource};
    use std::sync::atomic::Ordering;

    fn sources(images: Vec<FakeSource>, foreground: Option<FakeSource>) -> IconSources {
        IconSources {
            images: images.into_iter().map(|s| Box::new(s) as Box<dyn ImageSource>).collect(),
            foreground: foreground.map(|s| Box::new(s) as Box<dyn ImageSource>),
        }
    }

    fn white() -> HexColor {
        HexColor::parse("#FFFFFF").unwrap()
    }

    fn res_with_legacy_icons() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        crate::test_fixtures::write_template(dir.path());
        dir
    }

    fn res(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("app/src/main/res")
    }

    #[tokio::test]
    async fn test_catalog_icon_emits_all_buckets() {
        let dir = res_with_legacy_icons();
        let res_dir = res(&dir);
        let vector = br#"<vector><path android:pathData="M1,1h2v2z"/></vector>"#.to_vec();
        let sources = sources(
            vec![FakeSource::new("catalog:phone", Some(png_bytes(192, 192)))],
            Some(FakeSource::new("foreground:phone", Some(vector))),
        );

        let report = apply(&res_dir, &sources, &white()).await;
        assert_eq!(report.warnings, Vec::new());
        assert_eq!(report.assets_written, 10);
        assert_eq!(report.foreground_assets, 0);
        assert_eq!(report.source.as_deref(), Some("catalog:phone"));
        assert_eq!(report.sha256.as_ref().map(|s| s.len()), Some(64));
        assert_eq!(report.removed, 4);

        for density in DENSITIES {
            let standard = image::open(res_dir.join(density.dir_name()).join("ic_launcher.png")).unwrap();
            assert_eq!(standard.width(), density.size);
            assert!(res_dir.join(density.dir_name()).join("ic_launcher_round.png").is_file());
        }
        assert!(!res_dir.join("mipmap-hdpi/ic_launcher.webp").exists());
        assert!(res_dir.join("drawable/splash.xml").is_file());

        let fg = std::fs::read_to_string(res_dir.join("drawable/ic_launcher_foreground.xml")).unwrap();
        assert!(fg.contains("M1,1h2v2z"));
        let descriptor = std::fs::read_to_string(res_dir.join("mipmap-anydpi-v26/ic_launcher_round.xml")).unwrap();
        assert!(descriptor.contains("@drawable/ic_launcher_foreground"));
    }

    #[tokio::test]
    async fn test_inline_source_wins_and_gets_raster_foreground() {
        let dir = res_with_legacy_icons();
        let res_dir = res(&dir);
        let inline = FakeSource::inline(png_bytes(64, 64));
        let catalog = FakeSource::new("catalog:phone", Some(png_bytes(32, 32)));
        let catalog_calls = catalog.calls.clone();

        let report = apply(&res_dir, &sources(vec![inline, catalog], None), &white()).await;
        assert_eq!(report.source.as_deref(), Some("inline"));
        assert_eq!(report.assets_written, 10);
        assert_eq!(report.foreground_assets, 5);
        assert_eq!(catalog_calls.load(Ordering::SeqCst), 0);

        let fg = image::open(res_dir.join("mipmap-xxxhdpi/ic_launcher_foreground.png")).unwrap();
        assert_eq!(fg.width(), 432);
        assert!(!res_dir.join("drawable/ic_launcher_foreground.xml").exists());
        let descriptor = std::fs::read_to_string(res_dir.join("mipmap-anydpi-v26/ic_launcher.xml")).unwrap();
        assert!(descriptor.contains("@mipmap/ic_launcher_foreground"));
    }

    #[tokio::test]
    async fn test_undecodable_source_falls_through() {
        let dir = res_with_legacy_icons();
        let res_dir = res(&dir);
        let sources = sources(
            vec![
                FakeSource::new("inline", Some(b"not an image".to_vec())),
                FakeSource::new("catalog:phone", Some(png_bytes(48, 48))),
            ],
            None,
        );

        let report = apply(&res_dir, &sources, &white()).await;
        assert_eq!(report.source.as_deref(), Some("catalog:phone"));
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(&report.warnings[0], Warning::IconSource { source_name, .. } if source_name == "inline"));

        let fg = std::fs::read_to_string(res_dir.join("drawable/ic_launcher_foreground.xml")).unwrap();
        assert!(fg.contains("android:fillColor=\"#FF000000\""));
    }

    #[tokio::test]
    async fn test_no_source_leaves_project_untouched() {
        let dir = res_with_legacy_icons();
        let res_dir = res(&dir);
        let sources = sources(vec![FakeSource::new("catalog:phone", None)], None);

        let report = apply(&res_dir, &sources, &white()).await;
        assert_eq!(report.assets_written, 0);
        assert!(report.source.is_none());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(std::fs::read_to_string(res_dir.join("mipmap-hdpi/ic_launcher.png")).unwrap(), "old");
        assert!(res_dir.join("drawable/ic_launcher_background.xml").is_file());
        assert!(!res_dir.join("mipmap-mdpi").exists());
    }

    #[tokio::test]
    async fn test_rerun_is_stable() {
        let dir = res_with_legacy_icons();
        let res_dir = res(&dir);
        let sources = sources(vec![FakeSource::new("catalog:star", Some(png_bytes(96, 96)))], None);

        let first = apply(&res_dir, &sources, &white()).await;
        let second = apply(&res_dir, &sources, &white()).await;
        assert_eq!(first.assets_written, second.assets_written);
        assert_eq!(first.sha256, second.sha256);
        assert!(second.warnings.is_empty());
        // 5 buckets x 2 PNGs, the background and foreground drawables, 2 descriptors
        assert_eq!(second.removed, 14);
    }

    #[test]
    fn test_generated_file_names() {
        assert!(is_generated("mipmap-hdpi", "ic_launcher.webp"));
        assert!(is_generated("mipmap-hdpi", "ic_launcher_round.png"));
        assert!(is_generated("drawable-v24", "ic_launcher_foreground.xml"));
        assert!(is_generated("drawable", "ic_launcher_background.xml"));
        assert!(!is_generated("mipmap-hdpi", "ic_launcher_background.png"));
        assert!(!is_generated("drawable", "splash.xml"));
        assert!(!is_generated("drawable", "ic_launcher_other.xml"));
    }
}
