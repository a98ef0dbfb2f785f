//! Adaptive icon layers and descriptors (API 26+)

use regex_lite::Regex;

use crate::core::HexColor;

pub const BACKGROUND_DRAWABLE: &str = "ic_launcher_background";
pub const FOREGROUND_NAME: &str = "ic_launcher_foreground";
pub const DESCRIPTOR_DIR: &str = "mipmap-anydpi-v26";

/// Generic glyph used when no catalog vector can be fetched
const FALLBACK_PATH: &str = "M12,2C6.48,2 2,6.48 2,12s4.48,10 10,10 10,-4.48 10,-10S17.52,2 12,2z";

/// Catalog vectors are drawn on a 24x24 viewport
const GLYPH_VIEWPORT: f32 = 24.0;
/// Glyph edge inside the 108 unit canvas, a little under the 66 unit safe zone
const GLYPH_EDGE: f32 = 60.0;

/// Where the foreground layer lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foreground {
    /// `mipmap-*/ic_launcher_foreground.png`
    Raster,
    /// `drawable/ic_launcher_foreground.xml`
    Vector,
}

impl Foreground {
    fn reference(&self) -> String {
        match self {
            Foreground::Raster => format!("@mipmap/{}", FOREGROUND_NAME),
            Foreground::Vector => format!("@drawable/{}", FOREGROUND_NAME),
        }
    }
}

/// Flat 108dp vector in the background color
pub fn background_xml(color: &HexColor) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<vector xmlns:android="http://schemas.android.com/apk/res/android"
    android:width="108dp"
    android:height="108dp"
    android:viewportWidth="108"
    android:viewportHeight="108">
    <path
        android:fillColor="{}"
        android:pathData="M0,0h108v108h-108z" />
</vector>
"#,
        color
    )
}

/// 108dp vector with the glyph paths centred in the safe zone
pub fn foreground_xml(paths: &[String], fill: &str) -> String {
    let scale = GLYPH_EDGE / GLYPH_VIEWPORT;
    let offset = (108.0 - GLYPH_EDGE) / 2.0;
    let body: String = paths
        .iter()
        .map(|data| {
            format!(
                "        <path\n            android:fillColor=\"{}\"\n            android:pathData=\"{}\" />\n",
                fill, data
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<vector xmlns:android="http://schemas.android.com/apk/res/android"
    android:width="108dp"
    android:height="108dp"
    android:viewportWidth="108"
    android:viewportHeight="108">
    <group
        android:scaleX="{scale}"
        android:scaleY="{scale}"
        android:translateX="{offset}"
        android:translateY="{offset}">
{body}    </group>
</vector>
"#,
        scale = scale,
        offset = offset,
        body = body
    )
}

/// Foreground vector using the built-in glyph
pub fn fallback_foreground_xml(fill: &str) -> String {
    foreground_xml(&[FALLBACK_PATH.to_string()], fill)
}

/// Extract `android:pathData` values from a vector drawable
pub fn path_data(xml: &str) -> Vec<String> {
    let Ok(re) = Regex::new(r#"android:pathData\s*=\s*"([^"]+)""#) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `mipmap-anydpi-v26/ic_launcher.xml` (and the identical round variant)
pub fn descriptor_xml(foreground: Foreground) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<adaptive-icon xmlns:android="http://schemas.android.com/apk/res/android">
    <background android:drawable="@drawable/{}" />
    <foreground android:drawable="{}" />
</adaptive-icon>
"#,
        BACKGROUND_DRAWABLE,
        foreground.reference()
    )
}

/// Black or white, whichever reads better on `background`
pub fn contrast_fill(background: &HexColor) -> &'static str {
    let [r, g, b] = background.rgb();
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 160.0 {
        "#FF000000"
    } else {
        "#FFFFFFFF"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_VECTOR: &str = r#"<vector xmlns:android="http://schemas.android.com/apk/res/android"
    android:width="24dp" android:height="24dp" android:viewportWidth="24" android:viewportHeight="24">
  <path android:fillColor="@android:color/white" android:pathData="M10,20v-6h4v6h5v-8h3L12,3 2,12h3v8z"/>
</vector>"#;

    #[test]
    fn test_background_uses_color() {
        let xml = background_xml(&HexColor::parse("#123456").unwrap());
        assert!(xml.contains("android:fillColor=\"#123456\""));
        assert!(xml.contains("android:viewportWidth=\"108\""));
    }

    #[test]
    fn test_foreground_from_catalog_vector() {
        let paths = path_data(CATALOG_VECTOR);
        assert_eq!(paths, ["M10,20v-6h4v6h5v-8h3L12,3 2,12h3v8z"]);

        let xml = foreground_xml(&paths, "#FFFFFFFF");
        assert!(xml.contains("android:scaleX=\"2.5\""));
        assert!(xml.contains("android:translateX=\"24\""));
        assert!(xml.contains("android:pathData=\"M10,20v-6h4v6h5v-8h3L12,3 2,12h3v8z\""));
        assert!(xml.contains("android:fillColor=\"#FFFFFFFF\""));
    }

    #[test]
    fn test_fallback_glyph() {
        assert!(path_data("<vector/>").is_empty());
        assert!(fallback_foreground_xml("#FF000000").contains(FALLBACK_PATH));
    }

    #[test]
    fn test_descriptor_points_at_layers() {
        let raster = descriptor_xml(Foreground::Raster);
        assert!(raster.contains("<background android:drawable=\"@drawable/ic_launcher_background\" />"));
        assert!(raster.contains("<foreground android:drawable=\"@mipmap/ic_launcher_foreground\" />"));

        let vector = descriptor_xml(Foreground::Vector);
        assert!(vector.contains("@drawable/ic_launcher_foreground"));
    }

    #[test]
    fn test_contrast_fill() {
        assert_eq!(contrast_fill(&HexColor::parse("#FFFFFF").unwrap()), "#FF000000");
        assert_eq!(contrast_fill(&HexColor::parse("#171717").unwrap()), "#FFFFFFFF");
    }
}
