//! Raster icon rendering: decode, resample, mask, encode

use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use std::io::BufWriter;
use std::path::Path;

use super::source::IconError;

/// Files smaller than this are treated as failed writes
pub const MIN_ASSET_BYTES: u64 = 64;

/// Adaptive icon canvas and safe zone, in dp
const ADAPTIVE_CANVAS_DP: u32 = 108;
const ADAPTIVE_SAFE_ZONE_DP: u32 = 66;

/// A launcher icon resolution bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    pub name: &'static str,
    /// Legacy launcher icon edge in pixels
    pub size: u32,
}

pub const DENSITIES: [Density; 5] = [
    Density { name: "mdpi", size: 48 },
    Density { name: "hdpi", size: 72 },
    Density { name: "xhdpi", size: 96 },
    Density { name: "xxhdpi", size: 144 },
    Density { name: "xxxhdpi", size: 192 },
];

impl Density {
    pub fn dir_name(&self) -> String {
        format!("mipmap-{}", self.name)
    }

    /// Edge of the adaptive foreground layer (108dp at this density)
    pub fn foreground_size(&self) -> u32 {
        self.size * ADAPTIVE_CANVAS_DP / 48
    }
}

/// Decode any supported format and normalize to 8-bit RGBA
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, IconError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Fit into a `size`×`size` square, keeping the aspect ratio and padding
/// with transparency
pub fn resize(source: &RgbaImage, size: u32) -> RgbaImage {
    let (w, h) = source.dimensions();
    if w == h {
        return imageops::resize(source, size, size, FilterType::Lanczos3);
    }
    let scale = size as f64 / w.max(h) as f64;
    let fit = |edge: u32| ((edge as f64 * scale).round() as u32).clamp(1, size);
    let (fit_w, fit_h) = (fit(w), fit(h));
    let fitted = imageops::resize(source, fit_w, fit_h, FilterType::Lanczos3);

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    imageops::overlay(&mut canvas, &fitted, ((size - fit_w) / 2) as i64, ((size - fit_h) / 2) as i64);
    canvas
}

/// Clip to a circle inscribed in the image, anti-aliasing the edge
pub fn round_mask(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    let (w, h) = out.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let radius = cx.min(cy);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
        pixel[3] = (pixel[3] as f32 * coverage).round() as u8;
    }
    out
}

/// Transparent adaptive foreground canvas with the source centred in the
/// safe zone
pub fn foreground_layer(source: &RgbaImage, density: Density) -> RgbaImage {
    let canvas_size = density.foreground_size();
    let inner = canvas_size * ADAPTIVE_SAFE_ZONE_DP / ADAPTIVE_CANVAS_DP;
    let glyph = resize(source, inner);

    let mut canvas = RgbaImage::from_pixel(canvas_size, canvas_size, Rgba([0, 0, 0, 0]));
    let offset = ((canvas_size - inner) / 2) as i64;
    imageops::overlay(&mut canvas, &glyph, offset, offset);
    canvas
}

/// Encode as PNG and verify the file landed with a plausible size
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<u64, IconError> {
    let file = std::fs::File::create(path)?;
    let encoder = PngEncoder::new_with_quality(BufWriter::new(file), CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)?;

    let len = std::fs::metadata(path)?.len();
    if len < MIN_ASSET_BYTES {
        return Err(IconError::TooSmall(len));
    }
    tracing::debug!("Wrote {} ({} bytes)", path.display(), len);
    Ok(len)
}
