//! Generated share images.
//!
//! Two layouts live here: the square social post for an article and the
//! portrait congratulation card for a greeting page. Both are stateless; every
//! call opens its own buffers and font handles and drops them on return.
//! Asset problems (missing photo, missing logo, missing font) degrade the
//! output instead of failing it.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use log::warn;
use std::path::{Path, PathBuf};

use crate::db::DbPool;
use crate::models::settings::Setting;

pub mod fonts;
pub mod greeting;
pub mod post;
pub mod text;

/// Layout knobs and asset locations shared by both card layouts.
#[derive(Debug, Clone)]
pub struct CardConfig {
    pub logo_path: PathBuf,
    pub title_fonts: Vec<PathBuf>,
    pub body_fonts: Vec<PathBuf>,
    pub caption_fonts: Vec<PathBuf>,
    pub post_background: Rgb<u8>,
    pub cta_text: String,
    pub cta_color: Rgb<u8>,
    pub greeting_size: (u32, u32),
    pub greeting_background: Rgb<u8>,
    pub greeting_accent: Rgb<u8>,
    pub greeting_header: String,
    pub greeting_subheader: String,
    pub uploads_dir: PathBuf,
}

const DEFAULT_TITLE_FONTS: &str = "website/assets/fonts/Georgia-Bold.ttf,/System/Library/Fonts/Supplemental/Georgia Bold.ttf,/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf";
const DEFAULT_BODY_FONTS: &str = "website/assets/fonts/Arial.ttf,/System/Library/Fonts/Supplemental/Arial.ttf,/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
const DEFAULT_CAPTION_FONTS: &str = "website/assets/fonts/Arial-Bold.ttf,/System/Library/Fonts/Supplemental/Arial Bold.ttf,/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

impl Default for CardConfig {
    fn default() -> Self {
        CardConfig {
            logo_path: PathBuf::from("website/assets/logo.png"),
            title_fonts: parse_paths(DEFAULT_TITLE_FONTS),
            body_fonts: parse_paths(DEFAULT_BODY_FONTS),
            caption_fonts: parse_paths(DEFAULT_CAPTION_FONTS),
            post_background: Rgb([43, 27, 24]),
            cta_text: "Detaylar ve haberin devamı için link biyografide ->".to_string(),
            cta_color: Rgb([255, 215, 0]),
            greeting_size: (1080, 1350),
            greeting_background: Rgb([15, 61, 62]),
            greeting_accent: Rgb([212, 175, 55]),
            greeting_header: "TEBRİKLER".to_string(),
            greeting_subheader: "Artvin Vizyon ailesi olarak içtenlikle kutlarız".to_string(),
            uploads_dir: PathBuf::from("website/uploads/"),
        }
    }
}

impl CardConfig {
    /// Read overrides from the settings table; anything unset or unparseable
    /// keeps its default.
    pub fn from_settings(pool: &DbPool) -> Self {
        let d = CardConfig::default();
        let color = |key: &str, fallback: Rgb<u8>| {
            Setting::get(pool, key)
                .and_then(|v| parse_hex_color(&v))
                .unwrap_or(fallback)
        };
        let paths = |key: &str, fallback: Vec<PathBuf>| match Setting::get(pool, key) {
            Some(v) if !v.trim().is_empty() => parse_paths(&v),
            _ => fallback,
        };

        CardConfig {
            logo_path: PathBuf::from(Setting::get_or(pool, "card_logo_path", "website/assets/logo.png")),
            title_fonts: paths("card_fonts_title", d.title_fonts),
            body_fonts: paths("card_fonts_body", d.body_fonts),
            caption_fonts: paths("card_fonts_caption", d.caption_fonts),
            post_background: color("card_post_background", d.post_background),
            cta_text: Setting::get_or(pool, "card_cta_text", &d.cta_text),
            cta_color: color("card_cta_color", d.cta_color),
            greeting_size: Setting::get(pool, "greeting_card_size")
                .and_then(|v| parse_dimensions(&v))
                .unwrap_or(d.greeting_size),
            greeting_background: color("greeting_card_background", d.greeting_background),
            greeting_accent: color("greeting_card_accent", d.greeting_accent),
            greeting_header: Setting::get_or(pool, "greeting_card_header", &d.greeting_header),
            greeting_subheader: Setting::get_or(pool, "greeting_card_subheader", &d.greeting_subheader),
            uploads_dir: PathBuf::from(Setting::get_or(pool, "images_storage_path", "website/uploads/")),
        }
    }
}

fn parse_paths(list: &str) -> Vec<PathBuf> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// `#RGB` or `#RRGGBB`.
pub fn parse_hex_color(hex: &str) -> Option<Rgb<u8>> {
    let hex = hex.trim().strip_prefix('#')?;
    let digit = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some(Rgb([
            digit(&hex[0..1])? * 17,
            digit(&hex[1..2])? * 17,
            digit(&hex[2..3])? * 17,
        ])),
        6 => Some(Rgb([digit(&hex[0..2])?, digit(&hex[2..4])?, digit(&hex[4..6])?])),
        _ => None,
    }
}

/// Smallest canvas side that still fits the portrait and its ring.
pub const MIN_CANVAS_SIDE: u32 = 200;
const MAX_CANVAS_SIDE: u32 = 4096;

/// `WIDTHxHEIGHT`, each side between 200 and 4096.
pub fn parse_dimensions(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once('x')?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    let sides = MIN_CANVAS_SIDE..=MAX_CANVAS_SIDE;
    if sides.contains(&w) && sides.contains(&h) {
        Some((w, h))
    } else {
        None
    }
}

// ── Raster helpers ─────────────────────────────────────

/// Open an image, logging instead of failing.
pub fn load_image(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!("card: could not open image {}: {}", path.display(), e);
            None
        }
    }
}

pub fn solid(width: u32, height: u32, color: Rgb<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([color[0], color[1], color[2], 255]))
}

/// Scale to cover `width`×`height` and center-crop the overflow.
pub fn crop_fill(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    img.resize_to_fill(width, height, FilterType::Lanczos3).to_rgba8()
}

/// Multiply color channels by `factor`; alpha is untouched.
pub fn adjust_brightness(img: &mut RgbaImage, factor: f32) {
    for p in img.pixels_mut() {
        for c in 0..3 {
            p[c] = (p[c] as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Resize to a fixed width keeping aspect ratio.
pub fn scale_to_width(img: &DynamicImage, width: u32) -> RgbaImage {
    let (w, h) = (img.width().max(1), img.height());
    let height = ((h as f64 * width as f64 / w as f64).round() as u32).max(1);
    img.resize_exact(width, height, FilterType::Lanczos3).to_rgba8()
}

/// Crop-to-fill into a `diameter` square and clear everything outside the
/// inscribed circle. Edge pixels get partial alpha.
pub fn circular_crop(img: &DynamicImage, diameter: u32) -> RgbaImage {
    let mut square = crop_fill(img, diameter, diameter);
    let r = diameter as f32 / 2.0;
    for (x, y, p) in square.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        let d = (dx * dx + dy * dy).sqrt();
        let coverage = (r - d + 0.5).clamp(0.0, 1.0);
        p[3] = (p[3] as f32 * coverage).round() as u8;
    }
    square
}

/// Stroke a circle outline of the given thickness centred on (`cx`, `cy`).
pub fn draw_ring(canvas: &mut RgbaImage, cx: f32, cy: f32, radius: f32, thickness: f32, color: Rgb<u8>) {
    let outer = radius + thickness / 2.0;
    let inner = radius - thickness / 2.0;
    let x0 = (cx - outer - 1.0).max(0.0) as u32;
    let y0 = (cy - outer - 1.0).max(0.0) as u32;
    let x1 = ((cx + outer + 1.0) as u32).min(canvas.width());
    let y1 = ((cy + outer + 1.0) as u32).min(canvas.height());
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            let coverage = (outer - d + 0.5).clamp(0.0, 1.0) * (d - inner + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(canvas.get_pixel_mut(x, y), color, coverage);
            }
        }
    }
}

/// Rectangular frame `inset` pixels in from every edge.
pub fn draw_border(canvas: &mut RgbaImage, inset: u32, thickness: u32, color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    if w <= inset * 2 || h <= inset * 2 {
        return;
    }
    let (left, top, right, bottom) = (inset, inset, w - inset, h - inset);
    for (x, y, p) in canvas.enumerate_pixels_mut() {
        let inside_outer = x >= left && x < right && y >= top && y < bottom;
        let inside_inner = x >= left + thickness
            && x + thickness < right
            && y >= top + thickness
            && y + thickness < bottom;
        if inside_outer && !inside_inner {
            *p = Rgba([color[0], color[1], color[2], 255]);
        }
    }
}

/// Alpha-blend `color` over `pixel` at `coverage` (0..=1).
pub fn blend(pixel: &mut Rgba<u8>, color: Rgb<u8>, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    for c in 0..3 {
        pixel[c] = (color[c] as f32 * a + pixel[c] as f32 * (1.0 - a)).round() as u8;
    }
    pixel[3] = pixel[3].max((a * 255.0).round() as u8);
}

/// Drop alpha and encode as baseline JPEG.
pub fn encode_jpeg(canvas: RgbaImage, quality: u8) -> Result<Vec<u8>, String> {
    let rgb: RgbImage = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(&rgb).map_err(|e| e.to_string())?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#FFD700"), Some(Rgb([255, 215, 0])));
        assert_eq!(parse_hex_color("#abc"), Some(Rgb([170, 187, 204])));
        assert_eq!(parse_hex_color("2B1B18"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn dimensions() {
        assert_eq!(parse_dimensions("1080x1350"), Some((1080, 1350)));
        assert_eq!(parse_dimensions(" 800 x 600 "), Some((800, 600)));
        assert_eq!(parse_dimensions("0x100"), None);
        assert_eq!(parse_dimensions("100"), None);
        assert_eq!(parse_dimensions("99999x10"), None);
        assert_eq!(parse_dimensions("1x1"), None);
        assert_eq!(parse_dimensions("199x800"), None);
        assert_eq!(parse_dimensions("200x200"), Some((200, 200)));
    }

    #[test]
    fn crop_fill_always_hits_target_size() {
        for (w, h) in [(4000, 300), (300, 4000), (10, 10), (1080, 1080)] {
            let img = DynamicImage::new_rgb8(w, h);
            let out = crop_fill(&img, 1080, 1080);
            assert_eq!(out.dimensions(), (1080, 1080));
        }
    }

    #[test]
    fn brightness_quarter() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([200, 100, 40, 255]));
        adjust_brightness(&mut img, 0.25);
        assert_eq!(*img.get_pixel(0, 0), Rgba([50, 25, 10, 255]));
    }

    #[test]
    fn circular_crop_clears_corners() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 80, Rgba([9, 9, 9, 255])));
        let out = circular_crop(&img, 40);
        assert_eq!(out.dimensions(), (40, 40));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(39, 39)[3], 0);
        assert_eq!(out.get_pixel(20, 20)[3], 255);
    }

    #[test]
    fn ring_and_border_paint_expected_pixels() {
        let red = Rgb([255, 0, 0]);
        let mut canvas = solid(100, 100, Rgb([0, 0, 0]));
        draw_ring(&mut canvas, 50.0, 50.0, 30.0, 4.0, red);
        assert_eq!(*canvas.get_pixel(80, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(50, 50), Rgba([0, 0, 0, 255]));

        draw_border(&mut canvas, 10, 3, red);
        assert_eq!(*canvas.get_pixel(11, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(5, 50), Rgba([0, 0, 0, 255]));
        assert_eq!(*canvas.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn jpeg_output_decodes() {
        let bytes = encode_jpeg(solid(64, 32, Rgb([10, 20, 30])), 100).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }
}
