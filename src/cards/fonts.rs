use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgb, RgbaImage};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::blend;

/// DejaVu Sans, compiled in so text rendering never depends on the host.
const BUILT_IN_FONT: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

static BUILT_IN_FACE: OnceLock<FontArc> = OnceLock::new();

/// The embedded face, parsed once per process.
fn built_in_face() -> &'static FontArc {
    BUILT_IN_FACE.get_or_init(|| {
        FontArc::try_from_slice(BUILT_IN_FONT).expect("embedded font is a valid TrueType face")
    })
}

/// Where a card font came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    BuiltIn,
}

/// Pick the first candidate `is_usable` accepts; the built-in face is the
/// terminal fallback.
pub fn select_source<F>(candidates: &[PathBuf], mut is_usable: F) -> FontSource
where
    F: FnMut(&Path) -> bool,
{
    candidates
        .iter()
        .find(|p| is_usable(p))
        .map(|p| FontSource::File(p.clone()))
        .unwrap_or(FontSource::BuiltIn)
}

/// A face at a fixed pixel size.
pub struct CardFont {
    font: FontArc,
    scale: PxScale,
    source: FontSource,
}

impl CardFont {
    /// Load the first candidate that exists and parses, else the built-in.
    pub fn load(candidates: &[PathBuf], px: f32) -> Self {
        let mut parsed: Option<FontArc> = None;
        let source = select_source(candidates, |path| {
            match fs::read(path).ok().and_then(|bytes| FontArc::try_from_vec(bytes).ok()) {
                Some(font) => {
                    parsed = Some(font);
                    true
                }
                None => false,
            }
        });

        match (source, parsed) {
            (FontSource::File(path), Some(font)) => {
                debug!("card font {} at {}px", path.display(), px);
                CardFont {
                    font,
                    scale: PxScale::from(px),
                    source: FontSource::File(path),
                }
            }
            _ => {
                debug!("card font: built-in at {}px", px);
                Self::built_in(px)
            }
        }
    }

    pub fn built_in(px: f32) -> Self {
        CardFont {
            font: built_in_face().clone(),
            scale: PxScale::from(px),
            source: FontSource::BuiltIn,
        }
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    pub fn px(&self) -> f32 {
        self.scale.y
    }

    /// Advance width of `A`, used to estimate characters per line.
    pub fn avg_char_width(&self) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        scaled.h_advance(scaled.glyph_id('A'))
    }

    /// Height of an `Ay` line box plus `padding`.
    pub fn line_height(&self, padding: f32) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        scaled.ascent() - scaled.descent() + padding
    }

    pub fn text_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(self.scale);
        let mut width = 0.0f32;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    /// Draw `text` with its line box's top-left corner at (`x`, `y`).
    pub fn draw(&self, canvas: &mut RgbaImage, x: f32, y: f32, text: &str, color: Rgb<u8>) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = y + scaled.ascent();
        let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);

        let mut cursor = x;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                cursor += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(self.scale, ab_glyph::point(cursor, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = gx as i32 + bounds.min.x as i32;
                    let py = gy as i32 + bounds.min.y as i32;
                    if px >= 0 && py >= 0 && px < cw && py < ch {
                        blend(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
                    }
                });
            }
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::solid;

    #[test]
    fn select_first_usable() {
        let candidates = vec![PathBuf::from("/nope/a.ttf"), PathBuf::from("/fonts/b.ttf"), PathBuf::from("/fonts/c.ttf")];
        let source = select_source(&candidates, |p| p.starts_with("/fonts"));
        assert_eq!(source, FontSource::File(PathBuf::from("/fonts/b.ttf")));
    }

    #[test]
    fn select_falls_back_to_built_in() {
        let candidates = vec![PathBuf::from("/nope/a.ttf")];
        assert_eq!(select_source(&candidates, |_| false), FontSource::BuiltIn);
        assert_eq!(select_source(&[], |_| true), FontSource::BuiltIn);
    }

    #[test]
    fn missing_and_corrupt_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.ttf");
        fs::write(&garbage, b"definitely not a font").unwrap();
        let font = CardFont::load(&[dir.path().join("missing.ttf"), garbage], 40.0);
        assert_eq!(font.source(), &FontSource::BuiltIn);
        assert!(font.avg_char_width() > 0.0);
    }

    #[test]
    fn built_in_face_is_parsed_once() {
        assert!(std::ptr::eq(built_in_face(), built_in_face()));
        let a = CardFont::built_in(20.0);
        let b = CardFont::built_in(60.0);
        assert_eq!(a.source(), b.source());
        assert!(b.avg_char_width() > a.avg_char_width());
    }

    #[test]
    fn metrics_scale_with_size() {
        let small = CardFont::built_in(30.0);
        let large = CardFont::built_in(75.0);
        assert!(large.avg_char_width() > small.avg_char_width());
        assert!(large.line_height(15.0) > small.line_height(15.0));
        assert!(small.text_width("ARTVIN") > small.text_width("ART"));
        assert_eq!(small.px(), 30.0);
    }

    #[test]
    fn draw_marks_pixels() {
        let mut canvas = solid(200, 80, Rgb([0, 0, 0]));
        CardFont::built_in(40.0).draw(&mut canvas, 10.0, 10.0, "Hopa", Rgb([255, 255, 255]));
        assert!(canvas.pixels().any(|p| p[0] > 200));
    }

    #[test]
    fn draw_off_canvas_is_clipped() {
        let mut canvas = solid(20, 20, Rgb([0, 0, 0]));
        CardFont::built_in(40.0).draw(&mut canvas, 500.0, 500.0, "x", Rgb([255, 255, 255]));
        assert!(canvas.pixels().all(|p| p[0] == 0));
    }
}
