use image::{imageops, Rgb, RgbaImage};
use log::warn;
use std::path::Path;

use super::fonts::CardFont;
use super::text::{clamp_input, draw_left_aligned, truncate_excerpt};
use super::{adjust_brightness, crop_fill, encode_jpeg, load_image, scale_to_width, solid, CardConfig};

pub const POST_CANVAS: u32 = 1080;
pub const EXCERPT_LIMIT: usize = 130;

const BACKGROUND_BRIGHTNESS: f32 = 0.25;
const LOGO_WIDTH: u32 = 250;
const LOGO_OFFSET: (i64, i64) = (60, 60);
const TEXT_X: f32 = 100.0;
const TITLE_Y: f32 = 450.0;
const TEXT_WIDTH: u32 = 880;
const EXCERPT_GAP: f32 = 40.0;
const CTA_POSITION: (f32, f32) = (100.0, 980.0);

const TITLE_PX: f32 = 75.0;
const EXCERPT_PX: f32 = 40.0;
const CTA_PX: f32 = 30.0;

const TITLE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const EXCERPT_COLOR: Rgb<u8> = Rgb([220, 220, 220]);

/// Inputs for the square social post.
#[derive(Debug, Clone, Copy)]
pub struct PostCard<'a> {
    pub title: &'a str,
    pub excerpt: Option<&'a str>,
    pub photo: Option<&'a Path>,
    pub logo: Option<&'a Path>,
}

/// Lay out the post card. Always `POST_CANVAS` square.
pub fn compose_post_card(card: &PostCard, config: &CardConfig) -> RgbaImage {
    let mut canvas = match card.photo.and_then(load_image) {
        Some(photo) => {
            let mut bg = crop_fill(&photo, POST_CANVAS, POST_CANVAS);
            adjust_brightness(&mut bg, BACKGROUND_BRIGHTNESS);
            bg
        }
        None => solid(POST_CANVAS, POST_CANVAS, config.post_background),
    };

    if let Some(logo_path) = card.logo.filter(|p| p.exists()) {
        if let Some(logo) = load_image(logo_path) {
            let logo = scale_to_width(&logo, LOGO_WIDTH);
            imageops::overlay(&mut canvas, &logo, LOGO_OFFSET.0, LOGO_OFFSET.1);
        }
    }

    let title_font = CardFont::load(&config.title_fonts, TITLE_PX);
    let excerpt_font = CardFont::load(&config.body_fonts, EXCERPT_PX);
    let cta_font = CardFont::load(&config.caption_fonts, CTA_PX);

    let title = clamp_input(card.title).to_uppercase();
    let next_y = draw_left_aligned(&mut canvas, &title_font, &title, TEXT_X, TITLE_Y, TEXT_WIDTH, TITLE_COLOR);

    if let Some(excerpt) = card.excerpt.map(str::trim).filter(|e| !e.is_empty()) {
        let excerpt = truncate_excerpt(&clamp_input(excerpt), EXCERPT_LIMIT);
        draw_left_aligned(
            &mut canvas,
            &excerpt_font,
            &excerpt,
            TEXT_X,
            next_y + EXCERPT_GAP,
            TEXT_WIDTH,
            EXCERPT_COLOR,
        );
    }

    cta_font.draw(&mut canvas, CTA_POSITION.0, CTA_POSITION.1, &config.cta_text, config.cta_color);
    canvas
}

/// Render the post card as a maximum-quality JPEG.
pub fn render_post_card(card: &PostCard, config: &CardConfig) -> Result<Vec<u8>, String> {
    let canvas = compose_post_card(card, config);
    encode_jpeg(canvas, 100).map_err(|e| {
        warn!("post card encode failed for {:?}: {}", card.title, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgba};
    use std::path::PathBuf;

    fn close(p: &Rgba<u8>, rgb: [u8; 3]) -> bool {
        (0..3).all(|c| (p[c] as i16 - rgb[c] as i16).abs() <= 1)
    }

    fn no_font_config() -> CardConfig {
        CardConfig {
            title_fonts: vec![PathBuf::from("/nonexistent/title.ttf")],
            body_fonts: vec![],
            caption_fonts: vec![],
            ..CardConfig::default()
        }
    }

    #[test]
    fn solid_background_without_photo() {
        let config = no_font_config();
        let card = PostCard { title: "Başlık", excerpt: None, photo: None, logo: None };
        let canvas = compose_post_card(&card, &config);
        assert_eq!(canvas.dimensions(), (POST_CANVAS, POST_CANVAS));
        assert_eq!(*canvas.get_pixel(5, 5), Rgba([43, 27, 24, 255]));
    }

    #[test]
    fn photo_is_cropped_and_dimmed() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("wide.png");
        RgbaImage::from_pixel(1600, 400, Rgba([200, 200, 200, 255])).save(&photo).unwrap();

        let config = no_font_config();
        let card = PostCard { title: "", excerpt: None, photo: Some(photo.as_path()), logo: None };
        let canvas = compose_post_card(&card, &config);
        assert_eq!(canvas.dimensions(), (POST_CANVAS, POST_CANVAS));
        assert!(close(canvas.get_pixel(5, 5), [50, 50, 50]));
    }

    #[test]
    fn unreadable_photo_falls_back_to_fill() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.jpg");
        std::fs::write(&broken, b"not a jpeg").unwrap();

        let card = PostCard {
            title: "Yayla şenlikleri",
            excerpt: Some("Özet"),
            photo: Some(broken.as_path()),
            logo: Some(Path::new("/nonexistent/logo.png")),
        };
        let canvas = compose_post_card(&card, &no_font_config());
        assert_eq!(*canvas.get_pixel(5, 5), Rgba([43, 27, 24, 255]));
    }

    #[test]
    fn logo_is_scaled_and_placed() {
        let dir = tempfile::tempdir().unwrap();
        let logo = dir.path().join("logo.png");
        RgbaImage::from_pixel(500, 100, Rgba([0, 0, 255, 255])).save(&logo).unwrap();

        let card = PostCard { title: "", excerpt: None, photo: None, logo: Some(logo.as_path()) };
        let canvas = compose_post_card(&card, &no_font_config());
        // 250x50 at (60, 60)
        assert!(close(canvas.get_pixel(61, 61), [0, 0, 255]));
        assert!(close(canvas.get_pixel(305, 105), [0, 0, 255]));
        assert_eq!(*canvas.get_pixel(315, 61), Rgba([43, 27, 24, 255]));
        assert_eq!(*canvas.get_pixel(61, 115), Rgba([43, 27, 24, 255]));
    }

    #[test]
    fn jpeg_is_always_canvas_sized() {
        let dir = tempfile::tempdir().unwrap();
        let tall = dir.path().join("tall.png");
        RgbaImage::from_pixel(300, 2000, Rgba([10, 120, 30, 255])).save(&tall).unwrap();

        let long_title = "Hopa limanında yeni dönem başlıyor ".repeat(40);
        let long_excerpt = "Liman işletmesi açıklama yaptı. ".repeat(20);
        for photo in [None, Some(tall.as_path())] {
            let card = PostCard {
                title: &long_title,
                excerpt: Some(&long_excerpt),
                photo,
                logo: None,
            };
            let bytes = render_post_card(&card, &no_font_config()).unwrap();
            let decoded: DynamicImage = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (POST_CANVAS, POST_CANVAS));
        }
    }

    #[test]
    fn title_and_caption_are_drawn() {
        let config = no_font_config();
        let card = PostCard { title: "Artvin", excerpt: Some("Özet metni"), photo: None, logo: None };
        let canvas = compose_post_card(&card, &config);
        let title_band = (450..520).any(|y| (100..600).any(|x| canvas.get_pixel(x, y)[0] > 200));
        assert!(title_band);
        let cta_band = (980..1015).any(|y| (100..900).any(|x| {
            let p = canvas.get_pixel(x, y);
            p[0] > 200 && p[1] > 150 && p[2] < 100
        }));
        assert!(cta_band);
    }
}
