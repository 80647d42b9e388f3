use image::{imageops, DynamicImage, Rgb, RgbaImage};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::fonts::CardFont;
use super::text::{clamp_input, draw_centered, wrap};
use super::{draw_border, draw_ring, circular_crop, encode_jpeg, load_image, solid, CardConfig, MIN_CANVAS_SIDE};
use crate::db::DbPool;
use crate::models::greeting::Greeting;

const BORDER_INSET: u32 = 30;
const BORDER_THICKNESS: u32 = 6;
const HEADER_Y: f32 = 80.0;
const SUBHEADER_Y: f32 = 175.0;
const PORTRAIT_TOP: f32 = 250.0;
const PORTRAIT_RATIO: f32 = 0.4;
const RING_GAP: f32 = 6.0;
const RING_THICKNESS: f32 = 8.0;
const NAME_GAP: f32 = 40.0;
const ROLE_GAP: f32 = 20.0;
const MESSAGE_GAP: f32 = 50.0;
const MESSAGE_WRAP: usize = 38;
const MESSAGE_LINE: f32 = 50.0;
const BOTTOM_MARGIN: f32 = 60.0;

const HEADER_PX: f32 = 72.0;
const SUBHEADER_PX: f32 = 34.0;
const NAME_PX: f32 = 56.0;
const ROLE_PX: f32 = 36.0;
const MESSAGE_PX: f32 = 34.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const ROLE_COLOR: Rgb<u8> = Rgb([220, 220, 220]);

#[derive(Debug, Clone, Copy)]
pub struct GreetingCard<'a> {
    pub name: &'a str,
    pub role: &'a str,
    pub message: &'a str,
    pub photo: Option<&'a DynamicImage>,
}

/// Portrait-oriented congratulation card on the brand background.
pub fn compose_greeting_card(card: &GreetingCard, config: &CardConfig) -> RgbaImage {
    let (width, height) = config.greeting_size;
    let (width, height) = (width.max(MIN_CANVAS_SIDE), height.max(MIN_CANVAS_SIDE));
    let mut canvas = solid(width, height, config.greeting_background);
    draw_border(&mut canvas, BORDER_INSET, BORDER_THICKNESS, config.greeting_accent);

    let center_x = width as f32 / 2.0;
    let header_font = CardFont::load(&config.title_fonts, HEADER_PX);
    let subheader_font = CardFont::load(&config.body_fonts, SUBHEADER_PX);
    let name_font = CardFont::load(&config.title_fonts, NAME_PX);
    let role_font = CardFont::load(&config.caption_fonts, ROLE_PX);
    let message_font = CardFont::load(&config.body_fonts, MESSAGE_PX);

    draw_centered(&mut canvas, &header_font, &config.greeting_header, center_x, HEADER_Y, config.greeting_accent);
    draw_centered(&mut canvas, &subheader_font, &config.greeting_subheader, center_x, SUBHEADER_Y, WHITE);

    let diameter = (width.min(height) as f32 * PORTRAIT_RATIO).round() as u32;
    let radius = diameter as f32 / 2.0;
    if let Some(photo) = card.photo {
        let portrait = circular_crop(photo, diameter);
        let left = (center_x - radius).round() as i64;
        imageops::overlay(&mut canvas, &portrait, left, PORTRAIT_TOP as i64);
        draw_ring(
            &mut canvas,
            center_x,
            PORTRAIT_TOP + radius,
            radius + RING_GAP,
            RING_THICKNESS,
            config.greeting_accent,
        );
    }

    let mut y = PORTRAIT_TOP + diameter as f32 + NAME_GAP;
    let name = clamp_input(card.name).to_uppercase();
    draw_centered(&mut canvas, &name_font, &name, center_x, y, WHITE);
    y += name_font.line_height(0.0) + ROLE_GAP;

    let role = clamp_input(card.role);
    if !role.trim().is_empty() {
        draw_centered(&mut canvas, &role_font, role.trim(), center_x, y, ROLE_COLOR);
        y += role_font.line_height(0.0);
    }

    let message = clamp_input(card.message);
    if !message.trim().is_empty() {
        let quoted = format!("\"{}\"", message.trim());
        let limit = height as f32 - BOTTOM_MARGIN;
        y += MESSAGE_GAP;
        for line in wrap(&quoted, MESSAGE_WRAP) {
            if y + message_font.line_height(0.0) > limit {
                break;
            }
            draw_centered(&mut canvas, &message_font, &line, center_x, y, WHITE);
            y += MESSAGE_LINE;
        }
    }

    canvas
}

pub fn render_greeting_card(card: &GreetingCard, config: &CardConfig) -> Result<Vec<u8>, String> {
    encode_jpeg(compose_greeting_card(card, config), 95)
}

/// Where the derived card lives, relative to the uploads dir.
pub fn card_file_name(greeting_id: i64) -> String {
    format!("cards/greeting-{}.jpg", greeting_id)
}

/// Make sure greeting `id` has a rendered card on disk and recorded in the
/// row. Returns the stored relative path, if any. An unreadable portrait,
/// a render failure or a write failure is logged and leaves the greeting
/// untouched.
pub fn ensure_greeting_card(pool: &DbPool, id: i64) -> Option<String> {
    let greeting = Greeting::find_by_id(pool, id)?;
    let config = CardConfig::from_settings(pool);
    ensure_with_config(pool, &greeting, &config)
}

pub(crate) fn ensure_with_config(pool: &DbPool, greeting: &Greeting, config: &CardConfig) -> Option<String> {
    let photo_path = match greeting.photo.as_deref().filter(|p| !p.is_empty()) {
        Some(p) => resolve(&config.uploads_dir, p),
        None => return greeting.card_image.clone(),
    };

    if let Some(existing) = greeting.card_image.as_deref() {
        if resolve(&config.uploads_dir, existing).exists() {
            return Some(existing.to_string());
        }
    }

    // no portrait, no card
    let photo = match load_image(&photo_path) {
        Some(img) => img,
        None => {
            warn!(
                "greeting {}: portrait {} unreadable, card not generated",
                greeting.id,
                photo_path.display()
            );
            return None;
        }
    };

    let card = GreetingCard {
        name: &greeting.name,
        role: &greeting.role,
        message: &greeting.message,
        photo: Some(&photo),
    };
    let bytes = match render_greeting_card(&card, config) {
        Ok(b) => b,
        Err(e) => {
            error!("greeting card {} render failed: {}", greeting.id, e);
            return None;
        }
    };

    let relative = card_file_name(greeting.id);
    let target = config.uploads_dir.join(&relative);
    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            error!("cannot create {}: {}", parent.display(), e);
            return None;
        }
    }
    if let Err(e) = fs::write(&target, &bytes) {
        error!("cannot write greeting card {}: {}", target.display(), e);
        return None;
    }
    if let Err(e) = Greeting::set_card_image(pool, greeting.id, &relative) {
        warn!("greeting {} card written but not recorded: {}", greeting.id, e);
        return None;
    }

    info!("greeting card generated: {}", relative);
    Some(relative)
}

fn resolve(uploads_dir: &Path, stored: &str) -> PathBuf {
    let p = Path::new(stored);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        uploads_dir.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    fn config() -> CardConfig {
        CardConfig {
            title_fonts: vec![],
            body_fonts: vec![],
            caption_fonts: vec![],
            ..CardConfig::default()
        }
    }

    #[test]
    fn canvas_uses_configured_size() {
        let mut cfg = config();
        cfg.greeting_size = (800, 1000);
        let card = GreetingCard { name: "Ayşe Yılmaz", role: "Öğretmen", message: "Başarılar", photo: None };
        let canvas = compose_greeting_card(&card, &cfg);
        assert_eq!(canvas.dimensions(), (800, 1000));
        assert_eq!(*canvas.get_pixel(5, 5), Rgba([15, 61, 62, 255]));
        // border band
        assert_eq!(*canvas.get_pixel(32, 500), Rgba([212, 175, 55, 255]));
    }

    #[test]
    fn tiny_configured_canvas_is_clamped() {
        let mut cfg = config();
        cfg.greeting_size = (1, 1);
        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba([0, 0, 255, 255])));
        let card = GreetingCard { name: "Ali", role: "", message: "Tebrikler", photo: Some(&photo) };
        let canvas = compose_greeting_card(&card, &cfg);
        assert_eq!(canvas.dimensions(), (MIN_CANVAS_SIDE, MIN_CANVAS_SIDE));
    }

    #[test]
    fn portrait_is_circular_with_ring() {
        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(600, 600, Rgba([250, 0, 0, 255])));

        let card = GreetingCard { name: "", role: "", message: "", photo: Some(&photo) };
        let canvas = compose_greeting_card(&card, &config());
        // diameter 432, centred at (540, 466)
        let centre = canvas.get_pixel(540, 466);
        assert!(centre[0] > 240 && centre[1] < 10);
        // square corner of the portrait stays background
        assert_eq!(*canvas.get_pixel(330, 256), Rgba([15, 61, 62, 255]));
        // ring just outside the photo edge
        let ring = canvas.get_pixel(540, 250 + 432 + 6);
        assert!(ring[0] > 150 && ring[1] > 120);
    }

    #[test]
    fn long_message_stays_on_canvas() {
        let msg = "Yeni görevinizde başarılar dileriz ".repeat(200);
        let card = GreetingCard { name: "Mehmet", role: "Müdür", message: &msg, photo: None };
        let bytes = render_greeting_card(&card, &config()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (1080, 1350));
        let canvas = decoded.to_rgba8();
        // bottom margin untouched apart from the border
        for x in 100..980 {
            let p = canvas.get_pixel(x, 1350 - 45);
            assert!((p[0] as i16 - 15).abs() <= 4, "pixel at {} is {:?}", x, p);
        }
    }

    #[test]
    fn card_file_names_are_deterministic() {
        assert_eq!(card_file_name(7), "cards/greeting-7.jpg");
        assert_eq!(resolve(Path::new("up"), "a.jpg"), PathBuf::from("up/a.jpg"));
        assert_eq!(resolve(Path::new("up"), "/abs/a.jpg"), PathBuf::from("/abs/a.jpg"));
    }
}
