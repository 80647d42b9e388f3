use image::{Rgb, RgbaImage};

use super::fonts::CardFont;

/// Longest text a card will lay out; anything past this is ignored.
pub const MAX_INPUT_CHARS: usize = 2000;

/// Used when a face reports no usable advance width.
const FALLBACK_CHAR_WIDTH: f32 = 20.0;

pub fn clamp_input(text: &str) -> String {
    text.chars().take(MAX_INPUT_CHARS).collect()
}

/// How many average-width characters fit in `max_width` pixels (at least one).
pub fn chars_per_line(max_width: u32, avg_char: f32) -> usize {
    let avg = if avg_char.is_finite() && avg_char > 0.0 {
        avg_char
    } else {
        FALLBACK_CHAR_WIDTH
    };
    ((max_width as f32 / avg) as usize).max(1)
}

/// Greedy word wrap at `width` characters. Runs of whitespace collapse to a
/// single space; a word longer than `width` is split across lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        let mut start = 0usize;
        while start < chars.len() {
            let remaining = chars.len() - start;
            let needed = if line_len == 0 { remaining } else { line_len + 1 + remaining };

            if needed <= width {
                if line_len > 0 {
                    line.push(' ');
                    line_len += 1;
                }
                line.extend(&chars[start..]);
                line_len += remaining;
                start = chars.len();
            } else if line_len > 0 {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            } else {
                line.extend(&chars[start..start + width]);
                lines.push(std::mem::take(&mut line));
                start += width;
            }
        }
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines
}

/// Cut to `limit` characters and append an ellipsis when longer.
pub fn truncate_excerpt(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() > limit {
        let mut cut: String = text.chars().take(limit).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Word-wrap `text` to `max_width` pixels and draw it left-aligned from
/// (`x`, `y`). Lines that would start below the canvas are skipped.
/// Returns the y just below the last line.
pub fn draw_left_aligned(
    canvas: &mut RgbaImage,
    font: &CardFont,
    text: &str,
    x: f32,
    y: f32,
    max_width: u32,
    color: Rgb<u8>,
) -> f32 {
    let per_line = chars_per_line(max_width, font.avg_char_width());
    let line_height = font.line_height(15.0);
    let mut current = y;
    for line in wrap(text, per_line) {
        if current >= canvas.height() as f32 {
            break;
        }
        font.draw(canvas, x, current, &line, color);
        current += line_height;
    }
    current
}

/// Draw one line horizontally centred on `center_x`.
pub fn draw_centered(canvas: &mut RgbaImage, font: &CardFont, text: &str, center_x: f32, y: f32, color: Rgb<u8>) {
    let x = (center_x - font.text_width(text) / 2.0).max(0.0);
    font.draw(canvas, x, y, text, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap("Artvin'de   sonbahar  renkleri\nbüyülüyor", 16);
        assert_eq!(lines, vec!["Artvin'de", "sonbahar", "renkleri", "büyülüyor"]);
        let lines = wrap("a b c d e f", 5);
        assert_eq!(lines, vec!["a b c", "d e f"]);
    }

    #[test]
    fn splits_words_longer_than_a_line() {
        let lines = wrap("kısa çokuzunbirkelimeburada son", 6);
        assert_eq!(lines, vec!["kısa", "çokuzu", "nbirke", "limebu", "rada", "son"]);
    }

    #[test]
    fn empty_and_blank_text() {
        assert!(wrap("", 10).is_empty());
        assert!(wrap("   \n\t ", 10).is_empty());
    }

    #[test]
    fn lines_never_exceed_width() {
        let title = "Karadeniz sahil yolunda heyelan nedeniyle ulaşım kontrollü olarak sağlanıyor ve ekipler bölgede çalışmalarını sürdürüyor";
        for width in 1..40 {
            for line in wrap(title, width) {
                assert!(line.chars().count() <= width, "{:?} wider than {}", line, width);
            }
        }
    }

    #[test]
    fn estimated_pixel_width_within_limit() {
        let font = CardFont::built_in(75.0);
        let avg = font.avg_char_width();
        let max_width = 880;
        let per_line = chars_per_line(max_width, avg);
        let title = "ÇORUH NEHRİ ÜZERİNDE YENİ KÖPRÜNÜN TEMELİ ATILDI VE İLÇE HALKI TÖRENE YOĞUN İLGİ GÖSTERDİ".repeat(3);
        for line in wrap(&title, per_line) {
            let estimated = line.chars().count() as f32 * avg;
            assert!(estimated <= max_width as f32 + avg);
        }
    }

    #[test]
    fn chars_per_line_guards() {
        assert_eq!(chars_per_line(880, 44.0), 20);
        assert_eq!(chars_per_line(10, 44.0), 1);
        assert_eq!(chars_per_line(100, 0.0), 5);
        assert_eq!(chars_per_line(100, f32::NAN), 5);
    }

    #[test]
    fn excerpt_truncation() {
        let short = "Kısa özet.";
        assert_eq!(truncate_excerpt(short, 130), short);
        let long = "ş".repeat(200);
        let cut = truncate_excerpt(&long, 130);
        assert_eq!(cut.chars().count(), 133);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_excerpt(&"a".repeat(130), 130), "a".repeat(130));
    }

    #[test]
    fn clamp_input_caps_length() {
        let long = "ğ".repeat(MAX_INPUT_CHARS + 50);
        assert_eq!(clamp_input(&long).chars().count(), MAX_INPUT_CHARS);
    }

    #[test]
    fn draw_left_aligned_advances_per_line() {
        let font = CardFont::built_in(40.0);
        let mut canvas = crate::cards::solid(400, 400, Rgb([0, 0, 0]));
        let end = draw_left_aligned(&mut canvas, &font, "bir iki üç dört beş altı", 10.0, 10.0, 150, Rgb([255, 255, 255]));
        let lines = wrap("bir iki üç dört beş altı", chars_per_line(150, font.avg_char_width())).len();
        assert!(lines > 1);
        let expected = 10.0 + lines as f32 * font.line_height(15.0);
        assert!((end - expected).abs() < 0.01);
    }

    #[test]
    fn draw_stops_below_canvas() {
        let font = CardFont::built_in(40.0);
        let mut canvas = crate::cards::solid(200, 100, Rgb([0, 0, 0]));
        let text = "kelime ".repeat(200);
        let end = draw_left_aligned(&mut canvas, &font, &text, 0.0, 0.0, 200, Rgb([255, 255, 255]));
        assert!(end >= 100.0);
        assert!(end < 100.0 + font.line_height(15.0) + 0.01);
    }
}
