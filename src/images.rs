use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::DbPool;
use crate::models::settings::Setting;

/// What an upload is used for. Each kind has its own size and quality budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    ArticlePhoto,
    GalleryImage,
    PoemImage,
    Portrait,
    WeeklyPhoto,
}

impl ImageKind {
    /// (longest edge in px, JPEG quality)
    pub fn bounds(self) -> (u32, u8) {
        match self {
            ImageKind::ArticlePhoto | ImageKind::GalleryImage | ImageKind::WeeklyPhoto => (1000, 60),
            ImageKind::PoemImage => (800, 60),
            ImageKind::Portrait => (600, 70),
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            ImageKind::ArticlePhoto => "haber",
            ImageKind::GalleryImage => "galeri",
            ImageKind::PoemImage => "siir",
            ImageKind::Portrait => "portre",
            ImageKind::WeeklyPhoto => "haftanin",
        }
    }
}

pub fn uploads_dir(pool: &DbPool) -> PathBuf {
    PathBuf::from(Setting::get_or(pool, "images_storage_path", "website/uploads/"))
}

/// Store raw upload bytes under a fresh uuid name inside the uploads dir and
/// return the stored file name. The extension comes from the sniffed format,
/// falling back to the client's file name.
pub fn save_upload(pool: &DbPool, bytes: &[u8], original_name: Option<&str>, prefix: &str) -> Result<String, String> {
    if bytes.is_empty() {
        return Err("Empty upload".to_string());
    }
    if !check_file_size(pool, bytes.len()) {
        return Err("Upload exceeds the size limit".to_string());
    }

    let ext = image::guess_format(bytes)
        .ok()
        .and_then(|f| f.extensions_str().first().copied())
        .map(str::to_string)
        .or_else(|| {
            original_name
                .and_then(|n| Path::new(n).extension())
                .and_then(|e| e.to_str())
                .map(str::to_lowercase)
        })
        .unwrap_or_else(|| "jpg".to_string());

    let dir = uploads_dir(pool);
    fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    let filename = format!("{}_{}.{}", prefix, uuid::Uuid::new_v4(), ext);
    fs::write(dir.join(&filename), bytes).map_err(|e| e.to_string())?;
    Ok(filename)
}

/// Downscale and re-encode `path` in place when it exceeds the bound for
/// `kind`. Returns whether the file was rewritten. Any failure leaves the
/// original untouched and is only logged.
pub fn compress_on_save(path: &Path, kind: ImageKind) -> bool {
    match try_compress(path, kind) {
        Ok(changed) => changed,
        Err(e) => {
            warn!("image compression skipped for {}: {}", path.display(), e);
            false
        }
    }
}

fn try_compress(path: &Path, kind: ImageKind) -> Result<bool, String> {
    let (max_edge, quality) = kind.bounds();
    let img = image::open(path).map_err(|e| e.to_string())?;
    let (w, h) = img.dimensions();
    if w <= max_edge && h <= max_edge {
        return Ok(false);
    }

    let resized = img.resize(max_edge, max_edge, FilterType::Lanczos3);
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    let mut buf = Vec::new();
    match format {
        ImageFormat::Png => resized
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| e.to_string())?,
        _ => JpegEncoder::new_with_quality(&mut buf, quality)
            .encode_image(&resized.to_rgb8())
            .map_err(|e| e.to_string())?,
    }
    fs::write(path, &buf).map_err(|e| e.to_string())?;

    let (nw, nh) = resized.dimensions();
    info!("compressed {} from {}x{} to {}x{}", path.display(), w, h, nw, nh);
    Ok(true)
}

/// Check if file size is within the configured limit
pub fn check_file_size(pool: &DbPool, size_bytes: usize) -> bool {
    let max_mb = Setting::get_i64(pool, "images_max_upload_mb").max(1) as usize;
    size_bytes <= max_mb * 1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn bounds_per_kind() {
        assert_eq!(ImageKind::ArticlePhoto.bounds(), (1000, 60));
        assert_eq!(ImageKind::GalleryImage.bounds(), (1000, 60));
        assert_eq!(ImageKind::PoemImage.bounds(), (800, 60));
        assert_eq!(ImageKind::Portrait.bounds(), (600, 70));
        assert_eq!(ImageKind::WeeklyPhoto.bounds(), (1000, 60));
    }

    #[test]
    fn large_jpeg_is_downscaled_keeping_aspect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        RgbImage::from_pixel(2000, 1000, Rgb([90, 140, 200])).save(&path).unwrap();

        assert!(compress_on_save(&path, ImageKind::ArticlePhoto));
        let img = image::open(&path).unwrap();
        assert_eq!(img.dimensions(), (1000, 500));
    }

    #[test]
    fn portrait_bound_applies_to_height() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tall.png");
        RgbImage::from_pixel(300, 1200, Rgb([1, 2, 3])).save(&path).unwrap();

        assert!(compress_on_save(&path, ImageKind::Portrait));
        let img = image::open(&path).unwrap();
        assert_eq!(img.dimensions(), (150, 600));
    }

    #[test]
    fn small_images_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.jpg");
        RgbImage::from_pixel(640, 480, Rgb([10, 10, 10])).save(&path).unwrap();
        let before = fs::read(&path).unwrap();

        assert!(!compress_on_save(&path, ImageKind::PoemImage));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn garbage_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not an image").unwrap();
        assert!(!compress_on_save(&path, ImageKind::GalleryImage));
        assert_eq!(fs::read(&path).unwrap(), b"definitely not an image");
    }
}
