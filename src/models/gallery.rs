use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Gallery {
    pub id: i64,
    pub title: String,
    pub cover_image: String,
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GalleryImage {
    pub id: i64,
    pub gallery_id: i64,
    pub image: String,
    pub caption: String,
}

impl Gallery {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Gallery {
            id: row.get("id")?,
            title: row.get("title")?,
            cover_image: row.get("cover_image")?,
            published_at: row.get("published_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM galleries WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM galleries ORDER BY published_at DESC, id DESC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, title: &str, cover_image: &str) -> Result<i64, String> {
        if title.trim().is_empty() {
            return Err("Gallery title is required".to_string());
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO galleries (title, cover_image) VALUES (?1, ?2)",
            params![title.trim(), cover_image],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_image(pool: &DbPool, gallery_id: i64, image: &str, caption: Option<&str>) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO gallery_images (gallery_id, image, caption) VALUES (?1, ?2, ?3)",
            params![gallery_id, image, caption.unwrap_or("").trim()],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn images(&self, pool: &DbPool) -> Vec<GalleryImage> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM gallery_images WHERE gallery_id = ?1 ORDER BY id") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![self.id], |row| {
            Ok(GalleryImage {
                id: row.get("id")?,
                gallery_id: row.get("gallery_id")?,
                image: row.get("image")?,
                caption: row.get("caption")?,
            })
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }
}
