use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// "Photo of the week" shown on the front page.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WeeklyPhoto {
    pub id: i64,
    pub title: String,
    pub photographer: String,
    pub image: String,
    pub active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct WeeklyPhotoForm {
    pub title: String,
    pub photographer: String,
    pub image: String,
    pub active: bool,
}

impl WeeklyPhoto {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(WeeklyPhoto {
            id: row.get("id")?,
            title: row.get("title")?,
            photographer: row.get("photographer")?,
            image: row.get("image")?,
            active: row.get("active")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM weekly_photos WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    /// The most recently added active photo.
    pub fn current(pool: &DbPool) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM weekly_photos WHERE active = 1 ORDER BY id DESC LIMIT 1",
            [],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM weekly_photos ORDER BY id DESC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &WeeklyPhotoForm) -> Result<i64, String> {
        if form.title.trim().is_empty() || form.photographer.trim().is_empty() {
            return Err("Title and photographer are required".to_string());
        }
        if form.image.trim().is_empty() {
            return Err("Image is required".to_string());
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO weekly_photos (title, photographer, image, active) VALUES (?1, ?2, ?3, ?4)",
            params![form.title.trim(), form.photographer.trim(), form.image, form.active],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM weekly_photos WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
