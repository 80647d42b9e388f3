use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::article::parse_published_at;
use super::{unique_slug, SlugTable};
use crate::db::DbPool;
use crate::embed;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Columnist {
    pub id: i64,
    pub full_name: String,
    pub portrait: Option<String>,
    pub is_chief: bool,
    pub active: bool,
}

/// A columnist's piece.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Column {
    pub id: i64,
    pub columnist_id: i64,
    pub title: String,
    pub slug: String,
    pub body_html: String,
    pub video_link: Option<String>,
    pub active: bool,
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct ColumnForm {
    pub columnist_id: i64,
    pub title: String,
    pub body_html: String,
    pub video_link: Option<String>,
    pub active: bool,
    pub published_at: Option<String>,
}

impl Columnist {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Columnist {
            id: row.get("id")?,
            full_name: row.get("full_name")?,
            portrait: row.get("portrait")?,
            is_chief: row.get("is_chief")?,
            active: row.get("active")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM columnists WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Active columnists, chief columnist pinned first.
    pub fn active_list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM columnists WHERE active = 1 ORDER BY is_chief DESC, full_name ASC",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, full_name: &str, portrait: Option<&str>, is_chief: bool) -> Result<i64, String> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err("Columnist name is required".to_string());
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO columnists (full_name, portrait, is_chief) VALUES (?1, ?2, ?3)",
            params![full_name, portrait, is_chief],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent active piece, shown next to the portrait on the front page.
    pub fn latest_column(&self, pool: &DbPool) -> Option<Column> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM columns WHERE columnist_id = ?1 AND active = 1
             ORDER BY published_at DESC, id DESC LIMIT 1",
            params![self.id],
            Column::from_row,
        )
        .ok()
    }
}

impl Column {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Column {
            id: row.get("id")?,
            columnist_id: row.get("columnist_id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            body_html: row.get("body_html")?,
            video_link: row.get("video_link")?,
            active: row.get("active")?,
            published_at: row.get("published_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM columns WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn by_columnist(pool: &DbPool, columnist_id: i64, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM columns WHERE columnist_id = ?1 AND active = 1
             ORDER BY published_at DESC, id DESC LIMIT ?2",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![columnist_id, limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &ColumnForm) -> Result<i64, String> {
        if form.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        if Columnist::find_by_id(pool, form.columnist_id).is_none() {
            return Err("Unknown columnist".to_string());
        }
        let slug = unique_slug(pool, SlugTable::Columns, &form.title, None)?;
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO columns (columnist_id, title, slug, body_html, video_link, active, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(?7, CURRENT_TIMESTAMP))",
            params![
                form.columnist_id,
                form.title.trim(),
                slug,
                form.body_html,
                form.video_link,
                form.active,
                parse_published_at(&form.published_at),
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn embed_video_url(&self) -> Option<String> {
        self.video_link.as_deref().and_then(embed::video_embed_url)
    }
}
