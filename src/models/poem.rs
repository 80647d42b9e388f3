use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Poem {
    pub id: i64,
    pub title: String,
    pub poet: String,
    pub body_html: String,
    pub image: Option<String>,
    pub active: bool,
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct PoemForm {
    pub title: String,
    pub poet: String,
    pub body_html: String,
    pub image: Option<String>,
    pub active: bool,
}

impl Poem {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Poem {
            id: row.get("id")?,
            title: row.get("title")?,
            poet: row.get("poet")?,
            body_html: row.get("body_html")?,
            image: row.get("image")?,
            active: row.get("active")?,
            published_at: row.get("published_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM poems WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn published(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT * FROM poems WHERE active = 1 ORDER BY published_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &PoemForm) -> Result<i64, String> {
        if form.title.trim().is_empty() || form.poet.trim().is_empty() {
            return Err("Title and poet are required".to_string());
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO poems (title, poet, body_html, image, active) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![form.title.trim(), form.poet.trim(), form.body_html, form.image, form.active],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
