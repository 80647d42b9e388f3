use chrono::NaiveDateTime;
use rusqlite::{params, Row, ToSql};
use serde::{Deserialize, Serialize};

use super::{unique_slug, SlugTable};
use crate::db::DbPool;
use crate::embed;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body_html: String,
    pub photo: Option<String>,
    pub video_link: Option<String>,
    pub is_breaking: bool,
    pub is_headline: bool,
    pub category_id: i64,
    pub district_id: Option<i64>,
    pub columnist_id: Option<i64>,
    pub active: bool,
    pub published_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct ArticleForm {
    pub title: String,
    pub excerpt: String,
    pub body_html: String,
    pub photo: Option<String>,
    pub video_link: Option<String>,
    pub is_breaking: bool,
    pub is_headline: bool,
    pub category_id: i64,
    pub district_id: Option<i64>,
    pub columnist_id: Option<i64>,
    pub active: bool,
    pub published_at: Option<String>,
}

impl Article {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Article {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            excerpt: row.get("excerpt")?,
            body_html: row.get("body_html")?,
            photo: row.get("photo")?,
            video_link: row.get("video_link")?,
            is_breaking: row.get("is_breaking")?,
            is_headline: row.get("is_headline")?,
            category_id: row.get("category_id")?,
            district_id: row.get("district_id")?,
            columnist_id: row.get("columnist_id")?,
            active: row.get("active")?,
            published_at: row.get("published_at")?,
        })
    }

    fn query(pool: &DbPool, sql: &str, args: &[&dyn ToSql]) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(args, Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM articles WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM articles WHERE slug = ?1",
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Newest first.
    pub fn published(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 ORDER BY published_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            &[&limit, &offset],
        )
    }

    pub fn count_published(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM articles WHERE active = 1", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// Slider on the front page.
    pub fn headlines(pool: &DbPool, limit: i64) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 AND is_headline = 1 ORDER BY published_at DESC, id DESC LIMIT ?1",
            &[&limit],
        )
    }

    /// Ticker of flagged breaking news.
    pub fn breaking(pool: &DbPool, limit: i64) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 AND is_breaking = 1 ORDER BY published_at DESC, id DESC LIMIT ?1",
            &[&limit],
        )
    }

    pub fn by_category(pool: &DbPool, category_id: i64, limit: i64, offset: i64) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 AND category_id = ?1 ORDER BY published_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            &[&category_id, &limit, &offset],
        )
    }

    pub fn by_district(pool: &DbPool, district_id: i64, limit: i64, offset: i64) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 AND district_id = ?1 ORDER BY published_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            &[&district_id, &limit, &offset],
        )
    }

    /// Same category, excluding this article.
    pub fn related(&self, pool: &DbPool, limit: i64) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 AND category_id = ?1 AND id != ?2 ORDER BY published_at DESC, id DESC LIMIT ?3",
            &[&self.category_id, &self.id, &limit],
        )
    }

    /// Case-insensitive (ASCII) match on title or body.
    pub fn search(pool: &DbPool, q: &str, limit: i64) -> Vec<Self> {
        let q = q.trim();
        if q.is_empty() {
            return vec![];
        }
        let pattern = format!("%{}%", q.replace('%', "\\%").replace('_', "\\_"));
        Self::query(
            pool,
            "SELECT * FROM articles WHERE active = 1 AND (title LIKE ?1 ESCAPE '\\' OR body_html LIKE ?1 ESCAPE '\\')
             ORDER BY published_at DESC, id DESC LIMIT ?2",
            &[&pattern, &limit],
        )
    }

    pub fn create(pool: &DbPool, form: &ArticleForm) -> Result<i64, String> {
        if form.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        let slug = unique_slug(pool, SlugTable::Articles, &form.title, None)?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let published_at = parse_published_at(&form.published_at);

        conn.execute(
            "INSERT INTO articles (title, slug, excerpt, body_html, photo, video_link, is_breaking, is_headline,
             category_id, district_id, columnist_id, active, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, COALESCE(?13, CURRENT_TIMESTAMP))",
            params![
                form.title.trim(),
                slug,
                form.excerpt,
                form.body_html,
                form.photo,
                form.video_link,
                form.is_breaking,
                form.is_headline,
                form.category_id,
                form.district_id,
                form.columnist_id,
                form.active,
                published_at,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, form: &ArticleForm) -> Result<(), String> {
        if form.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }
        let slug = unique_slug(pool, SlugTable::Articles, &form.title, Some(id))?;
        let conn = pool.get().map_err(|e| e.to_string())?;

        let published_at = parse_published_at(&form.published_at);

        conn.execute(
            "UPDATE articles SET title=?1, slug=?2, excerpt=?3, body_html=?4, photo=COALESCE(?5, photo),
             video_link=?6, is_breaking=?7, is_headline=?8, category_id=?9, district_id=?10, columnist_id=?11,
             active=?12, published_at=COALESCE(?13, published_at) WHERE id=?14",
            params![
                form.title.trim(),
                slug,
                form.excerpt,
                form.body_html,
                form.photo,
                form.video_link,
                form.is_breaking,
                form.is_headline,
                form.category_id,
                form.district_id,
                form.columnist_id,
                form.active,
                published_at,
                id,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM comments WHERE target_type = 'article' AND target_id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM articles WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Player URL for the dedicated video link field.
    pub fn embed_video_url(&self) -> Option<String> {
        self.video_link.as_deref().and_then(embed::video_embed_url)
    }
}

/// Accepts the `datetime-local` form format and plain SQL timestamps.
pub(crate) fn parse_published_at(value: &Option<String>) -> Option<NaiveDateTime> {
    let s = value.as_deref()?.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
