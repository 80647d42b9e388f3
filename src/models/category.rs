use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::{unique_slug, SlugTable};
use crate::db::DbPool;

/// News section ("Gündem", "Spor", …).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// District of the province; articles may optionally be filed under one.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct District {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM categories WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM categories ORDER BY name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, name: &str) -> Result<i64, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Category name is required".to_string());
        }
        let slug = unique_slug(pool, SlugTable::Categories, name, None)?;
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO categories (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}

impl District {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(District {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM districts WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM districts ORDER BY name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, name: &str) -> Result<i64, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("District name is required".to_string());
        }
        let slug = unique_slug(pool, SlugTable::Districts, name, None)?;
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO districts (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
