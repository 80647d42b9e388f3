use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::db::DbPool;

/// Link to a district's on-duty pharmacy list.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PharmacyLink {
    pub id: i64,
    pub district_name: String,
    pub url: String,
    pub sort_order: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct PharmacyLinkForm {
    pub district_name: String,
    pub url: String,
    pub sort_order: i64,
}

impl PharmacyLink {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PharmacyLink {
            id: row.get("id")?,
            district_name: row.get("district_name")?,
            url: row.get("url")?,
            sort_order: row.get("sort_order")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM pharmacy_links WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    /// All links in display order.
    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM pharmacy_links ORDER BY sort_order ASC, id ASC") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Only absolute http(s) links are stored.
    pub fn create(pool: &DbPool, form: &PharmacyLinkForm) -> Result<i64, String> {
        let district = form.district_name.trim();
        if district.is_empty() {
            return Err("District name is required".to_string());
        }
        let url = Url::parse(form.url.trim()).map_err(|e| format!("Invalid URL: {}", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err("URL must be http or https".to_string());
        }

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO pharmacy_links (district_name, url, sort_order) VALUES (?1, ?2, ?3)",
            params![district, url.as_str(), form.sort_order],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM pharmacy_links WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
