use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// Congratulation post. `card_image` is derived from the other fields and
/// only ever written through [`Greeting::set_card_image`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Greeting {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub message: String,
    pub photo: Option<String>,
    pub card_image: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct GreetingForm {
    pub name: String,
    pub role: String,
    pub message: String,
    pub photo: Option<String>,
}

impl Greeting {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Greeting {
            id: row.get("id")?,
            name: row.get("name")?,
            role: row.get("role")?,
            message: row.get("message")?,
            photo: row.get("photo")?,
            card_image: row.get("card_image")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM greetings WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, limit: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM greetings ORDER BY created_at DESC, id DESC LIMIT ?1") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Persists the raw fields only; the card is produced by a separate step.
    pub fn create(pool: &DbPool, form: &GreetingForm) -> Result<i64, String> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO greetings (name, role, message, photo) VALUES (?1, ?2, ?3, ?4)",
            params![name, form.role.trim(), form.message.trim(), form.photo],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_card_image(pool: &DbPool, id: i64, card_image: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE greetings SET card_image = ?1 WHERE id = ?2",
            params![card_image, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM greetings WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
