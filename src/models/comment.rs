use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// What a comment hangs off. Stored as `target_type` + `target_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentTarget {
    Article(i64),
    Column(i64),
    Poem(i64),
}

impl CommentTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            CommentTarget::Article(_) => "article",
            CommentTarget::Column(_) => "column",
            CommentTarget::Poem(_) => "poem",
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            CommentTarget::Article(id) | CommentTarget::Column(id) | CommentTarget::Poem(id) => id,
        }
    }

    fn from_parts(kind: &str, id: i64) -> Option<Self> {
        match kind {
            "article" => Some(CommentTarget::Article(id)),
            "column" => Some(CommentTarget::Column(id)),
            "poem" => Some(CommentTarget::Poem(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
    pub id: i64,
    pub target: CommentTarget,
    pub author_name: String,
    pub author_email: String,
    pub body: String,
    pub approved: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct CommentForm {
    pub author_name: String,
    pub author_email: String,
    pub body: String,
    pub honeypot: Option<String>,
}

impl Comment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind: String = row.get("target_type")?;
        let target_id: i64 = row.get("target_id")?;
        let target = CommentTarget::from_parts(&kind, target_id).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(0, kind.clone(), rusqlite::types::Type::Text)
        })?;
        Ok(Comment {
            id: row.get("id")?,
            target,
            author_name: row.get("author_name")?,
            author_email: row.get("author_email")?,
            body: row.get("body")?,
            approved: row.get("approved")?,
            created_at: row.get("created_at")?,
        })
    }

    fn query(pool: &DbPool, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Vec<Self> {
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
        conn.query_row(
            "SELECT * FROM comments WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    /// Approved comments for a page, oldest first.
    pub fn for_target(pool: &DbPool, target: CommentTarget) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM comments WHERE target_type = ?1 AND target_id = ?2 AND approved = 1
             ORDER BY created_at ASC, id ASC",
            &[&target.kind(), &target.id()],
        )
    }

    /// Moderation queue.
    pub fn pending(pool: &DbPool) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM comments WHERE approved = 0 ORDER BY created_at DESC, id DESC",
            &[],
        )
    }

    /// Reader submissions always land unapproved.
    pub fn create(pool: &DbPool, target: CommentTarget, form: &CommentForm) -> Result<i64, String> {
        if form.honeypot.as_deref().is_some_and(|hp| !hp.is_empty()) {
            return Err("Spam detected".to_string());
        }
        let name = form.author_name.trim();
        let body = form.body.trim();
        if name.is_empty() || body.is_empty() {
            return Err("Name and comment are required".to_string());
        }

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO comments (target_type, target_id, author_name, author_email, body, approved)
             VALUES (?1, ?2, ?3, ?4, ?5, 0)",
            params![target.kind(), target.id(), name, form.author_email.trim(), body],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn approve(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let changed = conn
            .execute("UPDATE comments SET approved = 1 WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        if changed == 0 {
            return Err(format!("Comment {} not found", id));
        }
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM comments WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
