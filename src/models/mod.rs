use rusqlite::params;

use crate::db::DbPool;

pub mod article;
pub mod category;
pub mod columnist;
pub mod comment;
pub mod gallery;
pub mod greeting;
pub mod pharmacy;
pub mod poem;
pub mod settings;
pub mod supporter;
pub mod weekly_photo;

/// Tables that carry a unique `slug` column.
#[derive(Debug, Clone, Copy)]
pub enum SlugTable {
    Articles,
    Columns,
    Categories,
    Districts,
}

impl SlugTable {
    fn name(self) -> &'static str {
        match self {
            SlugTable::Articles => "articles",
            SlugTable::Columns => "columns",
            SlugTable::Categories => "categories",
            SlugTable::Districts => "districts",
        }
    }
}

/// Slugify `source` and append `-2`, `-3`, … until it is free in `table`.
/// Rows matching `except_id` don't count as collisions (for updates).
pub fn unique_slug(pool: &DbPool, table: SlugTable, source: &str, except_id: Option<i64>) -> Result<String, String> {
    let mut base = slug::slugify(source);
    if base.is_empty() {
        base = "icerik".to_string();
    }

    let conn = pool.get().map_err(|e| e.to_string())?;
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE slug = ?1 AND id != ?2",
        table.name()
    );
    let except = except_id.unwrap_or(-1);

    let mut candidate = base.clone();
    let mut n = 2;
    loop {
        let taken: i64 = conn
            .query_row(&sql, params![candidate, except], |row| row.get(0))
            .map_err(|e| e.to_string())?;
        if taken == 0 {
            return Ok(candidate);
        }
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
}
