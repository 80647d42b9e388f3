use chrono::{Duration, NaiveDateTime};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::settings::Setting;
use crate::db::DbPool;

/// Support tier. Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Okur,
    Gonul,
    Sponsor,
}

impl Package {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "okur" => Some(Package::Okur),
            "gonul" => Some(Package::Gonul),
            "sponsor" => Some(Package::Sponsor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Package::Okur => "okur",
            Package::Gonul => "gonul",
            Package::Sponsor => "sponsor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Package::Okur => "Okur Desteği (250 TL)",
            Package::Gonul => "Gönül Dostu (500 TL)",
            Package::Sponsor => "Sponsor (1.000 TL)",
        }
    }

    /// Badge color class used next to comment authors.
    pub fn color(&self) -> &'static str {
        match self {
            Package::Okur => "blue",
            Package::Gonul => "green",
            Package::Sponsor => "orange",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Supporter {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub package: Package,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub active: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct SupporterForm {
    pub name: String,
    pub email: String,
    pub package: String,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
}

impl Supporter {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let package: String = row.get("package")?;
        Ok(Supporter {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            package: Package::parse(&package).unwrap_or(Package::Okur),
            starts_at: row.get("starts_at")?,
            ends_at: row.get("ends_at")?,
            active: row.get("active")?,
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
            "SELECT * FROM supporters WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        Self::query(pool, "SELECT * FROM supporters ORDER BY starts_at DESC, id DESC", &[])
    }

    /// Flagged active and not yet past their end date.
    pub fn active_at(pool: &DbPool, now: NaiveDateTime) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM supporters WHERE active = 1 AND ends_at >= ?1 ORDER BY starts_at DESC, id DESC",
            &[&now],
        )
    }

    /// Current sponsor-tier supporters, newest first.
    pub fn sponsors(pool: &DbPool, now: NaiveDateTime) -> Vec<Self> {
        Self::query(
            pool,
            "SELECT * FROM supporters WHERE active = 1 AND package = 'sponsor' AND ends_at >= ?1
             ORDER BY starts_at DESC, id DESC",
            &[&now],
        )
    }

    /// A missing end date defaults to the configured term after the start.
    pub fn create(pool: &DbPool, form: &SupporterForm, now: NaiveDateTime) -> Result<i64, String> {
        let name = form.name.trim();
        let email = form.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err("Name and email are required".to_string());
        }
        let package = Package::parse(&form.package)
            .ok_or_else(|| format!("Unknown package '{}'", form.package))?;

        let starts_at = form.starts_at.unwrap_or(now);
        let ends_at = match form.ends_at {
            Some(end) => end,
            None => {
                let days = Setting::get_i64(pool, "supporter_term_days");
                starts_at + Duration::days(if days > 0 { days } else { 30 })
            }
        };
        if ends_at < starts_at {
            return Err("End date is before start date".to_string());
        }

        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO supporters (name, email, package, starts_at, ends_at, active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![name, email, package.as_str(), starts_at, ends_at],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_active(pool: &DbPool, id: i64, active: bool) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE supporters SET active = ?1 WHERE id = ?2",
            params![active, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM supporters WHERE id = ?1", params![id])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.ends_at < now
    }

    /// Whole days left, zero once expired.
    pub fn remaining_days(&self, now: NaiveDateTime) -> i64 {
        if self.is_expired(now) {
            0
        } else {
            (self.ends_at - now).num_days()
        }
    }
}
