use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use serde_json::{json, Value};

use crate::db::DbPool;
use crate::models::article::Article;
use crate::models::category::{Category, District};
use crate::models::columnist::Columnist;
use crate::models::gallery::Gallery;
use crate::models::pharmacy::PharmacyLink;
use crate::models::poem::Poem;
use crate::models::settings::Setting;
use crate::models::supporter::Supporter;
use crate::models::weekly_photo::WeeklyPhoto;

const SEARCH_LIMIT: i64 = 20;

fn per_page(pool: &DbPool) -> i64 {
    match Setting::get_i64(pool, "articles_per_page") {
        n if n > 0 => n,
        _ => 9,
    }
}

/// 1-based page number and the matching row offset.
fn page_offset(page: Option<i64>, per_page: i64) -> (i64, i64) {
    let current = page.unwrap_or(1).max(1);
    (current, (current - 1) * per_page)
}

fn setting_limit(pool: &DbPool, key: &str, fallback: i64) -> i64 {
    match Setting::get_i64(pool, key) {
        n if n > 0 => n,
        _ => fallback,
    }
}

// ── Front page ─────────────────────────────────────────

#[get("/home")]
pub fn home(pool: &State<DbPool>) -> Json<Value> {
    let columnists: Vec<Value> = Columnist::active_list(pool)
        .into_iter()
        .map(|c| {
            let latest = c.latest_column(pool);
            json!({ "columnist": c, "latest_column": latest })
        })
        .collect();

    Json(json!({
        "headlines": Article::headlines(pool, setting_limit(pool, "headline_count", 10)),
        "breaking": Article::breaking(pool, setting_limit(pool, "breaking_count", 5)),
        "latest": Article::published(pool, per_page(pool), 0),
        "columnists": columnists,
        "categories": Category::list(pool),
        "districts": District::list(pool),
        "weekly_photo": WeeklyPhoto::current(pool),
        "pharmacies": PharmacyLink::list(pool),
    }))
}

// ── Article listing (infinite scroll) ──────────────────

#[get("/articles?<page>")]
pub fn articles(pool: &State<DbPool>, page: Option<i64>) -> Json<Value> {
    let per_page = per_page(pool);
    let (current_page, offset) = page_offset(page, per_page);

    let items = Article::published(pool, per_page, offset);
    let total = Article::count_published(pool);
    let total_pages = (total as f64 / per_page as f64).ceil() as i64;

    Json(json!({
        "articles": items,
        "page": current_page,
        "total_pages": total_pages,
        "has_next": current_page < total_pages,
    }))
}

#[get("/categories/<id>?<page>")]
pub fn category_articles(pool: &State<DbPool>, id: i64, page: Option<i64>) -> Option<Json<Value>> {
    let category = Category::find_by_id(pool, id)?;
    let per_page = per_page(pool);
    let (current_page, offset) = page_offset(page, per_page);
    Some(Json(json!({
        "category": category,
        "articles": Article::by_category(pool, id, per_page, offset),
        "page": current_page,
    })))
}

#[get("/districts/<id>?<page>")]
pub fn district_articles(pool: &State<DbPool>, id: i64, page: Option<i64>) -> Option<Json<Value>> {
    let district = District::find_by_id(pool, id)?;
    let per_page = per_page(pool);
    let (current_page, offset) = page_offset(page, per_page);
    Some(Json(json!({
        "district": district,
        "articles": Article::by_district(pool, id, per_page, offset),
        "page": current_page,
    })))
}

// ── Poems and galleries ────────────────────────────────

#[get("/poems?<page>")]
pub fn poems(pool: &State<DbPool>, page: Option<i64>) -> Json<Vec<Poem>> {
    let per_page = per_page(pool);
    let (_, offset) = page_offset(page, per_page);
    Json(Poem::published(pool, per_page, offset))
}

#[get("/galleries")]
pub fn galleries(pool: &State<DbPool>) -> Json<Vec<Gallery>> {
    Json(Gallery::list(pool))
}

#[get("/galleries/<id>")]
pub fn gallery_detail(pool: &State<DbPool>, id: i64) -> Option<Json<Value>> {
    let gallery = Gallery::find_by_id(pool, id)?;
    let images = gallery.images(pool);
    Some(Json(json!({ "gallery": gallery, "images": images })))
}

// ── Search ─────────────────────────────────────────────

#[get("/search?<q>")]
pub fn search(pool: &State<DbPool>, q: Option<String>) -> Json<Vec<Article>> {
    Json(Article::search(pool, q.as_deref().unwrap_or(""), SEARCH_LIMIT))
}

// ── Sponsors strip ─────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SponsorEntry {
    pub name: String,
    pub label: &'static str,
    pub remaining_days: i64,
}

#[get("/sponsors")]
pub fn sponsors(pool: &State<DbPool>) -> Json<Vec<SponsorEntry>> {
    let now = Utc::now().naive_utc();
    let list = Supporter::sponsors(pool, now)
        .into_iter()
        .map(|s| SponsorEntry {
            remaining_days: s.remaining_days(now),
            label: s.package.label(),
            name: s.name,
        })
        .collect();
    Json(list)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        home,
        articles,
        category_articles,
        district_articles,
        poems,
        galleries,
        gallery_detail,
        search,
        sponsors,
    ]
}

#[cfg(test)]
mod tests {
    use super::page_offset;

    #[test]
    fn pages_start_at_one() {
        assert_eq!(page_offset(None, 9), (1, 0));
        assert_eq!(page_offset(Some(3), 9), (3, 18));
        assert_eq!(page_offset(Some(-2), 9), (1, 0));
    }
}
