use chrono::{NaiveDate, NaiveDateTime, Utc};
use rocket::form::Form;
use rocket::http::{ContentType, Header, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{Request, State};
use serde_json::{json, Value};

use crate::auth::AdminUser;
use crate::cards::greeting::ensure_greeting_card;
use crate::cards::post::{render_post_card, PostCard};
use crate::cards::CardConfig;
use crate::db::DbPool;
use crate::images::{self, ImageKind};
use crate::models::article::{Article, ArticleForm};
use crate::models::category::{Category, District};
use crate::models::columnist::{Column, ColumnForm, Columnist};
use crate::models::comment::Comment;
use crate::models::gallery::Gallery;
use crate::models::greeting::{Greeting, GreetingForm};
use crate::models::pharmacy::{PharmacyLink, PharmacyLinkForm};
use crate::models::poem::{Poem, PoemForm};
use crate::models::supporter::{Supporter, SupporterForm};
use crate::models::weekly_photo::{WeeklyPhoto, WeeklyPhotoForm};

/// JPEG sent as a download rather than shown inline.
pub struct Attachment {
    bytes: Vec<u8>,
    filename: String,
}

impl<'r> Responder<'r, 'static> for Attachment {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut resp = self.bytes.respond_to(req)?;
        resp.set_header(ContentType::JPEG);
        resp.set_header(Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", self.filename),
        ));
        resp.set_header(Header::new("Cache-Control", "no-store"));
        Ok(resp)
    }
}

/// Stores an uploaded image and shrinks it to the budget for `kind`.
fn store_image(pool: &DbPool, bytes: Option<&[u8]>, kind: ImageKind) -> Option<String> {
    let bytes = bytes.filter(|b| !b.is_empty())?;
    match images::save_upload(pool, bytes, None, kind.prefix()) {
        Ok(name) => {
            images::compress_on_save(&images::uploads_dir(pool).join(&name), kind);
            Some(name)
        }
        Err(e) => {
            log::warn!("upload rejected: {}", e);
            None
        }
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDateTime> {
    let s = value.map(str::trim).filter(|s| !s.is_empty())?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok())
}

fn created(result: Result<i64, String>, what: &str) -> Result<Json<Value>, Status> {
    match result {
        Ok(id) => {
            log::info!("{} {} created", what, id);
            Ok(Json(json!({ "id": id })))
        }
        Err(e) => {
            log::warn!("{} not saved: {}", what, e);
            Err(Status::UnprocessableEntity)
        }
    }
}

fn done(result: Result<(), String>, what: &str) -> Status {
    match result {
        Ok(()) => Status::NoContent,
        Err(e) => {
            log::error!("{} failed: {}", what, e);
            Status::InternalServerError
        }
    }
}

// ── Dashboard ──────────────────────────────────────────

#[get("/")]
pub fn dashboard(_admin: AdminUser, pool: &State<DbPool>) -> Json<Value> {
    let now = Utc::now().naive_utc();
    Json(json!({
        "pending_comments": Comment::pending(pool),
        "articles_published": Article::count_published(pool),
        "active_supporters": Supporter::active_at(pool, now).len(),
        "recent_greetings": Greeting::list(pool, 10),
    }))
}

// ── Social card download ───────────────────────────────

#[get("/haber/<id>/social-card")]
pub fn social_card(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Result<Attachment, Status> {
    let article = Article::find_by_id(pool, id).ok_or(Status::NotFound)?;
    let config = CardConfig::from_settings(pool);
    let photo = article.photo.as_deref().map(|p| config.uploads_dir.join(p));

    let card = PostCard {
        title: &article.title,
        excerpt: Some(article.excerpt.as_str()),
        photo: photo.as_deref(),
        logo: Some(config.logo_path.as_path()),
    };

    match render_post_card(&card, &config) {
        Ok(bytes) => {
            log::info!("social card rendered for article {}", id);
            Ok(Attachment {
                bytes,
                filename: format!("insta-post-{}.jpg", id),
            })
        }
        Err(e) => {
            log::error!("social card for article {} failed: {}", id, e);
            Err(Status::InternalServerError)
        }
    }
}

// ── Greetings ──────────────────────────────────────────

#[derive(FromForm)]
pub struct GreetingUpload<'r> {
    pub name: String,
    pub role: Option<String>,
    pub message: Option<String>,
    pub photo: Option<&'r [u8]>,
}

/// Persist the raw fields first, then derive the card as a separate step.
#[post("/greetings", data = "<form>")]
pub fn greetings_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<GreetingUpload<'_>>,
) -> Result<Json<Value>, Status> {
    let photo = store_image(pool, form.photo, ImageKind::Portrait);
    let greeting = GreetingForm {
        name: form.name.clone(),
        role: form.role.clone().unwrap_or_default(),
        message: form.message.clone().unwrap_or_default(),
        photo,
    };

    let id = Greeting::create(pool, &greeting).map_err(|e| {
        log::warn!("greeting not saved: {}", e);
        Status::UnprocessableEntity
    })?;
    let card_image = ensure_greeting_card(pool, id);

    Ok(Json(json!({ "id": id, "card_image": card_image })))
}

#[delete("/greetings/<id>")]
pub fn greetings_delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    done(Greeting::delete(pool, id), "greeting delete")
}

#[post("/greetings/<id>/card")]
pub fn greetings_card(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Result<Json<Value>, Status> {
    if Greeting::find_by_id(pool, id).is_none() {
        return Err(Status::NotFound);
    }
    Ok(Json(json!({ "id": id, "card_image": ensure_greeting_card(pool, id) })))
}

// ── Comments ───────────────────────────────────────────

#[post("/comments/<id>/approve")]
pub fn comments_approve(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    match Comment::approve(pool, id) {
        Ok(()) => Status::NoContent,
        Err(e) => {
            log::warn!("approve failed: {}", e);
            Status::NotFound
        }
    }
}

#[delete("/comments/<id>")]
pub fn comments_delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    done(Comment::delete(pool, id), "comment delete")
}

// ── Articles ───────────────────────────────────────────

#[derive(FromForm)]
pub struct ArticleUpload<'r> {
    pub title: String,
    pub excerpt: Option<String>,
    pub body_html: Option<String>,
    pub video_link: Option<String>,
    pub is_breaking: bool,
    pub is_headline: bool,
    pub category_id: i64,
    pub district_id: Option<i64>,
    pub columnist_id: Option<i64>,
    pub active: Option<bool>,
    pub published_at: Option<String>,
    pub photo: Option<&'r [u8]>,
}

fn article_form(pool: &DbPool, form: &ArticleUpload<'_>) -> ArticleForm {
    ArticleForm {
        title: form.title.clone(),
        excerpt: form.excerpt.clone().unwrap_or_default(),
        body_html: form.body_html.clone().unwrap_or_default(),
        photo: store_image(pool, form.photo, ImageKind::ArticlePhoto),
        video_link: form.video_link.clone().filter(|v| !v.trim().is_empty()),
        is_breaking: form.is_breaking,
        is_headline: form.is_headline,
        category_id: form.category_id,
        district_id: form.district_id,
        columnist_id: form.columnist_id,
        active: form.active.unwrap_or(true),
        published_at: form.published_at.clone().filter(|s| !s.is_empty()),
    }
}

#[post("/articles", data = "<form>")]
pub fn articles_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<ArticleUpload<'_>>,
) -> Result<Json<Value>, Status> {
    match Article::create(pool, &article_form(pool, &form)) {
        Ok(id) => {
            log::info!("article {} created", id);
            let slug = Article::find_by_id(pool, id).map(|a| a.slug);
            Ok(Json(json!({ "id": id, "slug": slug })))
        }
        Err(e) => {
            log::warn!("article not saved: {}", e);
            Err(Status::UnprocessableEntity)
        }
    }
}

/// An empty photo field keeps the stored one.
#[post("/articles/<id>", data = "<form>")]
pub fn articles_update(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<ArticleUpload<'_>>,
) -> Status {
    if Article::find_by_id(pool, id).is_none() {
        return Status::NotFound;
    }
    match Article::update(pool, id, &article_form(pool, &form)) {
        Ok(()) => Status::NoContent,
        Err(e) => {
            log::warn!("article {} not updated: {}", id, e);
            Status::UnprocessableEntity
        }
    }
}

#[delete("/articles/<id>")]
pub fn articles_delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    done(Article::delete(pool, id), "article delete")
}

// ── Taxonomy ───────────────────────────────────────────

#[derive(FromForm)]
pub struct NameSubmit {
    pub name: String,
}

#[post("/categories", data = "<form>")]
pub fn categories_create(_admin: AdminUser, pool: &State<DbPool>, form: Form<NameSubmit>) -> Result<Json<Value>, Status> {
    created(Category::create(pool, &form.name), "category")
}

#[post("/districts", data = "<form>")]
pub fn districts_create(_admin: AdminUser, pool: &State<DbPool>, form: Form<NameSubmit>) -> Result<Json<Value>, Status> {
    created(District::create(pool, &form.name), "district")
}

// ── Columnists and columns ─────────────────────────────

#[derive(FromForm)]
pub struct ColumnistUpload<'r> {
    pub full_name: String,
    pub is_chief: bool,
    pub portrait: Option<&'r [u8]>,
}

#[post("/columnists", data = "<form>")]
pub fn columnists_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<ColumnistUpload<'_>>,
) -> Result<Json<Value>, Status> {
    let portrait = store_image(pool, form.portrait, ImageKind::Portrait);
    created(
        Columnist::create(pool, &form.full_name, portrait.as_deref(), form.is_chief),
        "columnist",
    )
}

#[derive(FromForm)]
pub struct ColumnSubmit {
    pub columnist_id: i64,
    pub title: String,
    pub body_html: Option<String>,
    pub video_link: Option<String>,
    pub active: Option<bool>,
    pub published_at: Option<String>,
}

#[post("/columns", data = "<form>")]
pub fn columns_create(_admin: AdminUser, pool: &State<DbPool>, form: Form<ColumnSubmit>) -> Result<Json<Value>, Status> {
    let column = ColumnForm {
        columnist_id: form.columnist_id,
        title: form.title.clone(),
        body_html: form.body_html.clone().unwrap_or_default(),
        video_link: form.video_link.clone().filter(|v| !v.trim().is_empty()),
        active: form.active.unwrap_or(true),
        published_at: form.published_at.clone().filter(|s| !s.is_empty()),
    };
    created(Column::create(pool, &column), "column")
}

// ── Poems and galleries ────────────────────────────────

#[derive(FromForm)]
pub struct PoemUpload<'r> {
    pub title: String,
    pub poet: String,
    pub body_html: Option<String>,
    pub active: Option<bool>,
    pub image: Option<&'r [u8]>,
}

#[post("/poems", data = "<form>")]
pub fn poems_create(_admin: AdminUser, pool: &State<DbPool>, form: Form<PoemUpload<'_>>) -> Result<Json<Value>, Status> {
    let poem = PoemForm {
        title: form.title.clone(),
        poet: form.poet.clone(),
        body_html: form.body_html.clone().unwrap_or_default(),
        image: store_image(pool, form.image, ImageKind::PoemImage),
        active: form.active.unwrap_or(true),
    };
    created(Poem::create(pool, &poem), "poem")
}

#[derive(FromForm)]
pub struct GalleryUpload<'r> {
    pub title: String,
    pub cover: &'r [u8],
}

#[post("/galleries", data = "<form>")]
pub fn galleries_create(_admin: AdminUser, pool: &State<DbPool>, form: Form<GalleryUpload<'_>>) -> Result<Json<Value>, Status> {
    let cover = store_image(pool, Some(form.cover), ImageKind::GalleryImage).ok_or(Status::UnprocessableEntity)?;
    created(Gallery::create(pool, &form.title, &cover), "gallery")
}

#[derive(FromForm)]
pub struct GalleryImageUpload<'r> {
    pub caption: Option<String>,
    pub image: &'r [u8],
}

#[post("/galleries/<id>/images", data = "<form>")]
pub fn gallery_images_add(
    _admin: AdminUser,
    pool: &State<DbPool>,
    id: i64,
    form: Form<GalleryImageUpload<'_>>,
) -> Result<Json<Value>, Status> {
    Gallery::find_by_id(pool, id).ok_or(Status::NotFound)?;
    let image = store_image(pool, Some(form.image), ImageKind::GalleryImage).ok_or(Status::UnprocessableEntity)?;
    created(Gallery::add_image(pool, id, &image, form.caption.as_deref()), "gallery image")
}

// ── Front page extras ──────────────────────────────────

#[derive(FromForm)]
pub struct WeeklyPhotoUpload<'r> {
    pub title: String,
    pub photographer: String,
    pub active: Option<bool>,
    pub image: &'r [u8],
}

#[post("/weekly-photos", data = "<form>")]
pub fn weekly_photos_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<WeeklyPhotoUpload<'_>>,
) -> Result<Json<Value>, Status> {
    let image = store_image(pool, Some(form.image), ImageKind::WeeklyPhoto).ok_or(Status::UnprocessableEntity)?;
    let photo = WeeklyPhotoForm {
        title: form.title.clone(),
        photographer: form.photographer.clone(),
        image,
        active: form.active.unwrap_or(true),
    };
    created(WeeklyPhoto::create(pool, &photo), "weekly photo")
}

#[delete("/weekly-photos/<id>")]
pub fn weekly_photos_delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    if WeeklyPhoto::find_by_id(pool, id).is_none() {
        return Status::NotFound;
    }
    done(WeeklyPhoto::delete(pool, id), "weekly photo delete")
}

#[derive(FromForm)]
pub struct PharmacySubmit {
    pub district_name: String,
    pub url: String,
    pub sort_order: Option<i64>,
}

#[post("/pharmacies", data = "<form>")]
pub fn pharmacies_create(_admin: AdminUser, pool: &State<DbPool>, form: Form<PharmacySubmit>) -> Result<Json<Value>, Status> {
    let link = PharmacyLinkForm {
        district_name: form.district_name.clone(),
        url: form.url.clone(),
        sort_order: form.sort_order.unwrap_or(0),
    };
    created(PharmacyLink::create(pool, &link), "pharmacy link")
}

#[delete("/pharmacies/<id>")]
pub fn pharmacies_delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    if PharmacyLink::find_by_id(pool, id).is_none() {
        return Status::NotFound;
    }
    done(PharmacyLink::delete(pool, id), "pharmacy link delete")
}

// ── Supporters ─────────────────────────────────────────

#[derive(FromForm)]
pub struct SupporterSubmit {
    pub name: String,
    pub email: String,
    pub package: String,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

#[post("/supporters", data = "<form>")]
pub fn supporters_create(
    _admin: AdminUser,
    pool: &State<DbPool>,
    form: Form<SupporterSubmit>,
) -> Result<Json<Value>, Status> {
    let supporter = SupporterForm {
        name: form.name.clone(),
        email: form.email.clone(),
        package: form.package.clone(),
        starts_at: parse_date(form.starts_at.as_deref()),
        ends_at: parse_date(form.ends_at.as_deref()),
    };

    let id = Supporter::create(pool, &supporter, Utc::now().naive_utc()).map_err(|e| {
        log::warn!("supporter not saved: {}", e);
        Status::UnprocessableEntity
    })?;
    Ok(Json(json!(Supporter::find_by_id(pool, id))))
}

#[derive(FromForm)]
pub struct ActiveSubmit {
    pub active: bool,
}

#[post("/supporters/<id>/active", data = "<form>")]
pub fn supporters_set_active(_admin: AdminUser, pool: &State<DbPool>, id: i64, form: Form<ActiveSubmit>) -> Status {
    if Supporter::find_by_id(pool, id).is_none() {
        return Status::NotFound;
    }
    done(Supporter::set_active(pool, id, form.active), "supporter update")
}

#[delete("/supporters/<id>")]
pub fn supporters_delete(_admin: AdminUser, pool: &State<DbPool>, id: i64) -> Status {
    done(Supporter::delete(pool, id), "supporter delete")
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        dashboard,
        social_card,
        greetings_create,
        greetings_card,
        greetings_delete,
        comments_approve,
        comments_delete,
        articles_create,
        articles_update,
        articles_delete,
        categories_create,
        districts_create,
        columnists_create,
        columns_create,
        poems_create,
        galleries_create,
        gallery_images_add,
        weekly_photos_create,
        weekly_photos_delete,
        pharmacies_create,
        pharmacies_delete,
        supporters_create,
        supporters_set_active,
        supporters_delete,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_from_forms() {
        assert_eq!(
            parse_date(Some("2024-03-01")),
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(
            parse_date(Some("2024-03-01T08:15")),
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(8, 15, 0))
        );
        assert_eq!(parse_date(Some("  ")), None);
        assert_eq!(parse_date(Some("01.03.2024")), None);
        assert_eq!(parse_date(None), None);
    }
}
