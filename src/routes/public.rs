use chrono::Utc;
use rocket::form::Form;
use rocket::response::content::RawHtml;
use rocket::response::Redirect;
use rocket::State;
use serde_json::{json, Value};

use crate::badges;
use crate::db::DbPool;
use crate::models::article::Article;
use crate::models::category::Category;
use crate::models::columnist::{Column, Columnist};
use crate::models::comment::{Comment, CommentForm, CommentTarget};
use crate::models::poem::Poem;
use crate::models::settings::Setting;
use crate::models::supporter::Supporter;
use crate::render;

/// Approved comments for `target` with supporter badges resolved.
fn badged_comments(pool: &DbPool, target: CommentTarget) -> Value {
    let now = Utc::now().naive_utc();
    let comments = Comment::for_target(pool, target);
    let supporters = Supporter::active_at(pool, now);
    json!(badges::annotate(comments, &supporters, now))
}

// ── Article ────────────────────────────────────────────

#[get("/haber/<id>?<yorum>")]
pub fn article_detail(pool: &State<DbPool>, id: i64, yorum: Option<bool>) -> Option<RawHtml<String>> {
    let article = Article::find_by_id(pool, id)?;
    if !article.active {
        return None;
    }
    let related_count = Setting::get_i64(pool, "related_count").max(1);

    let context = json!({
        "settings": Setting::all(pool),
        "page_title": article.title,
        "article": article,
        "category": Category::find_by_id(pool, article.category_id),
        "related": article.related(pool, related_count),
        "video_embed": article.embed_video_url(),
        "comments": badged_comments(pool, CommentTarget::Article(article.id)),
        "comment_received": yorum.unwrap_or(false),
    });

    Some(RawHtml(render::render_page("article", &context)))
}

// ── Column ─────────────────────────────────────────────

#[get("/yazi/<id>?<yorum>")]
pub fn column_detail(pool: &State<DbPool>, id: i64, yorum: Option<bool>) -> Option<RawHtml<String>> {
    let column = Column::find_by_id(pool, id)?;
    if !column.active {
        return None;
    }

    let context = json!({
        "settings": Setting::all(pool),
        "page_title": column.title,
        "columnist": Columnist::find_by_id(pool, column.columnist_id),
        "video_embed": column.embed_video_url(),
        "comments": badged_comments(pool, CommentTarget::Column(column.id)),
        "comment_received": yorum.unwrap_or(false),
        "column": column,
    });

    Some(RawHtml(render::render_page("column", &context)))
}

// ── Poem ───────────────────────────────────────────────

#[get("/siir/<id>?<yorum>")]
pub fn poem_detail(pool: &State<DbPool>, id: i64, yorum: Option<bool>) -> Option<RawHtml<String>> {
    let poem = Poem::find_by_id(pool, id)?;
    if !poem.active {
        return None;
    }

    let context = json!({
        "settings": Setting::all(pool),
        "page_title": poem.title,
        "comments": badged_comments(pool, CommentTarget::Poem(poem.id)),
        "comment_received": yorum.unwrap_or(false),
        "poem": poem,
    });

    Some(RawHtml(render::render_page("poem", &context)))
}

// ── Comment submission ─────────────────────────────────

#[derive(Debug, FromForm)]
pub struct CommentSubmit {
    pub author_name: String,
    pub author_email: Option<String>,
    pub body: String,
    pub honeypot: Option<String>,
}

impl From<&CommentSubmit> for CommentForm {
    fn from(s: &CommentSubmit) -> Self {
        CommentForm {
            author_name: s.author_name.clone(),
            author_email: s.author_email.clone().unwrap_or_default(),
            body: s.body.clone(),
            honeypot: s.honeypot.clone(),
        }
    }
}

/// Stores the comment unapproved and sends the reader back to the page.
/// Unknown targets 404; invalid submissions just bounce back.
fn submit_comment(pool: &DbPool, target: CommentTarget, form: &CommentSubmit, back: String) -> Option<Redirect> {
    let exists = match target {
        CommentTarget::Article(id) => Article::find_by_id(pool, id).is_some_and(|a| a.active),
        CommentTarget::Column(id) => Column::find_by_id(pool, id).is_some_and(|c| c.active),
        CommentTarget::Poem(id) => Poem::find_by_id(pool, id).is_some_and(|p| p.active),
    };
    if !exists {
        return None;
    }

    match Comment::create(pool, target, &CommentForm::from(form)) {
        Ok(id) => {
            log::info!("comment {} queued for moderation on {} {}", id, target.kind(), target.id());
            Some(Redirect::to(format!("{}?yorum=true", back)))
        }
        Err(e) => {
            log::warn!("comment rejected on {} {}: {}", target.kind(), target.id(), e);
            Some(Redirect::to(back))
        }
    }
}

#[post("/haber/<id>/yorum", data = "<form>")]
pub fn article_comment(pool: &State<DbPool>, id: i64, form: Form<CommentSubmit>) -> Option<Redirect> {
    submit_comment(pool, CommentTarget::Article(id), &form, format!("/haber/{}", id))
}

#[post("/yazi/<id>/yorum", data = "<form>")]
pub fn column_comment(pool: &State<DbPool>, id: i64, form: Form<CommentSubmit>) -> Option<Redirect> {
    submit_comment(pool, CommentTarget::Column(id), &form, format!("/yazi/{}", id))
}

#[post("/siir/<id>/yorum", data = "<form>")]
pub fn poem_comment(pool: &State<DbPool>, id: i64, form: Form<CommentSubmit>) -> Option<Redirect> {
    submit_comment(pool, CommentTarget::Poem(id), &form, format!("/siir/{}", id))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        article_detail,
        column_detail,
        poem_detail,
        article_comment,
        column_comment,
        poem_comment,
    ]
}
