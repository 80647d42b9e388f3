use rocket::form::Form;
use rocket::http::{CookieJar, Header};
use rocket::response::content::RawHtml;
use rocket::response::{self, Redirect, Responder};
use rocket::{Request, State};

use crate::auth;
use crate::db::DbPool;
use crate::models::settings::Setting;
use crate::AdminSlug;

/// Wrapper that adds no-cache headers to an HTML response
pub struct NoCacheHtml(RawHtml<String>);

impl<'r> Responder<'r, 'static> for NoCacheHtml {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut resp = self.0.respond_to(req)?;
        resp.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
        resp.set_header(Header::new("Pragma", "no-cache"));
        Ok(resp)
    }
}

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub password: String,
}

fn login_html(site_name: &str, admin_slug: &str, error: Option<&str>) -> NoCacheHtml {
    let error_html = error
        .map(|e| format!("<p class=\"error\">{}</p>", e))
        .unwrap_or_default();
    NoCacheHtml(RawHtml(format!(
        r#"<!DOCTYPE html>
<html lang="tr"><head><meta charset="utf-8"><title>Giriş | {site}</title></head>
<body>
<form class="login" method="post" action="/{slug}/login">
<h1>{site}</h1>
{error}
<input type="password" name="password" placeholder="Şifre" required autofocus>
<button type="submit">Giriş</button>
</form>
</body></html>"#,
        site = site_name.replace('<', "&lt;"),
        slug = admin_slug,
        error = error_html,
    )))
}

#[get("/login")]
pub fn login_page(pool: &State<DbPool>, admin_slug: &State<AdminSlug>) -> NoCacheHtml {
    login_html(&Setting::get_or(pool, "site_name", "Artvin Vizyon"), &admin_slug.0, None)
}

#[post("/login", data = "<form>")]
pub fn login_submit(
    form: Form<LoginForm>,
    pool: &State<DbPool>,
    admin_slug: &State<AdminSlug>,
    cookies: &CookieJar<'_>,
    client_ip: Option<std::net::IpAddr>,
) -> Result<Redirect, NoCacheHtml> {
    let site_name = Setting::get_or(pool, "site_name", "Artvin Vizyon");
    let stored_hash = Setting::get(pool, "admin_password_hash").unwrap_or_default();

    if !auth::verify_password(&form.password, &stored_hash) {
        log::warn!("failed admin login attempt");
        return Err(login_html(&site_name, &admin_slug.0, Some("Geçersiz şifre")));
    }

    let ip = client_ip.map(|ip| ip.to_string());
    match auth::create_session(pool, ip.as_deref(), None) {
        Ok(session_id) => {
            auth::set_session_cookie(cookies, &session_id);
            Ok(Redirect::to(format!("/{}", admin_slug.0)))
        }
        Err(e) => {
            log::error!("session creation failed: {}", e);
            Err(login_html(&site_name, &admin_slug.0, Some("Oturum açılamadı")))
        }
    }
}

#[get("/logout")]
pub fn logout(pool: &State<DbPool>, admin_slug: &State<AdminSlug>, cookies: &CookieJar<'_>) -> Redirect {
    if let Some(session_id) = auth::session_id(cookies) {
        let _ = auth::destroy_session(pool, &session_id);
    }
    auth::clear_session_cookie(cookies);
    Redirect::to(format!("/{}/login", admin_slug.0))
}

/// Catch-all for any /<admin_slug>/* GET that failed the AdminUser guard.
#[get("/<_path..>", rank = 99)]
pub fn admin_redirect_to_login(_path: std::path::PathBuf, admin_slug: &State<AdminSlug>) -> Redirect {
    Redirect::to(format!("/{}/login", admin_slug.0))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login_page, login_submit, logout, admin_redirect_to_login]
}
