#[macro_use]
extern crate rocket;

use log::{info, warn};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::response::content::RawHtml;

mod auth;
mod badges;
mod boot;
mod cards;
mod db;
mod embed;
mod images;
mod models;
mod render;
mod routes;


use cards::CardConfig;
use models::settings::Setting;

/// Holds the admin URL slug, read from DB at startup.
pub struct AdminSlug(pub String);

pub struct NoCacheAdmin;

#[rocket::async_trait]
impl Fairing for NoCacheAdmin {
    fn info(&self) -> Info {
        Info { name: "No-Cache Admin Pages", kind: Kind::Response }
    }

    async fn on_response<'r>(&self, req: &'r rocket::Request<'_>, res: &mut rocket::Response<'r>) {
        let slug = req.rocket().state::<AdminSlug>()
            .map(|s| s.0.as_str())
            .unwrap_or("yonetim");
        let prefix = format!("/{}", slug);
        if req.uri().path().starts_with(&*prefix) {
            res.set_header(Header::new("Cache-Control", "no-store, no-cache, must-revalidate, max-age=0"));
            res.set_header(Header::new("Pragma", "no-cache"));
        }
    }
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>404</h1><p>Sayfa bulunamadı.</p><a href='/'>Ana sayfa</a></body></html>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<html><body style='font-family:sans-serif;text-align:center;padding:80px'><h1>500</h1><p>Sunucu hatası.</p><a href='/'>Ana sayfa</a></body></html>".to_string())
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: verify/create directories before anything touches disk
    boot::run();

    let pool = db::init_pool().expect("Failed to initialize database pool");
    db::run_migrations(&pool).expect("Failed to run database migrations");
    db::seed_defaults(&pool).expect("Failed to seed default settings");

    match auth::cleanup_expired_sessions(&pool) {
        Ok(n) if n > 0 => info!("Removed {} expired admin session(s)", n),
        Ok(_) => {}
        Err(e) => warn!("Session cleanup failed: {}", e),
    }
    boot::check_card_assets(&CardConfig::from_settings(&pool));

    let admin_slug = Setting::get_or(&pool, "admin_slug", "yonetim");
    let admin_mount = format!("/{}", admin_slug);
    let uploads = Setting::get_or(&pool, "images_storage_path", "website/uploads/");

    info!("Admin panel mounted at: {}", admin_mount);

    rocket::build()
        .manage(pool)
        .manage(AdminSlug(admin_slug))
        .attach(NoCacheAdmin)
        .mount("/static", FileServer::from("website/static"))
        .mount("/uploads", FileServer::from(uploads))
        .mount("/", routes::public::routes())
        .mount("/api", routes::api::routes())
        .mount(&admin_mount, routes::admin::routes())
        .mount(&admin_mount, routes::auth::routes())
        .register("/", catchers![not_found, server_error])
}
