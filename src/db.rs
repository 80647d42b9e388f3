use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file("website/db/vizyon.db");
    let pool = Pool::builder().max_size(10).build(manager)?;

    // WAL keeps readers going while an admin saves
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Lookups
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL
        );

        CREATE TABLE IF NOT EXISTS districts (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL
        );

        -- Columnists and their pieces
        CREATE TABLE IF NOT EXISTS columnists (
            id INTEGER PRIMARY KEY,
            full_name TEXT NOT NULL,
            portrait TEXT,
            is_chief INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS columns (
            id INTEGER PRIMARY KEY,
            columnist_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            body_html TEXT NOT NULL DEFAULT '',
            video_link TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            published_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (columnist_id) REFERENCES columnists(id) ON DELETE CASCADE
        );

        -- News articles
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            excerpt TEXT NOT NULL DEFAULT '',
            body_html TEXT NOT NULL DEFAULT '',
            photo TEXT,
            video_link TEXT,
            is_breaking INTEGER NOT NULL DEFAULT 0,
            is_headline INTEGER NOT NULL DEFAULT 0,
            category_id INTEGER NOT NULL,
            district_id INTEGER,
            columnist_id INTEGER,
            active INTEGER NOT NULL DEFAULT 1,
            published_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE,
            FOREIGN KEY (district_id) REFERENCES districts(id) ON DELETE SET NULL,
            FOREIGN KEY (columnist_id) REFERENCES columnists(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_at);

        -- Poetry corner
        CREATE TABLE IF NOT EXISTS poems (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            poet TEXT NOT NULL,
            body_html TEXT NOT NULL DEFAULT '',
            image TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            published_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Photo galleries
        CREATE TABLE IF NOT EXISTS galleries (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            cover_image TEXT NOT NULL,
            published_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS gallery_images (
            id INTEGER PRIMARY KEY,
            gallery_id INTEGER NOT NULL,
            image TEXT NOT NULL,
            caption TEXT NOT NULL DEFAULT '',
            FOREIGN KEY (gallery_id) REFERENCES galleries(id) ON DELETE CASCADE
        );

        -- Front page: photo of the week
        CREATE TABLE IF NOT EXISTS weekly_photos (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            photographer TEXT NOT NULL,
            image TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Front page: on-duty pharmacy links per district
        CREATE TABLE IF NOT EXISTS pharmacy_links (
            id INTEGER PRIMARY KEY,
            district_name TEXT NOT NULL,
            url TEXT NOT NULL,
            sort_order INTEGER NOT NULL DEFAULT 0
        );

        -- Special-occasion greeting pages (card_image is derived)
        CREATE TABLE IF NOT EXISTS greetings (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT '',
            message TEXT NOT NULL DEFAULT '',
            photo TEXT,
            card_image TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Reader comments, attached to exactly one target
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY,
            target_type TEXT NOT NULL,
            target_id INTEGER NOT NULL,
            author_name TEXT NOT NULL,
            author_email TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_comments_target ON comments(target_type, target_id);

        -- Subscribers / donors
        CREATE TABLE IF NOT EXISTS supporters (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            package TEXT NOT NULL DEFAULT 'okur',
            starts_at DATETIME NOT NULL,
            ends_at DATETIME NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        );

        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- Admin sessions
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            created_at DATETIME NOT NULL,
            expires_at DATETIME NOT NULL,
            ip_address TEXT,
            user_agent TEXT
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_name", "Artvin Vizyon"),
        ("site_url", "http://localhost:8000"),
        ("admin_slug", "yonetim"),
        ("session_expiry_hours", "24"),
        // Listing
        ("articles_per_page", "9"),
        ("headline_count", "10"),
        ("breaking_count", "5"),
        ("related_count", "3"),
        // Images
        ("images_storage_path", "website/uploads/"),
        ("images_max_upload_mb", "10"),
        // Social / greeting cards
        ("card_logo_path", "website/assets/logo.png"),
        ("card_fonts_title", ""),
        ("card_fonts_body", ""),
        ("card_fonts_caption", ""),
        ("card_post_background", "#2B1B18"),
        ("card_cta_text", "Detaylar ve haberin devamı için link biyografide ->"),
        ("card_cta_color", "#FFD700"),
        ("greeting_card_size", "1080x1350"),
        ("greeting_card_background", "#0F3D3E"),
        ("greeting_card_accent", "#D4AF37"),
        ("greeting_card_header", "TEBRİKLER"),
        ("greeting_card_subheader", "Artvin Vizyon ailesi olarak içtenlikle kutlarız"),
        // Supporters
        ("supporter_term_days", "30"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed admin password if not set
    let admin_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_password_hash'",
        [],
        |row| row.get(0),
    )?;

    if admin_exists == 0 {
        // Default password: "admin", change it after first login
        let hash = crate::auth::hash_password("admin")?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_password_hash', ?1)",
            params![hash],
        )?;
    }

    Ok(())
}
