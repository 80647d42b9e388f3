use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::cards::fonts::{select_source, FontSource};
use crate::cards::CardConfig;

/// Required directories that will be created if missing
const REQUIRED_DIRS: &[&str] = &[
    "website",
    "website/db",
    "website/uploads",
    "website/uploads/cards",
    "website/assets",
    "website/assets/fonts",
    "website/static",
    "website/static/css",
];

/// Run all boot checks. Call this before Rocket launches.
/// Creates missing directories and aborts if the database directory is
/// unusable.
pub fn run() {
    info!("Vizyon boot check starting...");

    let mut warnings = 0u32;
    let mut errors = 0u32;

    // ── 1. Directories ─────────────────────────────────
    for dir in REQUIRED_DIRS {
        let path = Path::new(dir);
        if !path.exists() {
            match fs::create_dir_all(path) {
                Ok(_) => info!("  Created directory: {}", dir),
                Err(e) => {
                    error!("  FAILED to create directory {}: {}", dir, e);
                    errors += 1;
                }
            }
        }
    }

    // ── 2. Writable dirs ───────────────────────────────
    for (dir, critical) in [("website/db", true), ("website/uploads/cards", false)] {
        let path = Path::new(dir);
        if !path.exists() {
            continue;
        }
        let test_file = path.join(".write_test");
        match fs::write(&test_file, "test") {
            Ok(_) => {
                let _ = fs::remove_file(&test_file);
            }
            Err(e) if critical => {
                error!("  {} not writable: {}", dir, e);
                errors += 1;
            }
            Err(e) => {
                warn!("  {} not writable: {} (cards and uploads will fail)", dir, e);
                warnings += 1;
            }
        }
    }

    // ── 3. Rocket.toml exists ──────────────────────────
    if !Path::new("Rocket.toml").exists() {
        warn!("  Rocket.toml not found, using default config");
        warnings += 1;
    }

    // ── Summary ─────────────────────────────────────────
    if errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            errors, warnings
        );
        process::exit(1);
    }

    if warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some features may not work correctly.",
            warnings
        );
    } else {
        info!("Boot check passed. All systems go.");
    }
}

/// Logo and font candidates, checked once settings are loaded. Missing ones
/// only degrade card output. Returns the number of warnings logged.
pub fn check_card_assets(config: &CardConfig) -> u32 {
    let mut warnings = 0;
    if !config.logo_path.exists() {
        warn!("  Card logo missing: {} (cards render without it)", config.logo_path.display());
        warnings += 1;
    }
    for (role, candidates) in [
        ("title", &config.title_fonts),
        ("body", &config.body_fonts),
        ("caption", &config.caption_fonts),
    ] {
        if select_source(candidates, |p| p.is_file()) == FontSource::BuiltIn {
            warn!("  No {} font found, cards fall back to the built-in face", role);
            warnings += 1;
        }
    }
    warnings
}
