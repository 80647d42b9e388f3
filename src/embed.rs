use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Player base every resolved identifier is rewritten to.
pub const EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Candidates longer than this are never sniffed.
const MAX_CANDIDATE_LEN: usize = 2048;

const YOUTUBE_HOSTS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

static OPENER: OnceLock<Regex> = OnceLock::new();
static EMBED_URL: OnceLock<Regex> = OnceLock::new();
static SHORT_LINK: OnceLock<Regex> = OnceLock::new();
static SHORTS_PATH: OnceLock<Regex> = OnceLock::new();
static QUERY_PARAM: OnceLock<Regex> = OnceLock::new();
static GENERIC: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("video patterns are static and valid"))
}

/// A resolved video reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRef {
    /// Canonical 11-character identifier.
    Id(String),
    /// Link that already pointed at an embed path; passed through as-is.
    EmbedUrl(String),
}

impl VideoRef {
    /// URL the player iframe should load.
    pub fn src(&self) -> String {
        match self {
            VideoRef::Id(id) => format!("{}{}", EMBED_BASE, id),
            VideoRef::EmbedUrl(url) => url.clone(),
        }
    }
}

type Matcher = fn(&str) -> Option<String>;

/// Identifier matchers, tried in order. First hit wins.
const MATCHERS: &[(&str, Matcher)] = &[
    ("short-link", short_link),
    ("shorts-path", shorts_path),
    ("query-param", query_param),
    ("generic", generic),
];

// ── Matchers ───────────────────────────────────────────

/// `youtube.com/embed/<id>`, kept exactly as written (scheme added if missing).
pub fn embed_path(candidate: &str) -> Option<String> {
    let re = compiled(
        &EMBED_URL,
        r"((?:https?:)?//(?:www\.)?youtube(?:-nocookie)?\.com/embed/[A-Za-z0-9_-]{11}(?:\?[A-Za-z0-9_=&;%.-]*)?)(?:[^A-Za-z0-9_-]|$)",
    );
    let url = re.captures(candidate)?.get(1)?.as_str();
    if url.starts_with("//") {
        Some(format!("https:{}", url))
    } else {
        Some(url.to_string())
    }
}

/// `youtu.be/<id>`
pub fn short_link(candidate: &str) -> Option<String> {
    capture_id(
        &SHORT_LINK,
        r"youtu\.be/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        candidate,
    )
}

/// `shorts/<id>`
pub fn shorts_path(candidate: &str) -> Option<String> {
    capture_id(
        &SHORTS_PATH,
        r"shorts/([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        candidate,
    )
}

/// `?v=<id>` or `&v=<id>`, including the HTML-escaped `&amp;v=` that rich-text
/// fields produce.
pub fn query_param(candidate: &str) -> Option<String> {
    capture_id(
        &QUERY_PARAM,
        r"[?&](?:amp;)?v=([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        candidate,
    )
}

/// Any 11-character token right after `v=` or a path separator. Covers
/// `embed/` and `shorts/` as well, and digs links out of surrounding markup.
pub fn generic(candidate: &str) -> Option<String> {
    capture_id(
        &GENERIC,
        r"(?:v=|/)([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        candidate,
    )
}

fn capture_id(cell: &'static OnceLock<Regex>, pattern: &str, candidate: &str) -> Option<String> {
    compiled(cell, pattern)
        .captures(candidate)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn mentions_youtube(candidate: &str) -> bool {
    let lower = candidate.to_ascii_lowercase();
    YOUTUBE_HOSTS.iter().any(|h| lower.contains(h))
}

/// Resolve a candidate link (or a blob of markup wrapping one) into a player
/// reference. Only candidates that mention a YouTube host are considered.
pub fn resolve(candidate: &str) -> Option<VideoRef> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.len() > MAX_CANDIDATE_LEN || !mentions_youtube(candidate) {
        return None;
    }

    if let Some(url) = embed_path(candidate) {
        return Some(VideoRef::EmbedUrl(url));
    }

    MATCHERS.iter().find_map(|(name, matcher)| {
        let id = matcher(candidate)?;
        log::debug!("video id {} resolved by {} matcher", id, name);
        Some(VideoRef::Id(id))
    })
}

/// The canonical identifier for a candidate, if one can be derived.
pub fn resolve_video_id(candidate: &str) -> Option<String> {
    match resolve(candidate)? {
        VideoRef::Id(id) => Some(id),
        VideoRef::EmbedUrl(url) => generic(&url),
    }
}

/// Convert a dedicated "video link" field into an embed URL.
/// Returns `None` for empty, non-YouTube or unrecognized links.
pub fn video_embed_url(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    let parsed = Url::parse(link).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let on_youtube = YOUTUBE_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{}", h)));
    if !on_youtube {
        return None;
    }
    resolve(link).map(|v| v.src())
}

// ── Markup ─────────────────────────────────────────────

/// 16:9 responsive player container. Contains no bracket or parenthesis
/// characters, so it can never close a notation left open around it.
pub fn embed_markup(video: &VideoRef) -> String {
    format!(
        concat!(
            r#"<div class="video-container" style="position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden; max-width: 100%; margin: 30px 0; border-radius: 8px; background-color: #000;">"#,
            r#"<iframe src="{}" style="position: absolute; top: 0; left: 0; width: 100%; height: 100%; border: 0;" "#,
            r#"loading="lazy" title="YouTube video player" "#,
            r#"allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share" "#,
            r#"referrerpolicy="strict-origin-when-cross-origin" allowfullscreen></iframe></div>"#,
        ),
        video.src().replace('"', "&quot;")
    )
}

// ── Scanner ────────────────────────────────────────────

/// Rewrite every `[video=<url>]` and `(video: <url-or-markup>)` occurrence into
/// player markup. Unresolvable occurrences are dropped; everything else is
/// left alone.
pub fn normalize(text: &str) -> String {
    let mut out = scan(text);
    // A rewrite can splice its neighbours into a fresh notation or balance an
    // opener that was left open. Every pass that changes the text removes
    // delimiters, so the fixpoint is reached.
    loop {
        let next = scan(&out);
        if next == out {
            return out;
        }
        out = next;
    }
}

fn scan(text: &str) -> String {
    let opener = compiled(&OPENER, r"\[video=|\(video:");
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(m) = opener.find(rest) {
        out.push_str(&rest[..m.start()]);
        let after = &rest[m.end()..];
        let close = if m.as_str().starts_with('[') {
            after.find(']')
        } else {
            balanced_close(after)
        };

        match close {
            Some(end) => {
                if let Some(video) = resolve(&after[..end]) {
                    out.push_str(&embed_markup(&video));
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(m.as_str());
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Byte offset of the `)` closing an already-open parenthesis.
fn balanced_close(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeds(html: &str, id: &str) -> usize {
        html.matches(&format!("embed/{}", id)).count()
    }

    #[test]
    fn bracket_short_link() {
        let out = normalize("Watch [video=https://youtu.be/dQw4w9WgXcQ]");
        assert!(out.starts_with("Watch <div class=\"video-container\""));
        assert!(out.contains(r#"src="https://www.youtube.com/embed/dQw4w9WgXcQ""#));
        assert!(!out.contains("[video="));
        assert_eq!(embeds(&out, "dQw4w9WgXcQ"), 1);
    }

    #[test]
    fn block_with_markup_and_extra_params() {
        let input = "(video: <p>https://www.youtube.com/watch?v=abc12345678&t=5s</p>)";
        let out = normalize(input);
        assert_eq!(embeds(&out, "abc12345678"), 1);
        assert!(!out.contains("(video:"));
        assert!(!out.contains("<p>"));
    }

    #[test]
    fn query_param_not_last() {
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?feature=share&v=abc12345678&list=PL1"),
            Some("abc12345678".to_string())
        );
        assert_eq!(
            resolve_video_id("https://www.youtube.com/watch?feature=share&amp;v=abc12345678"),
            Some("abc12345678".to_string())
        );
    }

    #[test]
    fn shorts_link() {
        assert_eq!(
            resolve_video_id("https://youtube.com/shorts/AbCdEfGhI_-?feature=share"),
            Some("AbCdEfGhI_-".to_string())
        );
    }

    #[test]
    fn embed_url_passes_through() {
        let url = "https://www.youtube.com/embed/dQw4w9WgXcQ?start=30";
        assert_eq!(resolve(url), Some(VideoRef::EmbedUrl(url.to_string())));
        let out = normalize(&format!("[video={}]", url));
        assert!(out.contains(&format!(r#"src="{}""#, url)));
    }

    #[test]
    fn no_notation_is_identity() {
        let text = "<p>Artvin'de bugün yağmur var (video yok) [bilgi]</p>";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn empty_notations_are_dropped() {
        assert_eq!(normalize("a[video=]b"), "ab");
        assert_eq!(normalize("a(video:)b"), "ab");
        assert_eq!(normalize("a(video:   )b"), "ab");
    }

    #[test]
    fn unresolvable_is_dropped_without_touching_siblings() {
        let out = normalize("x [video=https://vimeo.com/12345] y [video=https://youtu.be/dQw4w9WgXcQ] z");
        assert!(out.starts_with("x  y <div"));
        assert!(out.ends_with("</div> z"));
        assert!(!out.contains("vimeo"));
    }

    #[test]
    fn consecutive_references() {
        let out = normalize("[video=https://youtu.be/aaaaaaaaaaa][video=https://youtu.be/bbbbbbbbbbb]");
        assert_eq!(embeds(&out, "aaaaaaaaaaa"), 1);
        assert_eq!(embeds(&out, "bbbbbbbbbbb"), 1);
        assert_eq!(out.matches("<iframe").count(), 2);
    }

    #[test]
    fn nested_parentheses_inside_block() {
        let input = r#"(video: <a href="https://youtu.be/dQw4w9WgXcQ" title="klip (resmi)">izle</a>) son"#;
        let out = normalize(input);
        assert_eq!(embeds(&out, "dQw4w9WgXcQ"), 1);
        assert!(out.ends_with("</div> son"));
    }

    #[test]
    fn unterminated_notation_is_left_alone() {
        let text = "devamı [video=https://youtu.be/dQw4w9WgXcQ";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn wrong_length_identifier_rejected() {
        assert_eq!(resolve_video_id("https://youtu.be/short"), None);
        assert_eq!(resolve_video_id("https://youtu.be/waytoolongidentifier"), None);
    }

    #[test]
    fn non_youtube_hosts_never_sniffed() {
        // Eleven-character path segment on an unrelated host.
        assert_eq!(resolve("https://example.com/abcdefghijk"), None);
    }

    #[test]
    fn generic_fallback_accepts_same_length_segment() {
        // Known false positive on YouTube hosts: any 11-char segment qualifies.
        assert_eq!(
            resolve_video_id("https://www.youtube.com/c/abcdefghijk"),
            Some("abcdefghijk".to_string())
        );
    }

    #[test]
    fn idempotent() {
        let samples = [
            "Watch [video=https://youtu.be/dQw4w9WgXcQ] now",
            "(video: <p>https://www.youtube.com/watch?v=abc12345678&t=5s</p>)",
            "(vid[video=nothing]eo: https://youtu.be/dQw4w9WgXcQ)",
            "[video[video=x]=https://youtu.be/dQw4w9WgXcQ]",
            "(video: open [video=https://youtu.be/dQw4w9WgXcQ]",
            "(video: x [video=https://youtu.be/dQw4w9WgXcQ (] )",
            "((video: [video=https://youtu.be/dQw4w9WgXcQ (] ) [video=https://youtu.be/abc12345678 (]",
            "plain text",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {}", s);
        }
    }

    #[test]
    fn rewrite_that_balances_an_open_block_is_settled() {
        // the bracket body swallows a `(`, which closes the outer block
        let out = normalize("(video: x [video=https://youtu.be/dQw4w9WgXcQ (] )");
        assert!(!out.contains("(video:"), "{}", out);
        assert_eq!(embeds(&out, "dQw4w9WgXcQ"), 1);
        assert!(out.starts_with(r#"<div class="video-container""#));
    }

    #[test]
    fn markup_has_no_notation_delimiters() {
        let markup = embed_markup(&VideoRef::Id("dQw4w9WgXcQ".to_string()));
        assert!(!markup.contains(['(', ')', '[', ']']));
        assert!(markup.contains("allowfullscreen"));
        assert!(markup.contains(r#"loading="lazy""#));
        assert!(markup.contains("56.25%"));
    }

    #[test]
    fn video_field_embed_url() {
        assert_eq!(
            video_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=1"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            video_embed_url("https://youtu.be/dQw4w9WgXcQ?si=xyz"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            video_embed_url("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ".to_string())
        );
        assert_eq!(video_embed_url(""), None);
        assert_eq!(video_embed_url("https://notyoutube.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(video_embed_url("not a url"), None);
    }
}
