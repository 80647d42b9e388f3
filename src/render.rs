use serde_json::Value;

use crate::embed;

/// Renders a full page for `template_type` from a JSON context built by the
/// public routes. Unknown types fall back to the 404 body.
pub fn render_page(template_type: &str, context: &Value) -> String {
    let settings = context.get("settings").cloned().unwrap_or_default();
    let sg = |key: &str, def: &str| -> String {
        settings.get(key).and_then(|v| v.as_str()).unwrap_or(def).to_string()
    };

    let body_html = match template_type {
        "article" => render_article(context),
        "column" => render_column(context),
        "poem" => render_poem(context),
        _ => render_404(context),
    };

    let site_name = sg("site_name", "Artvin Vizyon");
    let page_title = context
        .get("page_title")
        .and_then(|v| v.as_str())
        .map(|t| format!("{} | {}", t, site_name))
        .unwrap_or_else(|| site_name.clone());

    format!(
        r#"<!DOCTYPE html>
<html lang="tr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/css/site.css">
</head>
<body>
<header class="site-header"><a href="/" class="site-logo">{site}</a></header>
<main class="site-main">
{body}
</main>
<footer class="site-footer"><p>&copy; {year} {site}</p></footer>
</body>
</html>"#,
        title = html_escape(&page_title),
        site = html_escape(&site_name),
        body = body_html,
        year = chrono::Utc::now().format("%Y"),
    )
}

fn render_article(context: &Value) -> String {
    let article = match context.get("article") {
        Some(a) => a,
        None => return render_404(context),
    };
    let id = article.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
    let title = str_field(article, "title");
    let excerpt = str_field(article, "excerpt");
    let photo = str_field(article, "photo");
    let date = format_date(str_field(article, "published_at"));

    let mut html = format!(
        "<article class=\"news-single\">\n    <h1>{}</h1>",
        html_escape(title)
    );
    if let Some(category) = context.get("category") {
        html.push_str(&format!(
            "\n    <div class=\"news-meta\"><span class=\"category\">{}</span> <time>{}</time></div>",
            html_escape(str_field(category, "name")),
            date
        ));
    } else {
        html.push_str(&format!("\n    <div class=\"news-meta\"><time>{}</time></div>", date));
    }
    if !excerpt.is_empty() {
        html.push_str(&format!("<p class=\"lead\">{}</p>", html_escape(excerpt)));
    }
    if !photo.is_empty() {
        html.push_str(&format!(
            r#"<div class="featured-image"><img src="/uploads/{}" alt="{}"></div>"#,
            html_escape(photo),
            html_escape(title)
        ));
    }

    html.push_str(&build_video(context));
    html.push_str(&format!(
        r#"<div class="news-content">{}</div>"#,
        embed::normalize(str_field(article, "body_html"))
    ));

    if let Some(Value::Array(related)) = context.get("related") {
        if !related.is_empty() {
            html.push_str("<aside class=\"related\"><h3>İlgili Haberler</h3><ul>");
            for r in related {
                html.push_str(&format!(
                    "<li><a href=\"/haber/{}\">{}</a></li>",
                    r.get("id").and_then(|v| v.as_i64()).unwrap_or(0),
                    html_escape(str_field(r, "title"))
                ));
            }
            html.push_str("</ul></aside>");
        }
    }

    html.push_str(&build_comments_section(context, &format!("/haber/{}/yorum", id)));
    html.push_str("</article>");
    html
}

fn render_column(context: &Value) -> String {
    let column = match context.get("column") {
        Some(c) => c,
        None => return render_404(context),
    };
    let id = column.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
    let title = str_field(column, "title");

    let mut html = String::from("<article class=\"column-single\">");
    if let Some(author) = context.get("columnist") {
        let portrait = str_field(author, "portrait");
        html.push_str("<div class=\"columnist\">");
        if !portrait.is_empty() {
            html.push_str(&format!(
                r#"<img class="portrait" src="/uploads/{}" alt="{}">"#,
                html_escape(portrait),
                html_escape(str_field(author, "full_name"))
            ));
        }
        html.push_str(&format!(
            "<span class=\"name\">{}</span></div>",
            html_escape(str_field(author, "full_name"))
        ));
    }
    html.push_str(&format!(
        "\n    <h1>{}</h1>\n    <time>{}</time>",
        html_escape(title),
        format_date(str_field(column, "published_at"))
    ));
    html.push_str(&build_video(context));
    html.push_str(&format!(
        r#"<div class="column-content">{}</div>"#,
        embed::normalize(str_field(column, "body_html"))
    ));
    html.push_str(&build_comments_section(context, &format!("/yazi/{}/yorum", id)));
    html.push_str("</article>");
    html
}

fn render_poem(context: &Value) -> String {
    let poem = match context.get("poem") {
        Some(p) => p,
        None => return render_404(context),
    };
    let id = poem.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
    let image = str_field(poem, "image");

    let mut html = format!(
        "<article class=\"poem-single\">\n    <h1>{}</h1>\n    <p class=\"poet\">{}</p>",
        html_escape(str_field(poem, "title")),
        html_escape(str_field(poem, "poet"))
    );
    if !image.is_empty() {
        html.push_str(&format!(
            r#"<div class="poem-image"><img src="/uploads/{}" alt=""></div>"#,
            html_escape(image)
        ));
    }
    html.push_str(&format!(
        r#"<div class="poem-content">{}</div>"#,
        embed::normalize(str_field(poem, "body_html"))
    ));
    html.push_str(&build_comments_section(context, &format!("/siir/{}/yorum", id)));
    html.push_str("</article>");
    html
}

fn render_404(_context: &Value) -> String {
    "<div class=\"not-found\"><h1>404</h1><p>Aradığınız sayfa bulunamadı.</p><a href=\"/\">Ana sayfa</a></div>"
        .to_string()
}

/// Player for the dedicated video link field, when it resolved.
fn build_video(context: &Value) -> String {
    match context.get("video_embed").and_then(|v| v.as_str()) {
        Some(src) if !src.is_empty() => format!(
            r#"<div class="video-wrapper"><iframe src="{}" loading="lazy" allowfullscreen></iframe></div>"#,
            html_escape(src)
        ),
        _ => String::new(),
    }
}

/// Approved comments with supporter badges, followed by the submission form.
fn build_comments_section(context: &Value, action: &str) -> String {
    let mut html = String::new();

    if let Some(Value::Array(comments)) = context.get("comments") {
        if !comments.is_empty() {
            html.push_str(&format!(
                r#"<section class="comments"><h3>Yorumlar ({})</h3>"#,
                comments.len()
            ));
            for comment in comments {
                render_comment(&mut html, comment);
            }
            html.push_str("</section>");
        }
    }

    if context.get("comment_received").and_then(|v| v.as_bool()).unwrap_or(false) {
        html.push_str("<p class=\"notice\">Yorumunuz alındı, onaylandıktan sonra yayınlanacak.</p>");
    }

    html.push_str(&format!(
        r#"<form class="comment-form" method="post" action="{}">
<input type="text" name="author_name" placeholder="Adınız" required>
<input type="email" name="author_email" placeholder="E-posta">
<textarea name="body" rows="4" required></textarea>
<input type="text" name="honeypot" style="display:none" tabindex="-1" autocomplete="off">
<button type="submit">Gönder</button>
</form>"#,
        html_escape(action)
    ));
    html
}

fn render_comment(html: &mut String, comment: &Value) {
    let badge = match comment.get("badge") {
        Some(b) if !b.is_null() => format!(
            r#" <span class="badge badge-{}">{}</span>"#,
            html_escape(str_field(b, "color")),
            html_escape(str_field(b, "label"))
        ),
        _ => String::new(),
    };
    html.push_str(&format!(
        r#"<div class="comment"><div class="comment-author">{}{}</div><time>{}</time><p>{}</p></div>"#,
        html_escape(str_field(comment, "author_name")),
        badge,
        format_date(str_field(comment, "created_at")),
        html_escape(str_field(comment, "body"))
    ));
}

fn str_field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// `dd.mm.yyyy HH:MM`; unparseable input comes back unchanged.
fn format_date(raw: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map(|d| d.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
