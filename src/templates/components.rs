//! Shared HTML components for the data viewer.
//!
//! Contains the navigation bar, base HTML template, and the fallback and
//! not-found pages.

use crate::config::Settings;

use super::styles::STYLE;

pub const PAGE_TITLE: &str = "FIA Data Viewer";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Navigation Bar
// ============================================================================

pub fn nav_bar(file_path: Option<&str>) -> String {
    let path_html = file_path
        .map(|p| format!(r#"<span class="file-path">{}</span>"#, html_escape(p)))
        .unwrap_or_default();

    format!(
        r#"<nav class="nav-bar">
            <strong class="title">Data Viewer</strong>
            <span class="spacer"></span>
            {path}
        </nav>"#,
        path = path_html
    )
}

// ============================================================================
// Base Template
// ============================================================================

pub fn base_html(title: &str, nav: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="description" content="Data and plot viewer for FIA">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
    {nav}
    {content}
</body>
</html>"#,
        title = html_escape(title),
        nav = nav,
        content = content,
    )
}

// ============================================================================
// Fallback / Not Found
// ============================================================================

/// Body of the "something went wrong" view. Also embedded, hidden, in the
/// structured viewer page so the browser can swap it in.
pub fn fallback_block(settings: &Settings, reason: Option<&str>, hidden: bool) -> String {
    let reason_html = reason
        .map(|r| format!(r#"<p class="reason">{}</p>"#, html_escape(r)))
        .unwrap_or_default();
    let style = if hidden { r#" style="display:none""# } else { "" };

    format!(
        r#"<div class="fallback" id="viewer-fallback"{style}>
            <h1>Something Went Wrong</h1>
            <p>Return <a href="{home}">Home</a></p>
            <p>If this keeps happening email <a href="mailto:{email}">fia-support</a>.</p>
            {reason}
        </div>"#,
        style = style,
        home = html_escape(&settings.home_url),
        email = html_escape(&settings.support_email),
        reason = reason_html,
    )
}

pub fn render_fallback(settings: &Settings, reason: &str) -> String {
    base_html(
        PAGE_TITLE,
        &nav_bar(None),
        &fallback_block(settings, Some(reason), false),
    )
}

pub fn render_not_found(settings: &Settings) -> String {
    let content = format!(
        r#"<div class="fallback">
            <h2>Not Found</h2>
            <p>Could not find the requested resource.</p>
            <p>Return <a href="{home}">Home</a></p>
        </div>"#,
        home = html_escape(&settings.home_url),
    );
    base_html("Not Found", &nav_bar(None), &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href='x'>&</a>"), "&lt;a href=&#39;x&#39;&gt;&amp;&lt;/a&gt;");
    }

    #[test]
    fn test_fallback_links() {
        let settings = Settings::default();
        let html = render_fallback(&settings, "file lookup failed: 500 Internal Server Error");
        assert!(html.contains("Something Went Wrong"));
        assert!(html.contains(r#"href="https://reduce.isis.cclrc.ac.uk""#));
        assert!(html.contains("mailto:fia@stfc.ac.uk"));
        assert!(html.contains("500 Internal Server Error"));
        assert!(!html.contains("display:none"));
    }

    #[test]
    fn test_not_found_links_home() {
        let settings = Settings {
            home_url: "https://example.org/?a=1&b=2".to_string(),
            ..Settings::default()
        };
        let html = render_not_found(&settings);
        assert!(html.contains("Could not find the requested resource."));
        assert!(html.contains(r#"href="https://example.org/?a=1&amp;b=2""#));
    }

    #[test]
    fn test_nav_bar_escapes_path() {
        let nav = nav_bar(Some("<script>"));
        assert!(nav.contains("Data Viewer"));
        assert!(nav.contains("&lt;script&gt;"));
    }
}
