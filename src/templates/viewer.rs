//! Viewer templates.
//!
//! The structured page only hosts the browser-side viewer bundle: it embeds
//! the viewer configuration as JSON and a window-level error handler that
//! replaces the viewer with the fallback block if the bundle throws.

use crate::config::Settings;
use crate::models::ViewerConfig;

use super::components::{base_html, fallback_block, html_escape, nav_bar, PAGE_TITLE};

/// Serialize `config` for embedding inside a `<script>` element.
///
/// `<`, `>` and `&` only occur inside JSON strings, where their `\uXXXX`
/// forms parse to the same value and the HTML parser sees no markup.
pub fn config_json(config: &ViewerConfig) -> String {
    serde_json::to_string(config)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

// ============================================================================
// Structured Viewer
// ============================================================================

pub fn render_structured_viewer(settings: &Settings, config: &ViewerConfig) -> String {
    let content = format!(
        r##"<main class="h5-container">
        <div id="viewer-root"></div>
        {fallback}
    </main>
    <script type="application/json" id="viewer-config">{config}</script>
    <script>
    (function() {{
        function showFallback() {{
            document.getElementById('viewer-root').style.display = 'none';
            document.getElementById('viewer-fallback').style.display = 'flex';
        }}
        window.addEventListener('error', showFallback);
        window.addEventListener('unhandledrejection', showFallback);
        window.dataViewerFallback = showFallback;
    }})();
    </script>
    <script type="module" src="{bundle}" onerror="window.dataViewerFallback()"></script>"##,
        fallback = fallback_block(settings, None, true),
        config = config_json(config),
        bundle = html_escape(&settings.viewer_bundle_url),
    );

    base_html(
        PAGE_TITLE,
        &nav_bar(Some(&config.filepath)),
        &content,
    )
}

// ============================================================================
// Text Viewer
// ============================================================================

pub fn render_text_viewer(settings: &Settings, file_path: &str, content: &Result<String, String>) -> String {
    let body = match content {
        Ok(text) => format!("<pre>{}</pre>", html_escape(text)),
        Err(reason) => format!(
            r#"<div class="inline-error">Could not load file content: {}</div>"#,
            html_escape(reason)
        ),
    };

    base_html(
        PAGE_TITLE,
        &nav_bar(Some(file_path)),
        &format!(r#"<main class="text-viewer">{}</main>"#, body),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_page_embeds_config() {
        let settings = Settings::default();
        let config = ViewerConfig::new("http://localhost:8000", "MARI/RB1/a.nxspe", "tok");
        let html = render_structured_viewer(&settings, &config);

        assert!(html.contains(r#"id="viewer-config""#));
        assert!(html.contains(r#""filepath":"MARI/RB1/a.nxspe""#));
        assert!(html.contains(r#""Authorization":"Bearer tok""#));
        assert!(html.contains(r#"src="/data-viewer/static/viewer.js""#));
        assert!(html.contains(r#"id="viewer-fallback" style="display:none""#));
    }

    #[test]
    fn test_config_json_cannot_close_script() {
        let config = ViewerConfig::new("http://api", "a</script><b>.nxs", "");
        assert!(!config_json(&config).contains("</script>"));
    }

    #[test]
    fn test_config_json_escapes_comment_openers() {
        let config = ViewerConfig::new("http://api", "RB1/<!--<script>&.nxs", "");
        let json = config_json(&config);
        assert!(!json.contains('<'));
        assert!(!json.contains('>'));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["filepath"], "RB1/<!--<script>&.nxs");
    }

    #[test]
    fn test_text_viewer_escapes_content() {
        let html = render_text_viewer(&Settings::default(), "a.txt", &Ok("x < y\n".to_string()));
        assert!(html.contains("<pre>x &lt; y\n</pre>"));
    }

    #[test]
    fn test_text_viewer_inline_error() {
        let html = render_text_viewer(&Settings::default(), "a.txt", &Err("404 Not Found".to_string()));
        assert!(html.contains("inline-error"));
        assert!(html.contains("404 Not Found"));
        assert!(!html.contains("Something Went Wrong"));
    }
}
