//! CSS styles for the data viewer.
//!
//! Contains the main STYLE constant shared by every page.

// ============================================================================
// CSS Styles
// ============================================================================

pub const STYLE: &str = r#"
/* Solarized Light Theme */
:root {
    --base01: #586e75;
    --base00: #657b83;
    --base1: #93a1a1;
    --base2: #eee8d5;
    --base3: #fdf6e3;

    --red: #dc322f;
    --blue: #268bd2;
    --cyan: #2aa198;

    --bg: var(--base3);
    --fg: var(--base00);
    --muted: var(--base1);
    --border: var(--base2);
    --link: var(--blue);
    --link-hover: var(--cyan);
    --accent: var(--base2);
    --error: var(--red);
}

* { box-sizing: border-box; margin: 0; padding: 0; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
    line-height: 1.6;
    color: var(--fg);
    background: var(--bg);
}

a { color: var(--link); text-decoration: none; }
a:hover { color: var(--link-hover); text-decoration: underline; }

h1, h2 { font-weight: 600; margin-top: 1.5em; margin-bottom: 0.5em; }
h1 { font-size: 1.5rem; }

.nav-bar {
    position: sticky;
    top: 0;
    background: var(--bg);
    border-bottom: 1px solid var(--border);
    padding: 0.5rem 1rem;
    display: flex;
    gap: 1rem;
    align-items: center;
    z-index: 100;
}

.nav-bar .title { font-size: 1.1rem; color: var(--base01); }
.nav-bar .spacer { flex: 1; }
.nav-bar .file-path {
    font-family: "SF Mono", "Consolas", "Liberation Mono", monospace;
    font-size: 0.8rem;
    color: var(--muted);
}

.h5-container {
    height: calc(100vh - 3rem);
    display: flex;
    flex-direction: column;
}

#viewer-root { flex: 1; min-height: 0; }

.text-viewer {
    max-width: 1200px;
    margin: 0 auto;
    padding: 1rem;
}

.text-viewer pre {
    background: var(--accent);
    padding: 1rem;
    overflow-x: auto;
    border-radius: 4px;
    font-family: "SF Mono", "Consolas", "Liberation Mono", monospace;
    font-size: 0.85rem;
}

.inline-error {
    border-left: 3px solid var(--error);
    padding: 0.5rem 1rem;
    color: var(--error);
    background: var(--accent);
}

.fallback {
    display: flex;
    justify-content: center;
    align-items: center;
    flex-direction: column;
    height: calc(100vh - 3rem);
    text-align: center;
    gap: 0.5rem;
}

.fallback .reason { font-size: 0.8rem; color: var(--muted); }
"#;
