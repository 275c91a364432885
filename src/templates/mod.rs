//! HTML templates and styling for the data viewer.
//!
//! ## Module Structure
//!
//! - `styles` - CSS constants
//! - `components` - Shared HTML components (nav bar, base template, fallback pages)
//! - `viewer` - Structured and text viewer pages

mod components;
mod styles;
mod viewer;

pub use components::{base_html, html_escape, nav_bar, render_fallback, render_not_found, PAGE_TITLE};
pub use styles::STYLE;
pub use viewer::{render_structured_viewer, render_text_viewer};
