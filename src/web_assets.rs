//! Embedded static web assets.
//!
//! The stylesheet is compiled into the binary via `include_str!` so `build`
//! can write it next to the pages without any external asset files.

/// Stylesheet for rendered pages.
///
/// Loaded from `src/assets/mdpage.css` at compile time. Written to
/// `assets/mdpage.css` under the build output directory.
pub const CSS: &str = include_str!("assets/mdpage.css");

/// File name of [`CSS`] under the assets directory.
pub const CSS_FILE: &str = "mdpage.css";
