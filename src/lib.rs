//! Documentation page rendering with a scroll-synchronised table of contents.
//!
//! Pre-rendered content records ([`content::PageContent`]) are bound to the
//! page layout by [`page::render_page`] and written out by [`site`]. In the
//! browser, [`toc_sync::TocScrollSync`] keeps the TOC in step with the reader;
//! the `wasm` feature exposes it to JavaScript through `dom`.
//!
//! `build` writes pages and the stylesheet only. The TOC loader that pages
//! import (`toc.script`, default `/assets/mdpage.js`) comes from a separate
//! browser build whose output is copied into the site's `assets/`:
//!
//! ```text
//! wasm-pack build --target web --out-dir site/assets -- --features wasm
//! ```

pub mod config;
pub mod content;
pub mod dates;
#[cfg(feature = "wasm")]
pub mod dom;
pub mod error;
pub mod logging;
pub mod page;
pub mod site;
pub mod throttle;
pub mod toc;
pub mod toc_sync;
pub mod web_assets;

pub use error::{Error, Result};
