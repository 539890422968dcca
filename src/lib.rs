//! # attrify
//!
//! Capture marketing campaign parameters from the page URL into cookies.
//!
//! Call [`capture`] once per page view. It reads tracked query parameters
//! (the five `utm_*` keys by default) and keeps them in cookies, so a later
//! form post or analytics call can read where the visitor came from.
//!
//! ## Features
//!
//! - **Last touch**: the most recent campaign, with a sliding expiration
//!   (30 minutes by default)
//! - **First touch**: optional `initial_*` cookies that are never overwritten
//! - **Static data**: caller-supplied values (the referrer by default) stored
//!   alongside the campaign
//! - **Clean campaign switch**: a new campaign clears every old last-touch param
//!
//! ## Quick Start
//!
//! ```rust
//! use attrify::page::memory::MemoryPage;
//! use attrify::Options;
//!
//! let page = MemoryPage::new("https://shop.example.com/?utm_source=google&utm_medium=cpc")?
//!     .with_referrer("https://www.google.com/");
//!
//! Options::new().save_initial(true).capture(&page)?;
//!
//! let cookies = page.cookie_map();
//! assert_eq!(cookies["utm_source"], "google");
//! assert_eq!(cookies["initial_utm_medium"], "cpc");
//! assert_eq!(cookies["referrer"], "https://www.google.com/");
//! # Ok::<(), attrify::AttributionError>(())
//! ```
//!
//! In a browser build (`wasm32`) the same routine is exported to JavaScript
//! as `attrify(options)` and runs against `window`/`document`.
//!
//! ## Modules
//!
//! - [`attribution`] - Option resolution, query parsing and the capture routine
//! - [`page`] - The [`PageContext`](page::PageContext) capability and its implementations
//! - [`cookies`] - Cookie store with browser semantics, used by the in-memory page
//! - [`base`] - Error types

pub mod attribution;
pub mod base;
pub mod cookies;
pub mod page;

pub use attribution::{capture, CaptureReport, Options, Settings};
pub use base::error::AttributionError;
pub use page::PageContext;
