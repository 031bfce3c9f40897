//! # Folio
//!
//! The build pipeline for a photo-blog site. A single site root holds the
//! source photographs, the markdown posts and everything generated from them,
//! so the result can be dropped on any static file server.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Images  images/       →  images.json + images/previews/   (previews, EXIF, tags)
//! 2. Blog    blog/posts/   →  blog/generated/                  (pages + posts.json)
//! 3. Feeds   posts.json    →  rss.xml, atom.xml, sitemap.xml
//! ```
//!
//! Each stage is a one-shot batch job that reads files and writes files, so
//! any stage can be rerun on its own. The only state carried from one build
//! to the next is the user's tags in `images.json`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | Stage 1: lists source images, writes previews and `images.json` |
//! | [`blog`] | Stage 2: renders markdown posts with Maud and pulldown-cmark |
//! | [`feeds`] | Stage 3: RSS, Atom and sitemap documents |
//! | [`server`] | Optional HTTP server with a `GET /images` listing |
//! | [`config`] | `config.toml` loading, stock defaults, validation, `SITE_URL` |
//! | [`types`] | Records persisted between stages (`ImageRecord`, `BlogPost`) |
//! | [`naming`] | Filename conventions: titles, slugs, preview names, URL paths |
//! | [`metadata`] | EXIF normalization with `"Unknown"` sentinels |
//! | [`frontmatter`] | The `---` header of a markdown post |
//! | [`imaging`] | Pure-Rust image operations behind the `ImageBackend` trait |
//! | [`output`] | CLI output formatting for every stage |
//!
//! # Design Decisions
//!
//! ## Swappable Imaging Backend
//!
//! Image decoding, EXIF reading and resizing sit behind
//! [`imaging::ImageBackend`]. The manifest and server code only see the
//! trait, and tests run against a recording mock that never touches pixels.
//!
//! ## Tags Survive Rebuilds
//!
//! Tags are edited by hand in `images.json`. Every rebuild reads the previous
//! manifest first and copies each record's tags across, keyed on the source
//! path, then replaces the file in one rename.

pub mod blog;
pub mod config;
pub mod feeds;
pub mod frontmatter;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
