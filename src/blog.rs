//! Blog rendering.
//!
//! Second stage of the build. Reads every `*.md` file in the posts directory,
//! renders it to HTML and writes the blog into the output directory.
//!
//! ## Output Structure
//!
//! ```text
//! blog/
//! ├── posts/
//! │   ├── hello.md
//! │   └── kyoto-in-the-rain.md
//! └── generated/
//!     ├── hello.html               # One page per post
//!     ├── kyoto-in-the-rain.html
//!     ├── posts.json               # PostList, newest first
//!     └── index.html               # Listing with tag filter and search
//! ```
//!
//! ## Per-post derivation
//!
//! | Field | Source |
//! |---|---|
//! | `slug` | file stem |
//! | `title` | front matter, else the slug |
//! | `date` | front matter, else today (UTC) |
//! | `tags` | front matter, comma-separated |
//! | `content` | pulldown-cmark HTML (tables, footnotes, strikethrough, math) |
//! | `excerpt` | plain text of the body, cut at the excerpt length + `"..."` |
//! | `readingTime` | `ceil(words / words_per_minute)` |
//!
//! Posts are ordered newest first. Dates that cannot be parsed sort after all
//! others, and equal dates keep filename order.
//!
//! ## CSS and JavaScript
//!
//! Static assets are embedded at compile time:
//! - `static/blog.css`: Page styles
//! - `static/blog.js`: Tag filter and search on the index page
//! - `static/math.js`: KaTeX hook, only on posts containing math

use crate::config::SiteConfig;
use crate::frontmatter;
use crate::naming::{encode_uri_component, file_stem, is_markdown_file};
use crate::types::BlogPost;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{info, warn};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html as md_html};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS: &str = include_str!("../static/blog.css");
const JS: &str = include_str!("../static/blog.js");
const MATH_JS: &str = include_str!("../static/math.js");

const KATEX_CSS: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.css";
const KATEX_JS: &str = "https://cdn.jsdelivr.net/npm/katex@0.16.9/dist/katex.min.js";

/// Number of related posts shown under a post.
pub const RELATED_LIMIT: usize = 3;

/// Name of the post list written next to the pages.
pub const POSTS_JSON: &str = "posts.json";

/// Rendering settings.
#[derive(Debug, Clone)]
pub struct BlogOptions {
    pub excerpt_length: usize,
    pub words_per_minute: usize,
    /// Heading of the index page and suffix of post titles.
    pub site_title: String,
}

impl BlogOptions {
    pub fn from_site_config(config: &SiteConfig) -> Self {
        Self {
            excerpt_length: config.blog.excerpt_length,
            words_per_minute: config.blog.words_per_minute,
            site_title: config.site.title.clone(),
        }
    }
}

impl Default for BlogOptions {
    fn default() -> Self {
        Self::from_site_config(&SiteConfig::default())
    }
}

/// Render every post in `posts_dir` into `output_dir`.
///
/// Returns the post list in publication order. A missing `posts_dir` is an
/// empty blog: nothing is written.
pub fn render(
    posts_dir: &Path,
    output_dir: &Path,
    options: &BlogOptions,
) -> Result<Vec<BlogPost>, BlogError> {
    if !posts_dir.is_dir() {
        info!("No posts directory at {}", posts_dir.display());
        return Ok(Vec::new());
    }

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let mut posts = Vec::new();
    for path in list_posts(posts_dir)? {
        match fs::read_to_string(&path) {
            Ok(source) => posts.push(parse_post(&file_stem(&path), &source, &today, options)),
            Err(e) => warn!("Skipping unreadable post {}: {}", path.display(), e),
        }
    }
    sort_posts(&mut posts);

    fs::create_dir_all(output_dir)?;
    for post in &posts {
        let related = related_posts(post, &posts, RELATED_LIMIT);
        let page = render_post_page(post, &related, options);
        fs::write(
            output_dir.join(format!("{}.html", post.slug)),
            page.into_string(),
        )?;
    }

    let json = serde_json::to_string_pretty(&posts)?;
    fs::write(output_dir.join(POSTS_JSON), json)?;

    // Last, so a post named `index.md` cannot replace the listing.
    fs::write(
        output_dir.join("index.html"),
        render_index_page(&posts, options).into_string(),
    )?;

    info!("Rendered {} posts into {}", posts.len(), output_dir.display());
    Ok(posts)
}

/// Markdown files directly inside `posts_dir`, sorted by name. Symlinks are
/// followed.
fn list_posts(posts_dir: &Path) -> Result<Vec<PathBuf>, BlogError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(posts_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_markdown_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build a post from its file stem and source text.
///
/// `today` is the date used when the front matter has none.
pub fn parse_post(slug: &str, source: &str, today: &str, options: &BlogOptions) -> BlogPost {
    let (front, body) = frontmatter::extract(source);
    let text = plain_text(body);

    BlogPost {
        slug: slug.to_string(),
        title: front.non_empty("title").unwrap_or(slug).to_string(),
        date: front.non_empty("date").unwrap_or(today).to_string(),
        tags: front.tags(),
        content: markdown_to_html(body),
        excerpt: excerpt(&text, options.excerpt_length),
        reading_time: reading_time(&text, options.words_per_minute),
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_MATH
}

/// Render markdown to HTML.
///
/// Math is emitted as `<span class="math math-inline">` and
/// `<span class="math math-display">` for KaTeX to pick up in the browser.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

/// Whether rendered HTML contains math spans.
pub fn has_math(content: &str) -> bool {
    content.contains("class=\"math math-")
}

/// Plain text of a markdown body.
///
/// Keeps the words a reader sees: link and image text, inline code, the
/// expression inside math delimiters. Drops markup, raw HTML and code blocks.
/// Whitespace is collapsed to single spaces.
pub fn plain_text(markdown: &str) -> String {
    let mut text = String::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                text.push(' ');
            }
            Event::Text(t) | Event::Code(t) | Event::InlineMath(t) | Event::DisplayMath(t)
                if !in_code_block =>
            {
                text.push_str(&t);
            }
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::TableCell,
            ) => text.push(' '),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to `limit` characters, marking the cut with `"..."`.
pub fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

/// Whole minutes needed to read `text`, rounded up.
pub fn reading_time(text: &str, words_per_minute: usize) -> usize {
    text.split_whitespace()
        .count()
        .div_ceil(words_per_minute.max(1))
}

/// Parse a front-matter date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM:SS` and
/// RFC 3339. Offsets are converted to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Newest first; unparseable dates last; stable for ties.
pub fn sort_posts(posts: &mut [BlogPost]) {
    posts.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
}

/// Other posts ranked by shared tags, best first.
///
/// Each shared tag scores 2. Posts sharing nothing are excluded; ties keep
/// list order.
pub fn related_posts<'a>(post: &BlogPost, all: &'a [BlogPost], limit: usize) -> Vec<&'a BlogPost> {
    let mut scored: Vec<(usize, &BlogPost)> = all
        .iter()
        .filter(|other| other.slug != post.slug)
        .map(|other| {
            let shared = other.tags.iter().filter(|t| post.tags.contains(t)).count();
            (shared * 2, other)
        })
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, p)| p).collect()
}

fn post_href(post: &BlogPost) -> String {
    format!("{}.html", encode_uri_component(&post.slug))
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, head_extra: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="alternate" type="application/rss+xml" href="/rss.xml";
                link rel="alternate" type="application/atom+xml" href="/atom.xml";
                style { (PreEscaped(CSS)) }
                (head_extra)
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(site_title: &str) -> Markup {
    html! {
        header.site-header {
            a href="/" { (site_title) }
            a href="index.html" { "Blog" }
        }
    }
}

fn post_meta(post: &BlogPost) -> Markup {
    html! {
        p.post-meta {
            time datetime=(post.date) { (post.date) }
            " · " (post.reading_time) " min read"
        }
    }
}

fn render_post_page(post: &BlogPost, related: &[&BlogPost], options: &BlogOptions) -> Markup {
    let math = has_math(&post.content);
    let head_extra = html! {
        meta name="description" content=(post.excerpt);
        @if math {
            link rel="stylesheet" href=(KATEX_CSS);
            script defer src=(KATEX_JS) {}
            script { (PreEscaped(MATH_JS)) }
        }
    };

    let content = html! {
        (site_header(&options.site_title))
        main {
            article.post {
                h1 { (post.title) }
                (post_meta(post))
                @if !post.tags.is_empty() {
                    ul.post-tags {
                        @for tag in &post.tags {
                            li { (tag) }
                        }
                    }
                }
                div.post-body {
                    (PreEscaped(&post.content))
                }
            }
            @if !related.is_empty() {
                section.related-posts {
                    h2 { "Related posts" }
                    ul {
                        @for other in related {
                            li { a href=(post_href(other)) { (other.title) } }
                        }
                    }
                }
            }
        }
    };

    base_document(
        &format!("{} | {}", post.title, options.site_title),
        head_extra,
        content,
    )
}

fn render_index_page(posts: &[BlogPost], options: &BlogOptions) -> Markup {
    let all_tags: BTreeSet<&str> = posts
        .iter()
        .flat_map(|p| p.tags.iter().map(String::as_str))
        .collect();

    let content = html! {
        (site_header(&options.site_title))
        main.blog-index {
            h1 { "Blog" }
            input.post-search type="search" placeholder="Search posts" aria-label="Search posts";
            @if !all_tags.is_empty() {
                nav.tag-filter {
                    button.active type="button" data-tag="" { "All" }
                    @for tag in &all_tags {
                        button type="button" data-tag=(tag) { (tag) }
                    }
                }
            }
            @for post in posts {
                article.post-card
                    data-tags=(post.tags.join(","))
                    data-search=(format!("{} {}", post.title, post.excerpt).to_lowercase()) {
                    h2 { a href=(post_href(post)) { (post.title) } }
                    (post_meta(post))
                    p { (post.excerpt) }
                }
            }
            p.empty-state hidden[!posts.is_empty()] { "No posts found." }
        }
        script { (PreEscaped(JS)) }
    };

    base_document(&format!("Blog | {}", options.site_title), html! {}, content)
}

// ============================================================================
// Tests
// ============================================================================
