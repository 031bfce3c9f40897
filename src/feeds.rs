//! RSS, Atom and sitemap generation.
//!
//! Last stage of the build. Reads `posts.json` written by the blog stage and
//! walks the published site for HTML pages.
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── rss.xml       # RSS 2.0, one <item> per post
//! ├── atom.xml      # Atom 1.0, one <entry> per post
//! └── sitemap.xml   # every published *.html page
//! ```
//!
//! ## Sitemap policy
//!
//! | Page | priority | changefreq |
//! |---|---|---|
//! | `index.html` (root) | 1.0 | weekly |
//! | `blog/…` | 0.6 | weekly |
//! | anything else | 0.6 | monthly |
//!
//! Dotfiles and dot-directories are skipped, as is the root `404.html`.
//!
//! A missing or malformed `posts.json` produces feeds with no items rather
//! than an error.

use crate::blog::parse_date;
use crate::config::SiteMeta;
use crate::naming::{encode_uri_component, slugify, to_url_path};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot walk site directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A post as the feeds see it, with every field filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPost {
    pub title: String,
    pub slug: String,
    pub date: DateTime<Utc>,
    pub excerpt: String,
}

/// The three generated documents.
#[derive(Debug, Clone)]
pub struct Feeds {
    pub rss: String,
    pub atom: String,
    pub sitemap: String,
    /// Number of pages listed in the sitemap.
    pub page_count: usize,
}

impl Feeds {
    pub const RSS_FILE: &'static str = "rss.xml";
    pub const ATOM_FILE: &'static str = "atom.xml";
    pub const SITEMAP_FILE: &'static str = "sitemap.xml";
}

/// One `<url>` of the sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Read and normalize the post list.
///
/// Never fails: an unreadable file, invalid JSON or a document that is not
/// an array all yield an empty list.
pub fn read_posts(path: &Path) -> Vec<FeedPost> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("No post list at {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(items)) => {
            let now = Utc::now();
            items.iter().map(|item| normalize_post(item, now)).collect()
        }
        Ok(_) => {
            warn!("{} is not a JSON array, feeds will be empty", path.display());
            Vec::new()
        }
        Err(e) => {
            warn!("Ignoring malformed {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn string_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Fill in missing fields: title from slug, slug from title, date from `now`.
fn normalize_post(item: &Value, now: DateTime<Utc>) -> FeedPost {
    let title = string_field(item, "title");
    let slug = string_field(item, "slug");
    FeedPost {
        title: title.or(slug).unwrap_or("Untitled").to_string(),
        slug: slug
            .map(String::from)
            .or_else(|| title.map(slugify))
            .unwrap_or_else(|| "post".to_string()),
        date: string_field(item, "date")
            .and_then(parse_date)
            .map(|dt| dt.and_utc())
            .unwrap_or(now),
        excerpt: string_field(item, "excerpt").unwrap_or_default().to_string(),
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// RFC 822 date in UTC, e.g. `Fri, 01 Mar 2024 00:00:00 GMT`.
pub fn rfc822(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// ISO 8601 UTC with milliseconds, e.g. `2024-03-01T00:00:00.000Z`.
pub fn iso8601(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Canonical URL of a rendered post.
pub fn post_url(base_url: &str, slug: &str) -> String {
    format!("{}/blog/generated/{}.html", base_url, encode_uri_component(slug))
}

pub fn render_rss(posts: &[FeedPost], site: &SiteMeta, now: &DateTime<Utc>) -> String {
    let base = &site.base_url;
    let items = posts
        .iter()
        .map(|p| {
            let url = escape_xml(&post_url(base, &p.slug));
            format!(
                "    <item>\n      <title>{}</title>\n      <link>{url}</link>\n      \
                 <guid>{url}</guid>\n      <pubDate>{}</pubDate>\n      \
                 <description>{}</description>\n    </item>",
                escape_xml(&p.title),
                rfc822(&p.date),
                escape_xml(&p.excerpt),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{title}</title>
    <description>{description}</description>
    <link>{base}/blog/</link>
    <atom:link href="{base}/rss.xml" rel="self" type="application/rss+xml" />
    <language>en-us</language>
    <lastBuildDate>{built}</lastBuildDate>
{items}
  </channel>
</rss>
"#,
        title = escape_xml(&site.title),
        description = escape_xml(&site.description),
        base = escape_xml(base),
        built = rfc822(now),
    )
}

pub fn render_atom(posts: &[FeedPost], site: &SiteMeta, now: &DateTime<Utc>) -> String {
    let base = &site.base_url;
    let entries = posts
        .iter()
        .map(|p| {
            let url = escape_xml(&post_url(base, &p.slug));
            format!(
                "  <entry>\n    <title>{}</title>\n    <link href=\"{url}\" />\n    \
                 <id>{url}</id>\n    <updated>{}</updated>\n    \
                 <summary>{}</summary>\n  </entry>",
                escape_xml(&p.title),
                iso8601(&p.date),
                escape_xml(&p.excerpt),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>{title}</title>
  <link href="{base}/atom.xml" rel="self" />
  <link href="{base}/blog/" />
  <updated>{updated}</updated>
  <id>{base}/</id>
  <author>
    <name>{author}</name>
    <email>{email}</email>
  </author>
{entries}
</feed>
"#,
        title = escape_xml(&site.title),
        base = escape_xml(base),
        updated = iso8601(now),
        author = escape_xml(&site.author),
        email = escape_xml(&site.email),
    )
}

/// Priority and change frequency for a site-relative page path.
pub fn sitemap_policy(rel: &str) -> (&'static str, &'static str) {
    if rel == "index.html" {
        ("1.0", "weekly")
    } else if rel.starts_with("blog/") {
        ("0.6", "weekly")
    } else {
        ("0.6", "monthly")
    }
}

/// Walk `site_root` for published HTML pages, in sorted path order.
pub fn collect_pages(
    site_root: &Path,
    base_url: &str,
    today: &str,
) -> Result<Vec<SitemapEntry>, FeedError> {
    let walker = WalkDir::new(site_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    let mut pages = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !entry.file_name().to_string_lossy().ends_with(".html")
        {
            continue;
        }
        let rel = to_url_path(entry.path().strip_prefix(site_root).unwrap_or(entry.path()));
        if rel == "404.html" {
            continue;
        }

        let lastmod = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(|t| DateTime::<Utc>::from(t).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| today.to_string());
        let (priority, changefreq) = sitemap_policy(&rel);

        pages.push(SitemapEntry {
            loc: format!("{base_url}/{rel}").replacen("/index.html", "/", 1),
            lastmod,
            changefreq,
            priority,
        });
    }
    Ok(pages)
}

pub fn render_sitemap(pages: &[SitemapEntry]) -> String {
    let urls = pages
        .iter()
        .map(|p| {
            format!(
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    \
                 <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>",
                escape_xml(&p.loc),
                p.lastmod,
                p.changefreq,
                p.priority
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}\n</urlset>\n"
    )
}

/// Build all three documents.
pub fn generate(posts: &[FeedPost], site_root: &Path, site: &SiteMeta) -> Result<Feeds, FeedError> {
    let now = Utc::now();
    let today = now.format("%Y-%m-%d").to_string();
    let pages = collect_pages(site_root, &site.base_url, &today)?;
    Ok(Feeds {
        rss: render_rss(posts, site, &now),
        atom: render_atom(posts, site, &now),
        sitemap: render_sitemap(&pages),
        page_count: pages.len(),
    })
}

/// Write `rss.xml`, `atom.xml` and `sitemap.xml` into `site_root`.
pub fn write(site_root: &Path, feeds: &Feeds) -> Result<(), FeedError> {
    fs::write(site_root.join(Feeds::RSS_FILE), &feeds.rss)?;
    fs::write(site_root.join(Feeds::ATOM_FILE), &feeds.atom)?;
    fs::write(site_root.join(Feeds::SITEMAP_FILE), &feeds.sitemap)?;
    Ok(())
}
