use crate::config::Config;
use crate::post::{parse_date, Post};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};

pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: f32,
}

/// Home page anchors listed ahead of the posts.
const STATIC_ENTRIES: &[(&str, &str, f32)] = &[
    ("/#about", "monthly", 0.8),
    ("/#skills", "monthly", 0.8),
    ("/#timeline", "monthly", 0.8),
    ("/#projects", "weekly", 0.9),
    ("/#blog", "weekly", 0.9),
    ("/#contact", "yearly", 0.7),
];

pub fn sitemap_entries(posts: &[Post], now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let mut entries = vec![SitemapEntry {
        loc: "/".to_string(),
        lastmod: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        changefreq: "weekly",
        priority: 1.0,
    }];
    entries.extend(STATIC_ENTRIES.iter().map(|(loc, changefreq, priority)| SitemapEntry {
        loc: loc.to_string(),
        lastmod: None,
        changefreq: *changefreq,
        priority: *priority,
    }));
    entries.extend(posts.iter().map(|post| SitemapEntry {
        loc: format!("/blog/{}", post.slug),
        lastmod: Some(post.date.clone()),
        changefreq: "monthly",
        priority: 0.7,
    }));
    entries
}

pub fn render_sitemap(base_url: &str, entries: &[SitemapEntry]) -> String {
    let urls: String = entries
        .iter()
        .map(|entry| {
            let lastmod = entry
                .lastmod
                .as_ref()
                .map_or(String::new(), |d| format!("\n    <lastmod>{}</lastmod>", escape_xml(d)));
            format!(
                "  <url>\n    <loc>{}{}</loc>{}\n    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>",
                escape_xml(base_url),
                escape_xml(&entry.loc),
                lastmod,
                entry.changefreq,
                entry.priority
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>
"#,
        urls
    )
}

pub fn render_rss(config: &Config, posts: &[Post], now: DateTime<Utc>) -> String {
    let base_url = config.base_url();
    let items: String = posts
        .iter()
        .map(|post| {
            let link = format!("{}/blog/{}", base_url, post.slug);
            let categories: String = std::iter::once(&post.category)
                .chain(post.tags.iter())
                .filter(|c| !c.is_empty())
                .map(|c| format!("\n      <category>{}</category>", escape_xml(c)))
                .collect();
            format!(
                r#"    <item>
      <title>{}</title>
      <link>{}</link>
      <guid isPermaLink="true">{}</guid>
      <description>{}</description>
      <pubDate>{}</pubDate>{}
    </item>"#,
                escape_xml(&post.title),
                escape_xml(&link),
                escape_xml(&link),
                escape_xml(&post.excerpt),
                parse_date(&post.date).map_or_else(|| post.date.clone(), rfc822),
                categories
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let managing_editor = config
        .email
        .as_ref()
        .map_or(String::new(), |email| {
            format!(
                "\n    <managingEditor>{} ({})</managingEditor>",
                escape_xml(email),
                escape_xml(&config.author)
            )
        });

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>{title}</title>
    <description>{description}</description>
    <link>{link}</link>
    <atom:link href="{link}/feed.xml" rel="self" type="application/rss+xml"/>
    <language>en-US</language>
    <lastBuildDate>{now}</lastBuildDate>
    <generator>folio</generator>
    <copyright>Copyright {year} {author}</copyright>{managing_editor}
{items}
  </channel>
</rss>
"#,
        title = escape_xml(&config.title),
        description = escape_xml(config.description.as_deref().unwrap_or("")),
        link = escape_xml(&base_url),
        now = rfc822(now),
        year = now.year(),
        author = escape_xml(&config.author),
        managing_editor = managing_editor,
        items = items,
    )
}

fn rfc822(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(slug: &str, date: &str, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_string(),
            title: format!("{} & more", slug),
            date: date.to_string(),
            category: "Rust".to_string(),
            excerpt: "<excerpt>".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_sitemap_has_static_entries_plus_posts() {
        let posts = vec![post("a", "2024-01-01", &[]), post("b", "2024-02-01", &[])];
        let entries = sitemap_entries(&posts, now());
        assert_eq!(entries.len(), 7 + posts.len());

        let xml = render_sitemap("https://example.dev", &entries);
        assert_eq!(xml.matches("<url>").count(), 9);
        assert!(xml.contains("<loc>https://example.dev/blog/b</loc>"));
        assert!(xml.contains("<lastmod>2024-02-01</lastmod>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn test_rss_items_and_self_link() {
        let config = Config {
            url: Some("https://example.dev".to_string()),
            ..Config::default()
        };
        let posts = vec![post("a", "2024-01-05", &["LLVM"])];
        let xml = render_rss(&config, &posts, now());

        assert_eq!(xml.matches("<item>").count(), 1);
        assert!(xml.contains(r#"<atom:link href="https://example.dev/feed.xml" rel="self""#));
        assert!(xml.contains("<title>a &amp; more</title>"));
        assert!(xml.contains("<description>&lt;excerpt&gt;</description>"));
        assert!(xml.contains("<pubDate>Fri, 05 Jan 2024 00:00:00 GMT</pubDate>"));
        assert!(xml.contains("<category>Rust</category>"));
        assert!(xml.contains("<category>LLVM</category>"));
        assert!(xml.contains("<lastBuildDate>Tue, 01 Oct 2024 12:00:00 GMT</lastBuildDate>"));
    }
}
