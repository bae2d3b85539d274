use crate::frontmatter::{self, Metadata, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub category: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Post {
    /// Build a post from a raw document and the file name it was served as.
    pub fn from_document(filename: &str, document: &str) -> Self {
        let (meta, body) = frontmatter::parse(document);
        Self::from_metadata(slug_from_filename(filename), &meta, Some(body))
    }

    pub fn from_metadata(slug: String, meta: &Metadata, content: Option<String>) -> Self {
        let text = |key: &str| {
            meta.get(key)
                .and_then(Value::as_text)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let tags = match meta.get("tags") {
            Some(Value::List(items)) => items.clone(),
            Some(Value::Text(tag)) => vec![tag.clone()],
            None => Vec::new(),
        };

        Self {
            slug,
            title: text("title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            date: text("date")
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            category: text("category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            excerpt: text("excerpt").unwrap_or_default(),
            tags,
            content,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_date(&self.date)
    }

    /// Text used for reading-time estimates: the body when loaded, else the excerpt.
    pub fn reading_text(&self) -> &str {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.excerpt)
    }
}

pub fn slug_from_filename(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Newest first; undated posts go last.
pub fn by_date_desc(a: &Post, b: &Post) -> Ordering {
    b.timestamp().cmp(&a.timestamp())
}

pub fn sort_by_date(posts: &mut [Post]) {
    posts.sort_by(by_date_desc);
}

/// "January 5, 2024"; unparseable dates are shown as written.
pub fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(dt) => dt.format("%B %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

pub fn estimate_reading_time(text: &str) -> String {
    let words = text.split_whitespace().count();
    let mins = ((words as f64 / 200.0).round() as usize).max(1);
    format!("{} min read", mins)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(slug: &str, date: &str) -> Post {
        Post {
            slug: slug.to_string(),
            title: slug.to_string(),
            date: date.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            excerpt: String::new(),
            tags: Vec::new(),
            content: None,
        }
    }

    #[test]
    fn test_defaults_applied() {
        let p = Post::from_document("hello.md", "no frontmatter at all");
        assert_eq!(p.slug, "hello");
        assert_eq!(p.title, "Untitled");
        assert_eq!(p.category, "Uncategorized");
        assert_eq!(p.excerpt, "");
        assert!(p.tags.is_empty());
        assert!(p.timestamp().is_some());
        assert_eq!(p.content.as_deref(), Some("no frontmatter at all"));
    }

    #[test]
    fn test_fields_from_frontmatter() {
        let doc = "---\ntitle: Lexers\ndate: 2024-03-01\ncategory: Compilers\nexcerpt: How\ntags:\n  - Rust\n  - LLVM\n---\n# Body\n";
        let p = Post::from_document("lexers.md", doc);
        assert_eq!(p.title, "Lexers");
        assert_eq!(p.category, "Compilers");
        assert_eq!(p.tags, vec!["Rust", "LLVM"]);
        assert_eq!(p.content.as_deref(), Some("# Body\n"));
    }

    #[test]
    fn test_list_title_falls_back() {
        let p = Post::from_document("x.md", "---\ntitle:\n---\n");
        assert_eq!(p.title, "Untitled");
    }

    #[test]
    fn test_scalar_tags_become_single_item() {
        let p = Post::from_document("x.md", "---\ntags: rust\n---\n");
        assert_eq!(p.tags, vec!["rust"]);
    }

    #[test]
    fn test_parse_date_forms() {
        assert!(parse_date("2024-01-05").is_some());
        assert!(parse_date("2024-01-05T10:30:00Z").is_some());
        assert!(parse_date("2024-01-05T10:30:00.000Z").is_some());
        assert!(parse_date("2024-01-05T10:30").is_some());
        assert!(parse_date("soon").is_none());
    }

    #[test]
    fn test_sort_descending_and_stable() {
        let mut posts = vec![
            post("old", "2023-01-01"),
            post("tie-a", "2024-02-02"),
            post("new", "2024-05-05"),
            post("tie-b", "2024-02-02"),
            post("undated", "someday"),
        ];
        sort_by_date(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "tie-a", "tie-b", "old", "undated"]);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-05"), "January 5, 2024");
        assert_eq!(format_date("not a date"), "not a date");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(estimate_reading_time(""), "1 min read");
        assert_eq!(estimate_reading_time(&"word ".repeat(500)), "3 min read");
        assert_eq!(estimate_reading_time(&"word ".repeat(299)), "1 min read");
    }
}
