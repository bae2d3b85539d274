use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::LazyLock;

static DOCUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n(.*)$").expect("frontmatter pattern")
});

/// A frontmatter value: either plain text or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    List(Vec<String>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::List(_) => None,
        }
    }
}

pub type Metadata = HashMap<String, Value>;

/// Split a document into its frontmatter block and body.
///
/// Only a small line-oriented subset of YAML is understood: `key: value`,
/// inline lists (`key: [a, b]`) and block lists (`key:` followed by `- item`
/// lines). Anything that doesn't match the delimited layout is returned
/// untouched as body with no metadata.
pub fn parse(document: &str) -> (Metadata, String) {
    let Some(caps) = DOCUMENT.captures(document) else {
        return (Metadata::new(), document.to_string());
    };

    let block = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    (parse_block(block), body.to_string())
}

fn parse_block(block: &str) -> Metadata {
    let mut data = Metadata::new();
    let mut open_list: Option<String> = None;

    for line in block.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix('-') {
            let item = strip_quotes(item.trim());
            // Stray items with no open list key are dropped.
            if let Some(key) = &open_list {
                if let Some(Value::List(items)) = data.get_mut(key) {
                    items.push(item.to_string());
                }
            }
            continue;
        }

        let Some(colon) = trimmed.find(':').filter(|&i| i > 0) else {
            continue;
        };
        let key = trimmed[..colon].trim().to_string();
        let value = strip_quotes(trimmed[colon + 1..].trim());

        if value.is_empty() || value == "[" {
            data.insert(key.clone(), Value::List(Vec::new()));
            open_list = Some(key);
        } else if value.starts_with('[') && value.ends_with(']') {
            let items = value[1..value.len() - 1]
                .split(',')
                .map(|item| strip_quotes(item.trim()).to_string())
                .collect();
            data.insert(key, Value::List(items));
            open_list = None;
        } else {
            data.insert(key, Value::Text(value.to_string()));
            open_list = None;
        }
    }

    data
}

/// Drop one leading and one trailing quote character, independently.
fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix(['"', '\'']).unwrap_or(s);
    s.strip_suffix(['"', '\'']).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_scalars_and_inline_list() {
        let doc = "---\ntitle: \"Hello\"\ndate: 2024-01-05\ntags: [a, b, c]\n---\nBody line\nmore\n";
        let (meta, body) = parse(doc);
        assert_eq!(meta.get("title"), Some(&text("Hello")));
        assert_eq!(meta.get("date"), Some(&text("2024-01-05")));
        assert_eq!(meta.get("tags"), Some(&list(&["a", "b", "c"])));
        assert_eq!(body, "Body line\nmore\n");
    }

    #[test]
    fn test_block_list() {
        let doc = "---\ntags:\n  - a\n  - \"b\"\ncategory: Rust\n---\nbody";
        let (meta, body) = parse(doc);
        assert_eq!(meta.get("tags"), Some(&list(&["a", "b"])));
        assert_eq!(meta.get("category"), Some(&text("Rust")));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_open_bracket_starts_block_list() {
        let (meta, _) = parse("---\ntags: [\n- x\n- y\n---\n");
        assert_eq!(meta.get("tags"), Some(&list(&["x", "y"])));
    }

    #[test]
    fn test_no_delimiters_is_body_only() {
        let doc = "# Just markdown\n\nNo metadata here.";
        let (meta, body) = parse(doc);
        assert!(meta.is_empty());
        assert_eq!(body, doc);
    }

    #[test]
    fn test_missing_newline_after_closing_delimiter() {
        let doc = "---\ntitle: x\n---";
        let (meta, body) = parse(doc);
        assert!(meta.is_empty());
        assert_eq!(body, doc);
    }

    #[test]
    fn test_stray_list_item_is_dropped() {
        let (meta, _) = parse("---\n- orphan\ntitle: T\n- also dropped\n---\n");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get("title"), Some(&text("T")));
    }

    #[test]
    fn test_quotes_stripped_independently() {
        let (meta, _) = parse("---\na: \"mixed'\nb: 'only-leading\nc: [\"x\", 'y']\n---\n");
        assert_eq!(meta.get("a"), Some(&text("mixed")));
        assert_eq!(meta.get("b"), Some(&text("only-leading")));
        assert_eq!(meta.get("c"), Some(&list(&["x", "y"])));
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let (meta, _) = parse("---\ntitle: Rust: the good parts\n---\n");
        assert_eq!(meta.get("title"), Some(&text("Rust: the good parts")));
    }

    #[test]
    fn test_empty_inline_list_yields_single_empty_item() {
        let (meta, _) = parse("---\ntags: []\n---\n");
        assert_eq!(meta.get("tags"), Some(&list(&[""])));
    }

    #[test]
    fn test_blank_lines_after_closing_delimiter_are_consumed() {
        let (_, body) = parse("---\ntitle: x\n---\n\n\nText");
        assert_eq!(body, "Text");
    }

    #[test]
    fn test_no_typed_scalars() {
        let (meta, _) = parse("---\ndraft: true\ncount: 3\n---\n");
        assert_eq!(meta.get("draft"), Some(&text("true")));
        assert_eq!(meta.get("count"), Some(&text("3")));
    }
}
