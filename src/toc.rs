//! Table of contents for rendered articles.
//!
//! Id assignment is pure: headings are scanned out of the rendered HTML,
//! [`assign_ids`] decides every id, and [`apply_ids`] writes those exact ids
//! back. [`TocTracker`] follows which heading is active as the reader scrolls.

use crate::render::escape_html;
use log::debug;
use regex::{Captures, NoExpand, Regex};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Space reserved for the sticky header, in pixels.
pub const HEADER_OFFSET: f64 = 100.0;
/// Bottom of the active region as a fraction of viewport height.
pub const ACTIVE_REGION_BOTTOM: f64 = 0.34;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-4])(\s[^>]*)?>(.*?)</h([1-6])>").expect("heading pattern")
});
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:^|\s)id\s*=\s*"([^"]*)""#).expect("id pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z_]+").expect("non-word pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    /// Existing id, entity-decoded.
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// h1–h4 headings of a rendered article, in document order.
pub fn scan_headings(html: &str) -> Vec<Heading> {
    HEADING
        .captures_iter(html)
        .filter(|caps| caps[1] == caps[4])
        .map(|caps| Heading {
            level: caps[1].parse().unwrap_or(1),
            text: text_content(&caps[3]),
            id: caps
                .get(2)
                .and_then(|attrs| ID_ATTR.captures(attrs.as_str()))
                .map(|id| decode_entities(&id[1]))
                .filter(|id| !id.is_empty()),
        })
        .collect()
}

/// Existing ids are kept, the rest become `heading-{index}-{slug}`.
pub fn assign_ids(headings: &[Heading]) -> Vec<TocEntry> {
    headings
        .iter()
        .enumerate()
        .map(|(index, heading)| TocEntry {
            id: heading
                .id
                .clone()
                .unwrap_or_else(|| format!("heading-{}-{}", index, heading_slug(&heading.text))),
            text: heading.text.clone(),
            level: heading.level,
        })
        .collect()
}

/// Write entry ids onto the matching headings of `html`.
pub fn apply_ids(html: &str, entries: &[TocEntry]) -> String {
    let mut entries = entries.iter();
    HEADING
        .replace_all(html, |caps: &Captures| {
            if caps[1] != caps[4] {
                return caps[0].to_string();
            }
            let Some(entry) = entries.next() else {
                return caps[0].to_string();
            };
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            let attrs = if ID_ATTR.is_match(attrs) {
                ID_ATTR
                    .replace(attrs, NoExpand(&format!(" id=\"{}\"", escape_html(&entry.id))))
                    .into_owned()
            } else {
                format!(" id=\"{}\"{}", escape_html(&entry.id), attrs)
            };
            format!("<h{lvl}{}>{}</h{lvl}>", attrs, &caps[3], lvl = &caps[1])
        })
        .into_owned()
}

/// Assign heading ids in `html` and return the rewritten HTML with its outline.
pub fn build_toc(html: &str) -> (String, Vec<TocEntry>) {
    let entries = assign_ids(&scan_headings(html));
    debug!("Built table of contents with {} entries", entries.len());
    (apply_ids(html, &entries), entries)
}

pub fn heading_slug(text: &str) -> String {
    NON_WORD.replace_all(&text.to_lowercase(), "-").into_owned()
}

/// The outline panel markup.
pub fn render_toc(entries: &[TocEntry], active: Option<&str>) -> String {
    let mut out = String::from(
        "<nav class=\"blog-toc\" id=\"blog-toc\">\n<div class=\"toc-header\">On this page</div>\n<div class=\"toc-list\">\n",
    );
    if entries.is_empty() {
        out.push_str("<div class=\"toc-empty\">No headings found</div>\n");
    }
    for entry in entries {
        let active_class = if active == Some(entry.id.as_str()) { " active" } else { "" };
        out.push_str(&format!(
            "<a href=\"#{id}\" class=\"toc-link toc-level-{}{}\" data-id=\"{id}\">{}</a>\n",
            entry.level,
            active_class,
            escape_html(&entry.text),
            id = escape_html(&entry.id),
        ));
    }
    out.push_str("</div>\n</nav>\n");
    out
}

fn text_content(inner: &str) -> String {
    decode_entities(&TAG.replace_all(inner, ""))
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Where a heading currently sits, relative to the top of the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingPosition {
    pub id: String,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
    pub smooth: bool,
}

/// Tracks the active outline entry.
///
/// A heading counts as visible while it overlaps the band between the header
/// offset and the top 34% of the viewport. Only headings entering the band
/// change the active entry; when several enter in one update the last one in
/// document order wins.
#[derive(Debug, Default)]
pub struct TocTracker {
    entries: Vec<TocEntry>,
    intersecting: HashSet<String>,
    active: Option<String>,
    connected: bool,
}

impl TocTracker {
    pub fn new(entries: Vec<TocEntry>) -> Self {
        Self {
            entries,
            intersecting: HashSet::new(),
            active: None,
            connected: true,
        }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Feed a position snapshot; returns the active id after the update.
    pub fn observe(&mut self, viewport_height: f64, positions: &[HeadingPosition]) -> Option<&str> {
        if !self.connected {
            return self.active();
        }
        let band_top = HEADER_OFFSET;
        let band_bottom = viewport_height * ACTIVE_REGION_BOTTOM;

        for entry in &self.entries {
            let Some(pos) = positions.iter().find(|p| p.id == entry.id) else {
                continue;
            };
            let inside = pos.bottom > band_top && pos.top < band_bottom;
            let was_inside = self.intersecting.contains(&entry.id);
            if inside && !was_inside {
                self.intersecting.insert(entry.id.clone());
                self.active = Some(entry.id.clone());
            } else if !inside && was_inside {
                self.intersecting.remove(&entry.id);
            }
        }
        self.active()
    }

    /// Jump to a heading: the active entry changes immediately.
    pub fn select(&mut self, id: &str, top: f64, scroll_y: f64) -> Option<ScrollRequest> {
        if !self.entries.iter().any(|e| e.id == id) {
            return None;
        }
        self.set_active(id);
        Some(ScrollRequest {
            top: top + scroll_y - HEADER_OFFSET,
            smooth: true,
        })
    }

    /// Stop observing; later snapshots are ignored.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.intersecting.clear();
    }

    fn set_active(&mut self, id: &str) {
        if self.active.as_deref() != Some(id) {
            self.active = Some(id.to_string());
        }
    }
}
