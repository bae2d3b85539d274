use log::{debug, warn};
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Languages the site highlights; anything else is shown as plain code.
pub const REGISTERED_LANGUAGES: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "rust",
    "json",
    "bash",
    "sh",
    "yaml",
    "markdown",
    "xml",
    "html",
];

/// Turns a code block into highlighted HTML.
///
/// Returning `None` means the language isn't supported and the code is
/// emitted escaped but otherwise unchanged.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: &str) -> Option<String>;
}

/// Class-based highlighting backed by syntect's bundled syntaxes.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }

    fn token(lang: &str) -> &str {
        match lang {
            // No TypeScript grammar ships with syntect; its JavaScript one covers most of it.
            "javascript" | "typescript" => "js",
            "python" => "py",
            "rust" => "rs",
            "bash" | "sh" => "sh",
            "markdown" => "md",
            other => other,
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Option<String> {
        let lang = lang.to_lowercase();
        if !REGISTERED_LANGUAGES.contains(&lang.as_str()) {
            return None;
        }
        let syntax = self.syntaxes.find_syntax_by_token(Self::token(&lang))?;

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                debug!("Highlighting {} failed: {}", lang, e);
                return None;
            }
        }
        Some(generator.finalize())
    }
}

/// Stylesheet for the classes emitted by [`SyntectHighlighter`], from one of
/// syntect's bundled themes. Empty when the theme is unknown.
pub fn highlight_css(theme: &str) -> String {
    let themes = ThemeSet::load_defaults();
    let Some(theme_def) = themes.themes.get(theme) else {
        warn!("Unknown code theme {:?}, code blocks stay unstyled", theme);
        return String::new();
    };
    match css_for_theme_with_class_style(theme_def, ClassStyle::Spaced) {
        Ok(css) => css,
        Err(e) => {
            warn!("Failed to build code theme {:?}: {}", theme, e);
            String::new()
        }
    }
}

/// Markdown to HTML with GitHub-flavoured extensions and highlighted code.
pub struct MarkdownRenderer {
    highlighter: Box<dyn Highlighter>,
}

impl MarkdownRenderer {
    pub fn new(highlighter: Box<dyn Highlighter>) -> Self {
        Self { highlighter }
    }

    pub fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        let mut code: Option<(String, String)> = None;
        let events = Parser::new_ext(markdown, options).filter_map(|event| match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                code = Some((lang, String::new()));
                None
            }
            Event::Text(text) => match code.as_mut() {
                Some((_, body)) => {
                    body.push_str(&text);
                    None
                }
                None => Some(Event::Text(text)),
            },
            Event::End(TagEnd::CodeBlock) => code
                .take()
                .map(|(lang, body)| Event::Html(self.code_block(&lang, &body).into())),
            other => Some(other),
        });

        let mut out = String::new();
        html::push_html(&mut out, events);
        out
    }

    fn code_block(&self, lang: &str, code: &str) -> String {
        if lang.is_empty() {
            return format!("<pre><code>{}</code></pre>\n", escape_html(code));
        }
        let body = self
            .highlighter
            .highlight(code, lang)
            .unwrap_or_else(|| escape_html(code));
        format!(
            "<pre><code class=\"hljs language-{}\">{}</code></pre>\n",
            escape_html(lang),
            body
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(Box::new(SyntectHighlighter::new()))
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
