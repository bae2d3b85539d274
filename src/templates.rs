use crate::config::Config;
use crate::post::{estimate_reading_time, format_date, Post};
use crate::render::{escape_html, highlight_css};
use crate::router::{Document, PostPane, PostView, Route, ViewRouter, SEO_MARKER};
use crate::toc::render_toc;

/// The full page for the router's current view.
pub fn render_page(config: &Config, router: &ViewRouter, posts: &[Post]) -> String {
    let sections: String = router
        .sections()
        .iter()
        .map(|section| {
            format!(
                r#"<section class="home-section" id="{}"{}>
    <h2 class="section-title">{}</h2>
    <div class="section-body">{}</div>
</section>"#,
                escape_html(&section.id),
                hidden_attr(section.visible),
                escape_html(&section.title),
                section.html
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let blog_list = format!(
        r#"<section class="blog" id="blog"{}>
    <h2 class="section-title">Recent Articles</h2>
    <div class="blog-grid">
{}
    </div>
</section>"#,
        hidden_attr(router.blog_list_visible()),
        render_blog_list(posts)
    );

    let outlet = match router.route() {
        Route::NotFound { .. } => render_not_found(),
        _ => render_post_pane(router.pane()),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
{}
    <link rel="stylesheet" href="/style.css">
    <link rel="alternate" type="application/rss+xml" title="{}" href="/feed.xml">
</head>
<body>
    <div class="container">
        <header>
            <div class="header-content">
                <a href="/" class="main-title">{}</a>
                <nav class="header-nav">
                    <a href="/#about">About</a>
                    <a href="/#projects">Projects</a>
                    <a href="/#blog">Blog</a>
                    <a href="/#contact">Contact</a>
                </nav>
            </div>
        </header>

        <main class="content" id="outlet">
{}
{}
{}
        </main>

        <footer>
            <a href="/feed.xml">RSS</a>
            <span>&copy; {}</span>
        </footer>
    </div>
</body>
</html>"#,
        render_head(router.document()),
        escape_html(&config.title),
        escape_html(&config.title),
        sections,
        blog_list,
        outlet,
        escape_html(&config.author)
    )
}

fn hidden_attr(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        " hidden"
    }
}

pub fn render_head(document: &Document) -> String {
    let mut head = format!("    <title>{}</title>\n", escape_html(&document.title));
    for tag in document.meta() {
        head.push_str(&format!(
            "    <meta {}=\"{}\" content=\"{}\" {}=\"post\">\n",
            tag.attr,
            escape_html(&tag.key),
            escape_html(&tag.content),
            SEO_MARKER
        ));
    }
    if let Some(data) = document.structured_data() {
        head.push_str(&format!(
            "    <script type=\"application/ld+json\" {}=\"post\">{}</script>\n",
            SEO_MARKER, data
        ));
    }
    head
}

pub fn render_blog_list(posts: &[Post]) -> String {
    if posts.is_empty() {
        return r#"        <p class="blog-empty">No articles yet.</p>"#.to_string();
    }
    posts
        .iter()
        .map(|post| {
            format!(
                r#"        <a href="/blog/{}" class="blog-card-link">
            <article class="blog-card">
                <div class="blog-meta">
                    <time class="blog-date" datetime="{}">{}</time>
                    <span class="blog-category">{}</span>
                    <span class="blog-reading">{}</span>
                </div>
                <h3 class="blog-title">{}</h3>
                <p class="blog-excerpt">{}</p>
                <div class="blog-tags">{}</div>
            </article>
        </a>"#,
                escape_html(&post.slug),
                escape_html(&post.date),
                escape_html(&format_date(&post.date)),
                escape_html(&post.category),
                estimate_reading_time(post.reading_text()),
                escape_html(&post.title),
                escape_html(&post.excerpt),
                render_tags(&post.tags, usize::MAX)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_tags(tags: &[String], limit: usize) -> String {
    tags.iter()
        .take(limit)
        .map(|tag| format!("<span class=\"tag\">{}</span>", escape_html(tag)))
        .collect::<Vec<_>>()
        .join("")
}

pub fn render_post_pane(pane: &PostPane) -> String {
    let body = match pane {
        PostPane::Hidden => return String::new(),
        PostPane::Loading { .. } => r#"<div class="post-loading">Loading article...</div>"#.to_string(),
        PostPane::NotFound { .. } => r#"<div class="post-error">
    <h2>Post Not Found</h2>
    <p>Sorry, the blog post you're looking for doesn't exist.</p>
    <a href="/" class="btn btn-primary">Back to Blog</a>
</div>"#
            .to_string(),
        PostPane::Ready(view) => render_post_view(view),
    };

    format!(
        r#"<section class="blog-post" id="blog-post">
    <div class="blog-post-container">
{}
    </div>
</section>"#,
        body
    )
}

fn render_post_view(view: &PostView) -> String {
    let post = &view.post;
    format!(
        r#"<div class="blog-post-content">
    <header class="post-header">
        <a href="/#blog" class="back-link">&larr; Back to Articles</a>
        <div class="post-meta">
            <time class="post-date" datetime="{}">{}</time>
            <span class="post-category">{}</span>
            <span class="post-reading">{}</span>
        </div>
        <h1 class="post-title">{}</h1>
        <div class="post-tags">{}</div>
    </header>
    <article class="post-content">
{}
    </article>
{}
</div>
<aside class="blog-post-sidebar">
{}
</aside>"#,
        escape_html(&post.date),
        escape_html(&format_date(&post.date)),
        escape_html(&post.category),
        view.reading_time,
        escape_html(&post.title),
        render_tags(&post.tags, usize::MAX),
        view.html,
        render_related(&view.related),
        render_toc(&view.toc, None)
    )
}

pub fn render_related(related: &[Post]) -> String {
    if related.is_empty() {
        return String::new();
    }
    let cards: String = related
        .iter()
        .map(|post| {
            format!(
                r#"        <a href="/blog/{}" class="related-article-link">
            <article class="related-article-card">
                <div class="related-article-meta">
                    <span class="related-date">{}</span>
                    <span class="related-reading">{}</span>
                </div>
                <h3 class="related-article-title">{}</h3>
                <p class="related-article-excerpt">{}</p>
                <div class="related-article-tags">{}</div>
                <span class="related-read-more">Read article &rarr;</span>
            </article>
        </a>"#,
                escape_html(&post.slug),
                escape_html(&format_date(&post.date)),
                estimate_reading_time(post.reading_text()),
                escape_html(&post.title),
                escape_html(&post.excerpt),
                render_tags(&post.tags, 3)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"    <section class="related-articles">
        <h2 class="related-articles-title">Related Articles</h2>
        <div class="related-articles-grid">
{}
        </div>
    </section>"#,
        cards
    )
}

fn render_not_found() -> String {
    r#"<section class="not-found">
    <div class="not-found-content">
        <h1 class="not-found-title">404</h1>
        <h2 class="not-found-subtitle">Page Not Found</h2>
        <p class="not-found-text">The page you're looking for doesn't exist or has been moved.</p>
        <div class="not-found-actions">
            <a href="/" class="btn btn-primary">Go Home</a>
            <a href="/#blog" class="btn btn-secondary">View Blog</a>
        </div>
    </div>
</section>"#
        .to_string()
}

pub fn generate_css(config: &Config) -> String {
    let theme = &config.theme;
    let mut css = format!(
        r#"/* Reset and base styles */
* {{
  margin: 0;
  padding: 0;
  box-sizing: border-box;
}}

[hidden] {{
  display: none !important;
}}

body {{
  background-color: {background};
  color: {text};
  font-family: 'Inter', system-ui, sans-serif;
  line-height: 1.7;
  font-size: 18px;
  -webkit-font-smoothing: antialiased;
}}

a {{
  color: {primary};
  text-decoration: none;
}}

.container {{
  max-width: 1100px;
  margin: 0 auto;
  padding: 0 20px;
}}

header {{
  position: sticky;
  top: 0;
  height: 100px;
  display: flex;
  align-items: center;
  background-color: {background};
  z-index: 10;
}}

.header-content {{
  display: flex;
  align-items: center;
  justify-content: space-between;
  width: 100%;
}}

.main-title {{
  font-size: 28px;
  font-weight: 700;
  color: {text};
}}

.header-nav a {{
  margin-left: 24px;
  color: {accent};
}}

.home-section, .blog {{
  padding: 80px 0;
}}

.section-title {{
  font-size: 32px;
  margin-bottom: 30px;
}}

.blog-grid, .related-articles-grid {{
  display: grid;
  grid-template-columns: repeat(auto-fill, minmax(300px, 1fr));
  gap: 24px;
}}

.blog-card, .related-article-card {{
  padding: 24px;
  border: 1px solid {accent};
  border-radius: 8px;
  color: {text};
  height: 100%;
}}

.blog-meta, .post-meta, .related-article-meta {{
  display: flex;
  gap: 12px;
  font-size: 14px;
  color: {accent};
}}

.tag {{
  display: inline-block;
  margin: 4px 6px 0 0;
  padding: 2px 10px;
  border-radius: 12px;
  font-size: 13px;
  color: {primary};
  border: 1px solid {primary};
}}

.blog-post-container {{
  display: grid;
  grid-template-columns: minmax(0, 1fr) 260px;
  gap: 48px;
  padding: 40px 0 80px;
}}

.post-title {{
  font-size: 42px;
  line-height: 1.2;
  margin: 16px 0;
}}

.post-content {{
  margin: 40px 0 60px;
}}

.post-content h1, .post-content h2, .post-content h3, .post-content h4 {{
  margin: 40px 0 16px;
  scroll-margin-top: 100px;
}}

.post-content p, .post-content ul, .post-content ol {{
  margin-bottom: 1.5em;
}}

.post-content ul, .post-content ol {{
  padding-left: 30px;
}}

.post-content blockquote {{
  border-left: 3px solid {accent};
  padding-left: 20px;
  margin: 30px 0;
  font-style: italic;
}}

.post-content code {{
  font-family: 'SF Mono', Monaco, 'Cascadia Code', Consolas, monospace;
  font-size: 0.9em;
}}

.post-content pre {{
  padding: 20px;
  border-radius: 6px;
  overflow-x: auto;
  margin: 20px 0;
  background-color: rgba(0, 0, 0, 0.3);
}}

.blog-toc {{
  position: sticky;
  top: 120px;
  font-size: 14px;
}}

.toc-header {{
  font-weight: 600;
  margin-bottom: 12px;
}}

.toc-link {{
  display: block;
  padding: 4px 0;
  color: {accent};
}}

.toc-link.active {{
  color: {primary};
}}

.toc-level-3 {{ padding-left: 12px; }}
.toc-level-4 {{ padding-left: 24px; }}

.toc-empty, .post-loading, .blog-empty {{
  color: {accent};
}}

.post-error, .not-found {{
  text-align: center;
  padding: 120px 0;
}}

.btn {{
  display: inline-block;
  margin: 24px 8px 0;
  padding: 10px 24px;
  border: 1px solid {primary};
  border-radius: 4px;
}}

footer {{
  display: flex;
  justify-content: space-between;
  padding: 40px 0;
  color: {accent};
  font-size: 14px;
}}

@media (max-width: 900px) {{
  .blog-post-container {{
    grid-template-columns: 1fr;
  }}

  .blog-post-sidebar {{
    display: none;
  }}
}}
"#,
        background = theme.background_color,
        text = theme.text_color,
        primary = theme.primary_color,
        accent = theme.accent_color,
    );
    css.push_str("\n/* Code highlighting */\n");
    css.push_str(&highlight_css(&theme.code_theme));
    css
}
