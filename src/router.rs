//! Maps URLs onto page state: which home sections are visible, what the post
//! pane shows, and the document head for the current view.

use crate::post::{estimate_reading_time, Post};
use crate::related::related_posts;
use crate::render::MarkdownRenderer;
use crate::repository::PostRepository;
use crate::toc::{self, TocEntry};
use log::{debug, info};
use serde_json::json;
use std::sync::Arc;

/// Attribute carried by every head tag the router manages.
pub const SEO_MARKER: &str = "data-seo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home { fragment: Option<String> },
    Post { slug: String },
    NotFound { path: String },
}

impl Route {
    pub fn parse(url: &str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let path = rest.split('?').next().unwrap_or("");

        if path.is_empty() || path == "/" || path == "/index.html" {
            // Older links address posts as `/#blog/{slug}`.
            if let Some(slug) = fragment.and_then(|f| f.strip_prefix("blog/")) {
                if !slug.is_empty() {
                    return Route::Post { slug: slug.to_string() };
                }
            }
            return Route::Home {
                fragment: fragment.filter(|f| !f.is_empty()).map(str::to_string),
            };
        }

        if let Some(slug) = path.strip_prefix("/blog/") {
            let slug = slug.strip_suffix('/').unwrap_or(slug);
            if !slug.is_empty() && !slug.contains('/') {
                return Route::Post { slug: slug.to_string() };
            }
        }

        Route::NotFound { path: path.to_string() }
    }
}

/// A home page section the router shows and hides.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub html: String,
    pub visible: bool,
}

impl Section {
    pub fn new(id: &str, title: &str, html: String) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            html,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub html: String,
    pub toc: Vec<TocEntry>,
    pub related: Vec<Post>,
    pub reading_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostPane {
    Hidden,
    Loading { slug: String },
    Ready(Box<PostView>),
    NotFound { slug: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    /// `name` or `property`.
    pub attr: &'static str,
    pub key: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub title: String,
    meta: Vec<MetaTag>,
    structured_data: Option<String>,
}

impl Document {
    pub fn meta(&self) -> &[MetaTag] {
        &self.meta
    }

    pub fn meta_content(&self, key: &str) -> Option<&str> {
        self.meta
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.content.as_str())
    }

    pub fn structured_data(&self) -> Option<&str> {
        self.structured_data.as_deref()
    }

    /// Replace the tag with the same key, or add it.
    pub fn upsert_meta(&mut self, attr: &'static str, key: &str, content: &str) {
        let tag = MetaTag {
            attr,
            key: key.to_string(),
            content: content.to_string(),
        };
        match self.meta.iter_mut().find(|m| m.attr == attr && m.key == key) {
            Some(existing) => *existing = tag,
            None => self.meta.push(tag),
        }
    }

    pub fn set_structured_data(&mut self, json: String) {
        self.structured_data = Some(json);
    }

    /// Drop every managed tag.
    pub fn clear_marked(&mut self) {
        self.meta.clear();
        self.structured_data = None;
    }
}

#[derive(Debug, Clone)]
pub struct SiteMeta {
    pub name: String,
    pub base_url: String,
    pub author: String,
}

/// A post load that was started by [`ViewRouter::navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    generation: u64,
    slug: String,
}

impl PendingLoad {
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    generation: u64,
    slug: String,
    view: Option<PostView>,
}

/// Fetches and prepares a post for display. Cheap to clone.
#[derive(Clone)]
pub struct PostLoader {
    repository: Arc<PostRepository>,
    renderer: Arc<MarkdownRenderer>,
    related_limit: usize,
}

impl PostLoader {
    pub fn new(
        repository: Arc<PostRepository>,
        renderer: Arc<MarkdownRenderer>,
        related_limit: usize,
    ) -> Self {
        Self {
            repository,
            renderer,
            related_limit,
        }
    }

    pub async fn load(&self, pending: PendingLoad) -> LoadOutcome {
        let view = match self.repository.get_post(&pending.slug).await {
            Some(post) => {
                let posts = self.repository.list_posts().await;
                Some(self.prepare(post, &posts))
            }
            None => None,
        };
        LoadOutcome {
            generation: pending.generation,
            slug: pending.slug,
            view,
        }
    }

    pub fn prepare(&self, post: Post, all_posts: &[Post]) -> PostView {
        let body = post.content.as_deref().unwrap_or("");
        let (html, toc) = toc::build_toc(&self.renderer.to_html(body));
        let related = related_posts(&post, all_posts, self.related_limit)
            .into_iter()
            .cloned()
            .collect();
        PostView {
            reading_time: estimate_reading_time(post.reading_text()),
            post,
            html,
            toc,
            related,
        }
    }
}

/// Page state for the single-page site.
///
/// Navigation is split in two: [`navigate`](Self::navigate) switches views
/// immediately and leaves the post pane loading, [`complete`](Self::complete)
/// fills it in once the load resolves. Loads that were overtaken by a later
/// navigation are dropped.
pub struct ViewRouter {
    loader: PostLoader,
    site: SiteMeta,
    sections: Vec<Section>,
    blog_list_visible: bool,
    route: Route,
    pane: PostPane,
    document: Document,
    generation: u64,
}

impl ViewRouter {
    pub fn new(loader: PostLoader, site: SiteMeta, sections: Vec<Section>) -> Self {
        let document = Document {
            title: site.name.clone(),
            ..Default::default()
        };
        Self {
            loader,
            site,
            sections,
            blog_list_visible: true,
            route: Route::Home { fragment: None },
            pane: PostPane::Hidden,
            document,
            generation: 0,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn blog_list_visible(&self) -> bool {
        self.blog_list_visible
    }

    pub fn pane(&self) -> &PostPane {
        &self.pane
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn site(&self) -> &SiteMeta {
        &self.site
    }

    pub fn loader(&self) -> PostLoader {
        self.loader.clone()
    }

    /// Switch views for `url`. Returns the post load to run, if any.
    pub fn navigate(&mut self, url: &str) -> Option<PendingLoad> {
        self.generation += 1;
        let route = Route::parse(url);
        debug!("Navigating to {:?}", route);

        let pending = match &route {
            Route::Home { .. } => {
                self.set_sections_visible(true);
                self.blog_list_visible = true;
                self.pane = PostPane::Hidden;
                self.reset_document(self.site.name.clone());
                None
            }
            Route::Post { slug } => {
                self.set_sections_visible(false);
                self.blog_list_visible = false;
                self.pane = PostPane::Loading { slug: slug.clone() };
                Some(PendingLoad {
                    generation: self.generation,
                    slug: slug.clone(),
                })
            }
            Route::NotFound { .. } => {
                self.set_sections_visible(false);
                self.blog_list_visible = false;
                self.pane = PostPane::Hidden;
                self.reset_document(format!("404 - Page Not Found | {}", self.site.name));
                None
            }
        };

        self.route = route;
        pending
    }

    /// Apply a finished load. Returns false when it was superseded.
    pub fn complete(&mut self, outcome: LoadOutcome) -> bool {
        if outcome.generation != self.generation {
            debug!("Dropping stale load for {}", outcome.slug);
            return false;
        }

        match outcome.view {
            Some(view) => {
                self.apply_seo(&view.post);
                self.pane = PostPane::Ready(Box::new(view));
            }
            None => {
                info!("Post not found: {}", outcome.slug);
                self.reset_document(self.site.name.clone());
                self.pane = PostPane::NotFound { slug: outcome.slug };
            }
        }
        true
    }

    /// Navigate and wait for the post, if the route has one.
    pub async fn show(&mut self, url: &str) {
        if let Some(pending) = self.navigate(url) {
            let outcome = self.loader.load(pending).await;
            self.complete(outcome);
        }
    }

    fn set_sections_visible(&mut self, visible: bool) {
        for section in &mut self.sections {
            section.visible = visible;
        }
    }

    fn reset_document(&mut self, title: String) {
        self.document.title = title;
        self.document.clear_marked();
    }

    fn apply_seo(&mut self, post: &Post) {
        let url = format!("{}/blog/{}", self.site.base_url, post.slug);
        let keywords = post.tags.join(", ");
        let doc = &mut self.document;

        doc.title = format!("{} | {}", post.title, self.site.name);
        doc.upsert_meta("name", "description", &post.excerpt);
        doc.upsert_meta("name", "keywords", &keywords);
        doc.upsert_meta("name", "author", &self.site.author);
        doc.upsert_meta("property", "og:type", "article");
        doc.upsert_meta("property", "og:title", &post.title);
        doc.upsert_meta("property", "og:description", &post.excerpt);
        doc.upsert_meta("property", "og:url", &url);
        doc.upsert_meta("property", "article:published_time", &post.date);
        doc.upsert_meta("property", "article:section", &post.category);
        doc.upsert_meta("name", "twitter:card", "summary");
        doc.upsert_meta("name", "twitter:title", &post.title);
        doc.upsert_meta("name", "twitter:description", &post.excerpt);

        let data = json!({
            "@context": "https://schema.org",
            "@type": "BlogPosting",
            "headline": post.title,
            "description": post.excerpt,
            "datePublished": post.date,
            "articleSection": post.category,
            "keywords": keywords,
            "url": url,
            "author": { "@type": "Person", "name": self.site.author },
        });
        doc.set_structured_data(data.to_string().replace("</", "<\\/"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Highlighter;
    use crate::repository::testing::{sample_source, MemorySource};
    use crate::repository::FailurePolicy;

    struct Plain;

    impl Highlighter for Plain {
        fn highlight(&self, _code: &str, _lang: &str) -> Option<String> {
            None
        }
    }

    fn router_with(source: Arc<MemorySource>) -> (ViewRouter, Arc<PostRepository>) {
        let repository = Arc::new(PostRepository::new(source, FailurePolicy::FailAll));
        let loader = PostLoader::new(
            repository.clone(),
            Arc::new(MarkdownRenderer::new(Box::new(Plain))),
            3,
        );
        let site = SiteMeta {
            name: "example.dev".to_string(),
            base_url: "https://example.dev".to_string(),
            author: "Tester".to_string(),
        };
        let sections = vec![
            Section::new("hero", "Hero", String::new()),
            Section::new("about", "About", String::new()),
        ];
        (ViewRouter::new(loader, site, sections), repository)
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Route::Home { fragment: None });
        assert_eq!(
            Route::parse("/#about"),
            Route::Home { fragment: Some("about".to_string()) }
        );
        assert_eq!(Route::parse("/blog/hello"), Route::Post { slug: "hello".to_string() });
        assert_eq!(Route::parse("/blog/hello/"), Route::Post { slug: "hello".to_string() });
        assert_eq!(Route::parse("/#blog/hello"), Route::Post { slug: "hello".to_string() });
        assert_eq!(Route::parse("/?ref=x"), Route::Home { fragment: None });
        assert_eq!(
            Route::parse("/blog"),
            Route::NotFound { path: "/blog".to_string() }
        );
        assert_eq!(
            Route::parse("/blog/a/b"),
            Route::NotFound { path: "/blog/a/b".to_string() }
        );
        assert_eq!(
            Route::parse("/projects"),
            Route::NotFound { path: "/projects".to_string() }
        );
    }

    #[test]
    fn test_navigate_to_post_is_immediate() {
        let (mut router, _) = router_with(Arc::new(sample_source()));
        let pending = router.navigate("/blog/newest").expect("post route loads");
        assert_eq!(pending.slug(), "newest");
        assert_eq!(router.pane(), &PostPane::Loading { slug: "newest".to_string() });
        assert!(router.sections().iter().all(|s| !s.visible));
        assert!(!router.blog_list_visible());
    }

    #[tokio::test]
    async fn test_post_loaded_with_toc_related_and_seo() {
        let (mut router, _) = router_with(Arc::new(sample_source()));
        router.show("/blog/newest").await;

        let PostPane::Ready(view) = router.pane() else {
            panic!("expected a loaded post, got {:?}", router.pane());
        };
        assert_eq!(view.post.title, "Newest");
        assert_eq!(view.toc.len(), 1);
        assert_eq!(view.toc[0].id, "heading-0-intro");
        assert!(view.html.contains("id=\"heading-0-intro\""));
        assert_eq!(view.related.len(), 2);
        assert!(view.related.iter().all(|p| p.slug != "newest"));

        let doc = router.document();
        assert_eq!(doc.title, "Newest | example.dev");
        assert_eq!(doc.meta_content("og:url"), Some("https://example.dev/blog/newest"));
        assert!(doc.structured_data().unwrap().contains("\"BlogPosting\""));
    }

    #[tokio::test]
    async fn test_repeated_navigation_replaces_seo_tags() {
        let (mut router, _) = router_with(Arc::new(sample_source()));
        router.show("/blog/newest").await;
        let count = router.document().meta().len();
        router.show("/blog/older").await;
        assert_eq!(router.document().meta().len(), count);
        assert_eq!(router.document().meta_content("og:title"), Some("Older"));
        assert_eq!(router.document().title, "Older | example.dev");
    }

    #[tokio::test]
    async fn test_not_found_post_keeps_cache() {
        let (mut router, repository) = router_with(Arc::new(sample_source()));
        let before = repository.list_posts().await;

        router.show("/blog/does-not-exist").await;

        assert_eq!(
            router.pane(),
            &PostPane::NotFound { slug: "does-not-exist".to_string() }
        );
        assert_eq!(router.route(), &Route::Post { slug: "does-not-exist".to_string() });
        let after = repository.list_posts().await;
        assert!(Arc::ptr_eq(&before, &after));
        assert!(router.document().meta().is_empty());
    }

    #[tokio::test]
    async fn test_stale_load_is_dropped() {
        let (mut router, _) = router_with(Arc::new(sample_source()));
        let loader = router.loader();
        let first = router.navigate("/blog/older").unwrap();
        let second = router.navigate("/blog/middle").unwrap();

        let stale = loader.load(first).await;
        assert!(!router.complete(stale));
        assert_eq!(router.pane(), &PostPane::Loading { slug: "middle".to_string() });

        let fresh = loader.load(second).await;
        assert!(router.complete(fresh));
        assert!(matches!(router.pane(), PostPane::Ready(v) if v.post.slug == "middle"));
    }

    #[tokio::test]
    async fn test_home_restores_sections() {
        let (mut router, _) = router_with(Arc::new(sample_source()));
        router.show("/blog/newest").await;
        router.show("/#blog").await;
        assert!(router.sections().iter().all(|s| s.visible));
        assert!(router.blog_list_visible());
        assert_eq!(router.pane(), &PostPane::Hidden);
        assert_eq!(router.document().title, "example.dev");
        assert!(router.document().structured_data().is_none());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let (mut router, _) = router_with(Arc::new(sample_source()));
        router.show("/nope").await;
        assert!(matches!(router.route(), Route::NotFound { .. }));
        assert_eq!(router.document().title, "404 - Page Not Found | example.dev");
    }

    #[tokio::test]
    async fn test_offline_source_shows_not_found() {
        let source = Arc::new(sample_source());
        source.set_offline(true);
        let (mut router, repository) = router_with(source);
        router.show("/blog/newest").await;
        assert_eq!(router.pane(), &PostPane::NotFound { slug: "newest".to_string() });
        assert!(!repository.is_cached().await);
    }
}
