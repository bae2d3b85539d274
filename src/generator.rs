use crate::config::Config;
use crate::feeds;
use crate::render::MarkdownRenderer;
use crate::repository::{DirSource, PostRepository, PostSource, INDEX_FILE};
use crate::router::{PostLoader, PostPane, Route, Section, SiteMeta, ViewRouter};
use crate::templates;
use anyhow::{Context, Result};
use chrono::Utc;
use colored::*;
use log::{debug, warn};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A rendered page and whether it stands for something missing.
#[derive(Debug)]
pub struct Page {
    pub html: String,
    pub not_found: bool,
}

/// Everything needed to render the site from one content source.
/// Shared by the static generator and the dev server.
#[derive(Clone)]
pub struct Site {
    config: Arc<Config>,
    repository: Arc<PostRepository>,
    renderer: Arc<MarkdownRenderer>,
}

impl Site {
    pub fn new(config: Config, source: Arc<dyn PostSource>) -> Self {
        let repository = Arc::new(PostRepository::new(source, config.failure_policy));
        Self::with_parts(config, repository, Arc::new(MarkdownRenderer::default()))
    }

    pub fn with_parts(
        config: Config,
        repository: Arc<PostRepository>,
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            repository,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &Arc<PostRepository> {
        &self.repository
    }

    /// A fresh router with the configured home sections.
    pub fn router(&self) -> ViewRouter {
        let loader = PostLoader::new(
            self.repository.clone(),
            self.renderer.clone(),
            self.config.related_limit,
        );
        let site = SiteMeta {
            name: self.config.title.clone(),
            base_url: self.config.base_url(),
            author: self.config.author.clone(),
        };
        let sections = self
            .config
            .sections
            .iter()
            .map(|s| Section::new(&s.id, &s.title, self.renderer.to_html(&s.body)))
            .collect();
        ViewRouter::new(loader, site, sections)
    }

    pub async fn render(&self, url: &str) -> Page {
        let mut router = self.router();
        router.show(url).await;
        let posts = self.repository.list_posts().await;
        let html = templates::render_page(&self.config, &router, &posts);
        let not_found = matches!(router.route(), Route::NotFound { .. })
            || matches!(router.pane(), PostPane::NotFound { .. });
        debug!("Rendered {} (not found: {})", url, not_found);
        Page { html, not_found }
    }

    pub async fn sitemap(&self) -> String {
        let posts = self.repository.list_posts().await;
        let entries = feeds::sitemap_entries(&posts, Utc::now());
        feeds::render_sitemap(&self.config.base_url(), &entries)
    }

    pub async fn feed(&self) -> String {
        let posts = self.repository.list_posts().await;
        feeds::render_rss(&self.config, &posts, Utc::now())
    }
}

pub struct SiteGenerator {
    site: Site,
}

impl SiteGenerator {
    pub fn new(config: Config) -> Self {
        let source = Arc::new(DirSource::new(&config.posts_dir));
        Self::from_site(Site::new(config, source))
    }

    pub fn from_site(site: Site) -> Self {
        Self { site }
    }

    pub async fn generate(&self) -> Result<()> {
        println!("{}", "Generating site...".cyan());

        let output_dir = Path::new(&self.site.config().output_dir);
        fs::create_dir_all(output_dir)
            .context("Failed to create output directory")?;

        let posts = self.site.repository().list_posts().await;

        self.generate_posts(&posts).await?;
        self.generate_pages().await?;
        self.copy_documents().await?;

        println!("{}", format!("Generated {} posts", posts.len()).green());

        Ok(())
    }

    async fn generate_posts(&self, posts: &[crate::post::Post]) -> Result<()> {
        let mut tasks = Vec::new();

        for post in posts {
            let site = self.site.clone();
            let slug = post.slug.clone();

            let task = tokio::spawn(async move {
                let post_dir = Path::new(&site.config().output_dir).join("blog").join(&slug);
                fs::create_dir_all(&post_dir)?;

                let page = site.render(&format!("/blog/{}", slug)).await;
                fs::write(post_dir.join("index.html"), page.html)
                    .with_context(|| format!("Failed to write page for {}", slug))?;
                Ok::<(), anyhow::Error>(())
            });

            tasks.push(task);
        }

        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(e);
                }
                Err(e) => {
                    return Err(anyhow::anyhow!("Task failed: {}", e));
                }
            }
        }

        Ok(())
    }

    async fn generate_pages(&self) -> Result<()> {
        let output_dir = Path::new(&self.site.config().output_dir);

        let home = self.site.render("/").await;
        fs::write(output_dir.join("index.html"), home.html)
            .context("Failed to write index.html")?;

        let missing = self.site.render("/404").await;
        fs::write(output_dir.join("404.html"), missing.html)
            .context("Failed to write 404.html")?;

        fs::write(output_dir.join("style.css"), templates::generate_css(self.site.config()))
            .context("Failed to write style.css")?;
        fs::write(output_dir.join("sitemap.xml"), self.site.sitemap().await)
            .context("Failed to write sitemap.xml")?;
        fs::write(output_dir.join("feed.xml"), self.site.feed().await)
            .context("Failed to write feed.xml")?;

        Ok(())
    }

    /// Publish the index and raw documents so the output can serve as a source itself.
    async fn copy_documents(&self) -> Result<()> {
        let blog_dir = Path::new(&self.site.config().output_dir).join("blog");
        fs::create_dir_all(&blog_dir)
            .context("Failed to create blog output directory")?;

        let source = self.site.repository().source();
        let listed = source.index().await.unwrap_or_else(|e| {
            warn!("No post index to publish: {:#}", e);
            Vec::new()
        });

        let mut names = Vec::with_capacity(listed.len());
        for name in listed {
            match source.document(&name).await {
                Ok(document) => {
                    fs::write(blog_dir.join(&name), document)
                        .with_context(|| format!("Failed to copy {}", name))?;
                    names.push(name);
                }
                Err(e) => warn!("Not publishing {}: {:#}", name, e),
            }
        }

        let index = serde_json::to_string_pretty(&names)
            .context("Failed to serialize post index")?;
        fs::write(blog_dir.join(INDEX_FILE), index)
            .context("Failed to write post index")?;

        Ok(())
    }
}
