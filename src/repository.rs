use crate::post::{self, Post};
use anyhow::{anyhow, bail, Context, Result};
use futures::future::{self, BoxFuture, FutureExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use walkdir::WalkDir;

pub const INDEX_FILE: &str = "index.json";

/// Where post documents come from.
pub trait PostSource: Send + Sync {
    /// File names of all available posts.
    fn index(&self) -> BoxFuture<'_, Result<Vec<String>>>;

    /// Raw text of one post document.
    fn document<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Fetches `/blog/index.json` and `/blog/{filename}` from a remote origin.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}/blog/{}", self.base_url, name)
    }

    async fn get(&self, name: &str) -> Result<reqwest::Response> {
        let url = self.url(name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;
        response
            .error_for_status()
            .with_context(|| format!("Bad response for {}", url))
    }
}

impl PostSource for HttpSource {
    fn index(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        async move {
            let files = self
                .get(INDEX_FILE)
                .await?
                .json::<Vec<String>>()
                .await
                .context("Failed to parse post index")?;
            Ok(files)
        }
        .boxed()
    }

    fn document<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            let text = self.get(filename).await?.text().await?;
            Ok(text)
        }
        .boxed()
    }
}

/// Reads posts from a local directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Markdown files directly inside the directory, sorted by name.
    pub fn scan(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            bail!("Posts directory {} does not exist", self.dir.display());
        }
        let mut files: Vec<String> = WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "md"))
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| name != "README.md")
            .collect();
        files.sort();
        Ok(files)
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty() || filename == ".." || filename.contains(['/', '\\']) {
            return Err(anyhow!("Refusing to read {:?}", filename));
        }
        Ok(self.dir.join(filename))
    }
}

impl PostSource for DirSource {
    fn index(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        async move {
            let index_path = self.dir.join(INDEX_FILE);
            if index_path.exists() {
                let content = tokio::fs::read_to_string(&index_path)
                    .await
                    .with_context(|| format!("Failed to read {}", index_path.display()))?;
                let files = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", index_path.display()))?;
                return Ok(files);
            }
            let source = self.clone();
            tokio::task::spawn_blocking(move || source.scan())
                .await
                .context("Directory scan task failed")?
        }
        .boxed()
    }

    fn document<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            let path = self.resolve(filename)?;
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(text)
        }
        .boxed()
    }
}

/// What happens to a batch when one document can't be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed document discards the whole batch.
    #[default]
    FailAll,
    /// Failed documents are logged and left out.
    IsolatePerPost,
}

/// Loads, parses and memoizes the post set.
///
/// The first successful load is kept for the lifetime of the repository; there
/// is no expiry. Failed loads are never cached. Concurrent first calls are not
/// coalesced, each performs its own fetch and the last one to finish wins the
/// cache slot.
pub struct PostRepository {
    source: Arc<dyn PostSource>,
    policy: FailurePolicy,
    cache: RwLock<Option<Arc<Vec<Post>>>>,
}

impl PostRepository {
    pub fn new(source: Arc<dyn PostSource>, policy: FailurePolicy) -> Self {
        Self {
            source,
            policy,
            cache: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &Arc<dyn PostSource> {
        &self.source
    }

    pub async fn is_cached(&self) -> bool {
        self.cache.read().await.is_some()
    }

    /// All posts, newest first. Empty when the source is unavailable.
    pub async fn list_posts(&self) -> Arc<Vec<Post>> {
        if let Some(posts) = self.cache.read().await.as_ref() {
            return posts.clone();
        }

        match self.load().await {
            Ok(posts) => {
                info!("Loaded {} posts", posts.len());
                let posts = Arc::new(posts);
                *self.cache.write().await = Some(posts.clone());
                posts
            }
            Err(e) => {
                warn!("Error loading blog posts: {:#}", e);
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn get_post(&self, slug: &str) -> Option<Post> {
        self.list_posts()
            .await
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
    }

    async fn load(&self) -> Result<Vec<Post>> {
        let files = self.source.index().await.context("No blog index found")?;
        debug!("Post index lists {} files", files.len());

        let fetches = files.iter().map(|filename| {
            self.source
                .document(filename)
                .map(move |doc| doc.map(|text| Post::from_document(filename, &text)))
        });

        let posts = match self.policy {
            FailurePolicy::FailAll => future::try_join_all(fetches).await?,
            FailurePolicy::IsolatePerPost => future::join_all(fetches)
                .await
                .into_iter()
                .zip(&files)
                .filter_map(|(result, filename)| match result {
                    Ok(post) => Some(post),
                    Err(e) => {
                        warn!("Skipping {}: {:#}", filename, e);
                        None
                    }
                })
                .collect(),
        };

        let mut seen = HashSet::new();
        let mut posts: Vec<Post> = posts
            .into_iter()
            .filter(|post| {
                let fresh = seen.insert(post.slug.clone());
                if !fresh {
                    warn!("Duplicate slug {:?}, keeping the first", post.slug);
                }
                fresh
            })
            .collect();

        post::sort_by_date(&mut posts);
        Ok(posts)
    }
}
