use crate::repository::FailurePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub title: String,
    pub description: Option<String>,
    pub author: String,
    pub email: Option<String>,
    pub url: Option<String>,
    pub posts_dir: String,
    pub output_dir: String,
    /// Remote origin serving `/blog/index.json`; posts are read from `posts_dir` when unset.
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_related_limit")]
    pub related_limit: usize,
    pub theme: Theme,
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
    /// A syntect bundled theme used for code blocks.
    #[serde(default = "default_code_theme")]
    pub code_theme: String,
}

/// A static home page section; `body` is markdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "folio".to_string(),
            description: Some("Articles about compilers, Rust and software engineering".to_string()),
            author: "Author".to_string(),
            email: None,
            url: None,
            posts_dir: "blog".to_string(),
            output_dir: "dist".to_string(),
            source_url: None,
            failure_policy: FailurePolicy::default(),
            related_limit: default_related_limit(),
            theme: Theme::default(),
            sections: default_sections(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#64ffda".to_string(),
            background_color: "#0a192f".to_string(),
            text_color: "#ccd6f6".to_string(),
            accent_color: "#8892b0".to_string(),
            code_theme: default_code_theme(),
        }
    }
}

fn default_code_theme() -> String {
    "base16-ocean.dark".to_string()
}

fn default_related_limit() -> usize {
    crate::related::DEFAULT_LIMIT
}

fn default_sections() -> Vec<SectionConfig> {
    [
        ("hero", "Hi, I'm the author", "I build compilers, tools and the occasional website."),
        ("about", "About", "A short introduction goes here."),
        ("skills", "Skills", "- Rust\n- TypeScript\n- Compilers"),
        ("timeline", "Timeline", "Where I've been and what I've done."),
        ("projects", "Projects", "Things I've built."),
        ("contact", "Contact", "Say hello."),
    ]
    .into_iter()
    .map(|(id, title, body)| SectionConfig {
        id: id.to_string(),
        title: title.to_string(),
        body: body.to_string(),
    })
    .collect()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            let content = fs::read_to_string(path)
                .context("Failed to read config file")?;
            let config: Config = serde_json::from_str(&content)
                .context("Failed to parse config file")?;
            config
        } else {
            // Create default config
            let config = Config::default();
            let content = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config")?;
            fs::write(path, content)
                .context("Failed to write default config")?;
            config
        };

        if let Ok(source_url) = std::env::var("FOLIO_SOURCE_URL") {
            config.source_url = Some(source_url);
        }

        Ok(config)
    }

    /// Absolute site URL without a trailing slash.
    pub fn base_url(&self) -> String {
        self.url
            .as_deref()
            .unwrap_or("http://localhost:3007")
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.posts_dir, "blog");
        assert_eq!(config.related_limit, 3);
        assert_eq!(config.failure_policy, FailurePolicy::FailAll);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let json = r##"{
            "title": "Site", "description": null, "author": "Me", "email": null,
            "url": "https://example.dev/", "posts_dir": "posts", "output_dir": "out",
            "failure_policy": "isolate_per_post",
            "theme": {"primary_color": "#fff", "background_color": "#000",
                      "text_color": "#fff", "accent_color": "#888"}
        }"##;
        fs::write(&path, json).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::IsolatePerPost);
        assert_eq!(config.sections.len(), 6);
        assert_eq!(config.base_url(), "https://example.dev");
        assert_eq!(config.theme.code_theme, "base16-ocean.dark");
    }
}
