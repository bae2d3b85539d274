use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use folio::config::Config;
use folio::generator::{Site, SiteGenerator};
use folio::repository::{DirSource, HttpSource, PostSource, INDEX_FILE};
use folio::server;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use warp::Filter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "A portfolio and blog engine • posts • related reading")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the static site
    Generate {
        /// Path to config file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,
    },
    /// Serve the site, rendering pages on request
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "3007")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Path to config file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Origin serving /blog/index.json, overrides the configured source
        #[arg(short, long)]
        source: Option<String>,
    },
    /// Create a new blog post
    New {
        /// Title of the new post
        #[arg(short, long)]
        title: String,

        /// Excerpt/description of the post
        #[arg(short, long)]
        excerpt: Option<String>,

        /// Category of the post
        #[arg(long)]
        category: Option<String>,

        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Path to config file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Posts directory
        #[arg(short, long)]
        posts_dir: Option<PathBuf>,
    },
    /// Rewrite the post index from the markdown files on disk
    Index {
        /// Path to config file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Posts directory
        #[arg(short, long)]
        posts_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config } => {
            let config = Config::load(&config)
                .context("Failed to load configuration")?;

            let generator = SiteGenerator::new(config);

            if let Err(e) = generator.generate().await {
                eprintln!("{}", format!("Error: {:#}", e).red());
                process::exit(1);
            }
        }
        Commands::Serve { port, host, config, source } => {
            serve_site(host, port, config, source).await?;
        }
        Commands::New { title, excerpt, category, tags, config, posts_dir } => {
            create_new_post(title, excerpt, category, tags, config, posts_dir)?;
        }
        Commands::Index { config, posts_dir } => {
            write_index(config, posts_dir)?;
        }
    }

    Ok(())
}

async fn serve_site(host: String, port: u16, config_path: PathBuf, source_url: Option<String>) -> Result<()> {
    let mut config = Config::load(&config_path)
        .context("Failed to load configuration")?;
    if source_url.is_some() {
        config.source_url = source_url;
    }

    let source: Arc<dyn PostSource> = match &config.source_url {
        Some(url) => {
            println!("{}", format!("Posts: {}/blog", url.trim_end_matches('/')).blue());
            Arc::new(HttpSource::new(url))
        }
        None => {
            println!("{}", format!("Posts: {}", config.posts_dir).blue());
            Arc::new(DirSource::new(&config.posts_dir))
        }
    };

    let addr: std::net::IpAddr = host.parse()
        .context("Invalid host address")?;

    println!("{}", "Starting server...".green().bold());
    println!("{}", format!("URL: http://{}:{}", host, port).blue());
    println!("{}", "Press Ctrl+C to stop".yellow());

    let site = Site::new(config, source);
    warp::serve(server::routes(site).with(warp::log("folio")))
        .run((addr, port))
        .await;

    Ok(())
}

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Frontmatter for a new post. Values are single line and quoted.
fn new_post_document(
    title: &str,
    date: &str,
    excerpt: Option<&str>,
    category: Option<&str>,
    tags: &[String],
) -> String {
    let line = |s: &str| s.replace(['\r', '\n'], " ");
    let mut frontmatter = format!("title: \"{}\"\ndate: \"{}\"\n", line(title), date);
    if let Some(excerpt) = excerpt {
        frontmatter.push_str(&format!("excerpt: \"{}\"\n", line(excerpt)));
    }
    if let Some(category) = category {
        frontmatter.push_str(&format!("category: \"{}\"\n", line(category)));
    }
    if !tags.is_empty() {
        frontmatter.push_str(&format!("tags: [{}]\n", tags.join(", ")));
    }

    format!(
        r#"---
{}---

Write your post content here...

"#,
        frontmatter
    )
}

fn create_new_post(
    title: String,
    excerpt: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    config_path: PathBuf,
    posts_dir: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load(&config_path)
        .context("Failed to load configuration")?;

    let posts_directory = posts_dir.unwrap_or_else(|| PathBuf::from(&config.posts_dir));

    std::fs::create_dir_all(&posts_directory)
        .context("Failed to create posts directory")?;

    let slug = slugify(&title);
    if slug.is_empty() {
        eprintln!("{}", "Error: Title must contain at least one letter or digit.".red());
        process::exit(1);
    }

    let filename = format!("{}.md", slug);
    let file_path = posts_directory.join(&filename);

    if file_path.exists() {
        eprintln!("{}", format!("Error: File '{}' already exists.", file_path.display()).red());
        process::exit(1);
    }

    let current_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let tags: Vec<String> = tags
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let content = new_post_document(
        &title,
        &current_date,
        excerpt.as_deref(),
        category.as_deref(),
        &tags,
    );

    std::fs::write(&file_path, content)
        .context("Failed to write new post file")?;

    // Keep an existing index in step with the new file.
    let source = DirSource::new(&posts_directory);
    if source.dir().join(INDEX_FILE).exists() {
        write_index_file(&source)?;
    }

    println!("{}", "New post created successfully!".green().bold());
    println!();
    println!("{}: {}", "Title".white().bold(), title.cyan());
    println!("{}: {}", "Author".white().bold(), config.author.cyan());
    println!("{}: {}", "Date".white().bold(), current_date.cyan());
    if let Some(exc) = excerpt {
        println!("{}: {}", "Excerpt".white().bold(), exc.cyan());
    }
    if let Some(category) = category {
        println!("{}: {}", "Category".white().bold(), category.cyan());
    }
    if !tags.is_empty() {
        println!("{}: {}", "Tags".white().bold(), tags.join(", ").cyan());
    }
    println!("{}: {}", "File".white().bold(), file_path.display().to_string().cyan());
    println!();
    println!("Next steps:");
    println!("  1. Edit the file: {}", file_path.display().to_string().yellow());
    println!("  2. Generate site: {}", "folio generate".yellow());
    println!("  3. Serve locally: {}", "folio serve".yellow());

    Ok(())
}

fn write_index(config_path: PathBuf, posts_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::load(&config_path)
        .context("Failed to load configuration")?;
    let posts_directory = posts_dir.unwrap_or_else(|| PathBuf::from(&config.posts_dir));

    let source = DirSource::new(&posts_directory);
    let count = write_index_file(&source)?;

    println!(
        "{}",
        format!(
            "Indexed {} posts in {}",
            count,
            source.dir().join(INDEX_FILE).display()
        )
        .green()
    );
    Ok(())
}

fn write_index_file(source: &DirSource) -> Result<usize> {
    let names = source.scan()?;
    let json = serde_json::to_string_pretty(&names)
        .context("Failed to serialize post index")?;
    std::fs::write(source.dir().join(INDEX_FILE), json)
        .context("Failed to write post index")?;
    Ok(names.len())
}
