//! Markdown posts in, portfolio site out: frontmatter parsing, a memoized post
//! repository, rendering with highlighted code, related posts, tables of
//! contents and the page router, plus a static generator and an HTTP server.

pub mod config;
pub mod feeds;
pub mod frontmatter;
pub mod generator;
pub mod post;
pub mod related;
pub mod render;
pub mod repository;
pub mod router;
pub mod server;
pub mod templates;
pub mod toc;
