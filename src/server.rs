use crate::generator::{Page, Site};
use crate::templates;
use log::error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

/// Every route of the site, rendered on request from `site`.
pub fn routes(site: Site) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_site = warp::any().map(move || site.clone());

    let home = warp::path::end()
        .and(with_site.clone())
        .and_then(|site: Site| handle_page(site, "/".to_string()));

    let index = warp::path!("blog" / "index.json")
        .and(with_site.clone())
        .and_then(handle_index);

    let blog = warp::path!("blog" / String)
        .and(with_site.clone())
        .and_then(|name: String, site: Site| async move {
            if name.ends_with(".md") {
                handle_document(site, name).await
            } else {
                handle_page(site, format!("/blog/{}", name)).await
            }
        });

    let css = warp::path!("style.css")
        .and(with_site.clone())
        .map(|site: Site| {
            with_content_type(templates::generate_css(site.config()), "text/css; charset=utf-8")
        });

    let sitemap = warp::path!("sitemap.xml")
        .and(with_site.clone())
        .and_then(|site: Site| async move {
            Ok::<_, Rejection>(with_content_type(site.sitemap().await, "application/xml"))
        });

    let feed = warp::path!("feed.xml")
        .and(with_site.clone())
        .and_then(|site: Site| async move {
            Ok::<_, Rejection>(with_content_type(site.feed().await, "application/rss+xml"))
        });

    let fallback = warp::path::full()
        .and(with_site)
        .and_then(|path: warp::path::FullPath, site: Site| {
            handle_page(site, path.as_str().to_string())
        });

    warp::get().and(
        home.or(index)
            .unify()
            .or(blog)
            .unify()
            .or(css)
            .unify()
            .or(sitemap)
            .unify()
            .or(feed)
            .unify()
            .or(fallback)
            .unify(),
    )
}

fn with_content_type(body: String, content_type: &'static str) -> Response {
    warp::reply::with_header(body, "content-type", content_type).into_response()
}

fn page_response(page: Page) -> Response {
    let status = if page.not_found {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    warp::reply::with_status(warp::reply::html(page.html), status).into_response()
}

async fn handle_page(site: Site, url: String) -> Result<Response, Rejection> {
    Ok(page_response(site.render(&url).await))
}

async fn handle_index(site: Site) -> Result<Response, Rejection> {
    match site.repository().source().index().await {
        Ok(names) => Ok(warp::reply::json(&names).into_response()),
        Err(e) => {
            error!("Failed to read post index: {:#}", e);
            Ok(warp::reply::with_status("Internal Server Error", StatusCode::INTERNAL_SERVER_ERROR)
                .into_response())
        }
    }
}

async fn handle_document(site: Site, name: String) -> Result<Response, Rejection> {
    match site.repository().source().document(&name).await {
        Ok(document) => Ok(with_content_type(document, "text/markdown; charset=utf-8")),
        Err(e) => {
            error!("Failed to read {}: {:#}", name, e);
            Ok(warp::reply::with_status("Not Found", StatusCode::NOT_FOUND).into_response())
        }
    }
}
