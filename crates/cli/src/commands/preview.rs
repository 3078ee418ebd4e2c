use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{
        Html, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use serde::Deserialize;
use spacetraveling_cms::PrismicClient;
use spacetraveling_generator::components::{RenderOptions, html_escape, render_home};
use spacetraveling_generator::pagination::PostList;
use spacetraveling_generator::revalidate::PageCache;
use spacetraveling_generator::script::generate_load_more_js;
use spacetraveling_generator::{PreviewContext, load_home};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Cookie carrying the CMS ref while preview mode is active
const PREVIEW_COOKIE: &str = "spacetraveling.preview";

#[derive(Clone)]
struct AppState {
    blog_path: PathBuf,
    cache: Arc<PageCache>,
    reload_tx: broadcast::Sender<()>,
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: String,
}

/// Start preview server for local development.
///
/// This command:
/// - Validates and loads blog.toml
/// - Serves the home page, regenerated at most once per revalidation window
/// - Supports CMS preview mode through a cookie holding the draft ref
/// - Watches the blog directory and triggers hot reload
///
/// # Arguments
///
/// * `path` - Path to blog directory containing blog.toml
/// * `port` - Port to serve on (default: 8080)
pub async fn run(path: PathBuf, port: u16) -> Result<()> {
    println!("🛰  Starting preview server...");
    println!("   Blog: {}", path.display());

    let config = super::load_config(&path)?;

    println!("   ✓ Loaded: {}", config.site.title);
    println!("   ✓ CMS: {}", config.cms.endpoint);
    println!("   ✓ Revalidate: {}s", config.render.revalidate_secs);

    // Create broadcast channel for reload events
    let (reload_tx, _) = broadcast::channel::<()>(100);

    let state = AppState {
        blog_path: path.clone(),
        cache: Arc::new(PageCache::new(config.render.revalidate())),
        reload_tx: reload_tx.clone(),
    };

    let app = router(state.clone());

    // Start file watcher
    tokio::spawn(async move {
        if let Err(e) = watch_files(state).await {
            error!("File watcher error: {}", e);
        }
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\n🚀 Preview ready at: http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/load-more.js", get(script_handler))
        .route("/api/preview", get(enter_preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .route("/_reload", get(sse_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch for file changes, drop the cached page and trigger reload
async fn watch_files(state: AppState) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    watcher.watch(&state.blog_path, RecursiveMode::Recursive)?;

    while let Some(event) = rx.recv().await {
        match event.kind {
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                // Filter out temporary files and hidden files
                if event.paths.iter().any(|p| {
                    let filename = p.file_name().unwrap_or_default().to_string_lossy();
                    !filename.starts_with('.') && !filename.ends_with('~')
                }) {
                    println!("   📝 File changed, reloading...");
                    state.cache.invalidate().await;
                    let _ = state.reload_tx.send(());
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            if rx.recv().await.is_ok() {
                yield Ok(Event::default().data("reload"));
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Fetch props and render the home page
async fn render_page(blog_path: &Path, preview: &PreviewContext) -> Result<String> {
    let config = super::load_config(blog_path)?;
    let cms = PrismicClient::from_config(&config.cms).context("Failed to create CMS client")?;

    let props = load_home(&cms, &config, preview).await?;
    let list = PostList::from_pagination(props.props.posts_pagination);

    Ok(render_home(
        &config.site,
        &list,
        RenderOptions {
            preview: props.props.preview,
            live_reload: true,
        },
    ))
}

/// Main index page handler
async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result = match preview_ref_from_cookies(&headers) {
        // Drafts are never cached
        Some(reference) => {
            let preview = PreviewContext::with_ref(reference);
            render_page(&state.blog_path, &preview).await
        }
        None => {
            let blog_path = state.blog_path.clone();
            state
                .cache
                .get_or_render(move || async move {
                    render_page(&blog_path, &PreviewContext::published()).await
                })
                .await
        }
    };

    match result {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to render home page.");
            error_page(&e)
        }
    }
}

async fn script_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        generate_load_more_js(),
    )
}

/// Enter preview mode: remember the draft ref and go home
async fn enter_preview_handler(Query(params): Query<PreviewParams>) -> Response {
    let token = params.token.trim();
    if token.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing preview token").into_response();
    }

    info!("Entering preview mode.");
    (
        [(header::SET_COOKIE, preview_cookie(Some(token)))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Leave preview mode: clear the cookie and go home
async fn exit_preview_handler() -> Response {
    info!("Leaving preview mode.");
    (
        [(header::SET_COOKIE, preview_cookie(None))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Build the Set-Cookie value that sets (or clears, with `None`) the preview ref
fn preview_cookie(reference: Option<&str>) -> String {
    match reference {
        Some(reference) => format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            PREVIEW_COOKIE,
            urlencoding::encode(reference)
        ),
        None => format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", PREVIEW_COOKIE),
    }
}

/// Read the preview ref from the request cookies
fn preview_ref_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == PREVIEW_COOKIE)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// 502 page shown when the posts could not be fetched
fn error_page(error: &anyhow::Error) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Html(format!(
            r#"<!DOCTYPE html>
<html><head><title>Error</title></head><body>
<h1>Failed to load posts</h1>
<pre>{}</pre>
</body></html>"#,
            html_escape(&format!("{error:#}"))
        )),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, body::Body, http::Request};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn document(uid: &str) -> Value {
        json!({
            "uid": uid,
            "first_publication_date": "2021-03-25T19:27:35+0000",
            "data": { "title": format!("Post {uid}"), "subtitle": "Sub", "author": "Danilo Vieira" }
        })
    }

    /// Fake CMS counting search requests; `draft` ref yields a draft post
    async fn spawn_fake_cms(searches: Arc<AtomicUsize>) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .route(
                "/api/v2",
                get(|| async {
                    Json(json!({ "refs": [{ "ref": "master", "isMasterRef": true }] }))
                }),
            )
            .route(
                "/api/v2/documents/search",
                get(
                    move |Query(params): Query<std::collections::HashMap<String, String>>| {
                        let searches = searches.clone();
                        async move {
                            searches.fetch_add(1, Ordering::SeqCst);
                            let uid = if params.get("ref").map(String::as_str) == Some("draft") {
                                "rascunho"
                            } else {
                                "publicado"
                            };
                            Json(json!({ "next_page": null, "results": [document(uid)] }))
                        }
                    },
                ),
            );

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        addr
    }

    fn write_config(dir: &Path, endpoint: &str) {
        std::fs::write(
            dir.join("blog.toml"),
            format!("[site]\ntitle = \"spacetraveling\"\n\n[cms]\nendpoint = \"{endpoint}\"\n"),
        )
        .unwrap();
    }

    fn state(dir: &Path) -> AppState {
        let (reload_tx, _) = broadcast::channel(4);
        AppState {
            blog_path: dir.to_path_buf(),
            cache: Arc::new(PageCache::new(Duration::from_secs(3600))),
            reload_tx,
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_preview_cookie_round_trip() {
        let set = preview_cookie(Some("https://repo.prismic.io/previews/abc?x=1"));
        assert!(set.starts_with("spacetraveling.preview=https%3A%2F%2F"));

        let pair = set.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; {pair}").parse().unwrap(),
        );
        assert_eq!(
            preview_ref_from_cookies(&headers).as_deref(),
            Some("https://repo.prismic.io/previews/abc?x=1")
        );
    }

    #[test]
    fn test_preview_cookie_cleared() {
        assert!(preview_cookie(None).contains("Max-Age=0"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "spacetraveling.preview=".parse().unwrap());
        assert_eq!(preview_ref_from_cookies(&headers), None);
        assert_eq!(preview_ref_from_cookies(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_index_is_cached_within_window() {
        let searches = Arc::new(AtomicUsize::new(0));
        let addr = spawn_fake_cms(searches.clone()).await;
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), &format!("http://{addr}/api/v2"));
        let app = router(state(temp.path()));

        for _ in 0..2 {
            let response = app.clone().oneshot(get_request("/", None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let html = body_text(response).await;
            assert!(html.contains("/post/publicado"));
            assert!(!html.contains("Sair do modo preview"));
            assert!(!html.contains("Carregar mais posts"));
        }

        assert_eq!(searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_index_in_preview_mode_renders_draft() {
        let searches = Arc::new(AtomicUsize::new(0));
        let addr = spawn_fake_cms(searches.clone()).await;
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), &format!("http://{addr}/api/v2"));
        let app = router(state(temp.path()));

        let response = app
            .oneshot(get_request("/", Some("spacetraveling.preview=draft")))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("/post/rascunho"));
        assert!(html.contains("Sair do modo preview"));
    }

    #[tokio::test]
    async fn test_index_reports_cms_failure() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "http://127.0.0.1:9/api/v2");
        let app = router(state(temp.path()));

        let response = app.oneshot(get_request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("Failed to load posts"));
    }

    #[tokio::test]
    async fn test_error_page_escapes_message() {
        let response = error_page(&anyhow::anyhow!("<b>cms</b> & \"down\""));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let html = body_text(response).await;
        assert!(html.contains("&lt;b&gt;cms&lt;/b&gt; &amp; &quot;down&quot;"));
        assert!(!html.contains("<b>cms"));
    }

    #[tokio::test]
    async fn test_preview_routes_set_and_clear_cookie() {
        let temp = TempDir::new().unwrap();
        let app = router(state(temp.path()));

        let response = app
            .clone()
            .oneshot(get_request("/api/preview?token=draft", None))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("spacetraveling.preview=draft;"));

        let response = app
            .clone()
            .oneshot(get_request("/api/exit-preview", None))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));

        let response = app
            .oneshot(get_request("/api/preview?token=%20", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_script_route() {
        let temp = TempDir::new().unwrap();
        let app = router(state(temp.path()));

        let response = app.oneshot(get_request("/load-more.js", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("application/javascript")
        );
        assert!(body_text(response).await.contains("loadMore"));
    }
}
