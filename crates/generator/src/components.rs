// Home page rendered with Leptos SSR (no hydration; load-more.js drives the button)

use leptos::prelude::*;
use spacetraveling_core::{Post, SiteConfig};

use crate::pagination::PostList;

/// Route of the endpoint that leaves preview mode
pub const EXIT_PREVIEW_ROUTE: &str = "/api/exit-preview";

/// Path of the load-more script relative to the site root
pub const LOAD_MORE_SCRIPT: &str = "load-more.js";

/// Escape text for HTML built outside Leptos (document shell, error pages)
pub fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Options that change how the page is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// CMS preview mode: shows the exit-preview link
    pub preview: bool,
    /// Local preview server: injects the SSE reload script
    pub live_reload: bool,
}

#[component]
fn Header(title: String) -> impl IntoView {
    view! {
        <header class="header">
            <a href="/" class="logo">{title}</a>
        </header>
    }
}

#[component]
fn PostCard(post: Post) -> impl IntoView {
    let href = post.href().unwrap_or_else(|| "/".to_string());
    let published = post.first_publication_date.clone();
    let Post { data, .. } = post;

    view! {
        <a href=href class="post">
            <strong>{data.title}</strong>
            <p>{data.subtitle}</p>
            <div class="info">
                <time>{published}</time>
                <span>{data.author}</span>
            </div>
        </a>
    }
}

#[component]
fn Home(title: String, posts: Vec<Post>, next_page: Option<String>, preview: bool) -> impl IntoView {
    view! {
        <main class="container">
            <div class="posts">
                <Header title=title/>
                <div id="post-list">
                    {posts.into_iter().map(|post| view! { <PostCard post=post/> }).collect_view()}
                </div>
                {next_page.map(|cursor| view! {
                    <button type="button" id="load-more" class="load-more" data-next-page=cursor>
                        "Carregar mais posts"
                    </button>
                    <p id="load-more-status" class="load-more-status" role="status"></p>
                })}
                {preview.then(|| view! {
                    <aside>
                        <a href=EXIT_PREVIEW_ROUTE class="preview">"Sair do modo preview"</a>
                    </aside>
                })}
            </div>
        </main>
    }
}

/// Render the body markup of the home page for the current list state
pub fn render_home_body(site: &SiteConfig, list: &PostList, preview: bool) -> String {
    let title = site.title.clone();
    let posts = list.posts().to_vec();
    let next_page = list.cursor().next_page().map(str::to_string);

    view! { <Home title=title posts=posts next_page=next_page preview=preview/> }.to_html()
}

/// Render the complete home page document
pub fn render_home(site: &SiteConfig, list: &PostList, options: RenderOptions) -> String {
    let body = render_home_body(site, list, options.preview);

    // Hot reload script only for the local preview server
    let reload_script = if options.live_reload {
        r#"<script>
        const eventSource = new EventSource('/_reload');
        eventSource.onmessage = () => location.reload();
        eventSource.onerror = () => eventSource.close();
    </script>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Home | {title}</title>
    <style>{style}</style>
</head>
<body>
    {body}
    <script src="/{script}" defer></script>
    {reload_script}
</body>
</html>"#,
        lang = html_escape(&site.lang),
        title = html_escape(&site.title),
        style = STYLE,
        body = body,
        script = LOAD_MORE_SCRIPT,
        reload_script = reload_script,
    )
}

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: Inter, -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #1a1d23;
            color: #d7d7d7;
        }
        .container { max-width: 1120px; margin: 0 auto; padding: 0 2rem; }
        .posts { max-width: 720px; margin: 0 auto; padding: 5rem 0; }
        .header { margin-bottom: 5rem; }
        .logo { color: #f8f8f8; font-size: 1.75rem; font-weight: 700; text-decoration: none; }
        .post { display: block; margin-bottom: 3rem; color: inherit; text-decoration: none; }
        .post strong { display: block; font-size: 1.75rem; color: #f8f8f8; }
        .post p { margin: 0.5rem 0 1.5rem; font-size: 1.125rem; }
        .post:hover strong { color: #ff57b2; }
        .info { display: flex; gap: 1.5rem; font-size: 0.875rem; color: #bbbbbb; }
        .info time:empty { display: none; }
        .load-more {
            background: none; border: 0; cursor: pointer;
            color: #ff57b2; font-size: 1.125rem; font-weight: 600;
        }
        .load-more:disabled { opacity: 0.6; cursor: wait; }
        .load-more-status { margin-top: 1rem; color: #ff8a80; font-size: 0.875rem; }
        .preview {
            display: block; margin-top: 4rem; padding: 1rem;
            background: #153c4b; border-radius: 8px;
            color: #f8f8f8; text-align: center; text-decoration: none;
        }
"#;
