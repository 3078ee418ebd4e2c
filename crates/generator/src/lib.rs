// Static site generation with Leptos SSR

pub mod components;
pub mod loader;
pub mod pagination;
pub mod revalidate;
pub mod script;

use anyhow::{Context, Result};
use spacetraveling_core::{BlogConfig, HomeProps, StaticProps};

use components::{LOAD_MORE_SCRIPT, RenderOptions, render_home};
use pagination::PostList;
use script::generate_load_more_js;

pub use loader::{PreviewContext, load_home};

pub struct GeneratedSite {
    pub pages: Vec<(String, String)>,   // (path, html)
    pub assets: Vec<(String, Vec<u8>)>, // (path, data)
}

/// Render the home page and its supporting files from build-time props
pub fn generate_site(config: &BlogConfig, props: &StaticProps<HomeProps>) -> Result<GeneratedSite> {
    let list = PostList::from_pagination(props.props.posts_pagination.clone());
    let options = RenderOptions {
        preview: props.props.preview,
        live_reload: false,
    };

    let html = render_home(&config.site, &list, options);
    let props_json =
        serde_json::to_vec_pretty(props).context("Failed to serialize home page props")?;

    Ok(GeneratedSite {
        pages: vec![("index.html".to_string(), html)],
        assets: vec![
            (
                LOAD_MORE_SCRIPT.to_string(),
                generate_load_more_js().as_bytes().to_vec(),
            ),
            ("props.json".to_string(), props_json),
            (
                "_headers".to_string(),
                cache_headers(props.revalidate.as_secs()).into_bytes(),
            ),
        ],
    })
}

/// Cloudflare Pages style `_headers` rules for the revalidation window
pub fn cache_headers(revalidate_secs: u64) -> String {
    let value = format!(
        "public, max-age=0, s-maxage={}, stale-while-revalidate",
        revalidate_secs
    );
    format!(
        "/\n  Cache-Control: {value}\n/index.html\n  Cache-Control: {value}\n",
        value = value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::config;
    use crate::pagination::tests::page;
    use std::time::Duration;

    fn props(preview: bool) -> StaticProps<HomeProps> {
        StaticProps {
            props: HomeProps {
                posts_pagination: page(
                    &["p1", "p2", "p3", "p4", "p5"],
                    Some("https://cms/posts?page=2"),
                ),
                preview,
            },
            revalidate: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_generate_site_outputs() {
        let site = generate_site(&config(), &props(false)).unwrap();

        assert_eq!(site.pages.len(), 1);
        let (path, html) = &site.pages[0];
        assert_eq!(path, "index.html");
        assert_eq!(html.matches("class=\"post\"").count(), 5);
        assert!(html.contains("Carregar mais posts"));
        assert!(!html.contains("Sair do modo preview"));

        let asset_paths: Vec<_> = site.assets.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(asset_paths, vec!["load-more.js", "props.json", "_headers"]);
    }

    #[test]
    fn test_generate_site_preview_mode() {
        let site = generate_site(&config(), &props(true)).unwrap();
        assert!(site.pages[0].1.contains("Sair do modo preview"));
    }

    #[test]
    fn test_props_json_round_trips_cursor() {
        let site = generate_site(&config(), &props(false)).unwrap();
        let (_, json) = site
            .assets
            .iter()
            .find(|(p, _)| p == "props.json")
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(json).unwrap();
        assert_eq!(value["revalidate"], 3600);
        assert_eq!(
            value["props"]["posts_pagination"]["next_page"],
            "https://cms/posts?page=2"
        );
        assert_eq!(
            value["props"]["posts_pagination"]["results"][0]["first_publication_date"],
            "2021-03-25T19:27:35+0000"
        );
    }

    #[test]
    fn test_cache_headers() {
        let headers = cache_headers(3600);
        assert!(headers.starts_with("/\n"));
        assert!(headers.contains(
            "  Cache-Control: public, max-age=0, s-maxage=3600, stale-while-revalidate"
        ));
        assert!(headers.contains("/index.html\n"));
    }
}
