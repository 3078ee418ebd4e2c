// Build-time data loading for the home page

use anyhow::{Context, Result};
use spacetraveling_cms::{CmsClient, Query};
use spacetraveling_core::{BlogConfig, HomeProps, PostPagination, StaticProps};
use tracing::info;

/// Preview context passed in by whoever triggers the render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewContext {
    pub enabled: bool,
    /// Content version to render instead of the published one
    pub reference: Option<String>,
}

impl PreviewContext {
    pub fn published() -> Self {
        Self::default()
    }

    pub fn with_ref(reference: impl Into<String>) -> Self {
        Self {
            enabled: true,
            reference: Some(reference.into()),
        }
    }
}

/// Load the props of the home page.
///
/// Queries the first page of posts (at the preview ref when one is given,
/// otherwise at the published version) and returns them with the configured
/// revalidation window. CMS failures are returned to the caller untouched.
pub async fn load_home<C>(
    cms: &C,
    config: &BlogConfig,
    preview: &PreviewContext,
) -> Result<StaticProps<HomeProps>>
where
    C: CmsClient + ?Sized,
{
    let query = Query::new(config.cms.document_type.clone(), config.cms.page_size)
        .at_ref(preview.reference.clone());

    let page = cms
        .query(&query)
        .await
        .with_context(|| format!("Failed to query '{}' documents", query.document_type))?;

    let posts_pagination = PostPagination {
        next_page: page.next_page,
        results: page.results,
    };

    info!(
        posts = posts_pagination.results.len(),
        has_more = posts_pagination.next_page.is_some(),
        preview = preview.enabled,
        "Loaded home page props."
    );

    Ok(StaticProps {
        props: HomeProps {
            posts_pagination,
            preview: preview.enabled,
        },
        revalidate: config.render.revalidate(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pagination::tests::{FakeCms, page};
    use spacetraveling_core::config::parse_blog_toml_str;

    pub(crate) fn config() -> BlogConfig {
        parse_blog_toml_str(
            r#"
[site]
title = "spacetraveling"

[cms]
endpoint = "https://spacetraveling.cdn.prismic.io/api/v2"
"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_home_queries_first_page_of_posts() {
        let cms = FakeCms {
            first_page: Some(page(
                &["p1", "p2", "p3", "p4", "p5"],
                Some("https://cms/posts?page=2"),
            )),
            ..FakeCms::default()
        };

        let props = load_home(&cms, &config(), &PreviewContext::published())
            .await
            .unwrap();

        assert_eq!(props.revalidate.as_secs(), 3600);
        assert!(!props.props.preview);
        assert_eq!(props.props.posts_pagination.results.len(), 5);
        assert_eq!(
            props.props.posts_pagination.next_page.as_deref(),
            Some("https://cms/posts?page=2")
        );

        let queries = cms.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], Query::new("posts", 5));
    }

    #[tokio::test]
    async fn test_load_home_keeps_raw_dates() {
        let cms = FakeCms {
            first_page: Some(page(&["p1"], None)),
            ..FakeCms::default()
        };

        let props = load_home(&cms, &config(), &PreviewContext::published())
            .await
            .unwrap();

        let post = &props.props.posts_pagination.results[0];
        assert_eq!(
            post.first_publication_date.as_deref(),
            Some("2021-03-25T19:27:35+0000")
        );
        assert_eq!(post.href().as_deref(), Some("/post/p1"));
        assert!(!post.data.title.is_empty());
        assert!(!post.data.subtitle.is_empty());
        assert!(!post.data.author.is_empty());
    }

    #[tokio::test]
    async fn test_load_home_uses_preview_ref() {
        let cms = FakeCms {
            first_page: Some(page(&["draft"], None)),
            ..FakeCms::default()
        };

        let props = load_home(&cms, &config(), &PreviewContext::with_ref("draft-ref"))
            .await
            .unwrap();

        assert!(props.props.preview);
        let queries = cms.queries.lock().unwrap();
        assert_eq!(queries[0].reference.as_deref(), Some("draft-ref"));
    }

    #[tokio::test]
    async fn test_load_home_propagates_cms_failure() {
        let cms = FakeCms::default();

        let err = load_home(&cms, &config(), &PreviewContext::published())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to query 'posts' documents"));
        assert!(format!("{err:#}").contains("503"));
    }
}
