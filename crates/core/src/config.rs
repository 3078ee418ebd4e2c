use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the configuration file at the root of a blog directory
pub const BLOG_TOML: &str = "blog.toml";

/// Environment variable that supplies the CMS access token
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

const MAX_PAGE_SIZE: u32 = 100;

/// Raw TOML configuration structure
/// This matches the blog.toml file structure exactly
#[derive(Debug, Deserialize)]
struct RawConfig {
    site: RawSite,
    cms: RawCms,
    #[serde(default)]
    render: Option<RawRender>,
}

#[derive(Debug, Deserialize)]
struct RawSite {
    title: String,
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCms {
    endpoint: String,
    document_type: Option<String>,
    page_size: Option<u32>,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRender {
    revalidate_secs: Option<u64>,
}

/// Parse blog.toml from a file path and apply environment overrides
pub fn parse_blog_toml<P: AsRef<Path>>(path: P) -> Result<BlogConfig> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_blog_toml_str(&content)?;

    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV)
        && !token.trim().is_empty()
    {
        config.cms.access_token = Some(token);
    }

    Ok(config)
}

/// Parse blog.toml from a string (useful for testing)
pub fn parse_blog_toml_str(content: &str) -> Result<BlogConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.site.title.trim().is_empty() {
        return Err(Error::ConfigParse("site.title must not be empty".to_string()));
    }

    let endpoint = validate_endpoint(&raw.cms.endpoint)?;

    let page_size = raw.cms.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::ConfigParse(format!(
            "cms.page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, page_size
        )));
    }

    let document_type = raw
        .cms
        .document_type
        .unwrap_or_else(|| DEFAULT_DOCUMENT_TYPE.to_string());
    if document_type.trim().is_empty() {
        return Err(Error::ConfigParse(
            "cms.document_type must not be empty".to_string(),
        ));
    }

    let revalidate_secs = raw
        .render
        .and_then(|r| r.revalidate_secs)
        .unwrap_or(DEFAULT_REVALIDATE_SECS);
    if revalidate_secs == 0 {
        return Err(Error::ConfigParse(
            "render.revalidate_secs must be greater than zero".to_string(),
        ));
    }

    Ok(BlogConfig {
        site: SiteConfig {
            title: raw.site.title,
            lang: raw.site.lang.unwrap_or_else(|| "pt-BR".to_string()),
        },
        cms: CmsConfig {
            endpoint,
            document_type,
            page_size,
            access_token: raw.cms.access_token.filter(|t| !t.trim().is_empty()),
        },
        render: RenderConfig { revalidate_secs },
    })
}

/// Ensure the CMS endpoint is an http(s) URL and strip any trailing slash
fn validate_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();

    if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        return Err(Error::ConfigParse(format!(
            "cms.endpoint must be an http(s) URL: '{}'",
            endpoint
        )));
    }

    let trimmed = endpoint.trim_end_matches('/');
    let host = trimmed.split_once("://").map(|(_, rest)| rest).unwrap_or("");
    if host.is_empty() {
        return Err(Error::ConfigParse(format!(
            "cms.endpoint is missing a host: '{}'",
            endpoint
        )));
    }

    Ok(trimmed.to_string())
}
