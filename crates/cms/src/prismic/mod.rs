// Prismic REST API v2 client

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use spacetraveling_core::{CmsConfig, Post, PostData, PostPagination};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::{CmsClient, Query};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Prismic API client
#[derive(Debug, Clone)]
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

/// Repository info returned by the API root
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Search response page
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    next_page: Option<String>,
    results: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    first_publication_date: Option<String>,
    #[serde(default)]
    data: Value,
}

impl Document {
    /// Project a CMS document onto the minimal listing shape
    fn into_post(self) -> Post {
        Post {
            uid: self.uid,
            first_publication_date: self.first_publication_date,
            data: PostData {
                title: text_field(&self.data, "title"),
                subtitle: text_field(&self.data, "subtitle"),
                author: text_field(&self.data, "author"),
            },
        }
    }
}

impl From<SearchResponse> for PostPagination {
    fn from(response: SearchResponse) -> Self {
        PostPagination {
            next_page: response.next_page.filter(|c| !c.trim().is_empty()),
            results: response
                .results
                .into_iter()
                .map(Document::into_post)
                .collect(),
        }
    }
}

/// Read a text field that is either a plain string or a rich-text block list
fn text_field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Predicate selecting documents of one type
fn type_predicate(document_type: &str) -> String {
    format!("[[at(document.type, \"{}\")]]", document_type.replace('"', "\\\""))
}

impl PrismicClient {
    /// Create a new client for a repository API endpoint
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
                .map_err(|e| Error::Config(format!("Invalid User-Agent header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn from_config(config: &CmsConfig) -> Result<Self> {
        Self::new(&config.endpoint, config.access_token.clone())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolve the ref of the published content version
    pub async fn master_ref(&self) -> Result<String> {
        debug!(endpoint = %self.endpoint, "Resolving master ref.");

        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }

        let info: ApiInfo = Self::read_json(request.send().await?).await?;

        info.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or_else(|| Error::NoMasterRef(self.endpoint.clone()))
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "CMS request failed.");
            return Err(Error::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CmsClient for PrismicClient {
    async fn query(&self, query: &Query) -> Result<PostPagination> {
        let reference = match &query.reference {
            Some(reference) => reference.clone(),
            None => self.master_ref().await?,
        };

        let url = format!("{}/documents/search", self.endpoint);
        let page_size = query.page_size.to_string();
        let predicate = type_predicate(&query.document_type);

        debug!(
            document_type = %query.document_type,
            page_size = query.page_size,
            preview = query.reference.is_some(),
            "Querying CMS documents."
        );

        let mut params = vec![
            ("ref", reference.as_str()),
            ("q", predicate.as_str()),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.as_str()));
        }

        let response = self.client.get(&url).query(&params).send().await?;
        let page: SearchResponse = Self::read_json(response).await?;

        Ok(page.into())
    }

    async fn fetch_page(&self, url: &str) -> Result<PostPagination> {
        debug!(%url, "Fetching next page.");

        let response = self.client.get(url).send().await?;
        let page: SearchResponse = Self::read_json(response).await?;

        Ok(page.into())
    }
}
