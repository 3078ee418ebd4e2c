//! Headless CMS access for the blog.
//!
//! [`CmsClient`] is the seam the loader and the pagination code depend on;
//! [`prismic::PrismicClient`] talks to a Prismic-compatible REST API.

pub mod error;
pub mod prismic;

use async_trait::async_trait;
use spacetraveling_core::PostPagination;

pub use error::{Error, Result};
pub use prismic::PrismicClient;

/// Query for one page of documents of a given type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub document_type: String,
    pub page_size: u32,
    /// Content version to read; `None` means the published (master) version
    pub reference: Option<String>,
}

impl Query {
    pub fn new(document_type: impl Into<String>, page_size: u32) -> Self {
        Self {
            document_type: document_type.into(),
            page_size,
            reference: None,
        }
    }

    pub fn at_ref(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }
}

#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Fetch the first page of documents matching `query`
    async fn query(&self, query: &Query) -> Result<PostPagination>;

    /// Follow a `next_page` cursor returned by a previous page
    async fn fetch_page(&self, url: &str) -> Result<PostPagination>;
}
