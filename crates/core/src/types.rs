use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Default number of posts per CMS page
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Default CMS document type holding blog posts
pub const DEFAULT_DOCUMENT_TYPE: &str = "posts";

/// Default revalidation window for the generated home page (one hour)
pub const DEFAULT_REVALIDATE_SECS: u64 = 60 * 60;

/// Complete blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    pub site: SiteConfig,
    pub cms: CmsConfig,
    pub render: RenderConfig,
}

/// Site presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub lang: String,
}

/// Headless CMS connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Repository API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub document_type: String,
    pub page_size: u32,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

/// Static rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub revalidate_secs: u64,
}

impl RenderConfig {
    pub fn revalidate(&self) -> Duration {
        Duration::from_secs(self.revalidate_secs)
    }
}

/// Fields of a post shown on the listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A blog post as listed on the home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    pub data: PostData,
}

impl Post {
    /// Route of the post detail page, if the post has a usable uid.
    ///
    /// The uid is percent-encoded as a single path segment.
    pub fn href(&self) -> Option<String> {
        self.uid
            .as_deref()
            .filter(|uid| !uid.trim().is_empty())
            .map(|uid| format!("/post/{}", urlencoding::encode(uid)))
    }
}

/// One page of posts plus the cursor to the next page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPagination {
    #[serde(default, deserialize_with = "deserialize_cursor")]
    pub next_page: Option<String>,
    pub results: Vec<Post>,
}

impl PostPagination {
    pub fn is_last_page(&self) -> bool {
        self.next_page.is_none()
    }
}

/// Input of the home page render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeProps {
    pub posts_pagination: PostPagination,
    pub preview: bool,
}

/// Props produced at build time together with their revalidation window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticProps<P> {
    pub props: P,
    #[serde(serialize_with = "serialize_secs")]
    pub revalidate: Duration,
}

/// An empty cursor string means there is no next page
fn deserialize_cursor<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let cursor: Option<String> = Option::deserialize(deserializer)?;
    Ok(cursor.filter(|c| !c.trim().is_empty()))
}

fn serialize_secs<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_secs())
}
