//! Home page listing state and the "load more" transition.
//!
//! A [`PostList`] is created from the build-time page and only ever grows by
//! appending whole pages. The cursor moves from [`Cursor::HasMore`] to either
//! another `HasMore` or [`Cursor::Exhausted`] on a successful load, and never
//! leaves `Exhausted`. A failed load leaves the list and cursor untouched.
//!
//! Loads are split into [`PostList::begin_load`] and
//! [`PostList::complete_load`] so the list never has to be borrowed across the
//! network call. Only one load can be in flight; the [`LoadRequest`] token ties
//! a completion to the request that started it.

use spacetraveling_cms::CmsClient;
use spacetraveling_core::{Post, PostPagination, format_date};
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Pagination cursor state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    HasMore(String),
    Exhausted,
}

impl Cursor {
    pub fn from_next_page(next_page: Option<String>) -> Self {
        match next_page {
            Some(url) if !url.trim().is_empty() => Cursor::HasMore(url),
            _ => Cursor::Exhausted,
        }
    }

    pub fn next_page(&self) -> Option<&str> {
        match self {
            Cursor::HasMore(url) => Some(url),
            Cursor::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Cursor::Exhausted)
    }
}

/// Ticket for a load that has been started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    token: u64,
    url: String,
}

impl LoadRequest {
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Why a load could not be started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRefused {
    Exhausted,
    InFlight,
}

impl fmt::Display for LoadRefused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadRefused::Exhausted => write!(f, "no more posts to load"),
            LoadRefused::InFlight => write!(f, "a load is already in progress"),
        }
    }
}

/// Result of a load-more attempt, surfaced to the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was appended; `exhausted` is set when it was the last one
    Appended { count: usize, exhausted: bool },
    /// The fetch failed; list and cursor are unchanged and a retry is possible
    Failed { reason: String },
    /// The load was not started
    Refused(LoadRefused),
    /// The completion did not belong to the load in flight and was dropped
    Stale,
}

/// The posts currently displayed plus the cursor to the next page
#[derive(Debug, Clone)]
pub struct PostList {
    posts: Vec<Post>,
    cursor: Cursor,
    in_flight: Option<u64>,
    next_token: u64,
    seen_uids: HashSet<String>,
}

impl PostList {
    /// Build the initial view state from a CMS page, formatting its dates
    pub fn from_pagination(page: PostPagination) -> Self {
        let mut list = Self {
            posts: Vec::with_capacity(page.results.len()),
            cursor: Cursor::from_next_page(page.next_page),
            in_flight: None,
            next_token: 0,
            seen_uids: HashSet::new(),
        };
        list.append(page.results);
        list
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the load-more control should be rendered at all
    pub fn has_more(&self) -> bool {
        !self.cursor.is_exhausted()
    }

    /// Start a load of the page addressed by the current cursor
    pub fn begin_load(&mut self) -> Result<LoadRequest, LoadRefused> {
        let url = match &self.cursor {
            Cursor::Exhausted => return Err(LoadRefused::Exhausted),
            Cursor::HasMore(url) => url.clone(),
        };

        if self.in_flight.is_some() {
            return Err(LoadRefused::InFlight);
        }

        self.next_token += 1;
        self.in_flight = Some(self.next_token);

        debug!(token = self.next_token, %url, "Load more started.");

        Ok(LoadRequest {
            token: self.next_token,
            url,
        })
    }

    /// Apply the result of a load started with [`PostList::begin_load`]
    pub fn complete_load<E: fmt::Display>(
        &mut self,
        request: LoadRequest,
        result: Result<PostPagination, E>,
    ) -> LoadOutcome {
        if self.in_flight != Some(request.token) {
            warn!(token = request.token, "Dropping completion of a stale load.");
            return LoadOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let count = page.results.len();
                self.cursor = Cursor::from_next_page(page.next_page);
                self.append(page.results);

                LoadOutcome::Appended {
                    count,
                    exhausted: self.cursor.is_exhausted(),
                }
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, "Load more failed.");
                LoadOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn append(&mut self, posts: Vec<Post>) {
        for post in posts {
            if let Some(uid) = &post.uid
                && !self.seen_uids.insert(uid.clone())
            {
                warn!(%uid, "Post listed more than once.");
            }
            self.posts.push(with_display_date(post));
        }
    }
}

/// Replace the ISO publication date with its display form
fn with_display_date(mut post: Post) -> Post {
    if let Some(iso) = post.first_publication_date.take() {
        post.first_publication_date = match format_date(&iso, false) {
            Ok(formatted) => Some(formatted),
            Err(e) => {
                warn!(uid = ?post.uid, error = %e, "Keeping unformatted publication date.");
                Some(iso)
            }
        };
    }
    post
}

/// Load the next page into a shared list.
///
/// The lock is only held to start and to finish the load, never across the
/// fetch, so a second caller during the fetch gets
/// [`LoadOutcome::Refused`] with [`LoadRefused::InFlight`].
pub async fn load_more<C>(list: &Mutex<PostList>, cms: &C) -> LoadOutcome
where
    C: CmsClient + ?Sized,
{
    let request = {
        let mut guard = match list.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.begin_load() {
            Ok(request) => request,
            Err(refused) => return LoadOutcome::Refused(refused),
        }
    };

    let result = cms.fetch_page(request.url()).await;

    let mut guard = match list.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.complete_load(request, result)
}
