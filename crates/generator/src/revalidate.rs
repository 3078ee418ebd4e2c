//! Time-based revalidation of a rendered page.
//!
//! The cached page is served until its revalidation window elapses. The first
//! request after that still gets the cached page and starts one background
//! regeneration. If regeneration fails the last good page keeps being served
//! and the next request after the failure tries again. Only the very first
//! render, or the first one after [`PageCache::invalidate`], is waited on.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct RenderedPage {
    html: String,
    generated_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    page: Option<RenderedPage>,
    /// Bumped on invalidation; a regeneration started before it is discarded
    generation: u64,
    regeneration: Option<JoinHandle<()>>,
}

/// A single rendered page with a revalidation window
#[derive(Debug, Clone)]
pub struct PageCache {
    revalidate: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            revalidate,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    pub fn revalidate(&self) -> Duration {
        self.revalidate
    }

    /// Return the cached page, regenerating it with `render` when missing or stale
    pub async fn get_or_render<F, Fut>(&self, render: F) -> Result<String>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.get_or_render_at(Instant::now(), render).await
    }

    async fn get_or_render_at<F, Fut>(&self, now: Instant, render: F) -> Result<String>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let mut state = self.state.lock().await;

        let Some(cached) = state.page.clone() else {
            // Nothing to serve yet; concurrent requests wait on this render
            debug!("Rendering page.");
            let html = render().await?;
            state.page = Some(RenderedPage {
                html: html.clone(),
                generated_at: now,
            });
            return Ok(html);
        };

        let expired = now.saturating_duration_since(cached.generated_at) >= self.revalidate;
        let idle = state
            .regeneration
            .as_ref()
            .is_none_or(|task| task.is_finished());

        if expired && idle {
            debug!(revalidate_secs = self.revalidate.as_secs(), "Regenerating page.");

            let generation = state.generation;
            let shared = Arc::clone(&self.state);
            state.regeneration = Some(tokio::spawn(async move {
                let result = render().await;

                let mut state = shared.lock().await;
                if state.generation != generation {
                    debug!("Page invalidated during regeneration, result dropped.");
                    return;
                }
                match result {
                    Ok(html) => {
                        state.page = Some(RenderedPage {
                            html,
                            generated_at: now,
                        })
                    }
                    Err(e) => {
                        warn!(error = %format!("{e:#}"), "Regeneration failed, serving stale page.")
                    }
                }
            }));
        }

        Ok(cached.html)
    }

    /// Drop the cached page so the next request regenerates it
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.page = None;
        state.generation += 1;
    }

    #[cfg(test)]
    async fn finish_regeneration(&self) {
        let task = self.state.lock().await.regeneration.take();
        if let Some(task) = task {
            task.await.unwrap();
        }
    }
}
