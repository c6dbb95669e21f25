//! Paged list loader with reload reconciliation.
//!
//! [`InfiniteItems`] pages through a [`PageSource`] and accumulates the items.
//! Every fetch takes a ticket from a strictly increasing counter:
//!
//! - a reload response is applied only if its ticket is newer than the last
//!   applied reload (the watermark), so an overtaken reload never replaces
//!   fresher results;
//! - a next-page response is appended only if no reload was issued after it
//!   started, so stale pages never land on top of fresh results.
//!
//! The state lock is never held across a fetch. A failed fetch counts as an
//! empty page.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::instrument;

use emporium_core::{Post, PostQuery};

use crate::backend::{BackendClient, BackendError};
use crate::config::DEFAULT_PAGE_SIZE;

/// Something that can return page `page` (zero-based) of `page_size` items.
pub trait PageSource<T>: Send + Sync {
    type Error: std::fmt::Display + Send;

    fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send;
}

/// Point-in-time copy of the loader state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSnapshot<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub loading: bool,
    pub reloading: bool,
    pub page_limit_reached: bool,
}

#[derive(Debug)]
struct ListState<T> {
    items: Vec<T>,
    page: u32,
    loading: bool,
    reloading: bool,
    page_limit_reached: bool,
    last_applied_reload: u64,
    last_issued_reload: u64,
}

impl<T> ListState<T> {
    const fn new(items: Vec<T>, page: u32, page_limit_reached: bool) -> Self {
        Self {
            items,
            page,
            loading: false,
            reloading: false,
            page_limit_reached,
            last_applied_reload: 0,
            last_issued_reload: 0,
        }
    }
}

/// Accumulating, reload-safe list over a paged source.
pub struct InfiniteItems<T, S> {
    source: S,
    page_size: u32,
    tickets: AtomicU64,
    state: Mutex<ListState<T>>,
}

impl<T, S> InfiniteItems<T, S>
where
    T: Clone + Send,
    S: PageSource<T>,
{
    /// Empty list with the default page size (30).
    pub fn new(source: S) -> Self {
        Self::with_page_size(source, DEFAULT_PAGE_SIZE)
    }

    /// Empty list; a zero page size is treated as 1.
    pub fn with_page_size(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            tickets: AtomicU64::new(0),
            state: Mutex::new(ListState::new(Vec::new(), 0, false)),
        }
    }

    /// List seeded with an already rendered first page.
    pub fn with_initial(source: S, page_size: u32, items: Vec<T>) -> Self {
        let page_size = page_size.max(1);
        let exhausted = items.len() < page_size as usize;
        Self {
            source,
            page_size,
            tickets: AtomicU64::new(0),
            state: Mutex::new(ListState::new(items, 0, exhausted)),
        }
    }

    /// Empty list positioned after `page`, so the next load fetches `page + 1`.
    pub fn resume_after(source: S, page_size: u32, page: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            tickets: AtomicU64::new(0),
            state: Mutex::new(ListState::new(Vec::new(), page, false)),
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.lock().await.items.clone()
    }

    pub async fn snapshot(&self) -> ListSnapshot<T> {
        let state = self.state.lock().await;
        ListSnapshot {
            items: state.items.clone(),
            page: state.page,
            loading: state.loading,
            reloading: state.reloading,
            page_limit_reached: state.page_limit_reached,
        }
    }

    pub async fn page_limit_reached(&self) -> bool {
        self.state.lock().await.page_limit_reached
    }

    /// Fetch page 0 and replace all items.
    ///
    /// Returns `false` when a newer reload was applied first and this
    /// response was discarded.
    #[instrument(skip(self))]
    pub async fn reload_items(&self) -> bool {
        let ticket = {
            let mut state = self.state.lock().await;
            let ticket = self.next_ticket();
            state.reloading = true;
            state.last_issued_reload = ticket;
            ticket
        };

        let items = self.fetch(0).await;

        let mut state = self.state.lock().await;
        if ticket <= state.last_applied_reload {
            tracing::debug!(ticket, watermark = state.last_applied_reload, "Discarding stale reload");
            return false;
        }

        state.last_applied_reload = ticket;
        state.page_limit_reached = items.len() < self.page_size as usize;
        state.items = items;
        state.page = 0;
        if ticket == state.last_issued_reload {
            state.reloading = false;
        }
        true
    }

    /// Fetch the next page and append it.
    ///
    /// Does nothing (returns `false`) while another page or a reload is in
    /// flight, or once a short page has marked the end of the data.
    #[instrument(skip(self))]
    pub async fn load_next_items(&self) -> bool {
        let (ticket, page) = {
            let mut state = self.state.lock().await;
            if state.loading || state.reloading || state.page_limit_reached {
                return false;
            }
            state.loading = true;
            (self.next_ticket(), state.page.saturating_add(1))
        };

        let items = self.fetch(page).await;

        let mut state = self.state.lock().await;
        state.loading = false;
        if ticket < state.last_issued_reload {
            tracing::debug!(ticket, page, "Discarding page fetched before a reload");
            return false;
        }

        if items.len() < self.page_size as usize {
            state.page_limit_reached = true;
        }
        state.page = page;
        state.items.extend(items);
        true
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn fetch(&self, page: u32) -> Vec<T> {
        match self.source.fetch_page(page, self.page_size).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, page, "Failed to load list page");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Newest-first posts from the content backend, optionally filtered.
#[derive(Clone)]
pub struct BackendPostSource {
    client: BackendClient,
    search: Option<String>,
    topic: Option<String>,
}

impl BackendPostSource {
    #[must_use]
    pub fn new(client: BackendClient, search: Option<String>) -> Self {
        Self {
            client,
            search: search.filter(|q| !q.trim().is_empty()),
            topic: None,
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: Option<String>) -> Self {
        self.topic = topic;
        self
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

impl PageSource<Post> for BackendPostSource {
    type Error = BackendError;

    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<Vec<Post>, BackendError> {
        let query = PostQuery {
            topic: self.topic.clone(),
            ..PostQuery::newest(self.search.clone(), page, page_size)
        };
        self.client.list_posts(&query).await
    }
}
