//! List state containers that own loading/error/pagination for one query.
//!
//! Every fetch is tagged with a sequence number; only the response to the most recently
//! dispatched fetch is applied. Superseded fetches are also aborted. Dropping the container
//! aborts whatever is still in flight and no late response can write into it.

pub mod reviews;

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::{sync::watch, task::AbortHandle};
use tracing::{debug, warn};

use crate::{
    api::{
        CertificateFilters, CertificatesApi, ListFilters, Page, ProjectFilters, ProjectsApi,
        Resource, ResourceApi, ReviewFilters, ReviewsApi,
    },
    error::Result,
    models::{Pagination, Review},
};

pub use reviews::ReviewsHook;

/// Something a [`ListHook`] can fetch pages from.
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Filters: ListFilters;

    async fn fetch(&self, filters: &Self::Filters) -> Result<Page<Self::Item>>;
}

#[async_trait]
impl<R: Resource> ListSource for ResourceApi<R> {
    type Item = R;
    type Filters = R::Filters;

    async fn fetch(&self, filters: &R::Filters) -> Result<Page<R>> {
        self.list(filters).await
    }
}

#[async_trait]
impl ListSource for ReviewsApi {
    type Item = Review;
    type Filters = ReviewFilters;

    async fn fetch(&self, filters: &ReviewFilters) -> Result<Page<Review>> {
        self.list(filters).await
    }
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            pagination: None,
        }
    }
}

struct Query<F> {
    filters: F,
    key: String,
}

struct Shared<S: ListSource> {
    source: Arc<S>,
    state: watch::Sender<ListState<S::Item>>,
    query: Mutex<Query<S::Filters>>,
    latest: AtomicU64,
    dispatched: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

impl<S: ListSource> Shared<S> {
    fn settle(&self, seq: u64, limit: Option<usize>, outcome: Result<Page<S::Item>>) {
        // `dispatch` bumps `latest` under the same lock.
        let applied = self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            state.loading = false;
            match outcome {
                Ok(page) => {
                    let mut items = page.items;
                    if let Some(limit) = limit {
                        items.truncate(limit);
                    }
                    state.items = items;
                    state.pagination = page.pagination;
                    state.error = None;
                }
                Err(err) => {
                    warn!(%err, "list fetch failed");
                    state.error = Some(err.message());
                }
            }
            true
        });
        if !applied {
            debug!(seq, "discarding superseded list response");
        }
    }
}

/// State container for one list query.
pub struct ListHook<S: ListSource> {
    shared: Arc<Shared<S>>,
}

pub type ProjectsHook = ListHook<ProjectsApi>;
pub type CertificatesHook = ListHook<CertificatesApi>;

/// Mount a projects list and start the first fetch.
pub fn use_projects(api: ProjectsApi, filters: ProjectFilters) -> Result<ProjectsHook> {
    ListHook::new(api, filters)
}

/// Mount a certificates list and start the first fetch.
pub fn use_certificates(
    api: CertificatesApi,
    filters: CertificateFilters,
) -> Result<CertificatesHook> {
    ListHook::new(api, filters)
}

impl<S: ListSource> ListHook<S> {
    /// Create the container and dispatch the initial fetch. Requires a Tokio runtime.
    pub fn new(source: S, filters: S::Filters) -> Result<Self> {
        let hook = Self::idle(source, filters)?;
        hook.refetch();
        Ok(hook)
    }

    /// Create the container without fetching.
    pub fn idle(source: S, filters: S::Filters) -> Result<Self> {
        let key = serde_json::to_string(&filters)?;
        let (state, _) = watch::channel(ListState::default());
        Ok(Self {
            shared: Arc::new(Shared {
                source: Arc::new(source),
                state,
                query: Mutex::new(Query { filters, key }),
                latest: AtomicU64::new(0),
                dispatched: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        })
    }

    /// Replace the filters. Fetches only when the serialized form changed.
    pub fn set_filters(&self, filters: S::Filters) -> Result<bool> {
        let key = serde_json::to_string(&filters)?;
        {
            let mut query = self.shared.query.lock().unwrap_or_else(PoisonError::into_inner);
            if query.key == key {
                return Ok(false);
            }
            *query = Query {
                filters: filters.clone(),
                key,
            };
        }
        self.dispatch(filters);
        Ok(true)
    }

    /// Re-run the current query, e.g. after a create/update/delete.
    pub fn refetch(&self) {
        let filters = self.filters();
        self.dispatch(filters);
    }

    pub fn filters(&self) -> S::Filters {
        self.shared
            .query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .filters
            .clone()
    }

    pub fn state(&self) -> ListState<S::Item> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<S::Item>> {
        self.shared.state.subscribe()
    }

    /// Wait until no fetch is pending and return the resulting state.
    pub async fn settled(&self) -> ListState<S::Item> {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Number of fetches dispatched over the container's lifetime.
    pub fn fetch_count(&self) -> u64 {
        self.shared.dispatched.load(Ordering::SeqCst)
    }

    pub(crate) fn update_items(&self, update: impl FnOnce(&mut Vec<S::Item>)) {
        self.shared
            .state
            .send_modify(|state| update(&mut state.items));
    }

    fn dispatch(&self, filters: S::Filters) {
        let mut in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut seq = 0;
        self.shared.state.send_modify(|state| {
            seq = self.shared.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
        });
        self.shared.dispatched.fetch_add(1, Ordering::SeqCst);

        let limit = filters.limit();
        let source = Arc::clone(&self.shared.source);
        let shared = Arc::downgrade(&self.shared);
        let task = tokio::spawn(async move {
            let outcome = source.fetch(&filters).await;
            match shared.upgrade() {
                Some(shared) => shared.settle(seq, limit, outcome),
                None => debug!(seq, "list container dropped before response arrived"),
            }
        });

        if let Some(previous) = in_flight.replace(task.abort_handle()) {
            previous.abort();
        }
    }
}

impl<S: ListSource> Drop for ListHook<S> {
    fn drop(&mut self) {
        let in_flight = self
            .shared
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = in_flight {
            handle.abort();
        }
    }
}
