//! Navigation session
//!
//! The `Navigator` ties the pieces together: hover/viewport triggers feed
//! `request_prefetch`, clicks feed `commit_navigation`, collaborator state
//! changes feed `invalidate`, and back/forward events replay cached
//! documents through the `PageHost`. Prefetching is invisible on failure:
//! the worst case for any error in here is an ordinary full navigation.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cache::DocumentCache;
use crate::defaults;
use crate::document::DocumentSnapshot;
use crate::history::HistoryStack;
use crate::network::DocumentFetcher;
use crate::queue::{QueueHandle, QueuedOp, SequentialFetchQueue};
use crate::settings::SettingsStore;
use crate::utils::error::{NavError, Result};

/// The DOM boundary the session mutates.
///
/// `apply_snapshot` replaces head, body and title with the cached snapshot
/// and is responsible for re-initializing reactive bindings over the new
/// body, re-dispatching content-loaded signals and scrolling to top.
/// `full_reload` abandons in-place swapping and loads the URL from scratch.
pub trait PageHost {
    fn apply_snapshot(&mut self, snapshot: &DocumentSnapshot);
    fn full_reload(&mut self, url: &str);
}

/// Click metadata relevant to navigation handling
#[derive(Debug, Clone, Default)]
pub struct ClickEvent {
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    /// 0 is the primary button
    pub button: u8,
    pub default_prevented: bool,
}

impl ClickEvent {
    /// A plain primary-button click with no modifiers
    pub fn primary() -> Self {
        Self::default()
    }

    /// Whether the user asked for default browser behavior (open in new
    /// tab/window, download, etc.)
    pub fn wants_default(&self) -> bool {
        self.ctrl_key || self.meta_key || self.shift_key || self.alt_key || self.button != 0
    }

    /// Suppress the default navigation action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Result of a navigation commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A cached document was swapped in and a history entry pushed
    Swapped,
    /// Nothing was done; the browser's normal navigation proceeds
    DefaultNavigation,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL hrefs are resolved against; also the initial history entry
    pub base_url: String,
    /// Delay between a prefetch settling and its snapshot becoming
    /// available
    pub settle_delay: Duration,
}

impl SessionConfig {
    /// Config with the default settle delay
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            settle_delay: Duration::from_millis(defaults::SETTLE_DELAY_MS),
        }
    }

    /// Override the settle delay
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

/// Orchestrates speculative navigation for one page session
pub struct Navigator<H: PageHost> {
    base: Url,
    settle_delay: Duration,
    fetcher: Arc<dyn DocumentFetcher>,
    queue: Arc<SequentialFetchQueue<Option<DocumentSnapshot>>>,
    cache: Arc<DocumentCache>,
    /// URLs with a prefetch queued or in flight, for dedupe
    pending: Arc<Mutex<HashSet<String>>>,
    /// Session generation, bumped on every full flush. A prefetch that
    /// settles after a flush belongs to an older generation and must not
    /// touch the pending set or the cache.
    epoch: Arc<AtomicU64>,
    history: HistoryStack,
    host: H,
}

impl<H: PageHost> Navigator<H> {
    /// Create a session.
    ///
    /// Fails with [`NavError::Config`] when the base URL is malformed; that
    /// indicates a page-template defect and there is no point continuing.
    pub fn new(config: SessionConfig, fetcher: Arc<dyn DocumentFetcher>, host: H) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| NavError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;
        if base.host_str().is_none() {
            return Err(NavError::Config(format!(
                "base URL {:?} has no host",
                config.base_url
            )));
        }
        let initial = base.to_string();

        Ok(Self {
            base,
            settle_delay: config.settle_delay,
            fetcher,
            queue: Arc::new(SequentialFetchQueue::new()),
            cache: Arc::new(DocumentCache::new()),
            pending: Arc::new(Mutex::new(HashSet::new())),
            epoch: Arc::new(AtomicU64::new(0)),
            history: HistoryStack::new(initial),
            host,
        })
    }

    /// Ask for a link target to be fetched and cached ahead of a click.
    ///
    /// Returns `None` without issuing a request when the href is not a
    /// local page (in-page anchor, other host), is already cached, or
    /// already has a prefetch queued. Otherwise returns the settlement
    /// handle; callers are free to drop it.
    pub fn request_prefetch(
        &self,
        href: &str,
    ) -> Option<QueueHandle<Option<DocumentSnapshot>>> {
        let url = self.local_target(href)?;
        if self.cache.contains(&url) {
            return None;
        }
        if !self.pending.lock().unwrap().insert(url.clone()) {
            return None;
        }
        debug!("queueing prefetch for {url}");

        let fetcher = Arc::clone(&self.fetcher);
        let cache = Arc::clone(&self.cache);
        let pending = Arc::clone(&self.pending);
        let epoch = Arc::clone(&self.epoch);
        let enqueued_epoch = epoch.load(Ordering::SeqCst);
        let settle_delay = self.settle_delay;
        let op: QueuedOp<Option<DocumentSnapshot>> = Box::new(move |token| {
            Box::pin(async move {
                let outcome = fetch_and_parse(fetcher, &url, token, settle_delay).await;
                if epoch.load(Ordering::SeqCst) != enqueued_epoch {
                    // A flush happened while this settled. The pending
                    // entry and any snapshot belong to the old generation;
                    // a re-requested prefetch for this URL owns them now.
                    return Err(NavError::Cancelled);
                }
                pending.lock().unwrap().remove(&url);
                if let Ok(Some(snapshot)) = &outcome {
                    cache.insert_if(&url, snapshot.clone(), || {
                        epoch.load(Ordering::SeqCst) == enqueued_epoch
                    });
                }
                outcome
            })
        });
        Some(self.queue.enqueue(op))
    }

    /// Consume a cached document for a user-committed navigation.
    ///
    /// Falls through to [`CommitOutcome::DefaultNavigation`] on a modifier
    /// click, a non-local href or a cache miss, mutating nothing. On a hit
    /// the event's default is prevented, exactly one history entry is
    /// pushed and the snapshot is applied through the host.
    pub fn commit_navigation(
        &mut self,
        href: &str,
        event: Option<&mut ClickEvent>,
    ) -> CommitOutcome {
        if let Some(event) = &event {
            if event.wants_default() {
                return CommitOutcome::DefaultNavigation;
            }
        }
        let Some(url) = self.local_target(href) else {
            return CommitOutcome::DefaultNavigation;
        };
        let Some(snapshot) = self.cache.get(&url) else {
            debug!("no cached document for {url}, deferring to default navigation");
            return CommitOutcome::DefaultNavigation;
        };

        if let Some(event) = event {
            event.prevent_default();
        }
        self.history.push(url.as_str());
        self.host.apply_snapshot(&snapshot);
        debug!("swapped in cached document for {url}");
        CommitOutcome::Swapped
    }

    /// Drop one cached entry, or flush the whole session state.
    ///
    /// A full invalidation also aborts the fetch queue: documents fetched
    /// under the old collaborator state would be stale on arrival.
    pub fn invalidate(&self, href: Option<&str>) {
        match href {
            Some(href) => {
                let url = self.local_target(href).unwrap_or_else(|| href.to_string());
                self.cache.remove(&url);
            }
            None => flush(&self.queue, &self.pending, &self.cache, &self.epoch),
        }
    }

    /// Flush the cache whenever presentation-affecting state changes.
    ///
    /// Cached documents were rendered under the old theme/locale, so any
    /// change evicts everything.
    pub fn bind_settings(&self, store: &SettingsStore) {
        let queue = Arc::clone(&self.queue);
        let pending = Arc::clone(&self.pending);
        let cache = Arc::clone(&self.cache);
        let epoch = Arc::clone(&self.epoch);
        store.subscribe(move |key, _| {
            debug!("settings changed ({key}), flushing document cache");
            flush(&queue, &pending, &cache, &epoch);
        });
    }

    /// Handle a back event; returns false when there is no older entry
    pub fn back(&mut self) -> bool {
        let Some(url) = self.history.back().map(|u| u.to_string()) else {
            return false;
        };
        self.restore(&url);
        true
    }

    /// Handle a forward event; returns false when there is no newer entry
    pub fn forward(&mut self) -> bool {
        let Some(url) = self.history.forward().map(|u| u.to_string()) else {
            return false;
        };
        self.restore(&url);
        true
    }

    /// Replay the document for a history entry the browser landed on.
    ///
    /// The internal cursor is seated on the popped entry first, so later
    /// commits push from the right place. A cache hit then swaps in place
    /// without pushing history (history already moved); a miss falls back
    /// to a full reload, resetting session state.
    pub fn handle_pop(&mut self, url: &str) {
        self.history.seek(url);
        self.restore(url);
    }

    fn restore(&mut self, url: &str) {
        match self.cache.get(url) {
            Some(snapshot) => {
                self.host.apply_snapshot(&snapshot);
                debug!("restored cached document for {url}");
            }
            None => {
                // Correctness over a smooth but stale experience
                flush(&self.queue, &self.pending, &self.cache, &self.epoch);
                self.host.full_reload(url);
            }
        }
    }

    /// Resolve an href against the base URL, rejecting anything that is
    /// not a same-host page navigation. Fragments are stripped so variants
    /// of one page share a cache key.
    fn local_target(&self, href: &str) -> Option<String> {
        if href.starts_with('#') {
            return None;
        }
        let mut joined = self.base.join(href).ok()?;
        if joined.scheme() != self.base.scheme()
            || joined.host_str() != self.base.host_str()
            || joined.port_or_known_default() != self.base.port_or_known_default()
        {
            return None;
        }
        joined.set_fragment(None);
        Some(joined.to_string())
    }

    /// The document cache
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    /// The fetch queue
    pub fn queue(&self) -> &SequentialFetchQueue<Option<DocumentSnapshot>> {
        &self.queue
    }

    /// The session history stack
    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    /// The page host
    pub fn host(&self) -> &H {
        &self.host
    }
}

/// Abort in-flight work and empty the session caches.
///
/// The epoch is bumped before anything is cleared so that an operation
/// settling concurrently with the flush already sees the new generation
/// and keeps its hands off the pending set and the cache.
fn flush(
    queue: &SequentialFetchQueue<Option<DocumentSnapshot>>,
    pending: &Mutex<HashSet<String>>,
    cache: &DocumentCache,
    epoch: &AtomicU64,
) {
    epoch.fetch_add(1, Ordering::SeqCst);
    queue.abort_all();
    pending.lock().unwrap().clear();
    cache.clear();
}

/// The prefetch operation run by the queue: fetch, parse, settle.
///
/// Network failures and non-success statuses settle as `Ok(None)` so a bad
/// prefetch never breaks the queue or surfaces to the UI; only cancellation
/// propagates as an error.
async fn fetch_and_parse(
    fetcher: Arc<dyn DocumentFetcher>,
    url: &str,
    token: CancellationToken,
    settle_delay: Duration,
) -> Result<Option<DocumentSnapshot>> {
    let fetched = match fetcher.fetch(url, &token).await {
        Ok(fetched) => fetched,
        Err(err) if err.is_cancelled() => return Err(err),
        Err(err) => {
            warn!("prefetch of {url} failed: {err}");
            return Ok(None);
        }
    };
    if !fetched.is_success() {
        warn!("prefetch of {url} answered HTTP {}", fetched.status());
        return Ok(None);
    }

    let snapshot = DocumentSnapshot::parse(fetched.body());
    tokio::select! {
        _ = token.cancelled() => return Err(NavError::Cancelled),
        _ = tokio::time::sleep(settle_delay) => {}
    }
    Ok(Some(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::MockDocumentFetcher;

    #[derive(Default)]
    struct RecordingHost {
        swaps: usize,
        reloads: Vec<String>,
        title: String,
    }

    impl PageHost for RecordingHost {
        fn apply_snapshot(&mut self, snapshot: &DocumentSnapshot) {
            self.swaps += 1;
            self.title = snapshot.title.clone();
        }

        fn full_reload(&mut self, url: &str) {
            self.reloads.push(url.to_string());
        }
    }

    fn navigator() -> Navigator<RecordingHost> {
        let fetcher = Arc::new(MockDocumentFetcher::new());
        Navigator::new(
            SessionConfig::new("https://example.com/"),
            fetcher,
            RecordingHost::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_malformed_base_url_is_fatal() {
        let fetcher = Arc::new(MockDocumentFetcher::new());
        let result = Navigator::new(
            SessionConfig::new("not a url"),
            fetcher,
            RecordingHost::default(),
        );
        assert!(matches!(result, Err(NavError::Config(_))));
    }

    #[test]
    fn test_local_target_resolution() {
        let nav = navigator();
        assert_eq!(
            nav.local_target("/docs"),
            Some("https://example.com/docs".to_string())
        );
        assert_eq!(
            nav.local_target("docs/install"),
            Some("https://example.com/docs/install".to_string())
        );
        // Fragments are stripped so variants share a cache key
        assert_eq!(
            nav.local_target("/docs#usage"),
            Some("https://example.com/docs".to_string())
        );
    }

    #[test]
    fn test_non_local_targets_are_rejected() {
        let nav = navigator();
        assert_eq!(nav.local_target("#section"), None);
        assert_eq!(nav.local_target("https://other.example.org/docs"), None);
        assert_eq!(nav.local_target("http://example.com/docs"), None);
    }

    #[test]
    fn test_modifier_click_wants_default() {
        assert!(!ClickEvent::primary().wants_default());
        let meta = ClickEvent {
            meta_key: true,
            ..ClickEvent::default()
        };
        assert!(meta.wants_default());
        let middle = ClickEvent {
            button: 1,
            ..ClickEvent::default()
        };
        assert!(middle.wants_default());
    }

    #[tokio::test]
    async fn test_commit_miss_mutates_nothing() {
        let mut nav = navigator();
        let mut event = ClickEvent::primary();

        let outcome = nav.commit_navigation("/docs", Some(&mut event));
        assert_eq!(outcome, CommitOutcome::DefaultNavigation);
        assert!(!event.default_prevented);
        assert_eq!(nav.host().swaps, 0);
        assert_eq!(nav.history().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_hit_swaps_and_pushes_history() {
        let mut nav = navigator();
        nav.cache().insert(
            "https://example.com/docs",
            DocumentSnapshot {
                head: String::new(),
                body: "content".into(),
                title: "Docs".into(),
            },
        );

        let mut event = ClickEvent::primary();
        let outcome = nav.commit_navigation("/docs", Some(&mut event));

        assert_eq!(outcome, CommitOutcome::Swapped);
        assert!(event.default_prevented);
        assert_eq!(nav.host().swaps, 1);
        assert_eq!(nav.host().title, "Docs");
        assert_eq!(nav.history().len(), 2);
        assert_eq!(nav.history().current(), "https://example.com/docs");
    }

    #[tokio::test]
    async fn test_modifier_click_defers_even_on_cache_hit() {
        let mut nav = navigator();
        nav.cache().insert(
            "https://example.com/docs",
            DocumentSnapshot {
                head: String::new(),
                body: String::new(),
                title: String::new(),
            },
        );

        let mut event = ClickEvent {
            ctrl_key: true,
            ..ClickEvent::default()
        };
        let outcome = nav.commit_navigation("/docs", Some(&mut event));
        assert_eq!(outcome, CommitOutcome::DefaultNavigation);
        assert_eq!(nav.host().swaps, 0);
    }

    #[tokio::test]
    async fn test_pop_miss_falls_back_to_full_reload() {
        let mut nav = navigator();
        nav.cache().insert(
            "https://example.com/a",
            DocumentSnapshot {
                head: String::new(),
                body: String::new(),
                title: "A".into(),
            },
        );
        nav.commit_navigation("/a", None);

        // Entry replayed on back is the base URL, which is not cached
        assert!(nav.back());
        assert_eq!(nav.host().reloads, ["https://example.com/"]);
        assert!(nav.cache().is_empty());
    }
}
