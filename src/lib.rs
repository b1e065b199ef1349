//! # TurboNav - Speculative Page Navigation
//!
//! A client-side navigation accelerator: linked pages are fetched before the
//! user clicks, parsed into head/body/title snapshots, and swapped into the
//! live page in place of a full reload. Prefetching is a pure optimization;
//! on any failure the worst case is an ordinary full navigation.
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **queue**: sequential fetch queue guaranteeing one-at-a-time, FIFO
//!   execution of prefetch operations with bulk cancellation
//! - **network**: the fetch boundary (`DocumentFetcher` trait and the
//!   reqwest-backed `HttpFetcher`)
//! - **document**: parsed document snapshots (head, body, title)
//! - **cache**: in-memory URL -> snapshot store, session scoped
//! - **history**: the session navigation stack for back/forward replay
//! - **settings**: key-value collaborator state (color scheme, locale) with
//!   change notification driving cache invalidation
//! - **session**: the `Navigator` orchestrating prefetch, commit,
//!   invalidation and history replay against a `PageHost`
//! - **utils**: shared error types

pub mod cache;
pub mod document;
pub mod history;
pub mod network;
pub mod queue;
pub mod session;
pub mod settings;
pub mod utils;

// Re-export main types for convenience
pub use cache::DocumentCache;
pub use document::DocumentSnapshot;
pub use history::HistoryStack;
pub use network::{DocumentFetcher, FetchError, FetchedDocument, HttpFetcher};
pub use queue::{QueueHandle, SequentialFetchQueue};
pub use session::{ClickEvent, CommitOutcome, Navigator, PageHost, SessionConfig};
pub use settings::SettingsStore;
pub use utils::error::{NavError, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "TurboNav";

/// Tunable defaults
pub mod defaults {
    /// Delay between a prefetch response settling and the snapshot becoming
    /// available, in milliseconds. Keeps a burst of prefetches from starving
    /// slower concurrent interactions.
    pub const SETTLE_DELAY_MS: u64 = 50;
}
