//! Session navigation stack
//!
//! Mirrors the browser history boundary: a stack of URL-tagged entries with
//! a cursor. Pushing while the cursor is mid-stack drops the forward
//! entries, matching browser behavior.

/// One navigation stack entry, tagged with the URL it corresponds to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    url: String,
}

impl HistoryEntry {
    fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// URL this entry corresponds to
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Navigation stack with a movable cursor
#[derive(Debug)]
pub struct HistoryStack {
    entries: Vec<HistoryEntry>,
    index: usize,
}

impl HistoryStack {
    /// Create a stack holding the initial page as its only entry
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry::new(initial_url)],
            index: 0,
        }
    }

    /// Push a new entry after the cursor, discarding any forward entries
    pub fn push(&mut self, url: impl Into<String>) {
        self.entries.truncate(self.index + 1);
        self.entries.push(HistoryEntry::new(url));
        self.index = self.entries.len() - 1;
    }

    /// Move the cursor back one entry; `None` when already at the oldest
    pub fn back(&mut self) -> Option<&str> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index].url())
    }

    /// Seat the cursor on the entry for `url`, picking the occurrence
    /// closest to the current cursor when the URL appears more than once.
    /// Returns false when no entry matches and leaves the cursor alone.
    ///
    /// Used when the browser reports a pop: its stack already moved, so the
    /// internal cursor has to follow instead of pushing.
    pub fn seek(&mut self, url: &str) -> bool {
        let found = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.url == url)
            .min_by_key(|(i, _)| i.abs_diff(self.index))
            .map(|(i, _)| i);
        match found {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }

    /// Move the cursor forward one entry; `None` when already at the newest
    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index].url())
    }

    /// URL under the cursor
    pub fn current(&self) -> &str {
        self.entries[self.index].url()
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A fresh stack always has one entry, so this is never true
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
