//! Request history
//!
//! Most-recent-first, bounded. Sending the same method and URL again
//! replaces the newest entry instead of stacking duplicates.

use std::collections::VecDeque;

use chrono::Utc;

use crate::models::{ApiRequest, HistoryEntry};

/// Manages the request history list
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        History {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Wrap a stored snapshot, trimming it to `limit`
    pub fn from_entries(entries: Vec<HistoryEntry>, limit: usize) -> Self {
        let mut history = History::new(limit);
        history.entries = entries.into_iter().take(history.limit).collect();
        history
    }

    /// Record a request sent now
    pub fn record(&mut self, request: ApiRequest) {
        self.push(HistoryEntry {
            request,
            timestamp: Utc::now(),
        });
    }

    /// Add entry to the front, evicting the oldest beyond the limit
    pub fn push(&mut self, entry: HistoryEntry) {
        let same_as_top = self.entries.front().is_some_and(|top| {
            top.request.method == entry.request.method && top.request.url == entry.request.url
        });
        if same_as_top {
            self.entries.pop_front();
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.limit);
    }

    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        self.entries.remove(index)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get history item by index (0 = most recent)
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshot for persistence (most recent first)
    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;

    fn request(method: HttpMethod, url: &str) -> ApiRequest {
        ApiRequest {
            method,
            url: url.to_string(),
            ..ApiRequest::default()
        }
    }

    #[test]
    fn never_exceeds_limit_and_newest_first() {
        let mut history = History::new(3);
        for i in 0..10 {
            history.record(request(HttpMethod::GET, &format!("https://example.com/{}", i)));
            assert!(history.len() <= 3);
            assert_eq!(
                history.get(0).unwrap().request.url,
                format!("https://example.com/{}", i)
            );
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.get(2).unwrap().request.url, "https://example.com/7");
    }

    #[test]
    fn same_method_and_url_replaces_top() {
        let mut history = History::new(20);
        history.record(request(HttpMethod::GET, "https://a.com"));
        let mut again = request(HttpMethod::GET, "https://a.com");
        again.name = "second".into();
        history.record(again);

        assert_eq!(history.len(), 1);
        assert_eq!(history.get(0).unwrap().request.name, "second");

        history.record(request(HttpMethod::POST, "https://a.com"));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn duplicates_below_the_top_are_kept() {
        let mut history = History::new(20);
        history.record(request(HttpMethod::GET, "https://a.com"));
        history.record(request(HttpMethod::GET, "https://b.com"));
        history.record(request(HttpMethod::GET, "https://a.com"));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn from_entries_trims_and_zero_limit_is_clamped() {
        let entries: Vec<HistoryEntry> = (0..5)
            .map(|i| HistoryEntry {
                request: request(HttpMethod::GET, &format!("https://x/{}", i)),
                timestamp: Utc::now(),
            })
            .collect();
        let history = History::from_entries(entries, 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).unwrap().request.url, "https://x/0");

        let mut tiny = History::new(0);
        tiny.record(request(HttpMethod::GET, "https://a.com"));
        tiny.record(request(HttpMethod::GET, "https://b.com"));
        assert_eq!(tiny.limit(), 1);
        assert_eq!(tiny.get(0).unwrap().request.url, "https://b.com");
    }

    #[test]
    fn remove_and_clear() {
        let mut history = History::new(5);
        history.record(request(HttpMethod::GET, "https://a.com"));
        history.record(request(HttpMethod::GET, "https://b.com"));
        let removed = history.remove(0).unwrap();
        assert_eq!(removed.request.url, "https://b.com");
        assert_eq!(history.to_vec().len(), 1);
        history.clear();
        assert!(history.is_empty());
    }
}
