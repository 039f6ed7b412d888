use chrono::{DateTime, Utc};

/// Ordering guarantee a content source makes about the items it yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrdering {
    /// Strictly descending creation time; the first out-of-window item ends the scan.
    NewestFirst,
    /// No ordering guarantee; every item has to be examined.
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    Keep,
    Skip,
    Stop,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeWindowFilter {
    cutoff: DateTime<Utc>,
    ordering: SourceOrdering,
}

impl TimeWindowFilter {
    pub fn new(cutoff: DateTime<Utc>, ordering: SourceOrdering) -> Self {
        Self { cutoff, ordering }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn ordering(&self) -> SourceOrdering {
        self.ordering
    }

    pub fn decide(&self, created_at: DateTime<Utc>) -> WindowDecision {
        if created_at >= self.cutoff {
            WindowDecision::Keep
        } else if self.ordering == SourceOrdering::NewestFirst {
            WindowDecision::Stop
        } else {
            WindowDecision::Skip
        }
    }

    /// Filters an in-memory stream. The iterator is not advanced past the
    /// item that triggered a stop.
    pub fn apply<T, I, F>(&self, items: I, created_at: F) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> DateTime<Utc>,
    {
        let mut kept = Vec::new();
        for item in items {
            match self.decide(created_at(&item)) {
                WindowDecision::Keep => kept.push(item),
                WindowDecision::Skip => continue,
                WindowDecision::Stop => break,
            }
        }
        kept
    }
}

/// Case-insensitive substring match over title and body.
///
/// There is no tokenization or word-boundary check, so `mysql` also matches
/// `mysqlclient` or `mysql2`. Those false positives are accepted.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    needle: String,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Self {
        Self {
            needle: keyword.to_lowercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.needle
    }

    pub fn matches_text(&self, text: &str) -> bool {
        !text.is_empty() && text.to_lowercase().contains(&self.needle)
    }

    pub fn matches(&self, title: &str, body: &str) -> bool {
        self.matches_text(title) || self.matches_text(body)
    }
}
