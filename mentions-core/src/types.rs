use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

/// Closed classification taxonomy. Declaration order is match priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Technical Support")]
    TechnicalSupport,
    #[serde(rename = "Bug Report")]
    BugReport,
    #[serde(rename = "Migration Question")]
    MigrationQuestion,
    #[serde(rename = "Performance Issue")]
    PerformanceIssue,
    #[serde(rename = "General Discussion")]
    GeneralDiscussion,
    #[serde(rename = "Job Posting")]
    JobPosting,
    Spam,
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::TechnicalSupport,
        Category::BugReport,
        Category::MigrationQuestion,
        Category::PerformanceIssue,
        Category::GeneralDiscussion,
        Category::JobPosting,
        Category::Spam,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::TechnicalSupport => "Technical Support",
            Category::BugReport => "Bug Report",
            Category::MigrationQuestion => "Migration Question",
            Category::PerformanceIssue => "Performance Issue",
            Category::GeneralDiscussion => "General Discussion",
            Category::JobPosting => "Job Posting",
            Category::Spam => "Spam",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A post search hit as reported by the content source.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub body: String,
    pub permalink: String,
    pub subreddit: String,
    pub created_at: DateTime<Utc>,
}

/// A comment from the recent comment stream. The parent post is resolved
/// separately through `CommentSource::parent_post`.
#[derive(Debug, Clone)]
pub struct RawComment {
    pub body: String,
    pub permalink: String,
    pub subreddit: String,
    pub created_at: DateTime<Utc>,
    pub parent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentPost {
    pub title: String,
    pub url: String,
}

impl ParentPost {
    pub fn unknown() -> Self {
        Self {
            title: "[unknown post]".to_string(),
            url: "https://reddit.com".to_string(),
        }
    }
}

/// One page of a newest-first listing. `next` is the cursor for the
/// following page, `None` when the listing is exhausted.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchItem {
    pub kind: ItemKind,
    pub title: String,
    pub body: String,
    pub url: String,
    pub parent_url: Option<String>,
    pub subreddit: String,
    pub created_at: DateTime<Utc>,
    pub ai_suggestion: Option<String>,
    pub category: Option<Category>,
}

impl MatchItem {
    pub fn post(raw: RawItem) -> Self {
        Self {
            kind: ItemKind::Post,
            title: raw.title,
            body: raw.body,
            url: raw.permalink,
            parent_url: None,
            subreddit: raw.subreddit,
            created_at: raw.created_at,
            ai_suggestion: None,
            category: None,
        }
    }

    pub fn comment(raw: RawComment, parent: ParentPost) -> Self {
        Self {
            kind: ItemKind::Comment,
            title: parent.title,
            body: raw.body,
            url: raw.permalink,
            parent_url: Some(parent.url),
            subreddit: raw.subreddit,
            created_at: raw.created_at,
            ai_suggestion: None,
            category: None,
        }
    }

    /// Unclassified items count as `Other`.
    pub fn category_or_other(&self) -> Category {
        self.category.unwrap_or(Category::Other)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordResultSet {
    pub keyword: String,
    pub posts: Vec<MatchItem>,
    pub comments: Vec<MatchItem>,
}

impl KeywordResultSet {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            posts: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn items(&self, kind: ItemKind) -> &[MatchItem] {
        match kind {
            ItemKind::Post => &self.posts,
            ItemKind::Comment => &self.comments,
        }
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut MatchItem> {
        self.posts.iter_mut().chain(self.comments.iter_mut())
    }

    pub fn push(&mut self, item: MatchItem) {
        let bucket = match item.kind {
            ItemKind::Post => &mut self.posts,
            ItemKind::Comment => &mut self.comments,
        };
        // Listings can repeat an item across page boundaries.
        if !bucket.iter().any(|existing| existing.url == item.url) {
            bucket.push(item);
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionResult {
    pub text: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePrompt {
    pub name: String,
    pub text: String,
}
