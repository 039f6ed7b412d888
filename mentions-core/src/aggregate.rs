use crate::types::{Category, ItemKind, KeywordResultSet, MatchItem};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSummary {
    pub keyword: String,
    pub post_count: usize,
    pub comment_count: usize,
    pub post_categories: Vec<CategoryCount>,
    pub comment_categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub summaries: Vec<KeywordSummary>,
    /// URLs of posts found under every keyword.
    pub common_posts: BTreeSet<String>,
    /// URLs of comments found under every keyword.
    pub common_comments: BTreeSet<String>,
}

/// Counts categories, sorted by count descending. Equal counts keep
/// taxonomy order so the output is deterministic.
pub fn category_counts(items: &[MatchItem]) -> Vec<CategoryCount> {
    let mut tally: HashMap<Category, usize> = HashMap::new();
    for item in items {
        *tally.entry(item.category_or_other()).or_default() += 1;
    }

    let mut counts: Vec<CategoryCount> = Category::ALL
        .into_iter()
        .filter_map(|category| {
            tally
                .get(&category)
                .map(|&count| CategoryCount { category, count })
        })
        .collect();
    // Stable sort, so ties stay in taxonomy order.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// URLs of `kind` items present in every set. Empty input gives an empty set.
pub fn intersect_urls(sets: &[KeywordResultSet], kind: ItemKind) -> BTreeSet<String> {
    let mut iter = sets.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };

    let mut common: BTreeSet<String> = first.items(kind).iter().map(|i| i.url.clone()).collect();
    for set in iter {
        let urls: BTreeSet<&str> = set.items(kind).iter().map(|i| i.url.as_str()).collect();
        common.retain(|url| urls.contains(url.as_str()));
    }
    common
}

/// Newest first. Equal timestamps fall back to URL for a stable order.
pub fn sort_by_recency(set: &mut KeywordResultSet) {
    let newest_first = |a: &MatchItem, b: &MatchItem| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.url.cmp(&b.url))
    };
    set.posts.sort_by(newest_first);
    set.comments.sort_by(newest_first);
}

pub fn summarize(set: &KeywordResultSet) -> KeywordSummary {
    KeywordSummary {
        keyword: set.keyword.clone(),
        post_count: set.posts.len(),
        comment_count: set.comments.len(),
        post_categories: category_counts(&set.posts),
        comment_categories: category_counts(&set.comments),
    }
}

/// Sorts each set for presentation and derives summaries and intersections.
pub fn aggregate(sets: &mut [KeywordResultSet]) -> Aggregate {
    for set in sets.iter_mut() {
        sort_by_recency(set);
    }

    Aggregate {
        summaries: sets.iter().map(summarize).collect(),
        common_posts: intersect_urls(sets, ItemKind::Post),
        common_comments: intersect_urls(sets, ItemKind::Comment),
    }
}
