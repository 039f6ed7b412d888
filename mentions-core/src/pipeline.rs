use crate::error::CoreError;
use crate::error_utils::ErrorExt;
use crate::matcher::{KeywordMatcher, TimeWindowFilter, WindowDecision};
use crate::source::{CommentSource, CompletionProvider, ContentSource};
use crate::suggest::Suggester;
use crate::types::{KeywordResultSet, MatchItem, ParentPost, RawComment};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Upper bound on pages requested for one listing, so a source that keeps
/// returning cursors cannot loop forever.
pub const MAX_PAGES: usize = 50;

/// Result of one collection pass. A source error ends the pass early; the
/// items gathered up to that point are still returned.
#[derive(Debug)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub examined: usize,
    pub interrupted: Option<CoreError>,
}

/// Pulls posts for `keyword` page by page, filtering by window and keyword.
pub async fn collect_posts<S: ContentSource>(
    source: &S,
    keyword: &str,
    cutoff: DateTime<Utc>,
    hours: i64,
) -> Collected<MatchItem> {
    let window = TimeWindowFilter::new(cutoff, source.ordering());
    let matcher = KeywordMatcher::new(keyword);
    let mut collected = Collected {
        items: Vec::new(),
        examined: 0,
        interrupted: None,
    };
    let mut after: Option<String> = None;

    info!(
        "Searching posts for '{}' since {}",
        keyword,
        cutoff.format("%Y-%m-%d %H:%M UTC")
    );

    'pages: for _ in 0..MAX_PAGES {
        let page = match source.search_page(keyword, hours, after.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Error searching posts for '{}': {}", keyword, e);
                collected.interrupted = Some(e);
                break;
            }
        };

        for raw in page.items {
            collected.examined += 1;
            match window.decide(raw.created_at) {
                WindowDecision::Keep => {}
                WindowDecision::Skip => continue,
                WindowDecision::Stop => break 'pages,
            }
            if matcher.matches(&raw.title, &raw.body) {
                info!(
                    "  Found post in r/{}: {}",
                    raw.subreddit,
                    preview(&raw.title, 50)
                );
                collected.items.push(MatchItem::post(raw));
            }
        }

        match page.next {
            Some(next) => after = Some(next),
            None => break,
        }
    }

    collected
}

/// Pulls up to `limit` recent comments and keeps those in the window whose
/// body mentions any keyword. Returns the matching comments once each,
/// parent resolved, paired with the keywords they matched.
pub async fn collect_comments<S: CommentSource>(
    source: &S,
    keywords: &[String],
    cutoff: DateTime<Utc>,
    limit: u32,
) -> Collected<(MatchItem, Vec<String>)> {
    let window = TimeWindowFilter::new(cutoff, source.ordering());
    let matchers: Vec<KeywordMatcher> = keywords.iter().map(|k| KeywordMatcher::new(k)).collect();
    let mut collected = Collected {
        items: Vec::new(),
        examined: 0,
        interrupted: None,
    };
    let mut after: Option<String> = None;

    info!("Scanning up to {} recent comments", limit);

    'pages: while (collected.examined as u64) < u64::from(limit) {
        let remaining = limit - collected.examined as u32;
        let page = match source.comments_page(remaining.min(100), after.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                warn!("Error reading comment stream: {}", e);
                collected.interrupted = Some(e);
                break;
            }
        };

        for raw in page.items {
            if collected.examined as u64 >= u64::from(limit) {
                break 'pages;
            }
            collected.examined += 1;
            match window.decide(raw.created_at) {
                WindowDecision::Keep => {}
                WindowDecision::Skip => continue,
                WindowDecision::Stop => break 'pages,
            }

            let hits: Vec<String> = keywords
                .iter()
                .zip(&matchers)
                .filter(|(_, m)| m.matches_text(&raw.body))
                .map(|(k, _)| k.clone())
                .collect();
            if hits.is_empty() {
                continue;
            }

            let parent = resolve_parent(source, &raw).await;
            info!(
                "  Found comment in r/{} on: {}",
                raw.subreddit,
                preview(&parent.title, 50)
            );
            collected.items.push((MatchItem::comment(raw, parent), hits));
        }

        match page.next {
            Some(next) => after = Some(next),
            None => break,
        }
    }

    collected
}

async fn resolve_parent<S: CommentSource>(source: &S, raw: &RawComment) -> ParentPost {
    match source.parent_post(&raw.parent_id).await {
        Ok(parent) => parent,
        Err(e) => {
            warn!("Parent lookup failed for {}: {}", raw.permalink, e);
            ParentPost::unknown()
        }
    }
}

/// Attaches a suggestion and category to every item, one provider call each.
pub async fn enrich<P: CompletionProvider>(set: &mut KeywordResultSet, suggester: &Suggester<'_, P>) {
    let total = set.len();
    let keyword = set.keyword.clone();
    info!("Generating AI suggestions for '{}' ({} items)", keyword, total);

    for (i, item) in set.items_mut().enumerate() {
        info!("  {} {:?} {}/{}...", keyword, item.kind, i + 1, total);
        let (suggestion, category) = suggester.suggest_and_classify(&item.title, &item.body).await;
        item.ai_suggestion = Some(suggestion.text);
        item.category = Some(category);
    }
}

/// Builds one result set per keyword. Comment matches are cloned into every
/// keyword they mention so each set owns its items. A fatal source error
/// (rejected credentials) leaves the remaining sets empty.
pub async fn build_result_sets<S>(
    source: &S,
    keywords: &[String],
    cutoff: DateTime<Utc>,
    hours: i64,
    comment_limit: Option<u32>,
) -> Vec<KeywordResultSet>
where
    S: ContentSource + CommentSource,
{
    let mut sets: Vec<KeywordResultSet> = Vec::with_capacity(keywords.len());
    let mut halted = false;

    for keyword in keywords {
        let mut set = KeywordResultSet::new(keyword.clone());
        if halted {
            sets.push(set);
            continue;
        }
        let posts = collect_posts(source, keyword, cutoff, hours).await;
        if let Some(e) = &posts.interrupted {
            if e.is_fatal() {
                // Every later request would fail the same way.
                e.log_error();
                halted = true;
            } else {
                e.log_warn();
            }
        }
        debug!("Examined {} posts for '{}'", posts.examined, keyword);
        for item in posts.items {
            set.push(item);
        }
        sets.push(set);
    }

    if halted {
        warn!("Skipped remaining searches after a fatal source error");
        return sets;
    }

    if let Some(limit) = comment_limit {
        let comments = collect_comments(source, keywords, cutoff, limit).await;
        if let Some(e) = &comments.interrupted {
            e.log_warn();
        }
        for (item, hits) in comments.items {
            for set in sets.iter_mut().filter(|s| hits.contains(&s.keyword)) {
                set.push(item.clone());
            }
        }
    }

    sets
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}
