use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use mentions_core::{
    truncate, ActivePrompt, Aggregate, CategoryCount, ItemKind, KeywordResultSet, MatchItem,
};

/// Everything the report needs besides the result sets themselves.
pub struct ReportContext<'a> {
    pub title: &'a str,
    /// Keyword -> heading name, e.g. `mysql` -> `MySQL`.
    pub display_names: &'a BTreeMap<String, String>,
    pub generated_at: DateTime<Utc>,
    pub hours: i64,
    pub prompt: &'a ActivePrompt,
    pub include_comments: bool,
    pub max_body_chars: usize,
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

pub fn format_category_counts(counts: &[CategoryCount]) -> String {
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|c| format!("{} {}", c.count, c.category))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_body_as_blockquote(body: &str) -> String {
    body.split('\n')
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display name for a keyword. A configured name wins; otherwise the first
/// letter is capitalised (`mariadb` -> `Mariadb`).
fn display_keyword(keyword: &str, names: &BTreeMap<String, String>) -> String {
    if let Some(name) = names.get(keyword) {
        return name.clone();
    }
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn plural(count: usize, singular: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}s", count, singular)
    }
}

/// Renders result sets that have already been aggregated (and therefore
/// sorted newest first) into the markdown report.
pub fn render(sets: &[KeywordResultSet], aggregate: &Aggregate, ctx: &ReportContext<'_>) -> String {
    let mut lines: Vec<String> = vec![
        format!("# {}", ctx.title),
        String::new(),
        format!(
            "*Generated: {} | Last {} hours*",
            format_timestamp(ctx.generated_at),
            ctx.hours
        ),
        String::new(),
    ];

    for summary in &aggregate.summaries {
        let name = display_keyword(&summary.keyword, ctx.display_names);
        if ctx.include_comments {
            lines.push(format!(
                "* **{}:** {}, {}",
                name,
                plural(summary.post_count, "post"),
                plural(summary.comment_count, "comment")
            ));
            lines.push(format!(
                "  * Posts: {}",
                format_category_counts(&summary.post_categories)
            ));
            lines.push(format!(
                "  * Comments: {}",
                format_category_counts(&summary.comment_categories)
            ));
        } else {
            lines.push(format!("* **{}:** {}", name, plural(summary.post_count, "post")));
            lines.push(format!(
                "  * {}",
                format_category_counts(&summary.post_categories)
            ));
        }
    }

    if sets.len() > 1 {
        let names: Vec<String> = sets
            .iter()
            .map(|s| display_keyword(&s.keyword, ctx.display_names))
            .collect();
        let mut both = plural(aggregate.common_posts.len(), "post");
        if ctx.include_comments {
            both = format!(
                "{}, {}",
                both,
                plural(aggregate.common_comments.len(), "comment")
            );
        }
        lines.push(format!("* **All of {}:** {}", names.join(" and "), both));
    }

    lines.extend([
        String::new(),
        format!("**AI prompt ({}):** {}", ctx.prompt.name, ctx.prompt.text),
        String::new(),
        "---".to_string(),
        String::new(),
    ]);

    for (index, set) in sets.iter().enumerate() {
        if index > 0 {
            lines.push("---".to_string());
            lines.push(String::new());
        }
        render_section(&mut lines, set, ItemKind::Post, ctx);
        if ctx.include_comments {
            render_section(&mut lines, set, ItemKind::Comment, ctx);
        }
    }

    lines.join("\n")
}

fn render_section(
    lines: &mut Vec<String>,
    set: &KeywordResultSet,
    kind: ItemKind,
    ctx: &ReportContext<'_>,
) {
    let (heading, empty) = match kind {
        ItemKind::Post => ("Posts", "*No posts found.*"),
        ItemKind::Comment => ("Comments", "*No comments found.*"),
    };
    lines.push(format!(
        "## {}: {}",
        display_keyword(&set.keyword, ctx.display_names),
        heading
    ));
    lines.push(String::new());

    let items = set.items(kind);
    if items.is_empty() {
        lines.push(empty.to_string());
        lines.push(String::new());
        return;
    }

    for item in items {
        render_item(lines, item, ctx);
    }
}

fn render_item(lines: &mut Vec<String>, item: &MatchItem, ctx: &ReportContext<'_>) {
    let subreddit = format!(
        "[r/{0}](https://reddit.com/r/{0})",
        item.subreddit
    );
    match (&item.kind, &item.parent_url) {
        (ItemKind::Comment, Some(parent_url)) => {
            lines.push(format!(
                "### {} – [Comment]({}) on [{}]({})",
                subreddit, item.url, item.title, parent_url
            ));
        }
        _ => {
            lines.push(format!("### {} – [{}]({})", subreddit, item.title, item.url));
        }
    }
    lines.push(format_timestamp(item.created_at));
    lines.push(String::new());

    if !item.body.is_empty() {
        let body = truncate(&item.body, &item.url, ctx.max_body_chars);
        lines.push(format_body_as_blockquote(&body));
        lines.push(String::new());
    }

    lines.push(format!(
        "**AI suggested comment:** {}",
        item.ai_suggestion.as_deref().unwrap_or_default()
    ));
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mentions_core::{aggregate, Category, ParentPost, RawComment, RawItem};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn enriched_post(id: &str, title: &str, body: &str, secs: i64, category: Category) -> MatchItem {
        let mut item = MatchItem::post(RawItem {
            title: title.to_string(),
            body: body.to_string(),
            permalink: format!("https://reddit.com/r/mysql/comments/{id}"),
            subreddit: "mysql".to_string(),
            created_at: at(secs),
        });
        item.ai_suggestion = Some(format!("{}\nSuggested reply", category));
        item.category = Some(category);
        item
    }

    fn prompt() -> ActivePrompt {
        ActivePrompt {
            name: "support".to_string(),
            text: "Categorize and reply.".to_string(),
        }
    }

    static NO_NAMES: BTreeMap<String, String> = BTreeMap::new();

    fn ctx(prompt: &ActivePrompt, include_comments: bool) -> ReportContext<'_> {
        ReportContext {
            title: "Reddit Keyword Mentions",
            display_names: &NO_NAMES,
            generated_at: at(100),
            hours: 24,
            prompt,
            include_comments,
            max_body_chars: 1500,
        }
    }

    #[test]
    fn renders_summary_and_sections() {
        let mut mariadb = KeywordResultSet::new("mariadb");
        let mut mysql = KeywordResultSet::new("mysql");
        let shared = enriched_post("both", "MariaDB or MySQL?", "Line one\nLine two", 10, Category::GeneralDiscussion);
        mariadb.push(shared.clone());
        mysql.push(shared);
        mysql.push(enriched_post("new", "mysql crash", "", 20, Category::BugReport));
        let mut sets = vec![mariadb, mysql];
        let agg = aggregate(&mut sets);
        let prompt = prompt();

        let report = render(&sets, &agg, &ctx(&prompt, false));

        assert!(report.starts_with("# Reddit Keyword Mentions\n\n*Generated: 2023-11-14 22:15 UTC | Last 24 hours*"));
        assert!(report.contains("* **Mariadb:** 1 post\n  * 1 General Discussion"));
        assert!(report.contains("* **Mysql:** 2 posts\n  * 1 Bug Report, 1 General Discussion"));
        assert!(report.contains("* **All of Mariadb and Mysql:** 1 post"));
        assert!(report.contains("**AI prompt (support):** Categorize and reply."));
        assert!(report.contains(
            "### [r/mysql](https://reddit.com/r/mysql) – [MariaDB or MySQL?](https://reddit.com/r/mysql/comments/both)"
        ));
        assert!(report.contains("> Line one\n> Line two"));
        assert!(report.contains("**AI suggested comment:** Bug Report\nSuggested reply"));
        assert!(!report.contains("## Mariadb: Comments"));

        let newest = report.find("mysql crash").unwrap();
        let older = report.rfind("MariaDB or MySQL?").unwrap();
        assert!(newest < older);
    }

    #[test]
    fn empty_sections_and_comment_mode() {
        let mut set = KeywordResultSet::new("mysql");
        let mut comment = MatchItem::comment(
            RawComment {
                body: "use mysqldump".to_string(),
                permalink: "https://reddit.com/r/mysql/comments/p1/t/c1".to_string(),
                subreddit: "mysql".to_string(),
                created_at: at(5),
                parent_id: "t3_p1".to_string(),
            },
            ParentPost {
                title: "Backups?".to_string(),
                url: "https://reddit.com/r/mysql/comments/p1".to_string(),
            },
        );
        comment.ai_suggestion = Some("Technical Support\nTry it".to_string());
        comment.category = Some(Category::TechnicalSupport);
        set.push(comment);
        let mut sets = vec![set];
        let agg = aggregate(&mut sets);
        let prompt = prompt();

        let report = render(&sets, &agg, &ctx(&prompt, true));
        assert!(report.contains("* **Mysql:** 0 posts, 1 comment"));
        assert!(report.contains("  * Posts: none\n  * Comments: 1 Technical Support"));
        assert!(report.contains("## Mysql: Posts\n\n*No posts found.*"));
        assert!(report.contains(
            "– [Comment](https://reddit.com/r/mysql/comments/p1/t/c1) on [Backups?](https://reddit.com/r/mysql/comments/p1)"
        ));
        assert!(!report.contains("All of"));
    }

    #[test]
    fn long_bodies_are_truncated_with_link() {
        let mut set = KeywordResultSet::new("mysql");
        set.push(enriched_post("long", "mysql", &"a".repeat(2000), 1, Category::Other));
        let mut sets = vec![set];
        let agg = aggregate(&mut sets);
        let prompt = prompt();

        let report = render(&sets, &agg, &ctx(&prompt, false));
        assert!(report.contains(&format!("> {}\n> \n> *[... Click to read whole post/comment](https://reddit.com/r/mysql/comments/long)*", "a".repeat(1500))));
    }

    #[test]
    fn category_counts_format() {
        assert_eq!(format_category_counts(&[]), "none");
        let counts = vec![
            CategoryCount { category: Category::Spam, count: 3 },
            CategoryCount { category: Category::Other, count: 1 },
        ];
        assert_eq!(format_category_counts(&counts), "3 Spam, 1 Other");
    }

    #[test]
    fn configured_names_and_title_are_used() {
        let mut mariadb = KeywordResultSet::new("mariadb");
        let mut mysql = KeywordResultSet::new("mysql");
        let shared = enriched_post("both", "MariaDB or MySQL?", "", 10, Category::Other);
        mariadb.push(shared.clone());
        mysql.push(shared);
        let mut sets = vec![mariadb, mysql];
        let agg = aggregate(&mut sets);
        let prompt = prompt();
        let names: BTreeMap<String, String> = [("mariadb", "MariaDB"), ("mysql", "MySQL")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut context = ctx(&prompt, false);
        context.title = "Reddit Database Mentions";
        context.display_names = &names;
        let report = render(&sets, &agg, &context);

        assert!(report.starts_with("# Reddit Database Mentions\n"));
        assert!(report.contains("* **MariaDB:** 1 post"));
        assert!(report.contains("* **All of MariaDB and MySQL:** 1 post"));
        assert!(report.contains("## MySQL: Posts"));
        assert!(!report.contains("Mysql"));
    }
}
