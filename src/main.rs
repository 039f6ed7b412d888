mod cli;

use chrono::{Local, Utc};
use clap::Parser;
use llm_interface::ClaudeProvider;
use mentions_core::pipeline::{build_result_sets, enrich};
use mentions_core::{
    aggregate, load_active_prompt, CoreError, Credentials, ErrorExt, ErrorReporter, Suggester,
    TrackerSettings,
};
use mention_report::{render, report_file_name, write_report, ReportContext};
use reddit_client::RedditClient;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "reddit_mentions=info,mentions_core=info,reddit_client=info,llm_interface=info,mention_report=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = cli::Args::parse();

    let filter = if args.verbose {
        EnvFilter::new(DEFAULT_FILTER.replace("=info", "=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Reddit keyword mention tracker");

    let outcome = tokio::select! {
        result = run(&args) => result,
        _ = tokio::signal::ctrl_c() => Err(CoreError::Cancelled {
            reason: "interrupted".to_string(),
        }),
    };

    match outcome {
        Ok(path) => {
            tracing::info!("Report written to {}", path.display());
            Ok(())
        }
        Err(e) => {
            ErrorReporter::new().report_error(&e);
            Err(anyhow::anyhow!("[{}] {}", e.error_code(), e.user_friendly_message()))
        }
    }
}

async fn run(args: &cli::Args) -> Result<PathBuf, CoreError> {
    // Everything that can fail on configuration happens before any network call.
    let settings: TrackerSettings = args.resolve_settings()?;
    let credentials = Credentials::from_env()?;
    let prompt = load_active_prompt(&settings.prompts_path)?;

    tracing::info!("Initializing Reddit API client...");
    let reddit = RedditClient::new(&credentials.reddit)?;
    reddit.authenticate().await?;

    tracing::info!("Initializing Anthropic API client...");
    let claude = ClaudeProvider::new(
        credentials.anthropic.api_key.clone(),
        settings.model.clone(),
        settings.completion_timeout(),
    )?
    .with_max_tokens(settings.max_tokens);

    let generated_at = Utc::now();
    let cutoff = settings.cutoff(generated_at)?;
    let comment_limit = settings.include_comments.then_some(settings.comment_limit);
    let mut sets = build_result_sets(
        &reddit,
        &settings.keywords,
        cutoff,
        settings.hours,
        comment_limit,
    )
    .await;

    let suggester = Suggester::new(&claude, &prompt).with_timeout(settings.completion_timeout());
    for set in sets.iter_mut() {
        enrich(set, &suggester).await;
    }

    let summary = aggregate(&mut sets);
    let report = render(
        &sets,
        &summary,
        &ReportContext {
            title: &settings.report_title,
            display_names: &settings.display_names,
            generated_at,
            hours: settings.hours,
            prompt: &prompt,
            include_comments: settings.include_comments,
            max_body_chars: settings.max_body_chars,
        },
    );

    let path = write_report(
        &settings.output_dir,
        &report_file_name(Local::now()),
        &report,
    )?;

    for s in &summary.summaries {
        if settings.include_comments {
            tracing::info!("  {}: {} posts, {} comments", s.keyword, s.post_count, s.comment_count);
        } else {
            tracing::info!("  {}: {} posts", s.keyword, s.post_count);
        }
    }
    let metrics = reddit.get_api_metrics().await;
    tracing::info!("{}", metrics.summary());
    match reddit.export_api_metrics().await {
        Ok(json) => tracing::debug!("Reddit API metrics:\n{}", json),
        Err(e) => {
            e.log_warn();
        }
    }
    if metrics.failed_requests > 0 {
        CoreError::Internal {
            message: format!("{} Reddit requests failed during this run", metrics.failed_requests),
        }
        .log_warn();
    }

    Ok(path)
}
