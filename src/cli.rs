use clap::Parser;
use mentions_core::{CoreError, TrackerSettings};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "reddit-mentions",
    version,
    about = "Find recent Reddit posts mentioning keywords and draft AI replies"
)]
pub struct Args {
    /// Keyword to track (repeatable). Defaults to mariadb and mysql.
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Length of the search window in hours.
    #[arg(long)]
    pub hours: Option<i64>,

    /// Also scan the recent comment stream.
    #[arg(long)]
    pub comments: bool,

    /// Maximum number of recent comments to examine.
    #[arg(long)]
    pub comment_limit: Option<u32>,

    /// Prompts file with exactly one prompt marked "use": true.
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Directory the report is written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Optional TOML settings file; flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn resolve_settings(&self) -> Result<TrackerSettings, CoreError> {
        let mut settings = match &self.config {
            Some(path) => TrackerSettings::load(path)?,
            None => TrackerSettings::default(),
        };

        if !self.keywords.is_empty() {
            settings.keywords = self.keywords.clone();
        }
        if let Some(hours) = self.hours {
            settings.hours = hours;
        }
        if self.comments {
            settings.include_comments = true;
        }
        if let Some(limit) = self.comment_limit {
            settings.comment_limit = limit;
        }
        if let Some(prompts) = &self.prompts {
            settings.prompts_path = prompts.clone();
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "reddit-mentions",
            "-k",
            "postgres",
            "--keyword",
            "sqlite",
            "--hours",
            "6",
            "--comments",
        ]);
        let settings = args.resolve_settings().unwrap();
        assert_eq!(settings.keywords, vec!["postgres", "sqlite"]);
        assert_eq!(settings.hours, 6);
        assert!(settings.include_comments);
        assert_eq!(settings.comment_limit, 1000);
    }

    #[test]
    fn defaults_track_mariadb_and_mysql() {
        let settings = Args::parse_from(["reddit-mentions"]).resolve_settings().unwrap();
        assert_eq!(settings.keywords, vec!["mariadb", "mysql"]);
        assert!(!settings.include_comments);
    }

    #[test]
    fn invalid_window_is_rejected() {
        let args = Args::parse_from(["reddit-mentions", "--hours", "0"]);
        assert!(args.resolve_settings().is_err());
    }
}
