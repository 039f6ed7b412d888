use chrono::{DateTime, TimeZone};
use mentions_core::CoreError;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn report_file_name<Tz>(at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{}.md", at.format("%Y-%m-%d_%H%M"))
}

/// Writes the report into `dir` (created if missing) via a temporary file
/// that is renamed into place, so the directory never holds a partial report.
pub fn write_report(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, CoreError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(content.as_bytes())?;
    staged.as_file().sync_all()?;
    staged.persist(&target).map_err(|e| CoreError::Io(e.error))?;

    info!("Results saved to: {}", target.display());
    Ok(target)
}
