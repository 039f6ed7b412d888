pub mod markdown;
pub mod output;

pub use markdown::{render, ReportContext};
pub use output::{report_file_name, write_report};
