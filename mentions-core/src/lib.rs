pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod error_utils;
pub mod matcher;
pub mod pipeline;
pub mod source;
pub mod suggest;
pub mod truncate;
pub mod types;

pub use aggregate::*;
pub use classify::classify;
pub use config::*;
pub use error::*;
pub use error_utils::*;
pub use matcher::*;
pub use source::*;
pub use suggest::*;
pub use truncate::{truncate, DEFAULT_MAX_CHARS};
pub use types::*;
