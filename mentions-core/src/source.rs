//! Capabilities the pipeline consumes. Implementations are constructed by
//! the caller and passed in, so tests can substitute in-memory fakes.

use crate::error::CoreError;
use crate::matcher::SourceOrdering;
use crate::types::{Page, ParentPost, RawComment, RawItem};

pub trait ContentSource {
    fn ordering(&self) -> SourceOrdering;

    /// Fetches one page of posts matching `keyword`, newest first when
    /// `ordering` says so. `hours` is a hint for server-side windowing.
    async fn search_page(
        &self,
        keyword: &str,
        hours: i64,
        after: Option<&str>,
    ) -> Result<Page<RawItem>, CoreError>;
}

pub trait CommentSource {
    fn ordering(&self) -> SourceOrdering;

    async fn comments_page(
        &self,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Page<RawComment>, CoreError>;

    async fn parent_post(&self, parent_id: &str) -> Result<ParentPost, CoreError>;
}

pub trait CompletionProvider {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, CoreError>;
}
