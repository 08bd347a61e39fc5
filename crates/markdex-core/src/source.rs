use crate::bookmark::{Bookmark, CreateBookmarkRequest, FilterQuery, Usage};
use crate::error::MarkdexResult;

/// The remote bookmark service.
pub trait BookmarkSource {
    // Reads
    fn fetch_bookmarks(&self, filter: &FilterQuery) -> MarkdexResult<Vec<Bookmark>>;
    fn search_ai(&self, query: &str) -> MarkdexResult<Vec<Bookmark>>;

    // Mutations
    fn create_bookmark(&self, request: &CreateBookmarkRequest) -> MarkdexResult<Bookmark>;
    fn record_usage(&self, hash: &str, user_id: &str) -> MarkdexResult<Usage>;
}
