pub mod bookmark;
pub mod error;
pub mod lookup;
pub mod source;

pub use bookmark::{join_query, sort_by_title, Bookmark, CreateBookmarkRequest, FilterQuery, Usage};
pub use error::{MarkdexError, MarkdexResult};
pub use lookup::{find_by_hash_prefix, normalize_prefix};
pub use source::BookmarkSource;
