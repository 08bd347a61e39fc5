//! Cache-coherent access to the remote bookmark service.
//!
//! Unfiltered listings are served from the disk cache while it is fresh and
//! refresh it after every network fetch. Filtered listings and AI searches
//! always go to the network and never touch the cache. Creating a bookmark
//! drops the cache so the next listing sees the new entry.

use tracing::{debug, warn};

use markdex_core::{
    sort_by_title, Bookmark, BookmarkSource, CreateBookmarkRequest, FilterQuery, MarkdexResult,
};

use crate::cache::DiskCache;

pub struct Library<'a> {
    source: &'a dyn BookmarkSource,
    cache: &'a DiskCache,
}

impl<'a> Library<'a> {
    pub fn new(source: &'a dyn BookmarkSource, cache: &'a DiskCache) -> Self {
        Self { source, cache }
    }

    /// List bookmarks sorted by case-insensitive title.
    pub fn list(&self, filter: &FilterQuery, no_cache: bool) -> MarkdexResult<Vec<Bookmark>> {
        let unfiltered = filter.is_unfiltered();

        if unfiltered && !no_cache {
            if let Some(items) = self.cache.read() {
                debug!("cache hit ({} bookmarks)", items.len());
                return Ok(items);
            }
            debug!("cache miss");
        }

        let mut items = self.source.fetch_bookmarks(filter)?;
        sort_by_title(&mut items);

        if unfiltered {
            self.cache.write(&items);
        }
        Ok(items)
    }

    /// AI search, sorted by title. Never cached.
    pub fn search_ai(&self, query: &str) -> MarkdexResult<Vec<Bookmark>> {
        let mut items = self.source.search_ai(query)?;
        sort_by_title(&mut items);
        Ok(items)
    }

    /// Create a bookmark remotely and drop the cached listing.
    pub fn create(&self, request: &CreateBookmarkRequest) -> MarkdexResult<Bookmark> {
        let created = self.source.create_bookmark(request)?;
        self.cache.invalidate();
        Ok(created)
    }

    /// Bump the usage counter for `bookmark`, ignoring any failure.
    pub fn record_usage(&self, bookmark: &Bookmark, user_id: &str) {
        if bookmark.hash.is_empty() {
            return;
        }
        match self.source.record_usage(&bookmark.hash, user_id) {
            Ok(usage) => debug!(
                "usage for {}: {} (total {})",
                usage.hash, usage.usage, usage.total_usage
            ),
            Err(e) => warn!("recording usage for {} failed: {e}", bookmark.short_hash()),
        }
    }
}
