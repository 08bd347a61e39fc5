//! Hash-prefix lookup over a bookmark listing.

use crate::bookmark::{sort_by_title, Bookmark};
use crate::error::{MarkdexError, MarkdexResult};

pub const MIN_PREFIX_LEN: usize = 3;
const MAX_CANDIDATES: usize = 10;

/// Lowercase and trim a user-supplied hash prefix, rejecting short ones.
pub fn normalize_prefix(prefix: &str) -> MarkdexResult<String> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.chars().count() < MIN_PREFIX_LEN {
        return Err(MarkdexError::InvalidInput(format!(
            "hash prefix must be at least {MIN_PREFIX_LEN} characters"
        )));
    }
    Ok(prefix)
}

/// Find the single bookmark whose hash starts with `prefix` (case-insensitive).
///
/// Bookmarks without a hash never match. Ambiguous matches are reported in
/// title order, capped at ten entries.
pub fn find_by_hash_prefix(items: &[Bookmark], prefix: &str) -> MarkdexResult<Bookmark> {
    let prefix = normalize_prefix(prefix)?;
    if items.is_empty() {
        return Err(MarkdexError::NotFound("no bookmarks".into()));
    }

    let mut matches: Vec<Bookmark> = items
        .iter()
        .filter(|b| !b.hash.is_empty() && b.hash.to_lowercase().starts_with(&prefix))
        .cloned()
        .collect();
    sort_by_title(&mut matches);

    match matches.len() {
        0 => Err(MarkdexError::NotFound(format!(
            "no bookmark with hash prefix {prefix}"
        ))),
        1 => Ok(matches.remove(0)),
        n => {
            let mut candidates: Vec<String> = matches
                .iter()
                .take(MAX_CANDIDATES)
                .map(|m| format!("{}  {}", m.short_hash(), m.title))
                .collect();
            if n > MAX_CANDIDATES {
                candidates.push(format!("... and {} more", n - MAX_CANDIDATES));
            }
            Err(MarkdexError::AmbiguousSelection { prefix, candidates })
        }
    }
}
