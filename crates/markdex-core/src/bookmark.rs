use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{MarkdexError, MarkdexResult};

/// A saved URL as served by the bookmark API.
///
/// Every field other than `title` and `url` may be absent or `null` on the
/// wire; absent values decode to their empty default and are omitted again
/// when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub section: String,
    /// Stable content identifier; the identity of a bookmark across requests.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub hash: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub source_file: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "is_zero")]
    pub line: u32,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "is_zero")]
    pub usage: u32,
}

impl Bookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// First seven characters of the hash (or the whole hash if shorter).
    pub fn short_hash(&self) -> &str {
        match self.hash.char_indices().nth(7) {
            Some((idx, _)) => &self.hash[..idx],
            None => &self.hash,
        }
    }
}

/// Per-user usage counter returned by `POST /api/usage`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub total_usage: u64,
}

/// Body of `POST /api/bookmarks`.
///
/// With `ai` set the server fills in whatever the caller left empty; fields
/// the caller did provide are still sent and the server decides precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateBookmarkRequest {
    pub url: String,
    pub ai: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source_file: String,
}

impl CreateBookmarkRequest {
    pub fn validate(&self) -> MarkdexResult<()> {
        if self.url.trim().is_empty() {
            return Err(MarkdexError::InvalidInput("url required".into()));
        }
        Ok(())
    }
}

/// Join natural-language query words, rejecting a blank query.
pub fn join_query(words: &[String]) -> MarkdexResult<String> {
    let query = words.join(" ");
    if query.trim().is_empty() {
        return Err(MarkdexError::InvalidInput("empty query".into()));
    }
    Ok(query)
}

/// Server-side filter for a bookmark listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl FilterQuery {
    /// Build a filter, dropping empty values.
    pub fn new(search: Option<String>, tag: Option<String>) -> Self {
        Self {
            search: search.filter(|s| !s.is_empty()),
            tag: tag.filter(|t| !t.is_empty()),
        }
    }

    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// True when neither search text nor tag is set. Only unfiltered
    /// listings may be served from or written to the local cache.
    pub fn is_unfiltered(&self) -> bool {
        self.search.is_none() && self.tag.is_none()
    }

    /// Query parameters for `GET /api/bookmarks`.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(q) = &self.search {
            pairs.push(("q", q.as_str()));
        }
        if let Some(t) = &self.tag {
            pairs.push(("tags", t.as_str()));
        }
        pairs
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.search, &self.tag) {
            (None, None) => write!(f, "all"),
            (Some(q), None) => write!(f, "q={q}"),
            (None, Some(t)) => write!(f, "tags={t}"),
            (Some(q), Some(t)) => write!(f, "q={q} tags={t}"),
        }
    }
}

/// Stable sort by case-insensitive title; equal titles keep their order.
pub fn sort_by_title(items: &mut [Bookmark]) {
    items.sort_by_cached_key(|b| b.title.to_lowercase());
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}
