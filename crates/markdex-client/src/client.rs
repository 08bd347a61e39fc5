use std::io::BufReader;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use markdex_core::{
    Bookmark, BookmarkSource, CreateBookmarkRequest, FilterQuery, MarkdexError, MarkdexResult,
    Usage,
};

use crate::decode::{bookmark_list_from_value, decode_object};

/// Upper bound on every request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

pub struct HttpClient {
    base: String,
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(base: &str) -> Self {
        Self::with_timeout(base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base: base.trim_end_matches('/').to_string(),
            agent,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn get(&self, url: &str) -> ureq::Request {
        self.agent.get(url).set("Accept", "application/json")
    }

    fn post_json<T: Serialize>(&self, path: &str, body: &T) -> MarkdexResult<Value> {
        let url = self.endpoint(path);
        debug!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .set("Accept", "application/json")
            .send_json(body)
            .map_err(map_ureq_error)?;
        read_json(response)
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct UsageRequest<'a> {
    hash: &'a str,
    user_id: &'a str,
}

fn map_ureq_error(err: ureq::Error) -> MarkdexError {
    match err {
        ureq::Error::Status(status, _) => MarkdexError::Upstream { status },
        ureq::Error::Transport(t) => MarkdexError::Transport(t.to_string()),
    }
}

/// Parse the body straight off the socket. No size cap, unlike
/// `Response::into_string`.
fn read_json(response: ureq::Response) -> MarkdexResult<Value> {
    serde_json::from_reader(BufReader::new(response.into_reader())).map_err(|e| {
        if e.is_io() {
            MarkdexError::Transport(format!("reading response body: {e}"))
        } else {
            MarkdexError::MalformedResponse(format!("failed to decode response: {e}"))
        }
    })
}

// ---------------------------------------------------------------------------
// BookmarkSource impl
// ---------------------------------------------------------------------------

impl BookmarkSource for HttpClient {
    fn fetch_bookmarks(&self, filter: &FilterQuery) -> MarkdexResult<Vec<Bookmark>> {
        let url = self.endpoint("/api/bookmarks");
        debug!("GET {url} ({filter})");
        let mut request = self.get(&url);
        for (key, value) in filter.query_pairs() {
            request = request.query(key, value);
        }
        let response = request.call().map_err(map_ureq_error)?;
        bookmark_list_from_value(read_json(response)?)
    }

    fn search_ai(&self, query: &str) -> MarkdexResult<Vec<Bookmark>> {
        // Spaces must go out as %20; query() would form-encode them as '+'.
        let url = format!(
            "{}?q={}",
            self.endpoint("/api/ai/search"),
            urlencoding::encode(query)
        );
        debug!("GET {url}");
        let response = self.get(&url).call().map_err(map_ureq_error)?;
        bookmark_list_from_value(read_json(response)?)
    }

    fn create_bookmark(&self, request: &CreateBookmarkRequest) -> MarkdexResult<Bookmark> {
        decode_object(self.post_json("/api/bookmarks", request)?)
    }

    fn record_usage(&self, hash: &str, user_id: &str) -> MarkdexResult<Usage> {
        decode_object(self.post_json("/api/usage", &UsageRequest { hash, user_id })?)
    }
}
