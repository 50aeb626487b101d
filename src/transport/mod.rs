//! The fetch side of the carousel.
//!
//! A [`Transport`] runs requests on whatever concurrency model it likes and
//! reports each result exactly once through the [`Reply`] it was given. The
//! reply may run on any thread; it must not touch controller state directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use url::Url;

use crate::error::FetchError;

mod file;
mod http;

pub use file::FileTransport;
pub use http::HttpTransport;

/// Callback receiving the raw payload of one request.
pub type Reply = Box<dyn FnOnce(Result<Vec<u8>, FetchError>) + Send + 'static>;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Ownership of one in-flight request.
///
/// Clones share the cancellation flag, so a transport keeps a clone on its
/// worker and the fetch handle keeps the original.
#[derive(Debug, Clone)]
pub struct RequestToken {
    id: RequestId,
    cancelled: Arc<AtomicBool>,
}

impl RequestToken {
    pub fn new() -> Self {
        Self {
            id: RequestId(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

impl Default for RequestToken {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Transport: Send + Sync {
    /// Starts fetching `url`. `reply` is invoked at most once; a transport
    /// may skip it for a request whose token has been cancelled.
    fn fetch(&self, url: &Url, token: RequestToken, reply: Reply);

    /// Best-effort cancellation. A reply may still arrive afterwards.
    fn cancel_fetch(&self, token: &RequestToken) {
        token.cancel();
    }
}

/// Routes `http`/`https` urls to an [`HttpTransport`] and `file` urls to a
/// [`FileTransport`].
pub struct SchemeTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl SchemeTransport {
    pub fn new(http: HttpTransport, file: FileTransport) -> Self {
        Self { http, file }
    }
}

impl Transport for SchemeTransport {
    fn fetch(&self, url: &Url, token: RequestToken, reply: Reply) {
        match url.scheme() {
            "http" | "https" => self.http.fetch(url, token, reply),
            "file" => self.file.fetch(url, token, reply),
            other => reply(Err(FetchError::UnsupportedScheme(other.to_string()))),
        }
    }
}
