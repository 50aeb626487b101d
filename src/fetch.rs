use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;
use url::Url;

use crate::error::FetchError;
use crate::state::{FetchState, LoadedImage};
use crate::transport::{Reply, RequestId, RequestToken, Transport};

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one slot. Two slots fetching the same url are still distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A finished request, produced on the transport's thread.
#[derive(Debug)]
pub struct FetchEvent {
    pub handle: HandleId,
    pub request: RequestId,
    pub outcome: Result<LoadedImage, FetchError>,
}

/// Anything that wants to hear about completed fetches.
pub trait FetchListener {
    fn on_fetch_completed(&mut self, handle: HandleId, success: bool);
}

/// One remote image: its url, its result and the request fetching it.
///
/// The handle never points back at its owner. Completions are sent to
/// `events`, whose receiver the owner holds; once the owner is gone the
/// sends fail and the completion is dropped.
pub struct FetchHandle {
    id: HandleId,
    url: Url,
    state: FetchState,
    in_flight: Option<RequestToken>,
    transport: Arc<dyn Transport>,
    events: Sender<FetchEvent>,
}

impl FetchHandle {
    pub fn new(url: Url, transport: Arc<dyn Transport>, events: Sender<FetchEvent>) -> Self {
        Self {
            id: HandleId(NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed)),
            url,
            state: FetchState::Pending,
            in_flight: None,
            transport,
            events,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn loaded(&self) -> Option<&Arc<LoadedImage>> {
        self.state.loaded()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn start(&mut self) {
        if self.in_flight.is_some() || !self.state.is_pending() {
            return;
        }

        let token = RequestToken::new();
        let handle = self.id;
        let request = token.id();
        let events = self.events.clone();
        let url = self.url.clone();
        // Runs on the transport's thread, so decoding stays off the display thread
        let reply: Reply = Box::new(move |result| {
            let outcome = result.and_then(|bytes| LoadedImage::decode(url, &bytes));
            if events.send(FetchEvent { handle, request, outcome }).is_err() {
                tracing::trace!(%handle, "listener gone, dropping completion");
            }
        });

        tracing::debug!(handle = %self.id, url = %self.url, "starting fetch");
        self.in_flight = Some(token.clone());
        self.transport.fetch(&self.url, token, reply);
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            tracing::debug!(handle = %self.id, url = %self.url, "cancelling fetch");
            self.transport.cancel_fetch(&token);
        }
    }

    /// Records the outcome of `request`.
    ///
    /// Returns `None` when the request is no longer the one in flight
    /// (cancelled, superseded or already completed), otherwise whether it
    /// succeeded.
    pub(crate) fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<LoadedImage, FetchError>,
    ) -> Option<bool> {
        match &self.in_flight {
            Some(token) if token.id() == request => {}
            _ => {
                tracing::trace!(handle = %self.id, url = %self.url, "ignoring stale completion");
                return None;
            }
        }
        self.in_flight = None;

        match outcome {
            Ok(image) => {
                tracing::debug!(handle = %self.id, url = %self.url, "image loaded");
                self.state = FetchState::Loaded(Arc::new(image));
                Some(true)
            }
            Err(e) => {
                tracing::warn!(handle = %self.id, url = %self.url, error = %e, "image load error");
                self.state = FetchState::Failed;
                Some(false)
            }
        }
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchHandle")
            .field("id", &self.id)
            .field("url", &self.url.as_str())
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.is_some())
            .finish()
    }
}
