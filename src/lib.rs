//! Ordered, asynchronous image carousel.
//!
//! Images are fetched concurrently by a [`Transport`], completions are
//! funnelled back to an [`ImageSequenceController`] which decides what its
//! [`DisplaySink`] shows, no matter in which order the fetches finish.

pub mod constants;
pub mod controller;
pub mod display;
pub mod error;
pub mod fetch;
pub mod image_loader;
pub mod state;
pub mod transport;

pub use controller::{Gate, ImageSequenceController};
pub use display::{DisplaySink, FrameWriter, LatestImage};
pub use error::{FetchError, SourceError};
pub use fetch::{FetchEvent, FetchHandle, FetchListener, HandleId};
pub use state::{FetchState, LoadedImage};
pub use transport::{
    FileTransport, HttpTransport, Reply, RequestId, RequestToken, SchemeTransport, Transport,
};
