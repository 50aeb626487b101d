#![allow(dead_code)]

use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use carousel::{
    FetchError, ImageSequenceController, LatestImage, Reply, RequestToken, Transport,
};
use image::{DynamicImage, ImageFormat, RgbaImage};
use url::Url;

struct HeldFetch {
    url: Url,
    reply: Reply,
}

/// Holds every request until the test completes it, in whatever order it likes.
#[derive(Default)]
pub struct ManualTransport {
    held: Mutex<Vec<HeldFetch>>,
    requested: Mutex<Vec<Url>>,
    tokens: Mutex<Vec<RequestToken>>,
}

impl ManualTransport {
    pub fn requested(&self) -> Vec<Url> {
        self.requested.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<RequestToken> {
        self.tokens.lock().unwrap().clone()
    }

    /// Replies to the oldest held request for `url`, even if it was cancelled.
    pub fn reply(&self, url: &Url, result: Result<Vec<u8>, FetchError>) {
        let fetch = {
            let mut held = self.held.lock().unwrap();
            let index = held
                .iter()
                .position(|fetch| &fetch.url == url)
                .unwrap_or_else(|| panic!("no request held for {url}"));
            held.remove(index)
        };
        (fetch.reply)(result);
    }

    pub fn succeed(&self, url: &Url) {
        self.reply(url, Ok(png_for(url)));
    }

    pub fn fail(&self, url: &Url) {
        self.reply(url, Err(FetchError::Status(500)));
    }
}

impl Transport for ManualTransport {
    fn fetch(&self, url: &Url, token: RequestToken, reply: Reply) {
        self.requested.lock().unwrap().push(url.clone());
        self.tokens.lock().unwrap().push(token);
        self.held.lock().unwrap().push(HeldFetch {
            url: url.clone(),
            reply,
        });
    }
}

pub fn url(name: &str) -> Url {
    Url::parse(&format!("https://images.example.com/{name}.png")).unwrap()
}

pub fn urls(names: &[&str]) -> Vec<Url> {
    names.iter().map(|name| url(name)).collect()
}

/// A tiny PNG whose width depends on the url, so images can be told apart.
pub fn png_for(url: &Url) -> Vec<u8> {
    let width = 1 + url.path().len() as u32;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::new(width, 1))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub struct Harness {
    pub transport: Arc<ManualTransport>,
    pub gate: Rc<Cell<bool>>,
    pub carousel: ImageSequenceController<LatestImage>,
}

impl Harness {
    pub fn new(gate_open: bool) -> Self {
        let transport = Arc::new(ManualTransport::default());
        let gate = Rc::new(Cell::new(gate_open));
        let query = gate.clone();
        let carousel =
            ImageSequenceController::new(transport.clone(), move || query.get(), LatestImage::new());
        Self {
            transport,
            gate,
            carousel,
        }
    }

    pub fn with_images(names: &[&str]) -> Self {
        let mut harness = Self::new(true);
        harness.carousel.load_identifiers(urls(names));
        harness
    }

    pub fn succeed(&mut self, name: &str) {
        self.transport.succeed(&url(name));
        self.carousel.pump();
    }

    pub fn fail(&mut self, name: &str) {
        self.transport.fail(&url(name));
        self.carousel.pump();
    }

    /// Url of the image on display, if any.
    pub fn displayed(&self) -> Option<Url> {
        self.carousel
            .sink()
            .current()
            .map(|image| image.source().clone())
    }

    pub fn shown(&self) -> usize {
        self.carousel.sink().shown()
    }
}
