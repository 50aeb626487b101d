//! The carousel state machine.
//!
//! [`ImageSequenceController`] owns one [`FetchHandle`] per image, in display
//! order, and decides what the display sink shows as fetches complete and
//! as the caller asks for the next image.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use url::Url;

use crate::display::DisplaySink;
use crate::fetch::{FetchEvent, FetchHandle, FetchListener, HandleId};
use crate::state::LoadedImage;
use crate::transport::Transport;

/// Query deciding whether images may be surfaced yet (the tutorial was shown).
pub type Gate = Box<dyn Fn() -> bool>;

pub struct ImageSequenceController<S: DisplaySink> {
    slots: Vec<FetchHandle>,
    current_index: Option<usize>,
    waiting_for_next: bool,
    gate: Gate,
    transport: Arc<dyn Transport>,
    events_tx: Sender<FetchEvent>,
    events_rx: Receiver<FetchEvent>,
    sink: S,
}

impl<S: DisplaySink> ImageSequenceController<S> {
    pub fn new(
        transport: Arc<dyn Transport>,
        gate: impl Fn() -> bool + 'static,
        sink: S,
    ) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            slots: Vec::new(),
            current_index: None,
            waiting_for_next: false,
            gate: Box::new(gate),
            transport,
            events_tx,
            events_rx,
            sink,
        }
    }

    /// Appends one slot per url and starts fetching each of them.
    pub fn load_identifiers<I>(&mut self, urls: I)
    where
        I: IntoIterator<Item = Url>,
    {
        for url in urls {
            let mut handle = FetchHandle::new(url, self.transport.clone(), self.events_tx.clone());
            handle.start();
            self.slots.push(handle);
        }
        tracing::debug!(slots = self.slots.len(), "identifiers loaded");
    }

    /// Stops every fetch that has not finished. Slots are kept.
    pub fn cancel(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.cancel();
        }
    }

    /// Cancels everything and forgets all slots.
    pub fn close(&mut self) {
        self.cancel();
        self.slots.clear();
        self.current_index = None;
        self.waiting_for_next = false;
    }

    /// Shows the next image, or remembers to show it once it has loaded.
    ///
    /// Past the last slot, or while the gate is closed, the carousel starts
    /// over at the first slot.
    pub fn advance(&mut self) {
        if self.next_index() >= self.slots.len() || !(self.gate)() {
            self.current_index = None;
        }

        if self.slots.is_empty() {
            return;
        }

        let next = self.next_index();
        let Some(image) = self.slots[next].loaded().cloned() else {
            tracing::debug!(slot = next, "next image not loaded yet, waiting");
            self.waiting_for_next = true;
            return;
        };

        self.current_index = Some(next);
        self.show(image);
    }

    /// Applies every completion that has arrived so far. Never blocks.
    pub fn pump(&mut self) -> usize {
        let events: Vec<FetchEvent> = self.events_rx.try_iter().collect();
        let count = events.len();
        for event in events {
            self.dispatch(event);
        }
        count
    }

    /// Like [`pump`](Self::pump), but waits up to `timeout` for the first
    /// completion when none is queued.
    pub fn pump_timeout(&mut self, timeout: Duration) -> usize {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.dispatch(event);
                1 + self.pump()
            }
            Err(_) => 0,
        }
    }

    /// Advances `advances` times, one every `advance_every`, applying
    /// completions in between. An image the last advance is waiting for
    /// gets one more interval to arrive.
    pub fn run(&mut self, advance_every: Duration, advances: usize) {
        let mut next_advance = Instant::now() + advance_every;
        let mut done = 0;
        while done < advances {
            let now = Instant::now();
            if now < next_advance {
                self.pump_timeout(next_advance - now);
                continue;
            }

            // A zero interval never reaches the timed pump above
            self.pump();
            self.advance();
            done += 1;
            next_advance += advance_every;
            if self.waiting_for_next {
                tracing::debug!(advance = done, "next image still loading");
            }
        }

        if self.waiting_for_next {
            self.pump_timeout(advance_every);
        }
    }

    pub fn slots(&self) -> &[FetchHandle] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_waiting_for_next(&self) -> bool {
        self.waiting_for_next
    }

    /// True once every slot has either loaded or failed.
    pub fn is_settled(&self) -> bool {
        self.slots.iter().all(|slot| !slot.state().is_pending())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn next_index(&self) -> usize {
        self.current_index.map_or(0, |i| i + 1)
    }

    fn dispatch(&mut self, event: FetchEvent) {
        let FetchEvent { handle, request, outcome } = event;
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.id() == handle) else {
            tracing::trace!(%handle, "completion for a slot that no longer exists");
            return;
        };
        if let Some(success) = slot.complete(request, outcome) {
            self.on_fetch_completed(handle, success);
        }
    }

    fn show(&mut self, image: Arc<LoadedImage>) {
        tracing::debug!(source = %image.source(), current = ?self.current_index, "displaying image");
        self.sink.show(image);
    }
}

impl<S: DisplaySink> FetchListener for ImageSequenceController<S> {
    fn on_fetch_completed(&mut self, handle: HandleId, success: bool) {
        if !success {
            return;
        }

        if self.slots.is_empty() {
            // Nothing to show yet, show whatever arrives first
            self.waiting_for_next = true;
            return;
        }

        let current = *self.current_index.get_or_insert(0);

        let is_current = self.slots[current].id() == handle;
        let is_awaited = self.waiting_for_next
            && self.slots.get(current + 1).is_some_and(|slot| slot.id() == handle);
        if !is_current && !is_awaited {
            tracing::trace!(%handle, current, "completion is not for the slot of interest");
            return;
        }

        if !(self.gate)() {
            tracing::debug!(%handle, "gate closed, not displaying");
            return;
        }

        // The waiting path previews slot `current + 1` without moving the index
        let slot = if is_current { current } else { current + 1 };
        if let Some(image) = self.slots[slot].loaded().cloned() {
            self.show(image);
        }
    }
}

impl<S: DisplaySink> Drop for ImageSequenceController<S> {
    fn drop(&mut self) {
        self.close();
    }
}
