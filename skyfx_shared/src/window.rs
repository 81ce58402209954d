//! Windowing abstraction.
//!
//! A window backend owns the native window and graphics context and turns
//! native callbacks into [`AppEventKind`]s pushed through an
//! [`EventSender`]. Context operations are thread-affine and only ever called
//! from the frame loop.

use std::collections::VecDeque;

use crate::event::{AppEventKind, EventSender};

pub trait WindowBackend {
    /// Pumps native events, pushing anything relevant into `sender`.
    fn poll_events(&mut self, sender: &EventSender);
    fn make_current(&mut self);
    fn swap_buffers(&mut self);
    fn is_visible(&self) -> bool;
    /// The user asked to close the window.
    fn should_close(&self) -> bool;
}

/// Window stand-in that replays a scripted batch of events per poll.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    script: VecDeque<Vec<AppEventKind>>,
    visible: bool,
    close_when_done: bool,
    polls: u64,
    swaps: u64,
}

impl HeadlessWindow {
    /// A visible window with no scripted input.
    pub fn new() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    /// Each inner `Vec` is delivered by one `poll_events` call.
    pub fn scripted(batches: impl IntoIterator<Item = Vec<AppEventKind>>) -> Self {
        Self {
            script: batches.into_iter().collect(),
            visible: true,
            ..Self::default()
        }
    }

    /// Requests close once the script has been fully delivered.
    pub fn close_when_done(mut self) -> Self {
        self.close_when_done = true;
        self
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn push_batch(&mut self, batch: Vec<AppEventKind>) {
        self.script.push_back(batch);
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }
}

impl WindowBackend for HeadlessWindow {
    fn poll_events(&mut self, sender: &EventSender) {
        self.polls += 1;
        if let Some(batch) = self.script.pop_front() {
            for kind in batch {
                sender.push(kind);
            }
        }
    }

    fn make_current(&mut self) {}

    fn swap_buffers(&mut self) {
        self.swaps += 1;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn should_close(&self) -> bool {
        self.close_when_done && self.script.is_empty()
    }
}
