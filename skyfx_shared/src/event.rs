//! Application events and the pending-event queue.
//!
//! Window/input callbacks may run on a thread other than the frame loop, so
//! they push into an [`EventQueue`] through a cloneable [`EventSender`]. Once
//! per frame the main thread swaps the pending buffer out under the lock and
//! dispatches outside it. The lock is never held across dispatch.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use serde::{Deserialize, Serialize};

/// Keyboard keys the framework understands. Anything else keeps its raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Enter,
    Other(i32),
}

impl Key {
    /// Parses a key name as used by the demo console (`"w"`, `"left"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "w" => Key::W,
            "a" => Key::A,
            "s" => Key::S,
            "d" => Key::D,
            "q" => Key::Q,
            "e" => Key::E,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "space" => Key::Space,
            "escape" | "esc" => Key::Escape,
            "enter" => Key::Enter,
            other => return other.parse().ok().map(Key::Other),
        };
        Some(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// What happened to a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Release,
    Press,
    Repeat,
    /// Cursor movement with no button transition.
    Move,
}

bitflags::bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Event payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AppEventKind {
    Start,
    Stop,
    Keyboard {
        key: Key,
        scancode: i32,
        action: Action,
        mods: Modifiers,
    },
    /// Cursor movement or button transition, always carrying the cursor
    /// position.
    Mouse {
        button: Option<MouseButton>,
        action: Action,
        x: f64,
        y: f64,
        mods: Modifiers,
    },
    FocusOn,
    FocusOff,
    FramebufferSize {
        width: u32,
        height: u32,
    },
    WindowSize {
        width: u32,
        height: u32,
    },
    WindowPosition {
        x: i32,
        y: i32,
    },
    Paint,
    /// Superseded by `Mouse` with `Action::Move`.
    CursorPos {
        x: f64,
        y: f64,
    },
    /// Superseded by `Mouse` with a button. Carries no position.
    MouseButton {
        button: MouseButton,
        action: Action,
        mods: Modifiers,
    },
}

/// A stamped event. `timestamp` is microseconds since the queue was
/// created and strictly increases in push order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppEvent {
    pub timestamp: u64,
    pub kind: AppEventKind,
}

#[derive(Default)]
struct Pending {
    events: Vec<AppEvent>,
    last_timestamp: Option<u64>,
}

/// Pending-event buffer shared between producers and the frame loop.
pub struct EventQueue {
    epoch: Instant,
    pending: Mutex<Pending>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            epoch: Instant::now(),
            pending: Mutex::new(Pending {
                events: Vec::with_capacity(capacity),
                last_timestamp: None,
            }),
        }
    }

    /// Producers never observe a half-written buffer, so a panic while the
    /// lock was held leaves nothing to repair.
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamps and appends an event. Returns the timestamp assigned.
    pub fn push(&self, kind: AppEventKind) -> u64 {
        let now = self.epoch.elapsed().as_micros() as u64;
        let mut pending = self.lock();
        let timestamp = match pending.last_timestamp {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        pending.last_timestamp = Some(timestamp);
        pending.events.push(AppEvent { timestamp, kind });
        timestamp
    }

    /// Moves every pending event into `out` in push order.
    ///
    /// `out` is cleared first and its allocation is handed back to the
    /// producers, so steady-state frames do not allocate.
    pub fn drain_into(&self, out: &mut Vec<AppEvent>) {
        out.clear();
        let mut pending = self.lock();
        std::mem::swap(&mut pending.events, out);
    }

    /// Number of events waiting for the next drain.
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cloneable producer handle for window/input callbacks.
#[derive(Clone, Default)]
pub struct EventSender {
    queue: Arc<EventQueue>,
}

impl EventSender {
    pub fn new(queue: Arc<EventQueue>) -> Self {
        Self { queue }
    }

    pub fn push(&self, kind: AppEventKind) -> u64 {
        self.queue.push(kind)
    }

    pub fn key(&self, key: Key, action: Action) -> u64 {
        self.push(AppEventKind::Keyboard {
            key,
            scancode: 0,
            action,
            mods: Modifiers::empty(),
        })
    }

    pub fn mouse(&self, button: Option<MouseButton>, action: Action, x: f64, y: f64) -> u64 {
        self.push(AppEventKind::Mouse {
            button,
            action,
            x,
            y,
            mods: Modifiers::empty(),
        })
    }

    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }
}
