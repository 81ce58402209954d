//! Input handling.
//!
//! Turns discrete keyboard/mouse events into per-frame intent: which movement
//! keys are held right now, and how far the mouse was dragged since the last
//! frame.

use std::collections::HashSet;

use skyfx_shared::{
    event::{Action, AppEventKind, Key, MouseButton},
    math::Vec2,
};

/// Keys currently held down.
///
/// Direction is derived by membership each frame, so a lost key-up can only
/// leave a key stuck until focus is lost, never accumulate drift.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a keyboard or focus event. Returns true if the event was used.
    pub fn process_event(&mut self, kind: &AppEventKind) -> bool {
        match *kind {
            AppEventKind::Keyboard { key, action, .. } => {
                match action {
                    Action::Press | Action::Repeat => {
                        self.held.insert(key);
                    }
                    Action::Release => {
                        self.held.remove(&key);
                    }
                    Action::Move => return false,
                }
                true
            }
            AppEventKind::FocusOff => {
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    fn axis(&self, positive: [Key; 2], negative: [Key; 2]) -> f32 {
        let pos = positive.iter().any(|k| self.is_held(*k));
        let neg = negative.iter().any(|k| self.is_held(*k));
        match (pos, neg) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// Strafe intent: +1 right (D/Right), -1 left (A/Left).
    pub fn x_dir(&self) -> f32 {
        self.axis([Key::D, Key::Right], [Key::A, Key::Left])
    }

    /// Forward intent: +1 forward (W/Up), -1 back (S/Down).
    pub fn z_dir(&self) -> f32 {
        self.axis([Key::W, Key::Up], [Key::S, Key::Down])
    }
}

/// Left-button mouse drag tracking.
///
/// Movement is scaled by a velocity that restarts at 1 on every press and
/// decays once per frame. Nothing is produced after release beyond the
/// movement still pending from before it.
#[derive(Debug, Clone)]
pub struct MouseDrag {
    dragging: bool,
    last: Vec2,
    delta: Vec2,
    velocity: f32,
    decay: f32,
}

impl Default for MouseDrag {
    fn default() -> Self {
        Self::new(0.98)
    }
}

impl MouseDrag {
    /// `decay` is the velocity fraction kept per 1/60 s.
    pub fn new(decay: f32) -> Self {
        Self {
            dragging: false,
            last: Vec2::ZERO,
            delta: Vec2::ZERO,
            velocity: 0.0,
            decay,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Applies a mouse event. Returns true if the event was used.
    pub fn process_event(&mut self, kind: &AppEventKind) -> bool {
        match *kind {
            AppEventKind::Mouse {
                button, action, x, y, ..
            } => {
                let pos = Vec2::new(x as f32, y as f32);
                match (button, action) {
                    (Some(MouseButton::Left), Action::Press) => {
                        self.dragging = true;
                        self.velocity = 1.0;
                        self.last = pos;
                        self.delta = Vec2::ZERO;
                    }
                    (Some(MouseButton::Left), Action::Release) => {
                        self.move_to(pos);
                        self.dragging = false;
                    }
                    (_, Action::Move) => self.move_to(pos),
                    _ => return false,
                }
                true
            }
            AppEventKind::CursorPos { x, y } => {
                self.move_to(Vec2::new(x as f32, y as f32));
                true
            }
            AppEventKind::MouseButton {
                button: MouseButton::Left,
                action,
                ..
            } => {
                match action {
                    Action::Press => {
                        self.dragging = true;
                        self.velocity = 1.0;
                        self.delta = Vec2::ZERO;
                    }
                    Action::Release => self.dragging = false,
                    _ => return false,
                }
                true
            }
            AppEventKind::FocusOff => {
                self.dragging = false;
                self.velocity = 0.0;
                self.delta = Vec2::ZERO;
                true
            }
            _ => false,
        }
    }

    fn move_to(&mut self, pos: Vec2) {
        if self.dragging {
            self.delta += pos - self.last;
        }
        self.last = pos;
    }

    /// Screen-space movement to apply this frame, scaled by drag velocity.
    ///
    /// Each accumulated delta is returned once. The velocity decays by
    /// `decay` per 1/60 s whether or not the button is held.
    pub fn take_delta(&mut self, dt: f32) -> Vec2 {
        let delta = std::mem::take(&mut self.delta);
        self.velocity *= self.decay.powf(dt * 60.0);
        if self.velocity < 1e-3 {
            self.velocity = 0.0;
        }
        delta * self.velocity
    }
}
