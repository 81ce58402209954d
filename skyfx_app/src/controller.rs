//! Input-driven camera controllers.
//!
//! A controller never touches derived matrices. It feeds events into its own
//! input state and, once per frame, turns that state into target-state
//! requests on a camera via the [`CameraRegistry`] mutators. Exactly one
//! controller drives a given camera at a time.

use skyfx_shared::{
    config::CameraConfig,
    event::AppEventKind,
    math::{clamp, Quat, Vec2, Vec3},
};

use crate::{
    camera::{CameraError, CameraId, CameraRegistry},
    input::{InputState, MouseDrag},
};

/// Common surface of the camera controllers.
pub trait CameraController {
    /// Feeds one input event. Returns true if the controller used it.
    fn process_event(&mut self, kind: &AppEventKind) -> bool;
    /// Forgets held keys, drag state and any tracked anchor.
    fn reset(&mut self);
}

/// Speeds and limits shared by every controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub translation_speed: f32,
    pub rotation_speed: f32,
    pub drag_decay: f32,
    pub pitch_limit: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::from(&CameraConfig::default())
    }
}

impl From<&CameraConfig> for Tuning {
    fn from(cfg: &CameraConfig) -> Self {
        Self {
            translation_speed: cfg.translation_speed,
            rotation_speed: cfg.rotation_speed,
            drag_decay: cfg.drag_decay,
            pitch_limit: cfg.pitch_limit,
        }
    }
}

/// Applies this frame's drag to the camera's target yaw/pitch.
pub fn update_yaw_pitch(
    drag: &mut MouseDrag,
    tuning: &Tuning,
    cameras: &mut CameraRegistry,
    id: CameraId,
    dt: f32,
) -> Result<(), CameraError> {
    let delta = drag.take_delta(dt);
    if delta == Vec2::ZERO {
        return Ok(());
    }
    let target = cameras.target_state(id)?;
    let yaw = target.yaw - delta.x * dt * tuning.rotation_speed;
    let pitch = clamp(
        target.pitch - delta.y * dt * tuning.rotation_speed,
        -tuning.pitch_limit,
        tuning.pitch_limit,
    );
    cameras.set_yaw_pitch(id, yaw, pitch, false)
}

/// Free-fly camera: WASD/arrows move along the view basis, left-drag looks.
#[derive(Debug, Clone, Default)]
pub struct FreeCamera {
    pub tuning: Tuning,
    keys: InputState,
    drag: MouseDrag,
}

impl FreeCamera {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            keys: InputState::new(),
            drag: MouseDrag::new(tuning.drag_decay),
        }
    }

    pub fn process_keyboard(&mut self, kind: &AppEventKind) -> bool {
        self.keys.process_event(kind)
    }

    pub fn process_mouse(&mut self, kind: &AppEventKind) -> bool {
        self.drag.process_event(kind)
    }

    pub fn keys(&self) -> &InputState {
        &self.keys
    }

    pub fn update(&mut self, cameras: &mut CameraRegistry, id: CameraId, dt: f32) -> Result<(), CameraError> {
        let (x, z) = (self.keys.x_dir(), self.keys.z_dir());
        if x != 0.0 || z != 0.0 {
            let camera = cameras.get(id)?;
            let dir = camera.right() * x + camera.at() * z;
            let target = camera.target_state().position + dir * (dt * self.tuning.translation_speed);
            cameras.set_position(id, target, false)?;
        }
        update_yaw_pitch(&mut self.drag, &self.tuning, cameras, id, dt)
    }
}

impl CameraController for FreeCamera {
    fn process_event(&mut self, kind: &AppEventKind) -> bool {
        // Focus loss must reach both halves.
        let used_keys = self.process_keyboard(kind);
        let used_mouse = self.process_mouse(kind);
        used_keys || used_mouse
    }

    fn reset(&mut self) {
        self.keys.clear();
        self.drag = MouseDrag::new(self.tuning.drag_decay);
    }
}

/// First-person camera: position comes from the caller (e.g. a character
/// controller) every frame, left-drag looks.
#[derive(Debug, Clone, Default)]
pub struct FpsCamera {
    pub tuning: Tuning,
    keys: InputState,
    drag: MouseDrag,
}

impl FpsCamera {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            keys: InputState::new(),
            drag: MouseDrag::new(tuning.drag_decay),
        }
    }

    /// Held keys are tracked for the caller's movement code; the camera
    /// itself does not move on them.
    pub fn process_keyboard(&mut self, kind: &AppEventKind) -> bool {
        self.keys.process_event(kind)
    }

    pub fn process_mouse(&mut self, kind: &AppEventKind) -> bool {
        self.drag.process_event(kind)
    }

    pub fn keys(&self) -> &InputState {
        &self.keys
    }

    pub fn update(
        &mut self,
        cameras: &mut CameraRegistry,
        id: CameraId,
        world_position: Vec3,
        dt: f32,
    ) -> Result<(), CameraError> {
        cameras.set_position(id, world_position, true)?;
        update_yaw_pitch(&mut self.drag, &self.tuning, cameras, id, dt)
    }
}

impl CameraController for FpsCamera {
    fn process_event(&mut self, kind: &AppEventKind) -> bool {
        let used_keys = self.process_keyboard(kind);
        let used_mouse = self.process_mouse(kind);
        used_keys || used_mouse
    }

    fn reset(&mut self) {
        self.keys.clear();
        self.drag = MouseDrag::new(self.tuning.drag_decay);
    }
}

/// Third-person camera orbiting a moving target at a fixed distance.
#[derive(Debug, Clone, Default)]
pub struct TpsCamera {
    pub tuning: Tuning,
    keys: InputState,
    drag: MouseDrag,
    last_target: Option<Vec3>,
}

impl TpsCamera {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            keys: InputState::new(),
            drag: MouseDrag::new(tuning.drag_decay),
            last_target: None,
        }
    }

    pub fn process_keyboard(&mut self, kind: &AppEventKind) -> bool {
        self.keys.process_event(kind)
    }

    pub fn process_mouse(&mut self, kind: &AppEventKind) -> bool {
        self.drag.process_event(kind)
    }

    pub fn keys(&self) -> &InputState {
        &self.keys
    }

    /// Direction from the target to the orbit position for a yaw/pitch.
    pub fn orbit_direction(yaw: f32, pitch: f32) -> Vec3 {
        let q = (Quat::from_yaw_pitch_roll(yaw, 0.0, 0.0) * Quat::from_yaw_pitch_roll(0.0, pitch, 0.0)).normalize();
        q.rotate(Vec3::Z)
    }

    /// The camera follows target movement rigidly (the whole blend shifts)
    /// and eases toward orbit changes caused by rotation.
    pub fn update(
        &mut self,
        cameras: &mut CameraRegistry,
        id: CameraId,
        target: Vec3,
        distance: f32,
        dt: f32,
    ) -> Result<(), CameraError> {
        update_yaw_pitch(&mut self.drag, &self.tuning, cameras, id, dt)?;

        let first = match self.last_target {
            Some(last) => {
                let delta = target - last;
                if delta != Vec3::ZERO {
                    cameras.shift_position(id, delta)?;
                }
                false
            }
            None => true,
        };
        self.last_target = Some(target);

        let state = cameras.target_state(id)?;
        let position = target + Self::orbit_direction(state.yaw, state.pitch) * distance;
        cameras.set_position(id, position, first)
    }
}

impl CameraController for TpsCamera {
    fn process_event(&mut self, kind: &AppEventKind) -> bool {
        let used_keys = self.process_keyboard(kind);
        let used_mouse = self.process_mouse(kind);
        used_keys || used_mouse
    }

    fn reset(&mut self) {
        self.keys.clear();
        self.drag = MouseDrag::new(self.tuning.drag_decay);
        self.last_target = None;
    }
}

#[cfg(test)]
mod tests {
    use skyfx_shared::event::{Action, Key, Modifiers, MouseButton};

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (CameraRegistry, CameraId) {
        let mut cameras = CameraRegistry::new();
        let id = cameras.create();
        cameras.set_projection(id, 0.1, 1000.0, 0.5, 800.0, 600.0, true).unwrap();
        cameras.update(DT);
        (cameras, id)
    }

    fn key(key: Key, action: Action) -> AppEventKind {
        AppEventKind::Keyboard {
            key,
            scancode: 0,
            action,
            mods: Modifiers::empty(),
        }
    }

    fn mouse(button: Option<MouseButton>, action: Action, x: f64, y: f64) -> AppEventKind {
        AppEventKind::Mouse {
            button,
            action,
            x,
            y,
            mods: Modifiers::empty(),
        }
    }

    #[test]
    fn free_camera_moves_forward_along_at() {
        let (mut cameras, id) = setup();
        let mut free = FreeCamera::default();
        free.process_event(&key(Key::W, Action::Press));
        free.update(&mut cameras, id, DT).unwrap();

        let target = cameras.target_state(id).unwrap().position;
        let expected = Vec3::new(0.0, 0.0, -DT * 30.0);
        assert!(target.approx_eq(expected, 1e-6), "{target:?}");
        // Smoothed: nothing visible until the next camera update.
        assert_eq!(cameras.position(id).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn free_camera_strafes_and_stops_on_release() {
        let (mut cameras, id) = setup();
        let mut free = FreeCamera::default();
        free.process_event(&key(Key::D, Action::Press));
        free.update(&mut cameras, id, DT).unwrap();
        free.process_event(&key(Key::D, Action::Release));
        let after_press = cameras.target_state(id).unwrap().position;
        assert!(after_press.x > 0.0);

        free.update(&mut cameras, id, DT).unwrap();
        assert_eq!(cameras.target_state(id).unwrap().position, after_press);
    }

    #[test]
    fn drag_right_turns_right() {
        let (mut cameras, id) = setup();
        let mut free = FreeCamera::default();
        free.process_event(&mouse(Some(MouseButton::Left), Action::Press, 0.0, 0.0));
        free.process_event(&mouse(None, Action::Move, 20.0, 0.0));
        free.update(&mut cameras, id, DT).unwrap();

        let yaw = cameras.target_state(id).unwrap().yaw;
        let scale = 0.98f32.powf(DT * 60.0);
        assert!((yaw - (-20.0 * scale * DT * 0.5)).abs() < 1e-6);
        for _ in 0..30 {
            cameras.update(DT);
        }
        // Negative yaw swings the view toward +X.
        assert!(cameras.at(id).unwrap().x > 0.0);
    }

    #[test]
    fn yaw_stops_changing_after_release() {
        let (mut cameras, id) = setup();
        let mut free = FreeCamera::default();
        free.process_event(&mouse(Some(MouseButton::Left), Action::Press, 0.0, 0.0));
        free.process_event(&mouse(None, Action::Move, 10.0, 0.0));
        free.update(&mut cameras, id, DT).unwrap();
        free.process_event(&mouse(Some(MouseButton::Left), Action::Release, 10.0, 0.0));

        let after_drag = cameras.target_state(id).unwrap().yaw;
        assert!(after_drag < 0.0);
        for _ in 0..600 {
            free.update(&mut cameras, id, DT).unwrap();
            cameras.update(DT);
            assert_eq!(cameras.target_state(id).unwrap().yaw, after_drag);
        }
    }

    #[test]
    fn pitch_is_clamped() {
        let (mut cameras, id) = setup();
        let mut free = FreeCamera::default();
        free.process_event(&mouse(Some(MouseButton::Left), Action::Press, 0.0, 0.0));
        free.process_event(&mouse(None, Action::Move, 0.0, -100_000.0));
        free.update(&mut cameras, id, DT).unwrap();
        assert_eq!(cameras.target_state(id).unwrap().pitch, free.tuning.pitch_limit);
    }

    #[test]
    fn fps_camera_forces_position() {
        let (mut cameras, id) = setup();
        let mut fps = FpsCamera::default();
        let body = Vec3::new(1.0, 1.8, -3.0);
        fps.update(&mut cameras, id, body, DT).unwrap();
        assert_eq!(cameras.position(id).unwrap(), body);
    }

    #[test]
    fn tps_camera_orbits_behind_target() {
        let (mut cameras, id) = setup();
        let mut tps = TpsCamera::default();
        let target = Vec3::new(5.0, 0.0, 5.0);
        tps.update(&mut cameras, id, target, 10.0, DT).unwrap();
        cameras.update(DT);

        let pos = cameras.position(id).unwrap();
        assert!(pos.approx_eq(Vec3::new(5.0, 0.0, 15.0), 1e-5), "{pos:?}");
        let look = (target - pos).normalize();
        assert!(cameras.at(id).unwrap().approx_eq(look, 1e-5));
    }

    #[test]
    fn tps_camera_follows_target_without_lag() {
        let (mut cameras, id) = setup();
        let mut tps = TpsCamera::default();
        tps.update(&mut cameras, id, Vec3::ZERO, 4.0, DT).unwrap();
        cameras.update(DT);

        let step = Vec3::new(1.0, 0.0, 0.0);
        tps.update(&mut cameras, id, step, 4.0, DT).unwrap();
        let pos = cameras.position(id).unwrap();
        assert!(pos.approx_eq(Vec3::new(1.0, 0.0, 4.0), 1e-5), "{pos:?}");
    }

    #[test]
    fn orbit_direction_matches_camera_back_axis() {
        let (mut cameras, id) = setup();
        cameras.set_yaw_pitch(id, 0.7, -0.4, true).unwrap();
        cameras.update(DT);
        let back = -cameras.at(id).unwrap();
        assert!(TpsCamera::orbit_direction(0.7, -0.4).approx_eq(back, 1e-5));
    }

    #[test]
    fn reset_forgets_input() {
        let mut free = FreeCamera::default();
        free.process_event(&key(Key::W, Action::Press));
        free.reset();
        assert_eq!(free.keys().z_dir(), 0.0);
    }

    #[test]
    fn invalid_camera_is_reported() {
        let (mut cameras, _) = setup();
        let mut other = CameraRegistry::new();
        other.create();
        let stray = other.create();
        let mut fps = FpsCamera::default();
        assert!(fps.update(&mut cameras, stray, Vec3::ZERO, DT).is_err());
    }
}
