//! Cameras with smoothed state transitions.
//!
//! Every interpolated attribute (near, far, fov, width, height, position,
//! yaw, pitch) is an independent [`Blend`]: the value requested most
//! recently (`next`), the value that was on screen when that request was made
//! (`previous`), and the blended value actually used to build matrices
//! (`current`). Each has its own timer, so a resize does not restart an
//! in-flight position blend.
//!
//! Projection parameters blend linearly over one second. Position, yaw and
//! pitch advance their timers through a speed ramp: the speed jumps to
//! [`BLEND_ACCELERATION`] on every frame the attribute is still moving and
//! decays by [`BLEND_DECAY`] per second afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use skyfx_shared::{
    math::{sat, Mat4, Quat, Vec3},
    render::CameraMatrices,
};
use tracing::{debug, trace};

/// Speed a moving attribute's blend timer is driven at, per second.
pub const BLEND_ACCELERATION: f32 = 6.0;
/// Speed lost per second once an attribute stops moving.
pub const BLEND_DECAY: f32 = 12.0;

/// Snapshot of every interpolated camera attribute.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraState {
    pub near: f32,
    pub far: f32,
    pub fov: f32,
    pub width: f32,
    pub height: f32,
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraState {
    /// Whether the projection parameters describe an invertible frustum.
    pub fn has_valid_projection(&self) -> bool {
        self.near > 0.0
            && self.far > self.near
            && self.fov.sin().abs() > f32::EPSILON
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Types a [`Blend`] can interpolate.
pub trait Lerp: Copy + PartialEq {
    fn lerpsat(a: Self, b: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerpsat(a: Self, b: Self, t: f32) -> Self {
        skyfx_shared::math::lerpsat(a, b, t)
    }
}

impl Lerp for Vec3 {
    fn lerpsat(a: Self, b: Self, t: f32) -> Self {
        a.lerpsat(b, t)
    }
}

/// One interpolated attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend<T> {
    previous: T,
    current: T,
    next: T,
    time: f32,
}

impl<T: Lerp> Blend<T> {
    /// A blend resting at `value`.
    pub fn settled(value: T) -> Self {
        Self {
            previous: value,
            current: value,
            next: value,
            time: 1.0,
        }
    }

    pub fn previous(&self) -> T {
        self.previous
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn next(&self) -> T {
        self.next
    }

    /// Normalized progress in `[0, 1]`.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_moving(&self) -> bool {
        self.current != self.next
    }

    /// Requests a new target. Returns false when nothing changed: an
    /// unforced request for the current target leaves any blend in progress
    /// alone. A forced request always ends up settled at `value`.
    pub fn retarget(&mut self, value: T, force: bool) -> bool {
        if value == self.next && (!force || self.current == self.next) {
            return false;
        }
        if force {
            *self = Self::settled(value);
        } else {
            self.previous = self.current;
            self.next = value;
            self.time = 0.0;
        }
        true
    }

    /// Advances the timer by `step` and recomputes `current`.
    fn advance(&mut self, step: f32) {
        self.time = sat(self.time + step);
        self.current = T::lerpsat(self.previous, self.next, self.time);
    }

    fn map(&mut self, f: impl Fn(T) -> T) {
        self.previous = f(self.previous);
        self.current = f(self.current);
        self.next = f(self.next);
    }
}

/// Eases a blend timer in and out.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SpeedRamp {
    speed: f32,
}

impl SpeedRamp {
    /// Returns how far the timer should move this frame.
    fn step(&mut self, moving: bool, dt: f32) -> f32 {
        if moving {
            self.speed = BLEND_ACCELERATION;
        }
        let advance = dt * self.speed;
        self.speed = (self.speed - BLEND_DECAY * dt).max(0.0);
        advance
    }
}

/// A camera record. Owned by a [`CameraRegistry`].
#[derive(Debug, Clone)]
pub struct Camera {
    near: Blend<f32>,
    far: Blend<f32>,
    fov: Blend<f32>,
    width: Blend<f32>,
    height: Blend<f32>,
    position: Blend<Vec3>,
    yaw: Blend<f32>,
    pitch: Blend<f32>,

    position_speed: SpeedRamp,
    yaw_speed: SpeedRamp,
    pitch_speed: SpeedRamp,

    q_yaw: Quat,
    q_pitch: Quat,
    orientation: Quat,

    transform: Mat4,
    view: Mat4,
    projection: Mat4,
    view_proj: Mat4,
    inv_proj: Mat4,
    inv_view_proj: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    /// Zeroed state, identity matrices, nothing blending.
    pub fn new() -> Self {
        Self {
            near: Blend::settled(0.0),
            far: Blend::settled(0.0),
            fov: Blend::settled(0.0),
            width: Blend::settled(0.0),
            height: Blend::settled(0.0),
            position: Blend::settled(Vec3::ZERO),
            yaw: Blend::settled(0.0),
            pitch: Blend::settled(0.0),
            position_speed: SpeedRamp::default(),
            yaw_speed: SpeedRamp::default(),
            pitch_speed: SpeedRamp::default(),
            q_yaw: Quat::IDENTITY,
            q_pitch: Quat::IDENTITY,
            orientation: Quat::IDENTITY,
            transform: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_proj: Mat4::IDENTITY,
            inv_proj: Mat4::IDENTITY,
            inv_view_proj: Mat4::IDENTITY,
        }
    }

    pub fn set_projection(&mut self, near: f32, far: f32, fov: f32, width: f32, height: f32, force: bool) {
        self.near.retarget(near, force);
        self.far.retarget(far, force);
        self.fov.retarget(fov, force);
        self.width.retarget(width, force);
        self.height.retarget(height, force);
    }

    pub fn set_position(&mut self, position: Vec3, force: bool) {
        self.position.retarget(position, force);
    }

    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32, force: bool) {
        self.yaw.retarget(yaw, force);
        self.pitch.retarget(pitch, force);
    }

    /// Moves previous, current and target position together, keeping any
    /// blend in progress.
    pub fn shift_position(&mut self, delta: Vec3) {
        self.position.map(|p| p + delta);
    }

    /// Advances every blend by `dt` seconds and rebuilds derived matrices.
    pub fn update(&mut self, dt: f32) {
        for blend in [
            &mut self.near,
            &mut self.far,
            &mut self.fov,
            &mut self.width,
            &mut self.height,
        ] {
            blend.advance(dt);
        }

        let step = self.position_speed.step(self.position.is_moving(), dt);
        self.position.advance(step);
        let step = self.yaw_speed.step(self.yaw.is_moving(), dt);
        self.yaw.advance(step);
        let step = self.pitch_speed.step(self.pitch.is_moving(), dt);
        self.pitch.advance(step);

        self.rebuild();
    }

    fn rebuild(&mut self) {
        let state = self.state();
        if state.has_valid_projection() {
            self.projection = Mat4::perspective(state.near, state.far, state.fov, state.width, state.height);
        }

        self.q_yaw = Quat::from_yaw_pitch_roll(state.yaw, 0.0, 0.0);
        self.q_pitch = Quat::from_yaw_pitch_roll(0.0, state.pitch, 0.0);
        self.orientation = (self.q_yaw * self.q_pitch).normalize();

        self.transform = Mat4::from_scale_rotation_translation(Vec3::ONE, self.orientation, state.position);
        match self.transform.inverse() {
            Some(view) => self.view = view,
            None => trace!("camera transform is singular, keeping previous view"),
        }
        match self.projection.inverse() {
            Some(inv) => self.inv_proj = inv,
            None => trace!("camera projection is singular, keeping previous inverse"),
        }
        self.view_proj = self.view * self.projection;
        match self.view_proj.inverse() {
            Some(inv) => self.inv_view_proj = inv,
            None => trace!("camera view-projection is singular, keeping previous inverse"),
        }
    }

    /// The blended state used for rendering.
    pub fn state(&self) -> CameraState {
        CameraState {
            near: self.near.current(),
            far: self.far.current(),
            fov: self.fov.current(),
            width: self.width.current(),
            height: self.height.current(),
            position: self.position.current(),
            yaw: self.yaw.current(),
            pitch: self.pitch.current(),
        }
    }

    /// The most recently requested state.
    pub fn target_state(&self) -> CameraState {
        CameraState {
            near: self.near.next(),
            far: self.far.next(),
            fov: self.fov.next(),
            width: self.width.next(),
            height: self.height.next(),
            position: self.position.next(),
            yaw: self.yaw.next(),
            pitch: self.pitch.next(),
        }
    }

    /// The state each attribute is blending away from.
    pub fn previous_state(&self) -> CameraState {
        CameraState {
            near: self.near.previous(),
            far: self.far.previous(),
            fov: self.fov.previous(),
            width: self.width.previous(),
            height: self.height.previous(),
            position: self.position.previous(),
            yaw: self.yaw.previous(),
            pitch: self.pitch.previous(),
        }
    }

    pub fn position_blend(&self) -> &Blend<Vec3> {
        &self.position
    }

    pub fn yaw_blend(&self) -> &Blend<f32> {
        &self.yaw
    }

    pub fn pitch_blend(&self) -> &Blend<f32> {
        &self.pitch
    }

    pub fn position(&self) -> Vec3 {
        self.position.current()
    }

    pub fn yaw(&self) -> f32 {
        self.yaw.current()
    }

    pub fn pitch(&self) -> f32 {
        self.pitch.current()
    }

    pub fn yaw_quat(&self) -> Quat {
        self.q_yaw
    }

    pub fn pitch_quat(&self) -> Quat {
        self.q_pitch
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view_proj(&self) -> &Mat4 {
        &self.view_proj
    }

    pub fn inv_proj(&self) -> &Mat4 {
        &self.inv_proj
    }

    pub fn inv_view_proj(&self) -> &Mat4 {
        &self.inv_view_proj
    }

    /// World-space right axis (view column 0).
    pub fn right(&self) -> Vec3 {
        self.view.col(0).truncate()
    }

    /// World-space up axis (view column 1).
    pub fn up(&self) -> Vec3 {
        self.view.col(1).truncate()
    }

    /// World-space viewing direction (negated view column 2).
    pub fn at(&self) -> Vec3 {
        -self.view.col(2).truncate()
    }

    pub fn matrices(&self) -> CameraMatrices {
        CameraMatrices {
            position: self.position(),
            view: self.view,
            projection: self.projection,
            view_proj: self.view_proj,
            inv_view_proj: self.inv_view_proj,
        }
    }
}

/// Handle to a camera in a [`CameraRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraId {
    index: u32,
    generation: u32,
}

impl CameraId {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera#{}@{}", self.index, self.generation)
    }
}

/// Camera lookup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraError {
    /// Index out of range for this registry.
    InvalidId(CameraId),
    /// Handle issued before the registry was cleared.
    StaleId(CameraId),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidId(id) => write!(f, "invalid camera id {id}"),
            CameraError::StaleId(id) => write!(f, "stale camera id {id}"),
        }
    }
}

impl std::error::Error for CameraError {}

/// Append-only camera arena.
///
/// Cameras are never removed individually. [`CameraRegistry::clear`] drops
/// all of them and bumps the generation, so handles issued before the clear
/// are rejected instead of aliasing new cameras.
#[derive(Debug, Default)]
pub struct CameraRegistry {
    cameras: Vec<Camera>,
    generation: u32,
}

impl CameraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> CameraId {
        let id = CameraId {
            index: self.cameras.len() as u32,
            generation: self.generation,
        };
        self.cameras.push(Camera::new());
        debug!(camera = %id, "Camera created");
        id
    }

    fn check(&self, id: CameraId) -> Result<usize, CameraError> {
        if id.generation != self.generation {
            return Err(CameraError::StaleId(id));
        }
        if id.index() >= self.cameras.len() {
            return Err(CameraError::InvalidId(id));
        }
        Ok(id.index())
    }

    pub fn is_valid(&self, id: CameraId) -> bool {
        self.check(id).is_ok()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Handles of every live camera, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = CameraId> + '_ {
        (0..self.cameras.len() as u32).map(|index| CameraId {
            index,
            generation: self.generation,
        })
    }

    /// Drops every camera and invalidates all outstanding handles.
    pub fn clear(&mut self) {
        debug!(count = self.cameras.len(), "Cameras cleared");
        self.cameras.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn get(&self, id: CameraId) -> Result<&Camera, CameraError> {
        let index = self.check(id)?;
        Ok(&self.cameras[index])
    }

    pub fn get_mut(&mut self, id: CameraId) -> Result<&mut Camera, CameraError> {
        let index = self.check(id)?;
        Ok(&mut self.cameras[index])
    }

    pub fn set_projection(
        &mut self,
        id: CameraId,
        near: f32,
        far: f32,
        fov: f32,
        width: f32,
        height: f32,
        force: bool,
    ) -> Result<(), CameraError> {
        self.get_mut(id)?.set_projection(near, far, fov, width, height, force);
        Ok(())
    }

    pub fn set_position(&mut self, id: CameraId, position: Vec3, force: bool) -> Result<(), CameraError> {
        self.get_mut(id)?.set_position(position, force);
        Ok(())
    }

    pub fn set_yaw_pitch(&mut self, id: CameraId, yaw: f32, pitch: f32, force: bool) -> Result<(), CameraError> {
        self.get_mut(id)?.set_yaw_pitch(yaw, pitch, force);
        Ok(())
    }

    pub fn shift_position(&mut self, id: CameraId, delta: Vec3) -> Result<(), CameraError> {
        self.get_mut(id)?.shift_position(delta);
        Ok(())
    }

    /// Per-frame step for every camera.
    pub fn update(&mut self, dt: f32) {
        for camera in &mut self.cameras {
            camera.update(dt);
        }
    }

    pub fn position(&self, id: CameraId) -> Result<Vec3, CameraError> {
        Ok(self.get(id)?.position())
    }

    pub fn yaw(&self, id: CameraId) -> Result<f32, CameraError> {
        Ok(self.get(id)?.yaw())
    }

    pub fn pitch(&self, id: CameraId) -> Result<f32, CameraError> {
        Ok(self.get(id)?.pitch())
    }

    pub fn state(&self, id: CameraId) -> Result<CameraState, CameraError> {
        Ok(self.get(id)?.state())
    }

    pub fn target_state(&self, id: CameraId) -> Result<CameraState, CameraError> {
        Ok(self.get(id)?.target_state())
    }

    pub fn view(&self, id: CameraId) -> Result<Mat4, CameraError> {
        Ok(*self.get(id)?.view())
    }

    pub fn projection(&self, id: CameraId) -> Result<Mat4, CameraError> {
        Ok(*self.get(id)?.projection())
    }

    pub fn transform(&self, id: CameraId) -> Result<Mat4, CameraError> {
        Ok(*self.get(id)?.transform())
    }

    pub fn view_proj(&self, id: CameraId) -> Result<Mat4, CameraError> {
        Ok(*self.get(id)?.view_proj())
    }

    pub fn inv_view_proj(&self, id: CameraId) -> Result<Mat4, CameraError> {
        Ok(*self.get(id)?.inv_view_proj())
    }

    pub fn inv_proj(&self, id: CameraId) -> Result<Mat4, CameraError> {
        Ok(*self.get(id)?.inv_proj())
    }

    pub fn right(&self, id: CameraId) -> Result<Vec3, CameraError> {
        Ok(self.get(id)?.right())
    }

    pub fn up(&self, id: CameraId) -> Result<Vec3, CameraError> {
        Ok(self.get(id)?.up())
    }

    pub fn at(&self, id: CameraId) -> Result<Vec3, CameraError> {
        Ok(self.get(id)?.at())
    }

    pub fn yaw_quat(&self, id: CameraId) -> Result<Quat, CameraError> {
        Ok(self.get(id)?.yaw_quat())
    }

    pub fn pitch_quat(&self, id: CameraId) -> Result<Quat, CameraError> {
        Ok(self.get(id)?.pitch_quat())
    }

    pub fn orientation(&self, id: CameraId) -> Result<Quat, CameraError> {
        Ok(self.get(id)?.orientation())
    }
}
