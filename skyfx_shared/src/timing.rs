//! Frame timing and profiling.
//!
//! The frame clock is the only time source the camera and controllers see:
//! they receive `delta_seconds()` and never read the wall clock themselves.

use std::{
    collections::HashMap,
    fmt,
    time::{Duration, Instant},
};

/// Source of per-frame delta time.
pub trait FrameClock {
    /// Marks the start of a frame and latches the delta since the previous
    /// one.
    fn begin_frame(&mut self);
    fn end_frame(&mut self);
    /// Seconds between the last two `begin_frame` calls.
    fn delta_seconds(&self) -> f32;
    /// Time left in the current frame's budget, if pacing is enabled.
    fn remaining_budget(&self) -> Option<Duration>;
}

/// Wall-clock frame timer with an FPS target and a smoothed FPS readout.
pub struct FrameTimer {
    budget: Option<Duration>,
    frame_start: Option<Instant>,
    frame_end: Option<Instant>,
    delta: f32,
    smoothed_fps: f32,
    smoothing: f32,
}

impl FrameTimer {
    /// `target_fps == 0` disables pacing.
    pub fn new(target_fps: u32) -> Self {
        let budget = (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64));
        Self {
            budget,
            frame_start: None,
            frame_end: None,
            delta: 0.0,
            smoothed_fps: if target_fps > 0 { target_fps as f32 } else { 60.0 },
            smoothing: 0.05,
        }
    }

    /// Exponentially smoothed frames per second.
    pub fn fps(&self) -> f32 {
        self.smoothed_fps
    }
}

impl FrameClock for FrameTimer {
    fn begin_frame(&mut self) {
        let now = Instant::now();
        self.delta = match self.frame_start {
            Some(prev) => now.duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.frame_start = Some(now);

        if self.delta > 0.0 {
            let instant_fps = 1.0 / self.delta;
            self.smoothed_fps = self.smoothed_fps * (1.0 - self.smoothing) + instant_fps * self.smoothing;
        }
    }

    fn end_frame(&mut self) {
        self.frame_end = Some(Instant::now());
    }

    fn delta_seconds(&self) -> f32 {
        self.delta
    }

    fn remaining_budget(&self) -> Option<Duration> {
        let budget = self.budget?;
        let (start, end) = (self.frame_start?, self.frame_end?);
        Some(budget.saturating_sub(end.saturating_duration_since(start)))
    }
}

/// Clock that advances by a constant step. Useful for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    step: f32,
    frames: u64,
}

impl FixedClock {
    pub fn new(step: f32) -> Self {
        Self { step, frames: 0 }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameClock for FixedClock {
    fn begin_frame(&mut self) {
        self.frames += 1;
    }

    fn end_frame(&mut self) {}

    fn delta_seconds(&self) -> f32 {
        self.step
    }

    fn remaining_budget(&self) -> Option<Duration> {
        None
    }
}

/// Opaque profile handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileId(usize);

/// Profiler contract violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilerError {
    DuplicateName(String),
    UnknownProfile(ProfileId),
    /// `stop` was called for a profile that is not on top of the stack.
    UnbalancedStop {
        expected: Option<ProfileId>,
        got: ProfileId,
    },
}

impl fmt::Display for ProfilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfilerError::DuplicateName(name) => write!(f, "profile '{name}' already exists"),
            ProfilerError::UnknownProfile(id) => write!(f, "unknown profile {id:?}"),
            ProfilerError::UnbalancedStop { expected, got } => {
                write!(f, "stop({got:?}) does not match the open profile {expected:?}")
            }
        }
    }
}

impl std::error::Error for ProfilerError {}

/// Accumulated timings for one profile.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProfileStats {
    pub calls: u64,
    pub last: Duration,
    pub total: Duration,
}

impl ProfileStats {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total.as_secs_f64() / self.calls as f64)
        }
    }
}

struct Profile {
    name: String,
    stats: ProfileStats,
}

/// Named, nestable timing sections. `start`/`stop` must nest like a stack.
#[derive(Default)]
pub struct Profiler {
    profiles: Vec<Profile>,
    by_name: HashMap<String, ProfileId>,
    stack: Vec<(ProfileId, Instant)>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_profile(&mut self, name: &str) -> Result<ProfileId, ProfilerError> {
        if self.by_name.contains_key(name) {
            return Err(ProfilerError::DuplicateName(name.to_string()));
        }
        let id = ProfileId(self.profiles.len());
        self.profiles.push(Profile {
            name: name.to_string(),
            stats: ProfileStats::default(),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn find(&self, name: &str) -> Option<ProfileId> {
        self.by_name.get(name).copied()
    }

    pub fn start(&mut self, id: ProfileId) -> Result<(), ProfilerError> {
        if id.0 >= self.profiles.len() {
            return Err(ProfilerError::UnknownProfile(id));
        }
        self.stack.push((id, Instant::now()));
        Ok(())
    }

    pub fn stop(&mut self, id: ProfileId) -> Result<Duration, ProfilerError> {
        let expected = self.stack.last().map(|(top, _)| *top);
        if expected != Some(id) {
            return Err(ProfilerError::UnbalancedStop { expected, got: id });
        }
        let Some((_, started)) = self.stack.pop() else {
            return Err(ProfilerError::UnbalancedStop { expected, got: id });
        };
        let elapsed = started.elapsed();
        let stats = &mut self.profiles[id.0].stats;
        stats.calls += 1;
        stats.last = elapsed;
        stats.total += elapsed;
        Ok(elapsed)
    }

    pub fn stats(&self, id: ProfileId) -> Option<ProfileStats> {
        self.profiles.get(id.0).map(|p| p.stats)
    }

    pub fn name(&self, id: ProfileId) -> Option<&str> {
        self.profiles.get(id.0).map(|p| p.name.as_str())
    }

    /// Profiles currently started and not yet stopped.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
