//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend. The
//! renderer is an external collaborator; the frame loop only drives its
//! lifecycle and hands it the active camera's matrices.

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::math::{Mat4, Vec3};

/// Graphics context version requested from the window backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GlVersion {
    #[serde(rename = "3.3")]
    Gl33,
    #[default]
    #[serde(rename = "4.1")]
    Gl41,
    #[serde(rename = "4.5")]
    Gl45,
    #[serde(rename = "es3")]
    Es3,
}

impl GlVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            GlVersion::Gl33 => "3.3",
            GlVersion::Gl41 => "4.1",
            GlVersion::Gl45 => "4.5",
            GlVersion::Es3 => "es3",
        }
    }
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "3.3" => Ok(GlVersion::Gl33),
            "4.1" => Ok(GlVersion::Gl41),
            "4.5" => Ok(GlVersion::Gl45),
            "es3" | "es3.0" => Ok(GlVersion::Es3),
            other => Err(format!("unknown GL version '{other}'")),
        }
    }
}

/// Matrices a renderer binds as shader uniforms for one camera.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraMatrices {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub inv_view_proj: Mat4,
}

/// A minimal rendering API.
pub trait RenderBackend {
    fn init(&mut self, version: GlVersion, width: u32, height: u32);
    fn resize(&mut self, width: u32, height: u32);
    fn set_camera(&mut self, camera: &CameraMatrices);
    fn destroy(&mut self);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn init(&mut self, _version: GlVersion, _width: u32, _height: u32) {}
    fn resize(&mut self, _width: u32, _height: u32) {}
    fn set_camera(&mut self, _camera: &CameraMatrices) {}
    fn destroy(&mut self) {}
}

/// One call observed by a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Init {
        version: GlVersion,
        width: u32,
        height: u32,
    },
    Resize {
        width: u32,
        height: u32,
    },
    SetCamera(CameraMatrices),
    Destroy,
}

/// Renderer that records every call. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: RenderCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// Snapshot of the calls made so far.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_camera(&self) -> Option<CameraMatrices> {
        self.calls().into_iter().rev().find_map(|c| match c {
            RenderCall::SetCamera(m) => Some(m),
            _ => None,
        })
    }
}

impl RenderBackend for RecordingRenderer {
    fn init(&mut self, version: GlVersion, width: u32, height: u32) {
        self.record(RenderCall::Init {
            version,
            width,
            height,
        });
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.record(RenderCall::Resize { width, height });
    }

    fn set_camera(&mut self, camera: &CameraMatrices) {
        self.record(RenderCall::SetCamera(*camera));
    }

    fn destroy(&mut self) {
        self.record(RenderCall::Destroy);
    }
}
