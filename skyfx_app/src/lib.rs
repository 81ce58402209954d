//! `skyfx_app`
//!
//! Application-side systems:
//! - Smoothed cameras and the camera registry
//! - Held-key and mouse-drag input tracking
//! - Free, first-person and third-person camera controllers
//! - Handler table and the frame loop driving everything per frame

pub mod app;
pub mod camera;
pub mod controller;
pub mod input;

pub use app::{AppContext, Application, ExitHandle, Handlers};
pub use camera::{Camera, CameraError, CameraId, CameraRegistry, CameraState};
pub use controller::{CameraController, FpsCamera, FreeCamera, TpsCamera, Tuning};
