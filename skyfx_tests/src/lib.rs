//! Shared fixtures for the skyfx integration tests.

use skyfx_app::{Application, CameraId, CameraRegistry};
use skyfx_shared::{
    config::AppConfig,
    event::{Action, AppEventKind, Key, Modifiers, MouseButton},
    render::RecordingRenderer,
    timing::FixedClock,
    window::HeadlessWindow,
};

/// Fixed frame step used by the scenarios.
pub const DT: f32 = 1.0 / 60.0;

/// Installs a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Application on a headless window, a fixed 60 Hz clock and a recording
/// renderer. The returned renderer shares its call log with the app's.
pub fn headless_app(window: HeadlessWindow) -> (Application, RecordingRenderer) {
    let renderer = RecordingRenderer::new();
    let app = Application::new(
        AppConfig::default(),
        Box::new(window),
        Box::new(renderer.clone()),
        Box::new(FixedClock::new(DT)),
    );
    (app, renderer)
}

/// Creates a camera with the default 800x600 projection, settled.
pub fn default_camera(cameras: &mut CameraRegistry) -> anyhow::Result<CameraId> {
    let id = cameras.create();
    cameras.set_projection(id, 0.1, 1000.0, 0.5, 800.0, 600.0, true)?;
    cameras.update(DT);
    Ok(id)
}

pub fn key(key: Key, action: Action) -> AppEventKind {
    AppEventKind::Keyboard {
        key,
        scancode: 0,
        action,
        mods: Modifiers::empty(),
    }
}

pub fn mouse(button: Option<MouseButton>, action: Action, x: f64, y: f64) -> AppEventKind {
    AppEventKind::Mouse {
        button,
        action,
        x,
        y,
        mods: Modifiers::empty(),
    }
}

/// Left-button drag from `from` to `to`, as one press, move and release.
pub fn drag(from: (f64, f64), to: (f64, f64)) -> Vec<AppEventKind> {
    vec![
        mouse(Some(MouseButton::Left), Action::Press, from.0, from.1),
        mouse(None, Action::Move, to.0, to.1),
        mouse(Some(MouseButton::Left), Action::Release, to.0, to.1),
    ]
}
