//! Application shell: handler table, per-frame context, and the frame loop.
//!
//! Window callbacks (any thread) push into a shared [`EventQueue`]. Once per
//! frame the loop swaps the pending buffer out under the lock and dispatches
//! every event, in push order, to exactly one registered handler. The lock is
//! never held during dispatch or rendering.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use skyfx_shared::{
    config::AppConfig,
    error::Contract,
    event::{AppEvent, AppEventKind, EventQueue, EventSender},
    math::clamp,
    render::RenderBackend,
    timing::{FrameClock, ProfileId, Profiler},
    window::WindowBackend,
};
use tracing::{debug, info, trace, warn};

use crate::camera::{CameraId, CameraRegistry};

/// Sleep used while the window is hidden and no frame budget applies.
const HIDDEN_IDLE: Duration = Duration::from_millis(10);

/// Handler for a dispatched event.
pub type EventHandler = Box<dyn FnMut(&mut AppContext, &AppEvent)>;
/// Handler for the per-frame update and render phases.
pub type FrameHandler = Box<dyn FnMut(&mut AppContext)>;

/// Process-wide exit flag. Clones share the flag and may be sent to other
/// threads.
#[derive(Debug, Clone, Default)]
pub struct ExitHandle(Arc<AtomicBool>);

impl ExitHandle {
    pub fn exit(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Single-slot handler table. Registering a slot again replaces the previous
/// handler.
#[derive(Default)]
pub struct Handlers {
    on_start: Option<EventHandler>,
    on_stop: Option<EventHandler>,
    on_keyboard: Option<EventHandler>,
    on_mouse: Option<EventHandler>,
    on_focus: Option<EventHandler>,
    on_resize: Option<EventHandler>,
    on_position: Option<EventHandler>,
    on_paint: Option<EventHandler>,
    on_update: Option<FrameHandler>,
    on_render: Option<FrameHandler>,
}

macro_rules! event_slot {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&mut self, f: impl FnMut(&mut AppContext, &AppEvent) + 'static) -> &mut Self {
                self.$name = Some(Box::new(f));
                self
            }
        )*
    };
}

impl Handlers {
    event_slot!(on_start, on_stop, on_keyboard, on_mouse, on_focus, on_resize, on_position, on_paint);

    pub fn on_update(&mut self, f: impl FnMut(&mut AppContext) + 'static) -> &mut Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_render(&mut self, f: impl FnMut(&mut AppContext) + 'static) -> &mut Self {
        self.on_render = Some(Box::new(f));
        self
    }

    /// The slot an event kind is routed to. The superseded cursor and button
    /// events share the mouse slot.
    fn slot_for(&mut self, kind: &AppEventKind) -> &mut Option<EventHandler> {
        match kind {
            AppEventKind::Start => &mut self.on_start,
            AppEventKind::Stop => &mut self.on_stop,
            AppEventKind::Keyboard { .. } => &mut self.on_keyboard,
            AppEventKind::Mouse { .. } | AppEventKind::CursorPos { .. } | AppEventKind::MouseButton { .. } => {
                &mut self.on_mouse
            }
            AppEventKind::FocusOn | AppEventKind::FocusOff => &mut self.on_focus,
            AppEventKind::FramebufferSize { .. } | AppEventKind::WindowSize { .. } => &mut self.on_resize,
            AppEventKind::WindowPosition { .. } => &mut self.on_position,
            AppEventKind::Paint => &mut self.on_paint,
        }
    }
}

/// Everything handlers can see and change during a frame.
pub struct AppContext {
    pub config: AppConfig,
    pub cameras: CameraRegistry,
    pub renderer: Box<dyn RenderBackend>,
    /// Camera whose matrices are handed to the renderer before `on_render`.
    pub active_camera: Option<CameraId>,
    pub window_size: (u32, u32),
    pub framebuffer_size: (u32, u32),
    pub window_position: (i32, i32),
    pub focused: bool,
    pub visible: bool,
    /// Clamped delta time of the current frame, in seconds.
    pub dt: f32,
    /// Frames rendered so far.
    pub frame: u64,
    exit: ExitHandle,
}

impl AppContext {
    fn new(config: AppConfig, renderer: Box<dyn RenderBackend>) -> Self {
        let size = (config.width, config.height);
        Self {
            config,
            cameras: CameraRegistry::new(),
            renderer,
            active_camera: None,
            window_size: size,
            framebuffer_size: size,
            window_position: (0, 0),
            focused: true,
            visible: true,
            dt: 0.0,
            frame: 0,
            exit: ExitHandle::default(),
        }
    }

    /// Asks the frame loop to stop after the current frame.
    pub fn exit(&self) {
        self.exit.exit();
    }

    pub fn exit_requested(&self) -> bool {
        self.exit.is_set()
    }

    pub fn exit_handle(&self) -> ExitHandle {
        self.exit.clone()
    }

    /// Creates a camera with the configured projection, sized to the
    /// framebuffer and settled immediately.
    pub fn create_camera(&mut self) -> CameraId {
        let id = self.cameras.create();
        let cam = self.config.camera;
        let (w, h) = self.framebuffer_size;
        self.cameras
            .set_projection(id, cam.near, cam.far, cam.fov, w as f32, h as f32, true)
            .or_abort("fresh camera id");
        id
    }
}

/// Owns the context, handlers, event queue, window and clock.
pub struct Application {
    ctx: AppContext,
    handlers: Handlers,
    queue: Arc<EventQueue>,
    sender: EventSender,
    drained: Vec<AppEvent>,
    window: Box<dyn WindowBackend>,
    clock: Box<dyn FrameClock>,
    profiler: Profiler,
    frame_profile: ProfileId,
    update_profile: ProfileId,
    render_profile: ProfileId,
    started: bool,
    stopped: bool,
}

impl Application {
    pub fn new(
        config: AppConfig,
        window: Box<dyn WindowBackend>,
        renderer: Box<dyn RenderBackend>,
        clock: Box<dyn FrameClock>,
    ) -> Self {
        let queue = Arc::new(EventQueue::with_capacity(64));
        let sender = EventSender::new(queue.clone());
        let mut profiler = Profiler::new();
        let frame_profile = profiler.create_profile("frame").or_abort("frame profile");
        let update_profile = profiler.create_profile("update").or_abort("update profile");
        let render_profile = profiler.create_profile("render").or_abort("render profile");
        Self {
            ctx: AppContext::new(config, renderer),
            handlers: Handlers::default(),
            queue,
            sender,
            drained: Vec::with_capacity(64),
            window,
            clock,
            profiler,
            frame_profile,
            update_profile,
            render_profile,
            started: false,
            stopped: false,
        }
    }

    pub fn handlers_mut(&mut self) -> &mut Handlers {
        &mut self.handlers
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    /// Producer handle for pushing events from any thread.
    pub fn event_sender(&self) -> EventSender {
        self.sender.clone()
    }

    pub fn exit_handle(&self) -> ExitHandle {
        self.ctx.exit_handle()
    }

    pub fn exit(&self) {
        self.ctx.exit();
    }

    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// Runs until exit is requested or the window asks to close, pacing
    /// frames to the clock's budget.
    pub fn run(&mut self) {
        self.start();
        while !self.should_stop() {
            let rendered = self.frame();
            match self.clock.remaining_budget() {
                Some(rest) if rendered && !rest.is_zero() => std::thread::sleep(rest),
                _ if !rendered => std::thread::sleep(HIDDEN_IDLE),
                _ => {}
            }
        }
        self.stop();
    }

    /// Runs at most `frames` loop iterations without pacing, then shuts down.
    /// Returns the number of iterations run.
    pub fn run_frames(&mut self, frames: u64) -> u64 {
        if self.stopped {
            return 0;
        }
        self.start();
        let mut ran = 0;
        while ran < frames && !self.should_stop() {
            self.frame();
            ran += 1;
        }
        self.stop();
        ran
    }

    fn should_stop(&self) -> bool {
        if self.window.should_close() {
            self.ctx.exit();
        }
        self.ctx.exit_requested()
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let (w, h) = self.ctx.framebuffer_size;
        info!(title = %self.ctx.config.title, width = w, height = h, gl = %self.ctx.config.gl_version, "Starting application");
        self.ctx.renderer.init(self.ctx.config.gl_version, w, h);
        self.queue.push(AppEventKind::Start);
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.queue.push(AppEventKind::Stop);
        self.dispatch_pending();
        self.ctx.renderer.destroy();
        info!(frames = self.ctx.frame, "Application stopped");
    }

    fn dispatch_pending(&mut self) {
        self.queue.drain_into(&mut self.drained);
        let events = std::mem::take(&mut self.drained);
        for event in &events {
            self.dispatch(event);
        }
        self.drained = events;
    }

    fn dispatch(&mut self, event: &AppEvent) {
        trace!(timestamp = event.timestamp, kind = ?event.kind, "dispatch");
        match event.kind {
            AppEventKind::FocusOn => self.ctx.focused = true,
            AppEventKind::FocusOff => self.ctx.focused = false,
            AppEventKind::FramebufferSize { width, height } => {
                debug!(width, height, "Framebuffer resized");
                self.ctx.framebuffer_size = (width, height);
                self.ctx.renderer.resize(width, height);
            }
            AppEventKind::WindowSize { width, height } => self.ctx.window_size = (width, height),
            AppEventKind::WindowPosition { x, y } => self.ctx.window_position = (x, y),
            _ => {}
        }
        if let Some(handler) = self.handlers.slot_for(&event.kind) {
            handler(&mut self.ctx, event);
        }
    }

    /// One loop iteration. Returns whether a frame was rendered.
    fn frame(&mut self) -> bool {
        self.window.poll_events(&self.sender);
        self.dispatch_pending();

        self.ctx.visible = self.window.is_visible();
        if !self.ctx.visible {
            return false;
        }

        self.clock.begin_frame();
        self.profiler.start(self.frame_profile).or_abort("frame profile start");
        self.window.make_current();

        self.ctx.dt = clamp(self.clock.delta_seconds(), 0.0, self.ctx.config.max_delta);

        self.profiler.start(self.update_profile).or_abort("update profile start");
        if let Some(update) = self.handlers.on_update.as_mut() {
            update(&mut self.ctx);
        }
        self.ctx.cameras.update(self.ctx.dt);
        self.profiler.stop(self.update_profile).or_abort("update profile stop");

        self.profiler.start(self.render_profile).or_abort("render profile start");
        if let Some(id) = self.ctx.active_camera {
            match self.ctx.cameras.get(id) {
                Ok(camera) => self.ctx.renderer.set_camera(&camera.matrices()),
                Err(e) => warn!(error = %e, "Active camera is gone"),
            }
        }
        if let Some(render) = self.handlers.on_render.as_mut() {
            render(&mut self.ctx);
        }
        self.profiler.stop(self.render_profile).or_abort("render profile stop");

        self.window.swap_buffers();
        self.profiler.stop(self.frame_profile).or_abort("frame profile stop");
        self.clock.end_frame();
        self.ctx.frame += 1;
        trace!(frame = self.ctx.frame, dt = self.ctx.dt, "Frame done");
        true
    }
}
