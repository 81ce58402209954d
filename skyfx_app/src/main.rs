//! Headless demo binary.
//!
//! Usage:
//!   cargo run -p skyfx_app -- [--config app.json] [--fps 60] [--frames 600]
//!
//! Runs the frame loop with a headless window and a free-fly camera driven
//! from the console. Camera position and orientation are logged once per
//! second.
//!
//! Console commands:
//!   key <name> press|release - Press or release a key (w, a, s, d, up, ...)
//!   drag <dx> <dy>           - Left-drag the mouse by a screen delta
//!   focus on|off             - Gain or lose window focus
//!   resize <w> <h>           - Resize the framebuffer
//!   status                   - Show camera status
//!   quit                     - Exit

use std::cell::RefCell;
use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context};
use skyfx_app::{Application, CameraController, FreeCamera, Tuning};
use skyfx_shared::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};

struct Args {
    config: Option<PathBuf>,
    fps: Option<u32>,
    frames: Option<u64>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut parsed = Args {
        config: None,
        fps: None,
        frames: None,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                parsed.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--fps" if i + 1 < args.len() => {
                parsed.fps = Some(args[i + 1].parse().context("--fps")?);
                i += 2;
            }
            "--frames" if i + 1 < args.len() => {
                parsed.frames = Some(args[i + 1].parse().context("--frames")?);
                i += 2;
            }
            _ => i += 1,
        }
    }
    Ok(parsed)
}

fn parse_action(word: &str) -> anyhow::Result<Action> {
    match word {
        "press" => Ok(Action::Press),
        "release" => Ok(Action::Release),
        "repeat" => Ok(Action::Repeat),
        other => bail!("unknown key action '{other}'"),
    }
}

/// Turns one console line into the events a real window would have pushed.
fn console_events(line: &str, cursor: &mut (f64, f64)) -> anyhow::Result<Vec<AppEventKind>> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let events = match words.as_slice() {
        ["key", name, action] => {
            let key = Key::from_name(name).with_context(|| format!("unknown key '{name}'"))?;
            vec![AppEventKind::Keyboard {
                key,
                scancode: 0,
                action: parse_action(action)?,
                mods: Modifiers::empty(),
            }]
        }
        ["drag", dx, dy] => {
            let dx: f64 = dx.parse().context("drag dx")?;
            let dy: f64 = dy.parse().context("drag dy")?;
            let start = *cursor;
            *cursor = (start.0 + dx, start.1 + dy);
            let mouse = |button, action, (x, y): (f64, f64)| AppEventKind::Mouse {
                button,
                action,
                x,
                y,
                mods: Modifiers::empty(),
            };
            vec![
                mouse(Some(MouseButton::Left), Action::Press, start),
                mouse(None, Action::Move, *cursor),
                mouse(Some(MouseButton::Left), Action::Release, *cursor),
            ]
        }
        ["focus", "on"] => vec![AppEventKind::FocusOn],
        ["focus", "off"] => vec![AppEventKind::FocusOff],
        ["resize", w, h] => vec![AppEventKind::FramebufferSize {
            width: w.parse().context("resize width")?,
            height: h.parse().context("resize height")?,
        }],
        _ => bail!("unknown command '{line}'"),
    };
    Ok(events)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let mut cfg = match &args.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(fps) = args.fps {
        cfg.target_fps = fps;
    }
    info!(title = %cfg.title, fps = cfg.target_fps, "Starting skyfx demo");

    let tuning = Tuning::from(&cfg.camera);
    let clock = FrameTimer::new(cfg.target_fps);
    let mut app = Application::new(
        cfg,
        Box::new(HeadlessWindow::new()),
        Box::new(NullRenderer),
        Box::new(clock),
    );

    let camera = app.context_mut().create_camera();
    app.context_mut().active_camera = Some(camera);
    let free = Rc::new(RefCell::new(FreeCamera::new(tuning)));

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Type 'status' for info, 'quit' to exit.");
    println!();

    let sender = app.event_sender();
    let exit = app.exit_handle();
    let frame_limit = args.frames;
    let mut cursor = (0.0, 0.0);

    let input = free.clone();
    app.handlers_mut().on_keyboard(move |_, ev| {
        input.borrow_mut().process_event(&ev.kind);
    });
    let input = free.clone();
    app.handlers_mut().on_mouse(move |_, ev| {
        input.borrow_mut().process_event(&ev.kind);
    });
    let input = free.clone();
    app.handlers_mut().on_focus(move |_, ev| {
        input.borrow_mut().process_event(&ev.kind);
    });
    app.handlers_mut().on_resize(move |ctx, ev| {
        if let AppEventKind::FramebufferSize { width, height } = ev.kind {
            let state = ctx.cameras.target_state(camera).or_abort("demo camera");
            ctx.cameras
                .set_projection(camera, state.near, state.far, state.fov, width as f32, height as f32, false)
                .or_abort("demo camera");
        }
    });
    app.handlers_mut().on_update(move |ctx| {
        while let Ok(line) = console_rx.try_recv() {
            match line.as_str() {
                "quit" => exit.exit(),
                "status" => {
                    let state = ctx.cameras.state(camera).or_abort("demo camera");
                    println!(
                        "frame {} pos ({:.2}, {:.2}, {:.2}) yaw {:.3} pitch {:.3}",
                        ctx.frame, state.position.x, state.position.y, state.position.z, state.yaw, state.pitch
                    );
                }
                _ => match console_events(&line, &mut cursor) {
                    Ok(events) => {
                        for kind in events {
                            sender.push(kind);
                        }
                    }
                    Err(e) => println!("Error: {e:#}"),
                },
            }
        }

        if let Err(e) = free.borrow_mut().update(&mut ctx.cameras, camera, ctx.dt) {
            warn!(error = %e, "Camera update failed");
        }

        if frame_limit_reached(ctx.frame + 1, frame_limit) {
            ctx.exit();
        }
    });
    app.handlers_mut().on_render(move |ctx| {
        let fps = ctx.config.target_fps.max(1) as u64;
        if ctx.frame % fps == 0 {
            if let Ok(pos) = ctx.cameras.position(camera) {
                info!(frame = ctx.frame, x = pos.x, y = pos.y, z = pos.z, "Camera");
            }
        }
    });

    if frame_limit_reached(0, frame_limit) {
        info!("Frame limit is zero, nothing to run");
        app.exit();
    }
    app.run();
    Ok(())
}

/// True once `frames_done` frames satisfy the `--frames` limit.
fn frame_limit_reached(frames_done: u64, limit: Option<u64>) -> bool {
    limit.is_some_and(|limit| frames_done >= limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_command_produces_press_move_release() {
        let mut cursor = (10.0, 10.0);
        let events = console_events("drag 5 -3", &mut cursor).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(cursor, (15.0, 7.0));
        assert!(matches!(
            events[1],
            AppEventKind::Mouse { button: None, action: Action::Move, x, y, .. } if x == 15.0 && y == 7.0
        ));
    }

    #[test]
    fn zero_frame_limit_is_reached_before_the_first_frame() {
        assert!(frame_limit_reached(0, Some(0)));
        assert!(!frame_limit_reached(0, Some(1)));
        assert!(frame_limit_reached(1, Some(1)));
        assert!(!frame_limit_reached(u64::MAX, None));
    }

    #[test]
    fn key_command_parses_name_and_action() {
        let mut cursor = (0.0, 0.0);
        let events = console_events("key w press", &mut cursor).unwrap();
        assert!(matches!(events[0], AppEventKind::Keyboard { key: Key::W, action: Action::Press, .. }));
        assert!(console_events("key w hold", &mut cursor).is_err());
        assert!(console_events("fly away", &mut cursor).is_err());
    }
}
