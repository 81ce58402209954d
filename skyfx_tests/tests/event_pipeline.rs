//! Event queue and dispatch behavior, including concurrent producers.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use skyfx_shared::{
    event::{Action, AppEvent, AppEventKind, EventQueue, EventSender, Key},
    window::HeadlessWindow,
};
use skyfx_tests::{headless_app, init_tracing, key};

const PRODUCERS: i32 = 4;
const PER_PRODUCER: i32 = 2_000;

#[test]
fn concurrent_pushes_are_neither_lost_nor_reordered() {
    init_tracing();
    let queue = Arc::new(EventQueue::new());
    let done = AtomicBool::new(false);
    let mut seen: Vec<AppEvent> = Vec::new();

    thread::scope(|s| {
        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let sender = EventSender::new(queue.clone());
                s.spawn(move || {
                    for i in 0..PER_PRODUCER {
                        sender.push(AppEventKind::Keyboard {
                            key: Key::Other(p),
                            scancode: i,
                            action: Action::Press,
                            mods: Default::default(),
                        });
                    }
                })
            })
            .collect();

        let consumer = s.spawn(|| {
            let mut buffer = Vec::new();
            let mut out = Vec::new();
            loop {
                let finished = done.load(Ordering::SeqCst);
                queue.drain_into(&mut buffer);
                out.extend_from_slice(&buffer);
                if finished && queue.is_empty() {
                    break;
                }
                thread::yield_now();
            }
            out
        });

        for producer in producers {
            producer.join().unwrap();
        }
        done.store(true, Ordering::SeqCst);
        seen = consumer.join().unwrap();
    });

    assert_eq!(seen.len(), (PRODUCERS * PER_PRODUCER) as usize);
    assert!(seen.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    let mut next = vec![0; PRODUCERS as usize];
    for event in &seen {
        let AppEventKind::Keyboard { key: Key::Other(p), scancode, .. } = event.kind else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(scancode, next[p as usize], "producer {p} reordered");
        next[p as usize] += 1;
    }
}

#[test]
fn drain_reuses_buffers() {
    let queue = EventQueue::with_capacity(16);
    let mut buffer = Vec::with_capacity(16);
    queue.push(AppEventKind::Paint);
    queue.drain_into(&mut buffer);
    assert_eq!(buffer.len(), 1);
    assert!(queue.is_empty());

    queue.push(AppEventKind::FocusOn);
    queue.drain_into(&mut buffer);
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer[0].kind, AppEventKind::FocusOn);
    assert!(buffer.capacity() >= 16);
}

#[test]
fn events_pushed_off_thread_reach_handlers_next_frame() {
    let (mut app, _) = headless_app(HeadlessWindow::new());
    let sender = app.event_sender();
    let keys = Rc::new(RefCell::new(Vec::new()));

    let k = keys.clone();
    app.handlers_mut().on_keyboard(move |_, ev| {
        if let AppEventKind::Keyboard { key, .. } = ev.kind {
            k.borrow_mut().push(key);
        }
    });

    thread::spawn(move || {
        for name in ["w", "a", "s", "d"] {
            if let Some(k) = Key::from_name(name) {
                sender.key(k, Action::Press);
            }
        }
    })
    .join()
    .unwrap();

    app.run_frames(1);
    assert_eq!(*keys.borrow(), [Key::W, Key::A, Key::S, Key::D]);
}

#[test]
fn deprecated_cursor_events_go_to_mouse_handler() {
    let window = HeadlessWindow::scripted([vec![
        AppEventKind::CursorPos { x: 3.0, y: 4.0 },
        AppEventKind::MouseButton {
            button: skyfx_shared::event::MouseButton::Left,
            action: Action::Press,
            mods: Default::default(),
        },
        key(Key::Space, Action::Press),
    ]]);
    let (mut app, _) = headless_app(window);
    let counts = Rc::new(RefCell::new((0, 0)));

    let c = counts.clone();
    app.handlers_mut().on_mouse(move |_, _| c.borrow_mut().0 += 1);
    let c = counts.clone();
    app.handlers_mut().on_keyboard(move |_, _| c.borrow_mut().1 += 1);

    app.run_frames(1);
    assert_eq!(*counts.borrow(), (2, 1));
}

#[test]
fn window_close_ends_run() {
    let window = HeadlessWindow::scripted([vec![AppEventKind::Paint], vec![], vec![]]).close_when_done();
    let (mut app, renderer) = headless_app(window);
    let paints = Rc::new(RefCell::new(0));
    let p = paints.clone();
    app.handlers_mut().on_paint(move |_, _| *p.borrow_mut() += 1);

    app.run();
    assert_eq!(*paints.borrow(), 1);
    assert_eq!(app.context().frame, 3);
    assert_eq!(renderer.calls().last(), Some(&skyfx_shared::render::RenderCall::Destroy));
}
