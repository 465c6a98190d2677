//! Render protocol over the worker thread: ordering, RPC correlation and
//! staleness.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use common::*;
use vgrid::error::{GridError, Result};
use vgrid::layout::ScrollOffset;
use vgrid::model::GridOp;
use vgrid::protocol::{
    Command, RenderCapabilities, RenderClient, RenderEvent, RenderTransport, StalenessToken,
};
use vgrid::render::RenderThread;

fn worker() -> RenderThread {
    RenderThread::spawn(|| Ok(engine_for(&scenario_grid()))).unwrap()
}

/// Holds RPC results until two have arrived, then delivers them newest first.
struct Reversing {
    inner: RenderThread,
    held: Vec<RenderEvent>,
}

impl RenderTransport for Reversing {
    fn capabilities(&self) -> RenderCapabilities {
        self.inner.capabilities()
    }

    fn send(&mut self, command: Command) -> Result<()> {
        self.inner.send(command)
    }

    fn poll_events(&mut self) -> Vec<RenderEvent> {
        self.held.extend(self.inner.poll_events());
        if self.held.len() < 2 {
            return Vec::new();
        }
        self.held.drain(..).rev().collect()
    }
}

/// Pump until `done` holds or five seconds pass.
fn pump_until<T: RenderTransport>(client: &mut RenderClient<T>, done: impl Fn(&RenderClient<T>) -> bool) {
    let started = Instant::now();
    while !done(client) {
        assert!(started.elapsed() < Duration::from_secs(5), "render worker timed out");
        std::thread::sleep(Duration::from_millis(1));
        client.pump();
    }
}

#[test]
fn test_out_of_order_replies_reach_their_callers() {
    let mut client = RenderClient::new(Reversing {
        inner: worker(),
        held: Vec::new(),
    });
    let short = Rc::new(Cell::new(None));
    let long = Rc::new(Cell::new(None));
    let (s, l) = (Rc::clone(&short), Rc::clone(&long));
    let first = client.measure_text("ab", "10px mono", 10.0, move |w| s.set(Some(w)));
    let second = client.measure_text("abcd", "10px mono", 10.0, move |w| l.set(Some(w)));
    assert!(first.is_some() && second.is_some());
    assert_ne!(first, second);

    pump_until(&mut client, |c| c.pending_calls() == 0);
    assert_eq!(short.get(), Some(12.0));
    assert_eq!(long.get(), Some(24.0));
}

#[test]
fn test_ops_apply_before_the_render_that_follows() {
    let mut client = RenderClient::new(worker());
    client.send(Command::Resize {
        width: CANVAS.width,
        height: CANVAS.height,
    });
    client.render(
        vec![GridOp::SetRowHeight {
            row: 0,
            height: 120.0,
        }],
        ScrollOffset::default(),
        false,
    );
    pump_until(&mut client, |c| c.metrics().is_some());
    let metrics = client.metrics().unwrap().viewport_metrics;
    assert_eq!(metrics.content_height, 2100.0);
    assert_eq!(metrics.max_scroll_y, 2100.0 - 148.0);
}

#[test]
fn test_wrap_text_over_worker() {
    let mut client = RenderClient::new(worker());
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    client.wrap_text("aaaa bbbb", 30.0, "10px mono", 10.0, move |l| *sink.borrow_mut() = l);
    pump_until(&mut client, |c| c.pending_calls() == 0);
    assert!(lines.borrow().len() >= 2);
}

#[test]
fn test_stale_reply_is_discarded() {
    let mut client = RenderClient::new(worker());
    let token = StalenessToken::new();
    let applied = Rc::new(Cell::new(None));

    for text in ["old", "newer"] {
        let issued = token.advance();
        let (token, applied) = (token.clone(), Rc::clone(&applied));
        client.measure_text(text, "10px mono", 10.0, move |w| {
            if token.is_current(issued) {
                applied.set(Some(w));
            }
        });
    }
    pump_until(&mut client, |c| c.pending_calls() == 0);
    assert_eq!(applied.get(), Some(30.0));
}

#[test]
fn test_failed_render_context_is_fatal_at_construction() {
    let result = RenderThread::spawn(|| -> Result<Engine> {
        Err(GridError::RenderContextUnavailable("no offscreen surface".into()))
    });
    assert!(matches!(result, Err(GridError::RenderContextUnavailable(_))));
}

#[test]
fn test_shutdown_disconnects_client() {
    let mut client = RenderClient::new(worker());
    client.shutdown().unwrap();
    assert!(!client.is_connected());
    assert!(!client.send(Command::Render {
        scroll_x: 0.0,
        scroll_y: 0.0,
    }));
    assert!(matches!(client.shutdown(), Err(GridError::Disconnected)));
    assert!(client.measure_text("x", "10px mono", 10.0, |_| {}).is_none());
}
