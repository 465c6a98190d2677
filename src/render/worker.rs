//! Render transports: a dedicated worker thread and a same-thread renderer.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::engine::RenderEngine;
use super::surface::Surface;
use super::text::TextLayout;
use crate::error::{GridError, Result};
use crate::protocol::{Command, RenderCapabilities, RenderEvent, RenderTransport};

/// Render engine on its own thread. Commands go over one channel in order;
/// events come back on another.
pub struct RenderThread {
    commands: Sender<Command>,
    events: Receiver<RenderEvent>,
    handle: Option<JoinHandle<()>>,
    connected: bool,
}

impl RenderThread {
    /// Start a worker and build its engine there (the surface need not be
    /// `Send`). Blocks until the engine is constructed.
    ///
    /// # Errors
    /// [`GridError::RenderContextUnavailable`] if the thread cannot be spawned
    /// or `build` fails.
    pub fn spawn<S, T, F>(build: F) -> Result<Self>
    where
        S: Surface + 'static,
        T: TextLayout + 'static,
        F: FnOnce() -> Result<RenderEngine<S, T>> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::channel::<RenderEvent>();
        let (ready_tx, ready_rx) = mpsc::channel::<std::result::Result<(), String>>();

        let handle = thread::Builder::new()
            .name("vgrid-render".into())
            .spawn(move || {
                let mut engine = match build() {
                    Ok(engine) => {
                        let _ = ready_tx.send(Ok(()));
                        engine
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err.to_string()));
                        return;
                    }
                };
                debug!("render worker started");
                while let Ok(command) = command_rx.recv() {
                    if matches!(command, Command::Shutdown) {
                        break;
                    }
                    for event in engine.handle(command) {
                        if event_tx.send(event).is_err() {
                            debug!("control side dropped, stopping render worker");
                            return;
                        }
                    }
                }
                debug!("render worker stopped");
            })
            .map_err(|e| GridError::RenderContextUnavailable(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("render thread ready");
                Ok(Self {
                    commands: command_tx,
                    events: event_rx,
                    handle: Some(handle),
                    connected: true,
                })
            }
            Ok(Err(reason)) => {
                let _ = handle.join();
                Err(GridError::RenderContextUnavailable(reason))
            }
            Err(_) => {
                let _ = handle.join();
                Err(GridError::RenderContextUnavailable(
                    "render worker exited during startup".into(),
                ))
            }
        }
    }

    /// Block up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RenderEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl RenderTransport for RenderThread {
    fn capabilities(&self) -> RenderCapabilities {
        RenderCapabilities {
            async_text_ops: true,
        }
    }

    fn send(&mut self, command: Command) -> Result<()> {
        if !self.connected {
            return Err(GridError::Disconnected);
        }
        self.commands.send(command).map_err(|_| {
            self.connected = false;
            GridError::Disconnected
        })
    }

    fn poll_events(&mut self) -> Vec<RenderEvent> {
        let mut events = Vec::new();
        while self.connected {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("render worker gone");
                    self.connected = false;
                }
            }
        }
        events
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("render worker panicked");
            }
        }
    }
}

/// Render engine on the caller's thread. Each command is handled as it is
/// sent; its events wait in a queue until polled.
pub struct InlineRenderer<S, T> {
    engine: RenderEngine<S, T>,
    queue: VecDeque<RenderEvent>,
}

impl<S: Surface, T: TextLayout> InlineRenderer<S, T> {
    pub fn new(engine: RenderEngine<S, T>) -> Self {
        Self {
            engine,
            queue: VecDeque::new(),
        }
    }

    pub fn engine(&self) -> &RenderEngine<S, T> {
        &self.engine
    }
}

impl<S: Surface, T: TextLayout> RenderTransport for InlineRenderer<S, T> {
    fn capabilities(&self) -> RenderCapabilities {
        RenderCapabilities {
            async_text_ops: false,
        }
    }

    fn send(&mut self, command: Command) -> Result<()> {
        let events = self.engine.handle(command);
        self.queue.extend(events);
        Ok(())
    }

    fn poll_events(&mut self) -> Vec<RenderEvent> {
        self.queue.drain(..).collect()
    }

    fn text_layout(&self) -> Option<&dyn TextLayout> {
        Some(self.engine.text_layout())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::model::GridData;
    use crate::protocol::RequestId;
    use crate::render::{DisplayList, MonospaceLayout};

    fn build() -> Result<RenderEngine<DisplayList, MonospaceLayout>> {
        Ok(RenderEngine::new(
            DisplayList::new(),
            MonospaceLayout::default(),
            GridConfig::default(),
            GridData::new(10, 10, 20.0, 64.0),
        ))
    }

    #[test]
    fn test_thread_round_trip() {
        let mut worker = RenderThread::spawn(build).unwrap();
        worker
            .send(Command::Resize {
                width: 200.0,
                height: 100.0,
            })
            .unwrap();
        worker
            .send(Command::Render {
                scroll_x: 0.0,
                scroll_y: 0.0,
            })
            .unwrap();
        let event = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, RenderEvent::Metrics(_)));
    }

    #[test]
    fn test_exited_worker_reports_disconnect() {
        let mut worker = RenderThread::spawn(build).unwrap();
        worker.send(Command::Shutdown).unwrap();
        if let Some(handle) = worker.handle.take() {
            handle.join().unwrap();
        }
        assert!(worker.poll_events().is_empty());
        assert!(!worker.is_connected());
        assert!(worker.poll_events().is_empty());
        assert!(matches!(
            worker.send(Command::SetDpr { dpr: 2.0 }),
            Err(GridError::Disconnected)
        ));
    }

    #[test]
    fn test_failed_build_is_reported_at_construction() {
        let result = RenderThread::spawn(|| -> Result<RenderEngine<DisplayList, MonospaceLayout>> {
            Err(GridError::RenderContextUnavailable("no surface".into()))
        });
        match result {
            Err(GridError::RenderContextUnavailable(reason)) => assert!(reason.contains("no surface")),
            _ => panic!("expected RenderContextUnavailable"),
        }
    }

    #[test]
    fn test_inline_answers_in_order() {
        let mut inline = InlineRenderer::new(build().unwrap());
        assert!(!inline.capabilities().async_text_ops);
        inline
            .send(Command::MeasureText {
                id: RequestId(1),
                text: "ab".into(),
                font: "10px mono".into(),
                default_size: 10.0,
            })
            .unwrap();
        inline
            .send(Command::Render {
                scroll_x: 0.0,
                scroll_y: 0.0,
            })
            .unwrap();
        let events = inline.poll_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], RenderEvent::MeasureTextResult { id: RequestId(1), .. }));
        assert!(inline.poll_events().is_empty());
    }
}
