//! Control-side end of the render protocol.

use tracing::{debug, trace, warn};

use super::{Command, MetricsSnapshot, PendingCalls, RenderEvent, RequestId, RpcReply};
use crate::error::{GridError, Result};
use crate::layout::ScrollOffset;
use crate::model::GridOp;
use crate::render::{CaretOptions, TextLayout, TextSegment};

/// What a render context can do, resolved once when it is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderCapabilities {
    /// Text RPCs are answered asynchronously on another context. When false
    /// the transport exposes a local [`TextLayout`] for synchronous calls.
    pub async_text_ops: bool,
}

/// A channel to a render context.
pub trait RenderTransport {
    fn capabilities(&self) -> RenderCapabilities;

    /// Enqueue one command. Commands are delivered in call order.
    ///
    /// # Errors
    /// [`GridError::Disconnected`] once the render context has gone away.
    fn send(&mut self, command: Command) -> Result<()>;

    /// Events available now, without blocking.
    fn poll_events(&mut self) -> Vec<RenderEvent>;

    /// Same-thread text layout, for transports without async text ops.
    fn text_layout(&self) -> Option<&dyn TextLayout> {
        None
    }

    /// `false` once the render context is known to be gone.
    fn is_connected(&self) -> bool {
        true
    }
}

/// Sends commands, flushes buffered ops ahead of renders, routes RPC
/// replies and caches the last metrics snapshot.
pub struct RenderClient<T> {
    transport: T,
    capabilities: RenderCapabilities,
    pending: PendingCalls,
    metrics: Option<MetricsSnapshot>,
    connected: bool,
}

impl<T: RenderTransport> RenderClient<T> {
    pub fn new(transport: T) -> Self {
        let capabilities = transport.capabilities();
        debug!(?capabilities, "render client attached");
        Self {
            transport,
            capabilities,
            pending: PendingCalls::new(),
            metrics: None,
            connected: true,
        }
    }

    pub fn capabilities(&self) -> RenderCapabilities {
        self.capabilities
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Send a command; a dead render context is logged once and then ignored.
    pub fn send(&mut self, command: Command) -> bool {
        if !self.connected {
            return false;
        }
        match self.transport.send(command) {
            Ok(()) => true,
            Err(err) => {
                self.disconnect(&err);
                false
            }
        }
    }

    fn disconnect(&mut self, err: &GridError) {
        warn!(%err, "render context lost");
        self.connected = false;
        self.pending.clear();
    }

    /// Flush `ops` as one batch, then request a frame at `scroll`.
    pub fn render(&mut self, ops: Vec<GridOp>, scroll: ScrollOffset, ui_only: bool) {
        if !ops.is_empty() {
            trace!(count = ops.len(), "flushing ops");
            self.send(Command::ApplyOps { ops });
        }
        let command = if ui_only {
            Command::RenderUiOnly {
                scroll_x: scroll.x,
                scroll_y: scroll.y,
            }
        } else {
            Command::Render {
                scroll_x: scroll.x,
                scroll_y: scroll.y,
            }
        };
        self.send(command);
    }

    /// Last metrics pushed by the render context, if still valid.
    pub fn metrics(&self) -> Option<&MetricsSnapshot> {
        self.metrics.as_ref()
    }

    /// Drop the cached snapshot; the next render repopulates it.
    pub fn invalidate_metrics(&mut self) {
        self.metrics = None;
    }

    /// Number of RPCs still waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Drain available events. Returns true if a new metrics snapshot arrived.
    pub fn pump(&mut self) -> bool {
        let mut got_metrics = false;
        for event in self.transport.poll_events() {
            if let RenderEvent::Metrics(snapshot) = event {
                self.metrics = Some(snapshot);
                got_metrics = true;
                continue;
            }
            if let Some((id, reply)) = RpcReply::from_event(event) {
                self.pending.resolve(id, reply);
            }
        }
        if self.connected && !self.transport.is_connected() {
            self.disconnect(&GridError::Disconnected);
        }
        got_metrics
    }

    fn call(
        &mut self,
        build: impl FnOnce(RequestId) -> Command,
        callback: impl FnOnce(RpcReply) + 'static,
    ) -> Option<RequestId> {
        let id = self.pending.register(callback);
        if self.send(build(id)) {
            Some(id)
        } else {
            self.pending.cancel(id);
            None
        }
    }

    /// Measure `text`. Same-thread transports answer before this returns.
    pub fn measure_text(
        &mut self,
        text: &str,
        font: &str,
        default_size: f64,
        callback: impl FnOnce(f64) + 'static,
    ) -> Option<RequestId> {
        if let Some(layout) = self.sync_layout() {
            callback(layout.measure_text(text, font, default_size));
            return None;
        }
        let (text, font) = (text.to_string(), font.to_string());
        self.call(
            |id| Command::MeasureText {
                id,
                text,
                font,
                default_size,
            },
            move |reply| {
                if let RpcReply::Width(width) = reply {
                    callback(width);
                }
            },
        )
    }

    pub fn wrap_text(
        &mut self,
        text: &str,
        max_width: f64,
        font: &str,
        default_size: f64,
        callback: impl FnOnce(Vec<TextSegment>) + 'static,
    ) -> Option<RequestId> {
        if let Some(layout) = self.sync_layout() {
            callback(layout.wrap_text_indices(text, max_width, font, default_size));
            return None;
        }
        let (text, font) = (text.to_string(), font.to_string());
        self.call(
            |id| Command::WrapText {
                id,
                text,
                max_width,
                font,
                default_size,
            },
            move |reply| {
                if let RpcReply::Lines(lines) = reply {
                    callback(lines);
                }
            },
        )
    }

    pub fn caret_from_point(
        &mut self,
        text: &str,
        rel_x: f64,
        rel_y: f64,
        opts: CaretOptions,
        callback: impl FnOnce(usize) + 'static,
    ) -> Option<RequestId> {
        if let Some(layout) = self.sync_layout() {
            callback(layout.caret_index_from_point(text, rel_x, rel_y, &opts));
            return None;
        }
        let text = text.to_string();
        self.call(
            |id| Command::CaretFromPoint {
                id,
                text,
                rel_x,
                rel_y,
                opts,
            },
            move |reply| {
                if let RpcReply::Caret(caret) = reply {
                    callback(caret);
                }
            },
        )
    }

    fn sync_layout(&self) -> Option<&dyn TextLayout> {
        if self.capabilities.async_text_ops {
            None
        } else {
            self.transport.text_layout()
        }
    }

    /// Ask the render context to stop.
    ///
    /// # Errors
    /// [`GridError::Disconnected`] if it was already gone.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.connected {
            return Err(GridError::Disconnected);
        }
        self.connected = false;
        self.pending.clear();
        self.transport.send(Command::Shutdown)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::layout::{Scrollbars, ViewportMetrics};

    /// Records commands; replies are queued by the test.
    #[derive(Default)]
    struct Loopback {
        sent: Vec<Command>,
        replies: VecDeque<RenderEvent>,
        closed: bool,
    }

    impl RenderTransport for Loopback {
        fn capabilities(&self) -> RenderCapabilities {
            RenderCapabilities {
                async_text_ops: true,
            }
        }

        fn send(&mut self, command: Command) -> Result<()> {
            if self.closed {
                return Err(GridError::Disconnected);
            }
            self.sent.push(command);
            Ok(())
        }

        fn poll_events(&mut self) -> Vec<RenderEvent> {
            self.replies.drain(..).collect()
        }

        fn is_connected(&self) -> bool {
            !self.closed
        }
    }

    #[test]
    fn test_ops_flush_before_render() {
        let mut client = RenderClient::new(Loopback::default());
        let ops = vec![GridOp::SetColWidth {
            col: 0,
            width: 90.0,
        }];
        client.render(ops, ScrollOffset::new(0.0, 5.0), false);
        let sent = &client.transport().sent;
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], Command::ApplyOps { .. }));
        assert!(matches!(sent[1], Command::Render { scroll_y, .. } if scroll_y == 5.0));
    }

    #[test]
    fn test_empty_batch_is_not_sent() {
        let mut client = RenderClient::new(Loopback::default());
        client.render(Vec::new(), ScrollOffset::default(), true);
        assert_eq!(client.transport().sent.len(), 1);
        assert!(client.transport().sent[0].is_render());
    }

    #[test]
    fn test_replies_routed_out_of_order() {
        let mut client = RenderClient::new(Loopback::default());
        let widths = Rc::new(RefCell::new(Vec::new()));
        let a = {
            let widths = Rc::clone(&widths);
            client
                .measure_text("a", "10px mono", 10.0, move |w| widths.borrow_mut().push(("a", w)))
                .unwrap()
        };
        let b = {
            let widths = Rc::clone(&widths);
            client
                .measure_text("bb", "10px mono", 10.0, move |w| widths.borrow_mut().push(("b", w)))
                .unwrap()
        };
        let replies = &mut client.transport_mut().replies;
        replies.push_back(RenderEvent::MeasureTextResult { id: b, width: 12.0 });
        replies.push_back(RenderEvent::MeasureTextResult { id: a, width: 6.0 });
        client.pump();
        assert_eq!(*widths.borrow(), vec![("b", 12.0), ("a", 6.0)]);
        assert_eq!(client.pending_calls(), 0);
    }

    #[test]
    fn test_metrics_cached_and_invalidated() {
        let mut client = RenderClient::new(Loopback::default());
        let snapshot = MetricsSnapshot {
            viewport_metrics: ViewportMetrics {
                max_scroll_y: 100.0,
                ..ViewportMetrics::default()
            },
            scrollbars: Scrollbars::default(),
            visible: None,
        };
        client
            .transport_mut()
            .replies
            .push_back(RenderEvent::Metrics(snapshot));
        assert!(client.pump());
        assert_eq!(client.metrics().unwrap().viewport_metrics.max_scroll_y, 100.0);
        client.invalidate_metrics();
        assert!(client.metrics().is_none());
    }

    #[test]
    fn test_disconnect_drops_pending_calls() {
        let mut client = RenderClient::new(Loopback::default());
        client.measure_text("a", "", 10.0, |_| {}).unwrap();
        client.transport_mut().closed = true;
        assert!(client.measure_text("b", "", 10.0, |_| {}).is_none());
        assert!(!client.is_connected());
        assert_eq!(client.pending_calls(), 0);
        assert!(!client.send(Command::SetDpr { dpr: 2.0 }));
    }

    #[test]
    fn test_pump_notices_lost_context_without_sending() {
        let mut client = RenderClient::new(Loopback::default());
        client.measure_text("a", "", 10.0, |_| {}).unwrap();
        client.transport_mut().closed = true;
        assert!(!client.pump());
        assert!(!client.is_connected());
        assert_eq!(client.pending_calls(), 0);
        assert!(matches!(client.shutdown(), Err(GridError::Disconnected)));
    }
}
