//! Control <-> render protocol.
//!
//! Commands flow one way, strictly ordered, from the control context to the
//! render context. Text-metric RPCs ride the same channel tagged with a
//! request id; replies come back on the event channel in any order and are
//! routed to their caller by id. After every render the render context
//! pushes an unsolicited metrics snapshot.

mod client;
mod message;
mod rpc;

pub use client::{RenderCapabilities, RenderClient, RenderTransport};
pub use message::{
    Command, EditorOverlay, Guides, HeaderLabels, MetricsSnapshot, RenderEvent, ScrollbarState,
    ScrollbarStatePatch,
};
pub use rpc::{PendingCalls, RequestId, RpcReply, StalenessToken};
