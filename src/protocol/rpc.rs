//! Request/response correlation for text-metric RPCs.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::RenderEvent;
use crate::render::TextSegment;

/// Monotonic id tagging one RPC request and its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

/// Payload of an RPC reply.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Width(f64),
    Lines(Vec<TextSegment>),
    Caret(usize),
}

impl RpcReply {
    /// Split a reply event into its id and payload; `None` for `Metrics`.
    pub fn from_event(event: RenderEvent) -> Option<(RequestId, Self)> {
        match event {
            RenderEvent::MeasureTextResult { id, width } => Some((id, Self::Width(width))),
            RenderEvent::WrapTextResult { id, lines } => Some((id, Self::Lines(lines))),
            RenderEvent::CaretFromPointResult { id, caret } => Some((id, Self::Caret(caret))),
            RenderEvent::Metrics(_) => None,
        }
    }
}

type Callback = Box<dyn FnOnce(RpcReply)>;

/// Outstanding requests keyed by id. Replies may arrive in any order; each
/// callback runs at most once and is removed on delivery.
#[derive(Default)]
pub struct PendingCalls {
    next_id: u64,
    pending: HashMap<RequestId, Callback>,
}

impl fmt::Debug for PendingCalls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCalls")
            .field("next_id", &self.next_id)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and park `callback` under it.
    pub fn register(&mut self, callback: impl FnOnce(RpcReply) + 'static) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.pending.insert(id, Box::new(callback));
        id
    }

    /// Run and drop the callback for `id`. Returns false for unknown ids.
    pub fn resolve(&mut self, id: RequestId, reply: RpcReply) -> bool {
        match self.pending.remove(&id) {
            Some(callback) => {
                trace!(id = id.0, "rpc resolved");
                callback(reply);
                true
            }
            None => {
                debug!(id = id.0, "reply for unknown request");
                false
            }
        }
    }

    /// Forget a request whose command never reached the render context.
    pub fn cancel(&mut self, id: RequestId) {
        self.pending.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every outstanding callback without running it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Guards async results that feed live interaction state.
///
/// Take a token with [`StalenessToken::advance`] before issuing a request;
/// when the reply arrives, apply it only if [`StalenessToken::is_current`]
/// still holds for that token.
#[derive(Debug, Clone, Default)]
pub struct StalenessToken {
    current: Rc<Cell<u64>>,
}

impl StalenessToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate all earlier tokens and return the new one.
    pub fn advance(&self) -> u64 {
        let next = self.current.get() + 1;
        self.current.set(next);
        next
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.current.get() == token
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn test_out_of_order_replies_reach_their_callers() {
        let mut calls = PendingCalls::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = {
            let seen = Rc::clone(&seen);
            calls.register(move |r| seen.borrow_mut().push(("first", r)))
        };
        let second = {
            let seen = Rc::clone(&seen);
            calls.register(move |r| seen.borrow_mut().push(("second", r)))
        };
        assert!(first < second);

        assert!(calls.resolve(second, RpcReply::Width(20.0)));
        assert!(calls.resolve(first, RpcReply::Width(10.0)));
        assert_eq!(
            *seen.borrow(),
            vec![
                ("second", RpcReply::Width(20.0)),
                ("first", RpcReply::Width(10.0)),
            ]
        );
        assert!(calls.is_empty());
    }

    #[test]
    fn test_callback_runs_once() {
        let mut calls = PendingCalls::new();
        let id = calls.register(|_| {});
        assert!(calls.resolve(id, RpcReply::Caret(1)));
        assert!(!calls.resolve(id, RpcReply::Caret(1)));
    }

    #[test]
    fn test_staleness_token() {
        let token = StalenessToken::new();
        let a = token.advance();
        assert!(token.is_current(a));
        let b = token.clone().advance();
        assert!(!token.is_current(a));
        assert!(token.is_current(b));
    }
}
