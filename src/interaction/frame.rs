//! Cooperative frame loops.
//!
//! The host drives frames (`requestAnimationFrame` in a browser, a timer
//! elsewhere). Each loop requests at most one pending frame; requesting
//! again while one is pending returns the same handle.

use tracing::trace;

/// Identifies one pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

/// The loops that run on frames, in the order they run within one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameKind {
    AutoScroll,
    Render,
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next: u64,
    pending: Vec<(FrameHandle, FrameKind)>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a frame for `kind`; no duplicate if one is already pending.
    pub fn request(&mut self, kind: FrameKind) -> FrameHandle {
        if let Some((handle, _)) = self.pending.iter().find(|(_, k)| *k == kind) {
            return *handle;
        }
        self.next += 1;
        let handle = FrameHandle(self.next);
        trace!(?kind, handle = self.next, "frame requested");
        self.pending.push((handle, kind));
        handle
    }

    /// Cancel a pending frame. Cancelling twice, or after it ran, is a no-op.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(h, _)| *h != handle);
        before != self.pending.len()
    }

    pub fn cancel_kind(&mut self, kind: FrameKind) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(_, k)| *k != kind);
        before != self.pending.len()
    }

    pub fn is_pending(&self, kind: FrameKind) -> bool {
        self.pending.iter().any(|(_, k)| *k == kind)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take every pending frame, in run order. Loops that want another frame
    /// request it again while running.
    pub fn take_due(&mut self) -> Vec<FrameKind> {
        let mut due: Vec<FrameKind> = self.pending.drain(..).map(|(_, k)| k).collect();
        due.sort_unstable();
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_deduplicated() {
        let mut frames = FrameScheduler::new();
        let a = frames.request(FrameKind::Render);
        let b = frames.request(FrameKind::Render);
        assert_eq!(a, b);
        let c = frames.request(FrameKind::AutoScroll);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut frames = FrameScheduler::new();
        let handle = frames.request(FrameKind::AutoScroll);
        assert!(frames.cancel(handle));
        assert!(!frames.cancel(handle));
        assert!(!frames.has_pending());
    }

    #[test]
    fn test_take_due_runs_autoscroll_first() {
        let mut frames = FrameScheduler::new();
        frames.request(FrameKind::Render);
        frames.request(FrameKind::AutoScroll);
        assert_eq!(frames.take_due(), vec![FrameKind::AutoScroll, FrameKind::Render]);
        assert!(frames.take_due().is_empty());
    }

    #[test]
    fn test_stale_handle_does_not_cancel_new_request() {
        let mut frames = FrameScheduler::new();
        let old = frames.request(FrameKind::Render);
        frames.take_due();
        let new = frames.request(FrameKind::Render);
        assert!(!frames.cancel(old));
        assert!(frames.is_pending(FrameKind::Render));
        assert!(frames.cancel(new));
    }
}
