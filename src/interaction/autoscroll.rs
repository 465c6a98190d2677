//! Edge-driven auto-scroll with eased velocity.
//!
//! While a selection or header drag holds the pointer near (or past) an
//! edge of the cell area, the content scrolls toward that edge. The target
//! velocity grows quadratically with penetration into the edge band; the
//! live velocity eases toward it each tick and snaps to zero once both are
//! below the stop threshold.

use tracing::trace;

use crate::config::AutoScrollConfig;
use crate::layout::{ScrollOffset, ViewportMetrics};
use crate::types::Rect;

/// Milliseconds in one 60fps tick; frame deltas are expressed in these units.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Result of one loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// The scroll offset changed
    pub scrolled: bool,
    /// The loop wants another frame
    pub running: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AutoScroller {
    vx: f64,
    vy: f64,
    target_vx: f64,
    target_vy: f64,
    last_tick: Option<f64>,
    running: bool,
}

impl AutoScroller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    pub fn target(&self) -> (f64, f64) {
        (self.target_vx, self.target_vy)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Recompute the per-axis target from a canvas-local pointer position.
    pub fn update_target(&mut self, x: f64, y: f64, area: Rect, config: &AutoScrollConfig) {
        self.target_vx = edge_velocity(x, area.x, area.right(), config);
        self.target_vy = edge_velocity(y, area.y, area.bottom(), config);
    }

    /// Mark the loop running. Returns true if it was idle, meaning the caller
    /// must schedule the first frame; a running loop is left alone.
    pub fn start(&mut self) -> bool {
        if self.running || self.is_settled() {
            return false;
        }
        trace!("auto-scroll started");
        self.running = true;
        self.last_tick = None;
        true
    }

    /// Zero everything and stop the loop.
    pub fn stop(&mut self) {
        if self.running {
            trace!("auto-scroll stopped");
        }
        *self = Self::default();
    }

    fn is_settled(&self) -> bool {
        [self.vx, self.vy, self.target_vx, self.target_vy]
            .iter()
            .all(|v| v.abs() < f64::EPSILON)
    }

    /// Advance one frame at `now_ms`, scrolling `scroll` within `metrics`.
    pub fn tick(
        &mut self,
        now_ms: f64,
        scroll: &mut ScrollOffset,
        metrics: &ViewportMetrics,
        config: &AutoScrollConfig,
    ) -> Tick {
        if !self.running {
            return Tick {
                scrolled: false,
                running: false,
            };
        }
        let dt = match self.last_tick {
            Some(prev) => ((now_ms - prev) / FRAME_MS).clamp(config.dt_min, config.dt_max),
            None => 1.0,
        };
        self.last_tick = Some(now_ms);

        self.vx = ease(self.vx, self.target_vx, config);
        self.vy = ease(self.vy, self.target_vy, config);
        let scrolled = scroll.scroll_by(self.vx * dt, self.vy * dt, metrics);

        if self.is_settled() {
            self.stop();
        }
        Tick {
            scrolled,
            running: self.running,
        }
    }
}

/// Signed target speed along one axis: negative toward `start`, positive
/// toward `end`, zero outside the edge bands.
fn edge_velocity(pos: f64, start: f64, end: f64, config: &AutoScrollConfig) -> f64 {
    let margin = config.edge_margin;
    if margin <= 0.0 || !pos.is_finite() {
        return 0.0;
    }
    let curve = |depth: f64| {
        let t = (depth / margin).min(1.0);
        t * t * config.max_velocity
    };
    let before = start + margin - pos;
    let after = pos - (end - margin);
    let v = if before > 0.0 {
        -curve(before)
    } else if after > 0.0 {
        curve(after)
    } else {
        0.0
    };
    if v.abs() < config.stop_threshold {
        0.0
    } else {
        v
    }
}

fn ease(v: f64, target: f64, config: &AutoScrollConfig) -> f64 {
    let next = v + (target - v) * config.ease;
    if target.abs() < config.stop_threshold && next.abs() < config.stop_threshold {
        0.0
    } else {
        next
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn area() -> Rect {
        Rect::new(40.0, 40.0, 248.0, 148.0)
    }

    fn metrics() -> ViewportMetrics {
        ViewportMetrics {
            max_scroll_x: 5000.0,
            max_scroll_y: 2000.0,
            ..ViewportMetrics::default()
        }
    }

    #[test_case(100.0 => 0.0; "interior")]
    #[test_case(188.0 => 24.0; "at bottom edge")]
    #[test_case(400.0 => 24.0; "far past bottom edge")]
    #[test_case(164.0 => 6.0; "half way into bottom band")]
    #[test_case(64.0 => -6.0; "half way into top band")]
    #[test_case(0.0 => -24.0; "above area")]
    fn test_target_curve(y: f64) -> f64 {
        let mut scroller = AutoScroller::new();
        scroller.update_target(100.0, y, area(), &AutoScrollConfig::default());
        scroller.target().1
    }

    #[test]
    fn test_start_is_idempotent() {
        let config = AutoScrollConfig::default();
        let mut scroller = AutoScroller::new();
        assert!(!scroller.start(), "nothing to do without a target");
        scroller.update_target(100.0, 400.0, area(), &config);
        assert!(scroller.start());
        assert!(!scroller.start());
        assert!(scroller.is_running());
    }

    #[test]
    fn test_velocity_eases_toward_target() {
        let config = AutoScrollConfig::default();
        let mut scroller = AutoScroller::new();
        scroller.update_target(100.0, 400.0, area(), &config);
        scroller.start();
        let mut scroll = ScrollOffset::default();
        let tick = scroller.tick(0.0, &mut scroll, &metrics(), &config);
        assert!(tick.scrolled && tick.running);
        // One ease step from rest: 24 * 0.2.
        assert!((scroller.velocity().1 - 4.8).abs() < 1e-9);
        assert!((scroll.y - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_dt_is_clamped() {
        let config = AutoScrollConfig::default();
        let mut scroller = AutoScroller::new();
        scroller.update_target(100.0, 400.0, area(), &config);
        scroller.start();
        let mut scroll = ScrollOffset::default();
        scroller.tick(0.0, &mut scroll, &metrics(), &config);
        let before = scroll.y;
        // A one second stall counts as dt_max ticks, not sixty.
        scroller.tick(1000.0, &mut scroll, &metrics(), &config);
        let v = scroller.velocity().1;
        assert!((scroll.y - before - v * config.dt_max).abs() < 1e-9);
    }

    #[test]
    fn test_converges_and_self_cancels() {
        let config = AutoScrollConfig::default();
        let mut scroller = AutoScroller::new();
        let mut scroll = ScrollOffset::new(0.0, 500.0);
        scroller.update_target(100.0, 400.0, area(), &config);
        scroller.start();
        for i in 0..10 {
            scroller.tick(f64::from(i) * FRAME_MS, &mut scroll, &metrics(), &config);
        }
        // Pointer returns to the interior.
        scroller.update_target(100.0, 100.0, area(), &config);
        let mut ticks = 0;
        let mut now = 10.0 * FRAME_MS;
        while scroller.is_running() {
            now += FRAME_MS;
            scroller.tick(now, &mut scroll, &metrics(), &config);
            ticks += 1;
            assert!(ticks < 200, "auto-scroll did not converge");
        }
        assert_eq!(scroller.velocity(), (0.0, 0.0));
        assert_eq!(scroller.target(), (0.0, 0.0));
        let settled = scroll;
        let tick = scroller.tick(now + FRAME_MS, &mut scroll, &metrics(), &config);
        assert!(!tick.scrolled && !tick.running);
        assert_eq!(scroll, settled);
    }

    #[test]
    fn test_scroll_stays_clamped() {
        let config = AutoScrollConfig::default();
        let mut scroller = AutoScroller::new();
        let mut scroll = ScrollOffset::new(0.0, 3.0);
        scroller.update_target(100.0, 0.0, area(), &config);
        scroller.start();
        for i in 0..20 {
            scroller.tick(f64::from(i) * FRAME_MS, &mut scroll, &metrics(), &config);
        }
        assert_eq!(scroll.y, 0.0);
        assert!(scroller.is_running());
    }
}
