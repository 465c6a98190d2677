//! Scrollbar track/thumb geometry and thumb <-> scroll mapping.
//!
//! All ratios go through [`fraction`], which maps zero or non-finite
//! denominators to 0 so degenerate tracks never produce NaN.

use serde::{Deserialize, Serialize};

use super::{ScrollOffset, ViewportMetrics};
use crate::types::{Rect, Size};

/// `numerator / denominator` clamped to `[0, 1]`; 0 when the denominator is
/// zero, negative or not finite.
pub fn fraction(numerator: f64, denominator: f64) -> f64 {
    if !(denominator.is_finite() && denominator > 0.0) || !numerator.is_finite() {
        return 0.0;
    }
    (numerator / denominator).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Vertical,
    Horizontal,
}

/// Where a point falls on a scrollbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollbarPart {
    Thumb,
    /// Track above/left of the thumb
    TrackBefore,
    /// Track below/right of the thumb
    TrackAfter,
}

/// One scrollbar: track rectangle and thumb rectangle, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollbarGeometry {
    pub orientation: Orientation,
    pub track: Rect,
    pub thumb: Rect,
}

impl ScrollbarGeometry {
    /// Build from track extent along the scroll axis and the current scroll fraction.
    pub fn new(
        orientation: Orientation,
        track: Rect,
        visible: f64,
        content: f64,
        min_thumb: f64,
        scroll: f64,
        max_scroll: f64,
    ) -> Self {
        let track_len = match orientation {
            Orientation::Vertical => track.height,
            Orientation::Horizontal => track.width,
        }
        .max(0.0);
        let thumb_len = if content > 0.0 {
            (track_len * fraction(visible, content))
                .max(min_thumb)
                .min(track_len)
        } else {
            track_len
        };
        let offset = (track_len - thumb_len) * fraction(scroll, max_scroll);
        let thumb = match orientation {
            Orientation::Vertical => Rect::new(track.x, track.y + offset, track.width, thumb_len),
            Orientation::Horizontal => Rect::new(track.x + offset, track.y, thumb_len, track.height),
        };
        Self {
            orientation,
            track,
            thumb,
        }
    }

    pub fn track_start(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.track.y,
            Orientation::Horizontal => self.track.x,
        }
    }

    pub fn track_len(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.track.height,
            Orientation::Horizontal => self.track.width,
        }
    }

    pub fn thumb_start(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.thumb.y,
            Orientation::Horizontal => self.thumb.x,
        }
    }

    pub fn thumb_len(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.thumb.height,
            Orientation::Horizontal => self.thumb.width,
        }
    }

    /// Distance the thumb can travel.
    pub fn span(&self) -> f64 {
        (self.track_len() - self.thumb_len()).max(0.0)
    }

    /// Coordinate along the scroll axis.
    pub fn axis(&self, x: f64, y: f64) -> f64 {
        match self.orientation {
            Orientation::Vertical => y,
            Orientation::Horizontal => x,
        }
    }

    /// Classify a canvas point; `None` if it is off the track.
    pub fn part_at(&self, x: f64, y: f64) -> Option<ScrollbarPart> {
        if !self.track.contains(x, y) {
            return None;
        }
        let pos = self.axis(x, y);
        let start = self.thumb_start();
        Some(if pos < start {
            ScrollbarPart::TrackBefore
        } else if pos < start + self.thumb_len() {
            ScrollbarPart::Thumb
        } else {
            ScrollbarPart::TrackAfter
        })
    }

    /// Scroll offset that puts the thumb's leading edge at `thumb_start`.
    pub fn scroll_for_thumb(&self, thumb_start: f64, max_scroll: f64) -> f64 {
        let f = fraction(thumb_start - self.track_start(), self.span());
        (f * max_scroll.max(0.0)).floor()
    }
}

/// Both scrollbars; `None` when a bar is hidden.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scrollbars {
    pub vertical: Option<ScrollbarGeometry>,
    pub horizontal: Option<ScrollbarGeometry>,
}

impl Scrollbars {
    /// Lay out scrollbars along the right and bottom canvas edges.
    pub fn compute(
        metrics: &ViewportMetrics,
        header: Size,
        thickness: f64,
        min_thumb: f64,
        scroll: ScrollOffset,
    ) -> Self {
        let vertical = metrics.v_scroll_visible.then(|| {
            ScrollbarGeometry::new(
                Orientation::Vertical,
                Rect::new(
                    metrics.viewport_width - thickness,
                    header.height,
                    thickness,
                    metrics.height_avail,
                ),
                metrics.height_avail,
                metrics.content_height,
                min_thumb,
                scroll.y,
                metrics.max_scroll_y,
            )
        });
        let horizontal = metrics.h_scroll_visible.then(|| {
            ScrollbarGeometry::new(
                Orientation::Horizontal,
                Rect::new(
                    header.width,
                    metrics.viewport_height - thickness,
                    metrics.width_avail,
                    thickness,
                ),
                metrics.width_avail,
                metrics.content_width,
                min_thumb,
                scroll.x,
                metrics.max_scroll_x,
            )
        });
        Self {
            vertical,
            horizontal,
        }
    }

    pub fn get(&self, orientation: Orientation) -> Option<&ScrollbarGeometry> {
        match orientation {
            Orientation::Vertical => self.vertical.as_ref(),
            Orientation::Horizontal => self.horizontal.as_ref(),
        }
    }
}
