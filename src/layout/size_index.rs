//! Prefix-sum coordinate mapping along one axis.
//!
//! Positions are computed from a default track size plus a sparse set of
//! overrides, so a grid with 100k rows and a handful of resized ones costs
//! memory proportional to the overrides only. Lookups are O(log n) in both
//! directions.

use std::collections::BTreeMap;

/// Smallest size a track may be given. Keeps the cumulative function strictly
/// increasing so `index_at(offset_of(i)) == i` holds for every index.
pub const MIN_TRACK_PX: f64 = 1.0;

/// Cumulative offsets of `count` tracks (rows or columns).
#[derive(Debug, Clone, PartialEq)]
pub struct SizeIndex {
    count: u32,
    default_size: f64,
    overrides: BTreeMap<u32, f64>,
    /// Sorted override indices (mirror of `overrides` keys)
    keys: Vec<u32>,
    /// `deltas[j]` = sum of `(size - default)` over the first `j` overrides
    deltas: Vec<f64>,
}

impl SizeIndex {
    pub fn new(count: u32, default_size: f64) -> Self {
        Self {
            count,
            default_size: default_size.max(MIN_TRACK_PX),
            overrides: BTreeMap::new(),
            keys: Vec::new(),
            deltas: vec![0.0],
        }
    }

    /// Build from an override map (indices past `count` are ignored).
    pub fn with_overrides<I>(count: u32, default_size: f64, overrides: I) -> Self
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut index = Self::new(count, default_size);
        for (i, size) in overrides {
            if i < count && size.is_finite() {
                index.overrides.insert(i, size.max(MIN_TRACK_PX));
            }
        }
        index.rebuild();
        index
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn default_size(&self) -> f64 {
        self.default_size
    }

    /// Override map (index -> pixels).
    pub fn overrides(&self) -> &BTreeMap<u32, f64> {
        &self.overrides
    }

    /// Size of track `index`, override or default.
    pub fn size_of(&self, index: u32) -> f64 {
        self.overrides
            .get(&index)
            .copied()
            .unwrap_or(self.default_size)
    }

    /// Overwrite the size of one track. Returns false for indices outside the grid
    /// or non-finite sizes.
    pub fn set_size(&mut self, index: u32, size: f64) -> bool {
        if index >= self.count || !size.is_finite() {
            return false;
        }
        self.overrides.insert(index, size.max(MIN_TRACK_PX));
        self.rebuild();
        true
    }

    fn rebuild(&mut self) {
        self.keys.clear();
        self.deltas.clear();
        self.deltas.push(0.0);
        let mut acc = 0.0;
        for (&i, &size) in &self.overrides {
            self.keys.push(i);
            acc += size - self.default_size;
            self.deltas.push(acc);
        }
    }

    /// Offset of track `index`'s leading edge: the summed size of tracks
    /// `0..index`. `offset_of(count)` is the total extent.
    pub fn offset_of(&self, index: u32) -> f64 {
        let index = index.min(self.count);
        let j = self.keys.partition_point(|&k| k < index);
        let delta = self.deltas.get(j).copied().unwrap_or(0.0);
        f64::from(index) * self.default_size + delta
    }

    /// Total extent of all tracks.
    pub fn total(&self) -> f64 {
        self.offset_of(self.count)
    }

    /// Summed size of tracks `start..end` (half-open).
    pub fn span(&self, start: u32, end: u32) -> f64 {
        (self.offset_of(end) - self.offset_of(start)).max(0.0)
    }

    /// Track containing `pos`, i.e. the `i` with
    /// `offset_of(i) <= pos < offset_of(i + 1)`, clamped to `[0, count - 1]`.
    /// Returns 0 when the index is empty.
    pub fn index_at(&self, pos: f64) -> u32 {
        if self.count == 0 || pos.is_nan() || pos <= 0.0 {
            return 0;
        }
        // Largest i in [0, count) with offset_of(i) <= pos.
        let mut lo: u32 = 0;
        let mut hi: u32 = self.count;
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.offset_of(mid) <= pos {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Like [`SizeIndex::index_at`] but `None` outside `[0, total)`.
    pub fn index_at_checked(&self, pos: f64) -> Option<u32> {
        if self.count == 0 || !(pos >= 0.0 && pos < self.total()) {
            return None;
        }
        Some(self.index_at(pos))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        let index = SizeIndex::new(10, 20.0);
        assert_eq!(index.offset_of(0), 0.0);
        assert_eq!(index.offset_of(3), 60.0);
        assert_eq!(index.total(), 200.0);
        assert_eq!(index.index_at(0.0), 0);
        assert_eq!(index.index_at(19.9), 0);
        assert_eq!(index.index_at(20.0), 1);
        assert_eq!(index.index_at(5000.0), 9);
    }

    #[test]
    fn test_overrides_shift_later_offsets() {
        let mut index = SizeIndex::new(10, 20.0);
        assert!(index.set_size(2, 50.0));
        assert_eq!(index.offset_of(2), 40.0);
        assert_eq!(index.offset_of(3), 90.0);
        assert_eq!(index.offset_of(4), 110.0);
        assert_eq!(index.index_at(89.0), 2);
        assert_eq!(index.index_at(90.0), 3);
        assert_eq!(index.total(), 230.0);
    }

    #[test]
    fn test_overwrite_replaces_previous_override() {
        let mut index = SizeIndex::new(5, 10.0);
        index.set_size(1, 30.0);
        index.set_size(1, 15.0);
        assert_eq!(index.size_of(1), 15.0);
        assert_eq!(index.total(), 55.0);
    }

    #[test]
    fn test_out_of_range_set_is_rejected() {
        let mut index = SizeIndex::new(5, 10.0);
        assert!(!index.set_size(5, 30.0));
        assert!(!index.set_size(0, f64::NAN));
        assert_eq!(index.total(), 50.0);
    }

    #[test]
    fn test_tiny_sizes_clamped() {
        let mut index = SizeIndex::new(3, 10.0);
        index.set_size(1, 0.0);
        assert_eq!(index.size_of(1), MIN_TRACK_PX);
        assert_eq!(index.index_at(index.offset_of(1)), 1);
        assert_eq!(index.index_at(index.offset_of(2)), 2);
    }

    #[test]
    fn test_empty_index() {
        let index = SizeIndex::new(0, 20.0);
        assert_eq!(index.total(), 0.0);
        assert_eq!(index.index_at(100.0), 0);
        assert_eq!(index.index_at_checked(0.0), None);
    }

    #[test]
    fn test_checked_lookup_bounds() {
        let index = SizeIndex::new(4, 25.0);
        assert_eq!(index.index_at_checked(-1.0), None);
        assert_eq!(index.index_at_checked(99.9), Some(3));
        assert_eq!(index.index_at_checked(100.0), None);
    }

    #[test]
    fn test_offset_round_trip_with_mixed_sizes() {
        let index = SizeIndex::with_overrides(
            1000,
            20.0,
            [(0, 5.0), (17, 80.0), (18, 3.0), (999, 400.0)],
        );
        for i in 0..1000 {
            assert_eq!(index.index_at(index.offset_of(i)), i, "index {i}");
        }
    }
}
