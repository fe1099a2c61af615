//! Static spiral table: one sample per second of the day.
//!
//! The spiral makes one full turn per hour, starting at 12 o'clock and running
//! clockwise, with the radius growing linearly from 0 to 1 over the day. Odd seconds
//! are pushed outward by [`THICKNESS`], so a triangle strip over consecutive samples
//! zig-zags between an inner and an outer edge and fills a band.

use std::f32::consts::{FRAC_PI_2, TAU};

use bytemuck::{Pod, Zeroable};

pub const SECONDS_PER_DAY: u32 = 86_400;
pub const SECONDS_PER_HOUR: u32 = 3_600;
pub const HOURS_PER_DAY: u32 = 24;

/// Band width added to odd samples.
pub const THICKNESS: f32 = 0.75 / HOURS_PER_DAY as f32;

/// Segment boundaries, in minutes of the day.
///
/// A sample at second `s` has crossed boundary `b` once `s > b * 60`. The last entry
/// is a sentinel that is never crossed within a day.
pub const MINUTE_BOUNDARIES: [u32; 13] = [
    510, 567, 574, 631, 638, 695, 702, 761, 809, 866, 873, 930, SECONDS_PER_DAY,
];

/// Number of distinct arcs (segment indices `0..SEGMENT_COUNT`).
pub const SEGMENT_COUNT: u32 = MINUTE_BOUNDARIES.len() as u32;

/// One spiral sample as laid out in the static vertex buffer.
///
///  offset 0  radius  f32   loc 0
///  offset 4  angle   f32   loc 1  (radians)
///  offset 8  index   f32   loc 2  (segment ordinal)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Point {
    pub radius: f32,
    pub angle: f32,
    pub index: f32,
}

/// Incremental segment counter for ascending seconds.
///
/// Advances at most one boundary per call, which is sufficient because boundaries are
/// minutes apart and callers step one second at a time.
#[derive(Debug, Clone, Default)]
pub struct SegmentCursor {
    index: usize,
}

impl SegmentCursor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index as u32
    }

    /// Moves the cursor to second `s` and returns the segment it falls in.
    pub fn advance(&mut self, s: u32) -> u32 {
        if let Some(&boundary) = MINUTE_BOUNDARIES.get(self.index) {
            if s > boundary * 60 {
                self.index += 1;
            }
        }
        self.index()
    }
}

/// Angle of sample `s` in radians: `π/2` at `s = 0`, one clockwise turn per hour.
#[inline]
pub fn angle_at(s: u32) -> f32 {
    FRAC_PI_2 - s as f32 * TAU / SECONDS_PER_HOUR as f32
}

/// Radius of sample `s`, including the odd-sample band offset.
#[inline]
pub fn radius_at(s: u32) -> f32 {
    let radius = s as f32 / SECONDS_PER_DAY as f32;
    if s % 2 == 1 { radius + THICKNESS } else { radius }
}

/// Segment index of second `s` without walking the day.
pub fn segment_index(s: u32) -> u32 {
    MINUTE_BOUNDARIES.partition_point(|&b| b * 60 < s) as u32
}

/// Builds sample `s`, advancing `cursor`.
pub fn spiral_point(s: u32, cursor: &mut SegmentCursor) -> Point {
    Point {
        radius: radius_at(s),
        angle: angle_at(s),
        index: cursor.advance(s) as f32,
    }
}

/// Builds the full table of [`SECONDS_PER_DAY`] samples.
pub fn build_spiral() -> Vec<Point> {
    let mut cursor = SegmentCursor::new();
    (0..SECONDS_PER_DAY)
        .map(|s| spiral_point(s, &mut cursor))
        .collect()
}

/// Rotation (radians) that brings the sample for `seconds_of_day` to 12 o'clock.
///
/// Feed the result to the renderer's offset to keep "now" pointing up.
pub fn offset_for_time(seconds_of_day: f64) -> f32 {
    let within_hour = seconds_of_day.rem_euclid(SECONDS_PER_HOUR as f64);
    (within_hour * std::f64::consts::TAU / SECONDS_PER_HOUR as f64) as f32
}
