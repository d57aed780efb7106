use crate::frame::Frame;

use nalgebra as na;
use ndarray::prelude::*;

/// How far a window was cut back on each edge relative to its nominal
/// `2 * half_width` square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clip {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Clip {
    #[inline]
    pub fn is_none(&self) -> bool {
        *self == Clip::default()
    }
}

/// A rectangular crop of a [`Frame`] plus its top-left offset in frame coordinates.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    pub pixels: ArrayView2<'a, f32>,
    pub x_min: usize,
    pub y_min: usize,
    pub clip: Clip,
}

/// Rounds a (possibly fractional) seed to the pixel grid. Out-of-range and
/// infinite coordinates saturate.
#[inline]
pub fn to_pixel(p: na::Point2<f32>) -> (i64, i64) {
    (p.x.round() as i64, p.y.round() as i64)
}

/// Returns `(min, max, clip_lo, clip_hi)` along one axis.
fn clip_axis(center: i64, half: i64, len: usize) -> (usize, usize, usize, usize) {
    let len = len as i64;
    let lo = center.saturating_sub(half);
    let hi = center.saturating_add(half);

    let min = lo.clamp(0, len);
    let max = hi.clamp(0, len).max(min);

    (
        min as usize,
        max as usize,
        min.saturating_sub(lo).max(0) as usize,
        hi.saturating_sub(max).max(0) as usize,
    )
}

impl<'a> Window<'a> {
    /// Crops `[c - half, c + half)` on both axes, clipped at frame bounds.
    ///
    /// Never fails: a seed outside the frame produces a truncated or empty window.
    pub fn crop(frame: &'a Frame, center: na::Point2<f32>, half_width: usize) -> Self {
        Self::crop_px(frame, to_pixel(center), half_width)
    }

    pub fn crop_px(frame: &'a Frame, (cx, cy): (i64, i64), half_width: usize) -> Self {
        let half = i64::try_from(half_width).unwrap_or(i64::MAX);
        let (x_min, x_max, left, right) = clip_axis(cx, half, frame.width());
        let (y_min, y_max, top, bottom) = clip_axis(cy, half, frame.height());

        log::trace!(
            "window x {}..{} y {}..{} (clip l{} t{} r{} b{})",
            x_min,
            x_max,
            y_min,
            y_max,
            left,
            top,
            right,
            bottom
        );

        Self {
            pixels: frame.view().slice_move(s![y_min..y_max, x_min..x_max]),
            x_min,
            y_min,
            clip: Clip {
                left,
                top,
                right,
                bottom,
            },
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    /// Window-local `(x, y)` to frame coordinates.
    #[inline]
    pub fn to_frame(&self, local: na::Point2<f32>) -> na::Point2<f32> {
        na::Point2::new(local.x + self.x_min as f32, local.y + self.y_min as f32)
    }

    #[inline]
    pub fn to_local(&self, p: na::Point2<f32>) -> na::Point2<f32> {
        na::Point2::new(p.x - self.x_min as f32, p.y - self.y_min as f32)
    }
}
