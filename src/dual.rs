use crate::frame::Frame;
use crate::intensity::{self, Levels};
use crate::math;
use crate::segment::strict_percentile;
use crate::window::{Clip, Window};

use nalgebra as na;
use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

/// Static registration offset of the second optical channel, in pixels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelShift {
    pub dx: i64,
    pub dy: i64,
}

impl ChannelShift {
    #[inline]
    pub fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    #[inline]
    pub fn apply(&self, p: na::Point2<f32>) -> na::Point2<f32> {
        na::Point2::new(p.x + self.dx as f32, p.y + self.dy as f32)
    }
}

impl Default for ChannelShift {
    /// Split-view layout of the rig the analyzer was first used with.
    fn default() -> Self {
        Self { dx: -10, dy: -510 }
    }
}

/// Levels measured in the shifted crop plus the shifted seed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub levels: Levels,
    pub position: na::Point2<f32>,
}

/// Trims `mask` on each edge by the amount the second window lost against its
/// nominal square. `None` when nothing is left or the shapes still disagree.
pub fn clip_mask<'a>(
    mask: &'a ArrayView2<'_, bool>,
    clip: &Clip,
    target: (usize, usize),
) -> Option<ArrayView2<'a, bool>> {
    let (h, w) = mask.dim();

    if clip.top.saturating_add(clip.bottom) >= h || clip.left.saturating_add(clip.right) >= w {
        return None;
    }

    let view = mask.slice(s![clip.top..h - clip.bottom, clip.left..w - clip.right]);

    if view.dim() != target {
        return None;
    }

    Some(view)
}

/// Measures the second channel for one object.
///
/// `seed` is the centre of the first window and `object` the object position,
/// both in frame coordinates; `mask` is the object mask in first-window
/// coordinates.
#[allow(clippy::too_many_arguments)]
pub fn project(
    frame: &Frame,
    seed: na::Point2<f32>,
    shift: ChannelShift,
    bg_half_width: usize,
    mask: &ArrayView2<'_, bool>,
    object: na::Point2<f32>,
    neuron_half_width: usize,
    percentile: f32,
) -> Projection {
    let position = shift.apply(seed);
    let window = Window::crop(frame, position, bg_half_width);

    let Some(mask) = clip_mask(mask, &window.clip, window.dim()) else {
        log::debug!(
            "second channel mask {:?} does not fit window {:?} (clip {:?})",
            mask.dim(),
            window.dim(),
            window.clip
        );

        return Projection {
            levels: Levels::UNMEASURED,
            position,
        };
    };

    let Some(hi) = math::percentile(window.pixels.iter(), strict_percentile(percentile)) else {
        return Projection {
            levels: Levels::UNMEASURED,
            position,
        };
    };

    let center = window.to_local(shift.apply(object));
    let levels = intensity::levels(&window.pixels, &mask, hi, center, neuron_half_width);

    Projection { levels, position }
}
