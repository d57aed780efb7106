use crate::math;

use nalgebra as na;
use ndarray::prelude::*;

/// Signal and background of one channel. `None` marks a level that could not
/// be measured; it only becomes the numeric sentinel at the record boundary.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Levels {
    pub signal: Option<f32>,
    pub background: Option<f32>,
}

impl Levels {
    pub const UNMEASURED: Levels = Levels {
        signal: None,
        background: None,
    };
}

/// Mean of the masked object pixels that also exceed the strict cut `hi`.
///
/// Dim halo pixels let in by the loose segmentation threshold are dropped here.
pub fn signal_level(
    pixels: &ArrayView2<'_, f32>,
    mask: &ArrayView2<'_, bool>,
    hi: f32,
) -> Option<f32> {
    if pixels.dim() != mask.dim() {
        return None;
    }

    math::masked_mean(pixels, |idx, v| mask[idx] && v > hi)
}

/// Mean of the window outside a `2 * half_width` box centred on `center`
/// (window coordinates, rounded to the pixel grid).
pub fn background_level(
    pixels: &ArrayView2<'_, f32>,
    center: na::Point2<f32>,
    half_width: usize,
) -> Option<f32> {
    let (h, w) = pixels.dim();
    let half = i64::try_from(half_width).unwrap_or(i64::MAX);
    let cx = center.x.round() as i64;
    let cy = center.y.round() as i64;

    let x0 = cx.saturating_sub(half).clamp(0, w as i64) as usize;
    let x1 = cx.saturating_add(half).clamp(0, w as i64) as usize;
    let y0 = cy.saturating_sub(half).clamp(0, h as i64) as usize;
    let y1 = cy.saturating_add(half).clamp(0, h as i64) as usize;

    math::masked_mean(pixels, |(y, x), _| {
        !((y0..y1).contains(&y) && (x0..x1).contains(&x))
    })
}

/// Both levels for one object in one window.
pub fn levels(
    pixels: &ArrayView2<'_, f32>,
    mask: &ArrayView2<'_, bool>,
    hi: f32,
    center: na::Point2<f32>,
    neuron_half_width: usize,
) -> Levels {
    let signal = signal_level(pixels, mask, hi);
    let background = background_level(pixels, center, neuron_half_width);

    if signal.is_none() {
        log::debug!("no object pixel above the signal cut {:.3}", hi);
    }

    if background.is_none() {
        log::debug!("exclusion box covers the whole window");
    }

    Levels { signal, background }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window() -> Array2<f32> {
        let mut w = Array2::from_elem((10, 10), 5.0f32);
        w.slice_mut(s![4..7, 4..7]).fill(100.0);
        w[[4, 4]] = 20.0;
        w
    }

    #[test]
    fn test_signal_drops_halo_pixels() {
        let pixels = window();
        let mask = pixels.mapv(|v| v > 5.0);

        let signal = signal_level(&pixels.view(), &mask.view(), 50.0).unwrap();

        assert_relative_eq!(signal, 100.0);
    }

    #[test]
    fn test_signal_with_nothing_above_cut() {
        let pixels = window();
        let mask = pixels.mapv(|v| v > 5.0);

        assert!(signal_level(&pixels.view(), &mask.view(), 1000.0).is_none());
    }

    #[test]
    fn test_signal_with_mismatched_mask() {
        let pixels = window();
        let mask = Array2::from_elem((3, 3), true);

        assert!(signal_level(&pixels.view(), &mask.view(), 0.0).is_none());
    }

    #[test]
    fn test_background_excludes_box() {
        let pixels = window();

        let bg = background_level(&pixels.view(), na::Point2::new(5.0, 5.0), 2).unwrap();

        assert_relative_eq!(bg, 5.0);
    }

    #[test]
    fn test_background_box_covering_window() {
        let pixels = window();

        assert!(background_level(&pixels.view(), na::Point2::new(5.0, 5.0), 10).is_none());
    }

    #[test]
    fn test_background_box_clipped_at_edge() {
        let pixels = Array2::from_shape_fn((4, 4), |(y, _)| y as f32);

        // box covers rows 0..2 and cols 0..2
        let bg = background_level(&pixels.view(), na::Point2::new(0.0, 0.0), 2).unwrap();

        assert_relative_eq!(bg, (0.0 * 2.0 + 1.0 * 2.0 + 2.0 * 4.0 + 3.0 * 4.0) / 12.0);
    }
}
