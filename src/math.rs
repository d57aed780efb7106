use nalgebra as na;
use ndarray::prelude::*;

/// Percentile with linear interpolation between closest ranks; `None` for empty input.
pub fn percentile<'a, I>(values: I, p: f32) -> Option<f32>
where
    I: IntoIterator<Item = &'a f32>,
{
    let mut sorted: Vec<f32> = values.into_iter().copied().collect();
    if sorted.is_empty() {
        return None;
    }

    sorted.sort_unstable_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f32;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Mean of `pixels` where `keep` holds.
pub fn masked_mean<F>(pixels: &ArrayView2<'_, f32>, mut keep: F) -> Option<f32>
where
    F: FnMut((usize, usize), f32) -> bool,
{
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for (idx, &v) in pixels.indexed_iter() {
        if keep(idx, v) {
            sum += v as f64;
            count += 1;
        }
    }

    if count == 0 {
        None
    } else {
        Some((sum / count as f64) as f32)
    }
}

/// Unsigned angle between two vectors in `[0, pi]`; `None` if either is degenerate.
pub fn angle_between(a: &na::Vector2<f32>, b: &na::Vector2<f32>) -> Option<f32> {
    let a = na::Unit::try_new(*a, f32::EPSILON)?;
    let b = na::Unit::try_new(*b, f32::EPSILON)?;

    Some(a.dot(&b).clamp(-1.0, 1.0).acos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_percentile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0, 5.0];

        assert_relative_eq!(percentile(&v, 0.0).unwrap(), 1.0);
        assert_relative_eq!(percentile(&v, 100.0).unwrap(), 5.0);
        assert_relative_eq!(percentile(&v, 50.0).unwrap(), 3.0);
        assert_relative_eq!(percentile(&v, 90.0).unwrap(), 4.6, epsilon = 1e-5);
        assert!(percentile(&Vec::<f32>::new(), 50.0).is_none());
    }

    #[test]
    fn test_masked_mean() {
        let a = arr2(&[[1.0, 2.0], [3.0, 10.0]]);

        assert_relative_eq!(masked_mean(&a.view(), |_, v| v < 5.0).unwrap(), 2.0);
        assert_relative_eq!(masked_mean(&a.view(), |(y, _), _| y == 1).unwrap(), 6.5);
        assert!(masked_mean(&a.view(), |_, _| false).is_none());
    }

    #[test]
    fn test_angle_between() {
        let x = na::Vector2::new(1.0, 0.0);

        assert_relative_eq!(angle_between(&x, &x).unwrap(), 0.0);
        assert_relative_eq!(angle_between(&x, &-x).unwrap(), PI);
        assert_relative_eq!(
            angle_between(&x, &na::Vector2::new(0.0, 3.0)).unwrap(),
            FRAC_PI_2
        );
        assert!(angle_between(&x, &na::Vector2::zeros()).is_none());
    }
}
