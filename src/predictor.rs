use crate::track::IdentityHistory;

use nalgebra as na;

pub const DEFAULT_TRACK_SPEED: f32 = 0.2;

/// Damped first-order extrapolation of the next seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predictor {
    pub track_speed: f32,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(DEFAULT_TRACK_SPEED)
    }
}

impl Predictor {
    #[inline]
    pub fn new(track_speed: f32) -> Self {
        Self { track_speed }
    }

    /// `last + (last - prior) * track_speed`; with a single accepted position
    /// the seed stays put, with none there is nothing to predict from.
    pub fn predict(&self, history: &IdentityHistory) -> Option<na::Point2<f32>> {
        let last = history.last()?;

        Some(match history.prior() {
            Some(prior) => last + (last - prior) * self.track_speed,
            None => last,
        })
    }

    /// Next seed, or `initial` when the identity has no accepted position yet.
    #[inline]
    pub fn seed(&self, history: &IdentityHistory, initial: na::Point2<f32>) -> na::Point2<f32> {
        self.predict(history).unwrap_or(initial)
    }
}
