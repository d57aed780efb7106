use crate::intensity::Levels;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Emitted in place of a level that could not be measured. `1` keeps
/// `signal / background - 1` at `0` instead of dividing by zero.
pub const SENTINEL: f32 = 1.0;

/// One channel of one identity in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ChannelReading {
    pub background: f32,
    pub signal: f32,
    pub x: f32,
    pub y: f32,
    pub area: f32,
}

impl ChannelReading {
    /// Row content before anything has been measured.
    pub const PLACEHOLDER: ChannelReading = ChannelReading {
        background: SENTINEL,
        signal: SENTINEL,
        x: SENTINEL,
        y: SENTINEL,
        area: SENTINEL,
    };

    pub fn new(levels: Levels, position: na::Point2<f32>, area: usize) -> Self {
        Self {
            background: levels.background.unwrap_or(SENTINEL),
            signal: levels.signal.unwrap_or(SENTINEL),
            x: position.x,
            y: position.y,
            area: area as f32,
        }
    }

    #[inline]
    pub fn position(&self) -> na::Point2<f32> {
        na::Point2::new(self.x, self.y)
    }

    /// `F / Bg - 1`.
    #[inline]
    pub fn ratio(&self) -> f32 {
        self.signal / self.background - 1.0
    }

    /// `F - Bg`.
    #[inline]
    pub fn net(&self) -> f32 {
        self.signal - self.background
    }
}

/// Everything measured for one identity in one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub primary: ChannelReading,
    /// Present in dual-channel mode.
    pub secondary: Option<ChannelReading>,
    /// `false` when no component was found and the seed was kept.
    pub detected: bool,
}

impl Measurement {
    pub const PLACEHOLDER: Measurement = Measurement {
        primary: ChannelReading::PLACEHOLDER,
        secondary: None,
        detected: false,
    };

    #[inline]
    pub fn position(&self) -> na::Point2<f32> {
        self.primary.position()
    }

    /// `(F2 - Bg2) / (F1 - Bg1)`; `None` without a second channel or when
    /// the first channel has no net signal.
    pub fn channel_ratio(&self) -> Option<f32> {
        let secondary = self.secondary.as_ref()?;
        let den = self.primary.net();

        if den.abs() < f32::EPSILON {
            None
        } else {
            Some(secondary.net() / den)
        }
    }
}

/// One frame's result: identity 1, and identity 2 in two-object mode.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FrameMeasurement {
    pub first: Measurement,
    pub second: Option<Measurement>,
}

impl FrameMeasurement {
    #[inline]
    pub fn single(first: Measurement) -> Self {
        Self {
            first,
            second: None,
        }
    }

    #[inline]
    pub fn pair(first: Measurement, second: Measurement) -> Self {
        Self {
            first,
            second: Some(second),
        }
    }

    pub fn placeholder(pair: bool, dual: bool) -> Self {
        let m = Measurement {
            secondary: dual.then_some(ChannelReading::PLACEHOLDER),
            ..Measurement::PLACEHOLDER
        };

        Self {
            first: m,
            second: pair.then_some(m),
        }
    }

    #[inline]
    pub fn identities(&self) -> impl Iterator<Item = &Measurement> {
        std::iter::once(&self.first).chain(self.second.as_ref())
    }

    /// `true` when at least one identity was found in the frame.
    pub fn any_detected(&self) -> bool {
        self.identities().any(|m| m.detected)
    }
}
