use crate::detection::{self, Component, Selection};
use crate::dual::{self, ChannelShift};
use crate::error::Error;
use crate::frame::Frame;
use crate::identity;
use crate::intensity::{self, Levels};
use crate::predictor::{Predictor, DEFAULT_TRACK_SPEED};
use crate::record::{ChannelReading, FrameMeasurement, Measurement};
use crate::segment::{self, Connectivity, Segmentation, PAIR_OPENING, SINGLE_OPENING};
use crate::track::TrackHistory;
use crate::window::Window;

use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// One object per frame.
    #[default]
    Single,
    /// Two neighbouring objects with identities carried across frames.
    Pair,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Half edge of the search and background window.
    pub bg_half_width: usize,
    /// Half edge of the box excluded from the background around the object.
    pub neuron_half_width: usize,
    /// Segmentation percentile in `[0, 100]`.
    pub threshold_percentile: f32,
    pub mode: Mode,
    /// Enables dual-channel measurement.
    pub channel_shift: Option<ChannelShift>,
    pub connectivity: Connectivity,
    pub selection: Selection,
    /// Damping of the frame-to-frame displacement used for the next seed.
    pub track_speed: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bg_half_width: 100,
            neuron_half_width: 25,
            threshold_percentile: 95.0,
            mode: Mode::Single,
            channel_shift: None,
            connectivity: Connectivity::Four,
            selection: Selection::Brightest,
            track_speed: DEFAULT_TRACK_SPEED,
        }
    }
}

impl TrackerConfig {
    /// From full box edge lengths, the way they are entered interactively.
    pub fn from_box_sizes(bg_box: usize, neuron_box: usize, threshold_percentile: f32) -> Self {
        let half = |edge: usize| (edge as f32 / 2.0).round() as usize;

        Self {
            bg_half_width: half(bg_box),
            neuron_half_width: half(neuron_box),
            threshold_percentile,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=100.0).contains(&self.threshold_percentile) {
            return Err(Error::invalid(
                "threshold_percentile",
                format!("{} is outside [0, 100]", self.threshold_percentile),
            ));
        }

        if self.bg_half_width == 0 {
            return Err(Error::invalid("bg_half_width", "must be positive"));
        }

        if !(0.0..1.0).contains(&self.track_speed) {
            return Err(Error::invalid(
                "track_speed",
                format!("{} is outside [0, 1)", self.track_speed),
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn is_dual(&self) -> bool {
        self.channel_shift.is_some()
    }

    #[inline]
    fn opening_size(&self) -> usize {
        match self.mode {
            Mode::Single => SINGLE_OPENING,
            Mode::Pair => PAIR_OPENING,
        }
    }
}

/// Stateless per-frame measurement.
///
/// Everything that carries over between frames comes in through the
/// [`TrackHistory`] argument; identical inputs always give identical output.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    predictor: Predictor,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            predictor: Predictor::new(config.track_speed),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    /// Seed for the next frame: identity 1's extrapolated position, or
    /// `initial` if nothing has been accepted yet.
    #[inline]
    pub fn next_seed(&self, history: &TrackHistory, initial: na::Point2<f32>) -> na::Point2<f32> {
        self.predictor.seed(history.first(), initial)
    }

    /// Measures one frame around `seed`.
    pub fn measure(
        &self,
        frame: &Frame,
        seed: na::Point2<f32>,
        history: &TrackHistory,
    ) -> FrameMeasurement {
        log::trace!("measuring at ({:.2}, {:.2}) in {:?} mode", seed.x, seed.y, self.config.mode);

        match self.config.mode {
            Mode::Single => FrameMeasurement::single(self.measure_single(frame, seed)),
            Mode::Pair => {
                let [first, second] = self.measure_pair(frame, seed, history.relative());
                FrameMeasurement::pair(first, second)
            }
        }
    }

    fn segment(&self, window: &Window<'_>) -> Segmentation {
        segment::segment(
            window,
            self.config.threshold_percentile,
            self.config.opening_size(),
            self.config.connectivity,
        )
    }

    fn measure_single(&self, frame: &Frame, seed: na::Point2<f32>) -> Measurement {
        let window = Window::crop(frame, seed, self.config.bg_half_width);
        let seg = self.segment(&window);
        let selected = detection::select(&seg.components, self.config.selection, window.to_local(seed));

        self.measure_object(frame, seed, &window, &seg, selected)
    }

    fn measure_pair(
        &self,
        frame: &Frame,
        seed: na::Point2<f32>,
        prev: Option<na::Vector2<f32>>,
    ) -> [Measurement; 2] {
        let window = Window::crop(frame, seed, self.config.bg_half_width);
        let seg = self.segment(&window);
        let assigned = identity::assign(detection::select_pair(&seg.components), prev);

        assigned.map(|component| self.measure_object(frame, seed, &window, &seg, component))
    }

    fn measure_object(
        &self,
        frame: &Frame,
        seed: na::Point2<f32>,
        window: &Window<'_>,
        seg: &Segmentation,
        selected: Option<&Component>,
    ) -> Measurement {
        let (Some(component), Some(thresholds)) = (selected, seg.thresholds) else {
            return self.fallback(seed, window);
        };

        let mask = seg.mask(component.label);
        let levels = intensity::levels(
            &window.pixels,
            &mask.view(),
            thresholds.hi,
            component.centroid,
            self.config.neuron_half_width,
        );
        let position = window.to_frame(component.centroid);

        let secondary = self.config.channel_shift.map(|shift| {
            let projection = dual::project(
                frame,
                seed,
                shift,
                self.config.bg_half_width,
                &mask.view(),
                position,
                self.config.neuron_half_width,
                self.config.threshold_percentile,
            );

            ChannelReading::new(projection.levels, projection.position, component.area)
        });

        Measurement {
            primary: ChannelReading::new(levels, position, component.area),
            secondary,
            detected: true,
        }
    }

    /// No object: keep the seed, report the whole window as area and leave
    /// every level unmeasured.
    fn fallback(&self, seed: na::Point2<f32>, window: &Window<'_>) -> Measurement {
        if window.is_empty() {
            log::warn!("seed ({:.1}, {:.1}) is outside the frame", seed.x, seed.y);
        } else {
            log::debug!("no component around ({:.1}, {:.1}), keeping seed", seed.x, seed.y);
        }

        let area = window.area();

        Measurement {
            primary: ChannelReading::new(Levels::UNMEASURED, seed, area),
            secondary: self
                .config
                .channel_shift
                .map(|shift| ChannelReading::new(Levels::UNMEASURED, shift.apply(seed), area)),
            detected: false,
        }
    }
}
