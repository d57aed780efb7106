//! Tracking and intensity measurement of fluorescent blobs across an image
//! sequence.
//!
//! A [`Tracker`] measures one frame at a time around a seed position: it crops
//! a window, segments it by percentile threshold, picks the object (or two
//! objects with stable identities), and reports signal and background levels
//! for one or two optical channels. [`AutoRun`] drives it over a sequence and
//! commits every frame to a [`TrajectoryTable`].

pub mod analysis;
pub mod autorun;
pub mod detection;
pub mod dual;
pub mod error;
pub mod frame;
pub mod identity;
pub mod intensity;
pub mod math;
pub mod record;
pub mod segment;
pub mod track;
pub mod tracker;
pub mod trajectory;
pub mod window;

mod predictor;

pub use autorun::{AutoRun, CancelToken, FrameSource, RunConfig, RunSummary};
pub use detection::{Component, Selection};
pub use dual::ChannelShift;
pub use error::Error;
pub use frame::Frame;
pub use predictor::{Predictor, DEFAULT_TRACK_SPEED};
pub use record::{ChannelReading, FrameMeasurement, Measurement, SENTINEL};
pub use segment::Connectivity;
pub use track::{IdentityHistory, TrackHistory};
pub use tracker::{Mode, Tracker, TrackerConfig};
pub use trajectory::TrajectoryTable;
