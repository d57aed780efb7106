use approx::assert_relative_eq;
use nalgebra as na;
use ndarray::prelude::*;
use pia_track::{
    AutoRun, CancelToken, ChannelShift, Error, Frame, FrameSource, IdentityHistory, Mode, Predictor,
    RunConfig, TrackHistory, Tracker, TrackerConfig, TrajectoryTable, SENTINEL,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Flat background of 10 with 5×5 squares centred on each `(x, y, value)`.
fn scene(h: usize, w: usize, blobs: &[(usize, usize, f32)]) -> Frame {
    let mut data = Array2::from_elem((h, w), 10.0f32);
    for &(x, y, v) in blobs {
        data.slice_mut(s![y - 2..y + 3, x - 2..x + 3]).fill(v);
    }
    Frame::gray(data)
}

fn config(bg: usize, neuron: usize, threshold: f32) -> TrackerConfig {
    TrackerConfig {
        bg_half_width: bg,
        neuron_half_width: neuron,
        threshold_percentile: threshold,
        ..TrackerConfig::default()
    }
}

#[test]
fn single_square_is_located_and_measured() {
    init();

    let tracker = Tracker::new(config(15, 5, 90.0)).unwrap();
    let frame = scene(50, 50, &[(20, 20, 180.0)]);
    let history = TrackHistory::new();

    let m = tracker.measure(&frame, na::Point2::new(21.0, 19.0), &history);

    assert!(m.second.is_none());
    let first = m.first;
    assert!(first.detected);
    assert!(na::distance(&first.position(), &na::Point2::new(20.0, 20.0)) <= 1.0);
    assert_relative_eq!(first.primary.signal, 180.0);
    assert_relative_eq!(first.primary.background, 10.0);

    // same inputs, same record
    assert_eq!(m, tracker.measure(&frame, na::Point2::new(21.0, 19.0), &history));
}

#[test]
fn oversized_window_at_origin_covers_whole_frame() {
    init();

    let tracker = Tracker::new(config(100, 5, 90.0)).unwrap();
    let frame = scene(30, 30, &[(10, 10, 120.0)]);

    let m = tracker
        .measure(&frame, na::Point2::new(0.0, 0.0), &TrackHistory::new())
        .first;

    assert!(m.detected);
    assert_relative_eq!(m.primary.x, 10.0, epsilon = 1e-3);
    assert_relative_eq!(m.primary.y, 10.0, epsilon = 1e-3);
    assert_relative_eq!(m.primary.area, 25.0);
    assert_relative_eq!(m.primary.background, 10.0);
}

#[test]
fn dual_channel_mismatch_reports_sentinels() {
    init();

    let tracker = Tracker::new(TrackerConfig {
        channel_shift: Some(ChannelShift::new(0, 20)),
        ..config(15, 5, 90.0)
    })
    .unwrap();
    // first window is clipped at the top edge, the shifted one is not
    let frame = scene(50, 50, &[(20, 10, 150.0)]);

    let m = tracker
        .measure(&frame, na::Point2::new(20.0, 10.0), &TrackHistory::new())
        .first;

    assert!(m.detected);
    assert_relative_eq!(m.primary.signal, 150.0);

    let second = m.secondary.unwrap();
    assert_eq!(second.signal, SENTINEL);
    assert_eq!(second.background, SENTINEL);
    assert_eq!(second.position(), na::Point2::new(20.0, 30.0));
    assert_relative_eq!(second.ratio(), 0.0);
}

#[test]
fn identities_survive_brightness_swap() {
    init();

    let tracker = Tracker::new(TrackerConfig {
        mode: Mode::Pair,
        ..config(25, 5, 90.0)
    })
    .unwrap();
    let mut frames = vec![
        scene(60, 60, &[(20, 30, 200.0), (40, 30, 150.0)]),
        scene(60, 60, &[(20, 30, 150.0), (40, 30, 200.0)]),
    ];
    let mut table = TrajectoryTable::new();

    let summary = AutoRun::new(&tracker, RunConfig::default(), na::Point2::new(30.0, 30.0))
        .run(&mut frames, &mut table)
        .unwrap();
    assert_eq!(summary.measured, 2);

    for frame in 0..2 {
        let row = table.get(frame).unwrap();
        let second = row.second.unwrap();

        assert_relative_eq!(row.first.primary.x, 20.0, epsilon = 1e-3);
        assert_relative_eq!(second.primary.x, 40.0, epsilon = 1e-3);
    }

    let swapped = table.get(1).unwrap();
    assert_relative_eq!(swapped.first.primary.signal, 150.0);
    assert_relative_eq!(swapped.second.unwrap().primary.signal, 200.0);
}

#[test]
fn seed_extrapolation() {
    let history =
        IdentityHistory::from_positions([na::Point2::new(10.0, 10.0), na::Point2::new(12.0, 11.0)]);

    let seed = Predictor::new(0.2).predict(&history).unwrap();

    assert_relative_eq!(seed.x, 12.4, epsilon = 1e-5);
    assert_relative_eq!(seed.y, 11.2, epsilon = 1e-5);
}

#[test]
fn autorun_follows_moving_blob() {
    init();

    let tracker = Tracker::new(config(12, 4, 90.0)).unwrap();
    let mut frames: Vec<Frame> = (0..8)
        .map(|i| scene(40, 60, &[(12 + 3 * i, 20, 90.0)]))
        .collect();
    let mut table = TrajectoryTable::with_placeholders(8, false, false);

    let summary = AutoRun::new(&tracker, RunConfig::default(), na::Point2::new(12.0, 20.0))
        .run(&mut frames, &mut table)
        .unwrap();

    assert_eq!(summary.measured, 8);
    assert_eq!(summary.undetected, 0);
    assert!(!summary.cancelled);

    for (frame, row) in table.iter() {
        assert!(row.first.detected, "frame {}", frame);
        assert_relative_eq!(row.first.primary.x, (12 + 3 * frame) as f32, epsilon = 1e-3);
    }

    table.reset();
    assert!(!table.get(3).unwrap().any_detected());
}

/// Cancels the run as soon as a given frame has been handed out.
struct CancellingSource {
    frames: Vec<Frame>,
    after: usize,
    token: CancelToken,
}

impl FrameSource for CancellingSource {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn frame(&mut self, index: usize) -> Result<Frame, Error> {
        if index == self.after {
            self.token.cancel();
        }

        if index == 6 {
            return Err(Error::FrameUnavailable {
                index,
                reason: "decoder gave up".to_string(),
            });
        }

        Ok(self.frames[index].clone())
    }
}

#[test]
fn autorun_cancellation_keeps_committed_frames() {
    init();

    let tracker = Tracker::new(config(12, 4, 90.0)).unwrap();
    let token = CancelToken::new();
    let mut source = CancellingSource {
        frames: vec![scene(40, 40, &[(20, 20, 90.0)]); 10],
        after: 3,
        token: token.clone(),
    };
    let mut table = TrajectoryTable::new();

    let summary = AutoRun::new(&tracker, RunConfig::default(), na::Point2::new(20.0, 20.0))
        .with_cancel(token)
        .run(&mut source, &mut table)
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.measured, 4);
    assert_eq!(table.iter().map(|(f, _)| f).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}

#[test]
fn autorun_stops_on_unavailable_frame() {
    init();

    let tracker = Tracker::new(config(12, 4, 90.0)).unwrap();
    let mut source = CancellingSource {
        frames: vec![scene(40, 40, &[(20, 20, 90.0)]); 10],
        after: usize::MAX,
        token: CancelToken::new(),
    };
    let mut table = TrajectoryTable::new();

    let mut run = AutoRun::new(
        &tracker,
        RunConfig {
            start: 4,
            ..RunConfig::default()
        },
        na::Point2::new(20.0, 20.0),
    );
    let res = run.run(&mut source, &mut table);

    assert!(matches!(res, Err(Error::FrameUnavailable { index: 6, .. })));
    assert_eq!(table.len(), 2);

    // resume after the bad frame with the accepted positions so far
    let history = run.history().clone();
    let summary = AutoRun::new(
        &tracker,
        RunConfig {
            start: 7,
            ..RunConfig::default()
        },
        na::Point2::new(0.0, 0.0),
    )
    .with_history(history)
    .run(&mut source, &mut table)
    .unwrap();

    assert_eq!(summary.measured, 3);
    assert_relative_eq!(table.get(9).unwrap().first.primary.x, 20.0, epsilon = 1e-3);
}

#[test]
fn config_round_trips_through_json() {
    let config = TrackerConfig {
        mode: Mode::Pair,
        channel_shift: Some(ChannelShift::default()),
        ..TrackerConfig::from_box_sizes(150, 41, 97.5)
    };

    let json = serde_json::to_string(&config).unwrap();
    let back: TrackerConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
    assert_eq!(back.bg_half_width, 75);

    let partial: TrackerConfig = serde_json::from_str(r#"{"mode": "Pair"}"#).unwrap();
    assert_eq!(partial.mode, Mode::Pair);
    assert_eq!(partial.bg_half_width, TrackerConfig::default().bg_half_width);
    assert!(partial.validate().is_ok());
}
