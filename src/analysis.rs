//! Traces derived from a finished [`TrajectoryTable`].

use crate::record::{ChannelReading, Measurement};
use crate::trajectory::TrajectoryTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Primary,
    Secondary,
}

fn identity_rows(
    table: &TrajectoryTable,
    identity: Identity,
) -> impl Iterator<Item = (usize, &Measurement)> {
    table.iter().filter_map(move |(frame, m)| match identity {
        Identity::First => Some((frame, &m.first)),
        Identity::Second => m.second.as_ref().map(|s| (frame, s)),
    })
}

fn channel_of(m: &Measurement, channel: Channel) -> Option<&ChannelReading> {
    match channel {
        Channel::Primary => Some(&m.primary),
        Channel::Secondary => m.secondary.as_ref(),
    }
}

/// `F / Bg - 1` per frame. Unmeasured rows carry the sentinel and come out
/// as `0`.
pub fn ratio_trace(table: &TrajectoryTable, identity: Identity, channel: Channel) -> Vec<(usize, f32)> {
    identity_rows(table, identity)
        .filter_map(|(frame, m)| channel_of(m, channel).map(|r| (frame, r.ratio())))
        .collect()
}

/// `(F2 - Bg2) / (F1 - Bg1)` per frame; frames without a defined ratio are
/// left out.
pub fn channel_ratio_trace(table: &TrajectoryTable, identity: Identity) -> Vec<(usize, f32)> {
    identity_rows(table, identity)
        .filter_map(|(frame, m)| m.channel_ratio().map(|r| (frame, r)))
        .collect()
}

/// Centred moving average over `n` samples. The output has the input's
/// length; the window shrinks near both ends.
pub fn moving_average(values: &[f32], n: usize) -> Vec<f32> {
    if n <= 1 {
        return values.to_vec();
    }

    let before = n / 2;
    let after = n - before;

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(values.len());
            let span = &values[lo..hi];

            span.iter().sum::<f32>() / span.len() as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FrameMeasurement;
    use approx::assert_relative_eq;

    fn reading(signal: f32, background: f32) -> ChannelReading {
        ChannelReading {
            signal,
            background,
            ..ChannelReading::PLACEHOLDER
        }
    }

    fn table() -> TrajectoryTable {
        let mut t = TrajectoryTable::with_placeholders(3, true, true);
        let m = Measurement {
            primary: reading(30.0, 10.0),
            secondary: Some(reading(25.0, 5.0)),
            detected: true,
        };
        t.commit(1, FrameMeasurement::pair(m, Measurement::PLACEHOLDER))
            .unwrap();
        t
    }

    #[test]
    fn test_ratio_trace() {
        let t = table();

        let red = ratio_trace(&t, Identity::First, Channel::Primary);
        assert_eq!(red.len(), 3);
        assert_relative_eq!(red[0].1, 0.0);
        assert_relative_eq!(red[1].1, 2.0);

        let green = ratio_trace(&t, Identity::First, Channel::Secondary);
        assert_relative_eq!(green[1].1, 4.0);

        // second identity of frame 1 was committed without a second channel
        let second = ratio_trace(&t, Identity::Second, Channel::Secondary);
        assert_eq!(second.iter().map(|(f, _)| *f).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_channel_ratio_skips_undefined() {
        let trace = channel_ratio_trace(&table(), Identity::First);

        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0].0, 1);
        assert_relative_eq!(trace[0].1, 1.0);
    }

    #[test]
    fn test_moving_average_shrinks_at_ends() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];

        let avg = moving_average(&v, 3);

        assert_eq!(avg.len(), 5);
        assert_relative_eq!(avg[0], 1.5);
        assert_relative_eq!(avg[2], 3.0);
        assert_relative_eq!(avg[4], 4.5);
        assert_eq!(moving_average(&v, 1), v.to_vec());
        assert!(moving_average(&[], 5).is_empty());
    }
}
