use crate::error::Error;
use crate::record::FrameMeasurement;

use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-frame measurements of a sequence, keyed by frame number.
///
/// Tracking commits rows in increasing frame order; manual corrections go
/// through [`TrajectoryTable::replace`]. Every overwrite keeps the row it
/// replaced so a single frame can be rolled back, and a checkpoint allows the
/// whole table to be reset.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrajectoryTable {
    rows: BTreeMap<usize, FrameMeasurement>,
    #[serde(skip)]
    replaced: BTreeMap<usize, Option<FrameMeasurement>>,
    #[serde(skip)]
    checkpoint: Option<BTreeMap<usize, FrameMeasurement>>,
    #[serde(skip)]
    last_commit: Option<usize>,
}

impl TrajectoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `frames` placeholder rows, checkpointed so `reset` returns to them.
    pub fn with_placeholders(frames: usize, pair: bool, dual: bool) -> Self {
        let placeholder = FrameMeasurement::placeholder(pair, dual);
        let mut table = Self {
            rows: (0..frames).map(|i| (i, placeholder)).collect(),
            ..Self::default()
        };
        table.checkpoint();
        table
    }

    /// Starts a new append-only run; the next commit may target any frame.
    pub fn begin_run(&mut self) {
        self.last_commit = None;
    }

    /// Appends the result of `frame`, which must come after the last commit of
    /// the current run. Returns the row it overwrote, if any.
    pub fn commit(
        &mut self,
        frame: usize,
        measurement: FrameMeasurement,
    ) -> Result<Option<FrameMeasurement>, Error> {
        if let Some(last) = self.last_commit {
            if frame <= last {
                return Err(Error::OutOfOrder { frame, last });
            }
        }

        self.last_commit = Some(frame);

        Ok(self.replace(frame, measurement))
    }

    /// Overwrites `frame` regardless of run order.
    pub fn replace(
        &mut self,
        frame: usize,
        measurement: FrameMeasurement,
    ) -> Option<FrameMeasurement> {
        let previous = self.rows.insert(frame, measurement);
        self.replaced.insert(frame, previous);
        previous
    }

    /// Restores the row `frame` held before its last overwrite.
    pub fn rollback(&mut self, frame: usize) -> bool {
        let Some(previous) = self.replaced.remove(&frame) else {
            return false;
        };

        match previous {
            Some(row) => {
                self.rows.insert(frame, row);
            }
            None => {
                self.rows.remove(&frame);
            }
        }

        true
    }

    /// Drops every row at or after `frame`.
    pub fn truncate_from(&mut self, frame: usize) {
        let _ = self.rows.split_off(&frame);
        let _ = self.replaced.split_off(&frame);

        if matches!(self.last_commit, Some(last) if last >= frame) {
            self.last_commit = frame.checked_sub(1).filter(|f| self.rows.contains_key(f));
        }
    }

    pub fn checkpoint(&mut self) {
        self.checkpoint = Some(self.rows.clone());
        self.replaced.clear();
    }

    /// Wholesale return to the last checkpoint (or to an empty table).
    pub fn reset(&mut self) {
        self.rows = self.checkpoint.clone().unwrap_or_default();
        self.replaced.clear();
        self.last_commit = None;
    }

    #[inline]
    pub fn get(&self, frame: usize) -> Option<&FrameMeasurement> {
        self.rows.get(&frame)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn last_commit(&self) -> Option<usize> {
        self.last_commit
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FrameMeasurement)> {
        self.rows.iter().map(|(&frame, m)| (frame, m))
    }
}
