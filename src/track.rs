use crate::record::{FrameMeasurement, Measurement};

use nalgebra as na;
use std::collections::VecDeque;

/// How many accepted positions an identity remembers.
pub const HISTORY_LEN: usize = 2;

/// The last accepted positions of one identity, newest first.
///
/// Passed into every measurement instead of living in shared state, so a
/// call only sees the history its caller chose to hand over.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityHistory {
    positions: VecDeque<na::Point2<f32>>,
}

impl Default for IdentityHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityHistory {
    pub fn new() -> Self {
        Self {
            positions: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// History from explicit positions, oldest first.
    pub fn from_positions<I: IntoIterator<Item = na::Point2<f32>>>(positions: I) -> Self {
        let mut history = Self::new();
        for p in positions {
            history.push(p);
        }
        history
    }

    /// Accepts `pos` as the newest position, forgetting the oldest one.
    pub fn push(&mut self, pos: na::Point2<f32>) {
        if self.positions.len() == HISTORY_LEN {
            self.positions.pop_back();
        }
        self.positions.push_front(pos);
    }

    #[inline]
    pub fn last(&self) -> Option<na::Point2<f32>> {
        self.positions.get(0).copied()
    }

    #[inline]
    pub fn prior(&self) -> Option<na::Point2<f32>> {
        self.positions.get(1).copied()
    }

    /// Oldest first.
    #[inline]
    pub fn positions(&self) -> impl Iterator<Item = &na::Point2<f32>> {
        self.positions.iter().rev()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Histories of identity 1 and identity 2.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackHistory {
    pub identities: [IdentityHistory; 2],
}

impl TrackHistory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn first(&self) -> &IdentityHistory {
        &self.identities[0]
    }

    #[inline]
    pub fn second(&self) -> &IdentityHistory {
        &self.identities[1]
    }

    /// Last known `id2 - id1`, the direction the identity resolver keeps stable.
    pub fn relative(&self) -> Option<na::Vector2<f32>> {
        Some(self.second().last()? - self.first().last()?)
    }

    /// Records the positions accepted for one frame.
    pub fn push(&mut self, frame: &FrameMeasurement) {
        let push = |history: &mut IdentityHistory, m: &Measurement| history.push(m.position());

        push(&mut self.identities[0], &frame.first);
        if let Some(second) = &frame.second {
            push(&mut self.identities[1], second);
        }
    }

    pub fn clear(&mut self) {
        self.identities.iter_mut().for_each(IdentityHistory::clear);
    }
}
