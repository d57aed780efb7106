use crate::detection::{Component, PairCandidates};
use crate::math;

use nalgebra as na;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// First candidate is identity 1, second is identity 2.
    Keep,
    Swap,
}

/// Minimal-turning-angle rule: keep the candidate order unless flipping it
/// brings `b - a` closer to the previous `id2 - id1` direction.
pub fn resolve(
    prev: Option<na::Vector2<f32>>,
    a: na::Point2<f32>,
    b: na::Point2<f32>,
) -> Assignment {
    let Some(prev) = prev else {
        return Assignment::Keep;
    };

    let cur = b - a;

    match (
        math::angle_between(&prev, &cur),
        math::angle_between(&prev, &-cur),
    ) {
        (Some(direct), Some(flipped)) if flipped < direct => Assignment::Swap,
        _ => Assignment::Keep,
    }
}

/// Binds the detected candidates to the two identities.
///
/// A single candidate is shared by both identities; none leaves both unset.
pub fn assign<'a>(
    candidates: PairCandidates<'a>,
    prev: Option<na::Vector2<f32>>,
) -> [Option<&'a Component>; 2] {
    match candidates {
        PairCandidates::None => [None, None],
        PairCandidates::One(c) => {
            log::debug!("single blob for two identities, sharing it");
            [Some(c), Some(c)]
        }
        PairCandidates::Two(a, b) => match resolve(prev, a.centroid, b.centroid) {
            Assignment::Keep => [Some(a), Some(b)],
            Assignment::Swap => {
                log::debug!("identity swap: blob order flipped against previous frame");
                [Some(b), Some(a)]
            }
        },
    }
}
