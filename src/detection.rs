use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// One connected blob of a segmented window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    /// Label in the segmentation's label image (1-based).
    pub label: usize,
    /// Intensity-weighted centroid `(x, y)` in window coordinates.
    pub centroid: na::Point2<f32>,
    pub area: usize,
    pub brightness: f32,
}

/// Tie-breaker used when a window holds more than one component.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Highest mean brightness wins.
    #[default]
    Brightest,
    /// Centroid closest to the seed wins.
    Nearest,
}

/// Outcome of choosing candidates for two identities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairCandidates<'a> {
    None,
    One(&'a Component),
    /// The brightest and the second brightest component, in that order.
    Two(&'a Component, &'a Component),
}

#[inline]
fn by_brightness(a: &&Component, b: &&Component) -> std::cmp::Ordering {
    a.brightness.total_cmp(&b.brightness)
}

/// Picks the tracked object from the components of one window.
///
/// A single component is taken regardless of its brightness; `seed` is in
/// window coordinates and only consulted by [`Selection::Nearest`].
pub fn select(
    components: &[Component],
    selection: Selection,
    seed: na::Point2<f32>,
) -> Option<&Component> {
    match components {
        [] => None,
        [only] => Some(only),
        _ => match selection {
            Selection::Brightest => components.iter().max_by(by_brightness),
            Selection::Nearest => components.iter().min_by(|a, b| {
                na::distance_squared(&a.centroid, &seed)
                    .total_cmp(&na::distance_squared(&b.centroid, &seed))
            }),
        },
    }
}

pub fn select_pair(components: &[Component]) -> PairCandidates<'_> {
    let mut ranked: Vec<&Component> = components.iter().collect();
    ranked.sort_by(|a, b| by_brightness(b, a));

    match ranked.as_slice() {
        [] => PairCandidates::None,
        [only] => PairCandidates::One(*only),
        [first, second, ..] => PairCandidates::Two(*first, *second),
    }
}
