//! Percentile thresholding, binary morphology and connected-component
//! labeling of a single window.
//!
//! The foreground is `pixel > lo`, where `lo` is the configured percentile of
//! the window. Opening with a k×k square removes specks smaller than the
//! element, including those touching the window edge, closing with a 3×3 cross bridges one-pixel gaps, and the surviving
//! regions are labeled with a two-pass union-find scan. Component statistics
//! are taken over the original intensities, not the binary mask.

use crate::detection::Component;
use crate::math;
use crate::window::Window;

use nalgebra as na;
use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

/// Opening element edge in single-object mode.
pub const SINGLE_OPENING: usize = 2;
/// Opening element edge in two-object mode; coarse enough to keep two
/// neighbouring cells apart without shattering either of them.
pub const PAIR_OPENING: usize = 4;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    #[default]
    Four,
    Eight,
}

impl Connectivity {
    /// Already-visited neighbours in raster order.
    fn backward(self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(-1, 0), (0, -1)],
            Connectivity::Eight => &[(-1, -1), (-1, 0), (-1, 1), (0, -1)],
        }
    }
}

/// Loose and strict cut levels for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Segmentation cut at percentile `p`.
    pub lo: f32,
    /// Signal cut at percentile `(100 + p) / 2`.
    pub hi: f32,
}

impl Thresholds {
    pub fn of(pixels: &ArrayView2<'_, f32>, percentile: f32) -> Option<Self> {
        let lo = math::percentile(pixels.iter(), percentile)?;
        let hi = math::percentile(pixels.iter(), strict_percentile(percentile))?;

        Some(Self { lo, hi })
    }
}

#[inline]
pub fn strict_percentile(p: f32) -> f32 {
    (100.0 + p) / 2.0
}

#[derive(Debug, Clone)]
pub struct Segmentation {
    /// `0` is background, components are numbered from `1`.
    pub labels: Array2<usize>,
    pub components: Vec<Component>,
    pub thresholds: Option<Thresholds>,
}

impl Segmentation {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Pixel mask of one labeled component.
    pub fn mask(&self, label: usize) -> Array2<bool> {
        self.labels.mapv(|l| l == label)
    }
}

/// Square k×k element anchored at index `k / 2`, as offsets `(dy, dx)`.
fn square(k: usize) -> Vec<(isize, isize)> {
    let origin = (k / 2) as isize;
    let range = -origin..(k as isize - origin);

    range
        .clone()
        .flat_map(|dy| range.clone().map(move |dx| (dy, dx)))
        .collect()
}

const CROSS: [(isize, isize); 5] = [(0, 0), (-1, 0), (1, 0), (0, -1), (0, 1)];

#[inline]
fn neighbour(
    (h, w): (usize, usize),
    (y, x): (usize, usize),
    (dy, dx): (isize, isize),
) -> Option<(usize, usize)> {
    let ny = y as isize + dy;
    let nx = x as isize + dx;

    if ny >= 0 && nx >= 0 && (ny as usize) < h && (nx as usize) < w {
        Some((ny as usize, nx as usize))
    } else {
        None
    }
}

/// Pixel survives if every `p + o` is set; `border` stands in for pixels
/// outside the mask.
pub fn erode(
    mask: &ArrayView2<'_, bool>,
    element: &[(isize, isize)],
    border: bool,
) -> Array2<bool> {
    let dim = mask.dim();

    Array2::from_shape_fn(dim, |p| {
        element
            .iter()
            .all(|&o| neighbour(dim, p, o).map_or(border, |q| mask[q]))
    })
}

/// Pixel is set if any in-bounds `p - o` is set.
pub fn dilate(mask: &ArrayView2<'_, bool>, element: &[(isize, isize)]) -> Array2<bool> {
    let dim = mask.dim();

    Array2::from_shape_fn(dim, |p| {
        element
            .iter()
            .filter_map(|&(dy, dx)| neighbour(dim, p, (-dy, -dx)))
            .any(|q| mask[q])
    })
}

/// Outside the window counts as background, so specks on the edge are
/// removed like any other.
pub fn opening(mask: &ArrayView2<'_, bool>, k: usize) -> Array2<bool> {
    let element = square(k);
    dilate(&erode(mask, &element, false).view(), &element)
}

/// Outside the window counts as foreground here, which keeps the closing
/// extensive at the edges.
pub fn closing(mask: &ArrayView2<'_, bool>) -> Array2<bool> {
    erode(&dilate(mask, &CROSS).view(), &CROSS, true)
}

fn find_root(parents: &mut [usize], label: usize) -> usize {
    let mut current = label;

    while current != parents[current] {
        parents[current] = parents[parents[current]];
        current = parents[current];
    }

    current
}

fn union(parents: &mut [usize], a: usize, b: usize) {
    let ra = find_root(parents, a);
    let rb = find_root(parents, b);

    if ra < rb {
        parents[rb] = ra;
    } else if rb < ra {
        parents[ra] = rb;
    }
}

/// Two-pass union-find labeling; returns the label image and the label count.
pub fn label(mask: &ArrayView2<'_, bool>, connectivity: Connectivity) -> (Array2<usize>, usize) {
    let dim = mask.dim();
    let mut labels = Array2::<usize>::zeros(dim);
    let mut parents = vec![0usize];

    for y in 0..dim.0 {
        for x in 0..dim.1 {
            if !mask[[y, x]] {
                continue;
            }

            let mut current = 0;
            for &o in connectivity.backward() {
                let Some(q) = neighbour(dim, (y, x), o) else {
                    continue;
                };

                let l = labels[q];
                if l == 0 {
                    continue;
                }

                if current == 0 {
                    current = l;
                } else if l != current {
                    union(&mut parents, current, l);
                }
            }

            if current == 0 {
                current = parents.len();
                parents.push(current);
            }

            labels[[y, x]] = current;
        }
    }

    let mut relabel = vec![0usize; parents.len()];
    let mut count = 0;
    for l in 1..parents.len() {
        let root = find_root(&mut parents, l);
        if relabel[root] == 0 {
            count += 1;
            relabel[root] = count;
        }
        relabel[l] = relabel[root];
    }

    labels.mapv_inplace(|l| relabel[l]);

    (labels, count)
}

/// Centroid, area and mean brightness per label, over the original intensities.
pub fn measure_components(
    pixels: &ArrayView2<'_, f32>,
    labels: &ArrayView2<'_, usize>,
    count: usize,
) -> Vec<Component> {
    // (mass, mass * x, mass * y, sum x, sum y, area)
    let mut acc = vec![(0.0f64, 0.0f64, 0.0f64, 0.0f64, 0.0f64, 0usize); count + 1];

    for ((y, x), &l) in labels.indexed_iter() {
        if l == 0 {
            continue;
        }

        let v = pixels[[y, x]] as f64;
        let a = &mut acc[l];
        a.0 += v;
        a.1 += v * x as f64;
        a.2 += v * y as f64;
        a.3 += x as f64;
        a.4 += y as f64;
        a.5 += 1;
    }

    acc.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, a)| a.5 > 0)
        .map(|(label, &(mass, mx, my, sx, sy, area))| {
            let n = area as f64;
            let centroid = if mass.abs() > f64::EPSILON {
                na::Point2::new((mx / mass) as f32, (my / mass) as f32)
            } else {
                na::Point2::new((sx / n) as f32, (sy / n) as f32)
            };

            Component {
                label,
                centroid,
                area,
                brightness: (mass / n) as f32,
            }
        })
        .collect()
}

/// Runs the whole segmentation of one window.
pub fn segment(
    window: &Window<'_>,
    percentile: f32,
    opening_size: usize,
    connectivity: Connectivity,
) -> Segmentation {
    let Some(thresholds) = Thresholds::of(&window.pixels, percentile) else {
        return Segmentation {
            labels: Array2::zeros(window.dim()),
            components: Vec::new(),
            thresholds: None,
        };
    };

    let raw = window.pixels.mapv(|v| v > thresholds.lo);
    let cleaned = closing(&opening(&raw.view(), opening_size).view());
    let (labels, count) = label(&cleaned.view(), connectivity);
    let components = measure_components(&window.pixels, &labels.view(), count);

    log::trace!(
        "segmented window {:?}: lo {:.3} hi {:.3}, {} component(s)",
        window.dim(),
        thresholds.lo,
        thresholds.hi,
        components.len()
    );

    Segmentation {
        labels,
        components,
        thresholds: Some(thresholds),
    }
}
