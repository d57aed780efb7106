use crate::error::Error;

use ndarray::prelude::*;
use num_traits::AsPrimitive;

const LUMA_R: f32 = 0.2989;
const LUMA_G: f32 = 0.5870;
const LUMA_B: f32 = 0.1140;

/// A single image of the sequence as a 2-D luminance array indexed `[y, x]`.
///
/// RGB input is flattened once at construction, so every later crop works on
/// the same single channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    data: Array2<f32>,
}

impl Frame {
    #[inline]
    pub fn gray(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// Builds a frame from any primitive numeric grayscale array (`u8`, `u16`, `f64`...).
    pub fn from_gray_as<T>(data: ArrayView2<'_, T>) -> Self
    where
        T: AsPrimitive<f32>,
    {
        Self {
            data: data.mapv(|v| v.as_()),
        }
    }

    /// Accepts `(h, w, 3)` RGB or `(h, w, 4)` RGBA; alpha is ignored.
    pub fn from_rgb(data: ArrayView3<'_, f32>) -> Result<Self, Error> {
        let (height, width, channels) = data.dim();

        if channels != 3 && channels != 4 {
            return Err(Error::FrameShape(data.shape().to_vec()));
        }

        let luma = Array2::from_shape_fn((height, width), |(y, x)| {
            LUMA_R * data[[y, x, 0]] + LUMA_G * data[[y, x, 1]] + LUMA_B * data[[y, x, 2]]
        });

        Ok(Self { data: luma })
    }

    /// Dispatches on dimensionality: 2-D is taken as luminance, 3-D as RGB(A).
    pub fn from_dyn(data: ArrayViewD<'_, f32>) -> Result<Self, Error> {
        match data.ndim() {
            2 => {
                let view = data
                    .into_dimensionality::<Ix2>()
                    .map_err(|_| Error::FrameShape(Vec::new()))?;
                Ok(Self::gray(view.to_owned()))
            }
            3 => {
                let view = data
                    .into_dimensionality::<Ix3>()
                    .map_err(|_| Error::FrameShape(Vec::new()))?;
                Self::from_rgb(view)
            }
            _ => Err(Error::FrameShape(data.shape().to_vec())),
        }
    }

    /// (height, width)
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.data.dim()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }
}

impl From<Array2<f32>> for Frame {
    #[inline]
    fn from(data: Array2<f32>) -> Self {
        Self::gray(data)
    }
}
