//! Normalized spectral cube.

use ndarray::{Array3, ArrayD, ArrayView1, ArrayView2, Axis, Ix3};

use crate::constants::NORMALIZE_EPSILON;
use crate::data::npy;
use crate::error::{AnalysisError, Result};

/// Reflectance cube laid out as (height, width, bands) with values scaled
/// to `[0, 1]` over the whole cube.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralCube {
    data: Array3<f32>,
}

impl SpectralCube {
    /// Decode and normalize a cube from `.npy` bytes.
    pub fn from_npy_bytes(data: &[u8]) -> Result<Self> {
        Self::from_raw(npy::read_reflectance(data)?)
    }

    /// Validate the layout of a raw array and normalize it.
    pub fn from_raw(raw: ArrayD<f64>) -> Result<Self> {
        let shape = raw.shape().to_vec();
        log::debug!("SpectralCube: raw array shape = {:?}", shape);

        let raw = raw.into_dimensionality::<Ix3>().map_err(|_| {
            AnalysisError::data_format(format!(
                "cube must be 3-D (height, width, bands), got {} dimension(s) {:?}",
                shape.len(),
                shape
            ))
        })?;
        if raw.is_empty() {
            return Err(AnalysisError::data_format(format!(
                "cube has an empty dimension: {shape:?}"
            )));
        }
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::data_format(
                "cube contains NaN or infinite values",
            ));
        }

        Ok(Self {
            data: min_max_normalize(&raw),
        })
    }

    /// `[height, width, bands]`
    pub fn shape(&self) -> [usize; 3] {
        let (height, width, bands) = self.data.dim();
        [height, width, bands]
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Number of spectral bands
    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    /// One band as a (height, width) view.
    ///
    /// Panics if `index >= bands()`; use a clamped index.
    pub fn band(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(2), index)
    }

    /// Reflectance vector of one pixel.
    pub fn spectrum(&self, row: usize, col: usize) -> ArrayView1<'_, f32> {
        self.data.index_axis(Axis(0), row).index_axis_move(Axis(0), col)
    }

    /// The underlying normalized array.
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}

/// Scale `raw` so its global minimum maps to 0 and its maximum to 1.
///
/// A constant cube maps to all zeros.
pub fn min_max_normalize(raw: &Array3<f64>) -> Array3<f32> {
    let (min, max) = raw
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
    let scale = max - min + NORMALIZE_EPSILON;
    raw.mapv(|v| ((v - min) / scale) as f32)
}
