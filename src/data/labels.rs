//! Per-pixel training labels.

use ndarray::{Array2, ArrayD, Ix2};

use crate::data::{SpectralCube, npy};
use crate::error::{AnalysisError, Result};

/// Integer class labels with the cube's spatial shape.
///
/// Values `<= 0` mark unlabeled pixels. A value `n >= 1` is class `n - 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Array2<i64>,
}

impl LabelMap {
    /// Decode a label map from `.npy` bytes.
    pub fn from_npy_bytes(data: &[u8]) -> Result<Self> {
        Self::from_raw(npy::read_labels(data)?)
    }

    /// Validate the rank of a raw label array.
    pub fn from_raw(raw: ArrayD<i64>) -> Result<Self> {
        let shape = raw.shape().to_vec();
        let labels = raw.into_dimensionality::<Ix2>().map_err(|_| {
            AnalysisError::data_format(format!(
                "label map must be 2-D (height, width), got shape {shape:?}"
            ))
        })?;
        Ok(Self { labels })
    }

    /// Wrap an already two-dimensional label array.
    pub fn new(labels: Array2<i64>) -> Self {
        Self { labels }
    }

    /// `(height, width)`
    pub fn dim(&self) -> (usize, usize) {
        self.labels.dim()
    }

    /// Fail unless the label map covers exactly the cube's pixels.
    pub fn ensure_matches(&self, cube: &SpectralCube) -> Result<()> {
        let (height, width) = self.dim();
        if (height, width) != (cube.height(), cube.width()) {
            return Err(AnalysisError::invalid_input(format!(
                "label map is {}x{} but cube is {}x{}",
                height,
                width,
                cube.height(),
                cube.width()
            )));
        }
        Ok(())
    }

    /// Zero-based class of a pixel, or `None` when unlabeled.
    pub fn class_at(&self, row: usize, col: usize) -> Option<usize> {
        let label = self.labels[[row, col]];
        (label > 0).then(|| (label - 1) as usize)
    }

    /// `true` for every labeled pixel.
    pub fn valid_mask(&self) -> Array2<bool> {
        self.labels.mapv(|label| label > 0)
    }

    /// Number of labeled pixels.
    pub fn labeled_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label > 0).count()
    }

    /// The raw label values.
    pub fn raw(&self) -> &Array2<i64> {
        &self.labels
    }
}
