//! Spectral vegetation indices.
//!
//! Both indices are normalized differences between a near-infrared band and
//! a visible band:
//!
//! - NDVI = (NIR - Red) / (NIR + Red)
//! - LCI  = (NIR - Green) / (NIR + Green)
//!
//! A small epsilon keeps the denominator away from zero, so flat or dark
//! pixels yield 0 instead of NaN.

use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

use crate::constants::{INDEX_EPSILON, bands};
use crate::data::SpectralCube;

/// Band positions used for the indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandSelection {
    /// Near-infrared band
    pub nir: usize,
    /// Red band
    pub red: usize,
    /// Green band
    pub green: usize,
}

impl Default for BandSelection {
    fn default() -> Self {
        Self {
            nir: bands::NIR,
            red: bands::RED,
            green: bands::GREEN,
        }
    }
}

impl BandSelection {
    /// Substitute the last band for any position beyond `band_count`.
    pub fn clamped(&self, band_count: usize) -> Self {
        Self {
            nir: clamp_band(self.nir, band_count),
            red: clamp_band(self.red, band_count),
            green: clamp_band(self.green, band_count),
        }
    }
}

/// Clamp a band position into `[0, band_count - 1]`.
pub fn clamp_band(index: usize, band_count: usize) -> usize {
    index.min(band_count.saturating_sub(1))
}

/// `(a - b) / (a + b + ε)` per pixel.
pub fn normalized_difference(a: ArrayView2<'_, f32>, b: ArrayView2<'_, f32>) -> Array2<f32> {
    Zip::from(&a)
        .and(&b)
        .map_collect(|&a, &b| (a - b) / (a + b + INDEX_EPSILON))
}

/// Normalized Difference Vegetation Index.
pub fn ndvi(cube: &SpectralCube, selection: &BandSelection) -> Array2<f32> {
    let selection = selection.clamped(cube.bands());
    normalized_difference(cube.band(selection.nir), cube.band(selection.red))
}

/// Leaf Chlorophyll Index.
pub fn lci(cube: &SpectralCube, selection: &BandSelection) -> Array2<f32> {
    let selection = selection.clamped(cube.bands());
    normalized_difference(cube.band(selection.nir), cube.band(selection.green))
}

/// Mean over every pixel; 0 for an empty map.
pub fn mean(map: &Array2<f32>) -> f64 {
    if map.is_empty() {
        return 0.0;
    }
    map.iter().map(|&v| f64::from(v)).sum::<f64>() / map.len() as f64
}

/// NDVI and LCI maps of one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct VegetationIndices {
    /// NDVI per pixel
    pub ndvi: Array2<f32>,
    /// LCI per pixel
    pub lci: Array2<f32>,
}

impl VegetationIndices {
    /// Compute both indices for `cube`.
    pub fn compute(cube: &SpectralCube, selection: &BandSelection) -> Self {
        let clamped = selection.clamped(cube.bands());
        if clamped != *selection {
            log::debug!(
                "Cube has {} bands; index bands clamped from {:?} to {:?}",
                cube.bands(),
                selection,
                clamped
            );
        }
        Self {
            ndvi: ndvi(cube, &clamped),
            lci: lci(cube, &clamped),
        }
    }

    /// Whole-scene NDVI mean.
    pub fn ndvi_mean(&self) -> f64 {
        mean(&self.ndvi)
    }

    /// Whole-scene LCI mean.
    pub fn lci_mean(&self) -> f64 {
        mean(&self.lci)
    }
}
