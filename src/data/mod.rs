//! Input data for an analysis request.
//!
//! This module provides:
//! - `SpectralCube`: the normalized (height, width, bands) reflectance cube
//! - `LabelMap`: optional per-pixel class labels for training
//! - `npy`: dtype-tolerant readers for NumPy `.npy` uploads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hyperleaf::data::{LabelMap, SpectralCube};
//!
//! let cube = SpectralCube::from_npy_bytes(&cube_bytes)?;
//! let labels = LabelMap::from_npy_bytes(&label_bytes)?;
//! labels.ensure_matches(&cube)?;
//! ```

mod cube;
mod labels;
pub mod npy;

pub use cube::{SpectralCube, min_max_normalize};
pub use labels::LabelMap;
