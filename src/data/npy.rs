//! Reading NumPy `.npy` arrays.
//!
//! Uploaded cubes and label maps arrive as raw `.npy` bytes with whatever
//! dtype the producer used. Each reader tries the supported dtypes in order
//! of likelihood and widens the result to a single working type.

use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::{ReadNpyExt, ReadableElement};

use crate::constants::ARRAY_EXTENSION;
use crate::error::{AnalysisError, Result};

/// NumPy magic bytes: \x93NUMPY
const MAGIC: &[u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

/// Check for the NumPy magic prefix.
pub fn is_npy(data: &[u8]) -> bool {
    data.len() >= MAGIC.len() && data.starts_with(MAGIC)
}

fn try_read<T: ReadableElement>(data: &[u8]) -> Option<ArrayD<T>> {
    ArrayD::<T>::read_npy(data).ok()
}

fn require_npy(data: &[u8], what: &str) -> Result<()> {
    if is_npy(data) {
        Ok(())
    } else {
        Err(AnalysisError::data_format(format!(
            "{what} is not a NumPy .npy file"
        )))
    }
}

/// Read an array of reflectance values as `f64`.
///
/// Supported dtypes: `f32`, `f64`, `u8`, `u16`, `i16`, `i32`.
pub fn read_reflectance(data: &[u8]) -> Result<ArrayD<f64>> {
    require_npy(data, "cube")?;

    // f32 is most common for scientific data
    if let Some(array) = try_read::<f32>(data) {
        return Ok(array.mapv(f64::from));
    }
    if let Some(array) = try_read::<f64>(data) {
        return Ok(array);
    }
    if let Some(array) = try_read::<u16>(data) {
        return Ok(array.mapv(f64::from));
    }
    if let Some(array) = try_read::<u8>(data) {
        return Ok(array.mapv(f64::from));
    }
    if let Some(array) = try_read::<i16>(data) {
        return Ok(array.mapv(f64::from));
    }
    if let Some(array) = try_read::<i32>(data) {
        return Ok(array.mapv(f64::from));
    }

    Err(AnalysisError::data_format(
        "failed to read cube: unsupported dtype or invalid format",
    ))
}

/// Read an array of integer class labels as `i64`.
///
/// Supported dtypes: every signed and unsigned integer width NumPy
/// commonly writes, plus `f32`/`f64` holding integral values.
pub fn read_labels(data: &[u8]) -> Result<ArrayD<i64>> {
    require_npy(data, "label map")?;

    if let Some(array) = try_read::<i64>(data) {
        return Ok(array);
    }
    if let Some(array) = try_read::<i32>(data) {
        return Ok(array.mapv(i64::from));
    }
    if let Some(array) = try_read::<u8>(data) {
        return Ok(array.mapv(i64::from));
    }
    if let Some(array) = try_read::<u16>(data) {
        return Ok(array.mapv(i64::from));
    }
    if let Some(array) = try_read::<i16>(data) {
        return Ok(array.mapv(i64::from));
    }
    if let Some(array) = try_read::<u32>(data) {
        return Ok(array.mapv(i64::from));
    }
    if let Some(array) = try_read::<u64>(data) {
        return checked_map(array, |v| i64::try_from(v).ok());
    }
    if let Some(array) = try_read::<f32>(data) {
        return checked_map(array, |v| integral(f64::from(v)));
    }
    if let Some(array) = try_read::<f64>(data) {
        return checked_map(array, integral);
    }

    Err(AnalysisError::data_format(
        "failed to read label map: unsupported dtype or invalid format",
    ))
}

fn integral(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

fn checked_map<T: Copy>(array: ArrayD<T>, convert: impl Fn(T) -> Option<i64>) -> Result<ArrayD<i64>> {
    let mut out = ArrayD::<i64>::zeros(array.raw_dim());
    for (dst, &src) in out.iter_mut().zip(array.iter()) {
        *dst = convert(src).ok_or_else(|| {
            AnalysisError::data_format("label map contains non-integer or out-of-range values")
        })?;
    }
    Ok(out)
}

/// Read an uploaded array file, accepting only the `.npy` extension.
pub fn read_array_file(path: &Path) -> Result<Vec<u8>> {
    let allowed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ARRAY_EXTENSION));
    if !allowed {
        return Err(AnalysisError::data_format(format!(
            "{} is not a .{} file",
            path.display(),
            ARRAY_EXTENSION
        )));
    }

    log::debug!("Reading array file {:?}", path);
    Ok(std::fs::read(path)?)
}
