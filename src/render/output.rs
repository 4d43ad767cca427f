//! Request-scoped figure files.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use sha2::{Digest, Sha256};

use crate::constants::render::{FINGERPRINT_LEN, PLOT_FILE_PREFIX};
use crate::error::Result;

/// Hex fingerprint of the request inputs.
///
/// Each input is hashed with a tag and its length so a cube without labels
/// never collides with a longer cube that happens to end in label bytes.
pub fn fingerprint(cube: &[u8], labels: Option<&[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"cube");
    hasher.update((cube.len() as u64).to_le_bytes());
    hasher.update(cube);
    if let Some(labels) = labels {
        hasher.update(b"labels");
        hasher.update((labels.len() as u64).to_le_bytes());
        hasher.update(labels);
    }
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Keep request ids file-name safe.
pub fn sanitize_request_id(request_id: &str) -> String {
    let cleaned: String = request_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "request".to_string()
    } else {
        cleaned
    }
}

/// `analysis_<fingerprint>_<request id>.png`
pub fn plot_file_name(fingerprint: &str, request_id: &str) -> String {
    format!(
        "{}_{}_{}.png",
        PLOT_FILE_PREFIX,
        fingerprint,
        sanitize_request_id(request_id)
    )
}

/// Write `image` as PNG to `dir/file_name`.
///
/// The image is written under a temporary name first and renamed into
/// place, so readers never observe a partial file.
pub fn write_png(image: &RgbImage, dir: &Path, file_name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);
    let temp = dir.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4().simple()));

    if let Err(e) = image.save_with_format(&temp, ImageFormat::Png) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }
    if let Err(e) = std::fs::rename(&temp, &target) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }

    log::info!("Wrote figure to {:?}", target);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_fingerprint_is_stable_and_input_sensitive() {
        let a = fingerprint(b"cube-bytes", None);
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert_eq!(a, fingerprint(b"cube-bytes", None));
        assert_ne!(a, fingerprint(b"cube-bytes", Some(b"")));
        assert_ne!(a, fingerprint(b"cube-byteZ", None));
        assert_ne!(
            fingerprint(b"ab", Some(b"c")),
            fingerprint(b"a", Some(b"bc"))
        );
    }

    #[test]
    fn test_plot_file_name() {
        assert_eq!(
            plot_file_name("0123456789abcdef", "req-1"),
            "analysis_0123456789abcdef_req-1.png"
        );
        assert_eq!(sanitize_request_id("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_request_id(""), "request");
    }

    #[test]
    fn test_write_png_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");
        let image = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));

        let path = write_png(&image, &out, "figure.png").unwrap();
        assert_eq!(path, out.join("figure.png"));

        let entries: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(*decoded.get_pixel(2, 1), Rgb([10, 20, 30]));
    }
}
