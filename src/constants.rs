//! Global constants for hyperleaf

/// Default band positions used by the vegetation indices.
///
/// Positions are zero-based and clamped to the cube's band count.
pub mod bands {
    /// Near-infrared band
    pub const NIR: usize = 48;
    /// Red band
    pub const RED: usize = 29;
    /// Green band
    pub const GREEN: usize = 19;
}

/// Epsilon added to the range in min/max normalization
pub const NORMALIZE_EPSILON: f64 = 1e-12;

/// Epsilon added to the denominator of normalized-difference indices
pub const INDEX_EPSILON: f32 = 1e-8;

/// Thresholds on whole-scene index means for the health message.
pub mod health {
    /// NDVI mean above this indicates dense, structurally healthy vegetation
    pub const NDVI_DENSE: f64 = 0.4;
    /// NDVI mean below this indicates sparse vegetation or bare soil
    pub const NDVI_SPARSE: f64 = 0.3;
    /// LCI mean above this indicates good chlorophyll content
    pub const LCI_HIGH: f64 = 0.3;
    /// LCI mean below this indicates low chlorophyll content
    pub const LCI_LOW: f64 = 0.2;
}

/// Visualization layout.
pub mod render {
    /// Panels are upscaled by an integer factor until they approach this size
    pub const PANEL_TARGET_SIZE: u32 = 320;
    /// Outer margin and spacing between panels
    pub const MARGIN: u32 = 16;
    /// Width of a colour bar
    pub const COLORBAR_WIDTH: u32 = 14;
    /// Gap between a panel and its colour bar
    pub const COLORBAR_GAP: u32 = 6;
    /// File name prefix of rendered figures
    pub const PLOT_FILE_PREFIX: &str = "analysis";
    /// Hex characters of the input fingerprint kept in file names
    pub const FINGERPRINT_LEN: usize = 16;
}

/// Language model defaults.
pub mod llm {
    /// Local Ollama server
    pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
    /// Small model that runs comfortably on CPU
    pub const DEFAULT_MODEL: &str = "tinyllama:1.1b";
    /// Request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
}

/// Default directory for rendered figures
pub const DEFAULT_OUTPUT_DIR: &str = "static/analysis";

/// File extension accepted for cube and label uploads
pub const ARRAY_EXTENSION: &str = "npy";
