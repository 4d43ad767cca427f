//! Visualization of an analysis.
//!
//! - `colormap`: multi-stop colour schemes and value ranges
//! - `figure`: the three-panel analysis figure
//! - `output`: content-addressed file names and atomic PNG writes

pub mod colormap;
mod figure;
mod output;

pub use colormap::{ColorRange, ColorScheme};
pub use figure::{Panel, analysis_panels, compose, masked, panel_scale, render_analysis};
pub use output::{fingerprint, plot_file_name, sanitize_request_id, write_png};
