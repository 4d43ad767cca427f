//! Three-panel analysis figure.
//!
//! Panels sit side by side on a white canvas: the class map (or plain NDVI
//! when no labels were given), vegetation-only NDVI and vegetation-only
//! LCI. The two index panels carry a vertical colour bar.

use image::{Rgb, RgbImage};
use ndarray::{Array2, Zip};

use super::colormap::{ColorRange, ColorScheme};
use crate::constants::render::{COLORBAR_GAP, COLORBAR_WIDTH, MARGIN, PANEL_TARGET_SIZE};
use crate::indices::VegetationIndices;
use crate::scene::ClassMap;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// One colour-mapped raster.
#[derive(Debug, Clone)]
pub struct Panel {
    values: Array2<f64>,
    scheme: ColorScheme,
    range: ColorRange,
    colorbar: bool,
}

impl Panel {
    /// Panel auto-ranged over its own values.
    pub fn new(values: Array2<f64>, scheme: ColorScheme) -> Self {
        let range = ColorRange::auto(values.iter().copied());
        Self {
            values,
            scheme,
            range,
            colorbar: false,
        }
    }

    /// Draw a colorbar next to the panel.
    pub fn with_colorbar(mut self) -> Self {
        self.colorbar = true;
        self
    }

    /// Value range mapped onto the scheme.
    pub fn range(&self) -> ColorRange {
        self.range
    }

    /// Color scheme of the panel.
    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    fn width(&self, scale: u32) -> u32 {
        let raster = self.values.ncols() as u32 * scale;
        if self.colorbar {
            raster + COLORBAR_GAP + COLORBAR_WIDTH
        } else {
            raster
        }
    }

    fn height(&self, scale: u32) -> u32 {
        self.values.nrows() as u32 * scale
    }

    fn draw(&self, canvas: &mut RgbImage, x0: u32, y0: u32, scale: u32) {
        for ((row, col), &value) in self.values.indexed_iter() {
            let color = self.scheme.evaluate(self.range.normalize(value));
            let (px, py) = (x0 + col as u32 * scale, y0 + row as u32 * scale);
            for dy in 0..scale {
                for dx in 0..scale {
                    canvas.put_pixel(px + dx, py + dy, color);
                }
            }
        }

        if self.colorbar {
            let bar_x = x0 + self.values.ncols() as u32 * scale + COLORBAR_GAP;
            let height = self.height(scale);
            for dy in 0..height {
                // top of the bar is the range maximum
                let t = if height > 1 {
                    1.0 - f64::from(dy) / f64::from(height - 1)
                } else {
                    1.0
                };
                let color = self.scheme.evaluate(t);
                for dx in 0..COLORBAR_WIDTH {
                    canvas.put_pixel(bar_x + dx, y0 + dy, color);
                }
            }
        }
    }
}

/// Integer upscaling factor that brings the larger side close to the
/// target panel size.
pub fn panel_scale(height: usize, width: usize) -> u32 {
    let longest = height.max(width).max(1) as u32;
    (PANEL_TARGET_SIZE / longest).max(1)
}

/// Zero every value outside `mask`.
pub fn masked(values: &Array2<f32>, mask: &Array2<bool>) -> Array2<f64> {
    Zip::from(values)
        .and(mask)
        .map_collect(|&v, &keep| if keep { f64::from(v) } else { 0.0 })
}

/// Panels of the analysis figure in display order.
pub fn analysis_panels(indices: &VegetationIndices, class_map: Option<&ClassMap>) -> [Panel; 3] {
    let vegetation = match class_map {
        Some(map) => map.vegetation_mask(),
        None => Array2::from_elem(indices.ndvi.dim(), true),
    };

    let first = match class_map {
        Some(map) => Panel::new(map.classes().mapv(f64::from), ColorScheme::Jet),
        None => Panel::new(indices.ndvi.mapv(f64::from), ColorScheme::YlGn),
    };

    [
        first,
        Panel::new(masked(&indices.ndvi, &vegetation), ColorScheme::YlGn).with_colorbar(),
        Panel::new(masked(&indices.lci, &vegetation), ColorScheme::YlOrRd).with_colorbar(),
    ]
}

/// Compose panels left to right on a white canvas.
pub fn compose(panels: &[Panel]) -> RgbImage {
    let (rows, cols) = panels
        .iter()
        .map(|p| p.values.dim())
        .fold((0, 0), |(r, c), (pr, pc)| (r.max(pr), c.max(pc)));
    let scale = panel_scale(rows, cols);

    let content_width: u32 = panels.iter().map(|p| p.width(scale)).sum();
    let gaps = MARGIN * panels.len().saturating_sub(1) as u32;
    let width = MARGIN * 2 + content_width + gaps;
    let height = MARGIN * 2 + panels.iter().map(|p| p.height(scale)).max().unwrap_or(0);

    let mut canvas = RgbImage::from_pixel(width, height, BACKGROUND);
    let mut x = MARGIN;
    for panel in panels {
        panel.draw(&mut canvas, x, MARGIN, scale);
        x += panel.width(scale) + MARGIN;
    }
    canvas
}

/// Render the full analysis figure.
pub fn render_analysis(indices: &VegetationIndices, class_map: Option<&ClassMap>) -> RgbImage {
    let panels = analysis_panels(indices, class_map);
    let image = compose(&panels);
    log::debug!(
        "Rendered {}x{} figure ({} panels)",
        image.width(),
        image.height(),
        panels.len()
    );
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn indices() -> VegetationIndices {
        VegetationIndices {
            ndvi: array![[0.1f32, 0.8], [0.5, -0.2]],
            lci: array![[0.0f32, 0.4], [0.3, 0.1]],
        }
    }

    #[test]
    fn test_panel_scale() {
        assert_eq!(panel_scale(4, 4), 80);
        assert_eq!(panel_scale(10, 32), 10);
        assert_eq!(panel_scale(1000, 20), 1);
        assert_eq!(panel_scale(0, 0), PANEL_TARGET_SIZE);
    }

    #[test]
    fn test_masked_zeroes_outside() {
        let values = array![[1.0f32, 2.0], [3.0, 4.0]];
        let mask = array![[true, false], [false, true]];
        assert_eq!(masked(&values, &mask), array![[1.0, 0.0], [0.0, 4.0]]);
    }

    #[test]
    fn test_panels_without_class_map() {
        let panels = analysis_panels(&indices(), None);
        assert_eq!(panels[0].scheme(), ColorScheme::YlGn);
        assert_eq!(panels[1].scheme(), ColorScheme::YlGn);
        assert_eq!(panels[2].scheme(), ColorScheme::YlOrRd);
        assert!((panels[1].range().max - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_panels_with_class_map_mask_non_vegetation() {
        let map = ClassMap::new(
            array![[0u32, 1], [0, 0]],
            array![[true, true], [false, true]],
            2,
        )
        .unwrap();
        let panels = analysis_panels(&indices(), Some(&map));
        assert_eq!(panels[0].scheme(), ColorScheme::Jet);
        // only (0,0) and (1,1) are vegetation
        assert_eq!(panels[1].values, array![[0.1f32 as f64, 0.0], [0.0, -0.2f32 as f64]]);
    }

    #[test]
    fn test_compose_dimensions() {
        let image = render_analysis(&indices(), None);
        let scale = panel_scale(2, 2);
        let panel = 2 * scale;
        let bar = COLORBAR_GAP + COLORBAR_WIDTH;
        assert_eq!(image.width(), MARGIN * 4 + panel * 3 + bar * 2);
        assert_eq!(image.height(), MARGIN * 2 + panel);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        // (0,1) of the NDVI panel is the maximum
        let top_right = image.get_pixel(MARGIN + panel - 1, MARGIN);
        assert_eq!(*top_right, ColorScheme::YlGn.evaluate(1.0));
    }
}
