//! Color schemes and multi-stop interpolation.

use image::Rgb;

/// A color stop: position in `[0, 1]` mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    /// Position in [0, 1]
    pub t: f64,
    /// Color at that position
    pub color: Rgb<u8>,
}

impl ColorStop {
    /// Stop at `t` with color `(r, g, b)`.
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb([r, g, b]),
        }
    }
}

/// Schemes used by the analysis figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    /// Dark blue -> cyan -> yellow -> dark red (class maps)
    Jet,
    /// Pale yellow -> dark green (NDVI)
    YlGn,
    /// Pale yellow -> orange -> dark red (LCI)
    YlOrRd,
}

impl ColorScheme {
    /// Lowercase scheme name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jet => "jet",
            Self::YlGn => "YlGn",
            Self::YlOrRd => "YlOrRd",
        }
    }

    fn stops(&self) -> &'static [ColorStop] {
        match self {
            Self::Jet => JET_STOPS,
            Self::YlGn => YLGN_STOPS,
            Self::YlOrRd => YLORRD_STOPS,
        }
    }

    /// Evaluate at normalized position `t`, clamped to `[0, 1]`.
    pub fn evaluate(&self, t: f64) -> Rgb<u8> {
        multi_stop(self.stops(), t)
    }
}

const JET_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 0, 0, 128),
    ColorStop::new(0.125, 0, 0, 255),
    ColorStop::new(0.375, 0, 255, 255),
    ColorStop::new(0.625, 255, 255, 0),
    ColorStop::new(0.875, 255, 0, 0),
    ColorStop::new(1.000, 128, 0, 0),
];

const YLGN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 255, 255, 229),
    ColorStop::new(0.250, 217, 240, 163),
    ColorStop::new(0.500, 120, 198, 121),
    ColorStop::new(0.750, 35, 132, 67),
    ColorStop::new(1.000, 0, 69, 41),
];

const YLORRD_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 255, 255, 204),
    ColorStop::new(0.250, 254, 217, 118),
    ColorStop::new(0.500, 253, 141, 60),
    ColorStop::new(0.750, 227, 26, 28),
    ColorStop::new(1.000, 128, 0, 38),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb<u8>, c2: Rgb<u8>, t: f64) -> Rgb<u8> {
    Rgb(std::array::from_fn(|i| {
        lerp(f64::from(c1.0[i]), f64::from(c2.0[i]), t).round() as u8
    }))
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb<u8> {
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if t.is_nan() || t <= 0.0 {
        return first.color;
    }
    if t >= 1.0 {
        return last.color;
    }
    for pair in stops.windows(2) {
        if t <= pair[1].t {
            let ratio = (t - pair[0].t) / (pair[1].t - pair[0].t);
            return lerp_color(pair[0].color, pair[1].color, ratio);
        }
    }
    last.color
}

/// Value range mapped onto a scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    /// Value mapped to the first stop
    pub min: f64,
    /// Value mapped to the last stop
    pub max: f64,
}

impl ColorRange {
    /// Range spanning `min..=max`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range spanning the finite values of `values`.
    ///
    /// An empty or constant input gets a unit-wide range.
    pub fn auto(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                (min.min(v), max.max(v))
            });

        if !min.is_finite() || !max.is_finite() {
            Self::new(0.0, 1.0)
        } else if (max - min).abs() < f64::EPSILON {
            Self::new(min, min + 1.0)
        } else {
            Self::new(min, max)
        }
    }

    /// Position of `value` within the range.
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}
