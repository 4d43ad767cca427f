//! Rule-based health category from whole-scene index means.

use serde::{Deserialize, Serialize};

use crate::constants::health::{LCI_HIGH, LCI_LOW, NDVI_DENSE, NDVI_SPARSE};

/// Coarse health verdict for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCategory {
    /// Dense vegetation with good chlorophyll
    Healthy,
    /// Dense vegetation with low chlorophyll
    NutrientDeficiency,
    /// Sparse vegetation with low chlorophyll
    Stressed,
    /// Anything the other rules do not cover
    Mixed,
}

impl HealthCategory {
    /// Classify a scene by its NDVI and LCI means.
    ///
    /// All comparisons are strict, so a mean sitting exactly on a
    /// threshold falls through to the next rule.
    pub fn classify(ndvi_mean: f64, lci_mean: f64) -> Self {
        if ndvi_mean > NDVI_DENSE && lci_mean > LCI_HIGH {
            Self::Healthy
        } else if ndvi_mean > NDVI_DENSE && lci_mean < LCI_LOW {
            Self::NutrientDeficiency
        } else if ndvi_mean < NDVI_SPARSE && lci_mean < LCI_LOW {
            Self::Stressed
        } else {
            Self::Mixed
        }
    }

    /// Human-readable message for this category.
    pub fn message(&self) -> &'static str {
        match self {
            HealthCategory::Healthy => "Vegetation healthy: strong biomass and good chlorophyll.",
            HealthCategory::NutrientDeficiency => {
                "Good structure but low chlorophyll: possible nutrient deficiency."
            }
            HealthCategory::Stressed => "Sparse and low chlorophyll: stress, bare soil, or senescence.",
            HealthCategory::Mixed => "Mixed vegetation health detected.",
        }
    }
}

impl std::fmt::Display for HealthCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Index means together with the verdict they produce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Mean NDVI over the whole scene
    pub ndvi_mean: f64,
    /// Mean LCI over the whole scene
    pub lci_mean: f64,
    /// Category derived from the means
    pub category: HealthCategory,
}

impl IndexSummary {
    /// Summary of the two scene means.
    pub fn new(ndvi_mean: f64, lci_mean: f64) -> Self {
        Self {
            ndvi_mean,
            lci_mean,
            category: HealthCategory::classify(ndvi_mean, lci_mean),
        }
    }

    /// Message of the derived category.
    pub fn message(&self) -> &'static str {
        self.category.message()
    }
}
