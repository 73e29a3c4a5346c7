use std::fmt;

use serde::Serialize;

use super::functions::score_for;
use crate::analysis::pca::WeightVector;
use crate::data::model::ParameterMap;

/// Parameter name → raw measured value for the sample being assessed.
pub type SampleInput = ParameterMap;

/// Parameter name → score in [0, 100].
pub type ScoreVector = ParameterMap;

/// Lower bound of the High category.
pub const HIGH_THRESHOLD: f64 = 0.6;
/// Lower bound of the Medium category.
pub const MEDIUM_THRESHOLD: f64 = 0.3;

/// Radar-chart labels longer than this are shortened.
const LABEL_CHARS: usize = 10;
/// Bar-chart labels are tighter.
const BAR_LABEL_CHARS: usize = 8;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Low,
    Medium,
    High,
}

impl Category {
    pub fn from_sqi(sqi: f64) -> Self {
        if sqi >= HIGH_THRESHOLD {
            Category::High
        } else if sqi >= MEDIUM_THRESHOLD {
            Category::Medium
        } else {
            Category::Low
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Low => "Low",
            Category::Medium => "Medium",
            Category::High => "High",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The index for one sample, with the scores it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqiResult {
    /// Weighted mean score scaled to [0, 1].
    pub sqi: f64,
    pub category: Category,
    pub scores: ScoreVector,
}

/// One bar/radar entry for a charting front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRow {
    pub parameter: String,
    pub label: String,
    pub bar_label: String,
    pub score: f64,
    pub weight_percent: f64,
}

impl SqiResult {
    /// The index rounded to two decimals.
    pub fn rounded_sqi(&self) -> f64 {
        (self.sqi * 100.0).round() / 100.0
    }

    /// The index formatted with two decimals, e.g. `"0.64"`.
    pub fn display_sqi(&self) -> String {
        format!("{:.2}", self.sqi)
    }

    /// Per-parameter score and weight (in percent), in sample order.
    pub fn breakdown(&self, weights: &WeightVector) -> Vec<ScoreRow> {
        self.scores
            .iter()
            .map(|(name, score)| ScoreRow {
                parameter: name.to_string(),
                label: short_label(name, LABEL_CHARS),
                bar_label: short_label(name, BAR_LABEL_CHARS),
                score,
                weight_percent: weights.get(name).unwrap_or(0.0) * 100.0,
            })
            .collect()
    }
}

/// `name` cut to `max_chars` characters with a trailing `...` when longer.
pub fn short_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let head: String = name.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Combine the sample's per-parameter scores with the PCA weights.
///
/// Parameters missing from `weights` get weight 0. With no weight at all the
/// index is 0. Pure: identical inputs give bit-identical results.
pub fn compute_sqi(sample: &SampleInput, weights: &WeightVector) -> SqiResult {
    let mut total_score = 0.0;
    let mut total_weight = 0.0;
    let mut scores = ScoreVector::new();

    for (name, value) in sample.iter() {
        let score = score_for(name, value);
        let weight = weights.get(name).unwrap_or(0.0);
        total_score += score * weight;
        total_weight += weight;
        scores.insert(name, score);
    }

    let mean = if total_weight > 0.0 {
        total_score / total_weight
    } else {
        0.0
    };
    let sqi = (mean / 100.0).clamp(0.0, 1.0);

    SqiResult {
        sqi,
        category: Category::from_sqi(sqi),
        scores,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn map(entries: &[(&str, f64)]) -> ParameterMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_equal_weights_on_high_boundary() {
        let weights = map(&[("A", 0.5), ("B", 0.5)]);
        let sample = map(&[("A", 80.0), ("B", 40.0)]);
        let result = compute_sqi(&sample, &weights);
        assert_eq!(result.scores, map(&[("A", 80.0), ("B", 40.0)]));
        assert_relative_eq!(result.sqi, 0.6, epsilon = 1e-12);
        assert_eq!(result.category, Category::High);
        assert_eq!(result.display_sqi(), "0.60");
    }

    #[test]
    fn test_categories() {
        assert_eq!(Category::from_sqi(0.0), Category::Low);
        assert_eq!(Category::from_sqi(0.29), Category::Low);
        assert_eq!(Category::from_sqi(0.3), Category::Medium);
        assert_eq!(Category::from_sqi(0.59), Category::Medium);
        assert_eq!(Category::from_sqi(1.0), Category::High);
    }

    #[test]
    fn test_missing_weights_count_as_zero() {
        let weights = map(&[("Moisture", 1.0)]);
        let sample = map(&[("Moisture", 20.0), ("Other", 100.0)]);
        let result = compute_sqi(&sample, &weights);
        assert_relative_eq!(result.sqi, 0.2, epsilon = 1e-12);
        assert_eq!(result.category, Category::Low);
        assert_eq!(result.scores.get("Other"), Some(100.0));
    }

    #[test]
    fn test_zero_total_weight_gives_zero() {
        let sample = map(&[("Moisture", 90.0)]);
        let result = compute_sqi(&sample, &ParameterMap::new());
        assert_eq!(result.sqi, 0.0);
        assert_eq!(result.category, Category::Low);
    }

    #[test]
    fn test_soil_sample() {
        let weights = map(&[("pH", 0.4), ("Organic Carbon", 0.35), ("Nitrogen", 0.25)]);
        let sample = map(&[("pH", 6.8), ("Organic Carbon", 3.75), ("Nitrogen", 120.0)]);
        let result = compute_sqi(&sample, &weights);
        // 100·0.4 + 50·0.35 + 25·0.25 = 63.75
        assert_relative_eq!(result.sqi, 0.6375, epsilon = 1e-12);
        assert_relative_eq!(result.rounded_sqi(), 0.64, epsilon = 1e-12);
        assert_eq!(result.category, Category::High);
    }

    #[test]
    fn test_compute_sqi_is_pure() {
        let weights = map(&[("pH", 0.3), ("EC", 0.7)]);
        let sample = map(&[("pH", 5.7), ("EC", 1.3)]);
        let first = compute_sqi(&sample, &weights);
        let second = compute_sqi(&sample, &weights);
        assert_eq!(first.sqi.to_bits(), second.sqi.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_breakdown_rows() {
        let weights = map(&[("Microbial Activity", 0.25), ("pH", 0.75)]);
        let sample = map(&[("Microbial Activity", 55.0), ("pH", 7.0)]);
        let rows = compute_sqi(&sample, &weights).breakdown(&weights);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Microbial ...");
        assert_eq!(rows[0].bar_label, "Microbia...");
        assert_eq!(rows[0].score, 55.0);
        assert_relative_eq!(rows[0].weight_percent, 25.0, epsilon = 1e-12);
        assert_eq!(rows[1].label, "pH");
        assert_eq!(rows[1].bar_label, "pH");
        assert_eq!(short_label("Conductivity", 8), "Conducti...");
    }
}
