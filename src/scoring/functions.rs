//! Parameter-specific scoring functions mapping raw measurements to 0–100.
//!
//! A parameter's function is picked by case-insensitive substring match on its
//! name. The keyword table is checked top to bottom and the first hit wins.
//! Several keywords are single letters ("n", "p", "k"), so the order decides
//! the outcome for many names: "Phosphorus" contains "ph" and is scored as
//! pH, "Potassium" hits "p" before "k", and "Electrical Conductivity" hits
//! "n" before "conductivity". No name reaches the bulk-density curve through
//! the table ("density" contains "n", "bulk" contains "k"); it stays reachable
//! as [`ScoringFunction::BulkDensity`]. Do not reorder.

use serde::Serialize;

/// Scoring curve for one kind of soil parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoringFunction {
    Ph,
    OrganicCarbon,
    Nitrogen,
    Phosphorus,
    Potassium,
    Conductivity,
    BulkDensity,
    MicrobialActivity,
    Generic,
}

/// Keyword table in match order.
const KEYWORDS: &[(&[&str], ScoringFunction)] = &[
    (&["ph"], ScoringFunction::Ph),
    (&["carbon", "organic"], ScoringFunction::OrganicCarbon),
    (&["nitrogen", "n"], ScoringFunction::Nitrogen),
    (&["phosphorus", "p"], ScoringFunction::Phosphorus),
    (&["potassium", "k"], ScoringFunction::Potassium),
    (&["conductivity", "ec"], ScoringFunction::Conductivity),
    (&["density", "bulk"], ScoringFunction::BulkDensity),
    (&["microbial", "activity"], ScoringFunction::MicrobialActivity),
];

impl ScoringFunction {
    /// Select the scoring function for a parameter name.
    pub fn for_parameter(name: &str) -> Self {
        let name = name.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
            .map(|(_, function)| *function)
            .unwrap_or(ScoringFunction::Generic)
    }

    /// The curve itself, before the final clamp to [0, 100].
    pub fn raw_score(self, v: f64) -> f64 {
        match self {
            ScoringFunction::Ph => {
                if (6.0..=7.5).contains(&v) {
                    100.0
                } else if (5.5..6.0).contains(&v) {
                    80.0 - (6.0 - v) * 40.0
                } else if v > 7.5 && v <= 8.0 {
                    80.0 - (v - 7.5) * 40.0
                } else if v < 5.5 {
                    (60.0 - (5.5 - v) * 30.0).max(0.0)
                } else {
                    (60.0 - (v - 8.0) * 30.0).max(0.0)
                }
            }
            ScoringFunction::OrganicCarbon => (v / 7.5 * 100.0).min(100.0),
            ScoringFunction::Nitrogen => (v / 480.0 * 100.0).min(100.0),
            ScoringFunction::Phosphorus => (v / 22.0 * 100.0).min(100.0),
            ScoringFunction::Potassium => (v / 280.0 * 100.0).min(100.0),
            ScoringFunction::Conductivity => {
                if v != 0.0 && v <= 0.8 {
                    100.0
                } else {
                    (100.0 - (v - 0.8) * 50.0).max(0.0)
                }
            }
            ScoringFunction::BulkDensity => {
                if v <= 1.5 {
                    100.0 - (v - 1.0) * 25.0
                } else {
                    (100.0 - (v - 1.0) * 50.0).max(0.0)
                }
            }
            ScoringFunction::MicrobialActivity => v,
            ScoringFunction::Generic => v.clamp(0.0, 100.0),
        }
    }

    /// Score clamped to [0, 100]. NaN scores 0.
    pub fn score(self, v: f64) -> f64 {
        let raw = self.raw_score(v);
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 100.0)
        }
    }
}

/// Score `value` for the parameter called `name`, in [0, 100].
pub fn score_for(name: &str, value: f64) -> f64 {
    ScoringFunction::for_parameter(name).score(value)
}
