use anyhow::{Context, Result};
use serde::Serialize;

use crate::analysis::pca::{PcaOutcome, WeightTier, WeightVector};
use crate::data::model::DatasetSummary;
use crate::scoring::sqi::{ScoreRow, SqiResult};

// ---------------------------------------------------------------------------
// Plain-text reports
// ---------------------------------------------------------------------------

pub fn render_summary(summary: &DatasetSummary) -> String {
    let mut lines = vec![
        "Dataset summary".to_string(),
        format!("  parameters:  {}", summary.parameters),
        format!("  samples:     {}", summary.samples),
        format!("  data points: {}", summary.data_points),
    ];
    if summary.coerced_cells > 0 {
        lines.push(format!("  coerced to 0: {} cells", summary.coerced_cells));
    }
    lines.push(format!("  columns:     {}", summary.headers.join(", ")));
    join_lines(lines)
}

/// Weights from most to least important, then the variance share per component.
pub fn render_pca(outcome: &PcaOutcome) -> String {
    let width = name_width(outcome.weights.names());
    let mut lines = vec!["PCA-derived weights".to_string()];
    lines.extend(outcome.ranked_weights().into_iter().map(|(name, weight)| {
        format!(
            "  {name:<width$}  {:>5.1}%  ({})",
            weight * 100.0,
            WeightTier::of(weight)
        )
    }));

    lines.push("Explained variance".to_string());
    lines.extend(
        outcome
            .explained_variance_ratio
            .iter()
            .enumerate()
            .map(|(i, ratio)| format!("  PC{}: {ratio:.2}%", i + 1)),
    );
    join_lines(lines)
}

pub fn render_sqi(result: &SqiResult, weights: &WeightVector) -> String {
    let width = name_width(result.scores.names());
    let mut lines = vec![format!(
        "Soil Quality Index: {} ({} quality)",
        result.display_sqi(),
        result.category
    )];
    lines.extend(result.breakdown(weights).into_iter().map(|row| {
        format!(
            "  {:<width$}  score {:>6.2}  weight {:>5.1}%",
            row.parameter, row.score, row.weight_percent
        )
    }));
    join_lines(lines)
}

/// One report line per entry, each newline-terminated.
fn join_lines(lines: Vec<String>) -> String {
    lines.into_iter().map(|line| line + "\n").collect()
}

fn name_width(names: &[String]) -> usize {
    names.iter().map(|n| n.chars().count()).max().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// SQI output as handed to a front end: the result plus its chart rows.
#[derive(Debug, Serialize)]
pub struct SqiReport<'a> {
    #[serde(flatten)]
    pub result: &'a SqiResult,
    pub breakdown: Vec<ScoreRow>,
}

impl<'a> SqiReport<'a> {
    pub fn new(result: &'a SqiResult, weights: &WeightVector) -> Self {
        Self {
            result,
            breakdown: result.breakdown(weights),
        }
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serializing report")
}
