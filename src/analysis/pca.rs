use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::eigen::{deflate, dominant_eigenpair, DEFAULT_ITERATIONS};
use super::matrix::{multiply, transpose, Matrix};
use crate::data::model::{Dataset, ParameterMap};
use crate::error::PcaError;

/// Parameter name → importance weight. Weights are non-negative and sum to 1.
pub type WeightVector = ParameterMap;

/// Components extracted unless configured otherwise.
pub const DEFAULT_MAX_COMPONENTS: usize = 3;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Knobs of the PCA run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PcaConfig {
    /// Power-iteration steps per component.
    pub iterations: usize,
    /// Upper bound on extracted components (capped by the parameter count).
    pub max_components: usize,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            max_components: DEFAULT_MAX_COMPONENTS,
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// One extracted component: per-parameter loadings and |eigenvalue|.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipalComponent {
    pub loadings: Vec<f64>,
    pub eigenvalue: f64,
}

/// Everything a PCA run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PcaOutcome {
    pub weights: WeightVector,
    /// Share of the total |eigenvalue| mass per component, in percent.
    pub explained_variance_ratio: Vec<f64>,
    /// Column means of the input dataset.
    pub means: Vec<f64>,
    /// Components in extraction order (not necessarily by descending eigenvalue).
    pub components: Vec<PrincipalComponent>,
    /// Sum of |eigenvalue| over the extracted components.
    pub total_variance: f64,
}

impl PcaOutcome {
    /// Weights sorted from most to least important; ties keep column order.
    pub fn ranked_weights(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.weights.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Coarse importance bucket for a single weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeightTier {
    /// More than 15% of the index.
    Major,
    /// More than 10%.
    Moderate,
    Minor,
}

impl WeightTier {
    pub fn of(weight: f64) -> Self {
        if weight > 0.15 {
            WeightTier::Major
        } else if weight > 0.1 {
            WeightTier::Moderate
        } else {
            WeightTier::Minor
        }
    }
}

impl std::fmt::Display for WeightTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WeightTier::Major => "major",
            WeightTier::Moderate => "moderate",
            WeightTier::Minor => "minor",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run PCA with the default configuration (100 iterations, 3 components).
pub fn run_pca(dataset: &Dataset) -> Result<PcaOutcome, PcaError> {
    run_pca_with(dataset, &PcaConfig::default())
}

/// Derive per-parameter weights from the covariance structure of `dataset`.
///
/// Needs at least 2 samples and 2 parameters. Components come from power
/// iteration with deflation; each component contributes its normalized
/// absolute loadings, scaled by its share of the total |eigenvalue|.
pub fn run_pca_with(dataset: &Dataset, config: &PcaConfig) -> Result<PcaOutcome, PcaError> {
    let n = dataset.n_samples();
    let p = dataset.n_parameters();
    if n < 2 {
        return Err(PcaError::Validation(format!(
            "need at least 2 rows of data for PCA, got {n}"
        )));
    }
    if p < 2 {
        return Err(PcaError::Validation(format!(
            "need at least 2 parameters for PCA, got {p}"
        )));
    }
    info!("Processing {n} samples with {p} parameters");

    let means = column_means(dataset.rows(), p);
    let centered = center(dataset.rows(), &means);
    let mut residual = covariance_matrix(&centered);
    debug!("covariance matrix calculated, finding principal components");

    let k = config.max_components.min(p);
    let mut components = Vec::with_capacity(k);
    for pc in 0..k {
        let pair = dominant_eigenpair(&residual, config.iterations);
        debug!("PC{}: eigenvalue {:.6}", pc + 1, pair.value);
        deflate(&mut residual, &pair);
        components.push(PrincipalComponent {
            eigenvalue: pair.value.abs(),
            loadings: pair.vector,
        });
    }

    let total_variance: f64 = components.iter().map(|c| c.eigenvalue).sum();
    let explained_variance_ratio: Vec<f64> = components
        .iter()
        .map(|c| share(c.eigenvalue, total_variance) * 100.0)
        .collect();
    let weights = derive_weights(dataset.headers(), &components, total_variance);

    let outcome = PcaOutcome {
        weights,
        explained_variance_ratio,
        means,
        components,
        total_variance,
    };
    info!(
        "PCA completed: explained variance {:?}",
        outcome
            .explained_variance_ratio
            .iter()
            .map(|r| format!("{r:.2}%"))
            .collect::<Vec<_>>()
    );
    Ok(outcome)
}

/// Per-column arithmetic mean over `rows`, each assumed `p` wide.
pub fn column_means(rows: &[Vec<f64>], p: usize) -> Vec<f64> {
    let n = rows.len() as f64;
    (0..p)
        .map(|j| rows.iter().map(|row| row[j]).sum::<f64>() / n)
        .collect()
}

/// Subtract the column mean from every value.
pub fn center(rows: &[Vec<f64>], means: &[f64]) -> Matrix {
    rows.iter()
        .map(|row| row.iter().zip(means).map(|(v, m)| v - m).collect::<Vec<f64>>())
        .collect()
}

/// Sample covariance of already-centered data (n − 1 divisor).
///
/// Symmetric by construction. Callers guarantee at least two rows.
pub fn covariance_matrix(centered: &[Vec<f64>]) -> Matrix {
    let divisor = (centered.len() - 1) as f64;
    let mut cov = multiply(&transpose(centered), centered);
    for cell in cov.iter_mut().flatten() {
        *cell /= divisor;
    }
    cov
}

fn share(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total
    } else {
        0.0
    }
}

fn derive_weights(
    headers: &[String],
    components: &[PrincipalComponent],
    total_variance: f64,
) -> WeightVector {
    let mut raw = vec![0.0; headers.len()];
    for component in components {
        let pc_weight = share(component.eigenvalue, total_variance);
        let total_loading: f64 = component.loadings.iter().map(|l| l.abs()).sum();
        for (weight, loading) in raw.iter_mut().zip(&component.loadings) {
            *weight += pc_weight * share(loading.abs(), total_loading);
        }
    }

    let total: f64 = raw.iter().sum();
    if total > 0.0 && total.is_finite() {
        headers
            .iter()
            .zip(raw)
            .map(|(h, w)| (h.as_str(), w / total))
            .collect()
    } else {
        debug!("degenerate PCA weights, falling back to uniform");
        ParameterMap::filled(headers, 1.0 / headers.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn dataset(headers: &[&str], rows: Vec<Vec<f64>>) -> Dataset {
        Dataset::from_numeric(headers.iter().map(|h| h.to_string()).collect(), rows).unwrap()
    }

    fn soil_dataset() -> Dataset {
        dataset(
            &["pH", "Organic Carbon", "Nitrogen", "Bulk Density"],
            vec![
                vec![6.2, 1.1, 210.0, 1.42],
                vec![6.8, 1.9, 260.0, 1.35],
                vec![7.4, 2.4, 300.0, 1.28],
                vec![5.9, 0.8, 180.0, 1.51],
                vec![6.5, 1.6, 240.0, 1.39],
                vec![7.0, 2.1, 285.0, 1.31],
            ],
        )
    }

    #[test]
    fn test_rejects_single_row() {
        let ds = dataset(&["a", "b"], vec![vec![1.0, 2.0]]);
        let err = run_pca(&ds).unwrap_err();
        assert!(matches!(&err, PcaError::Validation(msg) if msg.contains("2 rows")));
    }

    #[test]
    fn test_rejects_single_parameter() {
        let ds = dataset(&["a"], vec![vec![1.0], vec![2.0], vec![3.0]]);
        let err = run_pca(&ds).unwrap_err();
        assert!(matches!(&err, PcaError::Validation(msg) if msg.contains("2 parameters")));
    }

    #[test]
    fn test_covariance() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 6.0], vec![5.0, 10.0]];
        let means = column_means(&rows, 2);
        assert_eq!(means, vec![3.0, 6.0]);
        let cov = covariance_matrix(&center(&rows, &means));
        assert_eq!(cov, vec![vec![4.0, 8.0], vec![8.0, 16.0]]);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let outcome = run_pca(&soil_dataset()).unwrap();
        assert_relative_eq!(outcome.weights.sum(), 1.0, epsilon = 1e-9);
        assert!(outcome.weights.values().iter().all(|w| *w >= 0.0));
        assert_eq!(outcome.components.len(), 3);
        assert_eq!(outcome.explained_variance_ratio.len(), 3);
        let ratio_total: f64 = outcome.explained_variance_ratio.iter().sum();
        assert_relative_eq!(ratio_total, 100.0, epsilon = 1e-9);
        assert_eq!(outcome.means.len(), 4);
    }

    #[test]
    fn test_component_count_is_capped_by_parameters() {
        let ds = dataset(&["x", "y"], vec![vec![1.0, 0.5], vec![2.0, 0.1], vec![4.0, 0.9]]);
        let outcome = run_pca(&ds).unwrap();
        assert_eq!(outcome.components.len(), 2);
        assert_eq!(outcome.explained_variance_ratio.len(), 2);
    }

    #[test]
    fn test_single_dominant_direction() {
        // Only the first column varies: its loading takes the whole weight.
        let ds = dataset(
            &["varies", "constant"],
            vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]],
        );
        let outcome = run_pca(&ds).unwrap();
        assert_relative_eq!(outcome.components[0].eigenvalue, 1.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.total_variance, 1.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.weights.get("varies").unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.weights.get("constant").unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.explained_variance_ratio[0], 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_constant_dataset_falls_back_to_uniform() {
        let ds = dataset(&["a", "b", "c", "d"], vec![vec![1.0, 2.0, 3.0, 4.0]; 5]);
        let outcome = run_pca(&ds).unwrap();
        assert_eq!(outcome.total_variance, 0.0);
        assert_eq!(outcome.explained_variance_ratio, vec![0.0, 0.0, 0.0]);
        for (_, w) in outcome.weights.iter() {
            assert_eq!(w, 0.25);
        }
    }

    #[test]
    fn test_zero_components_falls_back_to_uniform() {
        let config = PcaConfig {
            max_components: 0,
            ..PcaConfig::default()
        };
        let outcome = run_pca_with(&soil_dataset(), &config).unwrap();
        assert!(outcome.components.is_empty());
        assert_relative_eq!(outcome.weights.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ranked_weights_and_tiers() {
        let outcome = PcaOutcome {
            weights: [("a", 0.1), ("b", 0.6), ("c", 0.3)].into_iter().collect(),
            explained_variance_ratio: vec![],
            means: vec![],
            components: vec![],
            total_variance: 0.0,
        };
        assert_eq!(outcome.ranked_weights(), vec![("b", 0.6), ("c", 0.3), ("a", 0.1)]);
        assert_eq!(WeightTier::of(0.6), WeightTier::Major);
        assert_eq!(WeightTier::of(0.15), WeightTier::Moderate);
        assert_eq!(WeightTier::of(0.1), WeightTier::Minor);
    }

    #[test]
    fn test_soil_weights_match_reference() {
        let outcome = run_pca(&soil_dataset()).unwrap();
        let expected = [
            0.011590600877300527,
            0.012997019841469268,
            0.9736543636978405,
            0.0017580155833897167,
        ];
        for (actual, expected) in outcome.weights.values().iter().zip(expected) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-12);
        }
        assert_eq!(
            outcome.weights.names(),
            &["pH", "Organic Carbon", "Nitrogen", "Bulk Density"]
        );
    }

    #[test]
    fn test_pca_is_deterministic() {
        let ds = soil_dataset();
        assert_eq!(run_pca(&ds).unwrap(), run_pca(&ds).unwrap());
    }
}
