use anyhow::{Context, Result};
use log::{info, warn};

use crate::analysis::pca::{run_pca_with, PcaOutcome};
use crate::config::AnalysisConfig;
use crate::data::model::{parse_lenient, Dataset};
use crate::error::DatasetError;
use crate::scoring::sqi::{compute_sqi, SampleInput, SqiResult};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Where the session is in the upload → analyse → assess workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Analysis,
    Assessment,
}

/// One calculator session, independent of how it is presented.
///
/// Owns the loaded dataset, the PCA outcome, the sample being edited and the
/// index derived from them. The result is recomputed from scratch whenever the
/// sample or the weights change.
#[derive(Debug, Default)]
pub struct Session {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Weights and variance shares from the last PCA run.
    pub pca: Option<PcaOutcome>,

    /// Values of the sample under assessment, one per dataset parameter.
    pub sample: SampleInput,

    /// Index for `sample` under the current weights.
    pub result: Option<SqiResult>,

    pub config: AnalysisConfig,

    /// Status line for the front end.
    pub status_message: Option<String>,
}

impl Session {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn step(&self) -> Step {
        match (&self.dataset, &self.pca) {
            (None, _) => Step::Upload,
            (Some(_), None) => Step::Analysis,
            (Some(_), Some(_)) => Step::Assessment,
        }
    }

    /// Ingest a newly loaded dataset and zero the sample.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        if dataset.coerced_cells() > 0 {
            warn!(
                "{} cells were missing or not numeric and were read as 0",
                dataset.coerced_cells()
            );
        }
        self.sample = dataset.blank_sample();
        self.status_message = Some(format!(
            "Loaded {} rows with {} columns",
            dataset.n_samples(),
            dataset.n_parameters()
        ));
        self.dataset = Some(dataset);
        self.pca = None;
        self.result = None;
    }

    /// Run PCA on the loaded dataset and refresh the index.
    pub fn analyse(&mut self) -> Result<&PcaOutcome> {
        let dataset = self.dataset.as_ref().context("No data available for PCA analysis")?;
        let outcome = match run_pca_with(dataset, &self.config.pca) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.status_message = Some(format!("PCA error: {err}"));
                return Err(err).context("performing PCA analysis");
            }
        };
        info!("weights derived for {} parameters", outcome.weights.len());
        self.status_message = Some(format!(
            "PCA completed! {}",
            outcome
                .explained_variance_ratio
                .iter()
                .enumerate()
                .map(|(i, r)| format!("PC{}: {r:.2}%", i + 1))
                .collect::<Vec<_>>()
                .join(", ")
        ));
        let outcome: &PcaOutcome = self.pca.insert(outcome);
        self.result = Some(compute_sqi(&self.sample, &outcome.weights));
        Ok(outcome)
    }

    /// Edit one sample value.
    pub fn set_value(&mut self, parameter: &str, value: f64) -> Result<(), DatasetError> {
        if !self.sample.set(parameter, value) {
            return Err(DatasetError::UnknownParameter(parameter.to_string()));
        }
        self.recompute();
        Ok(())
    }

    /// Edit one sample value from user text; unparsable text reads as 0.
    pub fn set_value_text(&mut self, parameter: &str, text: &str) -> Result<(), DatasetError> {
        self.set_value(parameter, parse_lenient(text))
    }

    /// Recompute the index from the current sample and weights.
    pub fn recompute(&mut self) {
        self.result = match &self.pca {
            Some(pca) if !self.sample.is_empty() => Some(compute_sqi(&self.sample, &pca.weights)),
            _ => None,
        };
    }

    /// Back to an empty session, keeping the configuration.
    pub fn reset(&mut self) {
        *self = Session::new(self.config);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::scoring::sqi::Category;

    fn loaded_session() -> Session {
        let dataset = Dataset::from_numeric(
            vec!["Moisture".into(), "Organic Carbon".into()],
            vec![vec![20.0, 1.0], vec![30.0, 2.5], vec![25.0, 1.5], vec![40.0, 3.0]],
        )
        .unwrap();
        let mut session = Session::default();
        session.set_dataset(dataset);
        session
    }

    #[test]
    fn test_workflow() {
        let mut session = Session::default();
        assert_eq!(session.step(), Step::Upload);
        assert!(session.analyse().is_err());

        let mut session = loaded_session();
        assert_eq!(session.step(), Step::Analysis);
        assert_eq!(session.sample.values(), &[0.0, 0.0]);
        assert!(session.result.is_none());

        session.analyse().unwrap();
        assert_eq!(session.step(), Step::Assessment);
        let result = session.result.as_ref().unwrap();
        assert_eq!(result.sqi, 0.0);
        assert_eq!(result.category, Category::Low);
    }

    #[test]
    fn test_edits_recompute_result() {
        let mut session = loaded_session();
        session.analyse().unwrap();
        session.set_value("Moisture", 100.0).unwrap();
        session.set_value_text("Organic Carbon", "7.5 %").unwrap();

        let result = session.result.as_ref().unwrap();
        assert_relative_eq!(result.sqi, 1.0, epsilon = 1e-9);
        assert_eq!(result.category, Category::High);

        session.set_value_text("Moisture", "n/a").unwrap();
        assert_eq!(session.sample.get("Moisture"), Some(0.0));
        assert!(session.result.as_ref().unwrap().sqi < 1.0);
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let mut session = loaded_session();
        let err = session.set_value("Sand", 1.0).unwrap_err();
        assert_eq!(err, DatasetError::UnknownParameter("Sand".into()));
    }

    #[test]
    fn test_reset() {
        let mut session = loaded_session();
        session.analyse().unwrap();
        session.reset();
        assert_eq!(session.step(), Step::Upload);
        assert!(session.sample.is_empty());
        assert!(session.status_message.is_none());
    }
}
