//! Soil Quality Index calculator.
//!
//! ```text
//!  raw table ──► Dataset ──► PCA ──► WeightVector ─┐
//!                                                  ├──► compute_sqi ──► SqiResult
//!  SampleInput ──────────► scoring functions ──────┘
//! ```
//!
//! The `analysis`, `scoring` and `data::model` modules are pure computation.
//! File loading, the interactive session and report rendering sit on top.

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod report;
pub mod scoring;
pub mod state;

pub use analysis::pca::{run_pca, run_pca_with, PcaConfig, PcaOutcome, WeightVector};
pub use data::model::{CellValue, Dataset, ParameterMap, RawTable};
pub use error::{DatasetError, PcaError};
pub use scoring::functions::{score_for, ScoringFunction};
pub use scoring::sqi::{compute_sqi, Category, SampleInput, SqiResult};
