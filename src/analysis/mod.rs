/// Numerical core: dense matrix helpers, the power-iteration eigensolver and
/// the PCA engine that turns a [`Dataset`](crate::data::model::Dataset) into
/// per-parameter weights.

pub mod eigen;
pub mod matrix;
pub mod pca;
