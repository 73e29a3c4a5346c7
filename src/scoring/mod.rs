/// Scoring layer: per-parameter scoring curves and the weighted index.

pub mod functions;
pub mod sqi;
