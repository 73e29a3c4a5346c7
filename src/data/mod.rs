/// Data layer: raw cells, numeric coercion, loading and cleaning.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → headers + raw cells
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop unnamed columns and blank rows → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  coerce cells → Dataset (numeric, rectangular)
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
