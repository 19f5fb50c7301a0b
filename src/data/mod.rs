/// Data layer: run types, loading, and run selection.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RunDataset
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ RunDataset │  Vec<RunInfo>, Vec<RunHistory>, column index
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply config predicates → selected run ids
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
