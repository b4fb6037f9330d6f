/// Data layer: core types, loading, and querying.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Sheet (headers + cells)
///   └──────────┘
///        │   schema: header text → Record field
///        ▼
///   ┌──────────┐
///   │ Dataset   │  Vec<Record>, county vocabulary
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  query    │  SearchCriteria → matching row indices
///   └──────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod query;
pub mod schema;
mod xlsx;
