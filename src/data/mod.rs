//! Data layer: row types and table loading.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → RawTable (normalized column names)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  model    │  SialylatedPeakRow / DesialylatedReferenceRow
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;
pub mod table;
