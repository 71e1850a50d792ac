/// Data layer: core types, loading, and the dimensional index.
///
/// Architecture:
/// ```text
///  analogs .tsv / run config .txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse rows → AnalogDataset (derived fields, ranges)
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ AnalogDataset  │  Vec<AnalogRecord>, normalization constants
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  shared FilterSet → per-chart (key → count) aggregates
///   └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;
