/// Data layer: core types, loading, reshaping and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawRecord> (wide, one row per property/month/rating)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ prepare  │  month-rank sort, melt OTA columns, drop empty cells
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ OtaDataset │  Vec<LongRecord>, selector option lists
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  property / OTA / month selection → filtered view
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod prepare;
pub mod filter;

#[cfg(test)]
pub(crate) mod fixtures {
    use super::model::{Month, RawRecord};

    /// Two wide rows, deliberately out of month order, with gaps.
    pub fn goa_rows() -> Vec<RawRecord> {
        vec![
            RawRecord {
                locality: "Goa-1".into(),
                month: Month::Feb,
                rating: "4".into(),
                counts: [Some(10), None, Some(5), Some(0), Some(3)],
            },
            RawRecord {
                locality: "Goa-2".into(),
                month: Month::Jan,
                rating: "5".into(),
                counts: [Some(2), Some(7), None, Some(1), None],
            },
        ]
    }
}
