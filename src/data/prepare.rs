use super::model::{LongRecord, Ota, RawRecord};

// ---------------------------------------------------------------------------
// Wide → long reshape
// ---------------------------------------------------------------------------

/// Reshape wide per-channel rows into one record per non-null channel cell.
///
/// Rows are stably sorted by month rank first, then melted row by row in
/// [`Ota::ALL`] order, so the output is month-monotonic and the records of a
/// single source row stay contiguous.  Cells without a count are dropped;
/// a count of zero is kept.
pub fn prepare(mut raw_rows: Vec<RawRecord>) -> Vec<LongRecord> {
    // `sort_by_key` is stable: equal months keep file order.
    raw_rows.sort_by_key(|r| r.month.rank());

    let capacity = raw_rows
        .iter()
        .map(|r| r.counts.iter().flatten().count())
        .sum();
    let mut out = Vec::with_capacity(capacity);

    for row in raw_rows {
        for ota in Ota::ALL {
            let Some(count) = row.count(ota) else {
                continue;
            };
            out.push(LongRecord {
                locality: row.locality.clone(),
                month: row.month,
                rating: row.rating.clone(),
                ota,
                count,
            });
        }
    }

    out
}
