use crate::charts::{ChartSet, build_charts};
use crate::data::filter::{Selection, filter, filtered_indices};
use crate::data::model::OtaDataset;

// ---------------------------------------------------------------------------
// Dashboard service: prepared table + selection → charts
// ---------------------------------------------------------------------------

/// Owns the prepared, read-only table for the lifetime of a loaded file.
#[derive(Debug, Clone)]
pub struct Dashboard {
    dataset: OtaDataset,
}

impl Dashboard {
    pub fn new(dataset: OtaDataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &OtaDataset {
        &self.dataset
    }

    /// Recompute the five charts for a selection.  Pure: the table is never
    /// touched, so identical selections give identical charts.
    pub fn render(&self, selection: &Selection) -> ChartSet {
        let view = filter(&self.dataset.records, selection);
        log::debug!(
            "selection matched {} of {} records",
            view.len(),
            self.dataset.len()
        );
        build_charts(&view)
    }

    /// Number of records passing the selection.
    pub fn visible_count(&self, selection: &Selection) -> usize {
        filtered_indices(&self.dataset.records, selection).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::goa_rows;
    use crate::data::model::{Month, Ota};

    fn dashboard() -> Dashboard {
        Dashboard::new(OtaDataset::from_raw(goa_rows()))
    }

    #[test]
    fn render_is_repeatable() {
        let d = dashboard();
        let mut sel = Selection::default();
        sel.toggle_ota(Ota::Agoda);
        assert_eq!(d.render(&sel), d.render(&sel));
        assert_eq!(d.visible_count(&sel), 2);
    }

    #[test]
    fn render_does_not_touch_table() {
        let d = dashboard();
        let before = d.dataset().records.clone();
        let mut sel = Selection::default();
        sel.toggle_month(Month::Jan);
        let _ = d.render(&sel);
        assert_eq!(d.dataset().records, before);
    }

    #[test]
    fn unmatched_selection_renders_empty_charts() {
        let d = dashboard();
        let mut sel = Selection::default();
        sel.toggle_property("Goa-404");
        let charts = d.render(&sel);
        assert!(charts.iter().all(|c| c.is_empty()));
        assert_eq!(d.visible_count(&sel), 0);
    }

    #[test]
    fn unrestricted_selection_shows_everything() {
        let d = dashboard();
        assert_eq!(d.visible_count(&Selection::default()), 7);
        assert_eq!(d.render(&Selection::default()).rating_distribution.total(), 28);
    }
}
