use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{LongRecord, Month, Ota};

// ---------------------------------------------------------------------------
// Selection: which values are picked per dimension
// ---------------------------------------------------------------------------

/// Selector state for the three filter dimensions.
/// An empty set means "no filter" on that dimension (show all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub properties: BTreeSet<String>,
    pub otas: BTreeSet<Ota>,
    pub months: BTreeSet<Month>,
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

fn admits<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

impl Selection {
    pub fn is_unrestricted(&self) -> bool {
        self.properties.is_empty() && self.otas.is_empty() && self.months.is_empty()
    }

    pub fn toggle_property(&mut self, locality: &str) {
        toggle(&mut self.properties, locality.to_string());
    }

    pub fn toggle_ota(&mut self, ota: Ota) {
        toggle(&mut self.otas, ota);
    }

    pub fn toggle_month(&mut self, month: Month) {
        toggle(&mut self.months, month);
    }

    pub fn clear(&mut self) {
        *self = Selection::default();
    }

    /// Whether a single record passes all three dimensions.
    pub fn matches(&self, record: &LongRecord) -> bool {
        admits(&self.properties, &record.locality)
            && admits(&self.otas, &record.ota)
            && admits(&self.months, &record.month)
    }
}

/// Return indices of records that pass all active selectors, in input order.
pub fn filtered_indices(records: &[LongRecord], selection: &Selection) -> Vec<usize> {
    if selection.is_unrestricted() {
        return (0..records.len()).collect();
    }
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect()
}

/// Borrowed view of the records that pass all active selectors.
pub fn filter<'a>(records: &'a [LongRecord], selection: &Selection) -> Vec<&'a LongRecord> {
    records.iter().filter(|r| selection.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::goa_rows;
    use crate::data::prepare::prepare;

    fn table() -> Vec<LongRecord> {
        prepare(goa_rows())
    }

    fn owned(view: Vec<&LongRecord>) -> Vec<LongRecord> {
        view.into_iter().cloned().collect()
    }

    #[test]
    fn unrestricted_selection_is_identity() {
        let t = table();
        assert_eq!(owned(filter(&t, &Selection::default())), t);
        assert_eq!(filtered_indices(&t, &Selection::default()), (0..t.len()).collect::<Vec<_>>());
    }

    #[test]
    fn property_filter_keeps_goa_1_records() {
        let t = table();
        let mut sel = Selection::default();
        sel.toggle_property("Goa-1");

        let out = filter(&t, &sel);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|r| r.locality == "Goa-1"));
        assert_eq!(filtered_indices(&t, &sel), vec![3, 4, 5, 6]);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let t = table();
        let sel = Selection {
            properties: ["Goa-1".to_string(), "Goa-2".to_string()].into(),
            otas: [Ota::Agoda].into(),
            months: [Month::Feb].into(),
        };
        let out = filter(&t, &sel);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].locality, "Goa-1");
        assert_eq!(out[0].count, 0);
    }

    #[test]
    fn membership_holds_per_dimension() {
        let t = table();
        let otas: BTreeSet<Ota> = [Ota::TripAdvisor, Ota::Airbnb].into();
        let sel = Selection {
            otas: otas.clone(),
            ..Selection::default()
        };
        assert!(filter(&t, &sel).iter().all(|r| otas.contains(&r.ota)));

        let sel = Selection {
            months: [Month::Jan].into(),
            ..Selection::default()
        };
        let out = filter(&t, &sel);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.month == Month::Jan));
    }

    #[test]
    fn no_match_gives_empty_view() {
        let t = table();
        let mut sel = Selection::default();
        sel.toggle_month(Month::Dec);
        assert!(filter(&t, &sel).is_empty());
        assert!(filtered_indices(&t, &sel).is_empty());
    }

    #[test]
    fn filter_order_does_not_matter() {
        let t = table();
        let by_property = Selection {
            properties: ["Goa-1".to_string()].into(),
            ..Selection::default()
        };
        let by_ota = Selection {
            otas: [Ota::TripAdvisor, Ota::Agoda].into(),
            ..Selection::default()
        };
        let by_month = Selection {
            months: [Month::Feb].into(),
            ..Selection::default()
        };
        let all = Selection {
            properties: by_property.properties.clone(),
            otas: by_ota.otas.clone(),
            months: by_month.months.clone(),
        };

        let chain = |steps: [&Selection; 3]| {
            steps
                .iter()
                .fold(t.clone(), |acc, sel| owned(filter(&acc, sel)))
        };
        let expected = owned(filter(&t, &all));
        assert_eq!(expected.len(), 2);
        assert!(expected.iter().all(|r| r.month == Month::Feb));

        assert_eq!(chain([&by_property, &by_ota, &by_month]), expected);
        assert_eq!(chain([&by_month, &by_property, &by_ota]), expected);
        assert_eq!(chain([&by_ota, &by_month, &by_property]), expected);
        assert_eq!(chain([&by_month, &by_ota, &by_property]), expected);
    }

    #[test]
    fn month_filter_commutes_with_ota_filter() {
        let t = table();
        let jan = Selection {
            months: [Month::Jan].into(),
            ..Selection::default()
        };
        let agoda = Selection {
            otas: [Ota::Agoda].into(),
            ..Selection::default()
        };
        let a = owned(filter(&owned(filter(&t, &jan)), &agoda));
        let b = owned(filter(&owned(filter(&t, &agoda)), &jan));
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].locality, "Goa-2");
    }

    #[test]
    fn repeated_calls_agree_and_preserve_order() {
        let t = table();
        let mut sel = Selection::default();
        sel.toggle_ota(Ota::Agoda);
        sel.toggle_ota(Ota::TripAdvisor);
        let first = filtered_indices(&t, &sel);
        let second = filtered_indices(&t, &sel);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn toggle_twice_clears_value() {
        let mut sel = Selection::default();
        sel.toggle_property("Goa-2");
        assert!(!sel.is_unrestricted());
        sel.toggle_property("Goa-2");
        assert!(sel.is_unrestricted());

        sel.toggle_month(Month::Jun);
        sel.clear();
        assert!(sel.is_unrestricted());
    }
}
