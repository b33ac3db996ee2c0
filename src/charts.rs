//! Declarative chart descriptors built from a filtered record view.
//!
//! Nothing here knows about egui: a [`ChartSpec`] names its axes, its
//! category order and its series, and the UI layer decides how to draw it.
//! All values are sums of `count` over the records that fall in a cell.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::data::model::{LongRecord, Month, Ota};

pub const LINE_TITLE: &str = "Monthly Star Rating Trends";
pub const BAR_TITLE: &str = "Total Star Ratings per OTA";
pub const HEATMAP_TITLE: &str = "Property-Wise Performance";
pub const PIE_TITLE: &str = "Distribution of Star Ratings";
pub const COMPARISON_TITLE: &str = "Comparative Performance of Properties";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    GroupedBar,
    Heatmap,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    /// Second category, only used by heatmap cells.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// Value of the colour-grouping field shared by the series.
    pub group: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub color_field: Option<String>,
    pub x_categories: Vec<String>,
    pub y_categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartSpec {
    fn new(title: &str, kind: ChartKind, x_label: &str, y_label: &str) -> Self {
        ChartSpec {
            title: title.to_string(),
            kind,
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            color_field: None,
            x_categories: Vec::new(),
            y_categories: Vec::new(),
            series: Vec::new(),
        }
    }

    fn colored_by(mut self, field: &str) -> Self {
        self.color_field = Some(field.to_string());
        self
    }

    /// No points at all: the UI shows "No data".
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    /// Position of a category on the x axis.
    pub fn x_index(&self, category: &str) -> Option<usize> {
        self.x_categories.iter().position(|c| c == category)
    }

    pub fn y_index(&self, category: &str) -> Option<usize> {
        self.y_categories.iter().position(|c| c == category)
    }

    /// Largest single point value, used for colour scaling.
    pub fn max_value(&self) -> u64 {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.value))
            .max()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.value))
            .fold(0, u64::saturating_add)
    }
}

/// The five dashboard charts for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSet {
    pub monthly_rating_trends: ChartSpec,
    pub ratings_per_ota: ChartSpec,
    pub property_performance: ChartSpec,
    pub rating_distribution: ChartSpec,
    pub property_comparison: ChartSpec,
}

impl ChartSet {
    pub fn iter(&self) -> impl Iterator<Item = &ChartSpec> {
        [
            &self.monthly_rating_trends,
            &self.ratings_per_ota,
            &self.property_performance,
            &self.rating_distribution,
            &self.property_comparison,
        ]
        .into_iter()
    }
}

impl Default for ChartSet {
    fn default() -> Self {
        build_charts(&[])
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Build all five charts from a filtered view.
pub fn build_charts(records: &[&LongRecord]) -> ChartSet {
    ChartSet {
        monthly_rating_trends: monthly_rating_trends(records),
        ratings_per_ota: ratings_per_ota(records),
        property_performance: property_performance(records),
        rating_distribution: rating_distribution(records),
        property_comparison: property_comparison(records),
    }
}

/// Cell sums saturate instead of overflowing on extreme counts.
fn add_count(slot: &mut u64, count: u64) {
    *slot = slot.saturating_add(count);
}

fn ratings(records: &[&LongRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.rating.clone()).collect()
}

/// One line per (rating, OTA), a point per month in calendar order.
pub fn monthly_rating_trends(records: &[&LongRecord]) -> ChartSpec {
    let mut sums: BTreeMap<(String, Ota), BTreeMap<Month, u64>> = BTreeMap::new();
    for r in records {
        let slot = sums
            .entry((r.rating.clone(), r.ota))
            .or_default()
            .entry(r.month)
            .or_default();
        add_count(slot, r.count);
    }

    let months: BTreeSet<Month> = records.iter().map(|r| r.month).collect();

    let mut spec = ChartSpec::new(LINE_TITLE, ChartKind::Line, "Month Year", "Count")
        .colored_by("Rating");
    spec.x_categories = months.iter().map(|m| m.label().to_string()).collect();
    spec.series = sums
        .into_iter()
        .map(|((rating, ota), by_month)| Series {
            name: format!("{rating} · {ota}"),
            group: rating,
            points: by_month
                .into_iter()
                .map(|(month, value)| ChartPoint {
                    x: month.label().to_string(),
                    y: None,
                    value,
                })
                .collect(),
        })
        .collect();
    spec
}

/// Grouped bars: one series per rating across the given x categories.
fn grouped_by_rating<K: Ord + Clone>(
    records: &[&LongRecord],
    key: impl Fn(&LongRecord) -> K,
    label: impl Fn(&K) -> String,
    mut spec: ChartSpec,
) -> ChartSpec {
    let mut sums: BTreeMap<String, BTreeMap<K, u64>> = BTreeMap::new();
    let mut keys: BTreeSet<K> = BTreeSet::new();
    for r in records {
        let k = key(r);
        keys.insert(k.clone());
        let slot = sums.entry(r.rating.clone()).or_default().entry(k).or_default();
        add_count(slot, r.count);
    }

    spec.x_categories = keys.iter().map(&label).collect();
    spec.series = sums
        .into_iter()
        .map(|(rating, by_key)| Series {
            name: rating.clone(),
            group: rating,
            points: by_key
                .iter()
                .map(|(k, &value)| ChartPoint {
                    x: label(k),
                    y: None,
                    value,
                })
                .collect(),
        })
        .collect();
    spec
}

pub fn ratings_per_ota(records: &[&LongRecord]) -> ChartSpec {
    let spec = ChartSpec::new(BAR_TITLE, ChartKind::GroupedBar, "OTA Name", "Count")
        .colored_by("Rating");
    grouped_by_rating(records, |r| r.ota, |o: &Ota| o.label().to_string(), spec)
}

pub fn property_comparison(records: &[&LongRecord]) -> ChartSpec {
    let spec = ChartSpec::new(COMPARISON_TITLE, ChartKind::GroupedBar, "Locality", "Count")
        .colored_by("Rating");
    grouped_by_rating(records, |r| r.locality.clone(), |l: &String| l.clone(), spec)
}

/// Locality × OTA cells holding summed counts.
pub fn property_performance(records: &[&LongRecord]) -> ChartSpec {
    let mut cells: BTreeMap<(String, Ota), u64> = BTreeMap::new();
    for r in records {
        add_count(cells.entry((r.locality.clone(), r.ota)).or_default(), r.count);
    }

    let localities: BTreeSet<&str> = records.iter().map(|r| r.locality.as_str()).collect();
    let otas: BTreeSet<Ota> = records.iter().map(|r| r.ota).collect();

    let mut spec = ChartSpec::new(HEATMAP_TITLE, ChartKind::Heatmap, "Locality", "OTA Name");
    spec.x_categories = localities.into_iter().map(String::from).collect();
    spec.y_categories = otas.iter().map(|o| o.label().to_string()).collect();
    if !cells.is_empty() {
        spec.series = vec![Series {
            name: "Count".to_string(),
            group: "Count".to_string(),
            points: cells
                .into_iter()
                .map(|((locality, ota), value)| ChartPoint {
                    x: locality,
                    y: Some(ota.label().to_string()),
                    value,
                })
                .collect(),
        }];
    }
    spec
}

/// One slice per rating, largest first.
pub fn rating_distribution(records: &[&LongRecord]) -> ChartSpec {
    let mut sums: BTreeMap<String, u64> = BTreeMap::new();
    for r in records {
        add_count(sums.entry(r.rating.clone()).or_default(), r.count);
    }

    // Largest slice first, like plotly; ties keep rating order.
    let mut slices: Vec<(String, u64)> = sums.into_iter().collect();
    slices.sort_by(|a, b| b.1.cmp(&a.1));

    let mut spec = ChartSpec::new(PIE_TITLE, ChartKind::Pie, "Rating", "Count").colored_by("Rating");
    spec.x_categories = ratings(records).into_iter().collect();
    if !slices.is_empty() {
        spec.series = vec![Series {
            name: "Rating".to_string(),
            group: "Rating".to_string(),
            points: slices
                .into_iter()
                .map(|(rating, value)| ChartPoint {
                    x: rating,
                    y: None,
                    value,
                })
                .collect(),
        }];
    }
    spec
}
