use std::path::Path;

use anyhow::{Context, Result};

use crate::charts::ChartSet;
use crate::color::ColorMap;
use crate::dashboard::Dashboard;
use crate::data::filter::Selection;
use crate::data::loader::load_file;
use crate::data::model::{Month, Ota, OtaDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dashboard (None until a file is loaded).
    pub dashboard: Option<Dashboard>,

    /// Property / OTA / month selections.
    pub selection: Selection,

    /// Charts for the current selection (cached).
    pub charts: ChartSet,

    /// Number of long-form records passing the current selection.
    pub visible: usize,

    /// Rating → colour, shared by every chart.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

/// Read and prepare a booking table.
pub fn load_dataset(path: &Path) -> Result<OtaDataset> {
    let raw = load_file(path).with_context(|| format!("loading {}", path.display()))?;
    let dataset = OtaDataset::from_raw(raw).with_source(path);
    log::info!(
        "Loaded {} rows ({} OTA records, {} properties) from {}",
        dataset.raw_rows,
        dataset.len(),
        dataset.localities.len(),
        path.display()
    );
    Ok(dataset)
}

impl AppState {
    /// Ingest a newly loaded dataset, reset selections and colours.
    pub fn set_dataset(&mut self, dataset: OtaDataset) {
        self.status_message = if dataset.is_empty() {
            log::warn!("Loaded table has no OTA counts");
            Some("Loaded table has no OTA counts".to_string())
        } else {
            None
        };
        self.color_map = Some(ColorMap::new("Rating", &dataset.ratings));
        self.dashboard = Some(Dashboard::new(dataset));
        self.selection = Selection::default();
        self.refresh();
    }

    /// Load a file at runtime.  On failure the current dataset is kept and
    /// the error is shown in the status bar.
    pub fn open(&mut self, path: &Path) {
        match load_dataset(path) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn dataset(&self) -> Option<&OtaDataset> {
        self.dashboard.as_ref().map(Dashboard::dataset)
    }

    /// Recompute charts after a selection change.
    pub fn refresh(&mut self) {
        match &self.dashboard {
            Some(d) => {
                self.charts = d.render(&self.selection);
                self.visible = d.visible_count(&self.selection);
            }
            None => {
                self.charts = ChartSet::default();
                self.visible = 0;
            }
        }
    }

    pub fn toggle_property(&mut self, locality: &str) {
        self.selection.toggle_property(locality);
        self.refresh();
    }

    pub fn toggle_ota(&mut self, ota: Ota) {
        self.selection.toggle_ota(ota);
        self.refresh();
    }

    pub fn toggle_month(&mut self, month: Month) {
        self.selection.toggle_month(month);
        self.refresh();
    }

    pub fn clear_properties(&mut self) {
        self.selection.properties.clear();
        self.refresh();
    }

    pub fn clear_otas(&mut self) {
        self.selection.otas.clear();
        self.refresh();
    }

    pub fn clear_months(&mut self) {
        self.selection.months.clear();
        self.refresh();
    }

    pub fn clear_all(&mut self) {
        self.selection.clear();
        self.refresh();
    }

    /// Write the current charts as pretty-printed JSON.
    pub fn export_charts(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.charts).context("serialising charts")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported charts to {}", path.display());
        Ok(())
    }
}
