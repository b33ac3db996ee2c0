use std::path::PathBuf;

use clap::Parser;

/// OTA performance dashboard.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "OTA performance dashboard", long_about = None)]
pub struct Config {
    /// Booking table to load at startup (.csv, .json or .parquet)
    #[arg(short, long, env = "OTA_DASHBOARD_DATA", default_value = "data.csv")]
    pub data: PathBuf,

    /// Initial window width in points
    #[arg(long, default_value_t = 1400.0)]
    pub width: f32,

    /// Initial window height in points
    #[arg(long, default_value_t = 900.0)]
    pub height: f32,
}
