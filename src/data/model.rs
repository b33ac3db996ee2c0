use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prepare::prepare;

// ---------------------------------------------------------------------------
// Month – the fixed, ordered 12-value time scale
// ---------------------------------------------------------------------------

/// One of the twelve reporting months.  Declaration order is calendar order,
/// so the derived `Ord` is the rank ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    #[serde(rename = "Jan-2024")]
    Jan,
    #[serde(rename = "Feb-2024")]
    Feb,
    #[serde(rename = "Mar-2024")]
    Mar,
    #[serde(rename = "Apr-2024")]
    Apr,
    #[serde(rename = "May-2024")]
    May,
    #[serde(rename = "Jun-2024")]
    Jun,
    #[serde(rename = "Jul-2024")]
    Jul,
    #[serde(rename = "Aug-2024")]
    Aug,
    #[serde(rename = "Sep-2024")]
    Sep,
    #[serde(rename = "Oct-2024")]
    Oct,
    #[serde(rename = "Nov-2024")]
    Nov,
    #[serde(rename = "Dec-2024")]
    Dec,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown month token '{0}' (expected Jan-2024 … Dec-2024)")]
pub struct ParseMonthError(pub String);

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Position on the scale: Jan-2024 = 0 … Dec-2024 = 11.
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Month::Jan => "Jan-2024",
            Month::Feb => "Feb-2024",
            Month::Mar => "Mar-2024",
            Month::Apr => "Apr-2024",
            Month::May => "May-2024",
            Month::Jun => "Jun-2024",
            Month::Jul => "Jul-2024",
            Month::Aug => "Aug-2024",
            Month::Sep => "Sep-2024",
            Month::Oct => "Oct-2024",
            Month::Nov => "Nov-2024",
            Month::Dec => "Dec-2024",
        }
    }
}

impl FromStr for Month {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Month::ALL
            .into_iter()
            .find(|m| m.label() == token)
            .ok_or_else(|| ParseMonthError(token.to_string()))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Ota – the five booking channels
// ---------------------------------------------------------------------------

/// An Online Travel Agency channel.  The label is the source column header,
/// which is also what the charts show as "OTA Name".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ota {
    #[serde(rename = "Trip advisor")]
    TripAdvisor,
    #[serde(rename = "Airbnb")]
    Airbnb,
    #[serde(rename = "MMT/Goibibo")]
    MmtGoibibo,
    #[serde(rename = "Agoda")]
    Agoda,
    #[serde(rename = "Booking.Com")]
    BookingCom,
}

impl Ota {
    pub const ALL: [Ota; 5] = [
        Ota::TripAdvisor,
        Ota::Airbnb,
        Ota::MmtGoibibo,
        Ota::Agoda,
        Ota::BookingCom,
    ];

    /// Header of the wide count column for this channel.
    pub fn column(self) -> &'static str {
        match self {
            Ota::TripAdvisor => "Trip advisor",
            Ota::Airbnb => "Airbnb",
            Ota::MmtGoibibo => "MMT/Goibibo",
            Ota::Agoda => "Agoda",
            Ota::BookingCom => "Booking.Com",
        }
    }

    pub fn label(self) -> &'static str {
        self.column()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Ota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of the wide source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub locality: String,
    pub month: Month,
    /// Categorical star rating, kept as text ("1" … "5").
    pub rating: String,
    /// Count per channel, indexed in [`Ota::ALL`] order.  `None` when the
    /// property is not listed on that channel for the month.
    pub counts: [Option<u64>; 5],
}

impl RawRecord {
    pub fn count(&self, ota: Ota) -> Option<u64> {
        self.counts[ota.index()]
    }
}

/// One (row, channel) cell of the reshaped table.  Always carries a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongRecord {
    pub locality: String,
    pub month: Month,
    pub rating: String,
    pub ota: Ota,
    pub count: u64,
}

// ---------------------------------------------------------------------------
// OtaDataset – the prepared, read-only table
// ---------------------------------------------------------------------------

/// The prepared long-form table together with the selector option lists.
#[derive(Debug, Clone, Default)]
pub struct OtaDataset {
    pub records: Vec<LongRecord>,
    /// Sorted unique, non-empty localities of the source rows.
    pub localities: BTreeSet<String>,
    /// Sorted unique ratings of the prepared records.
    pub ratings: BTreeSet<String>,
    /// Number of wide rows the table was built from.
    pub raw_rows: usize,
    pub source: Option<PathBuf>,
}

impl OtaDataset {
    /// Reshape raw rows and derive the option lists.
    pub fn from_raw(raw: Vec<RawRecord>) -> Self {
        let raw_rows = raw.len();
        let localities: BTreeSet<String> = raw
            .iter()
            .filter(|r| !r.locality.is_empty())
            .map(|r| r.locality.clone())
            .collect();

        let records = prepare(raw);
        let ratings = records.iter().map(|r| r.rating.clone()).collect();

        OtaDataset {
            records,
            localities,
            ratings,
            raw_rows,
            source: None,
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// Number of long-form records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
