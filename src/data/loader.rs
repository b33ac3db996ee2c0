use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{Month, Ota, RawRecord};

pub const MONTH_COLUMN: &str = "Month Year";
pub const RATING_COLUMN: &str = "Rating";
pub const LOCALITY_COLUMN: &str = "Locality";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the wide booking table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `Month Year`, `Rating`, `Locality` and one
///   count column per OTA (`Trip advisor`, `Airbnb`, `MMT/Goibibo`, `Agoda`,
///   `Booking.Com`); blank count cells mean "not listed"
/// * `.json`    – `[{ "Month Year": "Jan-2024", "Rating": 4, ... }, ...]`
/// * `.parquet` – the same columns as Arrow fields
pub fn load_file(path: &Path) -> Result<Vec<RawRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Cell parsing shared by all formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CountError {
    #[error("'{0}' is not a number")]
    NotNumeric(String),
    #[error("{0} is negative")]
    Negative(f64),
    #[error("{0} is not a whole number")]
    NotWhole(f64),
}

/// Parse a textual count cell.  Blank and `NaN` cells are `None`.
pub fn parse_count(cell: &str) -> Result<Option<u64>, CountError> {
    let s = cell.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    if let Ok(n) = s.parse::<u64>() {
        return Ok(Some(n));
    }
    match s.parse::<f64>() {
        Ok(v) => count_from_f64(v),
        Err(_) => Err(CountError::NotNumeric(s.to_string())),
    }
}

/// Float counts appear when a column holds gaps (pandas writes `10.0`).
pub fn count_from_f64(v: f64) -> Result<Option<u64>, CountError> {
    if v.is_nan() {
        return Ok(None);
    }
    if v < 0.0 {
        return Err(CountError::Negative(v));
    }
    if !v.is_finite() || v.fract() != 0.0 || v > u64::MAX as f64 {
        return Err(CountError::NotWhole(v));
    }
    Ok(Some(v as u64))
}

fn count_from_i64(v: i64) -> Result<Option<u64>, CountError> {
    u64::try_from(v)
        .map(Some)
        .map_err(|_| CountError::Negative(v as f64))
}

/// Ratings are categorical; `4.0` and `4` name the same category.
pub fn normalize_rating(cell: &str) -> String {
    let s = cell.trim();
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && s.contains('.') => format!("{}", v as i64),
        _ => s.to_string(),
    }
}

fn parse_month(cell: &str, row: usize) -> Result<Month> {
    cell.parse::<Month>()
        .with_context(|| format!("Row {row}: invalid '{MONTH_COLUMN}'"))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Column positions of the eight required headers.
struct CsvLayout {
    month: usize,
    rating: usize,
    locality: usize,
    counts: [usize; 5],
}

impl CsvLayout {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("CSV missing '{name}' column"))
        };

        let mut counts = [0usize; 5];
        for ota in Ota::ALL {
            counts[ota.index()] = find(ota.column())?;
        }

        Ok(CsvLayout {
            month: find(MONTH_COLUMN)?,
            rating: find(RATING_COLUMN)?,
            locality: find(LOCALITY_COLUMN)?,
            counts,
        })
    }
}

fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    read_csv(file)
}

/// Parse CSV from any reader.  Columns are located by header name.
pub fn read_csv<R: std::io::Read>(input: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let layout = CsvLayout::from_headers(&headers)?;

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let month = parse_month(cell(layout.month), row_no)?;

        let mut counts = [None; 5];
        for ota in Ota::ALL {
            counts[ota.index()] = parse_count(cell(layout.counts[ota.index()]))
                .with_context(|| format!("CSV row {row_no}: bad '{}' count", ota.column()))?;
        }

        rows.push(RawRecord {
            locality: cell(layout.locality).trim().to_string(),
            month,
            rating: normalize_rating(cell(layout.rating)),
            counts,
        });
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Month Year": "Jan-2024",
///     "Rating": 4,
///     "Locality": "Goa-1",
///     "Trip advisor": 10,
///     "Airbnb": null,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<RawRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Vec<RawRecord>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let month_text = obj
            .get(MONTH_COLUMN)
            .and_then(|v| v.as_str())
            .with_context(|| format!("Row {i}: missing or non-text '{MONTH_COLUMN}'"))?;
        let month = parse_month(month_text, i)?;

        let rating = obj
            .get(RATING_COLUMN)
            .map(json_to_text)
            .with_context(|| format!("Row {i}: missing '{RATING_COLUMN}'"))?;
        let locality = obj
            .get(LOCALITY_COLUMN)
            .map(json_to_text)
            .with_context(|| format!("Row {i}: missing '{LOCALITY_COLUMN}'"))?;

        let mut counts = [None; 5];
        for ota in Ota::ALL {
            let val = obj
                .get(ota.column())
                .with_context(|| format!("Row {i}: missing '{}'", ota.column()))?;
            counts[ota.index()] = json_to_count(val)
                .with_context(|| format!("Row {i}: bad '{}' count", ota.column()))?;
        }

        rows.push(RawRecord {
            locality: locality.trim().to_string(),
            month,
            rating: normalize_rating(&rating),
            counts,
        });
    }

    Ok(rows)
}

fn json_to_text(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_to_count(val: &JsonValue) -> Result<Option<u64>, CountError> {
    match val {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(Some(u))
            } else if let Some(i) = n.as_i64() {
                count_from_i64(i)
            } else {
                count_from_f64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => parse_count(s),
        other => Err(CountError::NotNumeric(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding the wide booking table.
///
/// Text columns may be Utf8 or LargeUtf8 (`Rating` may also be numeric).
/// Count columns may be any integer or floating type; nulls and NaNs are
/// treated as "not listed".
fn load_parquet(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = rows.len();
        rows.extend(read_batch(&batch, offset)?);
    }

    Ok(rows)
}

/// Convert one Arrow batch.  `offset` is the row number of the first row,
/// used only for error messages.
pub fn read_batch(batch: &RecordBatch, offset: usize) -> Result<Vec<RawRecord>> {
    fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
        batch
            .column_by_name(name)
            .with_context(|| format!("Parquet file missing '{name}' column"))
    }

    let months = text_column(column(batch, MONTH_COLUMN)?, MONTH_COLUMN)?;
    let ratings = text_column(column(batch, RATING_COLUMN)?, RATING_COLUMN)?;
    let localities = text_column(column(batch, LOCALITY_COLUMN)?, LOCALITY_COLUMN)?;

    let mut count_columns = Vec::with_capacity(Ota::ALL.len());
    for ota in Ota::ALL {
        count_columns.push(count_column(column(batch, ota.column())?, ota.column())?);
    }

    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let row_no = offset + row;
        let month_text = months
            .get(row)
            .and_then(|m| m.as_deref())
            .with_context(|| format!("Row {row_no}: null '{MONTH_COLUMN}'"))?;
        let month = parse_month(month_text, row_no)?;

        let mut counts = [None; 5];
        for ota in Ota::ALL {
            counts[ota.index()] = count_columns[ota.index()][row]
                .clone()
                .with_context(|| format!("Row {row_no}: bad '{}' count", ota.column()))?;
        }

        rows.push(RawRecord {
            locality: localities[row].as_deref().unwrap_or("").trim().to_string(),
            month,
            rating: normalize_rating(ratings[row].as_deref().unwrap_or("")),
            counts,
        });
    }

    Ok(rows)
}

/// Read a column as optional strings, casting numeric columns to text.
fn text_column(col: &ArrayRef, name: &str) -> Result<Vec<Option<String>>> {
    let utf8 = match col.data_type() {
        DataType::Utf8 => col.clone(),
        DataType::LargeUtf8 | DataType::Utf8View => cast(col, &DataType::Utf8)
            .with_context(|| format!("casting '{name}' to text"))?,
        dt if dt.is_integer() || dt.is_floating() => cast(col, &DataType::Utf8)
            .with_context(|| format!("casting '{name}' to text"))?,
        other => bail!("Column '{name}' has type {other:?}, expected text"),
    };
    let strings = utf8.as_string::<i32>();
    Ok(strings.iter().map(|v| v.map(str::to_string)).collect())
}

/// Read a count column as per-row parse results.
fn count_column(col: &ArrayRef, name: &str) -> Result<Vec<Result<Option<u64>, CountError>>> {
    let dt = col.data_type();
    if dt.is_integer() {
        let ints = cast(col, &DataType::Int64).with_context(|| format!("casting '{name}'"))?;
        let ints = ints.as_primitive::<Int64Type>();
        Ok((0..ints.len())
            .map(|i| {
                if ints.is_null(i) {
                    Ok(None)
                } else {
                    count_from_i64(ints.value(i))
                }
            })
            .collect())
    } else if dt.is_floating() {
        let floats = cast(col, &DataType::Float64).with_context(|| format!("casting '{name}'"))?;
        let floats = floats.as_primitive::<Float64Type>();
        Ok((0..floats.len())
            .map(|i| {
                if floats.is_null(i) {
                    Ok(None)
                } else {
                    count_from_f64(floats.value(i))
                }
            })
            .collect())
    } else if *dt == DataType::Null {
        Ok(vec![Ok(None); col.len()])
    } else {
        bail!("Column '{name}' has type {dt:?}, expected a numeric count")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "Month Year,Rating,Locality,Trip advisor,Airbnb,MMT/Goibibo,Agoda,Booking.Com";

    fn goa_csv() -> String {
        format!("{HEADER}\nFeb-2024,4,Goa-1,10,,5,0,3\nJan-2024,5,Goa-2,2,7,,1,\n")
    }

    #[test]
    fn csv_reads_wide_rows_with_gaps() {
        let rows = read_csv(goa_csv().as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].locality, "Goa-1");
        assert_eq!(rows[0].month, Month::Feb);
        assert_eq!(rows[0].rating, "4");
        assert_eq!(rows[0].counts, [Some(10), None, Some(5), Some(0), Some(3)]);
        assert_eq!(rows[1].counts, [Some(2), Some(7), None, Some(1), None]);
    }

    #[test]
    fn csv_columns_are_found_by_name() {
        let text = "Locality,Agoda,Booking.Com,Airbnb,Notes,MMT/Goibibo, Trip advisor ,Rating,Month Year\n\
                    Goa-9,1,2,3,ignored,4,5,3,Jul-2024\n";
        let rows = read_csv(text.as_bytes()).unwrap();
        assert_eq!(rows[0].month, Month::Jul);
        assert_eq!(rows[0].counts, [Some(5), Some(3), Some(4), Some(1), Some(2)]);
    }

    #[test]
    fn csv_accepts_pandas_float_counts() {
        let text = format!("{HEADER}\nMar-2024,4.0,Goa-1,10.0,NaN,5.0,,3\n");
        let rows = read_csv(text.as_bytes()).unwrap();
        assert_eq!(rows[0].counts, [Some(10), None, Some(5), None, Some(3)]);
        assert_eq!(rows[0].rating, "4");
    }

    #[test]
    fn csv_rejects_unknown_month() {
        let text = format!("{HEADER}\nJan-2025,4,Goa-1,1,1,1,1,1\n");
        let err = read_csv(text.as_bytes()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Row 0"), "{msg}");
        assert!(msg.contains("Jan-2025"), "{msg}");
    }

    #[test]
    fn csv_rejects_missing_column() {
        let text = "Month Year,Rating,Locality,Trip advisor,Airbnb,Agoda,Booking.Com\n";
        let err = read_csv(text.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("MMT/Goibibo"));
    }

    #[test]
    fn csv_rejects_bad_counts() {
        for bad in ["-1", "2.5", "many"] {
            let text = format!("{HEADER}\nJan-2024,4,Goa-1,{bad},1,1,1,1\n");
            assert!(read_csv(text.as_bytes()).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn count_parsing_edge_cases() {
        assert_eq!(parse_count(""), Ok(None));
        assert_eq!(parse_count("  "), Ok(None));
        assert_eq!(parse_count("nan"), Ok(None));
        assert_eq!(parse_count("0"), Ok(Some(0)));
        assert_eq!(parse_count(" 12 "), Ok(Some(12)));
        assert_eq!(parse_count("7.0"), Ok(Some(7)));
        assert_eq!(parse_count("-3"), Err(CountError::Negative(-3.0)));
        assert_eq!(parse_count("1.5"), Err(CountError::NotWhole(1.5)));
    }

    #[test]
    fn rating_normalisation_keeps_labels() {
        assert_eq!(normalize_rating("4.0"), "4");
        assert_eq!(normalize_rating(" 5 "), "5");
        assert_eq!(normalize_rating("4.5"), "4.5");
        assert_eq!(normalize_rating("3 Star"), "3 Star");
    }

    #[test]
    fn json_records_load() {
        let text = r#"[
            {"Month Year": "Feb-2024", "Rating": 4, "Locality": "Goa-1",
             "Trip advisor": 10, "Airbnb": null, "MMT/Goibibo": 5.0, "Agoda": 0, "Booking.Com": "3"}
        ]"#;
        let rows = parse_json(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rating, "4");
        assert_eq!(rows[0].counts, [Some(10), None, Some(5), Some(0), Some(3)]);
    }

    #[test]
    fn json_rejects_missing_channel() {
        let text = r#"[{"Month Year": "Feb-2024", "Rating": 4, "Locality": "Goa-1"}]"#;
        assert!(parse_json(text).is_err());
    }

    fn goa_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new(MONTH_COLUMN, DataType::Utf8, false),
            Field::new(RATING_COLUMN, DataType::Int64, false),
            Field::new(LOCALITY_COLUMN, DataType::Utf8, true),
            Field::new("Trip advisor", DataType::Int64, true),
            Field::new("Airbnb", DataType::Float64, true),
            Field::new("MMT/Goibibo", DataType::Float64, true),
            Field::new("Agoda", DataType::Int64, true),
            Field::new("Booking.Com", DataType::Int64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Feb-2024", "Jan-2024"])),
                Arc::new(Int64Array::from(vec![4, 5])),
                Arc::new(StringArray::from(vec![Some("Goa-1"), None])),
                Arc::new(Int64Array::from(vec![Some(10), Some(2)])),
                Arc::new(Float64Array::from(vec![Some(f64::NAN), Some(7.0)])),
                Arc::new(Float64Array::from(vec![Some(5.0), None])),
                Arc::new(Int64Array::from(vec![Some(0), Some(1)])),
                Arc::new(Int64Array::from(vec![Some(3), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn arrow_batch_loads_mixed_types() {
        let rows = read_batch(&goa_batch(), 0).unwrap();
        assert_eq!(rows[0].counts, [Some(10), None, Some(5), Some(0), Some(3)]);
        assert_eq!(rows[1].counts, [Some(2), Some(7), None, Some(1), None]);
        assert_eq!(rows[1].locality, "");
        assert_eq!(rows[1].rating, "5");
    }

    #[test]
    fn parquet_file_loads_through_load_file() {
        let batch = goa_batch();
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let rows = load_file(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, Month::Feb);
        assert_eq!(rows[0].locality, "Goa-1");
        assert_eq!(rows[0].counts, [Some(10), None, Some(5), Some(0), Some(3)]);
        assert_eq!(rows[1].month, Month::Jan);
        assert_eq!(rows[1].counts, [Some(2), Some(7), None, Some(1), None]);
    }

    #[test]
    fn json_file_loads_through_load_file() {
        let mut file = tempfile::Builder::new().suffix(".JSON").tempfile().unwrap();
        write!(
            file,
            r#"[
                {{"Month Year": "Feb-2024", "Rating": 4, "Locality": "Goa-1",
                  "Trip advisor": 10, "Airbnb": null, "MMT/Goibibo": 5, "Agoda": 0, "Booking.Com": 3}},
                {{"Month Year": "Jan-2024", "Rating": "5.0", "Locality": "Goa-2",
                  "Trip advisor": 2, "Airbnb": 7, "MMT/Goibibo": null, "Agoda": 1, "Booking.Com": null}}
            ]"#
        )
        .unwrap();

        let rows = load_file(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].rating, "5");
        assert_eq!(rows[0].counts, [Some(10), None, Some(5), Some(0), Some(3)]);
        assert_eq!(rows[1].counts, [Some(2), Some(7), None, Some(1), None]);
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let mut csv_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        csv_file.write_all(goa_csv().as_bytes()).unwrap();
        assert_eq!(load_file(csv_file.path()).unwrap().len(), 2);

        let txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(load_file(txt.path()).is_err());
    }
}
