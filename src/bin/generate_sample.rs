use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, Int64Builder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

const MONTHS: [&str; 12] = [
    "Jan-2024", "Feb-2024", "Mar-2024", "Apr-2024", "May-2024", "Jun-2024",
    "Jul-2024", "Aug-2024", "Sep-2024", "Oct-2024", "Nov-2024", "Dec-2024",
];

const OTA_COLUMNS: [&str; 5] = ["Trip advisor", "Airbnb", "MMT/Goibibo", "Agoda", "Booking.Com"];

const LOCALITIES: [&str; 6] = ["Goa-1", "Goa-2", "Manali-1", "Jaipur-1", "Jaipur-2", "Pune-1"];

/// Write a synthetic OTA booking table.
#[derive(Parser, Debug)]
#[command(about = "Generate a sample OTA booking table", long_about = None)]
struct Args {
    /// CSV output path
    #[arg(short, long, default_value = "data.csv")]
    output: PathBuf,

    /// Also write a Parquet copy next to the CSV (same name, .parquet)
    #[arg(long)]
    parquet: bool,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }
}

/// One wide row: month, rating, locality and a count per channel.
struct SampleRow {
    month: &'static str,
    rating: i64,
    locality: &'static str,
    counts: [Option<i64>; 5],
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<SampleRow> {
    let mut rows = Vec::new();
    for (p, &locality) in LOCALITIES.iter().enumerate() {
        // Each property is listed on a fixed subset of channels, plus the
        // occasional month where a listing is missing.
        let listed: Vec<bool> = (0..OTA_COLUMNS.len()).map(|o| (p + o) % 4 != 0).collect();
        let popularity = 5 + (p as u64 * 7) % 20;

        for &month in &MONTHS {
            for rating in 1..=5i64 {
                let mut counts = [None; 5];
                for (o, slot) in counts.iter_mut().enumerate() {
                    if !listed[o] || rng.next_f64() < 0.08 {
                        continue;
                    }
                    // Higher ratings are more common.
                    let weight = rating as u64 * rating as u64;
                    *slot = Some((rng.below(popularity * weight / 5 + 1)) as i64);
                }
                rows.push(SampleRow {
                    month,
                    rating,
                    locality,
                    counts,
                });
            }
        }
    }

    // Shuffle so the loader has to sort by month.
    for i in (1..rows.len()).rev() {
        let j = rng.below(i as u64 + 1) as usize;
        rows.swap(i, j);
    }
    rows
}

fn write_csv(rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["Month Year", "Rating", "Locality"];
    header.extend(OTA_COLUMNS);
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.month.to_string(), row.rating.to_string(), row.locality.to_string()];
        record.extend(
            row.counts
                .iter()
                .map(|c| c.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut fields = vec![
        Field::new("Month Year", DataType::Utf8, false),
        Field::new("Rating", DataType::Int64, false),
        Field::new("Locality", DataType::Utf8, false),
    ];
    fields.extend(OTA_COLUMNS.iter().map(|c| Field::new(*c, DataType::Int64, true)));
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(rows.iter().map(|r| r.month).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(rows.iter().map(|r| r.rating).collect::<Vec<_>>())),
        Arc::new(StringArray::from(rows.iter().map(|r| r.locality).collect::<Vec<_>>())),
    ];
    for o in 0..OTA_COLUMNS.len() {
        let mut builder = Int64Builder::with_capacity(rows.len());
        for row in rows {
            builder.append_option(row.counts[o]);
        }
        columns.push(Arc::new(builder.finish()));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let rows = generate_rows(&mut rng);

    write_csv(&rows, &args.output)?;
    println!("Wrote {} rows to {}", rows.len(), args.output.display());

    if args.parquet {
        let parquet_path = args.output.with_extension("parquet");
        write_parquet(&rows, &parquet_path)?;
        println!("Wrote {} rows to {}", rows.len(), parquet_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parquet_flag_and_output_parse() {
        let args = Args::try_parse_from(["generate_sample", "--output", "out/x.csv", "--parquet"]).unwrap();
        assert!(args.parquet);
        assert_eq!(args.output.with_extension("parquet"), PathBuf::from("out/x.parquet"));

        let args = Args::try_parse_from(["generate_sample"]).unwrap();
        assert!(!args.parquet);
        assert_eq!(args.output, PathBuf::from("data.csv"));
        assert_eq!(args.seed, 42);
    }

    #[test]
    fn rows_cover_every_month_and_leave_gaps() {
        let rows = generate_rows(&mut SimpleRng::new(7));
        assert_eq!(rows.len(), LOCALITIES.len() * MONTHS.len() * 5);
        assert!(MONTHS.iter().all(|m| rows.iter().any(|r| r.month == *m)));
        assert!(rows.iter().any(|r| r.counts.iter().any(Option::is_none)));
    }
}
