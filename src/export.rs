//! Writers for the two report outputs: the raw records as pretty JSON and a
//! flattened, always-quoted CSV.

use crate::error::ReportError;
use crate::models::CommissionRecord;
use csv::{QuoteStyle, WriterBuilder};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: [&str; 12] = [
    "commission_id",
    "transaction_date",
    "transaction_total",
    "transaction_commission",
    "vendor_id_offer_id",
    "offer_title",
    "vendor_type",
    "click_source",
    "referrer",
    "placement_id",
    "city",
    "country",
];

const UNKNOWN: &str = "?";

/// One CSV line. Field order matches [`CSV_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub commission_id: String,
    pub transaction_date: String,
    pub transaction_total: String,
    pub transaction_commission: String,
    pub vendor_id_offer_id: String,
    pub offer_title: String,
    pub vendor_type: String,
    pub click_source: String,
    pub referrer: String,
    pub placement_id: String,
    /// "City, ST"
    pub city: String,
    pub country: String,
}

impl From<&CommissionRecord> for FlatRow {
    fn from(record: &CommissionRecord) -> Self {
        let text = |key: &str| record.text(key).unwrap_or_default();
        let geo = record.geo();
        FlatRow {
            commission_id: record.id().unwrap_or_default(),
            transaction_date: text("transaction_date"),
            transaction_total: text("transaction_total"),
            transaction_commission: text("transaction_commission"),
            vendor_id_offer_id: text("vendor_id_offer_id"),
            offer_title: record.offer_title().unwrap_or_default(),
            vendor_type: text("vendor_type"),
            click_source: text("click_source"),
            referrer: text("referrer"),
            placement_id: text("placement_id"),
            city: format!(
                "{}, {}",
                geo.city().as_deref().unwrap_or(UNKNOWN),
                geo.region().as_deref().unwrap_or(UNKNOWN)
            ),
            country: geo.country().unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Write the records exactly as received, pretty-printed.
pub fn write_raw_json(records: &[CommissionRecord], path: &Path) -> Result<(), ReportError> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush().map_err(|source| io_error(path, source))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write the header plus one flattened row per record to `path`.
pub fn write_flat_csv(records: &[CommissionRecord], path: &Path) -> Result<(), ReportError> {
    let rows = write_flat_csv_to(records, BufWriter::new(create(path)?))?;
    info!("Wrote {} rows to {}", rows, path.display());
    Ok(())
}

/// Write the flat CSV to any writer and return the number of data rows.
///
/// The header is plain; every data field is quoted.
pub fn write_flat_csv_to<W: Write>(
    records: &[CommissionRecord],
    writer: W,
) -> Result<usize, ReportError> {
    let mut header = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(writer);
    header.write_record(CSV_HEADER)?;
    let writer = header
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;

    let mut csv = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);
    for record in records {
        csv.serialize(FlatRow::from(record))?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(records.len())
}

fn create(path: &Path) -> Result<File, ReportError> {
    File::create(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}
