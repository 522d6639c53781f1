//! Raw point-of-sale ingestion and reshaping.
//!
//! Guests book a massage and may add one or more enhancements on the same
//! invoice. This module reads the vendor export, keeps massage and
//! enhancement lines, pairs every enhancement with the massage of its invoice
//! and derives the typed fields the dataset builder needs.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use crate::error::{RecommenderError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{MergedRecord, ProcessedRecord, TransactionRecord};

/// Default year length used for age arithmetic
pub const DAYS_IN_YEAR: f64 = 365.25;

/// Date of birth format of the export, e.g. `9/20/1978 12:00:00 AM`
pub const DOB_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

// `%.f` also matches an absent fraction; 12-hour shapes come before their
// 24-hour look-alikes
const TIMESTAMP_FORMATS: [&str; 9] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %I:%M:%S%.f %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

const REQUIRED_COLUMNS: [&str; 4] = ["invoice_id", "service_parent_category", "item_name", "item_code"];

/// Loads and reshapes the raw extract
#[derive(Debug, Clone)]
pub struct DataLoader {
    data_path: PathBuf,
    metrics: MetricsCollector,
}

impl DataLoader {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            metrics: MetricsCollector::default(),
        }
    }

    /// Path of the raw extract
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Read the extract and keep one line per `(invoice_id, item_name)` among
    /// massage and enhancement lines.
    pub fn load_data(&self) -> Result<Vec<TransactionRecord>> {
        info!(path = %self.data_path.display(), "Loading data...");
        let file = std::fs::File::open(&self.data_path)?;
        let records = read_transactions(file)?;
        self.metrics.record_rows_loaded(records.len());

        let total = records.len();
        let kept = filter_and_dedupe(records);
        self.metrics.record_rows_dropped(total - kept.len(), "filtered");
        info!(total, kept = kept.len(), "Loaded massage and enhancement lines");
        Ok(kept)
    }

    /// Load the extract and turn it into one processed row per
    /// massage/enhancement pair, aging guests relative to `today`.
    pub fn load_processed(&self, today: NaiveDateTime, days_in_year: f64) -> Result<Vec<ProcessedRecord>> {
        let lines = self.load_data()?;
        let merged = merge_massages_enhancements(&lines, &self.metrics);
        process_data_types(merged, today, days_in_year, &self.metrics)
    }
}

/// Read the extract at `path`, keeping deduplicated massage and enhancement lines.
pub fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>> {
    DataLoader::new(path).load_data()
}

/// Lower-case a header and replace spaces with underscores.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

/// Deserialize every line of a raw export.
pub fn read_transactions<R: Read>(input: R) -> Result<Vec<TransactionRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);

    let headers: StringRecord = reader.headers()?.iter().map(normalize_header).collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(RecommenderError::MissingColumn(column.to_string()));
        }
    }
    reader.set_headers(headers);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Keep massage and enhancement lines, dropping repeated `(invoice_id, item_name)`
/// pairs. The first occurrence in file order wins.
#[must_use]
pub fn filter_and_dedupe(records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| r.is_massage() || r.is_enhancement())
        .filter(|r| seen.insert((r.invoice_id.clone(), r.item_name.clone())))
        .collect()
}

/// Pair each massage line with every enhancement line sharing its invoice.
///
/// Massages without an enhancement and enhancements without an item code
/// produce no row.
#[must_use]
pub fn merge_massages_enhancements(records: &[TransactionRecord], metrics: &MetricsCollector) -> Vec<MergedRecord> {
    info!("Merging massages and enhancements...");

    let mut enhancements: HashMap<&str, Vec<&TransactionRecord>> = HashMap::new();
    for record in records.iter().filter(|r| r.is_enhancement()) {
        if let Some(invoice) = record.invoice_id.as_deref() {
            enhancements.entry(invoice).or_default().push(record);
        }
    }

    let mut merged = Vec::new();
    let mut missing_user = 0usize;
    for massage in records.iter().filter(|r| r.is_massage()) {
        let Some(invoice) = massage.invoice_id.as_deref() else {
            continue;
        };
        let Some(lines) = enhancements.get(invoice) else {
            continue;
        };
        let Some(user_id) = massage.user_id.clone() else {
            missing_user += 1;
            continue;
        };

        for enhancement in lines {
            let Some(item_id) = enhancement.item_code.clone() else {
                continue;
            };
            merged.push(MergedRecord {
                user_id: user_id.clone(),
                user_dob: massage.guest_dob.clone(),
                zipcode: massage.guest_zipcode.clone(),
                gender: massage.guest_gender.clone(),
                base_center: massage.guest_base_center.clone(),
                service_length: massage.service_length,
                massage_name: massage.item_name.clone(),
                center_name: massage.center_name.clone(),
                item_name: enhancement.item_name.clone(),
                item_id,
                timestamp: enhancement.invoice_closed_date.clone(),
            });
        }
    }

    if missing_user > 0 {
        warn!(missing_user, "Skipped massage lines without a user id");
        metrics.record_rows_dropped(missing_user, "missing_user");
    }
    merged
}

/// Derive age from date of birth and parse the enhancement timestamp.
pub fn process_data_types(
    records: Vec<MergedRecord>,
    today: NaiveDateTime,
    days_in_year: f64,
    metrics: &MetricsCollector,
) -> Result<Vec<ProcessedRecord>> {
    info!("Processing data types...");

    let mut processed = Vec::with_capacity(records.len());
    let mut missing_timestamp = 0usize;
    for record in records {
        let age = match record.user_dob.as_deref() {
            Some(dob) => Some(age_in_years(parse_dob(dob)?, today, days_in_year)),
            None => None,
        };
        let Some(raw_timestamp) = record.timestamp.as_deref() else {
            missing_timestamp += 1;
            continue;
        };
        let timestamp = parse_timestamp(raw_timestamp)?;

        processed.push(ProcessedRecord {
            user_id: record.user_id,
            age,
            zipcode: record.zipcode,
            gender: record.gender,
            base_center: record.base_center,
            service_length: record.service_length,
            massage_name: record.massage_name,
            center_name: record.center_name,
            item_name: record.item_name,
            item_id: record.item_id,
            timestamp,
        });
    }

    if missing_timestamp > 0 {
        warn!(missing_timestamp, "Dropped rows without an invoice closed date");
        metrics.record_rows_dropped(missing_timestamp, "missing_timestamp");
    }

    let users: HashSet<&str> = processed.iter().map(|r| r.user_id.as_str()).collect();
    let items: HashSet<&str> = processed.iter().map(|r| r.item_id.as_str()).collect();
    let massages: HashSet<Option<&str>> = processed.iter().map(|r| r.massage_name.as_deref()).collect();
    info!(
        "Data rows {} | Unique users {} | unique items {} | unique massages {}",
        processed.len(),
        users.len(),
        items.len(),
        massages.len()
    );

    Ok(processed)
}

/// Whole years between `dob` and `today` using a fractional year length.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn age_in_years(dob: NaiveDateTime, today: NaiveDateTime, days_in_year: f64) -> i64 {
    let days = (today - dob).num_days();
    (days as f64 / days_in_year).floor() as i64
}

/// Parse a guest date of birth.
pub fn parse_dob(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DOB_FORMAT)
        .map_err(|e| RecommenderError::InvalidDate(format!("date of birth {value:?}: {e}")))
}

/// Parse an invoice timestamp in any of the formats seen in exports.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN));
        }
    }
    Err(RecommenderError::InvalidDate(format!("timestamp {value:?}")))
}
