//! CSV output of the recommendation tables.
//!
//! Each table is written with its fixed upper-case header, even when empty,
//! so the import job always sees the schema columns. Nulls become empty cells.

use crate::error::Result;
use crate::models::{DatasetKind, Datasets, InteractionRow, ItemRow, UserRow};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// A row type with a fixed CSV header
pub trait CsvTable: Serialize {
    /// Column names in serialization order
    const HEADER: &'static [&'static str];
}

impl CsvTable for InteractionRow {
    const HEADER: &'static [&'static str] = &[
        "USER_ID",
        "ITEM_ID",
        "TIMESTAMP",
        "SERVICE_LENGTH",
        "MASSAGE_NAME",
        "CENTER_NAME",
        "EVENT_TYPE",
    ];
}

impl CsvTable for UserRow {
    const HEADER: &'static [&'static str] = &["USER_ID", "AGE", "GENDER", "ZIPCODE", "BASE_CENTER"];
}

impl CsvTable for ItemRow {
    const HEADER: &'static [&'static str] = &["ITEM_ID", "ITEM_NAME"];
}

/// Write one table to a CSV file.
pub fn write_table<T: CsvTable>(rows: &[T], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer.write_record(T::HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    info!(path = %file_path.display(), rows = rows.len(), "Wrote dataset file");
    Ok(())
}

/// Write the three tables into `output_dir` under their fixed file names.
///
/// Returns the written paths in interaction, user, item order.
pub fn write_datasets(datasets: &Datasets, output_dir: &Path) -> Result<Vec<(DatasetKind, PathBuf)>> {
    create_dir_all(output_dir)?;

    let interactions = output_dir.join(DatasetKind::Interactions.file_name());
    write_table(&datasets.interactions, &interactions)?;

    let users = output_dir.join(DatasetKind::Users.file_name());
    write_table(&datasets.users, &users)?;

    let items = output_dir.join(DatasetKind::Items.file_name());
    write_table(&datasets.items, &items)?;

    Ok(vec![
        (DatasetKind::Interactions, interactions),
        (DatasetKind::Users, users),
        (DatasetKind::Items, items),
    ])
}
