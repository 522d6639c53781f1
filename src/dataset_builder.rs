//! Projection of processed rows into the interaction, user and item tables.

use std::collections::HashSet;

use tracing::info;

use crate::metrics::MetricsCollector;
use crate::models::{Datasets, InteractionRow, ItemRow, ProcessedRecord, UserRow, PURCHASE_EVENT};

/// Builds the three recommendation tables from processed rows
#[derive(Debug, Clone)]
pub struct DatasetBuilder<'a> {
    data: &'a [ProcessedRecord],
    metrics: MetricsCollector,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(data: &'a [ProcessedRecord]) -> Self {
        Self {
            data,
            metrics: MetricsCollector::default(),
        }
    }

    /// One purchase event per paid enhancement, unique by (user, item, timestamp).
    #[must_use]
    pub fn build_interactions(&self) -> Vec<InteractionRow> {
        info!("Building interaction dataset...");

        let mut seen = HashSet::new();
        let rows: Vec<InteractionRow> = self
            .data
            .iter()
            .filter(|r| seen.insert((r.user_id.as_str(), r.item_id.as_str(), r.timestamp)))
            .map(|r| InteractionRow {
                user_id: r.user_id.clone(),
                item_id: r.item_id.clone(),
                timestamp: r.timestamp.and_utc().timestamp(),
                service_length: r.service_length,
                massage_name: r.massage_name.clone(),
                center_name: r.center_name.clone(),
                event_type: PURCHASE_EVENT.to_string(),
            })
            .collect();

        self.metrics.record_dataset_rows("interactions", rows.len());
        rows
    }

    /// One row per user id, first occurrence wins.
    #[must_use]
    pub fn build_users(&self) -> Vec<UserRow> {
        info!("Building user dataset...");

        let mut seen = HashSet::new();
        let rows: Vec<UserRow> = self
            .data
            .iter()
            .filter(|r| seen.insert(r.user_id.as_str()))
            .map(|r| UserRow {
                user_id: r.user_id.clone(),
                age: r.age,
                gender: r.gender.clone(),
                zipcode: r.zipcode.clone(),
                base_center: r.base_center.clone(),
            })
            .collect();

        self.metrics.record_dataset_rows("users", rows.len());
        rows
    }

    /// One row per item id, first occurrence wins.
    #[must_use]
    pub fn build_items(&self) -> Vec<ItemRow> {
        info!("Building item dataset...");

        let mut seen = HashSet::new();
        let rows: Vec<ItemRow> = self
            .data
            .iter()
            .filter(|r| seen.insert(r.item_id.as_str()))
            .map(|r| ItemRow {
                item_id: r.item_id.clone(),
                item_name: r.item_name.clone(),
            })
            .collect();

        self.metrics.record_dataset_rows("items", rows.len());
        rows
    }

    #[must_use]
    pub fn build_all(&self) -> Datasets {
        Datasets {
            interactions: self.build_interactions(),
            users: self.build_users(),
            items: self.build_items(),
        }
    }
}
