//! Data models for the point-of-sale extract and the recommendation datasets
//!
//! This module contains the raw transaction line, the intermediate joined and
//! processed rows, and the three output tables consumed by the recommendation
//! service.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category tag of a massage line item
pub const MASSAGE_CATEGORY: &str = "Massages";
/// Category tag of an enhancement line item
pub const ENHANCEMENT_CATEGORY: &str = "Enhancement";
/// Event type written on every interaction row
pub const PURCHASE_EVENT: &str = "purchase";

/// One line item of the raw point-of-sale export.
///
/// Field names match the export headers after lower-casing and replacing
/// spaces with underscores. Empty cells deserialize as `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionRecord {
    /// Invoice the line belongs to
    #[serde(default)]
    pub invoice_id: Option<String>,
    /// `Massages`, `Enhancement` or another category
    #[serde(default)]
    pub service_parent_category: Option<String>,
    /// Guest identifier
    #[serde(default)]
    pub user_id: Option<String>,
    /// Guest date of birth, e.g. `9/20/1978 12:00:00 AM`
    #[serde(default)]
    pub guest_dob: Option<String>,
    /// Guest zipcode
    #[serde(default)]
    pub guest_zipcode: Option<String>,
    /// Guest gender
    #[serde(default)]
    pub guest_gender: Option<String>,
    /// Center the guest is attached to
    #[serde(default)]
    pub guest_base_center: Option<String>,
    /// Service length in minutes
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub service_length: Option<f64>,
    /// Massage or enhancement name
    #[serde(default)]
    pub item_name: Option<String>,
    /// Massage or enhancement code
    #[serde(default)]
    pub item_code: Option<String>,
    /// Center where the service was delivered
    #[serde(default)]
    pub center_name: Option<String>,
    /// When the invoice was closed
    #[serde(default)]
    pub invoice_closed_date: Option<String>,
}

impl TransactionRecord {
    /// True for massage lines
    #[must_use]
    pub fn is_massage(&self) -> bool {
        self.service_parent_category.as_deref() == Some(MASSAGE_CATEGORY)
    }

    /// True for enhancement lines
    #[must_use]
    pub fn is_enhancement(&self) -> bool {
        self.service_parent_category.as_deref() == Some(ENHANCEMENT_CATEGORY)
    }
}

/// A massage line joined with one enhancement line of the same invoice
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub user_id: String,
    pub user_dob: Option<String>,
    pub zipcode: Option<String>,
    pub gender: Option<String>,
    pub base_center: Option<String>,
    pub service_length: Option<f64>,
    pub massage_name: Option<String>,
    pub center_name: Option<String>,
    /// Enhancement name
    pub item_name: Option<String>,
    /// Enhancement code
    pub item_id: String,
    /// Raw invoice closed date of the enhancement line
    pub timestamp: Option<String>,
}

/// A merged record with derived age and parsed timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub user_id: String,
    pub age: Option<i64>,
    pub zipcode: Option<String>,
    pub gender: Option<String>,
    pub base_center: Option<String>,
    pub service_length: Option<f64>,
    pub massage_name: Option<String>,
    pub center_name: Option<String>,
    pub item_name: Option<String>,
    pub item_id: String,
    pub timestamp: NaiveDateTime,
}

/// Row of `interaction.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct InteractionRow {
    pub user_id: String,
    pub item_id: String,
    /// Unix seconds
    pub timestamp: i64,
    pub service_length: Option<f64>,
    pub massage_name: Option<String>,
    pub center_name: Option<String>,
    pub event_type: String,
}

/// Row of `user.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct UserRow {
    pub user_id: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub zipcode: Option<String>,
    pub base_center: Option<String>,
}

/// Row of `item.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ItemRow {
    pub item_id: String,
    pub item_name: Option<String>,
}

/// The three tables handed to the recommendation service
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub interactions: Vec<InteractionRow>,
    pub users: Vec<UserRow>,
    pub items: Vec<ItemRow>,
}

/// Kind of dataset inside a dataset group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Interactions,
    Users,
    Items,
}

impl DatasetKind {
    /// All kinds in import order
    pub const ALL: [Self; 3] = [Self::Interactions, Self::Users, Self::Items];

    /// Dataset type expected by the remote API
    #[must_use]
    pub const fn dataset_type(self) -> &'static str {
        match self {
            Self::Interactions => "INTERACTIONS",
            Self::Users => "USERS",
            Self::Items => "ITEMS",
        }
    }

    /// Local file name and bucket key of the table
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Interactions => "interaction.csv",
            Self::Users => "user.csv",
            Self::Items => "item.csv",
        }
    }

    /// Fragment used in resource and job names
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Interactions => "interactions",
            Self::Users => "users",
            Self::Items => "items",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dataset_type())
    }
}

/// How an import job treats data already in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportMode {
    /// Replace all existing records
    #[serde(alias = "full")]
    Full,
    /// Append to existing records
    #[serde(alias = "incremental")]
    Incremental,
}

impl ImportMode {
    /// Wire value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Incremental => "INCREMENTAL",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FULL" => Ok(Self::Full),
            "INCREMENTAL" => Ok(Self::Incremental),
            other => Err(format!("unknown import mode: {other}")),
        }
    }
}

/// Name and identifier of a listed remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSummary {
    pub name: String,
    pub arn: String,
}

/// One ranked item returned by the recommendation lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: String,
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}
