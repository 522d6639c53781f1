//! Remote training and deployment workflow.
//!
//! The [`PersonalizeApi`] trait is the seam to the managed recommendation
//! service. [`Personalization`] drives dataset group, schema, dataset, import
//! job, solution, solution version and campaign creation on top of it, reusing
//! resources that already exist under the same name and polling each one
//! until it settles.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{DatasetKind, ImportMode, ResourceSummary};

pub mod aws;
pub mod lifecycle;
pub mod schema;
pub mod workflow;

pub use lifecycle::{PollPolicy, ResourceKind, StatusTargets};
pub use workflow::Personalization;

/// Recipe used when none is configured
pub const DEFAULT_RECIPE_ARN: &str = "arn:aws:personalize:::recipe/aws-user-personalization";

/// Parameters of a dataset creation
#[derive(Debug, Clone)]
pub struct DatasetRequest {
    pub kind: DatasetKind,
    pub dataset_group_arn: String,
    pub schema_arn: String,
    pub name: String,
}

/// Parameters of a dataset import job
#[derive(Debug, Clone)]
pub struct ImportJobRequest {
    pub job_name: String,
    pub dataset_arn: String,
    /// `s3://bucket/key` of the CSV file
    pub data_location: String,
    pub role_arn: String,
    pub import_mode: ImportMode,
}

/// Parameters of a solution creation
#[derive(Debug, Clone)]
pub struct SolutionRequest {
    pub name: String,
    pub dataset_group_arn: String,
    pub recipe_arn: String,
    pub perform_hpo: bool,
    pub perform_auto_ml: bool,
}

/// Parameters of a campaign creation or update
#[derive(Debug, Clone)]
pub struct CampaignRequest {
    pub name: String,
    pub solution_version_arn: String,
    pub min_provisioned_tps: i32,
    pub enable_metadata_with_recommendations: bool,
}

/// Control plane of the recommendation service.
///
/// `describe_*` calls return the raw status string of the resource.
#[async_trait]
pub trait PersonalizeApi: Send + Sync {
    async fn list_dataset_groups(&self) -> Result<Vec<ResourceSummary>>;
    async fn create_dataset_group(&self, name: &str) -> Result<String>;
    async fn describe_dataset_group(&self, arn: &str) -> Result<String>;

    async fn list_schemas(&self) -> Result<Vec<ResourceSummary>>;
    async fn create_schema(&self, name: &str, schema: &str) -> Result<String>;

    async fn list_datasets(&self, dataset_group_arn: &str) -> Result<Vec<ResourceSummary>>;
    async fn create_dataset(&self, request: &DatasetRequest) -> Result<String>;
    async fn describe_dataset(&self, arn: &str) -> Result<String>;

    async fn create_dataset_import_job(&self, request: &ImportJobRequest) -> Result<String>;
    async fn describe_dataset_import_job(&self, arn: &str) -> Result<String>;

    /// Recipe ARNs available to the account
    async fn list_recipes(&self) -> Result<Vec<String>>;
    async fn list_solutions(&self, dataset_group_arn: &str) -> Result<Vec<ResourceSummary>>;
    async fn create_solution(&self, request: &SolutionRequest) -> Result<String>;
    async fn describe_solution(&self, arn: &str) -> Result<String>;
    async fn delete_solution(&self, arn: &str) -> Result<()>;

    async fn create_solution_version(&self, solution_arn: &str) -> Result<String>;
    async fn describe_solution_version(&self, arn: &str) -> Result<String>;
    async fn get_solution_metrics(&self, solution_version_arn: &str) -> Result<BTreeMap<String, f64>>;

    async fn list_campaigns(&self) -> Result<Vec<ResourceSummary>>;
    async fn create_campaign(&self, request: &CampaignRequest) -> Result<String>;
    async fn update_campaign(&self, campaign_arn: &str, request: &CampaignRequest) -> Result<String>;
    async fn describe_campaign(&self, arn: &str) -> Result<String>;
}

/// Names of every remote resource for one deployment prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    prefix: String,
}

impl ResourceNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    #[must_use]
    pub fn dataset_group(&self) -> String {
        format!("{}-massage-dataset-group", self.prefix)
    }

    #[must_use]
    pub fn schema(&self, kind: DatasetKind) -> String {
        format!("{}-massage-{}-schema", self.prefix, kind.slug())
    }

    #[must_use]
    pub fn dataset(&self, kind: DatasetKind) -> String {
        format!("{}-massage-{}", self.prefix, kind.slug())
    }

    #[must_use]
    pub fn solution(&self) -> String {
        format!("{}-massage-solution", self.prefix)
    }

    #[must_use]
    pub fn campaign(&self) -> String {
        format!("{}-massage-campaign", self.prefix)
    }

    /// Import job names must be unique, so they carry the submission time.
    #[must_use]
    pub fn import_job(kind: DatasetKind, unix_seconds: i64) -> String {
        format!("massage-{}-import-{unix_seconds}", kind.slug())
    }
}

/// ARN of the resource with the given name, if listed.
#[must_use]
pub fn find_by_name(resources: &[ResourceSummary], name: &str) -> Option<String> {
    resources.iter().find(|r| r.name == name).map(|r| r.arn.clone())
}
