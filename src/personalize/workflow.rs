use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{error, info, warn};

use super::lifecycle::{wait_for, PollPolicy, ResourceKind, StatusTargets};
use super::schema::schema_for;
use super::{
    find_by_name, CampaignRequest, DatasetRequest, ImportJobRequest, PersonalizeApi, ResourceNames, SolutionRequest,
};
use crate::error::{RecommenderError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{DatasetKind, ImportMode, ResourceSummary};

/// How the solution is trained
#[derive(Debug, Clone)]
pub struct SolutionOptions {
    pub recipe_arn: String,
    /// Reuse a same-named solution instead of deleting it first
    pub keep_previous_solution: bool,
    pub perform_hpo: bool,
    pub perform_auto_ml: bool,
}

/// How the campaign is provisioned
#[derive(Debug, Clone, Copy)]
pub struct CampaignOptions {
    pub min_provisioned_tps: i32,
    pub enable_metadata_with_recommendations: bool,
}

impl Default for CampaignOptions {
    fn default() -> Self {
        Self {
            min_provisioned_tps: 2,
            enable_metadata_with_recommendations: true,
        }
    }
}

/// Sets up the recommendation service, trains and deploys the model
pub struct Personalization {
    api: Box<dyn PersonalizeApi>,
    role_arn: String,
    poll: PollPolicy,
    metrics: MetricsCollector,
}

impl Personalization {
    pub fn new(api: Box<dyn PersonalizeApi>, role_arn: impl Into<String>, poll: PollPolicy) -> Self {
        Self {
            api,
            role_arn: role_arn.into(),
            poll,
            metrics: MetricsCollector::default(),
        }
    }

    async fn wait(&self, kind: ResourceKind, arn: &str) -> Result<String> {
        wait_for(
            self.api.as_ref(),
            kind,
            arn,
            &StatusTargets::CREATION,
            &self.poll,
            &self.metrics,
        )
        .await
    }

    fn log_failure(&self, operation: &str, err: RecommenderError) -> RecommenderError {
        error!(operation, error = %err, "Remote call failed");
        self.metrics.record_error("api", operation);
        err
    }

    fn reused(&self, kind: ResourceKind, name: &str, arn: &str) {
        info!(resource = %kind, name, arn, "Reusing existing resource");
        self.metrics.record_resource_reused(kind.label());
    }

    /// Create the dataset group, or return the ARN of the one with this name.
    pub async fn create_dataset_group(&self, name: &str) -> Result<String> {
        info!("Creating dataset group {name}...");

        if let Some(arn) = find_by_name(&self.api.list_dataset_groups().await?, name) {
            self.reused(ResourceKind::DatasetGroup, name, &arn);
            return Ok(arn);
        }

        let arn = match self.api.create_dataset_group(name).await {
            Ok(arn) => arn,
            Err(e) if e.is_already_exists() => resolve_existing(e, &self.api.list_dataset_groups().await?, name)?,
            Err(e) => return Err(self.log_failure("CreateDatasetGroup", e)),
        };

        self.wait(ResourceKind::DatasetGroup, &arn).await?;
        Ok(arn)
    }

    async fn ensure_schema(&self, kind: DatasetKind, schema_name: &str) -> Result<String> {
        info!("Creating {} schema {schema_name}...", kind.slug());

        let schema = schema_for(kind).to_string();
        match self.api.create_schema(schema_name, &schema).await {
            Ok(arn) => Ok(arn),
            Err(e) if e.is_already_exists() => {
                warn!(schema_name, "Schema already exists. Using it.");
                resolve_existing(e, &self.api.list_schemas().await?, schema_name)
            }
            Err(e) => Err(self.log_failure("CreateSchema", e)),
        }
    }

    /// Create a dataset of `kind` in the group, with its schema.
    ///
    /// A dataset with the same name in the group is reused as is.
    pub async fn create_dataset(
        &self,
        kind: DatasetKind,
        schema_name: &str,
        dataset_group_arn: &str,
        name: &str,
    ) -> Result<String> {
        if let Some(arn) = find_by_name(&self.api.list_datasets(dataset_group_arn).await?, name) {
            self.reused(ResourceKind::Dataset, name, &arn);
            return Ok(arn);
        }

        let schema_arn = self.ensure_schema(kind, schema_name).await?;

        info!("Creating {} dataset {name}...", kind.slug());
        let request = DatasetRequest {
            kind,
            dataset_group_arn: dataset_group_arn.to_string(),
            schema_arn,
            name: name.to_string(),
        };
        let arn = match self.api.create_dataset(&request).await {
            Ok(arn) => arn,
            Err(e) if e.is_already_exists() => {
                resolve_existing(e, &self.api.list_datasets(dataset_group_arn).await?, name)?
            }
            Err(e) => return Err(self.log_failure("CreateDataset", e)),
        };

        self.wait(ResourceKind::Dataset, &arn).await?;
        Ok(arn)
    }

    /// Import a CSV from the bucket into a dataset and wait for the job.
    pub async fn import_dataset(
        &self,
        kind: DatasetKind,
        dataset_arn: &str,
        data_location: &str,
        import_mode: ImportMode,
    ) -> Result<String> {
        info!("Importing {} data to {dataset_arn}...", kind.slug());

        let request = ImportJobRequest {
            job_name: ResourceNames::import_job(kind, Utc::now().timestamp()),
            dataset_arn: dataset_arn.to_string(),
            data_location: data_location.to_string(),
            role_arn: self.role_arn.clone(),
            import_mode,
        };
        let arn = self
            .api
            .create_dataset_import_job(&request)
            .await
            .map_err(|e| self.log_failure("CreateDatasetImportJob", e))?;

        self.wait(ResourceKind::DatasetImportJob, &arn).await?;
        Ok(arn)
    }

    /// Create (or reuse) the solution and train a new solution version.
    ///
    /// Returns the solution version ARN.
    pub async fn create_solution(
        &self,
        name: &str,
        dataset_group_arn: &str,
        options: &SolutionOptions,
    ) -> Result<String> {
        info!("List recipes...");
        for recipe in self.api.list_recipes().await? {
            info!("Recipe: {recipe}");
        }

        info!("Creating solution {name}...");
        let existing = find_by_name(&self.api.list_solutions(dataset_group_arn).await?, name);
        let solution_arn = match existing {
            Some(arn) if options.keep_previous_solution => {
                self.reused(ResourceKind::Solution, name, &arn);
                Some(arn)
            }
            Some(arn) => {
                self.delete_solution(&arn).await?;
                None
            }
            None => None,
        };

        let solution_arn = match solution_arn {
            Some(arn) => arn,
            None => {
                let request = SolutionRequest {
                    name: name.to_string(),
                    dataset_group_arn: dataset_group_arn.to_string(),
                    recipe_arn: options.recipe_arn.clone(),
                    perform_hpo: options.perform_hpo,
                    perform_auto_ml: options.perform_auto_ml,
                };
                let arn = match self.api.create_solution(&request).await {
                    Ok(arn) => arn,
                    Err(e) if e.is_already_exists() => {
                        resolve_existing(e, &self.api.list_solutions(dataset_group_arn).await?, name)?
                    }
                    Err(e) => return Err(self.log_failure("CreateSolution", e)),
                };
                info!("Created solution {arn}");
                self.wait(ResourceKind::Solution, &arn).await?;
                arn
            }
        };

        let version_arn = self
            .api
            .create_solution_version(&solution_arn)
            .await
            .map_err(|e| self.log_failure("CreateSolutionVersion", e))?;

        self.wait(ResourceKind::SolutionVersion, &version_arn).await?;
        Ok(version_arn)
    }

    async fn delete_solution(&self, solution_arn: &str) -> Result<()> {
        self.api
            .delete_solution(solution_arn)
            .await
            .map_err(|e| self.log_failure("DeleteSolution", e))?;

        wait_for(
            self.api.as_ref(),
            ResourceKind::Solution,
            solution_arn,
            &StatusTargets::DELETION,
            &self.poll,
            &self.metrics,
        )
        .await?;
        info!("Deleted solution {solution_arn}");
        Ok(())
    }

    /// Offline ranking metrics of a trained solution version.
    pub async fn get_solution_metrics(&self, solution_version_arn: &str) -> Result<BTreeMap<String, f64>> {
        self.api.get_solution_metrics(solution_version_arn).await
    }

    /// Deploy a solution version behind the named campaign.
    ///
    /// An existing campaign with the same name is updated to the new version.
    pub async fn create_campaign(
        &self,
        name: &str,
        solution_version_arn: &str,
        options: CampaignOptions,
    ) -> Result<String> {
        info!("Creating campaign {name}...");

        let request = CampaignRequest {
            name: name.to_string(),
            solution_version_arn: solution_version_arn.to_string(),
            min_provisioned_tps: options.min_provisioned_tps,
            enable_metadata_with_recommendations: options.enable_metadata_with_recommendations,
        };

        if let Some(existing) = find_by_name(&self.api.list_campaigns().await?, name) {
            let arn = self
                .api
                .update_campaign(&existing, &request)
                .await
                .map_err(|e| self.log_failure("UpdateCampaign", e))?;
            info!("Updated campaign {arn}");
            self.wait(ResourceKind::Campaign, &arn).await?;
            return Ok(arn);
        }

        let arn = self
            .api
            .create_campaign(&request)
            .await
            .map_err(|e| self.log_failure("CreateCampaign", e))?;

        self.wait(ResourceKind::Campaign, &arn).await?;
        Ok(arn)
    }
}

/// After a conflict, the ARN of the resource that holds the name.
fn resolve_existing(conflict: RecommenderError, listed: &[ResourceSummary], name: &str) -> Result<String> {
    find_by_name(listed, name).ok_or(conflict)
}

