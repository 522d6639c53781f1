//! [`PersonalizeApi`] backed by the AWS SDK.

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_sdk_personalize::types::{CampaignConfig, DataSource, ImportMode as SdkImportMode};
use aws_sdk_personalize::Client;

use super::{CampaignRequest, DatasetRequest, ImportJobRequest, PersonalizeApi, SolutionRequest};
use crate::error::{sdk_error, RecommenderError, Result};
use crate::models::ResourceSummary;

const PAGE_SIZE: i32 = 100;

fn summary(name: Option<&str>, arn: Option<&str>) -> Option<ResourceSummary> {
    Some(ResourceSummary {
        name: name?.to_string(),
        arn: arn?.to_string(),
    })
}

fn required(operation: &str, field: &str, value: Option<&str>) -> Result<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| RecommenderError::missing(operation, field))
}

/// Personalize control plane client
#[derive(Debug, Clone)]
pub struct AwsPersonalize {
    client: Client,
}

impl AwsPersonalize {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }

    fn campaign_config(request: &CampaignRequest) -> CampaignConfig {
        CampaignConfig::builder()
            .enable_metadata_with_recommendations(request.enable_metadata_with_recommendations)
            .build()
    }
}

#[async_trait]
impl PersonalizeApi for AwsPersonalize {
    async fn list_dataset_groups(&self) -> Result<Vec<ResourceSummary>> {
        let mut found = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_dataset_groups()
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListDatasetGroups", &e))?;
            found.extend(
                output
                    .dataset_groups()
                    .iter()
                    .filter_map(|g| summary(g.name(), g.dataset_group_arn())),
            );
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(found)
    }

    async fn create_dataset_group(&self, name: &str) -> Result<String> {
        let output = self
            .client
            .create_dataset_group()
            .name(name)
            .send()
            .await
            .map_err(|e| sdk_error("CreateDatasetGroup", &e))?;
        required("CreateDatasetGroup", "datasetGroupArn", output.dataset_group_arn())
    }

    async fn describe_dataset_group(&self, arn: &str) -> Result<String> {
        let output = self
            .client
            .describe_dataset_group()
            .dataset_group_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeDatasetGroup", &e))?;
        required(
            "DescribeDatasetGroup",
            "datasetGroup.status",
            output.dataset_group().and_then(|g| g.status()),
        )
    }

    async fn list_schemas(&self) -> Result<Vec<ResourceSummary>> {
        let mut found = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_schemas()
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListSchemas", &e))?;
            found.extend(
                output
                    .schemas()
                    .iter()
                    .filter_map(|s| summary(s.name(), s.schema_arn())),
            );
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(found)
    }

    async fn create_schema(&self, name: &str, schema: &str) -> Result<String> {
        let output = self
            .client
            .create_schema()
            .name(name)
            .schema(schema)
            .send()
            .await
            .map_err(|e| sdk_error("CreateSchema", &e))?;
        required("CreateSchema", "schemaArn", output.schema_arn())
    }

    async fn list_datasets(&self, dataset_group_arn: &str) -> Result<Vec<ResourceSummary>> {
        let mut found = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_datasets()
                .dataset_group_arn(dataset_group_arn)
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListDatasets", &e))?;
            found.extend(
                output
                    .datasets()
                    .iter()
                    .filter_map(|d| summary(d.name(), d.dataset_arn())),
            );
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(found)
    }

    async fn create_dataset(&self, request: &DatasetRequest) -> Result<String> {
        let output = self
            .client
            .create_dataset()
            .dataset_type(request.kind.dataset_type())
            .dataset_group_arn(&request.dataset_group_arn)
            .schema_arn(&request.schema_arn)
            .name(&request.name)
            .send()
            .await
            .map_err(|e| sdk_error("CreateDataset", &e))?;
        required("CreateDataset", "datasetArn", output.dataset_arn())
    }

    async fn describe_dataset(&self, arn: &str) -> Result<String> {
        let output = self
            .client
            .describe_dataset()
            .dataset_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeDataset", &e))?;
        required(
            "DescribeDataset",
            "dataset.status",
            output.dataset().and_then(|d| d.status()),
        )
    }

    async fn create_dataset_import_job(&self, request: &ImportJobRequest) -> Result<String> {
        let output = self
            .client
            .create_dataset_import_job()
            .job_name(&request.job_name)
            .dataset_arn(&request.dataset_arn)
            .data_source(
                DataSource::builder()
                    .data_location(&request.data_location)
                    .build(),
            )
            .role_arn(&request.role_arn)
            .import_mode(SdkImportMode::from(request.import_mode.as_str()))
            .send()
            .await
            .map_err(|e| sdk_error("CreateDatasetImportJob", &e))?;
        required(
            "CreateDatasetImportJob",
            "datasetImportJobArn",
            output.dataset_import_job_arn(),
        )
    }

    async fn describe_dataset_import_job(&self, arn: &str) -> Result<String> {
        let output = self
            .client
            .describe_dataset_import_job()
            .dataset_import_job_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeDatasetImportJob", &e))?;
        required(
            "DescribeDatasetImportJob",
            "datasetImportJob.status",
            output.dataset_import_job().and_then(|j| j.status()),
        )
    }

    async fn list_recipes(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_recipes()
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListRecipes", &e))?;
            found.extend(
                output
                    .recipes()
                    .iter()
                    .filter_map(|r| r.recipe_arn().map(str::to_string)),
            );
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(found)
    }

    async fn list_solutions(&self, dataset_group_arn: &str) -> Result<Vec<ResourceSummary>> {
        let mut found = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_solutions()
                .dataset_group_arn(dataset_group_arn)
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListSolutions", &e))?;
            found.extend(
                output
                    .solutions()
                    .iter()
                    .filter_map(|s| summary(s.name(), s.solution_arn())),
            );
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(found)
    }

    async fn create_solution(&self, request: &SolutionRequest) -> Result<String> {
        let output = self
            .client
            .create_solution()
            .name(&request.name)
            .dataset_group_arn(&request.dataset_group_arn)
            .recipe_arn(&request.recipe_arn)
            .perform_hpo(request.perform_hpo)
            .perform_auto_ml(request.perform_auto_ml)
            .send()
            .await
            .map_err(|e| sdk_error("CreateSolution", &e))?;
        required("CreateSolution", "solutionArn", output.solution_arn())
    }

    async fn describe_solution(&self, arn: &str) -> Result<String> {
        let output = self
            .client
            .describe_solution()
            .solution_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeSolution", &e))?;
        required(
            "DescribeSolution",
            "solution.status",
            output.solution().and_then(|s| s.status()),
        )
    }

    async fn delete_solution(&self, arn: &str) -> Result<()> {
        self.client
            .delete_solution()
            .solution_arn(arn)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error("DeleteSolution", &e))
    }

    async fn create_solution_version(&self, solution_arn: &str) -> Result<String> {
        let output = self
            .client
            .create_solution_version()
            .solution_arn(solution_arn)
            .send()
            .await
            .map_err(|e| sdk_error("CreateSolutionVersion", &e))?;
        required(
            "CreateSolutionVersion",
            "solutionVersionArn",
            output.solution_version_arn(),
        )
    }

    async fn describe_solution_version(&self, arn: &str) -> Result<String> {
        let output = self
            .client
            .describe_solution_version()
            .solution_version_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeSolutionVersion", &e))?;
        required(
            "DescribeSolutionVersion",
            "solutionVersion.status",
            output.solution_version().and_then(|v| v.status()),
        )
    }

    async fn get_solution_metrics(&self, solution_version_arn: &str) -> Result<BTreeMap<String, f64>> {
        let output = self
            .client
            .get_solution_metrics()
            .solution_version_arn(solution_version_arn)
            .send()
            .await
            .map_err(|e| sdk_error("GetSolutionMetrics", &e))?;
        Ok(output
            .metrics()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default())
    }

    async fn list_campaigns(&self) -> Result<Vec<ResourceSummary>> {
        let mut found = Vec::new();
        let mut next_token = None;
        loop {
            let output = self
                .client
                .list_campaigns()
                .max_results(PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| sdk_error("ListCampaigns", &e))?;
            found.extend(
                output
                    .campaigns()
                    .iter()
                    .filter_map(|c| summary(c.name(), c.campaign_arn())),
            );
            match output.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }
        Ok(found)
    }

    async fn create_campaign(&self, request: &CampaignRequest) -> Result<String> {
        let output = self
            .client
            .create_campaign()
            .name(&request.name)
            .solution_version_arn(&request.solution_version_arn)
            .min_provisioned_tps(request.min_provisioned_tps)
            .campaign_config(Self::campaign_config(request))
            .send()
            .await
            .map_err(|e| sdk_error("CreateCampaign", &e))?;
        required("CreateCampaign", "campaignArn", output.campaign_arn())
    }

    async fn update_campaign(&self, campaign_arn: &str, request: &CampaignRequest) -> Result<String> {
        let output = self
            .client
            .update_campaign()
            .campaign_arn(campaign_arn)
            .solution_version_arn(&request.solution_version_arn)
            .min_provisioned_tps(request.min_provisioned_tps)
            .campaign_config(Self::campaign_config(request))
            .send()
            .await
            .map_err(|e| sdk_error("UpdateCampaign", &e))?;
        required("UpdateCampaign", "campaignArn", output.campaign_arn())
    }

    async fn describe_campaign(&self, arn: &str) -> Result<String> {
        let output = self
            .client
            .describe_campaign()
            .campaign_arn(arn)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeCampaign", &e))?;
        // An update leaves campaign.status at ACTIVE and reports its own progress
        let campaign = output.campaign();
        let update_status = campaign
            .and_then(|c| c.latest_campaign_update())
            .and_then(|u| u.status());
        required(
            "DescribeCampaign",
            "campaign.status",
            update_status.or_else(|| campaign.and_then(|c| c.status())),
        )
    }
}
