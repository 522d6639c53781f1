//! End-to-end training pipeline
//!
//! Reads the point-of-sale extract, reshapes it into the three datasets,
//! publishes them to the bucket, then drives the remote workflow up to a
//! deployed campaign. Every stage is awaited in order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::data_loader::DataLoader;
use crate::dataset_builder::DatasetBuilder;
use crate::error::{RecommenderError, Result};
use crate::file_writer::write_datasets;
use crate::logging::OperationTimer;
use crate::models::{DatasetKind, Datasets, ImportMode, ProcessedRecord};
use crate::personalize::Personalization;
use crate::storage::{allow_personalize_access, ensure_bucket, s3_uri, upload_file, ObjectStore};

/// Uploaded dataset locations keyed by kind
pub type DataLocations = BTreeMap<&'static str, String>;

/// Read the extract at `input` and produce the processed rows, aging guests
/// relative to now.
///
/// An extract without massage/enhancement pairs yields no rows; the tables
/// written from it carry only their headers.
pub fn process_extract(input: &Path, days_in_year: f64) -> Result<Vec<ProcessedRecord>> {
    let timer = OperationTimer::new("process_data");
    let processed = DataLoader::new(input).load_processed(Local::now().naive_local(), days_in_year)?;
    timer.finish();

    if processed.is_empty() {
        warn!(input = %input.display(), "No massage/enhancement pairs found");
    }
    Ok(processed)
}

pub struct TrainPipeline {
    config: AppConfig,
    store: Box<dyn ObjectStore>,
    personalization: Personalization,
}

impl TrainPipeline {
    pub fn new(config: AppConfig, store: Box<dyn ObjectStore>, personalization: Personalization) -> Self {
        Self {
            config,
            store,
            personalization,
        }
    }

    /// Load the extract and turn it into one processed row per
    /// massage/enhancement pair.
    pub fn process_data(&self, input: &Path) -> Result<Vec<ProcessedRecord>> {
        process_extract(input, self.config.data.days_in_year)
    }

    pub fn build_datasets(&self, processed: &[ProcessedRecord]) -> Datasets {
        DatasetBuilder::new(processed).build_all()
    }

    /// Write the tables to the data directory and upload them under their
    /// fixed keys.
    pub async fn write_and_upload(&self, datasets: &Datasets) -> Result<DataLocations> {
        let timer = OperationTimer::new("write_and_upload");
        let files = write_datasets(datasets, &self.config.data_dir())?;
        let locations = self.upload_files(&files).await?;
        timer.finish();
        Ok(locations)
    }

    /// Upload already written dataset files.
    pub async fn upload_files(&self, files: &[(DatasetKind, PathBuf)]) -> Result<DataLocations> {
        let bucket = &self.config.storage.bucket;
        if self.config.storage.create_bucket {
            ensure_bucket(self.store.as_ref(), bucket).await?;
        }
        if self.config.storage.grant_bucket_access {
            allow_personalize_access(self.store.as_ref(), bucket).await?;
        }

        let mut locations = DataLocations::new();
        for (kind, path) in files {
            let uri = upload_file(self.store.as_ref(), path, bucket, kind.file_name()).await?;
            locations.insert(kind.slug(), uri);
        }
        Ok(locations)
    }

    /// Create or reuse every remote resource, import the uploaded datasets,
    /// train and deploy. Returns the campaign ARN.
    pub async fn train(&self, import_mode: ImportMode) -> Result<String> {
        let timer = OperationTimer::new("train");
        let names = self.config.resource_names();
        let bucket = &self.config.storage.bucket;

        let group_arn = self.personalization.create_dataset_group(&names.dataset_group()).await?;

        let mut dataset_arns = Vec::with_capacity(DatasetKind::ALL.len());
        for kind in DatasetKind::ALL {
            let arn = self
                .personalization
                .create_dataset(kind, &names.schema(kind), &group_arn, &names.dataset(kind))
                .await?;
            dataset_arns.push((kind, arn));
        }

        for (kind, dataset_arn) in &dataset_arns {
            self.personalization
                .import_dataset(*kind, dataset_arn, &s3_uri(bucket, kind.file_name()), import_mode)
                .await?;
        }

        let version_arn = self
            .personalization
            .create_solution(&names.solution(), &group_arn, &self.config.solution_options())
            .await?;

        let metrics = self.personalization.get_solution_metrics(&version_arn).await?;
        for (name, value) in &metrics {
            info!(metric = %name, value, "Solution metric");
        }

        let campaign_arn = self
            .personalization
            .create_campaign(&names.campaign(), &version_arn, self.config.campaign_options())
            .await?;
        info!(campaign_arn = %campaign_arn, "Campaign ready");
        timer.finish();
        Ok(campaign_arn)
    }

    /// Prepare, publish and train in one go.
    ///
    /// Fails before uploading when the extract has no massage/enhancement
    /// pairs.
    pub async fn run(&self, input: &Path, import_mode: ImportMode) -> Result<String> {
        let processed = self.process_data(input)?;
        if processed.is_empty() {
            return Err(RecommenderError::Validation(format!(
                "no massage/enhancement pairs found in {}",
                input.display()
            )));
        }
        let datasets = self.build_datasets(&processed);
        self.write_and_upload(&datasets).await?;
        self.train(import_mode).await
    }
}
