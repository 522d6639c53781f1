use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use enhancement_recommender::config::AppConfig;
use enhancement_recommender::connection::load_sdk_config;
use enhancement_recommender::dataset_builder::DatasetBuilder;
use enhancement_recommender::file_writer::write_datasets;
use enhancement_recommender::identity::{resolve_role_arn, AwsIam};
use enhancement_recommender::inference::{AwsRecommender, Inference, RecommendationRequest};
use enhancement_recommender::logging::init_logging;
use enhancement_recommender::models::{DatasetKind, ImportMode};
use enhancement_recommender::personalize::aws::AwsPersonalize;
use enhancement_recommender::personalize::Personalization;
use enhancement_recommender::pipeline::{process_extract, TrainPipeline};
use enhancement_recommender::storage::S3ObjectStore;
use enhancement_recommender::validation::InputValidator;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reshape a point-of-sale export into the three dataset files
    Prepare {
        /// Point-of-sale CSV export
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to storage.data_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Upload prepared dataset files to the bucket
    Upload {
        /// Directory holding interaction.csv, user.csv and item.csv
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Import uploaded datasets, train and deploy the campaign
    Train {
        /// FULL or INCREMENTAL (defaults to personalize.import_mode)
        #[arg(short = 'm', long)]
        import_mode: Option<ImportMode>,
    },
    /// Prepare, upload and train in one go
    Run {
        /// Point-of-sale CSV export
        #[arg(short, long)]
        input: PathBuf,

        /// FULL or INCREMENTAL (defaults to personalize.import_mode)
        #[arg(short = 'm', long)]
        import_mode: Option<ImportMode>,
    },
    /// Ask a campaign for enhancement recommendations
    Recommend {
        /// Campaign ARN
        #[arg(short, long)]
        campaign_arn: String,

        /// Guest user id
        #[arg(short, long)]
        user_id: String,

        /// Contextual feature as KEY=VALUE, repeatable
        #[arg(short = 'x', long = "context")]
        context: Vec<String>,

        /// Number of results (defaults to inference.num_results)
        #[arg(short, long)]
        num_results: Option<i32>,

        /// Do not ask for item names
        #[arg(long)]
        no_metadata: bool,
    },
    /// Print offline metrics of a solution version
    Metrics {
        /// Solution version ARN
        #[arg(short, long)]
        solution_version_arn: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    let _guard = init_logging(
        Some(&config.get_log_level()),
        &config.logging.format,
        config.logging.file_path.as_deref().map(Path::new),
    )?;

    info!(env = %config.deploy.env, "Starting enhancement-recommender");

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Prepare { input, output_dir } => prepare(&config, &input, output_dir)?,
        Commands::Upload { dir } => upload(&config, dir).await?,
        Commands::Train { import_mode } => {
            config.require_import_role()?;
            let pipeline = build_pipeline(&config, true).await?;
            let campaign_arn = pipeline
                .train(import_mode.unwrap_or(config.personalize.import_mode))
                .await?;
            print_json(&serde_json::json!({ "campaign_arn": campaign_arn }))?;
        }
        Commands::Run { input, import_mode } => {
            InputValidator::validate_input_file(&input)?;
            config.require_import_role()?;
            let pipeline = build_pipeline(&config, true).await?;
            let campaign_arn = pipeline
                .run(&input, import_mode.unwrap_or(config.personalize.import_mode))
                .await?;
            print_json(&serde_json::json!({ "campaign_arn": campaign_arn }))?;
        }
        Commands::Recommend {
            campaign_arn,
            user_id,
            context,
            num_results,
            no_metadata,
        } => recommend(&config, campaign_arn, user_id, &context, num_results, no_metadata).await?,
        Commands::Metrics { solution_version_arn } => {
            let sdk_config = load_sdk_config(&config.aws).await;
            let personalization = Personalization::new(
                Box::new(AwsPersonalize::new(&sdk_config)),
                config.personalize.role_arn.clone(),
                config.poll_policy(),
            );
            let metrics = personalization.get_solution_metrics(&solution_version_arn).await?;
            print_json(&metrics)?;
        }
    }

    Ok(())
}

/// Build the dataset files locally without touching any remote service
fn prepare(config: &AppConfig, input: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    InputValidator::validate_input_file(input)?;
    let output_dir = output_dir.unwrap_or_else(|| config.data_dir());

    let processed = process_extract(input, config.data.days_in_year)?;
    let datasets = DatasetBuilder::new(&processed).build_all();

    let files = write_datasets(&datasets, &output_dir)
        .with_context(|| format!("Failed to write datasets to {}", output_dir.display()))?;
    let summary: BTreeMap<&str, String> = files
        .iter()
        .map(|(kind, path)| (kind.slug(), path.display().to_string()))
        .collect();
    print_json(&summary)
}

async fn upload(config: &AppConfig, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| config.data_dir());
    let mut files = Vec::with_capacity(DatasetKind::ALL.len());
    for kind in DatasetKind::ALL {
        let path = dir.join(kind.file_name());
        InputValidator::validate_input_file(&path)?;
        files.push((kind, path));
    }

    let pipeline = build_pipeline(config, false).await?;
    let locations = pipeline.upload_files(&files).await?;
    print_json(&locations)
}

async fn recommend(
    config: &AppConfig,
    campaign_arn: String,
    user_id: String,
    context: &[String],
    num_results: Option<i32>,
    no_metadata: bool,
) -> Result<()> {
    InputValidator::validate_user_id(&user_id)?;
    let context = context
        .iter()
        .map(|entry| InputValidator::parse_context_entry(entry))
        .collect::<Result<BTreeMap<_, _>>>()?;
    InputValidator::validate_context(&context)?;
    let num_results = num_results.unwrap_or(config.inference.num_results);
    InputValidator::validate_num_results(num_results)?;

    let sdk_config = load_sdk_config(&config.aws).await;
    let inference = Inference::new(Box::new(AwsRecommender::new(&sdk_config)));
    let request = RecommendationRequest {
        campaign_arn,
        user_id,
        context,
        num_results,
        return_item_metadata: config.inference.return_item_metadata && !no_metadata,
    };
    let items = inference.get_recommendations(&request).await?;
    print_json(&items)
}

/// Wire the AWS clients. With `resolve_role` the import role is looked up,
/// or created when only its name is configured.
async fn build_pipeline(config: &AppConfig, resolve_role: bool) -> Result<TrainPipeline> {
    let sdk_config = load_sdk_config(&config.aws).await;
    let role_arn = if resolve_role {
        resolve_role_arn(
            &AwsIam::new(&sdk_config),
            &config.personalize.role_arn,
            config.personalize.role_name.as_deref(),
            config.role_settle(),
        )
        .await?
    } else {
        config.personalize.role_arn.clone()
    };

    let personalization = Personalization::new(
        Box::new(AwsPersonalize::new(&sdk_config)),
        role_arn,
        config.poll_policy(),
    );
    Ok(TrainPipeline::new(
        config.clone(),
        Box::new(S3ObjectStore::new(&sdk_config)),
        personalization,
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
