use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::ImportMode;
use crate::personalize::workflow::{CampaignOptions, SolutionOptions};
use crate::personalize::{PollPolicy, ResourceNames, DEFAULT_RECIPE_ARN};
use crate::validation::InputValidator;

/// Environment variable that selects the deployment prefix
pub const DEPLOY_ENV_VAR: &str = "DEPLOY_ENV";

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub deploy: DeployConfig,
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub personalize: PersonalizeConfig,
    pub data: DataConfig,
    pub inference: InferenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Prefix of every remote resource name, e.g. "staging" or "prod"
    pub env: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    /// Named profile from the shared credentials file
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    /// Local directory the dataset files are written to
    pub data_dir: String,
    /// Grant the recommendation service read access before uploading
    pub grant_bucket_access: bool,
    /// Create the bucket in the configured region when it does not exist
    pub create_bucket: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizeConfig {
    pub role_arn: String,
    /// IAM role to look up or create when `role_arn` is empty
    pub role_name: Option<String>,
    /// Pause after creating the role so IAM can propagate it
    pub role_settle_secs: u64,
    pub recipe_arn: String,
    pub perform_hpo: bool,
    pub perform_auto_ml: bool,
    pub keep_previous_solution: bool,
    pub min_provisioned_tps: i32,
    pub import_mode: ImportMode,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub days_in_year: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub num_results: i32,
    pub return_item_metadata: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            deploy: DeployConfig {
                env: "staging".to_string(),
            },
            aws: AwsConfig::default(),
            storage: StorageConfig {
                bucket: "staging-massage-personalize-datasets".to_string(),
                data_dir: "data".to_string(),
                grant_bucket_access: true,
                create_bucket: true,
            },
            personalize: PersonalizeConfig {
                role_arn: String::new(),
                role_name: None,
                role_settle_secs: 10,
                recipe_arn: DEFAULT_RECIPE_ARN.to_string(),
                perform_hpo: false,
                perform_auto_ml: false,
                keep_previous_solution: true,
                min_provisioned_tps: 2,
                import_mode: ImportMode::Full,
                poll_interval_secs: 60,
                poll_timeout_secs: 3 * 60 * 60,
            },
            data: DataConfig { days_in_year: 365.25 },
            inference: InferenceConfig {
                num_results: 5,
                return_item_metadata: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// defaults < `config/default` < `config/<env>` < `config/local` <
    /// `RECOMMENDER__*` variables < `DEPLOY_ENV`
    pub fn load() -> Result<Self> {
        let env = std::env::var(DEPLOY_ENV_VAR)
            .map(|e| e.to_lowercase())
            .unwrap_or_else(|_| AppConfig::default().deploy.env);

        let mut builder = Config::builder()
            // Start with default values
            .add_source(
                Config::try_from(&AppConfig::default())
                    .map_err(|e| anyhow::anyhow!("Failed to build default configuration: {}", e))?,
            )
            // Add config files if they exist
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("RECOMMENDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var(DEPLOY_ENV_VAR).is_ok() {
            builder = builder
                .set_override("deploy.env", env)
                .map_err(|e| anyhow::anyhow!("Failed to apply {}: {}", DEPLOY_ENV_VAR, e))?;
        }

        let app_config: AppConfig = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        InputValidator::validate_deploy_env(&self.deploy.env)?;
        InputValidator::validate_bucket_name(&self.storage.bucket)?;

        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("data_dir cannot be empty"));
        }

        // Validate personalize config
        if !self.personalize.role_arn.is_empty() && !self.personalize.role_arn.starts_with("arn:") {
            return Err(anyhow::anyhow!(
                "role_arn must be an ARN, got: {}",
                self.personalize.role_arn
            ));
        }
        if let Some(name) = &self.personalize.role_name {
            InputValidator::validate_role_name(name)?;
        }
        if !self.personalize.recipe_arn.starts_with("arn:") {
            return Err(anyhow::anyhow!(
                "recipe_arn must be an ARN, got: {}",
                self.personalize.recipe_arn
            ));
        }
        if self.personalize.min_provisioned_tps < 1 {
            return Err(anyhow::anyhow!("min_provisioned_tps must be at least 1"));
        }
        if self.personalize.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("poll_interval_secs must be greater than 0"));
        }
        if self.personalize.poll_timeout_secs < self.personalize.poll_interval_secs {
            return Err(anyhow::anyhow!(
                "poll_timeout_secs must be at least poll_interval_secs"
            ));
        }

        // Validate data config
        if self.data.days_in_year <= 0.0 {
            return Err(anyhow::anyhow!("days_in_year must be greater than 0"));
        }

        InputValidator::validate_num_results(self.inference.num_results)?;

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        Ok(())
    }

    /// Training needs either a role ARN or a role name to provision
    pub fn require_import_role(&self) -> Result<()> {
        if self.personalize.role_arn.is_empty() && self.personalize.role_name.is_none() {
            return Err(anyhow::anyhow!(
                "neither personalize.role_arn nor personalize.role_name is set \
                 (RECOMMENDER__PERSONALIZE__ROLE_ARN / RECOMMENDER__PERSONALIZE__ROLE_NAME)"
            ));
        }
        Ok(())
    }

    pub fn role_settle(&self) -> Duration {
        Duration::from_secs(self.personalize.role_settle_secs)
    }

    /// Names of the remote resources for the configured deployment
    pub fn resource_names(&self) -> ResourceNames {
        ResourceNames::new(self.deploy.env.clone())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.personalize.poll_interval_secs),
            timeout: Duration::from_secs(self.personalize.poll_timeout_secs),
        }
    }

    pub fn solution_options(&self) -> SolutionOptions {
        SolutionOptions {
            recipe_arn: self.personalize.recipe_arn.clone(),
            keep_previous_solution: self.personalize.keep_previous_solution,
            perform_hpo: self.personalize.perform_hpo,
            perform_auto_ml: self.personalize.perform_auto_ml,
        }
    }

    pub fn campaign_options(&self) -> CampaignOptions {
        CampaignOptions {
            min_provisioned_tps: self.personalize.min_provisioned_tps,
            enable_metadata_with_recommendations: true,
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}
