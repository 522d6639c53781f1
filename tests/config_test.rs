//! Comprehensive unit tests for config.rs module

use std::time::Duration;

use enhancement_recommender::config::AppConfig;
use enhancement_recommender::models::{DatasetKind, ImportMode};
use enhancement_recommender::personalize::DEFAULT_RECIPE_ARN;

#[test]
fn test_default_storage_config() {
    let config = AppConfig::default();

    assert_eq!(config.storage.bucket, "staging-massage-personalize-datasets");
    assert_eq!(config.storage.data_dir, "data");
    assert!(config.storage.grant_bucket_access);
    assert!(config.storage.create_bucket);
}

#[test]
fn test_default_personalize_config() {
    let config = AppConfig::default();

    assert_eq!(config.personalize.recipe_arn, DEFAULT_RECIPE_ARN);
    assert_eq!(config.personalize.import_mode, ImportMode::Full);
    assert_eq!(config.personalize.min_provisioned_tps, 2);
    assert!(config.personalize.keep_previous_solution);
    assert!(!config.personalize.perform_hpo);
    assert!(config.personalize.role_arn.is_empty());
    assert!(config.personalize.role_name.is_none());
    assert_eq!(config.role_settle(), Duration::from_secs(10));
}

#[test]
fn test_default_inference_and_data_config() {
    let config = AppConfig::default();

    assert_eq!(config.inference.num_results, 5);
    assert!(config.inference.return_item_metadata);
    assert!((config.data.days_in_year - 365.25).abs() < f64::EPSILON);
}

#[test]
fn test_poll_policy() {
    let mut config = AppConfig::default();
    assert_eq!(config.poll_policy().interval, Duration::from_secs(60));
    assert_eq!(config.poll_policy().timeout, Duration::from_secs(3 * 60 * 60));

    config.personalize.poll_interval_secs = 5;
    config.personalize.poll_timeout_secs = 30;
    assert_eq!(config.poll_policy().interval, Duration::from_secs(5));
    assert_eq!(config.poll_policy().timeout, Duration::from_secs(30));
}

#[test]
fn test_resource_names_follow_env() {
    let mut config = AppConfig::default();
    config.deploy.env = "prod".to_string();

    let names = config.resource_names();
    assert_eq!(names.dataset_group(), "prod-massage-dataset-group");
    assert_eq!(names.schema(DatasetKind::Items), "prod-massage-items-schema");
    assert_eq!(names.dataset(DatasetKind::Users), "prod-massage-users");
    assert_eq!(names.solution(), "prod-massage-solution");
    assert_eq!(names.campaign(), "prod-massage-campaign");
}

#[test]
fn test_options_from_config() {
    let mut config = AppConfig::default();
    config.personalize.keep_previous_solution = false;
    config.personalize.perform_auto_ml = true;
    config.personalize.min_provisioned_tps = 4;

    let solution = config.solution_options();
    assert!(!solution.keep_previous_solution);
    assert!(solution.perform_auto_ml);
    assert_eq!(config.campaign_options().min_provisioned_tps, 4);
    assert!(config.campaign_options().enable_metadata_with_recommendations);
}

#[test]
fn test_require_import_role() {
    let mut config = AppConfig::default();
    assert!(config.require_import_role().is_err());

    config.personalize.role_name = Some("massage-personalize-role".to_string());
    assert!(config.require_import_role().is_ok());

    config.personalize.role_name = None;
    config.personalize.role_arn = "arn:aws:iam::000000000000:role/PersonalizeRole".to_string();
    assert!(config.require_import_role().is_ok());
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.deploy.env = "has space".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.storage.bucket = "Upper_Case".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.personalize.role_arn = "PersonalizeRole".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.personalize.role_name = Some("role with spaces".to_string());
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.personalize.min_provisioned_tps = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.personalize.poll_timeout_secs = 10;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.data.days_in_year = 0.0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.inference.num_results = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_logging() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.format = "json".to_string();
    config.logging.level = "debug".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_round_trips_through_config_crate() {
    let source = config::Config::try_from(&AppConfig::default()).unwrap();
    let config: AppConfig = source.try_deserialize().unwrap();

    assert_eq!(config.deploy.env, "staging");
    assert_eq!(config.personalize.import_mode, ImportMode::Full);
    assert!(config.aws.region.is_none());
}
