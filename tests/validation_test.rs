//! Comprehensive unit tests for validation.rs module

use std::collections::BTreeMap;

use enhancement_recommender::validation::{InputValidator, MAX_NUM_RESULTS};
use tempfile::TempDir;

#[test]
fn test_validate_resource_name_valid() {
    assert!(InputValidator::validate_resource_name("staging-massage-dataset-group").is_ok());
    assert!(InputValidator::validate_resource_name("prod_v2").is_ok());
}

#[test]
fn test_validate_resource_name_empty() {
    assert!(InputValidator::validate_resource_name("").is_err());
}

#[test]
fn test_validate_resource_name_too_long() {
    assert!(InputValidator::validate_resource_name(&"a".repeat(63)).is_ok());
    assert!(InputValidator::validate_resource_name(&"a".repeat(64)).is_err());
}

#[test]
fn test_validate_resource_name_bad_chars() {
    assert!(InputValidator::validate_resource_name("-leading-dash").is_err());
    assert!(InputValidator::validate_resource_name("with space").is_err());
    assert!(InputValidator::validate_resource_name("dot.name").is_err());
}

#[test]
fn test_validate_deploy_env() {
    assert!(InputValidator::validate_deploy_env("staging").is_ok());
    assert!(InputValidator::validate_deploy_env("").is_err());
    assert!(InputValidator::validate_deploy_env("   ").is_err());
    assert!(InputValidator::validate_deploy_env(&"e".repeat(40)).is_err());
}

#[test]
fn test_validate_bucket_name() {
    assert!(InputValidator::validate_bucket_name("staging-massage-personalize-datasets").is_ok());
    assert!(InputValidator::validate_bucket_name("my.bucket.name").is_ok());
    assert!(InputValidator::validate_bucket_name("ab").is_err());
    assert!(InputValidator::validate_bucket_name("Capital").is_err());
    assert!(InputValidator::validate_bucket_name("trailing-").is_err());
    assert!(InputValidator::validate_bucket_name("double..dot").is_err());
}

#[test]
fn test_validate_user_id() {
    assert!(InputValidator::validate_user_id("123456").is_ok());
    assert!(InputValidator::validate_user_id("").is_err());
    assert!(InputValidator::validate_user_id("  ").is_err());
    assert!(InputValidator::validate_user_id("abc\n").is_err());
    assert!(InputValidator::validate_user_id(&"1".repeat(257)).is_err());
}

#[test]
fn test_validate_num_results() {
    assert!(InputValidator::validate_num_results(1).is_ok());
    assert!(InputValidator::validate_num_results(MAX_NUM_RESULTS).is_ok());
    assert!(InputValidator::validate_num_results(0).is_err());
    assert!(InputValidator::validate_num_results(MAX_NUM_RESULTS + 1).is_err());
}

#[test]
fn test_validate_context() {
    let mut context = BTreeMap::new();
    context.insert("SERVICE_LENGTH".to_string(), "60.0".to_string());
    assert!(InputValidator::validate_context(&context).is_ok());
    assert!(InputValidator::validate_context(&BTreeMap::new()).is_ok());

    context.insert(" ".to_string(), "x".to_string());
    assert!(InputValidator::validate_context(&context).is_err());
}

#[test]
fn test_parse_context_entry() {
    assert_eq!(
        InputValidator::parse_context_entry("ZIPCODE=null").unwrap(),
        ("ZIPCODE".to_string(), "null".to_string())
    );
    assert_eq!(
        InputValidator::parse_context_entry("NOTE=a=b").unwrap(),
        ("NOTE".to_string(), "a=b".to_string())
    );
    assert!(InputValidator::parse_context_entry("MASSAGE_NAME").is_err());
    assert!(InputValidator::parse_context_entry("=value").is_err());
}

#[test]
fn test_validate_input_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("extract.csv");
    std::fs::write(&file, "Invoice ID\n").unwrap();

    assert!(InputValidator::validate_input_file(&file).is_ok());
    assert!(InputValidator::validate_input_file(temp_dir.path()).is_err());
    assert!(InputValidator::validate_input_file(&temp_dir.path().join("missing.csv")).is_err());
}
