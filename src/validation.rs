use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Largest result count the runtime lookup accepts
pub const MAX_NUM_RESULTS: i32 = 500;

fn resource_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\-_]*$").expect("resource name pattern is valid"))
}

fn bucket_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9.\-]*[a-z0-9]$").expect("bucket name pattern is valid"))
}

fn role_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_+=,.@\-]{1,64}$").expect("role name pattern is valid"))
}

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a remote resource name (dataset group, schema, dataset, solution, campaign)
    pub fn validate_resource_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(anyhow!("Resource name cannot be empty"));
        }

        if name.len() > 63 {
            return Err(anyhow!("Resource name too long (max 63 characters): {name}"));
        }

        if !resource_name_pattern().is_match(name) {
            return Err(anyhow!(
                "Resource name may only contain letters, digits, '-' and '_': {name}"
            ));
        }

        Ok(())
    }

    /// Validate the deployment prefix
    ///
    /// The longest generated name is `<env>-massage-interactions-schema`, which
    /// must still be a valid resource name.
    pub fn validate_deploy_env(env: &str) -> Result<()> {
        if env.trim().is_empty() {
            return Err(anyhow!("Deployment env cannot be empty"));
        }

        Self::validate_resource_name(&format!("{env}-massage-interactions-schema"))
            .map_err(|_| anyhow!("Invalid deployment env: {env}"))
    }

    /// Validate an IAM role name
    pub fn validate_role_name(name: &str) -> Result<()> {
        if !role_name_pattern().is_match(name) {
            return Err(anyhow!(
                "Role name must be 1-64 letters, digits or '+=,.@-_' characters: {name}"
            ));
        }

        Ok(())
    }

    /// Validate an S3 bucket name
    pub fn validate_bucket_name(bucket: &str) -> Result<()> {
        if !(3..=63).contains(&bucket.len()) {
            return Err(anyhow!("Bucket name must be between 3 and 63 characters"));
        }

        if !bucket_name_pattern().is_match(bucket) {
            return Err(anyhow!(
                "Bucket name may only contain lowercase letters, digits, '.' and '-': {bucket}"
            ));
        }

        if bucket.contains("..") {
            return Err(anyhow!("Bucket name cannot contain consecutive dots"));
        }

        Ok(())
    }

    /// Validate a user id passed to the lookup
    pub fn validate_user_id(user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(anyhow!("User id cannot be empty"));
        }

        if user_id.len() > 256 {
            return Err(anyhow!("User id too long (max 256 characters)"));
        }

        if user_id.chars().any(char::is_control) {
            return Err(anyhow!("User id contains invalid characters"));
        }

        Ok(())
    }

    /// Validate requested result count
    pub fn validate_num_results(num_results: i32) -> Result<()> {
        if !(1..=MAX_NUM_RESULTS).contains(&num_results) {
            return Err(anyhow!(
                "Number of results must be between 1 and {MAX_NUM_RESULTS}"
            ));
        }

        Ok(())
    }

    /// Validate the contextual features of a lookup
    pub fn validate_context(context: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in context {
            if key.trim().is_empty() {
                return Err(anyhow!("Context feature name cannot be empty"));
            }

            if key.len() > 150 || value.len() > 1000 {
                return Err(anyhow!("Context entry too long: {key}"));
            }
        }

        Ok(())
    }

    /// Parse a `KEY=VALUE` context argument
    pub fn parse_context_entry(entry: &str) -> Result<(String, String)> {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow!("Context entry must look like KEY=VALUE: {entry}"))?;

        let key = key.trim();
        if key.is_empty() {
            return Err(anyhow!("Context feature name cannot be empty"));
        }

        Ok((key.to_string(), value.trim().to_string()))
    }

    /// Validate the raw extract path
    pub fn validate_input_file(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(anyhow!("Input file does not exist: {path:?}"));
        }

        if !path.is_file() {
            return Err(anyhow!("Input path is not a file: {path:?}"));
        }

        Ok(())
    }
}
