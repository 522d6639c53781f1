//! IAM role the dataset import jobs run under.
//!
//! When no role ARN is configured, the role is looked up by name and created
//! on first use with the S3 and Personalize managed policies attached.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{sdk_error, RecommenderError, Result};

/// Error code IAM returns for an unknown role
pub const NO_SUCH_ENTITY_CODE: &str = "NoSuchEntity";

/// Error code IAM returns when a role name is taken
pub const ENTITY_EXISTS_CODE: &str = "EntityAlreadyExists";

/// Managed policies attached to a newly created role
pub const IMPORT_ROLE_POLICIES: [&str; 2] = [
    "arn:aws:iam::aws:policy/AmazonS3FullAccess",
    "arn:aws:iam::aws:policy/service-role/AmazonPersonalizeFullAccess",
];

/// The subset of IAM the workflow needs
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// ARN of the named role; unknown roles fail with [`NO_SUCH_ENTITY_CODE`]
    async fn get_role(&self, name: &str) -> Result<String>;
    async fn create_role(&self, name: &str, assume_role_policy: &str) -> Result<String>;
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;
}

/// Trust policy letting the recommendation service assume the role.
#[must_use]
pub fn personalize_trust_policy() -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": {
                    "Service": "personalize.amazonaws.com"
                },
                "Action": "sts:AssumeRole"
            }
        ]
    })
}

/// Return the ARN of role `name`, creating it when it does not exist.
///
/// A created role gets [`IMPORT_ROLE_POLICIES`] attached, then the call sleeps
/// for `settle` because a fresh role cannot be assumed until IAM propagates it.
pub async fn ensure_role(api: &dyn IdentityApi, name: &str, settle: Duration) -> Result<String> {
    match api.get_role(name).await {
        Ok(arn) => {
            info!(role = name, arn = %arn, "Got IAM role");
            return Ok(arn);
        }
        Err(e) if e.code() == Some(NO_SUCH_ENTITY_CODE) => info!(role = name, "IAM role does not exist"),
        Err(e) => return Err(e),
    }

    let trust_policy = serde_json::to_string(&personalize_trust_policy())?;
    let arn = match api.create_role(name, &trust_policy).await {
        Ok(arn) => arn,
        Err(e) if e.code() == Some(ENTITY_EXISTS_CODE) => {
            warn!(role = name, "The role already exists, using it");
            return api.get_role(name).await;
        }
        Err(e) => return Err(e),
    };
    info!(role = name, arn = %arn, "Created IAM role");

    for policy_arn in IMPORT_ROLE_POLICIES {
        api.attach_role_policy(name, policy_arn).await?;
        info!(role = name, policy_arn, "Attached policy to role");
    }

    if !settle.is_zero() {
        info!(seconds = settle.as_secs(), "Giving IAM time to propagate the role...");
        tokio::time::sleep(settle).await;
    }
    Ok(arn)
}

/// The configured role ARN, or the ARN of the provisioned `role_name`.
pub async fn resolve_role_arn(
    api: &dyn IdentityApi,
    role_arn: &str,
    role_name: Option<&str>,
    settle: Duration,
) -> Result<String> {
    if !role_arn.is_empty() {
        return Ok(role_arn.to_string());
    }
    match role_name {
        Some(name) => ensure_role(api, name, settle).await,
        None => Err(RecommenderError::Validation(
            "no import role: set personalize.role_arn or personalize.role_name".to_string(),
        )),
    }
}

/// [`IdentityApi`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct AwsIam {
    client: aws_sdk_iam::Client,
}

impl AwsIam {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_iam::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityApi for AwsIam {
    async fn get_role(&self, name: &str) -> Result<String> {
        let output = self
            .client
            .get_role()
            .role_name(name)
            .send()
            .await
            .map_err(|e| sdk_error("GetRole", &e))?;
        output
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| RecommenderError::missing("GetRole", "role"))
    }

    async fn create_role(&self, name: &str, assume_role_policy: &str) -> Result<String> {
        let output = self
            .client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(assume_role_policy)
            .send()
            .await
            .map_err(|e| sdk_error("CreateRole", &e))?;
        output
            .role()
            .map(|r| r.arn().to_string())
            .ok_or_else(|| RecommenderError::missing("CreateRole", "role"))
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error("AttachRolePolicy", &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_policy_names_service() {
        let policy = personalize_trust_policy();
        assert_eq!(policy["Statement"][0]["Principal"]["Service"], "personalize.amazonaws.com");
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }
}
