//! Fixed-interval status polling for remote resources.

use std::fmt;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{error, info};

use super::PersonalizeApi;
use crate::error::{RecommenderError, Result};
use crate::metrics::MetricsCollector;

/// Status reported for a resource whose describe call says it no longer exists
pub const DELETED: &str = "DELETED";

/// Remote resources whose status is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    DatasetGroup,
    Dataset,
    DatasetImportJob,
    Solution,
    SolutionVersion,
    Campaign,
}

impl ResourceKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DatasetGroup => "DatasetGroup",
            Self::Dataset => "Dataset",
            Self::DatasetImportJob => "DatasetImportJob",
            Self::Solution => "Solution",
            Self::SolutionVersion => "SolutionVersion",
            Self::Campaign => "Campaign",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Poll interval and wall-clock limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(3 * 60 * 60),
        }
    }
}

/// Statuses that end a wait
#[derive(Debug, Clone, Copy)]
pub struct StatusTargets {
    pub success: &'static [&'static str],
    pub failure: &'static [&'static str],
    /// A not-found answer counts as success
    pub absent_is_success: bool,
}

impl StatusTargets {
    /// Waiting for a create or update to finish
    pub const CREATION: Self = Self {
        success: &["ACTIVE"],
        failure: &["CREATE FAILED"],
        absent_is_success: false,
    };

    /// Waiting for a delete to be accepted
    pub const DELETION: Self = Self {
        success: &["DELETE PENDING"],
        failure: &["DELETE FAILED"],
        absent_is_success: true,
    };
}

/// Current status of a resource.
pub async fn describe_status(api: &dyn PersonalizeApi, kind: ResourceKind, arn: &str) -> Result<String> {
    match kind {
        ResourceKind::DatasetGroup => api.describe_dataset_group(arn).await,
        ResourceKind::Dataset => api.describe_dataset(arn).await,
        ResourceKind::DatasetImportJob => api.describe_dataset_import_job(arn).await,
        ResourceKind::Solution => api.describe_solution(arn).await,
        ResourceKind::SolutionVersion => api.describe_solution_version(arn).await,
        ResourceKind::Campaign => api.describe_campaign(arn).await,
    }
}

/// Poll `arn` until its status is one of `targets` or `policy.timeout` elapses.
///
/// Returns the terminal success status. A failure status yields
/// [`RecommenderError::ResourceFailed`] and running out of time yields
/// [`RecommenderError::Timeout`].
pub async fn wait_for(
    api: &dyn PersonalizeApi,
    kind: ResourceKind,
    arn: &str,
    targets: &StatusTargets,
    policy: &PollPolicy,
    metrics: &MetricsCollector,
) -> Result<String> {
    let started = Instant::now();

    loop {
        metrics.record_poll_attempt(kind.label());
        let status = match describe_status(api, kind, arn).await {
            Ok(status) => status,
            Err(e) if targets.absent_is_success && e.is_not_found() => DELETED.to_string(),
            Err(e) => {
                metrics.record_error("api", kind.label());
                return Err(e);
            }
        };
        info!("{kind}: {status}");

        if status == DELETED || targets.success.contains(&status.as_str()) {
            metrics.record_resource_wait(kind.label(), started.elapsed(), "success");
            return Ok(status);
        }

        if targets.failure.contains(&status.as_str()) {
            error!(resource = %kind, arn, status = %status, "Resource failed");
            metrics.record_resource_wait(kind.label(), started.elapsed(), "failure");
            return Err(RecommenderError::ResourceFailed {
                resource: kind.label().to_string(),
                arn: arn.to_string(),
                status,
            });
        }

        if started.elapsed() >= policy.timeout {
            error!(resource = %kind, arn, last_status = %status, "Gave up waiting for resource");
            metrics.record_resource_wait(kind.label(), started.elapsed(), "timeout");
            return Err(RecommenderError::Timeout {
                resource: kind.label().to_string(),
                arn: arn.to_string(),
                waited_secs: started.elapsed().as_secs(),
                last_status: status,
            });
        }

        sleep(policy.interval).await;
    }
}
