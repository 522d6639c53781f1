//! Recommendation lookup against a deployed campaign.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tracing::info;

use crate::error::{sdk_error, Result};
use crate::models::Recommendation;

/// Item metadata column returned with each recommendation
pub const ITEM_NAME_COLUMN: &str = "ITEM_NAME";

/// Parameters of a recommendation lookup
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub campaign_arn: String,
    pub user_id: String,
    /// Contextual feature name to value, e.g. `MASSAGE_NAME` to `The NOW 50`
    pub context: BTreeMap<String, String>,
    pub num_results: i32,
    /// Ask for `ITEM_NAME` alongside each item id
    pub return_item_metadata: bool,
}

/// Runtime side of the recommendation service
#[async_trait]
pub trait RecommendationApi: Send + Sync {
    async fn get_recommendations(&self, request: &RecommendationRequest) -> Result<Vec<Recommendation>>;
}

/// Thin wrapper that logs and forwards lookups
pub struct Inference {
    api: Box<dyn RecommendationApi>,
}

impl Inference {
    pub fn new(api: Box<dyn RecommendationApi>) -> Self {
        Self { api }
    }

    /// Ranked enhancements for a guest in the given context.
    pub async fn get_recommendations(&self, request: &RecommendationRequest) -> Result<Vec<Recommendation>> {
        info!(
            campaign = %request.campaign_arn,
            user_id = %request.user_id,
            num_results = request.num_results,
            "Requesting recommendations"
        );
        let items = self.api.get_recommendations(request).await?;
        info!(returned = items.len(), "Received recommendations");
        Ok(items)
    }
}

/// [`RecommendationApi`] backed by the Personalize runtime SDK
#[derive(Debug, Clone)]
pub struct AwsRecommender {
    client: aws_sdk_personalizeruntime::Client,
}

impl AwsRecommender {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_personalizeruntime::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl RecommendationApi for AwsRecommender {
    async fn get_recommendations(&self, request: &RecommendationRequest) -> Result<Vec<Recommendation>> {
        let context: HashMap<String, String> = request
            .context
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut call = self
            .client
            .get_recommendations()
            .campaign_arn(&request.campaign_arn)
            .user_id(&request.user_id)
            .num_results(request.num_results)
            .set_context(Some(context));
        if request.return_item_metadata {
            call = call.metadata_columns("ITEMS", vec![ITEM_NAME_COLUMN.to_string()]);
        }

        let output = call
            .send()
            .await
            .map_err(|e| sdk_error("GetRecommendations", &e))?;

        Ok(output
            .item_list()
            .iter()
            .filter_map(|item| {
                Some(Recommendation {
                    item_id: item.item_id()?.to_string(),
                    score: item.score(),
                    metadata: item
                        .metadata()
                        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                        .unwrap_or_default(),
                })
            })
            .collect())
    }
}
