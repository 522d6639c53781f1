//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use enhancement_recommender::error::{RecommenderError, Result, ALREADY_EXISTS_CODE, NOT_FOUND_CODE};
use enhancement_recommender::identity::{IdentityApi, ENTITY_EXISTS_CODE, NO_SUCH_ENTITY_CODE};
use enhancement_recommender::models::ResourceSummary;
use enhancement_recommender::personalize::{
    CampaignRequest, DatasetRequest, ImportJobRequest, PersonalizeApi, PollPolicy, SolutionRequest,
};
use enhancement_recommender::storage::{ObjectStore, BUCKET_OWNED_CODE};

/// Millisecond polling so waits finish quickly
pub fn fast_poll() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        timeout: Duration::from_millis(200),
    }
}

#[derive(Default)]
pub struct State {
    pub dataset_groups: Vec<ResourceSummary>,
    pub schemas: Vec<ResourceSummary>,
    /// Keyed by dataset group ARN
    pub datasets: HashMap<String, Vec<ResourceSummary>>,
    pub solutions: HashMap<String, Vec<ResourceSummary>>,
    pub campaigns: Vec<ResourceSummary>,
    /// Scripted statuses per ARN; the last one sticks
    pub statuses: HashMap<String, VecDeque<String>>,
    pub deleted: Vec<String>,
    pub import_jobs: Vec<ImportJobRequest>,
    pub campaign_requests: Vec<CampaignRequest>,
    pub solution_requests: Vec<SolutionRequest>,
    pub calls: Vec<String>,
    /// Statuses handed to every resource created later, by ARN kind
    pub kind_scripts: HashMap<String, Vec<String>>,
    /// Names whose create call answers with a conflict even if unlisted
    pub conflict_on_create: Vec<String>,
    /// Statuses a campaign reports after UpdateCampaign
    pub campaign_update_script: Vec<String>,
    next_id: u32,
}

impl State {
    fn arn(&mut self, kind: &str, name: &str) -> String {
        self.next_id += 1;
        let arn = format!("arn:aws:personalize:us-east-1:000000000000:{kind}/{name}-{}", self.next_id);
        if let Some(script) = self.kind_scripts.get(kind) {
            let script = script.iter().cloned().collect();
            self.statuses.insert(arn.clone(), script);
        }
        arn
    }

    fn status(&mut self, arn: &str) -> Result<String> {
        if self.deleted.iter().any(|d| d == arn) {
            return Err(RecommenderError::api("Describe", Some(NOT_FOUND_CODE), "gone"));
        }
        let queue = self.statuses.entry(arn.to_string()).or_default();
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(status.unwrap_or_else(|| "ACTIVE".to_string()))
    }
}

/// Fake control plane; clones share state
#[derive(Clone, Default)]
pub struct FakePersonalize {
    pub state: Arc<Mutex<State>>,
}

impl FakePersonalize {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the statuses the next describe calls of `arn` return.
    pub fn script(&self, arn: &str, statuses: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .statuses
            .insert(arn.to_string(), statuses.iter().map(|s| (*s).to_string()).collect());
    }

    /// Script statuses for every resource of `kind` created after this call.
    pub fn script_kind(&self, kind: &str, statuses: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state
            .kind_scripts
            .insert(kind.to_string(), statuses.iter().map(|s| (*s).to_string()).collect());
    }

    /// Script the statuses a campaign reports after the next update.
    pub fn script_campaign_update(&self, statuses: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.campaign_update_script = statuses.iter().map(|s| (*s).to_string()).collect();
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.to_string());
        state
    }
}

fn conflict(operation: &str) -> RecommenderError {
    RecommenderError::api(operation, Some(ALREADY_EXISTS_CODE), "already exists")
}

#[async_trait]
impl PersonalizeApi for FakePersonalize {
    async fn list_dataset_groups(&self) -> Result<Vec<ResourceSummary>> {
        Ok(self.record("ListDatasetGroups").dataset_groups.clone())
    }

    async fn create_dataset_group(&self, name: &str) -> Result<String> {
        let mut state = self.record("CreateDatasetGroup");
        if state.dataset_groups.iter().any(|g| g.name == name) {
            return Err(conflict("CreateDatasetGroup"));
        }
        let arn = state.arn("dataset-group", name);
        state.dataset_groups.push(ResourceSummary {
            name: name.to_string(),
            arn: arn.clone(),
        });
        Ok(arn)
    }

    async fn describe_dataset_group(&self, arn: &str) -> Result<String> {
        self.record("DescribeDatasetGroup").status(arn)
    }

    async fn list_schemas(&self) -> Result<Vec<ResourceSummary>> {
        Ok(self.record("ListSchemas").schemas.clone())
    }

    async fn create_schema(&self, name: &str, schema: &str) -> Result<String> {
        let mut state = self.record("CreateSchema");
        serde_json::from_str::<serde_json::Value>(schema)?;
        if state.schemas.iter().any(|s| s.name == name) {
            return Err(conflict("CreateSchema"));
        }
        let arn = state.arn("schema", name);
        state.schemas.push(ResourceSummary {
            name: name.to_string(),
            arn: arn.clone(),
        });
        Ok(arn)
    }

    async fn list_datasets(&self, dataset_group_arn: &str) -> Result<Vec<ResourceSummary>> {
        let state = self.record("ListDatasets");
        Ok(state.datasets.get(dataset_group_arn).cloned().unwrap_or_default())
    }

    async fn create_dataset(&self, request: &DatasetRequest) -> Result<String> {
        let mut state = self.record("CreateDataset");
        let arn = state.arn("dataset", &request.name);
        state
            .datasets
            .entry(request.dataset_group_arn.clone())
            .or_default()
            .push(ResourceSummary {
                name: request.name.clone(),
                arn: arn.clone(),
            });
        Ok(arn)
    }

    async fn describe_dataset(&self, arn: &str) -> Result<String> {
        self.record("DescribeDataset").status(arn)
    }

    async fn create_dataset_import_job(&self, request: &ImportJobRequest) -> Result<String> {
        let mut state = self.record("CreateDatasetImportJob");
        state.import_jobs.push(request.clone());
        Ok(state.arn("dataset-import-job", &request.job_name))
    }

    async fn describe_dataset_import_job(&self, arn: &str) -> Result<String> {
        self.record("DescribeDatasetImportJob").status(arn)
    }

    async fn list_recipes(&self) -> Result<Vec<String>> {
        drop(self.record("ListRecipes"));
        Ok(vec!["arn:aws:personalize:::recipe/aws-user-personalization".to_string()])
    }

    async fn list_solutions(&self, dataset_group_arn: &str) -> Result<Vec<ResourceSummary>> {
        let state = self.record("ListSolutions");
        Ok(state.solutions.get(dataset_group_arn).cloned().unwrap_or_default())
    }

    async fn create_solution(&self, request: &SolutionRequest) -> Result<String> {
        let mut state = self.record("CreateSolution");
        if state.conflict_on_create.contains(&request.name) {
            return Err(conflict("CreateSolution"));
        }
        state.solution_requests.push(request.clone());
        let arn = state.arn("solution", &request.name);
        state
            .solutions
            .entry(request.dataset_group_arn.clone())
            .or_default()
            .push(ResourceSummary {
                name: request.name.clone(),
                arn: arn.clone(),
            });
        Ok(arn)
    }

    async fn describe_solution(&self, arn: &str) -> Result<String> {
        self.record("DescribeSolution").status(arn)
    }

    async fn delete_solution(&self, arn: &str) -> Result<()> {
        let mut state = self.record("DeleteSolution");
        for solutions in state.solutions.values_mut() {
            solutions.retain(|s| s.arn != arn);
        }
        state.deleted.push(arn.to_string());
        Ok(())
    }

    async fn create_solution_version(&self, solution_arn: &str) -> Result<String> {
        let mut state = self.record("CreateSolutionVersion");
        let name = solution_arn.rsplit('/').next().unwrap_or("solution").to_string();
        Ok(state.arn("solution-version", &name))
    }

    async fn describe_solution_version(&self, arn: &str) -> Result<String> {
        self.record("DescribeSolutionVersion").status(arn)
    }

    async fn get_solution_metrics(&self, _solution_version_arn: &str) -> Result<BTreeMap<String, f64>> {
        drop(self.record("GetSolutionMetrics"));
        Ok(BTreeMap::from([
            ("coverage".to_string(), 0.42),
            ("precision_at_5".to_string(), 0.11),
        ]))
    }

    async fn list_campaigns(&self) -> Result<Vec<ResourceSummary>> {
        Ok(self.record("ListCampaigns").campaigns.clone())
    }

    async fn create_campaign(&self, request: &CampaignRequest) -> Result<String> {
        let mut state = self.record("CreateCampaign");
        state.campaign_requests.push(request.clone());
        let arn = state.arn("campaign", &request.name);
        state.campaigns.push(ResourceSummary {
            name: request.name.clone(),
            arn: arn.clone(),
        });
        Ok(arn)
    }

    async fn update_campaign(&self, campaign_arn: &str, request: &CampaignRequest) -> Result<String> {
        let mut state = self.record("UpdateCampaign");
        state.campaign_requests.push(request.clone());
        let script: VecDeque<String> = state.campaign_update_script.drain(..).collect();
        if !script.is_empty() {
            state.statuses.insert(campaign_arn.to_string(), script);
        }
        Ok(campaign_arn.to_string())
    }

    async fn describe_campaign(&self, arn: &str) -> Result<String> {
        self.record("DescribeCampaign").status(arn)
    }
}

/// Object store that keeps uploads in memory; clones share state
///
/// Writes to a bucket that was never created fail with `NoSuchBucket`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub objects: Arc<Mutex<BTreeMap<(String, String), Vec<u8>>>>,
    pub policies: Arc<Mutex<Vec<(String, String)>>>,
    pub buckets: Arc<Mutex<Vec<String>>>,
    /// Buckets that exist but are missing from `list_buckets`
    pub unlisted: Arc<Mutex<Vec<String>>>,
    pub create_calls: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::default();
        store.buckets.lock().unwrap().push(bucket.to_string());
        store
    }

    fn require_bucket(&self, operation: &str, bucket: &str) -> Result<()> {
        if self.buckets.lock().unwrap().iter().any(|b| b == bucket) {
            Ok(())
        } else {
            Err(RecommenderError::api(operation, Some("NoSuchBucket"), "bucket does not exist"))
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.require_bucket("PutObject", bucket)?;
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.require_bucket("PutBucketPolicy", bucket)?;
        self.policies
            .lock()
            .unwrap()
            .push((bucket.to_string(), policy.to_string()));
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(self.buckets.lock().unwrap().clone())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        *self.create_calls.lock().unwrap() += 1;
        let owned = self.unlisted.lock().unwrap().iter().any(|b| b == bucket);
        let mut buckets = self.buckets.lock().unwrap();
        if owned || buckets.iter().any(|b| b == bucket) {
            return Err(RecommenderError::api("CreateBucket", Some(BUCKET_OWNED_CODE), "already owned"));
        }
        buckets.push(bucket.to_string());
        Ok(())
    }
}

/// Fake IAM; clones share state
#[derive(Clone, Default)]
pub struct FakeIam {
    /// Role name to ARN
    pub roles: Arc<Mutex<BTreeMap<String, String>>>,
    pub trust_policies: Arc<Mutex<Vec<String>>>,
    pub attached: Arc<Mutex<Vec<(String, String)>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Role created by someone else between our lookup and our create
    pub created_concurrently: Arc<Mutex<Option<String>>>,
    /// Code returned by every GetRole, when set
    pub get_role_error: Arc<Mutex<Option<String>>>,
}

impl FakeIam {
    pub fn with_role(name: &str) -> Self {
        let iam = Self::default();
        iam.roles.lock().unwrap().insert(name.to_string(), role_arn(name));
        iam
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

pub fn role_arn(name: &str) -> String {
    format!("arn:aws:iam::000000000000:role/{name}")
}

#[async_trait]
impl IdentityApi for FakeIam {
    async fn get_role(&self, name: &str) -> Result<String> {
        self.record("GetRole");
        if let Some(code) = self.get_role_error.lock().unwrap().clone() {
            return Err(RecommenderError::api("GetRole", Some(&code), "denied"));
        }
        self.roles
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| RecommenderError::api("GetRole", Some(NO_SUCH_ENTITY_CODE), "no such role"))
    }

    async fn create_role(&self, name: &str, assume_role_policy: &str) -> Result<String> {
        self.record("CreateRole");
        if let Some(raced) = self.created_concurrently.lock().unwrap().take() {
            self.roles.lock().unwrap().insert(raced.clone(), role_arn(&raced));
        }
        let mut roles = self.roles.lock().unwrap();
        if roles.contains_key(name) {
            return Err(RecommenderError::api("CreateRole", Some(ENTITY_EXISTS_CODE), "taken"));
        }
        self.trust_policies.lock().unwrap().push(assume_role_policy.to_string());
        let arn = role_arn(name);
        roles.insert(name.to_string(), arn.clone());
        Ok(arn)
    }

    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.record("AttachRolePolicy");
        self.attached
            .lock()
            .unwrap()
            .push((role_name.to_string(), policy_arn.to_string()));
        Ok(())
    }
}

/// Small point-of-sale export: two invoices with enhancements, one without,
/// a duplicate line, a retail line and an enhancement without a code.
pub const SAMPLE_EXTRACT: &str = "\
Invoice ID,Service Parent Category,User ID,Guest DOB,Guest Zipcode,Guest Gender,Guest Base Center,Service Length,Item Name,Item Code,Center Name,Invoice Closed Date
1,Massages,u1,1/15/1990 12:00:00 AM,10001,F,Midtown,50,The NOW 50,M50,Midtown,2024-03-01 10:00:00
1,Enhancement,u1,1/15/1990 12:00:00 AM,10001,F,Midtown,,Hot Stones,E01,Midtown,2024-03-01 10:05:00
1,Enhancement,u1,1/15/1990 12:00:00 AM,10001,F,Midtown,,CBD Oil,E02,Midtown,2024-03-01 10:05:00
1,Enhancement,u1,1/15/1990 12:00:00 AM,10001,F,Midtown,,CBD Oil,E02,Midtown,2024-03-01 10:05:00
2,Massages,u2,,,M,Soho,80,The NOW 80,M80,Soho,2024-03-02 12:00:00
2,Enhancement,u2,,,M,Soho,,Hot Stones,E01,Soho,2024-03-02 12:30:00
2,Enhancement,u2,,,M,Soho,,Mystery Add-on,,Soho,2024-03-02 12:30:00
3,Massages,u3,5/5/1985 12:00:00 AM,11211,F,Soho,50,The NOW 50,M50,Soho,2024-03-03 09:00:00
4,Retail,u3,5/5/1985 12:00:00 AM,11211,F,Soho,,Body Lotion,R01,Soho,2024-03-03 09:30:00
";
