use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{ApiError, ApiResult, ArchiveApi};
use crate::models::{
    AddItemsRequest, AdminStats, Agent, ApplyHoldRequest, Assignment, AuditLogCreate,
    AuditLogEntry, AuditReceipt, BatchAssignRequest, Case, CaseDetail, ChainVerification, Config,
    ExportRequest, ExportTicket, HeaderField, HealthStatus, HoldCreated, HoldDetail,
    IntegrityReport, LegalHold, LoginOutcome, LoginRequest, MessageContent, MessageHit, NewCase,
    NewHold, NewOrganization, NewRetentionPolicy, NewUser, OrgAnalytics, Organization, PiiScan,
    Receipt, RedactedPreview, RetentionPolicy, ReviewStatus, SearchResults, User,
};
use crate::search::SearchRequest;

type Query = Vec<(&'static str, String)>;

fn org_query(org_id: i64) -> Query {
    vec![("org_id", org_id.to_string())]
}

fn optional_org_query(org_id: Option<i64>) -> Query {
    org_id.map(org_query).unwrap_or_default()
}

/// OpenArchive REST client
#[derive(Clone)]
pub struct ArchiveClient {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl ArchiveClient {
    /// Create a new client against `config.api_url`
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("openarchive-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = Url::parse(&config.api_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API URL cannot be used as a base: {}", config.api_url);
        }

        Ok(Self {
            client,
            base_url,
            access_token: None,
        })
    }

    /// Attach the bearer token sent with every request
    pub fn with_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = access_token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::RequestBuild {
                details: format!("cannot append path to {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/api/v1/<segments>`
    fn v1(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut full = Vec::with_capacity(segments.len() + 2);
        full.extend(["api", "v1"]);
        full.extend_from_slice(segments);
        self.url(&full)
    }

    fn request(&self, method: Method, url: Url, query: &Query) -> RequestBuilder {
        debug!("{} {}", method, url);
        let mut builder = self.client.request(method, url).header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("API request failed with status {}: {}", status, body);
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        debug!("API response received: {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url, query: Query) -> ApiResult<T> {
        self.send(self.request(Method::GET, url, &query)).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: Url, query: Query) -> ApiResult<T> {
        self.send(self.request(Method::DELETE, url, &query)).await
    }

    async fn post<B, T>(&self, url: Url, query: Query, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::POST, url, &query).json(body)).await
    }

    async fn put<B, T>(&self, url: Url, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.send(self.request(Method::PUT, url, &Vec::new()).json(body)).await
    }
}

#[async_trait]
impl ArchiveApi for ArchiveClient {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginOutcome> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let outcome: LoginOutcome = self.post(self.v1(&["auth", "login"])?, Vec::new(), &body).await?;
        info!("Logged in as {} ({})", outcome.user.username, outcome.user.role);
        Ok(outcome)
    }

    async fn health(&self) -> ApiResult<HealthStatus> {
        self.get(self.url(&["health"])?, Vec::new()).await
    }

    async fn list_cases(&self, org_id: i64) -> ApiResult<Vec<Case>> {
        self.get(self.v1(&["cases"])?, org_query(org_id)).await
    }

    async fn create_case(&self, org_id: i64, case: &NewCase) -> ApiResult<Case> {
        self.post(self.v1(&["cases"])?, org_query(org_id), case).await
    }

    async fn get_case(&self, org_id: i64, case_id: i64) -> ApiResult<CaseDetail> {
        self.get(self.v1(&["cases", &case_id.to_string()])?, org_query(org_id)).await
    }

    async fn delete_case(&self, org_id: i64, case_id: i64) -> ApiResult<Receipt> {
        self.delete(self.v1(&["cases", &case_id.to_string()])?, org_query(org_id)).await
    }

    async fn export_case(&self, org_id: i64, case_id: i64, request: &ExportRequest) -> ApiResult<ExportTicket> {
        let url = self.v1(&["cases", &case_id.to_string(), "export"])?;
        self.post(url, org_query(org_id), request).await
    }

    async fn add_case_items(&self, org_id: i64, case_id: i64, message_ids: &[String]) -> ApiResult<Receipt> {
        let body = AddItemsRequest { case_id, message_ids };
        let url = self.v1(&["cases", &case_id.to_string(), "items"])?;
        self.post(url, org_query(org_id), &body).await
    }

    async fn update_item_tags(&self, item_id: i64, tags: &[String]) -> ApiResult<Receipt> {
        let url = self.v1(&["cases", "items", &item_id.to_string(), "tags"])?;
        self.put(url, &json!({ "tags": tags })).await
    }

    async fn update_item_status(&self, item_id: i64, status: ReviewStatus) -> ApiResult<Receipt> {
        let url = self.v1(&["cases", "items", &item_id.to_string(), "status"])?;
        self.put(url, &json!({ "status": status })).await
    }

    async fn remove_case_item(&self, item_id: i64) -> ApiResult<Receipt> {
        self.delete(self.v1(&["cases", "items", &item_id.to_string()])?, Vec::new()).await
    }

    async fn batch_assign(&self, org_id: i64, item_ids: &[i64], assignee_id: i64) -> ApiResult<Receipt> {
        let body = BatchAssignRequest { item_ids, assignee_id };
        self.post(self.v1(&["cases", "items", "batch-assign"])?, org_query(org_id), &body).await
    }

    async fn list_assignments(&self, user_id: i64) -> ApiResult<Vec<Assignment>> {
        self.get(self.v1(&["cases", "assignments", &user_id.to_string()])?, Vec::new()).await
    }

    async fn list_holds(&self, org_id: i64) -> ApiResult<Vec<LegalHold>> {
        self.get(self.v1(&["admin", "holds"])?, org_query(org_id)).await
    }

    async fn create_hold(&self, org_id: i64, hold: &NewHold) -> ApiResult<HoldCreated> {
        self.post(self.v1(&["admin", "holds"])?, org_query(org_id), hold).await
    }

    async fn get_hold(&self, org_id: i64, hold_id: &str) -> ApiResult<HoldDetail> {
        self.get(self.v1(&["admin", "holds", hold_id])?, org_query(org_id)).await
    }

    async fn release_hold(&self, org_id: i64, hold_id: &str) -> ApiResult<Receipt> {
        let url = self.v1(&["admin", "holds", hold_id, "release"])?;
        self.post(url, org_query(org_id), &json!({})).await
    }

    async fn apply_hold(&self, org_id: i64, hold_id: &str, message_ids: &[String]) -> ApiResult<Receipt> {
        let body = ApplyHoldRequest { hold_id, message_ids };
        self.post(self.v1(&["admin", "holds", "apply"])?, org_query(org_id), &body).await
    }

    async fn list_audit_logs(&self, org_id: i64, limit: u32) -> ApiResult<Vec<AuditLogEntry>> {
        let mut query = org_query(org_id);
        query.push(("limit", limit.to_string()));
        self.get(self.v1(&["admin", "audit-logs"])?, query).await
    }

    async fn append_audit_log(&self, org_id: i64, entry: &AuditLogCreate) -> ApiResult<AuditReceipt> {
        self.post(self.v1(&["admin", "audit-logs"])?, org_query(org_id), entry).await
    }

    async fn verify_audit_chain(&self, org_id: i64) -> ApiResult<ChainVerification> {
        self.get(self.v1(&["admin", "audit-logs", "verify"])?, org_query(org_id)).await
    }

    async fn list_users(&self, org_id: Option<i64>) -> ApiResult<Vec<User>> {
        self.get(self.v1(&["admin", "users"])?, optional_org_query(org_id)).await
    }

    async fn create_user(&self, user: &NewUser) -> ApiResult<User> {
        self.post(self.v1(&["admin", "users"])?, Vec::new(), user).await
    }

    async fn delete_user(&self, user_id: i64) -> ApiResult<Receipt> {
        self.delete(self.v1(&["admin", "users", &user_id.to_string()])?, Vec::new()).await
    }

    async fn list_organizations(&self) -> ApiResult<Vec<Organization>> {
        self.get(self.v1(&["admin", "organizations"])?, Vec::new()).await
    }

    async fn create_organization(&self, org: &NewOrganization) -> ApiResult<Organization> {
        self.post(self.v1(&["admin", "organizations"])?, Vec::new(), org).await
    }

    async fn delete_organization(&self, org_id: i64) -> ApiResult<Receipt> {
        self.delete(self.v1(&["admin", "organizations", &org_id.to_string()])?, Vec::new()).await
    }

    async fn list_agents(&self) -> ApiResult<Vec<Agent>> {
        match self.get(self.v1(&["admin", "agents"])?, Vec::new()).await {
            Err(e) if e.is_not_found() => {
                warn!("/admin/agents not served, falling back to /admin/system/agents");
                self.get(self.v1(&["admin", "system", "agents"])?, Vec::new()).await
            }
            other => other,
        }
    }

    async fn org_analytics(&self, org_id: i64) -> ApiResult<OrgAnalytics> {
        self.get(self.v1(&["admin", "analytics"])?, org_query(org_id)).await
    }

    async fn admin_stats(&self, org_id: Option<i64>) -> ApiResult<AdminStats> {
        self.get(self.v1(&["admin", "stats"])?, optional_org_query(org_id)).await
    }

    async fn list_retention(&self, org_id: Option<i64>) -> ApiResult<Vec<RetentionPolicy>> {
        self.get(self.v1(&["admin", "retention"])?, optional_org_query(org_id)).await
    }

    async fn create_retention(&self, org_id: Option<i64>, policy: &NewRetentionPolicy) -> ApiResult<Receipt> {
        self.post(self.v1(&["admin", "retention"])?, optional_org_query(org_id), policy).await
    }

    async fn delete_retention(&self, org_id: Option<i64>, policy_id: i64) -> ApiResult<Receipt> {
        let url = self.v1(&["admin", "retention", &policy_id.to_string()])?;
        self.delete(url, optional_org_query(org_id)).await
    }

    async fn run_retention(&self) -> ApiResult<Receipt> {
        self.post(self.v1(&["admin", "retention", "run"])?, Vec::new(), &json!({})).await
    }

    async fn search_messages(&self, request: &SearchRequest) -> ApiResult<SearchResults> {
        self.get(self.v1(&["messages"])?, request.query_pairs()).await
    }

    async fn get_message(&self, org_id: i64, message_id: &str) -> ApiResult<MessageContent> {
        self.get(self.v1(&["messages", message_id])?, org_query(org_id)).await
    }

    async fn message_thread(&self, org_id: i64, message_id: &str) -> ApiResult<Vec<MessageHit>> {
        self.get(self.v1(&["messages", message_id, "thread"])?, org_query(org_id)).await
    }

    async fn message_headers(&self, org_id: i64, message_id: &str) -> ApiResult<Vec<HeaderField>> {
        self.get(self.v1(&["messages", message_id, "headers"])?, org_query(org_id)).await
    }

    async fn preview_redacted(&self, org_id: i64, message_id: &str) -> ApiResult<RedactedPreview> {
        let url = self.v1(&["messages", message_id, "preview-redacted"])?;
        self.get(url, org_query(org_id)).await
    }

    async fn pii_scan(&self, org_id: i64, message_id: &str) -> ApiResult<PiiScan> {
        self.get(self.v1(&["messages", message_id, "pii-scan"])?, org_query(org_id)).await
    }

    async fn verify_message(&self, org_id: i64, message_id: &str) -> ApiResult<IntegrityReport> {
        self.get(self.v1(&["messages", message_id, "verify"])?, org_query(org_id)).await
    }

    async fn download(&self, download_url: &str) -> ApiResult<Vec<u8>> {
        let url = match Url::parse(download_url) {
            Ok(absolute) => absolute,
            Err(_) => {
                let segments: Vec<&str> = download_url.split('/').filter(|s| !s.is_empty()).collect();
                self.url(&segments)?
            }
        };

        let response = self.request(Method::GET, url, &Vec::new()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
