use crate::adapters::http::{BasicAuthClient, Credentials, ServiceEndpoint};
use crate::domain::model::{Issue, SearchResults};
use crate::domain::ports::IssueSource;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;

pub const DEFAULT_JIRA_BASE_PATH: &str = "/jira/rest/api/latest/";

pub struct JiraClient {
    http: BasicAuthClient,
}

impl JiraClient {
    pub fn new(endpoint: ServiceEndpoint, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            http: BasicAuthClient::new(endpoint, credentials)?,
        })
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search(&self, jql: &str) -> Result<SearchResults> {
        let mut url = self.http.url("search")?;
        url.query_pairs_mut().append_pair("jql", jql);

        tracing::debug!("🔎 JQL: {}", jql);
        self.http.get_json(url).await
    }

    async fn get_issue(&self, key: &str) -> Result<Issue> {
        let mut url = self.http.url("issue")?;
        url.path_segments_mut()
            .map_err(|_| ReportError::ValidationError {
                message: format!("Cannot build issue URL for {}", key),
            })?
            .push(key);

        self.http.get_json(url).await
    }
}
