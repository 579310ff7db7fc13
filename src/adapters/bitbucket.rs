use crate::adapters::http::{BasicAuthClient, Credentials, ServiceEndpoint};
use crate::domain::model::{Page, PullRequest, Repository};
use crate::domain::ports::ReviewSource;
use crate::domain::pull_request_filter::PullRequestFilter;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;

pub const DEFAULT_BITBUCKET_BASE_PATH: &str = "/bitbucket/rest/api/latest/";

pub struct BitbucketClient {
    http: BasicAuthClient,
}

impl BitbucketClient {
    pub fn new(endpoint: ServiceEndpoint, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            http: BasicAuthClient::new(endpoint, credentials)?,
        })
    }
}

#[async_trait]
impl ReviewSource for BitbucketClient {
    async fn list_pull_requests(
        &self,
        project: &str,
        repo: &str,
        filter: &PullRequestFilter,
    ) -> Result<Page<PullRequest>> {
        if project.is_empty() || repo.is_empty() {
            return Err(ReportError::ValidationError {
                message: "Project key and repository slug are required".to_string(),
            });
        }

        let mut url = self.http.url("projects")?;
        url.path_segments_mut()
            .map_err(|_| ReportError::ValidationError {
                message: format!("Cannot build pull request URL for {}/{}", project, repo),
            })?
            .extend(&[project, "repos", repo, "pull-requests", ""]);
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in filter.to_query_pairs() {
                query.append_pair(&key, &value);
            }
        }

        self.http.get_json(url).await
    }

    async fn list_recent_repositories(&self) -> Result<Page<Repository>> {
        let url = self.http.url("profile/recent/repos")?;
        self.http.get_json(url).await
    }
}
