use crate::domain::model::{EventList, Issue, Page, PullRequest, Repository, SearchResults};
use crate::domain::pull_request_filter::PullRequestFilter;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Issue tracker (Jira)
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn search(&self, jql: &str) -> Result<SearchResults>;
    async fn get_issue(&self, key: &str) -> Result<Issue>;
}

/// Code review host (Bitbucket Server)
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn list_pull_requests(
        &self,
        project: &str,
        repo: &str,
        filter: &PullRequestFilter,
    ) -> Result<Page<PullRequest>>;

    async fn list_recent_repositories(&self) -> Result<Page<Repository>>;
}

/// 日曆來源；失敗由呼叫端視為「沒有會議」
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn list_events(&self, time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Result<EventList>;
}
