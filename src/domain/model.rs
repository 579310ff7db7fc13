use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Jira 中代表「被阻擋」的 inward 關係名稱
pub const BLOCKED_BY_RELATION: &str = "is blocked by";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: String,
    #[serde(default, rename = "issuelinks")]
    pub issue_links: Vec<IssueLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    #[serde(rename = "type")]
    pub link_type: IssueLinkType,
    #[serde(default)]
    pub inward_issue: Option<LinkedIssue>,
    #[serde(default)]
    pub outward_issue: Option<LinkedIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueLinkType {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inward: String,
    #[serde(default)]
    pub outward: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedIssue {
    pub key: String,
}

impl IssueLink {
    /// 若此連結表示「被阻擋」，回傳阻擋者的 issue key
    pub fn blocking_key(&self) -> Option<&str> {
        if self.link_type.inward != BLOCKED_BY_RELATION {
            return None;
        }
        self.inward_issue.as_ref().map(|issue| issue.key.as_str())
    }
}

impl Issue {
    pub fn blocking_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.issue_links.iter().filter_map(IssueLink::blocking_key)
    }
}

/// Bitbucket 分頁回應，只取 `values`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(default)]
    pub id: Option<u64>,
    pub title: String,
    pub author: PullRequestAuthor,
    #[serde(default)]
    pub from_ref: Option<PullRequestRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestAuthor {
    pub user: BitbucketUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitbucketUser {
    #[serde(default)]
    pub name: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub repository: Repository,
}

impl PullRequest {
    pub fn author_display_name(&self) -> &str {
        &self.author.user.display_name
    }

    pub fn source_repository_name(&self) -> Option<&str> {
        self.from_ref.as_ref().map(|r| r.repository.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub slug: String,
    pub name: String,
    pub project: ProjectRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start: EventStart,
    #[serde(default)]
    pub summary: String,
}

/// 一般事件帶 `dateTime`，整天事件只有 `date`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStart {
    #[serde(default)]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl CalendarEvent {
    /// 事件開始時間（換算到指定時區）；整天事件視為 00:00
    pub fn start_time_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveTime> {
        match (&self.start.date_time, &self.start.date) {
            (Some(date_time), _) => Some(date_time.with_timezone(tz).time()),
            (None, Some(_)) => NaiveTime::from_hms_opt(0, 0, 0),
            (None, None) => None,
        }
    }
}

/// 每日站會報告；每個序列保留來源回傳的順序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub daily_routines: Vec<String>,
    pub my_tickets_in_progress: Vec<String>,
    pub my_tickets_done_yesterday: Vec<String>,
    pub my_tickets_cancelled_yesterday: Vec<String>,
    pub tickets_created_by_me_yesterday: Vec<String>,
    #[serde(rename = "reviewingPRs")]
    pub reviewing_prs: Vec<String>,
    pub blocked_tickets: Vec<String>,
    pub daily_meetings: Vec<String>,
}
