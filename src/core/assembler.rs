use crate::core::queries::{lookback_days, IssueQuery, QueryScope, DEFAULT_IN_PROGRESS_STATUS};
use crate::domain::model::{CalendarEvent, Issue, Report};
use crate::domain::ports::{CalendarSource, IssueSource, ReviewSource};
use crate::domain::pull_request_filter::PullRequestFilter;
use crate::utils::error::Result;
use chrono::{DateTime, Datelike, Local, TimeZone, Utc};

/// 組裝報告所需的設定，由 CLI 設定解析而來
#[derive(Debug, Clone)]
pub struct ReportSettings {
    /// 已登入的帳號
    pub login: String,
    /// 報告對象，預設與 login 相同
    pub user: String,
    pub routines: Vec<String>,
    pub project: Option<String>,
    pub in_progress_status: String,
}

impl ReportSettings {
    pub fn new(login: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            user: login.clone(),
            login,
            routines: Vec::new(),
            project: None,
            in_progress_status: DEFAULT_IN_PROGRESS_STATUS.to_string(),
        }
    }

    pub fn reports_on_self(&self) -> bool {
        self.user == self.login
    }

    fn scope(&self, lookback_days: u32) -> QueryScope<'_> {
        QueryScope {
            user: &self.user,
            project: self.project.as_deref(),
            in_progress_status: &self.in_progress_status,
            lookback_days,
        }
    }
}

/// 每條「被阻擋」連結各查一次阻擋者，產生一行描述
pub async fn resolve_blocked_by<I: IssueSource + ?Sized>(issue: &Issue, lookup: &I) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    for blocking_key in issue.blocking_keys() {
        let blocking = lookup.get_issue(blocking_key).await?;
        lines.push(format!(
            "\"{} {}\" is blocked by \"{} {}\"",
            issue.key, issue.fields.summary, blocking_key, blocking.fields.summary
        ));
    }

    Ok(lines)
}

pub fn meeting_line<Tz: TimeZone>(event: &CalendarEvent, tz: &Tz) -> String {
    let start = event
        .start_time_in(tz)
        .map(|time| time.format("%H:%M").to_string())
        .unwrap_or_else(|| "00:00".to_string());
    format!("Event at {} \"{}\"", start, event.summary)
}

pub struct ReportAssembler<I, R, C> {
    issues: I,
    reviews: R,
    calendar: Option<C>,
    settings: ReportSettings,
}

impl<I: IssueSource, R: ReviewSource, C: CalendarSource> ReportAssembler<I, R, C> {
    pub fn new(issues: I, reviews: R, settings: ReportSettings) -> Self {
        Self {
            issues,
            reviews,
            calendar: None,
            settings,
        }
    }

    pub fn with_calendar(mut self, calendar: C) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    pub async fn resolve_blocked_by(&self, issue: &Issue) -> Result<Vec<String>> {
        resolve_blocked_by(issue, &self.issues).await
    }

    pub async fn build_report(&self) -> Result<Report> {
        self.build_report_at(Local::now()).await
    }

    /// 依序呼叫各來源；issue 與 PR 的錯誤會中止整份報告，只有日曆例外
    pub async fn build_report_at(&self, now: DateTime<Local>) -> Result<Report> {
        let days = lookback_days(now.weekday());
        let scope = self.settings.scope(days);
        tracing::info!(
            "📋 Building report for {} (looking back {} day(s))",
            self.settings.user,
            days
        );

        let mut report = Report {
            daily_routines: self.settings.routines.clone(),
            ..Default::default()
        };

        for issue in self.search(IssueQuery::BlockedByMe, &scope).await? {
            report
                .blocked_tickets
                .extend(self.resolve_blocked_by(&issue).await?);
        }

        report.my_tickets_in_progress = self
            .search(IssueQuery::InProgress, &scope)
            .await?
            .iter()
            .map(|issue| format!("{}: {}", issue.key, issue.fields.summary))
            .collect();

        report.my_tickets_done_yesterday = issue_lines(&self.search(IssueQuery::DoneRecently, &scope).await?);
        report.my_tickets_cancelled_yesterday =
            issue_lines(&self.search(IssueQuery::CancelledRecently, &scope).await?);
        report.tickets_created_by_me_yesterday =
            issue_lines(&self.search(IssueQuery::CreatedByMe, &scope).await?);

        report.reviewing_prs = self.load_reviewing_pull_requests().await?;
        report.daily_meetings = self.load_meetings(now).await;

        tracing::info!(
            "✅ Report ready: {} in progress, {} done, {} blocked, {} PRs, {} meetings",
            report.my_tickets_in_progress.len(),
            report.my_tickets_done_yesterday.len(),
            report.blocked_tickets.len(),
            report.reviewing_prs.len(),
            report.daily_meetings.len()
        );

        Ok(report)
    }

    async fn search(&self, query: IssueQuery, scope: &QueryScope<'_>) -> Result<Vec<Issue>> {
        let results = self.issues.search(&query.to_jql(scope)).await?;
        tracing::debug!("{}: {} issue(s)", query.name(), results.issues.len());
        Ok(results.issues)
    }

    async fn load_reviewing_pull_requests(&self) -> Result<Vec<String>> {
        let repositories = self.reviews.list_recent_repositories().await?.values;
        let filter = PullRequestFilter::reviewing(&self.settings.user)?;
        let mut lines = Vec::new();

        for repository in &repositories {
            let pull_requests = self
                .reviews
                .list_pull_requests(&repository.project.key, &repository.slug, &filter)
                .await?
                .values;

            tracing::debug!(
                "{}/{}: {} pull request(s) awaiting review",
                repository.project.key,
                repository.slug,
                pull_requests.len()
            );

            lines.extend(pull_requests.iter().map(|pr| {
                format!("{}: {} ({})", repository.name, pr.title, pr.author_display_name())
            }));
        }

        Ok(lines)
    }

    async fn load_meetings(&self, now: DateTime<Local>) -> Vec<String> {
        // 日曆只能讀取已登入帳號自己的行程
        if !self.settings.reports_on_self() {
            tracing::debug!("Skipping calendar: reporting for {}", self.settings.user);
            return Vec::new();
        }

        let Some(calendar) = &self.calendar else {
            return Vec::new();
        };

        let (time_min, time_max) = day_window(now);
        match calendar.list_events(time_min, time_max).await {
            Ok(events) => events
                .items
                .iter()
                .map(|event| meeting_line(event, &Local))
                .collect(),
            Err(e) => {
                tracing::warn!("📅 Calendar unavailable, skipping meetings: {}", e);
                Vec::new()
            }
        }
    }
}

fn issue_lines(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| format!("{} {}", issue.key, issue.fields.summary))
        .collect()
}

/// 當地時間的今天 00:00:00 到 23:59:59.999
fn day_window(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let date = now.date_naive();

    let start = date
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or(now);
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|naive| Local.from_local_datetime(&naive).latest())
        .unwrap_or(now);

    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{EventList, Page, PullRequest, Repository, SearchResults};
    use crate::utils::error::ReportError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn issue(key: &str, summary: &str) -> Issue {
        serde_json::from_value(serde_json::json!({"key": key, "fields": {"summary": summary}})).unwrap()
    }

    fn blocked_issue(key: &str, summary: &str, blockers: &[&str]) -> Issue {
        let links: Vec<serde_json::Value> = blockers
            .iter()
            .map(|blocker| {
                serde_json::json!({
                    "type": {"name": "Blocks", "inward": "is blocked by", "outward": "blocks"},
                    "inwardIssue": {"key": blocker}
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({
            "key": key,
            "fields": {"summary": summary, "issuelinks": links}
        }))
        .unwrap()
    }

    #[derive(Clone, Default)]
    struct MockIssues {
        /// JQL 片段 -> 搜尋結果
        searches: Vec<(&'static str, Vec<Issue>)>,
        issues: HashMap<String, Issue>,
        queries: Arc<Mutex<Vec<String>>>,
        lookups: Arc<Mutex<Vec<String>>>,
    }

    impl MockIssues {
        fn with_search(mut self, needle: &'static str, issues: Vec<Issue>) -> Self {
            self.searches.push((needle, issues));
            self
        }

        fn with_issue(mut self, issue: Issue) -> Self {
            self.issues.insert(issue.key.clone(), issue);
            self
        }
    }

    #[async_trait]
    impl IssueSource for MockIssues {
        async fn search(&self, jql: &str) -> Result<SearchResults> {
            self.queries.lock().await.push(jql.to_string());
            let issues = self
                .searches
                .iter()
                .find(|(needle, _)| jql.contains(needle))
                .map(|(_, issues)| issues.clone())
                .unwrap_or_default();
            Ok(SearchResults { issues })
        }

        async fn get_issue(&self, key: &str) -> Result<Issue> {
            self.lookups.lock().await.push(key.to_string());
            self.issues.get(key).cloned().ok_or_else(|| ReportError::HttpStatusError {
                url: format!("issue/{}", key),
                status: 404,
                body: "Issue Does Not Exist".to_string(),
            })
        }
    }

    #[derive(Clone, Default)]
    struct MockReviews {
        repositories: Vec<Repository>,
        pull_requests: HashMap<String, Vec<PullRequest>>,
        fail_repositories: bool,
        filters: Arc<Mutex<Vec<Vec<(String, String)>>>>,
    }

    impl MockReviews {
        fn with_repository(mut self, project: &str, slug: &str, name: &str, prs: &[(&str, &str)]) -> Self {
            self.repositories.push(
                serde_json::from_value(serde_json::json!({
                    "slug": slug, "name": name, "project": {"key": project}
                }))
                .unwrap(),
            );
            let prs = prs
                .iter()
                .map(|(title, author)| {
                    serde_json::from_value(serde_json::json!({
                        "title": title,
                        "author": {"user": {"displayName": author}}
                    }))
                    .unwrap()
                })
                .collect();
            self.pull_requests.insert(slug.to_string(), prs);
            self
        }
    }

    #[async_trait]
    impl ReviewSource for MockReviews {
        async fn list_pull_requests(
            &self,
            _project: &str,
            repo: &str,
            filter: &PullRequestFilter,
        ) -> Result<Page<PullRequest>> {
            self.filters.lock().await.push(filter.to_query_pairs());
            Ok(Page {
                values: self.pull_requests.get(repo).cloned().unwrap_or_default(),
            })
        }

        async fn list_recent_repositories(&self) -> Result<Page<Repository>> {
            if self.fail_repositories {
                return Err(ReportError::MalformedResponseError {
                    url: "profile/recent/repos".to_string(),
                    reason: "expected value".to_string(),
                    body: "<html>".to_string(),
                });
            }
            Ok(Page {
                values: self.repositories.clone(),
            })
        }
    }

    #[derive(Clone)]
    struct MockCalendar {
        events: Option<Vec<CalendarEvent>>,
        calls: Arc<Mutex<usize>>,
    }

    impl MockCalendar {
        fn with_events(events: Vec<CalendarEvent>) -> Self {
            Self {
                events: Some(events),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn unauthorized() -> Self {
            Self {
                events: None,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    #[async_trait]
    impl CalendarSource for MockCalendar {
        async fn list_events(&self, time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Result<EventList> {
            assert!(time_min < time_max);
            *self.calls.lock().await += 1;
            match &self.events {
                Some(items) => Ok(EventList { items: items.clone() }),
                None => Err(ReportError::CalendarAuthorizationError {
                    message: "credentials file not found".to_string(),
                }),
            }
        }
    }

    type TestAssembler = ReportAssembler<MockIssues, MockReviews, MockCalendar>;

    /// 2024-03-06 是星期三
    fn wednesday() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap()
    }

    fn monday() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    fn local_event(summary: &str, hour: u32, minute: u32) -> CalendarEvent {
        let start = Local.with_ymd_and_hms(2024, 3, 6, hour, minute, 0).unwrap();
        serde_json::from_value(serde_json::json!({
            "summary": summary,
            "start": {"dateTime": start.to_rfc3339()}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_blocked_by_without_links() {
        let lookup = MockIssues::default();
        let lines = resolve_blocked_by(&issue("VST-1", "Fix bug"), &lookup).await.unwrap();

        assert!(lines.is_empty());
        assert!(lookup.lookups.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_blocked_by_emits_one_line_per_link() {
        let lookup = MockIssues::default()
            .with_issue(issue("VST-3", "Payment API"))
            .with_issue(issue("VST-4", "Design review"));
        let subject = blocked_issue("VST-10", "Checkout page", &["VST-3", "VST-4"]);

        let lines = resolve_blocked_by(&subject, &lookup).await.unwrap();

        assert_eq!(
            lines,
            vec![
                "\"VST-10 Checkout page\" is blocked by \"VST-3 Payment API\"".to_string(),
                "\"VST-10 Checkout page\" is blocked by \"VST-4 Design review\"".to_string(),
            ]
        );
        assert_eq!(*lookup.lookups.lock().await, vec!["VST-3", "VST-4"]);
    }

    #[tokio::test]
    async fn test_resolve_blocked_by_ignores_other_relations() {
        let subject: Issue = serde_json::from_value(serde_json::json!({
            "key": "VST-10",
            "fields": {
                "summary": "Checkout page",
                "issuelinks": [
                    {"type": {"inward": "relates to", "outward": "relates to"}, "inwardIssue": {"key": "VST-5"}},
                    {"type": {"inward": "is blocked by", "outward": "blocks"}, "outwardIssue": {"key": "VST-6"}}
                ]
            }
        }))
        .unwrap();

        let lines = resolve_blocked_by(&subject, &MockIssues::default()).await.unwrap();
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_blocked_by_propagates_lookup_error() {
        let subject = blocked_issue("VST-10", "Checkout page", &["VST-404"]);
        let result = resolve_blocked_by(&subject, &MockIssues::default()).await;
        assert!(matches!(result, Err(ReportError::HttpStatusError { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_build_report_collects_every_section_in_order() {
        let issues = MockIssues::default()
            .with_search(
                "resolution=Unresolved",
                vec![blocked_issue("VST-10", "Checkout page", &["VST-3"]), issue("VST-11", "Free")],
            )
            .with_search("status=\"Development in Progress\"", vec![issue("VST-7", "Search"), issue("VST-8", "Filters")])
            .with_search("resolution in (Done)", vec![issue("VST-1", "Fix bug")])
            .with_search("resolution in (Cancelled", vec![issue("VST-5", "Old idea")])
            .with_search("creator in", vec![issue("VST-2", "New feature")])
            .with_issue(issue("VST-3", "Payment API"));
        let reviews = MockReviews::default()
            .with_repository("CORE", "api", "API", &[("Add retry", "John Doe"), ("Bump deps", "Ann Lee")])
            .with_repository("FE", "web", "Web", &[])
            .with_repository("OPS", "infra", "Infra", &[("Terraform", "Max Roe")]);

        let mut settings = ReportSettings::new("jane.doe");
        settings.routines = vec!["Check mail".to_string()];
        let calendar = MockCalendar::with_events(vec![local_event("Standup", 9, 30)]);

        let assembler: TestAssembler =
            ReportAssembler::new(issues.clone(), reviews.clone(), settings).with_calendar(calendar);
        let report = assembler.build_report_at(wednesday()).await.unwrap();

        assert_eq!(report.daily_routines, vec!["Check mail"]);
        assert_eq!(
            report.blocked_tickets,
            vec!["\"VST-10 Checkout page\" is blocked by \"VST-3 Payment API\""]
        );
        assert_eq!(report.my_tickets_in_progress, vec!["VST-7: Search", "VST-8: Filters"]);
        assert_eq!(report.my_tickets_done_yesterday, vec!["VST-1 Fix bug"]);
        assert_eq!(report.my_tickets_cancelled_yesterday, vec!["VST-5 Old idea"]);
        assert_eq!(report.tickets_created_by_me_yesterday, vec!["VST-2 New feature"]);
        assert_eq!(
            report.reviewing_prs,
            vec![
                "API: Add retry (John Doe)",
                "API: Bump deps (Ann Lee)",
                "Infra: Terraform (Max Roe)"
            ]
        );
        assert_eq!(report.daily_meetings, vec!["Event at 09:30 \"Standup\""]);

        let queries = issues.queries.lock().await;
        assert_eq!(queries.len(), 5);
        assert!(queries[0].contains("resolution=Unresolved"));
        assert!(queries[1].contains("Development in Progress"));
        assert!(queries[2].contains("status changed during (-1d, now())"));
        assert!(queries[3].contains("status changed during (-1d, now())"));
        assert!(queries[4].contains("created >= -1d"));

        let filters = reviews.filters.lock().await;
        assert_eq!(filters.len(), 3);
        assert!(filters[0].contains(&("role.1".to_string(), "REVIEWER".to_string())));
        assert!(filters[0].contains(&("username.1".to_string(), "jane.doe".to_string())));
    }

    #[tokio::test]
    async fn test_build_report_on_monday_looks_back_three_days() {
        let issues = MockIssues::default();
        let assembler: TestAssembler =
            ReportAssembler::new(issues.clone(), MockReviews::default(), ReportSettings::new("jane.doe"));

        assembler.build_report_at(monday()).await.unwrap();

        let queries = issues.queries.lock().await;
        assert!(queries[2].contains("(-3d, now())"));
        assert!(queries[4].contains("created >= -3d"));
    }

    #[tokio::test]
    async fn test_other_user_never_fetches_calendar() {
        let calendar = MockCalendar::with_events(vec![local_event("Standup", 9, 30)]);
        let calls = calendar.calls.clone();
        let mut settings = ReportSettings::new("jane.doe");
        settings.user = "john.roe".to_string();

        let issues = MockIssues::default();
        let assembler: TestAssembler = ReportAssembler::new(issues.clone(), MockReviews::default(), settings)
            .with_calendar(calendar);
        let report = assembler.build_report_at(wednesday()).await.unwrap();

        assert!(report.daily_meetings.is_empty());
        assert_eq!(*calls.lock().await, 0);
        assert!(issues.queries.lock().await.iter().all(|jql| jql.contains("john.roe")));
    }

    #[tokio::test]
    async fn test_calendar_failure_yields_empty_meetings() {
        let calendar = MockCalendar::unauthorized();
        let calls = calendar.calls.clone();
        let assembler: TestAssembler = ReportAssembler::new(
            MockIssues::default().with_search("resolution in (Done)", vec![issue("VST-1", "Fix bug")]),
            MockReviews::default(),
            ReportSettings::new("jane.doe"),
        )
        .with_calendar(calendar);

        let report = assembler.build_report_at(wednesday()).await.unwrap();

        assert_eq!(*calls.lock().await, 1);
        assert!(report.daily_meetings.is_empty());
        assert_eq!(report.my_tickets_done_yesterday, vec!["VST-1 Fix bug"]);
    }

    #[tokio::test]
    async fn test_review_source_error_aborts_report() {
        let reviews = MockReviews {
            fail_repositories: true,
            ..Default::default()
        };
        let assembler: TestAssembler =
            ReportAssembler::new(MockIssues::default(), reviews, ReportSettings::new("jane.doe"));

        let result = assembler.build_report_at(wednesday()).await;
        assert!(matches!(result, Err(ReportError::MalformedResponseError { .. })));
    }

    #[test]
    fn test_meeting_line_format() {
        let event: CalendarEvent = serde_json::from_value(serde_json::json!({
            "summary": "Sprint planning",
            "start": {"dateTime": "2024-03-06T14:05:00+00:00"}
        }))
        .unwrap();
        assert_eq!(meeting_line(&event, &Utc), "Event at 14:05 \"Sprint planning\"");

        let all_day: CalendarEvent = serde_json::from_value(serde_json::json!({
            "summary": "Offsite",
            "start": {"date": "2024-03-06"}
        }))
        .unwrap();
        assert_eq!(meeting_line(&all_day, &Utc), "Event at 00:00 \"Offsite\"");
    }

    #[test]
    fn test_day_window_covers_whole_local_day() {
        let (start, end) = day_window(wednesday());
        let local_start = start.with_timezone(&Local);
        let local_end = end.with_timezone(&Local);

        assert_eq!(local_start.date_naive(), wednesday().date_naive());
        assert_eq!(local_start.format("%H:%M:%S").to_string(), "00:00:00");
        assert_eq!(local_end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
    }
}
