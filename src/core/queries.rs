use chrono::Weekday;

pub const DEFAULT_IN_PROGRESS_STATUS: &str = "Development in Progress";

const CURRENT_SPRINT: &str = "sprint in openSprints() AND sprint not in futureSprints()";

/// 「昨天」的回溯天數：週日看 2 天、週一看 3 天，跨過週末
pub fn lookback_days(weekday: Weekday) -> u32 {
    match weekday {
        Weekday::Sun => 2,
        Weekday::Mon => 3,
        _ => 1,
    }
}

/// 報告需要的五種 issue 查詢
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueQuery {
    BlockedByMe,
    InProgress,
    DoneRecently,
    CancelledRecently,
    CreatedByMe,
}

/// 組成 JQL 所需的參數
#[derive(Debug, Clone)]
pub struct QueryScope<'a> {
    pub user: &'a str,
    pub project: Option<&'a str>,
    pub in_progress_status: &'a str,
    pub lookback_days: u32,
}

impl IssueQuery {
    pub const ALL: [IssueQuery; 5] = [
        IssueQuery::BlockedByMe,
        IssueQuery::InProgress,
        IssueQuery::DoneRecently,
        IssueQuery::CancelledRecently,
        IssueQuery::CreatedByMe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IssueQuery::BlockedByMe => "blocked-by-me",
            IssueQuery::InProgress => "in-progress",
            IssueQuery::DoneRecently => "done-recently",
            IssueQuery::CancelledRecently => "cancelled-recently",
            IssueQuery::CreatedByMe => "created-by-me",
        }
    }

    pub fn to_jql(&self, scope: &QueryScope<'_>) -> String {
        let user = scope.user;
        let days = scope.lookback_days;

        let body = match self {
            IssueQuery::BlockedByMe => {
                format!("resolution=Unresolved AND assignee={} AND {}", user, CURRENT_SPRINT)
            }
            IssueQuery::InProgress => format!(
                "status=\"{}\" AND assignee={} AND {}",
                scope.in_progress_status, user, CURRENT_SPRINT
            ),
            IssueQuery::DoneRecently => format!(
                "resolution in (Done) AND assignee={} AND {} AND status changed during (-{}d, now())",
                user, CURRENT_SPRINT, days
            ),
            IssueQuery::CancelledRecently => format!(
                "resolution in (Cancelled, \"Cannot Reproduce\") AND assignee={} AND {} AND status changed during (-{}d, now())",
                user, CURRENT_SPRINT, days
            ),
            IssueQuery::CreatedByMe => {
                format!("creator in ({}) AND {} AND created >= -{}d", user, CURRENT_SPRINT, days)
            }
        };

        match scope.project {
            Some(project) => format!("project={} AND {}", project, body),
            None => body,
        }
    }
}
