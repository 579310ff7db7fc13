use crate::utils::error::{ReportError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Declined,
    Merged,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestOrder {
    Newest,
    Oldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Author,
    Reviewer,
    Participant,
}

impl PullRequestDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestDirection::Incoming => "INCOMING",
            PullRequestDirection::Outgoing => "OUTGOING",
        }
    }
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "OPEN",
            PullRequestState::Declined => "DECLINED",
            PullRequestState::Merged => "MERGED",
            PullRequestState::All => "ALL",
        }
    }
}

impl PullRequestOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestOrder::Newest => "NEWEST",
            PullRequestOrder::Oldest => "OLDEST",
        }
    }
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Author => "AUTHOR",
            ParticipantRole::Reviewer => "REVIEWER",
            ParticipantRole::Participant => "PARTICIPANT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantFilter {
    pub username: String,
    pub role: Option<ParticipantRole>,
    pub approved: Option<bool>,
}

/// Bitbucket pull request 查詢條件；未設定的欄位不會出現在 query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFilter {
    pub direction: Option<PullRequestDirection>,
    /// 目標分支，例如 `refs/heads/master`
    pub at: Option<String>,
    pub state: Option<PullRequestState>,
    pub order: Option<PullRequestOrder>,
    pub with_attributes: Option<bool>,
    pub with_properties: Option<bool>,
    pub participants: Vec<ParticipantFilter>,
}

impl PullRequestFilter {
    /// 等待指定使用者 review 的 open pull requests
    pub fn reviewing(username: &str) -> Result<Self> {
        let mut filter = Self {
            direction: Some(PullRequestDirection::Outgoing),
            state: Some(PullRequestState::Open),
            with_attributes: Some(false),
            with_properties: Some(false),
            ..Default::default()
        };
        filter.add_participant(username, Some(ParticipantRole::Reviewer), None)?;
        Ok(filter)
    }

    pub fn add_participant(
        &mut self,
        username: &str,
        role: Option<ParticipantRole>,
        approved: Option<bool>,
    ) -> Result<()> {
        if username.is_empty() {
            return Err(ReportError::ValidationError {
                message: "Pull request participant username cannot be empty".to_string(),
            });
        }

        self.participants.push(ParticipantFilter {
            username: username.to_string(),
            role,
            approved,
        });
        Ok(())
    }

    /// 參與者以 1 起算的索引序列化：`username.1`、`role.1`、`approved.1`
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(direction) = self.direction {
            pairs.push(("direction".to_string(), direction.as_str().to_string()));
        }
        if let Some(at) = &self.at {
            pairs.push(("at".to_string(), at.clone()));
        }
        if let Some(state) = self.state {
            pairs.push(("state".to_string(), state.as_str().to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order".to_string(), order.as_str().to_string()));
        }
        if let Some(with_attributes) = self.with_attributes {
            pairs.push(("withAttributes".to_string(), with_attributes.to_string()));
        }
        if let Some(with_properties) = self.with_properties {
            pairs.push(("withProperties".to_string(), with_properties.to_string()));
        }

        for (index, participant) in self.participants.iter().enumerate() {
            let n = index + 1;
            pairs.push((format!("username.{}", n), participant.username.clone()));
            if let Some(role) = participant.role {
                pairs.push((format!("role.{}", n), role.as_str().to_string()));
            }
            if let Some(approved) = participant.approved {
                pairs.push((format!("approved.{}", n), approved.to_string()));
            }
        }

        pairs
    }
}
