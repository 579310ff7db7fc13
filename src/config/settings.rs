use crate::adapters::bitbucket::DEFAULT_BITBUCKET_BASE_PATH;
use crate::adapters::google_calendar::{DEFAULT_CREDENTIALS_PATH, DEFAULT_TOKEN_PATH};
use crate::adapters::http::{Credentials, ServiceEndpoint, DEFAULT_HTTPS_PORT};
use crate::adapters::jira::DEFAULT_JIRA_BASE_PATH;
use crate::core::assembler::ReportSettings;
use crate::core::formatter::OutputFormat;
use crate::core::queries::DEFAULT_IN_PROGRESS_STATUS;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{
    validate_base_path, validate_host, validate_range, validate_required_argument, validate_required_field,
};
use std::path::PathBuf;

/// 尚未驗證的設定值；CLI 與設定檔各自轉成這個型別後再合併
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSettings {
    pub login: Option<String>,
    pub password: Option<String>,
    pub user: Option<String>,
    pub jira_host: Option<String>,
    pub jira_base_path: Option<String>,
    pub jira_port: Option<u16>,
    pub jira_ssl: Option<bool>,
    pub jira_project: Option<String>,
    pub in_progress_status: Option<String>,
    pub bitbucket_host: Option<String>,
    pub bitbucket_base_path: Option<String>,
    pub bitbucket_port: Option<u16>,
    pub bitbucket_ssl: Option<bool>,
    pub routines: Option<Vec<String>>,
    pub format: Option<String>,
    pub calendar_enabled: Option<bool>,
    pub calendar_credentials: Option<PathBuf>,
    pub calendar_token: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarConfig {
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
}

/// 驗證完成的設定，直接交給各個來源的建構子
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub credentials: Credentials,
    pub user: String,
    pub jira: ServiceEndpoint,
    pub bitbucket: ServiceEndpoint,
    pub jira_project: Option<String>,
    pub in_progress_status: String,
    pub routines: Vec<String>,
    pub format: OutputFormat,
    pub calendar: Option<CalendarConfig>,
}

impl RawSettings {
    /// 以 self 為優先，缺少的欄位由 fallback 補上
    pub fn merge(self, fallback: RawSettings) -> RawSettings {
        RawSettings {
            login: self.login.or(fallback.login),
            password: self.password.or(fallback.password),
            user: self.user.or(fallback.user),
            jira_host: self.jira_host.or(fallback.jira_host),
            jira_base_path: self.jira_base_path.or(fallback.jira_base_path),
            jira_port: self.jira_port.or(fallback.jira_port),
            jira_ssl: self.jira_ssl.or(fallback.jira_ssl),
            jira_project: self.jira_project.or(fallback.jira_project),
            in_progress_status: self.in_progress_status.or(fallback.in_progress_status),
            bitbucket_host: self.bitbucket_host.or(fallback.bitbucket_host),
            bitbucket_base_path: self.bitbucket_base_path.or(fallback.bitbucket_base_path),
            bitbucket_port: self.bitbucket_port.or(fallback.bitbucket_port),
            bitbucket_ssl: self.bitbucket_ssl.or(fallback.bitbucket_ssl),
            routines: self.routines.or(fallback.routines),
            format: self.format.or(fallback.format),
            calendar_enabled: self.calendar_enabled.or(fallback.calendar_enabled),
            calendar_credentials: self.calendar_credentials.or(fallback.calendar_credentials),
            calendar_token: self.calendar_token.or(fallback.calendar_token),
        }
    }

    pub fn resolve(self) -> Result<ReportConfig> {
        let login = validate_required_argument("login", "--login=my.username", &self.login)?.to_string();
        // 密碼可以是空字串，但必須提供
        let password = validate_required_field("password", "--password=\"123456\"", &self.password)?.clone();
        let bitbucket_host = validate_required_argument(
            "bitbucketHost",
            "--bitbucketHost=bitbucket.example.com",
            &self.bitbucket_host,
        )?
        .to_string();
        let jira_host =
            validate_required_argument("jiraHost", "--jiraHost=jira.example.com", &self.jira_host)?.to_string();

        let user = match self.user {
            Some(user) if user.trim().is_empty() => {
                return Err(ReportError::InvalidConfigValueError {
                    field: "user".to_string(),
                    value: user,
                    reason: "is mentioned, but is empty. Example, --user=some.one .".to_string(),
                });
            }
            Some(user) => user,
            None => login.clone(),
        };

        let jira_base_path = self
            .jira_base_path
            .unwrap_or_else(|| DEFAULT_JIRA_BASE_PATH.to_string());
        let bitbucket_base_path = self
            .bitbucket_base_path
            .unwrap_or_else(|| DEFAULT_BITBUCKET_BASE_PATH.to_string());
        let jira_port = self.jira_port.unwrap_or(DEFAULT_HTTPS_PORT);
        let bitbucket_port = self.bitbucket_port.unwrap_or(DEFAULT_HTTPS_PORT);

        validate_host("jiraHost", &jira_host)?;
        validate_host("bitbucketHost", &bitbucket_host)?;
        validate_base_path("jiraBasePath", &jira_base_path)?;
        validate_base_path("bitBucketBasePath", &bitbucket_base_path)?;
        validate_range("jiraPort", jira_port, 1, u16::MAX)?;
        validate_range("bitbucketPort", bitbucket_port, 1, u16::MAX)?;

        let jira = ServiceEndpoint::new(jira_host, jira_base_path)
            .with_port(jira_port)
            .with_ssl(self.jira_ssl.unwrap_or(true));
        let bitbucket = ServiceEndpoint::new(bitbucket_host, bitbucket_base_path)
            .with_port(bitbucket_port)
            .with_ssl(self.bitbucket_ssl.unwrap_or(true));

        let calendar = if self.calendar_enabled.unwrap_or(true) {
            Some(CalendarConfig {
                credentials_path: self
                    .calendar_credentials
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_PATH)),
                token_path: self
                    .calendar_token
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            })
        } else {
            None
        };

        Ok(ReportConfig {
            credentials: Credentials::new(login, password),
            user,
            jira,
            bitbucket,
            jira_project: self.jira_project.filter(|project| !project.trim().is_empty()),
            in_progress_status: self
                .in_progress_status
                .unwrap_or_else(|| DEFAULT_IN_PROGRESS_STATUS.to_string()),
            routines: self.routines.unwrap_or_default(),
            format: self
                .format
                .as_deref()
                .map(OutputFormat::from_flag)
                .unwrap_or_default(),
            calendar,
        })
    }
}

impl ReportConfig {
    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            login: self.credentials.login.clone(),
            user: self.user.clone(),
            routines: self.routines.clone(),
            project: self.jira_project.clone(),
            in_progress_status: self.in_progress_status.clone(),
        }
    }
}
