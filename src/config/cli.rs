use crate::config::file::FileConfig;
use crate::config::settings::{RawSettings, ReportConfig};
use crate::utils::error::Result;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// 命令列參數；未給的值由設定檔補上，再退回預設值
#[derive(Clone, Parser)]
#[command(name = "daily-report")]
#[command(about = "Builds a daily standup report from Jira, Bitbucket and Google Calendar")]
pub struct CliConfig {
    #[arg(long, help = "Optional TOML file with default settings")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Login used for Jira and Bitbucket")]
    pub login: Option<String>,

    #[arg(long, env = "DAILY_REPORT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[arg(long = "bitbucketHost")]
    pub bitbucket_host: Option<String>,

    #[arg(long = "jiraHost")]
    pub jira_host: Option<String>,

    #[arg(long, help = "Report on another user (defaults to --login)")]
    pub user: Option<String>,

    #[arg(long = "bitBucketBasePath")]
    pub bitbucket_base_path: Option<String>,

    #[arg(long = "jiraBasePath")]
    pub jira_base_path: Option<String>,

    #[arg(long = "bitbucketPort")]
    pub bitbucket_port: Option<u16>,

    #[arg(long = "jiraPort")]
    pub jira_port: Option<u16>,

    #[arg(long, help = "Use plain HTTP for Jira and Bitbucket")]
    pub insecure: bool,

    #[arg(long = "jiraProject", help = "Restrict every query to one Jira project")]
    pub jira_project: Option<String>,

    #[arg(long = "inProgressStatus")]
    pub in_progress_status: Option<String>,

    #[arg(long = "routine", help = "Daily routine line, repeatable")]
    pub routines: Vec<String>,

    #[arg(long, help = "\"text\" for the standup text, anything else for JSON")]
    pub format: Option<String>,

    #[arg(long = "calendarCredentials")]
    pub calendar_credentials: Option<PathBuf>,

    #[arg(long = "calendarToken")]
    pub calendar_token: Option<PathBuf>,

    #[arg(long = "noCalendar", help = "Skip Google Calendar meetings")]
    pub no_calendar: bool,

    #[arg(long = "jsonLogs", help = "Write logs to stderr as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("bitbucket_host", &self.bitbucket_host)
            .field("jira_host", &self.jira_host)
            .field("user", &self.user)
            .field("bitbucket_base_path", &self.bitbucket_base_path)
            .field("jira_base_path", &self.jira_base_path)
            .field("bitbucket_port", &self.bitbucket_port)
            .field("jira_port", &self.jira_port)
            .field("insecure", &self.insecure)
            .field("jira_project", &self.jira_project)
            .field("in_progress_status", &self.in_progress_status)
            .field("routines", &self.routines)
            .field("format", &self.format)
            .field("calendar_credentials", &self.calendar_credentials)
            .field("calendar_token", &self.calendar_token)
            .field("no_calendar", &self.no_calendar)
            .field("json_logs", &self.json_logs)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl CliConfig {
    pub fn to_settings(&self) -> RawSettings {
        let ssl = if self.insecure { Some(false) } else { None };

        RawSettings {
            login: self.login.clone(),
            password: self.password.clone(),
            user: self.user.clone(),
            jira_host: self.jira_host.clone(),
            jira_base_path: self.jira_base_path.clone(),
            jira_port: self.jira_port,
            jira_ssl: ssl,
            jira_project: self.jira_project.clone(),
            in_progress_status: self.in_progress_status.clone(),
            bitbucket_host: self.bitbucket_host.clone(),
            bitbucket_base_path: self.bitbucket_base_path.clone(),
            bitbucket_port: self.bitbucket_port,
            bitbucket_ssl: ssl,
            routines: if self.routines.is_empty() {
                None
            } else {
                Some(self.routines.clone())
            },
            format: self.format.clone(),
            calendar_enabled: if self.no_calendar { Some(false) } else { None },
            calendar_credentials: self.calendar_credentials.clone(),
            calendar_token: self.calendar_token.clone(),
        }
    }

    /// 合併設定檔並驗證，錯誤在任何網路呼叫之前回報
    pub fn resolve(&self) -> Result<ReportConfig> {
        let settings = match &self.config {
            Some(path) => self.to_settings().merge(FileConfig::from_file(path)?.into_settings()),
            None => self.to_settings(),
        };
        settings.resolve()
    }
}
