use crate::config::settings::RawSettings;
use crate::utils::error::{ReportError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 選用的 TOML 設定檔，欄位皆可省略，CLI 參數優先
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub login: Option<String>,
    pub password: Option<String>,
    pub user: Option<String>,
    pub format: Option<String>,
    pub routines: Option<Vec<String>>,
    pub jira: Option<JiraSection>,
    pub bitbucket: Option<ServiceSection>,
    pub calendar: Option<CalendarSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSection {
    pub host: Option<String>,
    pub base_path: Option<String>,
    pub port: Option<u16>,
    pub ssl: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraSection {
    pub host: Option<String>,
    pub base_path: Option<String>,
    pub port: Option<u16>,
    pub ssl: Option<bool>,
    pub project: Option<String>,
    pub in_progress_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarSection {
    pub enabled: Option<bool>,
    pub credentials_path: Option<PathBuf>,
    pub token_path: Option<PathBuf>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading config file {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| ReportError::ConfigParseError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn into_settings(self) -> RawSettings {
        let jira = self.jira.unwrap_or_default();
        let bitbucket = self.bitbucket.unwrap_or_default();
        let calendar = self.calendar.unwrap_or_default();

        RawSettings {
            login: self.login,
            password: self.password,
            user: self.user,
            jira_host: jira.host,
            jira_base_path: jira.base_path,
            jira_port: jira.port,
            jira_ssl: jira.ssl,
            jira_project: jira.project,
            in_progress_status: jira.in_progress_status,
            bitbucket_host: bitbucket.host,
            bitbucket_base_path: bitbucket.base_path,
            bitbucket_port: bitbucket.port,
            bitbucket_ssl: bitbucket.ssl,
            routines: self.routines,
            format: self.format,
            calendar_enabled: calendar.enabled,
            calendar_credentials: calendar.credentials_path,
            calendar_token: calendar.token_path,
        }
    }
}

/// 替換 `${VAR}`；未設定的變數保留原字串
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigParseError {
        message: e.to_string(),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let content = r#"
login = "jane.doe"
password = "secret"
format = "json"
routines = ["Check mail", "Review backlog"]

[jira]
host = "jira.example.com"
base_path = "/rest/api/2/"
project = "VST"
in_progress_status = "In Progress"

[bitbucket]
host = "bitbucket.example.com"
port = 7990
ssl = false

[calendar]
enabled = false
"#;

        let settings = FileConfig::from_toml_str(content).unwrap().into_settings();

        assert_eq!(settings.login.as_deref(), Some("jane.doe"));
        assert_eq!(settings.format.as_deref(), Some("json"));
        assert_eq!(settings.routines.as_ref().map(Vec::len), Some(2));
        assert_eq!(settings.jira_base_path.as_deref(), Some("/rest/api/2/"));
        assert_eq!(settings.jira_project.as_deref(), Some("VST"));
        assert_eq!(settings.in_progress_status.as_deref(), Some("In Progress"));
        assert_eq!(settings.bitbucket_port, Some(7990));
        assert_eq!(settings.bitbucket_ssl, Some(false));
        assert_eq!(settings.jira_ssl, None);
        assert_eq!(settings.calendar_enabled, Some(false));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let settings = FileConfig::from_toml_str("").unwrap().into_settings();
        assert_eq!(settings, RawSettings::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("DAILY_REPORT_TEST_FILE_PASSWORD", "from-env");
        let content = r#"
password = "${DAILY_REPORT_TEST_FILE_PASSWORD}"
user = "${DAILY_REPORT_TEST_UNSET_VARIABLE}"
"#;

        let config = FileConfig::from_toml_str(content).unwrap();
        assert_eq!(config.password.as_deref(), Some("from-env"));
        assert_eq!(
            config.user.as_deref(),
            Some("${DAILY_REPORT_TEST_UNSET_VARIABLE}")
        );
    }

    #[test]
    fn test_invalid_toml() {
        let result = FileConfig::from_toml_str("login = ");
        assert!(matches!(result, Err(ReportError::ConfigParseError { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "login = \"file.user\"\n[jira]\nhost = \"jira.example.com\"").unwrap();

        let settings = FileConfig::from_file(file.path()).unwrap().into_settings();
        assert_eq!(settings.login.as_deref(), Some("file.user"));
        assert_eq!(settings.jira_host.as_deref(), Some("jira.example.com"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = FileConfig::from_file("/nonexistent/daily-report.toml");
        assert!(matches!(result, Err(ReportError::IoError(_))));
    }
}
