use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Argument \"{field}\" is missing or is empty. Example, {example} .")]
    MissingArgumentError { field: String, example: String },

    #[error("Invalid value for \"{field}\" ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigParseError { message: String },

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatusError {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {url} ({reason}): {body}")]
    MalformedResponseError {
        url: String,
        reason: String,
        body: String,
    },

    #[error("Calendar authorization failed: {message}")]
    CalendarAuthorizationError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

/// 錯誤分類，對應 CLI 的處理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 參數驗證錯誤：在任何網路呼叫前中止
    Argument,
    /// 傳輸層錯誤：整個執行中止
    Transport,
    /// 回應無法解析
    Response,
    /// 日曆授權錯誤：由組裝器就地吸收
    Calendar,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::MissingArgumentError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigParseError { .. } => ErrorCategory::Argument,
            ReportError::ApiError(_) | ReportError::IoError(_) | ReportError::HttpStatusError { .. } => {
                ErrorCategory::Transport
            }
            // 執行期才會出現：來源回傳的資料無法組成下一個請求
            ReportError::SerializationError(_)
            | ReportError::MalformedResponseError { .. }
            | ReportError::ValidationError { .. } => ErrorCategory::Response,
            ReportError::CalendarAuthorizationError { .. } => ErrorCategory::Calendar,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Argument => 2,
            _ => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::MissingArgumentError { .. } => self.to_string(),
            ReportError::InvalidConfigValueError { field, reason, .. } => {
                format!("Argument \"{}\" is invalid: {}", field, reason)
            }
            ReportError::HttpStatusError { url, status, .. } => {
                format!("Request to {} was rejected with HTTP {}", url, status)
            }
            ReportError::MalformedResponseError { url, body, .. } => {
                format!("Unexpected response from {}:\n{}", url, body)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ReportError::MissingArgumentError { .. } | ReportError::InvalidConfigValueError { .. } => {
                "Run with --help to see the required arguments"
            }
            ReportError::ConfigParseError { .. } => "Check the syntax of the configuration file",
            ReportError::HttpStatusError { status: 401, .. }
            | ReportError::HttpStatusError { status: 403, .. } => {
                "Check --login and --password for the service"
            }
            ReportError::HttpStatusError { .. } | ReportError::MalformedResponseError { .. } => {
                "Check the host and base path settings for the service"
            }
            ReportError::ApiError(_) => "Check network connectivity and the host/port settings",
            ReportError::CalendarAuthorizationError { .. } => {
                "Delete the stored calendar token and authorize again"
            }
            _ => "Re-run with --verbose for details",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
