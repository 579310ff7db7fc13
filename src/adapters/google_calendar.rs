use crate::domain::model::EventList;
use crate::domain::ports::CalendarSource;
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use url::Url;

pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
pub const DEFAULT_CREDENTIALS_PATH: &str = "data/google_calendar_credentials.json";
pub const DEFAULT_TOKEN_PATH: &str = "data/google_calendar_token.json";

/// 距離過期不到 60 秒就先換新 token
const REFRESH_MARGIN_MS: i64 = 60_000;

#[cfg(unix)]
const TOKEN_FILE_MODE: u32 = 0o600;

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<OAuthClientSecret>,
    web: Option<OAuthClientSecret>,
}

/// Google Cloud Console 下載的 OAuth client 設定
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub auth_uri: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl OAuthClientSecret {
    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("urn:ietf:wg:oauth:2.0:oob")
    }

    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    pub fn authorization_url(&self) -> Result<Url> {
        let auth_uri = self.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI);
        let mut url = Url::parse(auth_uri).map_err(|e| ReportError::CalendarAuthorizationError {
            message: format!("Invalid auth_uri {}: {}", auth_uri, e),
        })?;

        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("scope", CALENDAR_READONLY_SCOPE)
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri());
        Ok(url)
    }
}

/// 寫入磁碟的 token，格式與 googleapis 的 token.json 相同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// epoch 毫秒
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    pub fn expires_within(&self, now_ms: i64, margin_ms: i64) -> bool {
        self.expiry_date
            .map(|expiry| expiry <= now_ms + margin_ms)
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, now_ms: i64, previous_refresh_token: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            scope: self.scope,
            token_type: self.token_type,
            expiry_date: self.expires_in.map(|seconds| now_ms + seconds * 1000),
        }
    }
}

/// 取得使用者在授權頁面拿到的 code
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn request_code(&self, auth_url: &Url) -> Result<String>;
}

/// 在終端機顯示授權網址並從 stdin 讀取 code
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

#[async_trait]
impl AuthorizationPrompt for StdinPrompt {
    async fn request_code(&self, auth_url: &Url) -> Result<String> {
        let auth_url = auth_url.to_string();

        // stdin 讀取會阻塞，移到 blocking 執行緒
        tokio::task::spawn_blocking(move || read_code_from_terminal(&auth_url))
            .await
            .map_err(|e| ReportError::CalendarAuthorizationError {
                message: format!("Authorization prompt failed: {}", e),
            })?
    }
}

fn read_code_from_terminal(auth_url: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    writeln!(stderr, "Authorize this app by visiting this url:\n{}", auth_url)?;
    write!(stderr, "Enter the code from that page here: ")?;
    stderr.flush()?;

    let mut code = String::new();
    std::io::stdin().lock().read_line(&mut code)?;
    let code = code.trim().to_string();

    if code.is_empty() {
        return Err(ReportError::CalendarAuthorizationError {
            message: "No authorization code entered".to_string(),
        });
    }
    Ok(code)
}

pub struct GoogleCalendarClient<P: AuthorizationPrompt = StdinPrompt> {
    credentials_path: PathBuf,
    token_path: PathBuf,
    api_base: String,
    prompt: P,
    client: Client,
    token: Mutex<Option<StoredToken>>,
}

impl GoogleCalendarClient<StdinPrompt> {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            api_base: DEFAULT_CALENDAR_API_BASE.to_string(),
            prompt: StdinPrompt,
            client: Client::new(),
            token: Mutex::new(None),
        }
    }
}

impl<P: AuthorizationPrompt> GoogleCalendarClient<P> {
    pub fn with_prompt<Q: AuthorizationPrompt>(self, prompt: Q) -> GoogleCalendarClient<Q> {
        GoogleCalendarClient {
            credentials_path: self.credentials_path,
            token_path: self.token_path,
            api_base: self.api_base,
            prompt,
            client: self.client,
            token: self.token,
        }
    }

    /// 必須以 `/` 結尾，例如 `https://www.googleapis.com/calendar/v3/`
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// 每個程序只授權一次；過期的 token 會用 refresh token 換新
    async fn access_token(&self) -> Result<String> {
        let now_ms = Utc::now().timestamp_millis();
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.expires_within(now_ms, REFRESH_MARGIN_MS) {
                return Ok(token.access_token.clone());
            }
        }

        let secret = self.load_client_secret().await?;

        let candidate = match cached.take() {
            Some(token) => Some(token),
            None => self.read_stored_token().await?,
        };

        let token = match candidate {
            Some(token) if !token.expires_within(now_ms, REFRESH_MARGIN_MS) => token,
            Some(StoredToken {
                refresh_token: Some(refresh_token),
                ..
            }) => {
                tracing::info!("🔄 Calendar token expired, refreshing");
                self.refresh_token(&secret, refresh_token).await?
            }
            _ => self.authorize_interactively(&secret).await?,
        };

        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn load_client_secret(&self) -> Result<OAuthClientSecret> {
        let content = tokio::fs::read_to_string(&self.credentials_path)
            .await
            .map_err(|e| ReportError::CalendarAuthorizationError {
                message: format!(
                    "Cannot read credentials file {}: {}",
                    self.credentials_path.display(),
                    e
                ),
            })?;

        let file: ClientSecretFile =
            serde_json::from_str(&content).map_err(|e| ReportError::CalendarAuthorizationError {
                message: format!("Invalid credentials file: {}", e),
            })?;

        file.installed
            .or(file.web)
            .ok_or_else(|| ReportError::CalendarAuthorizationError {
                message: "Credentials file has neither an \"installed\" nor a \"web\" client".to_string(),
            })
    }

    async fn read_stored_token(&self) -> Result<Option<StoredToken>> {
        let content = match tokio::fs::read_to_string(&self.token_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable calendar token {}: {}",
                    self.token_path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn authorize_interactively(&self, secret: &OAuthClientSecret) -> Result<StoredToken> {
        let auth_url = secret.authorization_url()?;
        let code = self.prompt.request_code(&auth_url).await?;

        let params = [
            ("code", code.as_str()),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("redirect_uri", secret.redirect_uri()),
            ("grant_type", "authorization_code"),
        ];
        let token = self.request_token(secret, &params, None).await?;

        self.save_token(&token).await;
        Ok(token)
    }

    async fn refresh_token(&self, secret: &OAuthClientSecret, refresh_token: String) -> Result<StoredToken> {
        let params = [
            ("refresh_token", refresh_token.as_str()),
            ("client_id", secret.client_id.as_str()),
            ("client_secret", secret.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let token = self
            .request_token(secret, &params, Some(refresh_token.clone()))
            .await?;

        self.save_token(&token).await;
        Ok(token)
    }

    async fn request_token(
        &self,
        secret: &OAuthClientSecret,
        params: &[(&str, &str)],
        previous_refresh_token: Option<String>,
    ) -> Result<StoredToken> {
        let response = self.client.post(secret.token_uri()).form(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ReportError::CalendarAuthorizationError {
                message: format!("Token endpoint returned {}: {}", status, body),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ReportError::MalformedResponseError {
                url: secret.token_uri().to_string(),
                reason: e.to_string(),
                body,
            })?;

        Ok(token.into_stored(Utc::now().timestamp_millis(), previous_refresh_token))
    }

    /// 寫檔失敗只記錄警告，本次執行仍可使用記憶體中的 token
    async fn save_token(&self, token: &StoredToken) {
        if let Err(e) = write_token(&self.token_path, token).await {
            tracing::warn!(
                "Failed to store calendar token to {}: {}",
                self.token_path.display(),
                e
            );
        } else {
            tracing::info!("💾 Calendar token stored to {}", self.token_path.display());
        }
    }

    fn events_url(&self) -> Result<Url> {
        let base = Url::parse(&self.api_base).map_err(|e| ReportError::InvalidConfigValueError {
            field: "calendarApiBase".to_string(),
            value: self.api_base.clone(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        base.join("calendars/primary/events")
            .map_err(|e| ReportError::InvalidConfigValueError {
                field: "calendarApiBase".to_string(),
                value: self.api_base.clone(),
                reason: format!("Invalid URL format: {}", e),
            })
    }
}

async fn write_token(path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string(token)?;

    // token 內含 refresh token，只允許擁有者讀寫
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(TOKEN_FILE_MODE);

    let mut file = options.open(path).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // 既有檔案的權限不受 mode() 影響
        file.set_permissions(std::fs::Permissions::from_mode(TOKEN_FILE_MODE))
            .await?;
    }
    file.write_all(json.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[async_trait]
impl<P: AuthorizationPrompt> CalendarSource for GoogleCalendarClient<P> {
    async fn list_events(&self, time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Result<EventList> {
        let access_token = self.access_token().await?;

        let mut url = self.events_url()?;
        url.query_pairs_mut()
            .append_pair("timeMin", &time_min.to_rfc3339_opts(SecondsFormat::Millis, true))
            .append_pair("timeMax", &time_max.to_rfc3339_opts(SecondsFormat::Millis, true))
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).bearer_auth(access_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ReportError::CalendarAuthorizationError {
                message: format!("Calendar API returned {}: {}", status, body),
            });
        }
        if !status.is_success() {
            return Err(ReportError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ReportError::MalformedResponseError {
            url: url.to_string(),
            reason: e.to_string(),
            body,
        })
    }
}
