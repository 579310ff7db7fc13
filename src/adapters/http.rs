use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{validate_base_path, validate_host, validate_non_empty_string, validate_range, Validate};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use url::Url;

pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// 一個 REST 服務的位置：host、port、base path 與是否使用 TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub ssl: bool,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_HTTPS_PORT,
            base_path: base_path.into(),
            ssl: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// base path 已保證以 `/` 結尾，相對路徑開頭的 `/` 會被去掉
    pub fn url(&self, path: &str) -> Result<Url> {
        let scheme = if self.ssl { "https" } else { "http" };
        let raw = format!(
            "{}://{}:{}{}{}",
            scheme,
            self.host,
            self.port,
            self.base_path,
            path.trim_start_matches('/')
        );

        Url::parse(&raw).map_err(|e| ReportError::InvalidConfigValueError {
            field: "host".to_string(),
            value: raw.clone(),
            reason: format!("Invalid URL format: {}", e),
        })
    }
}

impl Validate for ServiceEndpoint {
    fn validate(&self) -> Result<()> {
        validate_host("host", &self.host)?;
        validate_base_path("basePath", &self.base_path)?;
        validate_range("port", self.port, 1, u16::MAX)?;
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

impl Validate for Credentials {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("login", &self.login)
    }
}

/// 以 Basic Auth 呼叫 REST API 並把回應解析成指定型別
#[derive(Debug, Clone)]
pub struct BasicAuthClient {
    endpoint: ServiceEndpoint,
    credentials: Credentials,
    client: Client,
}

impl BasicAuthClient {
    pub fn new(endpoint: ServiceEndpoint, credentials: Credentials) -> Result<Self> {
        endpoint.validate()?;
        credentials.validate()?;

        Ok(Self {
            endpoint,
            credentials,
            client: Client::new(),
        })
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.endpoint.url(path)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.credentials.login, Some(&self.credentials.password))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Response {} from {} ({} bytes)", status, url, body.len());

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
