use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use config_engine::ApiConfig;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::session::{SessionManager, SessionTokens, TokenRefresher};

/// Correlates a request with backend logs
const REQUEST_ID_HEADER: &str = "X-Request-Id";

fn build_http(timeout: Duration) -> BillingResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BillingError::Config(format!("HTTP client error: {e}")))
}

fn join(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

async fn error_for(response: Response) -> BillingError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    BillingError::Http {
        status: status.as_u16(),
        body,
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> BillingResult<T> {
    if !response.status().is_success() {
        return Err(error_for(response).await);
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// REST client for the IPS backend
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    login_path: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> BillingResult<Self> {
        Ok(Self {
            http: build_http(Duration::from_secs(config.timeout_secs))?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
            session,
        })
    }

    /// Client plus a session seeded with any tokens present in the configuration
    pub fn from_config(config: &ApiConfig) -> BillingResult<Self> {
        let refresher = HttpTokenRefresher::new(config)?;
        let initial = config
            .access_token
            .clone()
            .map(|access| SessionTokens::new(access, config.refresh_token.clone()));
        let session = Arc::new(SessionManager::new(Arc::new(refresher), initial));
        Self::new(config, session)
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        join(&self.base_url, path)
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> BillingResult<Response> {
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, path, request_id = %request_id, "Backend request");

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(REQUEST_ID_HEADER, request_id);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Send once; on 401 refresh the session and send exactly once more
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> BillingResult<Response> {
        let token = self.session.access_token().await;
        let response = self
            .dispatch(&method, path, query, body, token.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(path, "Backend rejected the session token, refreshing");
        let fresh = self
            .session
            .refresh_after_unauthorized(token.as_deref())
            .await?;

        let retry = self
            .dispatch(&method, path, query, body, Some(&fresh))
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            return Err(BillingError::Authentication(
                "El backend rechazó la sesión renovada".to_string(),
            ));
        }
        Ok(retry)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> BillingResult<T> {
        decode(self.send(Method::GET, path, query, None).await?).await
    }

    /// Single resource lookup; 404 is `Ok(None)`
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> BillingResult<Option<T>> {
        let response = self.send(Method::GET, path, &[], None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "Backend resource not found");
            return Ok(None);
        }
        decode(response).await.map(Some)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> BillingResult<T> {
        let body = serde_json::to_value(body)?;
        decode(self.send(Method::POST, path, &[], Some(&body)).await?).await
    }

    /// Exchange credentials for a token pair and start a session with it
    pub async fn login(&self, username: &str, password: &str) -> BillingResult<SessionTokens> {
        let body = json!({ "username": username, "password": password });
        let response = self
            .dispatch(&Method::POST, &self.login_path, &[], Some(&body), None)
            .await?;

        if matches!(response.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(BillingError::Authentication(
                "Usuario o contraseña incorrectos".to_string(),
            ));
        }
        let tokens: SessionTokens = decode(response).await?;
        self.session.set_tokens(tokens.clone()).await;
        Ok(tokens)
    }
}

/// Calls the backend's refresh endpoint
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    url: String,
}

impl HttpTokenRefresher {
    pub fn new(config: &ApiConfig) -> BillingResult<Self> {
        Ok(Self {
            http: build_http(Duration::from_secs(config.timeout_secs))?,
            url: join(&config.base_url, &config.refresh_path),
        })
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> BillingResult<SessionTokens> {
        let response = self
            .http
            .post(&self.url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;
        decode(response).await
    }
}
