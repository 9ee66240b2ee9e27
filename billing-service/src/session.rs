//! Bearer session shared by every backend request.
//!
//! When the backend answers 401, callers hand back the token they used.
//! Only the first of them refreshes; the rest wait on the same gate and
//! pick up the new token, or the same failure.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::{BillingError, BillingResult};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    #[serde(rename = "accessToken", alias = "token", alias = "access_token")]
    pub access_token: String,

    #[serde(rename = "refreshToken", alias = "refresh_token", default)]
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

// Tokens never reach logs
impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Exchanges a refresh token for a new token pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> BillingResult<SessionTokens>;
}

pub struct SessionManager {
    tokens: RwLock<Option<SessionTokens>>,
    refresh_gate: Mutex<()>,
    refresher: Arc<dyn TokenRefresher>,
}

impl SessionManager {
    pub fn new(refresher: Arc<dyn TokenRefresher>, initial: Option<SessionTokens>) -> Self {
        Self {
            tokens: RwLock::new(initial),
            refresh_gate: Mutex::new(()),
            refresher,
        }
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    pub async fn tokens(&self) -> Option<SessionTokens> {
        self.tokens.read().await.clone()
    }

    pub async fn set_tokens(&self, tokens: SessionTokens) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn clear(&self) {
        *self.tokens.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Obtain a token to retry with after `stale` was rejected.
    ///
    /// # Errors
    ///
    /// `BillingError::Authentication` when there is no session, no refresh
    /// token, or the refresh itself fails. A failed refresh ends the session.
    pub async fn refresh_after_unauthorized(&self, stale: Option<&str>) -> BillingResult<String> {
        let _gate = self.refresh_gate.lock().await;

        let Some(current) = self.tokens().await else {
            return Err(BillingError::Authentication(
                "No hay una sesión activa".to_string(),
            ));
        };

        // Someone else refreshed while we waited
        if stale != Some(current.access_token.as_str()) {
            return Ok(current.access_token);
        }

        let Some(refresh_token) = current.refresh_token else {
            self.clear().await;
            return Err(BillingError::Authentication(
                "La sesión expiró y no hay token de renovación".to_string(),
            ));
        };

        match self.refresher.refresh(&refresh_token).await {
            Ok(mut renewed) => {
                if renewed.refresh_token.is_none() {
                    renewed.refresh_token = Some(refresh_token);
                }
                let access_token = renewed.access_token.clone();
                self.set_tokens(renewed).await;
                info!("Session refreshed");
                Ok(access_token)
            }
            Err(e) => {
                self.clear().await;
                warn!(error = %e, "Session refresh failed, session cleared");
                Err(BillingError::Authentication(format!(
                    "No fue posible renovar la sesión: {e}"
                )))
            }
        }
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
