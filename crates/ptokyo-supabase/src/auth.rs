// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email and password auth against the backend's auth service.
//!
//! The session lives in a watch channel. Signing in or out also swaps the
//! bearer token on the shared [`SupabaseClient`], so REST calls made after a
//! sign-in run as that user.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use ptokyo_core::{
    AdapterType, AuthAdapter, Credentials, HealthStatus, PluginAdapter, PtokyoError, Session,
    SignUpOutcome, User,
};

use crate::client::{SupabaseClient, failure_text, transport_error};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(t: TokenResponse) -> Self {
        Session {
            access_token: t.access_token,
            refresh_token: t.refresh_token,
            expires_at: t.expires_at,
            user: t.user,
        }
    }
}

/// Parses a sign-up body. A body without an access token means the backend
/// sent a confirmation link instead of opening a session.
fn sign_up_outcome(body: serde_json::Value) -> Result<SignUpOutcome, PtokyoError> {
    if body.get("access_token").is_none() {
        return Ok(SignUpOutcome::ConfirmationRequired);
    }
    let token: TokenResponse = serde_json::from_value(body)
        .map_err(|e| PtokyoError::Auth {
            message: format!("unexpected sign-up response: {e}"),
        })?;
    Ok(SignUpOutcome::SignedIn(token.into()))
}

/// [`AuthAdapter`] for one backend project.
pub struct SupabaseAuth {
    client: SupabaseClient,
    session_tx: watch::Sender<Option<Session>>,
}

impl SupabaseAuth {
    pub fn new(client: SupabaseClient) -> Self {
        let (session_tx, _) = watch::channel(None);
        Self { client, session_tx }
    }

    /// Adopt a session saved by an earlier run. Expired sessions are ignored.
    pub fn restore(&self, session: Session, now_unix: i64) -> bool {
        if session.expires_at.is_some_and(|exp| exp <= now_unix) {
            info!(user_id = %session.user.id, "saved session expired");
            return false;
        }
        info!(user_id = %session.user.id, "session restored");
        self.publish(Some(session));
        true
    }

    fn publish(&self, session: Option<Session>) {
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        self.session_tx.send_replace(session);
    }

    async fn auth_failure(response: reqwest::Response) -> PtokyoError {
        PtokyoError::Auth {
            message: failure_text(response).await,
        }
    }
}

#[async_trait]
impl PluginAdapter for SupabaseAuth {
    fn name(&self) -> &str {
        "supabase-auth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, PtokyoError> {
        let url = self.client.auth_url("health");
        match self.client.request(Method::GET, &url).send().await {
            Ok(r) if r.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(r) => Ok(HealthStatus::Degraded(format!("status {}", r.status()))),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PtokyoError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for SupabaseAuth {
    async fn session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, PtokyoError> {
        let url = self.client.auth_url("token");
        let response = self
            .client
            .request(Method::POST, &url)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await
            .map_err(|e| transport_error("sign-in request failed", e))?;
        if !response.status().is_success() {
            return Err(Self::auth_failure(response).await);
        }
        let token: TokenResponse = response.json().await.map_err(|e| PtokyoError::Auth {
            message: format!("unexpected sign-in response: {e}"),
        })?;
        let session: Session = token.into();
        info!(user_id = %session.user.id, "signed in");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, PtokyoError> {
        let url = self.client.auth_url("signup");
        let response = self
            .client
            .request(Method::POST, &url)
            .json(&json!({ "email": credentials.email, "password": credentials.password }))
            .send()
            .await
            .map_err(|e| transport_error("sign-up request failed", e))?;
        if !response.status().is_success() {
            return Err(Self::auth_failure(response).await);
        }
        let body: serde_json::Value = response.json().await.map_err(|e| PtokyoError::Auth {
            message: format!("unexpected sign-up response: {e}"),
        })?;
        let outcome = sign_up_outcome(body)?;
        match &outcome {
            SignUpOutcome::SignedIn(session) => {
                info!(user_id = %session.user.id, "signed up and signed in");
                self.publish(Some(session.clone()));
            }
            SignUpOutcome::ConfirmationRequired => info!("sign-up awaiting email confirmation"),
        }
        Ok(outcome)
    }

    async fn sign_out(&self) -> Result<(), PtokyoError> {
        if self.session_tx.borrow().is_none() {
            return Ok(());
        }
        let url = self.client.auth_url("logout");
        let result = self.client.request(Method::POST, &url).send().await;
        // The local session ends whatever the server says.
        self.publish(None);
        match result {
            Ok(r) if r.status().is_success() => {
                info!("signed out");
                Ok(())
            }
            Ok(r) => {
                let err = Self::auth_failure(r).await;
                warn!(error = %err, "server-side sign-out failed");
                Err(err)
            }
            Err(e) => Err(transport_error("sign-out request failed", e)),
        }
    }
}
