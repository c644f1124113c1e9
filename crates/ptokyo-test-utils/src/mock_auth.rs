// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock auth adapter holding a single in-memory session.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use ptokyo_core::types::{
    AdapterType, Credentials, HealthStatus, Session, SignUpOutcome, User,
};
use ptokyo_core::{AuthAdapter, PluginAdapter, PtokyoError};

/// Builds a session for `user_id` with a fake access token.
pub fn session_for(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        refresh_token: None,
        expires_at: None,
        user: User {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
        },
    }
}

/// An [`AuthAdapter`] that signs anyone in unless told to reject.
pub struct MockAuth {
    session: watch::Sender<Option<Session>>,
    rejection: Mutex<Option<String>>,
    require_confirmation: bool,
}

impl MockAuth {
    /// No session; sign-up requires email confirmation.
    pub fn signed_out() -> Self {
        Self {
            session: watch::Sender::new(None),
            rejection: Mutex::new(None),
            require_confirmation: true,
        }
    }

    /// Already signed in as `user_id`.
    pub fn signed_in(user_id: &str) -> Self {
        let auth = Self::signed_out();
        auth.session.send_replace(Some(session_for(user_id)));
        auth
    }

    /// Sign-up returns a session right away instead of asking for confirmation.
    pub fn auto_confirm(mut self) -> Self {
        self.require_confirmation = false;
        self
    }

    /// Make sign-in and sign-up fail with `message` until cleared with `None`.
    pub fn reject_with(&self, message: Option<&str>) {
        *self.rejection.lock().unwrap_or_else(PoisonError::into_inner) =
            message.map(str::to_string);
    }

    fn check_rejection(&self) -> Result<(), PtokyoError> {
        match self
            .rejection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(message) => Err(PtokyoError::Auth { message }),
            None => Ok(()),
        }
    }
}

fn user_id_for(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[async_trait]
impl PluginAdapter for MockAuth {
    fn name(&self) -> &str {
        "mock-auth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, PtokyoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PtokyoError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for MockAuth {
    async fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn session_changes(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, PtokyoError> {
        self.check_rejection()?;
        let session = session_for(&user_id_for(&credentials.email));
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, PtokyoError> {
        self.check_rejection()?;
        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }
        let session = session_for(&user_id_for(&credentials.email));
        self.session.send_replace(Some(session.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_out(&self) -> Result<(), PtokyoError> {
        self.session.send_replace(None);
        Ok(())
    }
}
