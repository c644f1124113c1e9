// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::PtokyoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Credentials, Session, SignUpOutcome, User};

/// Adapter for the backend's email/password authentication.
///
/// Failures are reported as [`PtokyoError::Auth`] with a message suitable
/// for showing inline on a sign-in form.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Returns the current session, if any.
    async fn session(&self) -> Option<Session>;

    /// Returns the signed-in user, if any.
    async fn current_user(&self) -> Option<User> {
        self.session().await.map(|s| s.user)
    }

    /// Watches session changes (sign-in, sign-out).
    fn session_changes(&self) -> watch::Receiver<Option<Session>>;

    /// Signs in with email and password.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, PtokyoError>;

    /// Creates an account.
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, PtokyoError>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<(), PtokyoError>;
}
