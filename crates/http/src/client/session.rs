//! Session controller
//!
//! Owns the [`TokenStore`] and the signed-in [`User`]. All writes to the
//! credential pair go through here, under the refresh lock, so concurrent
//! 401s collapse into a single reissue: a caller that acquires the lock after
//! the pair was rotated sees a different access token and reuses the new
//! pair instead of calling the reissue endpoint again.
//!
//! Lifecycle changes are published as [`SessionEvent`]s; navigation is left
//! to whoever subscribes.

use super::{ApiRequest, ClientError, Transport, decode};
use crate::types::{
    AuthResponse, LoginRequest, RefreshResponse, RefreshTokenBody, RegisterRequest,
};
use dashboard_core::{CredentialPair, TokenKey, TokenStore, User};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 16;

/// Navigation targets for session events
pub mod routes {
    /// Where the user is sent to authenticate
    pub const LOGIN: &str = "/auth/login";

    /// Landing page after sign-in when no return URL applies
    pub const DEFAULT_LANDING: &str = "/dashboards";

    /// The return URL when present and not the root, the default landing otherwise
    pub fn landing_for(return_url: Option<&str>) -> String {
        match return_url.map(str::trim) {
            Some(url) if !url.is_empty() && url != "/" => url.to_string(),
            _ => DEFAULT_LANDING.to_string(),
        }
    }
}

/// Session lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Login or registration succeeded
    SignedIn { user: User, redirect_to: String },
    /// The credential pair was reissued
    Refreshed,
    /// The user logged out
    SignedOut,
    /// The session is gone and the user has to log in again
    LoginRequired,
}

impl SessionEvent {
    /// Route a listener should navigate to
    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            Self::SignedIn { redirect_to, .. } => Some(redirect_to),
            Self::SignedOut | Self::LoginRequired => Some(routes::LOGIN),
            Self::Refreshed => None,
        }
    }
}

/// Outcome of [`SessionController::restore_session`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// Credentials were reissued; the user is known when the backend sent it
    Authenticated { user: Option<User> },
    LoginRequired,
}

/// Outcome of a successful login or registration
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: User,
    pub redirect_to: String,
}

pub struct SessionController {
    transport: Arc<Transport>,
    store: Arc<dyn TokenStore>,
    user: RwLock<Option<User>>,
    refresh_lock: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub(crate) fn new(transport: Arc<Transport>, store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transport,
            store,
            user: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    /// Access token attached to outgoing requests.
    ///
    /// Only a complete pair yields a token; an orphaned access token is
    /// never sent.
    pub fn access_token(&self) -> Result<Option<String>, ClientError> {
        Ok(CredentialPair::load(self.store.as_ref())?.map(|pair| pair.access_token))
    }

    /// Currently signed-in user
    pub fn user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a complete credential pair is stored
    pub fn is_authenticated(&self) -> bool {
        matches!(CredentialPair::load(self.store.as_ref()), Ok(Some(_)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Re-establish the session from stored credentials on startup.
    ///
    /// Without a complete pair, or when the reissue fails for any reason,
    /// the store is cleared and [`SessionEvent::LoginRequired`] is emitted.
    pub async fn restore_session(&self) -> Result<SessionStatus, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        let Some(pair) = CredentialPair::load(self.store.as_ref())? else {
            debug!("No stored credentials to restore");
            self.terminate()?;
            return Ok(SessionStatus::LoginRequired);
        };

        match self.reissue(&pair.refresh_token).await {
            Ok(response) => {
                self.rotate(response)?;
                info!("Session restored");
                Ok(SessionStatus::Authenticated { user: self.user() })
            }
            Err(err) => {
                debug!(error = %err, "Session restore failed");
                self.terminate()?;
                Ok(SessionStatus::LoginRequired)
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// A rejected login returns [`ClientError::InvalidCredentials`] and leaves
    /// any existing session as it was.
    pub async fn login(
        &self,
        credentials: &LoginRequest,
        return_url: Option<&str>,
    ) -> Result<SignedIn, ClientError> {
        credentials.validate()?;
        let response = self.authenticate("/v1/auth/login", credentials).await?;
        self.sign_in(response, return_url).await
    }

    /// Create an account and sign in with it
    pub async fn register(
        &self,
        details: &RegisterRequest,
        return_url: Option<&str>,
    ) -> Result<SignedIn, ClientError> {
        details.validate()?;
        let response = self.authenticate("/v1/auth/register", details).await?;
        self.sign_in(response, return_url).await
    }

    /// Revoke the refresh token on a best-effort basis, then clear the session.
    ///
    /// The local session is cleared and [`SessionEvent::SignedOut`] emitted
    /// even when the server call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;

        match self.store.get(TokenKey::Refresh) {
            Ok(Some(refresh_token)) => self.revoke(&refresh_token).await,
            Ok(None) => debug!("No refresh token to revoke"),
            Err(err) => debug!(error = %err, "Could not read refresh token for logout"),
        }

        let cleared = self.store.clear();
        self.set_user(None);
        info!("Signed out");
        let _ = self.events.send(SessionEvent::SignedOut);
        cleared.map_err(ClientError::from)
    }

    /// Reissue credentials after a 401 on a request sent with `stale_access`.
    ///
    /// Returns the pair to retry with, or `None` once the session has been
    /// terminated. Only one reissue runs at a time; callers that queued
    /// behind it reuse its result.
    pub async fn refresh(
        &self,
        stale_access: Option<&str>,
    ) -> Result<Option<CredentialPair>, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        let Some(current) = CredentialPair::load(self.store.as_ref())? else {
            self.terminate()?;
            return Ok(None);
        };

        if stale_access != Some(current.access_token.as_str()) {
            debug!("Credentials already rotated, reusing");
            return Ok(Some(current));
        }

        match self.reissue(&current.refresh_token).await {
            Ok(response) => {
                let pair = self.rotate(response)?;
                info!("Credentials reissued");
                Ok(Some(pair))
            }
            Err(err) => {
                debug!(error = %err, "Credential reissue failed");
                self.terminate()?;
                Ok(None)
            }
        }
    }

    /// Drop the session after an unrecoverable authorization failure
    pub fn terminate(&self) -> Result<(), ClientError> {
        let cleared = self.store.clear();
        self.set_user(None);
        warn!("Session expired, login required");
        let _ = self.events.send(SessionEvent::LoginRequired);
        cleared.map_err(ClientError::from)
    }

    pub(crate) fn sync_user(&self, updated: &User) {
        let mut user = self.user.write().unwrap_or_else(PoisonError::into_inner);
        if user.as_ref().is_some_and(|current| current.id == updated.id) {
            *user = Some(updated.clone());
        }
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    async fn authenticate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ClientError> {
        let request = ApiRequest::post(path).json(body)?;
        let response = self.transport.dispatch(&request, None).await?;
        match decode(response).await {
            Err(ClientError::AuthenticationFailed(message)) => {
                Err(ClientError::InvalidCredentials(message))
            }
            other => other,
        }
    }

    async fn sign_in(
        &self,
        response: AuthResponse,
        return_url: Option<&str>,
    ) -> Result<SignedIn, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        self.store.set_pair(&response.tokens.into_pair())?;
        self.set_user(Some(response.user.clone()));

        let signed_in = SignedIn {
            user: response.user,
            redirect_to: routes::landing_for(return_url),
        };
        info!(user_id = %signed_in.user.id, "Signed in");
        let _ = self.events.send(SessionEvent::SignedIn {
            user: signed_in.user.clone(),
            redirect_to: signed_in.redirect_to.clone(),
        });
        Ok(signed_in)
    }

    async fn reissue(&self, refresh_token: &str) -> Result<RefreshResponse, ClientError> {
        let request = ApiRequest::post("/v1/auth/refresh-tokens")
            .json(&RefreshTokenBody { refresh_token })?;
        let response = self.transport.dispatch(&request, None).await?;
        decode(response).await
    }

    /// Persist a reissued pair; caller holds the refresh lock
    fn rotate(&self, response: RefreshResponse) -> Result<CredentialPair, ClientError> {
        let pair = response.tokens.into_pair();
        self.store.set_pair(&pair)?;
        if let Some(user) = response.user {
            self.set_user(Some(user));
        }
        let _ = self.events.send(SessionEvent::Refreshed);
        Ok(pair)
    }

    async fn revoke(&self, refresh_token: &str) {
        let body = RefreshTokenBody { refresh_token };
        let request = match ApiRequest::post("/v1/auth/logout").json(&body) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "Could not encode logout request");
                return;
            }
        };
        match self.transport.dispatch(&request, None).await {
            Ok(response) if response.status().is_success() => debug!("Refresh token revoked"),
            Ok(response) => debug!(status = response.status().as_u16(), "Logout rejected"),
            Err(err) => debug!(error = %err, "Logout request failed"),
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
