//! Session bookkeeping: the key-value session store, the explicit
//! authentication context built from it at start-up, and the login/logout
//! transitions that are the only places that context changes.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use anyhow::Result;
use shared::protocol::UserProfile;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::{FailureReport, GatewayError},
    gateway::GatewayClient,
};

pub const AUTH_TOKEN_KEY: &str = "authtoken";
pub const NAME_KEY: &str = "name";
pub const PROFILE_PICTURE_KEY: &str = "profile_picture";
pub const LOGIN_ERROR_MESSAGE: &str = "Error doing login";

const SESSION_KEYS: [&str; 3] = [AUTH_TOKEN_KEY, NAME_KEY, PROFILE_PICTURE_KEY];

pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: StdMutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    ReceiptList,
    ReceiptUpload,
    Logout,
}

impl Route {
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Home | Self::ReceiptList | Self::ReceiptUpload)
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Opaque bearer credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSummary {
    pub name: String,
    pub picture_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResult {
    Authenticated(ProfileSummary),
    /// The backend answered 401; the session was torn down.
    Rejected,
    Failed(FailureReport),
}

pub struct AuthContext {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    token: RwLock<Option<SessionToken>>,
}

impl AuthContext {
    /// Reads the stored token once. Afterwards the context only changes via
    /// [`AuthContext::establish`] and [`AuthContext::logout`].
    pub fn from_store(store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Arc<Self> {
        let token = store.get(AUTH_TOKEN_KEY).and_then(SessionToken::new);
        info!(authenticated = token.is_some(), "session context initialized");
        Arc::new(Self {
            store,
            navigator,
            token: RwLock::new(token),
        })
    }

    pub async fn token(&self) -> Option<SessionToken> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub fn profile(&self) -> Option<ProfileSummary> {
        Some(ProfileSummary {
            name: self.store.get(NAME_KEY)?,
            picture_url: self.store.get(PROFILE_PICTURE_KEY).unwrap_or_default(),
        })
    }

    pub async fn resolve_route(&self, requested: Route) -> Route {
        let authenticated = self.is_authenticated().await;
        match requested {
            route if route.is_protected() && !authenticated => Route::Login,
            Route::Login if authenticated => Route::Home,
            route => route,
        }
    }

    pub async fn establish(&self, profile: &UserProfile) -> Result<ProfileSummary> {
        let token = SessionToken::new(profile.auth_token.clone())
            .ok_or_else(|| anyhow::anyhow!("login response carried an empty auth token"))?;

        self.store.set(AUTH_TOKEN_KEY, token.as_str())?;
        self.store.set(PROFILE_PICTURE_KEY, &profile.picture_url)?;
        self.store.set(NAME_KEY, &profile.name)?;
        *self.token.write().await = Some(token);

        info!(name = %profile.name, "session established");
        self.navigator.navigate(Route::Home);
        Ok(ProfileSummary {
            name: profile.name.clone(),
            picture_url: profile.picture_url.clone(),
        })
    }

    pub async fn login_with_credential(
        &self,
        gateway: &GatewayClient,
        credential: &str,
    ) -> LoginResult {
        if credential.trim().is_empty() {
            return LoginResult::Failed(FailureReport::new(
                LOGIN_ERROR_MESSAGE,
                vec!["missing credential value".to_string()],
            ));
        }

        match gateway.login_google(credential).await {
            Ok(profile) => match self.establish(&profile).await {
                Ok(summary) => LoginResult::Authenticated(summary),
                Err(err) => LoginResult::Failed(FailureReport::new(
                    LOGIN_ERROR_MESSAGE,
                    vec![err.to_string()],
                )),
            },
            Err(GatewayError::Unauthorized) => {
                self.logout().await;
                LoginResult::Rejected
            }
            Err(GatewayError::Application {
                message, errors, ..
            }) => {
                let mut details = vec![message];
                details.extend(errors);
                LoginResult::Failed(FailureReport::new(LOGIN_ERROR_MESSAGE, details))
            }
            Err(GatewayError::Transport { detail, .. }) => {
                LoginResult::Failed(FailureReport::new(LOGIN_ERROR_MESSAGE, vec![detail]))
            }
        }
    }

    /// Clears every session key and routes to the login view. Safe to call
    /// repeatedly.
    pub async fn logout(&self) {
        *self.token.write().await = None;
        for key in SESSION_KEYS {
            if let Err(err) = self.store.remove(key) {
                warn!(key, error = %err, "failed to clear session key");
            }
        }
        info!("session cleared");
        self.navigator.navigate(Route::Login);
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
