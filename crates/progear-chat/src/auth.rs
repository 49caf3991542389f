//! Identity token providers.
//!
//! The chat client never talks to the identity provider itself. Whatever owns
//! the sign-in flow hands the client an `AuthProvider`, and the client asks it
//! for a bearer token once per request.
use std::sync::{PoisonError, RwLock};

/// Source of the bearer credential attached to API requests.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns the current identity token, or `None` when signed out.
    ///
    /// `None` is a normal outcome, not an error.
    async fn identity_token(&self) -> Option<String>;

    /// Whether a token is currently available.
    async fn is_authenticated(&self) -> bool {
        self.identity_token().await.is_some()
    }
}

/// Fixed token, typically read from the environment or a CLI flag.
#[derive(Clone, Debug, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()).filter(|t: &String| !t.trim().is_empty()),
        }
    }

    /// A provider that is never authenticated.
    pub fn none() -> Self {
        Self { token: None }
    }

    /// Reads the token from `var`; unset or blank means signed out.
    pub fn from_env(var: &str) -> Self {
        match std::env::var(var) {
            Ok(token) => Self::new(token),
            Err(_) => Self::none(),
        }
    }
}

#[async_trait::async_trait]
impl AuthProvider for StaticToken {
    async fn identity_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Token slot updated by a sign-in flow and shared with the client.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the token produced by a completed sign-in.
    pub fn sign_in(&self, token: impl Into<String>) {
        let token = Some(token.into()).filter(|t: &String| !t.trim().is_empty());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Forgets the stored token.
    pub fn sign_out(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait::async_trait]
impl AuthProvider for TokenStore {
    async fn identity_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
