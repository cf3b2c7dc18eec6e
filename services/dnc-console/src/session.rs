//! Session context injected into every remote call

use serde::{Deserialize, Serialize};

/// Bearer token and identity of the signed-in user
///
/// Passed explicitly to sources; nothing in the console mutates it after
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    token: Option<String>,
    pub user: Option<String>,
    pub org: Option<String>,
}

impl SessionContext {
    pub fn new(token: Option<String>, user: Option<String>, org: Option<String>) -> Self {
        Self { token, user, org }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Token to place after `Bearer `, empty when the session has none
    pub fn bearer(&self) -> &str {
        self.token.as_deref().unwrap_or("")
    }

    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}
