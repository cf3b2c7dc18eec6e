//! User role and status changes

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::io::{endpoint, HttpClient, HttpMethod};
use crate::session::SessionContext;
use crate::source::Ack;

/// Access roles, ordered by level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    OrgUser,
    OrgAdmin,
    AppUser,
    AppAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::OrgUser, Role::OrgAdmin, Role::AppUser, Role::AppAdmin];

    pub fn level(self) -> u8 {
        match self {
            Role::OrgUser => 1,
            Role::OrgAdmin => 2,
            Role::AppUser => 3,
            Role::AppAdmin => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::OrgUser => "Org-User",
            Role::OrgAdmin => "Org-Admin",
            Role::AppUser => "App-User",
            Role::AppAdmin => "App-Admin",
        }
    }

    /// Resolve a role label; unknown labels get the lowest level
    pub fn from_label_or_default(label: &str) -> Role {
        label.parse().unwrap_or(Role::OrgUser)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role {:?}", s))
    }
}

/// Body of `PUT /chrole`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    /// Sent as a string, as the backend expects
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub email: String,
    pub uname: String,
}

impl RoleChange {
    pub fn new(role: Role, status: Option<String>, email: &str, name: &str) -> Self {
        Self {
            level: role.level().to_string(),
            status,
            email: email.to_string(),
            uname: name.to_string(),
        }
    }
}

/// Client for user administration endpoints
pub struct UserAdmin {
    base_url: String,
    http: Arc<dyn HttpClient>,
    session: Arc<SessionContext>,
}

impl std::fmt::Debug for UserAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAdmin")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl UserAdmin {
    pub fn new(
        base_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            http,
            session,
        }
    }

    pub async fn change_role(&self, change: &RoleChange) -> crate::Result<Ack> {
        let url = endpoint(&self.base_url, &["chrole"])?;
        let body = serde_json::to_value(change)?;
        tracing::debug!(
            "Changing role of {} to level {}",
            change.email,
            change.level
        );
        let response = self
            .http
            .send_json(HttpMethod::Put, &url, self.session.bearer(), &body)
            .await?;
        Ok(Ack::from_body(&response.into_body()?))
    }
}
