//! Organisation and location option lists

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::io::{endpoint, HttpClient};
use crate::session::SessionContext;

#[derive(Debug, Deserialize)]
struct OrgItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpotItem {
    sname: String,
}

/// Source of the editor's dependent option lists
#[async_trait]
pub trait OptionDirectory: Send + Sync {
    async fn organizations(&self) -> crate::Result<Vec<String>>;

    /// Locations belonging to `org`
    async fn locations(&self, org: &str) -> crate::Result<Vec<String>>;
}

/// Directory backed by `/org` and `/spot/:org`
pub struct RestDirectory {
    base_url: String,
    http: Arc<dyn HttpClient>,
    session: Arc<SessionContext>,
}

impl std::fmt::Debug for RestDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDirectory")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestDirectory {
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
}

#[async_trait]
impl OptionDirectory for RestDirectory {
    async fn organizations(&self) -> crate::Result<Vec<String>> {
        let url = endpoint(&self.base_url, &["org"])?;
        let body = self.http.get(&url, self.session.bearer()).await?.into_body()?;
        let items: Vec<OrgItem> = serde_json::from_str(&body)?;
        tracing::debug!("Loaded {} organizations", items.len());
        Ok(items.into_iter().map(|o| o.name).collect())
    }

    async fn locations(&self, org: &str) -> crate::Result<Vec<String>> {
        let url = endpoint(&self.base_url, &["spot", org])?;
        let body = self.http.get(&url, self.session.bearer()).await?.into_body()?;
        let items: Vec<SpotItem> = serde_json::from_str(&body)?;
        tracing::debug!("Loaded {} locations for {:?}", items.len(), org);
        Ok(items.into_iter().map(|s| s.sname).collect())
    }
}
