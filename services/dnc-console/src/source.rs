//! Remote record source: collections and mutations over the REST backend

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::config::ApiConfig;
use crate::entity::{EntityProfile, Mutation, Service};
use crate::io::{endpoint, HttpClient};
use crate::record::{assign_display_ids, Record};
use crate::session::SessionContext;

/// Server acknowledgement of a mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub message: Option<String>,
}

impl Ack {
    /// Read the acknowledgement body; bodies without a message are accepted
    pub fn from_body(body: &str) -> Self {
        let message = match serde_json::from_str::<JsonValue>(body) {
            Ok(JsonValue::String(s)) => Some(s),
            Ok(JsonValue::Object(map)) => map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            Ok(_) => None,
            Err(_) => {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        };
        Self { message }
    }
}

/// Collection reads and single-record mutations for one entity
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn profile(&self) -> &EntityProfile;

    /// Fetch the collection scoped to `filter`, ids assigned `1..=N`
    async fn fetch_collection(&self, filter: &str) -> crate::Result<Vec<Record>>;

    /// Fetch the collection and return the row with display id `id`
    async fn fetch_one(&self, filter: &str, id: u32) -> crate::Result<Record> {
        self.fetch_collection(filter)
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(crate::DncError::UnknownRow { id })
    }

    async fn create(&self, filter: &str, draft: &Record) -> crate::Result<Ack>;

    async fn update(&self, filter: &str, original: &Record, draft: &Record)
        -> crate::Result<Ack>;

    async fn delete(&self, filter: &str, record: &Record) -> crate::Result<Ack>;
}

/// The single REST implementation, specialised by an [`EntityProfile`]
pub struct RestRecordSource {
    profile: EntityProfile,
    base_url: String,
    http: Arc<dyn HttpClient>,
    session: Arc<SessionContext>,
}

impl std::fmt::Debug for RestRecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestRecordSource")
            .field("entity", &self.profile.name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestRecordSource {
    pub fn new(
        profile: EntityProfile,
        base_url: impl Into<String>,
        http: Arc<dyn HttpClient>,
        session: Arc<SessionContext>,
    ) -> Self {
        let base_url = base_url.into();
        tracing::debug!(
            "Created {} record source at {}",
            profile.name,
            base_url
        );
        Self {
            profile,
            base_url,
            http,
            session,
        }
    }

    /// Pick the base URL for the profile's service from configuration
    pub fn from_config(
        profile: EntityProfile,
        api: &ApiConfig,
        http: Arc<dyn HttpClient>,
        session: Arc<SessionContext>,
    ) -> Self {
        let base_url = match profile.service {
            Service::Dnc => api.dnc_url.clone(),
            Service::Plugin => api.plugin_url.clone(),
        };
        Self::new(profile, base_url, http, session)
    }

    fn mutation(&self, mutation: &Option<Mutation>, operation: &'static str) -> crate::Result<Mutation> {
        mutation.clone().ok_or_else(|| crate::DncError::Unsupported {
            entity: self.profile.name.clone(),
            operation,
        })
    }

    async fn send(&self, mutation: &Mutation, body: &JsonValue) -> crate::Result<Ack> {
        let url = endpoint(&self.base_url, &[&mutation.path])?;
        let response = self
            .http
            .send_json(mutation.method, &url, self.session.bearer(), body)
            .await?;
        let body = response.into_body()?;
        Ok(Ack::from_body(&body))
    }
}

#[async_trait]
impl RecordSource for RestRecordSource {
    fn profile(&self) -> &EntityProfile {
        &self.profile
    }

    async fn fetch_collection(&self, filter: &str) -> crate::Result<Vec<Record>> {
        let url = endpoint(&self.base_url, &[&self.profile.collection_path, filter])?;
        let body = self.http.get(&url, self.session.bearer()).await?.into_body()?;
        let items: Vec<JsonValue> = serde_json::from_str(&body)?;

        let mut records: Vec<Record> = items
            .iter()
            .map(|item| self.profile.map_row(filter, item))
            .collect();
        assign_display_ids(&mut records);

        tracing::debug!(
            "Fetched {} {} rows for {:?}",
            records.len(),
            self.profile.name,
            filter
        );
        Ok(records)
    }

    async fn create(&self, filter: &str, draft: &Record) -> crate::Result<Ack> {
        let mutation = self.mutation(&self.profile.create, "create")?;
        let body = self.profile.build_body(&mutation, filter, None, draft);
        self.send(&mutation, &body).await
    }

    async fn update(
        &self,
        filter: &str,
        original: &Record,
        draft: &Record,
    ) -> crate::Result<Ack> {
        let mutation = self.mutation(&self.profile.update, "update")?;
        let body = self
            .profile
            .build_body(&mutation, filter, Some(original), draft);
        self.send(&mutation, &body).await
    }

    async fn delete(&self, filter: &str, record: &Record) -> crate::Result<Ack> {
        let mutation = self.mutation(&self.profile.delete, "delete")?;
        let body = self.profile.build_body(&mutation, filter, None, record);
        self.send(&mutation, &body).await
    }
}
