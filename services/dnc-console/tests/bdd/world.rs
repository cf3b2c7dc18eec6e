//! BDD test world for the DNC console

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cucumber::World;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;

use dnc_console::directory::RestDirectory;
use dnc_console::entity::EntityProfile;
use dnc_console::gate::Prompt;
use dnc_console::io::{endpoint, HttpClient, HttpMethod, HttpResponse};
use dnc_console::notifier::LogNotifier;
use dnc_console::record::RowKey;
use dnc_console::session::SessionContext;
use dnc_console::source::RestRecordSource;
use dnc_console::state::new_state_handle;
use dnc_console::{DncError, Outcome, RecordTable};

pub const BASE_URL: &str = "http://dnc.test";

/// One request seen by the fake backend
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub body: Option<JsonValue>,
}

/// In-memory backend serving collections by path and logging every request
#[derive(Debug, Default)]
pub struct FakeBackend {
    collections: Mutex<HashMap<String, Vec<JsonValue>>>,
    requests: Mutex<Vec<SeenRequest>>,
    reject_mutations: AtomicBool,
}

impl FakeBackend {
    /// Add an item to the collection served at `segments`, encoded the way
    /// the console encodes request paths
    pub fn push(&self, segments: &[&str], item: JsonValue) {
        let url = endpoint(BASE_URL, segments).unwrap();
        let path = url.strip_prefix(BASE_URL).unwrap_or(&url).to_string();
        self.collections
            .lock()
            .unwrap()
            .entry(path)
            .or_default()
            .push(item);
    }

    pub fn reject_mutations(&self) {
        self.reject_mutations.store(true, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn log(&self, method: &str, url: &str, body: Option<JsonValue>) -> String {
        let path = url.strip_prefix(BASE_URL).unwrap_or(url).to_string();
        self.requests.lock().unwrap().push(SeenRequest {
            method: method.to_string(),
            path: path.clone(),
            body,
        });
        path
    }

    /// Delete bodies carry the reading time re-encoded for the wire, so a
    /// reading is identified by every other field
    fn remove_matching(&self, body: &JsonValue) {
        let Some(fields) = body.as_object() else {
            return;
        };
        for items in self.collections.lock().unwrap().values_mut() {
            if let Some(index) = items.iter().position(|item| {
                fields
                    .iter()
                    .filter(|(k, _)| k.as_str() != "rdate")
                    .all(|(k, v)| item.get(k) == Some(v))
            }) {
                items.remove(index);
                return;
            }
        }
    }
}

fn ok(body: String) -> HttpResponse {
    HttpResponse { status: 200, body }
}

#[async_trait]
impl HttpClient for FakeBackend {
    async fn get(&self, url: &str, _token: &str) -> dnc_console::Result<HttpResponse> {
        let path = self.log("GET", url, None);
        let items = self
            .collections
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or_default();
        Ok(ok(JsonValue::Array(items).to_string()))
    }

    async fn send_json(
        &self,
        method: HttpMethod,
        url: &str,
        _token: &str,
        body: &JsonValue,
    ) -> dnc_console::Result<HttpResponse> {
        self.log(&method.to_string(), url, Some(body.clone()));
        if self.reject_mutations.load(Ordering::SeqCst) {
            return Ok(HttpResponse {
                status: 500,
                body: "database unavailable".to_string(),
            });
        }
        if method == HttpMethod::Delete {
            self.remove_matching(body);
        }
        Ok(ok(r#"{"message": "done"}"#.to_string()))
    }
}

#[derive(Debug, Default, World)]
pub struct DncWorld {
    pub backend: Arc<FakeBackend>,
    pub table: Option<RecordTable>,
    pub prompt: Option<Prompt>,
    pub outcome: Option<Outcome>,
    pub last_error: Option<DncError>,
    pub remembered_key: Option<RowKey>,
    pub export_dir: Option<tempfile::TempDir>,
}

impl DncWorld {
    /// A table over the fake backend; `with_directory` wires `/org` and `/spot`
    pub fn build_table(&self, profile: EntityProfile, with_directory: bool) -> RecordTable {
        let session = Arc::new(SessionContext::with_token("tok"));
        let http: Arc<dyn HttpClient> = self.backend.clone();
        let source =
            RestRecordSource::new(profile, BASE_URL, Arc::clone(&http), Arc::clone(&session));
        let table = RecordTable::new(
            Arc::new(source),
            Arc::new(LogNotifier),
            new_state_handle(10),
            CancellationToken::new(),
        );
        if with_directory {
            table.with_directory(Arc::new(RestDirectory::new(BASE_URL, http, session)))
        } else {
            table
        }
    }

    pub fn table(&mut self) -> &mut RecordTable {
        self.table.as_mut().expect("table should be loaded")
    }

    pub fn record<T>(&mut self, result: dnc_console::Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e);
                None
            }
        }
    }
}
