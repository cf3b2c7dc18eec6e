//! Entity profiles: how each backend collection maps onto table rows
//!
//! One generic source serves every entity; a profile supplies the endpoint
//! paths, the server-to-client field mapping, the table columns and the
//! envelope each mutation is wrapped in.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::io::HttpMethod;
use crate::record::{Column, Record, Value};

/// Which backend service hosts an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Device network configuration API
    Dnc,
    /// Sensor plugin API (brix readings)
    Plugin,
}

/// Name of a field on the server side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerField {
    Named(String),
    /// The field is named after the current filter key (brix readings are
    /// stored under the location name)
    FilterKey,
}

impl ServerField {
    fn resolve<'a>(&'a self, filter: &'a str) -> &'a str {
        match self {
            ServerField::Named(name) => name,
            ServerField::FilterKey => filter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub client: String,
    pub server: ServerField,
}

/// How date fields are written into outgoing payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    Passthrough,
    /// `MM-DD-YYYY,HH:MM:SS` in UTC
    BrixStamp,
}

/// How a mutation body wraps the records it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// The record itself is the body
    Flat,
    /// `{ "<key>": record }`
    Wrapped(String),
    /// `{ "<original>": original, "<draft>": draft }`
    Pair { original: String, draft: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub method: HttpMethod,
    pub path: String,
    pub envelope: Envelope,
}

impl Mutation {
    fn new(method: HttpMethod, path: &str, envelope: Envelope) -> Self {
        Self {
            method,
            path: path.to_string(),
            envelope,
        }
    }
}

/// Configuration that specialises the generic record source
#[derive(Debug, Clone)]
pub struct EntityProfile {
    pub name: String,
    /// Key under `aliases` in the config that renames this entity for display
    pub alias_key: Option<String>,
    pub service: Service,
    pub collection_path: String,
    pub fields: Vec<FieldMapping>,
    pub columns: Vec<Column>,
    pub date_fields: Vec<String>,
    pub date_encoding: DateEncoding,
    pub update: Option<Mutation>,
    pub create: Option<Mutation>,
    pub delete: Option<Mutation>,
}

fn named(client: &str, server: &str) -> FieldMapping {
    FieldMapping {
        client: client.to_string(),
        server: ServerField::Named(server.to_string()),
    }
}

fn same(field: &str) -> FieldMapping {
    named(field, field)
}

impl EntityProfile {
    /// SSU tracking rows (`/tsdmd/:ssuid`), editable and appendable
    pub fn ssu() -> Self {
        Self {
            name: "SSU".to_string(),
            alias_key: Some("Device".to_string()),
            service: Service::Dnc,
            collection_path: "tsdmd".to_string(),
            fields: vec![
                same("ssuid"),
                same("batch"),
                named("type", "ssutype"),
                named("ver", "ssuver"),
                named("status", "ssustatus"),
                same("client"),
                same("location"),
                same("remarks"),
                same("adate"),
            ],
            columns: vec![
                Column::new("id", "S/N"),
                Column::new("ssuid", "ID"),
                Column::new("batch", "Batch"),
                Column::new("type", "Type"),
                Column::new("ver", "Version"),
                Column::new("status", "Status"),
                Column::new("client", "Client"),
                Column::new("location", "Location"),
                Column::new("remarks", "Remarks"),
                Column::new("adate", "Date"),
            ],
            date_fields: vec!["adate".to_string()],
            date_encoding: DateEncoding::Passthrough,
            update: Some(Mutation::new(
                HttpMethod::Put,
                "ssu",
                Envelope::Pair {
                    original: "edata".to_string(),
                    draft: "ndata".to_string(),
                },
            )),
            create: Some(Mutation::new(
                HttpMethod::Post,
                "assu",
                Envelope::Wrapped("ssdata".to_string()),
            )),
            delete: None,
        }
    }

    /// Hardware tracking rows (`/thwmr/:hwsl`), read only
    pub fn hardware() -> Self {
        Self {
            name: "Hardware".to_string(),
            alias_key: Some("Stock".to_string()),
            service: Service::Dnc,
            collection_path: "thwmr".to_string(),
            fields: vec![
                same("hwsl"),
                same("boardrev"),
                same("fwver"),
                same("tech"),
                same("network"),
                same("region"),
                same("remarks"),
                same("adate"),
                named("user", "userid"),
            ],
            columns: vec![
                Column::new("id", "S/N"),
                Column::new("hwsl", "HW Serial"),
                Column::new("boardrev", "Board Revision"),
                Column::new("fwver", "Fw.Ver"),
                Column::new("tech", "Technology"),
                Column::new("network", "Network"),
                Column::new("region", "Region"),
                Column::new("remarks", "Remarks"),
                Column::new("adate", "Date"),
                Column::derived("actions", "Actions"),
            ],
            date_fields: vec!["adate".to_string()],
            date_encoding: DateEncoding::Passthrough,
            update: None,
            create: None,
            delete: None,
        }
    }

    /// Brix readings per location (`/brix/:location` on the plugin service)
    pub fn brix() -> Self {
        Self {
            name: "Brix".to_string(),
            alias_key: None,
            service: Service::Plugin,
            collection_path: "brix".to_string(),
            fields: vec![
                FieldMapping {
                    client: "brix".to_string(),
                    server: ServerField::FilterKey,
                },
                named("date", "rdate"),
            ],
            columns: vec![
                Column::new("id", "SlNo"),
                Column::new("brix", "Brix"),
                Column::new("date", "Date/Time"),
                Column::derived("actions", "Actions"),
            ],
            date_fields: vec!["date".to_string()],
            date_encoding: DateEncoding::BrixStamp,
            update: Some(Mutation::new(
                HttpMethod::Put,
                "brix",
                Envelope::Pair {
                    original: "data".to_string(),
                    draft: "new".to_string(),
                },
            )),
            create: None,
            delete: Some(Mutation::new(HttpMethod::Delete, "brix", Envelope::Flat)),
        }
    }

    /// Map one server item onto a row; the id is assigned by the caller
    pub fn map_row(&self, filter: &str, item: &JsonValue) -> Record {
        let mut record = Record::new(0);
        for mapping in &self.fields {
            let server = mapping.server.resolve(filter);
            let value = item.get(server).map(Value::from_json).unwrap_or_default();
            record.fields.insert(mapping.client.clone(), value);
        }
        record
    }

    /// Render a row with server field names, encoding dates for the wire
    pub fn to_payload(&self, filter: &str, record: &Record) -> Map<String, JsonValue> {
        let mut payload = Map::new();
        for mapping in &self.fields {
            let server = mapping.server.resolve(filter).to_string();
            let value = record.get(&mapping.client).cloned().unwrap_or_default();
            let value = if self.date_fields.contains(&mapping.client) {
                encode_date(&value, self.date_encoding)
            } else {
                value
            };
            payload.insert(server, value.to_json());
        }
        payload
    }

    /// Body for a mutation carrying `draft` and optionally the original row
    pub fn build_body(
        &self,
        mutation: &Mutation,
        filter: &str,
        original: Option<&Record>,
        draft: &Record,
    ) -> JsonValue {
        let draft_payload = JsonValue::Object(self.to_payload(filter, draft));
        match &mutation.envelope {
            Envelope::Flat => draft_payload,
            Envelope::Wrapped(key) => {
                let mut body = Map::new();
                body.insert(key.clone(), draft_payload);
                JsonValue::Object(body)
            }
            Envelope::Pair {
                original: original_key,
                draft: draft_key,
            } => {
                let original_payload = original
                    .map(|o| JsonValue::Object(self.to_payload(filter, o)))
                    .unwrap_or(JsonValue::Null);
                let mut body = Map::new();
                body.insert(original_key.clone(), original_payload);
                body.insert(draft_key.clone(), draft_payload);
                JsonValue::Object(body)
            }
        }
    }

    /// Columns that appear in an export
    pub fn export_columns(&self) -> Vec<Column> {
        self.columns.iter().filter(|c| !c.derived).cloned().collect()
    }
}

/// Encode a date value; values that do not parse as a timestamp pass through
pub fn encode_date(value: &Value, encoding: DateEncoding) -> Value {
    let (DateEncoding::BrixStamp, Value::Text(text)) = (encoding, value) else {
        return value.clone();
    };
    match parse_timestamp(text) {
        Some(ts) => Value::Text(ts.format("%m-%d-%Y,%H:%M:%S").to_string()),
        None => value.clone(),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}
