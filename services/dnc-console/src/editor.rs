//! Record editor: a draft of one row plus its dependent option lists

use crate::directory::OptionDirectory;
use crate::record::{Record, RowKey, Value};

/// Field holding the organisation in editable records
pub const ORG_FIELD: &str = "client";
/// Field holding the location in editable records
pub const LOCATION_FIELD: &str = "location";

/// Free-text suggestions offered next to editor fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub statuses: Vec<String>,
    pub remarks: Vec<String>,
    pub types: Vec<String>,
}

/// Two-level dependent options: organisations, then locations of one of them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionCascade {
    organizations: Vec<String>,
    locations: Vec<String>,
    /// Organisation the location list belongs to; `None` while it is invalid
    scope: Option<String>,
}

impl OptionCascade {
    pub fn organizations(&self) -> &[String] {
        &self.organizations
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Location options are only meaningful once the organisation settled
    pub fn locations_ready(&self) -> bool {
        self.scope.is_some()
    }

    fn invalidate_locations(&mut self) {
        self.locations.clear();
        self.scope = None;
    }
}

/// A working copy of one record, independent from the table until saved
#[derive(Debug, Clone)]
pub struct RecordEditor {
    key: RowKey,
    original: Record,
    draft: Record,
    options: OptionCascade,
    suggestions: Suggestions,
}

impl RecordEditor {
    pub fn new(key: RowKey, snapshot: Record) -> Self {
        Self {
            key,
            draft: snapshot.clone(),
            original: snapshot,
            options: OptionCascade::default(),
            suggestions: Suggestions::default(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Suggestions) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn key(&self) -> RowKey {
        self.key
    }

    pub fn original(&self) -> &Record {
        &self.original
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn options(&self) -> &OptionCascade {
        &self.options
    }

    pub fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    pub fn is_dirty(&self) -> bool {
        self.original != self.draft
    }

    /// Fields whose draft value differs from the snapshot
    pub fn changed_fields(&self) -> Vec<String> {
        let mut changed: Vec<String> = self
            .draft
            .fields
            .iter()
            .filter(|(field, value)| self.original.get(field) != Some(*value))
            .map(|(field, _)| field.clone())
            .collect();
        changed.extend(
            self.original
                .fields
                .keys()
                .filter(|field| !self.draft.fields.contains_key(*field))
                .cloned(),
        );
        changed
    }

    /// Set a draft field. Changing the organisation here invalidates the
    /// location list until [`RecordEditor::select_organization`] reloads it.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let value = value.into();
        if field == ORG_FIELD && self.draft.get(ORG_FIELD) != Some(&value) {
            self.options.invalidate_locations();
        }
        self.draft.set(field, value);
    }

    /// Set a draft field from raw user input. The snapshot decides the type:
    /// only fields that already hold a number are parsed as one.
    pub fn set_input(&mut self, field: &str, input: &str) {
        let value = Value::parse_input(input, self.original.get(field));
        self.set(field, value);
    }

    /// Load organisations, then the locations of the draft's organisation.
    /// The second request is only issued after the first completes.
    pub async fn load_options(&mut self, directory: &dyn OptionDirectory) -> crate::Result<()> {
        self.options.organizations = directory.organizations().await?;
        let org = self.draft.text(ORG_FIELD);
        self.reload_locations(directory, &org).await
    }

    /// Switch the organisation, replacing the location list with the new
    /// organisation's locations and clearing a location that is not among them
    pub async fn select_organization(
        &mut self,
        org: &str,
        directory: &dyn OptionDirectory,
    ) -> crate::Result<()> {
        self.set(ORG_FIELD, org);
        self.reload_locations(directory, org).await?;

        let location = self.draft.text(LOCATION_FIELD);
        if !location.is_empty() && !self.options.locations.contains(&location) {
            tracing::debug!(
                "Clearing location {:?}: not a location of {:?}",
                location,
                org
            );
            self.draft.set(LOCATION_FIELD, Value::Null);
        }
        Ok(())
    }

    async fn reload_locations(
        &mut self,
        directory: &dyn OptionDirectory,
        org: &str,
    ) -> crate::Result<()> {
        self.options.invalidate_locations();
        if org.is_empty() {
            return Ok(());
        }
        let locations = directory.locations(org).await?;
        self.options.locations = locations;
        self.options.scope = Some(org.to_string());
        Ok(())
    }
}
