//! Record table controller: owns loaded rows, the open editor and the
//! confirmation gate, and runs every mutation as
//! confirm -> mutate -> notify -> refresh -> close.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use crate::directory::OptionDirectory;
use crate::editor::{RecordEditor, Suggestions, ORG_FIELD};
use crate::entity::EntityProfile;
use crate::error::DncError;
use crate::export;
use crate::gate::{
    ConfirmationGate, Confirmer, Decision, Operation, PendingAction, Prompt, Response,
};
use crate::notifier::{Notification, NotificationRecord, Notifier, Severity};
use crate::record::{Column, Record, RowKey};
use crate::source::{Ack, RecordSource};
use crate::state::StateHandle;

/// Wrong challenge answers tolerated by [`RecordTable::confirm_with`]
const MAX_CHALLENGE_ATTEMPTS: usize = 3;

/// How a resolved action ended
#[derive(Debug)]
pub enum Outcome {
    /// The user declined; nothing was sent
    Cancelled { operation: Operation },
    Completed { operation: Operation, ack: Ack },
    /// The mutation failed; the failure was notified and rows refreshed
    Failed { operation: Operation, error: DncError },
}

impl Outcome {
    pub fn operation(&self) -> Operation {
        match self {
            Outcome::Cancelled { operation }
            | Outcome::Completed { operation, .. }
            | Outcome::Failed { operation, .. } => *operation,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

/// Controller for one entity's table
pub struct RecordTable {
    source: Arc<dyn RecordSource>,
    notifier: Arc<dyn Notifier>,
    state: StateHandle,
    directory: Option<Arc<dyn OptionDirectory>>,
    suggestions: Suggestions,
    filter: String,
    rows: Vec<Record>,
    generation: u64,
    gate: ConfirmationGate,
    editor: Option<RecordEditor>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for RecordTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordTable")
            .field("entity", &self.entity())
            .field("filter", &self.filter)
            .field("rows", &self.rows.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl RecordTable {
    pub fn new(
        source: Arc<dyn RecordSource>,
        notifier: Arc<dyn Notifier>,
        state: StateHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            notifier,
            state,
            directory: None,
            suggestions: Suggestions::default(),
            filter: String::new(),
            rows: Vec::new(),
            generation: 0,
            gate: ConfirmationGate::new(),
            editor: None,
            cancel,
        }
    }

    /// Directory used to fill the editor's organisation and location lists
    pub fn with_directory(mut self, directory: Arc<dyn OptionDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Suggestions) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn entity(&self) -> &str {
        &self.source.profile().name
    }

    pub fn profile(&self) -> &EntityProfile {
        self.source.profile()
    }

    pub fn columns(&self) -> &[Column] {
        &self.source.profile().columns
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.gate.pending()
    }

    pub fn editor(&self) -> Option<&RecordEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> crate::Result<&mut RecordEditor> {
        self.editor.as_mut().ok_or(DncError::NoEditor)
    }

    /// Token that closes the table from another task
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Initial load; same as switching to `filter`
    pub async fn load(&mut self, filter: &str) -> crate::Result<()> {
        self.set_filter(filter).await
    }

    /// Replace all rows with the collection for `filter`. Any open editor or
    /// pending action belongs to the old rows and is discarded.
    pub async fn set_filter(&mut self, filter: &str) -> crate::Result<()> {
        self.ensure_ready().await?;
        if let Some(action) = self.gate.reset() {
            tracing::info!(
                "Discarding pending {} of row {} on filter change",
                action.operation,
                action.key.id
            );
        }
        if let Some(editor) = self.editor.take() {
            tracing::info!(
                "Discarding editor for row {} on filter change",
                editor.key().id
            );
        }
        self.filter = filter.to_string();
        self.rows.clear();
        self.generation += 1;
        self.refresh().await
    }

    /// Re-fetch the rows for the current filter
    pub async fn refresh(&mut self) -> crate::Result<()> {
        self.ensure_open()?;
        self.begin().await?;
        let result = self.reload().await;
        self.finish().await;
        result
    }

    /// Current key of the row with display id `id`
    pub fn key(&self, id: u32) -> crate::Result<RowKey> {
        if self.rows.iter().any(|r| r.id == id) {
            Ok(RowKey {
                id,
                generation: self.generation,
            })
        } else {
            Err(DncError::UnknownRow { id })
        }
    }

    fn row(&self, key: RowKey) -> crate::Result<&Record> {
        if key.generation != self.generation {
            return Err(DncError::StaleRow { id: key.id });
        }
        self.rows
            .iter()
            .find(|r| r.id == key.id)
            .ok_or(DncError::UnknownRow { id: key.id })
    }

    /// Open an editor on a snapshot of the row, loading its option lists
    ///
    /// Option lists that fail to load are logged and left empty; fields stay
    /// editable as free text.
    pub async fn open_editor(&mut self, key: RowKey) -> crate::Result<&RecordEditor> {
        self.ensure_open()?;
        if !self.gate.is_idle() {
            return Err(DncError::GateBusy);
        }
        let snapshot = self.row(key)?.clone();
        let mut editor =
            RecordEditor::new(key, snapshot).with_suggestions(self.suggestions.clone());

        if let Some(directory) = self.directory.clone() {
            self.begin().await?;
            let result =
                until_closed(&self.cancel, editor.load_options(directory.as_ref())).await;
            self.finish().await;
            match result {
                Err(DncError::Closed) => return Err(DncError::Closed),
                Err(e) => tracing::warn!("Failed to load editor options: {}", e),
                Ok(()) => {}
            }
        }

        tracing::debug!("Opened {} editor on row {}", self.entity(), key.id);
        Ok(self.editor.insert(editor))
    }

    /// Change the editor's organisation and reload its locations
    pub async fn select_organization(&mut self, org: &str) -> crate::Result<()> {
        self.ensure_open()?;
        let Some(directory) = self.directory.clone() else {
            self.editor_mut()?.set(ORG_FIELD, org);
            return Ok(());
        };
        if self.editor.is_none() {
            return Err(DncError::NoEditor);
        }

        self.begin().await?;
        let result = match self.editor.as_mut() {
            Some(editor) => {
                until_closed(
                    &self.cancel,
                    editor.select_organization(org, directory.as_ref()),
                )
                .await
            }
            None => Err(DncError::NoEditor),
        };
        self.finish().await;
        result
    }

    /// Close the editor without saving; also drops its pending save
    pub fn cancel_editor(&mut self) -> crate::Result<()> {
        let editor = self.editor.take().ok_or(DncError::NoEditor)?;
        let pending_save = self
            .gate
            .pending()
            .is_some_and(|p| p.operation != Operation::Delete);
        if pending_save {
            self.gate.reset();
        }
        tracing::debug!("Closed editor on row {} without saving", editor.key().id);
        Ok(())
    }

    /// Ask to save the editor's draft over its original row
    pub async fn request_update(&mut self) -> crate::Result<Prompt> {
        self.ensure_ready().await?;
        self.ensure_supported(Operation::Update)?;
        let key = self.editor.as_ref().ok_or(DncError::NoEditor)?.key();
        let prompt = Prompt::simple(
            "Update record?",
            format!("Save changes to {} row {}?", self.entity(), key.id),
        );
        self.gate.request(Operation::Update, key, prompt).cloned()
    }

    /// Ask to create a new record from the editor's draft
    pub async fn request_append(&mut self) -> crate::Result<Prompt> {
        self.ensure_ready().await?;
        self.ensure_supported(Operation::Append)?;
        let key = self.editor.as_ref().ok_or(DncError::NoEditor)?.key();
        let prompt = Prompt::simple(
            "Append record?",
            format!(
                "This creates a new {} record and cannot be undone. Continue?",
                self.entity()
            ),
        );
        self.gate.request(Operation::Append, key, prompt).cloned()
    }

    /// Ask to delete a row; the prompt carries a challenge code
    pub async fn request_delete(&mut self, key: RowKey) -> crate::Result<Prompt> {
        self.ensure_ready().await?;
        self.ensure_supported(Operation::Delete)?;
        self.row(key)?;
        let prompt = Prompt::challenge(
            "Delete record?",
            format!(
                "Deleting {} row {} cannot be undone. Type the code to confirm.",
                self.entity(),
                key.id
            ),
        );
        self.gate.request(Operation::Delete, key, prompt).cloned()
    }

    /// Answer the pending prompt and, when confirmed, run the action
    ///
    /// Mutation failures are notified and returned as [`Outcome::Failed`];
    /// the rows are refreshed either way. A successful save closes the editor.
    pub async fn resolve(&mut self, response: Response) -> crate::Result<Outcome> {
        self.ensure_open()?;
        // Busy is claimed before the gate hands out its action
        self.begin().await?;
        let decision = match self.gate.resolve(response) {
            Ok(decision) => decision,
            Err(e) => {
                self.finish().await;
                return Err(e);
            }
        };
        let action = match decision {
            Decision::Cancelled(action) => {
                self.finish().await;
                tracing::info!("Cancelled {} of row {}", action.operation, action.key.id);
                return Ok(Outcome::Cancelled {
                    operation: action.operation,
                });
            }
            Decision::Confirmed(action) => action,
        };
        let operation = action.operation;

        let result = self.mutate(&action).await;
        if matches!(result, Err(DncError::Closed)) {
            self.finish().await;
            return Err(DncError::Closed);
        }

        let notification = match &result {
            Ok(ack) => Notification::success(
                ack.message
                    .clone()
                    .unwrap_or_else(|| format!("{} {} succeeded", self.entity(), operation)),
            ),
            Err(e) => {
                tracing::warn!(
                    "{} of {} row {} failed: {}",
                    operation,
                    self.entity(),
                    action.key.id,
                    e
                );
                Notification::error(format!(
                    "Failed to {} {} record: {}",
                    operation,
                    self.entity(),
                    e
                ))
            }
        };
        self.publish(operation, &notification).await;

        if let Err(e) = self.reload().await {
            tracing::warn!("Refresh after {} failed: {}", operation, e);
            if matches!(e, DncError::Closed) {
                self.finish().await;
                return Err(e);
            }
        }
        self.finish().await;

        match result {
            Ok(ack) => {
                if operation != Operation::Delete {
                    self.editor = None;
                }
                tracing::info!("{} {} completed", self.entity(), operation);
                Ok(Outcome::Completed { operation, ack })
            }
            Err(error) => Ok(Outcome::Failed { operation, error }),
        }
    }

    /// Put the pending prompt to `confirmer` and resolve with its answer.
    /// Wrong challenge answers are retried a few times before giving up.
    pub async fn confirm_with(&mut self, confirmer: &dyn Confirmer) -> crate::Result<Outcome> {
        for attempt in 1..=MAX_CHALLENGE_ATTEMPTS {
            let prompt = self
                .gate
                .pending()
                .map(|p| p.prompt.clone())
                .ok_or(DncError::NoPendingAction)?;
            let response = until_closed(&self.cancel, confirmer.confirm(&prompt)).await?;
            match self.resolve(response).await {
                Err(DncError::ChallengeFailed) => {
                    tracing::warn!(
                        "Challenge answer rejected (attempt {} of {})",
                        attempt,
                        MAX_CHALLENGE_ATTEMPTS
                    );
                }
                other => return other,
            }
        }
        self.gate.reset();
        Err(DncError::ChallengeFailed)
    }

    /// Write the loaded rows as CSV
    pub fn export_csv<W: Write>(&self, writer: W) -> crate::Result<W> {
        export::export_csv(&self.rows, self.columns(), writer)
    }

    /// Write the loaded rows to `directory/<name>.csv`
    pub fn export_csv_file(&self, directory: &Path, name: &str) -> crate::Result<PathBuf> {
        export::export_csv_file(&self.rows, self.columns(), directory, name)
    }

    /// Cancel outstanding requests; every later call fails with `Closed`
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.gate.reset();
        self.editor = None;
        tracing::debug!("Closed {} table", self.entity());
    }

    async fn mutate(&self, action: &PendingAction) -> crate::Result<Ack> {
        match action.operation {
            Operation::Update => {
                let editor = self.editor.as_ref().ok_or(DncError::NoEditor)?;
                until_closed(
                    &self.cancel,
                    self.source
                        .update(&self.filter, editor.original(), editor.draft()),
                )
                .await
            }
            Operation::Append => {
                let editor = self.editor.as_ref().ok_or(DncError::NoEditor)?;
                until_closed(&self.cancel, self.source.create(&self.filter, editor.draft())).await
            }
            Operation::Delete => {
                let record = self.row(action.key)?;
                until_closed(&self.cancel, self.source.delete(&self.filter, record)).await
            }
        }
    }

    async fn reload(&mut self) -> crate::Result<()> {
        let rows = until_closed(&self.cancel, self.source.fetch_collection(&self.filter)).await?;
        self.rows = rows;
        self.generation += 1;
        tracing::debug!(
            "Loaded {} {} rows (generation {})",
            self.rows.len(),
            self.entity(),
            self.generation
        );
        Ok(())
    }

    async fn publish(&self, operation: Operation, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!(
                "Notification via '{}' failed: {}",
                self.notifier.type_name(),
                e
            );
        }
        let record = NotificationRecord {
            entity: self.entity().to_string(),
            operation: operation.to_string(),
            message: notification.message.clone(),
            success: notification.severity == Severity::Success,
            timestamp_epoch_ms: current_epoch_ms(),
        };
        self.state.write().await.add_notification(record);
    }

    fn ensure_open(&self) -> crate::Result<()> {
        if self.cancel.is_cancelled() {
            Err(DncError::Closed)
        } else {
            Ok(())
        }
    }

    async fn ensure_ready(&self) -> crate::Result<()> {
        self.ensure_open()?;
        if self.state.read().await.busy {
            return Err(DncError::Busy);
        }
        Ok(())
    }

    fn ensure_supported(&self, operation: Operation) -> crate::Result<()> {
        let profile = self.source.profile();
        let (mutation, name) = match operation {
            Operation::Update => (&profile.update, "update"),
            Operation::Append => (&profile.create, "create"),
            Operation::Delete => (&profile.delete, "delete"),
        };
        if mutation.is_none() {
            return Err(DncError::Unsupported {
                entity: profile.name.clone(),
                operation: name,
            });
        }
        Ok(())
    }

    async fn begin(&self) -> crate::Result<()> {
        let mut state = self.state.write().await;
        if state.busy {
            return Err(DncError::Busy);
        }
        state.busy = true;
        Ok(())
    }

    async fn finish(&self) {
        self.state.write().await.busy = false;
    }
}

/// Run `future` unless the table is closed first
async fn until_closed<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = crate::Result<T>>,
) -> crate::Result<T> {
    tokio::select! {
        result = future => result,
        _ = cancel.cancelled() => {
            tracing::debug!("Request abandoned: table closed");
            Err(DncError::Closed)
        }
    }
}

fn current_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
