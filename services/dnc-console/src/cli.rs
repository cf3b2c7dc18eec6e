//! Command-line plumbing: terminal prompts, table rendering and the console
//! that wires sources, directory and notifier together for one run

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::devices::to_geojson;
use crate::directory::{OptionDirectory, RestDirectory};
use crate::editor::{Suggestions, ORG_FIELD};
use crate::entity::EntityProfile;
use crate::gate::{Confirmer, Prompt, Response};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::notifier::{LogNotifier, Notifier};
use crate::record::{Column, Record};
use crate::roles::{Role, RoleChange, UserAdmin};
use crate::session::SessionContext;
use crate::source::RestRecordSource;
use crate::state::{new_state_handle, StateHandle};
use crate::table::{Outcome, RecordTable};

/// Reads answers to prompts from stdin
pub struct TerminalConfirmer {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Default for TerminalConfirmer {
    fn default() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl TerminalConfirmer {
    async fn read_line(&self) -> crate::Result<Option<String>> {
        Ok(self.lines.lock().await.next_line().await?)
    }
}

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &Prompt) -> crate::Result<Response> {
        eprintln!("{}", prompt.title());
        eprintln!("{}", prompt.message());
        match prompt.challenge_code() {
            Some(code) => {
                eprint!("Type {} to confirm (empty to cancel): ", code);
                match self.read_line().await? {
                    Some(line) if !line.trim().is_empty() => Ok(Response::Solve(line)),
                    _ => Ok(Response::Cancel),
                }
            }
            None => {
                eprint!("Confirm? [y/N]: ");
                let answer = self.read_line().await?.unwrap_or_default();
                Ok(parse_yes_no(&answer))
            }
        }
    }
}

fn parse_yes_no(answer: &str) -> Response {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Response::Confirm,
        _ => Response::Cancel,
    }
}

/// Parse a `field=value` assignment
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got {:?}", s))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in {:?}", s));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Render the editor hints, one `field: a, b` line per non-empty list
pub fn render_suggestions(suggestions: &Suggestions) -> String {
    [
        ("type", &suggestions.types),
        ("status", &suggestions.statuses),
        ("remarks", &suggestions.remarks),
    ]
    .iter()
    .filter(|(_, values)| !values.is_empty())
    .map(|(field, values)| format!("{}: {}\n", field, values.join(", ")))
    .collect()
}

/// Render rows as aligned text columns; derived columns are left out
pub fn render_table(columns: &[Column], rows: &[Record]) -> String {
    let columns: Vec<&Column> = columns.iter().filter(|c| !c.derived).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.text(&c.field)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.label.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(columns.iter().map(|c| c.label.as_str()).collect()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

/// Everything one command needs: configuration, HTTP client, session and
/// shared state
pub struct Console {
    config: Config,
    http: Arc<dyn HttpClient>,
    session: Arc<SessionContext>,
    state: StateHandle,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    cancel: CancellationToken,
}

impl Console {
    pub fn new(config: Config, confirmer: Arc<dyn Confirmer>) -> crate::Result<Self> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(config.api.timeout)?);
        Ok(Self::with_http(config, http, confirmer))
    }

    pub fn with_http(
        config: Config,
        http: Arc<dyn HttpClient>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let session = Arc::new(config.session_context());
        if !session.has_token() {
            tracing::warn!(
                "No session token found; set {} or configure session.token",
                config.session.token_env
            );
        }
        let state = new_state_handle(config.activity.history_size);
        Self {
            config,
            http,
            session,
            state,
            notifier: Arc::new(LogNotifier),
            confirmer,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Token cancelling every table this console creates
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn directory(&self) -> Arc<dyn OptionDirectory> {
        Arc::new(RestDirectory::new(
            self.config.api.dnc_url.clone(),
            Arc::clone(&self.http),
            Arc::clone(&self.session),
        ))
    }

    /// A table for `profile` with the configured directory and suggestions
    pub fn table(&self, profile: EntityProfile) -> RecordTable {
        let has_org = profile.fields.iter().any(|f| f.client == ORG_FIELD);
        let source = RestRecordSource::from_config(
            profile,
            &self.config.api,
            Arc::clone(&self.http),
            Arc::clone(&self.session),
        );
        let table = RecordTable::new(
            Arc::new(source),
            Arc::clone(&self.notifier),
            Arc::clone(&self.state),
            self.cancel.child_token(),
        )
        .with_suggestions(self.config.options.suggestions());
        if has_org {
            table.with_directory(self.directory())
        } else {
            table
        }
    }

    /// Heading for a table, using the configured alias when there is one
    pub fn title(&self, table: &RecordTable) -> String {
        self.config.display_name(table.profile())
    }

    /// Location used when `brix list` is given none
    pub fn default_location(&self) -> crate::Result<String> {
        self.config
            .options
            .locations
            .first()
            .cloned()
            .ok_or_else(|| crate::DncError::Config("No brix locations configured".to_string()))
    }

    /// Load and print a table, optionally exporting it
    pub async fn show(
        &self,
        profile: EntityProfile,
        filter: &str,
        export: Option<&str>,
    ) -> crate::Result<()> {
        let mut table = self.table(profile);
        table.load(filter).await?;
        println!(
            "{} records for {} ({} rows)",
            self.title(&table),
            filter,
            table.rows().len()
        );
        print!("{}", render_table(table.columns(), table.rows()));
        if let Some(name) = export {
            let path = table.export_csv_file(&self.config.export.directory, name)?;
            println!("Exported to {}", path.display());
        }
        Ok(())
    }

    /// Edit one row and save it after confirmation
    pub async fn edit(
        &self,
        profile: EntityProfile,
        filter: &str,
        row: u32,
        org: Option<&str>,
        changes: &[(String, String)],
        append: bool,
    ) -> crate::Result<()> {
        let mut table = self.table(profile);
        table.load(filter).await?;
        let key = table.key(row)?;
        table.open_editor(key).await?;
        if let Some(org) = org {
            table.select_organization(org).await?;
        }
        let editor = table.editor_mut()?;
        let hints = render_suggestions(editor.suggestions());
        if !hints.is_empty() {
            eprint!("Suggested values:\n{}", hints);
        }
        for (field, value) in changes {
            editor.set_input(field, value);
        }
        tracing::debug!("Changed fields: {:?}", editor.changed_fields());

        if append {
            table.request_append().await?;
        } else {
            table.request_update().await?;
        }
        let outcome = table.confirm_with(self.confirmer.as_ref()).await?;
        report(outcome)
    }

    /// Delete one row after a challenge
    pub async fn delete(
        &self,
        profile: EntityProfile,
        filter: &str,
        row: u32,
    ) -> crate::Result<()> {
        let mut table = self.table(profile);
        table.load(filter).await?;
        let key = table.key(row)?;
        table.request_delete(key).await?;
        let outcome = table.confirm_with(self.confirmer.as_ref()).await?;
        report(outcome)
    }

    pub async fn organizations(&self) -> crate::Result<()> {
        for org in self.directory().organizations().await? {
            println!("{}", org);
        }
        Ok(())
    }

    pub async fn locations(&self, org: &str) -> crate::Result<()> {
        for spot in self.directory().locations(org).await? {
            println!("{}", spot);
        }
        Ok(())
    }

    /// Change a user's role after a simple confirmation
    pub async fn change_role(
        &self,
        email: &str,
        name: &str,
        role: &str,
        status: Option<String>,
    ) -> crate::Result<()> {
        if let Err(e) = role.parse::<Role>() {
            tracing::warn!("{}; using {}", e, Role::OrgUser);
        }
        let role = Role::from_label_or_default(role);
        let prompt = Prompt::simple(
            "Change role?",
            format!("Set {} <{}> to {}?", name, email, role),
        );
        match self.confirmer.confirm(&prompt).await? {
            Response::Cancel => {
                println!("Cancelled");
                return Ok(());
            }
            Response::Confirm | Response::Solve(_) => {}
        }

        let admin = UserAdmin::new(
            self.config.api.dnc_url.clone(),
            Arc::clone(&self.http),
            Arc::clone(&self.session),
        );
        let ack = admin
            .change_role(&RoleChange::new(role, status, email, name))
            .await?;
        println!("{}", ack.message.as_deref().unwrap_or("Role updated"));
        Ok(())
    }

    pub fn devices(&self) -> crate::Result<()> {
        let geojson = to_geojson(&self.config.devices);
        println!("{}", serde_json::to_string_pretty(&geojson)?);
        Ok(())
    }
}

/// Print the outcome; a failed mutation becomes the command's error
fn report(outcome: Outcome) -> crate::Result<()> {
    match outcome {
        Outcome::Completed { operation, ack } => {
            println!(
                "{}",
                ack.message
                    .unwrap_or_else(|| format!("{} succeeded", operation))
            );
            Ok(())
        }
        Outcome::Cancelled { operation } => {
            println!("Cancelled {}", operation);
            Ok(())
        }
        Outcome::Failed { error, .. } => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments_split_on_first_equals() {
        assert_eq!(
            parse_assignment("remarks=a=b").unwrap(),
            ("remarks".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment("status=").unwrap(),
            ("status".to_string(), String::new())
        );
        assert!(parse_assignment("status").is_err());
        assert!(parse_assignment("=x").is_err());
    }

    #[test]
    fn yes_no_defaults_to_cancel() {
        assert_eq!(parse_yes_no("y"), Response::Confirm);
        assert_eq!(parse_yes_no(" YES\n"), Response::Confirm);
        assert_eq!(parse_yes_no(""), Response::Cancel);
        assert_eq!(parse_yes_no("nope"), Response::Cancel);
    }

    #[test]
    fn render_aligns_columns_and_skips_derived() {
        let columns = vec![
            Column::new("id", "SlNo"),
            Column::new("brix", "Brix"),
            Column::derived("actions", "Actions"),
        ];
        let rows = vec![Record::new(1).with("brix", 12.4), Record::new(2)];
        let rendered = render_table(&columns, &rows);
        assert_eq!(rendered, "SlNo  Brix\n----  ----\n1     12.4\n2\n");
    }

    #[test]
    fn suggestions_render_per_field() {
        let suggestions = Suggestions {
            statuses: vec!["Active-UP".to_string(), "Moved".to_string()],
            remarks: Vec::new(),
            types: vec!["SiT".to_string()],
        };
        assert_eq!(
            render_suggestions(&suggestions),
            "type: SiT\nstatus: Active-UP, Moved\n"
        );
        assert_eq!(render_suggestions(&Suggestions::default()), "");
    }

    #[test]
    fn default_location_comes_from_options() {
        let config = Config::default();
        let console = Console::with_http(
            config,
            Arc::new(crate::io::MockHttpClient::new()),
            Arc::new(crate::gate::AutoConfirmer),
        );
        assert_eq!(console.default_location().unwrap(), "Arnot");
    }

    #[test]
    fn tables_pick_the_service_url() {
        let console = Console::with_http(
            Config::default(),
            Arc::new(crate::io::MockHttpClient::new()),
            Arc::new(crate::gate::AutoConfirmer),
        );
        let table = console.table(EntityProfile::brix());
        assert_eq!(table.entity(), "Brix");
        assert!(!table.is_closed());

        console.cancel_token().cancel();
        assert!(table.is_closed());
    }

    #[test]
    fn titles_use_configured_aliases() {
        let mut config = Config::default();
        config.aliases.insert("Stock".to_string(), "Inventory".to_string());
        config.aliases.insert("Device".to_string(), "Sensor Unit".to_string());
        let console = Console::with_http(
            config,
            Arc::new(crate::io::MockHttpClient::new()),
            Arc::new(crate::gate::AutoConfirmer),
        );

        let hardware = console.table(EntityProfile::hardware());
        assert_eq!(console.title(&hardware), "Inventory");
        let ssu = console.table(EntityProfile::ssu());
        assert_eq!(console.title(&ssu), "Sensor Unit");
        let brix = console.table(EntityProfile::brix());
        assert_eq!(console.title(&brix), "Brix");
    }
}
