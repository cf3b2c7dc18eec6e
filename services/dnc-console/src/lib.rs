//! DNC console - inventory and sensor-reading administration
//!
//! Loads SSU, hardware and brix collections from the DNC backend, edits and
//! deletes single records behind explicit confirmation, and exports the loaded
//! rows as CSV.

pub mod cli;
pub mod config;
pub mod devices;
pub mod directory;
pub mod editor;
pub mod entity;
pub mod error;
pub mod export;
pub mod gate;
pub mod io;
pub mod notifier;
pub mod record;
pub mod roles;
pub mod session;
pub mod source;
pub mod state;
pub mod table;

pub use cli::Console;
pub use config::{load_config, Config};
pub use error::{DncError, Result};
pub use table::{Outcome, RecordTable};
