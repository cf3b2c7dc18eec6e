//! BDD step definitions for the DNC console

pub mod backend_steps;
pub mod editor_steps;
pub mod export_steps;
pub mod table_steps;
