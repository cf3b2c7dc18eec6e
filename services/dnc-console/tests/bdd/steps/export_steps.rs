//! BDD step definitions for CSV export

use cucumber::{then, when};

use crate::world::DncWorld;

#[when(expr = "I export the table as {string}")]
fn export_table(world: &mut DncWorld, name: String) {
    let dir = tempfile::tempdir().unwrap();
    let result = world.table().export_csv_file(dir.path(), &name).map(|_| ());
    world.record(result);
    world.export_dir = Some(dir);
}

fn exported(world: &DncWorld, file: &str) -> String {
    let dir = world.export_dir.as_ref().expect("nothing exported");
    std::fs::read_to_string(dir.path().join(file)).expect("export file missing")
}

#[then(expr = "the file {string} has header {string}")]
fn export_header(world: &mut DncWorld, file: String, header: String) {
    let content = exported(world, &file);
    assert_eq!(content.lines().next(), Some(header.as_str()));
}

#[then(expr = "line {int} of {string} starts with {string}")]
fn export_line(world: &mut DncWorld, line: usize, file: String, prefix: String) {
    let content = exported(world, &file);
    let actual = content.lines().nth(line - 1).expect("line missing");
    assert!(
        actual.starts_with(&prefix),
        "line {} is {:?}, expected prefix {:?}",
        line,
        actual,
        prefix
    );
}

#[then(expr = "the file {string} has {int} line(s)")]
fn export_line_count(world: &mut DncWorld, file: String, count: usize) {
    assert_eq!(exported(world, &file).lines().count(), count);
}

#[then("the export is rejected for its name")]
fn export_rejected(world: &mut DncWorld) {
    assert!(matches!(
        world.last_error,
        Some(dnc_console::DncError::InvalidFileName(_))
    ));
}
