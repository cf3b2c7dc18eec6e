//! BDD step definitions for the record editor

use cucumber::{then, when};

use crate::world::DncWorld;

#[when(expr = "I open the editor on row {int}")]
async fn open_editor(world: &mut DncWorld, id: u32) {
    let key = world.table().key(id).unwrap();
    let result = world.table().open_editor(key).await.map(|_| ());
    world.record(result);
}

#[when(expr = "I select organisation {string}")]
async fn select_org(world: &mut DncWorld, org: String) {
    world.table().select_organization(&org).await.unwrap();
}

#[when(expr = "I set {string} to {string}")]
fn set_field(world: &mut DncWorld, field: String, value: String) {
    world
        .table()
        .editor_mut()
        .unwrap()
        .set_input(&field, &value);
}

#[when("I request an update")]
async fn request_update(world: &mut DncWorld) {
    let result = world.table().request_update().await;
    world.prompt = world.record(result);
}

#[when("I request an append")]
async fn request_append(world: &mut DncWorld) {
    let result = world.table().request_append().await;
    world.prompt = world.record(result);
}

#[when("I discard the editor")]
fn discard_editor(world: &mut DncWorld) {
    world.table().cancel_editor().unwrap();
}

fn list(values: &str) -> Vec<String> {
    values
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[then(expr = "the organisation options are {string}")]
fn org_options(world: &mut DncWorld, expected: String) {
    let editor = world.table().editor().expect("no editor open");
    assert_eq!(editor.options().organizations(), list(&expected).as_slice());
}

#[then(expr = "the location options are {string}")]
fn location_options(world: &mut DncWorld, expected: String) {
    let editor = world.table().editor().expect("no editor open");
    assert!(editor.options().locations_ready());
    assert_eq!(editor.options().locations(), list(&expected).as_slice());
}

#[then(expr = "the draft {string} is empty")]
fn draft_empty(world: &mut DncWorld, field: String) {
    let editor = world.table().editor().expect("no editor open");
    assert_eq!(editor.draft().text(&field), "");
}

#[then(expr = "the draft {string} is {string}")]
fn draft_value(world: &mut DncWorld, field: String, expected: String) {
    let editor = world.table().editor().expect("no editor open");
    assert_eq!(editor.draft().text(&field), expected);
}

#[then("the editor is still open")]
fn editor_open(world: &mut DncWorld) {
    assert!(world.table().editor().is_some());
}

#[then("the editor is closed")]
fn editor_closed(world: &mut DncWorld) {
    assert!(world.table().editor().is_none());
}
