//! BDD step definitions for loading rows and confirming actions

use cucumber::{given, then, when};

use dnc_console::entity::EntityProfile;
use dnc_console::gate::{Operation, Response};
use dnc_console::{DncError, Outcome};

use crate::world::DncWorld;

fn profile(entity: &str) -> EntityProfile {
    match entity {
        "brix" => EntityProfile::brix(),
        "hardware" => EntityProfile::hardware(),
        "SSU" => EntityProfile::ssu(),
        other => panic!("unknown entity {}", other),
    }
}

async fn load(world: &mut DncWorld, entity: &str, filter: &str) {
    let mut table = world.build_table(profile(entity), entity == "SSU");
    table.load(filter).await.unwrap();
    world.table = Some(table);
}

#[given(expr = "the {word} table is loaded for {string}")]
async fn table_loaded(world: &mut DncWorld, entity: String, filter: String) {
    load(world, &entity, &filter).await;
}

#[when(expr = "I load the {word} table for {string}")]
async fn load_table(world: &mut DncWorld, entity: String, filter: String) {
    load(world, &entity, &filter).await;
}

#[when(expr = "I switch the filter to {string}")]
async fn switch_filter(world: &mut DncWorld, filter: String) {
    world.table().set_filter(&filter).await.unwrap();
}

#[given(expr = "I remember the key of row {int}")]
fn remember_key(world: &mut DncWorld, id: u32) {
    world.remembered_key = Some(world.table().key(id).unwrap());
}

#[when(expr = "I request to delete row {int}")]
async fn request_delete(world: &mut DncWorld, id: u32) {
    let key = world.table().key(id).unwrap();
    let result = world.table().request_delete(key).await;
    world.prompt = world.record(result);
}

#[when("I request to delete the remembered row")]
async fn request_delete_remembered(world: &mut DncWorld) {
    let key = world.remembered_key.expect("no remembered key");
    let result = world.table().request_delete(key).await;
    world.prompt = world.record(result);
}

#[when("I type the challenge code")]
async fn type_code(world: &mut DncWorld) {
    let code = world
        .prompt
        .as_ref()
        .and_then(|p| p.challenge_code())
        .expect("no challenge shown")
        .to_string();
    resolve(world, Response::Solve(code)).await;
}

#[when(expr = "I answer the challenge with {string}")]
async fn answer_challenge(world: &mut DncWorld, answer: String) {
    resolve(world, Response::Solve(answer)).await;
}

#[when("I confirm")]
async fn confirm(world: &mut DncWorld) {
    resolve(world, Response::Confirm).await;
}

#[when("I cancel")]
async fn cancel(world: &mut DncWorld) {
    resolve(world, Response::Cancel).await;
}

async fn resolve(world: &mut DncWorld, response: Response) {
    let result = world.table().resolve(response).await;
    world.outcome = world.record(result);
}

#[then(expr = "the table has {int} row(s)")]
fn row_count(world: &mut DncWorld, count: usize) {
    assert_eq!(world.table().rows().len(), count);
}

#[then(expr = "row {int} has {string} = {string}")]
fn row_field(world: &mut DncWorld, id: u32, field: String, expected: String) {
    let row = world
        .table()
        .rows()
        .iter()
        .find(|r| r.id == id)
        .cloned()
        .expect("row not found");
    assert_eq!(row.text(&field), expected);
}

#[then("the display ids run from 1 without gaps")]
fn ids_sequential(world: &mut DncWorld) {
    let ids: Vec<u32> = world.table().rows().iter().map(|r| r.id).collect();
    let expected: Vec<u32> = (1..=ids.len() as u32).collect();
    assert_eq!(ids, expected);
}

#[then("a challenge code is shown")]
fn challenge_shown(world: &mut DncWorld) {
    let prompt = world.prompt.as_ref().expect("no prompt shown");
    let code = prompt.challenge_code().expect("prompt has no challenge");
    assert_eq!(code.len(), 5);
}

#[then("the action completes")]
fn action_completes(world: &mut DncWorld) {
    match world.outcome.as_ref() {
        Some(Outcome::Completed { .. }) => {}
        other => panic!("expected completion, got {:?} / {:?}", other, world.last_error),
    }
}

#[then("the action fails")]
fn action_fails(world: &mut DncWorld) {
    assert!(matches!(world.outcome, Some(Outcome::Failed { .. })));
}

#[then(expr = "the {word} is cancelled")]
fn action_cancelled(world: &mut DncWorld, operation: String) {
    let expected = match operation.as_str() {
        "delete" => Operation::Delete,
        "update" => Operation::Update,
        "append" => Operation::Append,
        other => panic!("unknown operation {}", other),
    };
    match world.outcome.as_ref() {
        Some(Outcome::Cancelled { operation }) => assert_eq!(*operation, expected),
        other => panic!("expected cancellation, got {:?}", other),
    }
}

#[then(expr = "the request is rejected as {word}")]
fn rejected_as(world: &mut DncWorld, kind: String) {
    let error = world.last_error.as_ref().expect("no error recorded");
    let matched = match kind.as_str() {
        "stale" => matches!(error, DncError::StaleRow { .. }),
        "busy-gate" => matches!(error, DncError::GateBusy),
        "wrong-answer" => matches!(error, DncError::ChallengeFailed),
        other => panic!("unknown rejection {}", other),
    };
    assert!(matched, "unexpected error {:?}", error);
}

#[then("the action is still pending")]
fn still_pending(world: &mut DncWorld) {
    assert!(world.table().pending().is_some());
}

#[then("nothing is pending")]
fn nothing_pending(world: &mut DncWorld) {
    assert!(world.table().pending().is_none());
}
