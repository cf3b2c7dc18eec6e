//! BDD step definitions for the fake backend

use cucumber::{given, then};
use serde_json::{json, Value as JsonValue};

use crate::world::DncWorld;

#[given(expr = "the backend has a brix reading of {word} at {string} for {string}")]
fn brix_reading(world: &mut DncWorld, value: String, rdate: String, location: String) {
    let value: JsonValue = serde_json::from_str(&value).expect("reading should be a number");
    let mut item = serde_json::Map::new();
    item.insert(location.clone(), value);
    item.insert("rdate".to_string(), json!(rdate));
    world
        .backend
        .push(&["brix", &location], JsonValue::Object(item));
}

#[given(expr = "the backend has a hardware board {string} revision {string}")]
fn hardware_board(world: &mut DncWorld, hwsl: String, boardrev: String) {
    world.backend.push(
        &["thwmr", &hwsl],
        json!({"hwsl": hwsl, "boardrev": boardrev, "userid": "athi"}),
    );
}

#[given(expr = "the backend has an SSU {string} with status {string} at {string} in {string}")]
fn ssu_record(world: &mut DncWorld, ssuid: String, status: String, org: String, location: String) {
    world.backend.push(
        &["tsdmd", &ssuid],
        json!({
            "ssuid": ssuid,
            "ssutype": "SiT",
            "ssustatus": status,
            "client": org,
            "location": location,
        }),
    );
}

#[given(expr = "the directory lists organisation {string} with locations {string}")]
fn directory_entry(world: &mut DncWorld, org: String, locations: String) {
    world.backend.push(&["org"], json!({"name": org}));
    for location in locations.split(',').map(str::trim) {
        world
            .backend
            .push(&["spot", &org], json!({"sname": location}));
    }
}

#[given("the backend rejects mutations")]
fn backend_rejects(world: &mut DncWorld) {
    world.backend.reject_mutations();
}

#[then(expr = "the backend received exactly {int} {string} request(s) to {string}")]
fn request_count(world: &mut DncWorld, count: usize, method: String, path: String) {
    assert_eq!(world.backend.count(&method, &path), count);
}

#[then(expr = "the backend received no {string} request")]
fn no_requests(world: &mut DncWorld, method: String) {
    let seen: Vec<String> = world
        .backend
        .requests()
        .iter()
        .filter(|r| r.method == method)
        .map(|r| r.path.clone())
        .collect();
    assert!(seen.is_empty(), "unexpected {} requests: {:?}", method, seen);
}

#[then(expr = "the last {string} body has {string} = {string}")]
fn last_body_field(world: &mut DncWorld, method: String, field: String, expected: String) {
    let request = world
        .backend
        .requests()
        .into_iter()
        .rev()
        .find(|r| r.method == method)
        .expect("no matching request");
    let body = request.body.expect("request had no body");
    let actual = match &body[&field] {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    assert_eq!(actual, expected);
}

#[then(expr = "the last {string} body has {string} under {string}")]
fn last_body_nested(world: &mut DncWorld, method: String, key: String, envelope: String) {
    let request = world
        .backend
        .requests()
        .into_iter()
        .rev()
        .find(|r| r.method == method)
        .expect("no matching request");
    let body = request.body.expect("request had no body");
    assert!(
        body[&envelope].get(&key).is_some(),
        "{:?} has no {} under {}",
        body,
        key,
        envelope
    );
}

#[then(expr = "the last {string} body has text {string} = {string} under {string}")]
fn last_body_nested_text(
    world: &mut DncWorld,
    method: String,
    key: String,
    expected: String,
    envelope: String,
) {
    let request = world
        .backend
        .requests()
        .into_iter()
        .rev()
        .find(|r| r.method == method)
        .expect("no matching request");
    let body = request.body.expect("request had no body");
    assert_eq!(body[&envelope][&key], JsonValue::String(expected));
}

#[then("organisations were requested before locations")]
fn directory_order(world: &mut DncWorld) {
    let paths: Vec<String> = world
        .backend
        .requests()
        .iter()
        .map(|r| r.path.clone())
        .collect();
    let org = paths.iter().position(|p| p == "/org").expect("no /org request");
    let spot = paths
        .iter()
        .position(|p| p.starts_with("/spot/"))
        .expect("no /spot request");
    assert!(org < spot, "requests out of order: {:?}", paths);
}
