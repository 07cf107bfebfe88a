mod common;

use common::{Fixture, START_MILLIS, user_schema};
use modstamp_model::{Document, FieldSpec, MemoryDocument, PersistHook, Schema};
use modstamp_plugin::{
    Decision, ManualClock, PluginOptions, Resolved, Stamper, WatchedPaths,
    actor_not_updated_message,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::thread;

fn stamper(watched: WatchedPaths, actor_required: bool) -> Stamper {
    Stamper::new(
        Resolved {
            watched,
            date_path: "modified.date".into(),
            actor_path: Some("modified.by".into()),
            actor_required,
        },
        Arc::new(ManualClock::new(42)),
    )
}

fn existing_user() -> MemoryDocument {
    MemoryDocument::existing(json!({
        "username": "ada",
        "name": {"first": "Ada", "last": "Lovelace"},
    }))
}

// ── Decision procedure ───────────────────────────────────────────

#[test]
fn new_documents_are_never_stamped() {
    let s = stamper(WatchedPaths::Any, true);
    let mut doc = MemoryDocument::new(json!({}));
    doc.set("username", json!("ada"));
    assert_eq!(s.decide(&doc), Decision::New);
}

#[test]
fn unmodified_document_is_unchanged() {
    let s = stamper(WatchedPaths::Any, false);
    assert_eq!(s.decide(&existing_user()), Decision::Unchanged);
}

#[test]
fn unwatched_modification_is_unchanged() {
    let s = stamper(WatchedPaths::Paths(vec!["name.first".into()]), true);
    let mut doc = existing_user();
    doc.set("name.last", json!("King"));
    assert_eq!(s.decide(&doc), Decision::Unchanged);
}

#[test]
fn any_one_watched_path_suffices() {
    let s = stamper(
        WatchedPaths::Paths(vec!["username".into(), "name.first".into()]),
        false,
    );
    let mut doc = existing_user();
    doc.set("name.first", json!("Augusta"));
    assert_eq!(s.decide(&doc), Decision::Stamp);
}

#[test]
fn required_actor_must_be_modified() {
    let s = stamper(WatchedPaths::Any, true);
    let mut doc = existing_user();
    doc.set("username", json!("lovelace"));
    assert_eq!(s.decide(&doc), Decision::ActorNotUpdated);

    doc.set("modified.by", json!("admin"));
    assert_eq!(s.decide(&doc), Decision::Stamp);
}

#[test]
fn before_persist_stamps_clock_reading() {
    let s = stamper(WatchedPaths::Any, false);
    let mut doc = existing_user();
    doc.set("username", json!("lovelace"));
    s.before_persist(&mut doc).unwrap();
    assert_eq!(doc.get_i64("modified.date"), Some(42));
}

#[test]
fn before_persist_rejects_without_touching_date() {
    let s = stamper(WatchedPaths::Any, true);
    let mut doc = existing_user();
    doc.set("username", json!("lovelace"));
    let err = s.before_persist(&mut doc).unwrap_err();
    assert_eq!(err.path, "modified.by");
    assert_eq!(err.message, "modified.by must be updated for document modification");
    assert!(doc.get("modified.date").is_none());
    assert!(!doc.is_modified(Some("modified.date")));
}

#[test]
fn message_names_the_actor_path() {
    assert_eq!(
        actor_not_updated_message("audit.user"),
        "audit.user must be updated for document modification"
    );
}

#[test]
fn stamper_exposes_its_configuration() {
    let s = stamper(WatchedPaths::from_list(vec!["name.first".into()]), true);
    assert_eq!(s.resolved().date_path, "modified.date");
    assert_eq!(s.resolved().required_actor(), Some("modified.by"));
    assert_eq!(s.resolved().watched.paths(), ["name.first".to_string()]);
}

#[test]
fn stamper_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Stamper>();
}

// ── Document creation ────────────────────────────────────────────

#[test]
fn date_not_set_on_creation() {
    let fx = Fixture::new(user_schema(false), PluginOptions::new());
    let user = fx.new_user();
    assert!(user.get("modified.date").is_none());
    assert!(user.get("modified.by").is_none());
}

#[test]
fn date_not_set_on_initial_save() {
    let fx = Fixture::new(user_schema(false), PluginOptions::new());
    let user = fx.saved_user();
    assert!(!user.is_new());
    assert!(user.get("modified.date").is_none());
    assert!(user.get("modified.by").is_none());
}

// ── Default watch (no tagged paths) ──────────────────────────────

#[test]
fn any_change_stamps_on_subsequent_save() {
    let fx = Fixture::new(user_schema(false), PluginOptions::new());
    let mut user = fx.saved_user();
    let created = user.get_i64("created").unwrap();

    user.set("username", json!("countess"));
    fx.save(&mut user).unwrap();

    let stamped = user.get_i64("modified.date").unwrap();
    assert!(stamped > created);
    assert_eq!(stamped, START_MILLIS + 2);
}

#[test]
fn save_without_changes_keeps_date() {
    let fx = Fixture::new(user_schema(false), PluginOptions::new());
    let mut user = fx.saved_user();
    user.set("username", json!("countess"));
    fx.save(&mut user).unwrap();
    let before = user.get("modified.date").cloned();

    fx.save(&mut user).unwrap();
    assert_eq!(user.get("modified.date").cloned(), before);
}

// Sub-document arrays are not supported by the plugin. This pins only what
// `MemoryDocument` reports for an element edit.
#[test]
fn memory_document_reports_element_edit_as_change() {
    let mut schema = user_schema(false);
    schema.define_path("nicknames", FieldSpec::array()).unwrap();
    let fx = Fixture::new(schema, PluginOptions::new());
    let mut user = fx.new_user();
    user.set("nicknames", json!([{"name": "Ada"}]));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());

    user.set("nicknames.0.name", json!("Enchantress"));
    fx.save(&mut user).unwrap();
    assert!(user.get_i64("modified.date").unwrap() > user.get_i64("created").unwrap());
}

// ── Tagged paths ─────────────────────────────────────────────────

#[test]
fn unmatched_path_does_not_stamp() {
    let fx = Fixture::new(user_schema(true), PluginOptions::new());
    let mut user = fx.saved_user();

    user.set("username", json!("countess"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());

    user.set("name.last", json!("King"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());
}

#[test]
fn matched_path_stamps() {
    let fx = Fixture::new(user_schema(true), PluginOptions::new());
    let mut user = fx.saved_user();

    user.set("name.first", json!("Augusta"));
    fx.save(&mut user).unwrap();
    assert!(user.get_i64("modified.date").unwrap() > user.get_i64("created").unwrap());
}

#[test]
fn three_save_scenario() {
    let fx = Fixture::new(user_schema(true), PluginOptions::new());
    let mut user = fx.new_user();

    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());

    user.set("username", json!("countess"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());

    user.set("name.first", json!("Augusta"));
    fx.save(&mut user).unwrap();
    assert!(user.get_i64("modified.date").unwrap() > user.get_i64("created").unwrap());
}

#[test]
fn explicit_paths_override_tags() {
    let fx = Fixture::new(user_schema(true), PluginOptions::new().watch("username"));
    let mut user = fx.saved_user();

    user.set("name.first", json!("Augusta"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());

    user.set("username", json!("countess"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_some());
}

// ── Required actor ───────────────────────────────────────────────

fn required_actor() -> Fixture {
    Fixture::new(user_schema(true), PluginOptions::new().require_actor())
}

#[test]
fn actor_not_required_on_new_documents() {
    let fx = required_actor();
    let user = fx.saved_user();
    assert!(user.get("modified.date").is_none());
    assert!(user.get("modified.by").is_none());
}

#[test]
fn actor_not_required_without_matched_change() {
    let fx = required_actor();
    let mut user = fx.saved_user();

    user.set("name.last", json!("King"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_none());
    assert!(user.get("modified.by").is_none());
}

#[test]
fn actor_required_with_matched_change() {
    let fx = required_actor();
    let mut user = fx.saved_user();

    user.set("name.first", json!("Augusta"));
    let err = fx.save(&mut user).unwrap_err();
    assert_eq!(err.validation().unwrap().paths(), vec!["modified.by"]);
    assert!(user.get("modified.date").is_none());
}

#[test]
fn actor_set_alongside_change_stamps() {
    let fx = required_actor();
    let mut user = fx.saved_user();
    let before = fx.clock.advance(0);

    user.set("name.first", json!("Augusta"));
    user.set("modified.by", json!("babbage"));
    fx.save(&mut user).unwrap();

    let stamped = user.get_i64("modified.date").unwrap();
    assert!(stamped > user.get_i64("created").unwrap());
    assert!(stamped >= before);
    assert_eq!(user.get_str("modified.by"), Some("babbage"));
}

#[test]
fn retried_save_is_stamped_when_it_succeeds() {
    let fx = required_actor();
    let mut user = fx.saved_user();

    user.set("name.first", json!("Augusta"));
    assert!(fx.save(&mut user).is_err());
    fx.clock.advance(1_000);

    user.set("modified.by", json!("babbage"));
    fx.save(&mut user).unwrap();
    assert_eq!(
        user.get_i64("modified.date"),
        Some(START_MILLIS + 1 + 1 + 1_000 + 1)
    );
}

fn stamped_once() -> (Fixture, MemoryDocument) {
    let fx = required_actor();
    let mut user = fx.saved_user();
    user.set("name.first", json!("Augusta"));
    user.set("modified.by", json!("babbage"));
    fx.save(&mut user).unwrap();
    (fx, user)
}

#[test]
fn subsequent_saves_still_require_actor() {
    let (fx, mut user) = stamped_once();
    let previous = user.get("modified.date").cloned();

    user.set("name.first", json!("Ada"));
    let err = fx.save(&mut user).unwrap_err();
    assert_eq!(err.validation().unwrap().paths(), vec!["modified.by"]);
    assert_eq!(user.get("modified.date").cloned(), previous);
}

#[test]
fn subsequent_saves_advance_date() {
    let (fx, mut user) = stamped_once();
    let previous = user.get_i64("modified.date").unwrap();

    user.set("name.first", json!("Ada"));
    user.set("modified.by", json!("menabrea"));
    fx.save(&mut user).unwrap();
    assert!(user.get_i64("modified.date").unwrap() > previous);
}

#[test]
fn same_actor_value_counts_as_update() {
    let (fx, mut user) = stamped_once();
    let previous = user.get_i64("modified.date").unwrap();

    user.set("name.first", json!("Ada"));
    let actor = user.get("modified.by").cloned().unwrap();
    user.set("modified.by", actor);
    fx.save(&mut user).unwrap();
    assert!(user.get_i64("modified.date").unwrap() > previous);
}

// ── Actor disabled ───────────────────────────────────────────────

#[test]
fn without_actor_only_date_is_written() {
    let fx = Fixture::new(user_schema(false), PluginOptions::new().without_actor());
    let mut user = fx.saved_user();
    user.set("username", json!("countess"));
    fx.save(&mut user).unwrap();
    assert!(user.get("modified.date").is_some());
    assert!(user.get("modified").unwrap().get("by").is_none());
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn documents_save_independently_across_threads() {
    let fx = Fixture::new(user_schema(true), PluginOptions::new());
    let model = fx.model.clone();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let model = model.clone();
            thread::spawn(move || {
                let mut user = model.new_document(common::user_data(0));
                model.save(&mut user).unwrap();
                if i % 2 == 0 {
                    user.set("name.first", json!(format!("first-{i}")));
                } else {
                    user.set("username", json!(format!("user-{i}")));
                }
                model.save(&mut user).unwrap();
                (i, user.get("modified.date").is_some())
            })
        })
        .collect();

    for handle in handles {
        let (i, stamped) = handle.join().unwrap();
        assert_eq!(stamped, i % 2 == 0, "document {i}");
    }
}
