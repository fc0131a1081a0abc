//! History persistence properties
//!
//! The on-disk history file is append-only: consecutive saves, and saves
//! from later process runs, extend it without ever rewriting prior
//! content.

use sotto::history::{ConversationLog, Role};

#[test]
fn consecutive_saves_never_truncate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversation_history.txt");

    let mut log = ConversationLog::new(path.clone(), 40);
    log.record(Role::User, "first turn");
    log.save().unwrap();
    let after_first = std::fs::read_to_string(&path).unwrap();

    log.record(Role::Assistant, "second turn");
    log.save().unwrap();
    let after_second = std::fs::read_to_string(&path).unwrap();

    assert!(after_second.starts_with(&after_first));
    assert!(after_second.contains("second turn"));
    assert_eq!(after_second.matches("first turn").count(), 1);
}

#[test]
fn save_without_new_entries_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversation_history.txt");

    let mut log = ConversationLog::new(path.clone(), 40);
    log.record(Role::User, "only turn");
    log.save().unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    log.save().unwrap();
    let second = std::fs::read_to_string(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn later_runs_append_to_the_same_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversation_history.txt");

    let mut first_run = ConversationLog::new(path.clone(), 40);
    first_run.record(Role::User, "from the first run");
    first_run.save().unwrap();

    let mut second_run = ConversationLog::new(path.clone(), 40);
    second_run.record(Role::User, "from the second run");
    second_run.save().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("from the first run"));
    assert!(contents.contains("from the second run"));

    let transcript = second_run.transcript().unwrap();
    assert_eq!(transcript, contents);
}

#[test]
fn session_header_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversation_history.txt");

    let mut log = ConversationLog::new(path.clone(), 40).with_header("--- session abc ---");
    log.record(Role::User, "one");
    log.save().unwrap();
    log.record(Role::User, "two");
    log.save().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("--- session abc ---").count(), 1);
    assert!(contents.contains("one"));
    assert!(contents.contains("two"));
}

#[test]
fn event_entries_persist_alongside_turns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conversation_history.txt");

    let mut log = ConversationLog::new(path.clone(), 40);
    log.record(Role::User, "run uptime");
    log.record(Role::Event, "executed command: uptime");
    log.save().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("user: run uptime"));
    assert!(contents.contains("event: executed command: uptime"));
}
