use std::time::Duration;

use tempfile::tempdir;
use typemaster::{
    clock::ManualClock,
    history::{HistoryStore, HISTORY_KEY, HISTORY_LIMIT},
    session::SessionController,
    storage::{KvStore, SqliteStore},
};

fn run_session(controller: &mut SessionController<SqliteStore, ManualClock>, clock: &ManualClock) {
    controller.start("the cat sat", 60).unwrap();
    clock.advance(Duration::from_secs(6));
    controller.poll();
    controller.submit_input("the cat sat");
}

#[test]
fn finished_sessions_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("history.db");
    let clock = ManualClock::default();

    {
        let store = SqliteStore::open(&path).unwrap();
        let mut controller = SessionController::with_clock(HistoryStore::new(store), clock.clone());
        run_session(&mut controller, &clock);
        run_session(&mut controller, &clock);
    }

    let history = HistoryStore::new(SqliteStore::open(&path).unwrap());
    let log = history.list();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].accuracy, 100);
    assert_eq!(log[0].elapsed_secs, 6);
    assert_eq!(log[0].total_chars_typed, 11);
    // 11 correct chars over 6 seconds
    assert_eq!(log[0].wpm, 22);
    assert_eq!(log[0].cpm, 110);
    assert!(log[0].timestamp >= log[1].timestamp);
}

#[test]
fn stored_document_uses_camel_case_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");
    let clock = ManualClock::default();

    let store = SqliteStore::open(&path).unwrap();
    let mut controller = SessionController::with_clock(HistoryStore::new(store), clock.clone());
    run_session(&mut controller, &clock);

    let doc = controller
        .history()
        .store()
        .get(HISTORY_KEY)
        .unwrap()
        .unwrap();
    let entry = &doc.as_array().unwrap()[0];
    assert!(entry.get("totalCharsTyped").is_some());
    assert!(entry.get("correctWords").is_some());
    assert!(entry.get("elapsedSecs").is_some());
}

#[test]
fn history_is_capped_and_clearable_on_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");
    let clock = ManualClock::default();

    let store = SqliteStore::open(&path).unwrap();
    let mut controller = SessionController::with_clock(HistoryStore::new(store), clock.clone());
    for _ in 0..HISTORY_LIMIT + 3 {
        run_session(&mut controller, &clock);
    }
    assert_eq!(controller.history().list().len(), HISTORY_LIMIT);

    assert!(controller.history_mut().clear());
    drop(controller);

    let reopened = HistoryStore::new(SqliteStore::open(&path).unwrap());
    assert!(reopened.list().is_empty());
}

#[test]
fn export_writes_csv_rows() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::default();
    let store = SqliteStore::open(dir.path().join("history.db")).unwrap();
    let mut controller = SessionController::with_clock(HistoryStore::new(store), clock.clone());
    run_session(&mut controller, &clock);

    let csv_path = dir.path().join("history.csv");
    let rows = controller.history().export_csv(&csv_path).unwrap();
    assert_eq!(rows, 1);

    let contents = std::fs::read_to_string(csv_path).unwrap();
    let mut lines = contents.lines();
    assert!(lines.next().unwrap().contains("wpm"));
    assert!(lines.next().unwrap().contains(",22,110,100,6,"));
}
