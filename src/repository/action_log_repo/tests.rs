use super::ActionLogRepository;
use crate::domain::action_log::{ActionLog, ActionType};
use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn make_test_log(period_id: &str, action_type: ActionType, actor: &str) -> ActionLog {
    ActionLog::new(Some(period_id.to_string()), action_type, actor).with_detail("Test log")
}

#[test]
fn test_insert_and_find_by_id() {
    let repo = ActionLogRepository::new(setup_test_db());

    let log = make_test_log("p1", ActionType::AssignQuantifiers, "user1")
        .with_payload(&serde_json::json!({"quantifiers": 5}));
    let action_id = repo.insert(&log).unwrap();
    assert_eq!(action_id, log.action_id);

    let found = repo.find_by_id(&action_id).unwrap().unwrap();
    assert_eq!(found.period_id, Some("p1".to_string()));
    assert_eq!(found.actor, "user1");
    assert_eq!(found.action_type(), Some(ActionType::AssignQuantifiers));
    assert_eq!(found.payload_json.unwrap()["quantifiers"], 5);
}

#[test]
fn test_find_missing_returns_none() {
    let repo = ActionLogRepository::new(setup_test_db());
    assert!(repo.find_by_id("nope").unwrap().is_none());
}

#[test]
fn test_find_by_period_id_orders_newest_first() {
    let repo = ActionLogRepository::new(setup_test_db());

    let mut older = make_test_log("p1", ActionType::AssignQuantifiers, "user1");
    older.action_ts = Utc::now().naive_utc() - Duration::hours(1);
    let newer = make_test_log("p1", ActionType::ReplaceQuantifier, "user2");
    let other = make_test_log("p2", ActionType::ClosePeriod, "user1");

    repo.insert(&older).unwrap();
    repo.insert(&newer).unwrap();
    repo.insert(&other).unwrap();

    let logs = repo.find_by_period_id("p1").unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action_id, newer.action_id);
    assert_eq!(logs[1].action_id, older.action_id);
    assert_eq!(repo.count_by_period("p1").unwrap(), 2);
    assert_eq!(repo.count_by_period("p2").unwrap(), 1);
}

#[test]
fn test_batch_insert_and_type_filter() {
    let repo = ActionLogRepository::new(setup_test_db());

    let logs = vec![
        make_test_log("p1", ActionType::AssignmentDeficit, "system"),
        make_test_log("p1", ActionType::AssignmentDeficit, "system"),
        make_test_log("p1", ActionType::AssignQuantifiers, "system"),
    ];
    assert_eq!(repo.batch_insert(logs).unwrap(), 3);

    let deficits = repo
        .find_by_action_type(ActionType::AssignmentDeficit.as_str(), 10)
        .unwrap();
    assert_eq!(deficits.len(), 2);
    assert_eq!(repo.find_recent(1).unwrap().len(), 1);
}
