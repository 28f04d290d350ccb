// ==========================================
// 量化人分配全流程集成测试
// ==========================================
// 场景: 预检 → 提交 → 重复提交被拒 → 关闭周期
// 数据库: tempfile 临时文件
// ==========================================

mod helpers;

use helpers::api_test_helper::build_api;
use helpers::mock_config::MockConfig;
use praise_quant::api::ApiError;
use praise_quant::domain::{ActionType, PeriodStatus};
use praise_quant::engine::AssignmentRepositories;
use std::collections::{HashMap, HashSet};
use test_helpers::*;

/// 窗口内每条赞誉的量化人集合
fn quantifiers_by_praise(repos: &AssignmentRepositories, period_id: &str) -> HashMap<String, Vec<String>> {
    let period = repos.period_repo.get(period_id).unwrap();
    let window = repos.period_repo.window_for(&period).unwrap();
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for q in repos.quantification_repo.find_in_window(&window).unwrap() {
        map.entry(q.praise_id).or_default().push(q.quantifier_id);
    }
    map
}

fn quantification_count(repos: &AssignmentRepositories, period_id: &str) -> i64 {
    let period = repos.period_repo.get(period_id).unwrap();
    let window = repos.period_repo.window_for(&period).unwrap();
    repos.quantification_repo.count_in_window(&window).unwrap()
}

fn action_types(repos: &AssignmentRepositories, period_id: &str) -> Vec<ActionType> {
    repos
        .action_log_repo
        .find_by_period_id(period_id)
        .unwrap()
        .iter()
        .filter_map(|log| log.action_type())
        .collect()
}

// ==========================================
// 目标容量模式
// ==========================================

#[tokio::test]
async fn test_commit_assigns_each_praise_k_times_without_conflicts() {
    praise_quant::logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(2, 5));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 14);
    // u01 同时持有接收人账号 acc-r00
    repos.quantifier_repo.link_account("acc-r00", "u01", None).unwrap();
    let total = seed_receivers(&repos, &[3, 2, 4, 1, 2, 3], date(2024, 6, 10));

    let summary = api.commit_assignment("p1", "admin").await.unwrap();

    assert_eq!(summary.quantification_count, total * 2);
    assert_eq!(quantification_count(&repos, "p1"), (total * 2) as i64);

    let by_praise = quantifiers_by_praise(&repos, "p1");
    assert_eq!(by_praise.len(), total);
    for (praise_id, quantifiers) in &by_praise {
        let unique: HashSet<&String> = quantifiers.iter().collect();
        assert_eq!(quantifiers.len(), 2, "praise {} should have 2 quantifiers", praise_id);
        assert_eq!(unique.len(), 2, "praise {} has duplicate quantifier", praise_id);
    }

    // 回避: u01 不会量化 acc-r00 的赞誉
    let own_praise: Vec<&String> = by_praise.keys().filter(|id| id.starts_with("acc-r00")).collect();
    assert!(!own_praise.is_empty());
    for praise_id in own_praise {
        assert!(!by_praise[praise_id].contains(&"u01".to_string()));
    }

    let period = repos.period_repo.get("p1").unwrap();
    assert_eq!(period.status, PeriodStatus::Quantify);
    assert_eq!(action_types(&repos, "p1"), vec![ActionType::AssignQuantifiers]);
}

#[tokio::test]
async fn test_second_commit_is_rejected_without_writes() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(2, 5));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 10);
    seed_receivers(&repos, &[2, 2, 2], date(2024, 6, 10));

    api.commit_assignment("p1", "admin").await.unwrap();
    let before = quantification_count(&repos, "p1");

    let err = api.commit_assignment("p1", "admin").await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed(_)));
    assert_eq!(quantification_count(&repos, "p1"), before);
}

#[tokio::test]
async fn test_commit_rejected_when_window_already_has_quantifications() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(1, 5));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 4);
    seed_receivers(&repos, &[2], date(2024, 6, 10));

    // 周期仍为 OPEN，但已有一条量化记录
    let period = repos.period_repo.get("p1").unwrap();
    let window = repos.period_repo.window_for(&period).unwrap();
    let receivers = repos.praise_repo.list_receivers_with_praise(&window).unwrap();
    let praise_id = receivers[0].praise_ids[0].clone();
    let conn = open_shared_conn(&db_path).unwrap();
    conn.lock()
        .unwrap()
        .execute(
            "INSERT INTO quantification (quantification_id, praise_id, quantifier_id, created_at, updated_at)
             VALUES ('q-manual', ?1, 'u01', '2024-06-11 00:00:00', '2024-06-11 00:00:00')",
            [&praise_id],
        )
        .unwrap();

    let err = api.commit_assignment("p1", "admin").await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed(_)));
    assert_eq!(quantification_count(&repos, "p1"), 1);
    assert_eq!(repos.period_repo.get("p1").unwrap().status, PeriodStatus::Open);
}

#[tokio::test]
async fn test_deficit_leaves_period_untouched() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(3, 2));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 2);
    seed_receivers(&repos, &[2, 2, 2, 2], date(2024, 6, 10));

    let err = api.commit_assignment("p1", "admin").await.unwrap_err();
    match err {
        ApiError::AssignmentDeficit {
            remaining_assignments,
            remaining_items,
        } => {
            assert!(remaining_assignments > 0);
            assert!(remaining_items > 0);
        }
        other => panic!("Expected AssignmentDeficit, got {:?}", other),
    }

    assert_eq!(quantification_count(&repos, "p1"), 0);
    assert_eq!(repos.period_repo.get("p1").unwrap().status, PeriodStatus::Open);
    assert_eq!(action_types(&repos, "p1"), vec![ActionType::AssignmentDeficit]);
}

#[tokio::test]
async fn test_commit_requires_open_period() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(1, 5));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Closed);
    seed_quantifier_pool(&repos, 3);
    seed_receivers(&repos, &[1], date(2024, 6, 10));

    let err = api.commit_assignment("p1", "admin").await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed(_)));
    assert_eq!(quantification_count(&repos, "p1"), 0);
}

#[tokio::test]
async fn test_commit_only_assigns_praise_inside_window() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(1, 10));

    seed_period(&repos, "p0", date(2024, 5, 31), PeriodStatus::Closed);
    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 5);
    seed_praise(&repos, "acc-old", 3, date(2024, 5, 15));
    seed_praise(&repos, "acc-edge", 1, date(2024, 5, 31));
    seed_praise(&repos, "acc-new", 2, date(2024, 6, 1));
    seed_praise(&repos, "acc-late", 2, date(2024, 7, 1));

    let summary = api.commit_assignment("p1", "admin").await.unwrap();

    assert_eq!(summary.quantification_count, 2);
    let by_praise = quantifiers_by_praise(&repos, "p1");
    assert!(by_praise.keys().all(|id| id.starts_with("acc-new")));
}

// ==========================================
// 均分模式
// ==========================================

#[tokio::test]
async fn test_even_mode_balances_workload() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::even(3));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 5);
    let total = seed_receivers(&repos, &[5, 5, 5, 5, 5, 1, 1, 1, 1, 1], date(2024, 6, 10));

    let summary = api.commit_assignment("p1", "admin").await.unwrap();
    assert_eq!(summary.quantifier_count, 5);
    assert_eq!(summary.quantification_count, total * 3);

    let details = api.period_details("p1").unwrap();
    assert_eq!(details.quantifiers.len(), 5);
    assert!(details.quantifiers.iter().all(|q| q.praise_count == 18));
    assert!(details.quantifiers.iter().all(|q| q.finished_count == 0));
}

#[tokio::test]
async fn test_even_mode_small_pool_fails_precondition() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::even(2));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 1);
    seed_receivers(&repos, &[2, 2, 2], date(2024, 6, 10));

    let report = api.preview_pool_requirements("p1").await.unwrap();
    assert_eq!(report.pool_size, 1);
    assert_eq!(report.pool_size_needed, 2);
    assert_eq!(report.pool_deficit, 1);

    let err = api.commit_assignment("p1", "admin").await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed(_)));
    assert_eq!(quantification_count(&repos, "p1"), 0);
}

// ==========================================
// 预检
// ==========================================

#[tokio::test]
async fn test_preview_is_read_only_and_repeatable() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(3, 2));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 2);
    seed_receivers(&repos, &[2, 2, 2, 2], date(2024, 6, 10));

    let first = api.preview_pool_requirements("p1").await.unwrap();
    let second = api.preview_pool_requirements("p1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.pool_size, 2);
    assert!(first.pool_deficit > 0);
    assert_eq!(first.pool_size_needed, 2 + first.pool_deficit);

    assert_eq!(quantification_count(&repos, "p1"), 0);
    assert_eq!(repos.period_repo.get("p1").unwrap().status, PeriodStatus::Open);
    assert!(action_types(&repos, "p1").is_empty());
}

#[tokio::test]
async fn test_preview_even_mode_short_circuits() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::even(2));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 4);
    seed_receivers(&repos, &[3, 1, 2], date(2024, 6, 10));

    let report = api.preview_pool_requirements("p1").await.unwrap();
    assert_eq!(report.pool_size, 4);
    assert_eq!(report.pool_deficit, 0);
}

#[tokio::test]
async fn test_preview_even_mode_ignores_conflicts() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::even(2));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    // u01 关联接收人 acc-r00，两个最终箱都包含 acc-r00
    seed_quantifier(&repos, "u01", &["acc-u01", "acc-r00"]);
    seed_quantifier(&repos, "u02", &["acc-u02"]);
    seed_receivers(&repos, &[1, 1], date(2024, 6, 10));

    let report = api.preview_pool_requirements("p1").await.unwrap();
    assert_eq!(report.pool_deficit, 0);

    let err = api.commit_assignment("p1", "admin").await.unwrap_err();
    assert!(matches!(err, ApiError::AssignmentDeficit { .. }));
    assert_eq!(quantification_count(&repos, "p1"), 0);
}

// ==========================================
// 周期关闭 / 入参校验
// ==========================================

#[tokio::test]
async fn test_close_period_after_assignment() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(1, 5));

    seed_period(&repos, "p1", date(2024, 6, 30), PeriodStatus::Open);
    seed_quantifier_pool(&repos, 3);
    seed_receivers(&repos, &[2, 1], date(2024, 6, 10));

    // OPEN 不能直接关闭
    match api.close_period("p1", "admin").await {
        Err(ApiError::InvalidStateTransition { from, to }) => {
            assert_eq!(from, PeriodStatus::Open.to_string());
            assert_eq!(to, PeriodStatus::Closed.to_string());
        }
        other => panic!("Expected InvalidStateTransition, got {:?}", other),
    }

    api.commit_assignment("p1", "admin").await.unwrap();
    api.close_period("p1", "admin").await.unwrap();

    assert_eq!(repos.period_repo.get("p1").unwrap().status, PeriodStatus::Closed);
    let logs = api.list_action_logs("p1").unwrap();
    assert_eq!(logs[0].action_type(), Some(ActionType::ClosePeriod));

    // CLOSED 为终态
    assert!(matches!(
        api.close_period("p1", "admin").await,
        Err(ApiError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_blank_inputs_are_rejected() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, _repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(1, 5));

    assert!(matches!(
        api.preview_pool_requirements(" ").await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.commit_assignment("p1", "").await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(api.period_details(""), Err(ApiError::InvalidInput(_))));
}

#[tokio::test]
async fn test_unknown_period_is_not_found() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let (api, _repos) = build_api(open_shared_conn(&db_path).unwrap(), MockConfig::target_size(1, 5));

    assert!(matches!(
        api.commit_assignment("missing", "admin").await,
        Err(ApiError::NotFound(_))
    ));
}
