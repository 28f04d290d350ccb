// ==========================================
// API 测试辅助
// ==========================================

use super::mock_config::MockConfig;
use praise_quant::api::AssignmentApi;
use praise_quant::engine::{
    AssignmentOrchestrator, AssignmentRepositories, PeriodLocks, QuantifierReplacementService,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub const TEST_SEED: u64 = 20240630;

/// 组装测试用 API（固定随机种子）
pub fn build_api(
    conn: Arc<Mutex<Connection>>,
    config: MockConfig,
) -> (AssignmentApi<MockConfig>, AssignmentRepositories) {
    let repos = AssignmentRepositories::from_connection(conn);
    let locks = Arc::new(PeriodLocks::new());
    let orchestrator = Arc::new(
        AssignmentOrchestrator::new(Arc::new(config), repos.clone(), locks.clone())
            .with_seed(TEST_SEED),
    );
    let replacement = Arc::new(QuantifierReplacementService::new(repos.clone(), locks));
    (
        AssignmentApi::new(orchestrator, replacement, repos.clone()),
        repos,
    )
}
