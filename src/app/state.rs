// ==========================================
// 赞誉量化分配系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::AssignmentApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::{
    AssignmentOrchestrator, AssignmentRepositories, PeriodLocks, QuantifierReplacementService,
};

/// 应用状态
///
/// 所有仓储、引擎、API 共享同一数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 仓储集合
    pub repos: AssignmentRepositories,

    /// 量化人分配API
    pub assignment_api: Arc<AssignmentApi<ConfigManager>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并初始化表结构
    /// 2. 初始化所有Repository
    /// 3. 初始化编排器与替换服务（共享周期锁）
    /// 4. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("初始化表结构失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let repos = AssignmentRepositories::from_connection(conn);
        let locks = Arc::new(PeriodLocks::new());

        let orchestrator = Arc::new(AssignmentOrchestrator::new(
            config.clone(),
            repos.clone(),
            locks.clone(),
        ));
        let replacement = Arc::new(QuantifierReplacementService::new(repos.clone(), locks));
        let assignment_api = Arc::new(AssignmentApi::new(orchestrator, replacement, repos.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            config,
            repos,
            assignment_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PRAISE_QUANT_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("PRAISE_QUANT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./praise_quant.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("praise-quant");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("praise_quant.db");
        }
    }

    path.to_string_lossy().to_string()
}
