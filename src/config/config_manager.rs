// ==========================================
// 赞誉量化分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 周期作用域 > 全局作用域 > 代码默认值
// ==========================================

use crate::config::assignment_config_trait::AssignmentConfigReader;
use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::AssignmentMode;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                        // 全局
    Period { period_id: String },  // 单个量化周期
}

impl ConfigScope {
    pub fn period(period_id: &str) -> Self {
        ConfigScope::Period {
            period_id: period_id.to_string(),
        }
    }

    /// config_kv.scope_id
    pub fn scope_id(&self) -> &str {
        match self {
            ConfigScope::Global => "global",
            ConfigScope::Period { period_id } => period_id,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取指定作用域的原始配置值（不回落）
    pub fn get_scoped_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 按 周期 → 全局 的顺序读取配置值
    pub fn get_period_value(&self, period_id: &str, key: &str) -> ConfigResult<Option<String>> {
        if let Some(v) = self.get_scoped_value(&ConfigScope::period(period_id), key)? {
            return Ok(Some(v));
        }
        self.get_scoped_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（UPSERT）
    pub fn set_value(&self, scope: &ConfigScope, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
               ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')"#,
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 删除配置值
    pub fn remove_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
        )?;
        Ok(rows > 0)
    }

    /// 获取作用域内所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 在提交分配时记录配置快照，便于事后追溯
    pub fn get_config_snapshot(&self, scope: &ConfigScope) -> ConfigResult<String> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![scope.scope_id()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析配置值，解析失败时回落到默认值
    fn get_parsed_or_default<T>(&self, period_id: &str, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy,
    {
        let raw = match self.get_period_value(period_id, key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    period_id,
                    config_key = key,
                    raw_value = %raw,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// AssignmentConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AssignmentConfigReader for ConfigManager {
    async fn get_quantifiers_per_receiver(&self, period_id: &str) -> ConfigResult<usize> {
        self.get_parsed_or_default(period_id, config_keys::QUANTIFIERS_PER_RECEIVER, 3usize)
    }

    async fn get_praise_per_quantifier(&self, period_id: &str) -> ConfigResult<i64> {
        self.get_parsed_or_default(period_id, config_keys::PRAISE_PER_QUANTIFIER, 50i64)
    }

    async fn get_tolerance(&self, period_id: &str) -> ConfigResult<f64> {
        self.get_parsed_or_default(period_id, config_keys::PRAISE_PER_QUANTIFIER_TOLERANCE, 1.2f64)
    }

    async fn get_assignment_mode(&self, period_id: &str) -> ConfigResult<AssignmentMode> {
        self.get_parsed_or_default(period_id, config_keys::ASSIGNMENT_MODE, AssignmentMode::TargetSize)
    }

    async fn get_max_attempts(&self, period_id: &str) -> ConfigResult<usize> {
        self.get_parsed_or_default(period_id, config_keys::ASSIGNMENT_MAX_ATTEMPTS, 5usize)
    }

    async fn get_conflict_retry_limit(&self, period_id: &str) -> ConfigResult<usize> {
        self.get_parsed_or_default(period_id, config_keys::ASSIGNMENT_CONFLICT_RETRY_LIMIT, 1usize)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 冗余度
    pub const QUANTIFIERS_PER_RECEIVER: &str = "quantifiers_per_praise_receiver";

    // 工作量
    pub const PRAISE_PER_QUANTIFIER: &str = "praise_per_quantifier";
    pub const PRAISE_PER_QUANTIFIER_TOLERANCE: &str = "praise_per_quantifier_tolerance";

    // 分配模式: target_size | even
    pub const ASSIGNMENT_MODE: &str = "assignment_mode";

    // 试算重试
    pub const ASSIGNMENT_MAX_ATTEMPTS: &str = "assignment_max_attempts";
    pub const ASSIGNMENT_CONFLICT_RETRY_LIMIT: &str = "assignment_conflict_retry_limit";
}
