// ==========================================
// 赞誉量化分配系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（schema_version 记录当前版本）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS period (
            period_id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'OPEN',
            end_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS quantifier (
            user_id TEXT PRIMARY KEY,
            display_name TEXT,
            eligible INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS user_account (
            account_id TEXT PRIMARY KEY,
            user_id TEXT,
            platform TEXT
        );

        CREATE TABLE IF NOT EXISTS praise (
            praise_id TEXT PRIMARY KEY,
            receiver_id TEXT NOT NULL,
            giver_id TEXT NOT NULL,
            reason TEXT NOT NULL DEFAULT '',
            praise_date TEXT NOT NULL,
            score REAL NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_praise_date ON praise(praise_date);
        CREATE INDEX IF NOT EXISTS idx_praise_receiver ON praise(receiver_id);

        CREATE TABLE IF NOT EXISTS quantification (
            quantification_id TEXT PRIMARY KEY,
            praise_id TEXT NOT NULL REFERENCES praise(praise_id) ON DELETE CASCADE,
            quantifier_id TEXT NOT NULL REFERENCES quantifier(user_id),
            score REAL NOT NULL DEFAULT 0,
            dismissed INTEGER NOT NULL DEFAULT 0,
            duplicate_praise_id TEXT REFERENCES praise(praise_id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (praise_id, quantifier_id)
        );
        CREATE INDEX IF NOT EXISTS idx_quantification_quantifier ON quantification(quantifier_id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            period_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_action_log_period ON action_log(period_id, action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
