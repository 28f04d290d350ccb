// ==========================================
// 赞誉量化分配系统 - 量化人池数据仓储
// ==========================================
// 职责: 量化人池、用户与账号的关联（利益冲突来源）
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::quantifier::Quantifier;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ==========================================
// QuantifierRepository - 量化人仓储
// ==========================================
pub struct QuantifierRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QuantifierRepository {
    /// 创建新的QuantifierRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或更新量化人
    pub fn upsert(&self, user_id: &str, display_name: Option<&str>, eligible: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO quantifier (user_id, display_name, eligible) VALUES (?1, ?2, ?3)
               ON CONFLICT(user_id) DO UPDATE SET display_name = ?2, eligible = ?3"#,
            params![user_id, display_name, if eligible { 1 } else { 0 }],
        )?;
        Ok(())
    }

    /// 关联账号到用户（同一账号只能属于一个用户）
    pub fn link_account(&self, account_id: &str, user_id: &str, platform: Option<&str>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO user_account (account_id, user_id, platform) VALUES (?1, ?2, ?3)
               ON CONFLICT(account_id) DO UPDATE SET user_id = ?2, platform = ?3"#,
            params![account_id, user_id, platform],
        )?;
        Ok(())
    }

    /// 查询可参与量化的量化人（随机顺序，conflict_ids 已填充）
    pub fn list_eligible(&self) -> RepositoryResult<Vec<Quantifier>> {
        let conn = self.get_conn()?;

        let mut accounts: HashMap<String, HashSet<String>> = HashMap::new();
        {
            let mut stmt = conn.prepare(
                r#"SELECT ua.user_id, ua.account_id
                   FROM user_account ua
                   JOIN quantifier q ON q.user_id = ua.user_id
                   WHERE q.eligible = 1"#,
            )?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<SqliteResult<Vec<_>>>()?;
            for (user_id, account_id) in rows {
                accounts.entry(user_id).or_default().insert(account_id);
            }
        }

        let mut stmt = conn.prepare("SELECT user_id FROM quantifier WHERE eligible = 1 ORDER BY RANDOM()")?;
        let user_ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(user_ids
            .into_iter()
            .map(|user_id| {
                let conflict_ids = accounts.remove(&user_id).unwrap_or_default();
                Quantifier::new(user_id, conflict_ids)
            })
            .collect())
    }

    /// 量化人是否存在
    pub fn exists(&self, user_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM quantifier WHERE user_id = ?1",
                params![user_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(found)
    }

    /// 用户关联的全部账号
    pub fn conflict_ids_for(&self, user_id: &str) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT account_id FROM user_account WHERE user_id = ?1")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<HashSet<_>>>()?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> QuantifierRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        QuantifierRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_eligible_pool_with_conflicts() {
        let repo = setup();
        repo.upsert("u1", Some("Alice"), true).unwrap();
        repo.upsert("u2", None, true).unwrap();
        repo.upsert("u3", None, false).unwrap();
        repo.link_account("discord-1", "u1", Some("DISCORD")).unwrap();
        repo.link_account("eth-1", "u1", Some("ETH")).unwrap();
        repo.link_account("discord-3", "u3", Some("DISCORD")).unwrap();

        let mut pool = repo.list_eligible().unwrap();
        pool.sort_by(|a, b| a.quantifier_id.cmp(&b.quantifier_id));

        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].quantifier_id, "u1");
        assert_eq!(pool[0].conflict_ids.len(), 2);
        assert!(pool[0].conflict_ids.contains("eth-1"));
        assert!(pool[1].conflict_ids.is_empty());
        assert!(pool.iter().all(|q| q.assigned_receivers.is_empty()));
    }

    #[test]
    fn test_exists_and_conflict_ids() {
        let repo = setup();
        repo.upsert("u1", None, false).unwrap();
        repo.link_account("a1", "u1", None).unwrap();

        assert!(repo.exists("u1").unwrap());
        assert!(!repo.exists("u9").unwrap());
        assert_eq!(repo.conflict_ids_for("u1").unwrap(), HashSet::from(["a1".to_string()]));
    }
}
