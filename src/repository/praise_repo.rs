// ==========================================
// 赞誉量化分配系统 - 赞誉数据仓储
// ==========================================
// 职责: 按周期窗口聚合接收人、统计赞誉条数、维护对外得分
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::period::{PeriodWindow, ReceiverSummary};
use crate::domain::praise::{Praise, Receiver};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::window_params;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

// ==========================================
// PraiseRepository - 赞誉仓储
// ==========================================
pub struct PraiseRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PraiseRepository {
    /// 创建新的PraiseRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量插入赞誉
    pub fn batch_insert(&self, praises: &[Praise]) -> RepositoryResult<usize> {
        if praises.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO praise (praise_id, receiver_id, giver_id, reason, praise_date, score)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )?;
            for p in praises {
                stmt.execute(params![
                    p.praise_id,
                    p.receiver_id,
                    p.giver_id,
                    p.reason,
                    p.praise_date.format("%Y-%m-%d").to_string(),
                    p.score,
                ])?;
            }
        }
        tx.commit()?;
        Ok(praises.len())
    }

    /// 按接收人聚合周期窗口内的赞誉
    ///
    /// 接收人按 receiver_id 升序；赞誉按日期、ID 升序
    pub fn list_receivers_with_praise(&self, window: &PeriodWindow) -> RepositoryResult<Vec<Receiver>> {
        let conn = self.get_conn()?;
        let (start, end) = window_params(window);

        let mut stmt = conn.prepare(
            r#"SELECT receiver_id, praise_id
               FROM praise
               WHERE (?1 IS NULL OR praise_date > ?1) AND praise_date <= ?2
               ORDER BY receiver_id, praise_date, praise_id"#,
        )?;

        let rows = stmt
            .query_map(params![start, end], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (receiver_id, praise_id) in rows {
            grouped.entry(receiver_id).or_default().push(praise_id);
        }

        Ok(grouped
            .into_iter()
            .map(|(receiver_id, praise_ids)| Receiver::new(receiver_id, praise_ids))
            .collect())
    }

    /// 统计周期窗口内的赞誉条数
    pub fn count_in_window(&self, window: &PeriodWindow) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let (start, end) = window_params(window);
        let count = conn.query_row(
            r#"SELECT COUNT(*) FROM praise
               WHERE (?1 IS NULL OR praise_date > ?1) AND praise_date <= ?2"#,
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 按ID批量查询
    pub fn find_by_ids(&self, praise_ids: &[String]) -> RepositoryResult<Vec<Praise>> {
        if praise_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let placeholders = vec!["?"; praise_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT praise_id, receiver_id, giver_id, reason, praise_date, score
               FROM praise WHERE praise_id IN ({})
               ORDER BY praise_date, praise_id"#,
            placeholders
        );
        let values: Vec<Value> = praise_ids.iter().map(|id| Value::from(id.clone())).collect();

        let mut stmt = conn.prepare(&sql)?;
        let praises = stmt
            .query_map(params_from_iter(values), map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(praises)
    }

    /// 更新单条赞誉的对外得分
    pub fn update_score(&self, praise_id: &str, score: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE praise SET score = ?1 WHERE praise_id = ?2",
            params![score, praise_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Praise".to_string(),
                id: praise_id.to_string(),
            });
        }
        Ok(())
    }

    /// 周期窗口内的接收人汇总
    pub fn summarize_receivers(&self, window: &PeriodWindow) -> RepositoryResult<Vec<ReceiverSummary>> {
        let conn = self.get_conn()?;
        let (start, end) = window_params(window);
        let mut stmt = conn.prepare(
            r#"SELECT receiver_id, COUNT(*), COALESCE(SUM(score), 0)
               FROM praise
               WHERE (?1 IS NULL OR praise_date > ?1) AND praise_date <= ?2
               GROUP BY receiver_id
               ORDER BY receiver_id"#,
        )?;
        let summaries = stmt
            .query_map(params![start, end], |row| {
                Ok(ReceiverSummary {
                    receiver_id: row.get(0)?,
                    praise_count: row.get(1)?,
                    score_total: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(summaries)
    }
}

/// 在给定连接/事务上将赞誉得分重置为 0（待重新量化）
pub(crate) fn reset_scores_with(conn: &Connection, praise_ids: &[String]) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare("UPDATE praise SET score = 0 WHERE praise_id = ?1")?;
    let mut count = 0;
    for id in praise_ids {
        count += stmt.execute(params![id])?;
    }
    Ok(count)
}

fn map_row(row: &Row) -> SqliteResult<Praise> {
    let date_str: String = row.get(4)?;
    let praise_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Praise {
        praise_id: row.get(0)?,
        receiver_id: row.get(1)?,
        giver_id: row.get(2)?,
        reason: row.get(3)?,
        praise_date,
        score: row.get(5)?,
    })
}
