// ==========================================
// 赞誉量化分配系统 - 量化记录数据仓储
// ==========================================
// 职责: 量化记录的批量写入、按量化人/赞誉/窗口查询、整体转移
// 红线: 分配提交与周期状态迁移必须在同一事务中完成
// ==========================================

use crate::domain::period::{PeriodWindow, QuantifierSummary};
use crate::domain::praise::Quantification;
use crate::domain::types::PeriodStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::period_repo::transition_with;
use crate::repository::praise_repo::reset_scores_with;
use crate::repository::window_params;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_IN_WINDOW: &str = r#"
    SELECT q.quantification_id, q.praise_id, q.quantifier_id, q.score, q.dismissed,
           q.duplicate_praise_id, q.created_at, q.updated_at
    FROM quantification q
    JOIN praise p ON p.praise_id = q.praise_id
    WHERE (?1 IS NULL OR p.praise_date > ?1) AND p.praise_date <= ?2
"#;

// ==========================================
// QuantificationRepository - 量化记录仓储
// ==========================================
pub struct QuantificationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QuantificationRepository {
    /// 创建新的QuantificationRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 提交分配结果: 写入量化记录并将周期 OPEN → QUANTIFY
    ///
    /// 事务内再次校验:
    /// - 周期仍为 OPEN
    /// - 窗口内不存在任何量化记录
    ///
    /// # 返回
    /// - `Ok(count)`: 写入的量化记录数
    /// - `Err(AlreadyAssigned | StalePeriodState)`: 并发提交被拒绝，无任何写入
    pub fn commit_assignment(
        &self,
        period_id: &str,
        window: &PeriodWindow,
        records: &[Quantification],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let existing = count_in_window_with(&tx, window)?;
        if existing > 0 {
            return Err(RepositoryError::AlreadyAssigned {
                period_id: period_id.to_string(),
                count: existing,
            });
        }

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO quantification (
                        quantification_id, praise_id, quantifier_id, score, dismissed,
                        duplicate_praise_id, created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )?;
            for r in records {
                stmt.execute(params![
                    r.quantification_id,
                    r.praise_id,
                    r.quantifier_id,
                    r.score,
                    if r.dismissed { 1 } else { 0 },
                    r.duplicate_praise_id,
                    fmt_ts(&r.created_at),
                    fmt_ts(&r.updated_at),
                ])?;
            }
        }

        transition_with(&tx, period_id, PeriodStatus::Open, PeriodStatus::Quantify)?;

        tx.commit()?;
        Ok(records.len())
    }

    /// 将量化记录整体转移给新量化人，并重置为中性状态
    ///
    /// - 仅转移仍属于 `from_quantifier_id` 的记录，数量不符则整体回滚
    /// - 受影响赞誉的对外得分同步置 0
    pub fn reassign(
        &self,
        quantification_ids: &[String],
        from_quantifier_id: &str,
        to_quantifier_id: &str,
        affected_praise_ids: &[String],
        now: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut moved = 0;
        {
            let mut stmt = tx.prepare(
                r#"UPDATE quantification
                   SET quantifier_id = ?1, score = 0, dismissed = 0,
                       duplicate_praise_id = NULL, updated_at = ?2
                   WHERE quantification_id = ?3 AND quantifier_id = ?4"#,
            )?;
            for id in quantification_ids {
                moved += stmt.execute(params![to_quantifier_id, fmt_ts(&now), id, from_quantifier_id])?;
            }
        }

        if moved != quantification_ids.len() {
            return Err(RepositoryError::DatabaseTransactionError(format!(
                "量化记录已被并发修改: expected={}, moved={}",
                quantification_ids.len(),
                moved
            )));
        }

        reset_scores_with(&tx, affected_praise_ids)?;

        tx.commit()?;
        Ok(moved)
    }

    /// 更新量化结果（量化人评分）
    pub fn update_result(
        &self,
        quantification_id: &str,
        score: f64,
        dismissed: bool,
        duplicate_praise_id: Option<&str>,
        now: NaiveDateTime,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"UPDATE quantification
               SET score = ?1, dismissed = ?2, duplicate_praise_id = ?3, updated_at = ?4
               WHERE quantification_id = ?5"#,
            params![
                score,
                if dismissed { 1 } else { 0 },
                duplicate_praise_id,
                fmt_ts(&now),
                quantification_id
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Quantification".to_string(),
                id: quantification_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 统计窗口内的量化记录数
    pub fn count_in_window(&self, window: &PeriodWindow) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Ok(count_in_window_with(&conn, window)?)
    }

    /// 查询窗口内全部量化记录
    pub fn find_in_window(&self, window: &PeriodWindow) -> RepositoryResult<Vec<Quantification>> {
        let conn = self.get_conn()?;
        let (start, end) = window_params(window);
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY q.quantifier_id, p.praise_date, q.praise_id",
            SELECT_IN_WINDOW
        ))?;
        let records = stmt
            .query_map(params![start, end], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询量化人在窗口内的量化记录
    pub fn find_by_quantifier_in_window(
        &self,
        quantifier_id: &str,
        window: &PeriodWindow,
    ) -> RepositoryResult<Vec<Quantification>> {
        let conn = self.get_conn()?;
        let (start, end) = window_params(window);
        let mut stmt = conn.prepare(&format!(
            "{} AND q.quantifier_id = ?3 ORDER BY p.praise_date, q.praise_id",
            SELECT_IN_WINDOW
        ))?;
        let records = stmt
            .query_map(params![start, end, quantifier_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询某条赞誉的全部量化记录
    pub fn find_by_praise(&self, praise_id: &str) -> RepositoryResult<Vec<Quantification>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT quantification_id, praise_id, quantifier_id, score, dismissed,
                      duplicate_praise_id, created_at, updated_at
               FROM quantification WHERE praise_id = ?1
               ORDER BY quantifier_id"#,
        )?;
        let records = stmt
            .query_map(params![praise_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 窗口内量化人进度汇总
    pub fn summarize_quantifiers(&self, window: &PeriodWindow) -> RepositoryResult<Vec<QuantifierSummary>> {
        let conn = self.get_conn()?;
        let (start, end) = window_params(window);
        let mut stmt = conn.prepare(
            r#"SELECT q.quantifier_id,
                      COUNT(*),
                      SUM(CASE WHEN q.score > 0 OR q.dismissed = 1 OR q.duplicate_praise_id IS NOT NULL
                               THEN 1 ELSE 0 END)
               FROM quantification q
               JOIN praise p ON p.praise_id = q.praise_id
               WHERE (?1 IS NULL OR p.praise_date > ?1) AND p.praise_date <= ?2
               GROUP BY q.quantifier_id
               ORDER BY q.quantifier_id"#,
        )?;
        let summaries = stmt
            .query_map(params![start, end], |row| {
                Ok(QuantifierSummary {
                    quantifier_id: row.get(0)?,
                    praise_count: row.get(1)?,
                    finished_count: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(summaries)
    }
}

fn count_in_window_with(conn: &Connection, window: &PeriodWindow) -> rusqlite::Result<i64> {
    let (start, end) = window_params(window);
    conn.query_row(
        r#"SELECT COUNT(*)
           FROM quantification q
           JOIN praise p ON p.praise_id = q.praise_id
           WHERE (?1 IS NULL OR p.praise_date > ?1) AND p.praise_date <= ?2"#,
        params![start, end],
        |row| row.get(0),
    )
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_ts(s: &str, idx: usize) -> SqliteResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn map_row(row: &Row) -> SqliteResult<Quantification> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(Quantification {
        quantification_id: row.get(0)?,
        praise_id: row.get(1)?,
        quantifier_id: row.get(2)?,
        score: row.get(3)?,
        dismissed: row.get::<_, i64>(4)? != 0,
        duplicate_praise_id: row.get(5)?,
        created_at: parse_ts(&created_at, 6)?,
        updated_at: parse_ts(&updated_at, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn setup() -> (Arc<Mutex<Connection>>, QuantificationRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO period VALUES ('p1', 'P1', 'OPEN', '2026-02-28', '2026-01-01 00:00:00');
            INSERT INTO quantifier (user_id, eligible) VALUES ('u1', 1), ('u2', 1);
            INSERT INTO praise VALUES ('pr1', 'acc-a', 'g', '', '2026-02-01', 4);
            INSERT INTO praise VALUES ('pr2', 'acc-b', 'g', '', '2026-02-02', 6);
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), QuantificationRepository::new(conn))
    }

    fn window() -> PeriodWindow {
        PeriodWindow::new(None, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    #[test]
    fn test_commit_assignment_writes_and_transitions() {
        let (conn, repo) = setup();
        let records = vec![
            Quantification::neutral("pr1", "u1", now()),
            Quantification::neutral("pr2", "u1", now()),
            Quantification::neutral("pr1", "u2", now()),
        ];

        assert_eq!(repo.commit_assignment("p1", &window(), &records).unwrap(), 3);
        assert_eq!(repo.count_in_window(&window()).unwrap(), 3);

        let status: String = conn
            .lock()
            .unwrap()
            .query_row("SELECT status FROM period WHERE period_id = 'p1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "QUANTIFY");
    }

    #[test]
    fn test_second_commit_is_rejected_without_writes() {
        let (_conn, repo) = setup();
        let first = vec![Quantification::neutral("pr1", "u1", now())];
        repo.commit_assignment("p1", &window(), &first).unwrap();

        let second = vec![Quantification::neutral("pr2", "u2", now())];
        let err = repo.commit_assignment("p1", &window(), &second).unwrap_err();
        assert!(matches!(err, RepositoryError::AlreadyAssigned { count: 1, .. }));
        assert_eq!(repo.count_in_window(&window()).unwrap(), 1);
    }

    #[test]
    fn test_reassign_resets_to_neutral() {
        let (_conn, repo) = setup();
        let q = Quantification::neutral("pr1", "u1", now());
        repo.commit_assignment("p1", &window(), &[q.clone()]).unwrap();
        repo.update_result(&q.quantification_id, 0.0, false, Some("pr2"), now())
            .unwrap();

        let moved = repo
            .reassign(&[q.quantification_id.clone()], "u1", "u2", &["pr1".to_string()], now())
            .unwrap();
        assert_eq!(moved, 1);

        assert!(repo.find_by_quantifier_in_window("u1", &window()).unwrap().is_empty());
        let moved_records = repo.find_by_quantifier_in_window("u2", &window()).unwrap();
        assert_eq!(moved_records.len(), 1);
        assert_eq!(moved_records[0].duplicate_praise_id, None);
        assert!(!moved_records[0].is_finished());
    }

    #[test]
    fn test_reassign_rolls_back_on_stale_owner() {
        let (_conn, repo) = setup();
        let q = Quantification::neutral("pr1", "u1", now());
        repo.commit_assignment("p1", &window(), &[q.clone()]).unwrap();

        let err = repo
            .reassign(&[q.quantification_id.clone()], "u2", "u1", &[], now())
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseTransactionError(_)));
        assert_eq!(repo.find_by_praise("pr1").unwrap()[0].quantifier_id, "u1");
    }

    #[test]
    fn test_summarize_quantifiers() {
        let (_conn, repo) = setup();
        let a = Quantification::neutral("pr1", "u1", now());
        let b = Quantification::neutral("pr2", "u1", now());
        repo.commit_assignment("p1", &window(), &[a.clone(), b]).unwrap();
        repo.update_result(&a.quantification_id, 5.0, false, None, now())
            .unwrap();

        let summary = repo.summarize_quantifiers(&window()).unwrap();
        assert_eq!(
            summary,
            vec![QuantifierSummary {
                quantifier_id: "u1".to_string(),
                praise_count: 2,
                finished_count: 1,
            }]
        );
    }
}
