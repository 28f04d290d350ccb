// ==========================================
// 赞誉量化分配系统 - 量化周期数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::period::{Period, PeriodWindow};
use crate::domain::types::PeriodStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PeriodRepository - 周期仓储
// ==========================================
pub struct PeriodRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PeriodRepository {
    /// 创建新的PeriodRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建周期
    pub fn create(&self, period: &Period) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO period (period_id, name, status, end_date, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                period.period_id,
                period.name,
                period.status.to_db_str(),
                period.end_date.format("%Y-%m-%d").to_string(),
                period.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按ID查询
    pub fn find_by_id(&self, period_id: &str) -> RepositoryResult<Option<Period>> {
        let conn = self.get_conn()?;
        let period = conn
            .query_row(
                r#"SELECT period_id, name, status, end_date, created_at
                   FROM period WHERE period_id = ?1"#,
                params![period_id],
                map_row,
            )
            .optional()?;
        Ok(period)
    }

    /// 按ID查询（不存在时返回 NotFound）
    pub fn get(&self, period_id: &str) -> RepositoryResult<Period> {
        self.find_by_id(period_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Period".to_string(),
                id: period_id.to_string(),
            })
    }

    /// 查询全部周期（按结束日升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Period>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT period_id, name, status, end_date, created_at
               FROM period ORDER BY end_date ASC"#,
        )?;
        let periods = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(periods)
    }

    /// 计算周期日期窗口
    ///
    /// 区间: (上一周期结束日, 本周期结束日]
    pub fn window_for(&self, period: &Period) -> RepositoryResult<PeriodWindow> {
        let conn = self.get_conn()?;
        let previous_end: Option<String> = conn.query_row(
            "SELECT MAX(end_date) FROM period WHERE end_date < ?1",
            params![period.end_date.format("%Y-%m-%d").to_string()],
            |row| row.get(0),
        )?;

        let start_exclusive = match previous_end {
            Some(s) => Some(parse_date(&s, "end_date")?),
            None => None,
        };

        Ok(PeriodWindow::new(start_exclusive, period.end_date))
    }

    /// 更新周期状态（带期望状态校验）
    ///
    /// # 返回
    /// - Err(StalePeriodState): 当前状态与期望不一致
    pub fn update_status(
        &self,
        period_id: &str,
        expected: PeriodStatus,
        to: PeriodStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        transition_with(&conn, period_id, expected, to)
    }
}

/// 在给定连接/事务上执行状态迁移
pub(crate) fn transition_with(
    conn: &Connection,
    period_id: &str,
    expected: PeriodStatus,
    to: PeriodStatus,
) -> RepositoryResult<()> {
    let rows = conn.execute(
        "UPDATE period SET status = ?1 WHERE period_id = ?2 AND status = ?3",
        params![to.to_db_str(), period_id, expected.to_db_str()],
    )?;

    if rows == 1 {
        return Ok(());
    }

    let actual: Option<String> = conn
        .query_row(
            "SELECT status FROM period WHERE period_id = ?1",
            params![period_id],
            |row| row.get(0),
        )
        .optional()?;

    match actual {
        None => Err(RepositoryError::NotFound {
            entity: "Period".to_string(),
            id: period_id.to_string(),
        }),
        Some(actual) => Err(RepositoryError::StalePeriodState {
            period_id: period_id.to_string(),
            expected: expected.to_db_str().to_string(),
            actual,
        }),
    }
}

fn parse_date(s: &str, field: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn map_row(row: &Row) -> SqliteResult<Period> {
    let status_str: String = row.get(2)?;
    let end_date_str: String = row.get(3)?;
    let created_at_str: String = row.get(4)?;

    let status = PeriodStatus::from_db_str(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("未知周期状态: {}", status_str).into(),
        )
    })?;
    let end_date = NaiveDate::parse_from_str(&end_date_str, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Period {
        period_id: row.get(0)?,
        name: row.get(1)?,
        status,
        end_date,
        created_at,
    })
}
