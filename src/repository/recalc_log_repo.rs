// ==========================================
// 供应商绩效评级系统 - 重算任务日志仓储
// ==========================================
// 职责: 管理 rating_recalc_log 表 (任务开始/终结/轮询)
// 红线: 任务终结仅发生一次; 终态不可再变更
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::recalc_log::RatingRecalcLog;
use crate::domain::types::{JobStatus, JobType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// RecalcLogRepository - 重算任务日志仓储
// ==========================================
pub struct RecalcLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecalcLogRepository {
    /// 创建新的 RecalcLogRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rating_recalc_log (
              job_id TEXT PRIMARY KEY,
              job_type TEXT NOT NULL,
              trigger_event TEXT NOT NULL,
              owner_id TEXT NOT NULL,
              supplier_id TEXT,
              status TEXT NOT NULL DEFAULT 'IN_PROGRESS',
              started_at TEXT NOT NULL,
              completed_at TEXT,
              suppliers_processed INTEGER NOT NULL DEFAULT 0,
              suppliers_tier_changed INTEGER NOT NULL DEFAULT 0,
              error_message TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_recalc_log_owner
              ON rating_recalc_log(owner_id, started_at DESC);
            CREATE INDEX IF NOT EXISTS idx_recalc_log_status
              ON rating_recalc_log(status, started_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RatingRecalcLog> {
        let job_type_str: String = row.get(1)?;
        let job_type = JobType::from_str(&job_type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("无法识别的任务类型: {}", job_type_str).into(),
            )
        })?;

        let status_str: String = row.get(5)?;
        let status = JobStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("无法识别的任务状态: {}", status_str).into(),
            )
        })?;

        Ok(RatingRecalcLog {
            job_id: row.get(0)?,
            job_type,
            trigger_event: row.get(2)?,
            owner_id: row.get(3)?,
            supplier_id: row.get(4)?,
            status,
            started_at: row.get(6)?,
            completed_at: row.get(7)?,
            suppliers_processed: row.get(8)?,
            suppliers_tier_changed: row.get(9)?,
            error_message: row.get(10)?,
        })
    }

    /// 写入任务开始记录 (IN_PROGRESS)
    pub fn insert_started(&self, log: &RatingRecalcLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rating_recalc_log (
                job_id, job_type, trigger_event, owner_id, supplier_id,
                status, started_at, completed_at, suppliers_processed,
                suppliers_tier_changed, error_message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                log.job_id,
                log.job_type.to_db_str(),
                log.trigger_event,
                log.owner_id,
                log.supplier_id,
                log.status.to_db_str(),
                log.started_at,
                log.completed_at,
                log.suppliers_processed,
                log.suppliers_tier_changed,
                log.error_message,
            ],
        )?;
        Ok(())
    }

    /// 终结任务 (仅一次)
    ///
    /// # 参数
    /// - `job_id`: 任务ID
    /// - `status`: 终态 (COMPLETED / FAILED)
    /// - `suppliers_processed`: 已处理供应商数
    /// - `suppliers_tier_changed`: 等级变化供应商数
    /// - `error_message`: 失败原因 (成功时为 None)
    ///
    /// # 返回
    /// - Err(InvalidStateTransition): 任务已终结或不在 IN_PROGRESS
    pub fn finalize(
        &self,
        job_id: &str,
        status: JobStatus,
        suppliers_processed: i64,
        suppliers_tier_changed: i64,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        if !status.is_terminal() {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "任务终结状态必须为终态: {}",
                status
            )));
        }

        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE rating_recalc_log SET
                status = ?1,
                completed_at = ?2,
                suppliers_processed = ?3,
                suppliers_tier_changed = ?4,
                error_message = ?5
            WHERE job_id = ?6 AND status = 'IN_PROGRESS'
            "#,
            params![
                status.to_db_str(),
                chrono::Utc::now().naive_utc(),
                suppliers_processed,
                suppliers_tier_changed,
                error_message,
                job_id,
            ],
        )?;

        if rows == 0 {
            let current: Option<String> = conn
                .query_row(
                    "SELECT status FROM rating_recalc_log WHERE job_id = ?1",
                    params![job_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match current {
                Some(from) => Err(RepositoryError::InvalidStateTransition {
                    from,
                    to: status.to_db_str().to_string(),
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "RatingRecalcLog".to_string(),
                    id: job_id.to_string(),
                }),
            };
        }
        Ok(())
    }

    /// 按任务ID查询 (轮询接口)
    pub fn find_by_id(&self, job_id: &str) -> RepositoryResult<Option<RatingRecalcLog>> {
        let conn = self.get_conn()?;
        let log = conn
            .query_row(
                r#"
                SELECT job_id, job_type, trigger_event, owner_id, supplier_id,
                       status, started_at, completed_at, suppliers_processed,
                       suppliers_tier_changed, error_message
                FROM rating_recalc_log
                WHERE job_id = ?1
                "#,
                params![job_id],
                Self::map_row,
            )
            .optional()?;
        Ok(log)
    }

    /// 按归属方列出任务 (按开始时间倒序)
    pub fn list_by_owner(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<RatingRecalcLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT job_id, job_type, trigger_event, owner_id, supplier_id,
                   status, started_at, completed_at, suppliers_processed,
                   suppliers_tier_changed, error_message
            FROM rating_recalc_log
            WHERE owner_id = ?1
            ORDER BY started_at DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![owner_id, limit as i64], Self::map_row)?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::configure_sqlite_connection;

    fn setup_repo() -> RecalcLogRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        RecalcLogRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_insert_and_poll() {
        let repo = setup_repo();
        let log = RatingRecalcLog::started(
            "J001".to_string(),
            JobType::Bulk,
            "ScheduledRecalc",
            "OWN01".to_string(),
            None,
        );
        repo.insert_started(&log).unwrap();

        let stored = repo.find_by_id("J001").unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::InProgress);
        assert_eq!(stored.job_type, JobType::Bulk);
    }

    #[test]
    fn test_finalize_exactly_once() {
        let repo = setup_repo();
        let log = RatingRecalcLog::started(
            "J001".to_string(),
            JobType::Manual,
            "ManualRecalc",
            "OWN01".to_string(),
            Some("S001".to_string()),
        );
        repo.insert_started(&log).unwrap();

        repo.finalize("J001", JobStatus::Completed, 1, 1, None)
            .unwrap();

        let stored = repo.find_by_id("J001").unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.suppliers_processed, 1);
        assert!(stored.completed_at.is_some());

        // 第二次终结被拒绝
        let result = repo.finalize("J001", JobStatus::Failed, 0, 0, Some("x"));
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_finalize_failed_records_message() {
        let repo = setup_repo();
        let log = RatingRecalcLog::started(
            "J001".to_string(),
            JobType::Bulk,
            "ScheduledRecalc",
            "OWN01".to_string(),
            None,
        );
        repo.insert_started(&log).unwrap();

        repo.finalize("J001", JobStatus::Failed, 2, 1, Some("第3个供应商数据异常"))
            .unwrap();

        let stored = repo.find_by_id("J001").unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.suppliers_processed, 2);
        assert_eq!(
            stored.error_message.as_deref(),
            Some("第3个供应商数据异常")
        );
    }

    #[test]
    fn test_finalize_rejects_non_terminal() {
        let repo = setup_repo();
        let result = repo.finalize("J001", JobStatus::InProgress, 0, 0, None);
        assert!(matches!(
            result,
            Err(RepositoryError::BusinessRuleViolation(_))
        ));
    }
}
