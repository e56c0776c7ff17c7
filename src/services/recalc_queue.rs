// ==========================================
// 供应商绩效评级系统 - 重算任务队列
// ==========================================
// 职责: 管理评级重算任务队列,触发方入队即返回
// 状态机: PENDING -> IN_PROGRESS -> {COMPLETED, FAILED} / PENDING -> CANCELLED
// 红线: 终态不可再变更,失败任务不重试 (需重新入队新任务)
// 红线: 仅 PENDING 任务可取消,执行中任务运行至终态
// ==========================================

use crate::domain::types::{JobStatus, JobType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::services::recalc_service::RatingRecalcService;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// 任务状态 (Task Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,    // 等待执行
    InProgress, // 执行中
    Completed,  // 已完成
    Failed,     // 失败 (不重试)
    Cancelled,  // 已取消 (仅 PENDING 可取消)
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(TaskStatus::Pending),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            "FAILED" => Some(TaskStatus::Failed),
            "CANCELLED" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }
}

// ==========================================
// RecalcTask - 重算任务
// ==========================================
// 说明: supplier_id 为 None 表示归属方全量重算
#[derive(Debug, Clone)]
pub struct RecalcTask {
    pub task_id: String,
    pub owner_id: String,
    pub supplier_id: Option<String>,
    pub trigger_type: String,           // 触发事件标识 (OrderDelivered / ...)
    pub trigger_source: Option<String>, // 触发来源描述
    pub status: TaskStatus,
    pub created_at: NaiveDateTime,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub job_id: Option<String>, // 执行后关联的任务日志ID
}

impl RecalcTask {
    /// 创建单供应商重算任务
    pub fn for_supplier(
        owner_id: String,
        supplier_id: String,
        trigger_type: &str,
        trigger_source: Option<String>,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            owner_id,
            supplier_id: Some(supplier_id),
            trigger_type: trigger_type.to_string(),
            trigger_source,
            status: TaskStatus::Pending,
            created_at: chrono::Utc::now().naive_utc(),
            started_at: None,
            completed_at: None,
            error_message: None,
            job_id: None,
        }
    }

    /// 创建归属方全量重算任务
    pub fn full_scope(owner_id: String, trigger_type: &str, trigger_source: Option<String>) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            owner_id,
            supplier_id: None,
            trigger_type: trigger_type.to_string(),
            trigger_source,
            status: TaskStatus::Pending,
            created_at: chrono::Utc::now().naive_utc(),
            started_at: None,
            completed_at: None,
            error_message: None,
            job_id: None,
        }
    }
}

// ==========================================
// QueueStats - 队列统计
// ==========================================
#[derive(Debug, Clone)]
pub struct QueueStats {
    pub pending_count: u32,
    pub in_progress_count: u32,
    pub completed_count: u32,
    pub failed_count: u32,
    pub cancelled_count: u32,
}

// ==========================================
// RecalcQueue - 重算任务队列
// ==========================================
pub struct RecalcQueue {
    conn: Arc<Mutex<Connection>>,
    recalc_service: Arc<RatingRecalcService>,
}

impl RecalcQueue {
    /// 创建队列管理器 (确保队列表存在)
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        recalc_service: Arc<RatingRecalcService>,
    ) -> RepositoryResult<Self> {
        let queue = Self {
            conn,
            recalc_service,
        };
        queue.ensure_queue_table()?;
        Ok(queue)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_queue_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS rating_recalc_queue (
              task_id TEXT PRIMARY KEY,
              owner_id TEXT NOT NULL,
              supplier_id TEXT,
              trigger_type TEXT NOT NULL,
              trigger_source TEXT,
              status TEXT NOT NULL DEFAULT 'PENDING',
              created_at TEXT NOT NULL,
              started_at TEXT,
              completed_at TEXT,
              error_message TEXT,
              job_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_recalc_queue_status
              ON rating_recalc_queue(status, created_at);

            CREATE INDEX IF NOT EXISTS idx_recalc_queue_owner
              ON rating_recalc_queue(owner_id, status);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RecalcTask> {
        let status_str: String = row.get(5)?;
        let status = TaskStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("无法识别的任务状态: {}", status_str).into(),
            )
        })?;

        Ok(RecalcTask {
            task_id: row.get(0)?,
            owner_id: row.get(1)?,
            supplier_id: row.get(2)?,
            trigger_type: row.get(3)?,
            trigger_source: row.get(4)?,
            status,
            created_at: row.get(6)?,
            started_at: row.get(7)?,
            completed_at: row.get(8)?,
            error_message: row.get(9)?,
            job_id: row.get(10)?,
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        task_id, owner_id, supplier_id, trigger_type, trigger_source, status,
        created_at, started_at, completed_at, error_message, job_id
    "#;

    // ==========================================
    // 核心方法
    // ==========================================

    /// 提交任务到队列 (触发方入队即返回,不等待执行)
    pub fn enqueue(&self, task: RecalcTask) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rating_recalc_queue (
                task_id, owner_id, supplier_id, trigger_type, trigger_source,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                task.task_id,
                task.owner_id,
                task.supplier_id,
                task.trigger_type,
                task.trigger_source,
                task.status.as_str(),
                task.created_at,
            ],
        )?;

        tracing::info!(
            "重算任务已入队: task_id={}, owner_id={}, trigger={}",
            task.task_id,
            task.owner_id,
            task.trigger_type
        );
        Ok(task.task_id)
    }

    /// 取出下一个待执行任务 (取出即转 IN_PROGRESS)
    pub fn dequeue(&self) -> RepositoryResult<Option<RecalcTask>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM rating_recalc_queue
            WHERE status = 'PENDING'
            ORDER BY created_at ASC, task_id ASC
            LIMIT 1
            "#,
            Self::SELECT_COLUMNS
        );
        let task_opt = conn.query_row(&sql, [], Self::map_row).optional()?;

        if let Some(mut task) = task_opt {
            let now = chrono::Utc::now().naive_utc();
            conn.execute(
                "UPDATE rating_recalc_queue SET status = 'IN_PROGRESS', started_at = ?1 WHERE task_id = ?2",
                params![now, task.task_id],
            )?;
            task.status = TaskStatus::InProgress;
            task.started_at = Some(now);
            Ok(Some(task))
        } else {
            Ok(None)
        }
    }

    /// 执行一个已取出的任务
    ///
    /// # 说明
    /// - 单供应商任务走事件触发路径 (JobType::Event)
    /// - 全量任务走归属方全量路径 (JobType::Bulk),部分成功语义由服务层保证
    /// - 任务执行中的业务失败被记入任务行,不向调用方传播
    fn execute_task(&self, task: &RecalcTask) -> RepositoryResult<()> {
        tracing::info!(
            "开始执行重算任务: task_id={}, supplier_id={:?}",
            task.task_id,
            task.supplier_id
        );

        let outcome = match &task.supplier_id {
            Some(supplier_id) => self
                .recalc_service
                .recalculate_supplier(supplier_id, JobType::Event, &task.trigger_type)
                .map(|o| (o.job_id, JobStatus::Completed, None)),
            None => self
                .recalc_service
                .recalculate_owner(&task.owner_id, &task.trigger_type)
                .map(|log| (log.job_id.clone(), log.status, log.error_message)),
        };

        match outcome {
            Ok((job_id, JobStatus::Completed, _)) => {
                self.finish_task(&task.task_id, TaskStatus::Completed, Some(&job_id), None)?;
                tracing::info!(
                    "重算任务执行成功: task_id={}, job_id={}",
                    task.task_id,
                    job_id
                );
            }
            Ok((job_id, _, error_message)) => {
                // 全量任务以 FAILED 终结 (部分成功细节见任务日志)
                self.finish_task(
                    &task.task_id,
                    TaskStatus::Failed,
                    Some(&job_id),
                    error_message.as_deref(),
                )?;
                tracing::error!(
                    "重算任务执行失败: task_id={}, job_id={}, error={:?}",
                    task.task_id,
                    job_id,
                    error_message
                );
            }
            Err(e) => {
                self.finish_task(&task.task_id, TaskStatus::Failed, None, Some(&e.to_string()))?;
                tracing::error!("重算任务执行失败: task_id={}, error={}", task.task_id, e);
            }
        }
        Ok(())
    }

    /// 终结任务行
    fn finish_task(
        &self,
        task_id: &str,
        status: TaskStatus,
        job_id: Option<&str>,
        error_message: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            UPDATE rating_recalc_queue SET
                status = ?1,
                completed_at = ?2,
                job_id = ?3,
                error_message = ?4
            WHERE task_id = ?5 AND status = 'IN_PROGRESS'
            "#,
            params![
                status.as_str(),
                chrono::Utc::now().naive_utc(),
                job_id,
                error_message,
                task_id,
            ],
        )?;
        Ok(())
    }

    /// 处理队列中的下一个任务
    ///
    /// # 返回
    /// - Ok(Some(task_id)): 有任务被处理 (成败均记入任务行)
    /// - Ok(None): 队列为空
    /// - Err: 基础设施错误 (锁/数据库)
    pub fn process_next(&self) -> RepositoryResult<Option<String>> {
        match self.dequeue()? {
            Some(task) => {
                self.execute_task(&task)?;
                Ok(Some(task.task_id))
            }
            None => Ok(None),
        }
    }

    /// 处理队列中所有待执行任务,返回处理过的任务ID
    pub fn process_all(&self) -> RepositoryResult<Vec<String>> {
        let mut processed = Vec::new();
        while let Some(task_id) = self.process_next()? {
            processed.push(task_id);
        }
        Ok(processed)
    }

    /// 查询任务状态 (轮询接口)
    pub fn get_task_status(&self, task_id: &str) -> RepositoryResult<Option<RecalcTask>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM rating_recalc_queue WHERE task_id = ?1",
            Self::SELECT_COLUMNS
        );
        let task = conn
            .query_row(&sql, params![task_id], Self::map_row)
            .optional()?;
        Ok(task)
    }

    /// 取消任务 (仅 PENDING 可取消)
    ///
    /// # 返回
    /// - Ok(true): 取消成功
    /// - Ok(false): 任务不存在或已开始执行
    pub fn cancel_task(&self, task_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE rating_recalc_queue SET status = 'CANCELLED', completed_at = ?1 WHERE task_id = ?2 AND status = 'PENDING'",
            params![chrono::Utc::now().naive_utc(), task_id],
        )?;
        Ok(rows > 0)
    }

    /// 队列统计
    pub fn queue_stats(&self) -> RepositoryResult<QueueStats> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM rating_recalc_queue GROUP BY status",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = QueueStats {
            pending_count: 0,
            in_progress_count: 0,
            completed_count: 0,
            failed_count: 0,
            cancelled_count: 0,
        };
        for row in rows {
            let (status, count) = row?;
            let count = count as u32;
            match TaskStatus::from_str(&status) {
                Some(TaskStatus::Pending) => stats.pending_count = count,
                Some(TaskStatus::InProgress) => stats.in_progress_count = count,
                Some(TaskStatus::Completed) => stats.completed_count = count,
                Some(TaskStatus::Failed) => stats.failed_count = count,
                Some(TaskStatus::Cancelled) => stats.cancelled_count = count,
                None => {}
            }
        }
        Ok(stats)
    }
}
