// ==========================================
// 供应商绩效评级系统 - 在途采购任务仓储
// ==========================================
// 职责: 管理 procurement_task 表 (备选提升时的任务改派)
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::backup::ProcurementTask;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ProcurementTaskRepository - 在途任务仓储
// ==========================================
pub struct ProcurementTaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProcurementTaskRepository {
    /// 创建新的 ProcurementTaskRepository 实例
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
            CREATE TABLE IF NOT EXISTS procurement_task (
              task_id TEXT PRIMARY KEY,
              supplier_id TEXT NOT NULL,
              description TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_task_supplier
              ON procurement_task(supplier_id);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<ProcurementTask> {
        Ok(ProcurementTask {
            task_id: row.get(0)?,
            supplier_id: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    /// 插入在途任务
    pub fn insert(&self, task: &ProcurementTask) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO procurement_task (
                task_id, supplier_id, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                task.task_id,
                task.supplier_id,
                task.description,
                task.created_at,
                task.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询任务
    pub fn find_by_id(&self, task_id: &str) -> RepositoryResult<Option<ProcurementTask>> {
        let conn = self.get_conn()?;
        let task = conn
            .query_row(
                "SELECT task_id, supplier_id, description, created_at, updated_at FROM procurement_task WHERE task_id = ?1",
                params![task_id],
                Self::map_row,
            )
            .optional()?;
        Ok(task)
    }

    /// 改派任务到新供应商
    pub fn reassign(&self, task_id: &str, new_supplier_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE procurement_task SET supplier_id = ?1, updated_at = ?2 WHERE task_id = ?3",
            params![
                new_supplier_id,
                chrono::Utc::now().naive_utc(),
                task_id
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProcurementTask".to_string(),
                id: task_id.to_string(),
            });
        }
        Ok(())
    }
}
