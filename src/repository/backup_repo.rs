// ==========================================
// 供应商绩效评级系统 - 备选关系仓储
// ==========================================
// 职责: 管理 backup_association 邻接表 (主供应商 -> 备选供应商)
// 说明: 不做环检测,提升只走一跳,环不构成风险
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::backup::BackupAssociation;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// BackupAssociationRepository - 备选关系仓储
// ==========================================
pub struct BackupAssociationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BackupAssociationRepository {
    /// 创建新的 BackupAssociationRepository 实例
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
            CREATE TABLE IF NOT EXISTS backup_association (
              primary_supplier_id TEXT NOT NULL,
              backup_supplier_id TEXT NOT NULL,
              priority INTEGER NOT NULL DEFAULT 0,
              created_at TEXT NOT NULL,
              PRIMARY KEY (primary_supplier_id, backup_supplier_id)
            );

            CREATE INDEX IF NOT EXISTS idx_backup_primary
              ON backup_association(primary_supplier_id, priority);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<BackupAssociation> {
        Ok(BackupAssociation {
            primary_supplier_id: row.get(0)?,
            backup_supplier_id: row.get(1)?,
            priority: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    /// 注册/更新备选关系 (INSERT OR REPLACE 实现 upsert 语义)
    pub fn upsert(&self, association: &BackupAssociation) -> RepositoryResult<()> {
        if association.primary_supplier_id == association.backup_supplier_id {
            return Err(RepositoryError::BusinessRuleViolation(
                "供应商不能作为自身的备选".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO backup_association (
                primary_supplier_id, backup_supplier_id, priority, created_at
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                association.primary_supplier_id,
                association.backup_supplier_id,
                association.priority,
                association.created_at,
            ],
        )?;
        Ok(())
    }

    /// 删除备选关系
    pub fn remove(&self, primary_id: &str, backup_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM backup_association WHERE primary_supplier_id = ?1 AND backup_supplier_id = ?2",
            params![primary_id, backup_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "BackupAssociation".to_string(),
                id: format!("{}->{}", primary_id, backup_id),
            });
        }
        Ok(())
    }

    /// 列出主供应商的备选关系 (按优先级升序)
    pub fn list_by_primary(&self, primary_id: &str) -> RepositoryResult<Vec<BackupAssociation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT primary_supplier_id, backup_supplier_id, priority, created_at
            FROM backup_association
            WHERE primary_supplier_id = ?1
            ORDER BY priority ASC, backup_supplier_id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![primary_id], Self::map_row)?;

        let mut associations = Vec::new();
        for row in rows {
            associations.push(row?);
        }
        Ok(associations)
    }
}
