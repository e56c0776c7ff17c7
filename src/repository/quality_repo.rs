// ==========================================
// 供应商绩效评级系统 - 质量事件仓储
// ==========================================
// 职责: 管理 quality_incident 表的数据访问
// 红线: Repository 不含业务逻辑; 处置仅发生一次
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::quality::QualityIncident;
use crate::domain::types::IncidentSeverity;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// QualityIncidentRepository - 质量事件仓储
// ==========================================
pub struct QualityIncidentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl QualityIncidentRepository {
    /// 创建新的 QualityIncidentRepository 实例
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
            CREATE TABLE IF NOT EXISTS quality_incident (
              incident_id TEXT PRIMARY KEY,
              supplier_id TEXT NOT NULL,
              order_id TEXT,
              incident_type TEXT NOT NULL,
              severity TEXT NOT NULL,
              financial_impact REAL NOT NULL DEFAULT 0.0,
              items_affected INTEGER NOT NULL DEFAULT 0,
              resolved INTEGER NOT NULL DEFAULT 0,
              resolved_at TEXT,
              resolution_note TEXT,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_incident_supplier
              ON quality_incident(supplier_id, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<QualityIncident> {
        let severity_str: String = row.get(4)?;
        let severity = IncidentSeverity::from_str(&severity_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("无法识别的严重度: {}", severity_str).into(),
            )
        })?;

        Ok(QualityIncident {
            incident_id: row.get(0)?,
            supplier_id: row.get(1)?,
            order_id: row.get(2)?,
            incident_type: row.get(3)?,
            severity,
            financial_impact: row.get(5)?,
            items_affected: row.get(6)?,
            resolved: row.get::<_, i64>(7)? != 0,
            resolved_at: row.get(8)?,
            resolution_note: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        incident_id, supplier_id, order_id, incident_type, severity,
        financial_impact, items_affected, resolved, resolved_at,
        resolution_note, created_at
    "#;

    /// 插入新上报的质量事件
    pub fn insert(&self, incident: &QualityIncident) -> RepositoryResult<()> {
        if incident.supplier_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "质量事件必须关联供应商".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO quality_incident (
                incident_id, supplier_id, order_id, incident_type, severity,
                financial_impact, items_affected, resolved, resolved_at,
                resolution_note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                incident.incident_id,
                incident.supplier_id,
                incident.order_id,
                incident.incident_type,
                incident.severity.to_db_str(),
                incident.financial_impact,
                incident.items_affected,
                incident.resolved as i64,
                incident.resolved_at,
                incident.resolution_note,
                incident.created_at,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询质量事件
    pub fn find_by_id(&self, incident_id: &str) -> RepositoryResult<Option<QualityIncident>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM quality_incident WHERE incident_id = ?1",
            Self::SELECT_COLUMNS
        );
        let incident = conn
            .query_row(&sql, params![incident_id], Self::map_row)
            .optional()?;
        Ok(incident)
    }

    /// 处置质量事件 (仅一次)
    ///
    /// # 返回
    /// - Ok(()): 处置成功
    /// - Err(InvalidStateTransition): 事件已处置
    /// - Err(NotFound): 事件不存在
    pub fn resolve(&self, incident_id: &str, resolution_note: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE quality_incident SET
                resolved = 1,
                resolved_at = ?1,
                resolution_note = ?2
            WHERE incident_id = ?3 AND resolved = 0
            "#,
            params![
                chrono::Utc::now().naive_utc(),
                resolution_note,
                incident_id
            ],
        )?;

        if rows == 0 {
            // 区分"不存在"与"已处置"
            let exists: Option<i64> = conn
                .query_row(
                    "SELECT resolved FROM quality_incident WHERE incident_id = ?1",
                    params![incident_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match exists {
                Some(_) => Err(RepositoryError::InvalidStateTransition {
                    from: "RESOLVED".to_string(),
                    to: "RESOLVED".to_string(),
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "QualityIncident".to_string(),
                    id: incident_id.to_string(),
                }),
            };
        }
        Ok(())
    }

    /// 查询供应商在时间窗口内的质量事件 (按创建时间升序)
    pub fn list_by_supplier_since(
        &self,
        supplier_id: &str,
        since: NaiveDateTime,
    ) -> RepositoryResult<Vec<QualityIncident>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM quality_incident WHERE supplier_id = ?1 AND created_at >= ?2 ORDER BY created_at ASC",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![supplier_id, since], Self::map_row)?;

        let mut incidents = Vec::new();
        for row in rows {
            incidents.push(row?);
        }
        Ok(incidents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::configure_sqlite_connection;

    fn setup_repo() -> QualityIncidentRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        QualityIncidentRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_insert_requires_supplier() {
        let repo = setup_repo();
        let incident = QualityIncident::new(
            "I001".to_string(),
            "".to_string(),
            "DEFECT".to_string(),
            IncidentSeverity::Low,
        );
        assert!(matches!(
            repo.insert(&incident),
            Err(RepositoryError::ValidationError(_))
        ));
    }

    #[test]
    fn test_resolve_exactly_once() {
        let repo = setup_repo();
        let incident = QualityIncident::new(
            "I001".to_string(),
            "S001".to_string(),
            "DEFECT".to_string(),
            IncidentSeverity::Critical,
        );
        repo.insert(&incident).unwrap();

        repo.resolve("I001", "更换批次后复检通过").unwrap();

        let stored = repo.find_by_id("I001").unwrap().unwrap();
        assert!(stored.resolved);
        assert!(stored.resolved_at.is_some());

        // 第二次处置被拒绝
        let result = repo.resolve("I001", "重复处置");
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_resolve_not_found() {
        let repo = setup_repo();
        let result = repo.resolve("I404", "x");
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
    }
}
