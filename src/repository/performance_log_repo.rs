// ==========================================
// 供应商绩效评级系统 - 绩效快照仓储
// ==========================================
// 职责: 管理 supplier_performance_log 表 (只追加,只读查询)
// 红线: 快照永不修改或删除
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::performance_log::SupplierPerformanceLog;
use crate::domain::types::TierLevel;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// PerformanceLogRepository - 绩效快照仓储
// ==========================================
pub struct PerformanceLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PerformanceLogRepository {
    /// 创建新的 PerformanceLogRepository 实例
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
            CREATE TABLE IF NOT EXISTS supplier_performance_log (
              log_id TEXT PRIMARY KEY,
              supplier_id TEXT NOT NULL,
              quality_score REAL NOT NULL,
              delivery_score REAL NOT NULL,
              inventory_score REAL NOT NULL,
              financial_health_score REAL NOT NULL,
              compliance_score REAL NOT NULL,
              tier_score REAL NOT NULL,
              tier_level TEXT NOT NULL,
              event_type TEXT NOT NULL,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_performance_log_supplier
              ON supplier_performance_log(supplier_id, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<SupplierPerformanceLog> {
        let tier_str: String = row.get(8)?;
        let tier_level = TierLevel::from_str(&tier_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                8,
                Type::Text,
                format!("无法识别的绩效等级: {}", tier_str).into(),
            )
        })?;

        Ok(SupplierPerformanceLog {
            log_id: row.get(0)?,
            supplier_id: row.get(1)?,
            quality_score: row.get(2)?,
            delivery_score: row.get(3)?,
            inventory_score: row.get(4)?,
            financial_health_score: row.get(5)?,
            compliance_score: row.get(6)?,
            tier_score: row.get(7)?,
            tier_level,
            event_type: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    /// 追加绩效快照
    ///
    /// 说明: 重算主路径的快照由 SupplierRepository 在评分事务内追加,
    /// 此方法供补录/迁移场景使用
    pub fn append(&self, log: &SupplierPerformanceLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier_performance_log (
                log_id, supplier_id, quality_score, delivery_score, inventory_score,
                financial_health_score, compliance_score, tier_score, tier_level,
                event_type, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                log.log_id,
                log.supplier_id,
                log.quality_score,
                log.delivery_score,
                log.inventory_score,
                log.financial_health_score,
                log.compliance_score,
                log.tier_score,
                log.tier_level.to_db_str(),
                log.event_type,
                log.created_at,
            ],
        )?;
        Ok(())
    }

    /// 查询供应商绩效历史 (按快照时间倒序)
    ///
    /// # 参数
    /// - `supplier_id`: 供应商ID
    /// - `limit`: 返回条数上限
    pub fn history(
        &self,
        supplier_id: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<SupplierPerformanceLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, supplier_id, quality_score, delivery_score, inventory_score,
                   financial_health_score, compliance_score, tier_score, tier_level,
                   event_type, created_at
            FROM supplier_performance_log
            WHERE supplier_id = ?1
            ORDER BY created_at DESC, log_id DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![supplier_id, limit as i64], Self::map_row)?;

        let mut logs = Vec::new();
        for row in rows {
            logs.push(row?);
        }
        Ok(logs)
    }

    /// 统计供应商快照条数
    pub fn count_by_supplier(&self, supplier_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM supplier_performance_log WHERE supplier_id = ?1",
            params![supplier_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::configure_sqlite_connection;
    use crate::domain::supplier::Supplier;

    fn setup_repo() -> PerformanceLogRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        PerformanceLogRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn snapshot(log_id: &str, minutes_ago: i64) -> SupplierPerformanceLog {
        let supplier = Supplier::new(
            "S001".to_string(),
            "OWN01".to_string(),
            "测试供应商".to_string(),
            "CN".to_string(),
        );
        let mut log =
            SupplierPerformanceLog::from_supplier(log_id.to_string(), &supplier, "ManualRecalc");
        log.created_at = chrono::Utc::now().naive_utc() - chrono::Duration::minutes(minutes_ago);
        log
    }

    #[test]
    fn test_history_ordered_newest_first() {
        let repo = setup_repo();
        repo.append(&snapshot("L001", 30)).unwrap();
        repo.append(&snapshot("L002", 20)).unwrap();
        repo.append(&snapshot("L003", 10)).unwrap();

        let history = repo.history("S001", 10).unwrap();
        let ids: Vec<&str> = history.iter().map(|l| l.log_id.as_str()).collect();
        assert_eq!(ids, vec!["L003", "L002", "L001"]);
    }

    #[test]
    fn test_history_respects_limit() {
        let repo = setup_repo();
        for i in 0..5 {
            repo.append(&snapshot(&format!("L{:03}", i), 5 - i as i64))
                .unwrap();
        }

        let history = repo.history("S001", 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(repo.count_by_supplier("S001").unwrap(), 5);
    }
}
