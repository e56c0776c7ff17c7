// ==========================================
// 供应商绩效评级系统 - 财务健康快照仓储
// ==========================================
// 职责: 管理 supplier_financial_health 表 (追加式,最新快照为准)
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::financial::FinancialHealthSnapshot;
use crate::domain::types::BankruptcyRisk;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// FinancialHealthRepository - 财务健康快照仓储
// ==========================================
pub struct FinancialHealthRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FinancialHealthRepository {
    /// 创建新的 FinancialHealthRepository 实例
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
            CREATE TABLE IF NOT EXISTS supplier_financial_health (
              snapshot_id TEXT PRIMARY KEY,
              supplier_id TEXT NOT NULL,
              credit_score INTEGER,
              credit_rating TEXT,
              annual_revenue REAL,
              employee_count INTEGER,
              years_in_business INTEGER,
              bankruptcy_risk TEXT,
              legal_issues INTEGER NOT NULL DEFAULT 0,
              recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_financial_supplier
              ON supplier_financial_health(supplier_id, recorded_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<FinancialHealthSnapshot> {
        let risk_str: Option<String> = row.get(7)?;
        let bankruptcy_risk = match risk_str {
            Some(s) => Some(BankruptcyRisk::from_str(&s).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    Type::Text,
                    format!("无法识别的破产风险等级: {}", s).into(),
                )
            })?),
            None => None,
        };

        Ok(FinancialHealthSnapshot {
            snapshot_id: row.get(0)?,
            supplier_id: row.get(1)?,
            credit_score: row.get(2)?,
            credit_rating: row.get(3)?,
            annual_revenue: row.get(4)?,
            employee_count: row.get(5)?,
            years_in_business: row.get(6)?,
            bankruptcy_risk,
            legal_issues: row.get::<_, i64>(8)? != 0,
            recorded_at: row.get(9)?,
        })
    }

    /// 追加财务健康快照
    pub fn insert(&self, snapshot: &FinancialHealthSnapshot) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier_financial_health (
                snapshot_id, supplier_id, credit_score, credit_rating, annual_revenue,
                employee_count, years_in_business, bankruptcy_risk, legal_issues, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                snapshot.snapshot_id,
                snapshot.supplier_id,
                snapshot.credit_score,
                snapshot.credit_rating,
                snapshot.annual_revenue,
                snapshot.employee_count,
                snapshot.years_in_business,
                snapshot.bankruptcy_risk.map(|r| r.to_db_str()),
                snapshot.legal_issues as i64,
                snapshot.recorded_at,
            ],
        )?;
        Ok(())
    }

    /// 取供应商最新的财务健康快照 (按 recorded_at 取最新)
    pub fn latest_by_supplier(
        &self,
        supplier_id: &str,
    ) -> RepositoryResult<Option<FinancialHealthSnapshot>> {
        let conn = self.get_conn()?;
        let snapshot = conn
            .query_row(
                r#"
                SELECT snapshot_id, supplier_id, credit_score, credit_rating, annual_revenue,
                       employee_count, years_in_business, bankruptcy_risk, legal_issues, recorded_at
                FROM supplier_financial_health
                WHERE supplier_id = ?1
                ORDER BY recorded_at DESC
                LIMIT 1
                "#,
                params![supplier_id],
                Self::map_row,
            )
            .optional()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::configure_sqlite_connection;

    fn setup_repo() -> FinancialHealthRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        FinancialHealthRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_latest_by_supplier() {
        let repo = setup_repo();

        let mut old = FinancialHealthSnapshot::new("F001".to_string(), "S001".to_string())
            .with_credit(650, None);
        old.recorded_at = chrono::Utc::now().naive_utc() - chrono::Duration::days(30);
        repo.insert(&old).unwrap();

        let new = FinancialHealthSnapshot::new("F002".to_string(), "S001".to_string())
            .with_credit(720, Some("AA".to_string()))
            .with_risk(BankruptcyRisk::Low, false);
        repo.insert(&new).unwrap();

        let latest = repo.latest_by_supplier("S001").unwrap().unwrap();
        assert_eq!(latest.snapshot_id, "F002");
        assert_eq!(latest.credit_score, Some(720));

        assert!(repo.latest_by_supplier("S404").unwrap().is_none());
    }
}
