// ==========================================
// 供应商绩效评级系统 - 库存扰动事件仓储
// ==========================================
// 职责: 管理 inventory_event 表的数据访问 (追加式)
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::inventory::InventoryEvent;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// InventoryEventRepository - 库存扰动事件仓储
// ==========================================
pub struct InventoryEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryEventRepository {
    /// 创建新的 InventoryEventRepository 实例
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
            CREATE TABLE IF NOT EXISTS inventory_event (
              event_id TEXT PRIMARY KEY,
              supplier_id TEXT NOT NULL,
              event_type TEXT NOT NULL,
              quantity_affected INTEGER NOT NULL DEFAULT 0,
              expected_availability_date TEXT,
              days_unavailable INTEGER NOT NULL DEFAULT 0,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_inventory_event_supplier
              ON inventory_event(supplier_id, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<InventoryEvent> {
        Ok(InventoryEvent {
            event_id: row.get(0)?,
            supplier_id: row.get(1)?,
            event_type: row.get(2)?,
            quantity_affected: row.get(3)?,
            expected_availability_date: row.get(4)?,
            days_unavailable: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// 追加库存扰动事件
    pub fn insert(&self, event: &InventoryEvent) -> RepositoryResult<()> {
        if event.supplier_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "库存扰动事件必须关联供应商".to_string(),
            ));
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO inventory_event (
                event_id, supplier_id, event_type, quantity_affected,
                expected_availability_date, days_unavailable, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                event.event_id,
                event.supplier_id,
                event.event_type,
                event.quantity_affected,
                event.expected_availability_date,
                event.days_unavailable,
                event.created_at,
            ],
        )?;
        Ok(())
    }

    /// 查询供应商在时间窗口内的库存扰动事件 (按创建时间升序)
    pub fn list_by_supplier_since(
        &self,
        supplier_id: &str,
        since: NaiveDateTime,
    ) -> RepositoryResult<Vec<InventoryEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, supplier_id, event_type, quantity_affected,
                   expected_availability_date, days_unavailable, created_at
            FROM inventory_event
            WHERE supplier_id = ?1 AND created_at >= ?2
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt.query_map(params![supplier_id, since], Self::map_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::configure_sqlite_connection;

    fn setup_repo() -> InventoryEventRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        InventoryEventRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_insert_and_list() {
        let repo = setup_repo();
        let event = InventoryEvent::new(
            "E001".to_string(),
            "S001".to_string(),
            "STOCK_OUT".to_string(),
        )
        .with_disruption(500, 7);
        repo.insert(&event).unwrap();

        let since = chrono::Utc::now().naive_utc() - chrono::Duration::days(90);
        let events = repo.list_by_supplier_since("S001", since).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_stock_out());
        assert_eq!(events[0].days_unavailable, 7);
    }

    #[test]
    fn test_insert_requires_supplier() {
        let repo = setup_repo();
        let event = InventoryEvent::new("E001".to_string(), " ".to_string(), "STOCK_OUT".to_string());
        assert!(matches!(
            repo.insert(&event),
            Err(RepositoryError::ValidationError(_))
        ));
    }
}
