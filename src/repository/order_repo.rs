// ==========================================
// 供应商绩效评级系统 - 采购订单仓储
// ==========================================
// 职责: 管理 supplier_order 表的数据访问
// 红线: Repository 不含业务逻辑
// 红线: 交付确认至多发生一次 (状态机在此落地为 SQL 条件)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::order::SupplierOrder;
use crate::domain::types::OrderStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SupplierOrderRepository - 采购订单仓储
// ==========================================
pub struct SupplierOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SupplierOrderRepository {
    /// 创建新的 SupplierOrderRepository 实例
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
            CREATE TABLE IF NOT EXISTS supplier_order (
              order_id TEXT PRIMARY KEY,
              supplier_id TEXT NOT NULL,
              order_number TEXT NOT NULL,
              status TEXT NOT NULL DEFAULT 'PENDING',
              expected_delivery_date TEXT NOT NULL,
              actual_delivery_date TEXT,
              on_time INTEGER,
              days_delayed INTEGER,
              item_count INTEGER NOT NULL DEFAULT 0,
              defect_count INTEGER NOT NULL DEFAULT 0,
              lead_time_accuracy_days INTEGER,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_order_supplier
              ON supplier_order(supplier_id, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<SupplierOrder> {
        let status_str: String = row.get(3)?;
        let status = OrderStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("无法识别的订单状态: {}", status_str).into(),
            )
        })?;

        Ok(SupplierOrder {
            order_id: row.get(0)?,
            supplier_id: row.get(1)?,
            order_number: row.get(2)?,
            status,
            expected_delivery_date: row.get(4)?,
            actual_delivery_date: row.get(5)?,
            on_time: row.get::<_, Option<i64>>(6)?.map(|v| v != 0),
            days_delayed: row.get(7)?,
            item_count: row.get(8)?,
            defect_count: row.get(9)?,
            lead_time_accuracy_days: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        order_id, supplier_id, order_number, status, expected_delivery_date,
        actual_delivery_date, on_time, days_delayed, item_count, defect_count,
        lead_time_accuracy_days, created_at, updated_at
    "#;

    /// 插入新订单
    pub fn insert(&self, order: &SupplierOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier_order (
                order_id, supplier_id, order_number, status, expected_delivery_date,
                actual_delivery_date, on_time, days_delayed, item_count, defect_count,
                lead_time_accuracy_days, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                order.order_id,
                order.supplier_id,
                order.order_number,
                order.status.to_db_str(),
                order.expected_delivery_date,
                order.actual_delivery_date,
                order.on_time.map(|v| v as i64),
                order.days_delayed,
                order.item_count,
                order.defect_count,
                order.lead_time_accuracy_days,
                order.created_at,
                order.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询订单
    pub fn find_by_id(&self, order_id: &str) -> RepositoryResult<Option<SupplierOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM supplier_order WHERE order_id = ?1",
            Self::SELECT_COLUMNS
        );
        let order = conn
            .query_row(&sql, params![order_id], Self::map_row)
            .optional()?;
        Ok(order)
    }

    /// 按ID查询订单 (不存在视为错误)
    pub fn get_by_id(&self, order_id: &str) -> RepositoryResult<SupplierOrder> {
        self.find_by_id(order_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "SupplierOrder".to_string(),
                id: order_id.to_string(),
            })
    }

    /// 交付确认 (状态转为 DELIVERED,至多一次)
    ///
    /// # 参数
    /// - `order_id`: 订单ID
    /// - `actual_date`: 实际交付日期
    /// - `on_time`: 是否按期
    /// - `days_delayed`: 延迟天数
    /// - `lead_time_accuracy_days`: 交期预测偏差 (可选)
    ///
    /// # 返回
    /// - Ok(SupplierOrder): 更新后的订单
    /// - Err(InvalidStateTransition): 订单已交付或已取消
    pub fn confirm_delivery(
        &self,
        order_id: &str,
        actual_date: NaiveDate,
        on_time: bool,
        days_delayed: i32,
        lead_time_accuracy_days: Option<i32>,
    ) -> RepositoryResult<SupplierOrder> {
        let current = self.get_by_id(order_id)?;
        if current.status == OrderStatus::Delivered || current.status == OrderStatus::Cancelled {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.status.to_db_str().to_string(),
                to: OrderStatus::Delivered.to_db_str().to_string(),
            });
        }

        let conn = self.get_conn()?;
        // 状态条件写入 WHERE,防止读取后被并发确认抢先
        let rows = conn.execute(
            r#"
            UPDATE supplier_order SET
                status = 'DELIVERED',
                actual_delivery_date = ?1,
                on_time = ?2,
                days_delayed = ?3,
                lead_time_accuracy_days = ?4,
                updated_at = ?5
            WHERE order_id = ?6 AND status NOT IN ('DELIVERED', 'CANCELLED')
            "#,
            params![
                actual_date,
                on_time as i64,
                days_delayed,
                lead_time_accuracy_days,
                chrono::Utc::now().naive_utc(),
                order_id,
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::InvalidStateTransition {
                from: current.status.to_db_str().to_string(),
                to: OrderStatus::Delivered.to_db_str().to_string(),
            });
        }

        drop(conn);
        self.get_by_id(order_id)
    }

    /// 交付后补录缺陷件数 (质量标注)
    pub fn annotate_defects(&self, order_id: &str, defect_count: i64) -> RepositoryResult<()> {
        let current = self.get_by_id(order_id)?;
        if current.status != OrderStatus::Delivered {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "仅已交付订单可补录缺陷: order_id={}, status={}",
                order_id, current.status
            )));
        }

        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE supplier_order SET defect_count = ?1, updated_at = ?2 WHERE order_id = ?3",
            params![defect_count, chrono::Utc::now().naive_utc(), order_id],
        )?;
        Ok(())
    }

    /// 查询供应商在时间窗口内的订单 (按创建时间升序)
    pub fn list_by_supplier_since(
        &self,
        supplier_id: &str,
        since: NaiveDateTime,
    ) -> RepositoryResult<Vec<SupplierOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM supplier_order WHERE supplier_id = ?1 AND created_at >= ?2 ORDER BY created_at ASC",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![supplier_id, since], Self::map_row)?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::configure_sqlite_connection;

    fn setup_repo() -> SupplierOrderRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        SupplierOrderRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    fn test_order(id: &str) -> SupplierOrder {
        SupplierOrder::new(
            id.to_string(),
            "S001".to_string(),
            format!("PO-{}", id),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            100,
        )
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup_repo();
        repo.insert(&test_order("O001")).unwrap();

        let found = repo.get_by_id("O001").unwrap();
        assert_eq!(found.status, OrderStatus::Pending);
        assert!(found.actual_delivery_date.is_none());
    }

    #[test]
    fn test_confirm_delivery_once() {
        let repo = setup_repo();
        repo.insert(&test_order("O001")).unwrap();

        let delivered = repo
            .confirm_delivery(
                "O001",
                NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
                false,
                2,
                Some(1),
            )
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.days_delayed, Some(2));
        assert_eq!(delivered.on_time, Some(false));

        // 第二次确认必须被拒绝
        let result = repo.confirm_delivery(
            "O001",
            NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
            false,
            3,
            None,
        );
        assert!(matches!(
            result,
            Err(RepositoryError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_annotate_defects_requires_delivered() {
        let repo = setup_repo();
        repo.insert(&test_order("O001")).unwrap();

        let result = repo.annotate_defects("O001", 5);
        assert!(matches!(
            result,
            Err(RepositoryError::BusinessRuleViolation(_))
        ));

        repo.confirm_delivery(
            "O001",
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            true,
            0,
            None,
        )
        .unwrap();
        repo.annotate_defects("O001", 5).unwrap();

        let order = repo.get_by_id("O001").unwrap();
        assert_eq!(order.defect_count, 5);
    }

    #[test]
    fn test_list_by_supplier_since() {
        let repo = setup_repo();
        repo.insert(&test_order("O001")).unwrap();
        repo.insert(&test_order("O002")).unwrap();

        let since = chrono::Utc::now().naive_utc() - chrono::Duration::days(90);
        let orders = repo.list_by_supplier_since("S001", since).unwrap();
        assert_eq!(orders.len(), 2);

        let future = chrono::Utc::now().naive_utc() + chrono::Duration::days(1);
        let none = repo.list_by_supplier_since("S001", future).unwrap();
        assert!(none.is_empty());
    }
}
