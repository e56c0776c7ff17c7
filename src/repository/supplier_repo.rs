// ==========================================
// 供应商绩效评级系统 - 供应商仓储
// ==========================================
// 职责: 管理 supplier 表的数据访问
// 红线: Repository 不含业务逻辑
// 红线: 评分写入走单事务 + 乐观锁校验,同事务内追加绩效快照
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::supplier::Supplier;
use crate::domain::types::{SupplierStatus, TierLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// SupplierRepository - 供应商仓储
// ==========================================
pub struct SupplierRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SupplierRepository {
    /// 创建新的 SupplierRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保相关表存在
    ///
    /// 说明: 评分写入与绩效快照同事务,因此两张表一并确保
    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS supplier (
              supplier_id TEXT PRIMARY KEY,
              owner_id TEXT NOT NULL,
              name TEXT NOT NULL,
              country TEXT NOT NULL,
              restricted_country INTEGER NOT NULL DEFAULT 0,
              status TEXT NOT NULL DEFAULT 'ACTIVE',
              quality_score REAL NOT NULL DEFAULT 0.0,
              delivery_score REAL NOT NULL DEFAULT 0.0,
              inventory_score REAL NOT NULL DEFAULT 0.0,
              financial_health_score REAL NOT NULL DEFAULT 0.0,
              compliance_score REAL NOT NULL DEFAULT 0.0,
              tier_score REAL NOT NULL DEFAULT 0.0,
              tier_level TEXT NOT NULL DEFAULT 'UNRATED',
              tier_last_updated TEXT,
              last_rating_update TEXT,
              total_orders INTEGER NOT NULL DEFAULT 0,
              successful_deliveries INTEGER NOT NULL DEFAULT 0,
              revision INTEGER NOT NULL DEFAULT 0,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_supplier_owner
              ON supplier(owner_id, supplier_id);

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

    /// 行映射
    fn map_row(row: &Row<'_>) -> rusqlite::Result<Supplier> {
        let status_str: String = row.get(5)?;
        let status = SupplierStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                Type::Text,
                format!("无法识别的供应商状态: {}", status_str).into(),
            )
        })?;

        let tier_str: String = row.get(12)?;
        let tier_level = TierLevel::from_str(&tier_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                Type::Text,
                format!("无法识别的绩效等级: {}", tier_str).into(),
            )
        })?;

        Ok(Supplier {
            supplier_id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            country: row.get(3)?,
            restricted_country: row.get::<_, i64>(4)? != 0,
            status,
            quality_score: row.get(6)?,
            delivery_score: row.get(7)?,
            inventory_score: row.get(8)?,
            financial_health_score: row.get(9)?,
            compliance_score: row.get(10)?,
            tier_score: row.get(11)?,
            tier_level,
            tier_last_updated: row.get(13)?,
            last_rating_update: row.get(14)?,
            total_orders: row.get(15)?,
            successful_deliveries: row.get(16)?,
            revision: row.get(17)?,
            created_at: row.get(18)?,
            updated_at: row.get(19)?,
        })
    }

    const SELECT_COLUMNS: &'static str = r#"
        supplier_id, owner_id, name, country, restricted_country, status,
        quality_score, delivery_score, inventory_score, financial_health_score,
        compliance_score, tier_score, tier_level, tier_last_updated,
        last_rating_update, total_orders, successful_deliveries, revision,
        created_at, updated_at
    "#;

    /// 插入新供应商
    pub fn insert(&self, supplier: &Supplier) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO supplier (
                supplier_id, owner_id, name, country, restricted_country, status,
                quality_score, delivery_score, inventory_score, financial_health_score,
                compliance_score, tier_score, tier_level, tier_last_updated,
                last_rating_update, total_orders, successful_deliveries, revision,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20
            )
            "#,
            params![
                supplier.supplier_id,
                supplier.owner_id,
                supplier.name,
                supplier.country,
                supplier.restricted_country as i64,
                supplier.status.to_db_str(),
                supplier.quality_score,
                supplier.delivery_score,
                supplier.inventory_score,
                supplier.financial_health_score,
                supplier.compliance_score,
                supplier.tier_score,
                supplier.tier_level.to_db_str(),
                supplier.tier_last_updated,
                supplier.last_rating_update,
                supplier.total_orders,
                supplier.successful_deliveries,
                supplier.revision,
                supplier.created_at,
                supplier.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询供应商
    pub fn find_by_id(&self, supplier_id: &str) -> RepositoryResult<Option<Supplier>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM supplier WHERE supplier_id = ?1",
            Self::SELECT_COLUMNS
        );
        let supplier = conn
            .query_row(&sql, params![supplier_id], Self::map_row)
            .optional()?;
        Ok(supplier)
    }

    /// 按ID查询供应商 (不存在视为错误)
    pub fn get_by_id(&self, supplier_id: &str) -> RepositoryResult<Supplier> {
        self.find_by_id(supplier_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Supplier".to_string(),
                id: supplier_id.to_string(),
            })
    }

    /// 按归属方列出供应商 (按 supplier_id 升序,保证全量任务处理顺序确定)
    pub fn list_by_owner(&self, owner_id: &str) -> RepositoryResult<Vec<Supplier>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM supplier WHERE owner_id = ?1 ORDER BY supplier_id ASC",
            Self::SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner_id], Self::map_row)?;

        let mut suppliers = Vec::new();
        for row in rows {
            suppliers.push(row?);
        }
        Ok(suppliers)
    }

    /// 更新供应商合作状态
    pub fn update_status(&self, supplier_id: &str, status: SupplierStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE supplier SET status = ?1, updated_at = ?2 WHERE supplier_id = ?3",
            params![
                status.to_db_str(),
                chrono::Utc::now().naive_utc(),
                supplier_id
            ],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Supplier".to_string(),
                id: supplier_id.to_string(),
            });
        }
        Ok(())
    }

    /// 更新合规评分 (外部供给,不触发重算)
    pub fn update_compliance_score(&self, supplier_id: &str, score: f64) -> RepositoryResult<()> {
        if !(0.0..=100.0).contains(&score) {
            return Err(RepositoryError::FieldValueError {
                field: "compliance_score".to_string(),
                message: format!("必须在 [0,100] 区间,当前为 {}", score),
            });
        }

        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE supplier SET compliance_score = ?1, updated_at = ?2 WHERE supplier_id = ?3",
            params![score, chrono::Utc::now().naive_utc(), supplier_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Supplier".to_string(),
                id: supplier_id.to_string(),
            });
        }
        Ok(())
    }

    /// 累计订单计数 (下单时调用)
    pub fn increment_total_orders(&self, supplier_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE supplier SET total_orders = total_orders + 1, updated_at = ?1 WHERE supplier_id = ?2",
            params![chrono::Utc::now().naive_utc(), supplier_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Supplier".to_string(),
                id: supplier_id.to_string(),
            });
        }
        Ok(())
    }

    /// 累计按期交付计数 (按期交付确认时调用)
    pub fn increment_successful_deliveries(&self, supplier_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "UPDATE supplier SET successful_deliveries = successful_deliveries + 1, updated_at = ?1 WHERE supplier_id = ?2",
            params![chrono::Utc::now().naive_utc(), supplier_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Supplier".to_string(),
                id: supplier_id.to_string(),
            });
        }
        Ok(())
    }

    /// 评分写入 (单事务: 更新评分字段 + 追加绩效快照)
    ///
    /// # 参数
    /// - `updated`: 重算后的供应商实体 (评分/等级/时间戳已填好)
    /// - `expected_revision`: 读取时的乐观锁版本号
    /// - `event_type`: 触发原因标识
    /// - `log_id`: 绩效快照ID
    ///
    /// # 返回
    /// - Ok(()): 写入成功 (revision 自增)
    /// - Err(OptimisticLockFailure): 读取后被其他写入抢先,调用方应重读重算
    /// - Err(NotFound): 供应商不存在
    pub fn apply_rating_update(
        &self,
        updated: &Supplier,
        expected_revision: i32,
        event_type: &str,
        log_id: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let rows = tx.execute(
            r#"
            UPDATE supplier SET
                quality_score = ?1,
                delivery_score = ?2,
                inventory_score = ?3,
                financial_health_score = ?4,
                tier_score = ?5,
                tier_level = ?6,
                tier_last_updated = ?7,
                last_rating_update = ?8,
                updated_at = ?9,
                revision = revision + 1
            WHERE supplier_id = ?10 AND revision = ?11
            "#,
            params![
                updated.quality_score,
                updated.delivery_score,
                updated.inventory_score,
                updated.financial_health_score,
                updated.tier_score,
                updated.tier_level.to_db_str(),
                updated.tier_last_updated,
                updated.last_rating_update,
                updated.updated_at,
                updated.supplier_id,
                expected_revision,
            ],
        )?;

        if rows == 0 {
            // 区分"记录不存在"与"版本冲突"
            let actual: Option<i32> = tx
                .query_row(
                    "SELECT revision FROM supplier WHERE supplier_id = ?1",
                    params![updated.supplier_id],
                    |row| row.get(0),
                )
                .optional()?;

            return match actual {
                Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                    supplier_id: updated.supplier_id.clone(),
                    expected: expected_revision,
                    actual,
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "Supplier".to_string(),
                    id: updated.supplier_id.clone(),
                }),
            };
        }

        tx.execute(
            r#"
            INSERT INTO supplier_performance_log (
                log_id, supplier_id, quality_score, delivery_score, inventory_score,
                financial_health_score, compliance_score, tier_score, tier_level,
                event_type, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                log_id,
                updated.supplier_id,
                updated.quality_score,
                updated.delivery_score,
                updated.inventory_score,
                updated.financial_health_score,
                updated.compliance_score,
                updated.tier_score,
                updated.tier_level.to_db_str(),
                event_type,
                updated.last_rating_update.unwrap_or(updated.updated_at),
            ],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 按归属方统计供应商数量
    pub fn count_by_owner(&self, owner_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM supplier WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
