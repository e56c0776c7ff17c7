// ==========================================
// 供应商绩效评级系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和 API 实例
// 说明: 所有仓储共享一个连接,评分写入的互斥由连接锁 + 乐观锁保证
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{FailoverApi, RatingApi, SupplierApi, SupplierEventApi};
use crate::config::ScoringConfig;
use crate::db::{open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::events::{OptionalEventPublisher, RatingEventPublisher};
use crate::importer::OrderImporterImpl;
use crate::repository::{
    BackupAssociationRepository, FinancialHealthRepository, InventoryEventRepository,
    PerformanceLogRepository, ProcurementTaskRepository, QualityIncidentRepository,
    RecalcLogRepository, SupplierOrderRepository, SupplierRepository,
};
use crate::services::{RatingRecalcService, RecalcQueue, RecalcQueueAdapter};

/// 应用状态
///
/// 包含所有 API 实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 供应商管理 API
    pub supplier_api: Arc<SupplierApi>,

    /// 运营事件 API
    pub event_api: Arc<SupplierEventApi>,

    /// 评级 API
    pub rating_api: Arc<RatingApi>,

    /// 备选切换 API
    pub failover_api: Arc<FailoverApi>,

    /// 订单批量导入
    pub order_importer: Arc<OrderImporterImpl>,

    /// 重算任务队列 (worker 池与调度器从这里消费)
    pub recalc_queue: Arc<RecalcQueue>,

    /// 事件发布器 (触发评级重算)
    pub event_publisher: Arc<dyn RatingEventPublisher>,
}

impl AppState {
    /// 以默认评分策略创建 AppState
    pub fn new(db_path: &str) -> Result<Self, String> {
        Self::with_config(db_path, ScoringConfig::default())
    }

    /// 创建 AppState 实例
    ///
    /// # 说明
    /// 1. 校验评分策略配置
    /// 2. 打开共享数据库连接 (各仓储自建表)
    /// 3. 初始化仓储/引擎/服务/队列/API
    pub fn with_config(db_path: &str, config: ScoringConfig) -> Result<Self, String> {
        tracing::info!("初始化 AppState,数据库路径: {}", db_path);

        config
            .validate()
            .map_err(|e| format!("评分策略配置不合法: {}", e))?;

        let conn = open_sqlite_connection(db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        // 旧库提示 (不做自动迁移)
        match read_schema_version(&conn) {
            Ok(Some(version)) if version != CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    "数据库 schema_version={} 与期望的 {} 不一致",
                    version,
                    CURRENT_SCHEMA_VERSION
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("读取 schema_version 失败(将继续启动): {}", e),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化 Repository 层
        // ==========================================
        let supplier_repo = Arc::new(
            SupplierRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 SupplierRepository: {}", e))?,
        );
        let order_repo = Arc::new(
            SupplierOrderRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 SupplierOrderRepository: {}", e))?,
        );
        let quality_repo = Arc::new(
            QualityIncidentRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 QualityIncidentRepository: {}", e))?,
        );
        let inventory_repo = Arc::new(
            InventoryEventRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 InventoryEventRepository: {}", e))?,
        );
        let financial_repo = Arc::new(
            FinancialHealthRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 FinancialHealthRepository: {}", e))?,
        );
        let performance_log_repo = Arc::new(
            PerformanceLogRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 PerformanceLogRepository: {}", e))?,
        );
        let recalc_log_repo = Arc::new(
            RecalcLogRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 RecalcLogRepository: {}", e))?,
        );
        let backup_repo = Arc::new(
            BackupAssociationRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 BackupAssociationRepository: {}", e))?,
        );
        let task_repo = Arc::new(
            ProcurementTaskRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建 ProcurementTaskRepository: {}", e))?,
        );

        // ==========================================
        // 初始化服务层 (重算服务 + 队列 + 事件适配器)
        // ==========================================
        let recalc_service = Arc::new(RatingRecalcService::new(
            supplier_repo.clone(),
            order_repo.clone(),
            quality_repo.clone(),
            inventory_repo.clone(),
            financial_repo.clone(),
            recalc_log_repo.clone(),
            &config,
        ));

        let recalc_queue = Arc::new(
            RecalcQueue::new(conn.clone(), recalc_service.clone())
                .map_err(|e| format!("无法创建 RecalcQueue: {}", e))?,
        );

        // 适配器实现 Engine -> Services 的事件传递 (依赖倒置)
        let event_publisher: Arc<dyn RatingEventPublisher> =
            Arc::new(RecalcQueueAdapter::new(recalc_queue.clone()));

        // ==========================================
        // 初始化 API 层
        // ==========================================
        let supplier_api = Arc::new(SupplierApi::new(supplier_repo.clone()));

        let event_api = Arc::new(SupplierEventApi::new(
            supplier_repo.clone(),
            order_repo.clone(),
            quality_repo.clone(),
            inventory_repo.clone(),
            financial_repo.clone(),
            OptionalEventPublisher::with_publisher(event_publisher.clone()),
        ));

        let rating_api = Arc::new(RatingApi::new(
            recalc_service,
            recalc_queue.clone(),
            recalc_log_repo,
            performance_log_repo,
        ));

        let failover_api = Arc::new(FailoverApi::new(
            supplier_repo.clone(),
            backup_repo,
            task_repo,
        ));

        let order_importer = Arc::new(OrderImporterImpl::new(
            supplier_repo,
            order_repo,
            OptionalEventPublisher::with_publisher(event_publisher.clone()),
        ));

        tracing::info!("AppState 初始化完成");

        Ok(Self {
            db_path: db_path.to_string(),
            supplier_api,
            event_api,
            rating_api,
            failover_api,
            order_importer,
            recalc_queue,
            event_publisher,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 SUPPLIER_RATING_DB_PATH
/// 2. 用户数据目录/supplier-rating{-dev}/supplier_rating.db
/// 3. 回退 ./supplier_rating.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("SUPPLIER_RATING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./supplier_rating.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录,避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("supplier-rating-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("supplier-rating");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("supplier_rating.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_rejects_invalid_config() {
        let mut config = ScoringConfig::default();
        config.weights.quality = 0.9; // 权重不归一
        let result = AppState::with_config(":memory:", config);
        assert!(result.is_err());
    }
}
