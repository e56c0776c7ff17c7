// ==========================================
// 供应商绩效评级系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + Tokio
// 系统定位: 供应链决策支持 (评级/分级/备选切换)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 服务层 - 重算编排/队列/worker
pub mod services;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 评分策略配置
pub mod config;

// 数据库基础设施 (连接初始化/PRAGMA 统一)
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BackupAssociation, BankruptcyRisk, DimensionScores, FinancialHealthSnapshot,
    IncidentSeverity, InventoryEvent, JobStatus, JobType, OrderStatus, ProcurementTask,
    QualityIncident, RatingRecalcLog, Supplier, SupplierOrder, SupplierPerformanceLog,
    SupplierStatus, TierLevel,
};

// 配置
pub use config::{MetricParams, ScoringConfig, ScoringWeights, TierThresholds};

// 引擎
pub use engine::{FailoverEngine, MetricEngine, RatingEventPublisher, TierEngine};

// 服务
pub use services::{
    RatingRecalcService, RecalcQueue, RecalcWorkerPool, SupplierRatingOutcome, WorkerPoolConfig,
};

// API
pub use api::{FailoverApi, PromotionOutcome, RatingApi, SupplierApi, SupplierEventApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应商绩效评级系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
