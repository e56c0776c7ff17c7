// ==========================================
// 供应商绩效评级系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod backup;
pub mod financial;
pub mod inventory;
pub mod order;
pub mod performance_log;
pub mod quality;
pub mod recalc_log;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use backup::{BackupAssociation, ProcurementTask};
pub use financial::FinancialHealthSnapshot;
pub use inventory::{InventoryEvent, STOCK_OUT_MARKER};
pub use order::SupplierOrder;
pub use performance_log::SupplierPerformanceLog;
pub use quality::QualityIncident;
pub use recalc_log::RatingRecalcLog;
pub use supplier::{DimensionScores, Supplier};
pub use types::{
    BankruptcyRisk, IncidentSeverity, JobStatus, JobType, OrderStatus, SupplierStatus, TierLevel,
};
