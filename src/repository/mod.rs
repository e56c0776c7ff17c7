// ==========================================
// 供应商绩效评级系统 - 数据仓储层
// ==========================================
// 职责: 数据访问,不含业务逻辑
// 红线: 引擎/服务层不得直接拼 SQL
// ==========================================

pub mod backup_repo;
pub mod error;
pub mod financial_repo;
pub mod inventory_repo;
pub mod order_repo;
pub mod performance_log_repo;
pub mod quality_repo;
pub mod recalc_log_repo;
pub mod supplier_repo;
pub mod task_repo;

// 重导出核心类型
pub use backup_repo::BackupAssociationRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use financial_repo::FinancialHealthRepository;
pub use inventory_repo::InventoryEventRepository;
pub use order_repo::SupplierOrderRepository;
pub use performance_log_repo::PerformanceLogRepository;
pub use quality_repo::QualityIncidentRepository;
pub use recalc_log_repo::RecalcLogRepository;
pub use supplier_repo::SupplierRepository;
pub use task_repo::ProcurementTaskRepository;
