// ==========================================
// 供应商绩效评级系统 - 服务层
// ==========================================
// 职责: 重算编排、任务队列、后台 worker
// 红线: 服务层编排仓储与引擎,自身不拼 SQL (队列表除外)
// ==========================================

pub mod queue_adapter;
pub mod recalc_queue;
pub mod recalc_service;
pub mod worker;

// 重导出核心类型
pub use queue_adapter::RecalcQueueAdapter;
pub use recalc_queue::{QueueStats, RecalcQueue, RecalcTask, TaskStatus};
pub use recalc_service::{RatingRecalcService, SupplierRatingOutcome};
pub use worker::{RecalcScheduler, RecalcWorkerPool, WorkerPoolConfig};
