// ==========================================
// 供应商绩效评级系统 - 引擎层
// ==========================================
// 职责: 业务规则计算 (评分/等级/备选选择)
// 红线: 引擎为纯计算,仓储操作由服务层编排
// ==========================================

pub mod events;
pub mod failover;
pub mod metrics;
pub mod tier;

// 重导出核心类型
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, RatingEvent, RatingEventPublisher, RatingEventType,
};
pub use failover::FailoverEngine;
pub use metrics::MetricEngine;
pub use tier::TierEngine;
