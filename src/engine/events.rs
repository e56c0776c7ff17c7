// ==========================================
// 供应商绩效评级系统 - 引擎层事件发布
// ==========================================
// 职责: 定义评级触发事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Services 层实现适配器
// 优势: Engine 不依赖 Services，遵循依赖倒置原则
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 评级触发事件类型
// ==========================================

/// 评级触发事件类型
///
/// Engine 层定义的事件类型，用于通知重算管道
/// Services 层的 RecalcTrigger 可以从此类型转换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingEventType {
    /// 订单交付确认
    OrderDelivered,
    /// 质量事件上报
    IncidentReported,
    /// 库存扰动上报
    InventoryDisruption,
    /// 财务健康快照录入
    FinancialSnapshotRecorded,
    /// 人工触发重算
    ManualRecalc,
    /// 定时/全量重算
    ScheduledRecalc,
}

impl RatingEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            RatingEventType::OrderDelivered => "OrderDelivered",
            RatingEventType::IncidentReported => "IncidentReported",
            RatingEventType::InventoryDisruption => "InventoryDisruption",
            RatingEventType::FinancialSnapshotRecorded => "FinancialSnapshotRecorded",
            RatingEventType::ManualRecalc => "ManualRecalc",
            RatingEventType::ScheduledRecalc => "ScheduledRecalc",
        }
    }
}

/// 评级触发事件
///
/// Engine 层发布的事件，包含归属方、目标供应商和触发类型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingEvent {
    /// 归属方 ID
    pub owner_id: String,
    /// 目标供应商（None 表示归属方全量）
    pub supplier_id: Option<String>,
    /// 事件类型
    pub event_type: RatingEventType,
    /// 事件来源描述
    pub source: Option<String>,
}

impl RatingEvent {
    /// 创建单供应商事件
    pub fn for_supplier(
        owner_id: String,
        supplier_id: String,
        event_type: RatingEventType,
        source: Option<String>,
    ) -> Self {
        Self {
            owner_id,
            supplier_id: Some(supplier_id),
            event_type,
            source,
        }
    }

    /// 创建归属方全量事件
    pub fn full_scope(owner_id: String, event_type: RatingEventType, source: Option<String>) -> Self {
        Self {
            owner_id,
            supplier_id: None,
            event_type,
            source,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 评级事件发布者 Trait
///
/// Engine 层定义，Services 层实现
/// 通过 trait 实现依赖倒置，解除 Engine → Services 的直接依赖
///
/// # 实现说明
/// - Services 层的 `RecalcQueueAdapter` 实现此 trait
/// - 将 `RatingEvent` 转换为 `RecalcTask` 并入队
pub trait RatingEventPublisher: Send + Sync {
    /// 发布评级触发事件
    ///
    /// # 参数
    /// - `event`: 评级触发事件
    ///
    /// # 返回
    /// - `Ok(task_id)`: 任务 ID（如果支持）或空字符串
    /// - `Err`: 发布失败
    fn publish(&self, event: RatingEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl RatingEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: RatingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - owner_id={}, event_type={}",
            event.owner_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn RatingEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn RatingEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn RatingEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: RatingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - owner_id={}, event_type={}",
                    event.owner_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
