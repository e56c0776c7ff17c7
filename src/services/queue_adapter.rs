// ==========================================
// 供应商绩效评级系统 - 评级事件适配器
// ==========================================
// 职责: 实现 Engine 层定义的 RatingEventPublisher trait
// 说明: 将 RatingEvent 转换为 RecalcTask 并入队,由后台 worker 消费
// 架构: 依赖倒置 - Services 层实现 Engine 层定义的接口
// ==========================================
// 红线: 发布即返回 (fire-and-forget),触发方不等待任务执行
// ==========================================

use crate::engine::events::{RatingEvent, RatingEventPublisher};
use crate::services::recalc_queue::{RecalcQueue, RecalcTask};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// RecalcQueueAdapter - 队列适配器
// ==========================================
pub struct RecalcQueueAdapter {
    queue: Arc<RecalcQueue>,
}

impl RecalcQueueAdapter {
    /// 创建适配器实例
    pub fn new(queue: Arc<RecalcQueue>) -> Self {
        Self { queue }
    }

    /// 将评级事件转换为重算任务
    fn convert_to_task(event: &RatingEvent) -> RecalcTask {
        match &event.supplier_id {
            Some(supplier_id) => RecalcTask::for_supplier(
                event.owner_id.clone(),
                supplier_id.clone(),
                event.event_type.as_str(),
                event.source.clone(),
            ),
            None => RecalcTask::full_scope(
                event.owner_id.clone(),
                event.event_type.as_str(),
                event.source.clone(),
            ),
        }
    }
}

impl RatingEventPublisher for RecalcQueueAdapter {
    fn publish(&self, event: RatingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        let task = Self::convert_to_task(&event);

        match self.queue.enqueue(task) {
            Ok(task_id) => {
                tracing::debug!(
                    "RecalcQueueAdapter: 事件已转换并入队 - task_id={}, owner_id={}, event_type={}",
                    task_id,
                    event.owner_id,
                    event.event_type.as_str()
                );
                Ok(task_id)
            }
            Err(e) => {
                tracing::error!(
                    "RecalcQueueAdapter: 事件入队失败 - owner_id={}, error={}",
                    event.owner_id,
                    e
                );
                Err(Box::new(e))
            }
        }
    }
}
