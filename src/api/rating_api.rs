// ==========================================
// 供应商绩效评级系统 - 评级 API
// ==========================================
// 职责: 人工重算(同步)、全量重算(异步入队)、任务轮询、绩效历史
// 红线: 人工单供应商路径同步返回最新评分;全量路径入队即返回
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::performance_log::SupplierPerformanceLog;
use crate::domain::recalc_log::RatingRecalcLog;
use crate::domain::types::JobType;
use crate::repository::{PerformanceLogRepository, RecalcLogRepository};
use crate::services::recalc_queue::{RecalcQueue, RecalcTask};
use crate::services::recalc_service::{RatingRecalcService, SupplierRatingOutcome};
use std::sync::Arc;

/// 绩效历史查询的默认条数上限
const DEFAULT_HISTORY_LIMIT: usize = 50;

// ==========================================
// RatingApi - 评级 API
// ==========================================
pub struct RatingApi {
    recalc_service: Arc<RatingRecalcService>,
    queue: Arc<RecalcQueue>,
    recalc_log_repo: Arc<RecalcLogRepository>,
    performance_log_repo: Arc<PerformanceLogRepository>,
}

impl RatingApi {
    /// 创建 RatingApi 实例
    pub fn new(
        recalc_service: Arc<RatingRecalcService>,
        queue: Arc<RecalcQueue>,
        recalc_log_repo: Arc<RecalcLogRepository>,
        performance_log_repo: Arc<PerformanceLogRepository>,
    ) -> Self {
        Self {
            recalc_service,
            queue,
            recalc_log_repo,
            performance_log_repo,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 人工重算单供应商 (同步执行并返回最新评分)
    pub fn recalculate(&self, supplier_id: &str) -> ApiResult<SupplierRatingOutcome> {
        let outcome =
            self.recalc_service
                .recalculate_supplier(supplier_id, JobType::Manual, "ManualRecalc")?;
        Ok(outcome)
    }

    /// 归属方全量重算 (异步: 入队即返回任务ID)
    ///
    /// # 返回
    /// 队列任务ID;任务执行后其 job_id 字段关联任务日志,
    /// 可通过 `get_task_status` / `get_job_status` 轮询进度
    pub fn recalculate_all(&self, owner_id: &str) -> ApiResult<String> {
        let task = RecalcTask::full_scope(
            owner_id.to_string(),
            "ManualRecalc",
            Some("RatingApi".to_string()),
        );
        let task_id = self.queue.enqueue(task)?;
        Ok(task_id)
    }

    /// 查询队列任务状态
    pub fn get_task_status(
        &self,
        task_id: &str,
    ) -> ApiResult<Option<crate::services::recalc_queue::RecalcTask>> {
        Ok(self.queue.get_task_status(task_id)?)
    }

    /// 查询任务日志 (按 job_id 轮询)
    pub fn get_job_status(&self, job_id: &str) -> ApiResult<Option<RatingRecalcLog>> {
        Ok(self.recalc_log_repo.find_by_id(job_id)?)
    }

    /// 按归属方列出任务日志 (按开始时间倒序)
    pub fn list_jobs(&self, owner_id: &str, limit: usize) -> ApiResult<Vec<RatingRecalcLog>> {
        Ok(self.recalc_log_repo.list_by_owner(owner_id, limit)?)
    }

    /// 查询供应商绩效历史 (按快照时间倒序)
    ///
    /// # 参数
    /// - `limit`: 返回条数上限 (0 表示使用默认上限)
    pub fn get_performance_history(
        &self,
        supplier_id: &str,
        limit: usize,
    ) -> ApiResult<Vec<SupplierPerformanceLog>> {
        let limit = if limit == 0 {
            DEFAULT_HISTORY_LIMIT
        } else {
            limit
        };
        Ok(self.performance_log_repo.history(supplier_id, limit)?)
    }
}
