// ==========================================
// 供应商绩效评级系统 - 重算任务日志领域模型
// ==========================================
// 职责: 一次重算任务(单供应商/全量)的执行记录
// 状态机: IN_PROGRESS -> {COMPLETED, FAILED}
// 红线: 任务终结仅发生一次; 失败任务不自动重试
// ==========================================

use crate::domain::types::{JobStatus, JobType};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RatingRecalcLog - 重算任务日志
// ==========================================
// 对齐: rating_recalc_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRecalcLog {
    // ===== 主键 =====
    pub job_id: String, // 任务ID

    // ===== 任务属性 =====
    pub job_type: JobType,        // 任务类型
    pub trigger_event: String,    // 触发事件标识
    pub owner_id: String,         // 归属方ID
    pub supplier_id: Option<String>, // 目标供应商 (全量任务为 None)

    // ===== 执行状态 =====
    pub status: JobStatus,                     // 任务状态
    pub started_at: NaiveDateTime,             // 开始时间
    pub completed_at: Option<NaiveDateTime>,   // 结束时间
    pub suppliers_processed: i64,              // 已处理供应商数
    pub suppliers_tier_changed: i64,           // 等级发生变化的供应商数
    pub error_message: Option<String>,         // 失败原因
}

impl RatingRecalcLog {
    /// 创建任务开始记录 (IN_PROGRESS)
    pub fn started(
        job_id: String,
        job_type: JobType,
        trigger_event: &str,
        owner_id: String,
        supplier_id: Option<String>,
    ) -> Self {
        Self {
            job_id,
            job_type,
            trigger_event: trigger_event.to_string(),
            owner_id,
            supplier_id,
            status: JobStatus::InProgress,
            started_at: chrono::Utc::now().naive_utc(),
            completed_at: None,
            suppliers_processed: 0,
            suppliers_tier_changed: 0,
            error_message: None,
        }
    }

    /// 任务是否已终结
    pub fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }
}
