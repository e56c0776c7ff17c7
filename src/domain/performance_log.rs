// ==========================================
// 供应商绩效评级系统 - 绩效快照日志领域模型
// ==========================================
// 红线: 每次重算必须追加一条快照,快照永不修改或删除
// 用途: 审计追踪,绩效历史回溯
// ==========================================

use crate::domain::supplier::Supplier;
use crate::domain::types::TierLevel;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SupplierPerformanceLog - 绩效快照
// ==========================================
// 对齐: supplier_performance_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierPerformanceLog {
    // ===== 主键与归属 =====
    pub log_id: String,      // 快照ID
    pub supplier_id: String, // 供应商ID

    // ===== 评分快照 =====
    pub quality_score: f64,
    pub delivery_score: f64,
    pub inventory_score: f64,
    pub financial_health_score: f64,
    pub compliance_score: f64,
    pub tier_score: f64,
    pub tier_level: TierLevel,

    // ===== 触发信息 =====
    pub event_type: String,        // 触发原因 (OrderDelivered / ManualRecalc / ...)
    pub created_at: NaiveDateTime, // 快照时间
}

impl SupplierPerformanceLog {
    /// 从重算后的供应商状态生成快照
    ///
    /// # 参数
    /// - `log_id`: 快照ID (通常使用UUID)
    /// - `supplier`: 重算后的供应商
    /// - `event_type`: 触发原因标识
    pub fn from_supplier(log_id: String, supplier: &Supplier, event_type: &str) -> Self {
        Self {
            log_id,
            supplier_id: supplier.supplier_id.clone(),
            quality_score: supplier.quality_score,
            delivery_score: supplier.delivery_score,
            inventory_score: supplier.inventory_score,
            financial_health_score: supplier.financial_health_score,
            compliance_score: supplier.compliance_score,
            tier_score: supplier.tier_score,
            tier_level: supplier.tier_level,
            event_type: event_type.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
