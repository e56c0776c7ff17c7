// ==========================================
// 供应商绩效评级系统 - 质量事件领域模型
// ==========================================
// 职责: 质量事件(缺陷/问题)实体与处置规则
// 红线: 质量事件必须关联供应商; 处置仅发生一次
// ==========================================

use crate::domain::types::IncidentSeverity;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// QualityIncident - 质量事件
// ==========================================
// 对齐: quality_incident 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIncident {
    // ===== 主键与归属 =====
    pub incident_id: String,      // 事件ID
    pub supplier_id: String,      // 供应商ID (必填)
    pub order_id: Option<String>, // 关联订单 (可选)

    // ===== 事件内容 =====
    pub incident_type: String,        // 事件类型 (DEFECT / SPEC_MISMATCH / ...)
    pub severity: IncidentSeverity,   // 严重度
    pub financial_impact: f64,        // 财务影响金额
    pub items_affected: i64,          // 受影响件数

    // ===== 处置 =====
    pub resolved: bool,                       // 是否已处置
    pub resolved_at: Option<NaiveDateTime>,   // 处置时间
    pub resolution_note: Option<String>,      // 处置说明

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
}

impl QualityIncident {
    /// 创建新上报的质量事件
    pub fn new(
        incident_id: String,
        supplier_id: String,
        incident_type: String,
        severity: IncidentSeverity,
    ) -> Self {
        Self {
            incident_id,
            supplier_id,
            order_id: None,
            incident_type,
            severity,
            financial_impact: 0.0,
            items_affected: 0,
            resolved: false,
            resolved_at: None,
            resolution_note: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// 关联订单
    pub fn with_order(mut self, order_id: String) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// 设置财务影响与受影响件数
    pub fn with_impact(mut self, financial_impact: f64, items_affected: i64) -> Self {
        self.financial_impact = financial_impact;
        self.items_affected = items_affected;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_incident_unresolved() {
        let incident = QualityIncident::new(
            "I001".to_string(),
            "S001".to_string(),
            "DEFECT".to_string(),
            IncidentSeverity::High,
        )
        .with_order("O001".to_string())
        .with_impact(12_000.0, 30);

        assert!(!incident.resolved);
        assert!(incident.resolved_at.is_none());
        assert_eq!(incident.order_id.as_deref(), Some("O001"));
        assert_eq!(incident.items_affected, 30);
    }
}
