// ==========================================
// 供应商绩效评级系统 - 库存扰动领域模型
// ==========================================
// 职责: 供应商侧断供/可用性扰动事件
// 红线: 追加式记录,不可修改; 必须关联供应商
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 断供类事件类型的匹配子串
///
/// 事件类型为自由字符串 (STOCK_OUT / PARTIAL_STOCK_OUT / ...)，
/// 评分引擎按是否包含该子串识别断供事件。
pub const STOCK_OUT_MARKER: &str = "STOCK_OUT";

// ==========================================
// InventoryEvent - 库存扰动事件
// ==========================================
// 对齐: inventory_event 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEvent {
    // ===== 主键与归属 =====
    pub event_id: String,    // 事件ID
    pub supplier_id: String, // 供应商ID (必填)

    // ===== 事件内容 =====
    pub event_type: String,                          // 事件类型
    pub quantity_affected: i64,                      // 受影响数量
    pub expected_availability_date: Option<NaiveDate>, // 预计恢复日期
    pub days_unavailable: i32,                       // 不可供天数

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
}

impl InventoryEvent {
    /// 创建新的库存扰动事件
    pub fn new(event_id: String, supplier_id: String, event_type: String) -> Self {
        Self {
            event_id,
            supplier_id,
            event_type,
            quantity_affected: 0,
            expected_availability_date: None,
            days_unavailable: 0,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// 设置影响范围
    pub fn with_disruption(mut self, quantity_affected: i64, days_unavailable: i32) -> Self {
        self.quantity_affected = quantity_affected;
        self.days_unavailable = days_unavailable;
        self
    }

    /// 是否为断供类事件
    pub fn is_stock_out(&self) -> bool {
        self.event_type.contains(STOCK_OUT_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_out_marker_matching() {
        let event = InventoryEvent::new(
            "E001".to_string(),
            "S001".to_string(),
            "STOCK_OUT".to_string(),
        );
        assert!(event.is_stock_out());

        let partial = InventoryEvent::new(
            "E002".to_string(),
            "S001".to_string(),
            "PARTIAL_STOCK_OUT".to_string(),
        );
        assert!(partial.is_stock_out());

        let restored = InventoryEvent::new(
            "E003".to_string(),
            "S001".to_string(),
            "AVAILABILITY_RESTORED".to_string(),
        );
        assert!(!restored.is_stock_out());
    }
}
