// ==========================================
// 供应商绩效评级系统 - 采购订单领域模型
// ==========================================
// 职责: 采购订单实体与交付确认规则
// 红线: 订单交付确认至多发生一次
// ==========================================

use crate::domain::types::OrderStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// SupplierOrder - 采购订单
// ==========================================
// 对齐: supplier_order 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierOrder {
    // ===== 主键与归属 =====
    pub order_id: String,     // 订单ID
    pub supplier_id: String,  // 供应商ID
    pub order_number: String, // 业务订单号

    // ===== 交付字段 =====
    pub status: OrderStatus,                      // 订单状态
    pub expected_delivery_date: NaiveDate,        // 约定交付日期
    pub actual_delivery_date: Option<NaiveDate>,  // 实际交付日期
    pub on_time: Option<bool>,                    // 是否按期 (交付确认时写入)
    pub days_delayed: Option<i32>,                // 延迟天数 (提前交付为0)

    // ===== 质量字段 =====
    pub item_count: i64,           // 订单件数
    pub defect_count: i64,         // 缺陷件数 (交付后可补录)
    pub lead_time_accuracy_days: Option<i32>, // 交期预测偏差(天)

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SupplierOrder {
    /// 创建新下达的订单
    pub fn new(
        order_id: String,
        supplier_id: String,
        order_number: String,
        expected_delivery_date: NaiveDate,
        item_count: i64,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            order_id,
            supplier_id,
            order_number,
            status: OrderStatus::Pending,
            expected_delivery_date,
            actual_delivery_date: None,
            on_time: None,
            days_delayed: None,
            item_count,
            defect_count: 0,
            lead_time_accuracy_days: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否已交付
    pub fn is_delivered(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    /// 计算交付确认后的延迟字段
    ///
    /// # 参数
    /// - `actual`: 实际交付日期
    ///
    /// # 返回
    /// (on_time, days_delayed)  提前或按期交付时 days_delayed 为 0
    pub fn delivery_delay(&self, actual: NaiveDate) -> (bool, i32) {
        let delay = (actual - self.expected_delivery_date).num_days();
        if delay <= 0 {
            (true, 0)
        } else {
            (false, delay as i32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order() -> SupplierOrder {
        SupplierOrder::new(
            "O001".to_string(),
            "S001".to_string(),
            "PO-2026-0001".to_string(),
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            100,
        )
    }

    #[test]
    fn test_new_order_pending() {
        let order = test_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.is_delivered());
        assert!(order.on_time.is_none());
    }

    #[test]
    fn test_delivery_delay_on_time() {
        let order = test_order();
        // 提前一天交付
        let (on_time, delay) = order.delivery_delay(NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert!(on_time);
        assert_eq!(delay, 0);

        // 当日交付
        let (on_time, delay) = order.delivery_delay(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert!(on_time);
        assert_eq!(delay, 0);
    }

    #[test]
    fn test_delivery_delay_late() {
        let order = test_order();
        let (on_time, delay) = order.delivery_delay(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap());
        assert!(!on_time);
        assert_eq!(delay, 5);
    }
}
