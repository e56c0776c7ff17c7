// ==========================================
// 供应商绩效评级系统 - 供应商领域模型
// ==========================================
// 职责: 供应商主数据 + 五维评分 + 等级字段
// 红线: 评分/等级字段只允许通过重算流程写入
// ==========================================

use crate::domain::types::{SupplierStatus, TierLevel};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Supplier - 供应商主数据
// ==========================================
// 对齐: supplier 表
// 说明: revision 为乐观锁版本号，每次评分写入自增
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    // ===== 主键与归属 =====
    pub supplier_id: String,       // 供应商ID
    pub owner_id: String,          // 归属方ID (采购主体)
    pub name: String,              // 供应商名称
    pub country: String,           // 国家代码
    pub restricted_country: bool,  // 受限国家标记
    pub status: SupplierStatus,    // 合作状态

    // ===== 五维评分 [0,100] =====
    pub quality_score: f64,          // 质量
    pub delivery_score: f64,         // 交付
    pub inventory_score: f64,        // 库存保障
    pub financial_health_score: f64, // 财务健康
    pub compliance_score: f64,       // 合规 (外部供给,重算时保持不变)

    // ===== 综合等级 =====
    pub tier_score: f64,                        // 综合评分 [0,100]
    pub tier_level: TierLevel,                  // 绩效等级
    pub tier_last_updated: Option<NaiveDateTime>,   // 等级更新时间
    pub last_rating_update: Option<NaiveDateTime>,  // 评分更新时间 (与上者同时写入)

    // ===== 累计计数 =====
    pub total_orders: i64,          // 累计订单数
    pub successful_deliveries: i64, // 累计按期交付数

    // ===== 并发控制 =====
    pub revision: i32, // 乐观锁版本号

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Supplier {
    /// 创建新注册的供应商（未评级状态）
    ///
    /// # 参数
    /// - `supplier_id`: 供应商ID (通常使用UUID)
    /// - `owner_id`: 归属方ID
    /// - `name`: 供应商名称
    /// - `country`: 国家代码
    pub fn new(supplier_id: String, owner_id: String, name: String, country: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            supplier_id,
            owner_id,
            name,
            country,
            restricted_country: false,
            status: SupplierStatus::Active,
            quality_score: 0.0,
            delivery_score: 0.0,
            inventory_score: 0.0,
            financial_health_score: 0.0,
            compliance_score: 0.0,
            tier_score: 0.0,
            tier_level: TierLevel::Unrated,
            tier_last_updated: None,
            last_rating_update: None,
            total_orders: 0,
            successful_deliveries: 0,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置受限国家标记
    pub fn with_restricted_country(mut self, restricted: bool) -> Self {
        self.restricted_country = restricted;
        self
    }

    /// 设置初始合规评分
    pub fn with_compliance_score(mut self, score: f64) -> Self {
        self.compliance_score = score;
        self
    }

    /// 是否可作为备选供应商被提升
    ///
    /// 条件: 状态为 ACTIVE 且非受限国家
    pub fn is_promotable(&self) -> bool {
        self.status == SupplierStatus::Active && !self.restricted_country
    }
}

// ==========================================
// DimensionScores - 四维计算评分
// ==========================================
// 说明: 引擎计算输出,不含合规分(外部供给)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub quality: f64,          // 质量评分
    pub delivery: f64,         // 交付评分
    pub inventory: f64,        // 库存保障评分
    pub financial_health: f64, // 财务健康评分
}

impl DimensionScores {
    /// 校验所有维度评分均在 [0,100] 区间
    pub fn is_valid(&self) -> bool {
        [
            self.quality,
            self.delivery,
            self.inventory,
            self.financial_health,
        ]
        .iter()
        .all(|s| (0.0..=100.0).contains(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_supplier_is_unrated() {
        let supplier = Supplier::new(
            "S001".to_string(),
            "OWN01".to_string(),
            "宝钢原料".to_string(),
            "CN".to_string(),
        );

        assert_eq!(supplier.tier_level, TierLevel::Unrated);
        assert_eq!(supplier.status, SupplierStatus::Active);
        assert_eq!(supplier.revision, 0);
        assert!(supplier.tier_last_updated.is_none());
        assert!(supplier.last_rating_update.is_none());
    }

    #[test]
    fn test_is_promotable() {
        let mut supplier = Supplier::new(
            "S001".to_string(),
            "OWN01".to_string(),
            "测试供应商".to_string(),
            "CN".to_string(),
        );
        assert!(supplier.is_promotable());

        supplier.status = SupplierStatus::Suspended;
        assert!(!supplier.is_promotable());

        supplier.status = SupplierStatus::Active;
        supplier.restricted_country = true;
        assert!(!supplier.is_promotable());
    }

    #[test]
    fn test_dimension_scores_valid_range() {
        let scores = DimensionScores {
            quality: 90.0,
            delivery: 85.0,
            inventory: 80.0,
            financial_health: 70.0,
        };
        assert!(scores.is_valid());

        let bad = DimensionScores {
            quality: 101.0,
            ..scores
        };
        assert!(!bad.is_valid());
    }
}
