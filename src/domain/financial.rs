// ==========================================
// 供应商绩效评级系统 - 财务健康领域模型
// ==========================================
// 职责: 供应商财务健康快照 (追加式,按时间取最新)
// ==========================================

use crate::domain::types::BankruptcyRisk;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// FinancialHealthSnapshot - 财务健康快照
// ==========================================
// 对齐: supplier_financial_health 表
// 说明: 所有指标字段可缺失,评分引擎按缺失做中性处理
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialHealthSnapshot {
    // ===== 主键与归属 =====
    pub snapshot_id: String, // 快照ID
    pub supplier_id: String, // 供应商ID

    // ===== 财务指标 =====
    pub credit_score: Option<i32>,          // 信用评分 [300,850]
    pub credit_rating: Option<String>,      // 信用评级 (AAA/AA/...)
    pub annual_revenue: Option<f64>,        // 年营收
    pub employee_count: Option<i64>,        // 员工数
    pub years_in_business: Option<i32>,     // 经营年限
    pub bankruptcy_risk: Option<BankruptcyRisk>, // 破产风险
    pub legal_issues: bool,                 // 涉诉标记

    // ===== 审计 =====
    pub recorded_at: NaiveDateTime, // 快照时间 (按时间取最新为准)
}

impl FinancialHealthSnapshot {
    /// 创建新的财务健康快照
    pub fn new(snapshot_id: String, supplier_id: String) -> Self {
        Self {
            snapshot_id,
            supplier_id,
            credit_score: None,
            credit_rating: None,
            annual_revenue: None,
            employee_count: None,
            years_in_business: None,
            bankruptcy_risk: None,
            legal_issues: false,
            recorded_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// 设置信用指标
    pub fn with_credit(mut self, credit_score: i32, credit_rating: Option<String>) -> Self {
        self.credit_score = Some(credit_score);
        self.credit_rating = credit_rating;
        self
    }

    /// 设置经营指标
    pub fn with_business_profile(
        mut self,
        years_in_business: i32,
        employee_count: Option<i64>,
        annual_revenue: Option<f64>,
    ) -> Self {
        self.years_in_business = Some(years_in_business);
        self.employee_count = employee_count;
        self.annual_revenue = annual_revenue;
        self
    }

    /// 设置风险指标
    pub fn with_risk(mut self, bankruptcy_risk: BankruptcyRisk, legal_issues: bool) -> Self {
        self.bankruptcy_risk = Some(bankruptcy_risk);
        self.legal_issues = legal_issues;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = FinancialHealthSnapshot::new("F001".to_string(), "S001".to_string())
            .with_credit(720, Some("AA".to_string()))
            .with_business_profile(12, Some(300), Some(5_000_000.0))
            .with_risk(BankruptcyRisk::Low, false);

        assert_eq!(snapshot.credit_score, Some(720));
        assert_eq!(snapshot.years_in_business, Some(12));
        assert_eq!(snapshot.bankruptcy_risk, Some(BankruptcyRisk::Low));
        assert!(!snapshot.legal_issues);
    }
}
