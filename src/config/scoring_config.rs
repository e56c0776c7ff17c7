// ==========================================
// 供应商绩效评级系统 - 评分策略配置
// ==========================================
// 职责: 评分权重/等级阈值/指标参数的集中配置
// 红线: 权重必须归一 (合计 1.0)
// ==========================================

use crate::domain::types::{BankruptcyRisk, IncidentSeverity};
use serde::{Deserialize, Serialize};

// ==========================================
// ScoringWeights - 综合评分权重
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub quality: f64,          // 质量权重
    pub delivery: f64,         // 交付权重
    pub inventory: f64,        // 库存保障权重
    pub financial_health: f64, // 财务健康权重
    pub compliance: f64,       // 合规权重
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            quality: 0.30,
            delivery: 0.25,
            inventory: 0.20,
            financial_health: 0.15,
            compliance: 0.10,
        }
    }
}

impl ScoringWeights {
    /// 权重合计
    pub fn total(&self) -> f64 {
        self.quality + self.delivery + self.inventory + self.financial_health + self.compliance
    }
}

// ==========================================
// TierThresholds - 等级阈值
// ==========================================
// 区间为左闭右开,边界值归入更高等级 (80 分即 TIER_1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub tier1: f64, // >= tier1 为 TIER_1
    pub tier2: f64, // >= tier2 为 TIER_2
    pub tier3: f64, // >= tier3 为 TIER_3, 其余 UNRATED
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            tier1: 80.0,
            tier2: 60.0,
            tier3: 40.0,
        }
    }
}

// ==========================================
// MetricParams - 指标计算参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricParams {
    // ===== 统计窗口 =====
    pub lookback_days: i64, // 回看窗口天数

    // ===== 交付维度 =====
    pub delay_penalty_factor: f64, // 平均延迟 -> 扣分系数
    pub delay_penalty_cap: f64,    // 延迟扣分上限

    // ===== 质量维度 =====
    pub severity_weight_low: f64,
    pub severity_weight_medium: f64,
    pub severity_weight_high: f64,
    pub severity_weight_critical: f64,
    pub incident_rate_factor: f64, // 事件率 -> 扣分系数

    // ===== 库存维度 =====
    pub lead_time_tolerance_days: i32, // 交期预测偏差容忍(天)
    pub stockout_penalty: f64,         // 单次断供扣分

    // ===== 财务维度 =====
    pub credit_score_floor: f64,     // 信用分下界
    pub credit_score_span: f64,      // 信用分区间宽度
    pub credit_weight: f64,          // 信用分贡献系数
    pub years_factor: f64,           // 经营年限 -> 加分系数
    pub years_bonus_cap: f64,        // 经营年限加分上限
    pub bankruptcy_penalty_medium: f64,
    pub bankruptcy_penalty_high: f64,
    pub legal_issues_penalty: f64,

    // ===== 无数据时的中性分 =====
    pub neutral_score: f64,
}

impl Default for MetricParams {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            delay_penalty_factor: 2.0,
            delay_penalty_cap: 20.0,
            severity_weight_low: 2.0,
            severity_weight_medium: 5.0,
            severity_weight_high: 10.0,
            severity_weight_critical: 20.0,
            incident_rate_factor: 50.0,
            lead_time_tolerance_days: 2,
            stockout_penalty: 5.0,
            credit_score_floor: 300.0,
            credit_score_span: 550.0,
            credit_weight: 0.5,
            years_factor: 2.0,
            years_bonus_cap: 20.0,
            bankruptcy_penalty_medium: 15.0,
            bankruptcy_penalty_high: 30.0,
            legal_issues_penalty: 20.0,
            neutral_score: 50.0,
        }
    }
}

impl MetricParams {
    /// 按严重度取扣分权重
    pub fn severity_weight(&self, severity: IncidentSeverity) -> f64 {
        match severity {
            IncidentSeverity::Low => self.severity_weight_low,
            IncidentSeverity::Medium => self.severity_weight_medium,
            IncidentSeverity::High => self.severity_weight_high,
            IncidentSeverity::Critical => self.severity_weight_critical,
        }
    }

    /// 按破产风险取扣分
    pub fn bankruptcy_penalty(&self, risk: BankruptcyRisk) -> f64 {
        match risk {
            BankruptcyRisk::Low => 0.0,
            BankruptcyRisk::Medium => self.bankruptcy_penalty_medium,
            BankruptcyRisk::High => self.bankruptcy_penalty_high,
        }
    }
}

// ==========================================
// ScoringConfig - 评分策略配置聚合
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub thresholds: TierThresholds,
    pub metrics: MetricParams,
}

impl ScoringConfig {
    /// 校验配置合法性
    ///
    /// # 返回
    /// - Ok(()): 配置合法
    /// - Err(String): 首个不合法项的描述
    pub fn validate(&self) -> Result<(), String> {
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-9 {
            return Err(format!("评分权重合计必须为 1.0,当前为 {}", total));
        }

        if !(self.thresholds.tier3 < self.thresholds.tier2
            && self.thresholds.tier2 < self.thresholds.tier1)
        {
            return Err("等级阈值必须满足 tier3 < tier2 < tier1".to_string());
        }

        if self.metrics.lookback_days <= 0 {
            return Err("回看窗口天数必须为正".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.quality = 0.5; // 合计 1.2
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut config = ScoringConfig::default();
        config.thresholds.tier2 = 90.0; // tier2 > tier1
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_severity_weights_match_policy() {
        let params = MetricParams::default();
        assert_eq!(params.severity_weight(IncidentSeverity::Low), 2.0);
        assert_eq!(params.severity_weight(IncidentSeverity::Medium), 5.0);
        assert_eq!(params.severity_weight(IncidentSeverity::High), 10.0);
        assert_eq!(params.severity_weight(IncidentSeverity::Critical), 20.0);
    }
}
