// ==========================================
// 供应商绩效评级系统 - 等级判定引擎
// ==========================================
// 职责: 四维评分 + 合规分 -> 综合评分 -> 离散等级
// 红线: 等级是综合评分的确定性单调函数,边界值归入更高等级
// ==========================================

use crate::config::{ScoringWeights, TierThresholds};
use crate::domain::supplier::DimensionScores;
use crate::domain::types::TierLevel;

// ==========================================
// TierEngine - 等级判定引擎
// ==========================================
pub struct TierEngine {
    weights: ScoringWeights,
    thresholds: TierThresholds,
}

impl TierEngine {
    /// 构造函数
    pub fn new(weights: ScoringWeights, thresholds: TierThresholds) -> Self {
        Self {
            weights,
            thresholds,
        }
    }

    /// 计算综合评分
    ///
    /// # 参数
    /// - `scores`: 四维计算评分
    /// - `compliance`: 合规评分 (外部供给)
    ///
    /// # 返回
    /// 综合评分 [0,100]
    pub fn composite_score(&self, scores: &DimensionScores, compliance: f64) -> f64 {
        self.weights.quality * scores.quality
            + self.weights.delivery * scores.delivery
            + self.weights.inventory * scores.inventory
            + self.weights.financial_health * scores.financial_health
            + self.weights.compliance * compliance
    }

    /// 按综合评分判定等级
    ///
    /// 区间为左闭右开: score == tier1 阈值即 TIER_1
    pub fn classify(&self, tier_score: f64) -> TierLevel {
        if tier_score >= self.thresholds.tier1 {
            TierLevel::Tier1
        } else if tier_score >= self.thresholds.tier2 {
            TierLevel::Tier2
        } else if tier_score >= self.thresholds.tier3 {
            TierLevel::Tier3
        } else {
            TierLevel::Unrated
        }
    }

    /// 一步完成综合评分与等级判定
    pub fn evaluate(&self, scores: &DimensionScores, compliance: f64) -> (f64, TierLevel) {
        let tier_score = self.composite_score(scores, compliance);
        (tier_score, self.classify(tier_score))
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for TierEngine {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), TierThresholds::default())
    }
}
