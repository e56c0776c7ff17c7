// ==========================================
// 供应商绩效评级系统 - 维度评分引擎
// ==========================================
// 职责: 将时间窗口内的运营事件归约为四个维度评分
// 输入: 订单 + 质量事件 + 库存扰动 + 财务快照
// 输出: DimensionScores (各维度均在 [0,100])
// ==========================================
// 红线: 纯函数,无副作用,不触达仓储
// ==========================================

use crate::config::MetricParams;
use crate::domain::financial::FinancialHealthSnapshot;
use crate::domain::inventory::InventoryEvent;
use crate::domain::order::SupplierOrder;
use crate::domain::quality::QualityIncident;
use crate::domain::supplier::DimensionScores;
use chrono::{Duration, NaiveDateTime};

// ==========================================
// MetricEngine - 维度评分引擎
// ==========================================
pub struct MetricEngine {
    params: MetricParams,
}

impl MetricEngine {
    /// 构造函数
    pub fn new(params: MetricParams) -> Self {
        Self { params }
    }

    /// 计算回看窗口起点
    ///
    /// # 参数
    /// - `now`: 当前时间
    ///
    /// # 返回
    /// 窗口起点 (now - lookback_days)
    pub fn window_start(&self, now: NaiveDateTime) -> NaiveDateTime {
        now - Duration::days(self.params.lookback_days)
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算全部四个维度评分
    pub fn compute_all(
        &self,
        orders: &[SupplierOrder],
        incidents: &[QualityIncident],
        inventory_events: &[InventoryEvent],
        financial: Option<&FinancialHealthSnapshot>,
    ) -> DimensionScores {
        DimensionScores {
            quality: self.quality_score(orders, incidents),
            delivery: self.delivery_score(orders),
            inventory: self.inventory_score(orders, inventory_events),
            financial_health: self.financial_health_score(financial),
        }
    }

    /// 交付评分
    ///
    /// 规则:
    /// - 只统计窗口内已交付订单
    /// - base = 100 * 按期数 / 交付数
    /// - 平均延迟天数按系数扣分,扣分封顶
    /// - 无交付订单时返回 0 (无数据按最差处理,与其他维度的中性策略不同)
    pub fn delivery_score(&self, orders: &[SupplierOrder]) -> f64 {
        let delivered: Vec<&SupplierOrder> = orders.iter().filter(|o| o.is_delivered()).collect();
        if delivered.is_empty() {
            return 0.0;
        }

        let total = delivered.len() as f64;
        let on_time_count = delivered
            .iter()
            .filter(|o| o.on_time.unwrap_or(false))
            .count() as f64;
        let base = 100.0 * on_time_count / total;

        // 平均延迟 (提前交付按 0 计)
        let total_delay: f64 = delivered
            .iter()
            .map(|o| o.days_delayed.unwrap_or(0).max(0) as f64)
            .sum();
        let avg_delay = total_delay / total;

        let penalty = (avg_delay * self.params.delay_penalty_factor).min(self.params.delay_penalty_cap);

        (base - penalty).max(0.0)
    }

    /// 质量评分
    ///
    /// 规则:
    /// - 窗口内无订单时返回中性分 (无法评估)
    /// - 有订单且无质量事件时返回满分
    /// - 按严重度加权扣分,叠加事件率扣分
    pub fn quality_score(&self, orders: &[SupplierOrder], incidents: &[QualityIncident]) -> f64 {
        if orders.is_empty() {
            return self.params.neutral_score;
        }
        if incidents.is_empty() {
            return 100.0;
        }

        let severity_penalty: f64 = incidents
            .iter()
            .map(|i| self.params.severity_weight(i.severity))
            .sum();

        let incident_rate = incidents.len() as f64 / orders.len() as f64;
        let rate_penalty = incident_rate * self.params.incident_rate_factor;

        (100.0 - severity_penalty - rate_penalty).max(0.0)
    }

    /// 库存保障评分
    ///
    /// 规则:
    /// - 窗口内无已交付订单时返回中性分
    /// - 交期预测偏差在容忍区间内的订单占比为基础分
    /// - 每次断供类事件固定扣分
    pub fn inventory_score(
        &self,
        orders: &[SupplierOrder],
        inventory_events: &[InventoryEvent],
    ) -> f64 {
        let delivered: Vec<&SupplierOrder> = orders.iter().filter(|o| o.is_delivered()).collect();
        if delivered.is_empty() {
            return self.params.neutral_score;
        }

        let accurate_count = delivered
            .iter()
            .filter(|o| {
                o.lead_time_accuracy_days
                    .map(|d| d.abs() <= self.params.lead_time_tolerance_days)
                    .unwrap_or(false)
            })
            .count() as f64;
        let accuracy_rate = 100.0 * accurate_count / delivered.len() as f64;

        let stockout_count = inventory_events.iter().filter(|e| e.is_stock_out()).count() as f64;
        let stockout_penalty = self.params.stockout_penalty * stockout_count;

        (accuracy_rate - stockout_penalty).max(0.0)
    }

    /// 财务健康评分
    ///
    /// 规则:
    /// - 无快照时返回中性分
    /// - 基础分 50,信用分/经营年限加分,破产风险/涉诉扣分
    /// - 结果截断到 [0,100]
    pub fn financial_health_score(&self, snapshot: Option<&FinancialHealthSnapshot>) -> f64 {
        let snapshot = match snapshot {
            Some(s) => s,
            None => return self.params.neutral_score,
        };

        let mut score = 50.0;

        if let Some(credit) = snapshot.credit_score {
            let normalized = (credit as f64 - self.params.credit_score_floor)
                / self.params.credit_score_span
                * 100.0;
            score += self.params.credit_weight * normalized;
        }

        if let Some(years) = snapshot.years_in_business {
            score += (years as f64 * self.params.years_factor).min(self.params.years_bonus_cap);
        }

        if let Some(risk) = snapshot.bankruptcy_risk {
            score -= self.params.bankruptcy_penalty(risk);
        }

        if snapshot.legal_issues {
            score -= self.params.legal_issues_penalty;
        }

        score.clamp(0.0, 100.0)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for MetricEngine {
    fn default() -> Self {
        Self::new(MetricParams::default())
    }
}
