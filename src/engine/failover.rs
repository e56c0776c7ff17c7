// ==========================================
// 供应商绩效评级系统 - 备选切换引擎
// ==========================================
// 职责: 主供应商失效时,从备选清单中选出最优可用供应商
// 规则: 按综合评分降序,取首个 ACTIVE 且非受限国家的备选
// 说明: 无可用备选是正常结果,不是错误
// ==========================================
// 红线: 纯函数,选择不改写任何供应商状态
// ==========================================

use crate::domain::supplier::Supplier;

// ==========================================
// FailoverEngine - 备选切换引擎
// ==========================================
pub struct FailoverEngine {
    // 无状态引擎,不需要注入依赖
    // Repository 操作由调用方处理
}

impl FailoverEngine {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 从备选候选中选出最优可用供应商
    ///
    /// # 参数
    /// - `candidates`: 已注册的备选供应商实体列表
    ///
    /// # 返回
    /// - Some(supplier): 评分最高的可用备选
    /// - None: 无可用备选 (正常结果)
    ///
    /// # 说明
    /// - 先按综合评分降序排序 (同分按 supplier_id 升序保证确定性)
    /// - 再取首个满足条件者: 状态 ACTIVE 且非受限国家
    /// - 评分更高但不满足条件的备选会被跳过
    pub fn select_backup<'a>(&self, candidates: &'a [Supplier]) -> Option<&'a Supplier> {
        let mut ranked: Vec<&Supplier> = candidates.iter().collect();
        ranked.sort_by(|a, b| {
            b.tier_score
                .partial_cmp(&a.tier_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        });

        ranked.into_iter().find(|s| s.is_promotable())
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for FailoverEngine {
    fn default() -> Self {
        Self::new()
    }
}
