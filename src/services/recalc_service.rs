// ==========================================
// 供应商绩效评级系统 - 评级重算服务
// ==========================================
// 职责: 编排一次重算 (读事件 -> 算维度分 -> 定级 -> 事务写入 -> 任务日志)
// 红线: 单供应商评分与绩效快照同事务提交
// 红线: 全量任务逐供应商独立提交,中途失败保留已提交部分
// ==========================================

use crate::config::ScoringConfig;
use crate::domain::recalc_log::RatingRecalcLog;
use crate::domain::supplier::{DimensionScores, Supplier};
use crate::domain::types::{JobStatus, JobType, TierLevel};
use crate::engine::{MetricEngine, TierEngine};
use crate::repository::{
    FinancialHealthRepository, InventoryEventRepository, QualityIncidentRepository,
    RecalcLogRepository, RepositoryError, RepositoryResult, SupplierOrderRepository,
    SupplierRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// 乐观锁冲突时的最大写入尝试次数 (1次重读重算)
const MAX_WRITE_ATTEMPTS: usize = 2;

// ==========================================
// SupplierRatingOutcome - 单供应商重算结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRatingOutcome {
    pub supplier_id: String,
    pub job_id: String,
    pub quality_score: f64,
    pub delivery_score: f64,
    pub inventory_score: f64,
    pub financial_health_score: f64,
    pub compliance_score: f64,
    pub tier_score: f64,
    pub tier_level: TierLevel,
    pub tier_changed: bool,
}

// ==========================================
// RatingRecalcService - 评级重算服务
// ==========================================
pub struct RatingRecalcService {
    supplier_repo: Arc<SupplierRepository>,
    order_repo: Arc<SupplierOrderRepository>,
    quality_repo: Arc<QualityIncidentRepository>,
    inventory_repo: Arc<InventoryEventRepository>,
    financial_repo: Arc<FinancialHealthRepository>,
    recalc_log_repo: Arc<RecalcLogRepository>,
    metric_engine: Arc<MetricEngine>,
    tier_engine: Arc<TierEngine>,
}

impl RatingRecalcService {
    /// 创建新的 RatingRecalcService 实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        supplier_repo: Arc<SupplierRepository>,
        order_repo: Arc<SupplierOrderRepository>,
        quality_repo: Arc<QualityIncidentRepository>,
        inventory_repo: Arc<InventoryEventRepository>,
        financial_repo: Arc<FinancialHealthRepository>,
        recalc_log_repo: Arc<RecalcLogRepository>,
        config: &ScoringConfig,
    ) -> Self {
        Self {
            supplier_repo,
            order_repo,
            quality_repo,
            inventory_repo,
            financial_repo,
            recalc_log_repo,
            metric_engine: Arc::new(MetricEngine::new(config.metrics.clone())),
            tier_engine: Arc::new(TierEngine::new(config.weights, config.thresholds)),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 单供应商重算任务 (创建任务日志 + 执行 + 终结)
    ///
    /// # 参数
    /// - `supplier_id`: 目标供应商
    /// - `job_type`: 任务类型 (MANUAL / EVENT)
    /// - `trigger_event`: 触发事件标识
    ///
    /// # 返回
    /// - Ok(outcome): 重算完成,返回最新评分
    /// - Err: 供应商不存在/数据异常/存储失败 (任务日志已记为 FAILED)
    pub fn recalculate_supplier(
        &self,
        supplier_id: &str,
        job_type: JobType,
        trigger_event: &str,
    ) -> RepositoryResult<SupplierRatingOutcome> {
        // 任务日志需要归属方,先确认供应商存在
        let supplier = self.supplier_repo.get_by_id(supplier_id)?;

        let job_id = Uuid::new_v4().to_string();
        let log = RatingRecalcLog::started(
            job_id.clone(),
            job_type,
            trigger_event,
            supplier.owner_id.clone(),
            Some(supplier_id.to_string()),
        );
        self.recalc_log_repo.insert_started(&log)?;

        match self.rate_one(supplier_id, trigger_event) {
            Ok((outcome, tier_changed)) => {
                self.recalc_log_repo.finalize(
                    &job_id,
                    JobStatus::Completed,
                    1,
                    if tier_changed { 1 } else { 0 },
                    None,
                )?;

                tracing::info!(
                    "重算任务完成: job_id={}, supplier_id={}, tier={}",
                    job_id,
                    supplier_id,
                    outcome.tier_level
                );

                Ok(SupplierRatingOutcome {
                    job_id,
                    ..outcome
                })
            }
            Err(e) => {
                // 失败任务记录原因后终结,不自动重试
                if let Err(final_err) = self.recalc_log_repo.finalize(
                    &job_id,
                    JobStatus::Failed,
                    0,
                    0,
                    Some(&e.to_string()),
                ) {
                    tracing::error!("终结失败任务日志出错: job_id={}, error={}", job_id, final_err);
                }

                tracing::error!(
                    "重算任务失败: job_id={}, supplier_id={}, error={}",
                    job_id,
                    supplier_id,
                    e
                );
                Err(e)
            }
        }
    }

    /// 归属方全量重算任务
    ///
    /// # 说明
    /// - 按 supplier_id 升序逐供应商处理,每个供应商独立提交
    /// - 任一供应商失败即终止任务并记为 FAILED;
    ///   已处理供应商保持已提交状态,其余供应商不被触碰
    /// - 任务内的异常被捕获进任务日志,不向触发方传播
    ///
    /// # 返回
    /// 终结后的任务日志 (调用方按 status 判断部分成功)
    pub fn recalculate_owner(
        &self,
        owner_id: &str,
        trigger_event: &str,
    ) -> RepositoryResult<RatingRecalcLog> {
        let job_id = Uuid::new_v4().to_string();
        let log = RatingRecalcLog::started(
            job_id.clone(),
            JobType::Bulk,
            trigger_event,
            owner_id.to_string(),
            None,
        );
        self.recalc_log_repo.insert_started(&log)?;

        tracing::info!("全量重算任务开始: job_id={}, owner_id={}", job_id, owner_id);

        let mut processed: i64 = 0;
        let mut tier_changed: i64 = 0;
        let mut failure: Option<String> = None;

        match self.supplier_repo.list_by_owner(owner_id) {
            Ok(suppliers) => {
                for supplier in &suppliers {
                    match self.rate_one(&supplier.supplier_id, trigger_event) {
                        Ok((_, changed)) => {
                            processed += 1;
                            if changed {
                                tier_changed += 1;
                            }
                        }
                        Err(e) => {
                            failure = Some(format!(
                                "supplier_id={}: {}",
                                supplier.supplier_id, e
                            ));
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                failure = Some(e.to_string());
            }
        }

        let (status, error_message) = match &failure {
            None => (JobStatus::Completed, None),
            Some(msg) => (JobStatus::Failed, Some(msg.as_str())),
        };
        self.recalc_log_repo
            .finalize(&job_id, status, processed, tier_changed, error_message)?;

        match &failure {
            None => tracing::info!(
                "全量重算任务完成: job_id={}, processed={}, tier_changed={}",
                job_id,
                processed,
                tier_changed
            ),
            Some(msg) => tracing::error!(
                "全量重算任务失败: job_id={}, processed={}, error={}",
                job_id,
                processed,
                msg
            ),
        }

        self.recalc_log_repo
            .find_by_id(&job_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "RatingRecalcLog".to_string(),
                id: job_id,
            })
    }

    // ==========================================
    // 单供应商评分流水线
    // ==========================================

    /// 对一个供应商执行一次评分流水线
    ///
    /// 步骤:
    /// 1. 读取供应商与窗口内事件
    /// 2. 计算四维评分 (合规分保持不变)
    /// 3. 计算综合评分与等级
    /// 4. 单事务写入评分字段 + 追加绩效快照
    ///
    /// 乐观锁冲突时重读重算一次,保证最后写入者确定性胜出
    fn rate_one(
        &self,
        supplier_id: &str,
        trigger_event: &str,
    ) -> RepositoryResult<(SupplierRatingOutcome, bool)> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let supplier = self.supplier_repo.get_by_id(supplier_id)?;
            let (updated, scores) = self.compute_rating(&supplier)?;
            let tier_changed = updated.tier_level != supplier.tier_level;

            let log_id = Uuid::new_v4().to_string();
            match self.supplier_repo.apply_rating_update(
                &updated,
                supplier.revision,
                trigger_event,
                &log_id,
            ) {
                Ok(()) => {
                    let outcome = SupplierRatingOutcome {
                        supplier_id: supplier_id.to_string(),
                        job_id: String::new(),
                        quality_score: scores.quality,
                        delivery_score: scores.delivery,
                        inventory_score: scores.inventory,
                        financial_health_score: scores.financial_health,
                        compliance_score: updated.compliance_score,
                        tier_score: updated.tier_score,
                        tier_level: updated.tier_level,
                        tier_changed,
                    };
                    return Ok((outcome, tier_changed));
                }
                Err(RepositoryError::OptimisticLockFailure { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(
                        "评分写入遇到乐观锁冲突,重读重算: supplier_id={}, attempt={}",
                        supplier_id,
                        attempt
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 基于当前事件数据计算供应商的新评分 (纯读 + 纯计算)
    fn compute_rating(&self, supplier: &Supplier) -> RepositoryResult<(Supplier, DimensionScores)> {
        let now = chrono::Utc::now().naive_utc();
        let since = self.metric_engine.window_start(now);

        let orders = self
            .order_repo
            .list_by_supplier_since(&supplier.supplier_id, since)?;
        let incidents = self
            .quality_repo
            .list_by_supplier_since(&supplier.supplier_id, since)?;
        let inventory_events = self
            .inventory_repo
            .list_by_supplier_since(&supplier.supplier_id, since)?;
        let financial = self.financial_repo.latest_by_supplier(&supplier.supplier_id)?;

        let scores =
            self.metric_engine
                .compute_all(&orders, &incidents, &inventory_events, financial.as_ref());
        let (tier_score, tier_level) = self
            .tier_engine
            .evaluate(&scores, supplier.compliance_score);

        let mut updated = supplier.clone();
        updated.quality_score = scores.quality;
        updated.delivery_score = scores.delivery;
        updated.inventory_score = scores.inventory;
        updated.financial_health_score = scores.financial_health;
        updated.tier_score = tier_score;
        updated.tier_level = tier_level;
        // 两个时间戳必须同时写入
        updated.tier_last_updated = Some(now);
        updated.last_rating_update = Some(now);
        updated.updated_at = now;

        Ok((updated, scores))
    }
}
