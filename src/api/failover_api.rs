// ==========================================
// 供应商绩效评级系统 - 备选切换 API
// ==========================================
// 职责: 备选关系维护 + 主供应商失效时的备选提升
// 规则: 候选按综合评分降序,取首个 ACTIVE 且非受限国家者
// 说明: 无可用备选是正常结果,不是错误
// 红线: 提升不改写失效供应商自身状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::backup::BackupAssociation;
use crate::domain::supplier::Supplier;
use crate::engine::failover::FailoverEngine;
use crate::repository::{
    BackupAssociationRepository, ProcurementTaskRepository, SupplierRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// PromotionOutcome - 备选提升结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PromotionOutcome {
    /// 提升成功
    Promoted {
        supplier: Supplier,
        reassigned_task_id: Option<String>,
    },
    /// 无可用备选 (正常结果)
    NoEligibleBackup,
}

// ==========================================
// FailoverApi - 备选切换 API
// ==========================================
pub struct FailoverApi {
    supplier_repo: Arc<SupplierRepository>,
    backup_repo: Arc<BackupAssociationRepository>,
    task_repo: Arc<ProcurementTaskRepository>,
    engine: FailoverEngine,
}

impl FailoverApi {
    /// 创建 FailoverApi 实例
    pub fn new(
        supplier_repo: Arc<SupplierRepository>,
        backup_repo: Arc<BackupAssociationRepository>,
        task_repo: Arc<ProcurementTaskRepository>,
    ) -> Self {
        Self {
            supplier_repo,
            backup_repo,
            task_repo,
            engine: FailoverEngine::new(),
        }
    }

    // ==========================================
    // 备选关系维护
    // ==========================================

    /// 注册备选关系 (两端供应商必须存在)
    pub fn register_backup(
        &self,
        primary_id: &str,
        backup_id: &str,
        priority: i32,
    ) -> ApiResult<()> {
        self.supplier_repo.get_by_id(primary_id)?;
        self.supplier_repo.get_by_id(backup_id)?;

        self.backup_repo.upsert(&BackupAssociation::new(
            primary_id.to_string(),
            backup_id.to_string(),
            priority,
        ))?;

        tracing::info!(
            "备选关系已注册: primary={}, backup={}, priority={}",
            primary_id,
            backup_id,
            priority
        );
        Ok(())
    }

    /// 删除备选关系
    pub fn remove_backup(&self, primary_id: &str, backup_id: &str) -> ApiResult<()> {
        self.backup_repo.remove(primary_id, backup_id)?;
        tracing::info!("备选关系已删除: primary={}, backup={}", primary_id, backup_id);
        Ok(())
    }

    /// 列出主供应商的备选供应商 (按关系优先级升序)
    pub fn list_backups(&self, primary_id: &str) -> ApiResult<Vec<Supplier>> {
        self.supplier_repo.get_by_id(primary_id)?;
        Ok(self.load_candidates(primary_id)?)
    }

    // ==========================================
    // 备选提升
    // ==========================================

    /// 主供应商失效时提升最优可用备选
    ///
    /// # 参数
    /// - `failed_supplier_id`: 失效的主供应商
    /// - `task_id`: 在途任务ID,提供时在同一操作内改派给被提升者
    ///
    /// # 返回
    /// - Promoted: 被提升的备选供应商 (及改派的任务ID)
    /// - NoEligibleBackup: 无可用备选
    pub fn promote_backup(
        &self,
        failed_supplier_id: &str,
        task_id: Option<&str>,
    ) -> ApiResult<PromotionOutcome> {
        // 失效供应商必须存在 (NotFound 直接传播给调用方)
        self.supplier_repo.get_by_id(failed_supplier_id)?;

        let candidates = self.load_candidates(failed_supplier_id)?;
        let promoted = match self.engine.select_backup(&candidates) {
            Some(supplier) => supplier.clone(),
            None => {
                tracing::info!(
                    "无可用备选供应商: failed_supplier_id={}, candidates={}",
                    failed_supplier_id,
                    candidates.len()
                );
                return Ok(PromotionOutcome::NoEligibleBackup);
            }
        };

        let reassigned_task_id = match task_id {
            Some(tid) => {
                self.task_repo.reassign(tid, &promoted.supplier_id)?;
                tracing::info!(
                    "在途任务已改派: task_id={}, new_supplier_id={}",
                    tid,
                    promoted.supplier_id
                );
                Some(tid.to_string())
            }
            None => None,
        };

        tracing::info!(
            "备选提升完成: failed={}, promoted={}, tier_score={}",
            failed_supplier_id,
            promoted.supplier_id,
            promoted.tier_score
        );

        Ok(PromotionOutcome::Promoted {
            supplier: promoted,
            reassigned_task_id,
        })
    }

    /// 加载备选候选实体 (悬挂边告警后跳过)
    fn load_candidates(&self, primary_id: &str) -> ApiResult<Vec<Supplier>> {
        let associations = self.backup_repo.list_by_primary(primary_id)?;
        let mut candidates = Vec::with_capacity(associations.len());
        for association in &associations {
            match self
                .supplier_repo
                .find_by_id(&association.backup_supplier_id)
                .map_err(ApiError::from)?
            {
                Some(supplier) => candidates.push(supplier),
                None => tracing::warn!(
                    "备选关系指向不存在的供应商,已跳过: primary={}, backup={}",
                    primary_id,
                    association.backup_supplier_id
                ),
            }
        }
        Ok(candidates)
    }
}
