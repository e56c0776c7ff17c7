// ==========================================
// 供应商绩效评级系统 - 供应商管理 API
// ==========================================
// 职责: 供应商注册、查询、状态流转、合规分维护
// 红线: 供应商永不物理删除,只做状态流转
// 红线: 合规分为外部供给,更新合规分本身不触发重算
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::supplier::Supplier;
use crate::domain::types::SupplierStatus;
use crate::repository::SupplierRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// SupplierRegistration - 注册请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRegistration {
    pub owner_id: String,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub restricted_country: bool,
    pub compliance_score: Option<f64>,
}

// ==========================================
// SupplierApi - 供应商管理 API
// ==========================================
pub struct SupplierApi {
    supplier_repo: Arc<SupplierRepository>,
}

impl SupplierApi {
    /// 创建 SupplierApi 实例
    pub fn new(supplier_repo: Arc<SupplierRepository>) -> Self {
        Self { supplier_repo }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 注册新供应商 (初始为 ACTIVE / UNRATED)
    pub fn register_supplier(&self, registration: SupplierRegistration) -> ApiResult<Supplier> {
        if registration.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("供应商名称不能为空".to_string()));
        }
        if registration.owner_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("归属方ID不能为空".to_string()));
        }
        if let Some(score) = registration.compliance_score {
            if !(0.0..=100.0).contains(&score) {
                return Err(ApiError::InvalidInput(format!(
                    "合规评分必须在 [0,100] 区间,当前为 {}",
                    score
                )));
            }
        }

        let mut supplier = Supplier::new(
            Uuid::new_v4().to_string(),
            registration.owner_id,
            registration.name,
            registration.country,
        )
        .with_restricted_country(registration.restricted_country);
        if let Some(score) = registration.compliance_score {
            supplier = supplier.with_compliance_score(score);
        }

        self.supplier_repo.insert(&supplier)?;

        tracing::info!(
            "供应商注册成功: supplier_id={}, owner_id={}",
            supplier.supplier_id,
            supplier.owner_id
        );
        Ok(supplier)
    }

    /// 按ID查询供应商
    pub fn get_supplier(&self, supplier_id: &str) -> ApiResult<Supplier> {
        Ok(self.supplier_repo.get_by_id(supplier_id)?)
    }

    /// 按归属方列出供应商
    pub fn list_suppliers(&self, owner_id: &str) -> ApiResult<Vec<Supplier>> {
        Ok(self.supplier_repo.list_by_owner(owner_id)?)
    }

    /// 更新供应商合作状态
    ///
    /// # 参数
    /// - `status`: 状态字符串 (ACTIVE / SUSPENDED / UNDER_REVIEW / INACTIVE)
    pub fn update_status(&self, supplier_id: &str, status: &str) -> ApiResult<()> {
        let status = SupplierStatus::from_str(status)
            .ok_or_else(|| ApiError::InvalidInput(format!("无法识别的供应商状态: {}", status)))?;

        self.supplier_repo.update_status(supplier_id, status)?;

        tracing::info!(
            "供应商状态已更新: supplier_id={}, status={}",
            supplier_id,
            status
        );
        Ok(())
    }

    /// 更新合规评分 (外部供给,不触发重算)
    pub fn update_compliance_score(&self, supplier_id: &str, score: f64) -> ApiResult<()> {
        self.supplier_repo
            .update_compliance_score(supplier_id, score)?;

        tracing::info!(
            "供应商合规评分已更新: supplier_id={}, compliance_score={}",
            supplier_id,
            score
        );
        Ok(())
    }
}
