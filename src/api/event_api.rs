// ==========================================
// 供应商绩效评级系统 - 运营事件 API
// ==========================================
// 职责: 接收订单/质量/库存/财务事件,落库后发布对应评级触发事件
// 说明: 事件落库与触发发布解耦 - 发布失败只告警,不回滚已提交的事件
// 红线: 质量事件与库存事件必须关联供应商
// 红线: 触发方不等待重算完成 (fire-and-forget)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::financial::FinancialHealthSnapshot;
use crate::domain::inventory::InventoryEvent;
use crate::domain::order::SupplierOrder;
use crate::domain::quality::QualityIncident;
use crate::domain::types::{BankruptcyRisk, IncidentSeverity};
use crate::engine::events::{OptionalEventPublisher, RatingEvent, RatingEventType};
use crate::repository::{
    FinancialHealthRepository, InventoryEventRepository, QualityIncidentRepository,
    SupplierOrderRepository, SupplierRepository,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// 事件来源标识 (写入触发来源字段)
const EVENT_SOURCE: &str = "SupplierEventApi";

// ==========================================
// 请求负载
// ==========================================

/// 订单下达
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacement {
    pub supplier_id: String,
    pub order_number: String,
    pub expected_delivery_date: String, // YYYY-MM-DD
    pub item_count: i64,
}

/// 交付确认
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfirmation {
    pub order_id: String,
    pub actual_delivery_date: String, // YYYY-MM-DD
    pub lead_time_accuracy_days: Option<i32>,
}

/// 质量事件上报
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    pub supplier_id: String,
    pub order_id: Option<String>,
    pub incident_type: String,
    pub severity: String, // LOW / MEDIUM / HIGH / CRITICAL
    #[serde(default)]
    pub financial_impact: f64,
    #[serde(default)]
    pub items_affected: i64,
}

/// 库存扰动上报
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryDisruptionReport {
    pub supplier_id: String,
    pub event_type: String,
    #[serde(default)]
    pub quantity_affected: i64,
    #[serde(default)]
    pub days_unavailable: i32,
    pub expected_availability_date: Option<String>, // YYYY-MM-DD
}

/// 财务健康快照录入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSnapshotReport {
    pub supplier_id: String,
    pub credit_score: Option<i32>,
    pub credit_rating: Option<String>,
    pub annual_revenue: Option<f64>,
    pub employee_count: Option<i64>,
    pub years_in_business: Option<i32>,
    pub bankruptcy_risk: Option<String>, // LOW / MEDIUM / HIGH
    #[serde(default)]
    pub legal_issues: bool,
}

// ==========================================
// SupplierEventApi - 运营事件 API
// ==========================================
pub struct SupplierEventApi {
    supplier_repo: Arc<SupplierRepository>,
    order_repo: Arc<SupplierOrderRepository>,
    quality_repo: Arc<QualityIncidentRepository>,
    inventory_repo: Arc<InventoryEventRepository>,
    financial_repo: Arc<FinancialHealthRepository>,
    publisher: OptionalEventPublisher,
}

impl SupplierEventApi {
    /// 创建 SupplierEventApi 实例
    pub fn new(
        supplier_repo: Arc<SupplierRepository>,
        order_repo: Arc<SupplierOrderRepository>,
        quality_repo: Arc<QualityIncidentRepository>,
        inventory_repo: Arc<InventoryEventRepository>,
        financial_repo: Arc<FinancialHealthRepository>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            supplier_repo,
            order_repo,
            quality_repo,
            inventory_repo,
            financial_repo,
            publisher,
        }
    }

    /// 解析 YYYY-MM-DD 日期
    fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
            ApiError::InvalidInput(format!("字段{}日期格式错误: 期望 YYYY-MM-DD,实际 {}", field, value))
        })
    }

    /// 发布评级触发事件 (失败只告警,事件已落库)
    fn publish_event(&self, owner_id: &str, supplier_id: &str, event_type: RatingEventType) {
        let event = RatingEvent::for_supplier(
            owner_id.to_string(),
            supplier_id.to_string(),
            event_type,
            Some(EVENT_SOURCE.to_string()),
        );
        if let Err(e) = self.publisher.publish(event) {
            tracing::warn!(
                "评级触发事件发布失败 (事件已落库,可手工重算): supplier_id={}, error={}",
                supplier_id,
                e
            );
        }
    }

    // ==========================================
    // 订单事件
    // ==========================================

    /// 记录订单下达 (下达本身不触发重算)
    pub fn record_order(&self, placement: OrderPlacement) -> ApiResult<SupplierOrder> {
        let supplier = self.supplier_repo.get_by_id(&placement.supplier_id)?;
        if placement.item_count <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "订单件数必须为正,当前为 {}",
                placement.item_count
            )));
        }
        let expected =
            Self::parse_date("expected_delivery_date", &placement.expected_delivery_date)?;

        let order = SupplierOrder::new(
            Uuid::new_v4().to_string(),
            supplier.supplier_id.clone(),
            placement.order_number,
            expected,
            placement.item_count,
        );
        self.order_repo.insert(&order)?;
        self.supplier_repo
            .increment_total_orders(&supplier.supplier_id)?;

        tracing::info!(
            "订单已记录: order_id={}, supplier_id={}",
            order.order_id,
            supplier.supplier_id
        );
        Ok(order)
    }

    /// 交付确认 (至多一次,触发该供应商重算)
    pub fn confirm_delivery(&self, confirmation: DeliveryConfirmation) -> ApiResult<SupplierOrder> {
        let order = self.order_repo.get_by_id(&confirmation.order_id)?;
        let supplier = self.supplier_repo.get_by_id(&order.supplier_id)?;
        let actual = Self::parse_date("actual_delivery_date", &confirmation.actual_delivery_date)?;

        let (on_time, days_delayed) = order.delivery_delay(actual);
        let updated = self.order_repo.confirm_delivery(
            &confirmation.order_id,
            actual,
            on_time,
            days_delayed,
            confirmation.lead_time_accuracy_days,
        )?;
        if on_time {
            self.supplier_repo
                .increment_successful_deliveries(&supplier.supplier_id)?;
        }

        tracing::info!(
            "交付已确认: order_id={}, supplier_id={}, on_time={}",
            updated.order_id,
            supplier.supplier_id,
            on_time
        );

        self.publish_event(
            &supplier.owner_id,
            &supplier.supplier_id,
            RatingEventType::OrderDelivered,
        );
        Ok(updated)
    }

    /// 交付后补录缺陷件数 (质量标注,不触发重算)
    pub fn annotate_defects(&self, order_id: &str, defect_count: i64) -> ApiResult<()> {
        if defect_count < 0 {
            return Err(ApiError::InvalidInput(format!(
                "缺陷件数不能为负,当前为 {}",
                defect_count
            )));
        }
        Ok(self.order_repo.annotate_defects(order_id, defect_count)?)
    }

    // ==========================================
    // 质量事件
    // ==========================================

    /// 上报质量事件 (触发该供应商重算)
    pub fn report_incident(&self, report: IncidentReport) -> ApiResult<QualityIncident> {
        let supplier = self.supplier_repo.get_by_id(&report.supplier_id)?;
        let severity = IncidentSeverity::from_str(&report.severity).ok_or_else(|| {
            ApiError::InvalidInput(format!("无法识别的事件严重度: {}", report.severity))
        })?;

        // 关联订单时校验其存在且属于同一供应商
        if let Some(order_id) = &report.order_id {
            let order = self.order_repo.get_by_id(order_id)?;
            if order.supplier_id != supplier.supplier_id {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "订单{}不属于供应商{}",
                    order_id, supplier.supplier_id
                )));
            }
        }

        let mut incident = QualityIncident::new(
            Uuid::new_v4().to_string(),
            supplier.supplier_id.clone(),
            report.incident_type,
            severity,
        )
        .with_impact(report.financial_impact, report.items_affected);
        if let Some(order_id) = report.order_id {
            incident = incident.with_order(order_id);
        }

        self.quality_repo.insert(&incident)?;

        tracing::info!(
            "质量事件已上报: incident_id={}, supplier_id={}, severity={}",
            incident.incident_id,
            supplier.supplier_id,
            severity
        );

        self.publish_event(
            &supplier.owner_id,
            &supplier.supplier_id,
            RatingEventType::IncidentReported,
        );
        Ok(incident)
    }

    /// 处置质量事件 (仅一次,处置不触发重算)
    pub fn resolve_incident(&self, incident_id: &str, resolution_note: &str) -> ApiResult<()> {
        self.quality_repo.resolve(incident_id, resolution_note)?;
        tracing::info!("质量事件已处置: incident_id={}", incident_id);
        Ok(())
    }

    // ==========================================
    // 库存事件
    // ==========================================

    /// 上报库存扰动 (触发该供应商重算)
    pub fn record_inventory_event(
        &self,
        report: InventoryDisruptionReport,
    ) -> ApiResult<InventoryEvent> {
        let supplier = self.supplier_repo.get_by_id(&report.supplier_id)?;
        if report.event_type.trim().is_empty() {
            return Err(ApiError::InvalidInput("库存事件类型不能为空".to_string()));
        }

        let mut event = InventoryEvent::new(
            Uuid::new_v4().to_string(),
            supplier.supplier_id.clone(),
            report.event_type,
        )
        .with_disruption(report.quantity_affected, report.days_unavailable);
        if let Some(date) = &report.expected_availability_date {
            event.expected_availability_date =
                Some(Self::parse_date("expected_availability_date", date)?);
        }

        self.inventory_repo.insert(&event)?;

        tracing::info!(
            "库存扰动已记录: event_id={}, supplier_id={}, event_type={}",
            event.event_id,
            supplier.supplier_id,
            event.event_type
        );

        self.publish_event(
            &supplier.owner_id,
            &supplier.supplier_id,
            RatingEventType::InventoryDisruption,
        );
        Ok(event)
    }

    // ==========================================
    // 财务事件
    // ==========================================

    /// 录入财务健康快照 (触发该供应商重算)
    pub fn record_financial_snapshot(
        &self,
        report: FinancialSnapshotReport,
    ) -> ApiResult<FinancialHealthSnapshot> {
        let supplier = self.supplier_repo.get_by_id(&report.supplier_id)?;

        let bankruptcy_risk = match &report.bankruptcy_risk {
            Some(risk) => Some(BankruptcyRisk::from_str(risk).ok_or_else(|| {
                ApiError::InvalidInput(format!("无法识别的破产风险等级: {}", risk))
            })?),
            None => None,
        };
        if let Some(credit) = report.credit_score {
            if !(300..=850).contains(&credit) {
                return Err(ApiError::InvalidInput(format!(
                    "信用评分必须在 [300,850] 区间,当前为 {}",
                    credit
                )));
            }
        }

        let mut snapshot = FinancialHealthSnapshot::new(
            Uuid::new_v4().to_string(),
            supplier.supplier_id.clone(),
        );
        if let Some(credit) = report.credit_score {
            snapshot = snapshot.with_credit(credit, report.credit_rating.clone());
        }
        if let Some(years) = report.years_in_business {
            snapshot =
                snapshot.with_business_profile(years, report.employee_count, report.annual_revenue);
        }
        match bankruptcy_risk {
            Some(risk) => snapshot = snapshot.with_risk(risk, report.legal_issues),
            None => snapshot.legal_issues = report.legal_issues,
        }

        self.financial_repo.insert(&snapshot)?;

        tracing::info!(
            "财务健康快照已录入: snapshot_id={}, supplier_id={}",
            snapshot.snapshot_id,
            supplier.supplier_id
        );

        self.publish_event(
            &supplier.owner_id,
            &supplier.supplier_id,
            RatingEventType::FinancialSnapshotRecorded,
        );
        Ok(snapshot)
    }
}
