// ==========================================
// 供应商绩效评级系统 - 订单批量导入
// ==========================================
// 职责: 解析订单文件 -> 逐行校验 -> 落库 -> 行级错误报告
// 说明: 单行失败不中断整个批次,错误按行收集到报告
// 说明: 已交付行走交付确认流程并发布 OrderDelivered 触发事件
// ==========================================

use crate::domain::order::SupplierOrder;
use crate::domain::types::OrderStatus;
use crate::engine::events::{OptionalEventPublisher, RatingEvent, RatingEventType};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::{SupplierOrderRepository, SupplierRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// 导入触发来源标识
const IMPORT_SOURCE: &str = "OrderImporter";

// ==========================================
// 导入报告
// ==========================================

/// 单行导入错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row_number: usize, // 文件行号 (表头为第1行)
    pub message: String,
}

/// 订单导入报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub delivered: usize, // 导入时即完成交付确认的行数
    pub row_errors: Vec<ImportRowError>,
}

impl OrderImportReport {
    /// 是否全部行导入成功
    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty()
    }
}

// ==========================================
// OrderImporter Trait
// ==========================================
#[async_trait]
pub trait OrderImporter: Send + Sync {
    /// 从订单文件导入 (按扩展名识别 CSV/Excel)
    ///
    /// # 必填列
    /// supplier_id, order_number, expected_delivery_date (YYYY-MM-DD), item_count
    ///
    /// # 可选列
    /// status (默认 PENDING), actual_delivery_date, defect_count, lead_time_accuracy_days
    async fn import_orders(&self, file_path: &Path) -> ImporterResult<OrderImportReport>;
}

// ==========================================
// OrderImporterImpl - 订单导入实现
// ==========================================
pub struct OrderImporterImpl {
    supplier_repo: Arc<SupplierRepository>,
    order_repo: Arc<SupplierOrderRepository>,
    publisher: OptionalEventPublisher,
}

impl OrderImporterImpl {
    /// 创建导入器实例
    pub fn new(
        supplier_repo: Arc<SupplierRepository>,
        order_repo: Arc<SupplierOrderRepository>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            supplier_repo,
            order_repo,
            publisher,
        }
    }

    /// 取必填列
    fn required<'a>(row: &'a HashMap<String, String>, key: &str) -> Result<&'a str, String> {
        match row.get(key).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(format!("必填列 {} 缺失或为空", key)),
        }
    }

    /// 取可选列 (空白视为缺失)
    fn optional<'a>(row: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
        row.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    fn parse_date(key: &str, value: &str) -> Result<NaiveDate, String> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| format!("列 {} 日期格式错误: 期望 YYYY-MM-DD,实际 {}", key, value))
    }

    /// 处理单行: 校验 -> 插入 -> (可选)交付确认
    ///
    /// # 返回
    /// - Ok(true): 该行导入时完成了交付确认
    /// - Err(message): 行级错误,由调用方收集到报告
    fn import_row(&self, row: &HashMap<String, String>) -> Result<bool, String> {
        let supplier_id = Self::required(row, "supplier_id")?;
        let order_number = Self::required(row, "order_number")?;
        let expected = Self::parse_date(
            "expected_delivery_date",
            Self::required(row, "expected_delivery_date")?,
        )?;
        let item_count: i64 = Self::required(row, "item_count")?
            .parse()
            .map_err(|_| "列 item_count 必须为整数".to_string())?;
        if item_count <= 0 {
            return Err(format!("列 item_count 必须为正,当前为 {}", item_count));
        }

        let supplier = self
            .supplier_repo
            .find_by_id(supplier_id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("供应商不存在: {}", supplier_id))?;

        let status = match Self::optional(row, "status") {
            Some(value) => OrderStatus::from_str(value)
                .ok_or_else(|| format!("无法识别的订单状态: {}", value))?,
            None => OrderStatus::Pending,
        };

        // 交付行缺实际日期在落库前拒绝,避免半提交行
        let actual = Self::optional(row, "actual_delivery_date")
            .map(|value| Self::parse_date("actual_delivery_date", value))
            .transpose()?;
        if status == OrderStatus::Delivered && actual.is_none() {
            return Err("状态为 DELIVERED 的行必须提供 actual_delivery_date".to_string());
        }

        let defect_count: i64 = match Self::optional(row, "defect_count") {
            Some(value) => value
                .parse()
                .map_err(|_| "列 defect_count 必须为整数".to_string())?,
            None => 0,
        };
        let lead_time_accuracy_days: Option<i32> =
            match Self::optional(row, "lead_time_accuracy_days") {
                Some(value) => Some(
                    value
                        .parse()
                        .map_err(|_| "列 lead_time_accuracy_days 必须为整数".to_string())?,
                ),
                None => None,
            };

        // 先以下达状态落库,交付行再走正常交付确认流程
        let order = SupplierOrder::new(
            Uuid::new_v4().to_string(),
            supplier.supplier_id.clone(),
            order_number.to_string(),
            expected,
            item_count,
        );
        self.order_repo.insert(&order).map_err(|e| e.to_string())?;
        self.supplier_repo
            .increment_total_orders(&supplier.supplier_id)
            .map_err(|e| e.to_string())?;

        if status != OrderStatus::Delivered {
            return Ok(false);
        }

        let actual = match actual {
            Some(date) => date,
            // 落库前已校验,此分支仅为穷尽匹配
            None => return Err("状态为 DELIVERED 的行缺少 actual_delivery_date".to_string()),
        };
        let (on_time, days_delayed) = order.delivery_delay(actual);
        self.order_repo
            .confirm_delivery(
                &order.order_id,
                actual,
                on_time,
                days_delayed,
                lead_time_accuracy_days,
            )
            .map_err(|e| e.to_string())?;
        if on_time {
            self.supplier_repo
                .increment_successful_deliveries(&supplier.supplier_id)
                .map_err(|e| e.to_string())?;
        }
        if defect_count > 0 {
            self.order_repo
                .annotate_defects(&order.order_id, defect_count)
                .map_err(|e| e.to_string())?;
        }

        // 发布交付触发事件 (失败只告警,订单已落库)
        let event = RatingEvent::for_supplier(
            supplier.owner_id.clone(),
            supplier.supplier_id.clone(),
            RatingEventType::OrderDelivered,
            Some(IMPORT_SOURCE.to_string()),
        );
        if let Err(e) = self.publisher.publish(event) {
            tracing::warn!(
                "导入行的交付触发事件发布失败: order_id={}, error={}",
                order.order_id,
                e
            );
        }

        Ok(true)
    }
}

#[async_trait]
impl OrderImporter for OrderImporterImpl {
    async fn import_orders(&self, file_path: &Path) -> ImporterResult<OrderImportReport> {
        let records = UniversalFileParser.parse(file_path)?;
        if records.is_empty() {
            return Err(ImportError::FieldMappingError {
                row: 1,
                message: "文件无数据行".to_string(),
            });
        }

        let mut report = OrderImportReport {
            total_rows: records.len(),
            imported: 0,
            delivered: 0,
            row_errors: Vec::new(),
        };

        for (idx, row) in records.iter().enumerate() {
            // 表头为第1行,数据从第2行起
            let row_number = idx + 2;
            match self.import_row(row) {
                Ok(delivered) => {
                    report.imported += 1;
                    if delivered {
                        report.delivered += 1;
                    }
                }
                Err(message) => {
                    tracing::warn!("订单导入行失败: row={}, error={}", row_number, message);
                    report.row_errors.push(ImportRowError {
                        row_number,
                        message,
                    });
                }
            }
        }

        tracing::info!(
            "订单导入完成: file={}, total={}, imported={}, delivered={}, errors={}",
            file_path.display(),
            report.total_rows,
            report.imported,
            report.delivered,
            report.row_errors.len()
        );
        Ok(report)
    }
}
