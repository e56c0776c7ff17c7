// ==========================================
// 供应商绩效评级系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 供应商状态 (Supplier Status)
// ==========================================
// 红线: 供应商永不物理删除,只做状态流转
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierStatus {
    Active,      // 正常合作
    Suspended,   // 暂停合作
    UnderReview, // 审查中
    Inactive,    // 已停用
}

impl fmt::Display for SupplierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplierStatus::Active => write!(f, "ACTIVE"),
            SupplierStatus::Suspended => write!(f, "SUSPENDED"),
            SupplierStatus::UnderReview => write!(f, "UNDER_REVIEW"),
            SupplierStatus::Inactive => write!(f, "INACTIVE"),
        }
    }
}

impl SupplierStatus {
    /// 从字符串解析状态（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(SupplierStatus::Active),
            "SUSPENDED" => Some(SupplierStatus::Suspended),
            "UNDER_REVIEW" => Some(SupplierStatus::UnderReview),
            "INACTIVE" => Some(SupplierStatus::Inactive),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SupplierStatus::Active => "ACTIVE",
            SupplierStatus::Suspended => "SUSPENDED",
            SupplierStatus::UnderReview => "UNDER_REVIEW",
            SupplierStatus::Inactive => "INACTIVE",
        }
    }
}

// ==========================================
// 绩效等级 (Tier Level)
// ==========================================
// 红线: 等级由综合评分唯一确定,禁止人工直接改写
// 顺序: UNRATED < TIER_3 < TIER_2 < TIER_1 (分数越高等级越好)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierLevel {
    Unrated, // 未评级/数据不足
    Tier3,   // 三级(高风险)
    Tier2,   // 二级(关注)
    Tier1,   // 一级(优质)
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierLevel::Unrated => write!(f, "UNRATED"),
            TierLevel::Tier3 => write!(f, "TIER_3"),
            TierLevel::Tier2 => write!(f, "TIER_2"),
            TierLevel::Tier1 => write!(f, "TIER_1"),
        }
    }
}

impl TierLevel {
    /// 从字符串解析等级（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "UNRATED" => Some(TierLevel::Unrated),
            "TIER_3" => Some(TierLevel::Tier3),
            "TIER_2" => Some(TierLevel::Tier2),
            "TIER_1" => Some(TierLevel::Tier1),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TierLevel::Unrated => "UNRATED",
            TierLevel::Tier3 => "TIER_3",
            TierLevel::Tier2 => "TIER_2",
            TierLevel::Tier1 => "TIER_1",
        }
    }
}

// ==========================================
// 质量事件严重度 (Incident Severity)
// ==========================================
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentSeverity {
    Low,      // 轻微
    Medium,   // 一般
    High,     // 严重
    Critical, // 重大
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentSeverity::Low => write!(f, "LOW"),
            IncidentSeverity::Medium => write!(f, "MEDIUM"),
            IncidentSeverity::High => write!(f, "HIGH"),
            IncidentSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl IncidentSeverity {
    /// 从字符串解析严重度（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(IncidentSeverity::Low),
            "MEDIUM" => Some(IncidentSeverity::Medium),
            "HIGH" => Some(IncidentSeverity::High),
            "CRITICAL" => Some(IncidentSeverity::Critical),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            IncidentSeverity::Low => "LOW",
            IncidentSeverity::Medium => "MEDIUM",
            IncidentSeverity::High => "HIGH",
            IncidentSeverity::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// 破产风险等级 (Bankruptcy Risk)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BankruptcyRisk {
    Low,    // 低
    Medium, // 中
    High,   // 高
}

impl fmt::Display for BankruptcyRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankruptcyRisk::Low => write!(f, "LOW"),
            BankruptcyRisk::Medium => write!(f, "MEDIUM"),
            BankruptcyRisk::High => write!(f, "HIGH"),
        }
    }
}

impl BankruptcyRisk {
    /// 从字符串解析（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(BankruptcyRisk::Low),
            "MEDIUM" => Some(BankruptcyRisk::Medium),
            "HIGH" => Some(BankruptcyRisk::High),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BankruptcyRisk::Low => "LOW",
            BankruptcyRisk::Medium => "MEDIUM",
            BankruptcyRisk::High => "HIGH",
        }
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 红线: DELIVERED 为终态交付,至多发生一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,   // 待发货
    InTransit, // 在途
    Delivered, // 已交付
    Cancelled, // 已取消
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::InTransit => write!(f, "IN_TRANSIT"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl OrderStatus {
    /// 从字符串解析（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(OrderStatus::Pending),
            "IN_TRANSIT" => Some(OrderStatus::InTransit),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::InTransit => "IN_TRANSIT",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 评级任务类型 (Recalc Job Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    Manual, // 人工单供应商重算
    Bulk,   // 按归属方全量重算
    Event,  // 事件触发的单供应商重算
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobType::Manual => write!(f, "MANUAL"),
            JobType::Bulk => write!(f, "BULK"),
            JobType::Event => write!(f, "EVENT"),
        }
    }
}

impl JobType {
    /// 从字符串解析（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MANUAL" => Some(JobType::Manual),
            "BULK" => Some(JobType::Bulk),
            "EVENT" => Some(JobType::Event),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobType::Manual => "MANUAL",
            JobType::Bulk => "BULK",
            JobType::Event => "EVENT",
        }
    }
}

// ==========================================
// 评级任务状态 (Recalc Job Status)
// ==========================================
// 状态机: IN_PROGRESS -> {COMPLETED, FAILED}
// 红线: 终态不可再变更,失败任务不自动重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress, // 执行中
    Completed,  // 已完成
    Failed,     // 失败
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::InProgress => write!(f, "IN_PROGRESS"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl JobStatus {
    /// 从字符串解析（无法识别返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => Some(JobStatus::InProgress),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_level_ordering() {
        // 分数越高等级越好: UNRATED < TIER_3 < TIER_2 < TIER_1
        assert!(TierLevel::Unrated < TierLevel::Tier3);
        assert!(TierLevel::Tier3 < TierLevel::Tier2);
        assert!(TierLevel::Tier2 < TierLevel::Tier1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(IncidentSeverity::Low < IncidentSeverity::Medium);
        assert!(IncidentSeverity::High < IncidentSeverity::Critical);
    }

    #[test]
    fn test_supplier_status_roundtrip() {
        for status in [
            SupplierStatus::Active,
            SupplierStatus::Suspended,
            SupplierStatus::UnderReview,
            SupplierStatus::Inactive,
        ] {
            assert_eq!(SupplierStatus::from_str(status.to_db_str()), Some(status));
        }
        assert_eq!(SupplierStatus::from_str("BOGUS"), None);
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
