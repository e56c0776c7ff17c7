// ==========================================
// 供应商绩效评级系统 - 备选供应商领域模型
// ==========================================
// 职责: 备选关系(主供应商 -> 备选供应商)与在途任务
// 说明: 备选关系为有向边表,允许环 (提升只走一跳)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// BackupAssociation - 备选关系
// ==========================================
// 对齐: backup_association 表
// 主键: (primary_supplier_id, backup_supplier_id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupAssociation {
    pub primary_supplier_id: String, // 主供应商ID
    pub backup_supplier_id: String,  // 备选供应商ID
    pub priority: i32,               // 优先级 (数值越小优先级越高)
    pub created_at: NaiveDateTime,
}

impl BackupAssociation {
    /// 创建备选关系
    pub fn new(primary_supplier_id: String, backup_supplier_id: String, priority: i32) -> Self {
        Self {
            primary_supplier_id,
            backup_supplier_id,
            priority,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

// ==========================================
// ProcurementTask - 在途采购任务
// ==========================================
// 对齐: procurement_task 表
// 用途: 备选提升时可将在途任务改派给新供应商
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementTask {
    pub task_id: String,     // 任务ID
    pub supplier_id: String, // 当前承接供应商
    pub description: String, // 任务描述
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProcurementTask {
    /// 创建在途任务
    pub fn new(task_id: String, supplier_id: String, description: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            task_id,
            supplier_id,
            description,
            created_at: now,
            updated_at: now,
        }
    }
}
