// ==========================================
// 备选切换 API 集成测试
// ==========================================
// 覆盖: 备选注册/删除、按可用性提升、在途任务改派、环容忍
// ==========================================


use std::sync::Arc;

use supplier_rating::api::{ApiError, PromotionOutcome};
use supplier_rating::domain::types::SupplierStatus;
use supplier_rating::domain::{ProcurementTask, Supplier};
use supplier_rating::repository::{ProcurementTaskRepository, SupplierRepository};
use test_helpers::{create_test_db, create_test_state};

/// 直接落一个带评分/状态的供应商 (绕过重算流程,便于构造候选)
fn seed_scored_supplier(
    repo: &SupplierRepository,
    id: &str,
    tier_score: f64,
    status: SupplierStatus,
    restricted: bool,
) -> Supplier {
    let mut supplier = Supplier::new(
        id.to_string(),
        "OWN01".to_string(),
        format!("供应商{}", id),
        "CN".to_string(),
    );
    supplier.tier_score = tier_score;
    supplier.status = status;
    supplier.restricted_country = restricted;
    repo.insert(&supplier).unwrap();
    supplier
}

#[test]
fn test_promotion_selects_highest_eligible_not_highest_overall() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "P001", 30.0, SupplierStatus::Active, false);
    // B2 评分更高但已暂停,必须选 B1
    seed_scored_supplier(&supplier_repo, "B001", 70.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B002", 90.0, SupplierStatus::Suspended, false);

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    state.failover_api.register_backup("P001", "B001", 1).unwrap();
    state.failover_api.register_backup("P001", "B002", 2).unwrap();

    let outcome = state.failover_api.promote_backup("P001", None).unwrap();
    match outcome {
        PromotionOutcome::Promoted {
            supplier,
            reassigned_task_id,
        } => {
            assert_eq!(supplier.supplier_id, "B001");
            assert!(reassigned_task_id.is_none());
        }
        PromotionOutcome::NoEligibleBackup => panic!("预期提升 B001"),
    }

    // 提升不改写失效供应商自身状态
    let failed = state.supplier_api.get_supplier("P001").unwrap();
    assert_eq!(failed.status, SupplierStatus::Active);
}

#[test]
fn test_promotion_excludes_restricted_country() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "P001", 30.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B001", 95.0, SupplierStatus::Active, true);
    seed_scored_supplier(&supplier_repo, "B002", 60.0, SupplierStatus::Active, false);

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    state.failover_api.register_backup("P001", "B001", 1).unwrap();
    state.failover_api.register_backup("P001", "B002", 2).unwrap();

    match state.failover_api.promote_backup("P001", None).unwrap() {
        PromotionOutcome::Promoted { supplier, .. } => {
            assert_eq!(supplier.supplier_id, "B002");
        }
        PromotionOutcome::NoEligibleBackup => panic!("预期提升 B002"),
    }
}

#[test]
fn test_no_eligible_backup_is_normal_outcome() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "P001", 30.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B001", 90.0, SupplierStatus::Inactive, false);

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    state.failover_api.register_backup("P001", "B001", 1).unwrap();

    // 无可用备选是正常结果,不是错误
    assert!(matches!(
        state.failover_api.promote_backup("P001", None).unwrap(),
        PromotionOutcome::NoEligibleBackup
    ));

    // 无任何备选关系时同样
    seed_scored_supplier(&supplier_repo, "P002", 30.0, SupplierStatus::Active, false);
    assert!(matches!(
        state.failover_api.promote_backup("P002", None).unwrap(),
        PromotionOutcome::NoEligibleBackup
    ));
}

#[test]
fn test_promotion_reassigns_in_flight_task() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    let task_repo = Arc::new(ProcurementTaskRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "P001", 30.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B001", 70.0, SupplierStatus::Active, false);

    task_repo
        .insert(&ProcurementTask::new(
            "T001".to_string(),
            "P001".to_string(),
            "季度原料补货".to_string(),
        ))
        .unwrap();

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    state.failover_api.register_backup("P001", "B001", 1).unwrap();

    match state
        .failover_api
        .promote_backup("P001", Some("T001"))
        .unwrap()
    {
        PromotionOutcome::Promoted {
            supplier,
            reassigned_task_id,
        } => {
            assert_eq!(supplier.supplier_id, "B001");
            assert_eq!(reassigned_task_id.as_deref(), Some("T001"));
        }
        PromotionOutcome::NoEligibleBackup => panic!("预期提升 B001"),
    }

    let task = task_repo.find_by_id("T001").unwrap().unwrap();
    assert_eq!(task.supplier_id, "B001");
}

#[test]
fn test_promote_unknown_supplier_is_not_found() {
    let (_tmp, state) = create_test_state();
    let result = state.failover_api.promote_backup("GHOST", None);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_register_backup_requires_both_suppliers() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "P001", 30.0, SupplierStatus::Active, false);

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    let result = state.failover_api.register_backup("P001", "GHOST", 1);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_backup_cycle_tolerated_promotion_walks_one_hop() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "A001", 80.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B001", 70.0, SupplierStatus::Active, false);

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    // A 与 B 互为备选: 提升只走一跳,环是合法配置
    state.failover_api.register_backup("A001", "B001", 1).unwrap();
    state.failover_api.register_backup("B001", "A001", 1).unwrap();

    match state.failover_api.promote_backup("A001", None).unwrap() {
        PromotionOutcome::Promoted { supplier, .. } => assert_eq!(supplier.supplier_id, "B001"),
        PromotionOutcome::NoEligibleBackup => panic!("预期提升 B001"),
    }
    match state.failover_api.promote_backup("B001", None).unwrap() {
        PromotionOutcome::Promoted { supplier, .. } => assert_eq!(supplier.supplier_id, "A001"),
        PromotionOutcome::NoEligibleBackup => panic!("预期提升 A001"),
    }
}

#[test]
fn test_list_and_remove_backups() {
    let (_tmp, db_path) = create_test_db();
    let supplier_repo = Arc::new(SupplierRepository::new(&db_path).unwrap());
    seed_scored_supplier(&supplier_repo, "P001", 30.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B001", 70.0, SupplierStatus::Active, false);
    seed_scored_supplier(&supplier_repo, "B002", 60.0, SupplierStatus::Active, false);

    let state = supplier_rating::app::AppState::new(&db_path).unwrap();
    state.failover_api.register_backup("P001", "B002", 2).unwrap();
    state.failover_api.register_backup("P001", "B001", 1).unwrap();

    // 按关系优先级升序
    let backups = state.failover_api.list_backups("P001").unwrap();
    let ids: Vec<&str> = backups.iter().map(|s| s.supplier_id.as_str()).collect();
    assert_eq!(ids, vec!["B001", "B002"]);

    state.failover_api.remove_backup("P001", "B001").unwrap();
    let backups = state.failover_api.list_backups("P001").unwrap();
    assert_eq!(backups.len(), 1);

    let result = state.failover_api.remove_backup("P001", "B001");
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}
