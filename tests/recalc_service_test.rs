// ==========================================
// 评级重算服务集成测试
// ==========================================
// 覆盖: 单供应商重算、幂等性、全量任务的部分成功语义
// ==========================================


use std::sync::Arc;

use rusqlite::Connection;
use supplier_rating::config::ScoringConfig;
use supplier_rating::domain::types::{JobStatus, JobType, OrderStatus, TierLevel};
use supplier_rating::domain::{Supplier, SupplierOrder};
use supplier_rating::repository::{
    FinancialHealthRepository, InventoryEventRepository, PerformanceLogRepository,
    QualityIncidentRepository, RecalcLogRepository, RepositoryError, SupplierOrderRepository,
    SupplierRepository,
};
use supplier_rating::services::RatingRecalcService;
use test_helpers::create_test_db;

/// 重算服务测试上下文 (各仓储直连同一个数据库文件)
struct Ctx {
    supplier_repo: Arc<SupplierRepository>,
    order_repo: Arc<SupplierOrderRepository>,
    recalc_log_repo: Arc<RecalcLogRepository>,
    performance_log_repo: Arc<PerformanceLogRepository>,
    service: RatingRecalcService,
}

fn build_ctx(db_path: &str) -> Ctx {
    let supplier_repo = Arc::new(SupplierRepository::new(db_path).unwrap());
    let order_repo = Arc::new(SupplierOrderRepository::new(db_path).unwrap());
    let quality_repo = Arc::new(QualityIncidentRepository::new(db_path).unwrap());
    let inventory_repo = Arc::new(InventoryEventRepository::new(db_path).unwrap());
    let financial_repo = Arc::new(FinancialHealthRepository::new(db_path).unwrap());
    let recalc_log_repo = Arc::new(RecalcLogRepository::new(db_path).unwrap());
    let performance_log_repo = Arc::new(PerformanceLogRepository::new(db_path).unwrap());

    let service = RatingRecalcService::new(
        supplier_repo.clone(),
        order_repo.clone(),
        quality_repo,
        inventory_repo,
        financial_repo,
        recalc_log_repo.clone(),
        &ScoringConfig::default(),
    );

    Ctx {
        supplier_repo,
        order_repo,
        recalc_log_repo,
        performance_log_repo,
        service,
    }
}

fn seed_supplier(ctx: &Ctx, supplier_id: &str, compliance: f64) -> Supplier {
    let supplier = Supplier::new(
        supplier_id.to_string(),
        "OWN01".to_string(),
        format!("供应商{}", supplier_id),
        "CN".to_string(),
    )
    .with_compliance_score(compliance);
    ctx.supplier_repo.insert(&supplier).unwrap();
    supplier
}

/// 直接落一条已交付订单 (绕过交付确认流程,便于构造评分输入)
fn seed_delivered_order(ctx: &Ctx, supplier_id: &str, idx: usize, on_time: bool, delay: i32) {
    let expected = chrono::Utc::now().date_naive() - chrono::Duration::days(10);
    let mut order = SupplierOrder::new(
        format!("{}-O{:03}", supplier_id, idx),
        supplier_id.to_string(),
        format!("PO-{}-{:03}", supplier_id, idx),
        expected,
        100,
    );
    order.status = OrderStatus::Delivered;
    order.actual_delivery_date = Some(expected + chrono::Duration::days(delay as i64));
    order.on_time = Some(on_time);
    order.days_delayed = Some(delay);
    order.lead_time_accuracy_days = Some(0);
    ctx.order_repo.insert(&order).unwrap();
}

#[test]
fn test_manual_recalc_updates_scores_and_finalizes_job() {
    let (_tmp, db_path) = create_test_db();
    let ctx = build_ctx(&db_path);
    seed_supplier(&ctx, "S001", 60.0);
    for i in 0..5 {
        seed_delivered_order(&ctx, "S001", i, true, 0);
    }

    let outcome = ctx
        .service
        .recalculate_supplier("S001", JobType::Manual, "ManualRecalc")
        .unwrap();

    // 全部按期交付: delivery=100, quality=100(无事件), inventory=100(偏差0)
    // financial=50(无快照), compliance=60
    // tier = 0.3*100 + 0.25*100 + 0.2*100 + 0.15*50 + 0.1*60 = 88.5
    assert!((outcome.delivery_score - 100.0).abs() < 1e-9);
    assert!((outcome.quality_score - 100.0).abs() < 1e-9);
    assert!((outcome.inventory_score - 100.0).abs() < 1e-9);
    assert!((outcome.financial_health_score - 50.0).abs() < 1e-9);
    assert!((outcome.tier_score - 88.5).abs() < 1e-9);
    assert_eq!(outcome.tier_level, TierLevel::Tier1);
    assert!(outcome.tier_changed);

    // 供应商行已更新,两个时间戳同时写入
    let stored = ctx.supplier_repo.get_by_id("S001").unwrap();
    assert_eq!(stored.tier_level, TierLevel::Tier1);
    assert!(stored.tier_last_updated.is_some());
    assert!(stored.last_rating_update.is_some());
    assert_eq!(stored.tier_last_updated, stored.last_rating_update);

    // 任务日志已终结
    let log = ctx
        .recalc_log_repo
        .find_by_id(&outcome.job_id)
        .unwrap()
        .unwrap();
    assert_eq!(log.status, JobStatus::Completed);
    assert_eq!(log.suppliers_processed, 1);
    assert_eq!(log.suppliers_tier_changed, 1);
    assert!(log.completed_at.is_some());

    // 绩效快照已追加
    assert_eq!(
        ctx.performance_log_repo.count_by_supplier("S001").unwrap(),
        1
    );
}

#[test]
fn test_recalc_is_idempotent_but_still_appends_log() {
    let (_tmp, db_path) = create_test_db();
    let ctx = build_ctx(&db_path);
    seed_supplier(&ctx, "S001", 60.0);
    for i in 0..10 {
        seed_delivered_order(&ctx, "S001", i, i != 9, if i == 9 { 5 } else { 0 });
    }

    let first = ctx
        .service
        .recalculate_supplier("S001", JobType::Manual, "ManualRecalc")
        .unwrap();
    let second = ctx
        .service
        .recalculate_supplier("S001", JobType::Manual, "ManualRecalc")
        .unwrap();

    // 9/10 按期,1单延迟5天: base=90, avg_delay=0.5, penalty=1 -> 89
    assert!((first.delivery_score - 89.0).abs() < 1e-9);

    // 无新事件时重复重算结果一致
    assert_eq!(first.delivery_score, second.delivery_score);
    assert_eq!(first.quality_score, second.quality_score);
    assert_eq!(first.inventory_score, second.inventory_score);
    assert_eq!(first.financial_health_score, second.financial_health_score);
    assert_eq!(first.tier_score, second.tier_score);
    assert_eq!(first.tier_level, second.tier_level);
    assert!(!second.tier_changed);

    // 快照仍然逐次追加
    assert_eq!(
        ctx.performance_log_repo.count_by_supplier("S001").unwrap(),
        2
    );
}

#[test]
fn test_recalc_unknown_supplier_is_not_found() {
    let (_tmp, db_path) = create_test_db();
    let ctx = build_ctx(&db_path);

    let result = ctx
        .service
        .recalculate_supplier("S404", JobType::Manual, "ManualRecalc");
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
}

#[test]
fn test_bulk_job_completes_over_owner() {
    let (_tmp, db_path) = create_test_db();
    let ctx = build_ctx(&db_path);
    for i in 1..=3 {
        seed_supplier(&ctx, &format!("S{:03}", i), 0.0);
    }

    let log = ctx
        .service
        .recalculate_owner("OWN01", "ScheduledRecalc")
        .unwrap();

    assert_eq!(log.status, JobStatus::Completed);
    assert_eq!(log.job_type, JobType::Bulk);
    assert_eq!(log.suppliers_processed, 3);
    // 无事件数据: tier = 0.3*50 + 0.25*0 + 0.2*50 + 0.15*50 = 32.5 -> 仍为 UNRATED
    assert_eq!(log.suppliers_tier_changed, 0);
    assert!(log.error_message.is_none());

    for i in 1..=3 {
        let supplier = ctx.supplier_repo.get_by_id(&format!("S{:03}", i)).unwrap();
        assert_eq!(supplier.tier_level, TierLevel::Unrated);
        assert!((supplier.tier_score - 32.5).abs() < 1e-9);
        assert!(supplier.last_rating_update.is_some());
    }
}

#[test]
fn test_bulk_job_partial_failure_keeps_committed_prefix() {
    let (_tmp, db_path) = create_test_db();
    let ctx = build_ctx(&db_path);
    for i in 1..=10 {
        seed_supplier(&ctx, &format!("S{:03}", i), 0.0);
    }

    // 第3个供应商携带无法解析的订单行,使其读取阶段失败
    let conn = Connection::open(&db_path).unwrap();
    conn.execute(
        r#"
        INSERT INTO supplier_order (
            order_id, supplier_id, order_number, status, expected_delivery_date,
            item_count, defect_count, created_at, updated_at
        ) VALUES ('X-BAD', 'S003', 'PO-BAD', 'BOGUS', '2026-01-01',
                  10, 0, datetime('now'), datetime('now'))
        "#,
        [],
    )
    .unwrap();

    let log = ctx
        .service
        .recalculate_owner("OWN01", "ScheduledRecalc")
        .unwrap();

    // 前2个供应商已提交,任务在第3个失败终止
    assert_eq!(log.status, JobStatus::Failed);
    assert_eq!(log.suppliers_processed, 2);
    let error = log.error_message.expect("失败任务必须记录原因");
    assert!(error.contains("S003"));

    for i in 1..=2 {
        let supplier = ctx.supplier_repo.get_by_id(&format!("S{:03}", i)).unwrap();
        assert!(supplier.last_rating_update.is_some(), "S{:03} 应已更新", i);
    }
    for i in 3..=10 {
        let supplier = ctx.supplier_repo.get_by_id(&format!("S{:03}", i)).unwrap();
        assert!(
            supplier.last_rating_update.is_none(),
            "S{:03} 不应被触碰",
            i
        );
    }

    // 快照只为已提交的供应商追加
    assert_eq!(
        ctx.performance_log_repo.count_by_supplier("S001").unwrap(),
        1
    );
    assert_eq!(
        ctx.performance_log_repo.count_by_supplier("S004").unwrap(),
        0
    );
}

#[test]
fn test_bulk_job_window_excludes_old_orders() {
    let (_tmp, db_path) = create_test_db();
    let ctx = build_ctx(&db_path);
    seed_supplier(&ctx, "S001", 0.0);

    // 窗口外订单 (100天前创建) 不参与评分
    let expected = chrono::Utc::now().date_naive() - chrono::Duration::days(100);
    let mut order = SupplierOrder::new(
        "S001-OLD".to_string(),
        "S001".to_string(),
        "PO-OLD".to_string(),
        expected,
        100,
    );
    order.status = OrderStatus::Delivered;
    order.actual_delivery_date = Some(expected);
    order.on_time = Some(true);
    order.days_delayed = Some(0);
    let old = chrono::Utc::now().naive_utc() - chrono::Duration::days(100);
    order.created_at = old;
    order.updated_at = old;
    ctx.order_repo.insert(&order).unwrap();

    let outcome = ctx
        .service
        .recalculate_supplier("S001", JobType::Manual, "ManualRecalc")
        .unwrap();

    // 窗口内无订单: delivery=0 (无数据按最差), quality=50, inventory=50
    assert!((outcome.delivery_score - 0.0).abs() < 1e-9);
    assert!((outcome.quality_score - 50.0).abs() < 1e-9);
    assert!((outcome.inventory_score - 50.0).abs() < 1e-9);
}
