// ==========================================
// 供应商绩效评级系统 - 演示数据生成器
// ==========================================
// 用途: 在指定数据库中生成一套可演示的供应商/事件/评级数据
// 用法: cargo run --bin generate_test_data [db_path]
// ==========================================

use supplier_rating::api::{
    DeliveryConfirmation, FinancialSnapshotReport, IncidentReport, InventoryDisruptionReport,
    OrderPlacement, SupplierRegistration,
};
use supplier_rating::app::AppState;
use supplier_rating::domain::Supplier;
use supplier_rating::logging;

const OWNER_ID: &str = "OWN01";

fn days_ago(days: i64) -> String {
    (chrono::Utc::now().date_naive() - chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

fn register(state: &AppState, name: &str, country: &str, restricted: bool, compliance: f64) -> Supplier {
    state
        .supplier_api
        .register_supplier(SupplierRegistration {
            owner_id: OWNER_ID.to_string(),
            name: name.to_string(),
            country: country.to_string(),
            restricted_country: restricted,
            compliance_score: Some(compliance),
        })
        .expect("注册供应商失败")
}

/// 下单并按期/延迟交付
fn place_delivered_orders(state: &AppState, supplier: &Supplier, count: usize, late: usize) {
    for i in 0..count {
        let order = state
            .event_api
            .record_order(OrderPlacement {
                supplier_id: supplier.supplier_id.clone(),
                order_number: format!("PO-{}-{:04}", &supplier.supplier_id[..8], i),
                expected_delivery_date: days_ago(30),
                item_count: 100,
            })
            .expect("下单失败");
        let actual = if i < late { days_ago(25) } else { days_ago(30) };
        state
            .event_api
            .confirm_delivery(DeliveryConfirmation {
                order_id: order.order_id,
                actual_delivery_date: actual,
                lead_time_accuracy_days: Some(if i % 3 == 0 { 1 } else { 0 }),
            })
            .expect("交付确认失败");
    }
}

fn main() {
    logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./supplier_rating_demo.db".to_string());
    tracing::info!("生成演示数据: db_path={}", db_path);

    let state = AppState::new(&db_path).expect("初始化 AppState 失败");

    // 三家主供应商 + 一家受限国家备选
    let primary = register(&state, "宝钢原料", "CN", false, 88.0);
    let steady = register(&state, "鞍钢带材", "CN", false, 72.0);
    let risky = register(&state, "湛江新材", "CN", false, 55.0);
    let restricted = register(&state, "北境矿业", "XX", true, 90.0);

    // 运营事件
    place_delivered_orders(&state, &primary, 12, 1);
    place_delivered_orders(&state, &steady, 8, 2);
    place_delivered_orders(&state, &risky, 5, 3);

    state
        .event_api
        .report_incident(IncidentReport {
            supplier_id: risky.supplier_id.clone(),
            order_id: None,
            incident_type: "DEFECT".to_string(),
            severity: "CRITICAL".to_string(),
            financial_impact: 200_000.0,
            items_affected: 60,
        })
        .expect("质量事件上报失败");
    state
        .event_api
        .record_inventory_event(InventoryDisruptionReport {
            supplier_id: risky.supplier_id.clone(),
            event_type: "STOCK_OUT".to_string(),
            quantity_affected: 800,
            days_unavailable: 5,
            expected_availability_date: None,
        })
        .expect("库存扰动上报失败");
    state
        .event_api
        .record_financial_snapshot(FinancialSnapshotReport {
            supplier_id: primary.supplier_id.clone(),
            credit_score: Some(820),
            credit_rating: Some("AA".to_string()),
            annual_revenue: Some(120_000_000.0),
            employee_count: Some(2400),
            years_in_business: Some(20),
            bankruptcy_risk: Some("LOW".to_string()),
            legal_issues: false,
        })
        .expect("财务快照录入失败");
    state
        .event_api
        .record_financial_snapshot(FinancialSnapshotReport {
            supplier_id: risky.supplier_id.clone(),
            credit_score: Some(480),
            credit_rating: Some("B".to_string()),
            annual_revenue: Some(6_000_000.0),
            employee_count: Some(80),
            years_in_business: Some(3),
            bankruptcy_risk: Some("HIGH".to_string()),
            legal_issues: true,
        })
        .expect("财务快照录入失败");

    // 备选关系: primary 的备选为 steady / restricted
    state
        .failover_api
        .register_backup(&primary.supplier_id, &steady.supplier_id, 1)
        .expect("备选注册失败");
    state
        .failover_api
        .register_backup(&primary.supplier_id, &restricted.supplier_id, 2)
        .expect("备选注册失败");

    // 消费事件触发的重算任务
    let processed = state
        .recalc_queue
        .process_all()
        .expect("队列处理失败");
    tracing::info!("已处理重算任务: {}", processed.len());

    // 打印评级结果
    let suppliers = state
        .supplier_api
        .list_suppliers(OWNER_ID)
        .expect("查询供应商失败");
    for supplier in &suppliers {
        println!(
            "{:<12} tier={} tier_score={:.2} delivery={:.1} quality={:.1} inventory={:.1} financial={:.1} compliance={:.1}",
            supplier.name,
            supplier.tier_level,
            supplier.tier_score,
            supplier.delivery_score,
            supplier.quality_score,
            supplier.inventory_score,
            supplier.financial_health_score,
            supplier.compliance_score,
        );
    }

    println!("演示数据已生成: {}", db_path);
}
