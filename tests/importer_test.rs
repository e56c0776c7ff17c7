// ==========================================
// 订单批量导入集成测试
// ==========================================
// 覆盖: CSV 导入、行级错误报告、交付行触发重算
// ==========================================


use std::io::Write;

use supplier_rating::importer::{ImportError, OrderImporter};
use test_helpers::{create_test_state, days_ago, register_supplier};

/// 写一个临时订单 CSV 文件
fn write_orders_csv(lines: &[String]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("创建临时CSV失败");
    writeln!(
        file,
        "supplier_id,order_number,expected_delivery_date,actual_delivery_date,item_count,defect_count,lead_time_accuracy_days,status"
    )
    .unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[tokio::test]
async fn test_csv_import_with_row_errors() {
    let (_tmp, state) = create_test_state();
    let supplier = register_supplier(&state, "OWN01", "宝钢原料");
    let sid = &supplier.supplier_id;

    let csv = write_orders_csv(&[
        // 按期交付
        format!(
            "{},PO-0001,{},{},100,0,0,DELIVERED",
            sid,
            days_ago(10),
            days_ago(10)
        ),
        // 延迟5天交付
        format!(
            "{},PO-0002,{},{},80,2,1,DELIVERED",
            sid,
            days_ago(10),
            days_ago(5)
        ),
        // 在途订单 (不触发重算)
        format!("{},PO-0003,{},,50,,,", sid, days_ago(1)),
        // 未知供应商 -> 行错误
        format!("GHOST,PO-0004,{},,10,,,", days_ago(1)),
        // 日期格式错误 -> 行错误
        format!("{},PO-0005,2026/01/01,,10,,,", sid),
    ]);

    let report = state
        .order_importer
        .import_orders(csv.path())
        .await
        .unwrap();

    assert_eq!(report.total_rows, 5);
    assert_eq!(report.imported, 3);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.row_errors.len(), 2);
    assert!(!report.is_clean());
    // 表头为第1行,出错的是第5、6行
    let error_rows: Vec<usize> = report.row_errors.iter().map(|e| e.row_number).collect();
    assert_eq!(error_rows, vec![5, 6]);
    assert!(report.row_errors[0].message.contains("GHOST"));

    // 交付行各入队一个重算任务
    let stats = state.recalc_queue.queue_stats().unwrap();
    assert_eq!(stats.pending_count, 2);
    state.recalc_queue.process_all().unwrap();

    // 2单交付: 1单按期,avg_delay=2.5 -> penalty=5, base=50 -> delivery=45
    let rated = state.supplier_api.get_supplier(sid).unwrap();
    assert!((rated.delivery_score - 45.0).abs() < 1e-9);
    assert_eq!(rated.total_orders, 3);
    assert_eq!(rated.successful_deliveries, 1);
}

#[tokio::test]
async fn test_import_clean_file() {
    let (_tmp, state) = create_test_state();
    let supplier = register_supplier(&state, "OWN01", "鞍钢带材");
    let sid = &supplier.supplier_id;

    let csv = write_orders_csv(&[
        format!("{},PO-0001,{},,100,,,PENDING", sid, days_ago(1)),
        format!("{},PO-0002,{},,60,,,", sid, days_ago(2)),
    ]);

    let report = state
        .order_importer
        .import_orders(csv.path())
        .await
        .unwrap();

    assert!(report.is_clean());
    assert_eq!(report.imported, 2);
    assert_eq!(report.delivered, 0);

    // 无交付行不入队
    let stats = state.recalc_queue.queue_stats().unwrap();
    assert_eq!(stats.pending_count, 0);
}

#[tokio::test]
async fn test_import_rejects_delivered_row_without_actual_date() {
    let (_tmp, state) = create_test_state();
    let supplier = register_supplier(&state, "OWN01", "宝钢原料");

    let csv = write_orders_csv(&[format!(
        "{},PO-0001,{},,100,,,DELIVERED",
        supplier.supplier_id,
        days_ago(1)
    )]);

    let report = state
        .order_importer
        .import_orders(csv.path())
        .await
        .unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.row_errors.len(), 1);
    assert!(report.row_errors[0]
        .message
        .contains("actual_delivery_date"));

    // 被拒绝的行不落库
    let rated = state
        .supplier_api
        .get_supplier(&supplier.supplier_id)
        .unwrap();
    assert_eq!(rated.total_orders, 0);
}

#[tokio::test]
async fn test_import_unsupported_extension() {
    let (_tmp, state) = create_test_state();

    let file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .unwrap();
    let result = state.order_importer.import_orders(file.path()).await;
    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_import_missing_file() {
    let (_tmp, state) = create_test_state();

    let result = state
        .order_importer
        .import_orders(std::path::Path::new("missing_orders.csv"))
        .await;
    assert!(matches!(result, Err(ImportError::FileNotFound(_))));
}
