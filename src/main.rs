// ==========================================
// 供应商绩效评级系统 - 服务主入口
// ==========================================
// 职责: 初始化应用状态,启动后台重算 worker 池与定时调度,等待退出信号
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use supplier_rating::app::{get_default_db_path, AppState};
use supplier_rating::logging;
use supplier_rating::services::{RecalcScheduler, RecalcWorkerPool, WorkerPoolConfig};

/// 定时全量重算间隔 (秒),通过环境变量 SUPPLIER_RATING_BULK_INTERVAL_SECS 覆盖
const DEFAULT_BULK_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[tokio::main]
async fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 供应链决策支持", supplier_rating::APP_NAME);
    tracing::info!("系统版本: {}", supplier_rating::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建 AppState
    let app_state = match AppState::new(&db_path) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("无法初始化 AppState: {}", e);
            std::process::exit(1);
        }
    };

    // 启动后台重算 worker 池
    let mut worker_pool = RecalcWorkerPool::new(
        app_state.recalc_queue.clone(),
        WorkerPoolConfig::default(),
    );
    worker_pool.start();

    // 启动定时全量重算调度 (配置了归属方时)
    let scheduler = match std::env::var("SUPPLIER_RATING_SCHEDULED_OWNER") {
        Ok(owner_id) if !owner_id.trim().is_empty() => {
            let interval_secs = std::env::var("SUPPLIER_RATING_BULK_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BULK_INTERVAL_SECS);
            let mut scheduler = RecalcScheduler::new(
                app_state.recalc_queue.clone(),
                owner_id.trim().to_string(),
                Duration::from_secs(interval_secs),
            );
            scheduler.start();
            Some(scheduler)
        }
        _ => {
            tracing::info!("未配置 SUPPLIER_RATING_SCHEDULED_OWNER,跳过定时全量重算");
            None
        }
    };

    tracing::info!("服务已启动,按 Ctrl-C 退出");

    // 等待退出信号
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("等待退出信号失败: {}", e);
    }

    tracing::info!("收到退出信号,开始优雅关停");
    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    worker_pool.shutdown().await;
    tracing::info!("服务已退出");
}
