// ==========================================
// 供应商绩效评级系统 - 后台重算 Worker 池
// ==========================================
// 职责: 有界数量的 tokio 任务轮询队列,消费重算任务
// 说明: 任务执行失败被记入任务行,worker 只负责拉取与推进
// 红线: 关停时不中断执行中的任务,等待其运行至终态
// ==========================================

use crate::services::recalc_queue::{RecalcQueue, RecalcTask};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

// ==========================================
// WorkerPoolConfig - Worker 池配置
// ==========================================
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub worker_count: usize,     // worker 数量
    pub poll_interval: Duration, // 队列空闲时的轮询间隔
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 2,
            poll_interval: Duration::from_millis(200),
        }
    }
}

// ==========================================
// RecalcWorkerPool - 重算 Worker 池
// ==========================================
pub struct RecalcWorkerPool {
    queue: Arc<RecalcQueue>,
    config: WorkerPoolConfig,
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl RecalcWorkerPool {
    /// 创建 Worker 池 (未启动)
    pub fn new(queue: Arc<RecalcQueue>, config: WorkerPoolConfig) -> Self {
        Self {
            queue,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// 启动所有 worker
    pub fn start(&mut self) {
        if !self.handles.is_empty() {
            tracing::warn!("Worker 池已启动,忽略重复启动");
            return;
        }

        for worker_id in 0..self.config.worker_count {
            let queue = self.queue.clone();
            let shutdown = self.shutdown.clone();
            let poll_interval = self.config.poll_interval;

            let handle = tokio::spawn(async move {
                tracing::info!("重算 worker 启动: worker_id={}", worker_id);
                loop {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }

                    match queue.process_next() {
                        Ok(Some(task_id)) => {
                            tracing::debug!(
                                "worker_id={} 处理完任务: task_id={}",
                                worker_id,
                                task_id
                            );
                            // 有任务被处理,立即继续拉取
                        }
                        Ok(None) => {
                            tokio::time::sleep(poll_interval).await;
                        }
                        Err(e) => {
                            tracing::error!("worker_id={} 队列处理出错: {}", worker_id, e);
                            tokio::time::sleep(poll_interval).await;
                        }
                    }
                }
                tracing::info!("重算 worker 退出: worker_id={}", worker_id);
            });
            self.handles.push(handle);
        }

        tracing::info!("重算 Worker 池已启动: worker_count={}", self.config.worker_count);
    }

    /// 是否已启动
    pub fn is_running(&self) -> bool {
        !self.handles.is_empty() && !self.shutdown.load(Ordering::Relaxed)
    }

    /// 优雅关停: 通知所有 worker 退出并等待
    pub async fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::error!("等待 worker 退出失败: {}", e);
            }
        }
        tracing::info!("重算 Worker 池已关停");
    }
}

// ==========================================
// RecalcScheduler - 定时全量重算调度器
// ==========================================
// 说明: 按固定间隔为指定归属方入队全量重算任务
pub struct RecalcScheduler {
    queue: Arc<RecalcQueue>,
    owner_id: String,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl RecalcScheduler {
    /// 创建调度器 (未启动)
    pub fn new(queue: Arc<RecalcQueue>, owner_id: String, interval: Duration) -> Self {
        Self {
            queue,
            owner_id,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// 启动定时调度
    pub fn start(&mut self) {
        if self.handle.is_some() {
            tracing::warn!("调度器已启动,忽略重复启动");
            return;
        }

        let queue = self.queue.clone();
        let owner_id = self.owner_id.clone();
        let interval = self.interval;
        let shutdown = self.shutdown.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(
                "全量重算调度器启动: owner_id={}, interval={:?}",
                owner_id,
                interval
            );
            loop {
                tokio::time::sleep(interval).await;
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }

                let task = RecalcTask::full_scope(
                    owner_id.clone(),
                    "ScheduledRecalc",
                    Some("RecalcScheduler".to_string()),
                );
                match queue.enqueue(task) {
                    Ok(task_id) => {
                        tracing::info!(
                            "定时全量重算已入队: owner_id={}, task_id={}",
                            owner_id,
                            task_id
                        );
                    }
                    Err(e) => {
                        tracing::error!("定时全量重算入队失败: owner_id={}, error={}", owner_id, e);
                    }
                }
            }
            tracing::info!("全量重算调度器退出: owner_id={}", owner_id);
        });
        self.handle = Some(handle);
    }

    /// 关停调度器
    pub async fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        tracing::info!("全量重算调度器已关停");
    }
}
