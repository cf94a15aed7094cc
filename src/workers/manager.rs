// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::utils::errors::WorkerError;
use crate::workers::worker::Worker;

/// 工作管理器
///
/// 持有关闭信号。收到 ctrl-c 后通知工作器停止出队，
/// 在途请求完成后工作器自行退出
pub struct WorkerManager {
    shutdown_tx: watch::Sender<bool>,
    signal_handle: Option<JoinHandle<()>>,
}

impl Default for WorkerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            shutdown_tx,
            signal_handle: None,
        }
    }

    /// 订阅关闭信号
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 发出关闭信号
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// 监听 ctrl-c 并转为关闭信号
    pub fn listen_for_signals(&mut self) {
        let shutdown_tx = self.shutdown_tx.clone();
        self.signal_handle = Some(tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received, draining in-flight requests"),
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                    return;
                }
            }
            shutdown_tx.send_replace(true);
        }));
    }

    /// 运行工作器直到其停止
    pub async fn run<W: Worker>(&mut self, worker: &mut W) -> Result<(), WorkerError> {
        info!("Starting worker {}", worker.name());
        let result = worker.run(self.subscribe()).await;

        if let Some(handle) = self.signal_handle.take() {
            handle.abort();
        }

        match &result {
            Ok(()) => info!("Worker {} stopped", worker.name()),
            Err(e) => error!("Worker {} failed: {}", worker.name(), e),
        }
        result
    }
}
