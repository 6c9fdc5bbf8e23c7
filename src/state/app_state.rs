//! 应用状态

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::config::env::EnvConfig;
use crate::services::compose::ComposeRunner;
use crate::services::orchestrator::Orchestrator;

/// 应用状态
pub struct AppState {
    /// 升级编排器
    pub orchestrator: Orchestrator,
    /// 管理操作互斥锁：同一时间只允许一个 install/upgrade/start
    operation_lock: Mutex<()>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: EnvConfig, runner: Arc<dyn ComposeRunner>) -> Self {
        tracing::info!(
            port = config.port,
            project_name = ?config.project_name,
            backup_enabled = config.backup_enabled,
            compose_dir = %config.compose_dir.display(),
            backup_dir = %config.backup_dir.display(),
            "Loaded configuration"
        );

        let orchestrator = Orchestrator::new(config.orchestrator_config(), runner);

        Self {
            orchestrator,
            operation_lock: Mutex::new(()),
        }
    }

    /// 获取管理操作锁，持有到整个操作结束（包括重试等待）
    pub async fn lock_operations(&self) -> MutexGuard<'_, ()> {
        self.operation_lock.lock().await
    }
}
