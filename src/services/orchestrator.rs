//! 升级编排
//!
//! `update`: 校验 → 备份 → 写入 → 拉取镜像
//! `start_up`: 校验全部文件 → 一次性 `up -d --remove-orphans`
//!
//! 不持有任何跨调用的内存状态，所有状态都在部署目录和备份目录中。

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::services::backup::BackupManager;
use crate::services::compose::{
    pull_with_retry, run_with_retry, ComposeError, ComposeRunner, RetryPolicy, Validator, UP_ARGS,
};
use crate::services::store::DeploymentStore;

/// 编排配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 部署目录
    pub compose_dir: PathBuf,
    /// 备份根目录
    pub backup_dir: PathBuf,
    /// 覆盖前是否备份
    pub backup_enabled: bool,
    /// 限流重试策略
    pub retry: RetryPolicy,
}

/// 升级编排器
pub struct Orchestrator {
    runner: Arc<dyn ComposeRunner>,
    validator: Validator,
    store: DeploymentStore,
    backup: Option<BackupManager>,
    retry: RetryPolicy,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, runner: Arc<dyn ComposeRunner>) -> Self {
        let backup = config
            .backup_enabled
            .then(|| BackupManager::new(config.backup_dir.clone()));

        Self {
            validator: Validator::new(runner.clone()),
            runner,
            store: DeploymentStore::new(config.compose_dir),
            backup,
            retry: config.retry,
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &DeploymentStore {
        &self.store
    }

    /// 安装或升级单个 compose 文件
    ///
    /// `install` 为真时文件必须不存在，为假时必须已存在；条件不满足返回 `Ok(false)`，无任何副作用。
    /// 镜像拉取失败时文件已被覆盖，旧容器继续运行，直到下一次 `start_up`。
    pub async fn update(
        &self,
        file_name: &str,
        contents: &str,
        install: bool,
    ) -> Result<bool, ComposeError> {
        if !is_valid_file_name(file_name) {
            return Err(ComposeError::InvalidArgument);
        }

        let exists = self.store.exists(file_name).await;
        if install == exists {
            debug!(file = %file_name, install, exists, "Skipping update");
            return Ok(false);
        }

        if !self.validator.validate_contents(contents).await {
            return Err(ComposeError::InvalidComposeFile(file_name.to_string()));
        }

        if let Some(backup) = &self.backup {
            backup
                .backup_all(&self.store)
                .await
                .map_err(ComposeError::Backup)?;
        }

        let path = self.store.write(file_name, contents).await?;
        pull_with_retry(self.runner.as_ref(), &[path], self.retry).await?;

        info!(file = %file_name, install, "Compose file updated");
        Ok(true)
    }

    /// 启动部署目录中所有合法的 compose 文件
    ///
    /// 非法文件静默跳过；没有合法文件时不调用 `up`
    pub async fn start_up(&self) -> Result<(), ComposeError> {
        let mut valid = Vec::new();
        for file in self.store.list().await? {
            if self.validator.validate_file(&file.path).await {
                valid.push(file.path);
            } else {
                debug!(file = %file.name, "Skipping invalid compose file");
            }
        }

        if valid.is_empty() {
            info!("No valid compose files found, nothing to start");
            return Ok(());
        }

        info!(files = valid.len(), "Starting containers");
        run_with_retry(self.runner.as_ref(), &valid, UP_ARGS, self.retry).await?;
        Ok(())
    }
}

/// 文件名必须是部署目录下的单一路径段
fn is_valid_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
