//! 环境变量配置加载

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::services::compose::RetryPolicy;
use crate::services::orchestrator::OrchestratorConfig;

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 服务监听端口
    pub port: u16,
    /// compose `-p` 项目名；未设置时使用第一个文件的文件名
    pub project_name: Option<String>,
    /// 覆盖前是否备份
    pub backup_enabled: bool,
    /// 部署目录
    pub compose_dir: PathBuf,
    /// 备份根目录
    pub backup_dir: PathBuf,
    /// compose CLI 命令行；未设置时自动检测
    pub compose_cli: Option<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            port: constants::DEFAULT_PORT,
            project_name: None,
            backup_enabled: true,
            compose_dir: PathBuf::from(constants::DEFAULT_COMPOSE_DIR),
            backup_dir: PathBuf::from(constants::DEFAULT_BACKUP_DIR),
            compose_cli: None,
        }
    }
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源加载配置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.parse().unwrap_or_else(|_| {
                warn!(value = %v, "Invalid PORT, using default");
                defaults.port
            }),
            None => defaults.port,
        };

        let project_name = lookup("CHT_COMPOSE_PROJECT_NAME").filter(|s| !s.is_empty());
        if project_name.is_none() {
            warn!("CHT_COMPOSE_PROJECT_NAME not set, project name will follow the first compose file");
        }

        let backup_enabled = lookup("CHT_BACKUP_COMPOSE_FILES")
            .map(|v| parse_flag(&v, true))
            .unwrap_or(defaults.backup_enabled);

        let compose_dir = lookup("CHT_COMPOSE_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.compose_dir);

        let backup_dir = lookup("CHT_BACKUP_DIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.backup_dir);

        let compose_cli = lookup("CHT_COMPOSE_CLI").filter(|s| !s.trim().is_empty());

        Self {
            port,
            project_name,
            backup_enabled,
            compose_dir,
            backup_dir,
            compose_cli,
        }
    }

    /// 编排器配置
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            compose_dir: self.compose_dir.clone(),
            backup_dir: self.backup_dir.clone(),
            backup_enabled: self.backup_enabled,
            retry: RetryPolicy {
                max_retries: constants::MAX_PULL_RETRIES,
                delay: Duration::from_millis(constants::PULL_RETRY_DELAY_MS),
            },
        }
    }
}

/// 解析布尔类开关；无法识别时返回 `default`
fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// 常量
pub mod constants {
    /// 默认监听端口
    pub const DEFAULT_PORT: u16 = 5008;

    /// 默认部署目录
    pub const DEFAULT_COMPOSE_DIR: &str = "/docker-compose";

    /// 默认备份根目录
    pub const DEFAULT_BACKUP_DIR: &str = "data/backup";

    /// 限流时最大重试次数
    pub const MAX_PULL_RETRIES: u32 = 100;

    /// 限流重试间隔（毫秒）
    pub const PULL_RETRY_DELAY_MS: u64 = 1000;

    /// 请求体大小上限
    pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
