//! Docker Compose 调用层
//!
//! - `cli`: 进程调用（构造 `-p`/`-f` 参数并执行）
//! - `retry`: 镜像仓库限流时的重试
//! - `validator`: 通过 `config` 子命令校验 compose 文件

pub mod cli;
pub mod retry;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

pub use cli::ComposeCli;
pub use retry::{is_rate_limited, pull_with_retry, run_with_retry, RetryPolicy};
pub use validator::Validator;

/// `pull` 子命令
pub const PULL_ARGS: &[&str] = &["pull"];
/// `up -d --remove-orphans` 子命令
pub const UP_ARGS: &[&str] = &["up", "-d", "--remove-orphans"];
/// `config` 子命令（仅校验）
pub const CONFIG_ARGS: &[&str] = &["config"];

/// compose 相关错误
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Invalid docker-compose file name")]
    InvalidArgument,

    #[error("Invalid docker-compose yml for file {0}")]
    InvalidComposeFile(String),

    /// 命令以非零退出码结束，携带 stderr
    #[error("{}", external_message(.code, .stderr))]
    ExternalCommand { code: Option<i32>, stderr: String },

    #[error("Failed to launch compose command: {0}")]
    Launch(#[source] std::io::Error),

    #[error("Failed to back up compose files: {0}")]
    Backup(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn external_message(code: &Option<i32>, stderr: &str) -> String {
    if !stderr.trim().is_empty() {
        return stderr.to_string();
    }
    match code {
        Some(code) => format!("Command exited with code {}", code),
        None => "Command terminated by signal".to_string(),
    }
}

/// compose CLI 调用接口
///
/// 生产环境由 [`ComposeCli`] 实现；测试中替换为记录调用的假实现
#[async_trait]
pub trait ComposeRunner: Send + Sync {
    /// 针对 `files`（按顺序）执行一次子命令，成功返回累积的 stdout
    async fn run(&self, files: &[PathBuf], args: &[&str]) -> Result<String, ComposeError>;
}
