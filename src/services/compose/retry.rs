//! 镜像仓库限流重试
//!
//! 仓库返回限流错误时，以固定间隔重试，最多 `max_retries` 次（首次调用不计）

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use super::{ComposeError, ComposeRunner, PULL_ARGS};

/// 限流错误在 stderr 中的标记文本
pub const RATE_EXCEEDED: &str = "Rate exceeded";

/// 默认最大重试次数
pub const DEFAULT_MAX_RETRIES: u32 = 100;

/// 默认重试间隔
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// 重试策略（固定间隔，不做指数退避）
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// 是否为可重试的限流错误
///
/// 仅按错误文本匹配，与外部工具的输出保持一致
pub fn is_rate_limited(err: &ComposeError) -> bool {
    err.to_string().contains(RATE_EXCEEDED)
}

/// 执行子命令，遇到限流错误时按策略重试
pub async fn run_with_retry(
    runner: &dyn ComposeRunner,
    files: &[PathBuf],
    args: &[&str],
    policy: RetryPolicy,
) -> Result<String, ComposeError> {
    let mut remaining = policy.max_retries;
    let mut attempt: u32 = 1;

    loop {
        match runner.run(files, args).await {
            Ok(stdout) => return Ok(stdout),
            Err(err) if remaining > 0 && is_rate_limited(&err) => {
                warn!(
                    attempt,
                    remaining,
                    command = %args.join(" "),
                    "Rate limit exceeded. Retrying."
                );
                tokio::time::sleep(policy.delay).await;
                remaining -= 1;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// 拉取镜像，限流时重试
pub async fn pull_with_retry(
    runner: &dyn ComposeRunner,
    files: &[PathBuf],
    policy: RetryPolicy,
) -> Result<(), ComposeError> {
    run_with_retry(runner, files, PULL_ARGS, policy).await.map(|_| ())
}
