//! 命令执行器
//!
//! 提供统一的外部命令执行接口：
//! - stdout/stderr 逐行流式输出到 tracing
//! - 同时累积完整输出，供调用方判断结果

use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 命令执行器
pub struct CommandRunner;

/// 命令执行错误
#[derive(Debug)]
pub enum CommandError {
    /// 命令启动失败
    SpawnFailed(std::io::Error),
    /// 等待命令完成失败
    WaitFailed(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::SpawnFailed(e) => write!(f, "Failed to spawn command: {}", e),
            CommandError::WaitFailed(e) => write!(f, "Failed to wait for command: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::SpawnFailed(e) | CommandError::WaitFailed(e) => Some(e),
        }
    }
}

impl CommandError {
    /// 取出底层 IO 错误
    pub fn into_io(self) -> std::io::Error {
        match self {
            CommandError::SpawnFailed(e) | CommandError::WaitFailed(e) => e,
        }
    }
}

/// 命令执行结果
#[derive(Debug)]
pub struct CapturedOutput {
    /// 退出状态
    pub status: ExitStatus,
    /// 累积的 stdout
    pub stdout: String,
    /// 累积的 stderr
    pub stderr: String,
}

impl CommandRunner {
    /// 执行命令，边读边输出日志，并返回累积的 stdout/stderr
    ///
    /// # Arguments
    /// * `program` - 要执行的程序
    /// * `args` - 命令行参数
    ///
    /// 非零退出码不视为错误，由调用方根据 `status` 判断
    pub async fn run_captured(program: &str, args: &[String]) -> Result<CapturedOutput, CommandError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(CommandError::SpawnFailed)?;

        let stdout_task = child.stdout.take().map(|out| spawn_reader(out, "stdout"));
        let stderr_task = child.stderr.take().map(|err| spawn_reader(err, "stderr"));

        let status = child.wait().await.map_err(CommandError::WaitFailed)?;

        // 等待日志读取完成
        let stdout = collect(stdout_task).await;
        let stderr = collect(stderr_task).await;

        debug!(program, code = ?status.code(), "Command finished");

        Ok(CapturedOutput {
            status,
            stdout,
            stderr,
        })
    }
}

/// 启动读取任务：逐行回显并累积
///
/// 按字节读取，非 UTF-8 内容有损解码；必须读到 EOF，提前关闭管道会让子进程收到 SIGPIPE
fn spawn_reader<R>(reader: R, stream: &'static str) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut raw = Vec::new();
        let mut buf = String::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(stream, error = %e, "Stopped reading command output");
                    break;
                }
            }
            let text = String::from_utf8_lossy(&raw);
            let line = text.trim_end_matches(['\n', '\r']);
            if stream == "stderr" {
                warn!(target: "compose", "{}", line);
            } else {
                info!(target: "compose", "{}", line);
            }
            buf.push_str(line);
            buf.push('\n');
        }
        buf
    })
}

async fn collect(task: Option<JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_run_captured_success() {
        let output = CommandRunner::run_captured("echo", &args(&["hello"]))
            .await
            .unwrap();

        assert!(output.status.success());
        assert!(output.stdout.contains("hello"));
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_run_captured_collects_stderr_on_failure() {
        let output = CommandRunner::run_captured("sh", &args(&["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_run_captured_survives_invalid_utf8() {
        let script = "printf 'progress \\377\\n' >&2; sleep 0.2; \
                      echo 'toomanyrequests: Rate exceeded' >&2; exit 1";
        let output = CommandRunner::run_captured("sh", &args(&["-c", script]))
            .await
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(output.stderr.starts_with("progress \u{FFFD}\n"), "{:?}", output.stderr);
        assert!(output.stderr.ends_with("toomanyrequests: Rate exceeded\n"));
    }

    #[tokio::test]
    async fn test_run_captured_not_found() {
        let result = CommandRunner::run_captured("nonexistent_command_12345", &[]).await;

        assert!(matches!(result, Err(CommandError::SpawnFailed(_))));
    }
}
