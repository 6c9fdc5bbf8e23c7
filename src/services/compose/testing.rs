//! 测试用的 compose 调用假实现

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{ComposeError, ComposeRunner};

/// 一次被记录的调用
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub files: Vec<PathBuf>,
    pub args: Vec<String>,
}

type Script = dyn Fn(&[PathBuf], &[&str], usize) -> Result<String, ComposeError> + Send + Sync;

/// 按脚本返回结果并记录每次调用
pub struct FakeRunner {
    script: Box<Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRunner {
    /// `script` 收到文件、参数和调用序号（从 0 开始）
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&[PathBuf], &[&str], usize) -> Result<String, ComposeError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 所有调用均成功
    pub fn succeeding() -> Self {
        Self::new(|_, _, _| Ok(String::new()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// 只保留指定子命令的调用
    pub fn calls_for(&self, subcommand: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(subcommand))
            .collect()
    }
}

#[async_trait]
impl ComposeRunner for FakeRunner {
    async fn run(&self, files: &[PathBuf], args: &[&str]) -> Result<String, ComposeError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                files: files.to_vec(),
                args: args.iter().map(|a| a.to_string()).collect(),
            });
            calls.len() - 1
        };
        (self.script)(files, args, index)
    }
}

/// 构造一个非零退出错误
pub fn external(stderr: &str) -> ComposeError {
    ComposeError::ExternalCommand {
        code: Some(1),
        stderr: stderr.to_string(),
    }
}
