//! compose 文件校验
//!
//! 通过 `config` 子命令判断文件是否合法；校验失败一律返回 `false`，不抛错

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ComposeRunner, CONFIG_ARGS};

/// 临时校验文件名
pub const SCRATCH_FILE_NAME: &str = "temp.yml";

/// compose 文件校验器
#[derive(Clone)]
pub struct Validator {
    runner: Arc<dyn ComposeRunner>,
    /// 临时目录的父目录；为空时使用系统临时目录
    scratch_root: Option<PathBuf>,
}

impl Validator {
    pub fn new(runner: Arc<dyn ComposeRunner>) -> Self {
        Self {
            runner,
            scratch_root: None,
        }
    }

    /// 指定临时目录的父目录
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// 校验磁盘上已有的文件
    pub async fn validate_file(&self, path: &Path) -> bool {
        match self.runner.run(&[path.to_path_buf()], CONFIG_ARGS).await {
            Ok(_) => true,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "Compose file failed validation");
                false
            }
        }
    }

    /// 校验文件内容
    ///
    /// 每次调用使用独立命名的临时目录，可并发调用；目录在返回前删除
    pub async fn validate_contents(&self, contents: &str) -> bool {
        let scratch = match self.scratch_dir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "Failed to create validation scratch directory");
                return false;
            }
        };

        let path = scratch.path().join(SCRATCH_FILE_NAME);
        if let Err(e) = tokio::fs::write(&path, contents).await {
            warn!(path = %path.display(), error = %e, "Failed to write validation scratch file");
            return false;
        }

        let valid = self.validate_file(&path).await;
        drop(scratch);
        valid
    }

    fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("docker-compose-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}
