//! compose 文件目录
//!
//! 部署目录下直接存放的普通文件即为全部部署定义；不做子目录递归

use std::io::Write;
#[cfg(test)]
use std::path::Path;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 原子写入临时文件的后缀；临时文件以 `.` 开头，`list` 不返回
const TEMP_SUFFIX: &str = ".tmp";

/// 部署目录中的一个文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentFile {
    pub name: String,
    pub path: PathBuf,
}

/// 部署文件存储
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    dir: PathBuf,
}

impl DeploymentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// 文件在部署目录中的路径
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// 列出部署目录中的普通文件（跳过子目录、符号链接和写入中的临时文件），按目录读取顺序
    pub async fn list(&self) -> std::io::Result<Vec<DeploymentFile>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // DirEntry::file_type 不跟随符号链接
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if is_temp_name(&name) {
                continue;
            }
            files.push(DeploymentFile {
                name,
                path: entry.path(),
            });
        }

        Ok(files)
    }

    pub async fn exists(&self, name: &str) -> bool {
        fs::try_exists(self.path_of(name)).await.unwrap_or(false)
    }

    pub async fn read(&self, name: &str) -> std::io::Result<String> {
        fs::read_to_string(self.path_of(name)).await
    }

    /// 写入文件（原子写入：先写临时文件再重命名）
    ///
    /// 任何一步失败，临时文件随 `NamedTempFile` 一起删除
    pub async fn write(&self, name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.path_of(name);
        fs::create_dir_all(&self.dir).await?;

        let dir = self.dir.clone();
        let target = path.clone();
        let prefix = format!(".{}.", name);
        let data = contents.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut temp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(TEMP_SUFFIX)
                .tempfile_in(&dir)?;
            temp.write_all(&data)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                temp.as_file()
                    .set_permissions(std::fs::Permissions::from_mode(0o644))?;
            }
            temp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        debug!(path = %path.display(), bytes = contents.len(), "Wrote compose file");
        Ok(path)
    }
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(TEMP_SUFFIX)
}
