//! 覆盖前备份
//!
//! 每次备份在备份根目录下新建 `<时间戳>-<随机后缀>` 目录，复制当前所有 `.yml` 文件。
//! 只新增不删除，不做过期清理。

use chrono::{DateTime, Utc};
use std::path::PathBuf;
#[cfg(test)]
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use super::store::DeploymentStore;

/// 参与备份的文件后缀
pub const BACKUP_SUFFIX: &str = ".yml";

/// 备份管理器
#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
    suffix: String,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            suffix: BACKUP_SUFFIX.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// 备份部署目录中所有匹配后缀的文件，返回快照目录
    ///
    /// 单个文件复制失败只记录日志，不中断其余文件
    /// 部署目录尚不存在时视为没有文件，仍生成空快照
    pub async fn backup_all(&self, store: &DeploymentStore) -> std::io::Result<PathBuf> {
        let files = match store.list().await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        let snapshot = self.root.join(snapshot_name(Utc::now()));
        fs::create_dir_all(&snapshot).await?;

        let mut copied = 0usize;
        for file in files {
            if !file.name.ends_with(&self.suffix) {
                continue;
            }
            match fs::copy(&file.path, snapshot.join(&file.name)).await {
                Ok(_) => copied += 1,
                Err(e) => warn!(
                    file = %file.name,
                    snapshot = %snapshot.display(),
                    error = %e,
                    "Failed to back up compose file"
                ),
            }
        }

        info!(snapshot = %snapshot.display(), files = copied, "Backed up compose files");
        Ok(snapshot)
    }

    /// 按名称排序的最新快照目录
    pub async fn latest_snapshot(&self) -> std::io::Result<Option<PathBuf>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut latest: Option<PathBuf> = None;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            if latest.as_ref().map_or(true, |current| path.file_name() > current.file_name()) {
                latest = Some(path);
            }
        }
        Ok(latest)
    }
}

/// 快照目录名：`YYYY-MM-DDTHH-MM-SS-mmmZ-<8 位随机十六进制>`
///
/// 时间戳部分按字典序即时间顺序
fn snapshot_name(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%Y-%m-%dT%H-%M-%S-%3fZ"), &random[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap()
            + chrono::Duration::milliseconds(42);

        let name = snapshot_name(at);

        assert!(name.starts_with("2024-03-07T09-05-01-042Z-"), "{name}");
        assert_eq!(name.len(), "2024-03-07T09-05-01-042Z-".len() + 8);
        assert!(!name.contains(':') && !name.contains('.'));
    }

    #[test]
    fn test_snapshot_names_do_not_collide() {
        let at = Utc::now();
        assert_ne!(snapshot_name(at), snapshot_name(at));
    }

    #[tokio::test]
    async fn test_backup_all_copies_only_yml_files() {
        let work = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(work.path().join("compose"));
        store.write("one-two.yml", "version 1").await.unwrap();
        store.write("three.yml", "version 1 of three").await.unwrap();
        store.write("readme.md", "docs").await.unwrap();
        std::fs::create_dir(store.dir().join("sub.yml")).unwrap();

        let manager = BackupManager::new(work.path().join("data/backup"));
        let snapshot = manager.backup_all(&store).await.unwrap();

        assert!(snapshot.starts_with(manager.root()));
        assert_eq!(std::fs::read_to_string(snapshot.join("one-two.yml")).unwrap(), "version 1");
        assert_eq!(
            std::fs::read_to_string(snapshot.join("three.yml")).unwrap(),
            "version 1 of three"
        );
        assert!(!snapshot.join("readme.md").exists());
        assert!(!snapshot.join("sub.yml").exists());
        // 部署目录不受影响
        assert_eq!(store.read("one-two.yml").await.unwrap(), "version 1");
    }

    #[tokio::test]
    async fn test_backup_all_with_missing_deployment_directory() {
        let work = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(work.path().join("compose"));
        let manager = BackupManager::new(work.path().join("data/backup"));

        let snapshot = manager.backup_all(&store).await.unwrap();

        assert!(snapshot.is_dir());
        assert_eq!(std::fs::read_dir(&snapshot).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_latest_snapshot() {
        let work = tempfile::tempdir().unwrap();
        let store = DeploymentStore::new(work.path().join("compose"));
        store.write("a.yml", "1").await.unwrap();
        let manager = BackupManager::new(work.path().join("backup"));

        assert_eq!(manager.latest_snapshot().await.unwrap(), None);

        std::fs::create_dir_all(manager.root().join("2020-01-01T00-00-00-000Z-aaaaaaaa")).unwrap();
        let fresh = manager.backup_all(&store).await.unwrap();

        assert_eq!(manager.latest_snapshot().await.unwrap(), Some(fresh));
    }
}
