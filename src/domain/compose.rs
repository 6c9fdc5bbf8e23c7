//! compose 升级相关领域模型

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 安装模式冲突提示
pub const EXISTING_INSTALLATION_FOUND: &str =
    "Existing installation found. Use '/upgrade' API to upgrade.";

/// 升级模式冲突提示
pub const EXISTING_INSTALLATION_NOT_FOUND: &str =
    "Existing installation not found. Use '/install' API to install.";

/// 更新模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// 文件必须不存在
    Install,
    /// 文件必须已存在
    Upgrade,
}

impl UpdateMode {
    pub fn is_install(self) -> bool {
        matches!(self, UpdateMode::Install)
    }

    /// 条件不满足时返回给调用方的原因
    pub fn conflict_reason(self) -> &'static str {
        match self {
            UpdateMode::Install => EXISTING_INSTALLATION_FOUND,
            UpdateMode::Upgrade => EXISTING_INSTALLATION_NOT_FOUND,
        }
    }
}

/// `/install`、`/upgrade` 请求体
///
/// 按请求中的顺序保存 文件名 → 文件内容
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub docker_compose: Option<IndexMap<String, String>>,
}

impl UpdateRequest {
    /// 取出非空的文件映射
    pub fn into_files(self) -> Option<IndexMap<String, String>> {
        self.docker_compose.filter(|files| !files.is_empty())
    }
}

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FileResult {
    pub fn updated() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn skipped(mode: UpdateMode) -> Self {
        Self {
            ok: false,
            reason: Some(mode.conflict_reason().to_string()),
        }
    }
}

/// `/install`、`/upgrade` 响应体：文件名 → 结果
pub type UpdateResponse = IndexMap<String, FileResult>;

/// 简单的 `{ "ok": true }` 响应
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
