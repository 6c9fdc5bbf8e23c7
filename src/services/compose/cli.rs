//! Docker Compose process invocation
//!
//! Builds `<cli> -p <project> -f <file>... <subcommand...>` and runs it once per call.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

use crate::infra::CommandRunner;

use super::{ComposeError, ComposeRunner};

/// compose CLI 进程调用器
#[derive(Debug, Clone)]
pub struct ComposeCli {
    /// 可执行程序，如 `docker` 或 `docker-compose`
    program: String,
    /// 程序后紧跟的固定参数，如 `compose`
    base_args: Vec<String>,
    /// `-p` 项目名；为空时退回到第一个文件的文件名
    project_name: Option<String>,
}

impl ComposeCli {
    pub fn new(
        program: impl Into<String>,
        base_args: Vec<String>,
        project_name: Option<String>,
    ) -> Self {
        Self {
            program: program.into(),
            base_args,
            project_name,
        }
    }

    /// 从命令行字符串构造，如 `"docker compose"`
    ///
    /// 空字符串返回 `None`
    pub fn from_command_line(command_line: &str, project_name: Option<String>) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect(), project_name))
    }

    /// Detect which docker-compose command to use (prefer docker-compose, fallback to docker compose)
    pub async fn detect(project_name: Option<String>) -> Self {
        let check = Command::new("which").arg("docker-compose").output().await;

        if check.map(|o| o.status.success()).unwrap_or(false) {
            Self::new("docker-compose", vec![], project_name)
        } else {
            Self::new("docker", vec!["compose".to_string()], project_name)
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// 构造完整参数列表（不含程序本身）
    pub fn build_args(&self, files: &[PathBuf], args: &[&str]) -> Vec<String> {
        let mut full = self.base_args.clone();

        if let Some(project) = self.resolve_project_name(files) {
            full.push("-p".to_string());
            full.push(project);
        }

        for file in files {
            full.push("-f".to_string());
            full.push(file.display().to_string());
        }

        full.extend(
            args.iter()
                .flat_map(|arg| arg.split_whitespace())
                .map(str::to_string),
        );
        full
    }

    fn resolve_project_name(&self, files: &[PathBuf]) -> Option<String> {
        self.project_name
            .clone()
            .or_else(|| files.first().and_then(|f| file_name(f)))
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

#[async_trait]
impl ComposeRunner for ComposeCli {
    async fn run(&self, files: &[PathBuf], args: &[&str]) -> Result<String, ComposeError> {
        let full_args = self.build_args(files, args);
        info!("Running cmd: {} {}", self.program, full_args.join(" "));

        let output = CommandRunner::run_captured(&self.program, &full_args)
            .await
            .map_err(|e| ComposeError::Launch(e.into_io()))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(ComposeError::ExternalCommand {
                code: output.status.code(),
                stderr: output.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_build_args_single_file() {
        let cli = ComposeCli::new("docker-compose", vec![], Some("cht".to_string()));

        let args = cli.build_args(&paths(&["docker-compose.yml"]), &["config"]);

        assert_eq!(args, vec!["-p", "cht", "-f", "docker-compose.yml", "config"]);
    }

    #[test]
    fn test_build_args_multiple_files_in_order() {
        let cli = ComposeCli::new("docker", vec!["compose".to_string()], Some("somerandomname".to_string()));

        let args = cli.build_args(
            &paths(&["path/to/file1.yml", "path/to/file2.yml", "path/to/file3.yml"]),
            &["up -d --remove-orphans"],
        );

        assert_eq!(
            args,
            vec![
                "compose",
                "-p", "somerandomname",
                "-f", "path/to/file1.yml",
                "-f", "path/to/file2.yml",
                "-f", "path/to/file3.yml",
                "up", "-d", "--remove-orphans",
            ]
        );
    }

    #[test]
    fn test_build_args_legacy_project_name_from_first_file() {
        let cli = ComposeCli::new("docker-compose", vec![], None);

        let args = cli.build_args(&paths(&["/docker-compose/one-two.yml", "/docker-compose/three.yml"]), &["pull"]);

        assert_eq!(&args[..2], &["-p", "one-two.yml"]);
    }

    #[test]
    fn test_from_command_line() {
        let cli = ComposeCli::from_command_line("docker compose", None).unwrap();
        assert_eq!(cli.program(), "docker");
        assert_eq!(cli.build_args(&[], &["version"]), vec!["compose", "version"]);

        assert!(ComposeCli::from_command_line("   ", None).is_none());
    }

    #[tokio::test]
    async fn test_run_launch_failure_is_distinct() {
        let cli = ComposeCli::new("nonexistent_compose_12345", vec![], Some("p".to_string()));

        let err = cli.run(&paths(&["a.yml"]), &["config"]).await.unwrap_err();

        assert!(matches!(err, ComposeError::Launch(_)));
    }

    #[cfg(unix)]
    mod process {
        use super::*;

        /// 用 `sh <script>` 充当 compose CLI
        fn scripted_cli(dir: &Path, body: &str) -> ComposeCli {
            let script = dir.join("fake-compose.sh");
            std::fs::write(&script, body).unwrap();
            ComposeCli::new("sh", vec![script.display().to_string()], Some("cht".to_string()))
        }

        #[tokio::test]
        async fn test_run_returns_stdout_and_passes_args() {
            let dir = tempfile::tempdir().unwrap();
            let cli = scripted_cli(dir.path(), "echo \"$@\"\n");

            let stdout = cli
                .run(&paths(&["a.yml", "b.yml"]), &["up -d --remove-orphans"])
                .await
                .unwrap();

            assert_eq!(stdout, "-p cht -f a.yml -f b.yml up -d --remove-orphans\n");
        }

        #[tokio::test]
        async fn test_run_non_zero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let cli = scripted_cli(dir.path(), "echo progress\necho 'Rate exceeded' >&2\nexit 1\n");

            let err = cli.run(&paths(&["a.yml"]), &["pull"]).await.unwrap_err();

            match err {
                ComposeError::ExternalCommand { code, stderr } => {
                    assert_eq!(code, Some(1));
                    assert_eq!(stderr, "Rate exceeded\n");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_run_non_zero_exit_without_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let cli = scripted_cli(dir.path(), "exit 14\n");

            let err = cli.run(&paths(&["a.yml"]), &["config"]).await.unwrap_err();

            assert_eq!(err.to_string(), "Command exited with code 14");
        }

        #[tokio::test]
        async fn test_rate_limit_marker_kept_after_invalid_utf8_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let cli = scripted_cli(
                dir.path(),
                "printf 'progress \\377\\n' >&2\nsleep 0.2\necho 'toomanyrequests: Rate exceeded' >&2\nexit 1\n",
            );

            let err = cli.run(&paths(&["a.yml"]), &["pull"]).await.unwrap_err();

            assert!(matches!(err, ComposeError::ExternalCommand { code: Some(1), .. }), "{err:?}");
            assert!(crate::services::compose::is_rate_limited(&err));
        }
    }
}
