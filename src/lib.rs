//! Compose Upgrade Agent - compose 部署文件的安装、升级与启动
//!
//! 通过 HTTP 接收 compose 文件，校验、备份、写入、拉取镜像，然后统一 `up`

pub mod error;
pub mod infra;
pub mod domain;
pub mod config;
pub mod state;
pub mod api;
pub mod services;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::services::compose::{ComposeCli, ComposeRunner};
use crate::state::AppState;

/// 命令行提供的运行时配置
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// 覆盖监听端口
    pub port_override: Option<u16>,
}

/// 初始化日志
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 根据配置选择 compose CLI
pub async fn compose_cli(config: &EnvConfig) -> ComposeCli {
    let project_name = config.project_name.clone();
    match config
        .compose_cli
        .as_deref()
        .and_then(|line| ComposeCli::from_command_line(line, project_name.clone()))
    {
        Some(cli) => cli,
        None => ComposeCli::detect(project_name).await,
    }
}

/// 启动 Agent：加载配置、监听端口、后台执行一次 `start_up`
pub async fn run_agent(runtime: RuntimeConfig) -> anyhow::Result<()> {
    init_tracing();

    let mut config = EnvConfig::from_env();
    if let Some(port) = runtime.port_override {
        config.port = port;
    }

    let cli = compose_cli(&config).await;
    tracing::info!(program = cli.program(), "Using compose CLI");
    let runner: Arc<dyn ComposeRunner> = Arc::new(cli);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::new(config, runner));
    let app = api::router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, version = crate::config::env::constants::VERSION, "Listening");

    tokio::spawn(start_containers(state));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// 启动时拉起一次容器，失败只记录日志
async fn start_containers(state: Arc<AppState>) {
    let _guard = state.lock_operations().await;
    if let Err(e) = state.orchestrator.start_up().await {
        tracing::error!(error = %e, "Error while starting containers");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
