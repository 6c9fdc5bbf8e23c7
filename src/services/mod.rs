//! 服务层模块
//!
//! 包含核心业务逻辑

pub mod backup;
pub mod compose;
pub mod orchestrator;
pub mod store;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
