//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod compose;

pub use compose::{FileResult, OkResponse, UpdateMode, UpdateRequest, UpdateResponse};
