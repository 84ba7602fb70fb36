//! # 分诊系统管理模块
//!
//! 提供配置管理功能: 文件与环境变量叠加、验证与热重载。

pub mod config;

// 重新导出主要类型
pub use config::{ConfigManager, LookupConfig, ServiceConfig, TriageConfig, WorkflowConfig};
