//! 错误定义模块

use thiserror::Error;

/// 分诊系统统一错误类型
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("无效状态转换: 从 {from} 到 {to}")]
    InvalidTransition { from: String, to: String },

    #[error("该身份证件已存在活跃就诊: MRN {mrn}, 票号 {ticket}, 当前状态 {status}")]
    DuplicateActiveEpisode {
        mrn: String,
        ticket: String,
        status: String,
    },

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("票号 {ticket} 已处理完毕, 当前状态 {status}")]
    AlreadyProcessed { ticket: String, status: String },

    #[error("外部协作方失败: {0}")]
    Collaborator(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 分诊系统统一结果类型
pub type Result<T> = std::result::Result<T, TriageError>;
