//! 配置管理
//!
//! 提供统一的配置管理功能, 支持文件与环境变量叠加及启动前验证

use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    /// 配置数据
    config: Arc<RwLock<TriageConfig>>,
    /// 配置文件路径
    config_path: String,
}

/// 分诊系统完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// 服务配置
    pub service: ServiceConfig,
    /// 工作流配置
    pub workflow: WorkflowConfig,
    /// 检索配置
    pub lookup: LookupConfig,
}

/// 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// 服务名称
    pub name: String,
    /// 日志级别
    pub log_level: String,
}

/// 工作流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// 入院是否必须附医生记录 (参考实现不强制)
    pub require_admission_notes: bool,
    /// 离院随访预设天数
    pub follow_up_presets: Vec<u32>,
}

/// 检索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// 快速检索返回上限
    pub quick_search_cap: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            workflow: WorkflowConfig::default(),
            lookup: LookupConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "clinic-triage".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_admission_notes: false,
            follow_up_presets: vec![2, 7, 14, 30],
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            quick_search_cap: 5,
        }
    }
}

impl TriageConfig {
    /// 配置验证
    pub fn validate(&self) -> Result<()> {
        if self.lookup.quick_search_cap == 0 {
            anyhow::bail!("lookup.quick_search_cap must be at least 1");
        }
        if self.workflow.follow_up_presets.is_empty() {
            anyhow::bail!("workflow.follow_up_presets must not be empty");
        }
        if self.workflow.follow_up_presets.iter().any(|&d| d == 0) {
            anyhow::bail!("workflow.follow_up_presets entries must be positive");
        }
        Ok(())
    }
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new(config_path: &str) -> Result<Self> {
        let config = Self::load_config(config_path)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path: config_path.to_string(),
        })
    }

    /// 从文件与环境变量加载配置
    ///
    /// 配置文件可缺省, 环境变量以 TRIAGE_ 前缀覆盖, 如
    /// TRIAGE_WORKFLOW__REQUIRE_ADMISSION_NOTES=true
    fn load_config(config_path: &str) -> Result<TriageConfig> {
        let settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("TRIAGE").separator("__"))
            .build()?;

        let config: TriageConfig = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;

        info!("Configuration loaded successfully from: {}", config_path);
        Ok(config)
    }

    /// 获取配置
    pub async fn get_config(&self) -> TriageConfig {
        let config = self.config.read().await;
        config.clone()
    }

    /// 重新加载配置
    pub async fn reload_config(&self) -> Result<()> {
        let new_config = Self::load_config(&self.config_path)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded");
        Ok(())
    }
}
