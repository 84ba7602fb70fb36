//! # 患者登记与检索模块
//!
//! 患者集合的属主与只读检索入口，包括：
//! - 挂号登记：当日票号分配、MRN 复用与活跃就诊查重
//! - 票号叫号查询：容错输入与 "已处理" 状态报告
//! - 档案检索：自由文本匹配, 精确证件/病案号命中优先

pub mod lookup;
pub mod registry;

// 重新导出主要类型
pub use lookup::DEFAULT_QUICK_SEARCH_CAP;
pub use registry::{PatientRegistry, RegistryStats};
