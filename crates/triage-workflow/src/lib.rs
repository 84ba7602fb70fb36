//! # 分诊工作流模块
//!
//! 提供患者路径管理的核心功能，包括：
//! - 路径状态机：验证从挂号到最终去向的每次状态转换
//! - 路径记录器：为每次转换追加一条不可变的审计记录
//! - 队列构建：按紧急程度与弱势加权派生门诊/急诊候诊队列
//! - 外部协作方：异步分级器与叙述生成器的边界契约

pub mod classifier;
pub mod engine;
pub mod pathway;
pub mod queue;
pub mod state_machine;

// 重新导出主要类型
pub use classifier::{Classification, NarrativeGenerator, RequestTracker, TriageClassifier};
pub use engine::{TriageEngine, TriageOverview};
pub use pathway::PathwayRecorder;
pub use queue::{build_emergency_queue, build_physician_queue};
pub use state_machine::{PathwayStateMachine, TransitionPlan, TransitionRequest};
