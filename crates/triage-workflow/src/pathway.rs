//! 路径审计记录器
//!
//! 每次通过验证的状态转换恰好追加一条路径记录, 既有记录从不修改或删除

use chrono::{DateTime, Utc};
use triage_core::{ActorRole, Patient, PathwayStep};

use crate::state_machine::TransitionPlan;

/// 路径记录器
///
/// 假定调用方保证同一患者同一时刻只有一个写入者 (单写者语义),
/// 记录器本身不做并发控制
#[derive(Debug, Default)]
pub struct PathwayRecorder;

impl PathwayRecorder {
    pub fn new() -> Self {
        Self
    }

    /// 追加一条路径记录, 返回所用时间戳
    ///
    /// 时间戳单调不减: 系统时钟回拨时夹取到上一条记录的时间
    pub fn record(
        &self,
        patient: &mut Patient,
        plan: &TransitionPlan,
        actor: ActorRole,
    ) -> DateTime<Utc> {
        let timestamp = self.next_timestamp(patient);

        patient.pathway.push(PathwayStep {
            status: plan.target,
            description: plan.description.clone(),
            timestamp,
            actor,
        });

        tracing::info!(
            "Pathway step recorded for {} ({} -> {}): {}",
            patient.mrn,
            patient.status,
            plan.target,
            plan.description
        );

        timestamp
    }

    fn next_timestamp(&self, patient: &Patient) -> DateTime<Utc> {
        let now = Utc::now();
        match patient.last_step() {
            Some(step) if step.timestamp > now => step.timestamp,
            _ => now,
        }
    }
}
