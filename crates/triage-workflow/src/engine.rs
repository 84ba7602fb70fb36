//! 分诊工作流引擎
//!
//! 协调状态机、路径记录器与外部协作方的核心引擎

use serde::{Deserialize, Serialize};
use triage_core::{
    ActorRole, FollowUp, Patient, PatientStatus, Result, TriageError, TriageLevel,
};

use crate::{
    classifier::{Classification, NarrativeGenerator, RequestTracker, TriageClassifier},
    pathway::PathwayRecorder,
    state_machine::{PathwayStateMachine, TransitionRequest},
};

/// 分诊工作流引擎
///
/// 转换验证与路径落账的唯一写入路径; 假定调用方保证单写者语义
#[derive(Debug)]
pub struct TriageEngine {
    state_machine: PathwayStateMachine,
    recorder: PathwayRecorder,
    classification_requests: RequestTracker,
    narrative_requests: RequestTracker,
}

impl TriageEngine {
    pub fn new() -> Self {
        Self {
            state_machine: PathwayStateMachine::new(),
            recorder: PathwayRecorder::new(),
            classification_requests: RequestTracker::new(),
            narrative_requests: RequestTracker::new(),
        }
    }

    /// 入院记录必填开关见 `PathwayStateMachine`
    pub fn with_admission_notes_required(require: bool) -> Self {
        Self {
            state_machine: PathwayStateMachine::with_admission_notes_required(require),
            recorder: PathwayRecorder::new(),
            classification_requests: RequestTracker::new(),
            narrative_requests: RequestTracker::new(),
        }
    }

    /// 请求状态转换
    ///
    /// 验证全部通过后, 状态、分级副作用、随访安排与路径记录作为
    /// 一个整体落账; 验证失败时患者记录保持原样, 不追加任何记录
    pub fn request_transition(
        &self,
        patient: &mut Patient,
        request: TransitionRequest,
        actor: ActorRole,
    ) -> Result<PatientStatus> {
        let plan = self.state_machine.plan(patient, &request)?;
        let from = patient.status;

        // 此后全部为不可失败的字段写入
        let timestamp = self.recorder.record(patient, &plan, actor);
        patient.status = plan.target;
        if let Some(level) = plan.forced_level {
            patient.triage_level = Some(level);
        }
        if let Some(follow_up) = plan.follow_up {
            patient.follow_up = Some(FollowUp {
                day_offset: follow_up.days(),
                scheduled_at: timestamp,
            });
        }
        if let Some(notes) = plan.notes {
            patient.notes = match patient.notes.take() {
                Some(existing) => Some(format!("{}\n{}", existing, notes)),
                None => Some(notes),
            };
        }
        patient.updated_at = timestamp;

        tracing::info!(
            "Transition {} applied for {}: {} -> {}",
            request.name(),
            patient.mrn,
            from,
            patient.status
        );
        Ok(patient.status)
    }

    /// 发起一次外部分级并应用结果
    pub async fn classify_patient(
        &mut self,
        patient: &mut Patient,
        classifier: &dyn TriageClassifier,
    ) -> Result<Option<TriageLevel>> {
        let request_id = self.classification_requests.begin(patient.id);
        let outcome = classifier
            .classify(&patient.chief_complaint, &patient.vitals)
            .await;
        self.apply_classification(patient, request_id, outcome)
    }

    /// 应用分级结果
    ///
    /// 仅 REGISTERED 状态接受分级 (入队后的分级变更只能经升降级转换);
    /// 过期结果直接丢弃并返回 Ok(None); 分级器失败不得默认 GREEN,
    /// 相关字段保持未设置并把失败上抛给调用方
    pub fn apply_classification(
        &mut self,
        patient: &mut Patient,
        request_id: u64,
        outcome: Result<Classification>,
    ) -> Result<Option<TriageLevel>> {
        if !self
            .classification_requests
            .is_current(patient.id, request_id)
        {
            tracing::warn!(
                "Discarding stale classification result for {} (request {})",
                patient.mrn,
                request_id
            );
            return Ok(None);
        }
        if patient.status != PatientStatus::Registered {
            return Err(TriageError::Validation(format!(
                "Classification only applies in REGISTERED status, patient is {}",
                patient.status
            )));
        }

        let classification = outcome.map_err(|e| {
            tracing::warn!("Classifier failed for {}: {}", patient.mrn, e);
            TriageError::Collaborator(format!("Classification failed: {}", e))
        })?;

        patient.triage_level = Some(classification.level);
        patient.ai_justification = Some(classification.justification);
        patient.updated_at = chrono::Utc::now();

        tracing::info!(
            "Patient {} classified as {}",
            patient.mrn,
            classification.level
        );
        Ok(Some(classification.level))
    }

    /// 发起一次叙述摘要生成并应用结果
    pub async fn summarize_patient(
        &mut self,
        patient: &mut Patient,
        generator: &dyn NarrativeGenerator,
    ) -> Result<bool> {
        let request_id = self.narrative_requests.begin(patient.id);
        let outcome = generator.summarize(patient).await;
        self.apply_summary(patient, request_id, outcome)
    }

    /// 应用叙述摘要, 纯咨询字段, 失败时保持未设置
    pub fn apply_summary(
        &mut self,
        patient: &mut Patient,
        request_id: u64,
        outcome: Result<String>,
    ) -> Result<bool> {
        if !self.narrative_requests.is_current(patient.id, request_id) {
            tracing::warn!(
                "Discarding stale narrative result for {} (request {})",
                patient.mrn,
                request_id
            );
            return Ok(false);
        }

        let summary = outcome.map_err(|e| {
            tracing::warn!("Narrative generator failed for {}: {}", patient.mrn, e);
            TriageError::Collaborator(format!("Narrative generation failed: {}", e))
        })?;

        patient.ai_summary = Some(summary);
        Ok(true)
    }

    /// 获取系统概览
    pub fn overview(&self, patients: &[Patient]) -> TriageOverview {
        let mut overview = TriageOverview::default();
        for patient in patients {
            match patient.status {
                PatientStatus::Registered => overview.awaiting_triage += 1,
                PatientStatus::PhysicianQueue => overview.physician_waiting += 1,
                PatientStatus::ErQueue => overview.emergency_waiting += 1,
                _ => overview.concluded_episodes += 1,
            }
            if patient.triage_level == Some(TriageLevel::Red)
                && patient.status.is_active_episode()
                && !patient.status.is_terminal()
            {
                overview.active_red_cases += 1;
            }
        }
        overview
    }
}

impl Default for TriageEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 系统概览
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageOverview {
    pub awaiting_triage: usize,
    pub physician_waiting: usize,
    pub emergency_waiting: usize,
    pub active_red_cases: usize,
    pub concluded_episodes: usize,
}
