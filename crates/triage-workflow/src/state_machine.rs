//! 患者路径状态机
//!
//! 管理一次就诊从挂号到最终去向的完整状态转换规则

use serde::{Deserialize, Serialize};
use triage_core::{
    FollowUpPlan, Patient, PatientStatus, Result, TriageError, TriageLevel,
};

/// 状态转换请求
///
/// 每种转换对应一个显式类型化的补丁, 必填字段由构造保证,
/// 不使用无类型的部分字段合并
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransitionRequest {
    /// 挂号后进入候诊队列, 目标队列由分级结果唯一决定, 不由调用方选择
    EnterQueue,
    /// 门诊升级急诊, 必须附医生记录
    Escalate { notes: String },
    /// 急诊降级回门诊, 必须附稳定化记录
    Deescalate { notes: String },
    /// 收治入院, 记录是否必填由配置决定
    Admit { notes: Option<String> },
    /// 离院, 可附随访安排
    Discharge { follow_up: Option<FollowUpPlan> },
    /// 稳定后回家
    StabilizeHome { notes: Option<String> },
}

impl TransitionRequest {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionRequest::EnterQueue => "enter-queue",
            TransitionRequest::Escalate { .. } => "escalate",
            TransitionRequest::Deescalate { .. } => "deescalate",
            TransitionRequest::Admit { .. } => "admit",
            TransitionRequest::Discharge { .. } => "discharge",
            TransitionRequest::StabilizeHome { .. } => "stabilize-home",
        }
    }
}

/// 通过验证的转换方案
///
/// 由状态机产出, 记录器与引擎按此一次性落账, 不再二次判断
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub target: PatientStatus,
    /// 转换副作用: 强制覆盖分级 (升级恒为 RED, 降级恒为 ORANGE)
    pub forced_level: Option<TriageLevel>,
    pub follow_up: Option<FollowUpPlan>,
    pub notes: Option<String>,
    pub description: String,
}

/// 患者路径状态机
///
/// REGISTERED -> {PHYSICIAN_QUEUE, ER_QUEUE} -> {ADMITTED, DISCHARGED,
/// STABILIZED_HOME, 队列间升降级}; 三个去向均为本次就诊的终态,
/// 任何状态都不允许回退到 REGISTERED
#[derive(Debug)]
pub struct PathwayStateMachine {
    require_admission_notes: bool,
}

impl PathwayStateMachine {
    pub fn new() -> Self {
        Self {
            require_admission_notes: false,
        }
    }

    /// 入院记录必填开关 (参考实现不强制, 这里做成可配置)
    pub fn with_admission_notes_required(require: bool) -> Self {
        Self {
            require_admission_notes: require,
        }
    }

    /// 检查转换是否合法
    pub fn can_transition(&self, patient: &Patient, request: &TransitionRequest) -> bool {
        self.plan(patient, request).is_ok()
    }

    /// 验证转换请求并产出转换方案
    ///
    /// 验证失败时不得落账任何路径记录, 患者记录保持原样
    pub fn plan(&self, patient: &Patient, request: &TransitionRequest) -> Result<TransitionPlan> {
        match request {
            TransitionRequest::EnterQueue => self.plan_enter_queue(patient),
            TransitionRequest::Escalate { notes } => self.plan_escalate(patient, notes),
            TransitionRequest::Deescalate { notes } => self.plan_deescalate(patient, notes),
            TransitionRequest::Admit { notes } => self.plan_admit(patient, notes.as_deref()),
            TransitionRequest::Discharge { follow_up } => self.plan_discharge(patient, *follow_up),
            TransitionRequest::StabilizeHome { notes } => {
                self.plan_stabilize_home(patient, notes.as_deref())
            }
        }
    }

    fn plan_enter_queue(&self, patient: &Patient) -> Result<TransitionPlan> {
        if patient.status != PatientStatus::Registered {
            return Err(invalid(patient, "queue entry"));
        }
        let level = patient.triage_level.ok_or_else(|| {
            TriageError::Validation(
                "Queue entry requires a triage level; classify the patient first".to_string(),
            )
        })?;

        // 队列归属由分级唯一决定: RED 进急诊, 其余进门诊
        let target = if level == TriageLevel::Red {
            PatientStatus::ErQueue
        } else {
            PatientStatus::PhysicianQueue
        };

        Ok(TransitionPlan {
            target,
            forced_level: None,
            follow_up: None,
            notes: None,
            description: format!("Triage complete ({}), entered {}", level, target),
        })
    }

    fn plan_escalate(&self, patient: &Patient, notes: &str) -> Result<TransitionPlan> {
        if patient.status != PatientStatus::PhysicianQueue {
            return Err(invalid(patient, "escalation to ER_QUEUE"));
        }
        let notes = required_notes(notes, "Escalation requires clinician notes")?;

        Ok(TransitionPlan {
            target: PatientStatus::ErQueue,
            // 升级一律按最坏情况处理, 无论此前分级如何
            forced_level: Some(TriageLevel::Red),
            follow_up: None,
            notes: Some(notes.clone()),
            description: format!("Escalated to emergency queue: {}", notes),
        })
    }

    fn plan_deescalate(&self, patient: &Patient, notes: &str) -> Result<TransitionPlan> {
        if patient.status != PatientStatus::ErQueue {
            return Err(invalid(patient, "de-escalation to PHYSICIAN_QUEUE"));
        }
        let notes = required_notes(notes, "De-escalation requires stabilization notes")?;

        Ok(TransitionPlan {
            target: PatientStatus::PhysicianQueue,
            // 降级后的急诊患者回到门诊不得按常规 GREEN 对待
            forced_level: Some(TriageLevel::Orange),
            follow_up: None,
            notes: Some(notes.clone()),
            description: format!("Stabilized, returned to physician queue: {}", notes),
        })
    }

    fn plan_admit(&self, patient: &Patient, notes: Option<&str>) -> Result<TransitionPlan> {
        if !in_queue(patient) {
            return Err(invalid(patient, "admission"));
        }
        let notes = match notes {
            Some(text) => Some(required_notes(text, "Admission requires clinician notes")?),
            None if self.require_admission_notes => {
                return Err(TriageError::Validation(
                    "Admission requires clinician notes".to_string(),
                ));
            }
            None => None,
        };

        let description = match &notes {
            Some(text) => format!("Admitted to inpatient ward: {}", text),
            None => "Admitted to inpatient ward".to_string(),
        };

        Ok(TransitionPlan {
            target: PatientStatus::Admitted,
            forced_level: None,
            follow_up: None,
            notes,
            description,
        })
    }

    fn plan_discharge(
        &self,
        patient: &Patient,
        follow_up: Option<FollowUpPlan>,
    ) -> Result<TransitionPlan> {
        if !in_queue(patient) {
            return Err(invalid(patient, "discharge"));
        }

        let description = match follow_up {
            Some(plan) => format!("Discharged with follow-up in {} days", plan.days()),
            None => "Discharged".to_string(),
        };

        Ok(TransitionPlan {
            target: PatientStatus::Discharged,
            forced_level: None,
            follow_up,
            notes: None,
            description,
        })
    }

    fn plan_stabilize_home(
        &self,
        patient: &Patient,
        notes: Option<&str>,
    ) -> Result<TransitionPlan> {
        if !in_queue(patient) {
            return Err(invalid(patient, "stabilized-home disposition"));
        }
        let notes = notes
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(|text| text.to_string());

        let description = match &notes {
            Some(text) => format!("Stabilized and sent home: {}", text),
            None => "Stabilized and sent home".to_string(),
        };

        Ok(TransitionPlan {
            target: PatientStatus::StabilizedHome,
            forced_level: None,
            follow_up: None,
            notes,
            description,
        })
    }
}

impl Default for PathwayStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn in_queue(patient: &Patient) -> bool {
    matches!(
        patient.status,
        PatientStatus::PhysicianQueue | PatientStatus::ErQueue
    )
}

fn invalid(patient: &Patient, attempted: &str) -> TriageError {
    TriageError::InvalidTransition {
        from: patient.status.to_string(),
        to: attempted.to_string(),
    }
}

fn required_notes(notes: &str, message: &str) -> Result<String> {
    let notes = notes.trim();
    if notes.is_empty() {
        return Err(TriageError::Validation(message.to_string()));
    }
    Ok(notes.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{ReferralSource, RegistrationForm, Sex, Vitals};

    fn patient_in(status: PatientStatus, level: Option<TriageLevel>) -> Patient {
        let form = RegistrationForm {
            national_id: "110101199001011234".to_string(),
            name: "Li Na".to_string(),
            age: 30,
            sex: Sex::Female,
            pregnant: false,
            phone: None,
            chief_complaint: "Abdominal pain".to_string(),
            vitals: Vitals::new("110/70", "82", "37.1", "99"),
            referral_source: ReferralSource::WalkIn,
            screening: Vec::new(),
        };
        let mut patient =
            Patient::register(form, "MRN-1".to_string(), "Q-001".to_string()).unwrap();
        patient.status = status;
        patient.triage_level = level;
        patient
    }

    #[test]
    fn test_queue_entry_requires_triage_level() {
        let sm = PathwayStateMachine::new();
        let patient = patient_in(PatientStatus::Registered, None);

        assert!(sm.plan(&patient, &TransitionRequest::EnterQueue).is_err());
    }

    #[test]
    fn test_queue_target_fixed_by_level() {
        let sm = PathwayStateMachine::new();

        let red = patient_in(PatientStatus::Registered, Some(TriageLevel::Red));
        let plan = sm.plan(&red, &TransitionRequest::EnterQueue).unwrap();
        assert_eq!(plan.target, PatientStatus::ErQueue);

        let orange = patient_in(PatientStatus::Registered, Some(TriageLevel::Orange));
        let plan = sm.plan(&orange, &TransitionRequest::EnterQueue).unwrap();
        assert_eq!(plan.target, PatientStatus::PhysicianQueue);

        let green = patient_in(PatientStatus::Registered, Some(TriageLevel::Green));
        let plan = sm.plan(&green, &TransitionRequest::EnterQueue).unwrap();
        assert_eq!(plan.target, PatientStatus::PhysicianQueue);
    }

    #[test]
    fn test_escalation_forces_red_and_requires_notes() {
        let sm = PathwayStateMachine::new();
        let patient = patient_in(PatientStatus::PhysicianQueue, Some(TriageLevel::Green));

        let rejected = sm.plan(
            &patient,
            &TransitionRequest::Escalate {
                notes: "   ".to_string(),
            },
        );
        assert!(rejected.is_err());

        let plan = sm
            .plan(
                &patient,
                &TransitionRequest::Escalate {
                    notes: "Sudden loss of consciousness".to_string(),
                },
            )
            .unwrap();
        assert_eq!(plan.target, PatientStatus::ErQueue);
        assert_eq!(plan.forced_level, Some(TriageLevel::Red));
    }

    #[test]
    fn test_deescalation_forces_orange() {
        let sm = PathwayStateMachine::new();
        let patient = patient_in(PatientStatus::ErQueue, Some(TriageLevel::Red));

        let plan = sm
            .plan(
                &patient,
                &TransitionRequest::Deescalate {
                    notes: "Vitals stable after fluids".to_string(),
                },
            )
            .unwrap();
        assert_eq!(plan.target, PatientStatus::PhysicianQueue);
        assert_eq!(plan.forced_level, Some(TriageLevel::Orange));
    }

    #[test]
    fn test_no_regression_to_registered() {
        let sm = PathwayStateMachine::new();
        // 离开 REGISTERED 后, 任何转换请求都不会再产出 REGISTERED 目标
        let patient = patient_in(PatientStatus::PhysicianQueue, Some(TriageLevel::Green));
        assert!(sm.plan(&patient, &TransitionRequest::EnterQueue).is_err());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let sm = PathwayStateMachine::new();
        for status in [
            PatientStatus::Admitted,
            PatientStatus::Discharged,
            PatientStatus::StabilizedHome,
        ] {
            let patient = patient_in(status, Some(TriageLevel::Green));
            assert!(sm
                .plan(&patient, &TransitionRequest::Admit { notes: None })
                .is_err());
            assert!(sm
                .plan(&patient, &TransitionRequest::Discharge { follow_up: None })
                .is_err());
        }
    }

    #[test]
    fn test_admission_notes_configurable() {
        let lenient = PathwayStateMachine::new();
        let strict = PathwayStateMachine::with_admission_notes_required(true);
        let patient = patient_in(PatientStatus::ErQueue, Some(TriageLevel::Red));

        assert!(lenient
            .plan(&patient, &TransitionRequest::Admit { notes: None })
            .is_ok());
        assert!(strict
            .plan(&patient, &TransitionRequest::Admit { notes: None })
            .is_err());
        assert!(strict
            .plan(
                &patient,
                &TransitionRequest::Admit {
                    notes: Some("Suspected appendicitis, surgery consult".to_string()),
                }
            )
            .is_ok());
    }

    #[test]
    fn test_discharge_carries_follow_up() {
        let sm = PathwayStateMachine::new();
        let patient = patient_in(PatientStatus::PhysicianQueue, Some(TriageLevel::Green));

        let plan = sm
            .plan(
                &patient,
                &TransitionRequest::Discharge {
                    follow_up: Some(FollowUpPlan::preset(7).unwrap()),
                },
            )
            .unwrap();
        assert_eq!(plan.target, PatientStatus::Discharged);
        assert_eq!(plan.follow_up.unwrap().days(), 7);
    }
}
