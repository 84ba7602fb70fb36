//! 核心数据模型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TriageError};
use crate::utils;

/// 老年患者年龄阈值（用于候诊队列弱势加权）
pub const ELDERLY_AGE: u32 = 75;

/// 分诊紧急程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TriageLevel {
    Red,    // 急救
    Orange, // 紧急
    Green,  // 平稳
}

impl TriageLevel {
    /// 队列排序权重, 数值越小越靠前
    pub fn rank(&self) -> u8 {
        match self {
            TriageLevel::Red => 0,
            TriageLevel::Orange => 1,
            TriageLevel::Green => 2,
        }
    }
}

impl std::fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriageLevel::Red => write!(f, "RED"),
            TriageLevel::Orange => write!(f, "ORANGE"),
            TriageLevel::Green => write!(f, "GREEN"),
        }
    }
}

/// 患者路径状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PatientStatus {
    Registered,     // 已挂号
    PhysicianQueue, // 门诊候诊
    ErQueue,        // 急诊候诊
    Admitted,       // 收治入院
    Discharged,     // 已离院
    StabilizedHome, // 稳定回家
}

impl PatientStatus {
    /// 终态: 本次就诊不再发生自动状态转换
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PatientStatus::Admitted | PatientStatus::Discharged | PatientStatus::StabilizedHome
        )
    }

    /// 活跃就诊: 阻止同一身份证件重复挂号
    /// (收治入院虽为终态, 但住院期间仍视为活跃就诊)
    pub fn is_active_episode(&self) -> bool {
        !matches!(
            self,
            PatientStatus::Discharged | PatientStatus::StabilizedHome
        )
    }
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatientStatus::Registered => write!(f, "REGISTERED"),
            PatientStatus::PhysicianQueue => write!(f, "PHYSICIAN_QUEUE"),
            PatientStatus::ErQueue => write!(f, "ER_QUEUE"),
            PatientStatus::Admitted => write!(f, "ADMITTED"),
            PatientStatus::Discharged => write!(f, "DISCHARGED"),
            PatientStatus::StabilizedHome => write!(f, "STABILIZED_HOME"),
        }
    }
}

/// 操作角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ActorRole {
    Nurse,       // 分诊护士
    Physician,   // 门诊医生
    ErPhysician, // 急诊医生
    System,      // 系统自动
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Nurse => write!(f, "nurse"),
            ActorRole::Physician => write!(f, "physician"),
            ActorRole::ErPhysician => write!(f, "er-physician"),
            ActorRole::System => write!(f, "system"),
        }
    }
}

/// 就诊来源渠道
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReferralSource {
    WalkIn,    // 自行前来
    Ambulance, // 救护车转运
    Referral,  // 其他机构转诊
    Transfer,  // 院内转科
}

/// 性别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

/// 生命体征快照
///
/// 四个字段均为字符串编码的测量值, 登记时整体覆盖, 不做字段级合并
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vitals {
    pub bp: String,   // 血压, 如 "120/80"
    pub hr: String,   // 心率
    pub temp: String, // 体温
    pub spo2: String, // 血氧饱和度
}

impl Vitals {
    pub fn new(bp: &str, hr: &str, temp: &str, spo2: &str) -> Self {
        Self {
            bp: bp.to_string(),
            hr: hr.to_string(),
            temp: temp.to_string(),
            spo2: spo2.to_string(),
        }
    }

    /// 结构验证: 已填写的字段必须是合法数值
    /// (渐进式录入允许空字段, 发起状态转换时由调用方保证完整)
    pub fn validate(&self) -> Result<()> {
        if !utils::is_well_formed_bp(&self.bp) {
            return Err(TriageError::Validation(format!(
                "Malformed blood pressure value: {}",
                self.bp
            )));
        }
        for (field, value) in [("hr", &self.hr), ("temp", &self.temp), ("spo2", &self.spo2)] {
            if !utils::is_well_formed_measurement(value) {
                return Err(TriageError::Validation(format!(
                    "Malformed {} value: {}",
                    field, value
                )));
            }
        }
        Ok(())
    }

    /// 四个字段是否均已填写
    pub fn is_complete(&self) -> bool {
        !self.bp.trim().is_empty()
            && !self.hr.trim().is_empty()
            && !self.temp.trim().is_empty()
            && !self.spo2.trim().is_empty()
    }
}

/// 路径审计记录
///
/// 每次状态转换恰好产生一条, 创建后不可修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathwayStep {
    pub status: PatientStatus,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub actor: ActorRole,
}

/// 随访计划输入
///
/// 预设 2/7/14/30 天, 或自定义正整数天数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowUpPlan {
    days: u32,
}

impl FollowUpPlan {
    pub const PRESET_DAYS: [u32; 4] = [2, 7, 14, 30];

    /// 选择预设随访天数
    pub fn preset(days: u32) -> Result<Self> {
        Self::preset_from(days, &Self::PRESET_DAYS)
    }

    /// 按部署配置的预设列表选择随访天数 (workflow.follow_up_presets)
    pub fn preset_from(days: u32, presets: &[u32]) -> Result<Self> {
        if days == 0 {
            return Err(TriageError::Validation(
                "Follow-up interval must be a positive number of days".to_string(),
            ));
        }
        if presets.contains(&days) {
            Ok(Self { days })
        } else {
            Err(TriageError::Validation(format!(
                "{} is not a preset follow-up interval (allowed: {:?})",
                days, presets
            )))
        }
    }

    /// 自定义随访天数, 必须为正
    pub fn custom(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(TriageError::Validation(
                "Follow-up interval must be a positive number of days".to_string(),
            ));
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }
}

/// 已登记的随访安排
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub day_offset: u32,
    pub scheduled_at: DateTime<Utc>,
}

/// 问诊筛查问答
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningAnswer {
    pub question: String,
    pub answer: String,
}

/// 挂号登记表单
///
/// 由外部录入层收集, 进入核心前做结构验证
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub national_id: String,
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub pregnant: bool,
    pub phone: Option<String>,
    pub chief_complaint: String,
    pub vitals: Vitals,
    pub referral_source: ReferralSource,
    pub screening: Vec<ScreeningAnswer>,
}

impl RegistrationForm {
    /// 结构验证: 身份证件与姓名必填, 孕期标记仅对女性有效
    pub fn validate(&self) -> Result<()> {
        if self.national_id.trim().is_empty() {
            return Err(TriageError::Validation(
                "National identifier is required".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(TriageError::Validation("Patient name is required".to_string()));
        }
        if self.pregnant && self.sex != Sex::Female {
            return Err(TriageError::Validation(
                "Pregnancy flag is only defined for female patients".to_string(),
            ));
        }
        self.vitals.validate()
    }
}

/// 患者记录
///
/// 每次就诊一条, MRN 跨就诊保持不变; pathway 仅追加, 从不重排或截断
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub mrn: String,         // 病案号, 分配后不可变
    pub national_id: String, // 身份证件号
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub pregnant: bool,
    pub phone: Option<String>,
    pub ticket: String, // 当日票号, 如 "Q-007"
    pub chief_complaint: String,
    pub vitals: Vitals,
    pub triage_level: Option<TriageLevel>, // 仅 REGISTERED 状态允许为空
    pub status: PatientStatus,
    pub referral_source: ReferralSource,
    pub notes: Option<String>,            // 医生自由文本记录
    pub ai_justification: Option<String>, // 外部分级器给出的理由
    pub ai_summary: Option<String>,       // 外部叙述生成器的摘要
    pub screening: Vec<ScreeningAnswer>,
    pub follow_up: Option<FollowUp>,
    pub pathway: Vec<PathwayStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// 由登记表单创建新就诊记录
    ///
    /// 初始状态为 REGISTERED, 路径含且仅含登记一条记录
    pub fn register(form: RegistrationForm, mrn: String, ticket: String) -> Result<Self> {
        form.validate()?;
        if mrn.trim().is_empty() {
            return Err(TriageError::Validation("MRN is required".to_string()));
        }

        let now = Utc::now();
        let registration_step = PathwayStep {
            status: PatientStatus::Registered,
            description: format!("Registered at intake desk, ticket {}", ticket),
            timestamp: now,
            actor: ActorRole::Nurse,
        };

        Ok(Self {
            id: Uuid::new_v4(),
            mrn,
            national_id: form.national_id,
            name: form.name,
            age: form.age,
            sex: form.sex,
            pregnant: form.pregnant,
            phone: form.phone,
            ticket,
            chief_complaint: form.chief_complaint,
            vitals: form.vitals,
            triage_level: None,
            status: PatientStatus::Registered,
            referral_source: form.referral_source,
            notes: None,
            ai_justification: None,
            ai_summary: None,
            screening: form.screening,
            follow_up: None,
            pathway: vec![registration_step],
            created_at: now,
            updated_at: now,
        })
    }

    /// 是否达到老年弱势阈值
    pub fn is_elderly(&self) -> bool {
        self.age >= ELDERLY_AGE
    }

    /// 最近一条路径记录
    pub fn last_step(&self) -> Option<&PathwayStep> {
        self.pathway.last()
    }

    /// 追加筛查问答 (仅追加, 不覆盖既有条目)
    pub fn append_screening(&mut self, answers: Vec<ScreeningAnswer>) {
        self.screening.extend(answers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_form() -> RegistrationForm {
        RegistrationForm {
            national_id: "110101199001011234".to_string(),
            name: "Zhang Wei".to_string(),
            age: 42,
            sex: Sex::Male,
            pregnant: false,
            phone: Some("13800138000".to_string()),
            chief_complaint: "Chest tightness".to_string(),
            vitals: Vitals::new("120/80", "76", "36.8", "98"),
            referral_source: ReferralSource::WalkIn,
            screening: Vec::new(),
        }
    }

    #[test]
    fn test_register_creates_initial_pathway() {
        let patient =
            Patient::register(sample_form(), "MRN-1".to_string(), "Q-001".to_string()).unwrap();

        assert_eq!(patient.status, PatientStatus::Registered);
        assert_eq!(patient.pathway.len(), 1);
        assert_eq!(patient.pathway[0].status, PatientStatus::Registered);
        assert!(patient.triage_level.is_none());
    }

    #[test]
    fn test_register_rejects_missing_identity() {
        let mut form = sample_form();
        form.national_id = "".to_string();

        let result = Patient::register(form, "MRN-1".to_string(), "Q-001".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_pregnancy_flag_requires_female() {
        let mut form = sample_form();
        form.pregnant = true;

        let result = Patient::register(form, "MRN-1".to_string(), "Q-001".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_vitals_validation() {
        assert!(Vitals::new("120/80", "76", "36.8", "98").validate().is_ok());
        assert!(Vitals::new("", "", "", "").validate().is_ok()); // 渐进式录入允许空字段
        assert!(Vitals::new("120/80", "fast", "36.8", "98").validate().is_err());
        assert!(Vitals::new("high", "76", "36.8", "98").validate().is_err());
    }

    #[test]
    fn test_follow_up_plan() {
        assert!(FollowUpPlan::preset(7).is_ok());
        assert!(FollowUpPlan::preset(9).is_err());
        assert_eq!(FollowUpPlan::custom(45).unwrap().days(), 45);
        assert!(FollowUpPlan::custom(0).is_err());
    }

    #[test]
    fn test_follow_up_presets_configurable() {
        // 部署方可以缩减或替换预设列表, 默认列表不再是唯一来源
        assert_eq!(FollowUpPlan::preset_from(3, &[3, 10]).unwrap().days(), 3);
        assert!(FollowUpPlan::preset_from(7, &[3, 10]).is_err());
        assert!(FollowUpPlan::preset_from(0, &[0]).is_err());
        // 缺省入口仍按内置列表
        assert!(FollowUpPlan::preset(3).is_err());
    }

    #[test]
    fn test_screening_append_only() {
        let mut patient =
            Patient::register(sample_form(), "MRN-1".to_string(), "Q-001".to_string()).unwrap();
        patient.append_screening(vec![ScreeningAnswer {
            question: "Any allergies?".to_string(),
            answer: "None".to_string(),
        }]);
        patient.append_screening(vec![ScreeningAnswer {
            question: "Current medication?".to_string(),
            answer: "Aspirin".to_string(),
        }]);

        assert_eq!(patient.screening.len(), 2);
        assert_eq!(patient.screening[0].question, "Any allergies?");
    }

    #[test]
    fn test_status_classification() {
        assert!(PatientStatus::Admitted.is_terminal());
        assert!(PatientStatus::Admitted.is_active_episode());
        assert!(!PatientStatus::Discharged.is_active_episode());
        assert!(!PatientStatus::PhysicianQueue.is_terminal());
        assert!(PatientStatus::PhysicianQueue.is_active_episode());
    }
}
