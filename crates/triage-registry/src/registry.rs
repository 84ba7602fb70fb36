//! 患者登记簿
//!
//! 患者集合的唯一属主: 挂号、活跃就诊查重与档案留存。
//! 登记簿与队列构建只读集合, 转换验证与路径记录是唯一写路径

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use triage_core::{
    utils, Patient, PatientStatus, RegistrationForm, Result, TriageError, TriageLevel,
};
use uuid::Uuid;

/// 患者登记簿
///
/// "一个身份证件同一时刻至多一次活跃就诊" 的不变量在这里强制,
/// 不依赖存储层; 票号按自然日 (UTC) 递增, 换日自动归零
#[derive(Debug)]
pub struct PatientRegistry {
    patients: HashMap<Uuid, Patient>,
    /// 身份证件 -> 永久病案号, 跨就诊复用
    mrn_by_identity: HashMap<String, String>,
    ticket_day: NaiveDate,
    ticket_seq: u32,
    /// 快速检索返回上限, 见 `lookup::DEFAULT_QUICK_SEARCH_CAP`
    pub(crate) quick_search_cap: usize,
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::with_quick_search_cap(crate::lookup::DEFAULT_QUICK_SEARCH_CAP)
    }

    /// 指定快速检索上限 (来自 lookup.quick_search_cap 配置)
    pub fn with_quick_search_cap(cap: usize) -> Self {
        Self {
            patients: HashMap::new(),
            mrn_by_identity: HashMap::new(),
            ticket_day: Utc::now().date_naive(),
            ticket_seq: 0,
            quick_search_cap: cap,
        }
    }

    /// 挂号登记
    ///
    /// 同一身份证件存在活跃就诊时拒绝; 老病人复用既有 MRN,
    /// 新病人分配新 MRN; 票号当日内顺序且唯一
    pub fn register(&mut self, form: RegistrationForm) -> Result<Patient> {
        form.validate()?;

        if let Some(existing) = self.find_active_episode(&form.national_id) {
            return Err(TriageError::DuplicateActiveEpisode {
                mrn: existing.mrn.clone(),
                ticket: existing.ticket.clone(),
                status: existing.status.to_string(),
            });
        }

        let mrn = self
            .mrn_by_identity
            .get(&form.national_id)
            .cloned()
            .unwrap_or_else(utils::generate_mrn);
        let ticket = self.next_ticket();

        let patient = Patient::register(form, mrn.clone(), ticket)?;
        self.mrn_by_identity
            .insert(patient.national_id.clone(), mrn);
        self.patients.insert(patient.id, patient.clone());

        tracing::info!(
            "Registered patient {} ({}) with ticket {}",
            patient.mrn,
            patient.name,
            patient.ticket
        );
        Ok(patient)
    }

    /// 按身份证件查找活跃就诊 (状态不在 {DISCHARGED, STABILIZED_HOME})
    pub fn find_active_episode(&self, national_id: &str) -> Option<&Patient> {
        self.patients
            .values()
            .find(|p| p.national_id == national_id && p.status.is_active_episode())
    }

    pub fn get(&self, id: Uuid) -> Option<&Patient> {
        self.patients.get(&id)
    }

    /// 写路径入口: 单写者语义由调用方保证
    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Patient> {
        self.patients.get_mut(&id)
    }

    /// 全量快照, 供队列派生使用; 快照可能随即被后续写入取代
    pub fn snapshot(&self) -> Vec<Patient> {
        let mut patients: Vec<Patient> = self.patients.values().cloned().collect();
        // 登记顺序即遍历顺序
        patients.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.mrn.cmp(&b.mrn)));
        patients
    }

    /// 按登记先后遍历 (HashMap 本身无序, 对外保持确定顺序)
    pub fn iter_in_registration_order(&self) -> Vec<&Patient> {
        let mut patients: Vec<&Patient> = self.patients.values().collect();
        patients.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.mrn.cmp(&b.mrn)));
        patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// 获取登记簿统计
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            total_patients: self.patients.len(),
            ..Default::default()
        };

        for patient in self.patients.values() {
            match patient.status {
                PatientStatus::Registered => stats.registered += 1,
                PatientStatus::PhysicianQueue => stats.physician_queue += 1,
                PatientStatus::ErQueue => stats.er_queue += 1,
                PatientStatus::Admitted => stats.admitted += 1,
                PatientStatus::Discharged => stats.discharged += 1,
                PatientStatus::StabilizedHome => stats.stabilized_home += 1,
            }
            if let Some(level) = patient.triage_level {
                *stats.by_level.entry(level).or_insert(0) += 1;
            }
        }

        stats
    }

    fn next_ticket(&mut self) -> String {
        let today = Utc::now().date_naive();
        if today != self.ticket_day {
            self.ticket_day = today;
            self.ticket_seq = 0;
        }
        self.ticket_seq += 1;
        utils::format_ticket(self.ticket_seq)
    }
}

impl Default for PatientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// 登记簿统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_patients: usize,
    pub registered: usize,
    pub physician_queue: usize,
    pub er_queue: usize,
    pub admitted: usize,
    pub discharged: usize,
    pub stabilized_home: usize,
    pub by_level: HashMap<TriageLevel, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{ReferralSource, Sex, Vitals};

    fn form(national_id: &str, name: &str) -> RegistrationForm {
        RegistrationForm {
            national_id: national_id.to_string(),
            name: name.to_string(),
            age: 35,
            sex: Sex::Male,
            pregnant: false,
            phone: Some("13700001111".to_string()),
            chief_complaint: "Cough".to_string(),
            vitals: Vitals::new("118/76", "72", "36.6", "99"),
            referral_source: ReferralSource::WalkIn,
            screening: Vec::new(),
        }
    }

    #[test]
    fn test_sequential_daily_tickets() {
        let mut registry = PatientRegistry::new();

        let first = registry.register(form("id-1", "One")).unwrap();
        let second = registry.register(form("id-2", "Two")).unwrap();

        assert_eq!(first.ticket, "Q-001");
        assert_eq!(second.ticket, "Q-002");
    }

    #[test]
    fn test_duplicate_active_episode_rejected() {
        let mut registry = PatientRegistry::new();
        let first = registry.register(form("id-1", "One")).unwrap();

        // 第一次就诊仍活跃 (REGISTERED), 二次挂号被拒
        let duplicate = registry.register(form("id-1", "One"));
        assert!(matches!(
            duplicate,
            Err(TriageError::DuplicateActiveEpisode { .. })
        ));

        // 就诊结束后, 同一身份可以开启新就诊, 并复用同一 MRN
        registry.get_mut(first.id).unwrap().status = PatientStatus::Discharged;
        let reopened = registry.register(form("id-1", "One")).unwrap();
        assert_eq!(reopened.mrn, first.mrn);
        assert_ne!(reopened.id, first.id);
    }

    #[test]
    fn test_admitted_patient_still_blocks_new_episode() {
        let mut registry = PatientRegistry::new();
        let first = registry.register(form("id-1", "One")).unwrap();
        registry.get_mut(first.id).unwrap().status = PatientStatus::Admitted;

        assert!(registry.register(form("id-1", "One")).is_err());
    }

    #[test]
    fn test_find_active_episode() {
        let mut registry = PatientRegistry::new();
        let patient = registry.register(form("id-9", "Nine")).unwrap();

        assert!(registry.find_active_episode("id-9").is_some());
        assert!(registry.find_active_episode("id-8").is_none());

        registry.get_mut(patient.id).unwrap().status = PatientStatus::StabilizedHome;
        assert!(registry.find_active_episode("id-9").is_none());
    }

    #[test]
    fn test_stats() {
        let mut registry = PatientRegistry::new();
        let a = registry.register(form("id-1", "One")).unwrap();
        registry.register(form("id-2", "Two")).unwrap();

        let patient = registry.get_mut(a.id).unwrap();
        patient.status = PatientStatus::PhysicianQueue;
        patient.triage_level = Some(TriageLevel::Green);

        let stats = registry.stats();
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.registered, 1);
        assert_eq!(stats.physician_queue, 1);
        assert_eq!(stats.by_level.get(&TriageLevel::Green), Some(&1));
    }
}
