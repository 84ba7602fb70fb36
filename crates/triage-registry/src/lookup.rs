//! 票号与档案检索
//!
//! 快速叫号查询与档案自由文本检索, 均为只读操作

use triage_core::{utils, Patient, PatientStatus, Result, TriageError};

use crate::registry::PatientRegistry;

/// 快速检索默认返回上限
pub const DEFAULT_QUICK_SEARCH_CAP: usize = 5;

impl PatientRegistry {
    /// 按票号查找待叫号患者
    ///
    /// 输入大小写不敏感, 可省略 "Q-" 前缀: "7" 可命中 "Q-007"。
    /// 命中但已离开 REGISTERED 状态时报告 "已处理" 并附当前状态,
    /// 而不是笼统的未找到
    pub fn lookup_by_ticket(&self, raw: &str) -> Result<&Patient> {
        if utils::normalize_ticket(raw).is_empty() {
            return Err(TriageError::Validation(
                "Ticket query must not be empty".to_string(),
            ));
        }

        // 票号仅当日唯一, 跨日重复时取最近一次登记
        let matched = self
            .iter_in_registration_order()
            .into_iter()
            .filter(|p| utils::ticket_matches(&p.ticket, raw))
            .last();

        match matched {
            None => Err(TriageError::NotFound(format!(
                "No patient found for ticket {}",
                raw.trim()
            ))),
            Some(patient) if patient.status != PatientStatus::Registered => {
                Err(TriageError::AlreadyProcessed {
                    ticket: patient.ticket.clone(),
                    status: patient.status.to_string(),
                })
            }
            Some(patient) => Ok(patient),
        }
    }

    /// 档案自由文本检索, 不限制返回数量
    pub fn search_archive(&self, query: &str) -> Vec<&Patient> {
        self.search(query, None)
    }

    /// 快速检索, 返回数量封顶 (默认 5 条, 上限可经配置调整)
    pub fn quick_search(&self, query: &str) -> Vec<&Patient> {
        self.search(query, Some(self.quick_search_cap))
    }

    /// 自由文本检索
    ///
    /// 命中条件: 姓名子串、身份证件精确或子串、MRN 精确或子串、电话子串;
    /// 身份证件/MRN 精确命中排最前, 其余保持登记先后顺序
    pub fn search(&self, query: &str, cap: Option<usize>) -> Vec<&Patient> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut exact = Vec::new();
        let mut partial = Vec::new();

        for patient in self.iter_in_registration_order() {
            if patient.national_id.to_lowercase() == needle
                || patient.mrn.to_lowercase() == needle
            {
                exact.push(patient);
            } else if matches_partial(patient, &needle) {
                partial.push(patient);
            }
        }

        let mut results = exact;
        results.extend(partial);
        if let Some(cap) = cap {
            results.truncate(cap);
        }
        results
    }
}

fn matches_partial(patient: &Patient, needle: &str) -> bool {
    patient.name.to_lowercase().contains(needle)
        || patient.national_id.to_lowercase().contains(needle)
        || patient.mrn.to_lowercase().contains(needle)
        || patient
            .phone
            .as_deref()
            .map(|phone| phone.contains(needle))
            .unwrap_or(false)
}
