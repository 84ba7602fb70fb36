//! 候诊队列构建
//!
//! 队列不落盘, 每次读取都从患者集合全量重算; 输入不变则输出顺序必然一致

use std::cmp::Ordering;

use triage_core::{Patient, PatientStatus, TriageLevel};

/// 构建门诊候诊队列
///
/// 排序规则:
/// 1. 分级优先, ORANGE 恒在 GREEN 之前
/// 2. 仅在 GREEN 层内: 75 岁以上优先, 其次孕期优先
/// 3. 其余并列 (含 ORANGE 之间) 按进入队列时间先来先服务
///
/// 弱势加权有意只作用于 GREEN 层: ORANGE 始终严格领先 GREEN,
/// 弱势但平稳的患者只在同为平稳患者时获得提前
pub fn build_physician_queue(patients: &[Patient]) -> Vec<Patient> {
    let mut queue: Vec<&Patient> = patients
        .iter()
        .filter(|p| p.status == PatientStatus::PhysicianQueue)
        .collect();

    queue.sort_by(|a, b| physician_order(a, b));
    queue.into_iter().cloned().collect()
}

/// 构建急诊候诊队列
///
/// RED 恒在非 RED 之前, 并列按进入队列时间先来先服务
pub fn build_emergency_queue(patients: &[Patient]) -> Vec<Patient> {
    let mut queue: Vec<&Patient> = patients
        .iter()
        .filter(|p| p.status == PatientStatus::ErQueue)
        .collect();

    queue.sort_by(|a, b| emergency_order(a, b));
    queue.into_iter().cloned().collect()
}

fn physician_order(a: &Patient, b: &Patient) -> Ordering {
    tier_rank(a)
        .cmp(&tier_rank(b))
        .then_with(|| green_vulnerability_rank(a).cmp(&green_vulnerability_rank(b)))
        .then_with(|| a.updated_at.cmp(&b.updated_at))
        // MRN 兜底, 保证严格全序: 时间戳相同也不会出现不确定顺序
        .then_with(|| a.mrn.cmp(&b.mrn))
}

fn emergency_order(a: &Patient, b: &Patient) -> Ordering {
    red_first_rank(a)
        .cmp(&red_first_rank(b))
        .then_with(|| a.updated_at.cmp(&b.updated_at))
        .then_with(|| a.mrn.cmp(&b.mrn))
}

fn tier_rank(patient: &Patient) -> u8 {
    // 未分级的患者不应出现在队列中, 防御性排到最后
    patient.triage_level.map(|l| l.rank()).unwrap_or(u8::MAX)
}

/// 弱势加权仅在 GREEN 层内生效
fn green_vulnerability_rank(patient: &Patient) -> (u8, u8) {
    if patient.triage_level != Some(TriageLevel::Green) {
        return (0, 0);
    }
    let elderly = if patient.is_elderly() { 0 } else { 1 };
    let pregnant = if patient.pregnant { 0 } else { 1 };
    (elderly, pregnant)
}

fn red_first_rank(patient: &Patient) -> u8 {
    if patient.triage_level == Some(TriageLevel::Red) {
        0
    } else {
        1
    }
}
