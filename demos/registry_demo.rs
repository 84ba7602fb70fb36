//! 登记与检索演示程序
//!
//! 展示活跃就诊查重、票号容错查询与档案检索

use triage_core::{
    PatientStatus, ReferralSource, RegistrationForm, Sex, TriageError, Vitals,
};
use triage_registry::PatientRegistry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut registry = PatientRegistry::new();

    println!("🗂  患者登记与检索演示\n");

    // 1. 挂号
    let names = ["Zhao Yun", "Qian Duo", "Sun Li", "Li Hua", "Zhou Ping", "Wu Yan", "Zheng He"];
    for (i, name) in names.iter().enumerate() {
        let patient = registry.register(form(&format!("nid-{:03}", i + 1), name))?;
        println!("✅ {} 挂号成功, 票号 {}", patient.name, patient.ticket);
    }

    // 2. 重复挂号被拒
    match registry.register(form("nid-001", "Zhao Yun")) {
        Err(TriageError::DuplicateActiveEpisode { mrn, ticket, status }) => {
            println!(
                "\n🚫 重复挂号被拒: 已有活跃就诊 MRN {} 票号 {} 状态 {}",
                mrn, ticket, status
            );
        }
        other => println!("意外结果: {:?}", other.map(|p| p.ticket)),
    }

    // 3. 票号查询容错输入
    println!("\n🔍 票号查询:");
    for query in ["Q-007", "q-007", "7"] {
        let found = registry.lookup_by_ticket(query)?;
        println!("   输入 {:?} -> {} ({})", query, found.name, found.ticket);
    }

    // 4. 已处理的票号报告当前状态
    let id = registry.lookup_by_ticket("Q-002")?.id;
    registry.get_mut(id).unwrap().status = PatientStatus::PhysicianQueue;
    match registry.lookup_by_ticket("Q-002") {
        Err(TriageError::AlreadyProcessed { ticket, status }) => {
            println!("   票号 {} 已处理, 当前状态 {}", ticket, status);
        }
        other => println!("意外结果: {:?}", other.map(|p| p.ticket.clone())),
    }

    // 5. 档案检索
    println!("\n📚 档案检索 \"zh\":");
    for patient in registry.search_archive("zh") {
        println!("   {} ({})", patient.name, patient.national_id);
    }
    println!("   快速检索上限: {} 条", triage_registry::DEFAULT_QUICK_SEARCH_CAP);

    Ok(())
}

fn form(national_id: &str, name: &str) -> RegistrationForm {
    RegistrationForm {
        national_id: national_id.to_string(),
        name: name.to_string(),
        age: 44,
        sex: Sex::Male,
        pregnant: false,
        phone: Some("13512345678".to_string()),
        chief_complaint: "Routine complaint".to_string(),
        vitals: Vitals::new("125/82", "74", "36.5", "99"),
        referral_source: ReferralSource::WalkIn,
        screening: Vec::new(),
    }
}
