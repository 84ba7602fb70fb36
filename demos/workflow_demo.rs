//! 工作流演示程序
//!
//! 展示患者路径的核心功能, 包括分级入队、队列排序、升降级与最终去向

use async_trait::async_trait;
use triage_core::{
    ActorRole, FollowUpPlan, ReferralSource, RegistrationForm, Result, Sex, TriageLevel, Vitals,
};
use triage_registry::PatientRegistry;
use triage_workflow::{
    build_emergency_queue, build_physician_queue, Classification, TransitionRequest,
    TriageClassifier, TriageEngine,
};
use uuid::Uuid;

/// 演示用分级器: 按预先排好的剧本返回分级
struct ScriptedClassifier {
    level: TriageLevel,
}

#[async_trait]
impl TriageClassifier for ScriptedClassifier {
    async fn classify(&self, complaint: &str, _vitals: &Vitals) -> Result<Classification> {
        Ok(Classification {
            level: self.level,
            justification: format!("scripted assessment of: {}", complaint),
        })
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    let mut engine = TriageEngine::new();
    let mut registry = PatientRegistry::new();

    println!("🏥 门诊分诊工作流演示\n");

    // 1. 挂号四位患者
    let roster: [(&str, &str, u32, bool, &str, TriageLevel); 4] = [
        ("id-001", "Zhou Lan", 82, false, "Weakness and fatigue", TriageLevel::Green),
        ("id-002", "Sun Mei", 29, true, "Morning dizziness", TriageLevel::Green),
        ("id-003", "Feng Gang", 45, false, "Crushing chest pain", TriageLevel::Red),
        ("id-004", "Gao Ting", 51, false, "Deep cut on forearm", TriageLevel::Orange),
    ];

    let mut ids: Vec<Uuid> = Vec::new();
    for (national_id, name, age, pregnant, complaint, level) in roster {
        let patient = registry.register(RegistrationForm {
            national_id: national_id.to_string(),
            name: name.to_string(),
            age,
            sex: if pregnant { Sex::Female } else { Sex::Male },
            pregnant,
            phone: None,
            chief_complaint: complaint.to_string(),
            vitals: Vitals::new("120/80", "75", "36.6", "98"),
            referral_source: ReferralSource::WalkIn,
            screening: Vec::new(),
        })?;
        println!("✅ 挂号: {} 票号 {}", patient.name, patient.ticket);
        ids.push(patient.id);

        // 2. 外部分级 + 入队
        let classifier = ScriptedClassifier { level };
        let record = registry.get_mut(ids[ids.len() - 1]).unwrap();
        engine.classify_patient(record, &classifier).await?;
        engine.request_transition(record, TransitionRequest::EnterQueue, ActorRole::Nurse)?;
    }

    // 3. 队列视图: RED 直接进急诊, 门诊内 ORANGE 优先, GREEN 层内老年/孕期加权
    print_queues(&registry);

    // 4. 门诊一例恶化升级 (强制 RED), 急诊一例稳定降级 (强制 ORANGE)
    let worsened = registry.get_mut(ids[0]).unwrap();
    engine.request_transition(
        worsened,
        TransitionRequest::Escalate {
            notes: "Sudden chest tightness and pallor".to_string(),
        },
        ActorRole::Physician,
    )?;
    println!(
        "\n⚠️  {} 升级急诊, 分级 {}",
        worsened.name,
        worsened.triage_level.unwrap()
    );

    let stabilized = registry.get_mut(ids[2]).unwrap();
    engine.request_transition(
        stabilized,
        TransitionRequest::Deescalate {
            notes: "Pain resolved after nitroglycerin, vitals stable".to_string(),
        },
        ActorRole::ErPhysician,
    )?;
    println!(
        "🔽 {} 降级回门诊, 分级 {}",
        stabilized.name,
        stabilized.triage_level.unwrap()
    );

    print_queues(&registry);

    // 5. 最终去向: 离院并安排 7 天随访
    let discharged = registry.get_mut(ids[3]).unwrap();
    engine.request_transition(
        discharged,
        TransitionRequest::Discharge {
            follow_up: Some(FollowUpPlan::preset(7)?),
        },
        ActorRole::Physician,
    )?;
    println!(
        "\n🏁 {} 离院, 随访 {} 天后",
        discharged.name,
        discharged.follow_up.as_ref().unwrap().day_offset
    );

    // 6. 路径审计
    println!("\n📜 {} 的路径审计:", discharged.name);
    for step in &discharged.pathway {
        println!(
            "   [{}] {} — {} ({})",
            step.timestamp.format("%H:%M:%S"),
            step.status,
            step.description,
            step.actor
        );
    }

    let overview = engine.overview(&registry.snapshot());
    println!(
        "\n📊 概览: 门诊候诊 {} | 急诊候诊 {} | 活跃 RED {} | 已结束 {}",
        overview.physician_waiting,
        overview.emergency_waiting,
        overview.active_red_cases,
        overview.concluded_episodes
    );

    Ok(())
}

fn print_queues(registry: &PatientRegistry) {
    let snapshot = registry.snapshot();

    println!("\n🩺 门诊候诊队列:");
    for (pos, p) in build_physician_queue(&snapshot).iter().enumerate() {
        println!(
            "   {}. {} [{}] 年龄 {}{}",
            pos + 1,
            p.name,
            p.triage_level.unwrap(),
            p.age,
            if p.pregnant { ", 孕期" } else { "" }
        );
    }

    println!("🚨 急诊候诊队列:");
    for (pos, p) in build_emergency_queue(&snapshot).iter().enumerate() {
        println!("   {}. {} [{}]", pos + 1, p.name, p.triage_level.unwrap());
    }
}
