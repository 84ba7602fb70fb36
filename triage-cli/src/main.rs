//! 分诊系统命令行入口
//!
//! 加载配置并运行一次完整的挂号-分级-候诊-去向流程演练

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use tracing::{info, warn};
use triage_admin::ConfigManager;
use triage_core::{
    ActorRole, FollowUpPlan, ReferralSource, RegistrationForm, Sex, TriageLevel, Vitals,
};
use triage_registry::PatientRegistry;
use triage_workflow::{
    build_emergency_queue, build_physician_queue, Classification, TransitionRequest,
    TriageClassifier, TriageEngine,
};

/// 分诊系统命令行参数
#[derive(Parser, Debug)]
#[command(name = "triage-cli")]
#[command(about = "门诊分诊路径与排队系统演练入口")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "config/triage")]
    config: String,

    /// 日志级别, 缺省时采用配置中的 service.log_level
    #[arg(short, long)]
    log_level: Option<String>,
}

/// 命令行显式指定时覆盖配置, 否则回落到 service.log_level
fn effective_log_level(flag: Option<&str>, configured: &str) -> String {
    flag.unwrap_or(configured).to_string()
}

/// 关键词规则分级器, 仅供演练; 生产环境由外部分级服务实现该 trait
struct KeywordClassifier;

#[async_trait]
impl TriageClassifier for KeywordClassifier {
    async fn classify(
        &self,
        complaint: &str,
        _vitals: &Vitals,
    ) -> triage_core::Result<Classification> {
        let complaint_lower = complaint.to_lowercase();
        let level = if complaint_lower.contains("chest pain")
            || complaint_lower.contains("unconscious")
        {
            TriageLevel::Red
        } else if complaint_lower.contains("fracture") || complaint_lower.contains("bleeding") {
            TriageLevel::Orange
        } else {
            TriageLevel::Green
        };
        Ok(Classification {
            level,
            justification: format!("keyword rule matched for: {}", complaint),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 先读配置再初始化日志, 命令行未指定级别时采用配置值
    let config_manager = ConfigManager::new(&args.config)?;
    let config = config_manager.get_config().await;

    tracing_subscriber::fmt()
        .with_env_filter(effective_log_level(
            args.log_level.as_deref(),
            &config.service.log_level,
        ))
        .init();

    info!("启动分诊系统演练...");
    info!("服务名称: {}", config.service.name);
    info!("入院记录必填: {}", config.workflow.require_admission_notes);

    let mut engine =
        TriageEngine::with_admission_notes_required(config.workflow.require_admission_notes);
    let mut registry = PatientRegistry::with_quick_search_cap(config.lookup.quick_search_cap);
    let classifier = KeywordClassifier;

    // 挂号
    let intake = [
        ("110101195001011001", "Zhou Lan", 82, "Persistent cough", false),
        ("110101199201012002", "Sun Mei", 32, "Lower back pain", true),
        ("110101198801013003", "Feng Gang", 37, "Chest pain on exertion", false),
        ("110101197501014004", "Gao Ting", 51, "Ankle fracture", false),
    ];
    let mut ids = Vec::new();
    for (national_id, name, age, complaint, pregnant) in intake {
        let form = RegistrationForm {
            national_id: national_id.to_string(),
            name: name.to_string(),
            age,
            sex: if pregnant { Sex::Female } else { Sex::Male },
            pregnant,
            phone: None,
            chief_complaint: complaint.to_string(),
            vitals: Vitals::new("120/80", "78", "36.7", "98"),
            referral_source: ReferralSource::WalkIn,
            screening: Vec::new(),
        };
        let patient = registry.register(form)?;
        info!("挂号成功: {} 票号 {}", patient.name, patient.ticket);
        ids.push(patient.id);
    }

    // 分级并入队
    for id in &ids {
        let patient = registry
            .get_mut(*id)
            .ok_or_else(|| anyhow::anyhow!("patient disappeared from registry"))?;
        match engine.classify_patient(patient, &classifier).await {
            Ok(Some(level)) => info!("{} 分级为 {}", patient.name, level),
            Ok(None) => warn!("{} 的分级结果已过期", patient.name),
            Err(e) => {
                warn!("{} 分级失败, 等待人工分级: {}", patient.name, e);
                continue;
            }
        }
        engine.request_transition(patient, TransitionRequest::EnterQueue, ActorRole::Nurse)?;
    }

    // 门诊队列中一名患者病情恶化, 升级急诊
    let escalated = registry
        .get_mut(ids[3])
        .ok_or_else(|| anyhow::anyhow!("patient disappeared from registry"))?;
    engine.request_transition(
        escalated,
        TransitionRequest::Escalate {
            notes: "Open fracture with heavy bleeding".to_string(),
        },
        ActorRole::Physician,
    )?;

    // 队列视图
    let snapshot = registry.snapshot();
    info!("门诊候诊队列:");
    for (pos, patient) in build_physician_queue(&snapshot).iter().enumerate() {
        info!(
            "  {}. {} [{}] 票号 {}",
            pos + 1,
            patient.name,
            patient.triage_level.map(|l| l.to_string()).unwrap_or_default(),
            patient.ticket
        );
    }
    info!("急诊候诊队列:");
    for (pos, patient) in build_emergency_queue(&snapshot).iter().enumerate() {
        info!(
            "  {}. {} [{}] 票号 {}",
            pos + 1,
            patient.name,
            patient.triage_level.map(|l| l.to_string()).unwrap_or_default(),
            patient.ticket
        );
    }

    let overview = engine.overview(&snapshot);
    info!(
        "概览: 待分级 {} | 门诊候诊 {} | 急诊候诊 {} | 活跃 RED {}",
        overview.awaiting_triage,
        overview.physician_waiting,
        overview.emergency_waiting,
        overview.active_red_cases
    );

    // 完成一例门诊就诊, 随访间隔取自配置的预设列表
    let follow_up = FollowUpPlan::preset_from(7, &config.workflow.follow_up_presets)?;
    let discharged = registry
        .get_mut(ids[0])
        .ok_or_else(|| anyhow::anyhow!("patient disappeared from registry"))?;
    engine.request_transition(
        discharged,
        TransitionRequest::Discharge {
            follow_up: Some(follow_up),
        },
        ActorRole::Physician,
    )?;
    if let Some(follow_up) = &discharged.follow_up {
        info!("{} 已离院, {} 天后随访", discharged.name, follow_up.day_offset);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_flag_overrides_config() {
        assert_eq!(effective_log_level(Some("debug"), "warn"), "debug");
        assert_eq!(effective_log_level(None, "warn"), "warn");
    }
}
