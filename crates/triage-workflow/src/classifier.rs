//! 外部协作方接口
//!
//! 临床风险分级器与叙述生成器都是核心之外的异步协作方:
//! 核心只消费其结果, 不实现其判定逻辑, 且必须容忍其失败或超时

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use triage_core::{Patient, Result, TriageLevel, Vitals};
use uuid::Uuid;

/// 分级器输出: 紧急程度加判定理由
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub level: TriageLevel,
    pub justification: String,
}

/// 外部临床风险分级器
///
/// 对相同输入应当给出确定的结果; 失败时核心不得默认 GREEN,
/// 由调用方重试或改为人工分级
#[async_trait]
pub trait TriageClassifier: Send + Sync {
    async fn classify(&self, complaint: &str, vitals: &Vitals) -> Result<Classification>;
}

/// 外部叙述生成器, 纯咨询性质, 任何转换都不依赖其结果
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn summarize(&self, patient: &Patient) -> Result<String>;
}

/// 异步请求序号守卫
///
/// 同一患者可能先后发起多次异步请求, 只接受最新一次的结果
/// (last-write-wins), 过期结果直接丢弃
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: HashMap<Uuid, u64>,
    next_id: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一次新请求, 返回请求序号; 此前未完成的请求随即过期
    pub fn begin(&mut self, patient_id: Uuid) -> u64 {
        self.next_id += 1;
        self.latest.insert(patient_id, self.next_id);
        self.next_id
    }

    /// 判断请求是否仍是该患者的最新请求
    pub fn is_current(&self, patient_id: Uuid, request_id: u64) -> bool {
        self.latest.get(&patient_id) == Some(&request_id)
    }
}
