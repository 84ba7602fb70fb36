//! 通用工具函数

use uuid::Uuid;

/// 生成病案号 (MRN)
///
/// 不透明唯一令牌, 分配后跨就诊复用
pub fn generate_mrn() -> String {
    format!("MRN-{}", Uuid::new_v4().simple())
}

/// 按当日序号格式化票号, 如 7 -> "Q-007"
pub fn format_ticket(seq: u32) -> String {
    format!("Q-{:03}", seq)
}

/// 规范化票号输入: 去空白并统一大写
pub fn normalize_ticket(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// 提取票号中的数字部分, 如 "Q-007" -> 7
pub fn ticket_number(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// 判断查询输入是否命中既有票号
///
/// 大小写不敏感, 允许省略非数字前缀: "1" 可命中 "Q-001"
pub fn ticket_matches(stored: &str, query: &str) -> bool {
    let stored_norm = normalize_ticket(stored);
    let query_norm = normalize_ticket(query);
    if stored_norm == query_norm {
        return true;
    }
    match (ticket_number(&stored_norm), ticket_number(&query_norm)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// 已填写的测量值必须是合法数值, 空值视为尚未录入
pub fn is_well_formed_measurement(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.parse::<f64>().map(|v| v.is_finite()).unwrap_or(false)
}

/// 血压额外允许 "收缩压/舒张压" 形式
pub fn is_well_formed_bp(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return true;
    }
    match value.split_once('/') {
        Some((sys, dia)) => {
            is_well_formed_measurement(sys)
                && !sys.trim().is_empty()
                && is_well_formed_measurement(dia)
                && !dia.trim().is_empty()
        }
        None => is_well_formed_measurement(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_mrn() {
        let mrn = generate_mrn();
        assert!(mrn.starts_with("MRN-"));
        assert_ne!(generate_mrn(), mrn);
    }

    #[test]
    fn test_format_ticket() {
        assert_eq!(format_ticket(7), "Q-007");
        assert_eq!(format_ticket(123), "Q-123");
    }

    #[test]
    fn test_ticket_matches() {
        assert!(ticket_matches("Q-007", "Q-007"));
        assert!(ticket_matches("Q-007", "q-007"));
        assert!(ticket_matches("Q-007", "7"));
        assert!(ticket_matches("Q-001", "1"));
        assert!(!ticket_matches("Q-007", "8"));
        assert!(!ticket_matches("Q-007", ""));
    }

    #[test]
    fn test_measurement_validation() {
        assert!(is_well_formed_measurement("98"));
        assert!(is_well_formed_measurement("36.8"));
        assert!(is_well_formed_measurement(""));
        assert!(!is_well_formed_measurement("high"));
        assert!(!is_well_formed_measurement("NaN"));
    }

    #[test]
    fn test_bp_validation() {
        assert!(is_well_formed_bp("120/80"));
        assert!(is_well_formed_bp("120"));
        assert!(is_well_formed_bp(""));
        assert!(!is_well_formed_bp("120/"));
        assert!(!is_well_formed_bp("high/low"));
    }
}
