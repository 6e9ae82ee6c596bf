// ==========================================
// 服务关系提取引擎 - 金额标准化
// ==========================================
// 职责: 任意单元格内容 → 非负金额
// 约定: '.' 为小数点，',' 为千分位；出现多个 '.' 时视为千分位
// 红线: 从不报错；无法解析 → 0；负数 → 0
// ==========================================

use crate::domain::sheet::CellValue;

/// 货币符号/代码（解析前剔除）
const CURRENCY_TOKENS: &[&str] = &["COP", "USD", "EUR", "$", "€", "£", "¥"];

// ==========================================
// MoneyValue - 金额解析结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoneyValue {
    /// 空值
    Blank,
    /// 已解析的非负金额
    Amount(f64),
    /// 非空但无法解析（按 0 处理）
    Unparseable,
}

impl MoneyValue {
    /// 折算为金额（空值 / 无法解析 → 0）
    pub fn amount(&self) -> f64 {
        match self {
            MoneyValue::Amount(v) => *v,
            MoneyValue::Blank | MoneyValue::Unparseable => 0.0,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, MoneyValue::Unparseable)
    }
}

/// 单元格 → 金额
pub fn normalize(cell: &CellValue) -> f64 {
    parse_money(cell).amount()
}

/// 文本 → 金额
pub fn normalize_text(value: &str) -> f64 {
    parse_money_text(value).amount()
}

/// 单元格 → 金额解析结果（保留 空值 / 无法解析 的区别）
pub fn parse_money(cell: &CellValue) -> MoneyValue {
    match cell {
        CellValue::Empty => MoneyValue::Blank,
        CellValue::Number(n) if n.is_nan() => MoneyValue::Blank,
        CellValue::Number(n) if n.is_finite() => MoneyValue::Amount(n.max(0.0)),
        CellValue::Number(_) => MoneyValue::Unparseable,
        CellValue::Text(s) => parse_money_text(s),
        CellValue::Bool(_) | CellValue::Date(_) => MoneyValue::Unparseable,
    }
}

/// 文本 → 金额解析结果
pub fn parse_money_text(value: &str) -> MoneyValue {
    if value.trim().is_empty() {
        return MoneyValue::Blank;
    }

    // 去货币符号、空白（含不换行空格）
    let mut cleaned = value.to_uppercase();
    for token in CURRENCY_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();

    // 会计记法 (100) 与前导负号均为负数
    let (negative, body) = if cleaned.starts_with('(') && cleaned.ends_with(')') {
        (true, &cleaned[1..cleaned.len() - 1])
    } else if let Some(rest) = cleaned.strip_prefix('-') {
        (true, rest)
    } else {
        (false, cleaned.as_str())
    };

    if body.is_empty()
        || !body.chars().any(|c| c.is_ascii_digit())
        || !body
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return MoneyValue::Unparseable;
    }

    let digits = match strip_grouping(body) {
        Some(digits) => digits,
        None => return MoneyValue::Unparseable,
    };

    match digits.parse::<f64>() {
        Ok(_) if negative => MoneyValue::Amount(0.0),
        Ok(v) if v.is_finite() => MoneyValue::Amount(v),
        _ => MoneyValue::Unparseable,
    }
}

/// 去千分位，统一小数点为 '.'
///
/// - '.' 与 ',' 同时出现: 靠后者为小数点，另一个为千分位（小数点只能出现一次）
/// - 仅 ',': 千分位
/// - 仅 '.': 出现多次为千分位，一次为小数点
fn strip_grouping(body: &str) -> Option<String> {
    let (group, decimal) = match (body.rfind('.'), body.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => (Some('.'), Some(',')),
        (Some(_), Some(_)) => (Some(','), Some('.')),
        (None, Some(_)) => (Some(','), None),
        (Some(_), None) if body.matches('.').count() > 1 => (Some('.'), None),
        _ => (None, None),
    };

    if let Some(mark) = decimal {
        if body.matches(mark).count() > 1 {
            return None;
        }
    }

    let digits: String = body
        .chars()
        .filter(|c| Some(*c) != group)
        .map(|c| if Some(c) == decimal { '.' } else { c })
        .collect();
    Some(digits)
}

/// 金额 → 文本（可被 normalize_text 原样读回）
pub fn money_to_text(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values() {
        assert_eq!(parse_money(&CellValue::Empty), MoneyValue::Blank);
        assert_eq!(parse_money_text("   "), MoneyValue::Blank);
        assert_eq!(normalize(&CellValue::Number(f64::NAN)), 0.0);
    }

    #[test]
    fn test_currency_and_thousands() {
        assert_eq!(normalize_text("$ 150,000"), 150000.0);
        assert_eq!(normalize_text("$150,000.50"), 150000.5);
        assert_eq!(normalize_text("COP 80,000"), 80000.0);
        assert_eq!(normalize_text("1.500.000"), 1500000.0);
        assert_eq!(normalize_text("\u{a0}25 000\u{a0}"), 25000.0);
        assert_eq!(normalize_text("100.00"), 100.0);
    }

    #[test]
    fn test_mixed_separators_last_one_is_decimal() {
        assert_eq!(normalize_text("1.500.000,50"), 1500000.5);
        assert_eq!(normalize_text("$ 1.500,50"), 1500.5);
        assert_eq!(normalize_text("1,234,567.89"), 1234567.89);
        assert_eq!(parse_money_text("1.500,000,50"), MoneyValue::Unparseable);
        assert_eq!(parse_money_text("1,500.000.50"), MoneyValue::Unparseable);
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(normalize(&CellValue::Number(120000.0)), 120000.0);
        assert_eq!(normalize(&CellValue::Number(0.0)), 0.0);
        assert_eq!(normalize(&CellValue::Number(f64::INFINITY)), 0.0);
    }

    #[test]
    fn test_negative_values_become_zero() {
        assert_eq!(normalize(&CellValue::Number(-5000.0)), 0.0);
        assert_eq!(normalize_text("-5,000"), 0.0);
        assert_eq!(normalize_text("(5,000)"), 0.0);
    }

    #[test]
    fn test_unparseable_values() {
        assert_eq!(parse_money_text("N/A"), MoneyValue::Unparseable);
        assert_eq!(parse_money_text("$"), MoneyValue::Unparseable);
        assert_eq!(parse_money_text("cien mil"), MoneyValue::Unparseable);
        assert_eq!(parse_money_text("1..2,3x"), MoneyValue::Unparseable);
        assert_eq!(parse_money(&CellValue::Bool(true)), MoneyValue::Unparseable);
        assert_eq!(normalize_text("N/A"), 0.0);
    }

    #[test]
    fn test_normalize_is_idempotent_through_text() {
        for x in [0.0, 1.0, 0.5, 150000.0, 1234567.89, -42.0, 1e-7, 9.99e20] {
            let direct = normalize(&CellValue::Number(x));
            assert_eq!(normalize_text(&money_to_text(direct)), direct, "x = {}", x);
            assert_eq!(normalize_text(&money_to_text(x)), direct, "x = {}", x);
        }
    }
}
