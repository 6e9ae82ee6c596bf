// ==========================================
// 服务关系提取引擎 - 领域类型定义
// ==========================================
// 职责: 日志级别 / 列角色 / 金额来源 等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 日志级别 (Log Level)
// ==========================================
// 外部界面只识别这四种级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Success => write!(f, "success"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 列角色 (Column Role)
// ==========================================
// 每个工作表的表头被解析为以下语义角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    PaymentMethod,
    ServiceStatus,
    Address,
    ServiceDescription,
    ServiceValue,
    HomeVisitValue,
    Tax,
    Materials,
    MaterialsValue,
}

impl ColumnRole {
    /// 全部角色（按解析顺序）
    pub const ALL: [ColumnRole; 10] = [
        ColumnRole::Date,
        ColumnRole::PaymentMethod,
        ColumnRole::ServiceStatus,
        ColumnRole::Address,
        ColumnRole::ServiceDescription,
        ColumnRole::ServiceValue,
        ColumnRole::HomeVisitValue,
        ColumnRole::Tax,
        ColumnRole::Materials,
        ColumnRole::MaterialsValue,
    ];

    /// 是否为金额来源列（service_value / home_visit_value）
    pub fn is_monetary_source(&self) -> bool {
        matches!(self, ColumnRole::ServiceValue | ColumnRole::HomeVisitValue)
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Date => write!(f, "date"),
            ColumnRole::PaymentMethod => write!(f, "payment_method"),
            ColumnRole::ServiceStatus => write!(f, "service_status"),
            ColumnRole::Address => write!(f, "address"),
            ColumnRole::ServiceDescription => write!(f, "service_description"),
            ColumnRole::ServiceValue => write!(f, "service_value"),
            ColumnRole::HomeVisitValue => write!(f, "home_visit_value"),
            ColumnRole::Tax => write!(f, "tax"),
            ColumnRole::Materials => write!(f, "materials"),
            ColumnRole::MaterialsValue => write!(f, "materials_value"),
        }
    }
}

// ==========================================
// 金额来源 (Value Source)
// ==========================================
// combined_value 取自哪一列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueSource {
    ServiceValue,   // 服务金额列
    HomeVisitValue, // 上门费列（回退）
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::ServiceValue => write!(f, "SERVICE_VALUE"),
            ValueSource::HomeVisitValue => write!(f, "HOME_VISIT_VALUE"),
        }
    }
}
