// ==========================================
// 服务关系提取引擎 - 服务记录与结果表
// ==========================================
// 职责: ServiceRecord（输出单元）/ ResultTable（汇总结果）
// 红线: 记录一经产出不可修改；结果表只负责聚合
// ==========================================

use crate::domain::sheet::CellValue;
use crate::domain::types::ValueSource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// 输出列（每条记录必定包含）
pub const OUTPUT_COLUMNS: [&str; 10] = [
    "date",
    "address",
    "service_description",
    "combined_value",
    "original_value",
    "materials",
    "materials_value",
    "tax",
    "subtotal",
    "total_company",
];

// ==========================================
// ServiceRecord - 服务记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    // 业务字段
    pub date: NaiveDate,
    pub address: String,
    pub service_description: String,
    pub combined_value: f64,
    pub original_value: f64,
    pub materials: String,
    pub materials_value: f64,
    pub tax: f64,
    pub subtotal: f64,
    pub total_company: f64,

    // 溯源字段
    pub sheet: String,
    pub row_number: usize,
    pub value_source: ValueSource,

    /// 原始行的全部单元格（按表头）
    #[serde(skip)]
    pub extra: HashMap<String, CellValue>,
}

// ==========================================
// ReportTotals - 汇总合计
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportTotals {
    pub combined_value: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub total_company: f64,
    pub materials_value: f64,
}

// ==========================================
// ResultTable - 结果表
// ==========================================
// 行序: 工作表枚举顺序 → 表内原始顺序；跨表不去重
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub records: Vec<ServiceRecord>,
    /// 透传的原始列（首次出现顺序，已剔除全空列）
    pub extra_columns: Vec<String>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由多个工作表的记录构造结果表
    ///
    /// # 参数
    /// - records: 已按顺序拼接的记录
    /// - header_order: 各工作表表头的拼接顺序（用于确定透传列顺序）
    pub fn consolidate(records: Vec<ServiceRecord>, header_order: &[String]) -> Self {
        let mut extra_columns = Vec::new();
        let mut seen = HashSet::new();

        for header in header_order {
            if !seen.insert(header.as_str()) {
                continue;
            }
            // 全空列剔除
            let has_value = records
                .iter()
                .any(|r| r.extra.get(header).is_some_and(|c| !c.is_blank()));
            if has_value {
                extra_columns.push(header.clone());
            }
        }

        Self {
            records,
            extra_columns,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceRecord> {
        self.records.iter()
    }

    /// 计算合计（报表页脚使用）
    pub fn totals(&self) -> ReportTotals {
        self.records
            .iter()
            .fold(ReportTotals::default(), |mut acc, r| {
                acc.combined_value += r.combined_value;
                acc.subtotal += r.subtotal;
                acc.tax += r.tax;
                acc.total_company += r.total_company;
                acc.materials_value += r.materials_value;
                acc
            })
    }

    /// 全部列名（输出列 + 透传列）
    pub fn columns(&self) -> Vec<String> {
        OUTPUT_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ServiceRecord;
    type IntoIter = std::slice::Iter<'a, ServiceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
