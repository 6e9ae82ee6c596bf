// ==========================================
// 服务关系提取引擎 - 财务字段派生
// ==========================================
// 职责: combined_value（含回退）/ subtotal / tax / total_company 派生
// 规则:
// - combined_value = 服务金额 > 0 ? 服务金额 : (上门费 > 0 ? 上门费 : 0)
// - subtotal = combined_value * subtotal_ratio
// - total_company = subtotal + tax
// - combined_value == 0 的行不产出记录
// ==========================================

use crate::config::ExtractionConfig;
use crate::domain::service::ServiceRecord;
use crate::domain::types::{ColumnRole, ValueSource};
use crate::engine::column_resolver::ColumnMap;
use crate::engine::money::parse_money;
use crate::engine::row_filter::DatedRow;

// ==========================================
// Derivation - 单行派生结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    /// None: combined_value == 0，该行被丢弃
    pub record: Option<ServiceRecord>,
    /// 非空但无法解析的金额单元格数
    pub unparseable_cells: usize,
}

pub struct FinancialDeriver<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> FinancialDeriver<'a> {
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// 派生 combined_value
    ///
    /// # 规则
    /// - 服务金额列存在且 > 0 → 服务金额
    /// - 否则上门费列存在且 > 0 → 上门费
    /// - 否则 → None（金额为 0）
    pub fn derive_combined_value(
        &self,
        service_value: Option<f64>,
        home_visit_value: Option<f64>,
    ) -> Option<(f64, ValueSource)> {
        match (service_value, home_visit_value) {
            (Some(v), _) if v > 0.0 => Some((v, ValueSource::ServiceValue)),
            (_, Some(v)) if v > 0.0 => Some((v, ValueSource::HomeVisitValue)),
            _ => None,
        }
    }

    /// 派生 subtotal
    pub fn derive_subtotal(&self, combined_value: f64) -> f64 {
        combined_value * self.config.subtotal_ratio
    }

    /// 派生 total_company
    pub fn derive_total_company(&self, subtotal: f64, tax: f64) -> f64 {
        subtotal + tax
    }

    /// 对单行执行派生
    pub fn derive(&self, sheet: &str, dated: &DatedRow, columns: &ColumnMap) -> Derivation {
        let mut unparseable_cells = 0;
        let row = &dated.row;

        // 读取金额列；未解析的角色返回 None
        let mut money = |role: ColumnRole| -> Option<f64> {
            let header = columns.get(role)?;
            let value = parse_money(row.get(header));
            if value.is_unparseable() {
                unparseable_cells += 1;
            }
            Some(value.amount())
        };

        let service_value = money(ColumnRole::ServiceValue);
        let home_visit_value = money(ColumnRole::HomeVisitValue);
        let tax = money(ColumnRole::Tax).unwrap_or(0.0);
        let materials_value = money(ColumnRole::MaterialsValue).unwrap_or(0.0);

        let record = self
            .derive_combined_value(service_value, home_visit_value)
            .map(|(combined_value, value_source)| {
                let subtotal = self.derive_subtotal(combined_value);
                let text = |role: ColumnRole| row.get_opt(columns.get(role)).as_text();

                ServiceRecord {
                    date: dated.date,
                    address: text(ColumnRole::Address),
                    service_description: text(ColumnRole::ServiceDescription),
                    combined_value,
                    original_value: combined_value,
                    materials: text(ColumnRole::Materials),
                    materials_value,
                    tax,
                    subtotal,
                    total_company: self.derive_total_company(subtotal, tax),
                    sheet: sheet.to_string(),
                    row_number: row.row_number,
                    value_source,
                    extra: row.cells.clone(),
                }
            });

        Derivation {
            record,
            unparseable_cells,
        }
    }
}
