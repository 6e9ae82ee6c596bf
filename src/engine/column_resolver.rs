// ==========================================
// 服务关系提取引擎 - 列角色解析
// ==========================================
// 职责: 表头 → ColumnMap（语义角色 → 实际列名）
// 顺序: 精确匹配 → 子串启发式 → 别名回退
// 红线: 纯函数，只依赖表头；各角色独立匹配，仅排除精确匹配的三列
// ==========================================

use crate::config::ExtractionConfig;
use crate::domain::types::ColumnRole;
use crate::engine::sheet_processor::SkipReason;
use crate::importer::data_cleaner::DataCleaner;
use std::collections::{BTreeMap, HashSet};

/// 表头判定函数（入参为 TRIM + UPPER + 去重音 后的表头）
type HeaderPredicate = fn(&str) -> bool;

/// 启发式规则表（按顺序求值，先匹配者得）
const HEURISTICS: &[(ColumnRole, HeaderPredicate)] = &[
    (ColumnRole::Address, is_address),
    (ColumnRole::ServiceDescription, is_service_description),
    (ColumnRole::ServiceValue, is_service_value),
    (ColumnRole::HomeVisitValue, is_home_visit_value),
    (ColumnRole::Tax, is_tax),
    (ColumnRole::MaterialsValue, is_materials_value),
    (ColumnRole::Materials, is_materials),
];

/// 别名回退（仅在启发式未命中时使用，精确匹配）
const ADDRESS_ALIASES: &[&str] = &["DIRECCION", "DIRECCIÓN", "UBICACION", "UBICACIÓN"];
const DESCRIPTION_ALIASES: &[&str] = &["SERVICIO", "DESCRIPCION", "DESCRIPCIÓN", "TRABAJO"];

fn is_address(key: &str) -> bool {
    key.contains("DIRECCION") || key.contains("UBICACION")
}

fn is_service_description(key: &str) -> bool {
    key.contains("SERVICIO") && !key.contains("VALOR")
}

fn is_service_value(key: &str) -> bool {
    key.contains("VALOR") && key.contains("SERVICIO")
}

fn is_home_visit_value(key: &str) -> bool {
    key.contains("DOMICILIO")
}

fn is_tax(key: &str) -> bool {
    key.contains("IVA")
}

fn is_materials_value(key: &str) -> bool {
    key.contains("VALOR") && key.contains("MATERIAL")
}

fn is_materials(key: &str) -> bool {
    key.contains("MATERIAL") && !key.contains("VALOR")
}

// ==========================================
// ColumnMap - 列角色映射
// ==========================================
// 每个工作表构建一次，之后不可变
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    columns: BTreeMap<ColumnRole, String>,
}

impl ColumnMap {
    /// 角色对应的列名
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    /// 已解析的 (角色, 列名)
    pub fn iter(&self) -> impl Iterator<Item = (ColumnRole, &str)> {
        self.columns.iter().map(|(r, c)| (*r, c.as_str()))
    }

    /// 是否存在可用的金额来源列
    pub fn has_monetary_source(&self) -> bool {
        self.has(ColumnRole::ServiceValue) || self.has(ColumnRole::HomeVisitValue)
    }
}

/// 精确查找（TRIM 后区分大小写比较）
fn find_exact(headers: &[String], label: &str) -> Option<String> {
    let label = label.trim();
    headers.iter().find(|h| h.trim() == label).cloned()
}

/// 查找日期列
pub fn resolve_date_column(headers: &[String], config: &ExtractionConfig) -> Option<String> {
    find_exact(headers, &config.date_header)
}

/// 解析工作表的列角色
///
/// # 返回
/// - Ok(ColumnMap): 解析成功
/// - Err(SkipReason): 缺日期列 / 缺付款方式列 / 缺服务状态列 / 无金额列
pub fn resolve(headers: &[String], config: &ExtractionConfig) -> Result<ColumnMap, SkipReason> {
    let cleaner = DataCleaner;
    let mut columns = BTreeMap::new();

    // === 步骤 1: 精确匹配 ===
    let date = resolve_date_column(headers, config).ok_or(SkipReason::MissingDateColumn {
        expected: config.date_header.clone(),
    })?;
    let payment =
        find_exact(headers, &config.payment_header).ok_or(SkipReason::MissingPaymentColumn {
            expected: config.payment_header.clone(),
        })?;
    let status =
        find_exact(headers, &config.status_header).ok_or(SkipReason::MissingStatusColumn {
            expected: config.status_header.clone(),
        })?;

    let mut exact: HashSet<String> = HashSet::new();
    for (role, header) in [
        (ColumnRole::Date, date),
        (ColumnRole::PaymentMethod, payment),
        (ColumnRole::ServiceStatus, status),
    ] {
        exact.insert(header.clone());
        columns.insert(role, header);
    }

    // === 步骤 2: 子串启发式 ===
    // 每个角色扫描全部表头，同一列可同时满足多个角色
    for (role, predicate) in HEURISTICS {
        let found = headers
            .iter()
            .filter(|h| !exact.contains(*h))
            .find(|h| predicate(&cleaner.header_key(h)));

        if let Some(header) = found {
            columns.insert(*role, header.clone());
        }
    }

    // === 步骤 3: 别名回退 ===
    for (role, aliases) in [
        (ColumnRole::Address, ADDRESS_ALIASES),
        (ColumnRole::ServiceDescription, DESCRIPTION_ALIASES),
    ] {
        if columns.contains_key(&role) {
            continue;
        }
        let found = aliases.iter().find_map(|alias| {
            find_exact(headers, alias).filter(|header| !exact.contains(header))
        });
        if let Some(header) = found {
            columns.insert(role, header);
        }
    }

    let map = ColumnMap { columns };
    if !map.has_monetary_source() {
        return Err(SkipReason::NoMonetaryColumn);
    }

    Ok(map)
}
