// ==========================================
// 服务关系提取引擎 - 数据清洗器
// ==========================================
// 职责: TRIM / UPPER / 去重音 / 日期解析（日在前）
// 约定: 日期一律按 日/月/年 解析；ISO (年-月-日) 兼容
// ==========================================

use crate::domain::sheet::CellValue;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 日期文本格式（按顺序尝试）
/// 两位年份须排在前面: %Y 也接受两位数，会把 24 读成公元 24 年
/// 两位年份: 00-69 → 20xx, 70-99 → 19xx
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Excel 序列日期的最大值（9999-12-31）
const EXCEL_SERIAL_MAX: f64 = 2_958_465.0;

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM，可选 UPPER）
    pub fn clean_text(&self, value: &str, uppercase: bool) -> String {
        let trimmed = value.trim();
        if uppercase {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 表头匹配键: TRIM + UPPER + 去重音（DIRECCIÓN → DIRECCION）
    pub fn header_key(&self, header: &str) -> String {
        header.trim().to_uppercase().chars().map(fold_accent).collect()
    }

    /// 单元格 → 日期（解析失败返回 None）
    ///
    /// # 规则
    /// - Date 单元格: 取日期部分
    /// - Number 单元格: 视为 Excel 序列日期
    /// - Text 单元格: 日/月/年 优先解析
    pub fn cell_to_date(&self, cell: &CellValue) -> Option<NaiveDate> {
        match cell {
            CellValue::Date(dt) => Some(dt.date()),
            CellValue::Number(n) => excel_serial_to_datetime(*n).map(|dt| dt.date()),
            CellValue::Text(s) => self.parse_day_first(s),
            CellValue::Empty | CellValue::Bool(_) => None,
        }
    }

    /// 解析日在前的日期文本
    ///
    /// # 支持格式
    /// - dd/mm/yyyy, dd-mm-yyyy, dd.mm.yyyy（及两位年份 yy）
    /// - yyyy-mm-dd, yyyy/mm/dd
    /// - 以上格式后跟时间部分（空格或 'T' 分隔），时间被截断
    pub fn parse_day_first(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        // 截掉时间部分
        let date_part = trimmed
            .split(|c: char| c.is_whitespace() || c == 'T')
            .next()
            .unwrap_or(trimmed);

        DAY_FIRST_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    }
}

/// Excel 序列日期 → 日期时间（1900 日期系统，基准 1899-12-30）
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 || serial > EXCEL_SERIAL_MAX {
        return None;
    }

    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;

    base.checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

/// 去除西语常见重音符号
fn fold_accent(c: char) -> char {
    match c {
        'Á' | 'À' | 'Ä' | 'Â' => 'A',
        'É' | 'È' | 'Ë' | 'Ê' => 'E',
        'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
        'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
        'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
        other => other,
    }
}
