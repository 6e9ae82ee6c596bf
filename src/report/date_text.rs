// ==========================================
// 服务关系提取引擎 - 报表日期文本
// ==========================================
// 职责: 报表标题/页眉使用的西语日期文本，宿主输入日期解析
// ==========================================

use crate::importer::data_cleaner::DataCleaner;
use chrono::{Datelike, NaiveDate};

/// 西语月份名（1 月起）
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

/// "1 de Junio de 2024"
pub fn long_date(date: NaiveDate) -> String {
    format!("{} de {} de {}", date.day(), month_name(date), date.year())
}

/// "Junio 2024"
pub fn month_year(date: NaiveDate) -> String {
    format!("{} {}", month_name(date), date.year())
}

/// 日在前的日期文本（dd/mm/yyyy 等）
pub fn parse_day_first(value: &str) -> Option<NaiveDate> {
    DataCleaner.parse_day_first(value)
}

/// 默认提取区间: 当月 1 日 → 今天
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today.with_day(1).unwrap_or(today), today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_long_date() {
        assert_eq!(long_date(ymd(2024, 6, 1)), "1 de Junio de 2024");
        assert_eq!(long_date(ymd(2023, 12, 31)), "31 de Diciembre de 2023");
    }

    #[test]
    fn test_month_year() {
        assert_eq!(month_year(ymd(2024, 1, 15)), "Enero 2024");
        assert_eq!(month_year(ymd(2024, 9, 3)), "Septiembre 2024");
    }

    #[test]
    fn test_parse_day_first() {
        assert_eq!(parse_day_first("05/02/2024"), Some(ymd(2024, 2, 5)));
        assert_eq!(parse_day_first("2024-02-05"), Some(ymd(2024, 2, 5)));
        assert_eq!(parse_day_first("31/02/2024"), None);
    }

    #[test]
    fn test_default_range() {
        assert_eq!(
            default_range(ymd(2024, 3, 17)),
            (ymd(2024, 3, 1), ymd(2024, 3, 17))
        );
    }
}
