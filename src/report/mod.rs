// ==========================================
// 服务关系提取引擎 - 报表支持层
// ==========================================
// 职责: 报表日期文本、结果表导出（渲染由外部完成）
// ==========================================

pub mod date_text;
pub mod export;

pub use date_text::{default_range, long_date, month_year, parse_day_first, MONTH_NAMES};
pub use export::{export_to_path, write_csv, write_json, ExportFormat};
