// ==========================================
// 服务关系提取引擎 - 领域层
// ==========================================
// 职责: 工作表模型、服务记录、领域枚举
// ==========================================

pub mod service;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use service::{ReportTotals, ResultTable, ServiceRecord, OUTPUT_COLUMNS};
pub use sheet::{CellValue, RawRow, RawSheet};
pub use types::{ColumnRole, LogLevel, ValueSource};
