// ==========================================
// 服务关系提取引擎 - 核心库
// ==========================================
// 职责: 从多工作表账簿中提取指定区间内的现金服务记录
// 输出: ResultTable（供外部报表渲染）
// 诊断: 全部经由宿主提供的 LogSink
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 工作表模型与服务记录
pub mod domain;

// 引擎层 - 列解析 / 过滤 / 派生 / 提取
pub mod engine;

// 导入层 - 账簿读取
pub mod importer;

// 配置层 - 提取配置
pub mod config;

// 报表支持 - 日期文本 / 导出
pub mod report;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CellValue, ColumnRole, LogLevel, RawRow, RawSheet, ReportTotals, ResultTable, ServiceRecord,
    ValueSource, OUTPUT_COLUMNS,
};

// 引擎
pub use engine::{
    extract_services, CollectingSink, ExtractionRun, LogSink, NullSink, SheetSkip, SkipReason,
    TracingSink, WorkbookExtractor,
};

// 导入
pub use importer::{ExtractError, ExtractResult, MemoryWorkbook, WorkbookSource};

// 配置
pub use config::ExtractionConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Relación de Servicios";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
