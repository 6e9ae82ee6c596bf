// ==========================================
// 服务关系提取引擎 - 导入层
// ==========================================
// 职责: 外部账簿读取，生成原始工作表
// 支持: Excel, ODS, CSV, 内存账簿
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod file_parser;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ExtractError, ExtractResult};
pub use file_parser::{
    open_workbook_source, CsvWorkbook, ExcelWorkbook, MemoryWorkbook, UniversalWorkbookReader,
    WorkbookSource,
};
