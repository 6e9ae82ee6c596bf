// ==========================================
// 服务关系提取引擎 - 引擎层
// ==========================================
// 职责: 列角色解析、行过滤、财务派生、工作表状态机、账簿提取
// 红线: 引擎只通过 LogSink 与宿主交流，不直接打印
// ==========================================

pub mod column_resolver;
pub mod derivation;
pub mod extractor;
pub mod money;
pub mod row_filter;
pub mod sheet_processor;
pub mod sink;

// 重导出核心引擎
pub use column_resolver::{resolve, resolve_date_column, ColumnMap};
pub use derivation::{Derivation, FinancialDeriver};
pub use extractor::{extract_services, ExtractionRun, WorkbookExtractor};
pub use money::{money_to_text, normalize, normalize_text, parse_money, MoneyValue};
pub use row_filter::{DatedRow, FilterCounts, FilterOutcome, RowFilterPipeline};
pub use sheet_processor::{SheetExtraction, SheetProcessor, SheetSkip, SheetStage, SkipReason};
pub use sink::{CollectingSink, LogEntry, LogSink, NullSink, TracingSink};
