// ==========================================
// 服务关系提取引擎 - 账簿提取器
// ==========================================
// 流程: 打开账簿 → 逐表处理（按存储顺序）→ 拼接 → 透传列整理
// 红线:
// - 打开失败: 记一条错误日志，返回空结果表
// - 单表失败只影响该表，其余表照常处理
// - extract 从不返回 Err
// ==========================================

use crate::config::ExtractionConfig;
use crate::domain::service::ResultTable;
use crate::engine::sheet_processor::{SheetExtraction, SheetProcessor, SheetSkip};
use crate::engine::sink::LogSink;
use crate::importer::file_parser::{open_workbook_source, WorkbookSource};
use chrono::NaiveDate;
use std::path::Path;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ExtractionRun - 一次提取的完整结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRun {
    pub run_id: String,
    pub table: ResultTable,
    /// 成功处理的工作表（含 0 行的表）
    pub processed: Vec<String>,
    /// 被跳过的工作表
    pub skipped: Vec<SheetSkip>,
}

impl ExtractionRun {
    fn empty(run_id: String) -> Self {
        Self {
            run_id,
            table: ResultTable::new(),
            processed: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

// ==========================================
// WorkbookExtractor - 账簿提取器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct WorkbookExtractor {
    config: ExtractionConfig,
}

impl WorkbookExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// 从文件提取服务记录
    pub fn extract<P: AsRef<Path>>(
        &self,
        source: P,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sink: &dyn LogSink,
    ) -> ResultTable {
        self.run(source, start_date, end_date, sink).table
    }

    /// 从已打开的账簿提取服务记录
    pub fn extract_workbook(
        &self,
        workbook: &mut dyn WorkbookSource,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sink: &dyn LogSink,
    ) -> ResultTable {
        let run_id = Uuid::new_v4().to_string();
        self.run_workbook(&run_id, workbook, start_date, end_date, sink)
            .table
    }

    /// 从文件提取，并返回各工作表的处理情况
    #[instrument(skip(self, source, sink), fields(run_id))]
    pub fn run<P: AsRef<Path>>(
        &self,
        source: P,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sink: &dyn LogSink,
    ) -> ExtractionRun {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", &run_id.as_str());

        let path = source.as_ref();
        info!(run_id = %run_id, file = %path.display(), "开始提取服务记录");

        let mut workbook = match open_workbook_source(path) {
            Ok(workbook) => workbook,
            Err(e) => {
                error!(error = %e, "账簿打开失败");
                sink.error(&format!("Error al abrir el archivo Excel: {}", e));
                return ExtractionRun::empty(run_id);
            }
        };

        self.run_workbook(&run_id, workbook.as_mut(), start_date, end_date, sink)
    }

    fn run_workbook(
        &self,
        run_id: &str,
        workbook: &mut dyn WorkbookSource,
        start_date: NaiveDate,
        end_date: NaiveDate,
        sink: &dyn LogSink,
    ) -> ExtractionRun {
        let mut run = ExtractionRun::empty(run_id.to_string());
        sink.info("Procesando datos del archivo Excel...");

        let processor = SheetProcessor::new(&self.config, sink);
        let mut records = Vec::new();
        let mut header_order: Vec<String> = Vec::new();

        for sheet_name in workbook.sheet_names() {
            match processor.process_from_source(workbook, &sheet_name, start_date, end_date) {
                Ok(SheetExtraction {
                    sheet,
                    headers,
                    records: sheet_records,
                    ..
                }) => {
                    records.extend(sheet_records);
                    header_order.extend(headers);
                    run.processed.push(sheet);
                }
                Err(skip) => {
                    warn!(sheet = %skip.sheet, stage = %skip.stage, reason = %skip.reason, "工作表被跳过");
                    if skip.reason.is_structural() {
                        sink.warning(&skip.to_string());
                    } else {
                        sink.error(&format!(
                            "Error al procesar hoja {}: {}",
                            skip.sheet, skip.reason
                        ));
                    }
                    run.skipped.push(skip);
                }
            }
        }

        run.table = ResultTable::consolidate(records, &header_order);

        info!(
            run_id = %run_id,
            records = run.table.len(),
            processed = run.processed.len(),
            skipped = run.skipped.len(),
            "服务记录提取完成"
        );
        sink.success(&format!(
            "Se encontraron {} servicios en total.",
            run.table.len()
        ));

        run
    }
}

/// 使用默认配置从文件提取服务记录
pub fn extract_services<P: AsRef<Path>>(
    source: P,
    start_date: NaiveDate,
    end_date: NaiveDate,
    log: &dyn LogSink,
) -> ResultTable {
    WorkbookExtractor::default().extract(source, start_date, end_date, log)
}
