// ==========================================
// 服务关系提取引擎 - 工作表处理器
// ==========================================
// 状态机:
// Start → HeaderCheck → DateFilter → ColumnsResolved → Filtering → Deriving → Done
// 任一阶段可转入终态 Skipped（该表产出 0 行，整体提取继续）
// ==========================================

use crate::config::ExtractionConfig;
use crate::domain::service::ServiceRecord;
use crate::domain::sheet::RawSheet;
use crate::engine::column_resolver::{resolve, resolve_date_column};
use crate::engine::derivation::FinancialDeriver;
use crate::engine::row_filter::{FilterCounts, RowFilterPipeline};
use crate::engine::sink::LogSink;
use crate::importer::file_parser::WorkbookSource;
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument};

// ==========================================
// SheetStage - 处理阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetStage {
    Start,
    HeaderCheck,
    DateFilter,
    ColumnsResolved,
    Filtering,
    Deriving,
    Done,
}

impl fmt::Display for SheetStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetStage::Start => write!(f, "START"),
            SheetStage::HeaderCheck => write!(f, "HEADER_CHECK"),
            SheetStage::DateFilter => write!(f, "DATE_FILTER"),
            SheetStage::ColumnsResolved => write!(f, "COLUMNS_RESOLVED"),
            SheetStage::Filtering => write!(f, "FILTERING"),
            SheetStage::Deriving => write!(f, "DERIVING"),
            SheetStage::Done => write!(f, "DONE"),
        }
    }
}

// ==========================================
// SkipReason - 跳过原因
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("no tiene columna {expected}")]
    MissingDateColumn { expected: String },

    #[error("no se encontró columna exacta '{expected}'")]
    MissingPaymentColumn { expected: String },

    #[error("no se encontró columna exacta '{expected}'")]
    MissingStatusColumn { expected: String },

    #[error("no se encontraron columnas de valor")]
    NoMonetaryColumn,

    #[error("no se pudo leer la hoja: {0}")]
    Unreadable(String),
}

impl SkipReason {
    /// 结构性缺陷（警告级）还是读取失败（错误级）
    pub fn is_structural(&self) -> bool {
        !matches!(self, SkipReason::Unreadable(_))
    }
}

/// 被跳过的工作表
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Hoja {sheet} {reason}. Saltando...")]
pub struct SheetSkip {
    pub sheet: String,
    pub stage: SheetStage,
    pub reason: SkipReason,
}

// ==========================================
// SheetExtraction - 单表提取结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SheetExtraction {
    pub sheet: String,
    pub headers: Vec<String>,
    pub records: Vec<ServiceRecord>,
    pub counts: FilterCounts,
    /// 非空但无法解析、按 0 处理的金额单元格数
    pub unparseable_cells: usize,
}

// ==========================================
// SheetProcessor - 工作表处理器
// ==========================================
pub struct SheetProcessor<'a> {
    config: &'a ExtractionConfig,
    sink: &'a dyn LogSink,
}

impl<'a> SheetProcessor<'a> {
    pub fn new(config: &'a ExtractionConfig, sink: &'a dyn LogSink) -> Self {
        Self { config, sink }
    }

    /// 从账簿读取并处理一个工作表
    ///
    /// 读取失败只影响该表（Skipped / Unreadable）
    pub fn process_from_source(
        &self,
        source: &mut dyn WorkbookSource,
        sheet_name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SheetExtraction, SheetSkip> {
        self.sink.info(&format!("Analizando hoja: {}", sheet_name));

        let sheet = source.load_sheet(sheet_name).map_err(|e| SheetSkip {
            sheet: sheet_name.to_string(),
            stage: SheetStage::Start,
            reason: SkipReason::Unreadable(e.to_string()),
        })?;

        self.process(sheet, start_date, end_date)
    }

    /// 处理一个已读取的工作表
    #[instrument(skip(self, sheet), fields(sheet = %sheet.name))]
    pub fn process(
        &self,
        sheet: RawSheet,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<SheetExtraction, SheetSkip> {
        let RawSheet {
            name,
            headers,
            rows,
        } = sheet;
        let skip = |stage: SheetStage, reason: SkipReason| SheetSkip {
            sheet: name.clone(),
            stage,
            reason,
        };
        let pipeline = RowFilterPipeline::new(self.config, self.sink);
        let mut counts = FilterCounts::default();

        // === HeaderCheck ===
        debug!(stage = %SheetStage::HeaderCheck, "检查表头");
        self.sink.info(&format!("Columnas en la hoja {}:", name));
        for header in &headers {
            self.sink.info(&format!("  - '{}'", header));
        }
        let date_col = resolve_date_column(&headers, self.config).ok_or_else(|| {
            skip(
                SheetStage::HeaderCheck,
                SkipReason::MissingDateColumn {
                    expected: self.config.date_header.clone(),
                },
            )
        })?;

        // === DateFilter ===
        debug!(stage = %SheetStage::DateFilter, "日期过滤");
        let dated = pipeline.filter_dates(rows, &date_col, start_date, end_date, &mut counts);

        // === ColumnsResolved ===
        debug!(stage = %SheetStage::ColumnsResolved, "解析列角色");
        let columns =
            resolve(&headers, self.config).map_err(|r| skip(SheetStage::ColumnsResolved, r))?;
        for (role, header) in columns.iter() {
            debug!(role = %role, header = %header, "列角色");
        }

        // === Filtering ===
        debug!(stage = %SheetStage::Filtering, "付款方式/服务状态过滤");
        let qualified = pipeline.filter_qualifying(dated, &columns, &mut counts);

        // === Deriving ===
        debug!(stage = %SheetStage::Deriving, "派生财务字段");
        let deriver = FinancialDeriver::new(self.config);
        let mut unparseable_cells = 0;
        let mut records = Vec::with_capacity(qualified.len());
        for dated in &qualified {
            let derivation = deriver.derive(&name, dated, &columns);
            unparseable_cells += derivation.unparseable_cells;
            if let Some(record) = derivation.record {
                records.push(record);
            }
        }

        self.sink.info(&format!(
            "Registros con valor combinado > 0: {}",
            records.len()
        ));
        if unparseable_cells > 0 && self.config.warn_unparseable_money {
            self.sink.warning(&format!(
                "Hoja {}: {} valores monetarios no se pudieron interpretar y se tomaron como 0",
                name, unparseable_cells
            ));
        }

        // === Done ===
        debug!(stage = %SheetStage::Done, records = records.len(), "工作表处理完成");
        self.sink.info(&format!(
            "Servicios encontrados en '{}': {}",
            name,
            records.len()
        ));

        Ok(SheetExtraction {
            sheet: name,
            headers,
            records,
            counts,
            unparseable_cells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sheet::CellValue;
    use crate::domain::types::LogLevel;
    use crate::engine::sink::CollectingSink;
    use crate::importer::file_parser::MemoryWorkbook;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sheet(name: &str, headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawSheet {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        RawSheet::from_grid(name, &headers, rows, 1)
    }

    fn good_sheet() -> RawSheet {
        sheet(
            "Enero",
            &[
                "FECHA",
                "FORMA DE PAGO",
                "ESTADO DEL SERVICIO",
                "VALOR SERVICIO",
                "VALOR DOMICILIO",
            ],
            vec![
                vec!["05/01/2024".into(), "EFECTIVO".into(), CellValue::Empty, "100,000".into(), CellValue::Empty],
                vec!["06/01/2024".into(), "EFECTIVO".into(), CellValue::Empty, CellValue::Empty, 20000.0.into()],
                vec!["07/01/2024".into(), "EFECTIVO".into(), CellValue::Empty, "N/A".into(), CellValue::Empty],
                vec!["08/01/2024".into(), "NEQUI".into(), CellValue::Empty, 50000.0.into(), CellValue::Empty],
            ],
        )
    }

    #[test]
    fn test_process_good_sheet() {
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let processor = SheetProcessor::new(&config, &sink);

        let extraction = processor
            .process(good_sheet(), ymd(2024, 1, 1), ymd(2024, 1, 31))
            .unwrap();

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].combined_value, 100000.0);
        assert_eq!(extraction.records[1].combined_value, 20000.0);
        assert_eq!(extraction.counts.input, 4);
        assert_eq!(extraction.counts.payment_matched, 3);
        assert_eq!(extraction.unparseable_cells, 1);

        assert!(sink.contains("Servicios encontrados en 'Enero': 2"));
        assert_eq!(sink.messages_at(LogLevel::Warning).len(), 1);
    }

    #[test]
    fn test_process_counts_agree_with_filter_pipeline() {
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let sheet = good_sheet();
        let columns = resolve(&sheet.headers, &config).unwrap();
        let expected = RowFilterPipeline::new(&config, &CollectingSink::new()).filter(
            sheet.rows.clone(),
            &columns,
            ymd(2024, 1, 1),
            ymd(2024, 1, 31),
        );

        let extraction = SheetProcessor::new(&config, &sink)
            .process(sheet, ymd(2024, 1, 1), ymd(2024, 1, 31))
            .unwrap();

        assert_eq!(extraction.counts, expected.counts);
        assert_eq!(expected.rows.len(), 3);
    }

    #[test]
    fn test_missing_date_column_skips_at_header_check() {
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let processor = SheetProcessor::new(&config, &sink);
        let s = sheet(
            "Resumen",
            &["MES", "TOTAL"],
            vec![vec!["Enero".into(), 1000.0.into()]],
        );

        let skip = processor
            .process(s, ymd(2024, 1, 1), ymd(2024, 1, 31))
            .unwrap_err();

        assert_eq!(skip.stage, SheetStage::HeaderCheck);
        assert_eq!(
            skip.reason,
            SkipReason::MissingDateColumn {
                expected: "FECHA".to_string()
            }
        );
        assert_eq!(skip.to_string(), "Hoja Resumen no tiene columna FECHA. Saltando...");
    }

    #[test]
    fn test_missing_payment_column_skips_after_date_filter() {
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let processor = SheetProcessor::new(&config, &sink);
        let s = sheet(
            "Febrero",
            &["FECHA", "ESTADO DEL SERVICIO", "VALOR SERVICIO"],
            vec![vec!["05/02/2024".into(), CellValue::Empty, 1000.0.into()]],
        );

        let skip = processor
            .process(s, ymd(2024, 2, 1), ymd(2024, 2, 29))
            .unwrap_err();

        assert_eq!(skip.stage, SheetStage::ColumnsResolved);
        assert!(matches!(skip.reason, SkipReason::MissingPaymentColumn { .. }));
        assert!(sink.contains("Registros después de filtrar por fecha: 1"));
    }

    #[test]
    fn test_unreadable_sheet_from_source() {
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let processor = SheetProcessor::new(&config, &sink);
        let mut source = MemoryWorkbook::new().with_sheet(good_sheet());

        let skip = processor
            .process_from_source(&mut source, "Inexistente", ymd(2024, 1, 1), ymd(2024, 1, 31))
            .unwrap_err();

        assert_eq!(skip.stage, SheetStage::Start);
        assert!(!skip.reason.is_structural());
    }

    #[test]
    fn test_unparseable_warning_can_be_disabled() {
        let config = ExtractionConfig {
            warn_unparseable_money: false,
            ..ExtractionConfig::default()
        };
        let sink = CollectingSink::new();
        let processor = SheetProcessor::new(&config, &sink);

        processor
            .process(good_sheet(), ymd(2024, 1, 1), ymd(2024, 1, 31))
            .unwrap();

        assert!(sink.messages_at(LogLevel::Warning).is_empty());
    }
}
