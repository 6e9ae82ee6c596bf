// ==========================================
// 服务关系提取引擎 - 行过滤管道
// ==========================================
// 阶段顺序（固定，不可逆）:
// 1. 日期存在性  2. 日期区间（闭区间）  3. 付款方式  4. 服务状态
// 每个阶段向 sink 报告过滤后的行数
// ==========================================

use crate::config::ExtractionConfig;
use crate::domain::sheet::RawRow;
use crate::domain::types::ColumnRole;
use crate::engine::column_resolver::ColumnMap;
use crate::engine::sink::LogSink;
use crate::importer::data_cleaner::DataCleaner;
use chrono::NaiveDate;
use std::collections::HashSet;

// ==========================================
// DatedRow - 已解析日期的行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct DatedRow {
    pub date: NaiveDate,
    pub row: RawRow,
}

// ==========================================
// FilterCounts - 各阶段计数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterCounts {
    pub input: usize,
    pub with_date: usize,
    pub in_window: usize,
    pub payment_matched: usize,
    pub status_blank: usize,
}

impl FilterCounts {
    /// 因服务状态非空而被排除的行数
    pub fn status_excluded(&self) -> usize {
        self.payment_matched - self.status_blank
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub rows: Vec<DatedRow>,
    pub counts: FilterCounts,
}

// ==========================================
// RowFilterPipeline - 行过滤管道
// ==========================================
pub struct RowFilterPipeline<'a> {
    config: &'a ExtractionConfig,
    sink: &'a dyn LogSink,
    cleaner: DataCleaner,
}

impl<'a> RowFilterPipeline<'a> {
    pub fn new(config: &'a ExtractionConfig, sink: &'a dyn LogSink) -> Self {
        Self {
            config,
            sink,
            cleaner: DataCleaner,
        }
    }

    /// 依次执行全部四个阶段
    pub fn filter(
        &self,
        rows: Vec<RawRow>,
        columns: &ColumnMap,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> FilterOutcome {
        let mut counts = FilterCounts::default();
        let date_col = columns.get(ColumnRole::Date).unwrap_or_default();
        let dated = self.filter_dates(rows, date_col, start_date, end_date, &mut counts);
        let rows = self.filter_qualifying(dated, columns, &mut counts);

        FilterOutcome { rows, counts }
    }

    /// 阶段 1-2: 只需日期列，可在解析其余列角色之前执行
    pub fn filter_dates(
        &self,
        rows: Vec<RawRow>,
        date_col: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        counts: &mut FilterCounts,
    ) -> Vec<DatedRow> {
        counts.input = rows.len();

        let dated = self.filter_date_presence(rows, date_col);
        counts.with_date = dated.len();

        let dated = self.filter_date_window(dated, start_date, end_date);
        counts.in_window = dated.len();
        dated
    }

    /// 阶段 3-4: 付款方式与服务状态
    pub fn filter_qualifying(
        &self,
        rows: Vec<DatedRow>,
        columns: &ColumnMap,
        counts: &mut FilterCounts,
    ) -> Vec<DatedRow> {
        let payment_col = columns.get(ColumnRole::PaymentMethod).unwrap_or_default();
        let paid = self.filter_payment(rows, payment_col);
        counts.payment_matched = paid.len();

        let status_col = columns.get(ColumnRole::ServiceStatus).unwrap_or_default();
        let kept = self.filter_status(paid, status_col);
        counts.status_blank = kept.len();
        kept
    }

    /// 阶段 1: 丢弃日期为空或无法解析的行
    fn filter_date_presence(&self, rows: Vec<RawRow>, date_col: &str) -> Vec<DatedRow> {
        let dated: Vec<DatedRow> = rows
            .into_iter()
            .filter_map(|row| {
                self.cleaner
                    .cell_to_date(row.get(date_col))
                    .map(|date| DatedRow { date, row })
            })
            .collect();

        self.sink
            .info(&format!("Registros con fecha válida: {}", dated.len()));
        dated
    }

    /// 阶段 2: 保留 [start_date, end_date] 内的行（两端包含）
    fn filter_date_window(
        &self,
        rows: Vec<DatedRow>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Vec<DatedRow> {
        let kept: Vec<DatedRow> = rows
            .into_iter()
            .filter(|r| r.date >= start_date && r.date <= end_date)
            .collect();

        self.sink.info(&format!(
            "Registros después de filtrar por fecha: {}",
            kept.len()
        ));
        kept
    }

    /// 阶段 3: 付款方式（TRIM + UPPER）等于配置标记
    fn filter_payment(&self, rows: Vec<DatedRow>, payment_col: &str) -> Vec<DatedRow> {
        let marker = self.config.normalized_payment_marker();

        self.sink.info(&format!(
            "Valores únicos en {}: {}",
            payment_col,
            unique_upper_values(&rows, payment_col).join(", ")
        ));

        let kept: Vec<DatedRow> = rows
            .into_iter()
            .filter(|r| self.cleaner.clean_text(&r.row.get(payment_col).as_text(), true) == marker)
            .collect();

        self.sink.info(&format!(
            "Registros después de filtrar por forma de pago: {}",
            kept.len()
        ));
        kept
    }

    /// 阶段 4: 服务状态为空（缺失或空白）
    ///
    /// 被排除的行逐条报告（行号 + 状态值）
    fn filter_status(&self, rows: Vec<DatedRow>, status_col: &str) -> Vec<DatedRow> {
        self.sink.info(&format!(
            "Valores únicos en {}: {}",
            status_col,
            unique_upper_values(&rows, status_col).join(", ")
        ));

        let (kept, excluded): (Vec<DatedRow>, Vec<DatedRow>) = rows
            .into_iter()
            .partition(|r| r.row.get(status_col).is_blank());

        if !excluded.is_empty() {
            self.sink.warning(&format!(
                "Registros excluidos por tener estado: {}",
                excluded.len()
            ));
            for r in &excluded {
                self.sink.warning(&format!(
                    "  - Registro {}: {}",
                    r.row.row_number,
                    r.row.get(status_col).as_text().trim()
                ));
            }
        }

        self.sink.info(&format!(
            "Registros después de filtrar por estado: {}",
            kept.len()
        ));
        kept
    }
}

/// 列中出现过的值（UPPER，按首次出现顺序，空值记为空串）
fn unique_upper_values(rows: &[DatedRow], column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|r| r.row.get(column).as_text().trim().to_uppercase())
        .filter(|v| seen.insert(v.clone()))
        .map(|v| format!("'{}'", v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sheet::{CellValue, RawSheet};
    use crate::domain::types::LogLevel;
    use crate::engine::column_resolver::resolve;
    use crate::engine::sink::CollectingSink;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sheet(rows: &[(&str, &str, &str)]) -> RawSheet {
        let headers: Vec<String> = ["FECHA", "FORMA DE PAGO", "ESTADO DEL SERVICIO", "VALOR SERVICIO"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let data = rows.iter().map(|(date, payment, status)| {
            vec![
                CellValue::text(*date),
                CellValue::text(*payment),
                CellValue::text(*status),
                CellValue::Number(100.0),
            ]
        });
        RawSheet::from_grid("Enero", &headers, data, 1)
    }

    fn run(sheet: RawSheet, start: NaiveDate, end: NaiveDate) -> (FilterOutcome, CollectingSink) {
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let columns = resolve(&sheet.headers, &config).unwrap();
        let outcome = RowFilterPipeline::new(&config, &sink).filter(sheet.rows, &columns, start, end);
        (outcome, sink)
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let s = sheet(&[
            ("31/12/2023", "EFECTIVO", ""),
            ("01/01/2024", "EFECTIVO", ""),
            ("15/01/2024", "EFECTIVO", ""),
            ("31/01/2024", "EFECTIVO", ""),
            ("01/02/2024", "EFECTIVO", ""),
        ]);

        let (outcome, _) = run(s, ymd(2024, 1, 1), ymd(2024, 1, 31));

        let dates: Vec<NaiveDate> = outcome.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![ymd(2024, 1, 1), ymd(2024, 1, 15), ymd(2024, 1, 31)]);
        assert_eq!(outcome.counts.with_date, 5);
        assert_eq!(outcome.counts.in_window, 3);
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let s = sheet(&[
            ("pendiente", "EFECTIVO", ""),
            ("", "EFECTIVO", ""),
            ("10/01/2024", "EFECTIVO", ""),
        ]);

        let (outcome, _) = run(s, ymd(2024, 1, 1), ymd(2024, 1, 31));
        assert_eq!(outcome.counts.input, 3);
        assert_eq!(outcome.counts.with_date, 1);
        assert_eq!(outcome.rows.len(), 1);
    }

    #[test]
    fn test_payment_normalized_exact_match() {
        let s = sheet(&[
            ("10/01/2024", " efectivo ", ""),
            ("10/01/2024", "EFECTIVO", ""),
            ("10/01/2024", "NEQUI", ""),
            ("10/01/2024", "EFECTIVO Y NEQUI", ""),
            ("10/01/2024", "", ""),
        ]);

        let (outcome, _) = run(s, ymd(2024, 1, 1), ymd(2024, 1, 31));
        assert_eq!(outcome.counts.payment_matched, 2);
    }

    #[test]
    fn test_status_exclusions_reported_individually() {
        let s = sheet(&[
            ("10/01/2024", "EFECTIVO", ""),
            ("11/01/2024", "EFECTIVO", "CANCELADO"),
            ("12/01/2024", "EFECTIVO", "   "),
            ("13/01/2024", "EFECTIVO", "GARANTIA"),
        ]);

        let (outcome, sink) = run(s, ymd(2024, 1, 1), ymd(2024, 1, 31));

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.counts.status_excluded(), 2);

        let warnings = sink.messages_at(LogLevel::Warning);
        assert!(warnings.contains(&"  - Registro 3: CANCELADO".to_string()));
        assert!(warnings.contains(&"  - Registro 5: GARANTIA".to_string()));
    }

    #[test]
    fn test_split_stages_match_full_pipeline() {
        let rows = [
            ("09/01/2024", "EFECTIVO", ""),
            ("10/01/2024", "NEQUI", ""),
            ("11/01/2024", "EFECTIVO", "CANCELADO"),
            ("12/02/2024", "EFECTIVO", ""),
            ("sin fecha", "EFECTIVO", ""),
        ];
        let (full, _) = run(sheet(&rows), ymd(2024, 1, 1), ymd(2024, 1, 31));

        let split_sheet = sheet(&rows);
        let config = ExtractionConfig::default();
        let sink = CollectingSink::new();
        let columns = resolve(&split_sheet.headers, &config).unwrap();
        let pipeline = RowFilterPipeline::new(&config, &sink);
        let mut counts = FilterCounts::default();
        let dated = pipeline.filter_dates(
            split_sheet.rows,
            "FECHA",
            ymd(2024, 1, 1),
            ymd(2024, 1, 31),
            &mut counts,
        );
        let kept = pipeline.filter_qualifying(dated, &columns, &mut counts);

        assert_eq!(kept, full.rows);
        assert_eq!(counts, full.counts);
        assert_eq!(
            counts,
            FilterCounts {
                input: 5,
                with_date: 4,
                in_window: 3,
                payment_matched: 2,
                status_blank: 1,
            }
        );
    }

    #[test]
    fn test_each_stage_reports_count() {
        let s = sheet(&[("10/01/2024", "EFECTIVO", "")]);
        let (_, sink) = run(s, ymd(2024, 1, 1), ymd(2024, 1, 31));

        assert!(sink.contains("Registros con fecha válida: 1"));
        assert!(sink.contains("Registros después de filtrar por fecha: 1"));
        assert!(sink.contains("Registros después de filtrar por forma de pago: 1"));
        assert!(sink.contains("Registros después de filtrar por estado: 1"));
    }
}
