// ==========================================
// 服务关系提取引擎 - 结果表导出
// ==========================================
// 职责: ResultTable → CSV / JSON（供外部报表渲染）
// 列序: 输出列在前，透传列在后（首次出现顺序）
// ==========================================

use crate::domain::service::{ResultTable, ServiceRecord};
use crate::domain::sheet::CellValue;
use crate::importer::error::{ExtractError, ExtractResult};
use csv::WriterBuilder;
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// 根据扩展名推断格式（.json → Json，其余 → Csv）
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 输出列的文本值
fn output_fields(record: &ServiceRecord) -> [String; 10] {
    [
        record.date.format(DATE_FORMAT).to_string(),
        record.address.clone(),
        record.service_description.clone(),
        record.combined_value.to_string(),
        record.original_value.to_string(),
        record.materials.clone(),
        record.materials_value.to_string(),
        record.tax.to_string(),
        record.subtotal.to_string(),
        record.total_company.to_string(),
    ]
}

/// 写出 CSV（含表头）
pub fn write_csv<W: Write>(table: &ResultTable, writer: W) -> ExtractResult<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    let export_err = |e: csv::Error| ExtractError::ExportError(e.to_string());

    wtr.write_record(table.columns()).map_err(export_err)?;
    for record in table {
        let extras = table
            .extra_columns
            .iter()
            .map(|c| record.extra.get(c).map(CellValue::as_text).unwrap_or_default());
        let row: Vec<String> = output_fields(record).into_iter().chain(extras).collect();
        wtr.write_record(&row).map_err(export_err)?;
    }

    wtr.flush()
        .map_err(|e| ExtractError::ExportError(e.to_string()))
}

/// 记录 → JSON 对象
fn record_to_json(table: &ResultTable, record: &ServiceRecord) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "date".to_string(),
        json!(record.date.format(DATE_FORMAT).to_string()),
    );
    obj.insert("address".to_string(), json!(record.address));
    obj.insert(
        "service_description".to_string(),
        json!(record.service_description),
    );
    obj.insert("combined_value".to_string(), json!(record.combined_value));
    obj.insert("original_value".to_string(), json!(record.original_value));
    obj.insert("materials".to_string(), json!(record.materials));
    obj.insert("materials_value".to_string(), json!(record.materials_value));
    obj.insert("tax".to_string(), json!(record.tax));
    obj.insert("subtotal".to_string(), json!(record.subtotal));
    obj.insert("total_company".to_string(), json!(record.total_company));

    for column in &table.extra_columns {
        if obj.contains_key(column) {
            continue;
        }
        let value = match record.extra.get(column) {
            Some(cell) if !cell.is_blank() => json!(cell),
            _ => Value::Null,
        };
        obj.insert(column.clone(), value);
    }

    Value::Object(obj)
}

/// 写出 JSON（记录数组 + 合计）
pub fn write_json<W: Write>(table: &ResultTable, writer: W) -> ExtractResult<()> {
    let records: Vec<Value> = table.iter().map(|r| record_to_json(table, r)).collect();
    let document = json!({
        "columns": table.columns(),
        "records": records,
        "totals": table.totals(),
    });

    serde_json::to_writer_pretty(writer, &document)
        .map_err(|e| ExtractError::ExportError(e.to_string()))
}

/// 导出到文件
pub fn export_to_path(table: &ResultTable, path: &Path, format: ExportFormat) -> ExtractResult<()> {
    let file = File::create(path)
        .map_err(|e| ExtractError::ExportError(format!("{}: {}", path.display(), e)))?;
    let writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(table, writer)?,
        ExportFormat::Json => write_json(table, writer)?,
    }

    info!(path = %path.display(), records = table.len(), format = ?format, "结果表已导出");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ValueSource;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn table() -> ResultTable {
        let mut extra = HashMap::new();
        extra.insert("CLIENTE".to_string(), CellValue::text("Ana Gómez"));
        extra.insert("NOTAS".to_string(), CellValue::Empty);
        let record = ServiceRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            address: "Calle 10, Bogotá".to_string(),
            service_description: "Revisión".to_string(),
            combined_value: 100000.0,
            original_value: 100000.0,
            materials: String::new(),
            materials_value: 0.0,
            tax: 19000.0,
            subtotal: 50000.0,
            total_company: 69000.0,
            sheet: "Enero".to_string(),
            row_number: 2,
            value_source: ValueSource::ServiceValue,
            extra,
        };
        ResultTable::consolidate(vec![record], &["CLIENTE".to_string(), "NOTAS".to_string()])
    }

    #[test]
    fn test_write_csv() {
        let mut buf = Vec::new();
        write_csv(&table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "date,address,service_description,combined_value,original_value,materials,materials_value,tax,subtotal,total_company,CLIENTE"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-01-05,\"Calle 10, Bogotá\",Revisión,100000,100000,,0,19000,50000,69000,Ana Gómez"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_write_json() {
        let mut buf = Vec::new();
        write_json(&table(), &mut buf).unwrap();
        let doc: Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(doc["records"][0]["date"], "2024-01-05");
        assert_eq!(doc["records"][0]["total_company"], 69000.0);
        assert_eq!(doc["records"][0]["CLIENTE"], "Ana Gómez");
        assert_eq!(doc["totals"]["tax"], 19000.0);
        assert_eq!(doc["columns"].as_array().unwrap().len(), 11);
    }

    #[test]
    fn test_export_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("a")), ExportFormat::Csv);
    }

    #[test]
    fn test_export_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relacion.csv");

        export_to_path(&table(), &path, ExportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,address"));
    }
}
