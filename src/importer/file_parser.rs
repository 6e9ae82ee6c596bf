// ==========================================
// 服务关系提取引擎 - 账簿读取器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls/.ods) / CSV (.csv) / 内存账簿
// ==========================================

use crate::domain::sheet::{CellValue, RawSheet};
use crate::importer::error::{ExtractError, ExtractResult};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Excel 类扩展名
const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "xla", "xlam", "ods"];

// ==========================================
// WorkbookSource Trait
// ==========================================
// 用途: 按工作表逐个读取的账簿接口
// 实现者: ExcelWorkbook, CsvWorkbook, MemoryWorkbook
pub trait WorkbookSource {
    /// 工作表名称（按存储顺序）
    fn sheet_names(&self) -> Vec<String>;

    /// 读取单个工作表
    ///
    /// # 返回
    /// - Ok(RawSheet): 规范化表头后的工作表
    /// - Err: 工作表不存在或解析失败（仅影响该工作表）
    fn load_sheet(&mut self, name: &str) -> ExtractResult<RawSheet>;
}

// ==========================================
// ExcelWorkbook 实现
// ==========================================
pub struct ExcelWorkbook {
    sheets: Sheets<BufReader<File>>,
}

impl ExcelWorkbook {
    pub fn open(path: &Path) -> ExtractResult<Self> {
        // 检查文件存在
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = extension_of(path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ExtractError::UnsupportedFormat(ext));
        }

        let sheets = open_workbook_auto(path)?;
        Ok(Self { sheets })
    }
}

impl WorkbookSource for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn load_sheet(&mut self, name: &str) -> ExtractResult<RawSheet> {
        let range = self.sheets.worksheet_range(name)?;

        // 表头所在行号（区域可能不从 A1 开始）
        let header_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);

        let mut rows = range.rows();
        let header_cells: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|c| c.to_string()).collect(),
            None => {
                return Ok(RawSheet {
                    name: name.to_string(),
                    ..RawSheet::default()
                })
            }
        };

        let data = rows.map(|row| row.iter().map(cell_from_excel).collect::<Vec<_>>());
        Ok(RawSheet::from_grid(name, &header_cells, data, header_row))
    }
}

/// calamine 单元格 → CellValue
fn cell_from_excel(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // as_datetime() 按账簿的 1900/1904 日期系统换算
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::text(s.as_str())),
        Data::DurationIso(s) => CellValue::text(s.as_str()),
        // 公式错误（#N/A 等）按空值处理
        Data::Error(_) => CellValue::Empty,
    }
}

/// ISO 8601 日期/日期时间文本（ODS 使用）
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ==========================================
// CsvWorkbook 实现
// ==========================================
// CSV 视为只有一个工作表的账簿（表名 = 文件名主干）
pub struct CsvWorkbook {
    sheet: RawSheet,
}

impl CsvWorkbook {
    pub fn open(path: &Path) -> ExtractResult<Self> {
        // 检查文件存在
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = extension_of(path);
        if ext != "csv" {
            return Err(ExtractError::UnsupportedFormat(ext));
        }

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string();

        let delimiter = sniff_delimiter(path)?;
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头（去掉 UTF-8 BOM）
        let header_cells: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        // 读取所有行
        let mut data = Vec::new();
        for result in reader.records() {
            let record = result?;
            data.push(record.iter().map(CellValue::text).collect::<Vec<_>>());
        }

        Ok(Self {
            sheet: RawSheet::from_grid(&name, &header_cells, data, 1),
        })
    }
}

impl WorkbookSource for CsvWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet.name.clone()]
    }

    fn load_sheet(&mut self, name: &str) -> ExtractResult<RawSheet> {
        if name != self.sheet.name {
            return Err(ExtractError::SheetNotFound(name.to_string()));
        }
        Ok(self.sheet.clone())
    }
}

/// 根据首行判断分隔符（西语区导出的 CSV 常用 ';'）
fn sniff_delimiter(path: &Path) -> ExtractResult<u8> {
    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;

    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

// ==========================================
// MemoryWorkbook 实现
// ==========================================
// 宿主已持有数据（或测试）时使用
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<RawSheet>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, sheet: RawSheet) -> Self {
        self.sheets.push(sheet);
        self
    }
}

impl WorkbookSource for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn load_sheet(&mut self, name: &str) -> ExtractResult<RawSheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| ExtractError::SheetNotFound(name.to_string()))
    }
}

// ==========================================
// 通用账簿读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalWorkbookReader;

impl UniversalWorkbookReader {
    pub fn open<P: AsRef<Path>>(&self, file_path: P) -> ExtractResult<Box<dyn WorkbookSource>> {
        let path = file_path.as_ref();
        let ext = extension_of(path);

        match ext.as_str() {
            "csv" => Ok(Box::new(CsvWorkbook::open(path)?)),
            e if EXCEL_EXTENSIONS.contains(&e) => Ok(Box::new(ExcelWorkbook::open(path)?)),
            _ => Err(ExtractError::UnsupportedFormat(ext)),
        }
    }
}

/// 按扩展名打开账簿
pub fn open_workbook_source<P: AsRef<Path>>(file_path: P) -> ExtractResult<Box<dyn WorkbookSource>> {
    UniversalWorkbookReader.open(file_path)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
