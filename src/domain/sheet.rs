// ==========================================
// 服务关系提取引擎 - 原始工作表模型
// ==========================================
// 职责: 单元格值 / 原始行 / 原始工作表
// 生命周期: 每个账簿读取一次，处理完即丢弃
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// CellValue - 单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    /// 构造文本单元格（空白文本视为 Empty）
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// 是否为空值（Empty / 空白文本 / NaN）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Bool(_) | CellValue::Date(_) => false,
        }
    }

    /// 单元格的文本表示（空值 → 空串）
    pub fn as_text(&self) -> String {
        if self.is_blank() {
            return String::new();
        }
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                // 整数值不带小数部分输出
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

static EMPTY_CELL: CellValue = CellValue::Empty;

// ==========================================
// RawRow - 原始行
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    /// 工作表中的行号（从 1 开始，表头行也计数）
    pub row_number: usize,
    /// 表头名 → 单元格值
    pub cells: HashMap<String, CellValue>,
}

impl RawRow {
    /// 读取指定列（列不存在时返回 Empty）
    pub fn get(&self, header: &str) -> &CellValue {
        self.cells.get(header).unwrap_or(&EMPTY_CELL)
    }

    /// 读取可选列
    pub fn get_opt(&self, header: Option<&str>) -> &CellValue {
        match header {
            Some(h) => self.get(h),
            None => &EMPTY_CELL,
        }
    }
}

// ==========================================
// RawSheet - 原始工作表
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSheet {
    pub name: String,
    /// 规范化后的表头（去空白、空表头补名、重名加后缀）
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    /// 由表头 + 数据网格构造工作表
    ///
    /// # 参数
    /// - name: 工作表名
    /// - header_cells: 表头行原始文本
    /// - data: 数据行（按表头位置对应）
    /// - header_row: 表头所在行号（从 1 开始）
    ///
    /// # 说明
    /// - 完全空白的行被跳过，但行号仍按工作表位置计算
    pub fn from_grid<I>(name: &str, header_cells: &[String], data: I, header_row: usize) -> Self
    where
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let headers = normalize_headers(header_cells);

        let mut rows = Vec::new();
        for (offset, cells) in data.into_iter().enumerate() {
            if cells.iter().all(CellValue::is_blank) {
                continue;
            }

            let mut row_map = HashMap::with_capacity(headers.len());
            for (idx, cell) in cells.into_iter().enumerate() {
                if let Some(header) = headers.get(idx) {
                    row_map.insert(header.clone(), cell);
                }
            }

            rows.push(RawRow {
                row_number: header_row + offset + 1,
                cells: row_map,
            });
        }

        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// 数据行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 规范化表头
///
/// - TRIM 首尾空白
/// - 空表头 → `Unnamed: <列序号>`
/// - 重名表头 → `NAME.1`、`NAME.2` ...
pub fn normalize_headers(header_cells: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(header_cells.len());

    for (idx, raw) in header_cells.iter().enumerate() {
        let trimmed = raw.trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            trimmed.to_string()
        };

        let count = seen.entry(base.clone()).or_insert(0);
        let header = if *count == 0 {
            base
        } else {
            format!("{}.{}", base, count)
        };
        *count += 1;
        headers.push(header);
    }

    headers
}
