// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的工作表构建、临时账簿文件等功能
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use service_relations::domain::{CellValue, RawSheet};
use service_relations::MemoryWorkbook;
use std::io::Write;
use tempfile::NamedTempFile;

/// 标准表头（与业务账簿一致）
pub const STANDARD_HEADERS: [&str; 10] = [
    "FECHA",
    "DIRECCION",
    "SERVICIO REALIZADO",
    "FORMA DE PAGO",
    "ESTADO DEL SERVICIO",
    "VALOR SERVICIO",
    "VALOR DOMICILIO",
    "IVA",
    "MATERIALES",
    "VALOR MATERIALES",
];

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==========================================
// 服务行构建器
// ==========================================
#[derive(Debug, Clone)]
pub struct ServiceRowBuilder {
    date: CellValue,
    address: CellValue,
    description: CellValue,
    payment: CellValue,
    status: CellValue,
    service_value: CellValue,
    home_visit_value: CellValue,
    tax: CellValue,
    materials: CellValue,
    materials_value: CellValue,
}

impl ServiceRowBuilder {
    /// 默认: 现金支付、状态为空、无金额
    pub fn new(date: &str) -> Self {
        Self {
            date: CellValue::text(date),
            address: CellValue::Empty,
            description: CellValue::Empty,
            payment: CellValue::text("EFECTIVO"),
            status: CellValue::Empty,
            service_value: CellValue::Empty,
            home_visit_value: CellValue::Empty,
            tax: CellValue::Empty,
            materials: CellValue::Empty,
            materials_value: CellValue::Empty,
        }
    }

    pub fn address(mut self, address: &str) -> Self {
        self.address = CellValue::text(address);
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = CellValue::text(description);
        self
    }

    pub fn payment(mut self, payment: &str) -> Self {
        self.payment = CellValue::text(payment);
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = CellValue::text(status);
        self
    }

    pub fn service_value(mut self, value: impl Into<CellValue>) -> Self {
        self.service_value = value.into();
        self
    }

    pub fn home_visit_value(mut self, value: impl Into<CellValue>) -> Self {
        self.home_visit_value = value.into();
        self
    }

    pub fn tax(mut self, value: impl Into<CellValue>) -> Self {
        self.tax = value.into();
        self
    }

    pub fn materials(mut self, materials: &str, value: impl Into<CellValue>) -> Self {
        self.materials = CellValue::text(materials);
        self.materials_value = value.into();
        self
    }

    /// 按 STANDARD_HEADERS 顺序输出单元格
    pub fn build(self) -> Vec<CellValue> {
        vec![
            self.date,
            self.address,
            self.description,
            self.payment,
            self.status,
            self.service_value,
            self.home_visit_value,
            self.tax,
            self.materials,
            self.materials_value,
        ]
    }
}

/// 使用标准表头构建工作表
pub fn standard_sheet(name: &str, rows: Vec<ServiceRowBuilder>) -> RawSheet {
    sheet_with_headers(
        name,
        &STANDARD_HEADERS,
        rows.into_iter().map(ServiceRowBuilder::build).collect(),
    )
}

/// 使用任意表头构建工作表（表头位于第 1 行）
pub fn sheet_with_headers(name: &str, headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawSheet {
    let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    RawSheet::from_grid(name, &headers, rows, 1)
}

/// 1 月份三行现金服务
pub fn january_sheet() -> RawSheet {
    standard_sheet(
        "Enero",
        vec![
            ServiceRowBuilder::new("01/01/2024").service_value(100000.0),
            ServiceRowBuilder::new("15/01/2024").service_value("$ 80,000"),
            ServiceRowBuilder::new("31/01/2024").home_visit_value(30000.0),
        ],
    )
}

pub fn workbook(sheets: Vec<RawSheet>) -> MemoryWorkbook {
    sheets
        .into_iter()
        .fold(MemoryWorkbook::new(), |wb, sheet| wb.with_sheet(sheet))
}

/// 创建临时 CSV 账簿文件
pub fn create_csv_workbook(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("Relacion")
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
