// ==========================================
// 服务关系提取引擎 - 提取配置
// ==========================================
// 职责: 业务常量（小计比例、付款标记、固定表头）的加载与校验
// 来源: 默认值 → JSON 文件 → 环境变量（后者覆盖前者）
// ==========================================

use crate::importer::error::{ExtractError, ExtractResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 环境变量键
pub mod config_keys {
    pub const SUBTOTAL_RATIO: &str = "SERVICE_RELATIONS_SUBTOTAL_RATIO";
    pub const PAYMENT_MARKER: &str = "SERVICE_RELATIONS_PAYMENT_MARKER";
}

// ==========================================
// ExtractionConfig - 提取配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// 小计比例（subtotal = combined_value * ratio）
    pub subtotal_ratio: f64,

    /// 合格付款方式（比较前 TRIM + UPPER）
    pub payment_marker: String,

    /// 日期列（精确匹配）
    pub date_header: String,

    /// 付款方式列（精确匹配）
    pub payment_header: String,

    /// 服务状态列（精确匹配）
    pub status_header: String,

    /// 金额无法解析时是否按工作表输出警告计数
    pub warn_unparseable_money: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            subtotal_ratio: 0.5,
            payment_marker: "EFECTIVO".to_string(),
            date_header: "FECHA".to_string(),
            payment_header: "FORMA DE PAGO".to_string(),
            status_header: "ESTADO DEL SERVICIO".to_string(),
            warn_unparseable_money: true,
        }
    }
}

impl ExtractionConfig {
    /// 从 JSON 文件加载（缺失字段取默认值）
    pub fn from_json_file(path: &Path) -> ExtractResult<Self> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: ExtractionConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 加载配置: 可选 JSON 文件 + 环境变量覆盖
    pub fn load(path: Option<&Path>) -> ExtractResult<Self> {
        let config = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok())?;
        debug!(?config, "提取配置已加载");
        Ok(config)
    }

    /// 应用环境变量覆盖
    ///
    /// # 参数
    /// - lookup: 环境变量读取函数（便于测试注入）
    pub fn with_env_overrides<F>(mut self, lookup: F) -> ExtractResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(config_keys::SUBTOTAL_RATIO) {
            self.subtotal_ratio =
                raw.trim()
                    .parse::<f64>()
                    .map_err(|e| ExtractError::ConfigValueError {
                        key: config_keys::SUBTOTAL_RATIO.to_string(),
                        value: raw.clone(),
                        message: e.to_string(),
                    })?;
        }

        if let Some(raw) = lookup(config_keys::PAYMENT_MARKER) {
            self.payment_marker = raw;
        }

        self.validate()?;
        Ok(self)
    }

    /// 校验配置值
    pub fn validate(&self) -> ExtractResult<()> {
        if !self.subtotal_ratio.is_finite() || self.subtotal_ratio < 0.0 {
            return Err(ExtractError::ConfigValueError {
                key: "subtotal_ratio".to_string(),
                value: self.subtotal_ratio.to_string(),
                message: "必须为非负有限数".to_string(),
            });
        }

        for (key, value) in [
            ("payment_marker", &self.payment_marker),
            ("date_header", &self.date_header),
            ("payment_header", &self.payment_header),
            ("status_header", &self.status_header),
        ] {
            if value.trim().is_empty() {
                return Err(ExtractError::ConfigValueError {
                    key: key.to_string(),
                    value: value.clone(),
                    message: "不能为空".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 规范化后的付款标记
    pub fn normalized_payment_marker(&self) -> String {
        self.payment_marker.trim().to_uppercase()
    }
}
