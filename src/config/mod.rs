// ==========================================
// 服务关系提取引擎 - 配置层
// ==========================================
// 职责: 提取配置加载（默认值 / JSON 文件 / 环境变量）
// ==========================================

pub mod extraction_config;

// 重导出核心配置
pub use extraction_config::{config_keys, ExtractionConfig};
