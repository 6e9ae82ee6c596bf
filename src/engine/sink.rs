// ==========================================
// 服务关系提取引擎 - 诊断输出接口
// ==========================================
// 职责: 引擎 → 宿主的唯一诊断通道
// 说明: 引擎同步调用 sink，不假设任何默认打印行为
// ==========================================

use crate::domain::types::LogLevel;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

// ==========================================
// LogSink Trait
// ==========================================
// 实现者: 任意 Fn(&str, LogLevel)、TracingSink、CollectingSink
pub trait LogSink: Sync {
    fn log(&self, message: &str, level: LogLevel);

    fn info(&self, message: &str) {
        self.log(message, LogLevel::Info);
    }

    fn success(&self, message: &str) {
        self.log(message, LogLevel::Success);
    }

    fn warning(&self, message: &str) {
        self.log(message, LogLevel::Warning);
    }

    fn error(&self, message: &str) {
        self.log(message, LogLevel::Error);
    }
}

impl<F> LogSink for F
where
    F: Fn(&str, LogLevel) + Sync,
{
    fn log(&self, message: &str, level: LogLevel) {
        self(message, level)
    }
}

// ==========================================
// NullSink - 丢弃全部消息
// ==========================================
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _message: &str, _level: LogLevel) {}
}

// ==========================================
// TracingSink - 转发到 tracing
// ==========================================
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str, level: LogLevel) {
        match level {
            LogLevel::Info => tracing::info!(target: "service_relations::sink", "{}", message),
            LogLevel::Success => {
                tracing::info!(target: "service_relations::sink", success = true, "{}", message)
            }
            LogLevel::Warning => tracing::warn!(target: "service_relations::sink", "{}", message),
            LogLevel::Error => tracing::error!(target: "service_relations::sink", "{}", message),
        }
    }
}

// ==========================================
// CollectingSink - 内存收集
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集消息的快照
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 指定级别的消息
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// 是否存在包含指定片段的消息
    pub fn contains(&self, fragment: &str) -> bool {
        self.entries().iter().any(|e| e.message.contains(fragment))
    }
}

impl LogSink for CollectingSink {
    fn log(&self, message: &str, level: LogLevel) {
        let entry = LogEntry {
            level,
            message: message.to_string(),
        };
        match self.entries.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}
