//! 日志输出
//!
//! 引擎只依赖一个接收单条文本的回调；这里提供几种常用实现。

use parking_lot::Mutex;
use std::sync::Arc;

/// 日志回调
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// 丢弃所有日志
pub fn noop_sink() -> LogSink {
    Arc::new(|_| {})
}

/// 转发到 tracing 的 info 级别
pub fn tracing_sink() -> LogSink {
    Arc::new(|message| tracing::info!(target: "rule_engine::log", "{}", message))
}

/// 内存日志缓冲，便于测试或事后查看执行过程
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成写入本缓冲的日志回调
    pub fn sink(&self) -> LogSink {
        let lines = Arc::clone(&self.lines);
        Arc::new(move |message| lines.lock().push(message.to_string()))
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}
