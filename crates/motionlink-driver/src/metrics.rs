//! 引擎运行指标
//!
//! 提供零开销的原子计数器，用于观察输入链路的健康状况。
//! 所有计数器都使用原子操作，可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 引擎实时指标
///
/// # 使用示例
///
/// ```rust
/// use motionlink_driver::MotionEngine;
///
/// let engine = MotionEngine::new();
/// engine.update(Some("L0999 X"));
///
/// let snapshot = engine.metrics();
/// assert_eq!(snapshot.ticks, 1);
/// assert_eq!(snapshot.commands_applied, 1);
/// ```
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// tick（值存储重算）次数
    pub ticks: AtomicU64,

    /// 收到的文本（行/数据报）数
    pub lines_received: AtomicU64,

    /// 已应用的指令数
    pub commands_applied: AtomicU64,

    /// 被跳过的非法 token 数
    ///
    /// 如果这个值快速增长，通常说明波特率不匹配或发送端协议版本不一致。
    pub tokens_rejected: AtomicU64,
}

impl EngineMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    ///
    /// 使用 `Ordering::Relaxed`，不同计数器之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            lines_received: self.lines_received.load(Ordering::Relaxed),
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            tokens_rejected: self.tokens_rejected.load(Ordering::Relaxed),
        }
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub lines_received: u64,
    pub commands_applied: u64,
    pub tokens_rejected: u64,
}

impl MetricsSnapshot {
    /// 非法 token 占全部 token 的比例（无 token 时为 0）
    pub fn rejection_rate(&self) -> f64 {
        let total = self.commands_applied + self.tokens_rejected;
        if total == 0 {
            0.0
        } else {
            self.tokens_rejected as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(metrics.snapshot().rejection_rate(), 0.0);

        metrics.ticks.fetch_add(3, Ordering::Relaxed);
        metrics.commands_applied.fetch_add(2, Ordering::Relaxed);
        metrics.tokens_rejected.fetch_add(2, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.ticks, 3);
        assert_eq!(snapshot.rejection_rate(), 0.5);
        assert_eq!(snapshot.lines_received, 0);
    }
}
