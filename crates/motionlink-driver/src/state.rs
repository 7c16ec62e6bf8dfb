//! 值存储快照

use std::time::Duration;

use motionlink_protocol::{AXIS_COUNT, Axis};

/// 六轴数值快照
///
/// 同一快照内的六个值来自同一个 tick、同一个时间戳，读取方看到的总是一组一致的值。
///
/// 更新频率：每个 tick 一次
/// 同步机制：ArcSwap（tick 线程整体发布，任意线程无锁读取）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueSnapshot {
    /// 计算该快照时使用的时间（相对时钟起点）
    pub timestamp: Duration,
    /// tick 序号（构造时为 0）
    pub tick: u64,
    /// 按 [`Axis::index`] 排列的轴数值
    pub values: [f64; AXIS_COUNT],
}

impl ValueSnapshot {
    /// 所有轴处于默认值
    pub fn neutral(at: Duration) -> Self {
        Self {
            timestamp: at,
            tick: 0,
            values: Axis::ALL.map(Axis::default_value),
        }
    }

    pub fn value(&self, axis: Axis) -> f64 {
        self.values[axis.index()]
    }

    /// 按轴顺序遍历 `(轴, 值)`
    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL.iter().map(|&axis| (axis, self.value(axis)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_snapshot() {
        let snapshot = ValueSnapshot::neutral(Duration::from_secs(2));
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.timestamp, Duration::from_secs(2));
        for (axis, value) in snapshot.iter() {
            assert_eq!(value, 0.5, "axis {axis}");
        }
        assert_eq!(snapshot.iter().count(), AXIS_COUNT);
    }
}
