//! 时钟抽象
//!
//! 引擎的"当前时间"由外部注入：生产环境使用单调时钟，测试使用手动时钟，
//! 不需要真实等待即可驱动过渡。时间统一表示为相对时钟起点的 [`Duration`]。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 单调时间源
pub trait Clock: Send + Sync + fmt::Debug {
    /// 相对时钟起点的当前时间（单调不减）
    fn now(&self) -> Duration;
}

/// 基于 [`Instant`] 的单调时钟，起点为创建时刻
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// 手动推进的时钟（纳秒精度，可跨线程共享）
///
/// # 示例
///
/// ```
/// use motionlink_driver::{Clock, ManualClock};
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.now(), Duration::from_millis(250));
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// 创建起点为 0 的时钟
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建起点为 `start` 的时钟
    pub fn starting_at(start: Duration) -> Self {
        let clock = Self::new();
        clock.set(start);
        clock
    }

    /// 向前推进
    pub fn advance(&self, delta: Duration) {
        self.nanos.fetch_add(as_nanos(delta), Ordering::AcqRel);
    }

    /// 直接设置当前时间
    pub fn set(&self, now: Duration) {
        self.nanos.store(as_nanos(now), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

fn as_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
