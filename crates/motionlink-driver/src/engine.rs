//! 运动引擎
//!
//! 把"解析 → 调度 → 采样"串起来，对外暴露 `update` / `value` 两组接口。

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use arc_swap::ArcSwap;
use motionlink_protocol::{AXIS_COUNT, Axis, AxisCommand, tokens};
use tracing::trace;

use crate::clock::{Clock, MonotonicClock};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::state::ValueSnapshot;
use crate::transition::Transition;

/// 六轴运动引擎
///
/// # 两种驱动方式
///
/// - **轮询（UDP）**：同一线程在每个 tick 调用 `update(Some(text))` 或 `update(None)`。
/// - **后台解析（串口）**：读线程调用 [`apply`](Self::apply) 替换过渡记录，
///   tick 线程调用 `update(None)` 重算并发布快照。两者只通过逐轴的过渡记录交互。
///
/// # 时间
///
/// 所有 `*_at` 方法显式接收时间；不带后缀的版本读取注入的 [`Clock`]。
///
/// # 示例
///
/// ```
/// use motionlink_driver::{Axis, ManualClock, MotionEngine};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = Arc::new(ManualClock::new());
/// let engine = MotionEngine::with_clock(clock.clone());
///
/// engine.update(Some("L0999I1000"));
/// assert_eq!(engine.value(Axis::L0), 0.5);
///
/// clock.advance(Duration::from_millis(500));
/// engine.update(None);
/// assert!((engine.value(Axis::L0) - 0.75).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct MotionEngine {
    clock: Arc<dyn Clock>,
    /// 逐轴过渡记录（整体替换）
    transitions: [ArcSwap<Transition>; AXIS_COUNT],
    /// 最近一次 tick 的快照
    values: ArcSwap<ValueSnapshot>,
    metrics: EngineMetrics,
}

impl MotionEngine {
    /// 使用单调时钟创建引擎
    pub fn new() -> Self {
        Self::with_clock(Arc::new(MonotonicClock::new()))
    }

    /// 使用指定时钟创建引擎，所有轴初始化为 0.5
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            transitions: std::array::from_fn(|i| {
                let axis = Axis::ALL[i];
                ArcSwap::from_pointee(Transition::hold(axis, axis.default_value(), now))
            }),
            values: ArcSwap::from_pointee(ValueSnapshot::neutral(now)),
            metrics: EngineMetrics::new(),
            clock,
        }
    }

    /// 当前时间（读取注入的时钟）
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// 一个 tick：解析可选文本并重算全部轴
    pub fn update(&self, text: Option<&str>) -> ValueSnapshot {
        self.update_at(text, self.clock.now())
    }

    /// 在给定时刻执行一个 tick
    ///
    /// 1. 如有文本，解析并逐条调度；
    /// 2. 以同一个 `now` 重算六个轴并发布快照。
    ///
    /// 没有文本不是错误：在途过渡继续向目标推进。
    pub fn update_at(&self, text: Option<&str>, now: Duration) -> ValueSnapshot {
        if let Some(text) = text {
            self.apply_at(text, now);
        }
        self.tick_at(now)
    }

    /// 只解析和调度，不重算快照（串口读线程使用）
    ///
    /// 返回本次应用的指令数。
    pub fn apply(&self, text: &str) -> usize {
        self.apply_at(text, self.clock.now())
    }

    /// 在给定时刻解析和调度
    pub fn apply_at(&self, text: &str, now: Duration) -> usize {
        self.metrics.lines_received.fetch_add(1, Ordering::Relaxed);

        let mut applied = 0;
        for token in tokens(text) {
            match token {
                Ok(cmd) => {
                    self.schedule(&cmd, now);
                    applied += 1;
                },
                Err(e) => {
                    self.metrics.tokens_rejected.fetch_add(1, Ordering::Relaxed);
                    trace!("Skipping malformed token: {}", e);
                },
            }
        }
        applied
    }

    /// 调度单条指令：采样在途值作为起点，整体替换该轴的过渡记录
    pub fn schedule(&self, cmd: &AxisCommand, now: Duration) {
        self.transitions[cmd.axis.index()].rcu(|current| Arc::new(current.retarget(cmd, now)));
        self.metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
        trace!("Scheduled {} -> {:.4} ({:?})", cmd.axis, cmd.value, cmd.timing);
    }

    /// 重算快照（读取注入的时钟）
    pub fn tick(&self) -> ValueSnapshot {
        self.tick_at(self.clock.now())
    }

    /// 以同一时间戳重算全部轴并原子发布
    pub fn tick_at(&self, now: Duration) -> ValueSnapshot {
        let tick = self.metrics.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = ValueSnapshot {
            timestamp: now,
            tick,
            values: std::array::from_fn(|i| self.transitions[i].load().sample(now)),
        };
        self.values.store(Arc::new(snapshot));
        snapshot
    }

    /// 最近一次 tick 计算出的轴值（不会触发重算）
    pub fn value(&self, axis: Axis) -> f64 {
        self.values.load().value(axis)
    }

    /// 最近一次 tick 的完整快照
    pub fn snapshot(&self) -> ValueSnapshot {
        **self.values.load()
    }

    /// 当前过渡记录（诊断用）
    pub fn transition(&self, axis: Axis) -> Transition {
        **self.transitions[axis.index()].load()
    }

    /// 运行指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Default for MotionEngine {
    fn default() -> Self {
        Self::new()
    }
}
