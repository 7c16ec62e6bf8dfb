//! 驱动层
//!
//! 本模块把解析后的轴指令变成随时间演进的轴数值，包括：
//! - 时钟抽象（单调时钟 / 手动时钟，不读取墙上时间）
//! - 逐轴过渡调度（线性插值，连续性保证）
//! - 值存储（每个 tick 原子发布六轴快照，ArcSwap 无锁读取）
//! - 运行指标（原子计数器）
//!
//! # 线程模型
//!
//! 所有状态都是"整体替换的不可变记录"：每个轴的 [`Transition`] 存放在独立的
//! `ArcSwap` 中，写入方（解析线程）一次性替换整条记录，读取方（tick 线程）
//! 永远不会读到撕裂的数据。六个轴之间互不加锁。

mod clock;
mod engine;
pub mod metrics;
mod state;
mod transition;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use engine::MotionEngine;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use motionlink_protocol::{AXIS_COUNT, Axis, AxisCommand, Timing};
pub use state::ValueSnapshot;
pub use transition::Transition;
