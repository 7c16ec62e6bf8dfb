//! 输入源状态
//!
//! 串口读线程和控制线程共享状态，因此提供原子版本。

use std::sync::atomic::{AtomicU8, Ordering};

/// 输入源状态
///
/// `Faulted` 在所有契约上都等同于 `Stopped`，只额外记录停止原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SourceState {
    /// 已停止（默认）
    #[default]
    Stopped = 0,
    /// 正在接收
    Running = 1,
    /// 因传输故障停止（EOF、I/O 错误）
    Faulted = 2,
}

impl SourceState {
    /// 从 u8 转换，无效值视为 Stopped
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Faulted,
            _ => Self::Stopped,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// 是否处于停止状态（包括 Faulted）
    pub fn is_stopped(self) -> bool {
        self != Self::Running
    }
}

/// 输入源状态（原子版本，用于线程间共享）
#[derive(Debug)]
pub struct AtomicSourceState {
    inner: AtomicU8,
}

impl AtomicSourceState {
    pub fn new(state: SourceState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> SourceState {
        SourceState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: SourceState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }

    /// 比较并交换
    ///
    /// 成功返回 `Ok(旧状态)`，失败返回 `Err(当前状态)`。
    pub fn compare_exchange(
        &self,
        current: SourceState,
        new: SourceState,
        success: Ordering,
        failure: Ordering,
    ) -> Result<SourceState, SourceState> {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), success, failure)
            .map(SourceState::from_u8)
            .map_err(SourceState::from_u8)
    }
}

impl Default for AtomicSourceState {
    fn default() -> Self {
        Self::new(SourceState::Stopped)
    }
}
