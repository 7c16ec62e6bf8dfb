//! # motionlink 输入源
//!
//! 把外部文本输入（UDP 数据报、串口行）接入 [`MotionEngine`](motionlink_driver::MotionEngine)。
//!
//! 两种输入源遵循同一个契约 [`MotionSource`]：
//! - [`UdpSource`]：非阻塞轮询，每个 tick 只取最新的数据报（latest wins）
//! - [`SerialSource`]：后台读线程按行解析，tick 线程只负责重算
//!
//! 传输层故障在适配器边界被捕获、记录日志，并使输入源进入 [`SourceState::Faulted`]，
//! 不会传播到 tick 循环。

use std::net::SocketAddr;

use thiserror::Error;

pub mod config;
pub mod serial;
pub mod state;
pub mod udp;

pub use config::{AddressScope, STANDARD_BAUD_RATES, SerialConfig, UdpConfig};
pub use serial::{SerialSource, available_ports};
pub use state::{AtomicSourceState, SourceState};
pub use udp::UdpSource;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Reader thread error: {0}")]
    ReaderThread(String),
}

/// 输入源契约
///
/// # 生命周期
///
/// - `start`：对已运行的输入源调用是空操作
/// - `stop`：幂等；返回前释放底层资源（socket / 串口），可以立即重新打开同一端口
/// - `poll`：每个 tick 调用一次，返回本 tick 要交给 `MotionEngine::update` 的文本
///
/// 实现者在 `Drop` 中执行 `stop`。
pub trait MotionSource: Send {
    /// 打开底层资源并开始接收
    ///
    /// 配置错误（端口、波特率、地址）从这里返回，输入源保持停止状态。
    fn start(&mut self) -> Result<(), TransportError>;

    /// 停止接收并释放底层资源
    fn stop(&mut self);

    /// 取出本 tick 的输入文本
    ///
    /// 从不失败：故障只记录日志并停止输入源。
    fn poll(&mut self) -> Option<String>;

    /// 当前状态
    fn state(&self) -> SourceState;

    /// 输入源名称（用于日志）
    fn name(&self) -> &'static str;

    /// 是否正在运行
    fn is_running(&self) -> bool {
        self.state() == SourceState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Config("baud rate 12345 is not supported".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: baud rate 12345 is not supported"
        );

        let addr: SocketAddr = "127.0.0.1:8889".parse().unwrap();
        let err = TransportError::Bind {
            addr,
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:8889"));
    }
}
