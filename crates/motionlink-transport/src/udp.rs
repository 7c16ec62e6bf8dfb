//! UDP 输入源
//!
//! 单个未连接的 socket，非阻塞读取。每次 `poll` 取空接收缓冲区，
//! 只返回最后一个数据报（latest wins），较早的数据报直接丢弃。

use std::io;
use std::net::{SocketAddr, UdpSocket};

use tracing::{debug, error, info, trace};

use crate::config::UdpConfig;
use crate::state::SourceState;
use crate::{MotionSource, TransportError};

/// UDP 最大载荷
const RECV_BUFFER_SIZE: usize = 64 * 1024;

/// UDP 输入源
///
/// # 示例
///
/// ```no_run
/// use motionlink_driver::MotionEngine;
/// use motionlink_transport::{MotionSource, UdpConfig, UdpSource};
///
/// let engine = MotionEngine::new();
/// let mut source = UdpSource::new(UdpConfig::default());
/// source.start()?;
///
/// // 每个 tick：
/// let text = source.poll();
/// engine.update(text.as_deref());
/// # Ok::<(), motionlink_transport::TransportError>(())
/// ```
#[derive(Debug)]
pub struct UdpSource {
    config: UdpConfig,
    socket: Option<UdpSocket>,
    buf: Box<[u8]>,
    state: SourceState,
}

impl UdpSource {
    pub fn new(config: UdpConfig) -> Self {
        Self {
            config,
            socket: None,
            buf: vec![0u8; RECV_BUFFER_SIZE].into_boxed_slice(),
            state: SourceState::Stopped,
        }
    }

    pub fn config(&self) -> &UdpConfig {
        &self.config
    }

    /// 实际绑定的地址（端口为 0 时由系统分配）
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    fn fault(&mut self) {
        self.socket = None;
        self.state = SourceState::Faulted;
    }
}

/// 取空接收缓冲区，返回最后一个数据报
fn drain_latest(socket: &UdpSocket, buf: &mut [u8]) -> io::Result<Option<String>> {
    let mut latest = None;
    let mut dropped = 0usize;

    loop {
        match socket.recv(buf) {
            Ok(len) => {
                if latest.is_some() {
                    dropped += 1;
                }
                latest = Some(String::from_utf8_lossy(&buf[..len]).into_owned());
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // Windows 上收到 ICMP port unreachable 后会返回 ConnectionReset
            Err(e) if e.kind() == io::ErrorKind::ConnectionReset => continue,
            Err(e) => return Err(e),
        }
    }

    if dropped > 0 {
        trace!("Dropped {} stale datagram(s)", dropped);
    }
    Ok(latest)
}

impl MotionSource for UdpSource {
    fn start(&mut self) -> Result<(), TransportError> {
        if self.socket.is_some() {
            return Ok(());
        }

        let addr = self.config.bind_addr();
        let socket =
            UdpSocket::bind(addr).map_err(|source| TransportError::Bind { addr, source })?;
        socket.set_nonblocking(true)?;

        info!("UDP source listening on {}", socket.local_addr()?);
        self.socket = Some(socket);
        self.state = SourceState::Running;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(socket) = self.socket.take() {
            debug!("Closing UDP socket {:?}", socket.local_addr().ok());
            drop(socket);
            info!("UDP source stopped");
        }
        if self.state == SourceState::Running {
            self.state = SourceState::Stopped;
        }
    }

    fn poll(&mut self) -> Option<String> {
        let socket = self.socket.as_ref()?;
        match drain_latest(socket, &mut self.buf) {
            Ok(latest) => latest,
            Err(e) => {
                error!("UDP receive failed, stopping source: {}", e);
                self.fault();
                None
            },
        }
    }

    fn state(&self) -> SourceState {
        self.state
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}

impl Drop for UdpSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_before_start_returns_none() {
        let mut source = UdpSource::new(UdpConfig::default().port(0));
        assert_eq!(source.poll(), None);
        assert_eq!(source.state(), SourceState::Stopped);
        assert!(source.local_addr().is_none());
    }

    #[test]
    fn test_stop_before_start_is_noop() {
        let mut source = UdpSource::new(UdpConfig::default().port(0));
        source.stop();
        source.stop();
        assert_eq!(source.state(), SourceState::Stopped);
    }

    #[test]
    fn test_start_twice_keeps_socket() {
        let mut source = UdpSource::new(UdpConfig::default().port(0));
        source.start().unwrap();
        let addr = source.local_addr().unwrap();
        source.start().unwrap();
        assert_eq!(source.local_addr(), Some(addr));
        assert!(source.is_running());
    }

    #[test]
    fn test_bind_conflict_reports_address() {
        let holder = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = holder.local_addr().unwrap().port();

        let mut source = UdpSource::new(UdpConfig::default().port(port));
        match source.start() {
            Err(TransportError::Bind { addr, .. }) => assert_eq!(addr.port(), port),
            other => panic!("expected bind error, got {other:?}"),
        }
        assert_eq!(source.state(), SourceState::Stopped);
    }
}
