//! 串口输入源
//!
//! 后台读线程阻塞读取换行结尾的文本行，每收到一整行就交给
//! [`MotionEngine::apply`] 解析调度；tick 线程只调用 `update(None)` 重算。
//! 两个线程只通过引擎内逐轴的过渡记录交互。

use std::io::{self, BufRead, BufReader, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{JoinHandle, spawn};
use std::time::Duration;

use motionlink_driver::MotionEngine;
use tracing::{debug, error, info, trace, warn};

use crate::config::SerialConfig;
use crate::state::{AtomicSourceState, SourceState};
use crate::{MotionSource, TransportError};

/// 停止时等待读线程退出的额外余量（在读超时之上）
const JOIN_MARGIN: Duration = Duration::from_millis(500);

/// 单行最大字节数，超出后丢弃未结束的半行
const MAX_LINE_LEN: usize = 4096;

/// 读线程名
const READER_THREAD_NAME: &str = "motionlink-serial-rx";

/// 列出系统中可用的串口
pub fn available_ports() -> Result<Vec<String>, TransportError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// 带超时的线程 join
///
/// 超时后不再等待，目标线程在后台继续运行直至自行退出。
trait JoinTimeout {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()>;
}

impl<T: Send + 'static> JoinTimeout for JoinHandle<T> {
    fn join_timeout(self, timeout: Duration) -> std::thread::Result<()> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();
        spawn(move || {
            let result = self.join();
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(join_result) => join_result.map(|_| ()),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Box::new(io::Error::new(
                io::ErrorKind::TimedOut,
                "Thread join timeout",
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(Box::new(io::Error::other(
                "Thread join channel disconnected",
            ))),
        }
    }
}

/// 串口输入源
///
/// `poll` 永远返回 `None`：文本在读线程中直接应用到引擎。
///
/// # 示例
///
/// ```no_run
/// use motionlink_driver::MotionEngine;
/// use motionlink_transport::{MotionSource, SerialConfig, SerialSource};
/// use std::sync::Arc;
///
/// let engine = Arc::new(MotionEngine::new());
/// let mut source = SerialSource::new(engine.clone(), SerialConfig::new("/dev/ttyUSB0"));
/// source.start()?;
///
/// // 每个 tick：
/// engine.update(None);
/// # Ok::<(), motionlink_transport::TransportError>(())
/// ```
#[derive(Debug)]
pub struct SerialSource {
    config: SerialConfig,
    engine: Arc<MotionEngine>,
    /// 当前读线程的运行标志（stop 时置 false），每个读线程独占一个
    running: Arc<AtomicBool>,
    state: Arc<AtomicSourceState>,
    reader_thread: Option<JoinHandle<()>>,
}

impl SerialSource {
    pub fn new(engine: Arc<MotionEngine>, config: SerialConfig) -> Self {
        Self {
            config,
            engine,
            running: Arc::new(AtomicBool::new(false)),
            state: Arc::new(AtomicSourceState::default()),
            reader_thread: None,
        }
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// 在任意字节流上运行读线程（pty、socket、测试桩）
    ///
    /// 已在运行时是空操作，传入的 reader 被丢弃。
    pub fn start_with_reader<R>(&mut self, reader: R) -> Result<(), TransportError>
    where
        R: Read + Send + 'static,
    {
        if self.running.load(Ordering::Acquire) {
            return Ok(());
        }
        self.spawn_reader(reader)
    }

    fn spawn_reader<R>(&mut self, reader: R) -> Result<(), TransportError>
    where
        R: Read + Send + 'static,
    {
        // 上一个读线程可能因故障自行退出，先回收
        self.join_reader();

        // join 超时的旧线程仍持有自己的标志（已为 false），不会被重新唤起
        let running = Arc::new(AtomicBool::new(true));
        self.running = running.clone();
        self.state.set(SourceState::Running, Ordering::Release);

        let engine = self.engine.clone();
        let state = self.state.clone();

        let handle = std::thread::Builder::new()
            .name(READER_THREAD_NAME.into())
            .spawn(move || reader_loop(reader, engine, running, state))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                self.state.set(SourceState::Stopped, Ordering::Release);
                TransportError::ReaderThread(e.to_string())
            })?;

        self.reader_thread = Some(handle);
        Ok(())
    }

    fn join_reader(&mut self) {
        let join_timeout = self.config.read_timeout + JOIN_MARGIN;
        if let Some(handle) = self.reader_thread.take()
            && let Err(_e) = handle.join_timeout(join_timeout)
        {
            error!(
                "Serial reader thread panicked or failed to shut down within {:?}",
                join_timeout
            );
        }
    }
}

impl MotionSource for SerialSource {
    fn start(&mut self) -> Result<(), TransportError> {
        if self.running.load(Ordering::Acquire) {
            return Ok(());
        }
        self.config.validate()?;
        if self.config.port_name.is_empty() {
            return Err(TransportError::Config("serial port name is empty".to_string()));
        }

        // 故障退出的读线程可能仍持有端口（独占打开），先回收再重新打开
        self.join_reader();

        let mut port = serialport::new(&self.config.port_name, self.config.baud_rate)
            .timeout(self.config.read_timeout)
            .open()?;
        port.write_data_terminal_ready(true)?;
        port.write_request_to_send(true)?;

        info!(
            "Serial source opened {} @ {} baud",
            self.config.port_name, self.config.baud_rate
        );
        self.spawn_reader(port)
    }

    fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.join_reader();

        // Faulted 保留故障原因
        let _ = self.state.compare_exchange(
            SourceState::Running,
            SourceState::Stopped,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if was_running {
            info!("Serial source stopped");
        }
    }

    fn poll(&mut self) -> Option<String> {
        None
    }

    fn state(&self) -> SourceState {
        self.state.get(Ordering::Acquire)
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}

impl Drop for SerialSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 读线程主循环
///
/// - 读超时：本轮无数据，已读到的半行保留在缓冲区中
/// - 半行超过 [`MAX_LINE_LEN`]：丢弃并记录警告
/// - EOF / I/O 错误：记录日志，标记 Faulted 并退出
fn reader_loop<R: Read>(
    reader: R,
    engine: Arc<MotionEngine>,
    running: Arc<AtomicBool>,
    state: Arc<AtomicSourceState>,
) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::with_capacity(256);

    debug!("Serial reader thread started");

    while running.load(Ordering::Acquire) {
        // 每次读取不超过剩余额度，额度至少为 1，Ok(0) 只表示 EOF
        let budget = MAX_LINE_LEN.saturating_sub(line.len()).max(1) as u64;
        match (&mut reader).take(budget).read_until(b'\n', &mut line) {
            Ok(0) => {
                // 流结束时残留的最后一行（没有换行符）也应用
                apply_line(&engine, &line);
                line.clear();
                warn!("Serial stream closed (EOF)");
                state.set(SourceState::Faulted, Ordering::Release);
                break;
            },
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    apply_line(&engine, &line);
                    line.clear();
                } else if line.len() >= MAX_LINE_LEN {
                    warn!("Dropping {} bytes without line terminator", line.len());
                    line.clear();
                }
            },
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                continue;
            },
            Err(e) => {
                error!("Serial read failed, stopping source: {}", e);
                state.set(SourceState::Faulted, Ordering::Release);
                break;
            },
        }
    }

    running.store(false, Ordering::Release);
    debug!("Serial reader thread exited");
}

fn apply_line(engine: &MotionEngine, raw: &[u8]) {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_end_matches(['\r', '\n']);
    if text.is_empty() {
        return;
    }
    let applied = engine.apply(text);
    trace!("Serial line {:?}: {} command(s)", text, applied);
}
