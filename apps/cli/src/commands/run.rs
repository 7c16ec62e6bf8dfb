//! run 命令
//!
//! 启动输入源，以固定频率驱动引擎并周期性输出轴数值，Ctrl+C 退出。

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::{Receiver, TryRecvError};
use motionlink_driver::MotionEngine;
use motionlink_transport::{MotionSource, SerialSource, SourceState, UdpSource};
use spin_sleep::SpinSleeper;
use tracing::{error, info, warn};

use crate::config::{FileConfig, OutputFormat, Overrides, RunSettings, Scope, TransportKind};
use crate::report::Report;

/// 落后超过这么多个周期时放弃追赶，重新对齐节拍
const MAX_TICK_LAG: u32 = 10;

/// run 命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 输入源类型
    #[arg(short, long, value_enum)]
    pub transport: Option<TransportKind>,

    /// UDP 监听端口（默认 8889）
    #[arg(short, long)]
    pub port: Option<u16>,

    /// UDP 监听范围
    #[arg(long, value_enum)]
    pub scope: Option<Scope>,

    /// 串口名（如 /dev/ttyUSB0、COM3）
    #[arg(long)]
    pub serial_port: Option<String>,

    /// 串口波特率（默认 115200）
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// tick 频率（Hz，默认 100）
    #[arg(long)]
    pub tick_hz: Option<u32>,

    /// 报告频率（Hz，默认 2）
    #[arg(long)]
    pub report_hz: Option<f64>,

    /// 报告输出格式
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// TOML 配置文件（命令行参数优先）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RunCommand {
    fn overrides(&self) -> Overrides {
        Overrides {
            transport: self.transport,
            port: self.port,
            scope: self.scope,
            serial_port: self.serial_port.clone(),
            baud: self.baud,
            tick_hz: self.tick_hz,
            report_hz: self.report_hz,
            format: self.format,
        }
    }

    pub fn execute(&self) -> Result<()> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let settings = RunSettings::resolve(file, self.overrides())?;

        let engine = Arc::new(MotionEngine::new());
        let mut source: Box<dyn MotionSource> = match settings.transport {
            TransportKind::Udp => Box::new(UdpSource::new(settings.udp.clone())),
            TransportKind::Serial => {
                Box::new(SerialSource::new(engine.clone(), settings.serial.clone()))
            },
        };

        let mut out = io::stdout().lock();
        start_source(source.as_mut(), settings.format, &mut out)?;

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        ctrlc::set_handler(move || {
            let _ = shutdown_tx.try_send(());
        })
        .context("Failed to set Ctrl+C handler")?;

        info!(
            "Running {} source at {:.0} Hz (Ctrl+C to stop)",
            source.name(),
            1.0 / settings.tick_period.as_secs_f64()
        );

        let ticks = run_loop(&engine, source.as_mut(), &settings, &shutdown_rx, &mut out)?;

        source.stop();
        writeln!(out, "{}", Report::capture(&engine).render(settings.format))?;

        let metrics = engine.metrics();
        info!(
            "Stopped after {} ticks: {} lines, {} commands, {} rejected tokens",
            ticks, metrics.lines_received, metrics.commands_applied, metrics.tokens_rejected
        );
        Ok(())
    }
}

/// 启动输入源
///
/// 失败时先输出一份全 NaN 的报告（引擎没有可用输入），再返回错误。
fn start_source(
    source: &mut dyn MotionSource,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    if let Err(e) = source.start() {
        error!("Failed to start {} source: {}", source.name(), e);
        writeln!(out, "{}", Report::unavailable().render(format))?;
        return Err(e).context(format!("Failed to start {} source", source.name()));
    }
    Ok(())
}

/// 固定频率 tick 循环
///
/// 每个 tick：取输入源文本 → `engine.update` → 按报告周期输出。
/// 收到关闭信号（或信号通道断开）时返回本次运行的 tick 数。
pub fn run_loop(
    engine: &MotionEngine,
    source: &mut dyn MotionSource,
    settings: &RunSettings,
    shutdown: &Receiver<()>,
    out: &mut impl Write,
) -> io::Result<u64> {
    let sleeper = SpinSleeper::default();
    let period = settings.tick_period;
    let max_lag = period * MAX_TICK_LAG;

    let mut ticks = 0u64;
    let mut next_tick = Instant::now();
    let mut last_report = Instant::now();
    let mut fault_logged = false;

    loop {
        match shutdown.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {},
        }

        let text = source.poll();
        engine.update(text.as_deref());
        ticks += 1;

        if !fault_logged && source.state() == SourceState::Faulted {
            warn!("{} source faulted, holding last values", source.name());
            fault_logged = true;
        }

        let now = Instant::now();
        if now.duration_since(last_report) >= settings.report_period {
            writeln!(out, "{}", Report::capture(engine).render(settings.format))?;
            last_report = now;
        }

        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            sleeper.sleep(next_tick - now);
        } else if now - next_tick > max_lag {
            next_tick = now;
        }
    }

    Ok(ticks)
}
