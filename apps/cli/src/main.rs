//! # motionlink CLI
//!
//! 接收六轴运动指令流（UDP 或串口），以固定频率插值并输出轴数值。
//!
//! ```bash
//! # 监听本机 UDP 8889
//! motionlink-cli run
//!
//! # 串口输入，JSON 报告
//! motionlink-cli run --transport serial --serial-port /dev/ttyUSB0 --format json
//!
//! # 查看一行文本的解析结果
//! motionlink-cli decode "L0500 R1999I250"
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod report;

use commands::{DecodeCommand, RunCommand};

/// motionlink CLI - 六轴运动指令接收器
#[derive(Parser, Debug)]
#[command(name = "motionlink-cli")]
#[command(about = "Receive six-axis motion commands over UDP or serial", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动输入源并运行 tick 循环
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 解析一行文本并逐个显示 token
    Decode {
        #[command(flatten)]
        args: DecodeCommand,
    },

    /// 列出可用串口
    Ports,
}

fn main() -> Result<()> {
    // 日志输出到 stderr，stdout 留给报告
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("motionlink_cli=info".parse()?)
                .add_directive("motionlink_transport=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args } => args.execute(),
        Commands::Decode { args } => args.execute(),
        Commands::Ports => commands::ports::execute(),
    }
}
