//! decode 命令
//!
//! 逐个 token 显示一行文本的解析结果，用于排查发送端的协议问题。

use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use motionlink_protocol::{AxisCommand, Timing, tokens};
use serde::Serialize;

use crate::config::OutputFormat;

/// decode 命令参数
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// 待解析的文本行（如 "L0500 R1999I250"）
    pub line: String,

    /// 输出格式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// 单个 token 的解析结果
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum TokenReport {
    Accepted {
        #[serde(flatten)]
        command: AxisCommand,
    },
    Rejected {
        reason: String,
    },
}

impl DecodeCommand {
    pub fn execute(&self) -> Result<()> {
        let mut out = io::stdout().lock();
        for line in describe(&self.line, self.format) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

/// 生成逐 token 的描述
pub fn describe(line: &str, format: OutputFormat) -> Vec<String> {
    let reports: Vec<TokenReport> = tokens(line)
        .map(|token| match token {
            Ok(command) => TokenReport::Accepted { command },
            Err(e) => TokenReport::Rejected {
                reason: e.to_string(),
            },
        })
        .collect();

    match format {
        OutputFormat::Text => {
            if reports.is_empty() {
                return vec!["(no commands)".to_string()];
            }
            reports.iter().map(describe_text).collect()
        },
        OutputFormat::Json => reports
            .iter()
            .map(|r| serde_json::to_string(r).unwrap_or_else(|e| e.to_string()))
            .collect(),
    }
}

fn describe_text(report: &TokenReport) -> String {
    match report {
        TokenReport::Accepted { command } => {
            let timing = match command.timing {
                Timing::Instant => "instant".to_string(),
                Timing::Interval(d) => format!("over {} ms", d.as_millis()),
                Timing::Speed(speed) => format!("at {speed:.3}/s"),
            };
            format!(
                "{} ({}) -> {:.6} {}",
                command.axis,
                command.axis.label(),
                command.value,
                timing
            )
        },
        TokenReport::Rejected { reason } => format!("rejected: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_text() {
        let lines = describe("L0500 R1999I250 L9123 l2000s500", OutputFormat::Text);
        assert_eq!(
            lines,
            vec![
                "L0 (Up) -> 0.500501 instant".to_string(),
                "R1 (Pitch) -> 1.000000 over 250 ms".to_string(),
                "rejected: Unknown axis: L9".to_string(),
                "L2 (Forward) -> 0.000000 at 0.500/s".to_string(),
            ]
        );
    }

    #[test]
    fn test_describe_empty_line() {
        assert_eq!(describe("GARBAGE", OutputFormat::Text), vec!["(no commands)"]);
        assert!(describe("", OutputFormat::Json).is_empty());
    }

    #[test]
    fn test_describe_json() {
        let lines = describe("R0999 L1", OutputFormat::Json);
        assert_eq!(lines.len(), 2);

        let accepted: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(accepted["status"], "accepted");
        assert_eq!(accepted["axis"], "R0");
        assert_eq!(accepted["value"], 1.0);

        let rejected: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["reason"], "Missing value digits for axis L1");
    }
}
