//! 文本行解析
//!
//! 将一段文本（一行串口数据或一个 UDP 数据报）解析为零个或多个轴指令。
//!
//! # 容错策略
//!
//! 每个 token 独立解析：未知轴、缺少数值、修饰符无数值等错误只会跳过该 token，
//! 同一行中其他合法 token 照常生效。不能作为指令起点的字符（空白、分隔符、噪声）直接跳过。

use std::time::Duration;

use smallvec::SmallVec;

use crate::{Axis, ProtocolError};

/// 参与数值计算的最大位数
///
/// `10^18 - 1` 仍在 u64 范围内；超出部分对 f64 精度没有影响。
const MAX_VALUE_DIGITS: usize = 18;

/// 一次解析得到的指令（通常一行不超过 6 条，避免堆分配）
pub type CommandBatch = SmallVec<[AxisCommand; 6]>;

/// 指令的时间修饰
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Timing {
    /// 无修饰符：立即到达
    Instant,
    /// `I` 修饰符：在给定时长内到达目标
    Interval(Duration),
    /// `S` 修饰符：以给定速度（单位/秒）移动到目标，始终为正
    Speed(f64),
}

impl Timing {
    /// 计算从 `start` 到 `target` 所需时长
    ///
    /// 速度模式下时长取决于起点，因此只能在调度时（已知当前值）计算。
    pub fn duration_from(&self, start: f64, target: f64) -> Duration {
        match *self {
            Timing::Instant => Duration::ZERO,
            Timing::Interval(duration) => duration,
            Timing::Speed(speed) => {
                Duration::try_from_secs_f64((target - start).abs() / speed).unwrap_or_default()
            },
        }
    }
}

/// 单轴指令
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxisCommand {
    /// 目标轴
    pub axis: Axis,
    /// 目标值 [0, 1]
    pub value: f64,
    /// 时间修饰
    pub timing: Timing,
}

/// 将数字串归一化到 [0, 1]
///
/// `value = int(digits) / (10^len(digits) - 1)`：
/// - `"9"` / `"99"` / `"999…"` → 1.0（精确）
/// - `"5"` → 5/9
/// - `"000"` → 0.0
///
/// 空串或包含非数字字符时返回 `None`。
pub fn normalize_digits(digits: &[u8]) -> Option<f64> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let significant = &digits[..digits.len().min(MAX_VALUE_DIGITS)];
    if significant.iter().all(|&d| d == b'9') {
        return Some(1.0);
    }

    let numerator = significant.iter().fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));
    let denominator = 10u64.pow(significant.len() as u32) - 1;
    Some(numerator as f64 / denominator as f64)
}

/// 遍历文本中的所有候选 token（包括非法 token）
///
/// 候选 token 以 `L`/`R` 加一位数字开头。
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens {
        bytes: text.as_bytes(),
        pos: 0,
    }
}

/// 解析文本，只保留合法指令（保持原始顺序）
pub fn decode(text: &str) -> CommandBatch {
    tokens(text).filter_map(Result::ok).collect()
}

/// token 迭代器，见 [`tokens`]
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn is_token_start(&self) -> bool {
        matches!(self.peek().map(|b| b.to_ascii_uppercase()), Some(b'L' | b'R'))
            && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit)
    }

    fn take_digits(&mut self) -> &'a [u8] {
        let bytes = self.bytes;
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        &bytes[start..self.pos]
    }

    /// 从当前位置（已确认是 token 起点）解析一条指令
    fn scan_command(&mut self) -> Result<AxisCommand, ProtocolError> {
        let (kind, number) = (self.bytes[self.pos], self.bytes[self.pos + 1]);
        self.pos += 2;

        let axis = Axis::from_id_bytes(kind, number).ok_or_else(|| ProtocolError::UnknownAxis {
            name: String::from_utf8_lossy(&[kind, number]).into_owned(),
        })?;

        let value = normalize_digits(self.take_digits()).ok_or(ProtocolError::EmptyValue { axis })?;

        let modifier = match self.peek().map(|b| b.to_ascii_uppercase()) {
            Some(m @ (b'I' | b'S')) => m,
            _ => {
                return Ok(AxisCommand {
                    axis,
                    value,
                    timing: Timing::Instant,
                });
            },
        };
        self.pos += 1;

        let digits = self.take_digits();
        if digits.is_empty() {
            return Err(ProtocolError::MissingModifierValue {
                axis,
                modifier: modifier as char,
            });
        }

        let timing = if modifier == b'I' {
            Timing::Interval(Duration::from_millis(parse_saturating(digits)))
        } else {
            let raw = parse_saturating(digits);
            if raw == 0 {
                return Err(ProtocolError::ZeroSpeed { axis });
            }
            Timing::Speed(raw as f64 / 1000.0)
        };

        Ok(AxisCommand {
            axis,
            value,
            timing,
        })
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<AxisCommand, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.bytes.len() {
            if self.is_token_start() {
                return Some(self.scan_command());
            }
            self.pos += 1;
        }
        None
    }
}

/// 解析修饰符数值，溢出时饱和到 `u64::MAX`
fn parse_saturating(digits: &[u8]) -> u64 {
    digits.iter().fold(0u64, |acc, &d| {
        acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
    })
}
