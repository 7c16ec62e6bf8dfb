//! # Motionlink Protocol
//!
//! 六轴运动指令文本协议定义（无 IO、无线程依赖）
//!
//! ## 模块
//!
//! - `axis`: 轴标识（L0/L1/L2/R0/R1/R2）
//! - `decoder`: 文本行 → 轴指令解析
//!
//! ## 协议格式
//!
//! ```text
//! line      = *command
//! command   = axis-id digits [modifier digits]
//! axis-id   = "L0" / "L1" / "L2" / "R0" / "R1" / "R2"   ; 大小写不敏感
//! digits    = 1*DIGIT
//! modifier  = "I" / "S"                                  ; 大小写不敏感
//! ```
//!
//! 数值按位数归一化：`value = int(digits) / (10^len(digits) - 1)`，
//! 因此任意长度的全 9 串都精确映射为 1.0。

pub mod axis;
pub mod decoder;

pub use axis::{AXIS_COUNT, Axis};
pub use decoder::{AxisCommand, CommandBatch, Timing, decode, normalize_digits, tokens};

use thiserror::Error;

/// 协议解析错误（单个 token 级别）
///
/// 解析器对每个 token 独立处理：出错的 token 被跳过，同一行的其他 token 照常生效。
/// 这些错误不会穿透到引擎之外，只用于统计和日志。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 未知轴标识（如 `L9`、`R7`）
    #[error("Unknown axis: {name}")]
    UnknownAxis { name: String },

    /// 轴标识后没有数值
    #[error("Missing value digits for axis {axis}")]
    EmptyValue { axis: Axis },

    /// 修饰符后没有数值（如 `L0500I`）
    #[error("Modifier '{modifier}' on axis {axis} has no digits")]
    MissingModifierValue { axis: Axis, modifier: char },

    /// 速度修饰符为 0（永远无法到达目标）
    #[error("Zero speed on axis {axis}")]
    ZeroSpeed { axis: Axis },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::UnknownAxis {
            name: "L9".to_string(),
        };
        assert_eq!(format!("{}", err), "Unknown axis: L9");

        let err = ProtocolError::EmptyValue { axis: Axis::R1 };
        assert_eq!(format!("{}", err), "Missing value digits for axis R1");

        let err = ProtocolError::MissingModifierValue {
            axis: Axis::L0,
            modifier: 'I',
        };
        assert!(format!("{}", err).contains("'I'"));

        let err = ProtocolError::ZeroSpeed { axis: Axis::L2 };
        assert_eq!(format!("{}", err), "Zero speed on axis L2");
    }
}
