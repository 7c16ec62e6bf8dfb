//! 轴标识定义
//!
//! 六个相互独立的运动自由度，数值域归一化到 [0, 1]，中立位 0.5。

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// 轴数量
pub const AXIS_COUNT: usize = 6;

/// 运动轴
///
/// `L*` 为线性轴，`R*` 为旋转轴。`#[repr(u8)]` 的取值即固定大小表（`[T; 6]`）中的下标。
///
/// | 轴 | 下标 | 含义 |
/// |----|------|------|
/// | L0 | 0 | Up |
/// | L1 | 1 | Right |
/// | L2 | 2 | Forward |
/// | R0 | 3 | Yaw |
/// | R1 | 4 | Pitch |
/// | R2 | 5 | Roll |
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    num_enum::TryFromPrimitive,
    num_enum::IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Axis {
    L0 = 0,
    L1 = 1,
    L2 = 2,
    R0 = 3,
    R1 = 4,
    R2 = 5,
}

impl Axis {
    /// 全部轴（按下标顺序）
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::L0, Axis::L1, Axis::L2, Axis::R0, Axis::R1, Axis::R2];

    /// 中立位（默认值）
    pub const NEUTRAL: f64 = 0.5;

    /// 在固定大小表中的下标
    #[inline]
    pub fn index(self) -> usize {
        u8::from(self) as usize
    }

    /// 协议中的标识（大写）
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::L0 => "L0",
            Axis::L1 => "L1",
            Axis::L2 => "L2",
            Axis::R0 => "R0",
            Axis::R1 => "R1",
            Axis::R2 => "R2",
        }
    }

    /// 运动含义（用于报告输出）
    pub fn label(self) -> &'static str {
        match self {
            Axis::L0 => "Up",
            Axis::L1 => "Right",
            Axis::L2 => "Forward",
            Axis::R0 => "Yaw",
            Axis::R1 => "Pitch",
            Axis::R2 => "Roll",
        }
    }

    /// 默认值（所有轴均为中立位）
    pub fn default_value(self) -> f64 {
        Self::NEUTRAL
    }

    /// 由两个字节（大小写不敏感）识别轴
    pub(crate) fn from_id_bytes(kind: u8, number: u8) -> Option<Self> {
        match (kind.to_ascii_uppercase(), number) {
            (b'L', b'0') => Some(Axis::L0),
            (b'L', b'1') => Some(Axis::L1),
            (b'L', b'2') => Some(Axis::L2),
            (b'R', b'0') => Some(Axis::R0),
            (b'R', b'1') => Some(Axis::R1),
            (b'R', b'2') => Some(Axis::R2),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [kind, number] => Axis::from_id_bytes(*kind, *number),
            _ => None,
        }
        .ok_or_else(|| ProtocolError::UnknownAxis {
            name: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_index_roundtrip() {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
            assert_eq!(Axis::try_from(i as u8).unwrap(), *axis);
        }
        assert!(Axis::try_from(6u8).is_err());
    }

    #[test]
    fn test_axis_from_str_case_insensitive() {
        assert_eq!("l0".parse::<Axis>().unwrap(), Axis::L0);
        assert_eq!("R2".parse::<Axis>().unwrap(), Axis::R2);
        assert_eq!("r1".parse::<Axis>().unwrap(), Axis::R1);
        assert!("L3".parse::<Axis>().is_err());
        assert!("X0".parse::<Axis>().is_err());
        assert!("L".parse::<Axis>().is_err());
        assert!("L00".parse::<Axis>().is_err());
    }

    #[test]
    fn test_axis_labels() {
        assert_eq!(Axis::L0.label(), "Up");
        assert_eq!(Axis::R2.label(), "Roll");
        assert_eq!(Axis::R1.to_string(), "R1");
    }

    #[test]
    fn test_default_value_is_neutral() {
        for axis in Axis::ALL {
            assert_eq!(axis.default_value(), 0.5);
        }
    }
}
