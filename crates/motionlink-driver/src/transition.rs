//! 单轴过渡记录
//!
//! 过渡是不可变值：每条新指令都会生成一条全新的记录并整体替换旧记录，
//! 从不逐字段修改。

use std::time::Duration;

use motionlink_protocol::{Axis, AxisCommand};

/// 单轴线性过渡
///
/// 不变量：`end_time >= start_time`；两者相等表示瞬时到达（取 `end_value`）。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub axis: Axis,
    pub start_value: f64,
    pub end_value: f64,
    pub start_time: Duration,
    pub end_time: Duration,
}

impl Transition {
    /// 在 `at` 时刻保持 `value` 不变的过渡
    pub fn hold(axis: Axis, value: f64, at: Duration) -> Self {
        Self {
            axis,
            start_value: value,
            end_value: value,
            start_time: at,
            end_time: at,
        }
    }

    /// 采样 `t` 时刻的值
    ///
    /// - `start_time == end_time` → `end_value`（避免除零）
    /// - `t <= start_time` → `start_value`
    /// - `t >= end_time` → `end_value`
    /// - 其余按 `(t - start) / (end - start)` 线性插值
    pub fn sample(&self, t: Duration) -> f64 {
        if self.start_time == self.end_time || t >= self.end_time {
            return self.end_value;
        }
        if t <= self.start_time {
            return self.start_value;
        }

        let elapsed = (t - self.start_time).as_secs_f64();
        let span = (self.end_time - self.start_time).as_secs_f64();
        self.start_value + (self.end_value - self.start_value) * (elapsed / span)
    }

    /// 是否已到达终点
    pub fn is_settled(&self, t: Duration) -> bool {
        t >= self.end_time
    }

    /// 过渡总时长
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// 根据新指令生成替换记录
    ///
    /// 起点取 `now` 时刻的在途值，因此重复下发指令不会产生跳变。
    pub fn retarget(&self, cmd: &AxisCommand, now: Duration) -> Transition {
        debug_assert_eq!(self.axis, cmd.axis);

        let start_value = self.sample(now);
        let duration = cmd.timing.duration_from(start_value, cmd.value);

        Transition {
            axis: cmd.axis,
            start_value,
            end_value: cmd.value,
            start_time: now,
            end_time: now.checked_add(duration).unwrap_or(Duration::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motionlink_protocol::Timing;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_sample_instantaneous() {
        let t = Transition::hold(Axis::L0, 0.3, ms(100));
        assert_eq!(t.sample(ms(0)), 0.3);
        assert_eq!(t.sample(ms(100)), 0.3);
        assert_eq!(t.sample(ms(1000)), 0.3);

        // 起止时间相同但起止值不同：取终值
        let t = Transition {
            axis: Axis::L0,
            start_value: 0.0,
            end_value: 1.0,
            start_time: ms(100),
            end_time: ms(100),
        };
        assert_eq!(t.sample(ms(50)), 1.0);
        assert_eq!(t.sample(ms(100)), 1.0);
    }

    #[test]
    fn test_sample_linear() {
        let t = Transition {
            axis: Axis::R1,
            start_value: 0.2,
            end_value: 0.6,
            start_time: ms(1000),
            end_time: ms(1400),
        };
        assert_eq!(t.sample(ms(900)), 0.2);
        assert_eq!(t.sample(ms(1000)), 0.2);
        assert!((t.sample(ms(1100)) - 0.3).abs() < 1e-12);
        assert!((t.sample(ms(1200)) - 0.4).abs() < 1e-12);
        assert_eq!(t.sample(ms(1400)), 0.6);
        assert_eq!(t.sample(ms(5000)), 0.6);
        assert!(!t.is_settled(ms(1399)));
        assert!(t.is_settled(ms(1400)));
        assert_eq!(t.duration(), ms(400));
    }

    #[test]
    fn test_retarget_starts_from_in_flight_value() {
        let t = Transition {
            axis: Axis::L1,
            start_value: 0.0,
            end_value: 1.0,
            start_time: ms(0),
            end_time: ms(1000),
        };
        let cmd = AxisCommand {
            axis: Axis::L1,
            value: 0.0,
            timing: Timing::Interval(ms(500)),
        };
        let next = t.retarget(&cmd, ms(250));
        assert!((next.start_value - 0.25).abs() < 1e-12);
        assert_eq!(next.start_time, ms(250));
        assert_eq!(next.end_time, ms(750));
        assert_eq!(next.end_value, 0.0);
        assert!((next.sample(ms(250)) - t.sample(ms(250))).abs() < 1e-12);
    }

    #[test]
    fn test_retarget_speed_uses_distance() {
        let t = Transition::hold(Axis::R0, 0.5, ms(0));
        let cmd = AxisCommand {
            axis: Axis::R0,
            value: 1.0,
            timing: Timing::Speed(0.25),
        };
        // 距离 0.5，速度 0.25/s → 2 秒
        let next = t.retarget(&cmd, ms(100));
        assert_eq!(next.end_time, ms(2100));
    }

    #[test]
    fn test_retarget_saturates_end_time() {
        let t = Transition::hold(Axis::L2, 0.5, ms(0));
        let cmd = AxisCommand {
            axis: Axis::L2,
            value: 1.0,
            timing: Timing::Interval(Duration::MAX),
        };
        let next = t.retarget(&cmd, ms(10));
        assert_eq!(next.end_time, Duration::MAX);
        assert_eq!(next.sample(ms(10)), 0.5);
    }
}
