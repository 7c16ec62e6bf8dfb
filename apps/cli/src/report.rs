//! 轴数值报告

use motionlink_driver::{AXIS_COUNT, Axis, MetricsSnapshot, MotionEngine};
use serde::Serialize;

use crate::config::OutputFormat;

/// 单个轴的报告项
#[derive(Debug, Clone, Serialize)]
pub struct AxisEntry {
    pub axis: Axis,
    pub label: &'static str,
    /// 引擎不存在时为 NaN（JSON 中为 null）
    pub value: f64,
}

/// 一次报告
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub tick: u64,
    pub timestamp_ms: f64,
    pub axes: [AxisEntry; AXIS_COUNT],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSnapshot>,
}

impl Report {
    /// 由引擎最近一次 tick 生成报告
    pub fn capture(engine: &MotionEngine) -> Self {
        let snapshot = engine.snapshot();
        Self {
            tick: snapshot.tick,
            timestamp_ms: snapshot.timestamp.as_secs_f64() * 1000.0,
            axes: Axis::ALL.map(|axis| AxisEntry {
                axis,
                label: axis.label(),
                value: snapshot.value(axis),
            }),
            metrics: Some(engine.metrics()),
        }
    }

    /// 没有可用引擎时的报告：所有轴为 NaN
    pub fn unavailable() -> Self {
        Self {
            tick: 0,
            timestamp_ms: 0.0,
            axes: Axis::ALL.map(|axis| AxisEntry {
                axis,
                label: axis.label(),
                value: f64::NAN,
            }),
            metrics: None,
        }
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => self.to_json(),
        }
    }

    fn to_text(&self) -> String {
        let values: Vec<String> = self
            .axes
            .iter()
            .map(|e| format!("{}({})={:.4}", e.axis, e.label, e.value))
            .collect();
        format!("[tick {:>8}] {}", self.tick, values.join(" "))
    }

    fn to_json(&self) -> String {
        // 所有字段都可序列化，失败只可能来自内存不足
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_report_is_nan() {
        let report = Report::unavailable();
        assert!(report.axes.iter().all(|e| e.value.is_nan()));

        let text = report.render(OutputFormat::Text);
        assert!(text.contains("L0(Up)=NaN"));
        assert!(text.contains("R2(Roll)=NaN"));

        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json)).unwrap();
        assert!(json["axes"][0]["value"].is_null());
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn test_report_from_engine() {
        let engine = MotionEngine::new();
        engine.update(Some("L0999 R1000"));

        let report = Report::capture(&engine);
        assert_eq!(report.tick, 1);
        assert_eq!(report.axes[0].value, 1.0);
        assert_eq!(report.axes[4].value, 0.0);

        let text = report.render(OutputFormat::Text);
        assert!(text.contains("L0(Up)=1.0000"));
        assert!(text.contains("R1(Pitch)=0.0000"));
        assert!(text.contains("L1(Right)=0.5000"));

        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json)).unwrap();
        assert_eq!(json["axes"][0]["axis"], "L0");
        assert_eq!(json["axes"][0]["value"], 1.0);
        assert_eq!(json["metrics"]["commands_applied"], 2);
    }
}
