//! 配置文件
//!
//! `run` 命令可以从 TOML 文件读取默认参数，命令行参数优先于文件中的值：
//!
//! ```toml
//! transport = "serial"
//! tick_hz = 100
//! report_hz = 2
//! format = "text"
//!
//! [udp]
//! port = 8889
//! scope = "loopback"
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud = 115200
//! read_timeout_ms = 1000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use motionlink_transport::{AddressScope, SerialConfig, UdpConfig};
use serde::Deserialize;
use thiserror::Error;

/// 默认 tick 频率（Hz）
pub const DEFAULT_TICK_HZ: u32 = 100;

/// 默认报告频率（Hz）
pub const DEFAULT_REPORT_HZ: f64 = 2.0;

/// tick 频率上限
const MAX_TICK_HZ: u32 = 10_000;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// 输入源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Udp,
    Serial,
}

/// UDP 监听范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Loopback,
    Any,
}

impl From<Scope> for AddressScope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Loopback => AddressScope::Loopback,
            Scope::Any => AddressScope::Any,
        }
    }
}

/// 报告输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// TOML 文件内容（所有字段可选）
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub transport: Option<TransportKind>,
    pub tick_hz: Option<u32>,
    pub report_hz: Option<f64>,
    pub format: Option<OutputFormat>,
    pub udp: UdpSection,
    pub serial: SerialSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UdpSection {
    pub port: Option<u16>,
    pub scope: Option<Scope>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub read_timeout_ms: Option<u64>,
}

impl FileConfig {
    /// 从文件加载
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 命令行覆盖项（`None` 表示未在命令行指定）
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub transport: Option<TransportKind>,
    pub port: Option<u16>,
    pub scope: Option<Scope>,
    pub serial_port: Option<String>,
    pub baud: Option<u32>,
    pub tick_hz: Option<u32>,
    pub report_hz: Option<f64>,
    pub format: Option<OutputFormat>,
}

/// 合并后的运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub transport: TransportKind,
    pub udp: UdpConfig,
    pub serial: SerialConfig,
    pub tick_period: Duration,
    pub report_period: Duration,
    pub format: OutputFormat,
}

impl RunSettings {
    /// 合并：命令行 > 配置文件 > 默认值
    pub fn resolve(file: FileConfig, cli: Overrides) -> Result<Self, ConfigError> {
        let transport = cli.transport.or(file.transport).unwrap_or_default();

        let mut udp = UdpConfig::default();
        if let Some(port) = cli.port.or(file.udp.port) {
            udp = udp.port(port);
        }
        if let Some(scope) = cli.scope.or(file.udp.scope) {
            udp = udp.scope(scope.into());
        }

        let mut serial = SerialConfig::new(cli.serial_port.or(file.serial.port).unwrap_or_default());
        if let Some(baud) = cli.baud.or(file.serial.baud) {
            serial = serial.baud_rate(baud);
        }
        if let Some(ms) = file.serial.read_timeout_ms {
            serial = serial.read_timeout(Duration::from_millis(ms));
        }

        let tick_hz = cli.tick_hz.or(file.tick_hz).unwrap_or(DEFAULT_TICK_HZ);
        if tick_hz == 0 || tick_hz > MAX_TICK_HZ {
            return Err(ConfigError::Invalid(format!(
                "tick_hz must be in 1..={MAX_TICK_HZ}, got {tick_hz}"
            )));
        }

        let report_hz = cli.report_hz.or(file.report_hz).unwrap_or(DEFAULT_REPORT_HZ);
        if !(report_hz.is_finite() && report_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "report_hz must be positive, got {report_hz}"
            )));
        }
        let report_period = Duration::try_from_secs_f64(1.0 / report_hz)
            .map_err(|_| ConfigError::Invalid(format!("report_hz {report_hz} is too small")))?;

        if transport == TransportKind::Serial {
            if serial.port_name.is_empty() {
                return Err(ConfigError::Invalid(
                    "serial transport requires --serial-port or [serial].port".to_string(),
                ));
            }
            serial
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }

        Ok(Self {
            transport,
            udp,
            serial,
            tick_period: Duration::from_secs_f64(1.0 / f64::from(tick_hz)),
            report_period,
            format: cli.format.or(file.format).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = RunSettings::resolve(FileConfig::default(), Overrides::default()).unwrap();
        assert_eq!(settings.transport, TransportKind::Udp);
        assert_eq!(settings.udp, UdpConfig::default());
        assert_eq!(settings.tick_period, Duration::from_millis(10));
        assert_eq!(settings.report_period, Duration::from_millis(500));
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
transport = "serial"
tick_hz = 50
format = "json"

[udp]
port = 9000
scope = "any"

[serial]
port = "/dev/ttyACM0"
baud = 9600
read_timeout_ms = 250
"#,
        );

        let config = FileConfig::load(file.path()).unwrap();
        let settings = RunSettings::resolve(config, Overrides::default()).unwrap();
        assert_eq!(settings.transport, TransportKind::Serial);
        assert_eq!(settings.udp.port, 9000);
        assert_eq!(settings.udp.scope, AddressScope::Any);
        assert_eq!(settings.serial.port_name, "/dev/ttyACM0");
        assert_eq!(settings.serial.baud_rate, 9600);
        assert_eq!(settings.serial.read_timeout, Duration::from_millis(250));
        assert_eq!(settings.tick_period, Duration::from_millis(20));
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config(
            r#"
transport = "serial"
tick_hz = 50

[udp]
port = 9000

[serial]
port = "/dev/ttyACM0"
"#,
        );
        let config = FileConfig::load(file.path()).unwrap();
        let overrides = Overrides {
            transport: Some(TransportKind::Udp),
            port: Some(9100),
            tick_hz: Some(200),
            ..Overrides::default()
        };

        let settings = RunSettings::resolve(config, overrides).unwrap();
        assert_eq!(settings.transport, TransportKind::Udp);
        assert_eq!(settings.udp.port, 9100);
        assert_eq!(settings.serial.port_name, "/dev/ttyACM0");
        assert_eq!(settings.tick_period, Duration::from_millis(5));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let file = write_config("tick_rate = 10\n");
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/motionlink.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_settings() {
        let zero_hz = Overrides {
            tick_hz: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            RunSettings::resolve(FileConfig::default(), zero_hz),
            Err(ConfigError::Invalid(_))
        ));

        let serial_without_port = Overrides {
            transport: Some(TransportKind::Serial),
            ..Overrides::default()
        };
        assert!(matches!(
            RunSettings::resolve(FileConfig::default(), serial_without_port),
            Err(ConfigError::Invalid(_))
        ));

        let bad_baud = Overrides {
            transport: Some(TransportKind::Serial),
            serial_port: Some("/dev/ttyUSB0".to_string()),
            baud: Some(12345),
            ..Overrides::default()
        };
        assert!(matches!(
            RunSettings::resolve(FileConfig::default(), bad_baud),
            Err(ConfigError::Invalid(_))
        ));

        // 周期超出 Duration 表示范围
        let tiny_report_hz = Overrides {
            report_hz: Some(1e-30),
            ..Overrides::default()
        };
        assert!(matches!(
            RunSettings::resolve(FileConfig::default(), tiny_report_hz),
            Err(ConfigError::Invalid(_))
        ));

        let file = FileConfig {
            report_hz: Some(f64::MIN_POSITIVE),
            ..FileConfig::default()
        };
        assert!(matches!(
            RunSettings::resolve(file, Overrides::default()),
            Err(ConfigError::Invalid(_))
        ));
    }
}
